//! # Serval Fault
//!
//! Failure-object model for the Serval transactional client.
//!
//! Every failure path of a remote call surfaces through one of four shapes:
//!
//! - [`ServiceFault`]: a structured service-side fault chain
//! - [`TransportFault`]: an HTTP-level fault with an optional JSON error body
//! - [`OperationFailure`]: a wrapped operation error with a result code
//! - [`GenericFailure`]: any other runtime error
//!
//! The shapes are closed over by the [`Failure`] union so that consumers
//! (notably `serval-telemetry`) can dispatch exhaustively. Each variant may
//! carry a cause of another variant, forming a singly-linked cause chain.

pub mod body;
pub mod fault;

pub use body::{ErrorBody, ErrorDetail, InnerErrorDetail};
pub use fault::{Failure, GenericFailure, OperationFailure, ServiceFault, TransportFault};
