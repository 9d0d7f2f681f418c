//! Wire format of the JSON error body returned by the Serval gateway.
//!
//! The gateway nests at most one level: `error.innererror` is a plain
//! structured blob, never another full body.

use serde::Deserialize;

/// Top-level JSON error body: `{"error": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// The `error` object of the body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub helplink: Option<String>,

    #[serde(default)]
    pub stacktrace: Option<String>,

    #[serde(default)]
    pub innererror: Option<InnerErrorDetail>,
}

/// The one-level-deep `error.innererror` blob.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InnerErrorDetail {
    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub helplink: Option<String>,

    #[serde(default)]
    pub stacktrace: Option<String>,
}

impl ErrorBody {
    /// Parse a raw body, degrading to `None` on malformed input.
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

/// First line of a possibly multi-line message, tolerating both `\n` and
/// `\r\n` separators.
pub fn first_line(message: &str) -> &str {
    message
        .split('\n')
        .next()
        .unwrap_or(message)
        .trim_end_matches('\r')
}
