//! Time-windowed in-memory retention of rendered log lines.
//!
//! Appends are timestamped at call time, so insertion order is timestamp
//! order and eviction is a prefix trim from the head. Eviction runs inline
//! on every append; there is no background sweep thread.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default retention window for captured log lines.
pub const DEFAULT_RETENTION_WINDOW: Duration = Duration::from_secs(600);

/// A captured log line. Immutable once created; owned by the buffer and
/// destroyed only by eviction or an explicit clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

/// Internally-synchronized append/evict buffer of recent log lines.
///
/// Lock poisoning is absorbed rather than propagated; the logging path must
/// never panic its caller.
#[derive(Debug, Default)]
pub struct RetentionBuffer {
    records: Mutex<VecDeque<LogRecord>>,
}

impl RetentionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a record at the tail, then trim expired records from the head.
    pub fn append(&self, now: DateTime<Utc>, line: impl Into<String>, window: Duration) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push_back(LogRecord {
            timestamp: now,
            line: line.into(),
        });
        Self::trim_expired(&mut records, now, window);
    }

    /// Trim records with `timestamp <= now - window` from the head, stopping
    /// at the first non-expired record.
    pub fn evict_expired(&self, now: DateTime<Utc>, window: Duration) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Self::trim_expired(&mut records, now, window);
    }

    fn trim_expired(records: &mut VecDeque<LogRecord>, now: DateTime<Utc>, window: Duration) {
        let Ok(window) = chrono::Duration::from_std(window) else {
            return;
        };
        let Some(cutoff) = now.checked_sub_signed(window) else {
            return;
        };
        while records
            .front()
            .map_or(false, |record| record.timestamp <= cutoff)
        {
            records.pop_front();
        }
    }

    /// Replace the buffer with an empty one.
    pub fn clear(&self) {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = std::mem::take(&mut *records);
    }

    /// Point-in-time copy of the buffered records, oldest first.
    pub fn snapshot(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_append_preserves_order() {
        let buffer = RetentionBuffer::new();
        let window = Duration::from_secs(3600);
        for offset in 0..5 {
            let at = base_time() + chrono::Duration::seconds(offset);
            buffer.append(at, format!("line-{}", offset), window);
        }

        let lines: Vec<_> = buffer
            .snapshot()
            .into_iter()
            .map(|record| record.line)
            .collect();
        assert_eq!(lines, vec!["line-0", "line-1", "line-2", "line-3", "line-4"]);
    }

    #[test]
    fn test_eviction_is_prefix_trim() {
        let buffer = RetentionBuffer::new();
        let window = Duration::from_secs(3);
        for offset in 0..=5 {
            let at = base_time() + chrono::Duration::seconds(offset);
            buffer.append(at, format!("line-{}", offset), window);
        }

        // After the append at t0+5 with window 3, only records strictly newer
        // than t0+2 survive.
        let lines: Vec<_> = buffer
            .snapshot()
            .into_iter()
            .map(|record| record.line)
            .collect();
        assert_eq!(lines, vec!["line-3", "line-4", "line-5"]);
    }

    #[test]
    fn test_eviction_boundary_is_inclusive() {
        let buffer = RetentionBuffer::new();
        let window = Duration::from_secs(10);
        buffer.append(base_time(), "old", window);

        // A head exactly `window` old is expired.
        buffer.evict_expired(base_time() + chrono::Duration::seconds(10), window);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_evict_expired_without_append() {
        let buffer = RetentionBuffer::new();
        let window = Duration::from_secs(5);
        buffer.append(base_time(), "a", window);
        buffer.append(base_time() + chrono::Duration::seconds(4), "b", window);

        buffer.evict_expired(base_time() + chrono::Duration::seconds(7), window);
        let lines: Vec<_> = buffer
            .snapshot()
            .into_iter()
            .map(|record| record.line)
            .collect();
        assert_eq!(lines, vec!["b"]);
    }

    #[test]
    fn test_clear_empties_regardless_of_size() {
        let buffer = RetentionBuffer::new();
        let window = Duration::from_secs(3600);
        for offset in 0..100 {
            buffer.append(
                base_time() + chrono::Duration::seconds(offset),
                "line",
                window,
            );
        }

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.snapshot().is_empty());
    }

    #[test]
    fn test_oversized_window_never_evicts() {
        let buffer = RetentionBuffer::new();
        let window = Duration::from_secs(u64::MAX);
        buffer.append(base_time(), "keep", window);
        buffer.evict_expired(base_time() + chrono::Duration::days(365), window);
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn test_concurrent_appends() {
        use std::sync::Arc;

        let buffer = Arc::new(RetentionBuffer::new());
        let window = Duration::from_secs(3600);
        let mut handles = Vec::new();
        for thread_index in 0..4 {
            let buffer = Arc::clone(&buffer);
            handles.push(std::thread::spawn(move || {
                for record_index in 0..50 {
                    buffer.append(
                        Utc::now(),
                        format!("t{}-r{}", thread_index, record_index),
                        window,
                    );
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(buffer.len(), 200);
        let snapshot = buffer.snapshot();
        assert!(snapshot.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }
}
