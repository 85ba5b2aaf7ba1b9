//! Error types and operational counters for the ingestion pipeline.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use log::SetLoggerError;
use strum::IntoEnumIterator;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Validation failure for an inbound raw event.
///
/// Raised before any side effect: a rejected event is neither stored nor
/// broadcast.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// The source address did not parse as an IPv4 or IPv6 address.
    #[error("invalid source address: {0:?}")]
    InvalidSourceAddress(String),

    /// The target address did not parse as an IPv4 or IPv6 address.
    #[error("invalid target address: {0:?}")]
    InvalidTargetAddress(String),

    /// The byte count was negative.
    #[error("bytes_sent must be non-negative, got {0}")]
    NegativeBytes(i64),
}

/// Counter categories tracked by [`IngestStats`].
///
/// Each variant represents a degraded or rejected outcome somewhere in the
/// ingest/query/stream path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ErrorType {
    InvalidSourceAddress,
    InvalidTargetAddress,
    NegativeBytes,
    InvalidWindow,
    GeoLookupMiss,
    GeoLookupTimeout,
    SubscriberDeliveryFailure,
    StreamPolicyViolation,
}

impl ErrorType {
    /// Human-readable label, used in logs and the status endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::InvalidSourceAddress => "Invalid source address",
            ErrorType::InvalidTargetAddress => "Invalid target address",
            ErrorType::NegativeBytes => "Negative byte count",
            ErrorType::InvalidWindow => "Non-positive window",
            ErrorType::GeoLookupMiss => "Geo lookup miss",
            ErrorType::GeoLookupTimeout => "Geo lookup timeout",
            ErrorType::SubscriberDeliveryFailure => "Subscriber delivery failure",
            ErrorType::StreamPolicyViolation => "Stream policy violation",
        }
    }

    /// Counter name used by the Prometheus metrics endpoint.
    pub fn metric_name(&self) -> &'static str {
        match self {
            ErrorType::InvalidSourceAddress => "invalid_source_address",
            ErrorType::InvalidTargetAddress => "invalid_target_address",
            ErrorType::NegativeBytes => "negative_bytes",
            ErrorType::InvalidWindow => "invalid_window",
            ErrorType::GeoLookupMiss => "geo_lookup_miss",
            ErrorType::GeoLookupTimeout => "geo_lookup_timeout",
            ErrorType::SubscriberDeliveryFailure => "subscriber_delivery_failure",
            ErrorType::StreamPolicyViolation => "stream_policy_violation",
        }
    }
}

impl From<&IngestError> for ErrorType {
    fn from(error: &IngestError) -> Self {
        match error {
            IngestError::InvalidSourceAddress(_) => ErrorType::InvalidSourceAddress,
            IngestError::InvalidTargetAddress(_) => ErrorType::InvalidTargetAddress,
            IngestError::NegativeBytes(_) => ErrorType::NegativeBytes,
        }
    }
}

/// Thread-safe operational counters for the service.
///
/// Tracks ingested-event and delivery totals plus a count per [`ErrorType`]
/// using atomic counters, allowing concurrent access from multiple tasks.
/// Shared across handlers and the pipeline via `Arc`.
pub struct IngestStats {
    events_ingested: AtomicUsize,
    deliveries: AtomicUsize,
    errors: HashMap<ErrorType, AtomicUsize>,
}

impl IngestStats {
    /// Creates a tracker with all counters at zero.
    pub fn new() -> Self {
        let mut errors = HashMap::new();
        for error in ErrorType::iter() {
            errors.insert(error, AtomicUsize::new(0));
        }
        IngestStats {
            events_ingested: AtomicUsize::new(0),
            deliveries: AtomicUsize::new(0),
            errors,
        }
    }

    /// Increments the counter for `error`.
    pub fn increment_error(&self, error: ErrorType) {
        if let Some(counter) = self.errors.get(&error) {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Current count for `error`.
    pub fn get_error_count(&self, error: ErrorType) -> usize {
        self.errors
            .get(&error)
            .map(|counter| counter.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Sum of all error counters.
    pub fn total_errors(&self) -> usize {
        self.errors
            .values()
            .map(|counter| counter.load(Ordering::SeqCst))
            .sum()
    }

    /// Records one successfully ingested event.
    pub fn record_ingested(&self) {
        self.events_ingested.fetch_add(1, Ordering::SeqCst);
    }

    /// Number of events ingested since startup.
    pub fn events_ingested(&self) -> usize {
        self.events_ingested.load(Ordering::SeqCst)
    }

    /// Records `count` queued subscriber deliveries.
    pub fn record_deliveries(&self, count: usize) {
        self.deliveries.fetch_add(count, Ordering::SeqCst);
    }

    /// Number of subscriber deliveries queued since startup.
    pub fn deliveries(&self) -> usize {
        self.deliveries.load(Ordering::SeqCst)
    }
}

impl Default for IngestStats {
    fn default() -> Self {
        Self::new()
    }
}
