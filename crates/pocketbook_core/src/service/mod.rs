//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep UI callers decoupled from storage details.
//! - Classify every failure as validation, not-found or store failure.

use log::{error, info, warn};
use std::time::Instant;

pub mod aggregate;
pub mod finance_service;
pub mod list_service;

/// Failure category surfaced to UI callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller input violates a precondition. Never retried automatically.
    Validation,
    /// Referenced entity does not exist or is soft-deleted.
    NotFound,
    /// The backing store round-trip failed; the caller may re-issue.
    StoreUnavailable,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

/// Service errors that map onto an [`ErrorKind`].
pub trait ClassifiedError: std::error::Error {
    fn kind(&self) -> ErrorKind;
}

/// Runs one service call and emits a metadata-only outcome event for it.
///
/// Caller-supplied content (titles, cell values) is never part of the event.
pub(crate) fn observe<T, E, F>(event: &str, module: &str, call: F) -> Result<T, E>
where
    E: ClassifiedError,
    F: FnOnce() -> Result<T, E>,
{
    let started_at = Instant::now();
    let result = call();
    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!("event={event} module={module} status=ok duration_ms={duration_ms}"),
        Err(err) if err.kind() == ErrorKind::StoreUnavailable => error!(
            "event={event} module={module} status=error duration_ms={duration_ms} error_code={} error={err}",
            err.kind().as_str()
        ),
        Err(err) => warn!(
            "event={event} module={module} status=rejected duration_ms={duration_ms} error_code={}",
            err.kind().as_str()
        ),
    }
    result
}
