//! Status-carrying results for independent pipeline operations.
//!
//! Every exporter, extractor and packager reports through [`Outcome`] so a
//! failure in one operation never aborts its siblings, and callers branch on
//! an explicit status instead of probing for fields.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Error;

/// Classification of a failed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// An optional capability is missing
    Unavailable,
    /// The partitioning collaborator failed
    Parse,
    /// A single element or image could not be processed
    PerItem,
    /// The image description service failed
    ExternalService,
    /// An exporter failed
    Render,
    /// Archive assembly failed
    Package,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Unavailable => "unavailable",
            FailureKind::Parse => "parse",
            FailureKind::PerItem => "per_item",
            FailureKind::ExternalService => "external_service",
            FailureKind::Render => "render",
            FailureKind::Package => "package",
        };
        f.write_str(name)
    }
}

impl From<&Error> for FailureKind {
    fn from(err: &Error) -> Self {
        match err {
            Error::Partition(_) | Error::UnsupportedFormat(_) => FailureKind::Parse,
            Error::Base64Decode(_) => FailureKind::PerItem,
            Error::Vision(_) | Error::Timeout(_) | Error::Cancelled => FailureKind::ExternalService,
            Error::Zip(_) | Error::Package(_) => FailureKind::Package,
            Error::Unavailable(_) => FailureKind::Unavailable,
            _ => FailureKind::Render,
        }
    }
}

/// Result of one independent operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    /// The operation produced its payload
    Success { payload: T },
    /// Nothing to produce; not an error
    Warning { message: String },
    /// The operation failed
    #[serde(rename = "error")]
    Failure { kind: FailureKind, error: String },
}

impl<T> Outcome<T> {
    /// Wrap a payload.
    pub fn success(payload: T) -> Self {
        Outcome::Success { payload }
    }

    /// Create a warning outcome.
    pub fn warning(message: impl Into<String>) -> Self {
        Outcome::Warning {
            message: message.into(),
        }
    }

    /// Create a failure outcome.
    pub fn failure(kind: FailureKind, detail: impl Into<String>) -> Self {
        Outcome::Failure {
            kind,
            error: detail.into(),
        }
    }

    /// Status string as reported to users.
    pub fn status(&self) -> &'static str {
        match self {
            Outcome::Success { .. } => "success",
            Outcome::Warning { .. } => "warning",
            Outcome::Failure { .. } => "error",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, Outcome::Warning { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure { .. })
    }

    /// Borrow the payload if successful.
    pub fn payload(&self) -> Option<&T> {
        match self {
            Outcome::Success { payload } => Some(payload),
            _ => None,
        }
    }

    /// Take the payload if successful.
    pub fn into_payload(self) -> Option<T> {
        match self {
            Outcome::Success { payload } => Some(payload),
            _ => None,
        }
    }

    /// Human-readable message for warnings and failures.
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Success { .. } => None,
            Outcome::Warning { message } => Some(message),
            Outcome::Failure { error, .. } => Some(error),
        }
    }

    /// Map the success payload.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Success { payload } => Outcome::Success {
                payload: f(payload),
            },
            Outcome::Warning { message } => Outcome::Warning { message },
            Outcome::Failure { kind, error } => Outcome::Failure { kind, error },
        }
    }
}

impl<T> From<crate::Result<T>> for Outcome<T> {
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(payload) => Outcome::success(payload),
            Err(err) => Outcome::failure(FailureKind::from(&err), err.to_string()),
        }
    }
}
