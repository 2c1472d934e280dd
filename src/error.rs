//! Error types with retry classification.
//!
//! Local validation failures never reach the network; remote failures are
//! surfaced as typed variants carrying a human-readable message and, where
//! the server provides one, a machine-discriminable code. Transient errors
//! (network, 5xx) may be retried once for idempotent reads; 4xx never.

use thiserror::Error;

use crate::model::ErrorBody;
use crate::split::SplitError;

/// Which step of a two-step mutation had already committed when the
/// failure happened. Callers must surface these distinctly: the first
/// step is persisted server-side and will not be rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletedStep {
    /// The expense was created; its shares/links were not.
    ExpenseCreated,
    /// The external payment was confirmed; the expense was not updated.
    PaymentConfirmed,
    /// The expense amount was reduced; the status update did not land.
    AmountReduced,
}

impl std::fmt::Display for CompletedStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ExpenseCreated => write!(f, "expense created"),
            Self::PaymentConfirmed => write!(f, "payment confirmed"),
            Self::AmountReduced => write!(f, "expense amount reduced"),
        }
    }
}

/// Failure of a client operation.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Local pre-flight validation failed; no request was made.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The token was rejected and the silent refresh attempt failed.
    #[error("authentication required")]
    Unauthorized,

    /// The requested entity does not exist (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// The server rejected the request (other 4xx).
    #[error("request rejected ({status}): {message}")]
    Remote {
        status: u16,
        /// Machine-readable code from the server error body, if any.
        code: Option<String>,
        message: String,
    },

    /// The server failed (5xx).
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never completed (DNS, connect, timeout).
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be decoded.
    #[error("invalid response: {0}")]
    Decode(String),

    /// A multi-step mutation failed after its first step committed.
    #[error("operation failed after step \"{completed}\": {source}")]
    Partial {
        completed: CompletedStep,
        #[source]
        source: Box<ApiError>,
    },
}

impl ApiError {
    /// Wrap a follow-up failure, recording which step already committed.
    pub fn after(completed: CompletedStep, source: ApiError) -> Self {
        ApiError::Partial {
            completed,
            source: Box::new(source),
        }
    }

    /// Build from an HTTP status and the parsed server error body.
    ///
    /// `action` is a short description of what was attempted, used when
    /// the server gives no message of its own.
    pub fn from_status(status: u16, body: ErrorBody, action: &str) -> Self {
        let message = body
            .message
            .clone()
            .or_else(|| body.error.clone())
            .unwrap_or_else(|| format!("failed to {}", action));

        match status {
            401 => ApiError::Unauthorized,
            404 => ApiError::NotFound(message),
            400..=499 => ApiError::Remote {
                status,
                code: body.error,
                message,
            },
            _ => ApiError::Server { status, message },
        }
    }

    /// Whether a retry might succeed (network failures and 5xx).
    ///
    /// Only idempotent reads should actually be retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Server { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

impl From<SplitError> for ApiError {
    fn from(err: SplitError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        let body = ErrorBody {
            message: Some("Conta não encontrada".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            ApiError::from_status(404, body, "fetch expense"),
            ApiError::NotFound(m) if m == "Conta não encontrada"
        ));

        assert!(matches!(
            ApiError::from_status(422, ErrorBody::default(), "split expense"),
            ApiError::Remote { status: 422, .. }
        ));

        assert!(matches!(
            ApiError::from_status(503, ErrorBody::default(), "list"),
            ApiError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn fallback_message_names_the_action() {
        match ApiError::from_status(400, ErrorBody::default(), "create debt") {
            ApiError::Remote { message, .. } => assert_eq!(message, "failed to create debt"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn transient_classification() {
        assert!(ApiError::Network("timeout".into()).is_transient());
        assert!(ApiError::Server {
            status: 502,
            message: "bad gateway".into()
        }
        .is_transient());
        assert!(!ApiError::Remote {
            status: 400,
            code: None,
            message: "nope".into()
        }
        .is_transient());
        assert!(!ApiError::Validation("empty".into()).is_transient());
    }

    #[test]
    fn partial_reports_completed_step() {
        let err = ApiError::after(
            CompletedStep::AmountReduced,
            ApiError::Server {
                status: 500,
                message: "boom".into(),
            },
        );
        let text = err.to_string();
        assert!(text.contains("expense amount reduced"), "{}", text);
    }

    #[test]
    fn split_errors_become_validation() {
        let err: ApiError = SplitError::NoParticipants.into();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
