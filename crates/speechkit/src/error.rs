//! SpeechKit client errors

use thiserror::Error;

/// Errors that can occur while talking to the speech service or the
/// external audio encoder
#[derive(Debug, Error)]
pub enum SpeechKitError {
    /// A caller-supplied parameter violated a documented precondition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Credential acquisition failed or yielded no usable token
    #[error("Authorization failed: {0}")]
    Auth(String),

    /// The service answered with a non-success status code
    #[error("Request failed with status {status}: {body}")]
    ApiStatus {
        /// HTTP status code of the response
        status: u16,
        /// Response body snippet, best effort
        body: String,
    },

    /// The HTTP exchange failed before a status code was available
    #[error("Request failed: {0}")]
    ApiTransport(String),

    /// The response arrived but did not carry the expected payload
    #[error("Unexpected response payload: {0}")]
    ApiPayload(String),

    /// The external audio encoder failed
    #[error("Audio conversion failed: {message}")]
    Conversion {
        /// What went wrong
        message: String,
        /// Encoder exit code, when the process ran to termination
        exit_code: Option<i32>,
        /// Captured standard error output
        stderr: String,
    },

    /// The operation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,
}

impl SpeechKitError {
    /// Whether this is a precondition violation reported before any side
    /// effect took place
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Whether this came out of credential acquisition
    #[must_use]
    pub const fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Whether this is an API failure: bad status, transport error, or an
    /// unusable response payload
    #[must_use]
    pub const fn is_api(&self) -> bool {
        matches!(
            self,
            Self::ApiStatus { .. } | Self::ApiTransport(_) | Self::ApiPayload(_)
        )
    }

    /// Whether the external encoder failed
    #[must_use]
    pub const fn is_conversion(&self) -> bool {
        matches!(self, Self::Conversion { .. })
    }

    /// Whether the operation was cancelled by the caller
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for SpeechKitError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::ApiTransport(format!("timed out: {err}"))
        } else if err.is_connect() {
            Self::ApiTransport(format!("connection failed: {err}"))
        } else {
            Self::ApiTransport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_error_message() {
        let err = SpeechKitError::InvalidArgument("speed out of range".to_string());
        assert_eq!(err.to_string(), "Invalid argument: speed out of range");
    }

    #[test]
    fn auth_error_message() {
        let err = SpeechKitError::Auth("exchange returned an empty token".to_string());
        assert_eq!(
            err.to_string(),
            "Authorization failed: exchange returned an empty token"
        );
    }

    #[test]
    fn api_status_error_message() {
        let err = SpeechKitError::ApiStatus {
            status: 429,
            body: "too many requests".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Request failed with status 429: too many requests"
        );
    }

    #[test]
    fn api_transport_error_message() {
        let err = SpeechKitError::ApiTransport("connection reset".to_string());
        assert_eq!(err.to_string(), "Request failed: connection reset");
    }

    #[test]
    fn api_payload_error_message() {
        let err = SpeechKitError::ApiPayload("missing result field".to_string());
        assert_eq!(
            err.to_string(),
            "Unexpected response payload: missing result field"
        );
    }

    #[test]
    fn conversion_error_message() {
        let err = SpeechKitError::Conversion {
            message: "encoder exited with code 1".to_string(),
            exit_code: Some(1),
            stderr: "bad input".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Audio conversion failed: encoder exited with code 1"
        );
    }

    #[test]
    fn cancelled_error_message() {
        let err = SpeechKitError::Cancelled;
        assert_eq!(err.to_string(), "Operation cancelled");
    }

    #[test]
    fn api_predicate_groups_all_three_api_variants() {
        let status = SpeechKitError::ApiStatus {
            status: 500,
            body: String::new(),
        };
        let transport = SpeechKitError::ApiTransport("reset".to_string());
        let payload = SpeechKitError::ApiPayload("empty body".to_string());

        assert!(status.is_api());
        assert!(transport.is_api());
        assert!(payload.is_api());
        assert!(!SpeechKitError::Cancelled.is_api());
    }

    #[test]
    fn predicates_match_their_own_kind_only() {
        let err = SpeechKitError::InvalidArgument("bad rate".to_string());
        assert!(err.is_invalid_argument());
        assert!(!err.is_auth());
        assert!(!err.is_api());
        assert!(!err.is_conversion());
        assert!(!err.is_cancelled());
    }
}
