//! Error types for the keyword planner

use thiserror::Error;

/// Result type alias for keyword planner operations
pub type PlannerResult<T> = std::result::Result<T, PlannerError>;

/// Errors surfaced by the planner and its remote services
#[derive(Error, Debug, Clone)]
pub enum PlannerError {
    /// Network, timeout or authentication failure from the transport
    #[error("Transport failure: {message}")]
    Transport {
        message: String,
        status_code: Option<u16>,
    },

    /// The remote service rejected the request (invalid resource, quota, malformed request)
    #[error("Remote API error: {message}")]
    RemoteApi {
        message: String,
        status_code: Option<u16>,
        /// Vendor error body, verbatim
        payload: Option<String>,
    },

    /// Deleting the ephemeral keyword plan failed, so remote resources are left behind
    #[error("{}", leak_message(.plan, .cleanup, .primary))]
    ResourceLeak {
        /// Resource name of the plan that could not be deleted
        plan: String,
        /// Why the deletion failed
        cleanup: Box<PlannerError>,
        /// The error that was already in flight when cleanup ran, if any
        primary: Option<Box<PlannerError>>,
    },

    /// Invalid provider configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A response body could not be decoded
    #[error("Parsing error: {0}")]
    Parse(String),

    /// The service answered with a payload that does not fit the operation
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

fn leak_message(
    plan: &str,
    cleanup: &PlannerError,
    primary: &Option<Box<PlannerError>>,
) -> String {
    match primary {
        Some(primary) => format!(
            "{primary} (additionally, keyword plan {plan} could not be deleted: {cleanup})"
        ),
        None => format!("Keyword plan {plan} could not be deleted: {cleanup}"),
    }
}

impl PlannerError {
    /// The error that caused the call to fail in the first place.
    ///
    /// For a [`PlannerError::ResourceLeak`] raised while another error was
    /// propagating this is that earlier error; otherwise it is `self`.
    pub fn primary(&self) -> &PlannerError {
        match self {
            PlannerError::ResourceLeak {
                primary: Some(primary),
                ..
            } => primary.primary(),
            other => other,
        }
    }

    /// Whether remote resources were left behind
    pub fn is_leak(&self) -> bool {
        matches!(self, PlannerError::ResourceLeak { .. })
    }
}

impl From<reqwest::Error> for PlannerError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());

        match status_code {
            Some(code) if code != 401 && code != 403 && error.is_status() => {
                PlannerError::RemoteApi {
                    message: error.to_string(),
                    status_code,
                    payload: None,
                }
            }
            _ => PlannerError::Transport {
                message: error.to_string(),
                status_code,
            },
        }
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(error: serde_json::Error) -> Self {
        PlannerError::Parse(format!("JSON parsing failed: {error}"))
    }
}

impl From<url::ParseError> for PlannerError {
    fn from(error: url::ParseError) -> Self {
        PlannerError::Config(format!("Invalid URL: {error}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(message: &str) -> PlannerError {
        PlannerError::RemoteApi {
            message: message.to_string(),
            status_code: Some(400),
            payload: None,
        }
    }

    #[test]
    fn test_primary_of_plain_error_is_itself() {
        let error = remote("bad request");
        assert!(matches!(error.primary(), PlannerError::RemoteApi { message, .. } if message == "bad request"));
        assert!(!error.is_leak());
    }

    #[test]
    fn test_leak_keeps_primary_error() {
        let error = PlannerError::ResourceLeak {
            plan: "customers/1/keywordPlans/2".to_string(),
            cleanup: Box::new(PlannerError::Transport {
                message: "connection reset".to_string(),
                status_code: None,
            }),
            primary: Some(Box::new(remote("quota exhausted"))),
        };

        assert!(error.is_leak());
        match error.primary() {
            PlannerError::RemoteApi { message, .. } => assert_eq!(message, "quota exhausted"),
            other => panic!("Expected RemoteApi, got {other:?}"),
        }

        let rendered = error.to_string();
        assert!(rendered.contains("quota exhausted"));
        assert!(rendered.contains("customers/1/keywordPlans/2"));
        assert!(rendered.contains("connection reset"));
    }

    #[test]
    fn test_leak_without_primary() {
        let error = PlannerError::ResourceLeak {
            plan: "customers/1/keywordPlans/9".to_string(),
            cleanup: Box::new(remote("not found")),
            primary: None,
        };

        assert!(error.primary().is_leak());
        assert!(error
            .to_string()
            .starts_with("Keyword plan customers/1/keywordPlans/9 could not be deleted"));
    }
}
