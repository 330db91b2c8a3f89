//! Result and error types for Recorrer.

use thiserror::Error;

/// Result type for Recorrer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Recorrer
#[derive(Debug, Error)]
pub enum Error {
    /// A wait condition never became true within its timeout.
    ///
    /// Carries enough context to debug the failure without re-running:
    /// the selector description, the condition waited for, elapsed time,
    /// and the last observed match count/state.
    #[error("timed out after {elapsed_ms}ms waiting for '{selector}' to be {condition} (last count: {last_count}, last state: {last_state})")]
    Timeout {
        /// Human-readable selector description
        selector: String,
        /// The condition that was waited for
        condition: String,
        /// Elapsed time in milliseconds
        elapsed_ms: u64,
        /// Match count at the last poll
        last_count: usize,
        /// State of the first match at the last poll
        last_state: String,
    },

    /// A locator name was registered twice in the same registry
    #[error("locator '{name}' is already defined in this registry")]
    DuplicateName {
        /// The duplicated locator name
        name: String,
    },

    /// A required parameter was not bound at resolution time
    #[error("locator '{descriptor}' requires parameter '{parameter}'")]
    MissingParameter {
        /// Descriptor name
        descriptor: String,
        /// Missing parameter name
        parameter: String,
    },

    /// A bound parameter would break the underlying selector strategy
    #[error("invalid value for parameter '{parameter}' of locator '{descriptor}': {message}")]
    InvalidParameter {
        /// Descriptor name
        descriptor: String,
        /// Offending parameter name
        parameter: String,
        /// Why the value was rejected
        message: String,
    },

    /// A flow postcondition check failed after all steps executed
    #[error("assertion failed: {message}")]
    AssertionFailed {
        /// What was expected vs observed
        message: String,
    },

    /// The underlying automation engine reported an unclassified error
    #[error("interaction failed: {message}")]
    Interaction {
        /// Error message from the engine
        message: String,
    },

    /// A flow failed at a specific named step
    #[error("flow '{flow}' failed at step '{step}'")]
    FlowStep {
        /// Flow name
        flow: String,
        /// Step name (or "precondition"/"postcondition" phase)
        step: String,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// Navigation failed
    #[error("navigation to {url} failed: {message}")]
    Navigation {
        /// Target URL
        url: String,
        /// Error message
        message: String,
    },

    /// Session snapshot missing or invalid
    #[error("session state error: {message}")]
    Session {
        /// Error message
        message: String,
    },

    /// Cross-suite handoff contract violated
    #[error("handoff error: {message}")]
    Handoff {
        /// Error message
        message: String,
    },

    /// Downloaded export could not be handled
    #[error("export error: {message}")]
    Export {
        /// Error message
        message: String,
    },

    /// Environment configuration missing or malformed
    #[error("configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Browser executable not found
    #[error("browser not found; install Chromium or set CHROMIUM_PATH")]
    BrowserNotFound,

    /// Browser launch error
    #[error("failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Page-level browser error
    #[error("page error: {message}")]
    Page {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True when this error (or, for flow failures, its root cause) is a
    /// wait timeout rather than a programming error or assertion failure.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::FlowStep { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Walk to the innermost non-`FlowStep` cause.
    #[must_use]
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::FlowStep { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_carries_context() {
        let err = Error::Timeout {
            selector: "create-project-button".to_string(),
            condition: "visible".to_string(),
            elapsed_ms: 30_150,
            last_count: 0,
            last_state: "absent".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("create-project-button"));
        assert!(msg.contains("visible"));
        assert!(msg.contains("30150ms"));
        assert!(msg.contains("last count: 0"));
    }

    #[test]
    fn test_flow_step_preserves_source() {
        let inner = Error::AssertionFailed {
            message: "row count was 5, expected <= 2".to_string(),
        };
        let err = Error::FlowStep {
            flow: "reset table".to_string(),
            step: "postcondition".to_string(),
            source: Box::new(inner),
        };
        assert!(!err.is_timeout());
        assert!(matches!(
            err.root_cause(),
            Error::AssertionFailed { .. }
        ));
        assert!(err.to_string().contains("reset table"));
    }

    #[test]
    fn test_is_timeout_through_nested_flows() {
        let timeout = Error::Timeout {
            selector: "modal".to_string(),
            condition: "visible".to_string(),
            elapsed_ms: 100,
            last_count: 0,
            last_state: "absent".to_string(),
        };
        let nested = Error::FlowStep {
            flow: "create project".to_string(),
            step: "open modal".to_string(),
            source: Box::new(Error::FlowStep {
                flow: "open modal".to_string(),
                step: "precondition".to_string(),
                source: Box::new(timeout),
            }),
        };
        assert!(nested.is_timeout());
    }
}
