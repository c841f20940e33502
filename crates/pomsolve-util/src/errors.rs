use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all pomsolve operations.
#[derive(Debug, Error, Diagnostic)]
pub enum PomError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed POM content: an unresolvable placeholder, a managed entry
    /// without a version, a missing artifact, a malformed repository URL,
    /// or a cycle in the parent chain.
    #[error("POM parse error: {message}")]
    Parse { message: String },

    /// Network request or download failed.
    #[error("Network error: {message}")]
    Network { message: String },

    /// Workspace cache store failure.
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

/// Convenience alias for `miette::Result<T>`.
pub type PomResult<T> = miette::Result<T>;

/// Rethrow policy for resolver stages: parse-class errors pass through
/// unchanged, anything else is wrapped as a parse error carrying the
/// original message.
pub fn into_parse(err: miette::Report) -> miette::Report {
    if matches!(err.downcast_ref::<PomError>(), Some(PomError::Parse { .. })) {
        err
    } else {
        PomError::Parse {
            message: err.to_string(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_errors_pass_through() {
        let err: miette::Report = PomError::Parse {
            message: "bad pom".to_string(),
        }
        .into();
        let wrapped = into_parse(err);
        assert_eq!(wrapped.to_string(), "POM parse error: bad pom");
    }

    #[test]
    fn other_errors_are_wrapped() {
        let err: miette::Report = PomError::Network {
            message: "connection refused".to_string(),
        }
        .into();
        let wrapped = into_parse(err);
        assert!(wrapped.to_string().starts_with("POM parse error:"));
        assert!(wrapped.to_string().contains("connection refused"));
    }
}
