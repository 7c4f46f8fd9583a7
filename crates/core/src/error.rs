//! Error types for partition selection.

/// Errors that can occur while configuring a partition selection strategy.
///
/// Decisions never fail: every error is raised while building a strategy
/// or a noise mechanism.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DpError {
    /// Invalid argument provided to a builder.
    ///
    /// The message is displayed verbatim so that callers can match on a
    /// stable prefix such as `"Epsilon has to be set"`.
    #[error("{msg}")]
    InvalidArgument {
        /// Human-readable error description.
        msg: String,
    },
}

/// Result type for partition selection operations.
pub type Result<T> = std::result::Result<T, DpError>;

impl DpError {
    /// Create an invalid argument error.
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument { msg: msg.into() }
    }

    /// The error message without any decoration.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidArgument { msg } => msg,
        }
    }

    /// Whether this is an invalid argument error.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }
}
