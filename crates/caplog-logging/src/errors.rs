use thiserror::Error;

/// Errors raised by the formatter contract
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    /// No renderer registered under the requested name
    #[error("Unknown formatter: {name}")]
    UnknownFormatter { name: String },

    /// A configuration option has the wrong shape
    #[error("Invalid option '{key}' for formatter {formatter}: {reason}")]
    InvalidOption {
        formatter: String,
        key: String,
        reason: String,
    },

    /// The renderer failed to produce text for an event
    #[error("Render failed in formatter {formatter}: {message}")]
    Render { formatter: String, message: String },

    /// A rendered line could not be parsed back
    #[error("Parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },
}

impl FormatError {
    pub fn render(formatter: impl Into<String>, message: impl Into<String>) -> Self {
        FormatError::Render {
            formatter: formatter.into(),
            message: message.into(),
        }
    }

    pub fn invalid_option(
        formatter: impl Into<String>,
        key: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        FormatError::InvalidOption {
            formatter: formatter.into(),
            key: key.into(),
            reason: reason.into(),
        }
    }
}
