use caplog_logging::FormatError;
use thiserror::Error;

/// Result type alias using CaptureError
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Stable error classification
///
/// Each kind maps to a stable code usable in assertions and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyStarted,
    UnknownFormatter,
    InvalidOption,
    Render,
    ServiceUnavailable,
    InvalidConfig,
    Startup,
}

impl ErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::AlreadyStarted => "ERR_ALREADY_STARTED",
            ErrorKind::UnknownFormatter => "ERR_UNKNOWN_FORMATTER",
            ErrorKind::InvalidOption => "ERR_INVALID_OPTION",
            ErrorKind::Render => "ERR_RENDER",
            ErrorKind::ServiceUnavailable => "ERR_SERVICE_UNAVAILABLE",
            ErrorKind::InvalidConfig => "ERR_INVALID_CONFIG",
            ErrorKind::Startup => "ERR_STARTUP",
        }
    }
}

/// Errors raised by the capture service and its wrappers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CaptureError {
    /// A capture service is already running for this facility
    #[error("Capture service already started")]
    AlreadyStarted,

    /// Formatter could not be resolved or configured
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The service actor is gone (all handles dropped or runtime shut down)
    #[error("Capture service unavailable during {op}")]
    ServiceUnavailable { op: String },

    /// Configuration could not be loaded or is inconsistent
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The service could not be spawned
    #[error("Failed to start capture service: {message}")]
    Startup { message: String },
}

impl CaptureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CaptureError::AlreadyStarted => ErrorKind::AlreadyStarted,
            CaptureError::Format(FormatError::UnknownFormatter { .. }) => {
                ErrorKind::UnknownFormatter
            }
            CaptureError::Format(FormatError::InvalidOption { .. }) => ErrorKind::InvalidOption,
            CaptureError::Format(_) => ErrorKind::Render,
            CaptureError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            CaptureError::InvalidConfig { .. } => ErrorKind::InvalidConfig,
            CaptureError::Startup { .. } => ErrorKind::Startup,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    pub(crate) fn unavailable(op: &str) -> Self {
        CaptureError::ServiceUnavailable { op: op.to_string() }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        CaptureError::InvalidConfig {
            message: message.into(),
        }
    }
}
