//! Shared error type across serguard crates.

use thiserror::Error;

/// Stable error codes (used by tooling and test vectors).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The underlying input failed or ended early.
    Io,
    /// Bytes do not follow the stream grammar.
    StreamCorrupted,
    /// Primitive data found where an object was expected.
    OptionalData,
    /// The resolver does not know the type.
    ClassNotFound,
    /// The resolver knows the type but the descriptor does not match it.
    InvalidClass,
    /// The producer aborted while writing and serialized the exception instead.
    WriteAborted,
    /// Nesting went past the configured limit.
    DepthExceeded,
    /// A denylisted type was about to be resolved.
    SecurityViolation,
    /// The stream was already closed.
    Closed,
    /// Invalid configuration.
    Config,
}

impl ErrorCode {
    /// String representation used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Io => "IO",
            ErrorCode::StreamCorrupted => "STREAM_CORRUPTED",
            ErrorCode::OptionalData => "OPTIONAL_DATA",
            ErrorCode::ClassNotFound => "CLASS_NOT_FOUND",
            ErrorCode::InvalidClass => "INVALID_CLASS",
            ErrorCode::WriteAborted => "WRITE_ABORTED",
            ErrorCode::DepthExceeded => "DEPTH_EXCEEDED",
            ErrorCode::SecurityViolation => "SECURITY_VIOLATION",
            ErrorCode::Closed => "CLOSED",
            ErrorCode::Config => "CONFIG",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Unified error type used by the reader, the gate and tooling.
#[derive(Debug, Error)]
pub enum GuardError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("stream corrupted: {0}")]
    StreamCorrupted(String),
    #[error("optional data: {0} bytes of primitive data where an object was expected")]
    OptionalData(usize),
    #[error("class not found: {0}")]
    ClassNotFound(String),
    #[error("invalid class {name}: {reason}")]
    InvalidClass { name: String, reason: String },
    #[error("writing aborted by {0}")]
    WriteAborted(String),
    #[error("nesting depth exceeds {0}")]
    DepthExceeded(usize),
    // The matched entry is never part of the message.
    #[error("Illegal type to deserialize: prevented for security reasons")]
    SecurityViolation,
    #[error("stream closed")]
    Closed,
    #[error("config: {0}")]
    Config(String),
}

impl GuardError {
    /// Map to a stable code.
    pub fn code(&self) -> ErrorCode {
        match self {
            GuardError::Io(_) => ErrorCode::Io,
            GuardError::StreamCorrupted(_) => ErrorCode::StreamCorrupted,
            GuardError::OptionalData(_) => ErrorCode::OptionalData,
            GuardError::ClassNotFound(_) => ErrorCode::ClassNotFound,
            GuardError::InvalidClass { .. } => ErrorCode::InvalidClass,
            GuardError::WriteAborted(_) => ErrorCode::WriteAborted,
            GuardError::DepthExceeded(_) => ErrorCode::DepthExceeded,
            GuardError::SecurityViolation => ErrorCode::SecurityViolation,
            GuardError::Closed => ErrorCode::Closed,
            GuardError::Config(_) => ErrorCode::Config,
        }
    }

    pub fn is_security_violation(&self) -> bool {
        matches!(self, GuardError::SecurityViolation)
    }

    pub(crate) fn corrupted(msg: impl Into<String>) -> Self {
        GuardError::StreamCorrupted(msg.into())
    }
}
