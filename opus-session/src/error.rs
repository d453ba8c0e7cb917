//! Error types for Opus sessions.

use std::os::raw::c_int;

use thiserror::Error;

use crate::ffi;

/// Error returned by libopus calls, one variant per native error code.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// A bad parameter was passed to the library.
    #[error("opus: received a bad argument")]
    InvalidArgument,

    /// The output buffer could not hold the result.
    #[error("opus: received a buffer that is too small")]
    BufferTooSmall,

    /// The library hit an unexpected internal fault.
    #[error("opus: ran into an internal error")]
    InternalError,

    /// The packet bytes are malformed.
    #[error("opus: received an invalid packet")]
    InvalidPacket,

    /// The request is not supported by this libopus build.
    #[error("opus: asked to do something that is not implemented")]
    Unimplemented,

    /// The encoder/decoder state is invalid for the request.
    #[error("opus: asked to do something with an invalid encoder/decoder")]
    InvalidState,

    /// Memory allocation failed.
    #[error("opus: failed to allocate memory")]
    OutOfMemory,

    /// A negative return code libopus does not document.
    #[error("opus: unknown error code {0}")]
    Unknown(i32),
}

/// Failure class a host binding maps a [`CodecError`] onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller passed something unusable (bad argument, packet or buffer).
    Value,
    /// The library or session failed at runtime.
    Runtime,
    /// The feature is missing from the library build.
    NotImplemented,
    /// Allocation failed.
    Memory,
}

impl CodecError {
    /// Translates a libopus return code.
    ///
    /// Returns `None` for non-negative codes, which libopus uses for success
    /// (often carrying a byte or sample count).
    pub fn from_code(code: c_int) -> Option<Self> {
        if code >= 0 {
            return None;
        }
        Some(match code {
            ffi::OPUS_BAD_ARG => Self::InvalidArgument,
            ffi::OPUS_BUFFER_TOO_SMALL => Self::BufferTooSmall,
            ffi::OPUS_INTERNAL_ERROR => Self::InternalError,
            ffi::OPUS_INVALID_PACKET => Self::InvalidPacket,
            ffi::OPUS_UNIMPLEMENTED => Self::Unimplemented,
            ffi::OPUS_INVALID_STATE => Self::InvalidState,
            ffi::OPUS_ALLOC_FAIL => Self::OutOfMemory,
            other => Self::Unknown(other),
        })
    }

    /// Returns the libopus error code for this error.
    pub fn code(&self) -> i32 {
        match self {
            Self::InvalidArgument => ffi::OPUS_BAD_ARG,
            Self::BufferTooSmall => ffi::OPUS_BUFFER_TOO_SMALL,
            Self::InternalError => ffi::OPUS_INTERNAL_ERROR,
            Self::InvalidPacket => ffi::OPUS_INVALID_PACKET,
            Self::Unimplemented => ffi::OPUS_UNIMPLEMENTED,
            Self::InvalidState => ffi::OPUS_INVALID_STATE,
            Self::OutOfMemory => ffi::OPUS_ALLOC_FAIL,
            Self::Unknown(code) => *code,
        }
    }

    /// Returns the host-level failure class.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument | Self::BufferTooSmall | Self::InvalidPacket => {
                ErrorCategory::Value
            }
            Self::InternalError | Self::InvalidState | Self::Unknown(_) => ErrorCategory::Runtime,
            Self::Unimplemented => ErrorCategory::NotImplemented,
            Self::OutOfMemory => ErrorCategory::Memory,
        }
    }
}

/// Result type for Opus operations.
pub type Result<T> = std::result::Result<T, CodecError>;

/// Checks a libopus return value, passing non-negative values through.
pub(crate) fn check(ret: c_int) -> Result<c_int> {
    match CodecError::from_code(ret) {
        None => Ok(ret),
        Some(err) => {
            tracing::warn!(code = ret, reason = %ffi::error_string(ret), "opus call failed");
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_success() {
        assert_eq!(CodecError::from_code(0), None);
        assert_eq!(CodecError::from_code(42), None);
    }

    #[test]
    fn test_from_code_known() {
        assert_eq!(CodecError::from_code(-1), Some(CodecError::InvalidArgument));
        assert_eq!(CodecError::from_code(-2), Some(CodecError::BufferTooSmall));
        assert_eq!(CodecError::from_code(-3), Some(CodecError::InternalError));
        assert_eq!(CodecError::from_code(-4), Some(CodecError::InvalidPacket));
        assert_eq!(CodecError::from_code(-5), Some(CodecError::Unimplemented));
        assert_eq!(CodecError::from_code(-6), Some(CodecError::InvalidState));
        assert_eq!(CodecError::from_code(-7), Some(CodecError::OutOfMemory));
    }

    #[test]
    fn test_from_code_unknown() {
        assert_eq!(CodecError::from_code(-99), Some(CodecError::Unknown(-99)));
    }

    #[test]
    fn test_code_inverts_from_code() {
        for code in -8..0 {
            let err = CodecError::from_code(code).unwrap();
            assert_eq!(err.code(), code);
        }
    }

    #[test]
    fn test_category() {
        assert_eq!(CodecError::InvalidArgument.category(), ErrorCategory::Value);
        assert_eq!(CodecError::BufferTooSmall.category(), ErrorCategory::Value);
        assert_eq!(CodecError::InvalidPacket.category(), ErrorCategory::Value);
        assert_eq!(CodecError::InternalError.category(), ErrorCategory::Runtime);
        assert_eq!(CodecError::InvalidState.category(), ErrorCategory::Runtime);
        assert_eq!(CodecError::Unimplemented.category(), ErrorCategory::NotImplemented);
        assert_eq!(CodecError::OutOfMemory.category(), ErrorCategory::Memory);
    }

    #[test]
    fn test_check() {
        assert_eq!(check(120), Ok(120));
        assert_eq!(check(0), Ok(0));
        assert_eq!(check(ffi::OPUS_INVALID_PACKET), Err(CodecError::InvalidPacket));
    }

    #[test]
    fn test_error_display() {
        let err = CodecError::InvalidPacket;
        assert!(format!("{}", err).contains("invalid packet"));

        let err = CodecError::Unknown(-42);
        assert!(format!("{}", err).contains("-42"));
    }
}
