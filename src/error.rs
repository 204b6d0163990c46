//! Custom error types for the monochromator driver.
//!
//! This module defines the primary error type, [`MonoError`], used across the
//! crate. Using the `thiserror` crate, it gives every failure mode of a
//! command/response exchange its own variant so callers can react per kind
//! instead of string-matching messages.
//!
//! ## Error taxonomy
//!
//! - **`Config`**: semantic errors in the connection settings (unsupported
//!   baud rate, zero timeout). Always raised before any I/O is attempted.
//! - **`NotConnected`**: an operation was invoked after `disconnect()` (or
//!   before any connection existed). The operation is aborted; nothing is
//!   written to the wire.
//! - **`Io`**: wraps `std::io::Error` from the underlying transport.
//! - **`Timeout`**: the reply terminator was not observed within the
//!   configured window. Carries whatever partial text did arrive, since an
//!   empty reply is a meaningful "still busy" signal during homing.
//! - **`Parse`**: a reply arrived but could not be converted to the expected
//!   type. Never coerced to a default value.
//! - **`InvalidArgument`**: an argument outside its enumerated set (e.g. an
//!   unknown control mode). Rejected before any bytes are transmitted.

use thiserror::Error;

/// Convenience alias for results using the driver error type.
pub type MonoResult<T> = std::result::Result<T, MonoError>;

/// Error type for every fallible operation in this crate.
#[derive(Error, Debug)]
pub enum MonoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Monochromator is not connected")]
    NotConnected,

    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out waiting for reply terminator (partial reply: {partial:?})")]
    Timeout {
        /// Bytes received before the deadline, decoded lossily. May be empty.
        partial: String,
    },

    #[error("Could not parse reply {reply:?} as {expected}")]
    Parse {
        /// The raw reply text, terminator already stripped.
        reply: String,
        /// Human-readable name of the expected type.
        expected: &'static str,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MonoError::Parse {
            reply: "garbage".to_string(),
            expected: "integer position",
        };
        assert_eq!(
            err.to_string(),
            "Could not parse reply \"garbage\" as integer position"
        );
    }

    #[test]
    fn test_timeout_carries_partial_reply() {
        let err = MonoError::Timeout {
            partial: "HOM".to_string(),
        };
        assert!(err.to_string().contains("HOM"));
    }
}
