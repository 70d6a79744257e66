//! Error types for inet_diag operations.

use std::io;

/// Result type for inet_diag operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while enumerating sockets.
///
/// Transport and decode errors are terminal for the request that produced
/// them: no partial record list is returned alongside an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The netlink socket could not be created or bound.
    #[error("cannot create netlink socket: {0}")]
    SocketCreationFailed(#[source] io::Error),

    /// The request could not be sent.
    #[error("cannot send netlink request: {0}")]
    SendFailed(#[source] io::Error),

    /// Reading a reply datagram failed (includes receive timeouts).
    #[error("cannot receive netlink reply: {0}")]
    ReceiveFailed(#[source] io::Error),

    /// The kernel answered with an `NLMSG_ERROR` envelope.
    #[error("kernel error: {message} (code {code})")]
    KernelReportedError {
        /// The raw (negative) error code embedded in the reply.
        code: i32,
        /// Human-readable error message.
        message: String,
    },

    /// A reply ended in the middle of an envelope or header.
    #[error("message truncated: expected {expected} bytes, got {actual}")]
    TruncatedMessage {
        /// Bytes the envelope declared or required.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// An envelope or diagnostic record could not be decoded.
    #[error("malformed record: {reason}")]
    MalformedRecord {
        /// What was wrong with the record.
        reason: String,
    },

    /// The kernel reported `NLMSG_OVERRUN`: part of the reply was lost.
    #[error("kernel dropped part of the reply")]
    Overrun,

    /// Address family other than AF_INET / AF_INET6.
    #[error("unsupported address family: {0}")]
    UnsupportedFamily(u8),

    /// The reply grew past the configured byte ceiling before `NLMSG_DONE`.
    #[error("reply exceeded {limit} bytes (received {received})")]
    ByteLimitExceeded {
        /// Configured ceiling.
        limit: usize,
        /// Bytes received so far.
        received: usize,
    },

    /// Writing a raw reply chunk to the capture sink failed.
    #[error("cannot write raw capture: {0}")]
    Capture(#[source] io::Error),
}

impl Error {
    /// Create a kernel error from the code embedded in an `NLMSG_ERROR` payload.
    pub fn from_code(code: i32) -> Self {
        let message = io::Error::from_raw_os_error(code.saturating_neg()).to_string();
        Self::KernelReportedError { code, message }
    }

    /// Create a malformed-record error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            reason: reason.into(),
        }
    }

    /// Get the positive errno value if this is a kernel error.
    pub fn errno(&self) -> Option<i32> {
        match self {
            Self::KernelReportedError { code, .. } => Some(code.saturating_neg()),
            _ => None,
        }
    }

    /// Check if this is a permission error (EPERM, EACCES).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self.errno(), Some(libc::EPERM) | Some(libc::EACCES))
    }

    /// Check if the reply was cut short.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Self::TruncatedMessage { .. })
    }

    /// Check if a receive timed out.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::ReceiveFailed(e) => e.kind() == io::ErrorKind::TimedOut,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        let err = Error::from_code(-1); // EPERM
        assert!(err.is_permission_denied());
        assert_eq!(err.errno(), Some(1));
        assert!(matches!(err, Error::KernelReportedError { code: -1, .. }));
    }

    #[test]
    fn test_kernel_error_message() {
        let err = Error::from_code(-2); // ENOENT
        let msg = err.to_string();
        assert!(msg.contains("No such file or directory"));
        assert!(msg.contains("code -2"));
    }

    #[test]
    fn test_is_truncated() {
        let err = Error::TruncatedMessage {
            expected: 16,
            actual: 3,
        };
        assert!(err.is_truncated());
        assert!(!Error::UnsupportedFamily(1).is_truncated());
    }

    #[test]
    fn test_is_timeout() {
        let err = Error::ReceiveFailed(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
        assert!(err.is_timeout());
        let err = Error::ReceiveFailed(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(!err.is_timeout());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            Error::UnsupportedFamily(1).to_string(),
            "unsupported address family: 1"
        );
        assert_eq!(
            Error::malformed("short payload").to_string(),
            "malformed record: short payload"
        );
        assert_eq!(
            Error::ByteLimitExceeded {
                limit: 4096,
                received: 8192
            }
            .to_string(),
            "reply exceeded 4096 bytes (received 8192)"
        );
    }
}
