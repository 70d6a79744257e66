//! Netlink message header and constants.

use super::error::{Error, Result};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Every netlink envelope starts on a 4-byte boundary.
pub const NLMSG_ALIGNTO: usize = 4;

/// Round `len` up to the next envelope boundary.
#[inline]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + NLMSG_ALIGNTO - 1) & !(NLMSG_ALIGNTO - 1)
}

/// Bytes taken by `struct nlmsghdr`.
pub const NLMSG_HDRLEN: usize = nlmsg_align(std::mem::size_of::<NlMsgHdr>());

/// `struct nlmsghdr`, in host byte order.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct NlMsgHdr {
    /// Envelope length, header included, padding excluded.
    pub nlmsg_len: u32,
    pub nlmsg_type: u16,
    pub nlmsg_flags: u16,
    /// Echoed back by the kernel in every reply.
    pub nlmsg_seq: u32,
    /// Port id of the sender, 0 for the kernel.
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Header for an empty message of `msg_type`.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        Self {
            nlmsg_len: NLMSG_HDRLEN as u32,
            nlmsg_type: msg_type,
            nlmsg_flags: flags,
            nlmsg_seq: 0,
            nlmsg_pid: 0,
        }
    }

    /// Check if the kernel flagged the dump as interrupted.
    pub fn is_dump_interrupted(&self) -> bool {
        self.nlmsg_flags & NLM_F_DUMP_INTR != 0
    }

    /// Wire bytes of the header.
    pub fn as_bytes(&self) -> &[u8] {
        <Self as IntoBytes>::as_bytes(self)
    }

    /// Parse header from the start of a byte slice.
    ///
    /// The header is copied out, so `data` needs no particular alignment.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::read_from_prefix(data)
            .map(|(h, _)| h)
            .map_err(|_| Error::TruncatedMessage {
                expected: NLMSG_HDRLEN,
                actual: data.len(),
            })
    }
}

/// Control message types shared by every netlink family, and the two
/// sock_diag request types.
pub struct NlMsgType;

impl NlMsgType {
    /// Padding message, ignored.
    pub const NOOP: u16 = 1;
    /// Negated errno, or 0 for an ACK.
    pub const ERROR: u16 = 2;
    /// Terminates a dump.
    pub const DONE: u16 = 3;
    /// The kernel dropped data.
    pub const OVERRUN: u16 = 4;

    /// Legacy TCP diagnostic request (`inet_diag_req`).
    pub const TCPDIAG_GETSOCK: u16 = 18;
    /// Versioned diagnostic request (`inet_diag_req_v2`).
    pub const SOCK_DIAG_BY_FAMILY: u16 = 20;
}

/// `nlmsg_flags` bits.
pub const NLM_F_REQUEST: u16 = 0x01;
pub const NLM_F_MULTI: u16 = 0x02;
pub const NLM_F_DUMP_INTR: u16 = 0x10;

// GET modifiers
pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

/// Read the error code at the start of an `NLMSG_ERROR` payload.
///
/// The code is a negated errno, or 0 for an acknowledgement.
pub fn error_code(payload: &[u8]) -> Result<i32> {
    i32::read_from_prefix(payload)
        .map(|(code, _)| code)
        .map_err(|_| Error::TruncatedMessage {
            expected: std::mem::size_of::<i32>(),
            actual: payload.len(),
        })
}
