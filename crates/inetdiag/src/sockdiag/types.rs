//! Core types for socket diagnostics.
//!
//! This module provides strongly-typed representations of address families,
//! TCP states, request versions, extensions, and the optional diagnostic
//! information carried by inet_diag replies.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::netlink::{Error, Result};

/// Address family of an INET socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AddressFamily {
    /// IPv4.
    Inet = libc::AF_INET as u8,
    /// IPv6.
    Inet6 = libc::AF_INET6 as u8,
}

impl AddressFamily {
    /// Decode a family byte, rejecting anything but AF_INET and AF_INET6.
    pub fn from_u8(value: u8) -> Result<Self> {
        match value as i32 {
            libc::AF_INET => Ok(Self::Inet),
            libc::AF_INET6 => Ok(Self::Inet6),
            _ => Err(Error::UnsupportedFamily(value)),
        }
    }

    /// Width in bytes of an address of this family.
    pub fn address_len(&self) -> usize {
        match self {
            Self::Inet => 4,
            Self::Inet6 => 16,
        }
    }

    /// Netid column value.
    pub fn netid(&self) -> &'static str {
        match self {
            Self::Inet => "tcp",
            Self::Inet6 => "tcp6",
        }
    }
}

/// Which diagnostic request layout to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiagVersion {
    /// Legacy `inet_diag_req` (TCPDIAG_GETSOCK). Dumps TCP sockets of both
    /// families; the kernel ignores the family field of this layout.
    V1,
    /// Versioned `inet_diag_req_v2` (SOCK_DIAG_BY_FAMILY), filtered by family.
    #[default]
    V2,
}

/// TCP connection states, numbered as in the kernel's `TCP_*` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TcpState {
    /// Value outside the known range.
    Unknown = 0,
    Established = 1,
    SynSent = 2,
    SynRecv = 3,
    FinWait1 = 4,
    FinWait2 = 5,
    TimeWait = 6,
    /// Reported by ss as UNCONN.
    Close = 7,
    CloseWait = 8,
    LastAck = 9,
    Listen = 10,
    Closing = 11,
    /// Request socket, never seen on a full socket.
    NewSynRecv = 12,
    BoundInactive = 13,
}

impl TcpState {
    const ALL: [TcpState; 14] = [
        Self::Unknown,
        Self::Established,
        Self::SynSent,
        Self::SynRecv,
        Self::FinWait1,
        Self::FinWait2,
        Self::TimeWait,
        Self::Close,
        Self::CloseWait,
        Self::LastAck,
        Self::Listen,
        Self::Closing,
        Self::NewSynRecv,
        Self::BoundInactive,
    ];

    /// Decode the `idiag_state` byte.
    pub fn from_u8(value: u8) -> Self {
        Self::ALL
            .get(usize::from(value))
            .copied()
            .unwrap_or(Self::Unknown)
    }

    /// Column label as printed by ss.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Established => "ESTAB",
            Self::SynSent => "SYN-SENT",
            Self::SynRecv => "SYN-RECV",
            Self::FinWait1 => "FIN-WAIT-1",
            Self::FinWait2 => "FIN-WAIT-2",
            Self::TimeWait => "TIME-WAIT",
            Self::Close => "UNCONN",
            Self::CloseWait => "CLOSE-WAIT",
            Self::LastAck => "LAST-ACK",
            Self::Listen => "LISTEN",
            Self::Closing => "CLOSING",
            Self::NewSynRecv => "NEW-SYN-RECV",
            Self::BoundInactive => "BOUND-INACTIVE",
        }
    }

    /// Bit of this state in an `idiag_states` mask.
    pub fn mask(&self) -> u32 {
        1 << (*self as u32)
    }

    /// Mask selecting every state in `states`.
    pub fn combine(states: &[TcpState]) -> u32 {
        states.iter().fold(0, |acc, s| acc | s.mask())
    }

    /// Mask selecting every known state.
    pub fn all_mask() -> u32 {
        (1 << Self::ALL.len()) - 1
    }
}

impl fmt::Display for TcpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Extension attributes that can be requested through `idiag_ext`.
///
/// The discriminant is the attribute type the kernel replies with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum InetExtension {
    /// `struct inet_diag_meminfo`.
    MemInfo = 1,
    /// `struct tcp_info` (not decoded).
    Info = 2,
    /// `struct tcpvegas_info` (not decoded).
    VegasInfo = 3,
    /// Congestion control algorithm name.
    Cong = 4,
    Tos = 5,
    TClass = 6,
    /// `SK_MEMINFO_*` array.
    SkMemInfo = 7,
    /// Shutdown bits.
    Shutdown = 8,
}

impl InetExtension {
    /// Get the `idiag_ext` bit for this extension.
    ///
    /// Attribute types are 1-based, the request bitmask is 0-based.
    pub fn mask(&self) -> u8 {
        1 << (*self as u8 - 1)
    }

    /// Combine several extensions into an `idiag_ext` bitmask.
    pub fn combine(extensions: &[InetExtension]) -> u8 {
        extensions.iter().fold(0, |acc, e| acc | e.mask())
    }
}

/// Socket memory counters from the `SK_MEMINFO_*` array, in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemInfo {
    pub rmem_alloc: u32,
    pub rcvbuf: u32,
    pub wmem_alloc: u32,
    pub sndbuf: u32,
    pub fwd_alloc: u32,
    pub wmem_queued: u32,
    pub optmem: u32,
    pub backlog: u32,
    /// Packets dropped, a count rather than bytes.
    pub drops: u32,
}

impl MemInfo {
    /// Render the way `ss -m` does.
    ///
    /// ```text
    /// skmem:(r0,rb131072,t0,tb16384,f0,w0,o0,bl0,d0)
    /// ```
    pub fn format_skmem(&self) -> String {
        format!(
            "skmem:(r{},rb{},t{},tb{},f{},w{},o{},bl{},d{})",
            self.rmem_alloc,
            self.rcvbuf,
            self.wmem_alloc,
            self.sndbuf,
            self.fwd_alloc,
            self.wmem_queued,
            self.optmem,
            self.backlog,
            self.drops
        )
    }
}

/// Pending socket timer decoded from `idiag_timer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timer {
    Off,
    /// Retransmission.
    On { expires_ms: u32, retrans: u8 },
    /// Keepalive probing.
    Keepalive { expires_ms: u32, probes: u8 },
    /// TIME-WAIT expiry.
    TimeWait { expires_ms: u32 },
    /// Zero window probe.
    Probe { expires_ms: u32, retrans: u8 },
}

impl Timer {
    /// Combine `idiag_timer` with `idiag_expires` and `idiag_retrans`.
    ///
    /// Unrecognised timer codes read as `Off`.
    pub fn from_raw(timer: u8, expires: u32, retrans: u8) -> Self {
        match timer {
            1 => Self::On {
                expires_ms: expires,
                retrans,
            },
            2 => Self::Keepalive {
                expires_ms: expires,
                probes: retrans,
            },
            3 => Self::TimeWait {
                expires_ms: expires,
            },
            4 => Self::Probe {
                expires_ms: expires,
                retrans,
            },
            _ => Self::Off,
        }
    }
}
