//! Decoded inet_diag records.
//!
//! A record is the payload of one `SOCK_DIAG_BY_FAMILY` (or legacy
//! `TCPDIAG_GETSOCK`) envelope: a fixed 72-byte `inet_diag_msg` block
//! optionally followed by extension attributes.
//!
//! Queue lengths, UID and inode are in host byte order. Ports and
//! addresses are in network byte order.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use serde::{Deserialize, Serialize};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::request::InetDiagSockId;
use super::types::{AddressFamily, MemInfo, TcpState, Timer};
use crate::netlink::attr::AttrIter;
use crate::netlink::{Error, Result};

// Inet diag extension attributes
const INET_DIAG_MEMINFO: u16 = 1;
const INET_DIAG_CONG: u16 = 4;
const INET_DIAG_TOS: u16 = 5;
const INET_DIAG_TCLASS: u16 = 6;
const INET_DIAG_SKMEMINFO: u16 = 7;
const INET_DIAG_SHUTDOWN: u16 = 8;

/// Size of the fixed `inet_diag_msg` block.
pub const INET_DIAG_MSG_LEN: usize = std::mem::size_of::<InetDiagMsg>();

/// Fixed part of a reply record (mirrors struct inet_diag_msg).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct InetDiagMsg {
    pub family: u8,
    pub state: u8,
    pub timer: u8,
    pub retrans: u8,
    pub id: InetDiagSockId,
    pub expires: u32,
    pub rqueue: u32,
    pub wqueue: u32,
    pub uid: u32,
    pub inode: u32,
}

/// An IP address whose width is fixed by its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Address {
    /// 4-byte IPv4 address.
    V4(Ipv4Addr),
    /// 16-byte IPv6 address.
    V6(Ipv6Addr),
}

impl Address {
    /// Read an address out of a 16-byte `inet_diag_sockid` block.
    fn from_block(family: AddressFamily, block: &[u8; 16]) -> Self {
        match family {
            AddressFamily::Inet => {
                Self::V4(Ipv4Addr::new(block[0], block[1], block[2], block[3]))
            }
            AddressFamily::Inet6 => Self::V6(Ipv6Addr::from(*block)),
        }
    }

    /// Convert to a std IP address.
    pub fn ip(&self) -> IpAddr {
        match self {
            Self::V4(a) => IpAddr::V4(*a),
            Self::V6(a) => IpAddr::V6(*a),
        }
    }

    /// Family matching this address.
    pub fn family(&self) -> AddressFamily {
        match self {
            Self::V4(_) => AddressFamily::Inet,
            Self::V6(_) => AddressFamily::Inet6,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(a) => a.fmt(f),
            Self::V6(a) => a.fmt(f),
        }
    }
}

/// Address and port of one side of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: Address,
    pub port: u16,
}

impl Endpoint {
    /// Convert to a std socket address.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.address.ip(), self.port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.socket_addr().fmt(f)
    }
}

/// Optional information carried in trailing attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extensions {
    /// Memory information (INET_DIAG_MEMINFO or INET_DIAG_SKMEMINFO).
    pub mem_info: Option<MemInfo>,
    /// Congestion control algorithm.
    pub congestion: Option<String>,
    /// Type of service.
    pub tos: Option<u8>,
    /// Traffic class (IPv6).
    pub tclass: Option<u8>,
    /// Shutdown state (read/write).
    pub shutdown: Option<u8>,
}

/// One socket as reported by the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketRecord {
    /// Address family.
    pub family: AddressFamily,
    /// Connection state.
    pub state: TcpState,
    /// Timer information.
    pub timer: Timer,
    /// Receive queue length.
    pub recv_q: u32,
    /// Send queue length.
    pub send_q: u32,
    /// Local address and port.
    pub local: Endpoint,
    /// Remote address and port.
    pub remote: Endpoint,
    /// Interface index (0 = any).
    pub interface: u32,
    /// Socket cookie.
    pub cookie: u64,
    /// Socket owner UID.
    pub uid: u32,
    /// Inode number.
    pub inode: u32,
    /// Decoded extension attributes.
    pub extensions: Extensions,
}

impl SocketRecord {
    /// Local socket address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local.socket_addr()
    }

    /// Remote socket address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote.socket_addr()
    }

    /// Check if this is a listening socket.
    pub fn is_listening(&self) -> bool {
        self.state == TcpState::Listen
    }

    /// Get the netid string for output.
    pub fn netid(&self) -> &'static str {
        self.family.netid()
    }
}

/// Read the family byte a record carries about itself.
pub fn record_family(payload: &[u8]) -> Result<AddressFamily> {
    let tag = *payload
        .first()
        .ok_or_else(|| Error::malformed("empty inet_diag payload"))?;
    AddressFamily::from_u8(tag)
        .map_err(|_| Error::malformed(format!("record carries unknown family {}", tag)))
}

/// Parse one record payload.
///
/// `family` decides the address width. A record whose own family byte
/// disagrees is rejected rather than reinterpreted.
pub fn parse_record(payload: &[u8], family: AddressFamily) -> Result<SocketRecord> {
    let (msg, trailing) = InetDiagMsg::read_from_prefix(payload).map_err(|_| {
        Error::malformed(format!(
            "payload is {} bytes, inet_diag_msg needs {}",
            payload.len(),
            INET_DIAG_MSG_LEN
        ))
    })?;

    if msg.family != family as u8 {
        return Err(Error::malformed(format!(
            "record family {} does not match expected {:?}",
            msg.family, family
        )));
    }

    let id = &msg.id;
    let local = Endpoint {
        address: Address::from_block(family, &id.src),
        port: u16::from_be_bytes(id.sport),
    };
    let remote = Endpoint {
        address: Address::from_block(family, &id.dst),
        port: u16::from_be_bytes(id.dport),
    };
    let cookie = u64::from(id.cookie[0]) | (u64::from(id.cookie[1]) << 32);

    Ok(SocketRecord {
        family,
        state: TcpState::from_u8(msg.state),
        timer: Timer::from_raw(msg.timer, msg.expires, msg.retrans),
        recv_q: msg.rqueue,
        send_q: msg.wqueue,
        local,
        remote,
        interface: id.interface,
        cookie,
        uid: msg.uid,
        inode: msg.inode,
        extensions: parse_extensions(trailing),
    })
}

fn ne_words(data: &[u8]) -> Vec<u32> {
    data.chunks_exact(4)
        .map(|c| u32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn parse_extensions(data: &[u8]) -> Extensions {
    let mut ext = Extensions::default();

    for (kind, attr) in AttrIter::new(data) {
        match kind {
            INET_DIAG_MEMINFO => {
                let words = ne_words(attr);
                if let &[rmem, wmem, fmem, tmem, ..] = words.as_slice() {
                    ext.mem_info = Some(MemInfo {
                        rmem_alloc: rmem,
                        wmem_alloc: wmem,
                        fwd_alloc: fmem,
                        wmem_queued: tmem,
                        ..Default::default()
                    });
                }
            }
            INET_DIAG_SKMEMINFO => {
                let words = ne_words(attr);
                if let &[rmem, rcvbuf, wmem, sndbuf, fwd, queued, optmem, backlog, drops, ..] =
                    words.as_slice()
                {
                    ext.mem_info = Some(MemInfo {
                        rmem_alloc: rmem,
                        rcvbuf,
                        wmem_alloc: wmem,
                        sndbuf,
                        fwd_alloc: fwd,
                        wmem_queued: queued,
                        optmem,
                        backlog,
                        drops,
                    });
                }
            }
            INET_DIAG_CONG => {
                if let Ok(s) = std::str::from_utf8(attr) {
                    ext.congestion = Some(s.trim_end_matches('\0').to_string());
                }
            }
            INET_DIAG_TOS => ext.tos = attr.first().copied(),
            INET_DIAG_TCLASS => ext.tclass = attr.first().copied(),
            INET_DIAG_SHUTDOWN => ext.shutdown = attr.first().copied(),
            _ => {}
        }
    }

    ext
}
