//! inet_diag request construction.
//!
//! Two request layouts exist. The legacy `inet_diag_req` is sent with
//! message type `TCPDIAG_GETSOCK` and always dumps every TCP socket, IPv4 and
//! IPv6 alike: the kernel ignores its family field. `inet_diag_req_v2` is
//! sent with `SOCK_DIAG_BY_FAMILY` and is filtered by family and state mask.
//!
//! # Example
//!
//! ```ignore
//! use inetdiag::sockdiag::{AddressFamily, DiagRequest, TcpState};
//!
//! let request = DiagRequest::v2(AddressFamily::Inet6)
//!     .states(TcpState::Listen.mask())
//!     .finish();
//! assert_eq!(request.as_bytes().len(), 16 + 56);
//! ```

use std::sync::atomic::{AtomicU32, Ordering};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use super::types::{AddressFamily, DiagVersion, InetExtension, TcpState};
use crate::netlink::{MessageBuilder, NLM_F_DUMP, NLM_F_REQUEST, NlMsgType};

/// Process-wide sequence counter; every request gets its own number.
static NEXT_SEQ: AtomicU32 = AtomicU32::new(1);

fn next_seq() -> u32 {
    NEXT_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Socket identity block shared by both request layouts (`inet_diag_sockid`).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct InetDiagSockId {
    /// Source port, network byte order.
    pub sport: [u8; 2],
    /// Destination port, network byte order.
    pub dport: [u8; 2],
    /// Source address (IPv4 uses the first 4 bytes).
    pub src: [u8; 16],
    /// Destination address (IPv4 uses the first 4 bytes).
    pub dst: [u8; 16],
    /// Interface index.
    pub interface: u32,
    /// Socket cookie.
    pub cookie: [u32; 2],
}

/// Legacy request body (`inet_diag_req`, 60 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct InetDiagReq {
    pub family: u8,
    pub src_len: u8,
    pub dst_len: u8,
    pub ext: u8,
    pub id: InetDiagSockId,
    pub states: u32,
    pub dbs: u32,
}

/// Versioned request body (`inet_diag_req_v2`, 56 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct InetDiagReqV2 {
    pub family: u8,
    pub protocol: u8,
    pub ext: u8,
    pub pad: u8,
    pub states: u32,
    pub id: InetDiagSockId,
}

/// Builder for a [`DiagRequest`].
#[derive(Debug, Clone)]
pub struct DiagRequestBuilder {
    version: DiagVersion,
    family: AddressFamily,
    states: u32,
    extensions: u8,
}

impl DiagRequestBuilder {
    /// Restrict the dump to the given TCP state bitmask.
    pub fn states(mut self, mask: u32) -> Self {
        self.states = mask;
        self
    }

    /// Ask the kernel to append the given extension attributes.
    pub fn extensions(mut self, extensions: &[InetExtension]) -> Self {
        self.extensions = InetExtension::combine(extensions);
        self
    }

    /// Serialize the request.
    pub fn finish(self) -> DiagRequest {
        let seq = next_seq();

        let bytes = match self.version {
            DiagVersion::V1 => {
                let body = InetDiagReq {
                    family: self.family as u8,
                    ext: self.extensions,
                    states: self.states,
                    ..Default::default()
                };
                let mut builder =
                    MessageBuilder::new(NlMsgType::TCPDIAG_GETSOCK, NLM_F_REQUEST | NLM_F_DUMP);
                builder.append(&body);
                builder.set_seq(seq);
                builder.finish()
            }
            DiagVersion::V2 => {
                let body = InetDiagReqV2 {
                    family: self.family as u8,
                    protocol: libc::IPPROTO_TCP as u8,
                    ext: self.extensions,
                    states: self.states,
                    ..Default::default()
                };
                let mut builder = MessageBuilder::new(
                    NlMsgType::SOCK_DIAG_BY_FAMILY,
                    NLM_F_REQUEST | NLM_F_DUMP,
                );
                builder.append(&body);
                builder.set_seq(seq);
                builder.finish()
            }
        };

        DiagRequest {
            version: self.version,
            family: self.family,
            states: self.states,
            extensions: self.extensions,
            seq,
            bytes,
        }
    }
}

/// A framed inet_diag request, ready to send.
#[derive(Debug, Clone)]
pub struct DiagRequest {
    version: DiagVersion,
    family: AddressFamily,
    states: u32,
    extensions: u8,
    seq: u32,
    bytes: Vec<u8>,
}

impl DiagRequest {
    /// Start a legacy `inet_diag_req` dumping all TCP sockets.
    pub fn v1() -> DiagRequestBuilder {
        Self::builder(DiagVersion::V1, AddressFamily::Inet)
    }

    /// Start an `inet_diag_req_v2` for the given family.
    pub fn v2(family: AddressFamily) -> DiagRequestBuilder {
        Self::builder(DiagVersion::V2, family)
    }

    /// Start a request of either layout.
    ///
    /// For [`DiagVersion::V1`] the family only fills the request field; the
    /// kernel answers with sockets of both families regardless.
    pub fn builder(version: DiagVersion, family: AddressFamily) -> DiagRequestBuilder {
        DiagRequestBuilder {
            version,
            family,
            states: TcpState::all_mask(),
            extensions: 0,
        }
    }

    /// Build a request with default states and no extensions.
    pub fn build(version: DiagVersion, family: AddressFamily) -> Self {
        Self::builder(version, family).finish()
    }

    /// Request layout.
    pub fn version(&self) -> DiagVersion {
        self.version
    }

    /// The family records of the reply must be decoded with.
    ///
    /// `None` for the legacy layout, whose reply mixes families: each record's
    /// own family byte decides.
    pub fn family(&self) -> Option<AddressFamily> {
        match self.version {
            DiagVersion::V1 => None,
            DiagVersion::V2 => Some(self.family),
        }
    }

    /// Requested TCP state bitmask.
    pub fn states(&self) -> u32 {
        self.states
    }

    /// Requested `idiag_ext` bitmask.
    pub fn extensions(&self) -> u8 {
        self.extensions
    }

    /// Sequence number carried in the header.
    pub fn seq(&self) -> u32 {
        self.seq
    }

    /// Wire bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}
