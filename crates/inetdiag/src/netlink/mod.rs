//! Netlink plumbing for the socket diagnostics family.
//!
//! This module holds everything below the inet_diag record layer: the
//! message header, attribute walking, request framing, the async socket,
//! the reply decoder and the connection that ties them together.
//!
//! # Quick Start
//!
//! ```ignore
//! use inetdiag::netlink::{Connection, ConnectionConfig};
//! use inetdiag::sockdiag::{AddressFamily, DiagRequest, DiagVersion};
//!
//! let conn = Connection::new(ConnectionConfig::default())?;
//! let request = DiagRequest::build(DiagVersion::V2, AddressFamily::Inet);
//! let records = conn.query(&request, None).await?;
//! for record in &records {
//!     println!("{} -> {} inode {}", record.local, record.remote, record.inode);
//! }
//! ```

pub mod attr;
mod builder;
pub mod connection;
pub mod decoder;
mod error;
pub mod message;
pub mod socket;

pub use builder::MessageBuilder;
pub use connection::{Connection, ConnectionConfig};
pub use decoder::{DecodeOutcome, DecodeState, Decoder};
pub use error::{Error, Result};
pub use message::{
    NLM_F_DUMP, NLM_F_DUMP_INTR, NLM_F_MULTI, NLM_F_REQUEST, NLMSG_HDRLEN, NlMsgHdr, NlMsgType,
    nlmsg_align,
};
pub use socket::NetlinkSocket;
