//! Async TCP socket enumeration for Linux over `NETLINK_SOCK_DIAG`.
//!
//! This crate asks the kernel's inet_diag interface for every TCP socket,
//! decodes the binary dump into typed [`SocketRecord`]s and maps socket
//! inodes back to the processes that own them.
//!
//! # Example
//!
//! ```ignore
//! use inetdiag::sockdiag::{AddressFamily, DiagVersion};
//!
//! #[tokio::main]
//! async fn main() -> inetdiag::Result<()> {
//!     let records = inetdiag::query(DiagVersion::V2, AddressFamily::Inet, None).await?;
//!     let owners = inetdiag::inode_index();
//!
//!     for record in records {
//!         println!(
//!             "{:<12} {:<24} {:<24} {:?}",
//!             record.state,
//!             record.local,
//!             record.remote,
//!             owners.owner(record.inode)
//!         );
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Raw capture
//!
//! Every reply datagram can be copied to a writer before it is decoded,
//! which is handy for turning a live dump into a test fixture:
//!
//! ```ignore
//! let mut file = std::fs::File::create("dump.bin")?;
//! let records = inetdiag::query(DiagVersion::V1, AddressFamily::Inet, Some(&mut file)).await?;
//! ```

pub mod netlink;
pub mod sockdiag;

#[cfg(test)]
mod fixtures;

use std::io::Write;

pub use netlink::{Connection, ConnectionConfig, Error, Result};
pub use sockdiag::{AddressFamily, DiagRequest, DiagVersion, InodeIndex, SocketRecord};

/// Dump every TCP socket using the given request layout.
///
/// With [`DiagVersion::V1`] the reply covers both families whatever
/// `family` says.
pub async fn query(
    version: DiagVersion,
    family: AddressFamily,
    sink: Option<&mut (dyn Write + Send)>,
) -> Result<Vec<SocketRecord>> {
    let request = DiagRequest::build(version, family);
    query_with(ConnectionConfig::default(), &request, sink).await
}

/// Send a prepared request on a fresh connection.
pub async fn query_with(
    config: ConnectionConfig,
    request: &DiagRequest,
    sink: Option<&mut (dyn Write + Send)>,
) -> Result<Vec<SocketRecord>> {
    let conn = Connection::new(config)?;
    conn.query(request, sink).await
}

/// Build the socket inode → pid index from `/proc`.
pub fn inode_index() -> InodeIndex {
    InodeIndex::scan(&sockdiag::ProcFs::default())
}
