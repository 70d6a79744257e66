//! TCP socket diagnostics.
//!
//! Requests, decoded records and the inode-to-process index used to put a
//! pid next to every socket.
//!
//! # Example
//!
//! ```ignore
//! use inetdiag::sockdiag::{AddressFamily, DiagVersion, InodeIndex, ProcFs};
//!
//! let records = inetdiag::query(DiagVersion::V2, AddressFamily::Inet, None).await?;
//! let owners = InodeIndex::scan(&ProcFs::default());
//!
//! for record in &records {
//!     let pid = owners.owner(record.inode);
//!     println!("{} {} {:?}", record.state, record.local, pid);
//! }
//! ```

pub mod process;
pub mod record;
pub mod request;
pub mod types;

pub use process::{InodeIndex, ProcFs, ProcessTable, parse_socket_inode};
pub use record::{Address, Endpoint, Extensions, SocketRecord, parse_record};
pub use request::{DiagRequest, DiagRequestBuilder};
pub use types::{AddressFamily, DiagVersion, InetExtension, MemInfo, TcpState, Timer};
