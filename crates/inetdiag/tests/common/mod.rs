//! Common test utilities for integration tests.
//!
//! Provides loopback listeners to look for in a dump and a macro that
//! skips tests where sock_diag sockets cannot be opened.

use std::net::SocketAddr;

use inetdiag::Result;
use inetdiag::netlink::NetlinkSocket;
use inetdiag::sockdiag::SocketRecord;
use tokio::net::TcpListener;

/// Check if a sock_diag socket can be opened here.
pub fn netlink_available() -> bool {
    NetlinkSocket::new().is_ok()
}

/// Skip the test if sock_diag sockets are unavailable.
#[macro_export]
macro_rules! require_netlink {
    () => {
        if !crate::common::netlink_available() {
            eprintln!("Skipping test: NETLINK_SOCK_DIAG unavailable");
            return Ok(());
        }
    };
}

/// Bind a listener on an ephemeral loopback port.
pub async fn listen_v4() -> Result<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .map_err(inetdiag::Error::SocketCreationFailed)?;
    let addr = listener
        .local_addr()
        .map_err(inetdiag::Error::SocketCreationFailed)?;
    Ok((listener, addr))
}

/// Bind a listener on an ephemeral IPv6 loopback port, if IPv6 is up.
pub async fn listen_v6() -> Option<(TcpListener, SocketAddr)> {
    let listener = TcpListener::bind("[::1]:0").await.ok()?;
    let addr = listener.local_addr().ok()?;
    Some((listener, addr))
}

/// Find the record whose local endpoint is `addr`.
pub fn find_local<'a>(records: &'a [SocketRecord], addr: SocketAddr) -> Option<&'a SocketRecord> {
    records.iter().find(|r| r.local_addr() == addr)
}
