//! Live dump integration tests.

use inetdiag::Result;
use inetdiag::netlink::{Connection, ConnectionConfig, Decoder};
use inetdiag::sockdiag::{AddressFamily, DiagRequest, DiagVersion, TcpState};
use std::time::Duration;

use crate::common::{find_local, listen_v4, listen_v6};

fn config() -> ConnectionConfig {
    ConnectionConfig::new().recv_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_listener_is_reported() -> Result<()> {
    require_netlink!();

    let (_listener, addr) = listen_v4().await?;
    let records = inetdiag::query(DiagVersion::V2, AddressFamily::Inet, None).await?;

    let record = find_local(&records, addr).expect("listener missing from dump");
    assert_eq!(record.state, TcpState::Listen);
    assert_eq!(record.family, AddressFamily::Inet);
    assert_ne!(record.inode, 0);
    assert_eq!(record.uid, unsafe { libc::geteuid() });
    assert!(records.iter().all(|r| r.family == AddressFamily::Inet));

    Ok(())
}

#[tokio::test]
async fn test_repeated_dumps_agree() -> Result<()> {
    require_netlink!();

    let (_listener, addr) = listen_v4().await?;
    let conn = Connection::new(config())?;

    let first = conn
        .query(&DiagRequest::build(DiagVersion::V2, AddressFamily::Inet), None)
        .await?;
    let second = conn
        .query(&DiagRequest::build(DiagVersion::V2, AddressFamily::Inet), None)
        .await?;

    let a = find_local(&first, addr).expect("listener missing from first dump");
    let b = find_local(&second, addr).expect("listener missing from second dump");
    assert_eq!(a.inode, b.inode);
    assert_eq!(a.state, b.state);
    assert_eq!(a.local, b.local);
    assert_eq!(a.remote, b.remote);

    Ok(())
}

#[tokio::test]
async fn test_legacy_request_covers_both_families() -> Result<()> {
    require_netlink!();

    let (_v4, addr_v4) = listen_v4().await?;
    let Some((_v6, addr_v6)) = listen_v6().await else {
        eprintln!("Skipping test: no IPv6 loopback");
        return Ok(());
    };

    let records = inetdiag::query(DiagVersion::V1, AddressFamily::Inet, None).await?;

    let v4 = find_local(&records, addr_v4).expect("IPv4 listener missing");
    assert_eq!(v4.family, AddressFamily::Inet);
    let v6 = find_local(&records, addr_v6).expect("IPv6 listener missing");
    assert_eq!(v6.family, AddressFamily::Inet6);

    Ok(())
}

#[tokio::test]
async fn test_v2_ipv6_filter() -> Result<()> {
    require_netlink!();

    let Some((_listener, addr)) = listen_v6().await else {
        eprintln!("Skipping test: no IPv6 loopback");
        return Ok(());
    };

    let records = inetdiag::query(DiagVersion::V2, AddressFamily::Inet6, None).await?;
    assert!(find_local(&records, addr).is_some());
    assert!(records.iter().all(|r| r.family == AddressFamily::Inet6));

    Ok(())
}

#[tokio::test]
async fn test_capture_replays_to_same_records() -> Result<()> {
    require_netlink!();

    let (_listener, _addr) = listen_v4().await?;
    let request = DiagRequest::build(DiagVersion::V2, AddressFamily::Inet);

    let mut capture: Vec<u8> = Vec::new();
    let records = inetdiag::query_with(config(), &request, Some(&mut capture)).await?;
    assert!(!capture.is_empty());

    let outcome = Decoder::new(request.family(), Some(request.seq())).decode(&capture)?;
    assert!(outcome.is_done());
    assert_eq!(outcome.records, records);

    Ok(())
}
