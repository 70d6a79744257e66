//! Inode resolution integration tests.

use std::sync::Arc;

use inetdiag::Result;
use inetdiag::sockdiag::{AddressFamily, DiagVersion, InodeIndex, ProcFs};

use crate::common::{find_local, listen_v4};

#[tokio::test]
async fn test_own_listener_resolves_to_self() -> Result<()> {
    require_netlink!();

    let (_listener, addr) = listen_v4().await?;
    let records = inetdiag::query(DiagVersion::V2, AddressFamily::Inet, None).await?;
    let record = find_local(&records, addr).expect("listener missing from dump");

    let index = inetdiag::inode_index();
    assert_eq!(index.owner(record.inode), Some(std::process::id()));

    let concurrent = InodeIndex::scan_concurrent(Arc::new(ProcFs::default()), 4).await;
    assert_eq!(concurrent.owner(record.inode), Some(std::process::id()));

    Ok(())
}
