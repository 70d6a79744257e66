//! Socket inode to owning process resolution.
//!
//! Every open descriptor of a process shows up as a symlink under
//! `/proc/<pid>/fd`; sockets link to `socket:[<inode>]`. Scanning those
//! links gives the inode → pid map that turns an inet_diag record into
//! "who owns this socket".
//!
//! Processes come and go during a scan and most of them are unreadable
//! without privileges, so every failure below the table root is skipped.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, trace};

/// Source of processes and their descriptor link targets.
pub trait ProcessTable {
    /// List candidate process ids.
    fn pids(&self) -> io::Result<Vec<u32>>;

    /// List the link targets of the descriptors of `pid`.
    ///
    /// Descriptors that vanish or cannot be read are left out.
    fn fd_targets(&self, pid: u32) -> io::Result<Vec<PathBuf>>;
}

/// A procfs mount.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcFs {
    /// Use the procfs mounted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Mount point in use.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ProcessTable for ProcFs {
    fn pids(&self) -> io::Result<Vec<u32>> {
        let mut pids = Vec::new();
        for entry in std::fs::read_dir(&self.root)?.flatten() {
            // Only numeric directory names are processes
            if let Some(pid) = entry.file_name().to_str().and_then(|s| s.parse().ok()) {
                pids.push(pid);
            }
        }
        Ok(pids)
    }

    fn fd_targets(&self, pid: u32) -> io::Result<Vec<PathBuf>> {
        let dir = self.root.join(pid.to_string()).join("fd");
        let mut targets = Vec::new();

        for entry in std::fs::read_dir(&dir)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    trace!(pid, error = %e, "skipping descriptor entry");
                    continue;
                }
            };
            match std::fs::read_link(entry.path()) {
                Ok(target) => targets.push(target),
                Err(e) => trace!(pid, fd = ?entry.file_name(), error = %e, "cannot read descriptor link"),
            }
        }

        Ok(targets)
    }
}

/// Extract the inode from a `socket:[<inode>]` link target.
pub fn parse_socket_inode(target: &str) -> Option<u32> {
    let digits = target.strip_prefix("socket:[")?.strip_suffix(']')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn socket_inode(target: &Path) -> Option<u32> {
    target.to_str().and_then(parse_socket_inode)
}

/// Map from socket inode to owning pid.
///
/// A socket shared by several processes (inherited across fork, passed over
/// a unix socket) maps to whichever of them was scanned last.
#[derive(Debug, Clone, Default)]
pub struct InodeIndex {
    owners: HashMap<u32, u32>,
}

impl InodeIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every process of `table`.
    ///
    /// Never fails: an unreadable table yields an empty index.
    pub fn scan<T: ProcessTable + ?Sized>(table: &T) -> Self {
        let pids = match table.pids() {
            Ok(pids) => pids,
            Err(e) => {
                debug!(error = %e, "cannot list process table");
                return Self::new();
            }
        };

        let mut index = Self::new();
        index.scan_pids(table, &pids);
        debug!(
            processes = pids.len(),
            sockets = index.len(),
            "built socket inode index"
        );
        index
    }

    /// Scan `table` on up to `workers` blocking tasks.
    ///
    /// Results are merged in pid-list order, so the outcome matches
    /// [`scan`](Self::scan) over the same table.
    pub async fn scan_concurrent<T>(table: Arc<T>, workers: usize) -> Self
    where
        T: ProcessTable + Send + Sync + 'static,
    {
        let listing = Arc::clone(&table);
        let pids = match tokio::task::spawn_blocking(move || listing.pids()).await {
            Ok(Ok(pids)) => pids,
            Ok(Err(e)) => {
                debug!(error = %e, "cannot list process table");
                return Self::new();
            }
            Err(e) => {
                debug!(error = %e, "process listing task failed");
                return Self::new();
            }
        };

        let workers = workers.max(1);
        let chunk_len = pids.len().div_ceil(workers).max(1);

        let handles: Vec<_> = pids
            .chunks(chunk_len)
            .map(|chunk| {
                let table = Arc::clone(&table);
                let chunk = chunk.to_vec();
                tokio::task::spawn_blocking(move || {
                    let mut partial = Self::new();
                    partial.scan_pids(table.as_ref(), &chunk);
                    partial
                })
            })
            .collect();

        let mut index = Self::new();
        for handle in handles {
            match handle.await {
                Ok(partial) => index.owners.extend(partial.owners),
                Err(e) => debug!(error = %e, "inode scan worker failed"),
            }
        }

        debug!(
            processes = pids.len(),
            workers,
            sockets = index.len(),
            "built socket inode index"
        );
        index
    }

    fn scan_pids<T: ProcessTable + ?Sized>(&mut self, table: &T, pids: &[u32]) {
        for &pid in pids {
            let targets = match table.fd_targets(pid) {
                Ok(targets) => targets,
                Err(e) => {
                    trace!(pid, error = %e, "skipping process");
                    continue;
                }
            };
            for target in &targets {
                if let Some(inode) = socket_inode(target) {
                    self.insert(inode, pid);
                }
            }
        }
    }

    /// Record `pid` as the owner of `inode`, replacing any earlier owner.
    pub fn insert(&mut self, inode: u32, pid: u32) {
        self.owners.insert(inode, pid);
    }

    /// Owning pid of a socket inode.
    pub fn owner(&self, inode: u32) -> Option<u32> {
        self.owners.get(&inode).copied()
    }

    /// Number of indexed sockets.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Check if no socket was found.
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Iterate over `(inode, pid)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.owners.iter().map(|(&inode, &pid)| (inode, pid))
    }
}
