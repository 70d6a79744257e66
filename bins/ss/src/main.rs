//! ss command - TCP socket statistics.
//!
//! Dumps every TCP socket through inet_diag and prints it next to the pid
//! of the process holding it.

mod output;

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use inetdiag::ConnectionConfig;
use inetdiag::sockdiag::{AddressFamily, DiagRequest, DiagVersion, InetExtension, TcpState};
use tracing::debug;

#[derive(Parser)]
#[command(name = "ss", version, about = "TCP socket statistics utility")]
struct Cli {
    /// Enable debug output to stderr.
    #[arg(short = 'd', long)]
    debug: bool,

    /// Display only IPv6 sockets.
    #[arg(short = '6', long)]
    ipv6: bool,

    /// Send the legacy inet_diag_req instead of inet_diag_req_v2.
    ///
    /// The kernel answers the legacy request with sockets of both families.
    #[arg(long = "v1")]
    v1: bool,

    /// Dump the raw netlink reply to FILE.
    #[arg(long, value_name = "FILE")]
    diag: Option<PathBuf>,

    /// Display listening sockets only.
    #[arg(short = 'l', long)]
    listening: bool,

    /// Show socket memory usage.
    #[arg(short = 'm', long)]
    memory: bool,

    /// Don't display header.
    #[arg(short = 'H', long)]
    no_header: bool,

    /// Output in JSON format.
    #[arg(short = 'j', long)]
    json: bool,

    /// Give up when the kernel is silent for this many milliseconds.
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let request = build_request(&cli);

    let mut config = ConnectionConfig::new();
    if let Some(ms) = cli.timeout {
        config = config.recv_timeout(Duration::from_millis(ms));
    }

    let mut capture = match &cli.diag {
        Some(path) => Some(open_capture(path)?),
        None => None,
    };
    let sink: Option<&mut (dyn Write + Send)> = match capture.as_mut() {
        Some(file) => Some(file),
        None => None,
    };

    debug!("sending netlink request");
    let records = inetdiag::query_with(config, &request, sink)
        .await
        .context("cannot dump TCP sockets")?;
    debug!(count = records.len(), "received inet_diag responses");

    let owners = inetdiag::inode_index();

    let opts = output::DisplayOptions {
        no_header: cli.no_header,
        memory: cli.memory,
    };

    if cli.json {
        output::print_json(&records, &owners)?;
    } else {
        output::print_text(&records, &owners, &opts)?;
    }

    Ok(())
}

fn build_request(cli: &Cli) -> DiagRequest {
    let family = if cli.ipv6 {
        AddressFamily::Inet6
    } else {
        AddressFamily::Inet
    };
    let version = if cli.v1 {
        DiagVersion::V1
    } else {
        DiagVersion::V2
    };

    let mut builder = DiagRequest::builder(version, family);
    if cli.listening {
        builder = builder.states(TcpState::Listen.mask());
    }
    if cli.memory {
        builder = builder.extensions(&[InetExtension::SkMemInfo]);
    }
    builder.finish()
}

/// Create (or truncate) the capture file, readable by the owner only.
fn open_capture(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
        .with_context(|| format!("cannot open {}", path.display()))
}
