//! Output formatting for ss command.

use std::io::{self, Write};

use inetdiag::sockdiag::{Endpoint, InodeIndex, SocketRecord};

/// Display options for socket output.
pub struct DisplayOptions {
    /// Don't show header.
    pub no_header: bool,
    /// Show memory info.
    pub memory: bool,
}

/// Print sockets in JSON format.
pub fn print_json(records: &[SocketRecord], owners: &InodeIndex) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_json(&mut handle, records, owners)
}

fn write_json(
    handle: &mut impl Write,
    records: &[SocketRecord],
    owners: &InodeIndex,
) -> io::Result<()> {
    let json_sockets: Vec<_> = records
        .iter()
        .map(|r| record_to_json(r, owners))
        .collect();

    serde_json::to_writer_pretty(&mut *handle, &json_sockets)?;
    writeln!(handle)?;
    Ok(())
}

fn record_to_json(record: &SocketRecord, owners: &InodeIndex) -> serde_json::Value {
    let mut json = serde_json::json!({
        "netid": record.netid(),
        "state": record.state.name(),
        "recv_q": record.recv_q,
        "send_q": record.send_q,
        "local": {
            "address": record.local.address.to_string(),
            "port": record.local.port,
        },
        "remote": {
            "address": record.remote.address.to_string(),
            "port": record.remote.port,
        },
        "uid": record.uid,
        "inode": record.inode,
        "pid": owners.owner(record.inode),
    });

    if let Some(ref mem) = record.extensions.mem_info {
        json["skmem"] = serde_json::Value::String(mem.format_skmem());
    }

    json
}

/// Print sockets in text format.
pub fn print_text(
    records: &[SocketRecord],
    owners: &InodeIndex,
    opts: &DisplayOptions,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_text(&mut handle, records, owners, opts)
}

fn write_text(
    handle: &mut impl Write,
    records: &[SocketRecord],
    owners: &InodeIndex,
    opts: &DisplayOptions,
) -> io::Result<()> {
    if !opts.no_header {
        writeln!(
            handle,
            "{:<12} {:>6} {:>6} {:>25} {:>25} {:>6} {:>10} {:>8}",
            "State",
            "Recv-Q",
            "Send-Q",
            "Local Address:Port",
            "Peer Address:Port",
            "UID",
            "Inode",
            "PID"
        )?;
    }

    for record in records {
        let pid = owners
            .owner(record.inode)
            .map_or_else(|| "-".to_string(), |pid| pid.to_string());

        writeln!(
            handle,
            "{:<12} {:>6} {:>6} {:>25} {:>25} {:>6} {:>10} {:>8}",
            record.state.name(),
            record.recv_q,
            record.send_q,
            format_endpoint(&record.local),
            format_endpoint(&record.remote),
            record.uid,
            record.inode,
            pid
        )?;

        if opts.memory
            && let Some(ref mem) = record.extensions.mem_info
        {
            writeln!(handle, "\t {}", mem.format_skmem())?;
        }
    }

    Ok(())
}

fn format_endpoint(endpoint: &Endpoint) -> String {
    let ip = endpoint.address.ip();
    let ip_str = if ip.is_unspecified() {
        "*".to_string()
    } else if ip.is_ipv6() {
        format!("[{}]", ip)
    } else {
        ip.to_string()
    };

    let port_str = if endpoint.port == 0 {
        "*".to_string()
    } else {
        endpoint.port.to_string()
    };

    format!("{}:{}", ip_str, port_str)
}
