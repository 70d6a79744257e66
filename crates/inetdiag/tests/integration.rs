//! Integration test entry point.
//!
//! These tests query the running kernel, so they only build with the
//! `integration` feature. No privileges are needed to dump TCP sockets,
//! but sandboxes that forbid netlink sockets make every test skip.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p inetdiag --test integration --features integration
//!
//! # Run with output
//! cargo test -p inetdiag --test integration --features integration -- --nocapture
//! ```
//!
//! # Test Organization
//!
//! - `dump.rs` - Live dumps, both request layouts, raw capture
//! - `process.rs` - Inode to pid resolution against `/proc`

#[macro_use]
#[path = "common/mod.rs"]
mod common;

#[path = "integration/dump.rs"]
mod dump;

#[path = "integration/process.rs"]
mod process;
