//! dircfg: hot-reload for configuration split across one directory.
//!
//! Watches a directory for files ending in a suffix, concatenates them in
//! file-name order and hands the result to a consumer each time the
//! aggregate content changes. Identical content never re-notifies.
//!
//! ```no_run
//! use dircfg::{watch_directory, WatchConfig};
//!
//! # async fn run() -> dircfg::Result<()> {
//! let mut updates = watch_directory(&WatchConfig::new("/etc/server.d", ".toml"), None)?;
//! while let Some(snapshot) = updates.next_snapshot().await {
//!     let text = String::from_utf8_lossy(snapshot.payload());
//!     println!("{} -> {} bytes", snapshot.fingerprint(), text.len());
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod observability;
pub mod watcher;

pub use config::{Config, OutputFormat, WatchConfig};
pub use error::{Error, Result, WatchError};
pub use watcher::{
    scan, watch_directory, watch_directory_until, watch_directory_with_callback, Diagnostic,
    Diagnostics, DirectoryUpdates, Fingerprint, Notification, Snapshot, WatchSession,
};
