//! Directory watching and aggregation.
//!
//! This module provides:
//! - Deterministic scan-and-concatenate of suffix-matched files
//! - 128-bit content fingerprints for change detection
//! - Event sources backed by notify-rs or an in-process channel
//! - Watch sessions delivering each distinct directory state once

mod aggregator;
mod diagnostics;
mod events;
mod fingerprint;
mod session;
mod source;

pub use aggregator::{scan, scan_async, Snapshot};
pub use diagnostics::{default_diagnostics, Diagnostic, Diagnostics, TracingDiagnostics};
pub use events::{FsEvent, FsOp};
pub use fingerprint::{Fingerprint, FingerprintHasher, FINGERPRINT_LEN};
pub use session::{
    watch_directory, watch_directory_until, watch_directory_with_callback, DirectoryUpdates,
    Notification, SessionBuilder, UpdateCallback, WatchSession,
};
pub use source::{SourceMessage, SourceSender, Subscription};
