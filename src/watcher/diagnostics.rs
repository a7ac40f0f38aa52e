//! Diagnostics sink handed to every scan and watch session.

use std::path::PathBuf;
use std::sync::Arc;

use super::fingerprint::Fingerprint;
use crate::error::WatchError;

/// Something worth telling an operator about.
///
/// None of these affect correctness; they exist for visibility only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The directory could not be listed; the scan came back empty.
    ListFailed { path: PathBuf, reason: String },
    /// A matching file could not be read and was left out.
    ReadFailed { path: PathBuf, reason: String },
    /// A relevant event produced the fingerprint already delivered.
    Unchanged { fingerprint: Fingerprint },
    /// A new snapshot was delivered.
    Emitted {
        fingerprint: Fingerprint,
        files: usize,
        bytes: usize,
    },
    /// The event source reported an error while watching.
    SourceError(WatchError),
}

/// Receiver of diagnostics.
pub trait Diagnostics: Send + Sync {
    /// Record one diagnostic.
    fn record(&self, diagnostic: &Diagnostic);
}

/// Default sink: structured `tracing` events.
///
/// Nothing is printed unless the process installs a subscriber, e.g. with
/// [`init_tracing`](crate::observability::init_tracing), which writes
/// timestamped lines to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::ListFailed { path, reason } => {
                tracing::warn!(path = %path.display(), error = %reason, "Unable to list directory");
            }
            Diagnostic::ReadFailed { path, reason } => {
                tracing::warn!(path = %path.display(), error = %reason, "Unable to read file, skipping");
            }
            Diagnostic::Unchanged { fingerprint } => {
                tracing::info!(%fingerprint, "Ignoring no-op byte changes");
            }
            Diagnostic::Emitted {
                fingerprint,
                files,
                bytes,
            } => {
                tracing::debug!(%fingerprint, files, bytes, "Delivered directory update");
            }
            Diagnostic::SourceError(err) => {
                tracing::error!(error = %err, "File watcher error");
            }
        }
    }
}

/// Default diagnostics sink, shared.
#[must_use]
pub fn default_diagnostics() -> Arc<dyn Diagnostics> {
    Arc::new(TracingDiagnostics)
}
