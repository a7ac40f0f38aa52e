//! Directory aggregation.
//!
//! One pass lists the directory, keeps the entries whose name ends with the
//! suffix, and concatenates their contents in file-name order. The
//! fingerprint is fed the same bytes in the same order, so payload and
//! fingerprint always agree.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::diagnostics::{Diagnostic, Diagnostics};
use super::fingerprint::{Fingerprint, FingerprintHasher};
use crate::Result;

/// Result of one aggregation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    files: Vec<OsString>,
    skipped: Vec<OsString>,
    payload: Vec<u8>,
    fingerprint: Fingerprint,
}

impl Snapshot {
    /// A snapshot with no contributing files.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            files: Vec::new(),
            skipped: Vec::new(),
            payload: Vec::new(),
            fingerprint: Fingerprint::empty(),
        }
    }

    /// Names of the files that contributed, in concatenation order.
    #[must_use]
    pub fn files(&self) -> &[OsString] {
        &self.files
    }

    /// Names of matching files that could not be read.
    #[must_use]
    pub fn skipped(&self) -> &[OsString] {
        &self.skipped
    }

    /// Concatenated contents.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Take ownership of the concatenated contents.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    #[must_use]
    pub const fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }
}

/// Aggregate every file in `directory` whose name ends with `suffix`.
///
/// Never fails: an unlistable directory yields [`Snapshot::empty`], an
/// unreadable file is skipped. Both are reported to `diagnostics`.
pub fn scan(directory: &Path, suffix: &str, diagnostics: &dyn Diagnostics) -> Snapshot {
    let mut names = match matching_names(directory, suffix, diagnostics) {
        Ok(names) => names,
        Err(e) => {
            diagnostics.record(&Diagnostic::ListFailed {
                path: directory.to_path_buf(),
                reason: e.to_string(),
            });
            return Snapshot::empty();
        }
    };
    names.sort();

    let mut hasher = FingerprintHasher::new();
    let mut payload = Vec::new();
    let mut files = Vec::with_capacity(names.len());
    let mut skipped = Vec::new();

    for name in names {
        let path = directory.join(&name);
        match fs::read(&path) {
            Ok(bytes) => {
                hasher.update(&bytes);
                payload.extend_from_slice(&bytes);
                files.push(name);
            }
            Err(e) => {
                diagnostics.record(&Diagnostic::ReadFailed {
                    path,
                    reason: e.to_string(),
                });
                skipped.push(name);
            }
        }
    }

    let snapshot = Snapshot {
        files,
        skipped,
        payload,
        fingerprint: hasher.finalize(),
    };

    tracing::trace!(
        path = %directory.display(),
        files = snapshot.files.len(),
        skipped = snapshot.skipped.len(),
        bytes = snapshot.payload.len(),
        fingerprint = %snapshot.fingerprint,
        "Directory scan complete"
    );

    snapshot
}

/// Run [`scan`] on the blocking pool.
///
/// # Errors
///
/// Returns an error if the blocking task panics or is cancelled.
pub async fn scan_async(
    directory: PathBuf,
    suffix: String,
    diagnostics: Arc<dyn Diagnostics>,
) -> Result<Snapshot> {
    tokio::task::spawn_blocking(move || scan(&directory, &suffix, diagnostics.as_ref()))
        .await
        .map_err(|e| crate::Error::internal(format!("Scan task failed: {e}")))
}

/// Name-level suffix match, on raw bytes so non-UTF-8 names still compare.
pub(crate) fn has_suffix(name: &std::ffi::OsStr, suffix: &str) -> bool {
    name.as_encoded_bytes().ends_with(suffix.as_bytes())
}

fn matching_names(
    directory: &Path,
    suffix: &str,
    diagnostics: &dyn Diagnostics,
) -> std::io::Result<Vec<OsString>> {
    let mut names = Vec::new();

    for entry in fs::read_dir(directory)? {
        match entry {
            Ok(entry) => {
                let name = entry.file_name();
                if has_suffix(&name, suffix) {
                    names.push(name);
                }
            }
            // Entry vanished between listing and stat; the rest is still usable.
            Err(e) => diagnostics.record(&Diagnostic::ListFailed {
                path: directory.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    Ok(names)
}
