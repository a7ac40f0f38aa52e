//! File system event types and handling.

#![allow(clippy::missing_const_for_fn)]

use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::EventKind;

use super::aggregator::has_suffix;

/// Operation kind of a file system event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsOp {
    /// File was created.
    Create,
    /// File contents were written.
    Write,
    /// File was renamed, either side of the rename.
    Rename,
    /// File was removed.
    Remove,
    /// Permissions, timestamps or other metadata changed.
    Metadata,
    /// Anything else the backend reports.
    Other,
}

impl FsOp {
    /// Whether this kind can change what a scan reads.
    #[must_use]
    pub fn affects_content(self) -> bool {
        matches!(self, Self::Write | Self::Rename)
    }
}

impl From<&EventKind> for FsOp {
    fn from(kind: &EventKind) -> Self {
        match kind {
            EventKind::Create(_) => Self::Create,
            EventKind::Modify(ModifyKind::Name(_)) => Self::Rename,
            EventKind::Modify(ModifyKind::Metadata(_)) => Self::Metadata,
            // Some backends only report `Any` for writes.
            EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any | ModifyKind::Other)
            | EventKind::Access(AccessKind::Close(AccessMode::Write)) => Self::Write,
            EventKind::Remove(_) => Self::Remove,
            _ => Self::Other,
        }
    }
}

/// A change to one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub kind: FsOp,
}

impl FsEvent {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: FsOp) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Expand a backend event into one event per path.
    #[must_use]
    pub fn from_notify(event: notify::Event) -> Vec<Self> {
        let kind = FsOp::from(&event.kind);
        event
            .paths
            .into_iter()
            .map(|path| Self { path, kind })
            .collect()
    }

    /// Whether this event should trigger a re-scan for `suffix`.
    #[must_use]
    pub fn is_relevant(&self, suffix: &str) -> bool {
        self.kind.affects_content() && path_has_suffix(&self.path, suffix)
    }
}

fn path_has_suffix(path: &Path, suffix: &str) -> bool {
    has_suffix(path.as_os_str(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind, RenameMode};

    #[test]
    fn test_kind_mapping() {
        let cases = [
            (EventKind::Create(CreateKind::File), FsOp::Create),
            (EventKind::Modify(ModifyKind::Data(DataChange::Content)), FsOp::Write),
            (EventKind::Modify(ModifyKind::Any), FsOp::Write),
            (EventKind::Access(AccessKind::Close(AccessMode::Write)), FsOp::Write),
            (EventKind::Modify(ModifyKind::Name(RenameMode::To)), FsOp::Rename),
            (EventKind::Modify(ModifyKind::Name(RenameMode::From)), FsOp::Rename),
            (EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)), FsOp::Metadata),
            (EventKind::Remove(RemoveKind::File), FsOp::Remove),
            (EventKind::Access(AccessKind::Read), FsOp::Other),
            (EventKind::Any, FsOp::Other),
        ];

        for (kind, expected) in cases {
            assert_eq!(FsOp::from(&kind), expected, "{kind:?}");
        }
    }

    #[test]
    fn test_only_write_and_rename_affect_content() {
        assert!(FsOp::Write.affects_content());
        assert!(FsOp::Rename.affects_content());
        assert!(!FsOp::Create.affects_content());
        assert!(!FsOp::Remove.affects_content());
        assert!(!FsOp::Metadata.affects_content());
        assert!(!FsOp::Other.affects_content());
    }

    #[test]
    fn test_relevance() {
        assert!(FsEvent::new("/etc/server.d/a.toml", FsOp::Write).is_relevant("toml"));
        assert!(FsEvent::new("/etc/server.d/a.toml", FsOp::Rename).is_relevant(".toml"));
        assert!(!FsEvent::new("/etc/server.d/a.toml", FsOp::Create).is_relevant("toml"));
        assert!(!FsEvent::new("/etc/server.d/a.toml", FsOp::Metadata).is_relevant("toml"));
        assert!(!FsEvent::new("/etc/server.d/c.txt", FsOp::Write).is_relevant("toml"));
        assert!(!FsEvent::new("/etc/server.d/a.TOML", FsOp::Write).is_relevant("toml"));
    }

    #[test]
    fn test_from_notify_expands_paths() {
        let event = notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/d/old.toml"))
            .add_path(PathBuf::from("/d/new.toml"));

        let events = FsEvent::from_notify(event);
        assert_eq!(
            events,
            vec![
                FsEvent::new("/d/old.toml", FsOp::Rename),
                FsEvent::new("/d/new.toml", FsOp::Rename),
            ]
        );
    }
}
