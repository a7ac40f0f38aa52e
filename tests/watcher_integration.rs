//! Integration tests for directory watching with the notify backend.

use std::fs;
use std::ops::ControlFlow;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use dircfg::watcher::{Diagnostic, Diagnostics, DirectoryUpdates, Snapshot};
use dircfg::{scan, watch_directory, watch_directory_with_callback, Fingerprint, WatchConfig};
use parking_lot::Mutex;
use tempfile::TempDir;

const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Default)]
struct Recorder(Mutex<Vec<Diagnostic>>);

impl Diagnostics for Recorder {
    fn record(&self, diagnostic: &Diagnostic) {
        self.0.lock().push(diagnostic.clone());
    }
}

/// Write `count` fragments, zero-padded so name order is numeric order.
fn write_many_files(dir: &Path, suffix: &str, count: usize, body: &str) -> Vec<u8> {
    let mut expected = Vec::new();
    for i in 0..count {
        let contents = format!("{body} {i}\n");
        fs::write(dir.join(format!("test_{i:06}.{suffix}")), &contents).unwrap();
        expected.extend_from_slice(contents.as_bytes());
    }
    expected
}

/// Receive until a snapshot with `payload` arrives. Intermediate states from
/// a write in progress are allowed; duplicates are not.
async fn wait_for_payload(updates: &mut DirectoryUpdates, last: Fingerprint, payload: &[u8]) -> Snapshot {
    let mut previous = last;
    tokio::time::timeout(TIMEOUT, async {
        loop {
            let snapshot = updates.next_snapshot().await.expect("session ended");
            assert_ne!(snapshot.fingerprint(), previous, "duplicate notification");
            previous = snapshot.fingerprint();
            if snapshot.payload() == payload {
                return snapshot;
            }
        }
    })
    .await
    .expect("timed out waiting for update")
}

#[test]
fn test_scan_matches_written_bytes() {
    let tmp = TempDir::new().unwrap();
    let expected = write_many_files(tmp.path(), "toml", 20, "dir files data");
    fs::write(tmp.path().join("README.md"), "ignored").unwrap();

    let snapshot = scan(tmp.path(), "toml", &Recorder::default());

    assert_eq!(snapshot.payload(), expected.as_slice());
    assert_eq!(snapshot.fingerprint(), Fingerprint::of(&expected));
    assert_eq!(snapshot.files().len(), 20);
}

#[tokio::test]
async fn test_directory_updates_follow_writes() {
    let tmp = TempDir::new().unwrap();
    write_many_files(tmp.path(), "toml", 20, "initial");

    let mut updates = watch_directory(&WatchConfig::new(tmp.path(), "toml"), None).unwrap();
    let mut last = updates.next_snapshot().await.unwrap().fingerprint();

    for i in 0..5 {
        fs::write(tmp.path().join(format!("test_{i:06}.toml")), "foo").unwrap();
        let expected = scan(tmp.path(), "toml", &Recorder::default());

        let snapshot = wait_for_payload(&mut updates, last, expected.payload()).await;
        assert_eq!(snapshot.fingerprint(), expected.fingerprint());
        last = snapshot.fingerprint();
    }

    updates.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_basic_reload_and_noop_suppression() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a.cfg");
    fs::write(&a, "x").unwrap();
    fs::write(tmp.path().join("b.cfg"), "y").unwrap();

    let mut updates = watch_directory(&WatchConfig::new(tmp.path(), "cfg"), None).unwrap();

    let initial = updates.next_snapshot().await.unwrap();
    assert_eq!(initial.payload(), b"xy");

    fs::write(&a, "z").unwrap();
    let reloaded = wait_for_payload(&mut updates, initial.fingerprint(), b"zy").await;
    assert_ne!(reloaded.fingerprint(), initial.fingerprint());

    // Trailing events from the same save re-scan to the same bytes.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(updates.try_recv().is_err(), "duplicate notification for one save");

    fs::write(&a, "z").unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(updates.try_recv().is_err(), "no-op write produced a notification");

    updates.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_irrelevant_suffix_is_silent() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.cfg"), "x").unwrap();

    let mut updates = watch_directory(&WatchConfig::new(tmp.path(), "cfg"), None).unwrap();
    updates.next_snapshot().await.unwrap();

    fs::write(tmp.path().join("c.txt"), "w").unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(updates.try_recv().is_err());

    updates.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_missing_directory_fails_immediately() {
    let tmp = TempDir::new().unwrap();
    let result = watch_directory(&WatchConfig::new(tmp.path().join("missing"), "cfg"), None);
    assert!(matches!(result, Err(dircfg::Error::Watcher(_))));
}

#[tokio::test]
async fn test_callback_variant_with_injected_diagnostics() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a.cfg");
    fs::write(&a, "x").unwrap();

    let recorder = Arc::new(Recorder::default());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    let session = watch_directory_with_callback(
        &WatchConfig::new(tmp.path(), "cfg"),
        Some(recorder.clone() as Arc<dyn Diagnostics>),
        move |result: Result<&Snapshot, &dircfg::WatchError>| {
            if let Ok(snapshot) = result {
                let _ = tx.send(snapshot.payload().to_vec());
            }
            ControlFlow::Continue(())
        },
    )
    .unwrap();

    let first = tokio::time::timeout(TIMEOUT, rx.recv()).await.unwrap().unwrap();
    assert_eq!(first, b"x");

    fs::write(&a, "updated").unwrap();
    tokio::time::timeout(TIMEOUT, async {
        while let Some(payload) = rx.recv().await {
            if payload == b"updated" {
                return;
            }
        }
        panic!("callback channel closed");
    })
    .await
    .unwrap();

    session.shutdown().await.unwrap();

    assert!(recorder
        .0
        .lock()
        .iter()
        .any(|d| matches!(d, Diagnostic::Emitted { .. })));
}
