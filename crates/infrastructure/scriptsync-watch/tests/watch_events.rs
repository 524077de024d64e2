use std::fs;
use std::time::Duration;

use camino::Utf8PathBuf;
use scriptsync_core::fingerprint;
use scriptsync_session::{WatchEvent, WatcherFactory, WatcherHandle};
use scriptsync_watch::NotifyWatcherFactory;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::timeout;

fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
}

async fn recv_within(
    rx: &mut mpsc::Receiver<WatchEvent>,
    window: Duration,
) -> Option<WatchEvent> {
    timeout(window, rx.recv()).await.ok().flatten()
}

/// Wait for the next event matching `pred`, skipping others (e.g. the
/// changed event notify reports for a freshly created parent directory).
async fn recv_matching(
    rx: &mut mpsc::Receiver<WatchEvent>,
    pred: impl Fn(&WatchEvent) -> bool,
) -> WatchEvent {
    loop {
        let ev = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for watch event")
            .expect("watch channel closed");
        if pred(&ev) {
            return ev;
        }
    }
}

#[tokio::test]
async fn emits_ready_after_watch_setup() {
    let dir = TempDir::new().unwrap();
    let (tx, mut rx) = mpsc::channel(64);
    let handle = NotifyWatcherFactory.watch(&utf8(&dir), tx);

    let ev = recv_within(&mut rx, Duration::from_secs(5)).await;
    assert_eq!(ev, Some(WatchEvent::Ready));
    handle.close();
}

#[tokio::test]
async fn single_write_produces_one_change_with_current_fingerprint() {
    let dir = TempDir::new().unwrap();
    let root = utf8(&dir);
    fs::write(root.join("a.ts"), "old").unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let handle = NotifyWatcherFactory.watch(&root, tx);
    assert_eq!(
        recv_within(&mut rx, Duration::from_secs(5)).await,
        Some(WatchEvent::Ready)
    );

    fs::write(root.join("a.ts"), "Z").unwrap();

    let ev = recv_matching(&mut rx, |e| matches!(e, WatchEvent::Changed { .. })).await;
    assert_eq!(
        ev,
        WatchEvent::Changed {
            rel_path: "a.ts".into(),
            hash: fingerprint("Z"),
        }
    );

    // The burst is coalesced: no second change for the same quiet file.
    assert_eq!(recv_within(&mut rx, Duration::from_millis(500)).await, None);
    handle.close();
}

#[tokio::test]
async fn rapid_edits_coalesce_into_one_change() {
    let dir = TempDir::new().unwrap();
    let root = utf8(&dir);
    fs::write(root.join("a.ts"), "v0").unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let handle = NotifyWatcherFactory.watch(&root, tx);
    assert_eq!(
        recv_within(&mut rx, Duration::from_secs(5)).await,
        Some(WatchEvent::Ready)
    );

    fs::write(root.join("a.ts"), "v1").unwrap();
    fs::write(root.join("a.ts"), "v2").unwrap();
    fs::write(root.join("a.ts"), "final").unwrap();

    let ev = recv_matching(&mut rx, |e| matches!(e, WatchEvent::Changed { .. })).await;
    assert_eq!(
        ev,
        WatchEvent::Changed {
            rel_path: "a.ts".into(),
            hash: fingerprint("final"),
        }
    );
    assert_eq!(recv_within(&mut rx, Duration::from_millis(500)).await, None);
    handle.close();
}

#[tokio::test]
async fn removal_fires_for_any_extension() {
    let dir = TempDir::new().unwrap();
    let root = utf8(&dir);
    fs::write(root.join("data.bin"), [0u8, 1, 2]).unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let handle = NotifyWatcherFactory.watch(&root, tx);
    assert_eq!(
        recv_within(&mut rx, Duration::from_secs(5)).await,
        Some(WatchEvent::Ready)
    );

    fs::remove_file(root.join("data.bin")).unwrap();

    let ev = recv_matching(&mut rx, |e| matches!(e, WatchEvent::Removed { .. })).await;
    assert_eq!(
        ev,
        WatchEvent::Removed {
            rel_path: "data.bin".into(),
        }
    );
    handle.close();
}

#[tokio::test]
async fn hidden_and_non_syncable_files_produce_no_change_events() {
    let dir = TempDir::new().unwrap();
    let root = utf8(&dir);
    fs::create_dir(root.join(".git")).unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let handle = NotifyWatcherFactory.watch(&root, tx);
    assert_eq!(
        recv_within(&mut rx, Duration::from_secs(5)).await,
        Some(WatchEvent::Ready)
    );

    fs::write(root.join(".git/config"), "[core]").unwrap();
    fs::write(root.join(".hidden.ts"), "x").unwrap();
    fs::write(root.join("binary.exe"), "MZ").unwrap();

    assert_eq!(recv_within(&mut rx, Duration::from_millis(700)).await, None);
    handle.close();
}

#[tokio::test]
async fn reading_a_watched_file_produces_no_events() {
    let dir = TempDir::new().unwrap();
    let root = utf8(&dir);
    fs::write(root.join("a.ts"), "Z").unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let handle = NotifyWatcherFactory.watch(&root, tx);
    assert_eq!(
        recv_within(&mut rx, Duration::from_secs(5)).await,
        Some(WatchEvent::Ready)
    );

    // One write, one change.
    fs::write(root.join("a.ts"), "Z2").unwrap();
    let ev = recv_matching(&mut rx, |e| matches!(e, WatchEvent::Changed { .. })).await;
    assert_eq!(
        ev,
        WatchEvent::Changed {
            rel_path: "a.ts".into(),
            hash: fingerprint("Z2"),
        }
    );

    // Reads of the file (including the fingerprinting read the change
    // emission itself performs) must not feed back into further changes.
    for _ in 0..3 {
        let _ = fs::read_to_string(root.join("a.ts")).unwrap();
    }
    assert_eq!(recv_within(&mut rx, Duration::from_millis(700)).await, None);
    handle.close();
}

#[tokio::test]
async fn continuously_edited_file_still_notifies_within_the_hold_bound() {
    let dir = TempDir::new().unwrap();
    let root = utf8(&dir);
    fs::write(root.join("a.ts"), "v0").unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let handle = NotifyWatcherFactory.watch(&root, tx);
    assert_eq!(
        recv_within(&mut rx, Duration::from_secs(5)).await,
        Some(WatchEvent::Ready)
    );

    // Write faster than the debounce window for three seconds straight.
    let path = root.join("a.ts");
    let writer = std::thread::spawn(move || {
        for i in 0..60 {
            fs::write(&path, format!("v{i}")).unwrap();
            std::thread::sleep(Duration::from_millis(50));
        }
    });

    // The first change must arrive while the writer is still going, bounded
    // by the hold deadline rather than deferred until the stream quiets.
    let started = std::time::Instant::now();
    let ev = recv_matching(&mut rx, |e| matches!(e, WatchEvent::Changed { .. })).await;
    assert!(matches!(ev, WatchEvent::Changed { ref rel_path, .. } if rel_path == "a.ts"));
    assert!(
        started.elapsed() < Duration::from_millis(2_500),
        "change held back for {:?}",
        started.elapsed()
    );

    writer.join().unwrap();
    handle.close();
}

#[tokio::test]
async fn close_stops_delivery_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let root = utf8(&dir);
    fs::write(root.join("a.ts"), "old").unwrap();

    let (tx, mut rx) = mpsc::channel(64);
    let handle = NotifyWatcherFactory.watch(&root, tx);
    assert_eq!(
        recv_within(&mut rx, Duration::from_secs(5)).await,
        Some(WatchEvent::Ready)
    );

    handle.close();
    handle.close();

    fs::write(root.join("a.ts"), "after close").unwrap();
    assert_eq!(recv_within(&mut rx, Duration::from_millis(700)).await, None);
}

#[tokio::test]
async fn watch_setup_failure_surfaces_as_error_event() {
    let dir = TempDir::new().unwrap();
    let missing = utf8(&dir).join("does-not-exist");

    let (tx, mut rx) = mpsc::channel(64);
    let handle = NotifyWatcherFactory.watch(&missing, tx);

    let ev = recv_within(&mut rx, Duration::from_secs(5)).await;
    assert!(matches!(ev, Some(WatchEvent::Error(_))), "got {ev:?}");
    handle.close();
}
