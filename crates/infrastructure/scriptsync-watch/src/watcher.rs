//! Recursive directory watch built on `notify`.
//!
//! Raw OS notifications are funneled from the notify callback thread into a
//! tokio classification task, which debounces bursts, applies the hidden-file
//! and extension filters, and emits the session-facing [`WatchEvent`]s.
//! Change events carry the fingerprint of the content read at emission time.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use camino::{Utf8Path, Utf8PathBuf};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use scriptsync_config::{is_syncable_extension, WATCH_DEBOUNCE_MS, WATCH_MAX_COALESCE_MS};
use scriptsync_core::{fingerprint, paths};
use scriptsync_session::{WatchEvent, WatcherFactory, WatcherHandle};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

enum RawSignal {
    Event(notify::Event),
    Error(String),
}

pub struct NotifyWatcherFactory;

impl WatcherFactory for NotifyWatcherFactory {
    fn watch(&self, root: &Utf8Path, events: mpsc::Sender<WatchEvent>) -> Box<dyn WatcherHandle> {
        Box::new(DirectoryWatcher::spawn(root.to_owned(), events))
    }
}

pub struct DirectoryWatcher {
    closed: Arc<AtomicBool>,
    watcher: Mutex<Option<RecommendedWatcher>>,
    classifier: Mutex<Option<JoinHandle<()>>>,
}

impl DirectoryWatcher {
    /// Start watching `root` recursively. Setup failures are reported through
    /// an `Error` event on `events`; the returned handle is always valid and
    /// closable.
    pub fn spawn(root: Utf8PathBuf, events: mpsc::Sender<WatchEvent>) -> Self {
        let closed = Arc::new(AtomicBool::new(false));
        let (raw_tx, raw_rx) = mpsc::channel::<RawSignal>(256);

        let callback_tx = raw_tx.clone();
        let watcher = notify::recommended_watcher(
            move |res: Result<notify::Event, notify::Error>| {
                // Runs on the notify thread; best-effort handoff to the
                // classifier. A full channel drops the raw event, the next
                // notification for the same file catches up.
                let signal = match res {
                    Ok(event) => RawSignal::Event(event),
                    Err(e) => RawSignal::Error(e.to_string()),
                };
                let _ = callback_tx.try_send(signal);
            },
        );

        let watcher = match watcher {
            Ok(mut w) => match w.watch(root.as_std_path(), RecursiveMode::Recursive) {
                Ok(()) => {
                    let _ = events.try_send(WatchEvent::Ready);
                    Some(w)
                }
                Err(e) => {
                    let _ = events.try_send(WatchEvent::Error(e.to_string()));
                    Some(w)
                }
            },
            Err(e) => {
                let _ = events.try_send(WatchEvent::Error(e.to_string()));
                None
            }
        };

        let classifier = tokio::spawn(classify_loop(
            root,
            closed.clone(),
            raw_rx,
            events,
        ));

        Self {
            closed,
            watcher: Mutex::new(watcher),
            classifier: Mutex::new(Some(classifier)),
        }
    }
}

impl WatcherHandle for DirectoryWatcher {
    fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        // Dropping the notify watcher stops the OS watch; aborting the
        // classifier stops delivery deterministically.
        self.watcher.lock().unwrap().take();
        if let Some(task) = self.classifier.lock().unwrap().take() {
            task.abort();
        }
    }
}

fn is_hidden(rel: &Utf8Path) -> bool {
    rel.components().any(|c| c.as_str().starts_with('.'))
}

fn has_syncable_extension(path: &Utf8Path) -> bool {
    path.extension().map(is_syncable_extension).unwrap_or(false)
}

/// A not-yet-emitted change: the last raw event for the path, and the hard
/// deadline by which it flushes even if edits keep arriving.
struct PendingChange {
    touched: Instant,
    deadline: Instant,
}

impl PendingChange {
    fn due_at(&self, debounce: Duration) -> Instant {
        (self.touched + debounce).min(self.deadline)
    }
}

async fn classify_loop(
    root: Utf8PathBuf,
    closed: Arc<AtomicBool>,
    mut raw_rx: mpsc::Receiver<RawSignal>,
    events: mpsc::Sender<WatchEvent>,
) {
    let debounce = Duration::from_millis(WATCH_DEBOUNCE_MS);
    let max_hold = Duration::from_millis(WATCH_MAX_COALESCE_MS);
    let mut pending: BTreeMap<Utf8PathBuf, PendingChange> = BTreeMap::new();

    loop {
        let msg = if pending.is_empty() {
            raw_rx.recv().await
        } else {
            let now = Instant::now();
            let next = pending
                .values()
                .map(|p| p.due_at(debounce))
                .min()
                .unwrap_or(now);
            let wait = next.saturating_duration_since(now);
            match tokio::time::timeout(wait, raw_rx.recv()).await {
                Ok(msg) => msg,
                Err(_) => {
                    flush_due(&root, &closed, &mut pending, &events, debounce).await;
                    continue;
                }
            }
        };

        let Some(signal) = msg else { break };
        if closed.load(Ordering::SeqCst) {
            break;
        }

        match signal {
            RawSignal::Error(e) => {
                let _ = events.send(WatchEvent::Error(e)).await;
            }
            RawSignal::Event(event) => {
                // Access events (opens, reads, close-no-write) never change
                // content. Reacting to them would loop: the flush's own read
                // of a file reports another access on it.
                if matches!(event.kind, EventKind::Access(_)) {
                    continue;
                }
                let kind = event.kind;
                for path in event.paths {
                    let Ok(path) = Utf8PathBuf::from_path_buf(path) else {
                        continue;
                    };
                    let Ok(rel) = path.strip_prefix(&root) else {
                        continue;
                    };
                    // Hidden entries are excluded from the watch entirely.
                    if is_hidden(rel) {
                        continue;
                    }
                    if matches!(kind, EventKind::Remove(_)) || !path.exists() {
                        // Removal fires for any deleted path; a single event
                        // for a removed directory covers its descendants.
                        // The exists() fallback catches rename-style removals
                        // reported as modify events.
                        let rel_path = paths::normalize(rel.as_str());
                        if !closed.load(Ordering::SeqCst) {
                            let _ = events.send(WatchEvent::Removed { rel_path }).await;
                        }
                    } else if matches!(kind, EventKind::Create(_) | EventKind::Modify(_))
                        && path.is_file()
                        && has_syncable_extension(&path)
                    {
                        let now = Instant::now();
                        pending
                            .entry(path)
                            .and_modify(|p| p.touched = now)
                            .or_insert(PendingChange {
                                touched: now,
                                deadline: now + max_hold,
                            });
                    }
                }
                // A file edited more often than the debounce window still
                // flushes once its deadline passes.
                flush_due(&root, &closed, &mut pending, &events, debounce).await;
            }
        }
    }
}

async fn flush_due(
    root: &Utf8Path,
    closed: &AtomicBool,
    pending: &mut BTreeMap<Utf8PathBuf, PendingChange>,
    events: &mpsc::Sender<WatchEvent>,
    debounce: Duration,
) {
    let now = Instant::now();
    let due: Vec<Utf8PathBuf> = pending
        .iter()
        .filter(|(_, p)| p.due_at(debounce) <= now)
        .map(|(path, _)| path.clone())
        .collect();
    for path in due {
        pending.remove(&path);
        if closed.load(Ordering::SeqCst) {
            return;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let _ = events
                    .send(WatchEvent::Changed {
                        rel_path: paths::normalize(rel.as_str()),
                        hash: fingerprint(&content),
                    })
                    .await;
            }
            Err(e) => {
                // Changed then gone within the window; the raw remove event
                // already produced the removal.
                debug!("Skipping change for unreadable {}: {}", path, e);
            }
        }
    }
}
