use crate::error::{IndexerError, Result};
use crate::indexer::RepoIndexer;
use crate::scanner::FileScanner;
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time;

/// Normalized filesystem event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Created,
    Modified,
    Deleted,
}

/// One normalized filesystem event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    pub path: PathBuf,
    pub kind: EventKind,
}

/// Watcher tuning knobs
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Per-path coalescing window
    pub debounce_ms: u64,

    /// How often the pending set is drained
    pub drain_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 250,
            drain_interval_ms: 50,
        }
    }
}

/// Pure per-path debounce over the event stream: bursts on one path
/// coalesce into the latest kind, released once the path has been
/// quiet for the window.
#[derive(Debug)]
pub struct DebounceState {
    window: Duration,
    pending: HashMap<PathBuf, (EventKind, Instant)>,
}

impl DebounceState {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: HashMap::new(),
        }
    }

    /// Record an event. Returns false when it only refreshed an entry
    /// already pending for the path (a dropped duplicate).
    pub fn record(&mut self, event: FileEvent, now: Instant) -> bool {
        match self.pending.get_mut(&event.path) {
            Some((kind, last_seen)) => {
                // Deletion always wins; otherwise the latest kind does.
                if *kind != EventKind::Deleted {
                    *kind = event.kind;
                }
                *last_seen = now;
                false
            }
            None => {
                self.pending.insert(event.path, (event.kind, now));
                true
            }
        }
    }

    /// Take every entry whose path has been quiet for the window.
    pub fn drain_ready(&mut self, now: Instant) -> Vec<FileEvent> {
        let window = self.window;
        let ready: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, (_, last_seen))| now.duration_since(*last_seen) >= window)
            .map(|(path, _)| path.clone())
            .collect();

        let mut events: Vec<FileEvent> = ready
            .into_iter()
            .filter_map(|path| {
                self.pending
                    .remove(&path)
                    .map(|(kind, _)| FileEvent { path, kind })
            })
            .collect();
        events.sort_by(|a, b| a.path.cmp(&b.path));
        events
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

/// Debounced filesystem observer keeping the index synchronized with
/// on-disk changes. Runs until [`RepoWatcher::stop`] or drop.
pub struct RepoWatcher {
    shutdown_tx: mpsc::Sender<()>,
    // Dropping the notify watcher unsubscribes the OS handles.
    _watcher: RecommendedWatcher,
}

impl RepoWatcher {
    pub fn start(indexer: Arc<RepoIndexer>, config: WatcherConfig) -> Result<Self> {
        // Bounded queue: 4 events in flight per worker; notify's thread
        // blocks rather than growing the queue unbounded.
        let capacity = 4 * indexer.config().workers();
        let (event_tx, event_rx) = mpsc::channel::<notify::Result<notify::Event>>(capacity);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = event_tx.blocking_send(res);
            },
            NotifyConfig::default(),
        )
        .map_err(|e| IndexerError::Watcher(format!("init failed: {e}")))?;
        watcher
            .watch(indexer.root(), RecursiveMode::Recursive)
            .map_err(|e| IndexerError::Watcher(format!("watch failed: {e}")))?;

        spawn_event_loop(indexer, config, event_rx, shutdown_rx);

        Ok(Self {
            shutdown_tx,
            _watcher: watcher,
        })
    }

    /// Stop the event loop. Pending debounced events are dropped.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

fn spawn_event_loop(
    indexer: Arc<RepoIndexer>,
    config: WatcherConfig,
    mut event_rx: mpsc::Receiver<notify::Result<notify::Event>>,
    mut shutdown_rx: mpsc::Receiver<()>,
) {
    tokio::spawn(async move {
        let scanner = FileScanner::new(indexer.root());
        let mut debounce = DebounceState::new(Duration::from_millis(config.debounce_ms));
        let mut drain = time::interval(Duration::from_millis(config.drain_interval_ms));
        drain.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                maybe_event = event_rx.recv() => {
                    match maybe_event {
                        Some(Ok(event)) => {
                            let now = Instant::now();
                            for file_event in normalize_event(&scanner, event) {
                                debounce.record(file_event, now);
                            }
                        }
                        Some(Err(err)) => log::warn!("watcher error: {err}"),
                        None => break,
                    }
                }
                _ = drain.tick() => {
                    for event in debounce.drain_ready(Instant::now()) {
                        dispatch(&indexer, event).await;
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
        log::info!("watcher loop stopped for {}", indexer.root().display());
    });
}

fn normalize_event(scanner: &FileScanner, event: notify::Event) -> Vec<FileEvent> {
    use notify::EventKind as NotifyKind;

    let kind = match event.kind {
        NotifyKind::Create(_) => EventKind::Created,
        NotifyKind::Modify(_) => EventKind::Modified,
        NotifyKind::Remove(_) => EventKind::Deleted,
        _ => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .filter(|path| scanner.is_relevant(path))
        .filter(|path| kind == EventKind::Deleted || path.is_file())
        .map(|path| FileEvent { path, kind })
        .collect()
}

async fn dispatch(indexer: &RepoIndexer, event: FileEvent) {
    let result = match event.kind {
        EventKind::Created | EventKind::Modified => indexer.ingest_one(&event.path).await,
        EventKind::Deleted => indexer.remove_one(&event.path).await,
    };
    if let Err(err) = result {
        log::warn!("watcher update for {} failed: {err}", event.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(path: &str, kind: EventKind) -> FileEvent {
        FileEvent {
            path: PathBuf::from(path),
            kind,
        }
    }

    #[test]
    fn bursts_on_one_path_coalesce() {
        let mut state = DebounceState::new(Duration::from_millis(250));
        let t0 = Instant::now();
        assert!(state.record(event("a.rs", EventKind::Created), t0));
        assert!(!state.record(event("a.rs", EventKind::Modified), t0));
        assert_eq!(state.pending(), 1);

        let ready = state.drain_ready(t0 + Duration::from_millis(300));
        assert_eq!(ready, vec![event("a.rs", EventKind::Modified)]);
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn deletion_wins_over_later_modify() {
        let mut state = DebounceState::new(Duration::from_millis(250));
        let t0 = Instant::now();
        state.record(event("a.rs", EventKind::Deleted), t0);
        state.record(event("a.rs", EventKind::Modified), t0);

        let ready = state.drain_ready(t0 + Duration::from_millis(300));
        assert_eq!(ready, vec![event("a.rs", EventKind::Deleted)]);
    }

    #[test]
    fn entries_are_held_until_quiet() {
        let mut state = DebounceState::new(Duration::from_millis(250));
        let t0 = Instant::now();
        state.record(event("a.rs", EventKind::Modified), t0);

        assert!(state.drain_ready(t0 + Duration::from_millis(100)).is_empty());

        // A fresh event resets the quiet period.
        state.record(event("a.rs", EventKind::Modified), t0 + Duration::from_millis(200));
        assert!(state.drain_ready(t0 + Duration::from_millis(300)).is_empty());
        assert_eq!(
            state
                .drain_ready(t0 + Duration::from_millis(500))
                .len(),
            1
        );
    }

    #[test]
    fn independent_paths_release_independently_and_sorted() {
        let mut state = DebounceState::new(Duration::from_millis(250));
        let t0 = Instant::now();
        state.record(event("b.rs", EventKind::Modified), t0);
        state.record(event("a.rs", EventKind::Created), t0);
        state.record(event("c.rs", EventKind::Modified), t0 + Duration::from_millis(200));

        let ready = state.drain_ready(t0 + Duration::from_millis(300));
        let paths: Vec<_> = ready.iter().map(|e| e.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")]);
        assert_eq!(state.pending(), 1);
    }
}
