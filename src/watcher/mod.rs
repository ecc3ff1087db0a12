//! Content root watching for rebuild-on-save.
//!
//! Uses notify crate for cross-platform file system events.
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::cache::FileStore;

/// Watches a content directory and emits debounced change notifications.
pub struct ContentWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    root: PathBuf,
    ignored: Vec<PathBuf>,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl ContentWatcher {
    /// Watch everything under `root`.
    ///
    /// # Errors
    /// Returns an error if the watcher cannot be created or `root` cannot be watched.
    pub fn new(root: impl AsRef<Path>, debounce: Duration) -> notify::Result<Self> {
        // Event paths from the OS are canonical, so compare against canonical paths.
        let root = root
            .as_ref()
            .canonicalize()
            .unwrap_or_else(|_| root.as_ref().to_path_buf());

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok(Self {
            _watcher: watcher,
            rx,
            root,
            ignored: Vec::new(),
            debounce,
            pending_since: None,
        })
    }

    /// Ignore events under `path`, such as the build output or cache file
    /// when they live inside the content root.
    ///
    /// `path` need not exist yet; files that are created later (like a
    /// temp file renamed over the cache) are matched through their
    /// canonical parent directory.
    #[must_use]
    pub fn ignoring(mut self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        let path = path.canonicalize().unwrap_or_else(|_| canonical_parent_join(&path));
        self.ignored.push(path);
        self
    }

    /// Ignore a [`FileStore`] cache file together with the temp sibling it
    /// writes through.
    #[must_use]
    pub fn ignoring_cache_file(self, path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let temp = FileStore::temp_path_for(path);
        self.ignoring(path).ignoring(temp)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns true once a debounced content change is ready.
    pub fn take_change_ready(&mut self) -> bool {
        let mut saw_relevant_event = false;
        while let Ok(event) = self.rx.try_recv() {
            match event {
                Ok(ev) if self.is_relevant(&ev) => {
                    tracing::debug!(kind = ?ev.kind, paths = ?ev.paths, "content changed");
                    saw_relevant_event = true;
                }
                Ok(_) => {}
                Err(err) => tracing::warn!(error = %err, "watch error"),
            }
        }

        if saw_relevant_event {
            self.pending_since = Some(Instant::now());
        }

        let Some(pending_since) = self.pending_since else {
            return false;
        };
        if pending_since.elapsed() >= self.debounce {
            self.pending_since = None;
            return true;
        }
        false
    }

    fn is_relevant(&self, event: &Event) -> bool {
        if matches!(event.kind, EventKind::Access(_)) {
            return false;
        }
        event.paths.iter().any(|path| {
            path.starts_with(&self.root) && !self.ignored.iter().any(|ignored| path.starts_with(ignored))
        })
    }
}

fn canonical_parent_join(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => parent
            .canonicalize()
            .map_or_else(|_| path.to_path_buf(), |parent| parent.join(name)),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use tempfile::tempdir;

    fn event(kind: EventKind, path: PathBuf) -> Event {
        Event {
            kind,
            paths: vec![path],
            attrs: notify::event::EventAttributes::new(),
        }
    }

    #[test]
    fn test_event_under_root_is_relevant() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonicalize");
        let watcher = ContentWatcher::new(&root, Duration::from_millis(10)).expect("watcher");
        let ev = event(EventKind::Any, root.join("posts").join("a.txt"));
        assert!(watcher.is_relevant(&ev));
    }

    #[test]
    fn test_ignored_paths_are_not_relevant() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonicalize");
        std::fs::create_dir(root.join("public")).expect("mkdir");
        let watcher = ContentWatcher::new(&root, Duration::from_millis(10))
            .expect("watcher")
            .ignoring(root.join("public"));
        let ev = event(EventKind::Any, root.join("public").join("index.html"));
        assert!(!watcher.is_relevant(&ev));
    }

    #[test]
    fn test_access_events_are_ignored() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonicalize");
        let watcher = ContentWatcher::new(&root, Duration::from_millis(10)).expect("watcher");
        let ev = event(
            EventKind::Access(notify::event::AccessKind::Any),
            root.join("posts").join("a.txt"),
        );
        assert!(!watcher.is_relevant(&ev));
    }

    #[test]
    fn test_not_yet_created_ignored_file_matches() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonicalize");
        let watcher = ContentWatcher::new(&root, Duration::from_millis(10))
            .expect("watcher")
            .ignoring_cache_file(root.join(".coreblog-cache.json"));
        let ev = event(EventKind::Any, root.join(".coreblog-cache.tmp"));
        assert!(!watcher.is_relevant(&ev));
    }

    #[test]
    fn test_cache_file_writes_do_not_trigger_rebuild() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonicalize");
        let cache_path = root.join(".coreblog-cache.json");

        let mut watcher = ContentWatcher::new(&root, Duration::from_millis(50))
            .expect("watcher")
            .ignoring_cache_file(&cache_path);

        // Give the backend time to register the watch
        std::thread::sleep(Duration::from_millis(500));

        let mut store = FileStore::open(&cache_path).expect("open store");
        store.set("posts/a.txt", "payload".to_string()).expect("set");
        store.clear().expect("clear");

        let deadline = Instant::now() + Duration::from_secs(2);
        while Instant::now() < deadline {
            assert!(
                !watcher.take_change_ready(),
                "cache writes should not schedule a rebuild"
            );
            std::thread::sleep(Duration::from_millis(50));
        }
    }

    #[test]
    fn test_real_post_edit_detected() {
        let dir = tempdir().expect("tempdir");
        let root = dir.path().canonicalize().expect("canonicalize");
        std::fs::create_dir(root.join("posts")).expect("mkdir");
        let post = root.join("posts").join("a.txt");
        std::fs::write(&post, "Title\nDate\nbody").expect("write");

        let mut watcher = ContentWatcher::new(&root, Duration::from_millis(50)).expect("watcher");

        // Give the backend time to register the watch
        std::thread::sleep(Duration::from_millis(500));

        std::fs::write(&post, "Title\nDate\nedited").expect("write");

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut detected = false;
        while Instant::now() < deadline {
            if watcher.take_change_ready() {
                detected = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }

        assert!(detected, "watcher should detect a post edit within 5 seconds");
    }
}
