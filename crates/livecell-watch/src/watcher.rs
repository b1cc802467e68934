//! Watches a single path and republishes its contents as an incremental
//! [`Overwrite<String>`].
//!
//! Built on a debounced `notify` watcher, generalized from "one `.rs` file,
//! fixed extension filter" to "whatever single path the caller names."

use std::path::{Path, PathBuf};
use std::time::Duration;

use livecell_core::{launch_actor, Mailbox, Overwrite};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use notify::RecursiveMode;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::{Error, Result};

enum WatcherMsg {
    FileChanged,
    Subscribe(oneshot::Sender<(Overwrite<String>, mpsc::UnboundedReceiver<Overwrite<String>>)>),
}

/// Handle to a running file watcher actor.
#[derive(Clone)]
pub struct FileWatcher {
    mailbox: Mailbox<WatcherMsg>,
}

impl FileWatcher {
    /// Start watching `path`. The watcher reads the file once immediately
    /// to seed its initial state, then re-reads it on every debounced
    /// filesystem event. An unreadable file reads as empty text rather than
    /// failing the watcher outright.
    pub fn spawn(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let watch_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let (debounce_tx, mut debounce_rx) = mpsc::unbounded_channel();
        let watched = path.clone();
        let mut debouncer = new_debouncer(Duration::from_millis(200), move |result: DebounceEventResult| {
            if let Ok(events) = result {
                for event in events {
                    if event.path == watched {
                        let _ = debounce_tx.send(());
                    }
                }
            }
        })
        .map_err(|e| Error::Watch {
            path: path.clone(),
            message: e.to_string(),
        })?;

        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Watch {
                path: path.clone(),
                message: e.to_string(),
            })?;

        let mailbox = launch_actor(move |mut rx, self_mb| {
            let path = path.clone();
            async move {
                // Keep the debouncer alive for the actor's lifetime.
                let _debouncer = debouncer;

                let forward = self_mb.lift(|()| WatcherMsg::FileChanged);
                tokio::spawn(async move {
                    while debounce_rx.recv().await.is_some() {
                        forward.send(());
                    }
                });

                let mut server: livecell_core::IncrementalServer<Overwrite<String>, Overwrite<String>> =
                    livecell_core::IncrementalServer::new(Overwrite::NoChange);
                let initial = read_text_or_empty(&path).await;
                server.update(Overwrite::OverwriteWith(initial));
                server.flush_diffs(|s, u| *s = s.combine(u));

                while let Some(msg) = rx.recv().await {
                    match msg {
                        WatcherMsg::FileChanged => {
                            let text = read_text_or_empty(&path).await;
                            debug!(path = %path.display(), len = text.len(), "file changed");
                            server.update(Overwrite::OverwriteWith(text));
                            server.flush_diffs(|s, u| *s = s.combine(u));
                        }
                        WatcherMsg::Subscribe(reply) => {
                            let (snapshot, rx) = server.subscribe_channel();
                            let _ = reply.send((snapshot, rx));
                        }
                    }
                }
            }
        });

        Ok(FileWatcher { mailbox })
    }

    /// Current contents plus a feed of future whole-file replacements.
    pub async fn subscribe(&self) -> (Overwrite<String>, mpsc::UnboundedReceiver<Overwrite<String>>) {
        let (tx, rx) = oneshot::channel();
        self.mailbox.send(WatcherMsg::Subscribe(tx));
        rx.await.expect("watcher actor is still running")
    }
}

async fn read_text_or_empty(path: &PathBuf) -> String {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "treating unreadable file as empty");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;
    use tempfile::TempDir;
    use tokio::time::{sleep, timeout};

    #[tokio::test]
    async fn initial_subscribe_yields_current_contents() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        tokio::fs::write(&file, "hello").await.unwrap();

        let watcher = FileWatcher::spawn(&file).unwrap();
        let (snapshot, _rx) = watcher.subscribe().await;
        assert_eq!(snapshot, Overwrite::OverwriteWith("hello".to_string()));
    }

    #[tokio::test]
    async fn edits_are_republished() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("notes.txt");
        tokio::fs::write(&file, "v1").await.unwrap();

        let watcher = FileWatcher::spawn(&file).unwrap();
        let (_snapshot, mut rx) = watcher.subscribe().await;

        sleep(StdDuration::from_millis(100)).await;
        tokio::fs::write(&file, "v2").await.unwrap();

        let update = timeout(StdDuration::from_secs(2), rx.recv())
            .await
            .expect("expected an update before timing out")
            .unwrap();
        assert_eq!(update, Overwrite::OverwriteWith("v2".to_string()));
    }

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("missing.txt");

        let watcher = FileWatcher::spawn(&file).unwrap();
        let (snapshot, _rx) = watcher.subscribe().await;
        assert_eq!(snapshot, Overwrite::OverwriteWith(String::new()));
    }
}
