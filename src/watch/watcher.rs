// src/watch/watcher.rs

use std::sync::Arc;

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::fs::FileSystem;
use crate::layout::Layout;
use crate::watch::event::{classify, FsEvent};

/// Handle for the filesystem watcher.
///
/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching; the classifier task then ends and the event
/// channel closes.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `layout.src` recursively and send classified [`FsEvent`]s to `tx`.
///
/// The source root must exist.
pub fn spawn_watcher(
    layout: Layout,
    fs: Arc<dyn FileSystem>,
    tx: mpsc::Sender<FsEvent>,
) -> Result<WatcherHandle> {
    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    // The async side is gone; tracing may already be torn down.
                    eprintln!("buildpipe: failed to forward notify event: {err}");
                }
            }
            Err(err) => eprintln!("buildpipe: file watch error: {err}"),
        },
        Config::default(),
    )
    .context("creating file watcher")?;

    watcher
        .watch(&layout.src, RecursiveMode::Recursive)
        .with_context(|| format!("watching {:?}", layout.src))?;

    info!(src = %layout.src.display(), "file watcher started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            for fs_event in classify(&event, &layout, fs.as_ref()) {
                if tx.send(fs_event).await.is_err() {
                    warn!("event receiver dropped; stopping watcher loop");
                    return;
                }
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
