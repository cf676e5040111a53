// src/watch/dispatch.rs

//! Routing of [`FsEvent`]s to pipeline actions.
//!
//! [`plan`] is the pure event → action table; [`Dispatcher`] executes the
//! actions, one at a time per path and with directory actions acting as
//! barriers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::layout::{Layout, ScriptFilter};
use crate::pipeline::{Pipeline, SourceSelection};
use crate::watch::event::{FsEvent, FsEventKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Compile(PathBuf),
    CopyAsset(PathBuf),
    RemoveOutput(PathBuf),
    /// Remove the mapped directory, then re-ensure the entry file.
    RemoveOutputDir(PathBuf),
    Mirror,
    Ignore,
}

impl Action {
    /// Directory actions touch many paths at once.
    pub fn is_barrier(&self) -> bool {
        matches!(self, Action::RemoveOutputDir(_) | Action::Mirror)
    }
}

pub fn plan(event: &FsEvent, layout: &Layout, scripts: &ScriptFilter) -> Action {
    let path = &event.path;
    if !path.starts_with(&layout.src) || layout.is_output(path) || is_scratch_file(path) {
        return Action::Ignore;
    }

    match event.kind {
        FsEventKind::Removed => Action::RemoveOutput(path.clone()),
        FsEventKind::DirRemoved => Action::RemoveOutputDir(path.clone()),
        FsEventKind::DirAdded => Action::Mirror,
        FsEventKind::Added | FsEventKind::Changed => {
            let is_script = layout
                .relative_source(path)
                .is_some_and(|rel| scripts.is_script(&rel));
            if is_script {
                Action::Compile(path.clone())
            } else {
                Action::CopyAsset(path.clone())
            }
        }
    }
}

/// Dotfiles (including our own `.name.tmp` staging files) and editor
/// backups ending in `~`.
fn is_scratch_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy())
        .is_some_and(|n| n.starts_with('.') || n.ends_with('~'))
}

/// Executes planned actions against a shared [`Pipeline`].
#[derive(Debug)]
pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
    /// Latest job per source path. A new job for the same path awaits it.
    in_flight: HashMap<PathBuf, JoinHandle<()>>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            in_flight: HashMap::new(),
        }
    }

    pub async fn dispatch(&mut self, event: FsEvent) {
        self.reap();

        let action = plan(&event, self.pipeline.layout(), self.pipeline.scripts());
        debug!(kind = ?event.kind, path = %event.path.display(), action = ?action, "dispatching");

        match action {
            Action::Ignore => {}
            action if action.is_barrier() => {
                self.drain().await;
                execute(&self.pipeline, action).await;
            }
            action => {
                let previous = self.in_flight.remove(&event.path);
                let pipeline = Arc::clone(&self.pipeline);
                let handle = tokio::spawn(async move {
                    if let Some(previous) = previous {
                        let _ = previous.await;
                    }
                    execute(&pipeline, action).await;
                });
                self.in_flight.insert(event.path, handle);
            }
        }
    }

    /// Wait for every in-flight job.
    pub async fn drain(&mut self) {
        for (path, handle) in self.in_flight.drain() {
            if let Err(err) = handle.await {
                error!(path = %path.display(), error = %err, "watch job panicked");
            }
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    fn reap(&mut self) {
        self.in_flight.retain(|_, handle| !handle.is_finished());
    }
}

/// Run one action, logging (not returning) failures so watching continues.
async fn execute(pipeline: &Pipeline, action: Action) {
    let result = match &action {
        Action::Compile(path) => pipeline
            .compile(&SourceSelection::File(path.clone()))
            .await
            .map(|_| ()),
        Action::CopyAsset(path) => pipeline.copy_asset(path).map(|_| ()),
        Action::RemoveOutput(path) => pipeline.remove_output(path).map(|_| ()),
        Action::RemoveOutputDir(path) => pipeline.remove_output_dir(path).map(|_| ()),
        Action::Mirror => pipeline.mirror().map(|_| ()),
        Action::Ignore => Ok(()),
    };

    if let Err(err) = result {
        error!(action = ?action, error = %err, "watch handler failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> Layout {
        Layout::new("/p", "src", "dist", "src/index.js")
    }

    fn planned(kind: FsEventKind, path: &str) -> Action {
        plan(&FsEvent::new(kind, path), &layout(), &ScriptFilter::default())
    }

    #[test]
    fn dispatch_table() {
        let p = |s: &str| PathBuf::from(s);
        assert_eq!(
            planned(FsEventKind::Removed, "/p/src/a.js"),
            Action::RemoveOutput(p("/p/src/a.js"))
        );
        assert_eq!(
            planned(FsEventKind::DirRemoved, "/p/src/lib"),
            Action::RemoveOutputDir(p("/p/src/lib"))
        );
        assert_eq!(planned(FsEventKind::DirAdded, "/p/src/lib"), Action::Mirror);
        assert_eq!(
            planned(FsEventKind::Added, "/p/src/lib/a.js"),
            Action::Compile(p("/p/src/lib/a.js"))
        );
        assert_eq!(
            planned(FsEventKind::Changed, "/p/src/a.js"),
            Action::Compile(p("/p/src/a.js"))
        );
        assert_eq!(
            planned(FsEventKind::Changed, "/p/src/logo.svg"),
            Action::CopyAsset(p("/p/src/logo.svg"))
        );
    }

    #[test]
    fn outside_src_and_scratch_files_are_ignored() {
        assert_eq!(planned(FsEventKind::Added, "/p/README.md"), Action::Ignore);
        assert_eq!(planned(FsEventKind::Added, "/p/dist/a.js"), Action::Ignore);
        assert_eq!(planned(FsEventKind::Added, "/p/src/.a.js.swp"), Action::Ignore);
        assert_eq!(planned(FsEventKind::Changed, "/p/src/a.js~"), Action::Ignore);
    }

    #[test]
    fn only_directory_actions_are_barriers() {
        assert!(Action::Mirror.is_barrier());
        assert!(Action::RemoveOutputDir(PathBuf::from("/x")).is_barrier());
        assert!(!Action::Compile(PathBuf::from("/x")).is_barrier());
        assert!(!Action::RemoveOutput(PathBuf::from("/x")).is_barrier());
    }
}
