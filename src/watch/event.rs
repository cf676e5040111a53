// src/watch/event.rs

//! Typed file-system events and classification of raw `notify` events.

use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};

use crate::fs::FileSystem;
use crate::layout::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FsEventKind {
    Added,
    Changed,
    Removed,
    DirAdded,
    DirRemoved,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub kind: FsEventKind,
    pub path: PathBuf,
}

impl FsEvent {
    pub fn new(kind: FsEventKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }
}

/// Turn one raw `notify` event into zero or more [`FsEvent`]s.
///
/// `fs` is consulted when the backend does not say whether a path is a file
/// or a directory. For removals, that is decided by looking at the mapped
/// output, since the source is already gone.
pub fn classify(event: &Event, layout: &Layout, fs: &dyn FileSystem) -> Vec<FsEvent> {
    let appeared = |path: &Path| {
        if fs.is_dir(path) {
            FsEventKind::DirAdded
        } else {
            FsEventKind::Added
        }
    };
    let vanished = |path: &Path| {
        let was_dir = layout.output_path(path).is_some_and(|out| fs.is_dir(&out));
        if was_dir {
            FsEventKind::DirRemoved
        } else {
            FsEventKind::Removed
        }
    };

    let mut out = Vec::new();
    let mut push = |kind: FsEventKind, path: &Path| {
        if !layout.is_output(path) {
            out.push(FsEvent::new(kind, path));
        }
    };

    match &event.kind {
        EventKind::Create(CreateKind::Folder) => {
            event.paths.iter().for_each(|p| push(FsEventKind::DirAdded, p))
        }
        EventKind::Create(CreateKind::File) => {
            event.paths.iter().for_each(|p| push(FsEventKind::Added, p))
        }
        EventKind::Create(_) => event.paths.iter().for_each(|p| push(appeared(p), p)),

        EventKind::Remove(RemoveKind::Folder) => {
            event.paths.iter().for_each(|p| push(FsEventKind::DirRemoved, p))
        }
        EventKind::Remove(RemoveKind::File) => {
            event.paths.iter().for_each(|p| push(FsEventKind::Removed, p))
        }
        EventKind::Remove(_) => event.paths.iter().for_each(|p| push(vanished(p), p)),

        EventKind::Modify(ModifyKind::Name(mode)) => match mode {
            RenameMode::From => event.paths.iter().for_each(|p| push(vanished(p), p)),
            RenameMode::To => event.paths.iter().for_each(|p| push(appeared(p), p)),
            RenameMode::Both => {
                if let [from, to] = event.paths.as_slice() {
                    push(vanished(from), from);
                    push(appeared(to), to);
                }
            }
            _ => {
                for p in event.paths.iter() {
                    if fs.exists(p) {
                        push(appeared(p), p);
                    } else {
                        push(vanished(p), p);
                    }
                }
            }
        },
        EventKind::Modify(ModifyKind::Metadata(_)) => {}
        EventKind::Modify(_) => {
            for p in event.paths.iter() {
                if fs.is_file(p) {
                    push(FsEventKind::Changed, p);
                }
            }
        }

        EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
    }

    out
}
