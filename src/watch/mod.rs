// src/watch/mod.rs

//! File watching and event dispatch.
//!
//! - [`watcher`] wraps `notify` and pushes classified [`FsEvent`]s onto a
//!   bounded channel.
//! - [`dispatch`] maps each event to a pipeline action and runs it, keeping
//!   jobs for the same path in order.

pub mod dispatch;
pub mod event;
pub mod watcher;

pub use dispatch::{plan, Action, Dispatcher};
pub use event::{classify, FsEvent, FsEventKind};
pub use watcher::{spawn_watcher, WatcherHandle};

/// Capacity of the classified event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;
