// src/watch/mod.rs

//! File watching and change detection.
//!
//! Bindings map glob patterns to a handler (re-run a task or call a
//! callback). One recursive `notify` watcher covers the project root;
//! events are debounced and dispatched to every binding they match.

pub mod binding;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod watcher;

pub use binding::{WatchBinding, WatchCallback, WatchHandler, WatchSet};
pub use hash::{compute_file_hash, MemoryHashStore};
pub use watcher::{spawn, WatcherHandle};
