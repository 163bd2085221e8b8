//! Development loop.
//!
//! - [`watcher`]: notify-based watcher batching events per debounce window
//! - [`server`]: reload server streaming [`ReloadEvent`]s over SSE
//! - [`state`]: build status and connected clients shared with the server
//! - [`runner`]: optional browser process loading the built extension
//! - [`session`]: the loop tying them to the rebuild coordinator

pub mod runner;
pub mod server;
pub mod session;
pub mod state;
pub mod watcher;

pub use runner::{BrowserRunner, RunnerConfig};
pub use server::ReloadServer;
pub use session::DevSession;
pub use state::{BuildStatus, DevState, SharedState};
pub use watcher::{FileWatcher, spawn_batcher};

pub use wext_bundler::ReloadEvent;
