//! Live-development support: change classification, incremental rebuilds
//! and reload messages.

mod classifier;
mod rebuild;
mod reload;

pub use classifier::{ChangeKind, DevModeChange, detect_dev_changes, detect_restart};
pub use rebuild::{RebuildCoordinator, RebuildOutcome, RebuildResult};
pub use reload::{ReloadEvent, content_script_reloads, page_reloads};
