pub mod browser;
pub mod config;
pub mod dev;
pub mod discovery;
pub mod error;
pub mod package;
pub mod resolve;

// Re-export main types
pub use browser::*;
pub use config::*;
pub use dev::*;
pub use error::*;
pub use package::PackageInfo;
pub use resolve::*;

pub use discovery::{discover, ConfigDiscovery};
