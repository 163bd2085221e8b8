//! Configuration loading for the CLI.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Defaults
//! 2. Config file (`wext.toml`, or the `wext` field of `package.json`)
//! 3. `WEXT_`-prefixed environment variables, `__` separating nested keys
//!    (`WEXT_DEV__PORT=4000`)
//! 4. Command-line flags

mod loading;

pub use loading::{ConfigRequest, DevOverrides, load};
