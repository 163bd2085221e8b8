//! Development server configuration types.

use serde::{Deserialize, Serialize};

/// Keyboard shortcut registered for reloading the extension in dev mode.
pub const DEFAULT_RELOAD_COMMAND: &str = "Alt+R";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevOptions {
    /// Shortcut for the reload command, or `false` to disable it.
    #[serde(default)]
    pub reload_command: ReloadCommand,

    #[serde(default = "default_hostname")]
    pub hostname: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Quiet window after the last file event before a batch is processed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for DevOptions {
    fn default() -> Self {
        Self {
            reload_command: ReloadCommand::default(),
            hostname: default_hostname(),
            port: default_port(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReloadCommand {
    Key(String),
    Enabled(bool),
}

impl ReloadCommand {
    /// The shortcut to register, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Key(key) => Some(key),
            Self::Enabled(true) => Some(DEFAULT_RELOAD_COMMAND),
            Self::Enabled(false) => None,
        }
    }
}

impl Default for ReloadCommand {
    fn default() -> Self {
        Self::Key(DEFAULT_RELOAD_COMMAND.to_string())
    }
}

fn default_hostname() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_debounce_ms() -> u64 {
    800
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_command_false_disables_shortcut() {
        let options: DevOptions =
            serde_json::from_value(serde_json::json!({ "reload_command": false })).unwrap();
        assert_eq!(options.reload_command.key(), None);
        assert_eq!(options.port, 3000);
    }

    #[test]
    fn reload_command_accepts_custom_key() {
        let options: DevOptions =
            serde_json::from_value(serde_json::json!({ "reload_command": "Ctrl+Shift+E" }))
                .unwrap();
        assert_eq!(options.reload_command.key(), Some("Ctrl+Shift+E"));
    }
}
