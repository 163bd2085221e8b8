//! Entrypoint model and discovery.
//!
//! An [`Entrypoint`] is one logical unit of the extension found under the
//! entrypoints directory. Its kind is decided by [`patterns`], its options are
//! read from the file (script exports or HTML meta tags) and resolved for the
//! target browser by [`options`].

mod discovery;
pub mod html;
pub mod literal;
pub mod options;
pub mod patterns;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use discovery::{Discovery, find_entrypoints};
pub use options::*;

/// Input path used for the background synthesized in development.
pub const VIRTUAL_BACKGROUND: &str = "virtual:wext-background";

/// Output subdirectory for content scripts and their styles.
pub const CONTENT_SCRIPT_OUT_DIR: &str = "content-scripts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntrypointType {
    Background,
    ContentScript,
    ContentScriptStyle,
    Popup,
    Options,
    Sidepanel,
    Sandbox,
    Bookmarks,
    History,
    Newtab,
    Devtools,
    UnlistedPage,
    UnlistedScript,
    UnlistedStyle,
}

impl EntrypointType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::ContentScript => "content-script",
            Self::ContentScriptStyle => "content-script-style",
            Self::Popup => "popup",
            Self::Options => "options",
            Self::Sidepanel => "sidepanel",
            Self::Sandbox => "sandbox",
            Self::Bookmarks => "bookmarks",
            Self::History => "history",
            Self::Newtab => "newtab",
            Self::Devtools => "devtools",
            Self::UnlistedPage => "unlisted-page",
            Self::UnlistedScript => "unlisted-script",
            Self::UnlistedStyle => "unlisted-style",
        }
    }

    /// Entrypoints rendered from an HTML document.
    pub fn is_html(self) -> bool {
        matches!(
            self,
            Self::Popup
                | Self::Options
                | Self::Sidepanel
                | Self::Sandbox
                | Self::Bookmarks
                | Self::History
                | Self::Newtab
                | Self::Devtools
                | Self::UnlistedPage
        )
    }

    /// Entrypoints whose options come from a script's default export.
    pub fn is_script(self) -> bool {
        matches!(
            self,
            Self::Background | Self::ContentScript | Self::UnlistedScript
        )
    }

    pub fn is_style(self) -> bool {
        matches!(self, Self::ContentScriptStyle | Self::UnlistedStyle)
    }

    /// Extension of the bundle emitted for this kind.
    pub fn output_extension(self) -> &'static str {
        if self.is_html() {
            ".html"
        } else if self.is_style() {
            ".css"
        } else {
            ".js"
        }
    }
}

impl std::fmt::Display for EntrypointType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entrypoint {
    pub name: String,
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub skipped: bool,
    pub options: EntrypointOptions,
}

impl Entrypoint {
    pub fn entrypoint_type(&self) -> EntrypointType {
        self.options.entrypoint_type()
    }

    /// Whether this is the background synthesized for development.
    pub fn is_virtual(&self) -> bool {
        self.input_path.as_os_str() == VIRTUAL_BACKGROUND
    }

    /// Path of the emitted bundle relative to `out_dir`, `/`-separated.
    ///
    /// ```
    /// use std::path::Path;
    /// use wext_bundler::entrypoints::{Entrypoint, EntrypointOptions, ContentScriptOptions};
    ///
    /// let entry = Entrypoint {
    ///     name: "overlay".into(),
    ///     input_path: "/ext/entrypoints/overlay.content.ts".into(),
    ///     output_dir: "/ext/.output/chrome-mv3/content-scripts".into(),
    ///     skipped: false,
    ///     options: EntrypointOptions::ContentScript(ContentScriptOptions::default()),
    /// };
    /// assert_eq!(
    ///     entry.bundle_path(Path::new("/ext/.output/chrome-mv3"), ".js"),
    ///     "content-scripts/overlay.js"
    /// );
    /// ```
    pub fn bundle_path(&self, out_dir: &Path, ext: &str) -> String {
        let file = self.output_dir.join(format!("{}{}", self.name, ext));
        let relative = file.strip_prefix(out_dir).unwrap_or(&file);
        to_slash(relative)
    }

    /// Bundle path using the kind's own output extension.
    pub fn default_bundle_path(&self, out_dir: &Path) -> String {
        self.bundle_path(out_dir, self.entrypoint_type().output_extension())
    }

    pub fn content_script_options(&self) -> Option<&ContentScriptOptions> {
        match &self.options {
            EntrypointOptions::ContentScript(options) => Some(options),
            _ => None,
        }
    }

    pub fn background_options(&self) -> Option<&BackgroundOptions> {
        match &self.options {
            EntrypointOptions::Background(options) => Some(options),
            _ => None,
        }
    }
}

/// Directory an entrypoint of `kind` emits into.
pub fn output_dir_for(kind: EntrypointType, out_dir: &Path) -> PathBuf {
    match kind {
        EntrypointType::ContentScript | EntrypointType::ContentScriptStyle => {
            out_dir.join(CONTENT_SCRIPT_OUT_DIR)
        }
        _ => out_dir.to_path_buf(),
    }
}

pub(crate) fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
