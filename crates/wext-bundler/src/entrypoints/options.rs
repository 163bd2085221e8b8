//! Per-kind entrypoint options.
//!
//! Options are declared either in a script's default export or in HTML meta
//! tags. Both sources produce a camelCase JSON object which is deserialized
//! into a `Raw*` struct (values may still be per-browser maps) and then
//! resolved into the concrete option struct for the target browser.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use wext_config::{PerBrowser, TargetBrowser};

use super::EntrypointType;

#[derive(Debug, Clone, PartialEq)]
pub enum EntrypointOptions {
    Background(BackgroundOptions),
    ContentScript(ContentScriptOptions),
    ContentScriptStyle,
    Popup(PopupOptions),
    Options(OptionsPageOptions),
    Sidepanel(SidepanelOptions),
    Sandbox,
    Bookmarks,
    History,
    Newtab,
    Devtools,
    UnlistedPage,
    UnlistedScript,
    UnlistedStyle,
}

impl EntrypointOptions {
    pub fn entrypoint_type(&self) -> EntrypointType {
        match self {
            Self::Background(_) => EntrypointType::Background,
            Self::ContentScript(_) => EntrypointType::ContentScript,
            Self::ContentScriptStyle => EntrypointType::ContentScriptStyle,
            Self::Popup(_) => EntrypointType::Popup,
            Self::Options(_) => EntrypointType::Options,
            Self::Sidepanel(_) => EntrypointType::Sidepanel,
            Self::Sandbox => EntrypointType::Sandbox,
            Self::Bookmarks => EntrypointType::Bookmarks,
            Self::History => EntrypointType::History,
            Self::Newtab => EntrypointType::Newtab,
            Self::Devtools => EntrypointType::Devtools,
            Self::UnlistedPage => EntrypointType::UnlistedPage,
            Self::UnlistedScript => EntrypointType::UnlistedScript,
            Self::UnlistedStyle => EntrypointType::UnlistedStyle,
        }
    }

    /// Build the options of `kind` from a raw options object.
    pub fn from_raw(
        kind: EntrypointType,
        raw: &Map<String, Value>,
        browser: &TargetBrowser,
    ) -> Result<Self, String> {
        Ok(match kind {
            EntrypointType::Background => {
                Self::Background(parse::<RawBackgroundOptions>(raw)?.resolve(browser))
            }
            EntrypointType::ContentScript => {
                Self::ContentScript(parse::<RawContentScriptOptions>(raw)?.resolve(browser))
            }
            EntrypointType::Popup => Self::Popup(parse::<RawPopupOptions>(raw)?.resolve(browser)),
            EntrypointType::Options => {
                Self::Options(parse::<RawOptionsPageOptions>(raw)?.resolve(browser))
            }
            EntrypointType::Sidepanel => {
                Self::Sidepanel(parse::<RawSidepanelOptions>(raw)?.resolve(browser))
            }
            EntrypointType::ContentScriptStyle => Self::ContentScriptStyle,
            EntrypointType::Sandbox => Self::Sandbox,
            EntrypointType::Bookmarks => Self::Bookmarks,
            EntrypointType::History => Self::History,
            EntrypointType::Newtab => Self::Newtab,
            EntrypointType::Devtools => Self::Devtools,
            EntrypointType::UnlistedPage => Self::UnlistedPage,
            EntrypointType::UnlistedScript => Self::UnlistedScript,
            EntrypointType::UnlistedStyle => Self::UnlistedStyle,
        })
    }
}

fn parse<T: DeserializeOwned>(raw: &Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(raw.clone())).map_err(|e| e.to_string())
}

fn resolve<T>(value: Option<PerBrowser<T>>, browser: &TargetBrowser) -> Option<T> {
    value.and_then(|v| v.resolve(browser))
}

/// `include` / `exclude` browser lists shared by every kind.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BrowserFilter {
    pub include: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
}

impl BrowserFilter {
    pub fn from_raw(raw: &Map<String, Value>) -> Result<Self, String> {
        parse(raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundOptions {
    pub persistent: Option<bool>,
    /// `"module"` for an ES-module background.
    pub module_type: Option<String>,
}

impl BackgroundOptions {
    pub fn is_module(&self) -> bool {
        self.module_type.as_deref() == Some("module")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawBackgroundOptions {
    persistent: Option<PerBrowser<bool>>,
    #[serde(rename = "type")]
    module_type: Option<PerBrowser<String>>,
}

impl RawBackgroundOptions {
    fn resolve(self, browser: &TargetBrowser) -> BackgroundOptions {
        BackgroundOptions {
            persistent: resolve(self.persistent, browser),
            module_type: resolve(self.module_type, browser),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunAt {
    DocumentStart,
    DocumentEnd,
    #[default]
    DocumentIdle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum World {
    #[default]
    Isolated,
    Main,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CssInjectionMode {
    #[default]
    Manifest,
    Manual,
    Ui,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Registration {
    #[default]
    Manifest,
    Runtime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentScriptOptions {
    pub matches: Vec<String>,
    pub run_at: Option<RunAt>,
    pub match_about_blank: Option<bool>,
    pub exclude_matches: Option<Vec<String>>,
    pub include_globs: Option<Vec<String>>,
    pub exclude_globs: Option<Vec<String>>,
    pub all_frames: Option<bool>,
    pub world: Option<World>,
    pub css_injection_mode: CssInjectionMode,
    pub registration: Registration,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawContentScriptOptions {
    matches: Option<PerBrowser<Vec<String>>>,
    run_at: Option<PerBrowser<RunAt>>,
    match_about_blank: Option<PerBrowser<bool>>,
    exclude_matches: Option<PerBrowser<Vec<String>>>,
    include_globs: Option<PerBrowser<Vec<String>>>,
    exclude_globs: Option<PerBrowser<Vec<String>>>,
    all_frames: Option<PerBrowser<bool>>,
    world: Option<PerBrowser<World>>,
    css_injection_mode: Option<PerBrowser<CssInjectionMode>>,
    registration: Option<PerBrowser<Registration>>,
}

impl RawContentScriptOptions {
    fn resolve(self, browser: &TargetBrowser) -> ContentScriptOptions {
        ContentScriptOptions {
            matches: resolve(self.matches, browser).unwrap_or_default(),
            run_at: resolve(self.run_at, browser),
            match_about_blank: resolve(self.match_about_blank, browser),
            exclude_matches: resolve(self.exclude_matches, browser),
            include_globs: resolve(self.include_globs, browser),
            exclude_globs: resolve(self.exclude_globs, browser),
            all_frames: resolve(self.all_frames, browser),
            world: resolve(self.world, browser),
            css_injection_mode: resolve(self.css_injection_mode, browser).unwrap_or_default(),
            registration: resolve(self.registration, browser).unwrap_or_default(),
        }
    }
}

/// MV2 manifest key a popup is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKey {
    #[default]
    BrowserAction,
    PageAction,
}

impl ActionKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BrowserAction => "browser_action",
            Self::PageAction => "page_action",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PopupOptions {
    pub default_title: Option<String>,
    /// A single path or a size-to-path map.
    pub default_icon: Option<Value>,
    pub browser_style: Option<bool>,
    pub mv2_key: ActionKey,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawPopupOptions {
    default_title: Option<PerBrowser<String>>,
    default_icon: Option<Value>,
    browser_style: Option<PerBrowser<bool>>,
    mv2_key: Option<PerBrowser<ActionKey>>,
    /// `<meta name="manifest.type">`, `page_action` or anything else.
    #[serde(rename = "type")]
    action_type: Option<String>,
}

impl RawPopupOptions {
    fn resolve(self, browser: &TargetBrowser) -> PopupOptions {
        let mv2_key = resolve(self.mv2_key, browser).unwrap_or(match self.action_type.as_deref() {
            Some("page_action") => ActionKey::PageAction,
            _ => ActionKey::BrowserAction,
        });
        PopupOptions {
            default_title: resolve(self.default_title, browser),
            default_icon: self.default_icon,
            browser_style: resolve(self.browser_style, browser),
            mv2_key,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OptionsPageOptions {
    pub open_in_tab: Option<bool>,
    pub browser_style: Option<bool>,
    pub chrome_style: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawOptionsPageOptions {
    open_in_tab: Option<PerBrowser<bool>>,
    browser_style: Option<PerBrowser<bool>>,
    chrome_style: Option<PerBrowser<bool>>,
}

impl RawOptionsPageOptions {
    fn resolve(self, browser: &TargetBrowser) -> OptionsPageOptions {
        OptionsPageOptions {
            open_in_tab: resolve(self.open_in_tab, browser),
            browser_style: resolve(self.browser_style, browser),
            chrome_style: resolve(self.chrome_style, browser),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidepanelOptions {
    pub default_title: Option<String>,
    pub default_icon: Option<Value>,
    pub browser_style: Option<bool>,
    /// Firefox `sidebar_action.open_at_install`.
    pub open_at_install: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSidepanelOptions {
    default_title: Option<PerBrowser<String>>,
    default_icon: Option<Value>,
    browser_style: Option<PerBrowser<bool>>,
    open_at_install: Option<PerBrowser<bool>>,
}

impl RawSidepanelOptions {
    fn resolve(self, browser: &TargetBrowser) -> SidepanelOptions {
        SidepanelOptions {
            default_title: resolve(self.default_title, browser),
            default_icon: self.default_icon,
            browser_style: resolve(self.browser_style, browser),
            open_at_install: resolve(self.open_at_install, browser),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn content_script_resolves_per_browser_matches() {
        let options = EntrypointOptions::from_raw(
            EntrypointType::ContentScript,
            &raw(json!({
                "matches": { "chrome": ["*://*.google.com/*"], "firefox": ["*://*.mozilla.org/*"] },
                "runAt": "document_start",
                "world": "MAIN"
            })),
            &TargetBrowser::firefox(),
        )
        .unwrap();

        let EntrypointOptions::ContentScript(cs) = options else {
            panic!("expected content script options");
        };
        assert_eq!(cs.matches, vec!["*://*.mozilla.org/*"]);
        assert_eq!(cs.run_at, Some(RunAt::DocumentStart));
        assert_eq!(cs.world, Some(World::Main));
        assert_eq!(cs.registration, Registration::Manifest);
    }

    #[test]
    fn content_script_without_matches_for_browser_is_empty() {
        let options = EntrypointOptions::from_raw(
            EntrypointType::ContentScript,
            &raw(json!({ "matches": { "chrome": ["<all_urls>"] } })),
            &TargetBrowser::firefox(),
        )
        .unwrap();
        let EntrypointOptions::ContentScript(cs) = options else {
            panic!("expected content script options");
        };
        assert!(cs.matches.is_empty());
    }

    #[test]
    fn wrongly_typed_option_is_an_error() {
        let err = EntrypointOptions::from_raw(
            EntrypointType::Options,
            &raw(json!({ "openInTab": "yes" })),
            &TargetBrowser::chrome(),
        )
        .unwrap_err();
        assert!(!err.is_empty());
    }

    #[test]
    fn runtime_content_script_may_omit_matches() {
        let options = EntrypointOptions::from_raw(
            EntrypointType::ContentScript,
            &raw(json!({ "registration": "runtime" })),
            &TargetBrowser::chrome(),
        )
        .unwrap();
        assert_eq!(options.entrypoint_type(), EntrypointType::ContentScript);
    }

    #[test]
    fn popup_type_meta_selects_page_action() {
        let options = EntrypointOptions::from_raw(
            EntrypointType::Popup,
            &raw(json!({ "type": "page_action", "defaultTitle": "Hello" })),
            &TargetBrowser::chrome(),
        )
        .unwrap();
        let EntrypointOptions::Popup(popup) = options else {
            panic!("expected popup options");
        };
        assert_eq!(popup.mv2_key, ActionKey::PageAction);
        assert_eq!(popup.default_title.as_deref(), Some("Hello"));
    }

    #[test]
    fn background_module_type() {
        let options = EntrypointOptions::from_raw(
            EntrypointType::Background,
            &raw(json!({ "type": "module", "persistent": { "firefox": false } })),
            &TargetBrowser::chrome(),
        )
        .unwrap();
        let EntrypointOptions::Background(bg) = options else {
            panic!("expected background options");
        };
        assert!(bg.is_module());
        assert_eq!(bg.persistent, None);
    }

    #[test]
    fn browser_filter_reads_include_and_exclude() {
        let filter =
            BrowserFilter::from_raw(&raw(json!({ "include": ["firefox"], "matches": [] })))
                .unwrap();
        assert_eq!(filter.include, Some(vec!["firefox".to_string()]));
        assert_eq!(filter.exclude, None);
    }
}
