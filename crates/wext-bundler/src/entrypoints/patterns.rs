//! Path pattern table mapping entrypoint files to their kind.
//!
//! Paths are matched relative to the entrypoints directory with `/`
//! separators. The table is ordered and the first match wins, so the
//! specific names (`popup`, `background`, `*.content`, ...) come before the
//! bare `unlisted-*` fallbacks.

use once_cell::sync::Lazy;
use regex::Regex;

use super::EntrypointType;

const ENTRYPOINT_PATTERNS: &[(&str, EntrypointType)] = &[
    (r"^sandbox(/index)?\.html$", EntrypointType::Sandbox),
    (r"^[^/]+\.sandbox(/index)?\.html$", EntrypointType::Sandbox),
    (r"^bookmarks(/index)?\.html$", EntrypointType::Bookmarks),
    (r"^history(/index)?\.html$", EntrypointType::History),
    (r"^newtab(/index)?\.html$", EntrypointType::Newtab),
    (r"^sidepanel(/index)?\.html$", EntrypointType::Sidepanel),
    (r"^[^/]+\.sidepanel(/index)?\.html$", EntrypointType::Sidepanel),
    (r"^devtools(/index)?\.html$", EntrypointType::Devtools),
    (r"^background(/index)?\.[jt]s$", EntrypointType::Background),
    (r"^content(/index)?\.[jt]sx?$", EntrypointType::ContentScript),
    (r"^[^/]+\.content(/index)?\.[jt]sx?$", EntrypointType::ContentScript),
    (r"^content/[^/.]+/index\.[jt]sx?$", EntrypointType::ContentScript),
    (r"^content(/index)?\.(css|scss|sass|less|styl|stylus)$", EntrypointType::ContentScriptStyle),
    (r"^[^/]+\.content(/index)?\.(css|scss|sass|less|styl|stylus)$", EntrypointType::ContentScriptStyle),
    (r"^content/[^/.]+/index\.(css|scss|sass|less|styl|stylus)$", EntrypointType::ContentScriptStyle),
    (r"^popup(/index)?\.html$", EntrypointType::Popup),
    (r"^options(/index)?\.html$", EntrypointType::Options),
    (r"^[^/]+(/index)?\.html$", EntrypointType::UnlistedPage),
    (r"^[^/]+(/index)?\.[jt]sx?$", EntrypointType::UnlistedScript),
    (r"^[^/]+(/index)?\.(css|scss|sass|less|styl|stylus)$", EntrypointType::UnlistedStyle),
];

static PATTERNS: Lazy<Vec<(Regex, EntrypointType)>> = Lazy::new(|| {
    ENTRYPOINT_PATTERNS
        .iter()
        .map(|(pattern, kind)| (Regex::new(pattern).expect("entrypoint pattern is valid"), *kind))
        .collect()
});

static NESTED_CONTENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^content/([^/.]+)/index\.").expect("content pattern is valid"));

/// Kind of the entrypoint at `relative_path`, if it is one.
pub fn match_entrypoint(relative_path: &str) -> Option<EntrypointType> {
    if relative_path.ends_with(".d.ts") {
        return None;
    }
    PATTERNS
        .iter()
        .find(|(regex, _)| regex.is_match(relative_path))
        .map(|(_, kind)| *kind)
}

/// Logical name of the entrypoint at `relative_path`.
///
/// ```
/// use wext_bundler::entrypoints::patterns::entrypoint_name;
///
/// assert_eq!(entrypoint_name("overlay.content.ts"), "overlay");
/// assert_eq!(entrypoint_name("overlay.content/index.ts"), "overlay");
/// assert_eq!(entrypoint_name("content/overlay/index.ts"), "overlay");
/// assert_eq!(entrypoint_name("popup/index.html"), "popup");
/// ```
pub fn entrypoint_name(relative_path: &str) -> String {
    if let Some(captures) = NESTED_CONTENT.captures(relative_path) {
        return captures[1].to_string();
    }
    relative_path
        .split(['.', '/'])
        .next()
        .unwrap_or(relative_path)
        .to_string()
}
