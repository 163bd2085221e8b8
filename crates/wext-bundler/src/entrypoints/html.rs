//! Options declared in HTML entrypoints.
//!
//! ```html
//! <title>Settings</title>
//! <meta name="manifest.open_in_tab" content="true" />
//! <meta name="manifest.include" content="['chrome', 'edge']" />
//! ```
//!
//! Keys after `manifest.` may be written with dashes, underscores or in
//! camelCase; they are normalized to camelCase. Content is JSON5, except for
//! the keys in [`PLAIN_TEXT_KEYS`] which are taken verbatim. A page's
//! `<title>` is its default title unless a `manifest.default_title` meta tag
//! says otherwise.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::literal::parse_json5;

/// Keys whose meta content is plain text rather than JSON5.
pub const PLAIN_TEXT_KEYS: &[&str] = &["defaultTitle", "type"];

static META_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").expect("meta pattern is valid"));
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)([a-z_:-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("attribute pattern is valid")
});
static TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("title pattern is valid"));

/// Collect the `manifest.*` options declared in `html`.
pub fn manifest_options(html: &str) -> Result<Map<String, Value>, String> {
    let mut options = Map::new();

    for tag in META_TAG.find_iter(html) {
        let mut name = None;
        let mut content = None;
        for attr in ATTRIBUTE.captures_iter(tag.as_str()) {
            let value = attr
                .get(2)
                .or_else(|| attr.get(3))
                .map(|m| decode_entities(m.as_str()));
            match attr[1].to_ascii_lowercase().as_str() {
                "name" => name = value,
                "content" => content = value,
                _ => {}
            }
        }

        let (Some(name), Some(content)) = (name, content) else {
            continue;
        };
        let Some(key) = name.strip_prefix("manifest.") else {
            continue;
        };
        let key = camel_case(key);

        let value = if PLAIN_TEXT_KEYS.contains(&key.as_str()) {
            Value::String(content)
        } else {
            parse_json5(&content).map_err(|err| {
                format!("invalid JSON5 in <meta name=\"{name}\"> (content={content}): {err}")
            })?
        };
        options.insert(key, value);
    }

    if !options.contains_key("defaultTitle") {
        if let Some(title) = TITLE.captures(html) {
            let title = decode_entities(title[1].trim());
            if !title.is_empty() {
                options.insert("defaultTitle".to_string(), Value::String(title));
            }
        }
    }

    Ok(options)
}

fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for ch in key.chars() {
        if ch == '-' || ch == '_' {
            upper = true;
        } else if upper {
            out.extend(ch.to_uppercase());
            upper = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
