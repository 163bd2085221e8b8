//! Minimal content-security-policy model.

use std::fmt;

use indexmap::IndexMap;

/// Directives that are always printed first, in this order.
const DIRECTIVE_ORDER: &[&str] = &["default-src", "script-src", "object-src"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentSecurityPolicy {
    directives: IndexMap<String, Vec<String>>,
}

impl ContentSecurityPolicy {
    /// Parse a policy string such as `script-src 'self'; object-src 'self';`.
    pub fn parse(policy: &str) -> Self {
        let mut csp = Self::default();
        for directive in policy.split(';') {
            let mut parts = directive.split_whitespace();
            let Some(name) = parts.next() else {
                continue;
            };
            csp.add(name, parts);
        }
        csp
    }

    /// Add `values` to `directive`, skipping ones already present.
    pub fn add<I, S>(&mut self, directive: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = self.directives.entry(directive.to_string()).or_default();
        for value in values {
            let value = value.into();
            if !entry.contains(&value) {
                entry.push(value);
            }
        }
        self
    }
}

impl fmt::Display for ContentSecurityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ordered = DIRECTIVE_ORDER
            .iter()
            .filter_map(|name| self.directives.get_key_value(*name))
            .chain(
                self.directives
                    .iter()
                    .filter(|(name, _)| !DIRECTIVE_ORDER.contains(&name.as_str())),
            );

        let mut first = true;
        for (name, values) in ordered {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{}", name)?;
            for value in values {
                write!(f, " {}", value)?;
            }
            f.write_str(";")?;
        }
        Ok(())
    }
}
