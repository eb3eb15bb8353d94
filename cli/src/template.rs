//! Alias placeholder templating
//!
//! Published component sources refer to project paths through placeholders
//! such as `{{ components }}` or `{{ utils }}`. At build time the author's
//! import aliases are turned into placeholders ([`templatize`]); at install
//! time placeholders are replaced with the consumer's aliases ([`render`]).
//!
//! Rendering is plain variable substitution. Placeholders whose key the
//! consumer did not configure stay in the output untouched.

use regex::{Captures, Regex};
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::config::AliasConfiguration;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_-]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Placeholder token for an alias key
pub fn placeholder(key: &str) -> String {
    format!("{{{{ {} }}}}", key)
}

/// Keys of every placeholder in `content`, in order of appearance
pub fn placeholders(content: &str) -> Vec<String> {
    PLACEHOLDER
        .captures_iter(content)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Replace every recognized placeholder with the consumer's alias
pub fn render(content: &str, config: &AliasConfiguration) -> String {
    PLACEHOLDER
        .replace_all(content, |caps: &Captures| match config.get(&caps[1]) {
            Some(value) => value.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Placeholder keys in `content` that `config` cannot resolve
pub fn unresolved(content: &str, config: &AliasConfiguration) -> Vec<String> {
    let mut keys: Vec<String> = placeholders(content)
        .into_iter()
        .filter(|key| config.get(key).is_none())
        .collect();
    keys.sort();
    keys.dedup();
    keys
}

/// Turn the author's import aliases into placeholders
///
/// `aliases` maps placeholder key to the source prefix used in the component
/// tree (for example `utils` → `@/lib/utils`). Only quoted module paths that
/// equal the prefix or continue it with `/` are rewritten, and longer
/// prefixes win over shorter ones.
pub fn templatize(content: &str, aliases: &BTreeMap<String, String>) -> String {
    let mut ordered: Vec<(&String, &String)> = aliases
        .iter()
        .filter(|(_, prefix)| !prefix.is_empty())
        .collect();
    ordered.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));

    let mut output = content.to_string();
    for (key, prefix) in ordered {
        let pattern = format!(r#"(["'`]){}([/"'`])"#, regex::escape(prefix));
        let Ok(re) = Regex::new(&pattern) else {
            continue;
        };
        let token = placeholder(key);
        output = re
            .replace_all(&output, |caps: &Captures| {
                format!("{}{}{}", &caps[1], token, &caps[2])
            })
            .into_owned();
    }
    output
}
