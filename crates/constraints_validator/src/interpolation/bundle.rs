//! Message bundles in `.properties` format.
//!
//! A [`MessageBundle`] holds one key/value table per locale suffix (`""` for
//! the root, `fr`, `fr_FR`, ...). Lookups walk a locale's fallback chain from
//! the most specific suffix to the root.

use constraints_core::{Locale, Result, ValidationError};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Base name of user bundle files: `ValidationMessages.properties`,
/// `ValidationMessages_fr.properties`, ...
pub const USER_BUNDLE_BASE_NAME: &str = "ValidationMessages";

const DEFAULT_ROOT: &str = include_str!("../../resources/ValidationMessages.properties");
const DEFAULT_FR: &str = include_str!("../../resources/ValidationMessages_fr.properties");
const DEFAULT_ES: &str = include_str!("../../resources/ValidationMessages_es.properties");

/// Parses `.properties` text into key/value pairs.
///
/// Supports `#` and `!` comments, `=`, `:` or whitespace separators, line
/// continuations and the `\t`, `\n`, `\r`, `\f` and `\uXXXX` escapes. Any
/// other escaped character stands for itself.
pub fn parse_properties(content: &str) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    let mut lines = content.lines();
    while let Some(line) = lines.next() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
            continue;
        }

        // 1. Join continuation lines
        let mut logical = trimmed.to_string();
        while ends_with_continuation(&logical) {
            logical.pop();
            match lines.next() {
                Some(next) => logical.push_str(next.trim_start()),
                None => break,
            }
        }

        // 2. Split key and value at the first unescaped separator
        let (key, value) = split_entry(&logical);
        entries.insert(unescape(key), unescape(value));
    }
    entries
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (&line[..i], line[i + 1..].trim_start()),
            c if c.is_whitespace() => {
                let rest = line[i..].trim_start();
                let rest = rest
                    .strip_prefix(['=', ':'])
                    .map(str::trim_start)
                    .unwrap_or(rest);
                return (&line[..i], rest);
            }
            _ => {}
        }
    }
    (line, "")
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Messages per locale suffix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessageBundle {
    tables: HashMap<String, HashMap<String, String>>,
}

impl MessageBundle {
    /// Creates an empty bundle.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in messages: English root, French and Spanish.
    pub fn defaults() -> Self {
        let mut bundle = Self::new();
        bundle.add_properties("", DEFAULT_ROOT);
        bundle.add_properties("fr", DEFAULT_FR);
        bundle.add_properties("es", DEFAULT_ES);
        bundle
    }

    /// Adds `.properties` text for the locale `suffix`; later entries win.
    pub fn add_properties(&mut self, suffix: &str, content: &str) {
        self.tables
            .entry(suffix.to_string())
            .or_default()
            .extend(parse_properties(content));
    }

    /// Loads every `ValidationMessages[_suffix].properties` file in `dir`.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory holding the bundle files
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use constraints_validator::MessageBundle;
    /// use std::path::Path;
    ///
    /// let bundle = MessageBundle::from_dir(Path::new("messages")).unwrap();
    /// ```
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let read_error = |e: std::io::Error| {
            ValidationError::validator(format!("message bundle directory '{}'", dir.display()), e)
        };
        let mut bundle = Self::new();
        for entry in fs::read_dir(dir).map_err(read_error)? {
            let path = entry.map_err(read_error)?.path();
            let Some(suffix) = bundle_suffix(&path) else {
                continue;
            };
            let content = fs::read_to_string(&path).map_err(|e| {
                ValidationError::validator(format!("message bundle '{}'", path.display()), e)
            })?;
            debug!(file = %path.display(), suffix = %suffix, "Loaded message bundle");
            bundle.add_properties(&suffix, &content);
        }
        if bundle.tables.is_empty() {
            warn!(dir = %dir.display(), "No message bundle files found");
        }
        Ok(bundle)
    }

    /// Looks `key` up along the fallback chain of `locale`.
    pub fn lookup(&self, key: &str, locale: &Locale) -> Option<&str> {
        locale.fallback_chain().iter().find_map(|suffix| {
            self.tables
                .get(suffix)
                .and_then(|table| table.get(key))
                .map(String::as_str)
        })
    }

    /// Returns true if nothing has been loaded.
    pub fn is_empty(&self) -> bool {
        self.tables.values().all(HashMap::is_empty)
    }
}

fn bundle_suffix(path: &Path) -> Option<String> {
    if path.extension()?.to_str()? != "properties" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let rest = stem.strip_prefix(USER_BUNDLE_BASE_NAME)?;
    if rest.is_empty() {
        return Some(String::new());
    }
    let tag = rest.strip_prefix('_')?;
    let locale: Locale = tag.parse().ok()?;
    Some(locale.fallback_chain().remove(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_properties() {
        let entries = parse_properties(
            "# comment\n\
             ! other comment\n\
             a=1\n\
             b : two words\n\
             c   spaced\n\
             long = first \\\n    second\n\
             esc\\=key = caf\\u00e9\\tx\n\
             empty\n",
        );
        assert_eq!(entries["a"], "1");
        assert_eq!(entries["b"], "two words");
        assert_eq!(entries["c"], "spaced");
        assert_eq!(entries["long"], "first second");
        assert_eq!(entries["esc=key"], "café\tx");
        assert_eq!(entries["empty"], "");
        assert_eq!(entries.len(), 6);
    }

    #[test]
    fn test_lookup_follows_fallback_chain() {
        let bundle = MessageBundle::defaults();
        let key = "javax.validation.constraints.AssertFalse.message";
        assert_eq!(bundle.lookup(key, &Locale::new("fr", "FR")), Some("doit avoir la valeur faux"));
        assert_eq!(bundle.lookup(key, &Locale::new("es", "ES")), Some("debe ser falso"));
        assert_eq!(bundle.lookup(key, &Locale::new("hr", "HR")), Some("must be false"));
        assert_eq!(bundle.lookup("missing", &Locale::english()), None);
    }

    #[test]
    fn test_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ValidationMessages.properties"), "greeting=hello").unwrap();
        fs::write(dir.path().join("ValidationMessages_fr.properties"), "greeting=bonjour").unwrap();
        fs::write(dir.path().join("Other.properties"), "greeting=ignored").unwrap();

        let bundle = MessageBundle::from_dir(dir.path()).unwrap();
        assert_eq!(bundle.lookup("greeting", &Locale::new("fr", "CA")), Some("bonjour"));
        assert_eq!(bundle.lookup("greeting", &Locale::english()), Some("hello"));
    }
}
