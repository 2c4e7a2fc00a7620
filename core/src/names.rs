//! Name normalization and the view-name registry.
//!
//! View and action names reach the analysis from several places (view
//! records, free-text navigation formulas, previously written edge files)
//! and rarely agree on casing, surrounding whitespace, or quote style.
//! Every comparison in the pipeline goes through the helpers here so that
//! two spellings of the same name never become two graph nodes.

use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

/// Separator used between alternatives in multi-valued CSV fields.
pub const LIST_DELIMITER: &str = "|||";

/// Replaces curly quotes with their straight equivalents.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::fold_quotes;
///
/// assert_eq!(fold_quotes("\u{201C}Orders\u{201D}"), "\"Orders\"");
/// assert_eq!(fold_quotes("it\u{2019}s"), "it's");
/// ```
pub fn fold_quotes(text: &str) -> String {
    text.chars()
        .map(|ch| match ch {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

/// Normalizes a value for case-insensitive matching: curly quotes folded,
/// surrounding whitespace trimmed, lowercased.
///
/// Applied to `|||` lists as a whole, this normalizes every element.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::normalize_value;
///
/// assert_eq!(normalize_value("  Customer \u{201C}A\u{201D} "), "customer \"a\"");
/// assert_eq!(normalize_value(""), "");
/// ```
pub fn normalize_value(value: &str) -> String {
    fold_quotes(value).trim().to_lowercase()
}

/// Strips delimiter quotes (straight and curly) and whitespace from both
/// ends of a captured name.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::strip_delimiters;
///
/// assert_eq!(strip_delimiters(" \"Order Detail\" "), "Order Detail");
/// assert_eq!(strip_delimiters("\u{201C}Inbox\u{201D}"), "Inbox");
/// assert_eq!(strip_delimiters("'Late'"), "Late");
/// ```
pub fn strip_delimiters(text: &str) -> &str {
    text.trim()
        .trim_matches(|ch| matches!(ch, '"' | '\'' | '\u{201C}' | '\u{201D}'))
        .trim()
}

/// Produces the comparison key for a view name.
///
/// The key is NFKC-normalized, quote-folded, trimmed, stripped of one pair
/// of surrounding quotes, and lowercased. Two names with the same key are
/// the same view.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::view_key;
///
/// assert_eq!(view_key("Order Detail"), view_key("  order detail"));
/// assert_eq!(view_key("\u{201C}Inbox\u{201D}"), "inbox");
/// ```
pub fn view_key(name: &str) -> String {
    let composed: String = name.nfkc().collect();
    let folded = fold_quotes(&composed);
    let trimmed = folded.trim();
    let unquoted = if trimmed.len() >= 2
        && ((trimmed.starts_with('"') && trimmed.ends_with('"'))
            || (trimmed.starts_with('\'') && trimmed.ends_with('\'')))
    {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    unquoted.trim().to_lowercase()
}

/// Splits a `|||`-delimited field into trimmed, non-empty items.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::split_list;
///
/// assert_eq!(split_list("Add ||| Edit|||"), vec!["Add", "Edit"]);
/// assert!(split_list("").is_empty());
/// ```
pub fn split_list(field: &str) -> Vec<String> {
    field
        .split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins items with the `|||` delimiter.
pub fn join_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parts: Vec<String> = items
        .into_iter()
        .map(|item| item.as_ref().to_string())
        .collect();
    parts.join(LIST_DELIMITER)
}

/// Maps any spelling of a known view name back to its canonical casing.
///
/// Built from the view records; the first record seen wins when two views
/// share a key.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::ViewNameRegistry;
///
/// let registry = ViewNameRegistry::from_names(["Order Detail", "Inbox"]);
/// assert_eq!(registry.resolve("  ORDER detail "), Some("Order Detail"));
/// assert_eq!(registry.resolve("\u{201C}inbox\u{201D}"), Some("Inbox"));
/// assert_eq!(registry.resolve("Missing"), None);
/// assert_eq!(registry.canonicalize(" Missing "), "Missing");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ViewNameRegistry {
    canonical: HashMap<String, String>,
}

impl ViewNameRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from canonical view names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.insert(name.as_ref());
        }
        registry
    }

    /// Registers a canonical name. Returns `false` when the key was already
    /// taken by an earlier name (which is kept).
    pub fn insert(&mut self, name: &str) -> bool {
        let key = view_key(name);
        if key.is_empty() || self.canonical.contains_key(&key) {
            return false;
        }
        self.canonical.insert(key, name.trim().to_string());
        true
    }

    /// Returns the canonical spelling of `name`, if known.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.canonical.get(&view_key(name)).map(String::as_str)
    }

    /// Returns the canonical spelling of `name`, or the cleaned-up input
    /// (NFC-composed and trimmed) when the name is not registered.
    pub fn canonicalize(&self, name: &str) -> String {
        match self.resolve(name) {
            Some(canonical) => canonical.to_string(),
            None => name.nfc().collect::<String>().trim().to_string(),
        }
    }

    /// Returns `true` if `name` resolves to a registered view.
    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.canonical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.is_empty()
    }
}
