//! Names every downstream detector ignores or treats as used.

use std::collections::HashSet;
use std::path::Path;

use appsheet_nav_core::normalize_value;
use appsheet_nav_store::{ViewRow, read_rows_if_present};
use tracing::debug;

use crate::error::Result;

/// Unused system views, matched case-insensitively.
///
/// Loaded from `unused_system_views.csv`; a missing file means no
/// exclusions.
///
/// # Examples
///
/// ```
/// use appsheet_nav_analysis::ExclusionSet;
///
/// let excluded = ExclusionSet::from_names(["Order_Detail"]);
/// assert!(excluded.contains(" order_detail"));
/// assert!(!excluded.contains("Orders"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    views: HashSet<String>,
}

impl ExclusionSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            views: names
                .into_iter()
                .map(|name| normalize_value(name.as_ref()))
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// Reads the `view_name` column of an unused-system-views file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let rows: Vec<ViewRow> = read_rows_if_present(path)?;
        let set = Self::from_names(rows.iter().map(|row| &row.view_name));
        debug!(path = %path.display(), excluded = set.len(), "loaded view exclusions");
        Ok(set)
    }

    pub fn contains(&self, view: &str) -> bool {
        self.views.contains(&normalize_value(view))
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }
}

/// Action names triggered by automation bots, one per line. Blank lines and
/// lines starting with `#` are skipped; a missing file is empty.
pub fn load_bot_actions(path: impl AsRef<Path>) -> Result<HashSet<String>> {
    let path = path.as_ref();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(err) => return Err(appsheet_nav_store::StoreError::from(err).into()),
    };
    let names: HashSet<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(normalize_value)
        .collect();
    debug!(path = %path.display(), actions = names.len(), "loaded bot actions");
    Ok(names)
}
