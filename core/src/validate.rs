//! Structural validation of input records.
//!
//! Catches problems in the exported metadata, such as duplicate names and
//! self-referencing groups, that the analysis tolerates but that usually
//! point at an export or parsing issue worth a warning.
//!
//! # Examples
//!
//! ```
//! use appsheet_nav_core::*;
//!
//! let views = vec![
//!     View::new("Orders", ViewType::Deck),
//!     View::new("orders ", ViewType::Detail),
//! ];
//! let errors = validate_views(&views);
//! assert!(matches!(errors[0], ValidationError::DuplicateView { .. }));
//! ```

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::{Action, View, ViewType};
use crate::names::{normalize_value, view_key};

/// Input validation findings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A view record has no name.
    #[error("view record {index} has an empty name")]
    EmptyViewName { index: usize },
    /// Two views share a comparison key; the first one is used.
    #[error("duplicate view {name:?} (first defined as {first:?})")]
    DuplicateView { name: String, first: String },
    /// A dashboard lists itself among its entries.
    #[error("dashboard {0:?} contains itself")]
    DashboardContainsItself(String),
    /// An action record has no name.
    #[error("action record {index} in table {table:?} has an empty name")]
    EmptyActionName { index: usize, table: String },
    /// Two actions in the same table share a name; the first one is used.
    #[error("duplicate action {name:?} in table {table:?}")]
    DuplicateAction { table: String, name: String },
    /// A group action lists itself as a child.
    #[error("group action {0:?} references itself")]
    GroupReferencesItself(String),
}

/// Validates view records, collecting every finding.
pub fn validate_views(views: &[View]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut first_names: HashMap<String, &str> = HashMap::new();

    for (index, view) in views.iter().enumerate() {
        let key = view_key(&view.name);
        if key.is_empty() {
            errors.push(ValidationError::EmptyViewName { index });
            continue;
        }
        if let Some(first) = first_names.get(&key) {
            errors.push(ValidationError::DuplicateView {
                name: view.name.clone(),
                first: first.to_string(),
            });
            continue;
        }
        first_names.insert(key.clone(), view.name.as_str());

        if view.view_type == ViewType::Dashboard
            && view.dashboard_entries.iter().any(|entry| view_key(entry) == key)
        {
            errors.push(ValidationError::DashboardContainsItself(view.name.clone()));
        }
    }

    errors
}

/// Validates action records, collecting every finding.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::*;
///
/// let group = Action::new("DoStuff", "Orders", ActionKind::ExecuteGroup)
///     .with_children(["DoStuff"]);
/// assert_eq!(
///     validate_actions(&[group]),
///     vec![ValidationError::GroupReferencesItself("DoStuff".into())]
/// );
/// ```
pub fn validate_actions(actions: &[Action]) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen: HashSet<(String, String)> = HashSet::new();

    for (index, action) in actions.iter().enumerate() {
        let name = normalize_value(&action.name);
        if name.is_empty() {
            errors.push(ValidationError::EmptyActionName {
                index,
                table: action.table.clone(),
            });
            continue;
        }
        if !seen.insert((normalize_value(&action.table), name.clone())) {
            errors.push(ValidationError::DuplicateAction {
                table: action.table.clone(),
                name: action.name.clone(),
            });
        }
        if action.kind.is_group()
            && action
                .referenced_actions
                .iter()
                .any(|child| normalize_value(child) == name)
        {
            errors.push(ValidationError::GroupReferencesItself(action.name.clone()));
        }
    }

    errors
}
