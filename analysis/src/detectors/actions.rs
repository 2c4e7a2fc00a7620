//! User actions nothing can trigger.

use std::collections::{HashMap, HashSet};
use std::fmt;

use appsheet_nav_core::{
    AUTO_MARKER, Action, Prominence, Provenance, View, ViewType, normalize_value,
};
use serde::Serialize;

use super::ViewScope;
use crate::edges::{inline_column_shown, lists_action};
use crate::reachability::is_always_false;

/// Why an action was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrphanType {
    /// Nothing references, triggers or shows the action.
    Standard,
    /// Only referenced from groups that navigate away before reaching it.
    Unreachable,
}

impl OrphanType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Unreachable => "unreachable",
        }
    }
}

impl fmt::Display for OrphanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A potential orphan action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionOrphan {
    /// Index into the analyzed action slice.
    pub index: usize,
    pub name: String,
    pub orphan_type: OrphanType,
    /// Groups in which the action can never run.
    pub unreachable_in: Vec<String>,
}

impl ActionOrphan {
    pub fn notes(&self) -> String {
        match self.orphan_type {
            OrphanType::Standard => String::new(),
            OrphanType::Unreachable => format!(
                "UNREACHABLE - Remove from: {} before deleting",
                self.unreachable_in.join(", ")
            ),
        }
    }
}

/// Children listed after an unconditional navigation in a group never run:
/// the app has already left the view.
///
/// Returns, per normalized child name, the groups in which it is
/// unreachable. Children that are not known actions are ignored.
pub fn unreachable_in_groups(actions: &[Action]) -> HashMap<String, Vec<String>> {
    let mut by_name: HashMap<String, Vec<&Action>> = HashMap::new();
    for action in actions {
        by_name
            .entry(normalize_value(&action.name))
            .or_default()
            .push(action);
    }

    let mut unreachable: HashMap<String, Vec<String>> = HashMap::new();
    for group in actions.iter().filter(|action| action.kind.is_group()) {
        let group_table = normalize_value(&group.table);
        let mut navigated = false;
        for child_name in &group.referenced_actions {
            let key = normalize_value(child_name);
            let Some(records) = by_name.get(&key) else {
                continue;
            };
            let child = records
                .iter()
                .find(|record| normalize_value(&record.table) == group_table)
                .or_else(|| records.first());
            let Some(child) = child else {
                continue;
            };
            if navigated {
                let groups = unreachable.entry(key).or_default();
                if !groups.contains(&group.name) {
                    groups.push(group.name.clone());
                }
            }
            if child.kind.is_navigation() && child.is_unconditional() {
                navigated = true;
            }
        }
    }
    unreachable
}

/// Flags user actions that are not used by a bot, not referenced from a
/// group where they can run or from a view, not wired to an event, and not
/// visible in any live view.
pub fn detect_action_orphans(
    actions: &[Action],
    scope: &ViewScope<'_>,
    bot_actions: &HashSet<String>,
) -> Vec<ActionOrphan> {
    let unreachable = unreachable_in_groups(actions);

    let mut referenced_by: HashMap<String, Vec<String>> = HashMap::new();
    for action in actions {
        for child in &action.referenced_actions {
            referenced_by
                .entry(normalize_value(child))
                .or_default()
                .push(normalize_value(&action.name));
        }
    }
    let mut view_references: HashSet<String> = HashSet::new();
    let mut event_actions: HashSet<String> = HashSet::new();
    for view in scope.all() {
        view_references.extend(view.referenced_actions.iter().map(|name| normalize_value(name)));
        event_actions.extend(
            view.event_actions
                .iter()
                .filter(|name| name.as_str() != AUTO_MARKER)
                .map(|name| normalize_value(name)),
        );
    }

    let mut orphans = Vec::new();
    for (index, action) in actions.iter().enumerate() {
        if action.provenance != Provenance::User {
            continue;
        }
        let key = normalize_value(&action.name);
        if key.is_empty() || bot_actions.contains(&key) {
            continue;
        }

        let dead_groups: Vec<String> = unreachable
            .get(&key)
            .map(|groups| groups.iter().map(|group| normalize_value(group)).collect())
            .unwrap_or_default();
        let referenced = view_references.contains(&key)
            || referenced_by
                .get(&key)
                .is_some_and(|groups| groups.iter().any(|group| !dead_groups.contains(group)));
        if referenced || event_actions.contains(&key) || visible_anywhere(action, scope) {
            continue;
        }

        let unreachable_in = unreachable.get(&key).cloned().unwrap_or_default();
        orphans.push(ActionOrphan {
            index,
            name: action.name.clone(),
            orphan_type: if unreachable_in.is_empty() {
                OrphanType::Standard
            } else {
                OrphanType::Unreachable
            },
            unreachable_in,
        });
    }
    orphans
}

fn visible_anywhere(action: &Action, scope: &ViewScope<'_>) -> bool {
    if action.is_hidden_by_condition() {
        return false;
    }
    scope
        .included()
        .filter(|view| !is_always_false(&view.show_if))
        .any(|view| visible_in(action, view, scope))
}

fn visible_in(action: &Action, view: &View, scope: &ViewScope<'_>) -> bool {
    if !lists_action(&view.available_actions, &action.name) {
        return false;
    }
    let view_table = scope.tables().view_table(view);
    if !action.table.is_empty()
        && !view_table.is_empty()
        && normalize_value(&action.table) != normalize_value(view_table)
    {
        return false;
    }
    let table = if action.table.is_empty() {
        view_table
    } else {
        action.table.as_str()
    };
    let inline_shown = || {
        action.prominence == Prominence::DisplayInline
            && inline_column_shown(view, table, &action.attach_to_column, scope.columns())
    };

    match view.view_type {
        ViewType::Detail => {
            matches!(
                action.prominence,
                Prominence::DisplayProminently | Prominence::DisplayOverlay
            ) || inline_shown()
        }
        ViewType::Table => inline_shown(),
        ViewType::Deck | ViewType::Gallery => {
            action.prominence != Prominence::DoNotDisplay
                && lists_action(&view.referenced_actions, &action.name)
        }
        _ => false,
    }
}
