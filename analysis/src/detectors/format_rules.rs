//! Format rules that can never affect what the user sees.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::LazyLock;

use appsheet_nav_core::{Action, FormatRule, normalize_value};
use regex::Regex;
use serde::Serialize;

use super::ViewScope;

/// One reason a format rule is a potential orphan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "reason", content = "items")]
pub enum OrphanReason {
    AlreadyDisabled,
    AlwaysFalseCondition,
    OnlyMissingColumns(Vec<String>),
    OnlyHiddenColumns(Vec<String>),
    MissingActions(Vec<String>),
    HiddenActions(Vec<String>),
}

impl fmt::Display for OrphanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyDisabled => f.write_str("Already disabled"),
            Self::AlwaysFalseCondition => f.write_str("Has always-false condition"),
            Self::OnlyMissingColumns(items) => {
                write!(f, "Formats only non-existent columns: {}", items.join(", "))
            }
            Self::OnlyHiddenColumns(items) => {
                write!(f, "Formats only never-displayed columns: {}", items.join(", "))
            }
            Self::MissingActions(items) => {
                write!(f, "Formats non-existent actions: {}", items.join(", "))
            }
            Self::HiddenActions(items) => {
                write!(f, "Formats never-displayed actions: {}", items.join(", "))
            }
        }
    }
}

/// A potential orphan format rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormatRuleOrphan {
    /// Index into the analyzed rule slice.
    pub index: usize,
    pub name: String,
    pub reasons: Vec<OrphanReason>,
}

impl FormatRuleOrphan {
    /// Reasons joined for the `orphan_reasons` column.
    pub fn reasons_text(&self) -> String {
        let reasons: Vec<String> = self.reasons.iter().map(ToString::to_string).collect();
        reasons.join("; ")
    }
}

/// Whether a rule condition is one of the literal always-false forms.
///
/// # Examples
///
/// ```
/// use appsheet_nav_analysis::is_always_false_rule_condition;
///
/// assert!(is_always_false_rule_condition("'false'"));
/// assert!(is_always_false_rule_condition("0 = 1"));
/// assert!(!is_always_false_rule_condition("[Late]"));
/// ```
pub fn is_always_false_rule_condition(condition: &str) -> bool {
    static FALSE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"(?i)^(false|false\(\)|"false"|'false'|0\s*=\s*1|1\s*=\s*0|1\s*=\s*2|true\s*=\s*false|false\s*=\s*true)$"#,
        )
        .expect("static regex must compile")
    });
    FALSE_RE.is_match(condition.trim())
}

/// Names per table, keyed by normalized names.
#[derive(Default)]
struct PerTable(HashMap<String, HashSet<String>>);

impl PerTable {
    fn insert(&mut self, table: &str, name: &str) {
        let name = normalize_value(name);
        if !name.is_empty() {
            self.0.entry(normalize_value(table)).or_default().insert(name);
        }
    }

    fn contains(&self, table: &str, name: &str) -> bool {
        self.0
            .get(&normalize_value(table))
            .is_some_and(|names| names.contains(&normalize_value(name)))
    }
}

/// What exists and what is displayed, per table.
struct Catalog<'s> {
    scope: &'s ViewScope<'s>,
    actions: PerTable,
    shown_columns: PerTable,
    shown_actions: PerTable,
}

impl<'s> Catalog<'s> {
    fn new(scope: &'s ViewScope<'s>, actions: &[Action]) -> Self {
        let mut catalog = Self {
            scope,
            actions: PerTable::default(),
            shown_columns: PerTable::default(),
            shown_actions: PerTable::default(),
        };
        for action in actions {
            catalog.actions.insert(&action.table, &action.name);
        }
        for view in scope.included() {
            let table = scope.tables().view_table(view);
            for column in &view.view_columns {
                catalog.shown_columns.insert(table, column);
            }
            for action in view.referenced_actions.iter().chain(&view.available_actions) {
                catalog.shown_actions.insert(table, action);
            }
        }
        catalog
    }

    /// A rule's table may be a slice; both the slice and its table count.
    fn tables_of<'a>(&'a self, table: &'a str) -> [&'a str; 2] {
        [table, self.scope.tables().table_of(table)]
    }

    fn column_exists(&self, table: &str, column: &str) -> bool {
        let Some(index) = self.scope.columns() else {
            return true;
        };
        self.tables_of(table)
            .iter()
            .any(|table| index.exists(table, column) == Some(true))
    }

    fn column_shown(&self, table: &str, column: &str) -> bool {
        self.tables_of(table)
            .iter()
            .any(|table| self.shown_columns.contains(table, column))
    }

    fn action_exists(&self, table: &str, action: &str) -> bool {
        self.tables_of(table)
            .iter()
            .any(|table| self.actions.contains(table, action))
    }

    fn action_shown(&self, table: &str, action: &str) -> bool {
        self.tables_of(table)
            .iter()
            .any(|table| self.shown_actions.contains(table, action))
    }
}

/// Flags format rules that are disabled, never true, or only format
/// columns and actions that do not exist or are never displayed.
///
/// Without column data, every formatted column is taken to exist.
pub fn detect_format_rule_orphans(
    rules: &[FormatRule],
    actions: &[Action],
    scope: &ViewScope<'_>,
) -> Vec<FormatRuleOrphan> {
    let catalog = Catalog::new(scope, actions);
    let mut orphans = Vec::new();

    for (index, rule) in rules.iter().enumerate() {
        let mut reasons = Vec::new();
        if rule.disabled {
            reasons.push(OrphanReason::AlreadyDisabled);
        }
        if is_always_false_rule_condition(&rule.condition) {
            reasons.push(OrphanReason::AlwaysFalseCondition);
        }

        let mut missing = Vec::new();
        let mut hidden = Vec::new();
        let mut visible = 0usize;
        for column in &rule.formatted_columns {
            if !catalog.column_exists(&rule.table, column) {
                missing.push(column.clone());
            } else if !catalog.column_shown(&rule.table, column) {
                hidden.push(column.clone());
            } else {
                visible += 1;
            }
        }
        if visible == 0 && !missing.is_empty() {
            reasons.push(OrphanReason::OnlyMissingColumns(missing));
        } else if visible == 0 && missing.is_empty() && !hidden.is_empty() {
            reasons.push(OrphanReason::OnlyHiddenColumns(hidden));
        }

        let mut missing_actions = Vec::new();
        let mut hidden_actions = Vec::new();
        for action in &rule.formatted_actions {
            if !catalog.action_exists(&rule.table, action) {
                missing_actions.push(action.clone());
            } else if !catalog.action_shown(&rule.table, action) {
                hidden_actions.push(action.clone());
            }
        }
        if !missing_actions.is_empty() {
            reasons.push(OrphanReason::MissingActions(missing_actions));
        }
        if !hidden_actions.is_empty() {
            reasons.push(OrphanReason::HiddenActions(hidden_actions));
        }

        if !reasons.is_empty() {
            orphans.push(FormatRuleOrphan {
                index,
                name: rule.name.clone(),
                reasons,
            });
        }
    }
    orphans
}
