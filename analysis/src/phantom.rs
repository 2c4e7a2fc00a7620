//! References to views that do not exist.
//!
//! Action targets come from the parsed target records. Every other formula
//! in the app is scanned with a fixed set of patterns for view names.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::LazyLock;

use appsheet_nav_core::{
    AUTO_MARKER, Action, Column, FormatRule, NavigationTarget, View, join_list, normalize_value,
    strip_delimiters, view_key,
};
use regex::Regex;
use serde::Serialize;

/// Header of `potential_phantom_view_references.csv`.
pub const PHANTOM_HEADERS: [&str; 6] = [
    "name",
    "type",
    "table",
    "field",
    "missing_view_names",
    "expression",
];

/// The kind of record a phantom reference was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Action,
    Column,
    View,
    FormatRule,
}

impl ComponentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Action => "Action",
            Self::Column => "Column",
            Self::View => "View",
            Self::FormatRule => "Format Rule",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A view name found in a formula, with the function it appeared in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewReference {
    pub function: &'static str,
    pub view_name: String,
}

/// One field of one record that names views missing from the app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhantomReference {
    pub name: String,
    pub kind: ComponentKind,
    pub table: String,
    pub field: String,
    pub missing_view_names: Vec<String>,
    pub expression: String,
}

impl PhantomReference {
    /// Field values in [`PHANTOM_HEADERS`] order.
    pub fn values(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.kind.as_str().to_string(),
            self.table.clone(),
            self.field.clone(),
            join_list(&self.missing_view_names),
            self.expression.clone(),
        ]
    }
}

macro_rules! pattern {
    ($re:literal) => {{
        static RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect("static regex must compile"));
        &*RE
    }};
}

fn patterns() -> [(&'static Regex, &'static str); 16] {
    [
        (pattern!(r#"(?i)LINKTOVIEW\s*\(\s*"([^"]+)""#), "LINKTOVIEW"),
        (pattern!(r"(?i)LINKTOVIEW\s*\(\s*'([^']+)'"), "LINKTOVIEW"),
        (pattern!(r"(?i)LINKTOVIEW\s*\(\s*([^)]+)\s*\)"), "LINKTOVIEW"),
        (pattern!(r#"(?i)LINKTOFORM\s*\(\s*"([^"]+)""#), "LINKTOFORM"),
        (pattern!(r"(?i)LINKTOFORM\s*\(\s*'([^']+)'"), "LINKTOFORM"),
        (pattern!(r"(?i)LINKTOFORM\s*\(\s*([^,)]+)"), "LINKTOFORM"),
        (pattern!(r#"(?i)LINKTOFILTEREDVIEW\s*\(\s*"([^"]+)""#), "LINKTOFILTEREDVIEW"),
        (pattern!(r"(?i)LINKTOFILTEREDVIEW\s*\(\s*'([^']+)'"), "LINKTOFILTEREDVIEW"),
        (pattern!(r"(?i)LINKTOFILTEREDVIEW\s*\(\s*([^,)]+)"), "LINKTOFILTEREDVIEW"),
        (pattern!(r#"(?i)LINKTOROW\s*\([^,]+,\s*"([^"]+)""#), "LINKTOROW"),
        (pattern!(r"(?i)LINKTOROW\s*\([^,]+,\s*'([^']+)'"), "LINKTOROW"),
        (pattern!(r"(?i)LINKTOROW\s*\([^,]+,\s*([^)]+)\s*\)"), "LINKTOROW"),
        (pattern!(r#"(?i)CONTEXT\s*\(\s*["']View["']\s*\)\s*=\s*"([^"]+)""#), "CONTEXT"),
        (pattern!(r#"(?i)CONTEXT\s*\(\s*["']View["']\s*\)\s*=\s*'([^']+)'"#), "CONTEXT"),
        (pattern!(r#"(?i)"([^"]+)"\s*=\s*CONTEXT\s*\(\s*["']View["']\s*\)"#), "CONTEXT"),
        (pattern!(r#"(?i)'([^']+)'\s*=\s*CONTEXT\s*\(\s*["']View["']\s*\)"#), "CONTEXT"),
    ]
}

const IGNORED_NAMES: [&str; 5] = ["VIEW", "CONTEXT", "TRUE", "FALSE", "NULL"];

/// Extracts every view name a formula mentions.
///
/// Column references (`[Name]`) and bare keywords are not view names.
///
/// # Examples
///
/// ```
/// use appsheet_nav_analysis::extract_view_references;
///
/// let refs = extract_view_references(
///     r#"IF(CONTEXT("View") = "Inbox", LINKTOFORM('New Order', "Id", [Id]), "")"#,
/// );
/// let names: Vec<&str> = refs.iter().map(|r| r.view_name.as_str()).collect();
/// assert_eq!(names, vec!["New Order", "Inbox"]);
///
/// assert!(extract_view_references("LINKTOVIEW([Target])").is_empty());
/// ```
pub fn extract_view_references(expression: &str) -> Vec<ViewReference> {
    let mut found: Vec<ViewReference> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for (regex, function) in patterns() {
        for caps in regex.captures_iter(expression) {
            let mut name = strip_delimiters(&caps[1]);
            if function != "CONTEXT" && function != "LINKTOROW" {
                name = name.trim_end_matches([',', ')', ' ']);
            }
            if name.is_empty() || (name.starts_with('[') && name.ends_with(']')) {
                continue;
            }
            if name.contains('"') || name.contains('\'') {
                continue;
            }
            if IGNORED_NAMES
                .iter()
                .any(|keyword| keyword.eq_ignore_ascii_case(name))
            {
                continue;
            }
            if seen.insert(view_key(name)) {
                found.push(ViewReference {
                    function,
                    view_name: name.to_string(),
                });
            }
        }
    }
    found
}

/// Known view names, compared by [`view_key`].
struct KnownViews(HashSet<String>);

impl KnownViews {
    fn new(views: &[View]) -> Self {
        Self(
            views
                .iter()
                .map(|view| view_key(&view.name))
                .filter(|key| !key.is_empty())
                .collect(),
        )
    }

    fn is_missing(&self, name: &str) -> bool {
        let key = view_key(name);
        !key.is_empty() && !self.0.contains(&key)
    }

    fn missing_in(&self, expression: &str) -> Vec<String> {
        extract_view_references(expression)
            .into_iter()
            .map(|reference| reference.view_name)
            .filter(|name| self.is_missing(name))
            .collect()
    }
}

/// Inputs of the phantom scan. Only `views` is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhantomScan<'a> {
    pub views: &'a [View],
    /// Parsed targets. Used for action navigation formulas when present.
    pub targets: Option<&'a [NavigationTarget]>,
    pub actions: &'a [Action],
    pub columns: &'a [Column],
    pub format_rules: &'a [FormatRule],
}

impl PhantomScan<'_> {
    /// Runs the scan. Results are ordered action targets first, then
    /// action conditions, columns, views and format rules.
    pub fn run(&self) -> Vec<PhantomReference> {
        let known = KnownViews::new(self.views);
        let mut phantoms = Vec::new();

        match self.targets {
            Some(targets) => phantoms.extend(target_phantoms(targets, &known)),
            None => {
                for action in self.actions {
                    push_scan(
                        &mut phantoms,
                        &known,
                        (ComponentKind::Action, action.name.as_str(), action.table.as_str()),
                        "navigate_target",
                        &action.navigate_target,
                    );
                }
            }
        }
        for action in self.actions {
            push_scan(
                &mut phantoms,
                &known,
                (ComponentKind::Action, action.name.as_str(), action.table.as_str()),
                "only_if_condition",
                &action.only_if,
            );
        }
        for column in self.columns {
            let component = (ComponentKind::Column, column.name.as_str(), column.table.as_str());
            push_scan(&mut phantoms, &known, component, "app_formula", &column.app_formula);
            push_scan(&mut phantoms, &known, component, "show_if", &column.show_if);
            push_scan(&mut phantoms, &known, component, "valid_if", &column.valid_if);
            push_scan(
                &mut phantoms,
                &known,
                component,
                "type_qualifier_formulas",
                &column.type_qualifier_formulas,
            );
        }
        for view in self.views {
            push_scan(
                &mut phantoms,
                &known,
                (ComponentKind::View, view.name.as_str(), view.data_source.as_str()),
                "show_if",
                &view.show_if,
            );
        }
        for rule in self.format_rules {
            push_scan(
                &mut phantoms,
                &known,
                (ComponentKind::FormatRule, rule.name.as_str(), rule.table.as_str()),
                "condition",
                &rule.condition,
            );
        }
        phantoms
    }
}

fn push_scan(
    phantoms: &mut Vec<PhantomReference>,
    known: &KnownViews,
    (kind, name, table): (ComponentKind, &str, &str),
    field: &str,
    expression: &str,
) {
    let trimmed = expression.trim();
    if trimmed.is_empty() || trimmed == AUTO_MARKER {
        return;
    }
    let missing = known.missing_in(expression);
    if missing.is_empty() {
        return;
    }
    phantoms.push(PhantomReference {
        name: name.to_string(),
        kind,
        table: table.to_string(),
        field: field.to_string(),
        missing_view_names: missing,
        expression: expression.to_string(),
    });
}

/// One record per action whose parsed targets include unknown views.
fn target_phantoms(targets: &[NavigationTarget], known: &KnownViews) -> Vec<PhantomReference> {
    let mut order: Vec<String> = Vec::new();
    let mut missing_by_action: Vec<(BTreeSet<String>, &NavigationTarget)> = Vec::new();
    for target in targets {
        if !target.has_concrete_target() || !known.is_missing(&target.target_view) {
            continue;
        }
        let key = normalize_value(&target.source_action);
        let slot = match order.iter().position(|seen| *seen == key) {
            Some(slot) => slot,
            None => {
                order.push(key);
                missing_by_action.push((BTreeSet::new(), target));
                order.len() - 1
            }
        };
        missing_by_action[slot]
            .0
            .insert(target.target_view.trim().to_string());
    }

    missing_by_action
        .into_iter()
        .map(|(missing, first)| PhantomReference {
            name: first.source_action.clone(),
            kind: ComponentKind::Action,
            table: first.source_table.clone(),
            field: "navigate_target".to_string(),
            missing_view_names: missing.into_iter().collect(),
            expression: first.original_expression.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsheet_nav_core::{ActionKind, ViewType};

    fn views() -> Vec<View> {
        vec![
            View::new("Inbox", ViewType::Deck),
            View::new("Order Detail", ViewType::Detail),
        ]
    }

    #[test]
    fn test_extracts_every_pattern_family() {
        let expression = concat!(
            r#"LINKTOVIEW("A") & LINKTOVIEW('B') & LINKTOVIEW(C) & "#,
            r#"LINKTOFILTEREDVIEW("D", [x]) & LINKTOROW([Id], "E") & "#,
            r#"IF("F" = CONTEXT("View"), 1, 2)"#,
        );
        let names: Vec<String> = extract_view_references(expression)
            .into_iter()
            .map(|r| r.view_name)
            .collect();
        for expected in ["A", "B", "C", "D", "E", "F"] {
            assert!(names.iter().any(|n| n == expected), "{expected} in {names:?}");
        }
    }

    #[test]
    fn test_keywords_and_columns_are_not_views() {
        assert!(extract_view_references("LINKTOVIEW(VIEW)").is_empty());
        assert!(extract_view_references("LINKTOFORM([Form Name], [Id])").is_empty());
        assert!(extract_view_references(r#"CONTEXT("View") = "null""#).is_empty());
    }

    #[test]
    fn test_target_phantoms_grouped_per_action() {
        let target = |action: &str, view: &str| NavigationTarget {
            source_action: action.into(),
            source_table: "Order".into(),
            action_kind: ActionKind::GoToView,
            target_view: view.into(),
            original_expression: format!(r#"LINKTOVIEW("{view}")"#),
            ..NavigationTarget::default()
        };
        let targets = vec![
            target("Go", "Zeta"),
            target("Go", "inbox"),
            target("Go", "Alpha"),
            target("Other", "\u{201C}Order Detail\u{201D}"),
            target("Dyn", appsheet_nav_core::DYNAMIC_COLUMN_VALUE),
        ];
        let views = views();
        let scan = PhantomScan {
            views: &views,
            targets: Some(targets.as_slice()),
            ..PhantomScan::default()
        };
        let phantoms = scan.run();

        assert_eq!(phantoms.len(), 1);
        assert_eq!(phantoms[0].name, "Go");
        assert_eq!(phantoms[0].missing_view_names, vec!["Alpha", "Zeta"]);
        assert_eq!(phantoms[0].expression, r#"LINKTOVIEW("Zeta")"#);
        assert_eq!(phantoms[0].values()[1], "Action");
        assert_eq!(phantoms[0].values()[4], "Alpha|||Zeta");
    }

    #[test]
    fn test_scans_conditions_columns_views_and_rules() {
        let views = views();
        let actions = vec![
            Action::new("Go", "Order", ActionKind::GoToView)
                .with_only_if(r#"CONTEXT("View") = "Old Inbox""#),
        ];
        let columns = vec![Column {
            table: "Order".into(),
            name: "Link".into(),
            app_formula: r#"LINKTOVIEW("Reports")"#.into(),
            ..Column::default()
        }];
        let mut hidden = View::new("Hidden", ViewType::Table).with_source("Order");
        hidden.show_if = r#"CONTEXT("View") = "Inbox""#.into();
        let mut all_views = views.clone();
        all_views.push(hidden);
        let rules = vec![FormatRule {
            name: "Highlight".into(),
            table: "Order".into(),
            condition: r#"'Legacy' = CONTEXT('View')"#.into(),
            ..FormatRule::default()
        }];

        let no_targets: Vec<NavigationTarget> = Vec::new();
        let scan = PhantomScan {
            views: &all_views,
            targets: Some(no_targets.as_slice()),
            actions: &actions,
            columns: &columns,
            format_rules: &rules,
        };
        let phantoms = scan.run();
        let summary: Vec<(&str, &str, String)> = phantoms
            .iter()
            .map(|p| (p.kind.as_str(), p.field.as_str(), join_list(&p.missing_view_names)))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Action", "only_if_condition", "Old Inbox".to_string()),
                ("Column", "app_formula", "Reports".to_string()),
                ("Format Rule", "condition", "Legacy".to_string()),
            ]
        );
    }

    #[test]
    fn test_without_targets_scans_navigate_formulas() {
        let views = views();
        let actions = vec![
            Action::new("Go", "Order", ActionKind::GoToView).with_target(r#"LINKTOVIEW("Gone")"#),
        ];
        let scan = PhantomScan {
            views: &views,
            actions: &actions,
            ..PhantomScan::default()
        };
        let phantoms = scan.run();
        assert_eq!(phantoms.len(), 1);
        assert_eq!(phantoms[0].field, "navigate_target");
        assert_eq!(phantoms[0].missing_view_names, vec!["Gone"]);
    }
}
