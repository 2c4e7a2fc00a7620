//! Virtual columns nothing else references.

use std::collections::HashSet;

use appsheet_nav_core::{Action, Column, FormatRule, Slice, normalize_value};
use serde::Serialize;
use tracing::debug;

use super::ViewScope;

/// Records besides views and columns whose `referenced_columns` count as
/// usage.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnReferenceSources<'a> {
    pub actions: &'a [Action],
    pub format_rules: &'a [FormatRule],
    pub slices: &'a [Slice],
}

/// A potential orphan virtual column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualColumnOrphan {
    /// Index into the analyzed column slice.
    pub index: usize,
    pub table: String,
    pub name: String,
    pub identifier: String,
}

/// Result of [`detect_virtual_column_orphans`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VirtualColumnReport {
    /// Virtual columns examined.
    pub analyzed: usize,
    /// `Related ...` reverse references generated by AppSheet.
    pub system_generated: usize,
    /// Label columns displayed through a `Ref` column.
    pub shown_labels: usize,
    pub orphans: Vec<VirtualColumnOrphan>,
}

/// Whether a virtual column is one AppSheet adds for a reverse reference.
///
/// # Examples
///
/// ```
/// use appsheet_nav_analysis::is_system_reverse_reference;
/// use appsheet_nav_core::Column;
///
/// let related = Column {
///     name: "Related Orders".into(),
///     app_formula: "REF_ROWS(\"Order\", \"Customer\")".into(),
///     ..Column::default()
/// };
/// assert!(is_system_reverse_reference(&related));
/// ```
pub fn is_system_reverse_reference(column: &Column) -> bool {
    column.name.starts_with("Related ") && column.app_formula.to_uppercase().contains("REF_ROWS(")
}

/// Finds virtual columns that no included view, action, format rule, slice
/// or column references.
///
/// System-generated reverse references are never reported. A label column
/// counts as used when a `Ref` column pointing at its table is referenced
/// by an included view that is not an inline view.
pub fn detect_virtual_column_orphans(
    columns: &[Column],
    sources: &ColumnReferenceSources<'_>,
    scope: &ViewScope<'_>,
) -> VirtualColumnReport {
    let referenced = referenced_columns(columns, sources, scope);
    let displayed = displayed_by_views(scope);
    let mut report = VirtualColumnReport::default();

    for (index, column) in columns.iter().enumerate() {
        if !column.is_virtual {
            continue;
        }
        report.analyzed += 1;

        if is_system_reverse_reference(column) {
            report.system_generated += 1;
            continue;
        }
        if column.is_label && label_is_shown(column, columns, &displayed) {
            report.shown_labels += 1;
            continue;
        }

        let identifier = column.identifier();
        if !referenced.contains(&normalize_value(&identifier)) {
            debug!(column = %identifier, "virtual column has no references");
            report.orphans.push(VirtualColumnOrphan {
                index,
                table: column.table.clone(),
                name: column.name.clone(),
                identifier,
            });
        }
    }
    report
}

/// Every column identifier referenced anywhere, normalized.
fn referenced_columns(
    columns: &[Column],
    sources: &ColumnReferenceSources<'_>,
    scope: &ViewScope<'_>,
) -> HashSet<String> {
    let views = scope.included().map(|view| &view.referenced_columns);
    let actions = sources.actions.iter().map(|action| &action.referenced_columns);
    let rules = sources.format_rules.iter().map(|rule| &rule.referenced_columns);
    let slices = sources.slices.iter().map(|slice| &slice.referenced_columns);
    let others = columns.iter().map(|column| &column.referenced_columns);

    views
        .chain(actions)
        .chain(rules)
        .chain(slices)
        .chain(others)
        .flatten()
        .map(|reference| normalize_value(reference))
        .filter(|reference| !reference.is_empty())
        .collect()
}

/// Column identifiers referenced by included views other than inline ones.
fn displayed_by_views(scope: &ViewScope<'_>) -> HashSet<String> {
    scope
        .included()
        .filter(|view| view.view_type.as_str() != "inline")
        .flat_map(|view| &view.referenced_columns)
        .map(|reference| normalize_value(reference))
        .collect()
}

fn label_is_shown(label: &Column, columns: &[Column], displayed: &HashSet<String>) -> bool {
    let table = normalize_value(&label.table);
    columns
        .iter()
        .filter(|column| column.is_ref() && normalize_value(&column.ref_table) == table)
        .any(|column| displayed.contains(&normalize_value(&column.identifier())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exclusions::ExclusionSet;
    use appsheet_nav_core::{ActionKind, View, ViewType};

    fn virtual_column(table: &str, name: &str) -> Column {
        Column {
            table: table.into(),
            name: name.into(),
            is_virtual: true,
            ..Column::default()
        }
    }

    fn view_using(name: &str, view_type: ViewType, references: &[&str]) -> View {
        let mut view = View::new(name, view_type).with_source("Order");
        view.referenced_columns = references.iter().map(|r| r.to_string()).collect();
        view
    }

    fn orphan_names(report: &VirtualColumnReport) -> Vec<&str> {
        report.orphans.iter().map(|orphan| orphan.name.as_str()).collect()
    }

    // -----------------------------------------------------------------------
    // References
    // -----------------------------------------------------------------------

    #[test]
    fn test_unreferenced_virtual_column_is_orphan() {
        let columns = vec![
            virtual_column("Order", "Shown Total"),
            virtual_column("Order", "Forgotten"),
            Column {
                table: "Order".into(),
                name: "Physical".into(),
                ..Column::default()
            },
        ];
        let views = vec![view_using("Orders", ViewType::Table, &["Order[Shown Total]"])];
        let excluded = ExclusionSet::default();
        let scope = ViewScope::new(&views, &excluded, &columns, &[]);

        let report =
            detect_virtual_column_orphans(&columns, &ColumnReferenceSources::default(), &scope);
        assert_eq!(report.analyzed, 2);
        assert_eq!(orphan_names(&report), vec!["Forgotten"]);
        assert_eq!(report.orphans[0].index, 1);
        assert_eq!(report.orphans[0].identifier, "Order[Forgotten]");
    }

    #[test]
    fn test_every_source_counts_as_usage() {
        let mut columns = vec![
            virtual_column("Order", "By Action"),
            virtual_column("Order", "By Rule"),
            virtual_column("Order", "By Slice"),
            virtual_column("Order", "By Column"),
        ];
        columns[0].referenced_columns = vec!["order[by column]".into()];

        let mut action = Action::new("Set", "Order", ActionKind::Other("set_values".into()));
        action.referenced_columns = vec!["Order[By Action]".into()];
        let rule = FormatRule {
            name: "Late".into(),
            referenced_columns: vec!["Order[By Rule]".into()],
            ..FormatRule::default()
        };
        let slice = Slice {
            name: "Open".into(),
            referenced_columns: vec!["Order[By Slice]".into()],
            ..Slice::default()
        };
        let sources = ColumnReferenceSources {
            actions: &[action],
            format_rules: &[rule],
            slices: &[slice],
        };
        let excluded = ExclusionSet::default();
        let scope = ViewScope::new(&[], &excluded, &columns, &[]);

        let report = detect_virtual_column_orphans(&columns, &sources, &scope);
        assert!(report.orphans.is_empty(), "{:?}", report.orphans);
    }

    #[test]
    fn test_excluded_views_do_not_count() {
        let columns = vec![virtual_column("Order", "Sys Only")];
        let views = vec![view_using("Order_Detail", ViewType::Detail, &["Order[Sys Only]"])];
        let excluded = ExclusionSet::from_names(["order_detail"]);
        let scope = ViewScope::new(&views, &excluded, &columns, &[]);

        let report =
            detect_virtual_column_orphans(&columns, &ColumnReferenceSources::default(), &scope);
        assert_eq!(orphan_names(&report), vec!["Sys Only"]);
    }

    // -----------------------------------------------------------------------
    // Skipped columns
    // -----------------------------------------------------------------------

    #[test]
    fn test_reverse_references_are_skipped() {
        let mut related = virtual_column("Customer", "Related Orders");
        related.app_formula = r#"REF_ROWS("Order", "Customer")"#.into();
        let mut named_alike = virtual_column("Customer", "Related Notes");
        named_alike.app_formula = "[Notes]".into();
        let columns = vec![related, named_alike];
        let excluded = ExclusionSet::default();
        let scope = ViewScope::new(&[], &excluded, &columns, &[]);

        let report =
            detect_virtual_column_orphans(&columns, &ColumnReferenceSources::default(), &scope);
        assert_eq!(report.system_generated, 1);
        assert_eq!(orphan_names(&report), vec!["Related Notes"]);
    }

    #[test]
    fn test_label_shown_through_ref_column() {
        let mut label = virtual_column("Customer", "Display Name");
        label.is_label = true;
        let reference = Column {
            table: "Order".into(),
            name: "Customer".into(),
            data_type: "Ref".into(),
            ref_table: "Customer".into(),
            ..Column::default()
        };
        let columns = vec![label, reference];
        let excluded = ExclusionSet::default();
        let sources = ColumnReferenceSources::default();

        let shown = vec![view_using("Orders", ViewType::Table, &["Order[Customer]"])];
        let scope = ViewScope::new(&shown, &excluded, &columns, &[]);
        let report = detect_virtual_column_orphans(&columns, &sources, &scope);
        assert_eq!(report.shown_labels, 1);
        assert!(report.orphans.is_empty());

        let inline_only = vec![view_using(
            "Orders_Inline",
            ViewType::parse("inline"),
            &["Order[Customer]"],
        )];
        let scope = ViewScope::new(&inline_only, &excluded, &columns, &[]);
        let report = detect_virtual_column_orphans(&columns, &sources, &scope);
        assert_eq!(report.shown_labels, 0);
        assert_eq!(orphan_names(&report), vec!["Display Name"]);
    }
}
