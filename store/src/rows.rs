//! Typed CSV rows for every artifact, and their mapping to the core model.
//!
//! Field names are the CSV column names. Every field is a string so that
//! rows round-trip without loss; interpretation happens in the conversions.

use appsheet_nav_core::{
    Action, ActionKind, Availability, BranchOrigin, Column, ContextConstraints, ContextField,
    DataDependence, FieldConstraint, FormatRule, NavigationEdge, NavigationTarget, Prominence,
    Provenance, Slice, View, ViewCategory, ViewType, join_list, normalize_value, parse_flag,
    split_list,
};
use serde::{Deserialize, Serialize};

use crate::csv_io::CsvRecord;

macro_rules! csv_row {
    (@header $field:ident) => {
        stringify!($field)
    };
    (@header $field:ident $header:literal) => {
        $header
    };
    ($(#[$meta:meta])* $name:ident { $($field:ident $(as $header:literal)?),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $($(#[serde(rename = $header)])? pub $field: String,)+
        }

        impl CsvRecord for $name {
            const HEADERS: &'static [&'static str] = &[$(csv_row!(@header $field $($header)?)),+];

            fn values(&self) -> Vec<String> {
                vec![$(self.$field.clone()),+]
            }
        }
    };
}

csv_row! {
    /// A row of `appsheet_actions.csv`.
    ActionRow {
        action_name,
        source_table,
        action_type_plain_english,
        action_type_technical_name,
        referenced_columns,
        referenced_actions,
        action_prominence,
        navigate_target,
        referenced_views,
        attach_to_column,
        modifies_data,
        only_if_condition,
        display_name,
        action_icon,
        needs_confirmation,
        bulk_applicable,
        column_to_edit,
        to_this_value,
        with_these_properties,
        raw_references,
        is_system_generated,
    }
}

csv_row! {
    /// A row of `appsheet_views.csv`.
    ViewRow {
        view_name,
        view_type,
        category,
        is_system_view,
        data_source,
        source_table,
        position,
        ref_parent,
        display_mode,
        use_card_layout,
        show_action_bar,
        action_display_mode,
        referenced_actions,
        event_actions,
        available_actions,
        view_columns,
        available_columns,
        hidden_columns,
        referenced_columns,
        dashboard_view_entries,
        show_if,
        icon,
        created_by,
        action_type,
        html_position,
        view_configuration,
    }
}

csv_row! {
    /// A row of `appsheet_columns.csv`.
    ColumnRow {
        table_name,
        column_name,
        unique_identifier,
        is_virtual,
        data_type as "type",
        label,
        ref_table,
        referenced_columns,
        hidden,
        app_formula,
        show_if,
        valid_if,
        type_qualifier_formulas,
    }
}

csv_row! {
    /// A row of `appsheet_slices.csv`.
    SliceRow {
        slice_name,
        source_table,
        slice_columns,
        slice_actions,
        referenced_columns,
    }
}

csv_row! {
    /// A row of `appsheet_format_rules.csv`.
    FormatRuleRow {
        rule_name,
        source_table,
        condition,
        is_disabled,
        formatted_columns,
        formatted_actions,
        referenced_columns,
    }
}

csv_row! {
    /// A row of `action_targets.csv`.
    TargetRow {
        source_action,
        source_table,
        action_type,
        action_prominence,
        attach_to_column,
        target_view,
        target_row_expr,
        only_if_condition,
        must_be_in_views,
        must_not_be_in_views,
        must_be_viewtype,
        must_not_be_viewtype,
        must_be_table,
        must_not_be_table,
        ifs_branch_index,
        ifs_branch_text,
        view_match_pattern,
        view_match_type,
        referenced_actions,
        original_expression,
        source_action_normalized,
        target_view_normalized,
        must_be_in_views_normalized,
        must_not_be_in_views_normalized,
        must_be_table_normalized,
        must_not_be_table_normalized,
        contradictory_fields,
    }
}

csv_row! {
    /// A row of `navigation_edges.csv`.
    EdgeRow {
        source_view,
        source_view_type,
        target_view,
        source_action,
        parent_action,
        action_type,
        action_availability_type,
        parent_prominence,
        child_prominence,
        event_type,
        is_self_loop,
        must_be_in_views,
        must_not_be_in_views,
        must_be_viewtype,
        must_not_be_viewtype,
        must_be_table,
        must_not_be_table,
        available_actions,
        original_expression,
        source_view_normalized,
        target_view_normalized,
        source_action_normalized,
        must_be_in_views_normalized,
        must_not_be_in_views_normalized,
        must_be_table_normalized,
        must_not_be_table_normalized,
    }
}

/// Renders a flag the way the exports do.
pub fn yes_no(flag: bool) -> String {
    if flag { "Yes" } else { "No" }.to_string()
}

impl ActionRow {
    pub fn to_action(&self) -> Action {
        Action {
            name: self.action_name.trim().to_string(),
            table: self.source_table.trim().to_string(),
            kind: ActionKind::from_technical_name(&self.action_type_technical_name),
            plain_english_type: self.action_type_plain_english.trim().to_string(),
            navigate_target: self.navigate_target.clone(),
            only_if: self.only_if_condition.clone(),
            referenced_actions: split_list(&self.referenced_actions),
            prominence: Prominence::parse(&self.action_prominence),
            attach_to_column: self.attach_to_column.trim().to_string(),
            provenance: Provenance::from_flag(&self.is_system_generated),
            referenced_columns: split_list(&self.referenced_columns),
        }
    }
}

impl ViewRow {
    pub fn to_view(&self) -> View {
        View {
            name: self.view_name.trim().to_string(),
            view_type: ViewType::parse(&self.view_type),
            category: ViewCategory::parse(&self.category),
            position: self.position.trim().to_lowercase(),
            data_source: self.data_source.trim().to_string(),
            source_table: self.source_table.trim().to_string(),
            is_system: parse_flag(&self.is_system_view),
            show_if: self.show_if.clone(),
            available_actions: split_list(&self.available_actions),
            referenced_actions: split_list(&self.referenced_actions),
            event_actions: split_list(&self.event_actions),
            view_columns: split_list(&self.view_columns),
            configuration: self.view_configuration.clone(),
            dashboard_entries: split_list(&self.dashboard_view_entries),
            referenced_columns: split_list(&self.referenced_columns),
        }
    }
}

impl ColumnRow {
    pub fn to_column(&self) -> Column {
        Column {
            table: self.table_name.trim().to_string(),
            name: self.column_name.trim().to_string(),
            unique_identifier: self.unique_identifier.trim().to_string(),
            is_virtual: parse_flag(&self.is_virtual),
            data_type: self.data_type.trim().to_string(),
            is_label: parse_flag(&self.label),
            ref_table: self.ref_table.trim().to_string(),
            referenced_columns: split_list(&self.referenced_columns),
            hidden: parse_flag(&self.hidden),
            app_formula: self.app_formula.clone(),
            show_if: self.show_if.clone(),
            valid_if: self.valid_if.clone(),
            type_qualifier_formulas: self.type_qualifier_formulas.clone(),
        }
    }
}

impl SliceRow {
    pub fn to_slice(&self) -> Slice {
        Slice {
            name: self.slice_name.trim().to_string(),
            source_table: self.source_table.trim().to_string(),
            columns: split_list(&self.slice_columns),
            actions: split_list(&self.slice_actions),
            referenced_columns: split_list(&self.referenced_columns),
        }
    }
}

impl FormatRuleRow {
    pub fn to_format_rule(&self) -> FormatRule {
        FormatRule {
            name: self.rule_name.trim().to_string(),
            table: self.source_table.trim().to_string(),
            condition: self.condition.clone(),
            disabled: parse_flag(&self.is_disabled),
            formatted_columns: split_list(&self.formatted_columns),
            formatted_actions: split_list(&self.formatted_actions),
            referenced_columns: split_list(&self.referenced_columns),
        }
    }
}

impl TargetRow {
    pub fn from_target(target: &NavigationTarget) -> Self {
        let c = &target.constraints;
        let (branch_index, branch_text) = match &target.branch {
            Some(branch) => (branch.index.to_string(), branch.text.clone()),
            None => (String::new(), String::new()),
        };
        let (pattern, match_type) = match &target.data_dependence {
            Some(dependence) => (dependence.pattern(), dependence.match_type().to_string()),
            None => (String::new(), String::new()),
        };
        Self {
            source_action: target.source_action.clone(),
            source_table: target.source_table.clone(),
            action_type: target.action_kind.technical_name().to_string(),
            action_prominence: target.prominence.as_str().to_string(),
            attach_to_column: target.attach_to_column.clone(),
            target_view: target.target_view.clone(),
            target_row_expr: target.row_expr.clone(),
            only_if_condition: target.only_if_condition.clone(),
            must_be_in_views: c.view.must_be_list(),
            must_not_be_in_views: c.view.must_not_be_list(),
            must_be_viewtype: c.view_type.must_be_list(),
            must_not_be_viewtype: c.view_type.must_not_be_list(),
            must_be_table: c.table.must_be_list(),
            must_not_be_table: c.table.must_not_be_list(),
            ifs_branch_index: branch_index,
            ifs_branch_text: branch_text,
            view_match_pattern: pattern,
            view_match_type: match_type,
            referenced_actions: join_list(&target.referenced_actions),
            original_expression: target.original_expression.clone(),
            source_action_normalized: normalize_value(&target.source_action),
            target_view_normalized: normalize_value(&target.target_view),
            must_be_in_views_normalized: normalize_value(&c.view.must_be_list()),
            must_not_be_in_views_normalized: normalize_value(&c.view.must_not_be_list()),
            must_be_table_normalized: normalize_value(&c.table.must_be_list()),
            must_not_be_table_normalized: normalize_value(&c.table.must_not_be_list()),
            contradictory_fields: join_list(
                c.contradictory_fields().into_iter().map(ContextField::as_str),
            ),
        }
    }

    /// Rebuilds the target, including any recorded contradiction.
    pub fn to_target(&self) -> NavigationTarget {
        let contradictory = split_list(&self.contradictory_fields);
        let restore = |field: ContextField, must_be: &str, must_not_be: &str| {
            let mut constraint = FieldConstraint::from_lists(must_be, must_not_be);
            if contradictory.iter().any(|name| name == field.as_str()) {
                constraint.allowed = Some(Default::default());
            }
            constraint
        };
        let constraints = ContextConstraints {
            view: restore(
                ContextField::View,
                &self.must_be_in_views,
                &self.must_not_be_in_views,
            ),
            view_type: restore(
                ContextField::ViewType,
                &self.must_be_viewtype,
                &self.must_not_be_viewtype,
            ),
            table: restore(
                ContextField::Table,
                &self.must_be_table,
                &self.must_not_be_table,
            ),
        };
        let branch = self
            .ifs_branch_index
            .trim()
            .parse::<usize>()
            .ok()
            .map(|index| BranchOrigin {
                index,
                text: self.ifs_branch_text.clone(),
            });

        NavigationTarget {
            source_action: self.source_action.trim().to_string(),
            source_table: self.source_table.trim().to_string(),
            action_kind: ActionKind::from_technical_name(&self.action_type),
            prominence: Prominence::parse(&self.action_prominence),
            attach_to_column: self.attach_to_column.trim().to_string(),
            target_view: self.target_view.trim().to_string(),
            row_expr: self.target_row_expr.clone(),
            only_if_condition: self.only_if_condition.clone(),
            constraints,
            branch,
            data_dependence: DataDependence::from_columns(
                &self.view_match_pattern,
                &self.view_match_type,
            ),
            referenced_actions: split_list(&self.referenced_actions),
            original_expression: self.original_expression.clone(),
        }
    }
}

impl EdgeRow {
    pub fn from_edge(edge: &NavigationEdge) -> Self {
        let c = &edge.constraints;
        Self {
            source_view: edge.source_view.clone(),
            source_view_type: edge.source_view_type.clone(),
            target_view: edge.target_view.clone(),
            source_action: edge.source_action.clone(),
            parent_action: edge.parent_action.clone(),
            action_type: edge.action_type.clone(),
            action_availability_type: edge.availability.as_str().to_string(),
            parent_prominence: edge.parent_prominence.clone(),
            child_prominence: edge.child_prominence.clone(),
            event_type: edge.event_type.clone(),
            is_self_loop: yes_no(edge.is_self_loop()),
            must_be_in_views: c.view.must_be_list(),
            must_not_be_in_views: c.view.must_not_be_list(),
            must_be_viewtype: c.view_type.must_be_list(),
            must_not_be_viewtype: c.view_type.must_not_be_list(),
            must_be_table: c.table.must_be_list(),
            must_not_be_table: c.table.must_not_be_list(),
            available_actions: join_list(&edge.available_actions),
            original_expression: edge.original_expression.clone(),
            source_view_normalized: normalize_value(&edge.source_view),
            target_view_normalized: normalize_value(&edge.target_view),
            source_action_normalized: normalize_value(&edge.source_action),
            must_be_in_views_normalized: normalize_value(&c.view.must_be_list()),
            must_not_be_in_views_normalized: normalize_value(&c.view.must_not_be_list()),
            must_be_table_normalized: normalize_value(&c.table.must_be_list()),
            must_not_be_table_normalized: normalize_value(&c.table.must_not_be_list()),
        }
    }

    /// Rebuilds the edge. Returns `None` when the availability tag is not
    /// recognized.
    pub fn to_edge(&self) -> Option<NavigationEdge> {
        let availability = Availability::parse(&self.action_availability_type)?;
        let mut edge = NavigationEdge::new(
            self.source_view.trim(),
            self.target_view.trim(),
            availability,
        );
        edge.source_view_type = self.source_view_type.clone();
        edge.source_action = self.source_action.clone();
        edge.parent_action = self.parent_action.clone();
        edge.action_type = self.action_type.clone();
        edge.parent_prominence = self.parent_prominence.clone();
        edge.child_prominence = self.child_prominence.clone();
        edge.event_type = self.event_type.clone();
        edge.constraints = ContextConstraints {
            view: FieldConstraint::from_lists(&self.must_be_in_views, &self.must_not_be_in_views),
            view_type: FieldConstraint::from_lists(
                &self.must_be_viewtype,
                &self.must_not_be_viewtype,
            ),
            table: FieldConstraint::from_lists(&self.must_be_table, &self.must_not_be_table),
        };
        edge.available_actions = split_list(&self.available_actions);
        edge.original_expression = self.original_expression.clone();
        Some(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsheet_nav_core::Polarity;

    #[test]
    fn test_headers_match_field_order() {
        assert_eq!(ActionRow::HEADERS.len(), 21);
        assert_eq!(ActionRow::HEADERS[0], "action_name");
        assert_eq!(ActionRow::HEADERS[20], "is_system_generated");
        assert_eq!(EdgeRow::HEADERS[10], "is_self_loop");
        assert_eq!(TargetRow::HEADERS.last(), Some(&"contradictory_fields"));
    }

    #[test]
    fn test_column_row_reads_type_header() {
        assert!(ColumnRow::HEADERS.contains(&"type"));
        assert!(!ColumnRow::HEADERS.contains(&"data_type"));

        let csv = "table_name,column_name,is_virtual,type,label,ref_table,referenced_columns\n\
                   Order,Customer Name,Yes,Text,Yes,,Order[Customer]|||Customer[Name]\n";
        let mut reader = csv::Reader::from_reader(csv.as_bytes());
        let row: ColumnRow = reader.deserialize().next().unwrap().unwrap();
        let column = row.to_column();
        assert_eq!(column.data_type, "Text");
        assert!(column.is_virtual);
        assert!(column.is_label);
        assert_eq!(column.identifier(), "Order[Customer Name]");
        assert_eq!(column.referenced_columns, vec!["Order[Customer]", "Customer[Name]"]);
    }

    #[test]
    fn test_action_row_conversion() {
        let row = ActionRow {
            action_name: " Open Order ".into(),
            source_table: "Order".into(),
            action_type_technical_name: "go_to_view".into(),
            referenced_actions: "A|||B".into(),
            action_prominence: "Display_Inline".into(),
            attach_to_column: "Id".into(),
            is_system_generated: "No".into(),
            ..ActionRow::default()
        };
        let action = row.to_action();
        assert_eq!(action.name, "Open Order");
        assert_eq!(action.kind, ActionKind::GoToView);
        assert_eq!(action.referenced_actions, vec!["A", "B"]);
        assert_eq!(action.prominence, Prominence::DisplayInline);
        assert_eq!(action.provenance, Provenance::User);
    }

    #[test]
    fn test_target_row_keeps_contradiction() {
        let mut left = ContextConstraints::none();
        left.add(ContextField::View, Polarity::MustBe, "X");
        let mut right = ContextConstraints::none();
        right.add(ContextField::View, Polarity::MustBe, "Z");
        right.add(ContextField::Table, Polarity::MustNotBe, "Audit");

        let target = NavigationTarget {
            source_action: "Go".into(),
            action_kind: ActionKind::GoToView,
            target_view: "Archive".into(),
            constraints: left.and(&right),
            branch: Some(BranchOrigin {
                index: 2,
                text: "CONTEXT(\"View\")=\"Z\"".into(),
            }),
            ..NavigationTarget::default()
        };

        let row = TargetRow::from_target(&target);
        assert_eq!(row.must_be_in_views, "");
        assert_eq!(row.contradictory_fields, "view");
        assert_eq!(row.ifs_branch_index, "2");

        let back = row.to_target();
        assert!(back.constraints.is_contradictory());
        assert_eq!(back, target);
    }

    #[test]
    fn test_edge_row_flags_self_loop() {
        let mut edge = NavigationEdge::new("Orders", "Orders", Availability::Direct);
        edge.source_action = "Refresh".into();
        let row = EdgeRow::from_edge(&edge);
        assert_eq!(row.is_self_loop, "Yes");
        assert_eq!(row.action_availability_type, "direct");
        assert_eq!(row.source_action_normalized, "refresh");
        assert_eq!(row.to_edge(), Some(edge));
    }

    #[test]
    fn test_edge_row_with_unknown_availability() {
        let row = EdgeRow {
            source_view: "A".into(),
            target_view: "B".into(),
            action_availability_type: "teleport".into(),
            ..EdgeRow::default()
        };
        assert!(row.to_edge().is_none());
    }
}
