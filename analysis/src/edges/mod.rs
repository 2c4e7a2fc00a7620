//! Navigation edge generation.
//!
//! For every view, enumerates the ways a user can leave it:
//!
//! 1. actions shown in the view (direct, or through a group's children);
//! 2. actions wired to the view's events;
//! 3. automatic row navigation from collection views to a detail view;
//! 4. dashboard containment.
//!
//! Every action edge is checked against the source view's context before it
//! is emitted. Group expansion keeps the chain of groups being expanded, so
//! cyclic groups terminate.

mod visibility;

use std::collections::HashMap;

use appsheet_nav_core::{
    AUTO_MARKER, AUTO_NAVIGATION_TYPE, Action, Availability, Column, ContextConstraints,
    NavigationEdge, NavigationTarget, Prominence, Slice, View, ViewContext, ViewNameRegistry,
    ViewType, normalize_value,
};
use serde::Serialize;
use tracing::debug;

use crate::index::{ColumnIndex, TableResolver};
pub use visibility::{Placement, is_visible};
pub(crate) use visibility::{inline_column_shown, lists_action};

const ROW_SELECTED: &str = "row selected";
const FORM_SAVED: &str = "form saved";

/// Counters for one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EdgeStats {
    pub views_processed: usize,
    pub actions_checked: usize,
    pub groups_expanded: usize,
    pub edges_created: usize,
    pub blocked_by_conditions: usize,
    pub blocked_by_visibility: usize,
}

/// Edges and statistics from [`EdgeGenerator::generate`].
#[derive(Debug, Clone, Default)]
pub struct EdgeRun {
    pub edges: Vec<NavigationEdge>,
    pub stats: EdgeStats,
}

/// Builds navigation edges from parsed targets and the view model.
///
/// Columns, slices and actions are optional. Without columns, inline
/// attachments are only checked against the view's displayed columns;
/// without actions, prominence comes from the targets alone.
///
/// # Examples
///
/// ```
/// use appsheet_nav_analysis::EdgeGenerator;
/// use appsheet_nav_core::*;
///
/// let views = vec![
///     View::new("Orders", ViewType::Detail).with_actions(["Open Customer"]),
///     View::new("Customer Detail", ViewType::Detail),
/// ];
/// let targets = vec![NavigationTarget {
///     source_action: "Open Customer".into(),
///     action_kind: ActionKind::GoToView,
///     prominence: Prominence::DisplayProminently,
///     target_view: "customer detail".into(),
///     ..NavigationTarget::default()
/// }];
///
/// let run = EdgeGenerator::new(&targets, &views).generate();
/// assert_eq!(run.edges.len(), 1);
/// assert_eq!(run.edges[0].target_view, "Customer Detail");
/// assert_eq!(run.edges[0].availability, Availability::Direct);
/// ```
pub struct EdgeGenerator<'a> {
    targets: &'a [NavigationTarget],
    views: &'a [View],
    columns: Option<&'a [Column]>,
    slices: &'a [Slice],
    actions: &'a [Action],
}

impl<'a> EdgeGenerator<'a> {
    pub fn new(targets: &'a [NavigationTarget], views: &'a [View]) -> Self {
        Self {
            targets,
            views,
            columns: None,
            slices: &[],
            actions: &[],
        }
    }

    pub fn with_columns(mut self, columns: &'a [Column]) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_slices(mut self, slices: &'a [Slice]) -> Self {
        self.slices = slices;
        self
    }

    pub fn with_actions(mut self, actions: &'a [Action]) -> Self {
        self.actions = actions;
        self
    }

    pub fn generate(&self) -> EdgeRun {
        let mut pass = Pass::new(self);
        for view in self.views {
            pass.process_view(view);
        }
        debug!(
            views = pass.stats.views_processed,
            edges = pass.stats.edges_created,
            blocked_by_conditions = pass.stats.blocked_by_conditions,
            blocked_by_visibility = pass.stats.blocked_by_visibility,
            "generated navigation edges"
        );
        EdgeRun {
            edges: pass.edges,
            stats: pass.stats,
        }
    }
}

/// How the actions of one view are being reached.
#[derive(Clone, Copy)]
struct Trigger<'e> {
    availability: Availability,
    event_type: &'e str,
}

/// State of one generation run.
struct Pass<'a> {
    views: &'a [View],
    targets_by_action: HashMap<String, Vec<&'a NavigationTarget>>,
    actions_by_name: HashMap<String, Vec<&'a Action>>,
    columns: Option<ColumnIndex>,
    tables: TableResolver,
    registry: ViewNameRegistry,
    edges: Vec<NavigationEdge>,
    stats: EdgeStats,
}

impl<'a> Pass<'a> {
    fn new(generator: &EdgeGenerator<'a>) -> Self {
        let mut targets_by_action: HashMap<String, Vec<&NavigationTarget>> = HashMap::new();
        for target in generator.targets {
            targets_by_action
                .entry(normalize_value(&target.source_action))
                .or_default()
                .push(target);
        }
        let mut actions_by_name: HashMap<String, Vec<&Action>> = HashMap::new();
        for action in generator.actions {
            actions_by_name
                .entry(normalize_value(&action.name))
                .or_default()
                .push(action);
        }
        Self {
            views: generator.views,
            targets_by_action,
            actions_by_name,
            columns: generator.columns.map(ColumnIndex::from_columns),
            tables: TableResolver::from_slices(generator.slices),
            registry: ViewNameRegistry::from_names(generator.views.iter().map(|view| &view.name)),
            edges: Vec::new(),
            stats: EdgeStats::default(),
        }
    }

    /// Records for an action name. When the name exists in several tables,
    /// the records of `table` win.
    fn targets_for(&self, name: &str, table: &str) -> Vec<&'a NavigationTarget> {
        let Some(records) = self.targets_by_action.get(&normalize_value(name)) else {
            return Vec::new();
        };
        let table = normalize_value(table);
        let same_table: Vec<&NavigationTarget> = records
            .iter()
            .copied()
            .filter(|record| normalize_value(&record.source_table) == table)
            .collect();
        if table.is_empty() || same_table.is_empty() {
            records.clone()
        } else {
            same_table
        }
    }

    /// The action record behind a target, for prominence and attachment
    /// when the target lacks them.
    fn action_for(&self, target: &NavigationTarget) -> Option<&'a Action> {
        let records = self.actions_by_name.get(&normalize_value(&target.source_action))?;
        let table = normalize_value(&target.source_table);
        records
            .iter()
            .copied()
            .find(|action| normalize_value(&action.table) == table)
            .or_else(|| records.first().copied())
    }

    fn prominence_of(&self, target: &NavigationTarget) -> (Prominence, String) {
        if target.prominence != Prominence::Unspecified {
            return (target.prominence.clone(), target.attach_to_column.clone());
        }
        match self.action_for(target) {
            Some(action) => {
                let attach = if action.prominence == Prominence::DisplayInline {
                    action.attach_to_column.trim().to_string()
                } else {
                    String::new()
                };
                (action.prominence.clone(), attach)
            }
            None => (Prominence::Unspecified, target.attach_to_column.clone()),
        }
    }

    fn process_view(&mut self, view: &'a View) {
        self.stats.views_processed += 1;
        let table = self.tables.view_table(view).to_string();
        let context = ViewContext {
            view: &view.name,
            view_type: view.view_type.as_str(),
            table: &table,
        };

        self.process_available_actions(view, &context);
        self.process_event_actions(view, &context);
        self.process_auto_navigation(view);
        self.process_dashboard(view);
    }

    fn process_available_actions(&mut self, view: &'a View, context: &ViewContext<'_>) {
        let direct = Trigger {
            availability: Availability::Direct,
            event_type: "",
        };
        for name in &view.available_actions {
            self.stats.actions_checked += 1;
            let records = self.targets_for(name, context.table);
            let Some(first) = records.first() else {
                continue;
            };
            let (prominence, attach) = self.prominence_of(first);
            let placement = Placement {
                action: name,
                prominence: &prominence,
                attach_to_column: &attach,
            };
            if !is_visible(placement, view, context.table, self.columns.as_ref()) {
                self.stats.blocked_by_visibility += 1;
                continue;
            }
            for record in records {
                self.dispatch(view, context, record, direct);
            }
        }
    }

    fn process_event_actions(&mut self, view: &'a View, context: &ViewContext<'_>) {
        if view.event_actions.is_empty() {
            return;
        }
        let event_type = event_type_of(view);
        let trigger = Trigger {
            availability: Availability::Event,
            event_type: &event_type,
        };
        for name in &view.event_actions {
            if name == AUTO_MARKER {
                continue;
            }
            for record in self.targets_for(name, context.table) {
                self.dispatch(view, context, record, trigger);
            }
        }
    }

    fn dispatch(
        &mut self,
        view: &'a View,
        context: &ViewContext<'_>,
        record: &'a NavigationTarget,
        trigger: Trigger<'_>,
    ) {
        if record.is_group() {
            let availability = match trigger.availability {
                Availability::Direct => Availability::ViaGroup,
                other => other,
            };
            let trigger = Trigger {
                availability,
                ..trigger
            };
            let mut chain = Vec::new();
            self.expand_group(view, context, record, record, &record.constraints, trigger, &mut chain);
        } else {
            self.emit(view, context, record, None, &record.constraints, trigger);
        }
    }

    /// Expands a group's children under the constraints accumulated so far.
    /// `top` is the group the view shows or triggers.
    #[allow(clippy::too_many_arguments)]
    fn expand_group(
        &mut self,
        view: &'a View,
        context: &ViewContext<'_>,
        group: &'a NavigationTarget,
        top: &'a NavigationTarget,
        combined: &ContextConstraints,
        trigger: Trigger<'_>,
        chain: &mut Vec<String>,
    ) {
        if group.referenced_actions.is_empty() {
            return;
        }
        let key = normalize_value(&group.source_action);
        if chain.contains(&key) {
            return;
        }
        chain.push(key);
        self.stats.groups_expanded += 1;

        if combined.is_contradictory() || !combined.admits(context) {
            self.stats.blocked_by_conditions += 1;
            chain.pop();
            return;
        }

        for child_name in &group.referenced_actions {
            for child in self.targets_for(child_name, &group.source_table) {
                let child_combined = combined.and(&child.constraints);
                if child.is_group() {
                    self.expand_group(view, context, child, top, &child_combined, trigger, chain);
                } else {
                    self.emit(view, context, child, Some(top), &child_combined, trigger);
                }
            }
        }
        chain.pop();
    }

    fn emit(
        &mut self,
        view: &'a View,
        context: &ViewContext<'_>,
        record: &'a NavigationTarget,
        parent: Option<&'a NavigationTarget>,
        constraints: &ContextConstraints,
        trigger: Trigger<'_>,
    ) {
        if !record.has_concrete_target() {
            return;
        }
        if constraints.is_contradictory() || !constraints.admits(context) {
            self.stats.blocked_by_conditions += 1;
            return;
        }

        let (prominence, _) = self.prominence_of(record);
        let mut edge = NavigationEdge::new(
            view.name.clone(),
            self.registry.canonicalize(&record.target_view),
            trigger.availability,
        );
        edge.source_view_type = view.view_type.as_str().to_string();
        edge.source_action = record.source_action.clone();
        edge.action_type = record.action_kind.technical_name().to_string();
        edge.event_type = trigger.event_type.to_string();
        edge.constraints = constraints.clone();
        edge.available_actions = view.available_actions.clone();
        edge.original_expression = record.original_expression.clone();
        match parent {
            Some(group) => {
                edge.parent_action = group.source_action.clone();
                edge.parent_prominence = self.prominence_of(group).0.as_str().to_string();
                edge.child_prominence = prominence.as_str().to_string();
            }
            None => edge.parent_prominence = prominence.as_str().to_string(),
        }
        self.push(edge);
    }

    fn process_auto_navigation(&mut self, view: &'a View) {
        if !view.view_type.is_collection() || !view.has_auto_marker() {
            return;
        }
        let explicit_row_selected = view
            .configured_events()
            .iter()
            .any(|event| event.event_type == ROW_SELECTED && event.action != AUTO_MARKER);
        if explicit_row_selected {
            return;
        }
        let source = normalize_value(view.data_source_name());
        if source.is_empty() {
            return;
        }

        let mut candidates: Vec<&View> = self
            .views
            .iter()
            .filter(|other| other.view_type == ViewType::Detail)
            .filter(|other| {
                normalize_value(&other.data_source) == source
                    || normalize_value(&other.source_table) == source
            })
            .collect();
        if candidates.iter().any(|other| !other.is_system) {
            candidates.retain(|other| !other.is_system);
        }
        candidates.sort_by(|left, right| left.name.cmp(&right.name));
        let Some(detail) = candidates.first() else {
            return;
        };

        let mut edge = NavigationEdge::new(view.name.clone(), detail.name.clone(), Availability::Auto);
        edge.source_view_type = view.view_type.as_str().to_string();
        edge.source_action = AUTO_MARKER.to_string();
        edge.action_type = AUTO_NAVIGATION_TYPE.to_string();
        edge.event_type = ROW_SELECTED.to_string();
        edge.available_actions = view.available_actions.clone();
        self.push(edge);
    }

    fn process_dashboard(&mut self, view: &'a View) {
        if view.view_type != ViewType::Dashboard {
            return;
        }
        for entry in &view.dashboard_entries {
            if entry.trim().is_empty() {
                continue;
            }
            let mut edge = NavigationEdge::new(
                view.name.clone(),
                self.registry.canonicalize(entry),
                Availability::Dashboard,
            );
            edge.source_view_type = ViewType::Dashboard.as_str().to_string();
            self.push(edge);
        }
    }

    fn push(&mut self, edge: NavigationEdge) {
        self.stats.edges_created += 1;
        self.edges.push(edge);
    }
}

/// The event type of a view's event actions: the first configured event,
/// else `form saved` for forms and `row selected` for everything else.
fn event_type_of(view: &View) -> String {
    if let Some(event) = view.configured_events().first() {
        if !event.event_type.is_empty() {
            return event.event_type.clone();
        }
    }
    if view.view_type == ViewType::Form {
        FORM_SAVED.to_string()
    } else {
        ROW_SELECTED.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appsheet_nav_core::{ActionKind, ContextField, Polarity, ViewCategory};

    fn nav(action: &str, target: &str, prominence: Prominence) -> NavigationTarget {
        NavigationTarget {
            source_action: action.into(),
            action_kind: ActionKind::GoToView,
            prominence,
            target_view: target.into(),
            ..NavigationTarget::default()
        }
    }

    fn group(action: &str, children: &[&str]) -> NavigationTarget {
        NavigationTarget {
            source_action: action.into(),
            action_kind: ActionKind::ExecuteGroup,
            prominence: Prominence::DisplayProminently,
            referenced_actions: children.iter().map(|c| c.to_string()).collect(),
            ..NavigationTarget::default()
        }
    }

    #[test]
    fn test_table_view_prominent_action_yields_no_edge() {
        let views = vec![
            View::new("Orders", ViewType::Table).with_actions(["Open"]),
            View::new("Order Detail", ViewType::Detail),
        ];
        let targets = vec![nav("Open", "Order Detail", Prominence::DisplayProminently)];
        let run = EdgeGenerator::new(&targets, &views).generate();

        assert!(run.edges.is_empty());
        assert_eq!(run.stats.blocked_by_visibility, 1);
        assert_eq!(run.stats.actions_checked, 1);
    }

    #[test]
    fn test_auto_navigation_prefers_user_detail_view() {
        let mut deck = View::new("Orders", ViewType::Deck).with_source("Order");
        deck.configuration =
            r#"{"Events":[{"EventType":"Row Selected","EventAction":"**auto**"}]}"#.into();
        let views = vec![
            deck,
            View::new("OrderDetail_sys", ViewType::Detail)
                .with_source("Order")
                .system(),
            View::new("OrderDetail", ViewType::Detail).with_source("Order"),
        ];
        let run = EdgeGenerator::new(&[], &views).generate();

        assert_eq!(run.edges.len(), 1);
        let edge = &run.edges[0];
        assert_eq!(edge.target_view, "OrderDetail");
        assert_eq!(edge.availability, Availability::Auto);
        assert_eq!(edge.source_action, AUTO_MARKER);
        assert_eq!(edge.action_type, AUTO_NAVIGATION_TYPE);
        assert!(edge.constraints.is_unconstrained());
    }

    #[test]
    fn test_explicit_row_selected_event_suppresses_auto() {
        let mut deck = View::new("Orders", ViewType::Deck).with_source("Order");
        deck.configuration = r#"{"Events":[{"EventType":"Row Selected","EventAction":"Open Map"}],"Auto":"**auto**"}"#.into();
        let views = vec![deck, View::new("OrderDetail", ViewType::Detail).with_source("Order")];
        let run = EdgeGenerator::new(&[], &views).generate();
        assert!(run.edges.is_empty());
    }

    #[test]
    fn test_self_referencing_group_terminates() {
        let views = vec![View::new("Menu", ViewType::Detail).with_actions(["DoStuff"])];
        let targets = vec![group("DoStuff", &["DoStuff"])];
        let run = EdgeGenerator::new(&targets, &views).generate();

        assert!(run.edges.is_empty());
        assert_eq!(run.stats.groups_expanded, 1);
    }

    #[test]
    fn test_mutual_group_cycle_terminates_and_reaches_children() {
        let views = vec![
            View::new("Menu", ViewType::Detail).with_actions(["A"]),
            View::new("Target", ViewType::Detail),
        ];
        let targets = vec![
            group("A", &["B"]),
            group("B", &["A", "Go"]),
            nav("Go", "Target", Prominence::DoNotDisplay),
        ];
        let run = EdgeGenerator::new(&targets, &views).generate();

        assert_eq!(run.edges.len(), 1);
        let edge = &run.edges[0];
        assert_eq!(edge.availability, Availability::ViaGroup);
        assert_eq!(edge.source_action, "Go");
        assert_eq!(edge.parent_action, "A");
        assert_eq!(edge.parent_prominence, "Display_Prominently");
        assert_eq!(edge.child_prominence, "Do_Not_Display");
        assert_eq!(run.stats.groups_expanded, 2);
    }

    #[test]
    fn test_group_and_child_constraints_are_combined() {
        let views = vec![
            View::new("Inbox", ViewType::Detail).with_actions(["Group"]),
            View::new("Archive", ViewType::Detail).with_actions(["Group"]),
            View::new("Target", ViewType::Detail),
        ];
        let mut parent = group("Group", &["Go"]);
        parent
            .constraints
            .add(ContextField::View, Polarity::MustBe, "Inbox");
        parent
            .constraints
            .add(ContextField::View, Polarity::MustBe, "Archive");
        let mut child = nav("Go", "Target", Prominence::DoNotDisplay);
        child
            .constraints
            .add(ContextField::View, Polarity::MustNotBe, "Archive");
        let targets = vec![parent, child];

        let run = EdgeGenerator::new(&targets, &views).generate();
        assert_eq!(run.edges.len(), 1);
        assert_eq!(run.edges[0].source_view, "Inbox");
        assert_eq!(run.edges[0].constraints.view.must_be_list(), "Archive|||Inbox");
        assert_eq!(run.edges[0].constraints.view.must_not_be_list(), "Archive");
        assert_eq!(run.stats.blocked_by_conditions, 1);
    }

    #[test]
    fn test_event_actions_skip_visibility_and_carry_event_type() {
        let mut form = View::new("New Order", ViewType::Form);
        form.event_actions = vec!["After Save".into()];
        let views = vec![form, View::new("Orders", ViewType::Table)];
        let targets = vec![nav("After Save", "orders", Prominence::DoNotDisplay)];

        let run = EdgeGenerator::new(&targets, &views).generate();
        assert_eq!(run.edges.len(), 1);
        assert_eq!(run.edges[0].availability, Availability::Event);
        assert_eq!(run.edges[0].event_type, "form saved");
        assert_eq!(run.edges[0].target_view, "Orders");
    }

    #[test]
    fn test_event_group_children_are_tagged_event() {
        let mut deck = View::new("Orders", ViewType::Deck);
        deck.event_actions = vec!["On Select".into()];
        deck.configuration =
            r#"{"Events":[{"EventType":"Swipe Left","EventAction":"On Select"}]}"#.into();
        let views = vec![deck, View::new("Detail", ViewType::Detail)];
        let targets = vec![
            group("On Select", &["Go"]),
            nav("Go", "Detail", Prominence::DoNotDisplay),
        ];

        let run = EdgeGenerator::new(&targets, &views).generate();
        assert_eq!(run.edges.len(), 1);
        assert_eq!(run.edges[0].availability, Availability::Event);
        assert_eq!(run.edges[0].parent_action, "On Select");
        assert_eq!(run.edges[0].event_type, "swipe left");
    }

    #[test]
    fn test_dashboard_contains_entries() {
        let mut dashboard = View::new("Home", ViewType::Dashboard)
            .with_category(ViewCategory::Primary, "first");
        dashboard.dashboard_entries = vec!["orders".into(), "Map".into()];
        let views = vec![dashboard, View::new("Orders", ViewType::Table)];

        let run = EdgeGenerator::new(&[], &views).generate();
        let targets: Vec<_> = run.edges.iter().map(|edge| edge.target_view.as_str()).collect();
        assert_eq!(targets, vec!["Orders", "Map"]);
        assert!(run.edges.iter().all(|edge| edge.availability == Availability::Dashboard));
        assert_eq!(run.edges[0].source_view_type, "dashboard");
    }

    #[test]
    fn test_prominence_falls_back_to_action_record() {
        let views = vec![
            View::new("Orders", ViewType::Table).with_actions(["Open"]),
            View::new("Detail", ViewType::Detail),
        ];
        let targets = vec![nav("Open", "Detail", Prominence::Unspecified)];
        let actions = vec![
            Action::new("Open", "", ActionKind::GoToView).with_prominence(Prominence::Primary),
        ];

        let run = EdgeGenerator::new(&targets, &views)
            .with_actions(&actions)
            .generate();
        assert_eq!(run.edges.len(), 1);
        assert_eq!(run.edges[0].parent_prominence, "Primary");
    }

    #[test]
    fn test_placeholder_targets_are_skipped() {
        let views = vec![View::new("Orders", ViewType::Detail).with_actions(["Dyn"])];
        let targets = vec![nav(
            "Dyn",
            appsheet_nav_core::DYNAMIC_COLUMN_VALUE,
            Prominence::Primary,
        )];
        let run = EdgeGenerator::new(&targets, &views).generate();
        assert!(run.edges.is_empty());
        assert_eq!(run.stats.blocked_by_conditions, 0);
    }
}
