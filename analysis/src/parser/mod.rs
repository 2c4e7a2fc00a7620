//! Navigation formula parser.
//!
//! Turns each action's `navigate_target` formula into zero or more
//! [`NavigationTarget`] records. Formulas are matched against an ordered list
//! of [strategies](strategies::ExpressionStrategy); conditionals recurse into
//! their branches through [`TargetParser::destinations`]. Constraints from
//! the action's `only_if_condition` are ANDed with every branch constraint.
//!
//! Formulas that yield nothing are classified with a [`FailureReason`] and
//! returned as data. Parsing never fails.

mod context;
mod failure;
mod split;
pub mod strategies;

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use appsheet_nav_core::{
    Action, ActionKind, ContextField, NavigationTarget, Prominence, View, ViewType,
    normalize_value,
};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

pub use failure::FailureReason;
use strategies::{Destination, ExpressionStrategy, default_strategies};

/// Plain-English action types that modify data.
const DATA_MODIFICATION_TYPES: [&str; 5] = ["Write", "Delete", "Add row", "Edit", "Add new row"];

/// Actions seen, by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionCounts {
    pub total: usize,
    pub navigation: usize,
    pub group: usize,
    pub external_url: usize,
    pub data_modifications: usize,
    pub other: usize,
}

impl ActionCounts {
    fn record(&mut self, action: &Action) {
        self.total += 1;
        match &action.kind {
            ActionKind::GoToView | ActionKind::Navigate => self.navigation += 1,
            ActionKind::ExecuteGroup => self.group += 1,
            ActionKind::OpenUrl => self.external_url += 1,
            ActionKind::Other(_)
                if DATA_MODIFICATION_TYPES.contains(&action.plain_english_type.trim()) =>
            {
                self.data_modifications += 1
            }
            ActionKind::Other(_) => self.other += 1,
        }
    }
}

/// Formulas handled per recognized link shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetCounts {
    pub direct: usize,
    pub linktoview: usize,
    pub linktorow: usize,
    pub total: usize,
}

impl TargetCounts {
    pub(crate) fn record_direct(&mut self) {
        self.direct += 1;
        self.total += 1;
    }

    pub(crate) fn record_linktoview(&mut self) {
        self.linktoview += 1;
        self.total += 1;
    }

    pub(crate) fn record_linktorow(&mut self) {
        self.linktorow += 1;
        self.total += 1;
    }
}

/// `CONTEXT(...)` comparisons seen, per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextCounts {
    pub view: usize,
    pub view_type: usize,
    pub table: usize,
    pub total: usize,
}

impl ContextCounts {
    pub(crate) fn record(&mut self, field: ContextField, count: usize) {
        match field {
            ContextField::View => self.view += count,
            ContextField::ViewType => self.view_type += count,
            ContextField::Table => self.table += count,
        }
        self.total += count;
    }
}

/// Statistics accumulated over one parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseStats {
    pub actions: ActionCounts,
    pub targets: TargetCounts,
    pub contexts: ContextCounts,
    pub unparseable: BTreeMap<FailureReason, usize>,
}

impl ParseStats {
    pub fn unparseable_total(&self) -> usize {
        self.unparseable.values().sum()
    }
}

/// Result of parsing one action.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// Zero or more targets. Non-navigation actions, empty formulas and
    /// plain column references parse to nothing.
    Parsed(Vec<NavigationTarget>),
    /// The formula is present but no strategy extracted a target.
    Unparseable(FailureReason),
}

/// An action whose formula could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparseableAction {
    /// Position of the action in the parsed slice.
    pub index: usize,
    pub action_name: String,
    pub reason: FailureReason,
    pub expression: String,
}

/// Everything produced by [`TargetParser::parse_actions`].
#[derive(Debug, Clone, Default)]
pub struct ParseRun {
    pub targets: Vec<NavigationTarget>,
    pub unparseable: Vec<UnparseableAction>,
    pub stats: ParseStats,
}

/// A formula that is only a column reference, like `[Target View]`.
pub(crate) static COLUMN_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^=?\[[\w\s]+\]$").expect("static regex must compile"));

/// Parser for action navigation formulas.
///
/// # Examples
///
/// ```
/// use appsheet_nav_analysis::{ParseOutcome, ParseStats, TargetParser};
/// use appsheet_nav_core::{Action, ActionKind};
///
/// let parser = TargetParser::new();
/// let mut stats = ParseStats::default();
/// let action = Action::new("Open Customer", "Order", ActionKind::GoToView)
///     .with_target(r#"=LINKTOVIEW("Customer Detail")"#);
///
/// let ParseOutcome::Parsed(targets) = parser.parse_action(&action, &mut stats) else {
///     panic!("expected targets");
/// };
/// assert_eq!(targets[0].target_view, "Customer Detail");
/// assert!(targets[0].constraints.is_unconstrained());
/// ```
pub struct TargetParser {
    /// Normalized table name to its system-generated detail view.
    detail_views: HashMap<String, String>,
    strategies: Vec<Box<dyn ExpressionStrategy>>,
}

impl Default for TargetParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TargetParser {
    pub fn new() -> Self {
        Self {
            detail_views: HashMap::new(),
            strategies: default_strategies(),
        }
    }

    /// Creates a parser that resolves `#page=detail&table=` links through
    /// the system-generated detail views among `views`.
    pub fn with_views(views: &[View]) -> Self {
        let mut parser = Self::new();
        for view in views {
            if view.view_type != ViewType::Detail || !view.is_system {
                continue;
            }
            let table = normalize_value(&view.source_table);
            if table.is_empty() || view.name.trim().is_empty() {
                continue;
            }
            parser
                .detail_views
                .entry(table)
                .or_insert_with(|| view.name.clone());
        }
        parser
    }

    /// The detail view for a table, falling back to `{table}_Detail`.
    pub fn detail_view_for(&self, table: &str) -> String {
        self.detail_views
            .get(&normalize_value(table))
            .cloned()
            .unwrap_or_else(|| format!("{}_Detail", table.trim()))
    }

    /// Destinations named by a formula or branch, without action-level
    /// constraints.
    pub fn destinations(&self, expression: &str, stats: &mut ParseStats) -> Vec<Destination> {
        let expression = expression.trim();
        if expression.is_empty() || COLUMN_REFERENCE_RE.is_match(expression) {
            return Vec::new();
        }
        match self
            .strategies
            .iter()
            .find(|strategy| strategy.matches(expression))
        {
            Some(strategy) => {
                debug!(strategy = strategy.name(), "matched navigation formula");
                strategy.extract(self, expression, stats)
            }
            None => Vec::new(),
        }
    }

    /// Parses one action, updating `stats`.
    pub fn parse_action(&self, action: &Action, stats: &mut ParseStats) -> ParseOutcome {
        stats.actions.record(action);
        if !action.kind.is_navigation_candidate() {
            return ParseOutcome::Parsed(Vec::new());
        }

        let only_if = action.only_if.trim();
        context::count_mentions(only_if, &mut stats.contexts);

        if action.kind.is_group() {
            let target = NavigationTarget {
                constraints: context::condition_constraints(only_if),
                referenced_actions: action.referenced_actions.clone(),
                ..self.base_target(action)
            };
            return ParseOutcome::Parsed(vec![target]);
        }

        let expression = action.navigate_target.trim();
        if expression.is_empty() || COLUMN_REFERENCE_RE.is_match(expression) {
            return ParseOutcome::Parsed(Vec::new());
        }

        let found = self.destinations(expression, stats);
        if found.is_empty() {
            let reason = FailureReason::classify(expression);
            *stats.unparseable.entry(reason).or_default() += 1;
            return ParseOutcome::Unparseable(reason);
        }

        let action_constraints = context::guarded_condition_constraints(only_if);
        let targets = found
            .into_iter()
            .map(|destination| NavigationTarget {
                target_view: destination.target_view,
                row_expr: destination.row_expr,
                constraints: action_constraints.and(&destination.constraints),
                branch: destination.branch,
                data_dependence: destination.data_dependence,
                original_expression: expression.to_string(),
                ..self.base_target(action)
            })
            .collect();
        ParseOutcome::Parsed(targets)
    }

    /// Parses every action in order.
    pub fn parse_actions(&self, actions: &[Action]) -> ParseRun {
        let mut run = ParseRun::default();
        for (index, action) in actions.iter().enumerate() {
            match self.parse_action(action, &mut run.stats) {
                ParseOutcome::Parsed(targets) => run.targets.extend(targets),
                ParseOutcome::Unparseable(reason) => run.unparseable.push(UnparseableAction {
                    index,
                    action_name: action.name.clone(),
                    reason,
                    expression: action.navigate_target.trim().to_string(),
                }),
            }
        }
        debug!(
            actions = run.stats.actions.total,
            targets = run.targets.len(),
            unparseable = run.unparseable.len(),
            "parsed navigation formulas"
        );
        run
    }

    fn base_target(&self, action: &Action) -> NavigationTarget {
        let attach_to_column = if action.prominence == Prominence::DisplayInline {
            action.attach_to_column.trim().to_string()
        } else {
            String::new()
        };
        NavigationTarget {
            source_action: action.name.clone(),
            source_table: action.table.clone(),
            action_kind: action.kind.clone(),
            prominence: action.prominence.clone(),
            attach_to_column,
            only_if_condition: action.only_if.trim().to_string(),
            ..NavigationTarget::default()
        }
    }
}
