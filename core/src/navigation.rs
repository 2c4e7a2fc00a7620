//! Navigation targets and edges.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constraints::ContextConstraints;
use crate::model::{ActionKind, Prominence};

/// Target recorded for navigation driven by a column value.
pub const DYNAMIC_COLUMN_VALUE: &str = "DYNAMIC_COLUMN_VALUE";

/// Target recorded for navigation back to the previous view.
pub const PARENT_VIEW: &str = "**PARENT_VIEW**";

/// Action type recorded for automatic row navigation edges.
pub const AUTO_NAVIGATION_TYPE: &str = "auto_navigation";

/// Returns `true` if `target` names a concrete view rather than a
/// placeholder.
///
/// # Examples
///
/// ```
/// use appsheet_nav_core::{is_concrete_target, DYNAMIC_COLUMN_VALUE};
///
/// assert!(is_concrete_target("Order Detail"));
/// assert!(!is_concrete_target(DYNAMIC_COLUMN_VALUE));
/// assert!(!is_concrete_target(" "));
/// ```
pub fn is_concrete_target(target: &str) -> bool {
    let target = target.trim();
    !target.is_empty() && target != DYNAMIC_COLUMN_VALUE && target != PARENT_VIEW
}

/// The conditional branch a target was extracted from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchOrigin {
    /// 1-based branch index.
    pub index: usize,
    /// Source text of the branch (condition and expression).
    pub text: String,
}

/// A target extracted from a conditional whose condition depends on row
/// data rather than on the navigation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDependence {
    pub condition: String,
    /// `true` for the branch taken when the condition holds.
    pub branch: bool,
}

impl DataDependence {
    pub fn match_type(&self) -> &'static str {
        if self.branch {
            "data_dependent_true"
        } else {
            "data_dependent_false"
        }
    }

    pub fn pattern(&self) -> String {
        format!("data_dependent:{}", self.condition)
    }

    /// Reconstructs the tag from its serialized pattern and match type.
    pub fn from_columns(pattern: &str, match_type: &str) -> Option<Self> {
        let condition = pattern.strip_prefix("data_dependent:")?;
        let branch = match match_type {
            "data_dependent_true" => true,
            "data_dependent_false" => false,
            _ => return None,
        };
        Some(Self {
            condition: condition.to_string(),
            branch,
        })
    }
}

/// One destination parsed from an action's navigation formula.
///
/// Group actions produce a single record with an empty `target_view` that
/// carries the group's own constraints and child list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationTarget {
    pub source_action: String,
    pub source_table: String,
    pub action_kind: ActionKind,
    pub prominence: Prominence,
    pub attach_to_column: String,
    pub target_view: String,
    pub row_expr: String,
    pub only_if_condition: String,
    pub constraints: ContextConstraints,
    pub branch: Option<BranchOrigin>,
    pub data_dependence: Option<DataDependence>,
    pub referenced_actions: Vec<String>,
    pub original_expression: String,
}

impl NavigationTarget {
    pub fn is_group(&self) -> bool {
        self.action_kind.is_group()
    }

    pub fn has_concrete_target(&self) -> bool {
        is_concrete_target(&self.target_view)
    }
}

/// How an edge's action becomes available in the source view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// The action is shown in the view itself.
    Direct,
    /// The action is a child of a group shown in the view.
    ViaGroup,
    /// The action is wired to a view event.
    Event,
    /// Automatic row navigation to a detail view.
    Auto,
    /// Dashboard containment.
    Dashboard,
}

impl Availability {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::ViaGroup => "via_group",
            Self::Event => "event",
            Self::Auto => "auto",
            Self::Dashboard => "dashboard",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "direct" => Some(Self::Direct),
            "via_group" => Some(Self::ViaGroup),
            "event" => Some(Self::Event),
            "auto" => Some(Self::Auto),
            "dashboard" => Some(Self::Dashboard),
            _ => None,
        }
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A conditioned possibility of moving from one view to another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEdge {
    pub source_view: String,
    pub source_view_type: String,
    pub target_view: String,
    /// The action that performs the navigation (empty for dashboards).
    pub source_action: String,
    /// Top-level group the action was reached through, if any.
    pub parent_action: String,
    pub action_type: String,
    pub availability: Availability,
    pub parent_prominence: String,
    pub child_prominence: String,
    pub event_type: String,
    pub constraints: ContextConstraints,
    pub available_actions: Vec<String>,
    pub original_expression: String,
}

impl NavigationEdge {
    /// Creates an unconditioned edge; fill the remaining fields directly.
    pub fn new(
        source_view: impl Into<String>,
        target_view: impl Into<String>,
        availability: Availability,
    ) -> Self {
        Self {
            source_view: source_view.into(),
            source_view_type: String::new(),
            target_view: target_view.into(),
            source_action: String::new(),
            parent_action: String::new(),
            action_type: String::new(),
            availability,
            parent_prominence: String::new(),
            child_prominence: String::new(),
            event_type: String::new(),
            constraints: ContextConstraints::none(),
            available_actions: Vec::new(),
            original_expression: String::new(),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_view == self.target_view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dependence_columns_round_trip() {
        let tag = DataDependence {
            condition: "[Paid]".into(),
            branch: false,
        };
        let back = DataDependence::from_columns(&tag.pattern(), tag.match_type());
        assert_eq!(back, Some(tag));
        assert_eq!(DataDependence::from_columns("", ""), None);
    }

    #[test]
    fn test_availability_parse() {
        for availability in [
            Availability::Direct,
            Availability::ViaGroup,
            Availability::Event,
            Availability::Auto,
            Availability::Dashboard,
        ] {
            assert_eq!(Availability::parse(availability.as_str()), Some(availability));
        }
        assert_eq!(Availability::parse("swipe"), None);
    }

    #[test]
    fn test_self_loop() {
        let edge = NavigationEdge::new("Orders", "Orders", Availability::Direct);
        assert!(edge.is_self_loop());
        assert!(!NavigationEdge::new("Orders", "Order Detail", Availability::Direct).is_self_loop());
    }
}
