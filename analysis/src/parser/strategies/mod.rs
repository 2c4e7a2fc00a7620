//! Formula shapes the target parser recognizes.

pub mod conditional;
pub mod direct;
pub mod links;

use appsheet_nav_core::{BranchOrigin, ContextConstraints, DataDependence};

use super::{ParseStats, TargetParser};

/// One destination extracted from a formula, before the action's own
/// fields are attached.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Destination {
    pub target_view: String,
    pub row_expr: String,
    pub constraints: ContextConstraints,
    pub branch: Option<BranchOrigin>,
    pub data_dependence: Option<DataDependence>,
}

impl Destination {
    pub fn to_view(view: impl Into<String>) -> Self {
        Self {
            target_view: view.into(),
            ..Self::default()
        }
    }

    /// ANDs extra constraints onto the destination's own.
    pub fn constrain(mut self, constraints: &ContextConstraints) -> Self {
        self.constraints = constraints.and(&self.constraints);
        self
    }
}

/// A recognizer for one formula shape.
///
/// Strategies are tried in the order returned by [`default_strategies`];
/// the first whose [`matches`](ExpressionStrategy::matches) accepts the
/// formula decides the result, even when it extracts nothing.
pub trait ExpressionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, expression: &str) -> bool;
    fn extract(
        &self,
        parser: &TargetParser,
        expression: &str,
        stats: &mut ParseStats,
    ) -> Vec<Destination>;
}

/// Strategies in priority order. Conditionals come before the link
/// functions because they wrap them.
pub fn default_strategies() -> Vec<Box<dyn ExpressionStrategy>> {
    vec![
        Box::new(direct::DirectStrategy),
        Box::new(conditional::IfsStrategy),
        Box::new(conditional::IfStrategy),
        Box::new(links::LinkToViewStrategy),
        Box::new(links::LinkToRowStrategy),
    ]
}
