//! Navigation reachability analysis for AppSheet apps.
//!
//! The analysis runs as a sequence of stages over an exported app model:
//!
//! 1. [`TargetParser`] turns each action's navigation formula into targets,
//!    each carrying the view context conditions under which it applies.
//! 2. [`EdgeGenerator`] expands targets into view-to-view
//!    [`NavigationEdge`](appsheet_nav_core::NavigationEdge)s, keeping only
//!    actions a user can actually see and trigger from each view.
//! 3. [`analyze_reachability`] traverses the edges from the root views and
//!    classifies every unreached view as an orphan or an unused system view.
//! 4. [`PhantomScan`] lists references to views that do not exist.
//! 5. The [orphan detectors](detect_action_orphans) flag actions and format
//!    rules with no visible effect, and virtual columns nothing references.
//!
//! [`Pipeline`] runs the stages against an artifact directory.
//!
//! # Example
//!
//! ```
//! use appsheet_nav_analysis::{EdgeGenerator, TargetParser, analyze_reachability};
//! use appsheet_nav_core::{Action, ActionKind, Prominence, View, ViewCategory, ViewType};
//! use appsheet_nav_store::RootConfig;
//!
//! let views = vec![
//!     View::new("Home", ViewType::Detail)
//!         .with_category(ViewCategory::Primary, "first")
//!         .with_source("Order")
//!         .with_actions(["Open Archive"]),
//!     View::new("Archive", ViewType::Table).with_source("Order"),
//!     View::new("Old Reports", ViewType::Table).with_source("Report"),
//! ];
//! let actions = vec![
//!     Action::new("Open Archive", "Order", ActionKind::GoToView)
//!         .with_target(r#"LINKTOVIEW("Archive")"#)
//!         .with_prominence(Prominence::DisplayProminently),
//! ];
//!
//! let parsed = TargetParser::with_views(&views).parse_actions(&actions);
//! let edges = EdgeGenerator::new(&parsed.targets, &views)
//!     .with_actions(&actions)
//!     .generate()
//!     .edges;
//! let report = analyze_reachability(&views, &edges, &RootConfig::default());
//!
//! assert!(report.reachable.contains("Archive"));
//! assert_eq!(report.orphans.len(), 1);
//! assert_eq!(report.orphans[0].name, "Old Reports");
//! ```

mod detectors;
mod edges;
mod error;
mod exclusions;
mod index;
mod parser;
mod phantom;
mod pipeline;
mod reachability;
mod report;

pub use detectors::{
    ActionOrphan, ColumnReferenceSources, FormatRuleOrphan, OrphanReason, OrphanType,
    ViewScope, VirtualColumnOrphan, VirtualColumnReport, detect_action_orphans,
    detect_format_rule_orphans, detect_virtual_column_orphans, is_always_false_rule_condition,
    is_system_reverse_reference, unreachable_in_groups,
};
pub use edges::{EdgeGenerator, EdgeRun, EdgeStats, Placement, is_visible};
pub use error::{PipelineError, Result};
pub use exclusions::{ExclusionSet, load_bot_actions};
pub use index::{ColumnIndex, TableResolver};
pub use parser::strategies;
pub use parser::{
    ActionCounts, ContextCounts, FailureReason, ParseOutcome, ParseRun, ParseStats, TargetCounts,
    TargetParser, UnparseableAction,
};
pub use phantom::{
    ComponentKind, PHANTOM_HEADERS, PhantomReference, PhantomScan, ViewReference,
    extract_view_references,
};
pub use pipeline::{Pipeline, ReachPath};
pub use reachability::{
    ALWAYS_FALSE_REASON, NavigationGraph, ReachStep, ReachabilityReport, ReachabilitySet,
    UnreachableView, analyze_reachability, is_always_false, root_views,
};
pub use report::{Metric, PipelineReport, Stage, StageOutcome, StageReport};
