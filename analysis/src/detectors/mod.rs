//! Orphan detectors that run after reachability.
//!
//! Every detector skips views listed in the exclusion set, so unreachable
//! system views never make something look used.

mod actions;
mod columns;
mod format_rules;

use appsheet_nav_core::{Column, Slice, View};

pub use actions::{ActionOrphan, OrphanType, detect_action_orphans, unreachable_in_groups};
pub use columns::{
    ColumnReferenceSources, VirtualColumnOrphan, VirtualColumnReport,
    detect_virtual_column_orphans, is_system_reverse_reference,
};
pub use format_rules::{
    FormatRuleOrphan, OrphanReason, detect_format_rule_orphans, is_always_false_rule_condition,
};

use crate::exclusions::ExclusionSet;
use crate::index::{ColumnIndex, TableResolver};

/// The view model as the detectors see it.
pub struct ViewScope<'a> {
    views: &'a [View],
    excluded: &'a ExclusionSet,
    columns: ColumnIndex,
    tables: TableResolver,
}

impl<'a> ViewScope<'a> {
    pub fn new(
        views: &'a [View],
        excluded: &'a ExclusionSet,
        columns: &[Column],
        slices: &[Slice],
    ) -> Self {
        Self {
            views,
            excluded,
            columns: ColumnIndex::from_columns(columns),
            tables: TableResolver::from_slices(slices),
        }
    }

    pub fn all(&self) -> &'a [View] {
        self.views
    }

    /// Views that are not excluded.
    pub fn included(&self) -> impl Iterator<Item = &'a View> + '_ {
        self.views
            .iter()
            .filter(|view| !self.excluded.contains(&view.name))
    }

    /// Column data, or `None` when none was loaded.
    pub fn columns(&self) -> Option<&ColumnIndex> {
        if self.columns.is_empty() {
            None
        } else {
            Some(&self.columns)
        }
    }

    pub fn tables(&self) -> &TableResolver {
        &self.tables
    }
}
