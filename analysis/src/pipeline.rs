//! Stage drivers: read artifacts, run one analysis, write its outputs.
//!
//! Each stage can run on its own against an artifact directory. A stage
//! whose required input is missing fails with
//! [`StoreError::MissingInput`](appsheet_nav_store::StoreError::MissingInput)
//! and writes nothing. [`Pipeline::run`] runs the enabled stages in order,
//! skips stages whose dependencies failed, and records a run manifest.

use std::path::Path;

use appsheet_nav_core::{
    Action, NavigationEdge, View, ViewNameRegistry, validate_actions, validate_views,
};
use appsheet_nav_store::{
    ActionRow, Artifact, ArtifactLayout, ColumnRow, EdgeRow, FormatRuleRow,
    PipelineConfig, RunManifest, SliceRow, TargetRow, ViewRow, read_rows, read_rows_if_present,
    remove_stale, write_extended, write_records, write_rows,
};
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::detectors::{
    ColumnReferenceSources, ViewScope, detect_action_orphans, detect_format_rule_orphans,
    detect_virtual_column_orphans,
};
use crate::edges::EdgeGenerator;
use crate::error::{PipelineError, Result};
use crate::exclusions::{ExclusionSet, load_bot_actions};
use crate::parser::TargetParser;
use crate::phantom::{PHANTOM_HEADERS, PhantomScan};
use crate::reachability::analyze_reachability;
use crate::report::{PipelineReport, Stage, StageOutcome, StageReport};

const UNPARSEABLE_HEADERS: [&str; 2] = ["parse_failure_reason", "expression_attempted"];
const UNUSED_HEADERS: [&str; 2] = ["is_unused", "unused_reason"];
const VIEW_ORPHAN_HEADERS: [&str; 2] = ["is_orphan", "orphan_reason"];
const ACTION_ORPHAN_HEADERS: [&str; 4] = ["is_orphan", "orphan_type", "reference_count", "notes"];
const RULE_ORPHAN_HEADERS: [&str; 3] = ["is_orphan", "orphan_reasons", "formatted_items_count"];
const COLUMN_ORPHAN_HEADERS: [&str; 2] = ["is_orphan", "total_references"];

/// The answer to "how is this view reached?".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachPath {
    /// Canonical view name.
    pub view: String,
    /// Views from a root to `view`, or `None` when it is unreachable.
    pub path: Option<Vec<String>>,
}

/// Runs analysis stages against one artifact directory.
#[derive(Debug, Clone)]
pub struct Pipeline {
    layout: ArtifactLayout,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(layout: ArtifactLayout, config: PipelineConfig) -> Self {
        Self { layout, config }
    }

    pub fn layout(&self) -> &ArtifactLayout {
        &self.layout
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run_stage(&self, stage: Stage) -> Result<StageReport> {
        match stage {
            Stage::Targets => self.run_targets(),
            Stage::Edges => self.run_edges(),
            Stage::Reachability => self.run_reachability(),
            Stage::Phantoms => self.run_phantoms(),
            Stage::Orphans => self.run_orphans(),
        }
    }

    /// Runs every enabled stage, then writes the run manifest.
    ///
    /// A failed stage does not stop the run; stages that depend on it are
    /// skipped. The report lists the artifacts whose checksums changed since
    /// the previous manifest.
    pub fn run(&self) -> Result<PipelineReport> {
        let mut report = PipelineReport::default();
        let mut incomplete: Vec<Stage> = Vec::new();

        for stage in Stage::ALL {
            if !stage.is_enabled(&self.config.stages) {
                debug!(stage = %stage, "stage disabled");
                report.outcomes.push(StageOutcome::Disabled { stage });
                continue;
            }
            let blocked = stage
                .depends_on()
                .iter()
                .find(|dependency| incomplete.contains(dependency));
            if let Some(dependency) = blocked {
                let reason = format!("{dependency} stage did not complete");
                warn!("{}", PipelineError::StageSkipped { stage, reason: reason.clone() });
                incomplete.push(stage);
                report.outcomes.push(StageOutcome::Skipped { stage, reason });
                continue;
            }
            match self.run_stage(stage) {
                Ok(stage_report) => report.outcomes.push(StageOutcome::Completed(stage_report)),
                Err(err) => {
                    error!(stage = %stage, error = %err, "stage failed");
                    incomplete.push(stage);
                    report.outcomes.push(StageOutcome::Failed {
                        stage,
                        error: err.to_string(),
                    });
                }
            }
        }

        report.changed_artifacts = self.write_manifest()?;
        Ok(report)
    }

    fn write_manifest(&self) -> Result<Vec<String>> {
        let path = self.layout.manifest_path();
        let previous = if path.is_file() {
            match RunManifest::load(&path) {
                Ok(manifest) => Some(manifest),
                Err(err) => {
                    warn!(error = %err, "ignoring unreadable previous manifest");
                    None
                }
            }
        } else {
            None
        };

        let mut manifest = RunManifest::new(env!("CARGO_PKG_VERSION"));
        for artifact in Artifact::INPUTS {
            if self.layout.exists(artifact) {
                manifest.record_input(artifact.file_name(), self.layout.path(artifact))?;
            }
        }
        for artifact in Artifact::OUTPUTS {
            if self.layout.exists(artifact) {
                manifest.record_output(artifact.file_name(), self.layout.path(artifact))?;
            }
        }
        manifest.save(&path)?;

        let changed = previous
            .map(|previous| previous.diff(&manifest))
            .unwrap_or_default();
        if !changed.is_empty() {
            info!(artifacts = ?changed, "artifacts changed since previous run");
        }
        Ok(changed)
    }

    /// Parses every action's navigation formula into targets.
    pub fn run_targets(&self) -> Result<StageReport> {
        let action_rows: Vec<ActionRow> = self.required(Artifact::Actions)?;
        let view_rows: Vec<ViewRow> = self.optional(Artifact::Views)?;
        let actions = to_actions(&action_rows);
        let views: Vec<View> = view_rows.iter().map(ViewRow::to_view).collect();
        log_findings(validate_actions(&actions));

        let run = TargetParser::with_views(&views).parse_actions(&actions);
        let rows: Vec<TargetRow> = run.targets.iter().map(TargetRow::from_target).collect();

        let mut report = StageReport::new(Stage::Targets)
            .metric("actions", run.stats.actions.total)
            .metric("navigation actions", run.stats.actions.navigation)
            .metric("group actions", run.stats.actions.group)
            .metric("targets", rows.len())
            .metric("context conditions", run.stats.contexts.total)
            .metric("unparseable", run.unparseable.len())
            .with_stats(&run.stats);

        self.write(&mut report, Artifact::ActionTargets, |path| write_rows(path, &rows))?;
        let unparseable = run.unparseable.iter().map(|failure| {
            (
                action_rows[failure.index].clone(),
                vec![failure.reason.label().to_string(), failure.expression.clone()],
            )
        });
        self.write_if_any(
            &mut report,
            Artifact::UnparseableTargets,
            !run.unparseable.is_empty(),
            |path| write_extended(path, &UNPARSEABLE_HEADERS, unparseable),
        )?;

        info!(targets = rows.len(), unparseable = run.unparseable.len(), "parsed action targets");
        Ok(report)
    }

    /// Expands targets into navigation edges.
    pub fn run_edges(&self) -> Result<StageReport> {
        let target_rows: Vec<TargetRow> = self.required(Artifact::ActionTargets)?;
        let view_rows: Vec<ViewRow> = self.required(Artifact::Views)?;
        let action_rows: Vec<ActionRow> = self.optional(Artifact::Actions)?;
        let column_rows: Vec<ColumnRow> = self.optional(Artifact::Columns)?;
        let slice_rows: Vec<SliceRow> = self.optional(Artifact::Slices)?;

        let targets: Vec<_> = target_rows.iter().map(TargetRow::to_target).collect();
        let views: Vec<View> = view_rows.iter().map(ViewRow::to_view).collect();
        let actions = to_actions(&action_rows);
        let columns: Vec<_> = column_rows.iter().map(ColumnRow::to_column).collect();
        let slices: Vec<_> = slice_rows.iter().map(SliceRow::to_slice).collect();
        log_findings(validate_views(&views));

        let mut generator = EdgeGenerator::new(&targets, &views)
            .with_actions(&actions)
            .with_slices(&slices);
        if !columns.is_empty() {
            generator = generator.with_columns(&columns);
        }
        let run = generator.generate();
        let rows: Vec<EdgeRow> = run.edges.iter().map(EdgeRow::from_edge).collect();

        let mut report = StageReport::new(Stage::Edges)
            .metric("views processed", run.stats.views_processed)
            .metric("actions checked", run.stats.actions_checked)
            .metric("groups expanded", run.stats.groups_expanded)
            .metric("edges created", run.stats.edges_created)
            .metric("blocked by conditions", run.stats.blocked_by_conditions)
            .metric("blocked by visibility", run.stats.blocked_by_visibility)
            .with_stats(&run.stats);
        self.write(&mut report, Artifact::NavigationEdges, |path| write_rows(path, &rows))?;

        info!(edges = rows.len(), views = views.len(), "generated navigation edges");
        Ok(report)
    }

    /// Classifies every view as reachable, orphaned or unused.
    pub fn run_reachability(&self) -> Result<StageReport> {
        let view_rows: Vec<ViewRow> = self.required(Artifact::Views)?;
        self.layout.require(Artifact::Actions)?;
        let (views, edges) = self.load_graph_inputs(&view_rows)?;

        let analysis = analyze_reachability(&views, &edges, &self.config.roots);

        let mut report = StageReport::new(Stage::Reachability)
            .metric("views", views.len())
            .metric("edges", analysis.graph.edge_count())
            .metric("root views", analysis.roots.len())
            .metric("reachable views", analysis.reachable.len())
            .metric("potential orphans", analysis.orphans.len())
            .metric("unused system views", analysis.unused_system.len());

        let unused = analysis.unused_system.iter().map(|entry| {
            (
                view_rows[entry.index].clone(),
                vec!["Yes".to_string(), entry.reason.clone()],
            )
        });
        self.write_if_any(
            &mut report,
            Artifact::UnusedSystemViews,
            !analysis.unused_system.is_empty(),
            |path| write_extended(path, &UNUSED_HEADERS, unused),
        )?;
        let orphans = analysis.orphans.iter().map(|entry| {
            (
                view_rows[entry.index].clone(),
                vec!["Yes".to_string(), entry.reason.clone()],
            )
        });
        self.write_if_any(
            &mut report,
            Artifact::ViewOrphans,
            !analysis.orphans.is_empty(),
            |path| write_extended(path, &VIEW_ORPHAN_HEADERS, orphans),
        )?;

        info!(
            reachable = analysis.reachable.len(),
            orphans = analysis.orphans.len(),
            unused_system = analysis.unused_system.len(),
            "classified views"
        );
        Ok(report)
    }

    /// Finds references to views that do not exist.
    pub fn run_phantoms(&self) -> Result<StageReport> {
        let view_rows: Vec<ViewRow> = self.required(Artifact::Views)?;
        let targets = if self.layout.exists(Artifact::ActionTargets) {
            let rows: Vec<TargetRow> = self.required(Artifact::ActionTargets)?;
            Some(rows.iter().map(TargetRow::to_target).collect::<Vec<_>>())
        } else {
            debug!("no parsed targets; scanning navigation formulas directly");
            None
        };
        let action_rows: Vec<ActionRow> = self.optional(Artifact::Actions)?;
        let column_rows: Vec<ColumnRow> = self.optional(Artifact::Columns)?;
        let rule_rows: Vec<FormatRuleRow> = self.optional(Artifact::FormatRules)?;

        let views: Vec<View> = view_rows.iter().map(ViewRow::to_view).collect();
        let actions = to_actions(&action_rows);
        let columns: Vec<_> = column_rows.iter().map(ColumnRow::to_column).collect();
        let rules: Vec<_> = rule_rows.iter().map(FormatRuleRow::to_format_rule).collect();

        let phantoms = PhantomScan {
            views: &views,
            targets: targets.as_deref(),
            actions: &actions,
            columns: &columns,
            format_rules: &rules,
        }
        .run();
        let missing_names: usize = phantoms
            .iter()
            .map(|phantom| phantom.missing_view_names.len())
            .sum();

        let mut report = StageReport::new(Stage::Phantoms)
            .metric("known views", views.len())
            .metric("records with phantom references", phantoms.len())
            .metric("missing view names", missing_names);
        self.write_if_any(
            &mut report,
            Artifact::PhantomReferences,
            !phantoms.is_empty(),
            |path| write_records(path, &PHANTOM_HEADERS, phantoms.iter().map(|p| p.values())),
        )?;

        info!(phantoms = phantoms.len(), "scanned for phantom view references");
        Ok(report)
    }

    /// Detects orphan actions, format rules and virtual columns.
    pub fn run_orphans(&self) -> Result<StageReport> {
        let action_rows: Vec<ActionRow> = self.required(Artifact::Actions)?;
        let view_rows: Vec<ViewRow> = self.required(Artifact::Views)?;
        let column_rows: Vec<ColumnRow> = self.optional(Artifact::Columns)?;
        let slice_rows: Vec<SliceRow> = self.optional(Artifact::Slices)?;
        let rule_rows: Vec<FormatRuleRow> = self.optional(Artifact::FormatRules)?;

        let actions = to_actions(&action_rows);
        let views: Vec<View> = view_rows.iter().map(ViewRow::to_view).collect();
        let columns: Vec<_> = column_rows.iter().map(ColumnRow::to_column).collect();
        let slices: Vec<_> = slice_rows.iter().map(SliceRow::to_slice).collect();
        let rules: Vec<_> = rule_rows.iter().map(FormatRuleRow::to_format_rule).collect();

        let excluded = ExclusionSet::load(self.layout.path(Artifact::UnusedSystemViews))?;
        let bot_actions =
            load_bot_actions(self.layout.resolve(&self.config.exclusions.bot_actions_file))?;
        let scope = ViewScope::new(&views, &excluded, &columns, &slices);

        let action_orphans = detect_action_orphans(&actions, &scope, &bot_actions);
        let rule_orphans = detect_format_rule_orphans(&rules, &actions, &scope);
        let sources = ColumnReferenceSources {
            actions: &actions,
            format_rules: &rules,
            slices: &slices,
        };
        let virtual_columns = detect_virtual_column_orphans(&columns, &sources, &scope);

        let mut report = StageReport::new(Stage::Orphans)
            .metric("excluded views", excluded.len())
            .metric("bot actions", bot_actions.len())
            .metric("potential action orphans", action_orphans.len())
            .metric("potential format rule orphans", rule_orphans.len())
            .metric("virtual columns", virtual_columns.analyzed)
            .metric("system-generated reverse references", virtual_columns.system_generated)
            .metric("label columns shown through refs", virtual_columns.shown_labels)
            .metric("potential virtual column orphans", virtual_columns.orphans.len());

        let action_output = action_orphans.iter().map(|orphan| {
            (
                action_rows[orphan.index].clone(),
                vec![
                    "Yes".to_string(),
                    orphan.orphan_type.as_str().to_string(),
                    "0".to_string(),
                    orphan.notes(),
                ],
            )
        });
        self.write_if_any(
            &mut report,
            Artifact::ActionOrphans,
            !action_orphans.is_empty(),
            |path| write_extended(path, &ACTION_ORPHAN_HEADERS, action_output),
        )?;
        let rule_output = rule_orphans.iter().map(|orphan| {
            (
                rule_rows[orphan.index].clone(),
                vec![
                    "Yes".to_string(),
                    orphan.reasons_text(),
                    rules[orphan.index].formatted_items_count().to_string(),
                ],
            )
        });
        self.write_if_any(
            &mut report,
            Artifact::FormatRuleOrphans,
            !rule_orphans.is_empty(),
            |path| write_extended(path, &RULE_ORPHAN_HEADERS, rule_output),
        )?;
        let column_output = virtual_columns.orphans.iter().map(|orphan| {
            (
                column_rows[orphan.index].clone(),
                vec!["Yes".to_string(), "0".to_string()],
            )
        });
        self.write_if_any(
            &mut report,
            Artifact::VirtualColumnOrphans,
            !virtual_columns.orphans.is_empty(),
            |path| write_extended(path, &COLUMN_ORPHAN_HEADERS, column_output),
        )?;

        info!(
            actions = action_orphans.len(),
            format_rules = rule_orphans.len(),
            virtual_columns = virtual_columns.orphans.len(),
            "detected orphans"
        );
        Ok(report)
    }

    /// Traces how a view is reached from the roots, using the current
    /// views and navigation edges.
    pub fn reach_path(&self, view: &str) -> Result<ReachPath> {
        let view_rows: Vec<ViewRow> = self.required(Artifact::Views)?;
        let (views, edges) = self.load_graph_inputs(&view_rows)?;
        let registry = ViewNameRegistry::from_names(views.iter().map(|view| &view.name));
        let analysis = analyze_reachability(&views, &edges, &self.config.roots);
        let canonical = registry.canonicalize(view);
        Ok(ReachPath {
            path: analysis.reachable.path_to(&canonical),
            view: canonical,
        })
    }

    fn load_graph_inputs(&self, view_rows: &[ViewRow]) -> Result<(Vec<View>, Vec<NavigationEdge>)> {
        let edge_rows: Vec<EdgeRow> = self.required(Artifact::NavigationEdges)?;
        let views: Vec<View> = view_rows.iter().map(ViewRow::to_view).collect();
        let edges: Vec<NavigationEdge> = edge_rows.iter().filter_map(EdgeRow::to_edge).collect();
        let dropped = edge_rows.len() - edges.len();
        if dropped > 0 {
            warn!(dropped, "skipped edges with an unrecognized availability type");
        }
        Ok((views, edges))
    }

    fn required<R: DeserializeOwned>(&self, artifact: Artifact) -> Result<Vec<R>> {
        let path = self.layout.require(artifact)?;
        let rows = read_rows(&path)?;
        debug!(artifact = artifact.file_name(), rows = rows.len(), "loaded artifact");
        Ok(rows)
    }

    fn optional<R: DeserializeOwned>(&self, artifact: Artifact) -> Result<Vec<R>> {
        let rows = read_rows_if_present(self.layout.path(artifact))?;
        debug!(artifact = artifact.file_name(), rows = rows.len(), "loaded optional artifact");
        Ok(rows)
    }

    fn write<F>(&self, report: &mut StageReport, artifact: Artifact, write: F) -> Result<()>
    where
        F: FnOnce(&Path) -> appsheet_nav_store::Result<()>,
    {
        write(&self.layout.path(artifact))?;
        report.written.push(artifact.file_name().to_string());
        Ok(())
    }

    /// Writes an output that only exists when the stage found something; a
    /// file left by an earlier run is removed otherwise.
    fn write_if_any<F>(
        &self,
        report: &mut StageReport,
        artifact: Artifact,
        any: bool,
        write: F,
    ) -> Result<()>
    where
        F: FnOnce(&Path) -> appsheet_nav_store::Result<()>,
    {
        if any {
            return self.write(report, artifact, write);
        }
        let path = self.layout.path(artifact);
        if path.exists() {
            remove_stale(&path)?;
            report.removed.push(artifact.file_name().to_string());
        }
        Ok(())
    }
}

fn to_actions(rows: &[ActionRow]) -> Vec<Action> {
    rows.iter().map(ActionRow::to_action).collect()
}

fn log_findings(findings: Vec<appsheet_nav_core::ValidationError>) {
    for finding in findings {
        warn!(%finding, "input validation");
    }
}
