//! Per-stage and whole-run reporting.

use std::fmt;

use serde::{Deserialize, Serialize};

use appsheet_nav_store::StageToggles;

/// A pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Parse navigation formulas into targets.
    Targets,
    /// Expand targets into view-to-view edges.
    Edges,
    /// Traverse the edges from the root views.
    Reachability,
    /// Find references to views that do not exist.
    Phantoms,
    /// Detect orphan actions, format rules and virtual columns.
    Orphans,
}

impl Stage {
    /// Stages in execution order.
    pub const ALL: [Stage; 5] = [
        Self::Targets,
        Self::Edges,
        Self::Reachability,
        Self::Phantoms,
        Self::Orphans,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Targets => "targets",
            Self::Edges => "edges",
            Self::Reachability => "reachability",
            Self::Phantoms => "phantoms",
            Self::Orphans => "orphans",
        }
    }

    /// Stages whose output this stage requires. Phantoms and orphans only
    /// read optional artifacts of earlier stages.
    pub fn depends_on(self) -> &'static [Stage] {
        match self {
            Self::Targets => &[],
            Self::Edges => &[Self::Targets],
            Self::Reachability => &[Self::Edges],
            Self::Phantoms | Self::Orphans => &[],
        }
    }

    pub fn is_enabled(self, toggles: &StageToggles) -> bool {
        match self {
            Self::Targets => toggles.targets,
            Self::Edges => toggles.edges,
            Self::Reachability => toggles.reachability,
            Self::Phantoms => toggles.phantoms,
            Self::Orphans => toggles.orphans,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labelled count shown in the stage summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub label: &'static str,
    pub value: usize,
}

/// What one stage did.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: Stage,
    pub metrics: Vec<Metric>,
    /// Artifacts written, by file name.
    pub written: Vec<String>,
    /// Stale artifacts removed because the stage found nothing.
    pub removed: Vec<String>,
    /// Full statistics of the stage.
    pub stats: serde_json::Value,
}

impl StageReport {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            metrics: Vec::new(),
            written: Vec::new(),
            removed: Vec::new(),
            stats: serde_json::Value::Null,
        }
    }

    pub fn metric(mut self, label: &'static str, value: usize) -> Self {
        self.metrics.push(Metric { label, value });
        self
    }

    pub fn with_stats<T: Serialize>(mut self, stats: &T) -> Self {
        self.stats = serde_json::to_value(stats).unwrap_or(serde_json::Value::Null);
        self
    }

    pub fn value(&self, label: &str) -> Option<usize> {
        self.metrics
            .iter()
            .find(|metric| metric.label == label)
            .map(|metric| metric.value)
    }
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[{}]", self.stage)?;
        let width = self
            .metrics
            .iter()
            .map(|metric| metric.label.len())
            .max()
            .unwrap_or(0);
        for metric in &self.metrics {
            writeln!(f, "  {:<width$}  {}", metric.label, metric.value)?;
        }
        for file in &self.written {
            writeln!(f, "  wrote {file}")?;
        }
        for file in &self.removed {
            writeln!(f, "  removed stale {file}")?;
        }
        Ok(())
    }
}

/// How a stage ended within a pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum StageOutcome {
    Completed(StageReport),
    Failed { stage: Stage, error: String },
    Skipped { stage: Stage, reason: String },
    Disabled { stage: Stage },
}

impl StageOutcome {
    pub fn stage(&self) -> Stage {
        match self {
            Self::Completed(report) => report.stage,
            Self::Failed { stage, .. } | Self::Skipped { stage, .. } | Self::Disabled { stage } => {
                *stage
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Result of a whole pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub outcomes: Vec<StageOutcome>,
    /// Artifacts whose checksum differs from the previous run's manifest.
    pub changed_artifacts: Vec<String>,
}

impl PipelineReport {
    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|outcome| outcome.stage() == stage)
    }

    /// Returns `true` when no enabled stage failed or was skipped.
    pub fn succeeded(&self) -> bool {
        self.outcomes
            .iter()
            .all(|outcome| matches!(outcome, StageOutcome::Completed(_) | StageOutcome::Disabled { .. }))
    }
}
