//! File names and locations of the pipeline's artifacts.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

/// Every file the pipeline reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Artifact {
    Actions,
    Views,
    Columns,
    Slices,
    FormatRules,
    ActionTargets,
    UnparseableTargets,
    NavigationEdges,
    UnusedSystemViews,
    ViewOrphans,
    PhantomReferences,
    ActionOrphans,
    FormatRuleOrphans,
    VirtualColumnOrphans,
}

impl Artifact {
    /// Metadata exported from the app documentation.
    pub const INPUTS: [Artifact; 5] = [
        Self::Actions,
        Self::Views,
        Self::Columns,
        Self::Slices,
        Self::FormatRules,
    ];

    /// Files written by the analysis stages.
    pub const OUTPUTS: [Artifact; 9] = [
        Self::ActionTargets,
        Self::UnparseableTargets,
        Self::NavigationEdges,
        Self::UnusedSystemViews,
        Self::ViewOrphans,
        Self::PhantomReferences,
        Self::ActionOrphans,
        Self::FormatRuleOrphans,
        Self::VirtualColumnOrphans,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Actions => "appsheet_actions.csv",
            Self::Views => "appsheet_views.csv",
            Self::Columns => "appsheet_columns.csv",
            Self::Slices => "appsheet_slices.csv",
            Self::FormatRules => "appsheet_format_rules.csv",
            Self::ActionTargets => "action_targets.csv",
            Self::UnparseableTargets => "action_targets_unparseable.csv",
            Self::NavigationEdges => "navigation_edges.csv",
            Self::UnusedSystemViews => "unused_system_views.csv",
            Self::ViewOrphans => "potential_view_orphans.csv",
            Self::PhantomReferences => "potential_phantom_view_references.csv",
            Self::ActionOrphans => "potential_action_orphans.csv",
            Self::FormatRuleOrphans => "potential_format_rule_orphans.csv",
            Self::VirtualColumnOrphans => "potential_virtual_column_orphans.csv",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Name of the run manifest written next to the artifacts.
pub const MANIFEST_FILE: &str = "run_manifest.json";

/// Name of the optional list of actions triggered by automation bots.
pub const DEFAULT_BOT_ACTIONS_FILE: &str = "bot_actions.txt";

/// A working directory holding input and output artifacts.
///
/// # Examples
///
/// ```
/// use appsheet_nav_store::{Artifact, ArtifactLayout};
///
/// let layout = ArtifactLayout::new("/tmp/app_parse");
/// assert!(layout.path(Artifact::NavigationEdges).ends_with("navigation_edges.csv"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    dir: PathBuf,
}

impl ArtifactLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, artifact: Artifact) -> PathBuf {
        self.dir.join(artifact.file_name())
    }

    pub fn exists(&self, artifact: Artifact) -> bool {
        self.path(artifact).is_file()
    }

    /// Returns the path of a required input.
    ///
    /// # Errors
    ///
    /// Returns [`MissingInput`](StoreError::MissingInput) naming the artifact
    /// and the expected location when the file does not exist.
    pub fn require(&self, artifact: Artifact) -> Result<PathBuf> {
        let path = self.path(artifact);
        if path.is_file() {
            return Ok(path);
        }
        tracing::error!(
            artifact = artifact.file_name(),
            path = %path.display(),
            "required input not found"
        );
        Err(StoreError::MissingInput {
            artifact: artifact.file_name(),
            path,
        })
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Resolves a file named in configuration relative to the directory.
    pub fn resolve(&self, file: impl AsRef<Path>) -> PathBuf {
        let file = file.as_ref();
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            self.dir.join(file)
        }
    }
}
