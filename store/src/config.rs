//! Pipeline configuration.
//!
//! Controls which stages `run` executes, how root views are identified, and
//! where the optional bot-action list lives. Every section is optional.
//!
//! # Example YAML
//!
//! ```yaml
//! version: "1.0"
//! stages:
//!   targets: true
//!   edges: true
//!   reachability: true
//!   phantoms: true
//!   orphans: false
//! roots:
//!   positions: [first, next, middle, later, last]
//!   categories: [menu]
//! exclusions:
//!   bot_actions_file: bot_actions.txt
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::artifacts::DEFAULT_BOT_ACTIONS_FILE;
use crate::error::Result;

/// Which stages to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageToggles {
    pub targets: bool,
    pub edges: bool,
    pub reachability: bool,
    pub phantoms: bool,
    pub orphans: bool,
}

impl Default for StageToggles {
    fn default() -> Self {
        Self {
            targets: true,
            edges: true,
            reachability: true,
            phantoms: true,
            orphans: true,
        }
    }
}

/// How root (entry) views are identified.
///
/// # Examples
///
/// ```
/// use appsheet_nav_store::RootConfig;
///
/// let roots = RootConfig::default();
/// assert!(roots.is_root_position("Later"));
/// assert!(!roots.is_root_position(""));
/// assert!(roots.is_root_category("menu"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Positions that make a `primary` view a root.
    pub positions: Vec<String>,
    /// Categories whose views are always roots.
    pub categories: Vec<String>,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            positions: ["first", "next", "middle", "later", "last"]
                .into_iter()
                .map(String::from)
                .collect(),
            categories: vec!["menu".to_string()],
        }
    }
}

impl RootConfig {
    pub fn is_root_position(&self, position: &str) -> bool {
        let position = position.trim();
        self.positions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(position))
    }

    pub fn is_root_category(&self, category: &str) -> bool {
        let category = category.trim();
        self.categories
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(category))
    }
}

/// Sources of names that count as referenced regardless of the app model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionConfig {
    /// One action name per line; relative paths resolve against the
    /// artifact directory.
    pub bot_actions_file: String,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            bot_actions_file: DEFAULT_BOT_ACTIONS_FILE.to_string(),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Configuration format version (e.g., `"1.0"`).
    pub version: String,
    pub stages: StageToggles,
    pub roots: RootConfig,
    pub exclusions: ExclusionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            stages: StageToggles::default(),
            roots: RootConfig::default(),
            exclusions: ExclusionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](crate::StoreError::Io) if the file cannot be read, or
    /// [`Yaml`](crate::StoreError::Yaml) if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
