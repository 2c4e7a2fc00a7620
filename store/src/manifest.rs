//! Run manifest: what a pipeline run read and wrote.
//!
//! Every input and output artifact is recorded with its SHA-256 checksum and
//! size. Comparing two manifests with [`RunManifest::diff`] shows which
//! artifacts changed between runs; for unchanged inputs the outputs must not
//! change either.
//!
//! # Examples
//!
//! ```no_run
//! use appsheet_nav_store::RunManifest;
//!
//! let mut manifest = RunManifest::new(env!("CARGO_PKG_VERSION"));
//! manifest.record_output("navigation_edges.csv", "out/navigation_edges.csv").unwrap();
//! manifest.save("out/run_manifest.json").unwrap();
//!
//! let previous = RunManifest::load("out/run_manifest.json").unwrap();
//! assert!(previous.diff(&manifest).is_empty());
//! ```

use std::collections::BTreeMap;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, StoreError};

/// Checksum and size of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactChecksum {
    /// SHA-256 hex digest of the file contents.
    pub sha256: String,
    pub bytes: u64,
}

/// Record of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Version of the tool that produced the run.
    pub tool_version: String,
    /// RFC 3339 timestamp of the run.
    pub generated_at: String,
    /// Input artifacts keyed by file name.
    pub inputs: BTreeMap<String, ArtifactChecksum>,
    /// Output artifacts keyed by file name.
    pub outputs: BTreeMap<String, ArtifactChecksum>,
}

impl RunManifest {
    /// Creates an empty manifest stamped with the current time.
    pub fn new(tool_version: impl Into<String>) -> Self {
        Self {
            tool_version: tool_version.into(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Loads and validates a manifest.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](StoreError::Io) or [`Json`](StoreError::Json) if the
    /// file cannot be read, or [`InvalidManifest`](StoreError::InvalidManifest)
    /// if required fields are empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let manifest: RunManifest = serde_json::from_reader(reader)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Saves the manifest as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.tool_version.trim().is_empty() {
            return Err(StoreError::InvalidManifest("tool_version is empty".into()));
        }
        let checksums = self.inputs.iter().chain(self.outputs.iter());
        for (name, checksum) in checksums {
            if checksum.sha256.len() != 64 {
                return Err(StoreError::InvalidManifest(format!(
                    "checksum for {name} is not a SHA-256 digest"
                )));
            }
        }
        Ok(())
    }

    /// Records an input artifact's checksum.
    pub fn record_input(&mut self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let checksum = Self::checksum_entry(path)?;
        self.inputs.insert(name.to_string(), checksum);
        Ok(())
    }

    /// Records an output artifact's checksum.
    pub fn record_output(&mut self, name: &str, path: impl AsRef<Path>) -> Result<()> {
        let checksum = Self::checksum_entry(path)?;
        self.outputs.insert(name.to_string(), checksum);
        Ok(())
    }

    fn checksum_entry(path: impl AsRef<Path>) -> Result<ArtifactChecksum> {
        let bytes = std::fs::read(path)?;
        Ok(ArtifactChecksum {
            sha256: format!("{:x}", Sha256::digest(&bytes)),
            bytes: bytes.len() as u64,
        })
    }

    /// Computes the SHA-256 hex digest of a file.
    pub fn calculate_checksum(path: impl AsRef<Path>) -> Result<String> {
        let bytes = std::fs::read(path)?;
        let hash = Sha256::digest(&bytes);
        Ok(format!("{:x}", hash))
    }

    /// Returns the names of artifacts that differ between two runs.
    ///
    /// An artifact differs when it appears in only one manifest or when its
    /// checksum changed. Inputs and outputs are compared separately; names
    /// are returned inputs first, each group sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use appsheet_nav_store::{ArtifactChecksum, RunManifest};
    ///
    /// let digest = |c: char| ArtifactChecksum { sha256: c.to_string().repeat(64), bytes: 1 };
    /// let mut old = RunManifest::new("0.1.0");
    /// old.outputs.insert("navigation_edges.csv".into(), digest('a'));
    /// let mut new = RunManifest::new("0.1.0");
    /// new.outputs.insert("navigation_edges.csv".into(), digest('b'));
    /// new.outputs.insert("action_targets.csv".into(), digest('c'));
    ///
    /// assert_eq!(old.diff(&new), vec!["action_targets.csv", "navigation_edges.csv"]);
    /// ```
    pub fn diff(&self, other: &RunManifest) -> Vec<String> {
        let mut changed = changed_entries(&self.inputs, &other.inputs);
        changed.extend(changed_entries(&self.outputs, &other.outputs));
        changed
    }
}

fn changed_entries(
    left: &BTreeMap<String, ArtifactChecksum>,
    right: &BTreeMap<String, ArtifactChecksum>,
) -> Vec<String> {
    let mut changed: Vec<String> = left
        .iter()
        .filter(|(name, checksum)| right.get(*name) != Some(*checksum))
        .map(|(name, _)| name.clone())
        .collect();
    changed.extend(
        right
            .keys()
            .filter(|name| !left.contains_key(*name))
            .cloned(),
    );
    changed.sort();
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_sha256_hex() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        std::fs::write(&path, b"").unwrap();
        assert_eq!(
            RunManifest::calculate_checksum(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_identical_runs_have_no_diff() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("navigation_edges.csv");
        std::fs::write(&path, "\"source_view\"\n").unwrap();

        let mut first = RunManifest::new("0.1.0");
        first.record_output("navigation_edges.csv", &path).unwrap();
        let mut second = RunManifest::new("0.1.0");
        second.record_output("navigation_edges.csv", &path).unwrap();
        assert!(first.diff(&second).is_empty());

        std::fs::write(&path, "\"source_view\"\n\"A\"\n").unwrap();
        let mut third = RunManifest::new("0.1.0");
        third.record_output("navigation_edges.csv", &path).unwrap();
        assert_eq!(first.diff(&third), vec!["navigation_edges.csv"]);
    }

    #[test]
    fn test_removed_artifact_is_reported() {
        let entry = ArtifactChecksum {
            sha256: "0".repeat(64),
            bytes: 0,
        };
        let mut old = RunManifest::new("0.1.0");
        old.inputs.insert("appsheet_slices.csv".into(), entry);
        let new = RunManifest::new("0.1.0");
        assert_eq!(old.diff(&new), vec!["appsheet_slices.csv"]);
    }

    #[test]
    fn test_load_rejects_empty_tool_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_manifest.json");
        let manifest = RunManifest::new("");
        manifest.save(&path).unwrap();
        assert!(matches!(
            RunManifest::load(&path),
            Err(StoreError::InvalidManifest(_))
        ));
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_manifest.json");
        let mut manifest = RunManifest::new("0.1.0");
        manifest.inputs.insert(
            "appsheet_views.csv".into(),
            ArtifactChecksum {
                sha256: "f".repeat(64),
                bytes: 12,
            },
        );
        manifest.save(&path).unwrap();
        assert_eq!(RunManifest::load(&path).unwrap(), manifest);
    }
}
