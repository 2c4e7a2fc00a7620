//! Artifact storage for AppSheet navigation analysis.
//!
//! Every pipeline stage communicates through files in one working directory.
//! This crate owns their formats:
//!
//! - typed CSV rows ([`ActionRow`], [`ViewRow`], [`TargetRow`], [`EdgeRow`],
//!   ...) read by header name and written with every field quoted;
//! - the directory layout ([`ArtifactLayout`], [`Artifact`]) and the
//!   missing-input diagnostics;
//! - the YAML [`PipelineConfig`];
//! - the JSON [`RunManifest`] with per-artifact SHA-256 checksums.
//!
//! # Quick start
//!
//! ```no_run
//! use appsheet_nav_store::{Artifact, ArtifactLayout, ViewRow, read_rows};
//!
//! let layout = ArtifactLayout::new("exports/app_parse");
//! let path = layout.require(Artifact::Views).unwrap();
//! let rows: Vec<ViewRow> = read_rows(path).unwrap();
//! let views: Vec<_> = rows.iter().map(ViewRow::to_view).collect();
//! println!("{} views", views.len());
//! ```

mod artifacts;
mod config;
mod csv_io;
mod error;
mod manifest;
mod rows;

pub use artifacts::{Artifact, ArtifactLayout, DEFAULT_BOT_ACTIONS_FILE, MANIFEST_FILE};
pub use config::{ExclusionConfig, PipelineConfig, RootConfig, StageToggles};
pub use csv_io::{
    CsvRecord, read_rows, read_rows_if_present, remove_stale, write_extended, write_records,
    write_rows,
};
pub use error::{Result, StoreError};
pub use manifest::{ArtifactChecksum, RunManifest};
pub use rows::{
    ActionRow, ColumnRow, EdgeRow, FormatRuleRow, SliceRow, TargetRow, ViewRow, yes_no,
};
