use appsheet_nav_core::{ContextField, NavigationTarget, Polarity, ViewType};
use appsheet_nav_store::{
    ActionRow, Artifact, ArtifactLayout, CsvRecord, PipelineConfig, RunManifest, TargetRow,
    ViewRow, read_rows, write_extended, write_rows,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn write_file(dir: &std::path::Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

// ---------------------------------------------------------------------------
// Input parsing
// ---------------------------------------------------------------------------

#[test]
fn test_views_export_parses_lists_and_json() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "appsheet_views.csv",
        "\"view_name\",\"view_type\",\"category\",\"position\",\"available_actions\",\"view_configuration\"\n\
         \"Orders\",\"deck\",\"primary\",\"First\",\"Edit|||Open Order\",\"{\"\"Events\"\":[{\"\"EventType\"\":\"\"Row Selected\"\",\"\"EventAction\"\":\"\"**auto**\"\"}]}\"\n",
    );

    let layout = ArtifactLayout::new(dir.path());
    let rows: Vec<ViewRow> = read_rows(layout.require(Artifact::Views).unwrap()).unwrap();
    let view = rows[0].to_view();

    assert_eq!(view.name, "Orders");
    assert_eq!(view.view_type, ViewType::Deck);
    assert_eq!(view.position, "first");
    assert_eq!(view.available_actions, vec!["Edit", "Open Order"]);
    assert!(view.has_auto_marker());
    assert_eq!(view.configured_events()[0].event_type, "row selected");
}

#[test]
fn test_missing_required_input_names_expected_path() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let message = layout.require(Artifact::Actions).unwrap_err().to_string();
    assert!(message.contains("appsheet_actions.csv"));
    assert!(message.contains(&dir.path().display().to_string()));
}

// ---------------------------------------------------------------------------
// Output writing
// ---------------------------------------------------------------------------

#[test]
fn test_targets_roundtrip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());

    let mut target = NavigationTarget {
        source_action: "Go Archive".into(),
        target_view: "Archive".into(),
        original_expression: "=IF(CONTEXT(\"ViewType\")=\"deck\", LINKTOVIEW(\"Archive\"), \"\")"
            .into(),
        ..NavigationTarget::default()
    };
    target
        .constraints
        .add(ContextField::ViewType, Polarity::MustBe, "deck");
    let rows = vec![TargetRow::from_target(&target)];
    write_rows(layout.path(Artifact::ActionTargets), &rows).unwrap();

    let back: Vec<TargetRow> = read_rows(layout.path(Artifact::ActionTargets)).unwrap();
    assert_eq!(back, rows);
    assert_eq!(back[0].to_target(), target);
}

#[test]
fn test_extended_rows_append_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("potential_action_orphans.csv");
    let row = ActionRow {
        action_name: "Unused".into(),
        ..ActionRow::default()
    };
    write_extended(&path, &["is_orphan", "notes"], vec![(row, vec!["Yes".into(), String::new()])])
        .unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let header = text.lines().next().unwrap();
    assert!(header.starts_with("\"action_name\""));
    assert!(header.ends_with("\"is_orphan\",\"notes\""));
    assert_eq!(header.split(',').count(), ActionRow::HEADERS.len() + 2);
}

#[test]
fn test_empty_output_has_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("navigation_edges.csv");
    write_rows::<appsheet_nav_store::EdgeRow>(&path, &[]).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 1);
}

// ---------------------------------------------------------------------------
// Config and manifest
// ---------------------------------------------------------------------------

#[test]
fn test_config_and_manifest_live_next_to_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());

    let config = PipelineConfig::default();
    config.save(dir.path().join("appsheet-nav.yml")).unwrap();
    assert_eq!(
        PipelineConfig::load(dir.path().join("appsheet-nav.yml")).unwrap(),
        config
    );

    write_file(dir.path(), "appsheet_views.csv", "view_name\nOrders\n");
    let mut manifest = RunManifest::new("0.1.0");
    manifest
        .record_input("appsheet_views.csv", layout.path(Artifact::Views))
        .unwrap();
    manifest.save(layout.manifest_path()).unwrap();

    let loaded = RunManifest::load(layout.manifest_path()).unwrap();
    assert_eq!(loaded.inputs["appsheet_views.csv"].bytes, 17);
    assert!(loaded.diff(&manifest).is_empty());
}
