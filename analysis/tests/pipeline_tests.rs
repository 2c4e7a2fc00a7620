use std::path::Path;

use appsheet_nav_analysis::{Pipeline, PipelineError, Stage, StageOutcome};
use appsheet_nav_store::{
    ActionRow, Artifact, ArtifactLayout, ColumnRow, EdgeRow, FormatRuleRow, PipelineConfig,
    StoreError, TargetRow, ViewRow, read_rows, write_rows,
};

// ---------------------------------------------------------------------------
// Fixture
// ---------------------------------------------------------------------------

fn view(name: &str, category: &str, table: &str, actions: &str) -> ViewRow {
    ViewRow {
        view_name: name.into(),
        view_type: "detail".into(),
        category: category.into(),
        is_system_view: "No".into(),
        data_source: table.into(),
        source_table: table.into(),
        available_actions: actions.into(),
        ..ViewRow::default()
    }
}

fn navigate(name: &str, formula: &str) -> ActionRow {
    ActionRow {
        action_name: name.into(),
        source_table: "Order".into(),
        action_type_plain_english: "Go to another view within this app".into(),
        action_type_technical_name: "go_to_view".into(),
        action_prominence: "Display_Prominently".into(),
        navigate_target: formula.into(),
        is_system_generated: "No".into(),
        ..ActionRow::default()
    }
}

/// A menu linking to Archive, which links to DeepArchive, plus an isolated
/// view, an unparseable formula, a link to a missing view and a disabled
/// format rule.
fn write_app(dir: &Path) {
    let views = vec![
        view("MainMenu", "menu", "Order", "Go Archive"),
        view("Archive", "ref", "Order", "Go Deep"),
        view("DeepArchive", "ref", "Order", ""),
        view("Orphan1", "other", "Misc", ""),
    ];
    let actions = vec![
        navigate("Go Archive", r#"=LINKTOVIEW("Archive")"#),
        navigate("Go Deep", r#"=LINKTOVIEW("DeepArchive")"#),
        navigate("Go Ghost", r#"=LINKTOVIEW("Ghost View")"#),
        navigate("Weird", r#"=CONCATENATE("Arch", "ive")"#),
    ];
    let rules = vec![FormatRuleRow {
        rule_name: "Old Highlight".into(),
        source_table: "Order".into(),
        condition: "[Late]".into(),
        is_disabled: "Yes".into(),
        ..FormatRuleRow::default()
    }];

    write_rows(dir.join("appsheet_views.csv"), &views).unwrap();
    write_rows(dir.join("appsheet_actions.csv"), &actions).unwrap();
    write_rows(dir.join("appsheet_format_rules.csv"), &rules).unwrap();
    std::fs::write(dir.join("bot_actions.txt"), "# used by bots\nWeird\n").unwrap();
}

fn pipeline(dir: &Path) -> Pipeline {
    Pipeline::new(ArtifactLayout::new(dir), PipelineConfig::default())
}

fn names<R>(rows: &[R], name: impl Fn(&R) -> &str) -> Vec<String> {
    rows.iter().map(|row| name(row).to_string()).collect()
}

// ---------------------------------------------------------------------------
// Full run
// ---------------------------------------------------------------------------

#[test]
fn test_full_run_classifies_views() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());

    let report = pipeline(dir.path()).run().unwrap();
    assert!(report.succeeded(), "{report:?}");

    let edges: Vec<EdgeRow> = read_rows(dir.path().join("navigation_edges.csv")).unwrap();
    let pairs: Vec<(&str, &str, &str)> = edges
        .iter()
        .map(|e| {
            (
                e.source_view.as_str(),
                e.target_view.as_str(),
                e.action_availability_type.as_str(),
            )
        })
        .collect();
    assert_eq!(
        pairs,
        vec![
            ("MainMenu", "Archive", "direct"),
            ("Archive", "DeepArchive", "direct"),
        ]
    );

    let orphans: Vec<ViewRow> = read_rows(dir.path().join("potential_view_orphans.csv")).unwrap();
    assert_eq!(names(&orphans, |row| &row.view_name), vec!["Orphan1"]);
    assert!(!dir.path().join("unused_system_views.csv").exists());

    let Some(StageOutcome::Completed(reach)) = report.outcome(Stage::Reachability) else {
        panic!("reachability did not complete");
    };
    assert_eq!(reach.value("reachable views"), Some(3));
    assert_eq!(reach.value("root views"), Some(1));
}

#[test]
fn test_full_run_writes_review_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    pipeline(dir.path()).run().unwrap();

    let unparseable =
        std::fs::read_to_string(dir.path().join("action_targets_unparseable.csv")).unwrap();
    assert!(unparseable.contains("\"parse_failure_reason\",\"expression_attempted\""));
    assert!(unparseable.contains("\"Weird\""));
    assert!(unparseable.contains("Unknown pattern"));

    let phantoms =
        std::fs::read_to_string(dir.path().join("potential_phantom_view_references.csv"))
            .unwrap();
    assert!(phantoms.contains("\"Go Ghost\""));
    assert!(phantoms.contains("\"Ghost View\""));
    assert!(!phantoms.contains("\"Archive\""));

    let action_orphans: Vec<ActionRow> =
        read_rows(dir.path().join("potential_action_orphans.csv")).unwrap();
    assert_eq!(names(&action_orphans, |row| &row.action_name), vec!["Go Ghost"]);

    let rules = std::fs::read_to_string(dir.path().join("potential_format_rule_orphans.csv"))
        .unwrap();
    assert!(rules.contains("\"Old Highlight\""));
    assert!(rules.contains("\"Already disabled\""));

    assert!(dir.path().join("run_manifest.json").exists());
}

#[test]
fn test_reach_path_follows_edges() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    let pipeline = pipeline(dir.path());
    pipeline.run().unwrap();

    let deep = pipeline.reach_path("deeparchive").unwrap();
    assert_eq!(deep.view, "DeepArchive");
    assert_eq!(
        deep.path,
        Some(vec![
            "MainMenu".to_string(),
            "Archive".to_string(),
            "DeepArchive".to_string()
        ])
    );
    assert_eq!(pipeline.reach_path("Orphan1").unwrap().path, None);
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn test_rerun_is_byte_identical() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    let pipeline = pipeline(dir.path());

    pipeline.run().unwrap();
    let targets = std::fs::read(dir.path().join("action_targets.csv")).unwrap();
    let edges = std::fs::read(dir.path().join("navigation_edges.csv")).unwrap();

    let second = pipeline.run().unwrap();
    assert_eq!(std::fs::read(dir.path().join("action_targets.csv")).unwrap(), targets);
    assert_eq!(std::fs::read(dir.path().join("navigation_edges.csv")).unwrap(), edges);
    assert!(second.changed_artifacts.is_empty(), "{:?}", second.changed_artifacts);
}

#[test]
fn test_changed_input_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    let pipeline = pipeline(dir.path());
    pipeline.run().unwrap();

    let mut views: Vec<ViewRow> = read_rows(dir.path().join("appsheet_views.csv")).unwrap();
    views[3].category = "menu".into();
    write_rows(dir.path().join("appsheet_views.csv"), &views).unwrap();

    let report = pipeline.run().unwrap();
    assert!(report.changed_artifacts.contains(&"appsheet_views.csv".to_string()));
    assert!(report.changed_artifacts.contains(&"potential_view_orphans.csv".to_string()));
    assert!(!dir.path().join("potential_view_orphans.csv").exists());
}

// ---------------------------------------------------------------------------
// Failure handling
// ---------------------------------------------------------------------------

#[test]
fn test_edges_without_views_fail_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    let pipeline = pipeline(dir.path());
    pipeline.run_targets().unwrap();
    std::fs::remove_file(dir.path().join("appsheet_views.csv")).unwrap();

    let err = pipeline.run_edges().unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Store(StoreError::MissingInput { artifact: "appsheet_views.csv", .. })
    ));
    assert!(err.to_string().contains("appsheet_views.csv"));
    assert!(!dir.path().join("navigation_edges.csv").exists());
}

#[test]
fn test_edges_before_targets_fail() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    let err = pipeline(dir.path()).run_edges().unwrap_err();
    assert!(err.to_string().contains("action_targets.csv"));
}

#[test]
fn test_disabled_stage_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    let mut config = PipelineConfig::default();
    config.stages.reachability = false;
    config.stages.orphans = false;

    let report = Pipeline::new(ArtifactLayout::new(dir.path()), config)
        .run()
        .unwrap();
    assert!(report.succeeded());
    assert!(matches!(
        report.outcome(Stage::Reachability),
        Some(StageOutcome::Disabled { .. })
    ));
    assert!(!dir.path().join("potential_view_orphans.csv").exists());
    assert!(!dir.path().join("potential_action_orphans.csv").exists());
    assert!(dir.path().join("navigation_edges.csv").exists());
}

#[test]
fn test_targets_stage_alone() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());
    std::fs::remove_file(dir.path().join("appsheet_views.csv")).unwrap();

    let report = pipeline(dir.path()).run_targets().unwrap();
    assert_eq!(report.value("targets"), Some(3));
    assert_eq!(report.value("unparseable"), Some(1));

    let layout = ArtifactLayout::new(dir.path());
    let targets: Vec<TargetRow> = read_rows(layout.path(Artifact::ActionTargets)).unwrap();
    assert_eq!(
        names(&targets, |row| &row.target_view),
        vec!["Archive", "DeepArchive", "Ghost View"]
    );
    assert!(targets.iter().all(|row| row.must_be_viewtype.is_empty()));
}

// ---------------------------------------------------------------------------
// Orphans stage
// ---------------------------------------------------------------------------

fn virtual_column(name: &str, formula: &str) -> ColumnRow {
    ColumnRow {
        table_name: "Order".into(),
        column_name: name.into(),
        unique_identifier: format!("Order[{name}]"),
        is_virtual: "Yes".into(),
        data_type: "Text".into(),
        app_formula: formula.into(),
        ..ColumnRow::default()
    }
}

#[test]
fn test_orphans_stage_reports_virtual_columns() {
    let dir = tempfile::tempdir().unwrap();
    write_app(dir.path());

    let mut menu = view("MainMenu", "menu", "Order", "Go Archive");
    menu.referenced_columns = "Order[Menu Total]".into();
    let mut archive = view("Archive", "ref", "Order", "Go Deep");
    archive.referenced_columns = "Order[Archive Note]".into();
    write_rows(dir.path().join("appsheet_views.csv"), &[menu, archive]).unwrap();

    let columns = vec![
        virtual_column("Menu Total", "SUM([Lines])"),
        virtual_column("Archive Note", "\"old\""),
        virtual_column("Related Lines", r#"REF_ROWS("Line", "Order")"#),
        ColumnRow {
            table_name: "Order".into(),
            column_name: "Status".into(),
            is_virtual: "No".into(),
            ..ColumnRow::default()
        },
    ];
    write_rows(dir.path().join("appsheet_columns.csv"), &columns).unwrap();
    std::fs::write(
        dir.path().join("unused_system_views.csv"),
        "view_name\nArchive\n",
    )
    .unwrap();

    let report = pipeline(dir.path()).run_orphans().unwrap();
    assert_eq!(report.value("virtual columns"), Some(3));
    assert_eq!(report.value("system-generated reverse references"), Some(1));
    assert_eq!(report.value("potential virtual column orphans"), Some(1));

    let path = ArtifactLayout::new(dir.path()).path(Artifact::VirtualColumnOrphans);
    let orphans: Vec<ColumnRow> = read_rows(&path).unwrap();
    assert_eq!(names(&orphans, |row| &row.column_name), vec!["Archive Note"]);
    assert_eq!(orphans[0].data_type, "Text");
    let header = std::fs::read_to_string(&path).unwrap();
    assert!(header.lines().next().unwrap().ends_with("\"is_orphan\",\"total_references\""));

    std::fs::write(dir.path().join("unused_system_views.csv"), "view_name\n").unwrap();
    let report = pipeline(dir.path()).run_orphans().unwrap();
    assert_eq!(report.value("potential virtual column orphans"), Some(0));
    assert!(!path.exists());
}
