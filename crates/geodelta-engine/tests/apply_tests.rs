//! Change-set application over documents
//!
//! ## Scenarios Covered
//!
//! 1. Base and change-set documents in, snapshot document out
//! 2. Failed application writes nothing
//! 3. Rejected documents name their file

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{tags, way_snapshot, write_snapshot, write_text};
use geodelta_core::atlas::{Atlas, SnapshotDocument};
use geodelta_core::config::DiffOptions;
use geodelta_core::diff::DiffEngine;
use geodelta_core::errors::GdErrorKind;
use geodelta_core::model::ItemType;
use geodelta_engine::apply_change_set;

const CHANGES: &str = r#"{
    "version": "7",
    "description": "retag and extend",
    "changes": [
        {
            "identifier": 100,
            "item_type": "EDGE",
            "action": "UPDATE",
            "geometry": {"polyline": [
                {"latitude": 0, "longitude": 0},
                {"latitude": 0, "longitude": 4},
                {"latitude": 0, "longitude": 10}
            ]},
            "tags": {"highway": "primary"}
        },
        {
            "identifier": 3,
            "item_type": "NODE",
            "action": "CREATE",
            "geometry": {"location": {"latitude": 0, "longitude": 20}},
            "tags": {"railway": "level_crossing"}
        },
        {
            "identifier": 50,
            "item_type": "RELATION",
            "action": "CREATE",
            "members": [
                {"reference": {"item_type": "EDGE", "identifier": 100}, "role": "route"},
                {"reference": {"item_type": "NODE", "identifier": 3}, "role": "stop"}
            ],
            "tags": {"type": "route"}
        }
    ]
}"#;

// S1: end to end

#[test]
fn test_scenario_01_applies_documents_and_writes_result() {
    // GIVEN a base snapshot and a change set on disk
    let tmp = tempfile::tempdir().unwrap();
    let base = way_snapshot("base", 5, "residential");
    let base_path = write_snapshot(tmp.path(), "base.json", &base);
    let changes_path = write_text(tmp.path(), "changes.json", CHANGES);
    let output_path = tmp.path().join("out").join("nested").join("result.json");

    // WHEN applying
    let summary = apply_change_set(&base_path, &changes_path, &output_path).unwrap();

    // THEN the result document exists and reloads to the same content
    assert_eq!(summary.output_path, output_path);
    let text = std::fs::read_to_string(&output_path).unwrap();
    let result = SnapshotDocument::from_json(&text)
        .unwrap()
        .into_atlas("")
        .unwrap();
    assert_eq!(result.name(), "base@7");
    assert_eq!(result.digest(), summary.digest);

    // AND each change landed
    let edge = result.edge(100).unwrap();
    assert_eq!(edge.tags, tags(&[("highway", "primary")]));
    assert_eq!(edge.polyline.len(), 3);
    assert!(result.node(3).is_some());
    assert_eq!(result.relation(50).unwrap().members.len(), 2);
    assert_eq!(summary.report.counts[&ItemType::Edge].updated, 1);
    assert_eq!(summary.report.counts[&ItemType::Relation].created, 1);

    // AND diffing base against the result finds exactly those changes
    let diffs = DiffEngine::new(&base, &result, DiffOptions::default())
        .generate()
        .unwrap();
    let found: Vec<(ItemType, i64, &str)> = diffs
        .iter()
        .map(|d| (d.item_type(), d.identifier(), d.diff_type().as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            (ItemType::Node, 3, "ADDED"),
            (ItemType::Relation, 50, "ADDED"),
            (ItemType::Edge, 100, "CHANGED"),
        ]
    );
}

#[test]
fn test_scenario_01_empty_change_set_keeps_digest() {
    let tmp = tempfile::tempdir().unwrap();
    let base = way_snapshot("base", 5, "residential");
    let base_path = write_snapshot(tmp.path(), "base.json", &base);
    let changes_path = write_text(tmp.path(), "changes.json", "{}");

    let summary =
        apply_change_set(&base_path, &changes_path, &tmp.path().join("same.json")).unwrap();

    assert_eq!(summary.digest, base.digest());
}

// S2: failures

#[test]
fn test_scenario_02_cycle_writes_nothing() {
    // GIVEN two created relations that contain each other
    let tmp = tempfile::tempdir().unwrap();
    let base_path = write_snapshot(
        tmp.path(),
        "base.json",
        &way_snapshot("base", 5, "residential"),
    );
    let changes_path = write_text(
        tmp.path(),
        "changes.json",
        r#"{"changes": [
            {"identifier": 1, "item_type": "RELATION", "action": "CREATE",
             "members": [{"reference": {"item_type": "RELATION", "identifier": 2}, "role": ""}]},
            {"identifier": 2, "item_type": "RELATION", "action": "CREATE",
             "members": [{"reference": {"item_type": "RELATION", "identifier": 1}, "role": ""}]}
        ]}"#,
    );
    let output_path = tmp.path().join("result.json");

    // WHEN applying THEN it fails and no output appears
    let err = apply_change_set(&base_path, &changes_path, &output_path).unwrap_err();
    assert_eq!(err.kind(), GdErrorKind::RelationCycleOverflow);
    assert!(!output_path.exists());
}

#[test]
fn test_scenario_02_missing_base_is_io() {
    let tmp = tempfile::tempdir().unwrap();
    let changes_path = write_text(tmp.path(), "changes.json", "{}");

    let err = apply_change_set(
        &tmp.path().join("absent.json"),
        &changes_path,
        &tmp.path().join("result.json"),
    )
    .unwrap_err();

    assert_eq!(err.kind(), GdErrorKind::Io);
}

// S3: rejected documents

#[test]
fn test_scenario_03_invalid_change_record_names_file() {
    let tmp = tempfile::tempdir().unwrap();
    let base_path = write_snapshot(
        tmp.path(),
        "base.json",
        &way_snapshot("base", 5, "residential"),
    );
    let changes_path = write_text(
        tmp.path(),
        "changes.json",
        r#"{"changes": [{"identifier": 9, "item_type": "RELATION", "action": "UPDATE",
            "geometry": {"location": {"latitude": 0, "longitude": 0}}}]}"#,
    );

    let err =
        apply_change_set(&base_path, &changes_path, &tmp.path().join("result.json")).unwrap_err();

    assert_eq!(err.kind(), GdErrorKind::IllegalMemberMutation);
    assert_eq!(err.op(), Some("load_change_set"));
    assert!(err.entity().is_some_and(|e| e.ends_with("changes.json")));
    assert_eq!(err.source_error().and_then(|s| s.entity()), Some("Relation 9"));
}
