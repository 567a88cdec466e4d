use geodelta_core::errors::{GdError, GdErrorKind, GeoDeltaError};
use geodelta_core::model::{EntityReference, ItemType, Location};
use geodelta_core_types::RequestId;

#[test]
fn test_duplicate_entity_verifiable_by_kind() {
    let err = GeoDeltaError::DuplicateEntity {
        item_type: ItemType::Edge,
        identifier: 12,
    };

    let gd_err: GdError = err.into();

    assert_eq!(gd_err.kind(), GdErrorKind::DuplicateEntity);
    assert_eq!(gd_err.code(), "ERR_DUPLICATE_ENTITY");
    assert_eq!(gd_err.entity(), Some("Edge 12"));
}

#[test]
fn test_dangling_reference_names_both_sides() {
    let err = GeoDeltaError::DanglingReference {
        relation: 3,
        member: EntityReference::new(ItemType::Area, 40),
    };

    let gd_err: GdError = err.into();

    assert_eq!(gd_err.kind(), GdErrorKind::DanglingReference);
    assert_eq!(gd_err.entity(), Some("Relation 3"));
    assert_eq!(gd_err.counterpart(), Some("Area 40"));
    assert!(gd_err.message().contains("missing member"));
}

#[test]
fn test_missing_endpoint_is_a_dangling_reference() {
    let err = GeoDeltaError::MissingEdgeEndpoint {
        edge: 8,
        end: "start",
        location: Location::new(1, 2),
    };

    let gd_err: GdError = err.into();

    assert_eq!(gd_err.kind(), GdErrorKind::DanglingReference);
    assert_eq!(gd_err.entity(), Some("Edge 8"));
    assert!(gd_err.message().contains("start"));
}

#[test]
fn test_consistency_violation_points_at_member_and_relation() {
    let err = GeoDeltaError::RelationConsistencyViolation {
        relation: 77,
        member: EntityReference::new(ItemType::Node, 5),
    };

    let gd_err: GdError = err.into();

    assert_eq!(gd_err.kind(), GdErrorKind::RelationConsistencyViolation);
    assert_eq!(gd_err.entity(), Some("Node 5"));
    assert_eq!(gd_err.counterpart(), Some("Relation 77"));
}

#[test]
fn test_invalid_score_maps_to_invalid_input() {
    let err = GeoDeltaError::InvalidScore {
        item_type: ItemType::Point,
        identifier: 1,
        score: 2.0,
    };

    let gd_err: GdError = err.into();

    assert_eq!(gd_err.kind(), GdErrorKind::InvalidInput);
    assert_eq!(gd_err.code(), "ERR_INVALID_INPUT");
    assert_eq!(gd_err.entity(), Some("Point 1"));
}

#[test]
fn test_serde_json_error_becomes_serialization() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();

    let gd_err = GdError::from(GeoDeltaError::from(parse_err));

    assert_eq!(gd_err.kind(), GdErrorKind::Serialization);
    assert_eq!(gd_err.code(), "ERR_SERIALIZATION");
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (GdErrorKind::ComparisonFailure, "ERR_COMPARISON_FAILURE"),
        (
            GdErrorKind::RelationConsistencyViolation,
            "ERR_RELATION_CONSISTENCY_VIOLATION",
        ),
        (GdErrorKind::RelationCycleOverflow, "ERR_RELATION_CYCLE_OVERFLOW"),
        (GdErrorKind::InvalidItemType, "ERR_INVALID_ITEM_TYPE"),
        (GdErrorKind::IllegalMemberMutation, "ERR_ILLEGAL_MEMBER_MUTATION"),
        (GdErrorKind::NotFound, "ERR_NOT_FOUND"),
        (GdErrorKind::Config, "ERR_CONFIG"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}

#[test]
fn test_context_builders_and_display() {
    let request_id = RequestId::from_string("req-1".to_string());
    let err = GdError::new(GdErrorKind::Io)
        .with_op("load_snapshot")
        .with_entity("shards/a.json")
        .with_message("permission denied")
        .with_request_id(request_id.clone());

    assert_eq!(err.op(), Some("load_snapshot"));
    assert_eq!(err.request_id(), Some(&request_id));
    assert_eq!(
        err.to_string(),
        "[ERR_IO] in operation 'load_snapshot': permission denied \
         (entity: shards/a.json) (request_id: req-1)"
    );
}

#[test]
fn test_source_chain_is_walkable() {
    let root = GdError::new(GdErrorKind::RelationConsistencyViolation).with_entity("Node 1");
    let middle = GdError::new(GdErrorKind::ComparisonFailure).with_source(root);
    let top = GdError::new(GdErrorKind::Io).with_source(middle);

    assert_eq!(
        top.source_error().map(GdError::kind),
        Some(GdErrorKind::ComparisonFailure)
    );
    assert_eq!(top.root_cause().entity(), Some("Node 1"));
    let std_source = std::error::Error::source(&top);
    assert!(std_source.is_some());
}
