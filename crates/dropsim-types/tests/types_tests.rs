//! Integration tests for dropsim-types.

use dropsim_types::units::{inches_to_meters, pounds_to_kilograms, psi_to_pascals};
use dropsim_types::{DropError, ElementId, Length, LengthUnit, MaterialId, NodeId};

// ─── ID Tests ──────────────────────────────────────────────────

#[test]
fn node_id_index() {
    let id = NodeId(42);
    assert_eq!(id.index(), 42);
}

#[test]
fn element_id_index() {
    let id = ElementId(7);
    assert_eq!(id.index(), 7);
}

#[test]
fn material_id_from_u16() {
    let id: MaterialId = 3u16.into();
    assert_eq!(id.index(), 3);
}

#[test]
fn ids_are_serializable() {
    let id = NodeId(100);
    let json = serde_json::to_string(&id).unwrap();
    let deserialized: NodeId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, deserialized);
}

// ─── Unit Tests ───────────────────────────────────────────────

#[test]
fn thirty_inches_in_meters() {
    assert!((inches_to_meters(30.0) - 0.762).abs() < 1e-12);
    assert!((Length::inches(30.0).to_meters() - 0.762).abs() < 1e-12);
}

#[test]
fn length_defaults_to_meters() {
    let len: Length = serde_json::from_str(r#"{"value": 1.5}"#).unwrap();
    assert_eq!(len.unit, LengthUnit::Meters);
    assert_eq!(len.to_meters(), 1.5);
}

#[test]
fn imperial_conversions() {
    assert!((psi_to_pascals(15.0) - 103_421.36).abs() < 0.01);
    assert!((pounds_to_kilograms(5.0) - 2.267_961_85).abs() < 1e-9);
}

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn error_display() {
    let err = DropError::InvalidMesh("element 42 has zero volume".into());
    assert!(err.to_string().contains("zero volume"));
}

#[test]
fn divergence_display_carries_last_good_step() {
    let err = DropError::Divergence {
        last_good_step: 1_234,
        reason: "non-finite velocity".into(),
    };
    let msg = err.to_string();
    assert!(msg.contains("1234"));
    assert!(msg.contains("non-finite velocity"));
}

#[test]
fn material_failure_gains_element_context() {
    let err = DropError::material_failure("inverted element (J = -0.1)").at_element(17);
    assert!(err.to_string().contains("element 17"));
    assert!(err.is_terminal_for_job());
}

#[test]
fn input_errors_are_not_terminal() {
    assert!(!DropError::InvalidMesh("x".into()).is_terminal_for_job());
    assert!(!DropError::ResourceLimit("x".into()).is_terminal_for_job());
}
