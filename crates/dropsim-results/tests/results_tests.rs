//! Integration tests for dropsim-results.

use std::sync::Arc;

use approx::assert_relative_eq;
use dropsim_contact::{ContactConfig, GroundPlane};
use dropsim_material::{Material, MaterialTable};
use dropsim_math::DVec3;
use dropsim_mesh::generators::{box_mesh, layered_box};
use dropsim_mesh::TetMesh;
use dropsim_results::{
    Cadence, FieldSnapshot, ResultRecorder, ResultsArtifact, SamplingConfig, SensorSet, SnapshotStore, TimeSeries,
};
use dropsim_solver::{DropSetup, Integrator, IntegratorStatus, Orientation, SolverConfig};
use dropsim_types::{DropError, MaterialId};

fn soft_table() -> Arc<MaterialTable> {
    Arc::new(MaterialTable::new(vec![Material::linear_elastic(1.0e6, 0.3, 1000.0)]))
}

fn falling_cube() -> Integrator {
    let mesh = box_mesh([2; 3], DVec3::splat(0.1), DVec3::new(0.0, 1.0, 0.0), MaterialId(0));
    let mut integrator = Integrator::new(Arc::new(mesh), soft_table(), SolverConfig::default().with_duration(0.01));
    integrator.initialize(DVec3::ZERO).unwrap();
    integrator
}

// ─── Sensor Tests ─────────────────────────────────────────────

#[test]
fn whole_body_sensor_covers_every_node() {
    let mesh = box_mesh([1; 3], DVec3::ONE, DVec3::ZERO, MaterialId(0));
    let sensor = SensorSet::whole_body(&mesh);
    assert_eq!(sensor.nodes.len(), 8);
    assert!(sensor.validate(mesh.node_count()).is_ok());
}

#[test]
fn material_sensor_selects_layer_nodes() {
    let mesh = layered_box([1, 1], [0.1, 0.1], DVec3::ZERO, &[0.0, 0.05, 0.06], &[MaterialId(0), MaterialId(1)])
        .unwrap();
    let sensor = SensorSet::from_material("product", &mesh, MaterialId(1));
    assert_eq!(sensor.nodes.len(), 8);
    assert!(sensor
        .nodes
        .iter()
        .all(|&n| mesh.position(n as usize).y >= 0.05 - 1e-12));
}

#[test]
fn sensor_validation_rejects_bad_sets() {
    assert!(SensorSet::new("empty", vec![]).validate(10).is_err());
    assert!(SensorSet::new("far", vec![3, 12]).validate(10).is_err());
}

// ─── Sampling Tests ───────────────────────────────────────────

#[test]
fn sampling_defaults_to_averaged_millisecond() {
    let config = SamplingConfig::default();
    assert_eq!(config.cadence, Cadence::Interval(1e-3));
    assert!(config.averaging);
    assert!(config.validate().is_ok());
}

#[test]
fn sampling_validation() {
    let zero_steps = SamplingConfig {
        cadence: Cadence::EverySteps(0),
        averaging: false,
    };
    assert!(zero_steps.validate().is_err());
    let negative = SamplingConfig {
        cadence: Cadence::Interval(-1.0),
        averaging: true,
    };
    assert!(negative.validate().is_err());
}

#[test]
fn raw_sampling_of_free_fall_reads_one_g() {
    let mut integrator = falling_cube();
    let sensor = SensorSet::whole_body(integrator.mesh());
    let mut recorder = ResultRecorder::new(vec![sensor], SamplingConfig::raw()).unwrap();
    integrator.run_with(&mut recorder).unwrap();

    let steps = integrator.state().unwrap().step as usize;
    let series = recorder.series().next().unwrap();
    assert_eq!(series.len(), steps);
    for (_, g) in series.in_g() {
        assert_relative_eq!(g, 1.0, max_relative = 1e-6);
    }
}

#[test]
fn averaged_sampling_of_free_fall_reads_one_g() {
    let mut integrator = falling_cube();
    let sensor = SensorSet::whole_body(integrator.mesh());
    let mut recorder = ResultRecorder::new(vec![sensor], SamplingConfig::default()).unwrap();
    integrator.run_with(&mut recorder).unwrap();

    let series = recorder.series().next().unwrap();
    assert!(series.len() >= 9 && series.len() <= 10, "{} samples", series.len());
    for (_, g) in series.in_g() {
        assert_relative_eq!(g, 1.0, max_relative = 1e-6);
    }
    let gaps: Vec<f64> = series.times.windows(2).map(|w| w[1] - w[0]).collect();
    for gap in gaps {
        assert!((gap - 1e-3).abs() < integrator.timestep().unwrap());
    }
}

#[test]
fn every_steps_cadence() {
    let mut integrator = falling_cube();
    let sensor = SensorSet::whole_body(integrator.mesh());
    let sampling = SamplingConfig {
        cadence: Cadence::EverySteps(5),
        averaging: false,
    };
    let mut recorder = ResultRecorder::new(vec![sensor], sampling).unwrap();
    integrator.run_with(&mut recorder).unwrap();
    let steps = integrator.state().unwrap().step as usize;
    assert_eq!(recorder.series().next().unwrap().len(), steps / 5);
}

#[test]
fn recorder_requires_a_sensor() {
    assert!(ResultRecorder::new(vec![], SamplingConfig::default()).is_err());
}

// ─── Peak Tests ───────────────────────────────────────────────

#[test]
fn peak_skips_non_finite_samples() {
    let mut series = TimeSeries::new("s");
    series.push(0.0, f64::NAN);
    series.push(0.1, 19.6133);
    let peak = series.peak().unwrap();
    assert_eq!(peak.index, 1);
    assert_relative_eq!(peak.peak_g, 2.0, max_relative = 1e-9);
    assert!(TimeSeries::new("empty").peak().is_none());
}

#[test]
fn averaging_lowers_the_impact_peak() {
    let mesh = box_mesh([2; 3], DVec3::splat(0.1), DVec3::ZERO, MaterialId(0));
    let placed = DropSetup::new(0.1, Orientation::FlatFace).place(&mesh).unwrap();
    let sensor = SensorSet::whole_body(&placed.mesh);

    let run = |sampling: SamplingConfig| {
        let mut integrator = Integrator::new(
            Arc::new(placed.mesh.clone()),
            soft_table(),
            SolverConfig::default().with_duration(0.02),
        )
        .with_contact(ContactConfig::default(), Some(GroundPlane::default()));
        integrator.initialize(placed.initial_velocity).unwrap();
        let mut recorder = ResultRecorder::new(vec![sensor.clone()], sampling).unwrap();
        integrator.run_with(&mut recorder).unwrap();
        recorder.peak().unwrap().peak_g
    };

    let raw = run(SamplingConfig::raw());
    let averaged = run(SamplingConfig::default());
    assert!(raw > 1.0);
    assert!(averaged > 1.0);
    assert!(averaged <= raw * (1.0 + 1e-9));
}

// ─── Snapshot Tests ───────────────────────────────────────────

#[test]
fn snapshots_are_captured_at_requested_times() {
    let mut integrator = falling_cube();
    let sensor = SensorSet::whole_body(integrator.mesh());
    let mut recorder = ResultRecorder::new(vec![sensor], SamplingConfig::default())
        .unwrap()
        .with_snapshot_times(vec![0.008, 0.002, 0.002, 5.0]);
    integrator.run_with(&mut recorder).unwrap();

    let store = recorder.snapshots();
    assert_eq!(store.len(), 2);
    let index = store.index();
    let dt = integrator.timestep().unwrap();
    assert!((index[0].time - 0.002).abs() <= dt);
    assert!((index[1].time - 0.008).abs() <= dt);

    let snapshot = store.get(1).unwrap();
    assert_eq!(snapshot.displacements.len(), integrator.mesh().node_count());
    assert_eq!(snapshot.von_mises.len(), integrator.mesh().element_count());
    // Rigid fall: displacement without stress.
    assert!(snapshot.max_displacement() > 1e-4);
    assert!(snapshot.von_mises.iter().all(|&s| s < 1e-3));
}

#[test]
fn snapshot_bytes_are_cached() {
    let mesh: TetMesh = box_mesh([1; 3], DVec3::splat(0.1), DVec3::ZERO, MaterialId(0));
    let mut integrator = Integrator::new(Arc::new(mesh), soft_table(), SolverConfig::default());
    integrator.initialize(DVec3::ZERO).unwrap();
    let snapshot = FieldSnapshot::capture(
        integrator.state().unwrap(),
        integrator.mesh(),
        integrator.elements(),
        integrator.materials(),
    )
    .unwrap();

    let mut store = SnapshotStore::new();
    let index = store.insert(&snapshot).unwrap();
    let first = store.bytes(index).unwrap().as_ptr();
    let second = store.bytes(index).unwrap().as_ptr();
    assert_eq!(first, second);
    assert_eq!(store.get(index).unwrap(), snapshot);
    assert!(store.get(7).is_err());
    assert_eq!(store.nearest(1.0).unwrap().index, 0);
}

// ─── Artifact Tests ───────────────────────────────────────────

#[test]
fn artifact_json_roundtrip() {
    let mut integrator = falling_cube();
    let sensor = SensorSet::whole_body(integrator.mesh());
    let mut recorder = ResultRecorder::new(vec![sensor], SamplingConfig::default()).unwrap();
    let status = integrator.run_with(&mut recorder).unwrap();
    let artifact = recorder.finish(status, None);

    assert_eq!(artifact.summary.status, IntegratorStatus::Completed);
    assert_relative_eq!(artifact.summary.peak_g, 1.0, max_relative = 1e-6);
    assert_eq!(artifact.summary.samples_used, artifact.series[0].len());

    let json = artifact.to_json().unwrap();
    assert!(json.contains("\"peak_g\""));
    assert!(json.contains("\"completed\""));
    let back = ResultsArtifact::from_json(&json).unwrap();
    assert_eq!(back.summary, artifact.summary);

    let summary: serde_json::Value = serde_json::from_str(&artifact.summary_json().unwrap()).unwrap();
    assert!(summary.get("error").is_none());
}

#[test]
fn diverged_run_keeps_partial_series() {
    let mut mesh = box_mesh([3, 2, 3], DVec3::new(0.3, 0.1, 0.3), DVec3::ZERO, MaterialId(0));
    mesh.fix_nodes_where(|p| p.y.abs() < 1e-12);
    let mesh = Arc::new(mesh);

    let mut sizing = Integrator::new(Arc::clone(&mesh), soft_table(), SolverConfig::default());
    sizing.initialize(DVec3::ZERO).unwrap();
    let dt = 1.5 * sizing.critical_timestep().unwrap();

    let config = SolverConfig::default().with_timestep(dt).with_duration(3000.0 * dt);
    let mut integrator = Integrator::new(Arc::clone(&mesh), soft_table(), config);
    integrator.initialize(DVec3::ZERO).unwrap();
    let sensor = SensorSet::whole_body(&mesh);
    let mut recorder = ResultRecorder::new(vec![sensor], SamplingConfig::raw()).unwrap();

    let err = integrator.run_with(&mut recorder).unwrap_err();
    assert!(matches!(err, DropError::Divergence { .. }));
    let artifact = recorder.finish(integrator.status(), Some(&err));
    assert_eq!(artifact.summary.status, IntegratorStatus::Diverged);
    assert!(artifact.summary.samples_used > 0);
    assert!(artifact.summary.error.unwrap().contains("diverged"));
}
