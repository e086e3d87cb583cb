//! Integration tests for dropsim-solver.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use approx::assert_relative_eq;
use dropsim_compute::Backend;
use dropsim_contact::{ContactConfig, GroundPlane};
use dropsim_material::{Material, MaterialTable};
use dropsim_math::DVec3;
use dropsim_mesh::generators::box_mesh;
use dropsim_mesh::TetMesh;
use dropsim_solver::checkpoint::Checkpoint;
use dropsim_solver::mass::lumped_masses;
use dropsim_solver::{
    critical_timestep, DropSetup, ElementData, Integrator, IntegratorStatus, Orientation, SolverConfig,
    StepControl, StepView,
};
use dropsim_types::constants::STANDARD_GRAVITY;
use dropsim_types::{DropError, MaterialId};

fn soft_table() -> Arc<MaterialTable> {
    Arc::new(MaterialTable::new(vec![Material::linear_elastic(1.0e6, 0.3, 1000.0)]))
}

fn cube(cells: usize, size: f64, origin: DVec3) -> TetMesh {
    box_mesh([cells; 3], DVec3::splat(size), origin, MaterialId(0))
}

fn no_gravity() -> SolverConfig {
    SolverConfig {
        gravity: DVec3::ZERO,
        ..Default::default()
    }
}

fn ready(mesh: TetMesh, config: SolverConfig) -> Integrator {
    let mut integrator = Integrator::new(Arc::new(mesh), soft_table(), config);
    integrator.initialize(DVec3::ZERO).unwrap();
    integrator
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn config_presets_validate() {
    assert!(SolverConfig::default().validate().is_ok());
    assert!(SolverConfig::debug().validate().is_ok());
    assert!(SolverConfig::high_fidelity().validate().is_ok());
    assert!(SolverConfig::default().with_duration(0.0).validate().is_err());
    assert!(SolverConfig::default().with_timestep(-1e-6).validate().is_err());
    let reckless = SolverConfig {
        timestep_safety: 1.5,
        ..Default::default()
    };
    assert!(reckless.validate().is_err());
}

#[test]
fn config_toml_roundtrip() {
    let config = SolverConfig::high_fidelity().with_timestep(2e-7).with_backend(Backend::Parallel);
    let text = toml::to_string(&config).unwrap();
    let back: SolverConfig = toml::from_str(&text).unwrap();
    assert_eq!(back, config);
}

#[test]
fn config_toml_fills_missing_fields() {
    let config: SolverConfig = toml::from_str("duration = 0.02\nbackend = \"parallel\"\n").unwrap();
    assert_relative_eq!(config.duration, 0.02);
    assert_eq!(config.backend, Backend::Parallel);
    assert_eq!(config.timestep, None);
    assert_relative_eq!(config.gravity.y, -STANDARD_GRAVITY);
}

// ─── Element Kernel Tests ─────────────────────────────────────

#[test]
fn element_forces_sum_to_zero() {
    let mesh = cube(1, 0.1, DVec3::ZERO);
    let elements = ElementData::from_mesh(&mesh).unwrap();
    let material = Material::linear_elastic(2.0e11, 0.3, 7850.0);

    let positions: Vec<DVec3> = mesh
        .positions()
        .iter()
        .enumerate()
        .map(|(i, p)| *p * 1.02 + DVec3::new(0.001 * i as f64, -0.0005 * i as f64, 0.0002))
        .collect();

    for element in &elements {
        let forces = element.internal_forces(&positions, &material).unwrap();
        let sum: DVec3 = forces.iter().copied().sum();
        let scale = forces.iter().map(|f| f.length()).fold(0.0, f64::max);
        assert!(sum.length() < 1e-9 * scale, "residual {sum:?}");
    }
}

#[test]
fn undeformed_element_is_stress_free() {
    let mesh = cube(1, 0.1, DVec3::new(1.0, 2.0, 3.0));
    let elements = ElementData::from_mesh(&mesh).unwrap();
    let material = Material::linear_elastic(1.0e6, 0.3, 1000.0);
    let positions = mesh.positions();
    for element in &elements {
        let forces = element.internal_forces(&positions, &material).unwrap();
        assert!(forces.iter().all(|f| f.length() < 1e-6));
        assert!(element.strain_energy(&positions, &material).unwrap().abs() < 1e-12);
    }
}

#[test]
fn rigid_translation_leaves_forces_zero() {
    let mesh = cube(1, 0.1, DVec3::ZERO);
    let elements = ElementData::from_mesh(&mesh).unwrap();
    let material = Material::ogden(1.0e5, 3.5, 0.0, 32.0);
    let moved: Vec<DVec3> = mesh.positions().iter().map(|p| *p + DVec3::new(0.3, -1.0, 2.0)).collect();
    for element in &elements {
        let forces = element.internal_forces(&moved, &material).unwrap();
        assert!(forces.iter().all(|f| f.length() < 1e-6));
    }
}

#[test]
fn inverted_element_reports_material_failure() {
    let mesh = cube(1, 0.1, DVec3::ZERO);
    let elements = ElementData::from_mesh(&mesh).unwrap();
    let material = Material::linear_elastic(1.0e6, 0.3, 1000.0);
    let mirrored: Vec<DVec3> = mesh.positions().iter().map(|p| DVec3::new(-p.x, p.y, p.z)).collect();
    let err = elements[0].internal_forces(&mirrored, &material).unwrap_err();
    assert!(matches!(err, DropError::MaterialFailure { .. }));
}

// ─── Mass & Timestep Tests ────────────────────────────────────

#[test]
fn lumped_mass_matches_density_times_volume() {
    let mesh = cube(2, 0.1, DVec3::ZERO);
    let elements = ElementData::from_mesh(&mesh).unwrap();
    let masses = lumped_masses(mesh.node_count(), &elements, &soft_table()).unwrap();
    let total: f64 = masses.iter().sum();
    assert_relative_eq!(total, 1000.0 * 0.001, epsilon = 1e-12);
    assert!(masses.iter().all(|&m| m > 0.0));
}

#[test]
fn lumped_mass_is_idempotent() {
    let mesh = cube(2, 0.1, DVec3::ZERO);
    let elements = ElementData::from_mesh(&mesh).unwrap();
    let table = soft_table();
    let a = lumped_masses(mesh.node_count(), &elements, &table).unwrap();
    let b = lumped_masses(mesh.node_count(), &elements, &table).unwrap();
    assert_eq!(a, b);
}

#[test]
fn lumped_mass_rejects_unknown_material() {
    let mesh = box_mesh([1; 3], DVec3::splat(0.1), DVec3::ZERO, MaterialId(3));
    let elements = ElementData::from_mesh(&mesh).unwrap();
    assert!(lumped_masses(mesh.node_count(), &elements, &soft_table()).is_err());
}

#[test]
fn critical_timestep_matches_wave_transit() {
    let mesh = cube(1, 0.1, DVec3::ZERO);
    let elements = ElementData::from_mesh(&mesh).unwrap();
    let table = soft_table();
    let estimate = critical_timestep(&elements, &table).unwrap();

    // Kuhn tetrahedron with leg a: inscribed diameter a / (1 + √2).
    let diameter = 0.1 / (1.0 + 2f64.sqrt());
    let p_modulus: f64 = 1.0e6 * 0.7 / (1.3 * 0.4);
    let expected = diameter / (p_modulus / 1000.0).sqrt();
    assert_relative_eq!(estimate.critical, expected, max_relative = 1e-9);
}

#[test]
fn critical_timestep_is_set_by_the_stiffest_element() {
    let mut mesh = cube(1, 0.1, DVec3::ZERO);
    mesh.append(&box_mesh([1; 3], DVec3::splat(0.1), DVec3::new(1.0, 0.0, 0.0), MaterialId(1)));
    let table = MaterialTable::new(vec![
        Material::linear_elastic(1.0e6, 0.3, 1000.0),
        Material::linear_elastic(2.0e11, 0.3, 7850.0),
    ]);
    let elements = ElementData::from_mesh(&mesh).unwrap();
    let estimate = critical_timestep(&elements, &table).unwrap();
    assert!(estimate.controlling_element >= 6);
}

// ─── Drop Setup Tests ─────────────────────────────────────────

#[test]
fn flat_drop_touches_surface_with_impact_speed() {
    let mesh = cube(2, 0.05, DVec3::new(0.0, 1.0, 0.0));
    let setup = DropSetup::new(0.3048, Orientation::FlatFace);
    let placed = setup.place(&mesh).unwrap();

    let (min, _) = placed.mesh.bounding_box();
    assert!(min.y.abs() < 1e-12);
    assert_relative_eq!(placed.impact_speed, (2.0 * STANDARD_GRAVITY * 0.3048).sqrt());
    assert_relative_eq!(placed.initial_velocity.y, -placed.impact_speed);
    assert_relative_eq!(placed.mesh.total_volume(), mesh.total_volume(), max_relative = 1e-12);
}

#[test]
fn edge_drop_lands_on_an_edge() {
    let mesh = cube(1, 0.1, DVec3::ZERO);
    let placed = DropSetup::new(0.5, Orientation::Edge).place(&mesh).unwrap();
    let lowest = placed.mesh.positions().iter().filter(|p| p.y.abs() < 1e-9).count();
    assert_eq!(lowest, 2);
}

#[test]
fn corner_drop_lands_on_a_corner() {
    let mesh = cube(1, 0.1, DVec3::ZERO);
    let placed = DropSetup::new(0.5, Orientation::Corner).place(&mesh).unwrap();
    let lowest = placed.mesh.positions().iter().filter(|p| p.y.abs() < 1e-9).count();
    assert_eq!(lowest, 1);
    let (min, max) = placed.mesh.bounding_box();
    // Space diagonal stands vertical.
    assert_relative_eq!(max.y - min.y, 0.1 * 3f64.sqrt(), max_relative = 1e-9);
}

#[test]
fn drop_setup_rejects_negative_height() {
    let mesh = cube(1, 0.1, DVec3::ZERO);
    assert!(DropSetup::new(-1.0, Orientation::FlatFace).place(&mesh).is_err());
}

// ─── Lifecycle Tests ──────────────────────────────────────────

#[test]
fn step_before_initialize_is_invalid_state() {
    let mut integrator = Integrator::new(Arc::new(cube(1, 0.1, DVec3::ZERO)), soft_table(), no_gravity());
    assert_eq!(integrator.status(), IntegratorStatus::Uninitialized);
    assert!(matches!(integrator.step(), Err(DropError::InvalidState(_))));
    assert!(matches!(integrator.kinetic_energy(), Err(DropError::InvalidState(_))));
}

#[test]
fn initialize_twice_is_invalid_state() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity());
    assert_eq!(integrator.status(), IntegratorStatus::Initialized);
    assert!(matches!(integrator.initialize(DVec3::ZERO), Err(DropError::InvalidState(_))));
}

#[test]
fn initialize_rejects_missing_material() {
    let mesh = box_mesh([1; 3], DVec3::splat(0.1), DVec3::ZERO, MaterialId(2));
    let mut integrator = Integrator::new(Arc::new(mesh), soft_table(), no_gravity());
    assert!(integrator.initialize(DVec3::ZERO).is_err());
    assert_eq!(integrator.status(), IntegratorStatus::Uninitialized);
}

#[test]
fn pause_requires_running() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity());
    assert!(integrator.pause().is_err());
    integrator.step().unwrap();
    assert_eq!(integrator.status(), IntegratorStatus::Running);
    integrator.pause().unwrap();
    assert_eq!(integrator.status(), IntegratorStatus::Paused);
    integrator.resume().unwrap();
    assert_eq!(integrator.status(), IntegratorStatus::Running);
}

#[test]
fn run_completes_at_duration() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity().with_duration(0.002));
    let status = integrator.run().unwrap();
    assert_eq!(status, IntegratorStatus::Completed);
    let state = integrator.state().unwrap();
    assert!(state.time >= 0.002 - 1e-9);
    assert!(state.time < 0.002 + state.dt);
    assert!(matches!(integrator.run(), Err(DropError::InvalidState(_))));
    assert!(matches!(integrator.step(), Err(DropError::InvalidState(_))));
}

#[test]
fn observer_can_pause_and_run_continues() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity().with_duration(0.002));
    let mut pause_at_five = |view: &StepView<'_>| {
        if view.report.step == 5 {
            StepControl::Pause
        } else {
            StepControl::Continue
        }
    };
    assert_eq!(integrator.run_with(&mut pause_at_five).unwrap(), IntegratorStatus::Paused);
    assert_eq!(integrator.state().unwrap().step, 5);
    assert_eq!(integrator.run().unwrap(), IntegratorStatus::Completed);
}

#[test]
fn observer_stop_completes_early() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity().with_duration(1.0));
    let mut stop = |view: &StepView<'_>| {
        if view.report.step == 3 {
            StepControl::Stop
        } else {
            StepControl::Continue
        }
    };
    assert_eq!(integrator.run_with(&mut stop).unwrap(), IntegratorStatus::Completed);
    assert_eq!(integrator.state().unwrap().step, 3);
}

#[test]
fn cancel_token_stops_between_steps() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity().with_duration(1.0));
    let token = integrator.cancel_token();
    let mut cancel_at_ten = move |view: &StepView<'_>| {
        if view.report.step == 10 {
            token.store(true, Ordering::Relaxed);
        }
        StepControl::Continue
    };
    assert_eq!(integrator.run_with(&mut cancel_at_ten).unwrap(), IntegratorStatus::Cancelled);
    assert_eq!(integrator.state().unwrap().step, 10);
}

#[test]
fn cancel_from_initialized() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity());
    integrator.cancel().unwrap();
    assert_eq!(integrator.status(), IntegratorStatus::Cancelled);
    assert!(integrator.cancel_token().load(Ordering::Relaxed));
    assert!(integrator.cancel().is_err());
}

#[test]
fn status_transition_table() {
    use IntegratorStatus::*;
    assert!(Uninitialized.can_transition_to(Initialized));
    assert!(!Uninitialized.can_transition_to(Running));
    assert!(Running.can_transition_to(Diverged));
    assert!(Paused.can_transition_to(Running));
    assert!(!Paused.can_transition_to(Completed));
    for terminal in [Completed, Diverged, Failed, Cancelled] {
        assert!(terminal.is_terminal());
        assert!(!terminal.can_transition_to(Running));
    }
}

// ─── Energy & Momentum Tests ──────────────────────────────────

#[test]
fn free_fall_conserves_energy() {
    let config = SolverConfig::default().with_duration(0.1);
    let mut integrator = ready(cube(2, 0.1, DVec3::new(0.0, 1.0, 0.0)), config);
    let initial = integrator.kinetic_energy().unwrap() + integrator.potential_energy().unwrap();
    integrator.run().unwrap();

    let total = integrator.kinetic_energy().unwrap() + integrator.potential_energy().unwrap();
    assert!(integrator.kinetic_energy().unwrap() > 0.0);
    assert!(((total - initial) / initial).abs() < 1e-3, "drift {}", (total - initial) / initial);
    assert!(integrator.strain_energy().unwrap().abs() < 1e-9);
}

#[test]
fn free_fall_matches_kinematics() {
    let duration = 0.05;
    let config = SolverConfig::default().with_duration(duration);
    let mut integrator = ready(cube(1, 0.1, DVec3::new(0.0, 2.0, 0.0)), config);
    integrator.run().unwrap();
    let state = integrator.state().unwrap();
    let expected = 2.0 - 0.5 * STANDARD_GRAVITY * state.time * state.time;
    assert_relative_eq!(state.positions[0].y, expected, max_relative = 1e-9);
}

#[test]
fn head_on_collision_conserves_momentum() {
    let left = cube(2, 0.1, DVec3::ZERO);
    let right = cube(2, 0.1, DVec3::new(0.102, 0.0, 0.0));
    let split = left.node_count();
    let mesh = TetMesh::merge(&[left, right]);
    let velocities: Vec<DVec3> = (0..mesh.node_count())
        .map(|i| if i < split { DVec3::new(2.0, 0.0, 0.0) } else { DVec3::ZERO })
        .collect();

    let mut integrator = Integrator::new(Arc::new(mesh), soft_table(), no_gravity().with_duration(0.01))
        .with_contact(ContactConfig::frictionless(), None);
    integrator.initialize_with_velocities(velocities).unwrap();
    let before = integrator.total_momentum().unwrap();
    integrator.run().unwrap();
    let after = integrator.total_momentum().unwrap();

    assert!((after - before).length() < 0.02 * before.length());

    // The right cube was pushed.
    let state = integrator.state().unwrap();
    let right_momentum: f64 = (split..state.node_count())
        .map(|i| state.masses[i] * state.velocities[i].x)
        .sum();
    assert!(right_momentum > 0.1 * before.x);
}

// ─── Stability Tests ──────────────────────────────────────────

fn column() -> TetMesh {
    let mut mesh = box_mesh([3, 2, 3], DVec3::new(0.3, 0.1, 0.3), DVec3::ZERO, MaterialId(0));
    mesh.fix_nodes_where(|p| p.y.abs() < 1e-12);
    mesh
}

fn column_critical_step() -> f64 {
    ready(column(), SolverConfig::default()).critical_timestep().unwrap()
}

#[test]
fn timestep_below_critical_stays_bounded() {
    let dt = 0.99 * column_critical_step();
    let config = SolverConfig::default().with_timestep(dt).with_duration(3000.0 * dt);
    let mut integrator = ready(column(), config);
    assert_eq!(integrator.run().unwrap(), IntegratorStatus::Completed);

    let state = integrator.state().unwrap();
    assert!(state.max_speed() < 1.0);
    for (i, fixed) in state.fixed.iter().enumerate() {
        if *fixed {
            assert_eq!(state.velocities[i], DVec3::ZERO);
            assert_eq!(state.positions[i], integrator.mesh().position(i));
        }
    }
}

#[test]
fn timestep_above_critical_diverges() {
    let dt = 1.5 * column_critical_step();
    let config = SolverConfig::default().with_timestep(dt).with_duration(3000.0 * dt);
    let mut integrator = ready(column(), config);
    assert_relative_eq!(integrator.timestep().unwrap(), dt);

    let err = integrator.run().unwrap_err();
    match err {
        DropError::Divergence { last_good_step, .. } => {
            assert!(last_good_step < 3000);
            assert_eq!(integrator.state().unwrap().step, last_good_step + 1);
        }
        other => panic!("expected divergence, got {other}"),
    }
    assert_eq!(integrator.status(), IntegratorStatus::Diverged);
}

#[test]
fn material_failure_ends_run_as_failed() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity());
    let mut checkpoint = Checkpoint::from_bytes(&integrator.checkpoint().unwrap()).unwrap();
    for p in &mut checkpoint.state.positions {
        p.x = -p.x;
    }
    integrator.restore(&checkpoint.to_bytes().unwrap()).unwrap();

    let err = integrator.step().unwrap_err();
    assert!(matches!(err, DropError::MaterialFailure { element: Some(_), .. }));
    assert_eq!(integrator.status(), IntegratorStatus::Failed);
}

#[test]
fn inversion_after_stepping_is_divergence() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity());
    let mut checkpoint = Checkpoint::from_bytes(&integrator.checkpoint().unwrap()).unwrap();
    checkpoint.first_step = false;
    checkpoint.state.step = 5;
    for p in &mut checkpoint.state.positions {
        p.x = -p.x;
    }
    integrator.restore(&checkpoint.to_bytes().unwrap()).unwrap();

    match integrator.step().unwrap_err() {
        DropError::Divergence { last_good_step, reason } => {
            assert_eq!(last_good_step, 4);
            assert!(reason.contains("inverted"));
        }
        other => panic!("expected divergence, got {other}"),
    }
    assert_eq!(integrator.status(), IntegratorStatus::Diverged);
}

// ─── Ground Impact Tests ──────────────────────────────────────

#[test]
fn body_dropped_on_ground_rebounds() {
    let mesh = cube(2, 0.1, DVec3::ZERO);
    let placed = DropSetup::new(0.05, Orientation::FlatFace).place(&mesh).unwrap();
    let mut integrator = Integrator::new(Arc::new(placed.mesh), soft_table(), SolverConfig::default().with_duration(0.03))
        .with_contact(ContactConfig::default(), Some(GroundPlane::default()));
    integrator.initialize(placed.initial_velocity).unwrap();

    let mut saw_contact = false;
    let mut observe = |view: &StepView<'_>| {
        if view.report.contacts > 0 {
            saw_contact = true;
            assert!(view.report.ground_force > 0.0);
        }
        StepControl::Continue
    };
    integrator.run_with(&mut observe).unwrap();
    assert!(saw_contact);
    assert!(integrator.total_momentum().unwrap().y > 0.0);
}

// ─── Checkpoint Tests ─────────────────────────────────────────

#[test]
fn checkpoint_restore_reproduces_trajectory() {
    let config = SolverConfig::default().with_duration(0.01);
    let mesh = cube(2, 0.1, DVec3::new(0.0, 0.5, 0.0));
    let mut integrator = ready(mesh, config);

    let mut pause_at_ten = |view: &StepView<'_>| {
        if view.report.step == 10 {
            StepControl::Pause
        } else {
            StepControl::Continue
        }
    };
    integrator.run_with(&mut pause_at_ten).unwrap();
    let saved = integrator.checkpoint().unwrap();

    for _ in 0..10 {
        integrator.step().unwrap();
    }
    let reference = integrator.state().unwrap().clone();

    integrator.restore(&saved).unwrap();
    assert_eq!(integrator.status(), IntegratorStatus::Paused);
    assert_eq!(integrator.state().unwrap().step, 10);
    for _ in 0..10 {
        integrator.step().unwrap();
    }
    assert_eq!(integrator.state().unwrap(), &reference);
}

#[test]
fn restore_rejects_other_mesh() {
    let small = ready(cube(1, 0.1, DVec3::ZERO), no_gravity());
    let mut large = ready(cube(2, 0.1, DVec3::ZERO), no_gravity());
    let bytes = small.checkpoint().unwrap();
    assert!(matches!(large.restore(&bytes), Err(DropError::InvalidState(_))));
}

#[test]
fn restore_rejects_garbage() {
    let mut integrator = ready(cube(1, 0.1, DVec3::ZERO), no_gravity());
    assert!(matches!(integrator.restore(&[1, 2, 3]), Err(DropError::Serialization(_))));
}
