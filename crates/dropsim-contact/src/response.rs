//! Contact response: penalty forces.

use dropsim_math::DVec3;

use crate::contact::{ContactPair, ContactSurface};

/// Summary of one response pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContactResult {
    /// Number of contacts that produced a force.
    pub active: u32,
    /// Deepest penetration among the contacts (m).
    pub max_penetration: f64,
    /// Sum of normal force magnitudes (N).
    pub total_normal_force: f64,
    /// Sum of normal force magnitudes against the ground (N).
    pub ground_normal_force: f64,
}

/// Trait for contact response strategies.
///
/// Responses add forces to `forces`; they never move nodes. Forces on
/// face nodes must balance the force on the penetrating node.
pub trait ContactResponse: Send + Sync {
    /// Accumulate contact forces for `contacts`.
    fn apply(&self, contacts: &[ContactPair], velocities: &[DVec3], forces: &mut [DVec3]) -> ContactResult;

    /// Returns the response strategy name.
    fn name(&self) -> &str;
}

/// Hertzian penalty law `F_n = k·A·δ^1.5`.
///
/// Force grows with the 3/2 power of penetration, as for elastic
/// contact of curved bodies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HertzPenalty {
    /// Penalty coefficient `k` (Pa/m^1.5).
    pub stiffness: f64,
    /// Damping pressure per unit approach speed (Pa·s/m).
    pub damping: f64,
    /// Coulomb coefficient against the ground.
    pub ground_friction: f64,
    /// Coulomb coefficient between bodies.
    pub body_friction: f64,
    /// Slip speed below which friction ramps linearly from zero (m/s).
    pub regularization: f64,
}

impl HertzPenalty {
    /// Frictionless, undamped penalty.
    pub fn new(stiffness: f64) -> Self {
        Self {
            stiffness,
            damping: 0.0,
            ground_friction: 0.0,
            body_friction: 0.0,
            regularization: 1.0e-3,
        }
    }

    /// Normal force magnitude for penetration `depth` over `area` while
    /// the surfaces approach at `approach_speed` (positive when closing).
    #[inline]
    pub fn normal_force(&self, depth: f64, area: f64, approach_speed: f64) -> f64 {
        let elastic = self.stiffness * area * depth.powf(1.5);
        (elastic + self.damping * area * approach_speed).max(0.0)
    }
}

impl ContactResponse for HertzPenalty {
    fn apply(&self, contacts: &[ContactPair], velocities: &[DVec3], forces: &mut [DVec3]) -> ContactResult {
        let mut result = ContactResult::default();

        for contact in contacts {
            let n = contact.normal;
            let node = contact.node as usize;

            let (surface_velocity, mu) = match contact.surface {
                ContactSurface::Ground => (DVec3::ZERO, self.ground_friction),
                ContactSurface::Face { nodes, .. } => {
                    let v = nodes
                        .iter()
                        .zip(contact.barycentric)
                        .map(|(&i, w)| velocities[i as usize] * w)
                        .sum::<DVec3>();
                    (v, self.body_friction)
                }
            };

            let relative = velocities[node] - surface_velocity;
            let normal_speed = relative.dot(n);
            let fn_mag = self.normal_force(contact.penetration_depth, contact.area, -normal_speed);
            if fn_mag <= 0.0 {
                continue;
            }

            let mut force = n * fn_mag;

            if mu > 0.0 {
                let slip = relative - n * normal_speed;
                let speed = slip.length();
                if speed > 0.0 {
                    let ramp = (speed / self.regularization).min(1.0);
                    force -= slip * (mu * fn_mag * ramp / speed);
                }
            }

            forces[node] += force;
            if let ContactSurface::Face { nodes, .. } = contact.surface {
                for (&i, w) in nodes.iter().zip(contact.barycentric) {
                    forces[i as usize] -= force * w;
                }
            } else {
                result.ground_normal_force += fn_mag;
            }

            result.active += 1;
            result.total_normal_force += fn_mag;
            result.max_penetration = result.max_penetration.max(contact.penetration_depth);
        }

        result
    }

    fn name(&self) -> &str {
        "hertz_penalty"
    }
}

/// No-op contact response.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullContactResponse;

impl ContactResponse for NullContactResponse {
    fn apply(&self, _contacts: &[ContactPair], _velocities: &[DVec3], _forces: &mut [DVec3]) -> ContactResult {
        ContactResult::default()
    }

    fn name(&self) -> &str {
        "null_contact_response"
    }
}
