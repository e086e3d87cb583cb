//! Contact configuration.

use dropsim_types::constants::DEFAULT_CONTACT_STIFFNESS_SCALE;
use dropsim_types::{DropError, DropResult};
use serde::{Deserialize, Serialize};

use crate::surface_type::SurfaceType;

/// Contact parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Hertz penalty coefficient `k_n` (Pa/m^1.5). `None` derives it
    /// from the softest material, see [`auto_stiffness`].
    pub stiffness: Option<f64>,
    /// Multiplier on the softest modulus for the automatic stiffness.
    pub stiffness_scale: f64,
    /// Normal damping pressure per unit approach speed (Pa·s/m).
    pub damping: f64,
    /// Friction coefficient. `None` uses the surface type's value for
    /// the ground and the same value between bodies.
    pub friction: Option<f64>,
    /// Slip speed below which friction ramps linearly to zero (m/s).
    pub friction_regularization: f64,
    /// Detect contact between separate bodies (ground contact is always on).
    pub inter_body: bool,
    /// Steps between spatial hash rebuilds.
    pub rebuild_interval: u32,
    /// Largest node-to-face penetration still treated as contact, as a
    /// fraction of the smallest element edge.
    pub max_depth_ratio: f64,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            stiffness: None,
            stiffness_scale: DEFAULT_CONTACT_STIFFNESS_SCALE,
            damping: 0.0,
            friction: None,
            friction_regularization: 1.0e-3,
            inter_body: true,
            rebuild_interval: 10,
            max_depth_ratio: 0.5,
        }
    }
}

impl ContactConfig {
    /// Frictionless, undamped contact.
    pub fn frictionless() -> Self {
        Self {
            friction: Some(0.0),
            ..Default::default()
        }
    }

    /// Validates the configuration.
    pub fn validate(&self) -> DropResult<()> {
        if let Some(k) = self.stiffness {
            if !k.is_finite() || k <= 0.0 {
                return Err(DropError::InvalidConfig(format!(
                    "contact stiffness must be positive, got {k}"
                )));
            }
        }
        if !self.stiffness_scale.is_finite() || self.stiffness_scale <= 0.0 {
            return Err(DropError::InvalidConfig(format!(
                "stiffness_scale must be positive, got {}",
                self.stiffness_scale
            )));
        }
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(DropError::InvalidConfig(format!(
                "contact damping must be non-negative, got {}",
                self.damping
            )));
        }
        if let Some(mu) = self.friction {
            if !mu.is_finite() || mu < 0.0 {
                return Err(DropError::InvalidConfig(format!(
                    "friction must be non-negative, got {mu}"
                )));
            }
        }
        if !self.friction_regularization.is_finite() || self.friction_regularization <= 0.0 {
            return Err(DropError::InvalidConfig(
                "friction_regularization must be positive".into(),
            ));
        }
        if self.rebuild_interval == 0 {
            return Err(DropError::InvalidConfig(
                "rebuild_interval must be at least 1".into(),
            ));
        }
        if !self.max_depth_ratio.is_finite() || self.max_depth_ratio <= 0.0 {
            return Err(DropError::InvalidConfig(format!(
                "max_depth_ratio must be positive, got {}",
                self.max_depth_ratio
            )));
        }
        Ok(())
    }

    /// Penalty coefficient for a mesh whose softest material has modulus
    /// `softest_modulus` and whose shortest element edge is `min_length`.
    pub fn resolve_stiffness(&self, softest_modulus: f64, surface: SurfaceType, min_length: f64) -> f64 {
        self.stiffness.unwrap_or_else(|| {
            auto_stiffness(softest_modulus, surface, min_length, self.stiffness_scale)
        })
    }
}

/// `scale · E_soft / L_min^1.5`, with `E_soft` the smaller of the
/// material and surface moduli.
///
/// ```
/// use dropsim_contact::{auto_stiffness, SurfaceType};
///
/// let k = auto_stiffness(1.0e6, SurfaceType::Rigid, 0.01, 10.0);
/// assert!((k / 1.0e10 - 1.0).abs() < 1e-12);
/// ```
pub fn auto_stiffness(softest_modulus: f64, surface: SurfaceType, min_length: f64, scale: f64) -> f64 {
    let soft = surface
        .modulus()
        .map_or(softest_modulus, |m| m.min(softest_modulus));
    scale * soft / min_length.powf(1.5)
}
