//! Plan tiers and what each is entitled to.

use serde::{Deserialize, Serialize};

/// Subscription tier of the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Professional,
    Enterprise,
}

/// Limits and privileges attached to a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entitlements {
    /// Small jobs may run in the caller's process.
    pub allow_local: bool,
    /// Largest mesh accepted, in elements.
    pub max_elements: usize,
    pub gpu: bool,
    /// Wall-clock cap for one server job (s).
    pub wall_clock_limit: f64,
    /// Queue priority; higher runs first.
    pub priority: u32,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Free, PlanTier::Professional, PlanTier::Enterprise];

    pub fn entitlements(&self) -> Entitlements {
        match self {
            PlanTier::Free => Entitlements {
                allow_local: true,
                max_elements: 50_000,
                gpu: false,
                wall_clock_limit: 300.0,
                priority: 10,
            },
            PlanTier::Professional => Entitlements {
                allow_local: true,
                max_elements: 500_000,
                gpu: true,
                wall_clock_limit: 3_600.0,
                priority: 50,
            },
            PlanTier::Enterprise => Entitlements {
                allow_local: true,
                max_elements: 5_000_000,
                gpu: true,
                wall_clock_limit: 14_400.0,
                priority: 100,
            },
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Professional => "professional",
            PlanTier::Enterprise => "enterprise",
        }
    }
}

impl std::str::FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PlanTier::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown plan '{s}' (free, professional, enterprise)"))
    }
}
