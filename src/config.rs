//! Serialized constraint setup
//!
//! A `KusudamaConfig` is the plain-data form of a Kusudama, suitable for
//! rig files. Directions serialize as `[x, y, z]` arrays and angles are in
//! radians.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConstraintError, Result};
use crate::kusudama::Kusudama;
use crate::limit_cone::LimitCone;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitConeConfig {
    pub direction: Vec3,
    pub radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxialLimitsConfig {
    pub min_angle: f32,
    pub range: f32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KusudamaConfig {
    /// Path sequence, in order
    #[serde(default)]
    pub cones: Vec<LimitConeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axial_limits: Option<AxialLimitsConfig>,
    /// Defaults to true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientationally_constrained: Option<bool>,
    /// Defaults to whether `axial_limits` is present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axially_constrained: Option<bool>,
}

impl Kusudama {
    /// Build a constraint from its serialized form
    ///
    /// Every cone is validated before anything is built; a bad cone is
    /// reported with its position in `config.cones`.
    pub fn from_config(config: &KusudamaConfig) -> Result<Self> {
        let cones = config
            .cones
            .iter()
            .enumerate()
            .map(|(index, c)| {
                LimitCone::new(c.direction, c.radius).map_err(|e| ConstraintError::InvalidConfig {
                    index,
                    source: Box::new(e),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut k = Kusudama::new();
        if let Some(axial) = config.axial_limits {
            k.set_axial_limits(axial.min_angle, axial.range)?;
        }
        k.set_limit_cones(cones);
        k.set_orientationally_constrained(config.orientationally_constrained.unwrap_or(true));
        k.set_axially_constrained(config.axially_constrained.unwrap_or(config.axial_limits.is_some()));

        debug!(
            cones = k.limit_cones().len(),
            axial = k.is_axially_constrained(),
            orientational = k.is_orientationally_constrained(),
            "kusudama loaded from config"
        );
        Ok(k)
    }

    /// Serialized form; flags are always written out explicitly
    pub fn to_config(&self) -> KusudamaConfig {
        KusudamaConfig {
            cones: self
                .limit_cones()
                .iter()
                .map(|c| LimitConeConfig {
                    direction: c.control_point(),
                    radius: c.radius(),
                })
                .collect(),
            axial_limits: Some(AxialLimitsConfig {
                min_angle: self.min_axial_angle(),
                range: self.range_angle(),
            }),
            orientationally_constrained: Some(self.is_orientationally_constrained()),
            axially_constrained: Some(self.is_axially_constrained()),
        }
    }
}

impl TryFrom<&KusudamaConfig> for Kusudama {
    type Error = ConstraintError;

    fn try_from(config: &KusudamaConfig) -> Result<Self> {
        Kusudama::from_config(config)
    }
}
