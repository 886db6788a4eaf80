//! Bone constraint — the limit a solver attaches to one bone
//!
//! License: MIT
//! Author: Moroya Sakamoto

use tracing::trace;

use crate::error::Result;
use crate::joint::{Joint, Transform};
use crate::kusudama::{Kusudama, SnapOutcome};

/// Per-call record of which snaps moved the joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapReport {
    pub orientation: SnapOutcome,
    pub twist: SnapOutcome,
}

impl SnapReport {
    pub const UNCHANGED: Self = Self {
        orientation: SnapOutcome::Unchanged,
        twist: SnapOutcome::Unchanged,
    };

    pub fn is_changed(&self) -> bool {
        self.orientation.is_snapped() || self.twist.is_snapped()
    }
}

/// Joint limit attached to a bone
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BoneConstraint {
    /// Free joint
    #[default]
    Unconstrained,
    /// Cone-sequence swing limit plus twist window
    Kusudama(Kusudama),
}

impl BoneConstraint {
    /// Snap orientation, then twist
    ///
    /// `constraint_axes` serves as both the limiting and the twist frame.
    /// Frame errors are reported before anything moves.
    pub fn apply(
        &self,
        bone_direction: &Transform,
        to_set: &mut Joint,
        constraint_axes: &Transform,
    ) -> Result<SnapReport> {
        match self {
            BoneConstraint::Unconstrained => Ok(SnapReport::UNCHANGED),
            BoneConstraint::Kusudama(k) => {
                let orientation = k.set_axes_to_orientation_snap(bone_direction, to_set, constraint_axes)?;
                let twist = k.set_snap_to_twist_limit(to_set, constraint_axes)?;
                let report = SnapReport { orientation, twist };
                if report.is_changed() {
                    trace!(?report, "bone constraint applied");
                }
                Ok(report)
            }
        }
    }

    /// 1.0 for a free joint
    pub fn rotational_freedom(&self) -> f32 {
        match self {
            BoneConstraint::Unconstrained => 1.0,
            BoneConstraint::Kusudama(k) => k.get_rotational_freedom(),
        }
    }

    pub fn as_kusudama(&self) -> Option<&Kusudama> {
        match self {
            BoneConstraint::Kusudama(k) => Some(k),
            BoneConstraint::Unconstrained => None,
        }
    }

    pub fn as_kusudama_mut(&mut self) -> Option<&mut Kusudama> {
        match self {
            BoneConstraint::Kusudama(k) => Some(k),
            BoneConstraint::Unconstrained => None,
        }
    }
}

impl From<Kusudama> for BoneConstraint {
    fn from(k: Kusudama) -> Self {
        BoneConstraint::Kusudama(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::{FRAC_PI_2, FRAC_PI_4};
    use glam::{Quat, Vec3};

    fn shoulder() -> Kusudama {
        let mut k = Kusudama::new();
        k.add_limit_cone(Vec3::Y, 0.4).unwrap();
        k.set_axial_limits(0.0, FRAC_PI_2).unwrap();
        k.enable();
        k
    }

    #[test]
    fn test_unconstrained_is_noop() {
        let c = BoneConstraint::Unconstrained;
        let mut joint = Joint::root(Transform::from_rotation(Quat::from_rotation_z(2.0)));
        let before = joint;
        let report = c.apply(&joint.global(), &mut joint, &Transform::IDENTITY).unwrap();
        assert_eq!(report, SnapReport::UNCHANGED);
        assert_eq!(joint, before);
        assert_eq!(c.rotational_freedom(), 1.0);
    }

    #[test]
    fn test_apply_snaps_both() {
        let c = BoneConstraint::from(shoulder());
        let rot = Quat::from_rotation_z(-1.2) * Quat::from_rotation_y(3.0 * FRAC_PI_4);
        let mut joint = Joint::root(Transform::from_rotation(rot));
        let report = c.apply(&joint.global(), &mut joint, &Transform::IDENTITY).unwrap();
        assert!(report.orientation.is_snapped());
        assert!(report.is_changed());

        let heading = joint.global().rotation * Vec3::Y;
        assert!(heading.dot(Vec3::Y) >= 0.4f32.cos() - 1e-4);
    }

    #[test]
    fn test_apply_within_limits() {
        let c = BoneConstraint::from(shoulder());
        let mut joint = Joint::root(Transform::from_rotation(Quat::from_rotation_y(0.5)));
        let report = c.apply(&joint.global(), &mut joint, &Transform::IDENTITY).unwrap();
        assert!(!report.is_changed());
    }

    #[test]
    fn test_rotational_freedom_delegates() {
        let k = shoulder();
        let expected = k.get_rotational_freedom();
        let c = BoneConstraint::Kusudama(k);
        assert_eq!(c.rotational_freedom(), expected);
        assert!(c.as_kusudama().is_some());
    }

    #[test]
    fn test_edit_through_constraint() {
        let mut c = BoneConstraint::from(shoulder());
        if let Some(k) = c.as_kusudama_mut() {
            k.disable();
        }
        assert_eq!(c.rotational_freedom(), 1.0);
        assert!(BoneConstraint::default().as_kusudama().is_none());
    }
}
