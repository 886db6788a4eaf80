//! Joint frames — rigid transforms and the caller-owned joint being limited
//!
//! The skeleton itself lives outside this crate. Constraint snapping only
//! needs a joint's local transform and the global transform of its parent,
//! plus a few reference frames, all passed in as plain values.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use core::ops::Mul;

use glam::{Quat, Vec3};

use crate::error::{ConstraintError, FrameRole, Result};

/// Tolerance on |rotation|² - 1 for a frame to count as rigid
const UNIT_TOLERANCE: f32 = 1e-3;

/// Rigid transform: rotate, then translate by `origin`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub rotation: Quat,
    pub origin: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self { rotation: Quat::IDENTITY, origin: Vec3::ZERO };

    pub const fn new(rotation: Quat, origin: Vec3) -> Self {
        Self { rotation, origin }
    }

    pub const fn from_rotation(rotation: Quat) -> Self {
        Self { rotation, origin: Vec3::ZERO }
    }

    pub const fn from_origin(origin: Vec3) -> Self {
        Self { rotation: Quat::IDENTITY, origin }
    }

    /// Map a point from this frame into the enclosing frame
    pub fn xform(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.origin
    }

    /// Same as [`Transform::xform`]; reads better next to `to_local`
    pub fn to_global(&self, point: Vec3) -> Vec3 {
        self.xform(point)
    }

    /// Map a point from the enclosing frame into this frame
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.conjugate() * (point - self.origin)
    }

    pub fn inverse(&self) -> Self {
        let rotation = self.rotation.conjugate();
        Self { rotation, origin: rotation * -self.origin }
    }

    pub fn is_finite(&self) -> bool {
        self.rotation.is_finite() && self.origin.is_finite()
    }

    /// Finite with a unit-length rotation
    pub fn is_rigid(&self) -> bool {
        self.is_finite() && (self.rotation.length_squared() - 1.0).abs() <= UNIT_TOLERANCE
    }

    pub(crate) fn validate(&self, role: FrameRole) -> Result<()> {
        if self.is_rigid() {
            Ok(())
        } else {
            Err(ConstraintError::InvalidFrame { role })
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Transform {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        Self {
            rotation: self.rotation * rhs.rotation,
            origin: self.xform(rhs.origin),
        }
    }
}

/// A joint as the solver hands it to a constraint
///
/// `local` is relative to the parent; `parent_global` is the parent's
/// global transform, `None` for a root joint (identity parent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Joint {
    pub local: Transform,
    pub parent_global: Option<Transform>,
}

impl Joint {
    pub const fn new(local: Transform, parent_global: Option<Transform>) -> Self {
        Self { local, parent_global }
    }

    pub const fn root(local: Transform) -> Self {
        Self { local, parent_global: None }
    }

    pub fn parent(&self) -> Transform {
        self.parent_global.unwrap_or(Transform::IDENTITY)
    }

    pub fn global(&self) -> Transform {
        self.parent() * self.local
    }

    /// Apply a global-frame rotation to this joint about its own origin
    ///
    /// The joint's global rotation becomes `rotation * global.rotation`;
    /// its origin does not move.
    pub fn rotate_local_with_global(&mut self, rotation: Quat) {
        let parent = self.parent().rotation;
        self.local.rotation = (parent.conjugate() * rotation * parent * self.local.rotation).normalize();
    }

    /// Replace the joint's global rotation, keeping its local origin
    pub fn set_global_rotation(&mut self, rotation: Quat) {
        self.local.rotation = (self.parent().rotation.conjugate() * rotation).normalize();
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.local.validate(FrameRole::Joint)?;
        match self.parent_global {
            Some(parent) => parent.validate(FrameRole::Joint),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::FRAC_PI_2;

    #[test]
    fn test_transform_round_trip() {
        let t = Transform::new(Quat::from_axis_angle(Vec3::Z, 0.7), Vec3::new(1.0, -2.0, 0.5));
        let p = Vec3::new(0.3, 0.4, 5.0);
        assert!(t.to_local(t.to_global(p)).abs_diff_eq(p, 1e-5));
        assert!(t.inverse().xform(t.xform(p)).abs_diff_eq(p, 1e-5));
    }

    #[test]
    fn test_transform_compose() {
        let parent = Transform::new(Quat::from_axis_angle(Vec3::Z, FRAC_PI_2), Vec3::new(1.0, 0.0, 0.0));
        let child = Transform::from_origin(Vec3::new(1.0, 0.0, 0.0));
        let global = parent * child;
        assert!(global.origin.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    }

    #[test]
    fn test_rigid_validation() {
        assert!(Transform::IDENTITY.is_rigid());
        let scaled = Transform::from_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 2.0));
        assert!(!scaled.is_rigid());
        let nan = Transform::from_origin(Vec3::new(f32::NAN, 0.0, 0.0));
        assert_eq!(
            nan.validate(FrameRole::LimitingAxes),
            Err(ConstraintError::InvalidFrame { role: FrameRole::LimitingAxes })
        );
    }

    #[test]
    fn test_joint_global() {
        let parent = Transform::new(Quat::from_axis_angle(Vec3::Y, 0.4), Vec3::new(0.0, 2.0, 0.0));
        let joint = Joint::new(Transform::from_origin(Vec3::new(0.0, 1.0, 0.0)), Some(parent));
        let g = joint.global();
        assert!(g.origin.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-5));
        assert!(g.rotation.abs_diff_eq(parent.rotation, 1e-6));
    }

    #[test]
    fn test_rotate_local_with_global() {
        let parent = Transform::new(Quat::from_axis_angle(Vec3::X, 0.9), Vec3::new(0.0, 1.0, 0.0));
        let local = Transform::new(Quat::from_axis_angle(Vec3::Z, 0.3), Vec3::new(0.0, 1.0, 0.0));
        let mut joint = Joint::new(local, Some(parent));
        let before = joint.global();
        let rot = Quat::from_axis_angle(Vec3::Y, 0.5);
        joint.rotate_local_with_global(rot);
        let after = joint.global();
        assert!(after.origin.abs_diff_eq(before.origin, 1e-5));
        assert!(after.rotation.abs_diff_eq(rot * before.rotation, 1e-5));
    }

    #[test]
    fn test_root_joint_uses_identity_parent() {
        let mut joint = Joint::root(Transform::IDENTITY);
        joint.set_global_rotation(Quat::from_axis_angle(Vec3::Y, 1.0));
        assert!(joint.local.rotation.abs_diff_eq(Quat::from_axis_angle(Vec3::Y, 1.0), 1e-6));
    }
}
