//! Kusudama — orientation constraint for one joint
//!
//! The allowed swing region is the union of an ordered sequence of limit
//! cones together with the tangent paths between consecutive cones. The
//! allowed twist is a window about the constraint's local Y axis, measured
//! from local Z.
//!
//! Setup happens through `&mut self` mutators, each of which refreshes the
//! derived tangent and freedom data before returning. Solving only reads.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use core::f32::consts::TAU;

use glam::{Quat, Vec3};
use tracing::{debug, trace};

use crate::error::{ConstraintError, FrameRole, Result};
use crate::joint::{Joint, Transform};
use crate::limit_cone::{BoundaryContact, LimitCone, BOUNDARY_EPSILON};
use crate::ray::Ray3;
use crate::swing_twist::{clamp_to_quadrance_angle, swing_twist, to_tau, twist_angle};

/// Outcome of classifying a direction against the allowed region
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointInLimits {
    /// Strictly inside; the normalized input
    Inside(Vec3),
    /// On the region boundary; the normalized input
    OnBoundary(Vec3),
    /// Outside; the nearest allowed direction found
    Rectified(Vec3),
}

impl PointInLimits {
    pub fn point(&self) -> Vec3 {
        match *self {
            PointInLimits::Inside(p) | PointInLimits::OnBoundary(p) | PointInLimits::Rectified(p) => p,
        }
    }

    /// 1 inside, 0 on the boundary, -1 rectified
    pub fn in_bounds(&self) -> f32 {
        match self {
            PointInLimits::Inside(_) => 1.0,
            PointInLimits::OnBoundary(_) => 0.0,
            PointInLimits::Rectified(_) => -1.0,
        }
    }

    /// True unless the point had to be moved
    pub fn is_in_bounds(&self) -> bool {
        !matches!(self, PointInLimits::Rectified(_))
    }
}

/// What a snap did to the joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SnapOutcome {
    /// Already within limits, or the limit is disabled
    Unchanged,
    /// Joint rotated; carries the global-frame correction applied
    Snapped(Quat),
}

impl SnapOutcome {
    pub fn is_snapped(&self) -> bool {
        matches!(self, SnapOutcome::Snapped(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Kusudama {
    limit_cones: Vec<LimitCone>,
    min_axial_angle: f32,
    range_angle: f32,
    twist_min_vec: Vec3,
    twist_center_vec: Vec3,
    twist_max_vec: Vec3,
    twist_center_rot: Quat,
    /// cos(range / 4): half the window as a quaternion half-angle
    twist_half_range_half_cos: f32,
    axially_constrained: bool,
    orientationally_constrained: bool,
    rotational_freedom: f32,
}

impl Default for Kusudama {
    fn default() -> Self {
        Self::new()
    }
}

impl Kusudama {
    /// No cones, full twist window, both limits disabled
    pub fn new() -> Self {
        let mut k = Self {
            limit_cones: Vec::new(),
            min_axial_angle: 0.0,
            range_angle: TAU,
            twist_min_vec: Vec3::Z,
            twist_center_vec: Vec3::Z,
            twist_max_vec: Vec3::Z,
            twist_center_rot: Quat::IDENTITY,
            twist_half_range_half_cos: 0.0,
            axially_constrained: false,
            orientationally_constrained: false,
            rotational_freedom: 1.0,
        };
        k.update_twist_basis();
        k.update_constraint();
        k
    }

    // ── Limit cones ────────────────────────────────────────────

    pub fn limit_cones(&self) -> &[LimitCone] {
        &self.limit_cones
    }

    /// Append a cone to the path sequence; returns its index
    pub fn add_limit_cone(&mut self, direction: Vec3, radius: f32) -> Result<usize> {
        let cone = LimitCone::new(direction, radius)?;
        self.limit_cones.push(cone);
        self.update_constraint();
        Ok(self.limit_cones.len() - 1)
    }

    /// Insert a cone before `index` (or at the end when `index == len`)
    pub fn insert_limit_cone(&mut self, index: usize, direction: Vec3, radius: f32) -> Result<()> {
        let len = self.limit_cones.len();
        if index > len {
            return Err(ConstraintError::ConeIndexOutOfRange { index, len });
        }
        let cone = LimitCone::new(direction, radius)?;
        self.limit_cones.insert(index, cone);
        self.update_constraint();
        Ok(())
    }

    pub fn remove_limit_cone(&mut self, index: usize) -> Result<LimitCone> {
        let len = self.limit_cones.len();
        if index >= len {
            return Err(ConstraintError::ConeIndexOutOfRange { index, len });
        }
        let removed = self.limit_cones.remove(index);
        self.update_constraint();
        Ok(removed)
    }

    /// Replace the direction and radius of an existing cone
    pub fn set_limit_cone(&mut self, index: usize, direction: Vec3, radius: f32) -> Result<()> {
        let len = self.limit_cones.len();
        if index >= len {
            return Err(ConstraintError::ConeIndexOutOfRange { index, len });
        }
        self.limit_cones[index] = LimitCone::new(direction, radius)?;
        self.update_constraint();
        Ok(())
    }

    pub fn set_limit_cones(&mut self, cones: Vec<LimitCone>) {
        self.limit_cones = cones;
        self.update_constraint();
    }

    pub fn clear_limit_cones(&mut self) {
        self.limit_cones.clear();
        self.update_constraint();
    }

    // ── Axial limits ──────────────────────────────────────────

    /// Allow twist from `min_angle` through `min_angle + range` about local Y
    ///
    /// Angles are measured from local Z. A range of τ or more never clamps.
    pub fn set_axial_limits(&mut self, min_angle: f32, range: f32) -> Result<()> {
        if !min_angle.is_finite() || !range.is_finite() {
            return Err(ConstraintError::NonFiniteAngle);
        }
        if range < 0.0 {
            return Err(ConstraintError::NegativeRange { range });
        }
        self.min_axial_angle = min_angle;
        self.range_angle = range;
        self.update_twist_basis();
        self.update_constraint();
        Ok(())
    }

    fn update_twist_basis(&mut self) {
        self.twist_min_vec = Quat::from_rotation_y(self.min_axial_angle) * Vec3::Z;
        self.twist_center_vec = Quat::from_rotation_y(self.range_angle / 2.0) * self.twist_min_vec;
        self.twist_max_vec = Quat::from_rotation_y(self.range_angle) * self.twist_min_vec;
        self.twist_center_rot = Quat::from_rotation_y(self.min_axial_angle + self.range_angle / 2.0);
        self.twist_half_range_half_cos = (self.range_angle / 4.0).cos();
    }

    pub fn min_axial_angle(&self) -> f32 {
        self.min_axial_angle
    }

    pub fn range_angle(&self) -> f32 {
        self.range_angle
    }

    pub fn twist_min_vec(&self) -> Vec3 {
        self.twist_min_vec
    }

    pub fn twist_center_vec(&self) -> Vec3 {
        self.twist_center_vec
    }

    pub fn twist_max_vec(&self) -> Vec3 {
        self.twist_max_vec
    }

    pub fn twist_center_rot(&self) -> Quat {
        self.twist_center_rot
    }

    // ── Enable / disable ──────────────────────────────────────

    pub fn is_axially_constrained(&self) -> bool {
        self.axially_constrained
    }

    pub fn is_orientationally_constrained(&self) -> bool {
        self.orientationally_constrained
    }

    pub fn is_enabled(&self) -> bool {
        self.axially_constrained || self.orientationally_constrained
    }

    pub fn enable_axial_limits(&mut self) {
        self.set_axially_constrained(true);
    }

    pub fn disable_axial_limits(&mut self) {
        self.set_axially_constrained(false);
    }

    pub fn toggle_axial_limits(&mut self) {
        self.set_axially_constrained(!self.axially_constrained);
    }

    pub fn enable_orientational_limits(&mut self) {
        self.set_orientationally_constrained(true);
    }

    pub fn disable_orientational_limits(&mut self) {
        self.set_orientationally_constrained(false);
    }

    pub fn toggle_orientational_limits(&mut self) {
        self.set_orientationally_constrained(!self.orientationally_constrained);
    }

    pub fn enable(&mut self) {
        self.axially_constrained = true;
        self.set_orientationally_constrained(true);
    }

    pub fn disable(&mut self) {
        self.axially_constrained = false;
        self.set_orientationally_constrained(false);
    }

    pub fn set_axially_constrained(&mut self, on: bool) {
        self.axially_constrained = on;
        self.update_rotational_freedom();
    }

    pub fn set_orientationally_constrained(&mut self, on: bool) {
        self.orientationally_constrained = on;
        self.update_rotational_freedom();
    }

    // ── Derived state ─────────────────────────────────────────

    /// Recompute tangent handles and rotational freedom
    ///
    /// Every mutator calls this; it is public for callers that edit cones
    /// through [`Kusudama::set_limit_cones`] in bulk and want to be explicit.
    pub fn update_constraint(&mut self) {
        self.update_tangent_radii();
        self.update_rotational_freedom();
        debug!(
            cones = self.limit_cones.len(),
            rotational_freedom = self.rotational_freedom,
            "updated kusudama constraint"
        );
    }

    fn update_tangent_radii(&mut self) {
        for i in 0..self.limit_cones.len() {
            let next = self.limit_cones.get(i + 1).copied();
            self.limit_cones[i].update_tangent_handles(next.as_ref());
        }
    }

    fn update_rotational_freedom(&mut self) {
        let axial = if self.axially_constrained {
            (self.range_angle / TAU).min(1.0)
        } else {
            1.0
        };
        let orientational = if self.orientationally_constrained && !self.limit_cones.is_empty() {
            let coverage: f32 = self.limit_cones.iter().map(|c| c.radius() * 2.0 / TAU).sum();
            coverage.min(1.0)
        } else {
            1.0
        };
        self.rotational_freedom = axial * orientational;
    }

    /// Rough fraction of rotation left unconstrained, in [0, 1]
    ///
    /// Overlapping cones are counted twice; this is a heuristic for solver
    /// weighting, not a measure.
    pub fn get_rotational_freedom(&self) -> f32 {
        self.rotational_freedom
    }

    // ── Queries ───────────────────────────────────────────────

    /// Classify a direction in the constraint's local frame, rectifying it
    /// to the nearest allowed direction when it falls outside.
    ///
    /// Inside any single cone is enough (union semantics). Otherwise the
    /// tangent paths between consecutive cones are checked, and the best
    /// boundary candidate over cones and paths is returned.
    pub fn get_local_point_in_limits(&self, in_point: Vec3) -> PointInLimits {
        let Some(point) = in_point.try_normalize() else {
            return PointInLimits::Inside(in_point);
        };
        if self.limit_cones.is_empty() {
            return PointInLimits::Inside(point);
        }

        let mut closest: Option<(Vec3, f32)> = None;
        let mut on_boundary = false;
        let consider = |candidate: Vec3, closest: &mut Option<(Vec3, f32)>| {
            let cos = candidate.dot(point);
            if closest.map_or(true, |(_, best)| cos > best) {
                *closest = Some((candidate, cos));
            }
        };

        for cone in &self.limit_cones {
            match cone.closest_to_cone(point) {
                BoundaryContact::Inside => return PointInLimits::Inside(point),
                BoundaryContact::OnBoundary(_) => on_boundary = true,
                BoundaryContact::Outside(p) => consider(p, &mut closest),
            }
        }

        for pair in self.limit_cones.windows(2) {
            match pair[0].get_on_great_tangent_triangle(&pair[1], point) {
                None => {}
                Some(BoundaryContact::Inside) => return PointInLimits::Inside(point),
                Some(BoundaryContact::OnBoundary(_)) => on_boundary = true,
                Some(BoundaryContact::Outside(p)) => {
                    if p.dot(point) >= 1.0 - BOUNDARY_EPSILON {
                        on_boundary = true;
                    } else {
                        consider(p, &mut closest);
                    }
                }
            }
        }

        if on_boundary {
            return PointInLimits::OnBoundary(point);
        }
        match closest {
            Some((p, _)) => PointInLimits::Rectified(p),
            None => PointInLimits::Inside(point),
        }
    }

    /// Nearest point on the path sequence through the cone control points
    ///
    /// `in_point` is mapped through `limiting_axes` first. With a single
    /// cone the path is just its control point.
    pub fn local_point_on_path_sequence(&self, in_point: Vec3, limiting_axes: &Transform) -> Vec3 {
        let point = limiting_axes.xform(in_point).normalize_or_zero();
        if self.limit_cones.len() == 1 {
            return self.limit_cones[0].control_point();
        }

        let mut result = point;
        let mut closest_dot = 0.0;
        for pair in self.limit_cones.windows(2) {
            let candidate = pair[0].get_closest_path_point(&pair[1], point);
            let dot = candidate.dot(point);
            if dot > closest_dot {
                result = candidate;
                closest_dot = dot;
            }
        }
        result
    }

    /// Bring the bone's heading back inside the cones
    ///
    /// The heading runs from the limiting axes' origin to the tip of
    /// `bone_direction`'s +Y axis. When it is out of bounds, `to_set` is
    /// rotated about its own origin by the shortest arc onto the rectified
    /// heading.
    pub fn set_axes_to_orientation_snap(
        &self,
        bone_direction: &Transform,
        to_set: &mut Joint,
        limiting_axes: &Transform,
    ) -> Result<SnapOutcome> {
        bone_direction.validate(FrameRole::BoneDirection)?;
        limiting_axes.validate(FrameRole::LimitingAxes)?;
        to_set.validate()?;

        if !self.orientationally_constrained || self.limit_cones.is_empty() {
            return Ok(SnapOutcome::Unchanged);
        }

        let bone_ray = Ray3::new(limiting_axes.origin, bone_direction.xform(Vec3::Y));
        let bone_tip = limiting_axes.to_local(bone_ray.p2);
        let PointInLimits::Rectified(in_limits) = self.get_local_point_in_limits(bone_tip) else {
            return Ok(SnapOutcome::Unchanged);
        };

        let constrained_ray = Ray3::new(bone_ray.p1, limiting_axes.to_global(in_limits));
        let (Some(from), Some(to)) = (
            bone_ray.heading().try_normalize(),
            constrained_ray.heading().try_normalize(),
        ) else {
            return Ok(SnapOutcome::Unchanged);
        };

        let correction = Quat::from_rotation_arc(from, to);
        to_set.rotate_local_with_global(correction);
        trace!(?from, ?to, "orientation snapped to limit cone boundary");
        Ok(SnapOutcome::Snapped(correction))
    }

    /// Clamp the joint's twist about local Y into the axial window
    ///
    /// The twist is measured relative to the window's center in the
    /// `twist_axes` frame. Only the twist factor changes; the swing factor
    /// is recomposed untouched.
    pub fn set_snap_to_twist_limit(&self, to_set: &mut Joint, twist_axes: &Transform) -> Result<SnapOutcome> {
        twist_axes.validate(FrameRole::TwistAxes)?;
        to_set.validate()?;

        if !self.axially_constrained {
            return Ok(SnapOutcome::Unchanged);
        }

        let global = to_set.global().rotation;
        let global_twist_center = twist_axes.rotation * self.twist_center_rot;
        let align_rot = global_twist_center.conjugate() * global;
        let (swing, twist) = swing_twist(align_rot, Vec3::Y);
        let clamped = clamp_to_quadrance_angle(twist, self.twist_half_range_half_cos);
        if clamped == twist {
            return Ok(SnapOutcome::Unchanged);
        }

        let new_global = (global_twist_center * (swing * clamped)).normalize();
        to_set.set_global_rotation(new_global);
        trace!(
            twist = twist_angle(twist, Vec3::Y),
            clamped = twist_angle(clamped, Vec3::Y),
            "twist clamped to axial window"
        );
        Ok(SnapOutcome::Snapped(new_global * global.conjugate()))
    }

    /// Live twist of `joint` about local Y relative to `twist_axes`, in [0, τ)
    ///
    /// Measured the same way as the axial window, so a joint whose twist
    /// sits exactly at the lower limit reports `min_axial_angle` (mod τ).
    pub fn current_twist_angle(&self, joint: &Joint, twist_axes: &Transform) -> Result<f32> {
        twist_axes.validate(FrameRole::TwistAxes)?;
        joint.validate()?;
        let align = twist_axes.rotation.conjugate() * joint.global().rotation;
        let (_, twist) = swing_twist(align, Vec3::Y);
        Ok(to_tau(twist_angle(twist, Vec3::Y)))
    }

    /// Set the joint's twist about local Y to `angle`, keeping its swing
    pub fn set_current_twist_angle(&self, joint: &mut Joint, twist_axes: &Transform, angle: f32) -> Result<()> {
        if !angle.is_finite() {
            return Err(ConstraintError::NonFiniteAngle);
        }
        twist_axes.validate(FrameRole::TwistAxes)?;
        joint.validate()?;
        let align = twist_axes.rotation.conjugate() * joint.global().rotation;
        let (swing, _) = swing_twist(align, Vec3::Y);
        let new_global = twist_axes.rotation * swing * Quat::from_rotation_y(angle);
        joint.set_global_rotation(new_global);
        Ok(())
    }

    /// Swing-twist split of `rotation` about `axis`; see [`swing_twist`]
    pub fn get_swing_twist(rotation: Quat, axis: Vec3) -> (Quat, Quat) {
        swing_twist(rotation, axis)
    }
}
