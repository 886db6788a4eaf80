//! Limit cone — one spherical cap of allowed swing directions
//!
//! A cone is a unit control point plus an angular radius. Consecutive
//! cones in a Kusudama are bridged by two tangent circles, each touching
//! both caps from outside. The spherical triangles `[A, T, B]` formed by
//! the two control points and a tangent circle center cover the region
//! between the cones; points inside a triangle but outside its tangent
//! circle are in bounds.
//!
//! All containment checks compare dot products against cached cosines.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use core::f32::consts::PI;

use glam::{Quat, Vec3};
use tracing::warn;

use crate::error::{ConstraintError, Result};
use crate::ray::Ray3;

/// Cosine tolerance for "exactly on the boundary"
pub const BOUNDARY_EPSILON: f32 = 1e-5;

/// Where a direction sits relative to a boundary
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryContact {
    /// Strictly inside; nothing to rectify
    Inside,
    /// On the boundary within tolerance; carries the input unchanged
    OnBoundary(Vec3),
    /// Outside; carries the nearest boundary point
    Outside(Vec3),
}

impl BoundaryContact {
    /// 1 inside, 0 on the boundary, -1 outside
    pub fn in_bounds(&self) -> f32 {
        match self {
            BoundaryContact::Inside => 1.0,
            BoundaryContact::OnBoundary(_) => 0.0,
            BoundaryContact::Outside(_) => -1.0,
        }
    }

    pub fn is_outside(&self) -> bool {
        matches!(self, BoundaryContact::Outside(_))
    }

    /// Boundary point, if the contact carries one
    pub fn point(&self) -> Option<Vec3> {
        match *self {
            BoundaryContact::Inside => None,
            BoundaryContact::OnBoundary(p) | BoundaryContact::Outside(p) => Some(p),
        }
    }
}

/// Tangent circles bridging a cone to its successor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TangentHandles {
    /// Center on the negative side of `A × B`
    pub center_1: Vec3,
    /// Center on the positive side of `A × B`
    pub center_2: Vec3,
    pub radius: f32,
    pub radius_cosine: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LimitCone {
    control_point: Vec3,
    radius: f32,
    radius_cosine: f32,
    tangent: Option<TangentHandles>,
}

impl LimitCone {
    /// Cone around `direction` (normalized here) with half-angle `radius`
    pub fn new(direction: Vec3, radius: f32) -> Result<Self> {
        let control_point = validate_direction(direction)?;
        let radius = validate_radius(radius)?;
        Ok(Self {
            control_point,
            radius,
            radius_cosine: radius.cos(),
            tangent: None,
        })
    }

    pub fn control_point(&self) -> Vec3 {
        self.control_point
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn radius_cosine(&self) -> f32 {
        self.radius_cosine
    }

    /// Tangent data toward the successor; `None` for the last cone or a degenerate pair
    pub fn tangent_handles(&self) -> Option<&TangentHandles> {
        self.tangent.as_ref()
    }

    /// Recompute the tangent circles shared with `next`
    ///
    /// The tangent radius is `(π - r_a - r_b) / 2`, so two touching cones get
    /// tangent circles of radius zero and two point cones get quarter turns.
    /// Each center sits at `r_a + t` from this control point and `r_b + t`
    /// from the next one: the line where those two planes meet, cut by the
    /// unit sphere.
    pub fn update_tangent_handles(&mut self, next: Option<&LimitCone>) {
        self.tangent = match next {
            None => None,
            Some(next) => {
                let handles = self.compute_tangent_handles(next);
                if handles.is_none() {
                    warn!(
                        control_point = ?self.control_point,
                        next_control_point = ?next.control_point,
                        "degenerate limit cone pair, no tangent path between them"
                    );
                }
                handles
            }
        };
    }

    fn compute_tangent_handles(&self, next: &LimitCone) -> Option<TangentHandles> {
        let a = self.control_point;
        let b = next.control_point;
        let tangent_radius = (PI - (self.radius + next.radius)) / 2.0;
        if tangent_radius <= 0.0 {
            return None;
        }

        let arc_normal = a.cross(b);
        let normal_len_sq = arc_normal.length_squared();
        if normal_len_sq < 1e-10 {
            return None;
        }

        let cos_a = (self.radius + tangent_radius).cos();
        let cos_b = (next.radius + tangent_radius).cos();
        let on_line = (b.cross(arc_normal) * cos_a + arc_normal.cross(a) * cos_b) / normal_len_sq;
        let line = Ray3::new(on_line, on_line + arc_normal);
        let (first, second) = line.intersects_sphere(Vec3::ZERO, 1.0).points()?;

        let (center_1, center_2) = if first.dot(arc_normal) <= second.dot(arc_normal) {
            (first, second)
        } else {
            (second, first)
        };
        Some(TangentHandles {
            center_1: center_1.try_normalize()?,
            center_2: center_2.try_normalize()?,
            radius: tangent_radius,
            radius_cosine: tangent_radius.cos(),
        })
    }

    /// Nearest point on this cone's boundary to the unit direction `input`
    pub fn closest_to_cone(&self, input: Vec3) -> BoundaryContact {
        let cos = input.dot(self.control_point);
        if cos > self.radius_cosine + BOUNDARY_EPSILON {
            BoundaryContact::Inside
        } else if cos >= self.radius_cosine - BOUNDARY_EPSILON {
            BoundaryContact::OnBoundary(input)
        } else {
            BoundaryContact::Outside(rotate_toward(self.control_point, input, self.radius))
        }
    }

    /// Classify `input` against the tangent triangles shared with `next`
    ///
    /// `None` when the input is in neither triangle, or this cone has no
    /// tangent data. Inside a triangle, the tangent circle is the forbidden
    /// part: points within it are pushed out to its rim.
    pub fn get_on_great_tangent_triangle(&self, next: &LimitCone, input: Vec3) -> Option<BoundaryContact> {
        let tangent = self.tangent.as_ref()?;
        let center = self.triangle_center(next, tangent, input)?;

        let to_center_cos = input.dot(center);
        if to_center_cos > tangent.radius_cosine + BOUNDARY_EPSILON {
            Some(BoundaryContact::Outside(rotate_toward(center, input, tangent.radius)))
        } else if to_center_cos >= tangent.radius_cosine - BOUNDARY_EPSILON {
            Some(BoundaryContact::OnBoundary(input))
        } else {
            Some(BoundaryContact::Inside)
        }
    }

    /// Point on the path between this cone and `next` nearest to `input`
    ///
    /// Inside a tangent triangle this is the input projected from the tangent
    /// center onto the great arc between the control points; elsewhere it is
    /// whichever control point is closer.
    pub fn get_closest_path_point(&self, next: &LimitCone, input: Vec3) -> Vec3 {
        self.get_on_path_sequence(next, input)
            .unwrap_or_else(|| self.closest_cone(next, input))
    }

    /// Projection of `input` onto the great arc `A`-`B`, through the tangent center
    pub fn get_on_path_sequence(&self, next: &LimitCone, input: Vec3) -> Option<Vec3> {
        let tangent = self.tangent.as_ref()?;
        let center = self.triangle_center(next, tangent, input)?;
        let through_input = Ray3::new(center, input);
        through_input
            .intersects_plane(Vec3::ZERO, self.control_point, next.control_point)
            .try_normalize()
    }

    /// Control point of this cone or `next`, whichever is closer to `input`
    pub fn closest_cone(&self, next: &LimitCone, input: Vec3) -> Vec3 {
        if input.dot(self.control_point) > input.dot(next.control_point) {
            self.control_point
        } else {
            next.control_point
        }
    }

    /// Nearest boundary point over this cone and `next`, ignoring the path between them
    pub fn closest_point_on_closest_cone(&self, next: &LimitCone, input: Vec3) -> BoundaryContact {
        let first = self.closest_to_cone(input);
        if first == BoundaryContact::Inside {
            return first;
        }
        let second = next.closest_to_cone(input);
        if second == BoundaryContact::Inside {
            return second;
        }
        match (first.point(), second.point()) {
            (Some(a), Some(b)) if input.dot(b) > input.dot(a) => second,
            _ => first,
        }
    }

    /// Tangent-triangle classification, falling back to the two cones
    pub fn get_closest_collision(&self, next: &LimitCone, input: Vec3) -> BoundaryContact {
        self.get_on_great_tangent_triangle(next, input)
            .unwrap_or_else(|| self.closest_point_on_closest_cone(next, input))
    }

    /// Whether `input` lies in this cone, in `next`, or on the path between them
    ///
    /// `input` must be unit length.
    pub fn determine_if_in_bounds(&self, next: Option<&LimitCone>, input: Vec3) -> bool {
        if self.control_point.dot(input) >= self.radius_cosine {
            return true;
        }
        let Some(next) = next else {
            return false;
        };
        if next.control_point.dot(input) >= next.radius_cosine {
            return true;
        }
        let Some(tangent) = self.tangent.as_ref() else {
            return false;
        };
        if tangent.center_1.dot(input) > tangent.radius_cosine
            || tangent.center_2.dot(input) > tangent.radius_cosine
        {
            return false;
        }
        self.triangle_center(next, tangent, input).is_some()
    }

    /// The two `[A, T, B]` triangles bridging this cone and `next`
    pub fn tangent_triangles(&self, next: &LimitCone) -> Option<[[Vec3; 3]; 2]> {
        let tangent = self.tangent.as_ref()?;
        let a = self.control_point;
        let b = next.control_point;
        Some([[a, tangent.center_1, b], [a, tangent.center_2, b]])
    }

    /// Tangent center of the triangle containing `input`, if any
    ///
    /// The side of the `A`-`B` great circle picks the candidate triangle;
    /// two half-space tests against its edges decide containment.
    fn triangle_center(&self, next: &LimitCone, tangent: &TangentHandles, input: Vec3) -> Option<Vec3> {
        let a = self.control_point;
        let b = next.control_point;
        if input.dot(a.cross(b)) < 0.0 {
            let t1 = tangent.center_1;
            let inside = input.dot(a.cross(t1)) > 0.0 && input.dot(t1.cross(b)) > 0.0;
            inside.then_some(t1)
        } else {
            let t2 = tangent.center_2;
            let inside = input.dot(t2.cross(a)) > 0.0 && input.dot(b.cross(t2)) > 0.0;
            inside.then_some(t2)
        }
    }
}

/// Rotate unit `from` by `angle` along the great circle toward `toward`
///
/// An antipodal `toward` leaves the plane unspecified; any axis orthogonal
/// to `from` is used.
pub(crate) fn rotate_toward(from: Vec3, toward: Vec3, angle: f32) -> Vec3 {
    let axis = from
        .cross(toward)
        .try_normalize()
        .unwrap_or_else(|| from.any_orthonormal_vector());
    Quat::from_axis_angle(axis, angle) * from
}

fn validate_direction(direction: Vec3) -> Result<Vec3> {
    if !direction.is_finite() {
        return Err(ConstraintError::NonFiniteDirection);
    }
    direction.try_normalize().ok_or(ConstraintError::ZeroDirection)
}

fn validate_radius(radius: f32) -> Result<f32> {
    if (0.0..=PI).contains(&radius) {
        Ok(radius)
    } else {
        Err(ConstraintError::RadiusOutOfRange { radius })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Two 0.2 rad cones on +X and +Y; tangent centers land on -Z and +Z
    fn separated_pair() -> (LimitCone, LimitCone) {
        let mut a = LimitCone::new(Vec3::X, 0.2).unwrap();
        let b = LimitCone::new(Vec3::Y, 0.2).unwrap();
        a.update_tangent_handles(Some(&b));
        (a, b)
    }

    #[test]
    fn test_new_normalizes_and_caches_cosine() {
        let c = LimitCone::new(Vec3::new(0.0, 3.0, 4.0), 0.5).unwrap();
        assert!(c.control_point().abs_diff_eq(Vec3::new(0.0, 0.6, 0.8), 1e-6));
        assert_abs_diff_eq!(c.radius_cosine(), 0.5f32.cos(), epsilon = 1e-7);
        assert!(c.tangent_handles().is_none());
    }

    #[test]
    fn test_new_rejects_bad_input() {
        assert_eq!(LimitCone::new(Vec3::ZERO, 0.5), Err(ConstraintError::ZeroDirection));
        assert_eq!(
            LimitCone::new(Vec3::new(f32::NAN, 1.0, 0.0), 0.5),
            Err(ConstraintError::NonFiniteDirection)
        );
        assert_eq!(
            LimitCone::new(Vec3::Y, -0.1),
            Err(ConstraintError::RadiusOutOfRange { radius: -0.1 })
        );
        assert!(LimitCone::new(Vec3::Y, 4.0).is_err());
    }

    #[test]
    fn test_closest_to_cone_inside() {
        let c = LimitCone::new(Vec3::Y, 0.3).unwrap();
        let p = Quat::from_axis_angle(Vec3::Z, 0.1) * Vec3::Y;
        let contact = c.closest_to_cone(p);
        assert_eq!(contact, BoundaryContact::Inside);
        assert_eq!(contact.in_bounds(), 1.0);
    }

    #[test]
    fn test_closest_to_cone_on_boundary() {
        let c = LimitCone::new(Vec3::Y, 0.3).unwrap();
        let p = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 1.0).normalize(), 0.3) * Vec3::Y;
        let contact = c.closest_to_cone(p);
        assert_eq!(contact.in_bounds(), 0.0);
        assert_eq!(contact.point(), Some(p));
    }

    #[test]
    fn test_closest_to_cone_outside() {
        let c = LimitCone::new(Vec3::Y, 0.3).unwrap();
        let contact = c.closest_to_cone(Vec3::X);
        assert!(contact.in_bounds() < 0.0);
        let p = contact.point().unwrap();
        assert!(p.abs_diff_eq(Vec3::new(0.3f32.sin(), 0.3f32.cos(), 0.0), 1e-5));
        assert_abs_diff_eq!(p.dot(c.control_point()), c.radius_cosine(), epsilon = 1e-5);
    }

    #[test]
    fn test_closest_to_cone_antipodal_input() {
        let c = LimitCone::new(Vec3::Y, 0.4).unwrap();
        let p = c.closest_to_cone(-Vec3::Y).point().unwrap();
        assert!(p.is_finite());
        assert_abs_diff_eq!(p.dot(Vec3::Y), 0.4f32.cos(), epsilon = 1e-5);
    }

    #[test]
    fn test_tangent_handles_geometry() {
        let mut a = LimitCone::new(Vec3::Y, 0.3).unwrap();
        let b = LimitCone::new(Vec3::new(0.3, 0.95, 0.0), 0.2).unwrap();
        a.update_tangent_handles(Some(&b));
        let t = *a.tangent_handles().unwrap();

        assert_abs_diff_eq!(t.radius, (PI - 0.5) / 2.0, epsilon = 1e-6);
        let normal = a.control_point().cross(b.control_point());
        for (center, side) in [(t.center_1, -1.0f32), (t.center_2, 1.0)] {
            assert_abs_diff_eq!(center.length(), 1.0, epsilon = 1e-5);
            assert_abs_diff_eq!(center.dot(a.control_point()), (0.3 + t.radius).cos(), epsilon = 1e-4);
            assert_abs_diff_eq!(center.dot(b.control_point()), (0.2 + t.radius).cos(), epsilon = 1e-4);
            assert!(center.dot(normal) * side > 0.0);
        }
    }

    #[test]
    fn test_tangent_handles_cleared_without_successor() {
        let (mut a, _) = separated_pair();
        assert!(a.tangent_handles().is_some());
        a.update_tangent_handles(None);
        assert!(a.tangent_handles().is_none());
    }

    #[test]
    fn test_tangent_handles_degenerate_pairs() {
        let mut a = LimitCone::new(Vec3::Y, 0.3).unwrap();
        let same = LimitCone::new(Vec3::Y, 0.2).unwrap();
        a.update_tangent_handles(Some(&same));
        assert!(a.tangent_handles().is_none());

        let wide = LimitCone::new(Vec3::X, 2.0).unwrap();
        a.update_tangent_handles(Some(&wide));
        assert!(a.tangent_handles().is_none());

        let mut big = LimitCone::new(Vec3::Y, 1.0).unwrap();
        let nested = LimitCone::new(Vec3::new(0.1, 1.0, 0.0), 0.2).unwrap();
        big.update_tangent_handles(Some(&nested));
        assert!(big.tangent_handles().is_none());
    }

    #[test]
    fn test_separated_pair_centers() {
        let (a, _) = separated_pair();
        let t = a.tangent_handles().unwrap();
        assert!(t.center_1.abs_diff_eq(-Vec3::Z, 1e-4));
        assert!(t.center_2.abs_diff_eq(Vec3::Z, 1e-4));
    }

    #[test]
    fn test_great_tangent_triangle_between_cones() {
        let (a, b) = separated_pair();
        let mid = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert_eq!(a.get_on_great_tangent_triangle(&b, mid), Some(BoundaryContact::Inside));
    }

    #[test]
    fn test_great_tangent_triangle_inside_tangent_circle() {
        let (a, b) = separated_pair();
        let t = *a.tangent_handles().unwrap();
        let input = Vec3::new(0.1, 0.1, 1.0).normalize();
        let contact = a.get_on_great_tangent_triangle(&b, input).unwrap();
        let p = contact.point().unwrap();
        assert!(contact.is_outside());
        assert_abs_diff_eq!(p.dot(t.center_2), t.radius_cosine, epsilon = 1e-5);
        // pushed straight away from the tangent center, same azimuth as the input
        assert_abs_diff_eq!(p.x, p.y, epsilon = 1e-5);

        let again = a.get_on_great_tangent_triangle(&b, p).unwrap();
        assert_eq!(again.in_bounds(), 0.0);
    }

    #[test]
    fn test_great_tangent_triangle_not_applicable() {
        let (a, b) = separated_pair();
        assert!(a.get_on_great_tangent_triangle(&b, -Vec3::X).is_none());
        let lone = LimitCone::new(Vec3::X, 0.2).unwrap();
        assert!(lone.get_on_great_tangent_triangle(&b, Vec3::new(1.0, 1.0, 0.0).normalize()).is_none());
    }

    #[test]
    fn test_closest_path_point_projects_onto_arc() {
        let (a, b) = separated_pair();
        let expected = Vec3::new(1.0, 1.0, 0.0).normalize();
        let above = a.get_closest_path_point(&b, Vec3::new(1.0, 1.0, 0.5).normalize());
        assert!(above.abs_diff_eq(expected, 1e-5));
        let below = a.get_closest_path_point(&b, Vec3::new(1.0, 1.0, -0.5).normalize());
        assert!(below.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn test_closest_path_point_falls_back_to_control_point() {
        let (a, b) = separated_pair();
        let p = a.get_closest_path_point(&b, Vec3::new(1.0, -0.2, 0.0).normalize());
        assert_eq!(p, a.control_point());
        let p = a.get_closest_path_point(&b, Vec3::new(-0.2, 1.0, 0.0).normalize());
        assert_eq!(p, b.control_point());
    }

    #[test]
    fn test_closest_point_on_closest_cone() {
        let (a, b) = separated_pair();
        let contact = a.closest_point_on_closest_cone(&b, Vec3::new(1.0, -1.0, 0.0).normalize());
        let p = contact.point().unwrap();
        assert!(p.abs_diff_eq(Vec3::new(0.2f32.cos(), -(0.2f32.sin()), 0.0), 1e-5));
        assert_eq!(a.closest_point_on_closest_cone(&b, Vec3::Y), BoundaryContact::Inside);
    }

    #[test]
    fn test_closest_collision_prefers_tangent_path() {
        let (a, b) = separated_pair();
        let mid = Vec3::new(1.0, 1.0, 0.0).normalize();
        assert_eq!(a.get_closest_collision(&b, mid), BoundaryContact::Inside);
        assert!(a.get_closest_collision(&b, -Vec3::X).is_outside());
    }

    #[test]
    fn test_determine_if_in_bounds() {
        let (a, b) = separated_pair();
        assert!(a.determine_if_in_bounds(Some(&b), Vec3::X));
        assert!(a.determine_if_in_bounds(Some(&b), Vec3::Y));
        assert!(a.determine_if_in_bounds(Some(&b), Vec3::new(1.0, 1.0, 0.0).normalize()));
        assert!(!a.determine_if_in_bounds(Some(&b), Vec3::new(0.1, 0.1, 1.0).normalize()));
        assert!(!a.determine_if_in_bounds(Some(&b), -Vec3::X));
        assert!(!a.determine_if_in_bounds(None, Vec3::Y));
    }

    #[test]
    fn test_tangent_triangles_match_flat_triangle_hit() {
        let (a, b) = separated_pair();
        let [_, upper] = a.tangent_triangles(&b).unwrap();
        let input = Vec3::new(1.0, 1.0, 0.3).normalize();
        assert!(a.get_on_great_tangent_triangle(&b, input).is_some());
        let ray = Ray3::new(Vec3::ZERO, input);
        assert!(ray.intersects_triangle(upper[0], upper[1], upper[2]).is_some());

        let away = Ray3::new(Vec3::ZERO, Vec3::new(-1.0, 0.2, 0.3));
        assert!(away.intersects_triangle(upper[0], upper[1], upper[2]).is_none());
    }
}
