//! Ray primitive — line/segment queries for boundary geometry
//!
//! Projection, plane intersection, sphere intersection and
//! barycentric classification. The limit cone code builds its
//! tangent circles and path projections out of these.
//!
//! Degenerate input (zero-length heading, plane parallel to the ray)
//! produces NaN or infinite components rather than an error. Callers
//! check finiteness before trusting a result.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use glam::Vec3;

/// Discriminant below which a line is treated as touching a sphere
const TANGENT_EPSILON: f32 = 1e-7;

/// Two points in a common frame; heading runs from `p1` to `p2`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray3 {
    pub p1: Vec3,
    pub p2: Vec3,
}

/// Where an infinite line meets a sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SphereIntersection {
    /// No real intersection
    Miss,
    /// Line touches the sphere at a single point
    Tangent(Vec3),
    /// Entry and exit points, ordered along the heading
    Secant(Vec3, Vec3),
}

impl SphereIntersection {
    /// Number of distinct intersection points (0, 1 or 2)
    pub fn count(&self) -> usize {
        match self {
            SphereIntersection::Miss => 0,
            SphereIntersection::Tangent(_) => 1,
            SphereIntersection::Secant(..) => 2,
        }
    }

    /// Both intersection points; a tangent contact repeats its point
    pub fn points(&self) -> Option<(Vec3, Vec3)> {
        match *self {
            SphereIntersection::Miss => None,
            SphereIntersection::Tangent(p) => Some((p, p)),
            SphereIntersection::Secant(a, b) => Some((a, b)),
        }
    }
}

impl Ray3 {
    pub const fn new(p1: Vec3, p2: Vec3) -> Self {
        Self { p1, p2 }
    }

    pub fn heading(&self) -> Vec3 {
        self.p2 - self.p1
    }

    /// Move `p2` so that the heading becomes `heading`
    pub fn set_heading(&mut self, heading: Vec3) {
        self.p2 = self.p1 + heading;
    }

    /// Scalar `t` such that `p1 + heading * t` is the projection of `point`
    /// onto the infinite line through this ray.
    ///
    /// For a ray from (5, 0, 0) to (10, 0, 0) and point (7.5, 7, 0) this is 0.5.
    /// Re-projecting the closest point yields the same `t`.
    pub fn scaled_projection(&self, point: Vec3) -> f32 {
        let heading = self.heading();
        (point - self.p1).dot(heading) / heading.length_squared()
    }

    /// Point on the infinite line nearest to `point`
    pub fn closest_point_to(&self, point: Vec3) -> Vec3 {
        self.p1 + self.heading() * self.scaled_projection(point)
    }

    /// Lengthen the segment by `amount` at both ends
    pub fn elongate(&mut self, amount: f32) {
        let mid = (self.p1 + self.p2) * 0.5;
        let p1_heading = self.p1 - mid;
        let p2_heading = self.p2 - mid;
        self.p1 = mid + p1_heading + p1_heading.normalize() * amount;
        self.p2 = mid + p2_heading + p2_heading.normalize() * amount;
    }

    /// Point where the infinite line meets the plane through `a`, `b`, `c`.
    ///
    /// The result is not necessarily inside the triangle.
    pub fn intersects_plane(&self, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
        let (hit, _) = self.plane_intersect_test(a - self.p1, b - self.p1, c - self.p1);
        hit + self.p1
    }

    /// Intersection with the plane of a triangle given relative to `p1`.
    ///
    /// Returns the hit point (still relative to `p1`) and its barycentric
    /// weights with respect to the triangle.
    pub fn plane_intersect_test(&self, a: Vec3, b: Vec3, c: Vec3) -> (Vec3, Vec3) {
        let dir = self.heading();
        let normal = (b - a).cross(c - a);
        let w0 = -a;
        let r = -normal.dot(w0) / normal.dot(dir);
        let hit = dir * r;
        (hit, barycentric(a, b, c, hit))
    }

    /// Point where the line crosses triangle `a`, `b`, `c`, if it does
    pub fn intersects_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
        let (hit, uvw) = self.plane_intersect_test(a - self.p1, b - self.p1, c - self.p1);
        if !hit.is_finite() || !uvw.is_finite() {
            return None;
        }
        if uvw.x >= 0.0 && uvw.y >= 0.0 && uvw.z >= 0.0 {
            Some(hit + self.p1)
        } else {
            None
        }
    }

    /// Intersect the infinite line with a sphere
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> SphereIntersection {
        let dir = self.heading().normalize();
        let oc = self.p1 - center;
        let b = dir.dot(oc);
        let disc = b * b - (oc.length_squared() - radius * radius);

        if disc < 0.0 {
            SphereIntersection::Miss
        } else if disc <= TANGENT_EPSILON {
            SphereIntersection::Tangent(self.p1 + dir * -b)
        } else {
            let s = disc.sqrt();
            SphereIntersection::Secant(self.p1 + dir * (-b - s), self.p1 + dir * (-b + s))
        }
    }
}

/// Barycentric weights `(u, v, w)` of `p` in triangle `a`, `b`, `c`
///
/// Projects onto the coordinate plane where the triangle has the largest
/// area (Ericson, Real-Time Collision Detection 3.4). `p` is assumed to lie
/// in the triangle's plane; `p == a*u + b*v + c*w`.
pub fn barycentric(a: Vec3, b: Vec3, c: Vec3, p: Vec3) -> Vec3 {
    let m = (b - a).cross(c - a);
    let (x, y, z) = (m.x.abs(), m.y.abs(), m.z.abs());

    let (nu, nv, ood) = if x >= y && x >= z {
        (
            triangle_area_2d(p.y, p.z, b.y, b.z, c.y, c.z),
            triangle_area_2d(p.y, p.z, c.y, c.z, a.y, a.z),
            1.0 / m.x,
        )
    } else if y >= x && y >= z {
        (
            triangle_area_2d(p.x, p.z, b.x, b.z, c.x, c.z),
            triangle_area_2d(p.x, p.z, c.x, c.z, a.x, a.z),
            1.0 / -m.y,
        )
    } else {
        (
            triangle_area_2d(p.x, p.y, b.x, b.y, c.x, c.y),
            triangle_area_2d(p.x, p.y, c.x, c.y, a.x, a.y),
            1.0 / m.z,
        )
    };

    let u = nu * ood;
    let v = nv * ood;
    Vec3::new(u, v, 1.0 - u - v)
}

/// Twice the signed area of a 2D triangle
fn triangle_area_2d(x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) -> f32 {
    (x1 - x2) * (y2 - y3) - (x2 - x3) * (y1 - y2)
}
