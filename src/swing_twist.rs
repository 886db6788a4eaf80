//! Swing-twist decomposition — split a rotation about a reference axis
//!
//! Any rotation `R` factors into `swing * twist`, where `twist` spins
//! about the reference axis and `swing` tilts that axis. The Kusudama
//! clamps the twist factor and leaves the swing factor untouched.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use core::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};

/// Squared length below which a quaternion is treated as zero
const DEGENERATE_EPSILON: f32 = 1e-12;

/// Decompose `rotation` into `(swing, twist)` about `axis`
///
/// The twist is the normalized projection of the rotation's vector part
/// onto `axis`, sign-corrected so its vector part points along `axis`.
/// `swing * twist` reproduces `rotation`.
///
/// A zero rotation gives two identities. A zero axis, or a rotation with
/// no component about the axis at all (a half turn about a perpendicular
/// axis), gives an identity twist and the whole rotation as swing.
pub fn swing_twist(rotation: Quat, axis: Vec3) -> (Quat, Quat) {
    if rotation.length_squared() < DEGENERATE_EPSILON {
        return (Quat::IDENTITY, Quat::IDENTITY);
    }
    let Some(axis) = axis.try_normalize() else {
        return (rotation, Quat::IDENTITY);
    };

    let d = axis.dot(Vec3::new(rotation.x, rotation.y, rotation.z));
    let projected = axis * d;
    let raw = Quat::from_xyzw(projected.x, projected.y, projected.z, rotation.w);
    if raw.length_squared() < DEGENERATE_EPSILON {
        return (rotation, Quat::IDENTITY);
    }

    let mut twist = raw.normalize();
    if d < 0.0 {
        twist = -twist;
    }
    let swing = rotation * twist.conjugate();
    (swing, twist)
}

/// Clamp the rotation angle of `rotation` by its quadrance
///
/// `cos_half_angle` is the cosine of half the largest allowed rotation
/// angle. Rotations within the limit come back unchanged; larger ones keep
/// their axis and the sign of `w` but are shortened to the limit.
pub fn clamp_to_quadrance_angle(rotation: Quat, cos_half_angle: f32) -> Quat {
    let new_coeff = 1.0 - cos_half_angle * cos_half_angle.abs();
    let current_coeff = rotation.x * rotation.x + rotation.y * rotation.y + rotation.z * rotation.z;
    if new_coeff >= current_coeff {
        return rotation;
    }

    let scale = (new_coeff / current_coeff).sqrt();
    let w = if rotation.w < 0.0 { -cos_half_angle } else { cos_half_angle };
    Quat::from_xyzw(rotation.x * scale, rotation.y * scale, rotation.z * scale, w)
}

/// Signed angle of `twist` about `axis`, in (-π, π]
pub fn twist_angle(twist: Quat, axis: Vec3) -> f32 {
    let axis = axis.normalize_or_zero();
    let s = axis.dot(Vec3::new(twist.x, twist.y, twist.z));
    let angle = 2.0 * s.atan2(twist.w);
    if angle > PI {
        angle - TAU
    } else if angle <= -PI {
        angle + TAU
    } else {
        angle
    }
}

/// Wrap an angle into [0, τ)
pub fn to_tau(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Shortest signed angular distance from `to` to `from`
///
/// Positive when `from` lies counter-clockwise of `to` within half a turn.
pub fn signed_angle_difference(from: f32, to: f32) -> f32 {
    let diff = from - to;
    let d = diff.abs() % TAU;
    let r = if d > PI { TAU - d } else { d };
    let positive = (0.0..=PI).contains(&diff) || (-TAU..=-PI).contains(&diff);
    if positive { r } else { -r }
}
