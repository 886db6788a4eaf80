//! ALICE-Kusudama — Orientation constraints for IK solvers
//!
//! Limits a joint's swing to a sequence of cones on the unit sphere joined
//! by smooth tangent paths, and its twist to a window about the bone axis.
//! Out-of-range orientations are snapped back to the nearest allowed one.
//!
//! License: MIT
//! Author: Moroya Sakamoto

pub mod config;
pub mod constraint;
pub mod error;
pub mod joint;
pub mod kusudama;
pub mod limit_cone;
pub mod ray;
pub mod swing_twist;

pub use config::{AxialLimitsConfig, KusudamaConfig, LimitConeConfig};
pub use constraint::{BoneConstraint, SnapReport};
pub use error::{ConstraintError, FrameRole, Result};
pub use joint::{Joint, Transform};
pub use kusudama::{Kusudama, PointInLimits, SnapOutcome};
pub use limit_cone::{BoundaryContact, LimitCone, TangentHandles};
pub use ray::{Ray3, SphereIntersection};
pub use swing_twist::swing_twist;
