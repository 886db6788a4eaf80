//! Error types for constraint setup and snapping
//!
//! Geometry queries never fail: degenerate inputs come back as
//! "not applicable" variants. Errors here are configuration and
//! precondition failures, and every operation returning one has
//! left the constraint and the joint untouched.
//!
//! License: MIT
//! Author: Moroya Sakamoto

use thiserror::Error;

/// Which caller-supplied frame failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRole {
    /// Reference frame the limit cones are expressed in
    LimitingAxes,
    /// Frame whose +Y axis points along the bone
    BoneDirection,
    /// Reference frame of the twist window
    TwistAxes,
    /// Joint being rectified (local transform or its parent)
    Joint,
}

impl core::fmt::Display for FrameRole {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            FrameRole::LimitingAxes => "limiting axes",
            FrameRole::BoneDirection => "bone direction",
            FrameRole::TwistAxes => "twist axes",
            FrameRole::Joint => "joint",
        };
        f.write_str(name)
    }
}

/// Errors from constraint configuration and snapping.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConstraintError {
    /// Cone direction has zero length.
    #[error("Limit cone direction has zero length")]
    ZeroDirection,

    /// Cone direction contains NaN or infinity.
    #[error("Limit cone direction is not finite")]
    NonFiniteDirection,

    /// Cone radius outside [0, π].
    #[error("Limit cone radius {radius} outside [0, π]")]
    RadiusOutOfRange {
        /// Offending radius in radians
        radius: f32,
    },

    /// Twist window with negative range.
    #[error("Axial range {range} is negative")]
    NegativeRange {
        /// Offending range in radians
        range: f32,
    },

    /// Angle contains NaN or infinity.
    #[error("Angle is not finite")]
    NonFiniteAngle,

    /// Cone index past the end of the sequence.
    #[error("Limit cone index {index} out of range (len {len})")]
    ConeIndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of cones in the sequence
        len: usize,
    },

    /// Transform is non-finite or its rotation is not unit length.
    #[error("Invalid {role} frame")]
    InvalidFrame {
        /// Which frame was rejected
        role: FrameRole,
    },

    /// A cone entry of a serialized configuration was rejected.
    #[error("Invalid limit cone {index} in configuration: {source}")]
    InvalidConfig {
        /// Position of the cone in the configuration
        index: usize,
        /// Underlying validation failure
        #[source]
        source: Box<ConstraintError>,
    },
}

/// Result alias for constraint operations.
pub type Result<T> = core::result::Result<T, ConstraintError>;
