//! Arm control module
//!
//! Converts each received [`AngleCommand`](comms_if::eqpt::arm::AngleCommand) into a sequence of
//! single degree writes per joint, so every joint moves at a roughly constant angular rate rather
//! than jumping straight to its target.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod limits;
mod params;
mod state;
mod sweep;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use limits::*;
pub use params::*;
pub use state::*;
pub use sweep::*;

use comms_if::eqpt::arm::JointId;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Raw targets above this angle are reflected on joints with the mirror rule enabled.
///
/// Units: degrees
pub const MIRROR_THRESHOLD_DEG: i32 = 180;

/// Reflection pivot used by the mirror rule, `t' = MIRROR_PIVOT_DEG - t`.
///
/// Units: degrees
pub const MIRROR_PIVOT_DEG: i32 = 360;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Configuration errors detected when building ArmCtrl.
///
/// These are fatal, the arm must not be actuated with an invalid configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArmCtrlError {
    #[error("No parameters given for joint {0}")]
    MissingJoint(JointId),

    #[error("Parameters given for unknown joint \"{0}\"")]
    UnknownJoint(String),

    #[error("Joint {joint} has min_deg ({min_deg}) greater than max_deg ({max_deg})")]
    InvertedLimits {
        joint: JointId,
        min_deg: i32,
        max_deg: i32,
    },

    #[error("Joint {joint} limit of {angle_deg}° is outside the servo range")]
    LimitOutOfRange { joint: JointId, angle_deg: i32 },

    #[error("Joint {joint} home of {home_deg}° is outside the joint limits")]
    HomeOutsideLimits { joint: JointId, home_deg: i32 },

    #[error("Channel {channel} is assigned to both {first} and {second}")]
    DuplicateChannel {
        channel: u8,
        first: JointId,
        second: JointId,
    },
}
