//! Per joint safety limits
//!
//! Raw targets are first reflected by the mirror rule (if enabled for the joint) and then clamped
//! into the joint's limits. A missing limit falls back to the servo's own range, so a resolved
//! target is always an angle the servo can physically reach.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::{JointParams, MIRROR_PIVOT_DEG, MIRROR_THRESHOLD_DEG};
use crate::servo_ctrl::{SERVO_MAX_ANGLE_DEG, SERVO_MIN_ANGLE_DEG};
use comms_if::eqpt::arm::{JointId, NUM_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Safety limits of a single joint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JointLimits {
    /// Lower limit, [`SERVO_MIN_ANGLE_DEG`] if not given.
    ///
    /// Units: degrees
    pub min_deg: Option<i32>,

    /// Upper limit, [`SERVO_MAX_ANGLE_DEG`] if not given.
    ///
    /// Units: degrees
    pub max_deg: Option<i32>,

    pub mirror: bool,
}

/// Safety limits of every joint, read only once built.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SafetyLimits {
    joints: [JointLimits; NUM_JOINTS],
}

/// A raw target after the safety transform.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    /// Angle which will actually be commanded.
    ///
    /// Units: degrees
    pub angle_deg: i32,

    /// The mirror rule was applied.
    pub mirrored: bool,

    /// The target was pulled back into the joint's limits.
    pub clamped: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointLimits {
    /// Apply the mirror rule then the clamp to a raw target.
    pub fn apply(&self, raw_deg: i32) -> ResolvedTarget {
        let mut angle_deg = raw_deg;
        let mut mirrored = false;

        if self.mirror && angle_deg > MIRROR_THRESHOLD_DEG {
            angle_deg = MIRROR_PIVOT_DEG - angle_deg;
            mirrored = true;
        }

        let unclamped = angle_deg;

        angle_deg = angle_deg
            .max(self.min_deg.unwrap_or(SERVO_MIN_ANGLE_DEG))
            .min(self.max_deg.unwrap_or(SERVO_MAX_ANGLE_DEG));

        ResolvedTarget {
            angle_deg,
            mirrored,
            clamped: angle_deg != unclamped,
        }
    }
}

impl From<&JointParams> for JointLimits {
    fn from(p: &JointParams) -> Self {
        Self {
            min_deg: p.min_deg,
            max_deg: p.max_deg,
            mirror: p.mirror,
        }
    }
}

impl SafetyLimits {
    /// Build the limits from per joint limits given in [`JointId::ALL`] order.
    pub fn new(joints: [JointLimits; NUM_JOINTS]) -> Self {
        Self { joints }
    }

    /// Limits of the given joint.
    pub fn joint(&self, joint: JointId) -> &JointLimits {
        &self.joints[joint.index()]
    }

    /// Resolve a raw target for the given joint.
    pub fn apply(&self, joint: JointId, raw_deg: i32) -> ResolvedTarget {
        self.joint(joint).apply(raw_deg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elbow() -> JointLimits {
        JointLimits {
            min_deg: None,
            max_deg: Some(135),
            mirror: true,
        }
    }

    #[test]
    fn test_mirror_then_clamp() {
        // 200 reflects to 160, which is then clamped to the 135 limit
        let r = elbow().apply(200);
        assert_eq!(r.angle_deg, 135);
        assert!(r.mirrored);
        assert!(r.clamped);
    }

    #[test]
    fn test_mirror_without_clamp() {
        let limits = JointLimits {
            mirror: true,
            ..Default::default()
        };
        assert_eq!(
            limits.apply(200),
            ResolvedTarget {
                angle_deg: 160,
                mirrored: true,
                clamped: false
            }
        );
        // The threshold itself is not reflected
        assert_eq!(limits.apply(180).angle_deg, 180);
    }

    #[test]
    fn test_no_mirror_above_threshold_clamps() {
        let limits = JointLimits {
            min_deg: Some(0),
            max_deg: Some(180),
            mirror: false,
        };
        let r = limits.apply(200);
        assert_eq!(r.angle_deg, 180);
        assert!(!r.mirrored);
        assert!(r.clamped);
    }

    #[test]
    fn test_clamp_bounds() {
        let limits = JointLimits {
            min_deg: Some(20),
            max_deg: Some(135),
            mirror: false,
        };
        for raw in 136..400 {
            assert_eq!(limits.apply(raw).angle_deg, 135);
        }
        for raw in -200..20 {
            assert_eq!(limits.apply(raw).angle_deg, 20);
        }
        for raw in 20..=135 {
            let r = limits.apply(raw);
            assert_eq!(r.angle_deg, raw);
            assert!(!r.clamped);
        }
    }

    #[test]
    fn test_unlimited_joint_stays_in_servo_range() {
        let limits = JointLimits::default();
        assert_eq!(limits.apply(-40), ResolvedTarget {
            angle_deg: SERVO_MIN_ANGLE_DEG,
            mirrored: false,
            clamped: true
        });
        assert_eq!(limits.apply(500).angle_deg, SERVO_MAX_ANGLE_DEG);
        assert_eq!(limits.apply(i32::MIN).angle_deg, SERVO_MIN_ANGLE_DEG);
        assert_eq!(limits.apply(i32::MAX).angle_deg, SERVO_MAX_ANGLE_DEG);
        assert_eq!(limits.apply(75), ResolvedTarget {
            angle_deg: 75,
            mirrored: false,
            clamped: false
        });

        // Mirrored far out of range still lands inside the servo range
        let mirrored = JointLimits {
            mirror: true,
            ..Default::default()
        };
        assert_eq!(mirrored.apply(i32::MAX).angle_deg, SERVO_MIN_ANGLE_DEG);
    }

    #[test]
    fn test_safety_limits_per_joint() {
        let limits = SafetyLimits::new([JointLimits::default(), elbow()]);
        assert_eq!(limits.apply(JointId::Axe0, 200).angle_deg, 180);
        assert_eq!(limits.apply(JointId::Axe1, 200).angle_deg, 135);
    }
}
