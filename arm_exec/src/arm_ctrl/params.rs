//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ArmCtrlError;
use crate::servo_ctrl::{SERVO_MAX_ANGLE_DEG, SERVO_MIN_ANGLE_DEG};
use comms_if::eqpt::arm::{JointId, NUM_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Params {
    /// Delay after every write issued to a joint.
    ///
    /// Units: milliseconds
    pub step_delay_ms: u64,

    /// Per joint parameters, keyed by joint name (`axe_0`, `axe_1`, ...).
    pub joints: BTreeMap<String, JointParams>,
}

/// Parameters of a single joint.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JointParams {
    /// Driver board channel the joint's servo is plugged into.
    pub channel: u8,

    /// Lowest angle the joint may be commanded to. Unlimited if not given.
    ///
    /// Units: degrees
    #[serde(default)]
    pub min_deg: Option<i32>,

    /// Highest angle the joint may be commanded to. Unlimited if not given.
    ///
    /// Units: degrees
    #[serde(default)]
    pub max_deg: Option<i32>,

    /// Reflect raw targets above 180° before clamping.
    #[serde(default)]
    pub mirror: bool,

    /// Angle the joint is driven to at startup. If not given the joint's first command is a
    /// settle write.
    ///
    /// Units: degrees
    #[serde(default)]
    pub home_deg: Option<i32>,

    /// Pause after the joint's sweep completes.
    ///
    /// Units: milliseconds
    #[serde(default)]
    pub pause_ms: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    /// Resolve and validate the joint table, returning the parameters in [`JointId::ALL`] order.
    pub fn joint_params(&self) -> Result<[JointParams; NUM_JOINTS], ArmCtrlError> {
        // Unknown names first, so a typo is reported as such rather than as a missing joint
        if let Some(name) = self
            .joints
            .keys()
            .find(|name| JointId::from_name(name).is_none())
        {
            return Err(ArmCtrlError::UnknownJoint(name.clone()));
        }

        let mut resolved: [JointParams; NUM_JOINTS] = Default::default();

        for (joint, slot) in JointId::ALL.iter().zip(resolved.iter_mut()) {
            let p = self
                .joints
                .get(joint.name())
                .ok_or(ArmCtrlError::MissingJoint(*joint))?;

            p.validate(*joint)?;

            *slot = p.clone();
        }

        // Two joints on one channel would fight each other
        for (i, a) in resolved.iter().enumerate() {
            for (j, b) in resolved.iter().enumerate().skip(i + 1) {
                if a.channel == b.channel {
                    return Err(ArmCtrlError::DuplicateChannel {
                        channel: a.channel,
                        first: JointId::ALL[i],
                        second: JointId::ALL[j],
                    });
                }
            }
        }

        Ok(resolved)
    }

    /// Driver board channel of each joint, in [`JointId::ALL`] order.
    pub fn channels(&self) -> Result<[u8; NUM_JOINTS], ArmCtrlError> {
        let joints = self.joint_params()?;

        let mut channels = [0u8; NUM_JOINTS];
        for (c, p) in channels.iter_mut().zip(joints.iter()) {
            *c = p.channel;
        }

        Ok(channels)
    }
}

impl JointParams {
    fn validate(&self, joint: JointId) -> Result<(), ArmCtrlError> {
        let servo_range = SERVO_MIN_ANGLE_DEG..=SERVO_MAX_ANGLE_DEG;

        for angle_deg in self.min_deg.iter().chain(self.max_deg.iter()) {
            if !servo_range.contains(angle_deg) {
                return Err(ArmCtrlError::LimitOutOfRange {
                    joint,
                    angle_deg: *angle_deg,
                });
            }
        }

        if let (Some(min_deg), Some(max_deg)) = (self.min_deg, self.max_deg) {
            if min_deg > max_deg {
                return Err(ArmCtrlError::InvertedLimits {
                    joint,
                    min_deg,
                    max_deg,
                });
            }
        }

        if let Some(home_deg) = self.home_deg {
            let below = self.min_deg.map_or(false, |min| home_deg < min);
            let above = self.max_deg.map_or(false, |max| home_deg > max);

            if below || above || !servo_range.contains(&home_deg) {
                return Err(ArmCtrlError::HomeOutsideLimits { joint, home_deg });
            }
        }

        Ok(())
    }
}
