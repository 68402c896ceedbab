//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::{thread, time::Duration};

// Internal
use super::{ArmCtrlError, JointLimits, JointParams, Params, ResolvedTarget, SafetyLimits, Sweep};
use crate::servo_ctrl::ActuatorDriver;
use comms_if::eqpt::arm::{AngleCommand, JointId, NUM_JOINTS};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Last angle written to each joint, `None` if the joint has never been written.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JointState {
    angles_deg: [Option<i32>; NUM_JOINTS],
}

/// Arm control module state
pub struct ArmCtrl<A>
where
    A: ActuatorDriver,
{
    pub(crate) joints: [JointParams; NUM_JOINTS],

    pub(crate) limits: SafetyLimits,

    pub(crate) step_delay: Duration,

    pub(crate) state: JointState,

    pub(crate) driver: A,
}

/// Outcome of actuating a single joint.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct JointReport {
    pub target: ResolvedTarget,

    pub num_writes: usize,

    pub num_failed_writes: usize,
}

/// Status report for ArmCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub joints: [JointReport; NUM_JOINTS],
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JointState {
    /// Last angle written to the joint.
    pub fn get(&self, joint: JointId) -> Option<i32> {
        self.angles_deg[joint.index()]
    }

    fn set(&mut self, joint: JointId, angle_deg: i32) {
        self.angles_deg[joint.index()] = Some(angle_deg);
    }
}

impl<A> ArmCtrl<A>
where
    A: ActuatorDriver,
{
    /// Create a new arm controller driving the given actuator.
    ///
    /// The parameters are validated here, an invalid configuration never reaches the dispatch
    /// loop. All joints start uninitialised, call [`ArmCtrl::home`] to move them to their home
    /// angles.
    pub fn new(params: &Params, driver: A) -> Result<Self, ArmCtrlError> {
        let joints = params.joint_params()?;

        let mut limits = [JointLimits::default(); NUM_JOINTS];
        for (l, p) in limits.iter_mut().zip(joints.iter()) {
            *l = JointLimits::from(p);
        }

        Ok(Self {
            joints,
            limits: SafetyLimits::new(limits),
            step_delay: Duration::from_millis(params.step_delay_ms),
            state: JointState::default(),
            driver,
        })
    }

    /// Drive every joint which has a home angle to it with a single settle write.
    pub fn home(&mut self) -> StatusReport {
        let mut report = StatusReport::default();

        for joint in JointId::ALL.iter().copied() {
            let home_deg = match self.joints[joint.index()].home_deg {
                Some(h) => h,
                None => continue,
            };

            info!("Homing {} to {}°", joint, home_deg);

            let jr = &mut report.joints[joint.index()];
            jr.target = self.limits.apply(joint, home_deg);
            jr.num_writes = 1;
            if !self.write(joint, jr.target.angle_deg) {
                jr.num_failed_writes = 1;
            }

            self.state.set(joint, jr.target.angle_deg);
        }

        report
    }

    /// Actuate every joint towards the target given in the command, in [`JointId::ALL`] order.
    ///
    /// Blocks until every joint's sweep is complete. Write failures are logged and counted in the
    /// report, the sweep carries on and the joint state still ends on the target.
    pub fn proc(&mut self, cmd: &AngleCommand) -> StatusReport {
        let mut report = StatusReport::default();

        info!("New AngleCommand {}", cmd);

        for (joint, raw_deg) in cmd.iter() {
            report.joints[joint.index()] = self.actuate_joint(joint, raw_deg);
        }

        report
    }

    /// Last angle written to each joint.
    pub fn state(&self) -> &JointState {
        &self.state
    }

    /// Get a reference to the actuator.
    pub fn driver(&self) -> &A {
        &self.driver
    }

    fn actuate_joint(&mut self, joint: JointId, raw_deg: i32) -> JointReport {
        let target = self.limits.apply(joint, raw_deg);

        if target.mirrored || target.clamped {
            debug!(
                "{} target {}° resolved to {}° (mirrored: {}, clamped: {})",
                joint, raw_deg, target.angle_deg, target.mirrored, target.clamped
            );
        }

        let sweep = Sweep::new(self.state.get(joint), target.angle_deg);

        debug!(
            "{} sweep {:?} -> {}° ({} writes)",
            joint,
            self.state.get(joint),
            target.angle_deg,
            sweep.len()
        );

        let mut report = JointReport {
            target,
            ..Default::default()
        };

        for angle_deg in sweep {
            report.num_writes += 1;
            if !self.write(joint, angle_deg) {
                report.num_failed_writes += 1;
            }
        }

        self.state.set(joint, target.angle_deg);

        if report.num_failed_writes > 0 {
            warn!(
                "{} completed its sweep with {} of {} writes failed",
                joint, report.num_failed_writes, report.num_writes
            );
        }

        let pause_ms = self.joints[joint.index()].pause_ms;
        if pause_ms > 0 {
            thread::sleep(Duration::from_millis(pause_ms));
        }

        report
    }

    /// Write a single angle then wait for the step delay. Returns `false` if the write failed.
    fn write(&mut self, joint: JointId, angle_deg: i32) -> bool {
        let ok = match self.driver.write(joint, angle_deg) {
            Ok(()) => {
                trace!("{} <- {}°", joint, angle_deg);
                true
            }
            Err(e) => {
                warn!("Failed to write {}° to {}: {}", angle_deg, joint, e);
                false
            }
        };

        if !self.step_delay.is_zero() {
            thread::sleep(self.step_delay);
        }

        ok
    }
}
