//! # Command Dispatch
//!
//! The arm's main loop: wait for the freshest command in the mailbox and actuate it. A command
//! published while a sweep is running is picked up once the whole command has been actuated.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::arm::AngleCommand;
use log::{debug, info};
use std::time::Duration;

use crate::{
    arm_ctrl::{ArmCtrl, StatusReport},
    mailbox::Receiver,
    servo_ctrl::ActuatorDriver,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Drains the mailbox into the arm controller.
pub struct Dispatcher<A>
where
    A: ActuatorDriver,
{
    arm_ctrl: ArmCtrl<A>,

    receiver: Receiver<AngleCommand>,

    take_timeout: Duration,

    idle_report_cycles: u32,

    /// Consecutive take timeouts
    num_idle_cycles: u32,

    /// The idle report has been emitted and no command has arrived since
    idle: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Result of a single dispatch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A command was received and actuated
    Actuated(StatusReport),

    /// No command arrived within the take timeout
    Idle,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<A> Dispatcher<A>
where
    A: ActuatorDriver,
{
    /// Create a new dispatcher.
    ///
    /// ## Arguments
    /// - `arm_ctrl` - The (homed) arm controller
    /// - `receiver` - Consumer half of the command mailbox
    /// - `take_timeout` - Longest wait for a command in a single cycle
    /// - `idle_report_cycles` - Consecutive idle cycles before the arm is reported idle, zero to
    ///   disable
    pub fn new(
        arm_ctrl: ArmCtrl<A>,
        receiver: Receiver<AngleCommand>,
        take_timeout: Duration,
        idle_report_cycles: u32,
    ) -> Self {
        Self {
            arm_ctrl,
            receiver,
            take_timeout,
            idle_report_cycles,
            num_idle_cycles: 0,
            idle: false,
        }
    }

    /// Run a single dispatch cycle.
    pub fn run_once(&mut self) -> DispatchOutcome {
        match self.receiver.take_wait(self.take_timeout) {
            Some(cmd) => {
                if self.idle {
                    info!("Command received, arm active");
                }
                self.idle = false;
                self.num_idle_cycles = 0;

                let report = self.arm_ctrl.proc(&cmd);
                debug!("ArmCtrl status: {:?}", report);

                DispatchOutcome::Actuated(report)
            }
            None => {
                self.num_idle_cycles = self.num_idle_cycles.saturating_add(1);

                if !self.idle
                    && self.idle_report_cycles > 0
                    && self.num_idle_cycles >= self.idle_report_cycles
                {
                    info!(
                        "No command for {} cycles, arm idle",
                        self.num_idle_cycles
                    );
                    self.idle = true;
                }

                DispatchOutcome::Idle
            }
        }
    }

    /// Run the dispatch loop forever.
    pub fn run(mut self) -> ! {
        loop {
            self.run_once();
        }
    }

    /// Returns `true` once the idle report has been emitted, until the next command.
    pub fn is_idle(&self) -> bool {
        self.idle
    }

    /// Get a reference to the arm controller.
    pub fn arm_ctrl(&self) -> &ArmCtrl<A> {
        &self.arm_ctrl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        arm_ctrl::{JointParams, Params},
        mailbox::{mailbox, Publisher},
        servo_ctrl::{sim::SimServoDriver, ServoCtrl, ServoError},
    };
    use comms_if::eqpt::arm::JointId;
    use std::collections::BTreeMap;

    /// Publishes a new command into the mailbox from inside a sweep.
    struct PublishingDriver {
        publisher: Publisher<AngleCommand>,
        publish_on_write: usize,
        cmd: AngleCommand,
        writes: Vec<(JointId, i32)>,
    }

    impl ActuatorDriver for PublishingDriver {
        fn write(&mut self, joint: JointId, angle_deg: i32) -> Result<(), ServoError> {
            self.writes.push((joint, angle_deg));
            if self.writes.len() == self.publish_on_write {
                self.publisher.publish(self.cmd);
            }
            Ok(())
        }
    }

    fn params() -> Params {
        let mut joints = BTreeMap::new();
        for (i, joint) in JointId::ALL.iter().enumerate() {
            joints.insert(
                joint.name().to_string(),
                JointParams {
                    channel: i as u8,
                    home_deg: Some(90),
                    ..Default::default()
                },
            );
        }
        Params {
            step_delay_ms: 0,
            joints,
        }
    }

    fn arm_ctrl() -> ArmCtrl<ServoCtrl<SimServoDriver>> {
        let params = params();
        let driver = ServoCtrl::new(SimServoDriver::new(2), params.channels().unwrap()).unwrap();
        let mut ctrl = ArmCtrl::new(&params, driver).unwrap();
        ctrl.home();
        ctrl
    }

    #[test]
    fn test_only_latest_command_actuated() {
        let (tx, rx) = mailbox();
        let mut dispatcher = Dispatcher::new(arm_ctrl(), rx, Duration::from_millis(10), 0);

        tx.publish(AngleCommand::new([10, 10]));
        tx.publish(AngleCommand::new([95, 85]));

        match dispatcher.run_once() {
            DispatchOutcome::Actuated(report) => {
                assert_eq!(report.joints[0].target.angle_deg, 95);
                assert_eq!(report.joints[0].num_writes, 6);
                assert_eq!(report.joints[1].num_writes, 6);
            }
            o => panic!("Unexpected outcome {:?}", o),
        }

        assert_eq!(dispatcher.run_once(), DispatchOutcome::Idle);

        let state = dispatcher.arm_ctrl().state();
        assert_eq!(state.get(JointId::Axe0), Some(95));
        assert_eq!(state.get(JointId::Axe1), Some(85));

        // Homing plus both sweeps reached the board
        assert_eq!(dispatcher.arm_ctrl().driver().driver().num_writes(), 14);
    }

    #[test]
    fn test_command_published_mid_sweep_waits_for_sweep() {
        let (tx, rx) = mailbox();

        // Homing makes 2 writes, so the 5th write is the 3rd step of axe_0's sweep
        let driver = PublishingDriver {
            publisher: tx.clone(),
            publish_on_write: 5,
            cmd: AngleCommand::new([0, 0]),
            writes: Vec::new(),
        };
        let mut ctrl = ArmCtrl::new(&params(), driver).unwrap();
        ctrl.home();

        let mut dispatcher = Dispatcher::new(ctrl, rx, Duration::from_millis(10), 0);

        tx.publish(AngleCommand::new([100, 80]));

        // The whole first command is actuated despite the new publish
        match dispatcher.run_once() {
            DispatchOutcome::Actuated(report) => {
                assert_eq!(report.joints[0].target.angle_deg, 100);
                assert_eq!(report.joints[0].num_writes, 11);
                assert_eq!(report.joints[1].target.angle_deg, 80);
                assert_eq!(report.joints[1].num_writes, 11);
            }
            o => panic!("Unexpected outcome {:?}", o),
        }
        assert_eq!(dispatcher.arm_ctrl().driver().writes.len(), 2 + 11 + 11);
        assert_eq!(
            dispatcher.arm_ctrl().driver().writes.last(),
            Some(&(JointId::Axe1, 80))
        );

        // The command published during the sweep is picked up next
        match dispatcher.run_once() {
            DispatchOutcome::Actuated(report) => {
                assert_eq!(report.joints[0].target.angle_deg, 0);
                assert_eq!(report.joints[1].target.angle_deg, 0);
            }
            o => panic!("Unexpected outcome {:?}", o),
        }

        let state = dispatcher.arm_ctrl().state();
        assert_eq!(state.get(JointId::Axe0), Some(0));
        assert_eq!(state.get(JointId::Axe1), Some(0));
    }

    #[test]
    fn test_idle_report() {
        let (tx, rx) = mailbox();
        let mut dispatcher = Dispatcher::new(arm_ctrl(), rx, Duration::from_millis(1), 3);

        assert_eq!(dispatcher.run_once(), DispatchOutcome::Idle);
        assert_eq!(dispatcher.run_once(), DispatchOutcome::Idle);
        assert!(!dispatcher.is_idle());
        assert_eq!(dispatcher.run_once(), DispatchOutcome::Idle);
        assert!(dispatcher.is_idle());

        tx.publish(AngleCommand::new([90, 90]));
        assert!(matches!(dispatcher.run_once(), DispatchOutcome::Actuated(_)));
        assert!(!dispatcher.is_idle());
    }

    #[test]
    fn test_idle_report_disabled() {
        let (_tx, rx) = mailbox();
        let mut dispatcher = Dispatcher::new(arm_ctrl(), rx, Duration::from_millis(1), 0);

        for _ in 0..5 {
            assert_eq!(dispatcher.run_once(), DispatchOutcome::Idle);
        }
        assert!(!dispatcher.is_idle());
    }
}
