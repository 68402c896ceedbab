//! # Servo Controller Module
//!
//! This module provides a unified servo control interface which can abstract over different types
//! of servo driver boards.
//!
//! Two layers are used:
//! - [`ServoDriver`] is implemented by a PWM board and sets raw duty cycles on its channels.
//! - [`ActuatorDriver`] is what the arm controller talks to. It takes a joint and an angle in
//!   degrees. [`ServoCtrl`] implements it for any [`ServoDriver`] by mapping joints to channels
//!   and degrees to pulse widths.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation for the Adafruit PCA9685 16 channel servo driver board.
pub mod pca9685;

/// Simulated servo driver board used on the host.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::arm::{JointId, NUM_JOINTS};
use log::trace;
use util::maths::lin_map_sat;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Smallest angle a servo can be commanded to.
///
/// Units: degrees
pub const SERVO_MIN_ANGLE_DEG: i32 = 0;

/// Largest angle a servo can be commanded to.
///
/// Units: degrees
pub const SERVO_MAX_ANGLE_DEG: i32 = 180;

/// Pulse width corresponding to [`SERVO_MIN_ANGLE_DEG`].
///
/// Units: microseconds
pub const SERVO_MIN_PULSE_US: f64 = 500.0;

/// Pulse width corresponding to [`SERVO_MAX_ANGLE_DEG`].
///
/// Units: microseconds
pub const SERVO_MAX_PULSE_US: f64 = 2500.0;

/// Servo PWM frequency.
///
/// Units: hertz
pub const PWM_FREQUENCY_HZ: u32 = 50;

/// Period of the servo PWM signal.
///
/// Units: microseconds
pub const PWM_PERIOD_US: f64 = 1_000_000.0 / PWM_FREQUENCY_HZ as f64;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for accessing servo driver boards.
pub trait ServoDriver {

    /// The type that the underlying driver uses for channel identification
    type Channel: Copy;

    /// Resolve a channel number, as found in parameter files, into a channel of this board.
    fn channel(&self, index: u8) -> Result<Self::Channel, ServoError>;

    /// Set the duty cycle of a channel.
    ///
    /// ## Arguments
    /// - `id` - The channel ID to set the duty cycle for
    /// - `duty_cycle` - The duty cycle to set. Must be a value between 0.0 and 1.0. Values outside
    ///   this range will be rejected.
    fn set_duty_cycle(&mut self, channel: Self::Channel, duty_cycle: f64) -> Result<(), ServoError>;

}

/// Writes logical joint angles to the hardware.
///
/// Writes are fire-and-forget: the caller gets an error back but nothing is retried.
pub trait ActuatorDriver {
    /// Command `joint` to `angle_deg`.
    fn write(&mut self, joint: JointId, angle_deg: i32) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Drives the arm's joints through a single servo driver board.
pub struct ServoCtrl<D>
where
    D: ServoDriver
{
    driver: D,

    channels: [D::Channel; NUM_JOINTS],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ServoError {
    #[error("An I2C error occured")]
    I2c,

    #[error("Duty cycle must be between 0.0 and 1.0, got {0}")]
    InvalidDutyCycle(f64),

    #[error("Channel {0} does not exist on this board")]
    InvalidChannel(u8),

    #[error("The board rejected the input data")]
    InvalidInputData,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<D> ServoCtrl<D>
where
    D: ServoDriver
{
    /// Create a new servo controller.
    ///
    /// ## Arguments
    /// - `driver` - An initialised [`ServoDriver`] board
    /// - `channels` - The board channel of each joint, in [`JointId::ALL`] order
    pub fn new(driver: D, channels: [u8; NUM_JOINTS]) -> Result<Self, ServoError> {
        let mut resolved = [driver.channel(channels[0])?; NUM_JOINTS];
        for (slot, index) in resolved.iter_mut().zip(channels.iter()).skip(1) {
            *slot = driver.channel(*index)?;
        }

        Ok(Self {
            driver,
            channels: resolved,
        })
    }

    /// Get a reference to the underlying board.
    pub fn driver(&self) -> &D {
        &self.driver
    }
}

impl<D> ActuatorDriver for ServoCtrl<D>
where
    D: ServoDriver
{
    fn write(&mut self, joint: JointId, angle_deg: i32) -> Result<(), ServoError> {
        let pulse_us = angle_to_pulse_us(angle_deg);

        trace!("{} -> {}° ({:.0} us)", joint, angle_deg, pulse_us);

        self.driver
            .set_duty_cycle(self.channels[joint.index()], pulse_to_duty_cycle(pulse_us))
    }
}

impl<A> ActuatorDriver for Box<A>
where
    A: ActuatorDriver + ?Sized
{
    fn write(&mut self, joint: JointId, angle_deg: i32) -> Result<(), ServoError> {
        (**self).write(joint, angle_deg)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Pulse width for the given angle. Angles outside the servo's range are saturated.
pub fn angle_to_pulse_us(angle_deg: i32) -> f64 {
    lin_map_sat(
        (SERVO_MIN_ANGLE_DEG as f64, SERVO_MAX_ANGLE_DEG as f64),
        (SERVO_MIN_PULSE_US, SERVO_MAX_PULSE_US),
        angle_deg as f64,
    )
}

/// Fraction of the PWM period taken by the given pulse.
pub fn pulse_to_duty_cycle(pulse_us: f64) -> f64 {
    pulse_us / PWM_PERIOD_US
}

/// Convert a duty cycle into timer ticks for a timer with the given resolution.
pub fn duty_cycle_to_ticks(duty_cycle: f64, resolution_bits: u32) -> u32 {
    (duty_cycle * (1u32 << resolution_bits) as f64) as u32
}

/// Convert a pulse width into timer ticks for a timer with the given resolution.
pub fn us_to_ticks(pulse_us: f64, resolution_bits: u32) -> u32 {
    duty_cycle_to_ticks(pulse_to_duty_cycle(pulse_us), resolution_bits)
}
