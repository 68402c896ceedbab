//! Simulated [`ServoDriver`] board
//!
//! Behaves like a 13 bit LEDC PWM peripheral: duty cycles are converted into timer ticks and held
//! per channel so they can be inspected.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use super::{duty_cycle_to_ticks, ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Duty resolution of the simulated timer.
pub const SIM_DUTY_RESOLUTION_BITS: u32 = 13;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A simulated servo board.
#[derive(Debug, Clone)]
pub struct SimServoDriver {
    /// Last duty value written to each channel, in timer ticks
    duty_ticks: Vec<Option<u32>>,

    num_writes: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl SimServoDriver {
    /// Create a board with the given number of channels, all idle.
    pub fn new(num_channels: usize) -> Self {
        Self {
            duty_ticks: vec![None; num_channels],
            num_writes: 0,
        }
    }

    /// Last duty written to a channel, or `None` if it was never written.
    pub fn duty_ticks(&self, channel: usize) -> Option<u32> {
        self.duty_ticks.get(channel).copied().flatten()
    }

    /// Total number of successful writes to the board.
    pub fn num_writes(&self) -> u64 {
        self.num_writes
    }
}

impl ServoDriver for SimServoDriver {
    type Channel = usize;

    fn channel(&self, index: u8) -> Result<Self::Channel, ServoError> {
        if (index as usize) < self.duty_ticks.len() {
            Ok(index as usize)
        } else {
            Err(ServoError::InvalidChannel(index))
        }
    }

    fn set_duty_cycle(
        &mut self,
        channel: Self::Channel,
        duty_cycle: f64
    ) -> Result<(), ServoError> {

        // If the duty cycle is out of range return an error
        if !(0.0..=1.0).contains(&duty_cycle) {
            return Err(ServoError::InvalidDutyCycle(duty_cycle))
        }

        let ticks = duty_cycle_to_ticks(duty_cycle, SIM_DUTY_RESOLUTION_BITS);

        match self.duty_ticks.get_mut(channel) {
            Some(slot) => *slot = Some(ticks),
            None => return Err(ServoError::InvalidChannel(channel as u8)),
        }

        self.num_writes += 1;
        trace!("sim channel {} duty {} ticks", channel, ticks);

        Ok(())
    }
}
