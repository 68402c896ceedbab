//! [`ServoDriver`] implementation for the PCA9685 driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use pwm_pca9685::{Channel, Pca9685};
use embedded_hal::blocking::i2c::{Write, WriteRead};

use super::{duty_cycle_to_ticks, ServoDriver, ServoError};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Resolution of the PCA9685 PWM counters.
const RESOLUTION_BITS: u32 = 12;

/// Largest value a channel's off counter accepts.
const MAX_PWM: u16 = 4095;

/// Prescale giving a 50 Hz output from the 25 MHz internal oscillator:
/// `round(25 MHz / (4096 * 50 Hz)) - 1`.
pub const PRESCALE_50HZ: u8 = 121;

/// Default I2C address of the board.
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// Channels of the board, indexed by channel number.
const CHANNELS: [Channel; 16] = [
    Channel::C0,
    Channel::C1,
    Channel::C2,
    Channel::C3,
    Channel::C4,
    Channel::C5,
    Channel::C6,
    Channel::C7,
    Channel::C8,
    Channel::C9,
    Channel::C10,
    Channel::C11,
    Channel::C12,
    Channel::C13,
    Channel::C14,
    Channel::C15,
];

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Create and configure a PCA9685 for driving servos at 50 Hz.
pub fn init_pca9685<I2C, E>(i2c: I2C, address: u8) -> Result<Pca9685<I2C>, ServoError>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    let mut board = Pca9685::new(i2c, address).map_err(map_error)?;

    board.set_prescale(PRESCALE_50HZ).map_err(map_error)?;
    board.enable().map_err(map_error)?;

    Ok(board)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<I2C, E> ServoDriver for Pca9685<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>
{
    type Channel = Channel;

    fn channel(&self, index: u8) -> Result<Self::Channel, ServoError> {
        CHANNELS
            .get(index as usize)
            .copied()
            .ok_or(ServoError::InvalidChannel(index))
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

        let off = (duty_cycle_to_ticks(duty_cycle, RESOLUTION_BITS) as u16).min(MAX_PWM);

        self.set_channel_on_off(channel, 0, off).map_err(map_error)
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn map_error<E>(e: pwm_pca9685::Error<E>) -> ServoError {
    match e {
        pwm_pca9685::Error::I2C(_) => ServoError::I2c,
        pwm_pca9685::Error::InvalidInputData => ServoError::InvalidInputData,
    }
}
