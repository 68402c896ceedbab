//! # Arm Executable Parameters

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::WireFormat;
use serde::Deserialize;

use crate::servo_ctrl::pca9685::DEFAULT_ADDRESS;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct ArmExecParams {

    /// Address of the command server, e.g. `"192.168.4.1:3000"`
    pub cmd_server_address: String,

    /// Encoding of the commands sent by the server
    #[serde(default = "default_wire_format")]
    pub wire_format: WireFormat,

    /// Delay between connection attempts to the command server
    ///
    /// Units: milliseconds
    pub reconnect_ms: u64,

    /// Longest time the dispatcher waits for a command before idling
    ///
    /// Units: milliseconds
    pub take_timeout_ms: u64,

    /// Number of consecutive idle cycles after which the arm is reported as idle. Zero disables
    /// the report.
    #[serde(default)]
    pub idle_report_cycles: u32,

    /// Servo driver board to use
    pub driver: DriverKind,

    /// I2C address of the PCA9685 board
    #[serde(default = "default_pca9685_address")]
    pub pca9685_address: u8,

    /// Log every single degree write at trace level. Off by default as a sweep writes up to 181
    /// lines per joint.
    #[serde(default)]
    pub log_writes: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    /// Simulated board, runs on any host
    Sim,

    /// Adafruit PCA9685 on the Raspberry Pi's I2C bus
    Pca9685,
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn default_wire_format() -> WireFormat {
    WireFormat::Raw
}

fn default_pca9685_address() -> u8 {
    DEFAULT_ADDRESS
}
