//! # Arm library.
//!
//! This library allows other crates in the workspace, as well as the benches, to access items
//! defined inside the arm crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm control module - converts angle commands into rate limited single degree sweeps
pub mod arm_ctrl;

/// Command source - receives angle commands from the command server
pub mod cmd_source;

/// Dispatcher - the main loop draining the mailbox into arm control
pub mod dispatch;

/// Single slot latest-value mailbox between the command source and the dispatcher
pub mod mailbox;

/// Parameters for the arm executable
pub mod params;

/// Servo control - writes joint angles to the servo driver board
pub mod servo_ctrl;
