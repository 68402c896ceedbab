//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the arm software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command definitions for equipment (like the arm)
pub mod eqpt;

/// Network module
pub mod net;
