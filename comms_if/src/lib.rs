//! # Communications interface crate.
//!
//! Provides the interface types exchanged between the lane controller and its
//! external collaborators (the camera and the actuators).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command and frame definitions for equipment (camera, servo, drive motors)
pub mod eqpt;
