//! # Proportional-derivative steering controller
//!
//! The controller converts the deviation of the steering estimate from
//! straight ahead into a steering servo demand and a drive duty. Its state
//! (last error, last tick time, held speed) is an explicit value passed into
//! and returned from each tick by [`step`], so that any number of independent
//! controllers may exist and each tick is deterministic given its inputs.
//!
//! Each tick:
//!
//!  1. `deviation = angle - 90`, `error = |deviation|`.
//!  2. Inside the dead-band both are snapped to zero, the held speed drops to
//!     the cruise duty and no correction is applied: drive runs at the held
//!     speed and the servo is held at the mirrored centre.
//!  3. Outside the dead-band the derivative term `k_d * (error - last_error) /
//!     dt` (zero unless `dt` is strictly positive) and proportional term
//!     `k_p * error` are added to both the held speed, giving the drive duty,
//!     and the steering centre, giving the steering target.
//!  4. The duty magnitude is limited, the steering target clamped and then
//!     mirrored through `180 - target` to give the servo demand.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use params::*;
pub use state::*;

/// Command emitted by the controller.
pub type Command = comms_if::eqpt::mech::MechDems;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during PdCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum PdCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(util::params::LoadError),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Could not initialise the archive: {0}")]
    ArchiveError(util::archive::ArchiveError)
}
