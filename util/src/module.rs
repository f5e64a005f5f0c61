//! Module interface
//!
//! The stateful modules of `lane_exec` (lane detection and the PD controller)
//! are driven by the main loop through this trait: initialised once from a
//! parameter file, then processed once per control cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// MODULE STATE
// ---------------------------------------------------------------------------

/// A module driven by the control loop.
pub trait State {
    /// Data required during initialisation, usually a parameter file path.
    type InitData;
    type InitError;

    /// Data consumed by one cycle of processing.
    type InputData;
    /// Data produced by one cycle of processing.
    type OutputData;
    /// Per-cycle report, also the record written to the module's archive.
    type StatusReport;
    type ProcError;

    /// Load parameters and open the module's archives in the session.
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>;

    /// Process one cycle.
    ///
    /// Returns the output and the status report on success. Conditions which
    /// are expected during normal running, such as there being nothing to
    /// observe, are reported in the status report rather than as errors.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>;
}
