//! Implementations for the PdCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;
use std::time::Instant;

// Internal
use super::{Command, Params, PdCtrlError};
use comms_if::eqpt::mech::{MAX_STEER_DEG, NUM_DRV_MOTORS};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::clamp,
    module::State,
    params,
    session::{self, Session},
    time::secs_between
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// State carried by the controller from one tick to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControllerState {
    /// Error magnitude of the previous tick.
    ///
    /// Units: degrees
    pub last_error: f64,

    /// Time of the previous tick, `None` before the first tick.
    pub last_time: Option<Instant>,

    /// Drive duty currently held, which the corrections are added to.
    pub speed_duty: f64
}

/// PD control module state
pub struct PdCtrl {
    pub(crate) params: Params,

    pub(crate) ctrl_state: ControllerState,

    pub(crate) report: StatusReport,
    arch_report: Archiver
}

/// Input data to PdCtrl.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// The steering angle estimate.
    ///
    /// Units: degrees
    pub angle_deg: i32,

    /// Time of this tick.
    pub time: Instant
}

/// Status report for PdCtrl processing.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct StatusReport {
    /// Signed deviation from straight ahead, after the dead-band.
    ///
    /// Units: degrees
    pub deviation: f64,

    /// Error magnitude, after the dead-band.
    ///
    /// Units: degrees
    pub error: f64,

    pub derivative: f64,
    pub proportional: f64,

    /// The deviation was inside the dead-band so no correction was applied.
    pub in_dead_band: bool,

    /// The time since the previous tick was not strictly positive (or there
    /// was no previous tick) so the derivative term was skipped.
    pub dt_guarded: bool,

    /// The drive duty was limited to its maximum.
    pub duty_limited: bool,

    /// The steering target was clamped to its range.
    pub steer_limited: bool
}

/// Status report row written to the archive.
#[derive(Serialize)]
struct ReportRecord {
    time_s: f64,
    deviation: f64,
    error: f64,
    derivative: f64,
    proportional: f64,
    in_dead_band: bool,
    dt_guarded: bool,
    duty_limited: bool,
    steer_limited: bool
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Perform one controller tick.
///
/// Returns the state to carry to the next tick, the command to send and a
/// report of the terms which made up the command.
pub fn step(
    state: &ControllerState,
    params: &Params,
    angle_deg: i32,
    now: Instant
) -> (ControllerState, Command, StatusReport) {
    let mut report = StatusReport::default();
    let mut next = *state;

    let mut deviation = (angle_deg - 90) as f64;
    let mut error = deviation.abs();

    if deviation > -params.dead_band_deg && deviation < params.dead_band_deg {
        deviation = 0.0;
        error = 0.0;
        next.speed_duty = params.cruise_speed_duty;
        report.in_dead_band = true;
    }
    else {
        debug!("Steering angle outside dead-band: {} deg", angle_deg);
    }

    // Corrections are only applied outside the dead-band
    if !report.in_dead_band {
        let dt = state.last_time.map(|t| secs_between(t, now));

        let derivative = match dt {
            Some(dt) if dt > 0.0 => params.k_d() * (error - state.last_error) / dt,
            _ => {
                report.dt_guarded = true;
                0.0
            }
        };

        // Guard against a spike from a vanishingly small dt
        report.derivative = if derivative.is_finite() {
            derivative
        }
        else {
            report.dt_guarded = true;
            0.0
        };
        report.proportional = params.k_p * error;
    }

    report.deviation = deviation;
    report.error = error;

    let correction = report.derivative + report.proportional;

    // Drive duty, same on both motors
    let duty_raw = (next.speed_duty + correction).round().abs();
    let max_duty = params.max_drive_duty as f64;
    report.duty_limited = duty_raw > max_duty;
    let duty = clamp(&duty_raw, &0.0, &max_duty) as u16;

    // Steering target, clamped then mirrored onto the servo
    let steer_raw = (params.steer_centre_deg + correction).round();
    let min_steer = params.min_steer_deg as f64;
    let max_steer = params.max_steer_deg as f64;
    report.steer_limited = steer_raw < min_steer || steer_raw > max_steer;
    let steer_target = clamp(&steer_raw, &min_steer, &max_steer) as u16;

    let cmd = Command {
        steer_deg: MAX_STEER_DEG - steer_target,
        drive_duty: [duty; NUM_DRV_MOTORS]
    };

    next.last_error = error;
    next.last_time = Some(now);

    trace!(
        "PdCtrl: angle {} dev {} err {} d {:.3} p {:.3} -> {:?}",
        angle_deg, deviation, error, report.derivative, report.proportional, cmd
    );

    (next, cmd, report)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ControllerState {
    /// The state before the first tick.
    pub fn new(params: &Params) -> Self {
        Self {
            last_error: 0.0,
            last_time: None,
            speed_duty: params.base_speed_duty
        }
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::new(&Params::default())
    }
}

impl PdCtrl {
    /// Create a new instance from already loaded parameters.
    pub fn new(params: Params) -> Result<Self, PdCtrlError> {
        params.validate()?;

        Ok(Self {
            ctrl_state: ControllerState::new(&params),
            params,
            report: StatusReport::default(),
            arch_report: Archiver::default()
        })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// The state carried to the next tick.
    pub fn ctrl_state(&self) -> &ControllerState {
        &self.ctrl_state
    }

    /// Forget the controller history, so that the first tick after leaving
    /// safe mode has no derivative term.
    pub fn make_safe(&mut self) {
        self.ctrl_state = ControllerState::new(&self.params);
        self.report = StatusReport::default();
    }
}

impl Default for PdCtrl {
    fn default() -> Self {
        let params = Params::default();

        Self {
            ctrl_state: ControllerState::new(&params),
            params,
            report: StatusReport::default(),
            arch_report: Archiver::default()
        }
    }
}

impl State for PdCtrl {
    type InitData = &'static str;
    type InitError = PdCtrlError;

    type InputData = InputData;
    type OutputData = Command;
    type StatusReport = StatusReport;
    type ProcError = PdCtrlError;

    /// Initialise the PdCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session)
        -> Result<(), Self::InitError>
    {
        // Load the parameters
        self.params = params::load(init_data)
            .map_err(PdCtrlError::ParamLoadError)?;
        self.params.validate()?;

        self.ctrl_state = ControllerState::new(&self.params);

        // Initialise the archiver
        self.arch_report = Archiver::from_path(
            session, "pd_ctrl/status_report.csv"
        ).map_err(PdCtrlError::ArchiveError)?;

        Ok(())
    }

    /// Perform one controller tick.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let (next, cmd, report) = step(
            &self.ctrl_state,
            &self.params,
            input_data.angle_deg,
            input_data.time
        );

        self.ctrl_state = next;
        self.report = report;

        Ok((cmd, report))
    }
}

impl Archived for PdCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        let r = self.report;

        self.arch_report.serialise(ReportRecord {
            time_s: session::get_elapsed_seconds(),
            deviation: r.deviation,
            error: r.error,
            derivative: r.derivative,
            proportional: r.proportional,
            in_dead_band: r.in_dead_band,
            dt_guarded: r.dt_guarded,
            duty_limited: r.duty_limited,
            steer_limited: r.steer_limited
        })
    }
}
