//! Main lane following executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Start the frame source
//!     - Main loop, at a fixed cycle period:
//!         - Safe mode management from the frame source health
//!         - Perception: lane detection and steering angle calculation
//!         - PD control processing
//!         - Command output
//!         - Archiving and diagnostics overlay
//!
//! The loop never waits for a new frame, the latest frame is reused until a new one arrives.
//!
//! # Usage
//!
//! `lane_exec [NUM_CYCLES]`, with no argument the executable runs until killed.
//!
//! # Modules
//!
//! All modules (e.g. `pd_ctrl`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use lane_lib::{
    cmd_sink::{ArchiveSink, CommandSink, LogSink},
    data_store::{DataStore, SafeModeCause},
    frame_slot::FrameSlot,
    frame_source::FrameSource,
    lane_det,
    overlay,
    params::LaneExecParams,
    pd_ctrl::{self, Command}
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use std::env;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use color_eyre::{Report, eyre::{WrapErr, eyre}};

// Internal
use util::{
    archive::{Archived, Archiver},
    host,
    module::State,
    logger::{logger_init, LevelFilter},
    session::Session
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    // Initialise session
    let session = Session::new(
        "lane_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Lane Following Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- ARGUMENTS ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let max_cycles: Option<u64> = match args.len() {
        1 => None,
        2 => Some(args[1].parse::<u64>().wrap_err("NUM_CYCLES must be a positive integer")?),
        n => return Err(eyre!("Expected either zero or one argument, found {}", n - 1))
    };

    // ---- LOAD PARAMETERS ----

    let exec_params: LaneExecParams = util::params::load(
        "lane_exec.toml"
    ).wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE DATASTORE ----

    info!("Initialising modules...");

    let mut ds = DataStore::default();

    // ---- INITIALISE MODULES ----

    ds.lane_det.init("lane_det.toml", &session)
        .wrap_err("Failed to initialise LaneDet")?;
    info!("LaneDet init complete");

    ds.pd_ctrl.init("pd_ctrl.toml", &session)
        .wrap_err("Failed to initialise PdCtrl")?;
    info!("PdCtrl init complete");

    // Record the parameters used in this session
    session.save("params/lane_exec.json", exec_params.clone());
    session.save("params/lane_det.json", ds.lane_det.params().clone());
    session.save("params/pd_ctrl.json", ds.pd_ctrl.params().clone());

    let mut sinks: Vec<Box<dyn CommandSink>> = vec![Box::new(LogSink::new())];
    let mut tick_arch = None;

    if exec_params.archive_enabled {
        sinks.push(Box::new(
            ArchiveSink::new(&session).wrap_err("Failed to initialise the ArchiveSink")?
        ));
        tick_arch = Some(
            Archiver::from_path(&session, "lane_exec/tick.csv")
                .wrap_err("Failed to initialise the tick archive")?
        );
    }

    info!("Module initialisation complete\n");

    // ---- START FRAME SOURCE ----

    let slot = FrameSlot::new();

    let frame_dir = resolve_frame_dir(&exec_params.frame_dir)
        .wrap_err("Could not resolve the frame directory")?;

    let frame_source = FrameSource::start(
        &frame_dir,
        Duration::from_secs_f64(exec_params.frame_period_s),
        exec_params.max_consec_frame_failures,
        slot.clone()
    ).wrap_err("Failed to start the FrameSource")?;

    let overlay_dir = session.session_root.join("overlay");
    if exec_params.overlay_enabled {
        std::fs::create_dir_all(&overlay_dir)
            .wrap_err("Could not create the overlay directory")?;
    }

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);

    loop {

        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // Clear items that need wiping at the start of the cycle
        ds.cycle_start(exec_params.overlay_period_cycles);

        // ---- SAFE MODE MANAGEMENT ----

        if slot.is_failed() {
            ds.make_safe(SafeModeCause::FrameSourceFailed);
        }
        else {
            ds.make_unsafe(SafeModeCause::FrameSourceFailed).ok();
        }

        // ---- PERCEPTION ----

        let latest = slot.latest();
        ds.frame_seq = latest.as_ref().map(|l| l.seq);
        ds.lane_det_input = lane_det::InputData {
            frame: latest.map(|l| l.frame)
        };

        if !ds.safe {
            match ds.lane_det.proc(&ds.lane_det_input) {
                Ok((perception, _)) => ds.perception = Some(perception),
                Err(e) => warn!("Error during LaneDet processing: {}", e)
            }
        }

        // ---- CONTROL ALGORITHM PROCESSING ----

        if let (false, Some(perception)) = (ds.safe, ds.perception.as_ref()) {
            let input = pd_ctrl::InputData {
                angle_deg: perception.angle_deg(),
                time: Instant::now()
            };

            match ds.pd_ctrl.proc(&input) {
                Ok((o, r)) => {
                    ds.pd_ctrl_output = o;
                    ds.pd_ctrl_status_rpt = r;
                },
                Err(e) => warn!("Error during PdCtrl processing: {}", e)
            }
        }
        else {
            ds.pd_ctrl_output = Command::safe();
        }

        // ---- COMMAND OUTPUT ----

        for sink in sinks.iter_mut() {
            if let Err(e) = sink.send(&ds.pd_ctrl_output) {
                warn!("Could not send command: {}", e);
            }
        }

        // ---- WRITE ARCHIVES ----

        if let Some(ref mut arch) = tick_arch {
            let results = [
                arch.serialise(ds.tick_record()),
                ds.lane_det.write(),
                ds.pd_ctrl.write()
            ];
            for e in results.iter().filter_map(|r| r.as_ref().err()) {
                warn!("Could not write archive: {}", e);
            }
        }

        // ---- DIAGNOSTICS OVERLAY ----

        if exec_params.overlay_enabled && ds.is_overlay_cycle {
            if let (Some(frame), Some(perception)) =
                (ds.lane_det_input.frame.as_ref(), ds.perception.as_ref())
            {
                let img = overlay::render(frame, &perception.lines, perception.angle_deg());
                let path = overlay_dir.join(format!("overlay_{:06}.png", ds.num_cycles));

                if let Err(e) = img.save(&path) {
                    warn!("Could not save overlay to {:?}: {}", path, e);
                }
            }
        }

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match cycle_period.checked_sub(cycle_dur) {
            Some(d) => {
                ds.num_consec_cycle_overruns = 0;
                thread::sleep(d);
            },
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - cycle_period.as_secs_f64()
                );
                ds.num_consec_cycle_overruns += 1;
            }
        }

        // Increment cycle counter
        ds.num_cycles += 1;

        if let Some(max) = max_cycles {
            if ds.num_cycles >= max {
                info!("Requested number of cycles ({}) complete, stopping", max);
                break;
            }
        }
    }

    // ---- SHUTDOWN ----

    frame_source.stop();
    session.exit();

    info!("End of execution");

    Ok(())
}

/// Resolve the frame directory, relative paths being relative to the software root.
fn resolve_frame_dir(frame_dir: &str) -> Result<PathBuf, Report> {
    let path = PathBuf::from(frame_dir);

    if path.is_absolute() {
        return Ok(path);
    }

    let root = host::get_sw_root()
        .wrap_err_with(|| format!("{} is not set", host::SW_ROOT_ENV_VAR))?;

    Ok(root.join(path))
}
