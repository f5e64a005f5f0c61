//! # Replay Frame Source
//!
//! Stands in for the camera by cycling through the image files in a directory at a fixed period,
//! publishing each one into the frame slot from a background thread.
//!
//! Files which fail to decode are logged and skipped. If more than the allowed number of
//! consecutive files fail, or the directory holds no images at all, the slot is marked as failed
//! so that the control loop can make itself safe. A later successful decode clears the failure.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    path::{Path, PathBuf},
    sync::{Arc, atomic::{AtomicBool, Ordering}},
    thread::{self, JoinHandle},
    time::{Duration, Instant}
};
use chrono::Utc;
use log::{debug, error, info, warn};

use comms_if::eqpt::cam::{CamFrame, ImageFormat};
use crate::{frame::{Frame, FrameError}, frame_slot::FrameSlot};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Longest time the background thread sleeps before checking whether it should stop.
const STOP_POLL_PERIOD: Duration = Duration::from_millis(10);

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct FrameSource {
    bg_jh: Option<JoinHandle<()>>,
    bg_run: Arc<AtomicBool>,
    num_files: usize
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum FrameSourceError {
    #[error("Could not read the frame directory {0:?}: {1}")]
    DirReadError(PathBuf, std::io::Error),

    #[error("Could not read the frame file {0:?}: {1}")]
    FileReadError(PathBuf, std::io::Error),

    #[error("Could not decode the frame file {0:?}: {1}")]
    DecodeError(PathBuf, FrameError)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FrameSource {
    /// Start replaying the images in `dir` into `slot`, one every `period`.
    pub fn start<P: AsRef<Path>>(
        dir: P,
        period: Duration,
        max_consec_failures: u32,
        slot: FrameSlot
    ) -> Result<Self, FrameSourceError> {
        let files = list_image_files(dir.as_ref())?;
        let num_files = files.len();
        let bg_run = Arc::new(AtomicBool::new(true));

        if files.is_empty() {
            error!("No image files found in {:?}", dir.as_ref());
            slot.mark_failed();

            return Ok(Self {
                bg_jh: None,
                bg_run,
                num_files
            });
        }

        info!("Replaying {} frames from {:?}", num_files, dir.as_ref());

        let bg_run_clone = bg_run.clone();
        let bg_jh = Some(thread::spawn(move || {
            bg_thread(files, period, max_consec_failures, slot, bg_run_clone)
        }));

        Ok(Self {
            bg_jh,
            bg_run,
            num_files
        })
    }

    /// Number of image files being replayed.
    pub fn num_files(&self) -> usize {
        self.num_files
    }

    /// Stop the background thread and wait for it to exit.
    pub fn stop(mut self) {
        self.stop_bg();
    }

    fn stop_bg(&mut self) {
        self.bg_run.store(false, Ordering::Relaxed);

        if let Some(jh) = self.bg_jh.take() {
            if jh.join().is_err() {
                error!("FrameSource background thread panicked");
            }
        }
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.stop_bg();
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Load and decode a single image file into a frame.
pub fn load_frame(path: &Path) -> Result<Frame, FrameSourceError> {
    let data = std::fs::read(path)
        .map_err(|e| FrameSourceError::FileReadError(path.to_path_buf(), e))?;

    let cam_frame = CamFrame {
        timestamp: Utc::now(),
        format: image_format(path).unwrap_or(ImageFormat::Png),
        data
    };

    Frame::from_cam_frame(&cam_frame)
        .map_err(|e| FrameSourceError::DecodeError(path.to_path_buf(), e))
}

/// List the image files in the directory, sorted by name.
fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>, FrameSourceError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| FrameSourceError::DirReadError(dir.to_path_buf(), e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && image_format(p).is_some())
        .collect();

    files.sort();

    Ok(files)
}

/// The image format implied by the file's extension.
fn image_format(path: &Path) -> Option<ImageFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    match ext.as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg(100)),
        _ => None
    }
}

/// Background thread, publishes the next file into the slot every period.
fn bg_thread(
    files: Vec<PathBuf>,
    period: Duration,
    max_consec_failures: u32,
    slot: FrameSlot,
    run: Arc<AtomicBool>
) {
    let mut num_consec_failures = 0u32;

    for path in files.iter().cycle() {
        if !run.load(Ordering::Relaxed) {
            break;
        }

        let start = Instant::now();

        match load_frame(path) {
            Ok(frame) => {
                if slot.is_failed() {
                    info!("Frame source recovered");
                }
                num_consec_failures = 0;
                slot.publish(frame);
                debug!("Published frame {:?}", path);
            },
            Err(e) => {
                warn!("{}", e);
                num_consec_failures += 1;

                if num_consec_failures > max_consec_failures && !slot.is_failed() {
                    error!(
                        "Maximum number of consecutive frame failures ({}) exceeded",
                        max_consec_failures
                    );
                    slot.mark_failed();
                }
            }
        }

        // Sleep out the rest of the period, checking for a stop request
        while run.load(Ordering::Relaxed) {
            match period.checked_sub(start.elapsed()) {
                Some(d) if d > Duration::from_millis(0) => {
                    thread::sleep(d.min(STOP_POLL_PERIOD))
                },
                _ => break
            }
        }
    }
}
