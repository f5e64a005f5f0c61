//! # Command Sink
//!
//! Output channel for the steering and drive commands. The actuator transport
//! itself is external, sinks here either log the commands or archive them.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::debug;
use serde::Serialize;
use std::path::Path;

use util::{
    archive::{ArchiveError, Archiver},
    session::{self, Session}
};

use crate::pd_ctrl::Command;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Something which accepts commands for the actuators.
pub trait CommandSink {
    /// Send a command.
    fn send(&mut self, cmd: &Command) -> Result<(), CmdSinkError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Sink which logs each command.
#[derive(Default)]
pub struct LogSink {
    num_sent: u64
}

/// Sink which appends each command to a CSV archive.
pub struct ArchiveSink {
    arch: Archiver
}

#[derive(Serialize)]
struct CommandRecord {
    time_s: f64,
    steer_deg: u16,
    drive_duty_0: u16,
    drive_duty_1: u16
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug)]
pub enum CmdSinkError {
    #[error("Could not archive the command: {0}")]
    ArchiveError(ArchiveError),

    #[error("Command is outside the actuator ranges: {0:?}")]
    InvalidCommand(Command)
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commands sent through this sink.
    pub fn num_sent(&self) -> u64 {
        self.num_sent
    }
}

impl CommandSink for LogSink {
    fn send(&mut self, cmd: &Command) -> Result<(), CmdSinkError> {
        if !cmd.is_valid() {
            return Err(CmdSinkError::InvalidCommand(*cmd));
        }

        self.num_sent += 1;
        debug!(
            "Command {}: servo {} deg, drive {:?}",
            self.num_sent, cmd.steer_deg, cmd.drive_duty
        );

        Ok(())
    }
}

impl ArchiveSink {
    /// Create a sink archiving into `cmd_sink/commands.csv` in the session.
    pub fn new(session: &Session) -> Result<Self, CmdSinkError> {
        Ok(Self {
            arch: Archiver::from_path(session, "cmd_sink/commands.csv")
                .map_err(CmdSinkError::ArchiveError)?
        })
    }

    /// Create a sink archiving into the given file.
    pub fn from_file_path<P: AsRef<Path>>(path: P) -> Result<Self, CmdSinkError> {
        Ok(Self {
            arch: Archiver::from_file_path(path).map_err(CmdSinkError::ArchiveError)?
        })
    }
}

impl CommandSink for ArchiveSink {
    fn send(&mut self, cmd: &Command) -> Result<(), CmdSinkError> {
        self.arch
            .serialise(CommandRecord {
                time_s: session::get_elapsed_seconds(),
                steer_deg: cmd.steer_deg,
                drive_duty_0: cmd.drive_duty[0],
                drive_duty_1: cmd.drive_duty[1]
            })
            .map_err(CmdSinkError::ArchiveError)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_log_sink() {
        let mut sink = LogSink::new();

        sink.send(&Command::safe()).unwrap();
        sink.send(&Command { steer_deg: 45, drive_duty: [30, 30] }).unwrap();
        assert_eq!(sink.num_sent(), 2);

        let bad = Command { steer_deg: 200, drive_duty: [0, 0] };
        assert!(matches!(sink.send(&bad), Err(CmdSinkError::InvalidCommand(_))));
        assert_eq!(sink.num_sent(), 2);
    }

    #[test]
    fn test_archive_sink() {
        let path = std::env::temp_dir()
            .join(format!("lane_cmd_sink_test_{}", std::process::id()))
            .join("commands.csv");

        {
            let mut sink = ArchiveSink::from_file_path(&path).unwrap();
            sink.send(&Command { steer_deg: 81, drive_duty: [29, 29] }).unwrap();
            sink.send(&Command::safe()).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "time_s,steer_deg,drive_duty_0,drive_duty_1");
        assert!(lines[1].ends_with(",81,29,29"));
        assert!(lines[2].ends_with(",90,0,0"));

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
