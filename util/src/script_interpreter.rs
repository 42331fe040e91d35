//! # Link script interpreter module
//!
//! This module provides an interpreter for link scripts, which record the
//! state of the wireless link over time so that it can be replayed without an
//! operator.
//!
//! A script is a series of timestamped link frames, one per line:
//!
//! ```text
//! 0.0: {"connected": false};
//! 1.5: {"connected": true, "angles": [90.0, 200.0, -1.0, 0.0, 45.0]};
//! ```
//!
//! Lines not matching this format (for example `#` comments) are ignored.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::fs;
use regex::RegexBuilder;
use thiserror::Error;

// Internal
use comms_if::link::{LinkFrame, LinkFrameParseError};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A link frame which is scripted to occur at a specific time.
struct ScriptedFrame {
    /// The time the frame is applied at
    exec_time_s: f64,

    /// The frame to apply
    frame: LinkFrame
}

/// A script interpreter.
///
/// After initialising with the path to the script to run use
/// `.get_pending_frames` to acquire the frames which have become due.
pub struct ScriptInterpreter {
    frames: VecDeque<ScriptedFrame>,
    num_frames: usize
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Could not find the script at {0:?}")]
    ScriptNotFound(PathBuf),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The script is empty (or is so bad it can't be read)")]
    ScriptEmpty,

    #[error(
        "Script contains an invalid timestamp: {0}. \
        Should be a float (like 1.0)")]
    InvalidTimestamp(String),

    #[error("Script timestamps must not decrease, {1} s follows {0} s")]
    OutOfOrder(f64, f64),

    #[error("Script contains an invalid frame at {0} s: {1}")]
    InvalidFrame(f64, LinkFrameParseError)
}

/// Frames which are due for execution.
#[derive(Debug, PartialEq)]
pub enum PendingFrames {
    None,
    Some(Vec<LinkFrame>),
    EndOfScript
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptInterpreter {

    /// Create a new interpreter from the given script path.
    pub fn new<P: AsRef<Path>>(script_path: P) -> Result<Self, ScriptError> {

        // Get the path in a buffer
        let path = PathBuf::from(script_path.as_ref());
        
        // Check that the script file exists.
        if !path.exists() {
            return Err(ScriptError::ScriptNotFound(path));
        }

        // Load the script into a string
        let script = fs::read_to_string(&path)
            .map_err(ScriptError::ScriptLoadError)?;

        Self::from_script(&script)
    }

    /// Create a new interpreter from the contents of a script.
    pub fn from_script(script: &str) -> Result<Self, ScriptError> {
        // Empty queue of frames
        let mut frames: VecDeque<ScriptedFrame> = VecDeque::new();

        // Go through the script executing __the magic regex__.
        let re = RegexBuilder::
            new(r"^\s*(\d+(\.\d+)?)\s*:\s*([^;]*);")
            .multi_line(true)
            .build()
            .expect("Script regex is invalid");

        for cap in re.captures_iter(script) {
            // Groups 1 and 3 always participate in a match
            let time_str = cap.get(1).map(|m| m.as_str()).unwrap_or_default();
            let frame_str = cap.get(3).map(|m| m.as_str()).unwrap_or_default();

            // Parse the exec time
            let exec_time_s: f64 = time_str
                .parse()
                .map_err(|e| ScriptError::InvalidTimestamp(format!("{}", e)))?;

            if let Some(prev) = frames.back() {
                if exec_time_s < prev.exec_time_s {
                    return Err(ScriptError::OutOfOrder(prev.exec_time_s, exec_time_s))
                }
            }

            // Parse the frame from the payload. The scripts contain JSON only.
            let frame = LinkFrame::from_json(frame_str)
                .map_err(|e| ScriptError::InvalidFrame(exec_time_s, e))?;

            frames.push_back(ScriptedFrame {
                exec_time_s,
                frame
            });
        }

        if frames.is_empty() {
            return Err(ScriptError::ScriptEmpty)
        }

        Ok(ScriptInterpreter {
            num_frames: frames.len(),
            frames
        })
    }

    /// Return the frames which are due at `current_time_s`, in script order.
    pub fn get_pending_frames(&mut self, current_time_s: f64) -> PendingFrames {

        // If the queue is empty the script is over and we return the end of
        // script variant
        if self.frames.is_empty() {
            return PendingFrames::EndOfScript
        }

        let mut frame_vec: Vec<LinkFrame> = vec![];

        // Pop items from the queue while the head's exec time has been
        // reached.
        while let Some(f) = self.frames.front() {
            if f.exec_time_s > current_time_s {
                break;
            }

            if let Some(f) = self.frames.pop_front() {
                frame_vec.push(f.frame);
            }
        }

        if frame_vec.is_empty() {
            PendingFrames::None
        }
        else {
            PendingFrames::Some(frame_vec)
        }
    }

    /// Get the number of frames in the script
    pub fn get_num_frames(&self) -> usize {
        self.num_frames
    }

    /// Get the length of the script in seconds
    pub fn get_duration(&self) -> f64 {
        match self.frames.back() {
            Some(f) => f.exec_time_s,
            None => 0f64
        }
    }
}
