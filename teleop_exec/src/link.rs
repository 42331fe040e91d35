//! # Link sources
//!
//! Link adapters available to the executable when no radio is attached:
//! - [`ScriptedLink`] replays a link script, letting a session be driven
//!   without an operator.
//! - [`NullLink`] is never connected, so the robot stays in its fail-safe
//!   state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace};
use std::path::Path;
use thiserror::Error;

// Internal
use comms_if::link::{LinkAdapter, LinkFrame, NO_CMD};
use util::{
    script_interpreter::{PendingFrames, ScriptError, ScriptInterpreter},
    session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A link adapter replaying a link script.
///
/// Script times are measured from the start of the session, so a session must
/// have been created before the link is polled. Until the first frame is due
/// the link is disconnected.
pub struct ScriptedLink {
    si: ScriptInterpreter,

    /// The most recent frame from the script
    frame: LinkFrame,

    finished: bool,

    /// The last battery voltage reported
    last_volts: Option<f64>
}

/// A link adapter which is never connected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLink;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("Could not load the link script: {0}")]
    ScriptError(#[from] ScriptError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ScriptedLink {
    /// Load a scripted link from the script at the given path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, LinkError> {
        let si = ScriptInterpreter::new(path)?;

        info!(
            "Loaded link script lasts {:.02} s and contains {} frames",
            si.get_duration(),
            si.get_num_frames()
        );

        Ok(Self::new(si))
    }

    pub fn new(si: ScriptInterpreter) -> Self {
        Self {
            si,
            frame: LinkFrame::default(),
            finished: false,
            last_volts: None
        }
    }

    /// Apply all frames due at `time_s` seconds into the script.
    ///
    /// Frames are applied in order, so the latest one due sets the link state.
    pub fn apply_until(&mut self, time_s: f64) {
        match self.si.get_pending_frames(time_s) {
            PendingFrames::None => (),
            PendingFrames::Some(frames) => {
                for frame in frames {
                    if frame.connected != self.frame.connected {
                        info!(
                            "Scripted link {} at {:.2} s", 
                            if frame.connected { "connected" } else { "disconnected" },
                            time_s
                        );
                    }
                    debug!("Applying link frame {:?}", frame);
                    self.frame = frame;
                }
            },
            PendingFrames::EndOfScript => {
                if !self.finished {
                    info!("End of link script reached at {:.2} s", time_s);
                }
                self.finished = true;
            }
        }
    }

    /// `true` once every frame has been applied and the script has been
    /// polled again.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// The frame currently in effect.
    pub fn frame(&self) -> &LinkFrame {
        &self.frame
    }

    /// The last battery voltage reported over the link.
    pub fn last_volts(&self) -> Option<f64> {
        self.last_volts
    }
}

impl LinkAdapter for ScriptedLink {
    fn is_connected(&mut self) -> bool {
        self.apply_until(session::get_elapsed_seconds());

        self.frame.connected
    }

    fn get_angle(&mut self, channel: usize) -> f64 {
        self.frame.angle(channel)
    }

    fn report_battery_voltage(&mut self, volts: f64) {
        if self.frame.connected {
            trace!("Battery voltage report: {:.2} V", volts);
            self.last_volts = Some(volts);
        }
    }
}

impl LinkAdapter for NullLink {
    fn is_connected(&mut self) -> bool {
        false
    }

    fn get_angle(&mut self, _channel: usize) -> f64 {
        NO_CMD
    }

    fn report_battery_voltage(&mut self, volts: f64) {
        trace!("Battery voltage report dropped: {:.2} V", volts);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SCRIPT: &str = r#"
        0.5: {"connected": true, "angles": [90.0, 200.0]};
        1.0: {"connected": true, "angles": [100.0]};
        2.0: {"connected": false};
    "#;

    #[test]
    fn test_scripted_link() {
        let mut link = ScriptedLink::new(
            ScriptInterpreter::from_script(SCRIPT).unwrap()
        );

        // Nothing due yet
        link.apply_until(0.1);
        assert!(!link.frame().connected);
        assert_eq!(link.get_angle(0), NO_CMD);

        link.apply_until(0.5);
        assert!(link.frame().connected);
        assert_eq!(link.get_angle(1), 200.0);

        // Voltage reports only go out while connected
        link.report_battery_voltage(12.0);
        assert_eq!(link.last_volts(), Some(12.0));

        // Later frame replaces the whole state
        link.apply_until(1.5);
        assert_eq!(link.get_angle(0), 100.0);
        assert_eq!(link.get_angle(1), NO_CMD);

        link.apply_until(2.0);
        assert!(!link.frame().connected);
        link.report_battery_voltage(11.0);
        assert_eq!(link.last_volts(), Some(12.0));
        assert!(!link.is_finished());

        link.apply_until(2.1);
        assert!(link.is_finished());
    }

    #[test]
    fn test_scripted_link_follows_session_time() {
        let root = tempfile::tempdir().unwrap();
        std::env::set_var(util::host::SW_ROOT_ENV_VAR, root.path());
        let _session = session::Session::new("link_test", "sessions").unwrap();

        let mut link = ScriptedLink::new(
            ScriptInterpreter::from_script(
                r#"0.0: {"connected": true, "angles": [90.0]};"#
            ).unwrap()
        );

        // Session time is already past the only frame
        assert!(link.is_connected());
        assert_eq!(link.get_angle(0), 90.0);

        let late = session::get_elapsed_seconds() + 60.0;
        let mut link = ScriptedLink::new(
            ScriptInterpreter::from_script(
                &format!(r#"{:.1}: {{"connected": true}};"#, late)
            ).unwrap()
        );
        assert!(!link.is_connected());
        assert!(!link.is_finished());
    }

    #[test]
    fn test_missing_script() {
        assert!(matches!(
            ScriptedLink::from_path("no/such/script.txt"),
            Err(LinkError::ScriptError(ScriptError::ScriptNotFound(_)))
        ));
    }

    #[test]
    fn test_null_link() {
        let mut link = NullLink;
        assert!(!link.is_connected());
        assert_eq!(link.get_angle(0), NO_CMD);
        link.report_battery_voltage(12.0);
        assert!(!link.is_connected());
    }
}
