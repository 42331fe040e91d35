//! # Link Adapter Interface
//!
//! The link adapter owns the wireless connection to the operator. Pairing, transport and packet
//! framing all happen on the far side of this interface; the teleoperation software only polls the
//! connection state, reads per-channel angle commands and reports telemetry back.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Lowest valid commanded angle.
///
/// Units: degrees
pub const MIN_CMD_ANGLE_DEG: f64 = 0.0;

/// Highest valid commanded angle.
///
/// Units: degrees
pub const MAX_CMD_ANGLE_DEG: f64 = 360.0;

/// Value a link adapter returns for a channel which carries no command this cycle. Any value
/// outside `[MIN_CMD_ANGLE_DEG, MAX_CMD_ANGLE_DEG]` has the same meaning.
pub const NO_CMD: f64 = -1.0;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// The narrow interface consumed from the wireless link adapter.
///
/// Connection state is polled every cycle and must never be cached by the caller beyond that
/// cycle.
pub trait LinkAdapter {
    /// Returns `true` if an operator is currently connected.
    fn is_connected(&mut self) -> bool;

    /// Get the latest commanded angle on `channel` in degrees.
    ///
    /// Values outside `[0, 360]` mean there is no command on this channel this cycle.
    fn get_angle(&mut self, channel: usize) -> f64;

    /// Send the battery voltage to the operator.
    ///
    /// If the link is not connected the report may be dropped silently.
    fn report_battery_voltage(&mut self, volts: f64);
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A snapshot of the link state: whether it's connected and the angle on each channel.
///
/// Used to record and replay link activity, for example in link scripts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LinkFrame {
    /// Whether the operator is connected.
    pub connected: bool,

    /// Commanded angle per channel, indexed by channel number.
    ///
    /// Units: degrees
    #[serde(default)]
    pub angles: Vec<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Errors which can occur when parsing a link frame.
#[derive(Debug, Error)]
pub enum LinkFrameParseError {
    #[error("Link frame contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl LinkFrame {
    /// Parse a frame from a JSON string, for example
    /// `{"connected": true, "angles": [90.0, 200.0]}`.
    pub fn from_json(json_str: &str) -> Result<Self, LinkFrameParseError> {
        serde_json::from_str(json_str).map_err(LinkFrameParseError::InvalidJson)
    }

    /// Get the angle on the given channel, or [`NO_CMD`] if the frame doesn't carry that channel.
    pub fn angle(&self, channel: usize) -> f64 {
        self.angles.get(channel).copied().unwrap_or(NO_CMD)
    }
}

/// Returns `true` if the angle is a command rather than the "no command" sentinel.
pub fn is_valid_cmd(angle_deg: f64) -> bool {
    (MIN_CMD_ANGLE_DEG..=MAX_CMD_ANGLE_DEG).contains(&angle_deg)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_frame_from_json() {
        let frame = LinkFrame::from_json(r#"{"connected": true, "angles": [90.0, 270.5]}"#)
            .unwrap();

        assert!(frame.connected);
        assert_eq!(frame.angle(0), 90.0);
        assert_eq!(frame.angle(1), 270.5);
        assert_eq!(frame.angle(7), NO_CMD);

        // Angles may be omitted entirely
        let frame = LinkFrame::from_json(r#"{"connected": false}"#).unwrap();
        assert!(!frame.connected);
        assert!(frame.angles.is_empty());

        assert!(LinkFrame::from_json("{connected}").is_err());
    }

    #[test]
    fn test_is_valid_cmd() {
        assert!(is_valid_cmd(0.0));
        assert!(is_valid_cmd(180.0));
        assert!(is_valid_cmd(360.0));
        assert!(!is_valid_cmd(NO_CMD));
        assert!(!is_valid_cmd(360.01));
        assert!(!is_valid_cmd(f64::NAN));
    }
}
