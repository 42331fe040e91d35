//! # Mechanisms Equipment Identifiers

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of positional servos on the robot.
pub const NUM_SERVOS: usize = 4;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// IDs of the positional servos available to the robot
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum ServoId {
    One,
    Two,
    Three,
    Four,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl ServoId {
    /// All servo IDs, in index order.
    pub const ALL: [ServoId; NUM_SERVOS] = [ServoId::One, ServoId::Two, ServoId::Three, ServoId::Four];

    /// Index of this servo into arrays of length [`NUM_SERVOS`].
    pub fn index(self) -> usize {
        match self {
            ServoId::One => 0,
            ServoId::Two => 1,
            ServoId::Three => 2,
            ServoId::Four => 3,
        }
    }
}
