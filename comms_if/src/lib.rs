//! # Communications interface crate.
//!
//! Provides the interfaces between the teleoperation software and its external collaborators: the
//! wireless link adapter and the robot's equipment (servos, motor, drivetrain, battery sensor).

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Interface to the wireless link adapter
pub mod link;

/// Interfaces to the robot's equipment (actuators and sensors)
pub mod eqpt;
