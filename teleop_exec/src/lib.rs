//! # Teleoperation library.
//!
//! This library allows other crates in the workspace, along with the
//! benchmarks, to access items defined inside the teleoperation crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Angle mapper - folds full-circle commands onto the servo range
pub mod angle_map;

/// Data store - mode and counters owned by the supervisor
pub mod data_store;

/// Link sources - scripted and disconnected link adapters
pub mod link;

/// Position control module - closed-loop moves of the motor
pub mod pos_ctrl;

/// Simulated equipment
pub mod sim;

/// Supervisor - the fixed-period cycle arbitrating teleoperation and fail-safe
pub mod supervisor;

/// Telemetry reporter - battery voltage reports to the operator
pub mod tm_reporter;
