//! # Equipment Interface
//!
//! This module defines the interfaces to the robot's equipment. Drivers for the real hardware
//! implement these traits outside of this workspace; the executable only ever talks to equipment
//! through them.

// -----------------------------------------------------------------------------------------------
// MODULES
// -----------------------------------------------------------------------------------------------

pub mod mech;

// -----------------------------------------------------------------------------------------------
// IMPORTS
// -----------------------------------------------------------------------------------------------

use crate::link::LinkAdapter;
pub use mech::{ServoId, NUM_SERVOS};

// -----------------------------------------------------------------------------------------------
// TRAITS
// -----------------------------------------------------------------------------------------------

/// A positional servo.
pub trait Servo {
    /// Command the servo to the given angle.
    ///
    /// Units: degrees, in the range `[0, 180]`
    fn set_angle(&mut self, angle_deg: f64);
}

/// A motor with an encoder and an active brake, driven in closed loop.
pub trait Motor {
    /// Get the current position of the motor shaft.
    ///
    /// Units: revolutions
    fn get_position(&mut self) -> f64;

    /// Set the effort applied by the motor, between -1.0 and +1.0.
    fn set_effort(&mut self, effort: f64);

    /// Engage the motor's brake, holding the current position.
    fn brake(&mut self);
}

/// A differential drivetrain.
pub trait Drivetrain {
    /// Drive using arcade style demands, both between -1.0 and +1.0.
    fn arcade(&mut self, throttle: f64, rotation: f64);
}

/// The battery voltage sensor.
pub trait BatterySensor {
    /// Take a raw sample from the sensor's ADC.
    fn read_raw(&mut self) -> u16;
}

// -----------------------------------------------------------------------------------------------
// STRUCTS
// -----------------------------------------------------------------------------------------------

/// Handles to all of the robot's equipment.
///
/// The equipment itself is owned by the executable's composition root, which lends it to the
/// supervisor through this struct. Nothing in the software reaches equipment any other way.
pub struct Eqpt<'a> {
    /// The wireless link adapter
    pub link: &'a mut dyn LinkAdapter,

    /// Positional servos, indexed by [`ServoId::index`]
    pub servos: [&'a mut dyn Servo; NUM_SERVOS],

    /// The closed-loop motor, if one is fitted
    pub motor: Option<&'a mut dyn Motor>,

    /// The differential drivetrain
    pub drivetrain: &'a mut dyn Drivetrain,

    /// The battery voltage sensor
    pub battery: &'a mut dyn BatterySensor,
}

// -----------------------------------------------------------------------------------------------
// IMPLS
// -----------------------------------------------------------------------------------------------

impl<'a> Eqpt<'a> {
    /// Command the given servo to an angle.
    pub fn set_servo_angle(&mut self, id: ServoId, angle_deg: f64) {
        self.servos[id.index()].set_angle(angle_deg)
    }
}
