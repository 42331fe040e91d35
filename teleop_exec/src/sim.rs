//! # Simulated equipment
//!
//! Stand-ins for the robot's equipment which record every call made on them.
//! These are used by the executable when no hardware is attached, and by the
//! tests and benchmarks.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::trace;

use comms_if::{
    eqpt::{BatterySensor, Drivetrain, Eqpt, Motor, Servo, NUM_SERVOS},
    link::{LinkAdapter, LinkFrame}
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Default motion of the simulated motor for each unit of effort applied.
///
/// Units: revolutions
pub const DEFAULT_REV_PER_EFFORT: f64 = 0.01;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A simulated link adapter whose state is set directly.
#[derive(Debug, Clone, Default)]
pub struct SimLink {
    pub frame: LinkFrame,

    /// Number of times the connection state was polled
    pub num_polls: usize,

    /// Every battery voltage reported over the link
    pub reported_volts: Vec<f64>
}

/// A simulated positional servo.
#[derive(Debug, Clone, Default)]
pub struct SimServo {
    /// The last angle commanded, if any
    pub angle_deg: Option<f64>,

    /// Every angle commanded
    pub history: Vec<f64>
}

/// A simulated motor.
///
/// Each call to `set_effort` moves the shaft by `effort * rev_per_effort`,
/// unless the motor is stuck.
#[derive(Debug, Clone, Default)]
pub struct SimMotor {
    pub position_rev: f64,

    pub effort: f64,

    pub rev_per_effort: f64,

    /// If true the shaft never moves
    pub stuck: bool,

    /// True while the brake is on
    pub braked: bool,

    pub num_brakes: usize,

    /// Every effort demanded
    pub effort_history: Vec<f64>
}

/// A simulated drivetrain.
#[derive(Debug, Clone, Default)]
pub struct SimDrivetrain {
    /// Every (throttle, rotation) demand
    pub history: Vec<(f64, f64)>
}

/// A simulated battery voltage sensor returning a fixed reading.
#[derive(Debug, Clone, Default)]
pub struct SimBattery {
    pub raw: u16,

    pub num_reads: usize
}

/// A complete set of simulated equipment, apart from the link.
#[derive(Debug, Clone, Default)]
pub struct SimRig {
    pub servos: [SimServo; NUM_SERVOS],
    pub motor: SimMotor,
    pub drivetrain: SimDrivetrain,
    pub battery: SimBattery
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SimLink {
    /// A link which is connected and carries the given angles.
    pub fn connected(angles: Vec<f64>) -> Self {
        Self {
            frame: LinkFrame {
                connected: true,
                angles
            },
            ..Default::default()
        }
    }
}

impl LinkAdapter for SimLink {
    fn is_connected(&mut self) -> bool {
        self.num_polls += 1;
        self.frame.connected
    }

    fn get_angle(&mut self, channel: usize) -> f64 {
        self.frame.angle(channel)
    }

    fn report_battery_voltage(&mut self, volts: f64) {
        self.reported_volts.push(volts);
    }
}

impl Servo for SimServo {
    fn set_angle(&mut self, angle_deg: f64) {
        trace!("SimServo -> {:.1} deg", angle_deg);
        self.angle_deg = Some(angle_deg);
        self.history.push(angle_deg);
    }
}

impl SimMotor {
    /// A free motor at position zero.
    pub fn new(rev_per_effort: f64) -> Self {
        Self {
            rev_per_effort,
            ..Default::default()
        }
    }
}

impl Motor for SimMotor {
    fn get_position(&mut self) -> f64 {
        self.position_rev
    }

    fn set_effort(&mut self, effort: f64) {
        self.effort = effort;
        self.effort_history.push(effort);

        if effort != 0.0 {
            self.braked = false;
        }

        if !self.stuck && !self.braked {
            self.position_rev += effort * self.rev_per_effort;
        }
    }

    fn brake(&mut self) {
        trace!("SimMotor braked at {:.4} rev", self.position_rev);
        self.braked = true;
        self.num_brakes += 1;
    }
}

impl Drivetrain for SimDrivetrain {
    fn arcade(&mut self, throttle: f64, rotation: f64) {
        self.history.push((throttle, rotation));
    }
}

impl SimBattery {
    pub fn new(raw: u16) -> Self {
        Self {
            raw,
            num_reads: 0
        }
    }
}

impl BatterySensor for SimBattery {
    fn read_raw(&mut self) -> u16 {
        self.num_reads += 1;
        self.raw
    }
}

impl SimRig {
    /// A rig whose motor moves by `rev_per_effort` for each unit of effort.
    pub fn new(rev_per_effort: f64) -> Self {
        Self {
            motor: SimMotor::new(rev_per_effort),
            ..Default::default()
        }
    }

    /// Lend the rig's equipment, along with the given link, to the software.
    pub fn eqpt<'a>(&'a mut self, link: &'a mut dyn LinkAdapter) -> Eqpt<'a> {
        let [s1, s2, s3, s4] = &mut self.servos;

        Eqpt {
            link,
            servos: [s1, s2, s3, s4],
            motor: Some(&mut self.motor as &mut dyn Motor),
            drivetrain: &mut self.drivetrain,
            battery: &mut self.battery
        }
    }
}
