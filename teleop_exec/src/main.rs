//! Main teleoperation executable entry point.
//! 
//! # Architecture
//! 
//! The executable owns the equipment and lends it to the supervisor for each
//! cycle:
//! 
//!     - Initialise the session, logging and parameters
//!     - Select the link source (a link script or no link)
//!     - Main loop, once per cycle period:
//!         - Link state polling
//!         - Teleoperation (servo commands, motor moves, telemetry) or
//!           fail-safe actuation
//!         - Idle, servicing any motor move
//!     - Return the equipment to its safe posture
//!
//! # Usage
//!
//!     teleop_exec [LINK_SCRIPT]
//!
//! With a link script the link is replayed from the script and execution
//! stops at the end of it. Without one the link is never connected, so the
//! robot holds its fail-safe posture until killed.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use std::env;
use color_eyre::{Report, eyre::{WrapErr, eyre}};

// Internal
use comms_if::link::LinkAdapter;
use teleop_lib::{
    link::{NullLink, ScriptedLink},
    pos_ctrl,
    sim::{SimRig, DEFAULT_REV_PER_EFFORT},
    supervisor::{self, Supervisor},
    tm_reporter
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
    time::WallClock
};

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Sources of link state for the executable.
enum LinkSource {
    Null(NullLink),
    Script(ScriptedLink)
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {

    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "teleop_exec", 
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Mimic Teleoperation Executable\n");
    info!("Running on: {}", host::get_host_desc());
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let sup_params: supervisor::Params = util::params::load(
        "teleop_exec.toml"
    ).wrap_err("Could not load exec params")?;

    let pos_ctrl_params: pos_ctrl::Params = util::params::load(
        "pos_ctrl.toml"
    ).wrap_err("Could not load PosCtrl params")?;

    let tm_reporter_params: tm_reporter::Params = util::params::load(
        "tm_reporter.toml"
    ).wrap_err("Could not load TmReporter params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE LINK SOURCE ----

    // Collect all arguments
    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    let mut link_source = match args.len() {
        // If we have a single argument use it as the script path
        2 => {
            info!("Loading link script from \"{}\"", &args[1]);

            LinkSource::Script(
                ScriptedLink::from_path(&args[1])
                    .wrap_err("Failed to load the link script")?
            )
        },
        1 => {
            info!("No link script provided, the link will never connect\n");
            LinkSource::Null(NullLink)
        },
        n => return Err(eyre!(
            "Expected either zero or one argument, found {}", n - 1
        ))
    };

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut supervisor = Supervisor::new(
        sup_params, 
        pos_ctrl_params, 
        tm_reporter_params, 
        Some(&session)
    ).wrap_err("Failed to initialise the supervisor")?;

    // No hardware drivers are linked into this executable, so the simulated
    // equipment stands in for them.
    let mut rig = SimRig::new(DEFAULT_REV_PER_EFFORT);
    let mut clock = WallClock::new();

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    loop {
        if link_source.is_finished() {
            info!("End of link script reached, stopping");
            break
        }

        supervisor.run_cycle(&mut rig.eqpt(link_source.adapter()), &mut clock);
    }

    // ---- SHUTDOWN ----

    supervisor.shutdown(&mut rig.eqpt(link_source.adapter()));

    info!(
        "Executed {} cycles, motor at {:.4} rev",
        supervisor.data_store().num_cycles,
        rig.motor.position_rev
    );
    info!("End of execution");

    Ok(())
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LinkSource {
    /// The link adapter for this source.
    fn adapter(&mut self) -> &mut dyn LinkAdapter {
        match self {
            LinkSource::Null(l) => l,
            LinkSource::Script(l) => l
        }
    }

    /// `true` once the source has nothing more to provide.
    fn is_finished(&self) -> bool {
        match self {
            LinkSource::Null(_) => false,
            LinkSource::Script(l) => l.is_finished()
        }
    }
}
