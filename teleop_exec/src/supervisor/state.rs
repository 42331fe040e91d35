//! Implementations for the supervisor state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use std::time::Duration;

// Internal
use super::{CycleReport, MoveExec, Params, SupervisorError};
use crate::{
    angle_map,
    data_store::{DataStore, FailSafeCause, Mode},
    pos_ctrl::{self, MotorDem, MotorMoveRequest, MotorSample, MoveOutcome, PosCtrl},
    tm_reporter::{self, TmReporter}
};
use comms_if::{eqpt::Eqpt, link::is_valid_cmd};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    maths::{get_ang_dist, rem_euclid, rev_to_deg, DEG_PER_REV},
    module::State,
    session::Session,
    time::Clock
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The supervisor, owning every processing module.
///
/// Equipment is not owned by the supervisor, it is lent for each cycle.
pub struct Supervisor {
    params: Params,

    ds: DataStore,

    pos_ctrl: PosCtrl,

    tm_reporter: TmReporter,

    report: CycleReport,
    arch_report: Option<Archiver>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Supervisor {
    /// Create a new supervisor, initialising its modules.
    ///
    /// Cycle reports are only archived if a session is given and archiving
    /// is enabled in the parameters.
    pub fn new(
        params: Params,
        pos_ctrl_params: pos_ctrl::Params,
        tm_reporter_params: tm_reporter::Params,
        session: Option<&Session>
    ) -> Result<Self, SupervisorError> {
        params.are_valid()?;

        let mut pos_ctrl = PosCtrl::default();
        pos_ctrl.init(pos_ctrl_params, session)?;
        debug!("PosCtrl init complete");

        let mut tm_reporter = TmReporter::default();
        tm_reporter.init(tm_reporter_params, session)?;
        debug!("TmReporter init complete");

        let arch_report = match (params.archive, session) {
            (true, Some(s)) => Some(
                Archiver::from_path(s, "supervisor/cycle_report.csv")?
            ),
            _ => None
        };

        match params.motor {
            Some(m) => info!(
                "Closed-loop motor on channel {}, {:?} moves", 
                m.channel, 
                params.move_exec
            ),
            None => info!("No closed-loop motor channel")
        }

        Ok(Self {
            params,
            ds: DataStore::default(),
            pos_ctrl,
            tm_reporter,
            report: CycleReport::default(),
            arch_report
        })
    }

    /// Run one full cycle.
    ///
    /// The cycle's processing is followed by an idle phase lasting until the
    /// end of the cycle period, during which an active stepped move is
    /// serviced once per control sample period.
    pub fn run_cycle<C: Clock + ?Sized>(
        &mut self, 
        eqpt: &mut Eqpt<'_>, 
        clock: &mut C
    ) -> CycleReport {
        let cycle_start = clock.now();
        let period = self.params.cycle_period();
        let deadline = cycle_start + period;

        self.proc_cycle(eqpt, clock);

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = clock.now().saturating_sub(cycle_start);

        if cycle_dur > period {
            let overrun = cycle_dur - period;
            warn!("Cycle overran by {:.06} s", overrun.as_secs_f64());

            self.ds.num_consec_cycle_overruns += 1;
            self.report.overrun_s = Some(overrun.as_secs_f64());
        }
        else {
            self.ds.num_consec_cycle_overruns = 0;
        }

        // ---- IDLE ----

        let sample_period = self.pos_ctrl.params().sample_period();

        while self.pos_ctrl.is_active() {
            let remaining = match deadline.checked_sub(clock.now()) {
                Some(r) if r > Duration::from_secs(0) => r,
                _ => break
            };

            clock.sleep(remaining.min(sample_period));
            self.step_move(eqpt, clock.now_s());
        }

        if let Some(remaining) = deadline.checked_sub(clock.now()) {
            clock.sleep(remaining);
        }

        self.report.move_active = self.pos_ctrl.is_active();

        // ---- WRITE ARCHIVES ----

        if let Err(e) = self.write() {
            warn!("Could not archive the cycle report: {}", e);
        }

        self.ds.num_cycles += 1;

        self.report
    }

    /// Put the equipment into its safe posture ahead of stopping.
    pub fn shutdown(&mut self, eqpt: &mut Eqpt<'_>) {
        info!("Supervisor shutting down");
        self.ds.make_safe(FailSafeCause::Shutdown);
        self.fail_safe(eqpt);
    }

    /// The current operating mode.
    pub fn mode(&self) -> Mode {
        self.ds.mode()
    }

    pub fn data_store(&self) -> &DataStore {
        &self.ds
    }

    /// The report of the last cycle.
    pub fn report(&self) -> &CycleReport {
        &self.report
    }

    /// Process one cycle without the idle phase.
    fn proc_cycle<C: Clock + ?Sized>(&mut self, eqpt: &mut Eqpt<'_>, clock: &mut C) {
        // Clear the report
        self.report = CycleReport {
            cycle: self.ds.num_cycles,
            time_s: clock.now_s(),
            ..Default::default()
        };

        // The first position seen is the motor's zero reference
        if self.ds.motor_zero_rev.is_none() {
            if let Some(m) = eqpt.motor.as_mut() {
                let zero_rev = m.get_position();
                debug!("Motor zero reference at {:.4} rev", zero_rev);
                self.ds.motor_zero_rev = Some(zero_rev);
            }
        }

        // ---- LINK STATE ----

        // The connection state is polled fresh each cycle and never reused
        if eqpt.link.is_connected() {
            self.ds.make_unsafe();
        }
        else {
            self.ds.make_safe(FailSafeCause::LinkLost);
        }

        self.report.teleop = self.ds.is_teleoperating();

        // ---- MODE ACTIONS ----

        match self.ds.mode() {
            Mode::Teleoperating => self.teleoperate(eqpt, clock),
            Mode::FailSafe => self.fail_safe(eqpt)
        }
    }

    /// Follow the operator's commands.
    fn teleoperate<C: Clock + ?Sized>(&mut self, eqpt: &mut Eqpt<'_>, clock: &mut C) {
        for sc in self.params.servo_channels.iter() {
            let angle_deg = eqpt.link.get_angle(sc.channel);

            match angle_map::apply(&mut *eqpt.servos[sc.servo.index()], angle_deg) {
                Some(_) => self.report.servos_commanded += 1,
                None => trace!(
                    "Ignoring {:.1} deg on channel {} for servo {:?}", 
                    angle_deg, 
                    sc.channel, 
                    sc.servo
                )
            }
        }

        self.dispatch_motor(eqpt, clock);

        let raw = eqpt.battery.read_raw();
        self.report.battery_v = Some(self.tm_reporter.report(raw, &mut *eqpt.link));
    }

    /// Hold the equipment in its safe posture.
    fn fail_safe(&mut self, eqpt: &mut Eqpt<'_>) {
        eqpt.drivetrain.arcade(0.0, 0.0);
        eqpt.set_servo_angle(self.params.failsafe.servo, self.params.failsafe.angle_deg);

        if self.pos_ctrl.abort() {
            if let Some(m) = eqpt.motor.as_mut() {
                pos_ctrl::apply_dem(&mut **m, MotorDem::Release);
            }
            self.report.move_outcome = Some(MoveOutcome::Aborted);
        }
    }

    /// Start a motor move if the closed-loop channel carries a new command.
    fn dispatch_motor<C: Clock + ?Sized>(&mut self, eqpt: &mut Eqpt<'_>, clock: &mut C) {
        let mc = match self.params.motor {
            Some(m) => m,
            None => return
        };

        if self.pos_ctrl.is_active() {
            return
        }

        let motor = match eqpt.motor.as_mut() {
            Some(m) => m,
            None => return
        };

        let cmd_deg = eqpt.link.get_angle(mc.channel);
        if !is_valid_cmd(cmd_deg) {
            trace!("Ignoring {:.1} deg on motor channel {}", cmd_deg, mc.channel);
            return
        }

        // Only a changed command starts a move, so a failed move isn't
        // retried until the operator asks for something else.
        if let Some(last) = self.ds.last_motor_cmd_deg {
            if get_ang_dist(last, cmd_deg, DEG_PER_REV).abs() < mc.tolerance_deg {
                return
            }
        }
        self.ds.last_motor_cmd_deg = Some(cmd_deg);

        let position_rev = motor.get_position();
        let zero_rev = self.ds.motor_zero_rev.unwrap_or(position_rev);
        let measured_deg = rem_euclid(rev_to_deg(position_rev - zero_rev), DEG_PER_REV);
        let angle_deg = get_ang_dist(measured_deg, cmd_deg, DEG_PER_REV);

        if angle_deg.abs() < mc.tolerance_deg {
            debug!("Motor already at {:.1} deg", cmd_deg);
            return
        }

        let request = MotorMoveRequest {
            angle_deg,
            max_speed: mc.max_speed,
            tolerance_deg: mc.tolerance_deg,
            timeout_s: mc.timeout_s
        };

        match self.params.move_exec {
            MoveExec::Stepped => {
                if let Err(e) = self.pos_ctrl.start(request, position_rev, clock.now_s()) {
                    warn!("Could not start motor move: {}", e);
                }
            },
            MoveExec::Blocking => {
                match pos_ctrl::move_by(&mut **motor, clock, &self.pos_ctrl.params, request) {
                    Ok(outcome) => self.report.move_outcome = Some(outcome),
                    Err(e) => warn!("Could not make motor move: {}", e)
                }
            }
        }
    }

    /// Perform one control sample of the active stepped move.
    fn step_move(&mut self, eqpt: &mut Eqpt<'_>, time_s: f64) {
        let motor = match eqpt.motor.as_mut() {
            Some(m) => m,
            None => return
        };

        let sample = MotorSample {
            time_s,
            position_rev: motor.get_position()
        };

        match self.pos_ctrl.proc(&sample) {
            Ok((dem, report)) => {
                pos_ctrl::apply_dem(&mut **motor, dem);

                if let Some(outcome) = report.outcome {
                    self.report.move_outcome = Some(outcome);
                }
            },
            Err(e) => warn!("Error during PosCtrl processing: {}", e)
        }
    }
}

impl Archived for Supervisor {
    fn write(&mut self) -> Result<(), ArchiveError> {
        match self.arch_report.as_mut() {
            Some(a) => a.serialise(self.report),
            None => Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::sim::{SimBattery, SimLink, SimRig};
    use crate::supervisor::MotorChannelParams;
    use comms_if::link::NO_CMD;
    use util::time::SimClock;

    fn supervisor(params: Params) -> Supervisor {
        Supervisor::new(
            Params { archive: false, ..params },
            pos_ctrl::Params::default(),
            tm_reporter::Params::default(),
            None
        ).unwrap()
    }

    fn motor_params(move_exec: MoveExec) -> Params {
        Params {
            motor: Some(MotorChannelParams::default()),
            move_exec,
            ..Default::default()
        }
    }

    /// Link carrying the given command on the default motor channel only.
    fn motor_link(cmd_deg: f64) -> SimLink {
        SimLink::connected(vec![NO_CMD, NO_CMD, NO_CMD, NO_CMD, NO_CMD, cmd_deg])
    }

    #[test]
    fn test_disconnected_holds_fail_safe() {
        let mut sup = supervisor(Params::default());
        let mut rig = SimRig::new(0.01);
        let mut link = SimLink::default();
        let mut clock = SimClock::new();

        assert_eq!(sup.mode(), Mode::FailSafe);

        for i in 0..3 {
            let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
            assert_eq!(report.cycle, i);
            assert!(!report.teleop);
            assert!(report.battery_v.is_none());
            assert!(report.overrun_s.is_none());
        }

        assert_eq!(rig.drivetrain.history, vec![(0.0, 0.0); 3]);
        assert_eq!(rig.servos[0].history, vec![70.0; 3]);
        assert!(rig.servos[1].history.is_empty());
        assert_eq!(rig.battery.num_reads, 0);
        assert!(link.reported_volts.is_empty());
        assert_eq!(link.num_polls, 3);

        // Cycles keep to the period
        assert_eq!(clock.now(), Duration::from_millis(300));
        assert_eq!(sup.data_store().fail_safe_cause(), Some(FailSafeCause::AwaitingLink));
    }

    #[test]
    fn test_teleoperation() {
        let mut sup = supervisor(Params::default());
        let mut rig = SimRig::new(0.01);
        rig.battery = SimBattery::new(65535);
        let mut link = SimLink::connected(vec![90.0, 200.0, -1.0, 10.0, 300.0]);
        let mut clock = SimClock::new();

        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);

        assert_eq!(sup.mode(), Mode::Teleoperating);
        assert!(report.teleop);
        assert_eq!(report.servos_commanded, 3);
        assert_eq!(rig.servos[0].angle_deg, Some(90.0));
        assert_eq!(rig.servos[1].angle_deg, Some(160.0));
        assert!(rig.servos[2].angle_deg.is_none());
        assert_eq!(rig.servos[3].angle_deg, Some(60.0));

        // Telemetry once per cycle, no drivetrain stop
        let volts = report.battery_v.unwrap();
        assert!((volts - 14.0).abs() < 0.01);
        assert_eq!(link.reported_volts, vec![volts]);
        assert!(rig.drivetrain.history.is_empty());
    }

    #[test]
    fn test_disconnect_seen_on_next_poll() {
        let mut sup = supervisor(Params::default());
        let mut rig = SimRig::new(0.01);
        let mut link = SimLink::connected(vec![120.0]);
        let mut clock = SimClock::new();

        sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
        assert_eq!(sup.mode(), Mode::Teleoperating);

        link.frame.connected = false;
        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);

        assert!(!report.teleop);
        assert_eq!(sup.data_store().fail_safe_cause(), Some(FailSafeCause::LinkLost));
        assert_eq!(rig.drivetrain.history, vec![(0.0, 0.0)]);
        assert_eq!(rig.servos[0].history, vec![120.0, 70.0]);
        assert_eq!(link.reported_volts.len(), 1);

        // And back again
        link.frame.connected = true;
        sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
        assert_eq!(sup.mode(), Mode::Teleoperating);
        assert_eq!(rig.servos[0].history, vec![120.0, 70.0, 120.0]);
    }

    #[test]
    fn test_stepped_move_keeps_cadence() {
        let mut sup = supervisor(motor_params(MoveExec::Stepped));
        let mut rig = SimRig::new(0.01);
        let mut link = motor_link(90.0);
        let mut clock = SimClock::new();

        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
        assert!(report.move_active);
        assert!(report.overrun_s.is_none());
        assert!(rig.motor.position_rev > 0.0);

        let mut outcome = None;
        for _ in 0..30 {
            let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
            assert!(report.overrun_s.is_none());
            if report.move_outcome.is_some() {
                outcome = report.move_outcome;
                break
            }
        }

        assert_eq!(outcome, Some(MoveOutcome::Success));
        assert!((rig.motor.position_rev - 0.25).abs() * 360.0 < 1.0);

        // The link was polled every cycle throughout the move
        let num_cycles = sup.data_store().num_cycles as usize;
        assert_eq!(link.num_polls, num_cycles);
        assert_eq!(rig.battery.num_reads, num_cycles);

        // The same command doesn't start another move
        let num_efforts = rig.motor.effort_history.len();
        for _ in 0..5 {
            let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
            assert!(!report.move_active);
        }
        assert_eq!(rig.motor.effort_history.len(), num_efforts);
    }

    #[test]
    fn test_blocking_move_stalls_cycle() {
        let mut sup = supervisor(motor_params(MoveExec::Blocking));
        let mut rig = SimRig::new(0.01);
        let mut link = motor_link(90.0);
        let mut clock = SimClock::new();

        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);

        assert_eq!(report.move_outcome, Some(MoveOutcome::Success));
        assert!(!report.move_active);
        assert!(report.overrun_s.unwrap() > 0.0);
        assert_eq!(sup.data_store().num_consec_cycle_overruns, 1);
        assert_eq!(link.num_polls, 1);
        assert!((rig.motor.position_rev - 0.25).abs() * 360.0 < 1.0);

        // The next cycle is on time again
        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
        assert!(report.overrun_s.is_none());
        assert_eq!(sup.data_store().num_consec_cycle_overruns, 0);
    }

    #[test]
    fn test_move_takes_shortest_path_from_zero() {
        let mut sup = supervisor(motor_params(MoveExec::Blocking));
        let mut rig = SimRig::new(0.01);
        rig.motor.position_rev = 1.0;
        let mut link = motor_link(350.0);
        let mut clock = SimClock::new();

        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);

        assert_eq!(report.move_outcome, Some(MoveOutcome::Success));
        assert_eq!(sup.data_store().motor_zero_rev, Some(1.0));
        let expected_rev = 1.0 - 10.0 / 360.0;
        assert!((rig.motor.position_rev - expected_rev).abs() * 360.0 < 1.0);
    }

    #[test]
    fn test_fail_safe_aborts_move() {
        let mut sup = supervisor(motor_params(MoveExec::Stepped));
        let mut rig = SimRig::new(0.01);
        let mut link = motor_link(180.0);
        let mut clock = SimClock::new();

        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
        assert!(report.move_active);

        link.frame.connected = false;
        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);

        assert_eq!(report.move_outcome, Some(MoveOutcome::Aborted));
        assert!(!report.move_active);
        assert_eq!(rig.motor.effort, 0.0);

        // Further fail-safe cycles report nothing new
        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
        assert!(report.move_outcome.is_none());
    }

    #[test]
    fn test_timed_out_move_not_retried() {
        let mut sup = supervisor(motor_params(MoveExec::Stepped));
        let mut rig = SimRig::new(0.01);
        rig.motor.stuck = true;
        let mut link = motor_link(90.0);
        let mut clock = SimClock::new();

        let mut outcome = None;
        for _ in 0..60 {
            let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
            if report.move_outcome.is_some() {
                outcome = report.move_outcome;
                break
            }
        }

        assert_eq!(outcome, Some(MoveOutcome::TimedOut));
        assert!(clock.now_s() > 5.0);
        assert_eq!(rig.motor.effort, 0.0);

        for _ in 0..5 {
            let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
            assert!(!report.move_active);
        }

        // A new command starts a new move
        link.frame.angles[5] = 180.0;
        let report = sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
        assert!(report.move_active);
    }

    #[test]
    fn test_shutdown() {
        let mut sup = supervisor(Params::default());
        let mut rig = SimRig::new(0.01);
        let mut link = SimLink::connected(vec![]);
        let mut clock = SimClock::new();

        sup.run_cycle(&mut rig.eqpt(&mut link), &mut clock);
        sup.shutdown(&mut rig.eqpt(&mut link));

        assert_eq!(sup.mode(), Mode::FailSafe);
        assert_eq!(sup.data_store().fail_safe_cause(), Some(FailSafeCause::Shutdown));
        assert_eq!(rig.drivetrain.history, vec![(0.0, 0.0)]);
        assert_eq!(rig.servos[0].angle_deg, Some(70.0));
    }
}
