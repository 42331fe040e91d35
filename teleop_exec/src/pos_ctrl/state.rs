//! Implementations for the PosCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, trace, warn};
use serde::Serialize;

// Internal
use super::{
    MotorDem, MotorMoveRequest, MotorSample, MoveOutcome, 
    Params, PidController, PosCtrlError};
use util::{
    maths::{clamp_abs, deg_to_rev, rev_to_deg},
    module::State,
    session::Session};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Position control module state
#[derive(Default)]
pub struct PosCtrl {
    pub(crate) params: Params,

    pub(crate) report: StatusReport,

    active: Option<ActiveMove>
}

/// The move currently being executed.
#[derive(Debug, Clone)]
struct ActiveMove {
    request: MotorMoveRequest,

    /// Time the move was started at.
    ///
    /// Units: seconds
    start_time_s: f64,

    /// Position the move ends at.
    ///
    /// Units: revolutions
    target_rev: f64,

    /// Limit on the magnitude of the effort for this move
    effort_limit: f64,

    pid: PidController
}

/// Status report for PosCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    /// Remaining distance to the target.
    ///
    /// Units: degrees
    pub error_deg: f64,

    /// Effort demanded on this sample
    pub effort: f64,

    /// True if the effort had to be limited
    pub effort_limited: bool,

    /// Time since the move was started.
    ///
    /// Units: seconds
    pub elapsed_s: f64,

    /// Set on the sample which finishes the move
    pub outcome: Option<MoveOutcome>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for PosCtrl {
    type InitData = Params;
    type InitError = PosCtrlError;

    type InputData = MotorSample;
    type OutputData = MotorDem;
    type StatusReport = StatusReport;
    type ProcError = PosCtrlError;

    /// Initialise the PosCtrl module.
    ///
    /// Any move in progress is forgotten.
    fn init(&mut self, init_data: Self::InitData, _session: Option<&Session>) 
        -> Result<(), Self::InitError> 
    {
        init_data.are_valid()?;

        self.params = init_data;
        self.report = StatusReport::default();
        self.active = None;

        Ok(())
    }

    /// Perform one control sample of the active move.
    ///
    /// The sample which finishes the move sets the outcome in the returned
    /// report, after which there is no active move.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> 
    {
        // Clear the status report
        self.report = StatusReport::default();

        let mv = match self.active.as_mut() {
            Some(m) => m,
            None => return Err(PosCtrlError::NoActiveMove)
        };

        let error_rev = mv.target_rev - input_data.position_rev;
        self.report.error_deg = rev_to_deg(error_rev);
        self.report.elapsed_s = input_data.time_s - mv.start_time_s;

        // Check the move's progress. Once the time budget is spent the move
        // has timed out, wherever the shaft is.
        let outcome = if self.report.elapsed_s > mv.request.timeout_s {
            Some(MoveOutcome::TimedOut)
        }
        else if self.report.error_deg.abs() < mv.request.tolerance_deg {
            Some(MoveOutcome::Success)
        }
        else {
            None
        };

        let dem = match outcome {
            Some(MoveOutcome::Success) => {
                info!(
                    "Move complete after {:.2} s, {:.2} deg from target", 
                    self.report.elapsed_s, 
                    self.report.error_deg
                );
                MotorDem::Hold
            },
            Some(_) => {
                warn!(
                    "Move timed out after {:.2} s, {:.2} deg from target", 
                    self.report.elapsed_s, 
                    self.report.error_deg
                );
                MotorDem::Release
            },
            None => {
                let raw = mv.pid.get(error_rev, input_data.time_s);
                let effort = clamp_abs(raw, mv.effort_limit);

                self.report.effort = effort;
                self.report.effort_limited = effort != raw;

                trace!(
                    "PosCtrl error {:.3} deg, effort {:.3}", 
                    self.report.error_deg, 
                    effort
                );

                MotorDem::Effort(effort)
            }
        };

        if outcome.is_some() {
            self.active = None;
        }
        self.report.outcome = outcome;

        Ok((dem, self.report))
    }
}

impl PosCtrl {
    /// Start a new move relative to the given starting position.
    ///
    /// # Inputs
    /// - `request`: The move to make.
    /// - `start_rev`: The motor position when the move starts, in
    ///   revolutions.
    /// - `time_s`: The time the move starts at, in seconds.
    pub fn start(
        &mut self, 
        request: MotorMoveRequest, 
        start_rev: f64, 
        time_s: f64
    ) -> Result<(), PosCtrlError> {
        if self.active.is_some() {
            return Err(PosCtrlError::MoveInProgress)
        }

        request.validate()?;

        let effort_limit = request.max_speed
            .min(self.params.max_effort)
            .min(1.0);

        info!(
            "Starting move of {:.2} deg from {:.4} rev", 
            request.angle_deg, 
            start_rev
        );
        debug!("Move request: {:?}, effort limit {:.2}", request, effort_limit);

        self.active = Some(ActiveMove {
            request,
            start_time_s: time_s,
            target_rev: start_rev + deg_to_rev(request.angle_deg),
            effort_limit,
            pid: PidController::from_params(&self.params)
        });

        Ok(())
    }

    /// Abandon the active move.
    ///
    /// Returns `true` if there was a move to abandon. Releasing the motor is
    /// left to the caller.
    pub fn abort(&mut self) -> bool {
        match self.active.take() {
            Some(mv) => {
                warn!(
                    "Move of {:.2} deg aborted", 
                    mv.request.angle_deg
                );
                self.report.outcome = Some(MoveOutcome::Aborted);
                true
            },
            None => false
        }
    }

    /// `true` if there is a move in progress.
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The request being executed, if any.
    pub fn active_request(&self) -> Option<&MotorMoveRequest> {
        self.active.as_ref().map(|m| &m.request)
    }

    /// The parameters the module was initialised with.
    pub fn params(&self) -> &Params {
        &self.params
    }
}
