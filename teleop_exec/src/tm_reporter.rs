//! # Telemetry reporter
//!
//! Converts raw battery sensor readings into volts and sends them to the
//! operator over the link.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// Internal
use comms_if::link::LinkAdapter;
use util::{module::State, session::Session};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// ADC counts per volt for the battery sensor's potential divider.
pub const DEFAULT_ADC_DIVIDER: f64 = 1024.0 * 64.0 / 14.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the telemetry reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// ADC counts per volt.
    pub adc_divider: f64
}

/// Telemetry reporter module state
#[derive(Default)]
pub struct TmReporter {
    params: Params,

    report: StatusReport
}

/// Status report for the telemetry reporter.
#[derive(Clone, Copy, Default, Serialize, Debug)]
pub struct StatusReport {
    pub raw: u16,

    /// Units: volts
    pub volts: f64
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum TmReporterError {
    #[error("The ADC divider must be finite and positive, found {0}")]
    InvalidDivider(f64)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            adc_divider: DEFAULT_ADC_DIVIDER
        }
    }
}

impl State for TmReporter {
    type InitData = Params;
    type InitError = TmReporterError;

    type InputData = u16;
    type OutputData = f64;
    type StatusReport = StatusReport;
    type ProcError = std::convert::Infallible;

    fn init(&mut self, init_data: Self::InitData, _session: Option<&Session>) 
        -> Result<(), Self::InitError> 
    {
        if !init_data.adc_divider.is_finite() || init_data.adc_divider <= 0.0 {
            return Err(TmReporterError::InvalidDivider(init_data.adc_divider))
        }

        self.params = init_data;

        Ok(())
    }

    /// Convert a raw reading into volts.
    fn proc(&mut self, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> 
    {
        self.report = StatusReport {
            raw: *input_data,
            volts: *input_data as f64 / self.params.adc_divider
        };

        Ok((self.report.volts, self.report))
    }
}

impl TmReporter {
    /// Convert the raw reading and send it over the link, returning the
    /// voltage sent.
    pub fn report<L: LinkAdapter + ?Sized>(&mut self, raw: u16, link: &mut L) -> f64 {
        let (volts, _) = match self.proc(&raw) {
            Ok(r) => r,
            Err(e) => match e {}
        };

        trace!("Battery: {} -> {:.3} V", raw, volts);
        link.report_battery_voltage(volts);

        volts
    }
}
