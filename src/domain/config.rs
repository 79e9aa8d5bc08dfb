//! Run configuration: construction from a config source plus validation.
//!
//! Everything is checked here, before any bar is processed; a violation is
//! a fatal startup error.

use crate::domain::error::BarsimError;
use crate::ports::config_port::ConfigPort;

/// When an accepted order executes. `NextOpen` fills at the open of the bar
/// after the signal; `CurrentClose` fills the signal bar at its close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillPolicy {
    #[default]
    NextOpen,
    CurrentClose,
}

/// Immutable per-run configuration. One instance per simulation; parameter
/// sweeps build a fresh one per run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub start_cash: f64,
    pub commission_rate: f64,
    pub sizer_percent: f64,
    pub sma_period: usize,
    pub short_ema_period: usize,
    pub long_ema_period: usize,
    pub fill_policy: FillPolicy,
    pub verbose: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            start_cash: 1_000.0,
            commission_rate: 0.001,
            sizer_percent: 99.0,
            sma_period: 200,
            short_ema_period: 21,
            long_ema_period: 55,
            fill_policy: FillPolicy::NextOpen,
            verbose: false,
        }
    }
}

impl SimConfig {
    /// Read `[broker]`, `[strategy]` and `[simulation]` keys, falling back
    /// to the defaults above, and validate the result.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, BarsimError> {
        let defaults = SimConfig::default();

        let fill_policy = match config.get_string("simulation", "fill_policy") {
            None => defaults.fill_policy,
            Some(s) => match s.as_str() {
                "next_open" => FillPolicy::NextOpen,
                "current_close" => FillPolicy::CurrentClose,
                other => {
                    return Err(BarsimError::ConfigInvalid {
                        section: "simulation".into(),
                        key: "fill_policy".into(),
                        reason: format!("unknown policy '{other}' (next_open | current_close)"),
                    });
                }
            },
        };

        let built = SimConfig {
            start_cash: config.get_double("broker", "start_cash", defaults.start_cash),
            commission_rate: config.get_double(
                "broker",
                "commission_rate",
                defaults.commission_rate,
            ),
            sizer_percent: config.get_double("broker", "sizer_percent", defaults.sizer_percent),
            sma_period: read_period(config, "sma_period", defaults.sma_period)?,
            short_ema_period: read_period(config, "short_ema_period", defaults.short_ema_period)?,
            long_ema_period: read_period(config, "long_ema_period", defaults.long_ema_period)?,
            fill_policy,
            verbose: config.get_bool("strategy", "verbose", defaults.verbose),
        };

        built.validate()?;
        Ok(built)
    }

    pub fn validate(&self) -> Result<(), BarsimError> {
        if self.start_cash <= 0.0 || !self.start_cash.is_finite() {
            return Err(invalid("broker", "start_cash", "must be positive"));
        }
        if !(0.0..1.0).contains(&self.commission_rate) {
            return Err(invalid(
                "broker",
                "commission_rate",
                "must be at least 0 and below 1",
            ));
        }
        if self.sizer_percent <= 0.0 || self.sizer_percent > 100.0 {
            return Err(invalid(
                "broker",
                "sizer_percent",
                "must be above 0 and at most 100",
            ));
        }
        if self.sma_period < 1 {
            return Err(invalid("strategy", "sma_period", "must be a positive integer"));
        }
        if self.short_ema_period < 1 {
            return Err(invalid(
                "strategy",
                "short_ema_period",
                "must be a positive integer",
            ));
        }
        if self.short_ema_period >= self.long_ema_period {
            return Err(invalid(
                "strategy",
                "short_ema_period",
                "must be below long_ema_period",
            ));
        }
        Ok(())
    }
}

fn read_period(
    config: &dyn ConfigPort,
    key: &str,
    default: usize,
) -> Result<usize, BarsimError> {
    let value = config.get_int("strategy", key, default as i64);
    if value < 1 {
        return Err(invalid("strategy", key, "must be a positive integer"));
    }
    Ok(value as usize)
}

fn invalid(section: &str, key: &str, reason: &str) -> BarsimError {
    BarsimError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: reason.into(),
    }
}
