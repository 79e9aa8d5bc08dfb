//! Streaming technical indicators.
//!
//! Each indicator consumes one close per bar and yields `None` until its
//! warm-up window is full. [`IndicatorEngine`] bundles the set the engine
//! feeds each bar and snapshots their current values.

pub mod sma;
pub mod ema;

use crate::domain::bar::Bar;
use ema::Ema;
use sma::Sma;

/// Indicator values as of the most recent bar. A `None` means the indicator
/// has not finished warming up; derived values (the EMA difference) are
/// recomputed from the snapshot and have no lifecycle of their own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndicatorSnapshot {
    pub trend_sma: Option<f64>,
    pub short_ema: Option<f64>,
    pub long_ema: Option<f64>,
}

impl IndicatorSnapshot {
    /// short EMA minus long EMA, once both are warm.
    pub fn ema_diff(&self) -> Option<f64> {
        Some(self.short_ema? - self.long_ema?)
    }

    pub fn is_warm(&self) -> bool {
        self.trend_sma.is_some() && self.short_ema.is_some() && self.long_ema.is_some()
    }
}

/// The indicator set for one run: a trend SMA and a short/long EMA pair,
/// updated incrementally as bars arrive.
#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    trend_sma: Sma,
    short_ema: Ema,
    long_ema: Ema,
}

impl IndicatorEngine {
    pub fn new(sma_period: usize, short_ema_period: usize, long_ema_period: usize) -> Self {
        Self {
            trend_sma: Sma::new(sma_period),
            short_ema: Ema::new(short_ema_period),
            long_ema: Ema::new(long_ema_period),
        }
    }

    /// Bars needed before every indicator in the set is warm.
    pub fn warmup_bars(&self) -> usize {
        self.trend_sma
            .period()
            .max(self.short_ema.period())
            .max(self.long_ema.period())
    }

    pub fn update(&mut self, bar: &Bar) -> IndicatorSnapshot {
        IndicatorSnapshot {
            trend_sma: self.trend_sma.update(bar.close),
            short_ema: self.short_ema.update(bar.close),
            long_ema: self.long_ema.update(bar.close),
        }
    }

    pub fn is_warm(&self) -> bool {
        self.trend_sma.is_warm() && self.short_ema.is_warm() && self.long_ema.is_warm()
    }
}
