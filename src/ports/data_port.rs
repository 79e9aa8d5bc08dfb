//! Bar source port trait.

use crate::domain::bar::Bar;
use crate::domain::error::BarsimError;
use chrono::NaiveDate;

/// A historical bar source. Implementations must yield bars in strictly
/// ascending date order; the engine treats violations as fatal.
pub trait DataPort {
    /// Load the full feed into memory, ready for a sequential replay.
    fn load_bars(&self) -> Result<Vec<Bar>, BarsimError>;

    /// First date, last date and bar count, or None when the source is empty.
    fn data_range(&self) -> Result<Option<(NaiveDate, NaiveDate, usize)>, BarsimError> {
        let bars = self.load_bars()?;
        Ok(match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Some((first.date, last.date, bars.len())),
            _ => None,
        })
    }
}
