use serde::{Deserialize, Serialize};

pub const SECONDS_PER_YEAR: f64 = 31_557_600.0; // 365.25 days per year

/// A physical duration with years as the base unit, the unit the
/// accretion closures quote their timescales in.
///
/// # Examples
///
/// ```rust
/// use units::{Time, SECONDS_PER_YEAR};
///
/// let drain = Time::from_years(4.2e7);
/// assert!((drain.to_seconds() / SECONDS_PER_YEAR - 4.2e7).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Time(f64); // Base unit: Years

impl Time {
    pub fn from_years(value: f64) -> Self {
        Self(value)
    }

    pub fn to_seconds(&self) -> f64 {
        self.0 * SECONDS_PER_YEAR
    }
}
