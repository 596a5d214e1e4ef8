use serde::{Deserialize, Serialize};

/// Mass of the Sun in grams (1.989 × 10³³ g)
pub const SOLAR_MASS_G: f64 = 1.989e33;

/// A physical mass quantity using f64 precision.
///
/// The base unit is the solar mass. Accretion closures are calibrated
/// against sinks of 10⁶-10⁹ M☉, so `in_fiducial` expresses a mass in
/// multiples of such a scale.
///
/// # Examples
///
/// ```rust
/// use units::Mass;
///
/// let sink = Mass::from_solar_masses(1.0e8);
/// assert_eq!(sink.in_fiducial(1.0e8), 1.0);
///
/// let grams = Mass::from_grams(1.989e33);
/// assert!((grams.to_solar_masses() - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Mass(f64); // Base unit: Solar Masses

impl Mass {
    pub fn from_solar_masses(value: f64) -> Self {
        Self(value)
    }

    pub fn from_grams(value: f64) -> Self {
        Self(value / SOLAR_MASS_G)
    }

    pub fn to_solar_masses(&self) -> f64 {
        self.0
    }

    /// Returns the mass as a multiple of `scale_solar_masses`.
    pub fn in_fiducial(&self, scale_solar_masses: f64) -> f64 {
        self.0 / scale_solar_masses
    }
}
