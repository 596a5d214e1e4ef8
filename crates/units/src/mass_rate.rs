use serde::{Deserialize, Serialize};

/// A physical mass rate (mass per time) quantity using f64 precision.
///
/// Base unit is solar masses per year, the unit in which accretion
/// closures are normalized (e.g. the 5 M☉/yr torque normalization).
///
/// # Examples
///
/// ```rust
/// use units::{MassRate, UnitSystem};
///
/// let quasar = MassRate::from_solar_masses_per_year(1.0);
/// assert!(UnitSystem::galactic().rate_to_code(quasar) > 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MassRate(f64); // Base unit: Solar Masses per year

impl MassRate {
    pub fn from_solar_masses_per_year(value: f64) -> Self {
        Self(value)
    }

    pub fn to_solar_masses_per_year(&self) -> f64 {
        self.0
    }
}
