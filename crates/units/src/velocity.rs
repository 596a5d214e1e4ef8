use serde::{Deserialize, Serialize};

/// Centimetres per second in one kilometre per second
pub const KM_S_TO_CM_S: f64 = 1.0e5;

/// A velocity magnitude with km/s as the base unit.
///
/// Used for configured velocity scales such as the capture-test floor.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Velocity(f64); // Base unit: km/s

impl Velocity {
    pub fn zero() -> Self {
        Self(0.0)
    }

    pub fn from_km_per_sec(value: f64) -> Self {
        Self(value)
    }

    pub fn to_km_per_sec(&self) -> f64 {
        self.0
    }

    pub fn to_cm_per_sec(&self) -> f64 {
        self.0 * KM_S_TO_CM_S
    }
}
