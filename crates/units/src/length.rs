use serde::{Deserialize, Serialize};

/// One parsec in centimetres
pub const PARSEC_TO_CM: f64 = 3.086e18;

/// One kiloparsec in centimetres
pub const KPC_TO_CM: f64 = 1.0e3 * PARSEC_TO_CM;

/// A physical length quantity using f64 precision.
///
/// The base unit is the parsec, the natural scale of a sink's
/// kernel radius in galaxy simulations.
///
/// # Examples
///
/// ```rust
/// use units::Length;
///
/// let kernel = Length::from_parsecs(100.0);
/// assert_eq!(kernel.in_fiducial(100.0), 1.0);
/// assert!((Length::from_kpc(1.0).in_fiducial(1.0) - 1000.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Length(f64); // Base unit: parsec

impl Length {
    pub fn from_parsecs(value: f64) -> Self {
        Self(value)
    }

    pub fn from_kpc(value: f64) -> Self {
        Self(value * 1.0e3)
    }

    pub fn from_cm(value: f64) -> Self {
        Self(value / PARSEC_TO_CM)
    }

    pub fn to_cm(&self) -> f64 {
        self.0 * PARSEC_TO_CM
    }

    /// Returns the length as a multiple of `scale_parsecs`.
    pub fn in_fiducial(&self, scale_parsecs: f64) -> f64 {
        self.0 / scale_parsecs
    }
}
