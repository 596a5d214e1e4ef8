//! CGS physical constants.

/// Gravitational constant (cm³ g⁻¹ s⁻²)
pub const GRAVITY_CGS: f64 = 6.672e-8;

/// Speed of light (cm/s)
pub const SPEED_OF_LIGHT_CGS: f64 = 2.9979e10;

/// Proton mass (g)
pub const PROTON_MASS_G: f64 = 1.6726e-24;

/// Thomson scattering cross-section (cm²)
pub const THOMSON_CROSS_SECTION_CGS: f64 = 6.65245e-25;

/// Pi
pub const PI: f64 = std::f64::consts::PI;
