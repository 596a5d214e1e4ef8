//! Simulation code units and comoving-frame factors.
//!
//! Host simulations store masses, lengths and velocities in their own code
//! units, optionally scaled by the dimensionless Hubble parameter `h`.
//! `UnitSystem` converts between those values and the typed fiducial
//! quantities of this crate.

use serde::{Deserialize, Serialize};

use crate::constants::{
    GRAVITY_CGS, PI, PROTON_MASS_G, SPEED_OF_LIGHT_CGS, THOMSON_CROSS_SECTION_CGS,
};
use crate::length::{Length, KPC_TO_CM};
use crate::mass::{Mass, SOLAR_MASS_G};
use crate::mass_rate::MassRate;
use crate::time::{Time, SECONDS_PER_YEAR};
use crate::velocity::Velocity;

/// Code unit definitions of a simulation run.
///
/// # Examples
///
/// ```rust
/// use units::UnitSystem;
///
/// let cgs = UnitSystem::cgs();
/// assert_eq!(cgs.time_in_s(), 1.0);
///
/// let galactic = UnitSystem::galactic();
/// // 1 kpc / (1 km/s) is just under a Gyr
/// assert!(galactic.time_in_s() > 3.0e16);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitSystem {
    /// Code length unit in cm
    pub length_in_cm: f64,
    /// Code mass unit in g
    pub mass_in_g: f64,
    /// Code velocity unit in cm/s
    pub velocity_in_cm_per_s: f64,
    /// Dimensionless Hubble parameter dividing code masses and lengths
    pub hubble_param: f64,
}

impl UnitSystem {
    /// Plain CGS code units with h = 1.
    pub fn cgs() -> Self {
        Self {
            length_in_cm: 1.0,
            mass_in_g: 1.0,
            velocity_in_cm_per_s: 1.0,
            hubble_param: 1.0,
        }
    }

    /// kpc, 10¹⁰ M☉ and km/s, the usual galaxy-scale choice.
    pub fn galactic() -> Self {
        Self {
            length_in_cm: KPC_TO_CM,
            mass_in_g: 1.0e10 * SOLAR_MASS_G,
            velocity_in_cm_per_s: 1.0e5,
            hubble_param: 1.0,
        }
    }

    /// Code time unit in seconds (length / velocity)
    pub fn time_in_s(&self) -> f64 {
        self.length_in_cm / self.velocity_in_cm_per_s
    }

    /// Gravitational constant in code units
    pub fn gravity(&self) -> f64 {
        let t = self.time_in_s();
        GRAVITY_CGS * self.mass_in_g * t * t / self.length_in_cm.powi(3)
    }

    /// Physical mass of a code-unit mass value.
    pub fn mass(&self, code: f64) -> Mass {
        Mass::from_grams(code * self.mass_in_g / self.hubble_param)
    }

    /// Physical length of a code-unit length value.
    pub fn length(&self, code: f64) -> Length {
        Length::from_cm(code * self.length_in_cm / self.hubble_param)
    }

    /// Code-unit value of a physical length.
    pub fn length_to_code(&self, length: Length) -> f64 {
        length.to_cm() / (self.length_in_cm / self.hubble_param)
    }

    /// Code-unit value of a physical duration.
    pub fn time_to_code(&self, time: Time) -> f64 {
        time.to_seconds() / (self.time_in_s() / self.hubble_param)
    }

    /// Code-unit value of a mass rate.
    ///
    /// Rate normalizations are quoted without the `h` scaling, matching
    /// how the closure constants were calibrated.
    pub fn rate_to_code(&self, rate: MassRate) -> f64 {
        let per_year = (SOLAR_MASS_G / self.mass_in_g) / (SECONDS_PER_YEAR / self.time_in_s());
        rate.to_solar_masses_per_year() * per_year
    }

    /// Code-unit value of a velocity.
    pub fn velocity_to_code(&self, velocity: Velocity) -> f64 {
        velocity.to_cm_per_sec() / self.velocity_in_cm_per_s
    }

    /// Eddington accretion rate `L_edd / (η c²)` for a code-unit mass,
    /// returned in code mass per code time.
    ///
    /// ```text
    /// Ṁ_edd = 4π G m_p / (η c σ_T) × M
    /// ```
    pub fn eddington_rate(&self, mass_code: f64, radiative_efficiency: f64) -> f64 {
        let c2 = SPEED_OF_LIGHT_CGS * SPEED_OF_LIGHT_CGS;
        let per_second = 4.0 * PI * GRAVITY_CGS * SPEED_OF_LIGHT_CGS * PROTON_MASS_G
            / (radiative_efficiency * c2 * THOMSON_CROSS_SECTION_CGS);
        per_second * (mass_code / self.hubble_param) * self.time_in_s()
    }
}

impl Default for UnitSystem {
    fn default() -> Self {
        Self::galactic()
    }
}

/// Comoving-frame factors of the current step.
///
/// Positions and velocities in comoving runs carry factors of the scale
/// factor `a`; static runs use `a = 1` and a unit Hubble rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cosmology {
    /// Scale factor a
    pub scale_factor: f64,
    /// Hubble rate factor dividing timebase intervals into physical time
    pub hubble_rate: f64,
}

impl Cosmology {
    pub fn static_space() -> Self {
        Self {
            scale_factor: 1.0,
            hubble_rate: 1.0,
        }
    }

    pub fn comoving(scale_factor: f64, hubble_rate: f64) -> Self {
        Self {
            scale_factor,
            hubble_rate,
        }
    }

    /// a⁻³, converting comoving densities to physical
    pub fn a3inv(&self) -> f64 {
        1.0 / self.scale_factor.powi(3)
    }

    /// a², the correction applied to accelerations added to the gravity accumulator
    pub fn accel_factor(&self) -> f64 {
        self.scale_factor * self.scale_factor
    }
}

impl Default for Cosmology {
    fn default() -> Self {
        Self::static_space()
    }
}
