//! Physical constants, typed quantities and simulation code units.
//!
//! The accretion core works in the host simulation's code units, but all
//! of its calibrated closures are written in fiducial astrophysical units
//! (solar masses, years, parsecs). The types here are the bridge between
//! the two.

pub mod constants;
pub mod length;
pub mod mass;
pub mod mass_rate;
pub mod time;
pub mod unit_system;
pub mod velocity;

#[cfg(test)]
mod time_test;

pub use length::{Length, KPC_TO_CM, PARSEC_TO_CM};
pub use mass::{Mass, SOLAR_MASS_G};
pub use mass_rate::MassRate;
pub use time::{Time, SECONDS_PER_YEAR};
pub use unit_system::{Cosmology, UnitSystem};
pub use velocity::Velocity;
