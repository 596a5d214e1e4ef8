//! Gas drag and dynamical friction on sinks.
//!
//! Both contributions are added to the sink's gravity accumulator with the
//! a² comoving correction. Physical velocities come from the normalized
//! environment.
//!
//! # References
//! - Chandrasekhar (1943) - dynamical friction
//! - Tremmel et al. (2015) - sub-grid friction on sinks

use std::f64::consts::PI;

use nalgebra::Vector3;
use units::Cosmology;

use crate::aggregate::Environment;
use crate::closure::eddington_rate;
use crate::config::{AccretionConfig, DragMode, FrictionMass};
use crate::sink::Sink;

/// Momentum-coupling acceleration from accreted gas.
///
/// The coupled fraction of the sink mass per step is capped at one.
pub fn drag_acceleration(
    config: &AccretionConfig,
    env: &Environment,
    sink: &Sink,
    mdot: f64,
    dt: f64,
    cosmology: &Cosmology,
) -> Vector3<f64> {
    if !(dt > 0.0 && sink.mass > 0.0) {
        return Vector3::zeros();
    }
    let rate = match config.drag {
        DragMode::Off => return Vector3::zeros(),
        DragMode::AccretionRate => mdot,
        DragMode::Eddington => eddington_rate(config, sink.mass),
    };
    let fraction = (rate * dt / sink.mass).min(1.0);
    env.gas_velocity * (cosmology.accel_factor() * fraction / dt)
}

/// Chandrasekhar velocity factor for a Maxwellian background.
///
/// Uses a closed-form approximation of the error function; `x` is the
/// sink speed in units of √2 σ.
pub fn chandrasekhar_factor(x: f64) -> f64 {
    let k = 8.0 * (PI - 3.0) / (3.0 * PI * (4.0 - PI));
    let x2 = x * x;
    let erf = x.signum() * (1.0 - (-x2 * (4.0 / PI + k * x2) / (1.0 + k * x2)).exp()).sqrt();
    erf - 2.0 * x / PI.sqrt() * (-x2).exp()
}

/// Dynamical friction from the selected kernel population.
///
/// Returns zero when no particle of the selection is in the kernel, when
/// the sink is at rest relative to it, or when the result is negative or
/// non-finite.
pub fn friction_acceleration(
    config: &AccretionConfig,
    selection: FrictionMass,
    env: &Environment,
    sink: &Sink,
    cosmology: &Cosmology,
) -> Vector3<f64> {
    let moments = &env.friction;
    if !(moments.max_mass > 0.0) {
        return Vector3::zeros();
    }
    let g = config.gravity();
    let bh_mass = sink.mass_with_reservoir();
    let speed = moments.mean_velocity.norm();
    if !(speed > 0.0) {
        return Vector3::zeros();
    }

    let x = speed / (2.0_f64.sqrt() * moments.rms_velocity);
    let mut factor = chandrasekhar_factor(x);

    let impact = config.units.length_to_code(config.friction_impact_parameter);
    factor *= (1.0 + impact * speed * speed / (g * bh_mass)).ln();

    // Suppress friction when the sink is barely heavier than the background particles
    factor *= 1.0 / (1.0 + bh_mass / (5.0 * moments.max_mass));

    let radius = sink.kernel_radius * cosmology.scale_factor;
    let density = env.friction_mass(selection) / (4.0 * PI / 3.0 * radius.powi(3));
    factor *= 4.0 * PI * g * g * density * bh_mass / speed.powi(3);

    if !(factor.is_finite() && factor >= 0.0) {
        log::debug!("sink {}: friction factor {} clamped to zero", sink.id.0, factor);
        return Vector3::zeros();
    }
    moments.mean_velocity * (cosmology.accel_factor() * factor)
}

/// Total drag plus friction acceleration for this step.
pub fn supplementary_acceleration(
    config: &AccretionConfig,
    env: &Environment,
    sink: &Sink,
    mdot: f64,
    dt: f64,
    cosmology: &Cosmology,
) -> Vector3<f64> {
    let mut accel = drag_acceleration(config, env, sink, mdot, dt, cosmology);
    if let Some(selection) = config.dynamical_friction {
        accel += friction_acceleration(config, selection, env, sink, cosmology);
    }
    accel
}
