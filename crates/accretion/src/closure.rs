//! Accretion closure models.
//!
//! Evaluates the instantaneous accretion rate of one sink from its
//! normalized environment. Exactly one `AccretionModel` is active; when a
//! disk reservoir is configured the model's rate feeds the reservoir and
//! the sink is fed by the reservoir's drain rate instead.
//!
//! Evaluation order:
//! 1. Eddington rate of the sink
//! 2. model rate (torque, Bondi, or zero under capture growth)
//! 3. reservoir substitution
//! 4. sub-grid variability
//! 5. reservoir overdraft cap
//! 6. Eddington cap
//! 7. non-finite / negative guard
//!
//! # References
//! - Hopkins & Quataert (2011) - gravitational torque accretion
//! - Anglés-Alcázar et al. (2017) - kinematic bulge/disk decomposition
//! - Booth & Schaye (2009) - density-dependent Bondi efficiency

use std::f64::consts::PI;

use units::{Cosmology, MassRate, Time};

use crate::aggregate::Environment;
use crate::config::{AccretionConfig, AccretionModel, BondiVariant, ReservoirConfig, TorqueVariant};
use crate::sink::Sink;
use crate::variability::SubgridVariability;

/// Fiducial disk mass of the torque closure (M☉)
const TORQUE_DISK_MASS_SCALE: f64 = 1.0e9;
/// Fiducial sink mass of the torque closure (M☉)
const TORQUE_SINK_MASS_SCALE: f64 = 1.0e8;
/// Fiducial kernel radius of the torque closure (pc)
const TORQUE_RADIUS_SCALE: f64 = 100.0;
/// Torque normalization for α ≈ 5 (M☉/yr)
const TORQUE_NORMALIZATION: f64 = 5.0;

/// Rates produced for one sink this step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClosureOutcome {
    /// Rate into the sink
    pub mdot: f64,
    /// Rate into the disk reservoir, when one is configured
    pub supply: Option<f64>,
}

/// Eddington rate of a code-unit sink mass.
pub fn eddington_rate(config: &AccretionConfig, mass: f64) -> f64 {
    config.units.eddington_rate(mass, config.radiative_efficiency)
}

/// Mass fractions entering the torque closure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskSplit {
    /// Mass the fractions are relative to
    pub kernel_mass: f64,
    pub disk_mass: f64,
    pub disk_fraction: f64,
    /// Gas fraction of the disk
    pub gas_fraction: f64,
}

impl DiskSplit {
    fn is_degenerate(&self, sink_mass: f64) -> bool {
        !(self.disk_fraction > 0.0
            && sink_mass > 0.0
            && self.gas_fraction > 0.0
            && self.kernel_mass > 0.0)
    }
}

/// Disk fraction from the specific angular momentum of the non-gas kernel
/// mass relative to the circular velocity at the kernel radius.
pub fn angular_momentum_split(
    env: &Environment,
    sink_mass: f64,
    radius: f64,
    gravity: f64,
) -> DiskSplit {
    let kernel_mass = env.total_mass;
    let j = env.non_gas_angular_momentum().norm();
    let gas_fraction = env.gas_mass / kernel_mass;
    let circular = kernel_mass * radius * (gravity * (kernel_mass + sink_mass) / radius).sqrt();
    let disk_fraction = (gas_fraction + 1.75 * j / circular).min(1.0);
    DiskSplit {
        kernel_mass,
        disk_mass: kernel_mass * disk_fraction,
        disk_fraction,
        gas_fraction,
    }
}

/// Disk fraction from the kinematic bulge/disk decomposition of gas and stars.
pub fn kinematic_split(env: &Environment) -> DiskSplit {
    let kernel_mass = env.gas_mass + env.star_mass;
    let bulge = env.bulge.star_mass.min(env.star_mass);
    let disk_mass = kernel_mass - bulge;
    let gas_fraction = if disk_mass > 0.0 {
        env.gas_mass / disk_mass
    } else {
        0.0
    };
    DiskSplit {
        kernel_mass,
        disk_mass,
        disk_fraction: disk_mass / kernel_mass,
        gas_fraction,
    }
}

/// Drain rate of the disk reservoir into the sink.
///
/// ```text
/// Ṁ = M_disk / τ × (M_disk / (M_disk + M))^p
/// ```
pub fn reservoir_drain_rate(
    config: &AccretionConfig,
    reservoir: &ReservoirConfig,
    sink: &Sink,
) -> f64 {
    let m_disk = sink.reservoir_mass;
    if !(m_disk > 0.0) {
        return 0.0;
    }
    let tau = config
        .units
        .time_to_code(Time::from_years(reservoir.drain_timescale_years));
    m_disk / tau * (m_disk / (m_disk + sink.mass)).powf(reservoir.mass_exponent)
}

pub struct ClosureEvaluator<'a> {
    config: &'a AccretionConfig,
    cosmology: Cosmology,
    time: f64,
    physical_time: f64,
    variability: Option<SubgridVariability>,
}

impl<'a> ClosureEvaluator<'a> {
    pub fn new(config: &'a AccretionConfig, cosmology: Cosmology, time: f64) -> Self {
        let variability = config
            .variability
            .as_ref()
            .map(|v| SubgridVariability::new(v, config.run_interval));
        Self {
            config,
            cosmology,
            time,
            physical_time: time,
            variability,
        }
    }

    /// Physical time driving the variability phases, when the timebase is
    /// not physical time (the scale factor in comoving runs).
    pub fn with_physical_time(mut self, physical_time: f64) -> Self {
        self.physical_time = physical_time;
        self
    }

    /// Accretion rate of `sink` over a physical step `dt`. Never negative or non-finite.
    pub fn compute_accretion_rate(
        &self,
        env: &Environment,
        sink: &Sink,
        dt: f64,
    ) -> ClosureOutcome {
        let config = self.config;
        let eddington = eddington_rate(config, sink.mass);

        let mut mdot = self.model_rate(env, sink);

        let supply = config.disk_reservoir.as_ref().map(|reservoir| {
            let supply = mdot;
            mdot = reservoir_drain_rate(config, reservoir, sink);
            guard_rate(supply, sink)
        });

        if let Some(variability) = &self.variability {
            if mdot > 0.0 && dt > 0.0 && sink.ambient_density > 0.0 {
                let rho = sink.ambient_density * self.cosmology.a3inv();
                let omega = (config.gravity() * rho).sqrt();
                mdot *= variability.factor(sink.id, self.time, self.physical_time, omega, dt);
            }
        }

        // f64::min drops NaN, so the caps must see a guarded rate
        mdot = guard_rate(mdot, sink);

        if config.disk_reservoir.is_some() && dt > 0.0 {
            mdot = mdot.min(sink.reservoir_mass / dt);
        }

        if let Some(cap) = config.eddington_cap {
            mdot = mdot.min(cap * eddington);
        }

        ClosureOutcome {
            mdot: mdot.max(0.0),
            supply,
        }
    }

    fn model_rate(&self, env: &Environment, sink: &Sink) -> f64 {
        match self.config.model {
            AccretionModel::Torque(variant) => self.torque_rate(variant, env, sink),
            AccretionModel::Bondi(variant) => self.bondi_rate(variant, env, sink),
            // Capture growth is applied from the swallow tallies at finalization
            AccretionModel::GravitationalCapture => 0.0,
        }
    }

    /// Gravitational torque rate (Hopkins & Quataert 2011) or its free-fall variants.
    pub fn torque_rate(&self, variant: TorqueVariant, env: &Environment, sink: &Sink) -> f64 {
        if !(env.gas_mass > 0.0) {
            return 0.0;
        }
        let config = self.config;
        let g = config.gravity();
        let sink_mass = sink.mass_with_reservoir();
        let r0 = sink.kernel_radius * self.cosmology.scale_factor;

        let split = match variant {
            TorqueVariant::AngularMomentum => angular_momentum_split(env, sink_mass, r0, g),
            _ => kinematic_split(env),
        };
        if split.is_degenerate(sink_mass) {
            return 0.0;
        }

        match variant {
            TorqueVariant::AngularMomentum | TorqueVariant::Kinematic => {
                let units = &config.units;
                let disk = units.mass(split.disk_mass).in_fiducial(TORQUE_DISK_MASS_SCALE);
                let bh = units.mass(sink_mass).in_fiducial(TORQUE_SINK_MASS_SCALE);
                let radius = units.length(r0).in_fiducial(TORQUE_RADIUS_SCALE);
                let f0 = 0.31 * split.disk_fraction * split.disk_fraction * disk.powf(-1.0 / 3.0);
                let norm =
                    units.rate_to_code(MassRate::from_solar_masses_per_year(TORQUE_NORMALIZATION));

                let mdot = config.accretion_factor
                    * norm
                    * disk
                    * split.disk_fraction.powf(2.5)
                    * bh.powf(1.0 / 6.0)
                    * radius.powf(-1.5)
                    / (1.0 + f0 / split.gas_fraction);

                log::debug!(
                    "torque closure: mdot={:e} norm={:e} f_disk={:.4} f_gas={:.4} f0={:.4} \
                     m_bh/1e8={:e} m_disk/1e9={:e} r0/100pc={:e}",
                    mdot,
                    norm,
                    split.disk_fraction,
                    split.gas_fraction,
                    f0,
                    bh,
                    disk,
                    radius
                );
                mdot
            }
            TorqueVariant::GravitoTurbulent | TorqueVariant::FreeFall => {
                let enclosed = split.kernel_mass + sink.dynamical_mass;
                let omega = (g * enclosed / r0.powi(3)).sqrt();
                let weight = if variant == TorqueVariant::GravitoTurbulent {
                    let f = split.disk_mass / enclosed;
                    f * f
                } else {
                    1.0
                };
                config.accretion_factor * weight * env.gas_mass * omega
            }
        }
    }

    /// Bondi-Hoyle rate, 4π α G² M² ρ / (c_s² + v²)^{3/2}.
    pub fn bondi_rate(&self, variant: BondiVariant, env: &Environment, sink: &Sink) -> f64 {
        let config = self.config;
        let g = config.gravity();
        let v2 = if variant.includes_gas_velocity() {
            env.gas_velocity.norm_squared()
        } else {
            0.0
        };
        let rho = sink.ambient_density * self.cosmology.a3inv();
        let gamma = config.adiabatic_index;
        let cs2 = gamma * (gamma - 1.0) * env.internal_energy;

        let denominator = (cs2 + v2).powf(1.5);
        if !(denominator > 0.0) {
            return 0.0;
        }

        let efficiency = match variant {
            BondiVariant::VariableEfficiency => {
                if rho > config.density_threshold {
                    (rho / config.density_threshold).powf(config.accretion_factor)
                } else {
                    1.0
                }
            }
            _ => config.accretion_factor,
        };

        4.0 * PI * efficiency * g * g * sink.mass * sink.mass * rho / denominator
    }
}

fn guard_rate(mdot: f64, sink: &Sink) -> f64 {
    if !mdot.is_finite() {
        log::warn!("sink {}: non-finite accretion rate {} clamped to zero", sink.id.0, mdot);
        return 0.0;
    }
    mdot.max(0.0)
}
