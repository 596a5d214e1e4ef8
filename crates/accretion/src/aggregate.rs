//! Per-sink kernel aggregates.
//!
//! The environment pass fills a raw `KernelSums` per sink. Partial sums
//! from different workers are combined with `merge` (masses, momenta and
//! moment sums add; the largest neighbor mass takes the max). Normalizing
//! consumes the raw record and yields an `Environment`, the only form the
//! closures accept, so each record is normalized exactly once.

use nalgebra::Vector3;
use units::Cosmology;

use crate::config::FrictionMass;
use crate::sink::{NeighborSample, ParticleKind};

/// Raw, un-normalized neighborhood sums of one sink.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KernelSums {
    pub gas_mass: f64,
    pub star_mass: f64,
    /// Non-gas, non-star, non-sink mass (dark matter)
    pub other_mass: f64,
    pub gas_angular_momentum: Vector3<f64>,
    pub star_angular_momentum: Vector3<f64>,
    pub other_angular_momentum: Vector3<f64>,
    /// Σ m Δv over gas
    pub gas_momentum: Vector3<f64>,
    /// Σ m u over gas
    pub gas_energy: f64,
    /// Σ m Δv over the friction population
    pub friction_momentum: Vector3<f64>,
    /// Σ m |Δv|² over the friction population
    pub friction_energy: f64,
    /// Largest single friction-population mass
    pub friction_max_mass: f64,
}

impl KernelSums {
    /// Adds one neighbor. Sinks never contribute.
    pub fn accumulate(&mut self, sample: &NeighborSample, friction: Option<FrictionMass>) {
        let m = sample.mass;
        let j = sample.angular_momentum();
        match sample.kind {
            ParticleKind::Sink => return,
            ParticleKind::Gas => {
                self.gas_mass += m;
                self.gas_angular_momentum += j;
                self.gas_momentum += sample.relative_velocity * m;
                self.gas_energy += m * sample.internal_energy;
            }
            kind if kind.is_star() => {
                self.star_mass += m;
                self.star_angular_momentum += j;
            }
            _ => {
                self.other_mass += m;
                self.other_angular_momentum += j;
            }
        }

        if let Some(selection) = friction {
            if exerts_friction(selection, sample.kind) {
                self.friction_momentum += sample.relative_velocity * m;
                self.friction_energy += m * sample.relative_velocity.norm_squared();
                self.friction_max_mass = self.friction_max_mass.max(m);
            }
        }
    }

    /// Combines partial sums of the same sink.
    pub fn merge(&mut self, other: &KernelSums) {
        self.gas_mass += other.gas_mass;
        self.star_mass += other.star_mass;
        self.other_mass += other.other_mass;
        self.gas_angular_momentum += other.gas_angular_momentum;
        self.star_angular_momentum += other.star_angular_momentum;
        self.other_angular_momentum += other.other_angular_momentum;
        self.gas_momentum += other.gas_momentum;
        self.gas_energy += other.gas_energy;
        self.friction_momentum += other.friction_momentum;
        self.friction_energy += other.friction_energy;
        self.friction_max_mass = self.friction_max_mass.max(other.friction_max_mass);
    }

    /// Divides out the weights and converts to physical velocities.
    pub fn normalize(self, friction: Option<FrictionMass>, cosmology: &Cosmology) -> Environment {
        let a = cosmology.scale_factor;

        let (internal_energy, gas_velocity) = if self.gas_mass > 0.0 {
            (
                self.gas_energy / self.gas_mass,
                self.gas_momentum / (self.gas_mass * a),
            )
        } else {
            (0.0, Vector3::zeros())
        };

        let total_mass = self.other_mass + self.gas_mass + self.star_mass;
        let total_angular_momentum =
            self.other_angular_momentum + self.gas_angular_momentum + self.star_angular_momentum;

        let mut moments = FrictionMoments {
            mean_velocity: Vector3::zeros(),
            rms_velocity: 0.0,
            max_mass: self.friction_max_mass,
        };
        if let Some(selection) = friction {
            let weight = match selection {
                FrictionMass::DarkMatterAndStars => total_mass - self.gas_mass,
                FrictionMass::StarsOnly => self.star_mass,
                FrictionMass::All | FrictionMass::Boosted(_) => total_mass,
            };
            if weight > 0.0 {
                moments.rms_velocity = (self.friction_energy / weight).sqrt() / a;
                moments.mean_velocity = self.friction_momentum / (weight * a);
            }
        }

        Environment {
            gas_mass: self.gas_mass,
            star_mass: self.star_mass,
            total_mass,
            gas_angular_momentum: self.gas_angular_momentum,
            star_angular_momentum: self.star_angular_momentum,
            total_angular_momentum,
            gas_velocity,
            internal_energy,
            friction: moments,
            bulge: BulgeSums::default(),
            _normalized: (),
        }
    }
}

fn exerts_friction(selection: FrictionMass, kind: ParticleKind) -> bool {
    match selection {
        FrictionMass::DarkMatterAndStars => kind != ParticleKind::Gas,
        FrictionMass::StarsOnly => kind.is_star(),
        FrictionMass::All | FrictionMass::Boosted(_) => true,
    }
}

/// Velocity moments of the friction population, physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionMoments {
    /// Mean neighbor velocity relative to the sink
    pub mean_velocity: Vector3<f64>,
    pub rms_velocity: f64,
    pub max_mass: f64,
}

/// Bulge masses from the second environment pass.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BulgeSums {
    pub gas_mass: f64,
    pub star_mass: f64,
}

impl BulgeSums {
    /// Counter-rotating material is counted twice, mirroring the co-rotating
    /// half of a non-rotating bulge.
    pub fn accumulate(&mut self, sample: &NeighborSample, environment: &Environment) {
        let j = sample.angular_momentum();
        match sample.kind {
            ParticleKind::Gas => {
                if j.dot(&environment.gas_angular_momentum) < 0.0 {
                    self.gas_mass += 2.0 * sample.mass;
                }
            }
            kind if kind.is_star() => {
                if j.dot(&environment.star_angular_momentum) < 0.0 {
                    self.star_mass += 2.0 * sample.mass;
                }
            }
            _ => {}
        }
    }

    pub fn merge(&mut self, other: &BulgeSums) {
        self.gas_mass += other.gas_mass;
        self.star_mass += other.star_mass;
    }
}

/// Normalized neighborhood of one sink for the current step.
///
/// Only obtainable from `KernelSums::normalize`.
#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub gas_mass: f64,
    pub star_mass: f64,
    /// All non-sink mass in the kernel
    pub total_mass: f64,
    pub gas_angular_momentum: Vector3<f64>,
    pub star_angular_momentum: Vector3<f64>,
    pub total_angular_momentum: Vector3<f64>,
    /// Mass-weighted gas velocity relative to the sink
    pub gas_velocity: Vector3<f64>,
    /// Mass-weighted specific internal energy of the gas
    pub internal_energy: f64,
    pub friction: FrictionMoments,
    pub bulge: BulgeSums,
    _normalized: (),
}

impl Environment {
    /// Attaches the reduced second-pass bulge masses.
    pub fn with_bulge(mut self, bulge: BulgeSums) -> Self {
        self.bulge = bulge;
        self
    }

    /// Angular momentum of the non-gas kernel mass.
    pub fn non_gas_angular_momentum(&self) -> Vector3<f64> {
        self.total_angular_momentum - self.gas_angular_momentum
    }

    /// The mass exerting dynamical friction under `selection`.
    pub fn friction_mass(&self, selection: FrictionMass) -> f64 {
        match selection {
            FrictionMass::DarkMatterAndStars => self.total_mass - self.gas_mass,
            FrictionMass::StarsOnly => self.star_mass,
            FrictionMass::All => self.total_mass,
            FrictionMass::Boosted(boost) => self.total_mass * boost,
        }
    }
}

/// Captured material accumulated by the swallow pass for one sink.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CaptureTally {
    /// Mass added to the dynamical mass
    pub mass: f64,
    /// Mass added to the sink itself
    pub sink_mass: f64,
    /// Momentum carried in by the captured material
    pub momentum: Vector3<f64>,
}

impl CaptureTally {
    pub fn add(&mut self, mass: f64, sink_mass: f64, momentum: Vector3<f64>) {
        self.mass += mass;
        self.sink_mass += sink_mass;
        self.momentum += momentum;
    }

    pub fn merge(&mut self, other: &CaptureTally) {
        self.add(other.mass, other.sink_mass, other.momentum);
    }

    pub fn is_empty(&self) -> bool {
        self.mass == 0.0 && self.sink_mass == 0.0
    }
}
