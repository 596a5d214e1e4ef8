//! Sinks and the neighbor views the core reads.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Sentinel of an untracked potential minimum.
pub const POTENTIAL_UNSET: f64 = 1.0e30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SinkId(pub u64);

/// Particle populations of the host simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticleKind {
    Gas,
    DarkMatter,
    DiskStar,
    BulgeStar,
    NewStar,
    Sink,
}

impl ParticleKind {
    pub fn is_star(&self) -> bool {
        matches!(
            self,
            ParticleKind::DiskStar | ParticleKind::BulgeStar | ParticleKind::NewStar
        )
    }
}

/// Lowest gravitational potential seen near a sink, tracked by the gravity solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PotentialMinimum {
    pub value: f64,
    pub position: Point3<f64>,
}

impl PotentialMinimum {
    pub fn unset() -> Self {
        Self {
            value: POTENTIAL_UNSET,
            position: Point3::origin(),
        }
    }

    /// A minimum is usable once it is well below the sentinel.
    pub fn is_resolved(&self) -> bool {
        self.value < 0.5 * POTENTIAL_UNSET
    }
}

/// An accreting point mass.
///
/// All quantities are in code units; positions, velocities and the
/// ambient density are comoving.
#[derive(Debug, Clone)]
pub struct Sink {
    pub id: SinkId,
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    /// Acceleration accumulator handed to the gravity integrator
    pub gravity_accel: Vector3<f64>,
    /// Gravitational mass, including unresolved material bound to the sink
    pub dynamical_mass: f64,
    /// Mass of the compact object itself
    pub mass: f64,
    /// Mass in the unresolved disk reservoir
    pub reservoir_mass: f64,
    /// Accretion rate set by the last active step
    pub mdot: f64,
    pub kernel_radius: f64,
    /// Kernel-estimated ambient gas density
    pub ambient_density: f64,
    pub time_bin: usize,
    /// Step length of the sink's time bin
    pub timestep: f64,
    pub active: bool,
    pub potential_minimum: PotentialMinimum,
}

impl Sink {
    /// Creates an active sink whose dynamical mass equals its own mass.
    ///
    /// # Examples
    ///
    /// ```
    /// use accretion::sink::{Sink, SinkId};
    /// use nalgebra::{Point3, Vector3};
    ///
    /// let sink = Sink::new(SinkId(7), Point3::origin(), Vector3::zeros(), 1.0e-4);
    /// assert_eq!(sink.dynamical_mass, sink.mass);
    /// assert!(sink.active);
    /// ```
    pub fn new(id: SinkId, position: Point3<f64>, velocity: Vector3<f64>, mass: f64) -> Self {
        Self {
            id,
            position,
            velocity,
            gravity_accel: Vector3::zeros(),
            dynamical_mass: mass,
            mass,
            reservoir_mass: 0.0,
            mdot: 0.0,
            kernel_radius: 0.0,
            ambient_density: 0.0,
            time_bin: 0,
            timestep: 0.0,
            active: true,
            potential_minimum: PotentialMinimum::unset(),
        }
    }

    pub fn with_kernel_radius(mut self, kernel_radius: f64) -> Self {
        self.kernel_radius = kernel_radius;
        self
    }

    pub fn with_ambient_density(mut self, density: f64) -> Self {
        self.ambient_density = density;
        self
    }

    pub fn with_reservoir(mut self, reservoir_mass: f64) -> Self {
        self.reservoir_mass = reservoir_mass;
        self
    }

    pub fn with_timestep(mut self, time_bin: usize, timestep: f64) -> Self {
        self.time_bin = time_bin;
        self.timestep = timestep;
        self
    }

    /// Sink mass plus reservoir, the mass the torque and friction closures see.
    pub fn mass_with_reservoir(&self) -> f64 {
        self.mass + self.reservoir_mass
    }
}

/// One neighbor's contribution to a sink's kernel sums.
///
/// `offset` and `relative_velocity` are neighbor minus sink.
#[derive(Debug, Clone, Copy)]
pub struct NeighborSample {
    pub kind: ParticleKind,
    pub mass: f64,
    pub offset: Vector3<f64>,
    pub relative_velocity: Vector3<f64>,
    /// Specific internal energy (gas only)
    pub internal_energy: f64,
}

impl NeighborSample {
    /// Angular momentum about the sink, m (r × v).
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.offset.cross(&self.relative_velocity) * self.mass
    }
}

/// The neighbor properties the capture test reads.
#[derive(Debug, Clone, Copy)]
pub struct CaptureCandidate {
    pub kind: ParticleKind,
    pub mass: f64,
    /// Gas density (gas only)
    pub density: f64,
    /// Effective sound speed (gas only)
    pub sound_speed: f64,
    /// Kernel (smoothing) radius (gas only)
    pub kernel_radius: f64,
}

impl CaptureCandidate {
    pub fn collisionless(kind: ParticleKind, mass: f64) -> Self {
        Self {
            kind,
            mass,
            density: 0.0,
            sound_speed: 0.0,
            kernel_radius: 0.0,
        }
    }

    pub fn gas(mass: f64, density: f64, sound_speed: f64, kernel_radius: f64) -> Self {
        Self {
            kind: ParticleKind::Gas,
            mass,
            density,
            sound_speed,
            kernel_radius,
        }
    }
}
