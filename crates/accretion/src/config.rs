//! Run configuration for the accretion core.
//!
//! One `AccretionConfig` is built per simulation run, validated once, and
//! then passed by shared reference to every component. Each closure model
//! is a variant of a single `AccretionModel` enum so exactly one is active.

use std::path::Path;

use serde::{Deserialize, Serialize};
use units::{Length, UnitSystem, Velocity};

use crate::error::ConfigError;
use crate::sink::ParticleKind;

/// Gravitational torque-driven closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorqueVariant {
    /// Disk fraction from the specific angular momentum of kernel mass
    AngularMomentum,
    /// Disk fraction from a kinematic bulge/disk split
    Kinematic,
    /// Gas accreted on the kernel free-fall time, weighted by the squared disk fraction
    GravitoTurbulent,
    /// Gas accreted on the kernel free-fall time
    FreeFall,
}

impl TorqueVariant {
    /// Whether the second environment pass (bulge/disk split) is required.
    pub fn needs_bulge_decomposition(&self) -> bool {
        !matches!(self, TorqueVariant::AngularMomentum)
    }
}

/// Direct hydrodynamic (Bondi-Hoyle) closures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BondiVariant {
    /// Sound speed only
    Classic,
    /// Sound speed plus kernel-averaged gas velocity relative to the sink
    RelativeVelocity,
    /// Relative-velocity rate with a density-dependent efficiency boost
    VariableEfficiency,
}

impl BondiVariant {
    pub fn includes_gas_velocity(&self) -> bool {
        !matches!(self, BondiVariant::Classic)
    }
}

/// The accretion closure of the run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccretionModel {
    Torque(TorqueVariant),
    Bondi(BondiVariant),
    /// Growth only through captured neighbors; the closure rate is always zero.
    GravitationalCapture,
}

impl AccretionModel {
    pub fn needs_bulge_decomposition(&self) -> bool {
        match self {
            AccretionModel::Torque(variant) => variant.needs_bulge_decomposition(),
            _ => false,
        }
    }
}

impl Default for AccretionModel {
    fn default() -> Self {
        AccretionModel::Torque(TorqueVariant::Kinematic)
    }
}

/// Disk reservoir between the resolved supply and the sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReservoirConfig {
    /// Viscous drain timescale in years
    pub drain_timescale_years: f64,
    /// Exponent of the reservoir-to-total mass ratio
    pub mass_exponent: f64,
}

impl Default for ReservoirConfig {
    fn default() -> Self {
        Self {
            drain_timescale_years: 4.2e7,
            mass_exponent: 0.4,
        }
    }
}

/// Sub-grid stochastic variability of the accretion rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariabilityConfig {
    /// Number of harmonic terms
    pub harmonics: u32,
    /// Intervals of the run over which a sink's phases stay fixed
    pub time_resolution: f64,
}

impl Default for VariabilityConfig {
    fn default() -> Self {
        Self {
            harmonics: 10,
            time_resolution: 1000.0,
        }
    }
}

/// Begin and end time of the run in code units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunInterval {
    pub begin: f64,
    pub end: f64,
}

impl RunInterval {
    pub fn span(&self) -> f64 {
        self.end - self.begin
    }
}

impl Default for RunInterval {
    fn default() -> Self {
        Self {
            begin: 0.0,
            end: 1.0,
        }
    }
}

/// Which fraction of the sink's accreted mass couples as gas drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragMode {
    #[default]
    Off,
    /// fraction = Ṁ dt / M
    AccretionRate,
    /// fraction = Ṁ_edd dt / M
    Eddington,
}

/// Field population that exerts dynamical friction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrictionMass {
    DarkMatterAndStars,
    StarsOnly,
    All,
    /// All non-sink mass multiplied by a boost factor
    Boosted(f64),
}

/// Gravitational capture (boundedness) parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Velocity floor added in quadrature to the escape velocity
    pub floor_velocity: Velocity,
    /// Seed growth test mode: enclosed-gas correction, unrestricted apocenter
    pub growth_test: bool,
    /// Restrict the apocenter to the neighbor's extent even without capture accretion
    pub restricted: bool,
    /// Leave thermal support of gas neighbors out of the boundedness test
    pub ignore_gas_pressure: bool,
    /// Lower bound of the restricted ceiling, in sink softenings
    pub min_softening_factor: f64,
    /// Upper bound of the restricted ceiling, in sink softenings
    pub max_softening_factor: f64,
    /// Tighter ceiling for sink-sink pairs, in sink softenings
    pub pair_softening_factor: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            floor_velocity: Velocity::from_km_per_sec(10.0),
            growth_test: false,
            restricted: false,
            ignore_gas_pressure: false,
            min_softening_factor: 10.0,
            max_softening_factor: 50.0,
            pair_softening_factor: 3.0,
        }
    }
}

/// Gravitational softening per particle kind, in code lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SofteningTable {
    pub gas: f64,
    pub dark_matter: f64,
    pub disk_star: f64,
    pub bulge_star: f64,
    pub new_star: f64,
    pub sink: f64,
}

impl SofteningTable {
    pub fn uniform(value: f64) -> Self {
        Self {
            gas: value,
            dark_matter: value,
            disk_star: value,
            bulge_star: value,
            new_star: value,
            sink: value,
        }
    }

    pub fn for_kind(&self, kind: ParticleKind) -> f64 {
        match kind {
            ParticleKind::Gas => self.gas,
            ParticleKind::DarkMatter => self.dark_matter,
            ParticleKind::DiskStar => self.disk_star,
            ParticleKind::BulgeStar => self.bulge_star,
            ParticleKind::NewStar => self.new_star,
            ParticleKind::Sink => self.sink,
        }
    }

    fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("softening.gas", self.gas),
            ("softening.dark_matter", self.dark_matter),
            ("softening.disk_star", self.disk_star),
            ("softening.bulge_star", self.bulge_star),
            ("softening.new_star", self.new_star),
            ("softening.sink", self.sink),
        ]
    }
}

impl Default for SofteningTable {
    fn default() -> Self {
        Self::uniform(1.0e-3)
    }
}

/// Complete accretion configuration of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccretionConfig {
    pub units: UnitSystem,
    /// Adiabatic index γ of the gas
    pub adiabatic_index: f64,
    /// Radiative efficiency η
    pub radiative_efficiency: f64,
    /// Closure normalization α (density slope for the variable-efficiency Bondi model)
    pub accretion_factor: f64,
    /// Physical density above which the variable-efficiency Bondi boost applies
    pub density_threshold: f64,
    /// Cap the rate at this multiple of the Eddington rate
    pub eddington_cap: Option<f64>,
    pub model: AccretionModel,
    pub disk_reservoir: Option<ReservoirConfig>,
    pub variability: Option<VariabilityConfig>,
    pub drag: DragMode,
    pub dynamical_friction: Option<FrictionMass>,
    /// Maximum impact parameter of the Coulomb logarithm
    pub friction_impact_parameter: Length,
    pub capture: CaptureConfig,
    pub softening: SofteningTable,
    pub reposition_on_potential_minimum: bool,
    /// Append kernel angular momenta to diagnostics records
    pub output_kernel_angular_momentum: bool,
    pub run_interval: RunInterval,
}

impl Default for AccretionConfig {
    fn default() -> Self {
        Self {
            units: UnitSystem::galactic(),
            adiabatic_index: 5.0 / 3.0,
            radiative_efficiency: 0.1,
            accretion_factor: 1.0,
            density_threshold: 0.0,
            eddington_cap: None,
            model: AccretionModel::default(),
            disk_reservoir: None,
            variability: None,
            drag: DragMode::Off,
            dynamical_friction: None,
            friction_impact_parameter: Length::from_kpc(50.0),
            capture: CaptureConfig::default(),
            softening: SofteningTable::default(),
            reposition_on_potential_minimum: false,
            output_kernel_angular_momentum: false,
            run_interval: RunInterval::default(),
        }
    }
}

impl AccretionConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Gravitational constant in code units
    pub fn gravity(&self) -> f64 {
        self.units.gravity()
    }

    /// Whether capture ceilings follow the neighbor's extent.
    pub fn capture_restricted(&self) -> bool {
        self.capture.restricted || self.model == AccretionModel::GravitationalCapture
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let eta = self.radiative_efficiency;
        if !(eta > 0.0 && eta <= 1.0) {
            return Err(ConfigError::invalid("radiative_efficiency", eta, "must lie in (0, 1]"));
        }
        if !(self.adiabatic_index > 1.0) {
            return Err(ConfigError::invalid(
                "adiabatic_index",
                self.adiabatic_index,
                "must exceed 1",
            ));
        }
        let alpha = self.accretion_factor;
        if self.model == AccretionModel::Bondi(BondiVariant::VariableEfficiency) {
            // α is the density slope here, so zero is allowed
            if !(alpha.is_finite() && alpha >= 0.0) {
                return Err(ConfigError::invalid(
                    "accretion_factor",
                    alpha,
                    "density slope must be non-negative",
                ));
            }
            if !(self.density_threshold > 0.0) {
                return Err(ConfigError::invalid(
                    "density_threshold",
                    self.density_threshold,
                    "must be positive for the variable-efficiency model",
                ));
            }
        } else if !(alpha.is_finite() && alpha > 0.0) {
            return Err(ConfigError::invalid("accretion_factor", alpha, "must be positive"));
        }
        if let Some(cap) = self.eddington_cap {
            if !(cap > 0.0) {
                return Err(ConfigError::invalid("eddington_cap", cap, "must be positive"));
            }
        }
        for (key, value) in self.softening.entries() {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::invalid(key, value, "must be finite and non-negative"));
            }
        }
        if !(self.softening.sink > 0.0) {
            return Err(ConfigError::invalid(
                "softening.sink",
                self.softening.sink,
                "must be positive",
            ));
        }
        let capture = &self.capture;
        if capture.min_softening_factor > capture.max_softening_factor {
            return Err(ConfigError::invalid(
                "capture.min_softening_factor",
                capture.min_softening_factor,
                "exceeds capture.max_softening_factor",
            ));
        }
        if capture.floor_velocity.to_km_per_sec() < 0.0 {
            return Err(ConfigError::invalid(
                "capture.floor_velocity",
                capture.floor_velocity.to_km_per_sec(),
                "must be non-negative",
            ));
        }
        if let Some(reservoir) = &self.disk_reservoir {
            if !(reservoir.drain_timescale_years > 0.0) {
                return Err(ConfigError::invalid(
                    "disk_reservoir.drain_timescale_years",
                    reservoir.drain_timescale_years,
                    "must be positive",
                ));
            }
        }
        if let Some(variability) = &self.variability {
            if variability.harmonics == 0 {
                return Err(ConfigError::invalid("variability.harmonics", 0, "must be at least 1"));
            }
            if !(variability.time_resolution > 0.0) {
                return Err(ConfigError::invalid(
                    "variability.time_resolution",
                    variability.time_resolution,
                    "must be positive",
                ));
            }
            if !(self.run_interval.span() > 0.0) {
                return Err(ConfigError::invalid(
                    "run_interval",
                    format!("[{}, {}]", self.run_interval.begin, self.run_interval.end),
                    "must be a non-empty interval when variability is enabled",
                ));
            }
        }
        if let Some(FrictionMass::Boosted(boost)) = self.dynamical_friction {
            if !(boost > 0.0) {
                return Err(ConfigError::invalid(
                    "dynamical_friction.boosted",
                    boost,
                    "must be positive",
                ));
            }
        }
        // Without a reservoir the capture closure is identically zero
        if self.drag == DragMode::AccretionRate
            && self.model == AccretionModel::GravitationalCapture
            && self.disk_reservoir.is_none()
        {
            return Err(ConfigError::Incompatible(
                "accretion-rate drag never acts when growth is by gravitational capture \
                 without a disk reservoir"
                    .to_string(),
            ));
        }
        Ok(())
    }
}
