//! Conservation finalizer.
//!
//! Applies the captured material collected by the swallow pass, removes
//! the radiated fraction of the accreted mass, writes the diagnostics
//! record and accumulates the per-time-bin totals.

use serde::Serialize;
use units::Cosmology;

use crate::aggregate::{CaptureTally, Environment};
use crate::config::AccretionConfig;
use crate::details::{DetailsRecord, KernelAngularMomentum};
use crate::sink::Sink;

/// Folds captured mass and momentum into the sink.
///
/// Skipped entirely when nothing was captured or the sink has no
/// dynamical mass. Returns whether the update ran.
pub fn apply_capture(sink: &mut Sink, tally: &CaptureTally) -> bool {
    if !((tally.mass > 0.0 || tally.sink_mass > 0.0) && sink.dynamical_mass > 0.0) {
        return false;
    }
    sink.velocity = (sink.velocity * sink.dynamical_mass + tally.momentum)
        / (tally.sink_mass + sink.dynamical_mass);
    sink.dynamical_mass += tally.mass;
    sink.mass += tally.sink_mass;
    true
}

/// Subtracts `η · mdot · dt` from both the dynamical and the sink mass.
///
/// The loss never exceeds the smaller of the two. Returns the mass removed.
pub fn apply_radiative_loss(sink: &mut Sink, radiative_efficiency: f64, dt: f64) -> f64 {
    let mut loss = radiative_efficiency * sink.mdot * dt;
    let available = sink.dynamical_mass.min(sink.mass);
    if loss > available {
        log::warn!(
            "sink {}: radiative loss {:e} exceeds available mass {:e}, clamped",
            sink.id.0,
            loss,
            available
        );
        loss = available;
    }
    sink.dynamical_mass -= loss;
    sink.mass -= loss;
    loss
}

/// Moves the sink onto its tracked potential minimum once resolved.
pub fn reposition(sink: &mut Sink) -> bool {
    if sink.potential_minimum.is_resolved() {
        sink.position = sink.potential_minimum.position;
        true
    } else {
        false
    }
}

/// Running totals of one time bin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BinTotals {
    pub mass: f64,
    pub dynamical_mass: f64,
    pub mdot: f64,
    /// Σ mdot / mass over sinks with positive mass
    pub eddington_ratio: f64,
}

/// Per-time-bin sink totals, kept across steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeBinStats {
    bins: Vec<BinTotals>,
}

impl TimeBinStats {
    pub fn new(bin_count: usize) -> Self {
        Self {
            bins: vec![BinTotals::default(); bin_count],
        }
    }

    pub fn bin(&self, bin: usize) -> Option<&BinTotals> {
        self.bins.get(bin)
    }

    pub fn bins(&self) -> &[BinTotals] {
        &self.bins
    }

    fn slot(&mut self, bin: usize) -> &mut BinTotals {
        if bin >= self.bins.len() {
            self.bins.resize(bin + 1, BinTotals::default());
        }
        &mut self.bins[bin]
    }

    /// Zeroes the given bins, leaving inactive bins untouched.
    pub fn reset_active(&mut self, active_bins: impl IntoIterator<Item = usize>) {
        for bin in active_bins {
            *self.slot(bin) = BinTotals::default();
        }
    }

    pub fn record(&mut self, sink: &Sink) {
        let totals = self.slot(sink.time_bin);
        totals.mass += sink.mass;
        totals.dynamical_mass += sink.dynamical_mass;
        totals.mdot += sink.mdot;
        if sink.mass > 0.0 {
            totals.eddington_ratio += sink.mdot / sink.mass;
        }
    }
}

pub struct Finalizer<'a> {
    config: &'a AccretionConfig,
    cosmology: Cosmology,
    time: f64,
}

impl<'a> Finalizer<'a> {
    pub fn new(config: &'a AccretionConfig, cosmology: Cosmology, time: f64) -> Self {
        Self {
            config,
            cosmology,
            time,
        }
    }

    /// Finalizes one active sink over the physical step `dt`.
    pub fn finalize(
        &self,
        sink: &mut Sink,
        env: &Environment,
        tally: &CaptureTally,
        mdot_supply: Option<f64>,
        dt: f64,
    ) -> DetailsRecord {
        apply_capture(sink, tally);
        apply_radiative_loss(sink, self.config.radiative_efficiency, dt);
        self.details(sink, env, mdot_supply, dt)
    }

    fn details(
        &self,
        sink: &Sink,
        env: &Environment,
        mdot_supply: Option<f64>,
        dt: f64,
    ) -> DetailsRecord {
        let has_reservoir = self.config.disk_reservoir.is_some();
        let kernel_angular_momentum = self
            .config
            .output_kernel_angular_momentum
            .then(|| KernelAngularMomentum {
                gas: env.gas_angular_momentum,
                star: env.star_angular_momentum,
            });
        DetailsRecord {
            time: self.time,
            id: sink.id,
            dynamical_mass: sink.dynamical_mass,
            mass: sink.mass,
            reservoir_mass: has_reservoir.then_some(sink.reservoir_mass),
            mdot: sink.mdot,
            mdot_supply,
            dt,
            density: sink.ambient_density * self.cosmology.a3inv(),
            internal_energy: env.internal_energy,
            gas_mass: env.gas_mass,
            star_mass: env.star_mass,
            bulge_gas_mass: env.bulge.gas_mass,
            bulge_star_mass: env.bulge.star_mass,
            kernel_radius: sink.kernel_radius * self.cosmology.scale_factor,
            position: sink.position,
            velocity: sink.velocity,
            kernel_angular_momentum,
        }
    }
}
