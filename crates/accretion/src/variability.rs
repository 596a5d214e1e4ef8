//! Sub-grid stochastic variability of the accretion rate.
//!
//! The rate is multiplied by a log-normal factor built from a fixed number
//! of harmonics whose phases and amplitudes come from a generator seeded
//! by the sink identity and a coarse time index. A fresh generator is
//! built for every evaluation, so identical inputs reproduce identical
//! factors and the phases only change when the coarse index advances.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaChaRng;

use crate::config::{RunInterval, VariabilityConfig};
use crate::sink::SinkId;

/// Amplitude calibration of the summed harmonics
const AMPLITUDE_NORM: f64 = 0.55 * 3.256;

#[derive(Debug, Clone, Copy)]
pub struct SubgridVariability {
    harmonics: u32,
    time_resolution: f64,
    interval: RunInterval,
}

impl SubgridVariability {
    pub fn new(config: &VariabilityConfig, interval: RunInterval) -> Self {
        Self {
            harmonics: config.harmonics,
            time_resolution: config.time_resolution,
            interval,
        }
    }

    /// Coarse time index: which of the `time_resolution` slices of the run `time` falls in.
    pub fn coarse_time_index(&self, time: f64) -> u64 {
        let slice = self.interval.span() / self.time_resolution;
        let index = (time / slice).floor();
        if index.is_finite() && index > 0.0 {
            index as u64
        } else {
            0
        }
    }

    pub fn seed(&self, id: SinkId, time: f64) -> u64 {
        id.0.wrapping_add(self.coarse_time_index(time))
    }

    /// Multiplicative factor applied to a positive rate.
    ///
    /// `time` selects the coarse index on the simulation timebase, while the
    /// harmonic phases advance with `physical_time`. `omega` is the local
    /// dynamical frequency sqrt(G ρ) and `dt` the sink's physical timestep.
    pub fn factor(&self, id: SinkId, time: f64, physical_time: f64, omega: f64, dt: f64) -> f64 {
        let n = f64::from(self.harmonics);
        let norm = AMPLITUDE_NORM / n.sqrt();
        let phase_rate = omega * physical_time;
        let mut rng = ChaChaRng::seed_from_u64(self.seed(id, time));

        (1..=self.harmonics)
            .map(|j| {
                let phase: f64 = rng.random();
                let amplitude = sample_unit_gaussian(&mut rng);
                let t = phase_rate * (omega * dt).powf(-f64::from(j) / n) + 2.0 * PI * phase;
                norm * t.cos() * amplitude
            })
            .sum::<f64>()
            .exp()
    }
}

/// Standard normal draw using the Box-Muller transform.
fn sample_unit_gaussian(rng: &mut ChaChaRng) -> f64 {
    let u1: f64 = 1.0 - rng.random::<f64>();
    let u2: f64 = rng.random();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}
