//! Gravitational capture test.
//!
//! A neighbor is captured when it is bound to the sink and its orbit's
//! apocenter lies inside the capture ceiling. The predicate is pure and is
//! handed to the feed pass, which decides the actual swallow markers.

use units::Cosmology;

use crate::config::AccretionConfig;
use crate::sink::{CaptureCandidate, ParticleKind, Sink};

/// Largest apocenter at which a bound neighbor still counts as captured.
///
/// Precedence, first match wins:
/// 1. seed growth test mode: unrestricted for every neighbor;
/// 2. restricted capture (capture accretion, or `capture.restricted`):
///    the neighbor's softening (gas: at least its kernel radius) clamped
///    into `[min, max]` sink softenings, then sinks capped at `pair`
///    sink softenings;
/// 3. otherwise: unrestricted for sinks (mergers), one sink softening
///    for everything else.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureCeiling {
    Unrestricted,
    Within(f64),
}

impl CaptureCeiling {
    pub fn admits(&self, apocenter: f64) -> bool {
        match self {
            CaptureCeiling::Unrestricted => apocenter.is_finite(),
            CaptureCeiling::Within(limit) => apocenter < *limit,
        }
    }
}

pub struct CaptureTest<'a> {
    config: &'a AccretionConfig,
    cosmology: Cosmology,
    floor_velocity: f64,
}

impl<'a> CaptureTest<'a> {
    pub fn new(config: &'a AccretionConfig, cosmology: Cosmology) -> Self {
        let floor_velocity = if config.capture.growth_test {
            0.0
        } else {
            config.units.velocity_to_code(config.capture.floor_velocity)
        };
        Self {
            config,
            cosmology,
            floor_velocity,
        }
    }

    /// Two-body escape velocity at comoving `separation`, with the velocity floor
    /// added in quadrature.
    ///
    /// ```text
    /// v_esc = sqrt(2 G (M + m) / (a r) + v_floor²)
    /// ```
    ///
    /// In growth test mode, gas neighbors add the enclosed gas mass
    /// `3 × (4π/3) r³ ρ`.
    pub fn escape_velocity(
        &self,
        sink: &Sink,
        candidate: &CaptureCandidate,
        separation: f64,
    ) -> f64 {
        let mut m_eff = sink.dynamical_mass + candidate.mass;
        if self.config.capture.growth_test && candidate.kind == ParticleKind::Gas {
            let enclosed_volume = 4.0 * std::f64::consts::PI / 3.0 * separation.powi(3);
            m_eff += 3.0 * enclosed_volume * candidate.density;
        }
        let g = self.config.gravity();
        (2.0 * g * m_eff / (separation * self.cosmology.scale_factor)
            + self.floor_velocity * self.floor_velocity)
            .sqrt()
    }

    pub fn ceiling(&self, candidate: &CaptureCandidate) -> CaptureCeiling {
        let capture = &self.config.capture;
        let eps_sink = self.config.softening.sink;
        let is_sink = candidate.kind == ParticleKind::Sink;

        if capture.growth_test {
            return CaptureCeiling::Unrestricted;
        }

        if self.config.capture_restricted() {
            let mut extent = self.config.softening.for_kind(candidate.kind);
            if candidate.kind == ParticleKind::Gas {
                extent = extent.max(candidate.kernel_radius);
            }
            let mut limit = extent
                .min(capture.max_softening_factor * eps_sink)
                .max(capture.min_softening_factor * eps_sink);
            if is_sink {
                limit = limit.min(capture.pair_softening_factor * eps_sink);
            }
            return CaptureCeiling::Within(limit);
        }

        if is_sink {
            CaptureCeiling::Unrestricted
        } else {
            CaptureCeiling::Within(eps_sink)
        }
    }

    /// Whether a neighbor at `separation` moving at `relative_speed` is captured.
    pub fn is_bound(
        &self,
        relative_speed: f64,
        escape_velocity: f64,
        separation: f64,
        candidate: &CaptureCandidate,
    ) -> bool {
        let sound_speed =
            if candidate.kind == ParticleKind::Gas && !self.config.capture.ignore_gas_pressure {
                candidate.sound_speed
            } else {
                0.0
            };

        let v2 = (relative_speed * relative_speed + sound_speed * sound_speed)
            / (escape_velocity * escape_velocity);
        if !(v2 < 1.0) {
            return false;
        }
        let apocenter = separation / (1.0 - v2);
        self.ceiling(candidate).admits(apocenter)
    }

    /// Escape velocity and boundedness in one call.
    pub fn captures(
        &self,
        sink: &Sink,
        candidate: &CaptureCandidate,
        separation: f64,
        relative_speed: f64,
    ) -> bool {
        let v_esc = self.escape_velocity(sink, candidate, separation);
        self.is_bound(relative_speed, v_esc, separation, candidate)
    }
}
