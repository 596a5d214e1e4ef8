//! Mass and reservoir integration.

use crate::closure::ClosureOutcome;
use crate::sink::Sink;

/// Advances the sink and reservoir masses by one step of length `dt`.
///
/// The sink grows by `mdot · dt`. With a reservoir, the reservoir gains
/// its supply and loses what the sink drew; an overdraft empties it
/// rather than going negative. Dynamical mass never drops below zero.
pub fn advance_masses(sink: &mut Sink, outcome: &ClosureOutcome, dt: f64) {
    sink.mdot = outcome.mdot;
    sink.mass += outcome.mdot * dt;

    if let Some(supply) = outcome.supply {
        let delta = (supply - outcome.mdot) * dt;
        if delta < -sink.reservoir_mass {
            sink.reservoir_mass = 0.0;
        } else {
            sink.reservoir_mass += delta;
        }
        sink.reservoir_mass = sink.reservoir_mass.max(0.0);
    }

    sink.dynamical_mass = sink.dynamical_mass.max(0.0);
}
