use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};

use crate::closure::ClosureOutcome;
use crate::growth::advance_masses;
use crate::sink::{Sink, SinkId};

fn make_sink() -> Sink {
    Sink::new(SinkId(3), Point3::origin(), Vector3::zeros(), 1.0)
}

#[test]
fn test_sink_grows_without_reservoir() {
    let mut sink = make_sink();
    let outcome = ClosureOutcome { mdot: 2.0, supply: None };

    advance_masses(&mut sink, &outcome, 0.25);

    assert_relative_eq!(sink.mass, 1.5);
    assert_eq!(sink.mdot, 2.0);
    assert_eq!(sink.reservoir_mass, 0.0);
    // dynamical mass tracks captured material only
    assert_eq!(sink.dynamical_mass, 1.0);
}

#[test]
fn test_reservoir_gains_supply_minus_drain() {
    let mut sink = make_sink().with_reservoir(1.0);
    let outcome = ClosureOutcome {
        mdot: 1.0,
        supply: Some(3.0),
    };

    advance_masses(&mut sink, &outcome, 0.5);

    assert_relative_eq!(sink.mass, 1.5);
    assert_relative_eq!(sink.reservoir_mass, 2.0);
}

#[test]
fn test_reservoir_overdraft_empties() {
    let mut sink = make_sink().with_reservoir(0.1);
    let outcome = ClosureOutcome {
        mdot: 1.0,
        supply: Some(0.0),
    };

    advance_masses(&mut sink, &outcome, 0.5);

    assert_eq!(sink.reservoir_mass, 0.0);
}

#[test]
fn test_zero_step_changes_nothing() {
    let mut sink = make_sink().with_reservoir(0.3);
    let outcome = ClosureOutcome {
        mdot: 5.0,
        supply: Some(1.0),
    };

    advance_masses(&mut sink, &outcome, 0.0);

    assert_eq!(sink.mass, 1.0);
    assert_eq!(sink.reservoir_mass, 0.3);
}

#[test]
fn test_negative_dynamical_mass_is_clamped() {
    let mut sink = make_sink();
    sink.dynamical_mass = -1.0e-9;

    advance_masses(&mut sink, &ClosureOutcome::default(), 1.0);

    assert_eq!(sink.dynamical_mass, 0.0);
}
