//! Per-sink diagnostics records.
//!
//! One `DetailsRecord` is emitted for every active sink each step. The
//! text rendering is whitespace separated with a fixed column order; the
//! JSON-lines rendering carries the same fields by name.

use std::fmt;
use std::io::Write;

use nalgebra::{Point3, Vector3};
use serde::Serialize;

use crate::sink::SinkId;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailsRecord {
    pub time: f64,
    pub id: SinkId,
    pub dynamical_mass: f64,
    pub mass: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservoir_mass: Option<f64>,
    pub mdot: f64,
    /// Supply rate into the reservoir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mdot_supply: Option<f64>,
    /// Physical step length
    pub dt: f64,
    /// Physical ambient density
    pub density: f64,
    pub internal_energy: f64,
    pub gas_mass: f64,
    pub star_mass: f64,
    pub bulge_gas_mass: f64,
    pub bulge_star_mass: f64,
    /// Physical kernel radius
    pub kernel_radius: f64,
    pub position: Point3<f64>,
    pub velocity: Vector3<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kernel_angular_momentum: Option<KernelAngularMomentum>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct KernelAngularMomentum {
    pub gas: Vector3<f64>,
    pub star: Vector3<f64>,
}

impl DetailsRecord {
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for DetailsRecord {
    /// Columns: time id dynamical_mass mass reservoir mdot supply dt density
    /// u gas_mass star_mass bulge_gas bulge_star r0 x y z vx vy vz [jgas jstar].
    /// Absent reservoir quantities print as 0.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.12} {} {:e} {:e} {:e} {:e} {:e} {:e} {:e} {:e} {:e} {:e} {:e} {:e} {:e}",
            self.time,
            self.id.0,
            self.dynamical_mass,
            self.mass,
            self.reservoir_mass.unwrap_or(0.0),
            self.mdot,
            self.mdot_supply.unwrap_or(0.0),
            self.dt,
            self.density,
            self.internal_energy,
            self.gas_mass,
            self.star_mass,
            self.bulge_gas_mass,
            self.bulge_star_mass,
            self.kernel_radius,
        )?;
        write!(
            f,
            "  {:.10} {:.10} {:.10}  {:.7} {:.7} {:.7}",
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
        )?;
        if let Some(j) = &self.kernel_angular_momentum {
            write!(
                f,
                "  {:e} {:e} {:e}  {:e} {:e} {:e}",
                j.gas.x, j.gas.y, j.gas.z, j.star.x, j.star.y, j.star.z
            )?;
        }
        Ok(())
    }
}

/// Append-only destination of diagnostics records.
pub trait DetailsSink {
    fn emit(&mut self, record: &DetailsRecord);
}

impl DetailsSink for Vec<DetailsRecord> {
    fn emit(&mut self, record: &DetailsRecord) {
        self.push(record.clone());
    }
}

/// Discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDetails;

impl DetailsSink for NullDetails {
    fn emit(&mut self, _record: &DetailsRecord) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailsFormat {
    #[default]
    Text,
    JsonLines,
}

/// Writes records line by line to any `io::Write`.
///
/// A failed write is logged and the record dropped; diagnostics never
/// interrupt a step.
pub struct DetailsWriter<W: Write> {
    out: W,
    format: DetailsFormat,
    failures: usize,
}

impl<W: Write> DetailsWriter<W> {
    pub fn new(out: W, format: DetailsFormat) -> Self {
        Self {
            out,
            format,
            failures: 0,
        }
    }

    /// Number of records lost to write errors.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_record(&mut self, record: &DetailsRecord) -> std::io::Result<()> {
        match self.format {
            DetailsFormat::Text => writeln!(self.out, "{}", record),
            DetailsFormat::JsonLines => {
                let line = record.to_json_line()?;
                writeln!(self.out, "{}", line)
            }
        }
    }
}

impl<W: Write> DetailsSink for DetailsWriter<W> {
    fn emit(&mut self, record: &DetailsRecord) {
        if let Err(err) = self.write_record(record) {
            self.failures += 1;
            log::warn!("failed to write details for sink {}: {}", record.id.0, err);
        }
    }
}
