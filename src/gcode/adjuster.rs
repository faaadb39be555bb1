// src/gcode/adjuster.rs
//! Replaces one straight G1 move with the discretized, dynamics-corrected
//! sequence of G1 moves that realizes it.

use std::io::Write;

use crate::config::{Calibration, Config};
use crate::discretize::{linear_interpolate, Discretization};
use crate::motion::planner::norm;

use super::GCodeError;

pub struct MoveAdjuster {
    config: Config,
    calibration: Option<Box<dyn Calibration>>,
}

impl MoveAdjuster {
    /// Uses the `[calibration]` section of `config`, if any.
    pub fn new(config: Config) -> Self {
        let calibration = config
            .calibration
            .clone()
            .map(|c| Box::new(c) as Box<dyn Calibration>);
        Self { config, calibration }
    }

    /// Replace the calibration callback.
    pub fn with_calibration(mut self, calibration: impl Calibration + 'static) -> Self {
        self.calibration = Some(Box::new(calibration));
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Emit the replacement for the move `source -> destination` (X, Y, Z, E
    /// absolute) requested at `target_speed` (mm/s).
    ///
    /// Returns `false` when the move is left to the caller (extruder-only
    /// moves unless enabled), `true` when it was written or is a no-op.
    pub fn adjust<W: Write>(
        &mut self,
        source: [f64; 4],
        destination: [f64; 4],
        target_speed: f64,
        e_relative: bool,
        out: &mut W,
    ) -> Result<bool, GCodeError> {
        if let Some(calibration) = &self.calibration {
            calibration.adjust(destination[2], &mut self.config.axes);
        }

        // center extrusion on the start of the move for conditioning
        let e_offset = source[3];
        let mut source = source;
        let mut relative_destination = destination;
        source[3] -= e_offset;
        relative_destination[3] -= e_offset;

        let delta: Vec<f64> = relative_destination.iter().zip(&source).map(|(d, s)| d - s).collect();
        let motion = &self.config.motion;
        let caps = if norm(&delta[..3]) == 0.0 {
            if norm(&delta) == 0.0 {
                return Ok(true);
            }
            if !motion.adjust_extrude_only {
                return Ok(false);
            }
            motion.extrude_only_caps(target_speed)
        } else {
            motion.caps(target_speed)
        };

        let Some(planned) = self
            .config
            .planner()
            .generate_move(&source, &relative_destination, caps)?
        else {
            return Ok(true);
        };

        let samples = linear_interpolate(
            &planned.axes,
            &self.config.axes.tolerances(),
            self.config.discretization.min_dt,
        )?;
        tracing::debug!(
            "Move to {:?}: {} samples over {:.4}s ({} synthesis attempts)",
            destination,
            samples.len(),
            planned.duration(),
            planned.iterations
        );

        write_segments(&samples, e_offset, e_relative, destination, out)?;
        Ok(true)
    }
}

/// Write one `G1` line per sample after the first. `samples` holds X, Y, Z
/// and E with E relative to `e_offset`; `destination` only labels errors.
pub fn write_segments<W: Write>(
    samples: &Discretization,
    e_offset: f64,
    e_relative: bool,
    destination: [f64; 4],
    out: &mut W,
) -> Result<(), GCodeError> {
    if samples.is_empty() {
        return Ok(());
    }
    let mut last = samples.sample(0);
    for j in 1..samples.len() {
        let current = samples.sample(j);
        let dt = samples.times[j] - samples.times[j - 1];
        let mut ds = distance(&last[..3], &current[..3]);
        if ds == 0.0 {
            ds = distance(&last, &current);
        }
        let feedrate = ds / dt;

        let e_value = if e_relative {
            current[3] - last[3]
        } else {
            current[3] + e_offset
        };

        if current.iter().any(|v| !v.is_finite()) || !e_value.is_finite() || !feedrate.is_finite() {
            return Err(GCodeError::NonFiniteOutput { destination });
        }

        writeln!(
            out,
            "G1 X{:.4} Y{:.4} Z{:.4} E{:.5} F{:.3}",
            current[0],
            current[1],
            current[2],
            e_value,
            60.0 * feedrate
        )?;
        last = current;
    }
    Ok(())
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (y - x) * (y - x))
        .sum::<f64>()
        .sqrt()
}
