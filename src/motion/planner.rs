// src/motion/planner.rs
//! Move synthesis: one arc-length S-curve per move, projected onto every
//! axis, corrected by that axis' dynamic model and throttled until every
//! declared axis limit holds.

use crate::math::{harmonize_knots, Curve};

use super::dynamics::{ArcProfile, AxisLimits, DynamicModel, LimitKind};
use super::s_curve::SCurveGenerator;
use super::MotionError;

/// A binding speed limit only closes a quarter of its log-ratio per attempt,
/// so a commanded speed at twice the axis limit takes about 30 attempts.
pub const DEFAULT_MAX_THROTTLE_ITERATIONS: usize = 500;

/// Ratios within this distance of 1 are treated as satisfied.
const THROTTLE_EPSILON: f64 = 1e-4;

/// Speed/acceleration/jerk caps along the path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionCaps {
    pub max_speed: f64,
    pub max_accel: f64,
    pub max_jerk: f64,
}

impl MotionCaps {
    pub fn new(max_speed: f64, max_accel: f64, max_jerk: f64) -> Self {
        Self {
            max_speed,
            max_accel,
            max_jerk,
        }
    }

    /// Caps for the next synthesis attempt after `binding` was violated.
    ///
    /// A speed violation throttles acceleration and jerk fully but speed only
    /// by the fourth root: it usually comes from spring correction overshoot,
    /// which scales with acceleration, not from the commanded feed rate.
    fn throttled(self, binding: &Binding) -> Self {
        let r = binding.ratio;
        match binding.kind {
            LimitKind::Jerk => Self {
                max_jerk: self.max_jerk * r,
                ..self
            },
            LimitKind::Accel => Self {
                max_accel: self.max_accel * r,
                max_jerk: self.max_jerk * r,
                ..self
            },
            LimitKind::Speed => Self {
                max_speed: self.max_speed * r.powf(0.25),
                max_accel: self.max_accel * r,
                max_jerk: self.max_jerk * r,
            },
        }
    }
}

/// Dynamic model and optional limits of one machine axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisDynamics {
    pub model: DynamicModel,
    pub limits: Option<AxisLimits>,
}

/// Result of a successful synthesis.
#[derive(Debug, Clone)]
pub struct PlannedMove {
    /// Absolute position over time, one curve per axis, all on one knot sequence.
    pub axes: Vec<Curve>,
    /// Caps actually used after throttling.
    pub caps: MotionCaps,
    /// Number of synthesis attempts, 1 when no limit was binding.
    pub iterations: usize,
}

impl PlannedMove {
    pub fn duration(&self) -> f64 {
        self.axes
            .first()
            .and_then(Curve::range_max)
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Binding {
    kind: LimitKind,
    axis: usize,
    ratio: f64,
}

#[derive(Debug, Clone)]
pub struct MotionPlanner {
    axes: Vec<AxisDynamics>,
    max_throttle_iterations: usize,
}

impl MotionPlanner {
    pub fn new(axes: Vec<AxisDynamics>) -> Self {
        Self {
            axes,
            max_throttle_iterations: DEFAULT_MAX_THROTTLE_ITERATIONS,
        }
    }

    pub fn with_max_throttle_iterations(mut self, iterations: usize) -> Self {
        self.max_throttle_iterations = iterations.max(1);
        self
    }

    pub fn axes(&self) -> &[AxisDynamics] {
        &self.axes
    }

    /// Synthesize the move from `source` to `destination`.
    ///
    /// The first three components are Euclidean X/Y/Z; the path length is
    /// their distance, or the full vector distance for moves that only touch
    /// auxiliary axes. `Ok(None)` means source and destination coincide.
    pub fn generate_move(
        &self,
        source: &[f64],
        destination: &[f64],
        caps: MotionCaps,
    ) -> Result<Option<PlannedMove>, MotionError> {
        if source.len() != self.axes.len() || destination.len() != self.axes.len() {
            return Err(MotionError::DimensionMismatch {
                axes: self.axes.len(),
                source_len: source.len(),
                destination_len: destination.len(),
            });
        }

        let delta: Vec<f64> = destination.iter().zip(source).map(|(d, s)| d - s).collect();
        let mut distance = norm(&delta[..delta.len().min(3)]);
        if distance == 0.0 {
            distance = norm(&delta);
        }
        if distance == 0.0 {
            return Ok(None);
        }

        let mut caps = caps;
        let mut iteration = 0;
        loop {
            iteration += 1;
            tracing::debug!(
                "Synthesizing move: dist {:.4}, v {:.3}, a {:.1}, j {:.1} (attempt {})",
                distance,
                caps.max_speed,
                caps.max_accel,
                caps.max_jerk,
                iteration
            );

            let positions = self.synthesize(source, &delta, distance, caps)?;
            let Some(binding) = self.binding_limit(&positions)? else {
                return Ok(Some(PlannedMove {
                    axes: harmonize_knots(&positions),
                    caps,
                    iterations: iteration,
                }));
            };

            if iteration >= self.max_throttle_iterations {
                return Err(MotionError::ThrottleDidNotConverge {
                    axis: binding.axis,
                    limit: binding.kind,
                    ratio: binding.ratio,
                    iterations: iteration,
                });
            }

            if iteration == 1 {
                tracing::warn!(
                    "Axis {} exceeds its {} limit (ratio {:.5}), re-synthesizing",
                    binding.axis,
                    binding.kind,
                    binding.ratio
                );
            } else {
                tracing::debug!(
                    "Axis {} {} ratio {:.5} after {} attempts",
                    binding.axis,
                    binding.kind,
                    binding.ratio,
                    iteration
                );
            }
            caps = caps.throttled(&binding);
        }
    }

    fn synthesize(
        &self,
        source: &[f64],
        delta: &[f64],
        distance: f64,
        caps: MotionCaps,
    ) -> Result<Vec<Curve>, MotionError> {
        let accel = SCurveGenerator::new(caps.max_speed, caps.max_accel, caps.max_jerk)
            .profile(distance)?;
        let arc = ArcProfile::from_accel(accel);

        self.axes
            .iter()
            .zip(delta.iter().zip(source))
            .map(|(axis, (d, s))| -> Result<Curve, MotionError> {
                let position = axis.model.axis_position(&arc, d / distance)?;
                Ok(position.add_scalar(*s))
            })
            .collect()
    }

    /// The limit to throttle next, in priority order jerk, accel, speed.
    fn binding_limit(&self, positions: &[Curve]) -> Result<Option<Binding>, MotionError> {
        let mut jerk = Binding { kind: LimitKind::Jerk, axis: 0, ratio: 1.0 };
        let mut accel = Binding { kind: LimitKind::Accel, axis: 0, ratio: 1.0 };
        let mut speed = Binding { kind: LimitKind::Speed, axis: 0, ratio: 1.0 };

        for (axis, (dynamics, position)) in self.axes.iter().zip(positions).enumerate() {
            let Some(limits) = dynamics.limits else {
                continue;
            };
            let speed_curve = position.differentiate();
            let accel_curve = speed_curve.differentiate();
            let jerk_curve = accel_curve.differentiate();

            for (binding, limit, curve) in [
                (&mut speed, limits.speed, &speed_curve),
                (&mut accel, limits.accel, &accel_curve),
                (&mut jerk, limits.jerk, &jerk_curve),
            ] {
                let ratio = limit / curve.peak_magnitude()?;
                if ratio < binding.ratio {
                    *binding = Binding { axis, ratio, ..*binding };
                }
            }
        }

        Ok([jerk, accel, speed]
            .into_iter()
            .find(|b| b.ratio < 1.0 - THROTTLE_EPSILON))
    }
}

/// Convenience wrapper building a [`MotionPlanner`] from parallel slices.
pub fn generate_move(
    source: &[f64],
    destination: &[f64],
    caps: MotionCaps,
    models: &[DynamicModel],
    limits: &[Option<AxisLimits>],
) -> Result<Option<PlannedMove>, MotionError> {
    if models.len() != limits.len() {
        return Err(MotionError::AxisConfigMismatch {
            models: models.len(),
            limits: limits.len(),
        });
    }
    let axes = models
        .iter()
        .zip(limits)
        .map(|(&model, &limits)| AxisDynamics { model, limits })
        .collect();
    MotionPlanner::new(axes).generate_move(source, destination, caps)
}

pub(crate) fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
