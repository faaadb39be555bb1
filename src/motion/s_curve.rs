// src/motion/s_curve.rs
/// S-curve motion profile generator
///
/// Produces the acceleration-vs-time curve of a symmetric, jerk-limited move
/// that starts and ends at rest. The curve is piecewise linear; integrating it
/// once gives velocity, twice gives position along the path.
///
/// Phases of the full profile:
/// 1. Jerk up (acceleration ramps to its peak)
/// 2. Constant acceleration (optional)
/// 3. Jerk down (acceleration back to zero)
/// 4. Coast at constant speed (optional)
/// 5-7. Mirror image of 1-3 for the deceleration
pub struct SCurveGenerator {
    /// Maximum speed along the path (mm/s)
    max_speed: f64,

    /// Maximum acceleration (mm/s²)
    max_accel: f64,

    /// Maximum jerk (mm/s³)
    max_jerk: f64,
}

use thiserror::Error;

use crate::math::Curve;

#[derive(Debug, Error)]
pub enum SCurveError {
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("Profile construction failed: {0}")]
    Construction(#[from] crate::math::MathError),
}

/// Timing of one profile, all durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ProfilePhases {
    jerk_time: f64,
    peak_accel: f64,
    constant_accel_time: f64,
    coast_time: f64,
}

impl ProfilePhases {
    /// Breakpoints `(t, accel)` of the acceleration curve. Phases whose
    /// duration is not positive are left out so no zero-length segment is
    /// produced.
    fn breakpoints(&self) -> Vec<(f64, f64)> {
        let tj = self.jerk_time;
        let a = self.peak_accel;

        let mut points = vec![(0.0, 0.0), (tj, a)];
        let mut t = tj;
        if self.constant_accel_time > 0.0 {
            t += self.constant_accel_time;
            points.push((t, a));
        }
        if self.coast_time > 0.0 {
            t += tj;
            points.push((t, 0.0));
            t += self.coast_time;
            points.push((t, 0.0));
            t += tj;
        } else {
            t += 2.0 * tj;
        }
        points.push((t, -a));
        if self.constant_accel_time > 0.0 {
            t += self.constant_accel_time;
            points.push((t, -a));
        }
        points.push((t + tj, 0.0));
        points
    }
}

impl SCurveGenerator {
    pub fn new(max_speed: f64, max_accel: f64, max_jerk: f64) -> Self {
        Self {
            max_speed,
            max_accel,
            max_jerk,
        }
    }

    /// Acceleration curve covering `distance`. A zero distance yields the
    /// single-point curve at the origin.
    pub fn profile(&self, distance: f64) -> Result<Curve, SCurveError> {
        self.validate(distance)?;
        if distance == 0.0 {
            return Ok(Curve::piecewise_linear(&[0.0], &[0.0])?);
        }

        let phases = self.solve_phases(distance);
        let (ts, accels): (Vec<f64>, Vec<f64>) = phases.breakpoints().into_iter().unzip();
        Ok(Curve::piecewise_linear(&ts, &accels)?)
    }

    fn validate(&self, distance: f64) -> Result<(), SCurveError> {
        if !distance.is_finite() || distance < 0.0 {
            return Err(SCurveError::InvalidParameters(format!(
                "distance must be finite and non-negative, got {distance}"
            )));
        }
        if distance > 0.0 {
            for (name, value) in [
                ("max_speed", self.max_speed),
                ("max_accel", self.max_accel),
                ("max_jerk", self.max_jerk),
            ] {
                if !(value > 0.0) {
                    return Err(SCurveError::InvalidParameters(format!(
                        "{name} must be positive, got {value}"
                    )));
                }
            }
        }
        Ok(())
    }

    fn solve_phases(&self, distance: f64) -> ProfilePhases {
        let jerk = self.max_jerk;
        let time_to_constant_accel = self.max_accel / jerk;

        let max_jerk_time = max_jerk_time(distance, jerk);
        let speed_limit_time = jerk_time_to_speed(jerk, self.max_speed);

        if max_jerk_time <= time_to_constant_accel || speed_limit_time <= time_to_constant_accel {
            // No constant acceleration phase.
            if peak_speed_under_jerk(max_jerk_time, jerk) <= self.max_speed {
                return ProfilePhases {
                    jerk_time: max_jerk_time,
                    peak_accel: max_jerk_time * jerk,
                    constant_accel_time: 0.0,
                    coast_time: 0.0,
                };
            }

            // Speed cap binds: ramp just long enough to hit it, then coast.
            let jerk_time = speed_limit_time;
            let peak_accel = jerk_time * jerk;
            debug_assert!(peak_accel <= self.max_accel * (1.0 + 1e-12));

            let coast_distance = distance - 2.0 * distance_during_jerk(jerk, jerk_time);
            debug_assert!(coast_distance > 0.0);

            return ProfilePhases {
                jerk_time,
                peak_accel,
                constant_accel_time: 0.0,
                coast_time: coast_distance / self.max_speed,
            };
        }

        // Constant acceleration phase required; the speed cap cannot bind
        // before it starts.
        let jerk_time = time_to_constant_accel;
        let half_distance_time = time_to_half_distance(jerk, jerk_time, distance / 2.0);
        let time_to_max_speed = time_to_speed(jerk, jerk_time, self.max_speed);

        if half_distance_time <= time_to_max_speed {
            ProfilePhases {
                jerk_time,
                peak_accel: self.max_accel,
                constant_accel_time: half_distance_time - 2.0 * jerk_time,
                coast_time: 0.0,
            }
        } else {
            let constant_accel_time = time_to_max_speed - 2.0 * jerk_time;
            let accel_distance = half_distance(jerk, jerk_time, constant_accel_time);
            let coast_distance = distance - 2.0 * accel_distance;
            ProfilePhases {
                jerk_time,
                peak_accel: self.max_accel,
                constant_accel_time,
                coast_time: coast_distance / self.max_speed,
            }
        }
    }
}

/// Acceleration curve for a symmetric jerk-limited move over `distance`.
pub fn s_curve_profile(
    distance: f64,
    max_speed: f64,
    max_accel: f64,
    max_jerk: f64,
) -> Result<Curve, SCurveError> {
    SCurveGenerator::new(max_speed, max_accel, max_jerk).profile(distance)
}

// Jerk +j for T then -j until 2T gives p(2T) = j·T³; solve p(2T) = distance / 2.
fn max_jerk_time(distance: f64, jerk: f64) -> f64 {
    (distance / (2.0 * jerk)).cbrt()
}

fn distance_during_jerk(jerk: f64, jerk_time: f64) -> f64 {
    jerk * jerk_time.powi(3)
}

// Peak speed of a jerk-up ramp immediately followed by a jerk-down ramp.
fn peak_speed_under_jerk(jerk_time: f64, jerk: f64) -> f64 {
    jerk * jerk_time * jerk_time
}

fn jerk_time_to_speed(jerk: f64, speed: f64) -> f64 {
    (speed / jerk).sqrt()
}

fn half_distance(jerk: f64, jerk_time: f64, constant_accel_time: f64) -> f64 {
    jerk * jerk_time
        * (1.5 * jerk_time * constant_accel_time
            + constant_accel_time * constant_accel_time / 2.0
            + jerk_time * jerk_time)
}

// `half_distance` solved for the constant acceleration time, plus both ramps.
fn time_to_half_distance(jerk: f64, jerk_time: f64, half_distance: f64) -> f64 {
    let discriminant = (8.0 * half_distance + jerk * jerk_time.powi(3)) / (jerk * jerk_time);
    0.5 * (-3.0 * jerk_time + discriminant.sqrt()) + 2.0 * jerk_time
}

fn time_to_speed(jerk: f64, jerk_time: f64, speed: f64) -> f64 {
    let accel = jerk * jerk_time;
    let constant_accel_time = (speed - accel * jerk_time) / accel;
    constant_accel_time + 2.0 * jerk_time
}
