// src/motion/dynamics.rs
//! Per-axis dynamic correction models and axis limits.

use std::f64::consts::TAU;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::math::{self, Curve, MathError};

/// Mechanical model used to pre-distort one axis' commanded position.
///
/// ```toml
/// model = { type = "spring_damper", f_n = 60.5, zeta = 0.0 }
/// model = { type = "asymmetric_spring_damper", f_n_positive = 56.9, f_n_negative = 52.5, zeta = 0.02 }
/// model = { type = "pressure_advance", k = 0.08 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DynamicModel {
    #[default]
    None,
    SpringDamper {
        /// Natural frequency (Hz)
        f_n: f64,
        /// Damping ratio
        zeta: f64,
    },
    AsymmetricSpringDamper {
        f_n_positive: f64,
        f_n_negative: f64,
        zeta: f64,
    },
    PressureAdvance {
        /// Advance coefficient (s)
        k: f64,
    },
}

/// A single tunable parameter of a [`DynamicModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelParameter {
    #[serde(rename = "f_n")]
    NaturalFrequency,
    Zeta,
    #[serde(rename = "f_n_positive")]
    NaturalFrequencyPositive,
    #[serde(rename = "f_n_negative")]
    NaturalFrequencyNegative,
    #[serde(rename = "k")]
    PressureAdvance,
}

/// Optional per-axis caps. Missing fields are unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisLimits {
    #[serde(default = "unlimited")]
    pub speed: f64,
    #[serde(default = "unlimited")]
    pub accel: f64,
    #[serde(default = "unlimited")]
    pub jerk: f64,
}

fn unlimited() -> f64 {
    f64::INFINITY
}

impl Default for AxisLimits {
    fn default() -> Self {
        Self {
            speed: unlimited(),
            accel: unlimited(),
            jerk: unlimited(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    Speed,
    Accel,
    Jerk,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LimitKind::Speed => "speed",
            LimitKind::Accel => "accel",
            LimitKind::Jerk => "jerk",
        };
        f.write_str(name)
    }
}

/// Acceleration, speed and position along the path, all over time.
#[derive(Debug, Clone)]
pub struct ArcProfile {
    pub accel: Curve,
    pub speed: Curve,
    pub position: Curve,
}

impl ArcProfile {
    pub fn from_accel(accel: Curve) -> Self {
        let speed = accel.integrate();
        let position = speed.integrate();
        Self {
            accel,
            speed,
            position,
        }
    }
}

impl DynamicModel {
    /// Position curve of one axis, relative to its start, for an axis that
    /// covers `k` units per unit of path length.
    pub fn axis_position(&self, arc: &ArcProfile, k: f64) -> Result<Curve, MathError> {
        let base = &arc.position * k;

        let position = match *self {
            DynamicModel::None => base,
            DynamicModel::SpringDamper { f_n, zeta } => {
                let omega = f_n * TAU;
                if omega > 0.0 {
                    let correction =
                        &(&arc.accel * (k / (omega * omega))) + &(&arc.speed * (k * 2.0 * zeta / omega));
                    &base + &correction
                } else {
                    base
                }
            }
            DynamicModel::AsymmetricSpringDamper {
                f_n_positive,
                f_n_negative,
                zeta,
            } => {
                let omega_pos = f_n_positive * TAU;
                let omega_neg = f_n_negative * TAU;
                if omega_pos > 0.0 || omega_neg > 0.0 {
                    let b_div_m = zeta * (omega_pos + omega_neg);
                    // compliance switches with the sign of the driving force
                    let compliance = math::kinked_line(compliance(omega_neg), compliance(omega_pos));
                    let force = &(&arc.accel * k) + &(&arc.speed * (k * b_div_m));
                    &base + &math::composite(&compliance, &force)?
                } else {
                    base
                }
            }
            DynamicModel::PressureAdvance { k: advance } => {
                if advance > 0.0 {
                    let rate = &(&arc.speed * k) + &(&arc.accel * (k * advance));
                    rate.integrate()
                } else {
                    base
                }
            }
        };
        Ok(position)
    }

    /// Overwrite `parameter` in place. Returns `false` when this model has no
    /// such parameter.
    pub fn set_parameter(&mut self, parameter: ModelParameter, value: f64) -> bool {
        let slot = match (self, parameter) {
            (DynamicModel::SpringDamper { f_n, .. }, ModelParameter::NaturalFrequency) => f_n,
            (DynamicModel::SpringDamper { zeta, .. }, ModelParameter::Zeta) => zeta,
            (DynamicModel::AsymmetricSpringDamper { zeta, .. }, ModelParameter::Zeta) => zeta,
            (DynamicModel::AsymmetricSpringDamper { f_n_positive, .. }, ModelParameter::NaturalFrequencyPositive) => {
                f_n_positive
            }
            (DynamicModel::AsymmetricSpringDamper { f_n_negative, .. }, ModelParameter::NaturalFrequencyNegative) => {
                f_n_negative
            }
            (DynamicModel::PressureAdvance { k }, ModelParameter::PressureAdvance) => k,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn has_parameter(&self, parameter: ModelParameter) -> bool {
        let mut probe = *self;
        probe.set_parameter(parameter, 0.0)
    }

    /// Every numeric parameter of the model.
    pub fn parameters(&self) -> Vec<f64> {
        match *self {
            DynamicModel::None => Vec::new(),
            DynamicModel::SpringDamper { f_n, zeta } => vec![f_n, zeta],
            DynamicModel::AsymmetricSpringDamper {
                f_n_positive,
                f_n_negative,
                zeta,
            } => vec![f_n_positive, f_n_negative, zeta],
            DynamicModel::PressureAdvance { k } => vec![k],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DynamicModel::None => "none",
            DynamicModel::SpringDamper { .. } => "spring_damper",
            DynamicModel::AsymmetricSpringDamper { .. } => "asymmetric_spring_damper",
            DynamicModel::PressureAdvance { .. } => "pressure_advance",
        }
    }
}

// 1/ω², zero for a side with no declared frequency
fn compliance(omega: f64) -> f64 {
    if omega > 0.0 { 1.0 / (omega * omega) } else { 0.0 }
}
