// src/motion/mod.rs - Jerk-limited move synthesis with per-axis dynamic correction

pub mod dynamics;
pub mod planner;
pub mod s_curve;

pub use dynamics::{ArcProfile, AxisLimits, DynamicModel, LimitKind, ModelParameter};
pub use planner::{generate_move, AxisDynamics, MotionCaps, MotionPlanner, PlannedMove};
pub use s_curve::{s_curve_profile, SCurveError, SCurveGenerator};

use crate::math::MathError;

#[derive(Debug, thiserror::Error)]
pub enum MotionError {
    #[error("Expected {axes} axes, got source of {source_len} and destination of {destination_len}")]
    DimensionMismatch {
        axes: usize,
        source_len: usize,
        destination_len: usize,
    },
    #[error("{models} dynamic models but {limits} axis limit entries")]
    AxisConfigMismatch { models: usize, limits: usize },
    #[error("Profile error: {0}")]
    Profile(#[from] SCurveError),
    #[error("Math error: {0}")]
    Math(#[from] MathError),
    #[error(
        "Axis {axis} {limit} limit still exceeded after {iterations} attempts (ratio {ratio:.5}); check the axis limits against the motion caps"
    )]
    ThrottleDidNotConverge {
        axis: usize,
        limit: LimitKind,
        ratio: f64,
        iterations: usize,
    },
}
