// src/lib.rs - Dynamics-corrected G-code smoothing
pub mod config;
pub mod discretize;
pub mod gcode;
pub mod math;
pub mod motion;

pub use config::{load_config, Config, ConfigError};
pub use discretize::{linear_interpolate, Discretization, DiscretizeError};
pub use gcode::{GCodeError, GCodeProcessor, MoveAdjuster};
pub use math::{Curve, MathError, Polynomial};
pub use motion::{generate_move, DynamicModel, MotionCaps, MotionError, MotionPlanner};
