// src/gcode/mod.rs - G-code stream smoothing
pub mod adjuster;
pub mod parser;
pub mod processor;

pub use adjuster::{write_segments, MoveAdjuster};
pub use parser::{parse_line, Command};
pub use processor::GCodeProcessor;

use thiserror::Error;

use crate::discretize::DiscretizeError;
use crate::motion::MotionError;

#[derive(Debug, Error)]
pub enum GCodeError {
    #[error("Parse error at '{token}': {line}")]
    Parse { line: String, token: String },
    #[error("Sanity check failed: non-finite value in output for move to {destination:?}, aborting")]
    NonFiniteOutput { destination: [f64; 4] },
    #[error("Motion error: {0}")]
    Motion(#[from] MotionError),
    #[error("Discretization error: {0}")]
    Discretize(#[from] DiscretizeError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
