//! # Smoother Configuration
//!
//! Motion caps, per-axis dynamic models and limits, discretization
//! tolerances, optional Z-height calibration and the firmware commands
//! wrapped around smoothed sections.
//!
//! ## Example: TOML Configuration
//!
//! ```toml
//! [motion]
//! max_speed = 200.0
//! accel = 10000.0
//! jerk = 2000000.0
//!
//! [axes.x]
//! model = { type = "spring_damper", f_n = 60.5, zeta = 0.0 }
//! limits = { speed = 500.0 }
//! tolerance = 0.002
//!
//! [axes.e]
//! model = { type = "pressure_advance", k = 0.08 }
//! tolerance = 0.1
//!
//! [discretization]
//! min_dt = 0.005
//!
//! [calibration]
//! axis = "x"
//! parameter = "f_n"
//! value_min = 30.0
//! value_max = 75.0
//! z_max = 20.0
//! ```
//!
//! An axis table that is left out entirely keeps its built-in default; a
//! field left out of a present axis table falls back to "no model, no
//! limits, 0.01 tolerance".

// src/config.rs - Single configuration file
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::motion::{AxisDynamics, AxisLimits, DynamicModel, MotionCaps, MotionPlanner, ModelParameter};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub motion: MotionSettings,
    #[serde(default)]
    pub axes: AxesConfig,
    #[serde(default)]
    pub discretization: DiscretizationConfig,
    #[serde(default)]
    pub calibration: Option<CalibrationConfig>,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Global caps along the path.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotionSettings {
    #[serde(default = "default_max_speed")]
    pub max_speed: f64,
    #[serde(default = "default_accel")]
    pub accel: f64,
    #[serde(default = "default_jerk")]
    pub jerk: f64,
    /// Caps for moves that only drive the extruder.
    #[serde(default = "default_extrude_only_max_speed")]
    pub extrude_only_max_speed: f64,
    #[serde(default = "default_extrude_only_accel")]
    pub extrude_only_accel: f64,
    #[serde(default = "default_extrude_only_jerk")]
    pub extrude_only_jerk: f64,
    /// Extruder-only moves are passed through unless this is set.
    #[serde(default)]
    pub adjust_extrude_only: bool,
    #[serde(default = "default_max_throttle_iterations")]
    pub max_throttle_iterations: usize,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            max_speed: default_max_speed(),
            accel: default_accel(),
            jerk: default_jerk(),
            extrude_only_max_speed: default_extrude_only_max_speed(),
            extrude_only_accel: default_extrude_only_accel(),
            extrude_only_jerk: default_extrude_only_jerk(),
            adjust_extrude_only: false,
            max_throttle_iterations: default_max_throttle_iterations(),
        }
    }
}

impl MotionSettings {
    /// Caps for a move along XYZ requested at `target_speed`.
    pub fn caps(&self, target_speed: f64) -> MotionCaps {
        MotionCaps::new(target_speed.min(self.max_speed), self.accel, self.jerk)
    }

    /// Caps for an extruder-only move requested at `target_speed`.
    pub fn extrude_only_caps(&self, target_speed: f64) -> MotionCaps {
        MotionCaps::new(
            target_speed.min(self.extrude_only_max_speed),
            self.extrude_only_accel,
            self.extrude_only_jerk,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisName {
    X,
    Y,
    Z,
    E,
}

impl AxisName {
    pub const ALL: [AxisName; 4] = [AxisName::X, AxisName::Y, AxisName::Z, AxisName::E];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// One machine axis.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AxisConfig {
    #[serde(default)]
    pub model: DynamicModel,
    #[serde(default)]
    pub limits: Option<AxisLimits>,
    /// Absolute chord tolerance for discretization (mm)
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            model: DynamicModel::None,
            limits: None,
            tolerance: default_tolerance(),
        }
    }
}

impl AxisConfig {
    pub fn dynamics(&self) -> AxisDynamics {
        AxisDynamics {
            model: self.model,
            limits: self.limits,
        }
    }
}

/// X, Y, Z (Euclidean) and E (extruder), in machine vector order.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AxesConfig {
    #[serde(default = "default_x_axis")]
    pub x: AxisConfig,
    #[serde(default = "default_y_axis")]
    pub y: AxisConfig,
    #[serde(default = "default_z_axis")]
    pub z: AxisConfig,
    #[serde(default = "default_e_axis")]
    pub e: AxisConfig,
}

impl Default for AxesConfig {
    fn default() -> Self {
        Self {
            x: default_x_axis(),
            y: default_y_axis(),
            z: default_z_axis(),
            e: default_e_axis(),
        }
    }
}

impl AxesConfig {
    pub fn get(&self, axis: AxisName) -> &AxisConfig {
        match axis {
            AxisName::X => &self.x,
            AxisName::Y => &self.y,
            AxisName::Z => &self.z,
            AxisName::E => &self.e,
        }
    }

    pub fn get_mut(&mut self, axis: AxisName) -> &mut AxisConfig {
        match axis {
            AxisName::X => &mut self.x,
            AxisName::Y => &mut self.y,
            AxisName::Z => &mut self.z,
            AxisName::E => &mut self.e,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AxisName, &AxisConfig)> {
        AxisName::ALL.into_iter().map(move |name| (name, self.get(name)))
    }

    pub fn tolerances(&self) -> Vec<f64> {
        self.iter().map(|(_, axis)| axis.tolerance).collect()
    }

    pub fn dynamics(&self) -> Vec<AxisDynamics> {
        self.iter().map(|(_, axis)| axis.dynamics()).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiscretizationConfig {
    /// Intervals narrower than this are never subdivided (s)
    #[serde(default = "default_min_dt")]
    pub min_dt: f64,
}

impl Default for DiscretizationConfig {
    fn default() -> Self {
        Self { min_dt: default_min_dt() }
    }
}

/// Runtime parameter adjustment, invoked with the destination Z height
/// before every move is synthesized.
pub trait Calibration {
    fn adjust(&self, z: f64, axes: &mut AxesConfig);
}

impl<F> Calibration for F
where
    F: Fn(f64, &mut AxesConfig),
{
    fn adjust(&self, z: f64, axes: &mut AxesConfig) {
        self(z, axes)
    }
}

/// Linear ramp of one model parameter over Z:
/// `value = z / z_max * (value_max - value_min) + value_min`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalibrationConfig {
    pub axis: AxisName,
    pub parameter: ModelParameter,
    pub value_min: f64,
    pub value_max: f64,
    pub z_max: f64,
}

impl CalibrationConfig {
    pub fn value_at(&self, z: f64) -> f64 {
        z / self.z_max * (self.value_max - self.value_min) + self.value_min
    }
}

impl Calibration for CalibrationConfig {
    fn adjust(&self, z: f64, axes: &mut AxesConfig) {
        let value = self.value_at(z);
        if !axes.get_mut(self.axis).model.set_parameter(self.parameter, value) {
            tracing::warn!(
                "Calibration parameter {:?} does not apply to axis {:?}",
                self.parameter,
                self.axis
            );
        }
    }
}

/// Firmware commands wrapped around smoothed sections, and the comment
/// markers that switch smoothing on and off.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_start_commands")]
    pub start_commands: Vec<String>,
    #[serde(default = "default_end_commands")]
    pub end_commands: Vec<String>,
    #[serde(default = "default_start_marker")]
    pub start_marker: String,
    #[serde(default = "default_end_marker")]
    pub end_marker: String,
    /// Start smoothing as soon as the full position and feed rate are known.
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            start_commands: default_start_commands(),
            end_commands: default_end_commands(),
            start_marker: default_start_marker(),
            end_marker: default_end_marker(),
            autostart: default_autostart(),
        }
    }
}

impl Config {
    pub fn planner(&self) -> MotionPlanner {
        MotionPlanner::new(self.axes.dynamics())
            .with_max_throttle_iterations(self.motion.max_throttle_iterations)
    }

    /// Check value ranges that deserialization alone cannot catch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let motion = &self.motion;
        for (name, value) in [
            ("motion.max_speed", motion.max_speed),
            ("motion.accel", motion.accel),
            ("motion.jerk", motion.jerk),
            ("motion.extrude_only_max_speed", motion.extrude_only_max_speed),
            ("motion.extrude_only_accel", motion.extrude_only_accel),
            ("motion.extrude_only_jerk", motion.extrude_only_jerk),
            ("discretization.min_dt", self.discretization.min_dt),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!("{} must be > 0, got {}", name, value)));
            }
        }
        if motion.max_throttle_iterations == 0 {
            return Err(ConfigError::Invalid("motion.max_throttle_iterations must be >= 1".to_string()));
        }

        for (name, axis) in self.axes.iter() {
            if !(axis.tolerance > 0.0) || !axis.tolerance.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "Tolerance for axis {:?} must be finite and > 0",
                    name
                )));
            }
            if axis.model.parameters().iter().any(|p| !p.is_finite() || *p < 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "Parameters of the {} model on axis {:?} must be finite and >= 0",
                    axis.model.name(),
                    name
                )));
            }
            if let Some(limits) = axis.limits {
                if [limits.speed, limits.accel, limits.jerk].iter().any(|l| !(*l > 0.0)) {
                    return Err(ConfigError::Invalid(format!(
                        "Limits for axis {:?} must be > 0",
                        name
                    )));
                }
            }
        }

        if let Some(calibration) = &self.calibration {
            if !(calibration.z_max > 0.0) {
                return Err(ConfigError::Invalid("calibration.z_max must be > 0".to_string()));
            }
            let model = self.axes.get(calibration.axis).model;
            if !model.has_parameter(calibration.parameter) {
                return Err(ConfigError::Invalid(format!(
                    "Calibration parameter {:?} does not exist on the {} model of axis {:?}",
                    calibration.parameter,
                    model.name(),
                    calibration.axis
                )));
            }
        }
        Ok(())
    }
}

// Default value functions
fn default_max_speed() -> f64 { 200.0 }
fn default_accel() -> f64 { 10_000.0 }
fn default_jerk() -> f64 { 2_000_000.0 }
fn default_extrude_only_max_speed() -> f64 { 100.0 }
fn default_extrude_only_accel() -> f64 { 20_000.0 }
fn default_extrude_only_jerk() -> f64 { 5_000_000.0 }
fn default_max_throttle_iterations() -> usize { crate::motion::planner::DEFAULT_MAX_THROTTLE_ITERATIONS }
fn default_tolerance() -> f64 { 0.01 }
fn default_min_dt() -> f64 { 1.0 / 200.0 }
fn default_start_marker() -> String { "--- MODIFY START ---".to_string() }
fn default_end_marker() -> String { "--- MODIFY END ---".to_string() }
fn default_autostart() -> bool { true }

fn default_x_axis() -> AxisConfig {
    AxisConfig {
        model: DynamicModel::SpringDamper { f_n: 60.5, zeta: 0.0 },
        limits: Some(AxisLimits { speed: 500.0, ..AxisLimits::default() }),
        tolerance: 0.002,
    }
}

fn default_y_axis() -> AxisConfig {
    AxisConfig {
        model: DynamicModel::SpringDamper { f_n: 52.0, zeta: 0.025 },
        limits: Some(AxisLimits { speed: 500.0, ..AxisLimits::default() }),
        tolerance: 0.002,
    }
}

fn default_z_axis() -> AxisConfig {
    AxisConfig {
        model: DynamicModel::None,
        limits: Some(AxisLimits { speed: 24.0, accel: 1000.0, jerk: 1_000_000.0 }),
        tolerance: 0.05,
    }
}

fn default_e_axis() -> AxisConfig {
    AxisConfig {
        model: DynamicModel::PressureAdvance { k: 0.08 },
        limits: None,
        tolerance: 0.1,
    }
}

// RepRapFirmware: jerk policy 1, pressure advance off, acceleration and
// instantaneous speed change effectively unlimited.
fn default_start_commands() -> Vec<String> {
    [
        "M566 P1",
        "M572 D0 S0",
        "M201 X100000 Y100000 Z100000 E100000",
        "M205 X10000 Y10000 Z10000 E10000",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_end_commands() -> Vec<String> {
    ["M201 X2000 Y2000 Z2000 E2000", "M205 X10 Y10 Z10 E10000"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Load and validate configuration from a TOML file at the given path.
pub fn load_config(path: &str) -> Result<Config, ConfigError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            tracing::error!("Failed to read config file '{}': {}", path, e);
            return Err(ConfigError::Io(e));
        }
    };
    let config: Config = match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to parse config TOML: {}", e);
            return Err(ConfigError::Toml(e));
        }
    };
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.motion.max_speed, 200.0);
        assert_eq!(config.motion.accel, 10_000.0);
        assert_eq!(config.axes.x.tolerance, 0.002);
        assert_eq!(config.axes.e.model, DynamicModel::PressureAdvance { k: 0.08 });
        assert_eq!(config.discretization.min_dt, 0.005);
        assert!(config.calibration.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_axes_keep_defaults() {
        let toml_str = r#"
            [axes.y]
            model = { type = "asymmetric_spring_damper", f_n_positive = 56.9, f_n_negative = 52.5, zeta = 0.02 }
            tolerance = 0.003
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.axes.x, default_x_axis());
        assert_eq!(config.axes.y.tolerance, 0.003);
        assert!(config.axes.y.limits.is_none());
        assert!(matches!(config.axes.y.model, DynamicModel::AsymmetricSpringDamper { .. }));
        assert_eq!(config.axes.tolerances(), vec![0.002, 0.003, 0.05, 0.1]);
    }

    #[test]
    fn test_calibration_ramp() {
        let toml_str = r#"
            [calibration]
            axis = "e"
            parameter = "k"
            value_min = 0.02
            value_max = 0.1
            z_max = 20.0
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        let calibration = config.calibration.clone().unwrap();

        let mut axes = config.axes.clone();
        calibration.adjust(10.0, &mut axes);
        match axes.e.model {
            DynamicModel::PressureAdvance { k } => assert!((k - 0.06).abs() < 1e-12),
            other => panic!("unexpected model {:?}", other),
        }
    }

    #[test]
    fn test_calibration_closure() {
        let mut axes = AxesConfig::default();
        let calibration = |z: f64, axes: &mut AxesConfig| {
            axes.x.model.set_parameter(ModelParameter::NaturalFrequency, 40.0 + z);
        };
        calibration.adjust(2.0, &mut axes);
        assert_eq!(axes.x.model, DynamicModel::SpringDamper { f_n: 42.0, zeta: 0.0 });
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.axes.z.tolerance = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.calibration = Some(CalibrationConfig {
            axis: AxisName::Z,
            parameter: ModelParameter::Zeta,
            value_min: 0.0,
            value_max: 1.0,
            z_max: 10.0,
        });
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = Config::default();
        config.axes.x.limits = Some(AxisLimits { speed: 0.0, ..AxisLimits::default() });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("smoother.toml");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "[motion]\nmax_speed = 150.0\n\n[discretization]\nmin_dt = 0.002").unwrap();

        let config = load_config(file_path.to_str().unwrap()).unwrap();
        assert_eq!(config.motion.max_speed, 150.0);
        assert_eq!(config.motion.jerk, 2_000_000.0);
        assert_eq!(config.discretization.min_dt, 0.002);
    }

    #[test]
    fn test_load_config_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/smoother.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
