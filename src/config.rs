//! Configuration loader - YAML pattern file + .env settings

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CamoError, Result};
use crate::lsystem::RulesSpec;
use crate::palette::Palette;
use crate::turtle::{Canvas, WrapMode};

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_NUM_COLORS: usize = 5;
pub const DEFAULT_NUM_LOOPS: usize = 10;
pub const DEFAULT_RECURSION_DEPTH: u32 = 3;
pub const DEFAULT_AXIOM: &str = "F";
pub const DEFAULT_ANGLE: f64 = 25.0;
pub const DEFAULT_LENGTH: f64 = 10.0;
pub const DEFAULT_RANDOM_DEVIATION: f64 = 10.0;
pub const DEFAULT_MAX_SYMBOLS: u64 = 5_000_000;

/// Largest canvas side in pixels
pub const MAX_CANVAS_SIDE: u32 = 16_384;
/// Largest pen width in pixels
pub const MAX_LINE_THICKNESS: u32 = 512;
/// Bound on |angle|, |length| and random_deviation; keeps every jitter range
/// and turtle coordinate finite
pub const MAX_PARAMETER_MAGNITUDE: f64 = 1.0e6;

/// Inclusive pen width range in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThicknessRange {
    pub min: u32,
    pub max: u32,
}

impl Default for ThicknessRange {
    fn default() -> Self {
        Self { min: 2, max: 13 }
    }
}

/// Canvas size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
        }
    }
}

impl CanvasSize {
    pub fn bounds(&self) -> Canvas {
        Canvas::new(self.width, self.height)
    }
}

/// Everything one pattern generation needs, loaded from camo.yaml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub seed: u64,
    pub num_colors: usize,
    pub num_loops: usize,
    pub recursion_depth: u32,
    pub axiom: String,
    pub rules: RulesSpec,
    /// Base turn angle in degrees
    pub angle: f64,
    /// Base forward step
    pub length: f64,
    /// Jitter bound for angle, length and every turn
    pub random_deviation: f64,
    pub line_thickness: ThicknessRange,
    pub canvas: CanvasSize,
    pub wrap: WrapMode,
    pub palette: Palette,
    /// Refuse grammars whose expansion would exceed this many symbols
    pub max_symbols: u64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            num_colors: DEFAULT_NUM_COLORS,
            num_loops: DEFAULT_NUM_LOOPS,
            recursion_depth: DEFAULT_RECURSION_DEPTH,
            axiom: DEFAULT_AXIOM.to_string(),
            rules: RulesSpec::default(),
            angle: DEFAULT_ANGLE,
            length: DEFAULT_LENGTH,
            random_deviation: DEFAULT_RANDOM_DEVIATION,
            line_thickness: ThicknessRange::default(),
            canvas: CanvasSize::default(),
            wrap: WrapMode::default(),
            palette: Palette::default(),
            max_symbols: DEFAULT_MAX_SYMBOLS,
        }
    }
}

impl PatternConfig {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CamoError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| CamoError::config(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| CamoError::config(e.to_string()))
    }

    /// Domain checks on numeric parameters; grammar checks happen in the
    /// orchestrator
    pub fn validate(&self) -> Result<()> {
        let CanvasSize { width, height } = self.canvas;
        if width == 0 || height == 0 || width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
            return Err(CamoError::config(format!(
                "canvas must be between 1x1 and {m}x{m}, got {}x{}",
                width,
                height,
                m = MAX_CANVAS_SIDE
            )));
        }

        self.palette.validate()?;
        if self.num_colors == 0 || self.num_colors > self.palette.max_foreground() {
            return Err(CamoError::config(format!(
                "num_colors must be between 1 and {}, got {}",
                self.palette.max_foreground(),
                self.num_colors
            )));
        }

        let ThicknessRange { min, max } = self.line_thickness;
        if min == 0 || min > max || max > MAX_LINE_THICKNESS {
            return Err(CamoError::config(format!(
                "line_thickness range {}..={} is invalid (pen widths run 1..={})",
                min, max, MAX_LINE_THICKNESS
            )));
        }

        for (name, value) in [
            ("angle", self.angle),
            ("length", self.length),
            ("random_deviation", self.random_deviation),
        ] {
            if !value.is_finite() || value.abs() > MAX_PARAMETER_MAGNITUDE {
                return Err(CamoError::config(format!(
                    "{} must be finite and within ±{}, got {}",
                    name, MAX_PARAMETER_MAGNITUDE, value
                )));
            }
        }
        if self.random_deviation < 0.0 {
            return Err(CamoError::config(format!(
                "random_deviation must not be negative, got {}",
                self.random_deviation
            )));
        }

        if self.max_symbols == 0 {
            return Err(CamoError::config("max_symbols must be positive"));
        }

        Ok(())
    }
}

/// Runtime settings loaded from .env
#[derive(Debug, Clone)]
pub struct Settings {
    pub log_dir: String,
    pub output_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            output_dir: "output".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from .env file and the environment
    pub fn load() -> Self {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Settings {
            log_dir: std::env::var("CAMO_LOG_DIR").unwrap_or(defaults.log_dir),
            output_dir: std::env::var("CAMO_OUTPUT_DIR").unwrap_or(defaults.output_dir),
        }
    }
}
