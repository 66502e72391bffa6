//! Camo Walker - L-system camouflage pattern generator
//!
//! An axiom is rewritten through production rules, then a turtle walks the
//! expanded string on a torus canvas. Repeating that at seeded random
//! positions, headings and colors fills the canvas with a pattern that one
//! seed reproduces exactly.
//!
//! - lsystem: grammar expansion and rule notation
//! - turtle: the path interpreter and canvas wrap
//! - palette: colors and the seeded random source
//! - pattern: the orchestrator tying them together
//! - sink / render: handing finished geometry to a renderer or PNG file

pub mod config;
pub mod error;
pub mod logging;
pub mod lsystem;
pub mod palette;
pub mod pattern;
pub mod render;
pub mod sink;
pub mod turtle;

pub use config::{PatternConfig, Settings};
pub use error::{CamoError, Result};
pub use lsystem::{expand, Grammar, RuleSet};
pub use palette::{seeded_rng, select_colors, Color, ColorSelection, Palette};
pub use pattern::{generate_pattern, Pattern, Tree};
pub use sink::{DrawEvent, DrawSink, EventRecorder};
pub use turtle::{Canvas, DrawParams, PathEvent, Turtle, TurtleState, WrapMode};
