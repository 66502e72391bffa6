//! Pattern Orchestrator
//!
//! Seeds the random source, selects colors, expands the grammar once and
//! draws `num_loops` trees from it. Per tree the stream is consumed in a fixed
//! order: start x, start y, heading, angle jitter, length jitter, thickness,
//! color, then the interpreter's turn jitter.
//!
//! Generation is all-or-nothing: any error aborts it and no pattern is
//! returned, so a bad grammar never yields a partial canvas.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::PatternConfig;
use crate::error::{CamoError, Result};
use crate::lsystem::{check_branches, Grammar};
use crate::palette::{jitter, seeded_rng, select_colors, Color};
use crate::sink::DrawSink;
use crate::turtle::{DrawParams, PathEvent, Turtle, TurtleState};

/// One drawn L-system instance
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub color: Color,
    pub thickness: u32,
    pub start: TurtleState,
    pub params: DrawParams,
    pub events: Vec<PathEvent>,
    pub wraps: usize,
}

/// A generated pattern, ready for a renderer
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub background: Color,
    pub foreground: Vec<Color>,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatternStats {
    pub trees: usize,
    pub segments: usize,
    pub wraps: usize,
}

impl Pattern {
    /// Emit the background, then every tree's moves and lines in order
    pub fn replay<S: DrawSink + ?Sized>(&self, sink: &mut S) {
        sink.set_background(self.background);
        for tree in &self.trees {
            for event in &tree.events {
                match *event {
                    PathEvent::MoveTo(p) => sink.move_to(p),
                    PathEvent::LineTo(p) => sink.line_to(p, tree.color, tree.thickness),
                }
            }
        }
    }

    pub fn stats(&self) -> PatternStats {
        let segments = self
            .trees
            .iter()
            .flat_map(|t| t.events.iter())
            .filter(|e| matches!(e, PathEvent::LineTo(_)))
            .count();

        PatternStats {
            trees: self.trees.len(),
            segments,
            wraps: self.trees.iter().map(|t| t.wraps).sum(),
        }
    }
}

/// Build the expanded grammar string for `config`, after all checks that
/// must pass before any drawing
pub fn prepare_symbols(config: &PatternConfig) -> Result<String> {
    let rules = config.rules.to_rule_set()?;
    let grammar = Grammar::new(config.axiom.clone(), rules);

    let predicted = grammar.expanded_len(config.recursion_depth);
    if predicted > u128::from(config.max_symbols) {
        return Err(CamoError::config(format!(
            "depth {} expands to {} symbols, above max_symbols {}",
            config.recursion_depth, predicted, config.max_symbols
        )));
    }

    let symbols = grammar.expand(config.recursion_depth);
    check_branches(&symbols)?;

    debug!(
        depth = config.recursion_depth,
        rules = grammar.rules.len(),
        symbols = symbols.len(),
        "Grammar expanded"
    );
    Ok(symbols)
}

/// Generate a full pattern from `config`
pub fn generate_pattern(config: &PatternConfig) -> Result<Pattern> {
    config.validate()?;
    let symbols = prepare_symbols(config)?;

    let mut rng = seeded_rng(config.seed);
    let colors = select_colors(&mut rng, &config.palette, config.num_colors)?;
    info!(
        seed = config.seed,
        background = %colors.background,
        foreground = colors.foreground.len(),
        "Colors selected"
    );

    let canvas = config.canvas.bounds();
    let deviation = config.random_deviation;
    let thickness = config.line_thickness;
    let mut trees = Vec::with_capacity(config.num_loops);

    for index in 0..config.num_loops {
        let x = rng.gen_range(-canvas.half_width..=canvas.half_width);
        let y = rng.gen_range(-canvas.half_height..=canvas.half_height);
        let heading = rng.gen_range(0.0..360.0);

        let params = DrawParams {
            angle: config.angle + jitter(&mut rng, deviation),
            length: config.length + jitter(&mut rng, deviation),
            deviation,
        };
        let tree_thickness = rng.gen_range(thickness.min..=thickness.max);
        let color = *colors
            .foreground
            .choose(&mut rng)
            .ok_or_else(|| CamoError::config("no foreground colors selected"))?;

        let start = TurtleState::new([x, y], heading);
        let trace = Turtle::new(params, canvas, config.wrap).draw(&symbols, start, &mut rng)?;

        debug!(
            tree = index,
            color = %color,
            thickness = tree_thickness,
            segments = trace.segments(),
            wraps = trace.wraps,
            "Tree drawn"
        );

        trees.push(Tree {
            color,
            thickness: tree_thickness,
            start,
            params,
            events: trace.events,
            wraps: trace.wraps,
        });
    }

    let pattern = Pattern {
        background: colors.background,
        foreground: colors.foreground,
        trees,
    };

    let stats = pattern.stats();
    info!(
        trees = stats.trees,
        segments = stats.segments,
        wraps = stats.wraps,
        "Pattern generated"
    );
    Ok(pattern)
}
