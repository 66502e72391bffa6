//! Turtle 2D Interpreter
//!
//! Converts an expanded L-system string into pen movements on a torus canvas.
//! - `F`: draw forward
//! - `+` / `-`: turn right / left by the base angle plus fresh jitter
//! - `[` / `]`: save / restore position and heading
//!
//! Any other symbol has no geometric effect.
//!
//! Heading 0 points along +X and grows clockwise on a y-up canvas, so a
//! right turn adds to the heading.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CamoError, Result};
use crate::palette::jitter;

/// Canvas coordinates, origin at the center, y up
pub type Point = [f64; 2];

/// Interpreter vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Forward,
    TurnRight,
    TurnLeft,
    BranchOpen,
    BranchClose,
}

impl Command {
    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            'F' => Some(Command::Forward),
            '+' => Some(Command::TurnRight),
            '-' => Some(Command::TurnLeft),
            '[' => Some(Command::BranchOpen),
            ']' => Some(Command::BranchClose),
            _ => None,
        }
    }
}

/// A single pen movement
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathEvent {
    /// Pen up: jump without drawing
    MoveTo(Point),
    /// Pen down: draw from the previous point
    LineTo(Point),
}

/// Pen position, heading and pen flag; replaced (never mutated) on each step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleState {
    pub position: Point,
    pub heading: f64,
    pub pen_down: bool,
}

impl TurtleState {
    pub fn new(position: Point, heading: f64) -> Self {
        Self {
            position,
            heading: normalize_heading(heading),
            pen_down: true,
        }
    }

    /// Point `length` units ahead along the heading
    pub fn ahead(&self, length: f64) -> Point {
        let rad = self.heading.to_radians();
        [
            self.position[0] + length * rad.cos(),
            self.position[1] - length * rad.sin(),
        ]
    }

    pub fn turned(self, degrees: f64) -> Self {
        Self {
            heading: normalize_heading(self.heading + degrees),
            ..self
        }
    }

    pub fn pen_up(self) -> Self {
        Self {
            pen_down: false,
            ..self
        }
    }

    pub fn pen_down(self) -> Self {
        Self {
            pen_down: true,
            ..self
        }
    }

    /// Move to `to`, drawing if the pen is down
    fn travel(self, to: Point, events: &mut Vec<PathEvent>) -> Self {
        events.push(if self.pen_down {
            PathEvent::LineTo(to)
        } else {
            PathEvent::MoveTo(to)
        });
        Self {
            position: to,
            ..self
        }
    }
}

/// Wrap a heading into [0, 360)
pub fn normalize_heading(degrees: f64) -> f64 {
    let h = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Half extents of the drawing area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    pub half_width: f64,
    pub half_height: f64,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            half_width: width as f64 / 2.0,
            half_height: height as f64 / 2.0,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p[0].abs() <= self.half_width && p[1].abs() <= self.half_height
    }
}

/// How positions past an edge re-enter the canvas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// One fold across the opposite edge; exact only within one extra canvas
    /// extent past the boundary (|x| <= 3 * half_width)
    #[default]
    SingleFold,
    /// True torus wrap for any distance
    Modulo,
}

impl WrapMode {
    pub fn wrap(self, p: Point, canvas: &Canvas) -> Point {
        [
            self.wrap_axis(p[0], canvas.half_width),
            self.wrap_axis(p[1], canvas.half_height),
        ]
    }

    fn wrap_axis(self, v: f64, half: f64) -> f64 {
        match self {
            WrapMode::SingleFold => {
                if v > half {
                    -half + (v - half)
                } else if v < -half {
                    half + (v + half)
                } else {
                    v
                }
            }
            WrapMode::Modulo => {
                if v.abs() <= half {
                    v
                } else {
                    (v + half).rem_euclid(2.0 * half) - half
                }
            }
        }
    }
}

/// Per-tree drawing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawParams {
    /// Base turn angle in degrees
    pub angle: f64,
    /// Forward step length
    pub length: f64,
    /// Turn jitter bound in degrees
    pub deviation: f64,
}

/// Output of one tree draw
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    pub events: Vec<PathEvent>,
    pub end: TurtleState,
    /// Wrap-induced jumps
    pub wraps: usize,
}

impl Trace {
    pub fn segments(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, PathEvent::LineTo(_)))
            .count()
    }
}

/// Interpreter bound to one tree's parameters and the canvas it wraps on
#[derive(Debug, Clone, Copy)]
pub struct Turtle {
    pub params: DrawParams,
    pub canvas: Canvas,
    pub wrap: WrapMode,
}

impl Turtle {
    pub fn new(params: DrawParams, canvas: Canvas, wrap: WrapMode) -> Self {
        Self {
            params,
            canvas,
            wrap,
        }
    }

    /// Interpret `symbols` from `start`
    ///
    /// The first event is always a jump to the start position. A branch-close
    /// with nothing to restore fails with `MalformedGrammar`.
    pub fn draw<R: Rng + ?Sized>(
        &self,
        symbols: &str,
        start: TurtleState,
        rng: &mut R,
    ) -> Result<Trace> {
        let mut events = vec![PathEvent::MoveTo(start.position)];
        let mut stack: Vec<TurtleState> = Vec::new();
        let mut state = start;
        let mut wraps = 0;

        for command in symbols.chars().filter_map(Command::from_symbol) {
            let (next, wrapped) = self.step(state, command, &mut stack, rng, &mut events)?;
            state = next;
            if wrapped {
                wraps += 1;
            }
        }

        if !stack.is_empty() {
            tracing::trace!(open = stack.len(), "Unclosed branches at end of string");
        }

        Ok(Trace {
            events,
            end: state,
            wraps,
        })
    }

    /// Apply one command, returning the next state and whether a forward
    /// move wrapped across an edge
    pub fn step<R: Rng + ?Sized>(
        &self,
        state: TurtleState,
        command: Command,
        stack: &mut Vec<TurtleState>,
        rng: &mut R,
        events: &mut Vec<PathEvent>,
    ) -> Result<(TurtleState, bool)> {
        match command {
            Command::Forward => {
                let moved = state.travel(state.ahead(self.params.length), events);
                if self.canvas.contains(moved.position) {
                    return Ok((moved, false));
                }
                let wrapped = self.wrap.wrap(moved.position, &self.canvas);
                Ok((moved.pen_up().travel(wrapped, events).pen_down(), true))
            }
            Command::TurnRight => Ok((state.turned(self.turn(rng)), false)),
            Command::TurnLeft => Ok((state.turned(-self.turn(rng)), false)),
            Command::BranchOpen => {
                stack.push(state);
                Ok((state, false))
            }
            Command::BranchClose => {
                let saved = stack.pop().ok_or_else(|| {
                    CamoError::grammar("branch-close with an empty branch stack")
                })?;
                let restored = state.pen_up().travel(saved.position, events);
                let next = TurtleState {
                    heading: saved.heading,
                    ..restored
                }
                .pen_down();
                Ok((next, false))
            }
        }
    }

    fn turn<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.params.angle + jitter(rng, self.params.deviation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn turtle(angle: f64, length: f64, deviation: f64) -> Turtle {
        Turtle::new(
            DrawParams {
                angle,
                length,
                deviation,
            },
            Canvas::new(600, 600),
            WrapMode::SingleFold,
        )
    }

    #[test]
    fn test_forward_draws() {
        let mut rng = StdRng::seed_from_u64(1);
        let trace = turtle(90.0, 10.0, 0.0)
            .draw("FFF", TurtleState::new([0.0, 0.0], 0.0), &mut rng)
            .unwrap();

        assert_eq!(trace.events.len(), 4);
        assert_eq!(trace.events[0], PathEvent::MoveTo([0.0, 0.0]));
        assert_eq!(trace.segments(), 3);
        assert_relative_eq!(trace.end.position[0], 30.0, epsilon = 1e-9);
        assert_relative_eq!(trace.end.position[1], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_right_turn_is_clockwise() {
        let mut rng = StdRng::seed_from_u64(1);
        let trace = turtle(90.0, 10.0, 0.0)
            .draw("+F", TurtleState::new([0.0, 0.0], 0.0), &mut rng)
            .unwrap();

        assert_relative_eq!(trace.end.heading, 90.0, epsilon = 1e-9);
        assert_relative_eq!(trace.end.position[0], 0.0, epsilon = 1e-9);
        assert_relative_eq!(trace.end.position[1], -10.0, epsilon = 1e-9);

        let trace = turtle(90.0, 10.0, 0.0)
            .draw("-", TurtleState::new([0.0, 0.0], 0.0), &mut rng)
            .unwrap();
        assert_relative_eq!(trace.end.heading, 270.0, epsilon = 1e-9);
    }

    #[test]
    fn test_turn_jitter_bounded() {
        let mut rng = StdRng::seed_from_u64(7);
        let t = turtle(25.0, 10.0, 10.0);
        for _ in 0..200 {
            let trace = t
                .draw("+", TurtleState::new([0.0, 0.0], 0.0), &mut rng)
                .unwrap();
            assert!(trace.end.heading >= 15.0 && trace.end.heading <= 35.0);
        }
    }

    #[test]
    fn test_turns_draw_fresh_jitter() {
        let mut rng = StdRng::seed_from_u64(3);
        let trace = turtle(25.0, 10.0, 10.0)
            .draw("+-", TurtleState::new([0.0, 0.0], 0.0), &mut rng)
            .unwrap();
        // Independent draws almost never cancel exactly
        assert!(trace.end.heading != 0.0);
    }

    #[test]
    fn test_unknown_symbols_ignored() {
        let mut rng = StdRng::seed_from_u64(1);
        let trace = turtle(25.0, 10.0, 10.0)
            .draw("XYZ|&^", TurtleState::new([5.0, 5.0], 45.0), &mut rng)
            .unwrap();
        assert_eq!(trace.events, vec![PathEvent::MoveTo([5.0, 5.0])]);
        assert_eq!(trace.end, TurtleState::new([5.0, 5.0], 45.0));
    }

    #[test]
    fn test_branch_restores_state() {
        let mut rng = StdRng::seed_from_u64(11);
        let start = TurtleState::new([12.5, -40.0], 33.0);
        let trace = turtle(25.0, 10.0, 10.0)
            .draw("[F+F[-F]F]", start, &mut rng)
            .unwrap();

        assert_eq!(trace.end.position, start.position);
        assert_eq!(trace.end.heading, start.heading);
        assert!(trace.end.pen_down);
        assert_eq!(trace.events.last(), Some(&PathEvent::MoveTo(start.position)));
    }

    #[test]
    fn test_branch_close_on_empty_stack() {
        let mut rng = StdRng::seed_from_u64(1);
        let result = turtle(25.0, 10.0, 10.0).draw("]", TurtleState::new([0.0, 0.0], 0.0), &mut rng);
        assert!(matches!(result, Err(CamoError::MalformedGrammar(_))));

        let result = turtle(25.0, 10.0, 10.0).draw("[F]F]", TurtleState::new([0.0, 0.0], 0.0), &mut rng);
        assert!(matches!(result, Err(CamoError::MalformedGrammar(_))));
    }

    #[test]
    fn test_single_fold_wrap() {
        let canvas = Canvas::new(600, 400);
        let wrap = WrapMode::SingleFold;

        assert_eq!(wrap.wrap([310.0, 0.0], &canvas), [-290.0, 0.0]);
        assert_eq!(wrap.wrap([-310.0, 0.0], &canvas), [290.0, 0.0]);
        assert_eq!(wrap.wrap([0.0, 250.0], &canvas), [0.0, -150.0]);
        assert_eq!(wrap.wrap([0.0, -250.0], &canvas), [0.0, 150.0]);
        // x = hw + d with d = 2 * hw lands on the far edge
        assert_eq!(wrap.wrap([900.0, 0.0], &canvas), [300.0, 0.0]);
        // Beyond one fold the position is still off canvas
        assert!(!canvas.contains(wrap.wrap([1000.0, 0.0], &canvas)));
    }

    #[test]
    fn test_modulo_wrap() {
        let canvas = Canvas::new(600, 400);
        let wrap = WrapMode::Modulo;

        assert_relative_eq!(wrap.wrap([310.0, 0.0], &canvas)[0], -290.0);
        assert_relative_eq!(wrap.wrap([1000.0, 0.0], &canvas)[0], -200.0);
        assert_relative_eq!(wrap.wrap([0.0, -1250.0], &canvas)[1], -50.0);
        assert!(canvas.contains(wrap.wrap([12345.0, -9876.0], &canvas)));
        assert_eq!(wrap.wrap([100.0, 100.0], &canvas), [100.0, 100.0]);
    }

    #[test]
    fn test_forward_wraps_without_drawing_across() {
        let mut rng = StdRng::seed_from_u64(1);
        let trace = turtle(0.0, 20.0, 0.0)
            .draw("F", TurtleState::new([295.0, 0.0], 0.0), &mut rng)
            .unwrap();

        assert_eq!(trace.wraps, 1);
        assert_eq!(trace.events.len(), 3);
        match (trace.events[1], trace.events[2]) {
            (PathEvent::LineTo(drawn), PathEvent::MoveTo(jump)) => {
                assert_relative_eq!(drawn[0], 315.0, epsilon = 1e-9);
                assert_relative_eq!(jump[0], -285.0, epsilon = 1e-9);
            }
            other => panic!("unexpected events {:?}", other),
        }
        assert!(trace.end.pen_down);
        assert_relative_eq!(trace.end.position[0], -285.0, epsilon = 1e-9);
    }

    #[test]
    fn test_step_reports_wrap() {
        let mut rng = StdRng::seed_from_u64(1);
        let t = turtle(0.0, 20.0, 0.0);
        let mut stack = Vec::new();
        let mut events = Vec::new();

        let (inside, wrapped) = t
            .step(TurtleState::new([0.0, 0.0], 0.0), Command::Forward, &mut stack, &mut rng, &mut events)
            .unwrap();
        assert!(!wrapped);
        assert_eq!(events.len(), 1);

        let (across, wrapped) = t
            .step(TurtleState::new([295.0, 0.0], 0.0), Command::Forward, &mut stack, &mut rng, &mut events)
            .unwrap();
        assert!(wrapped);
        assert_relative_eq!(across.position[0], -285.0, epsilon = 1e-9);
        assert_relative_eq!(inside.position[0], 20.0, epsilon = 1e-9);

        // Branch jumps are not wraps
        stack.push(TurtleState::new([295.0, 0.0], 0.0));
        let (_, wrapped) = t
            .step(across, Command::BranchClose, &mut stack, &mut rng, &mut events)
            .unwrap();
        assert!(!wrapped);
    }

    #[test]
    fn test_negative_angle_and_length_mirror() {
        let start = TurtleState::new([0.0, 0.0], 0.0);

        let mut rng = StdRng::seed_from_u64(1);
        let right = turtle(90.0, 10.0, 0.0).draw("+F", start, &mut rng).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let mirrored = turtle(-90.0, 10.0, 0.0).draw("+F", start, &mut rng).unwrap();

        assert_relative_eq!(right.end.position[1], -10.0, epsilon = 1e-9);
        assert_relative_eq!(mirrored.end.position[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(mirrored.end.heading, 270.0, epsilon = 1e-9);

        let mut rng = StdRng::seed_from_u64(1);
        let backwards = turtle(0.0, -10.0, 0.0).draw("FF", start, &mut rng).unwrap();
        assert_relative_eq!(backwards.end.position[0], -20.0, epsilon = 1e-9);
        assert_relative_eq!(backwards.end.position[1], 0.0, epsilon = 1e-9);
        assert_eq!(backwards.segments(), 2);
    }

    #[test]
    fn test_normalize_heading() {
        assert_eq!(normalize_heading(370.0), 10.0);
        assert_eq!(normalize_heading(-90.0), 270.0);
        assert_eq!(normalize_heading(360.0), 0.0);
        assert!(normalize_heading(-1e-20) < 360.0);
    }
}
