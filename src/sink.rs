//! Rendering sink - the boundary between geometry and whoever draws it

use serde::Serialize;

use crate::palette::Color;
use crate::turtle::Point;

/// Receives a finished pattern's draw events in order
pub trait DrawSink {
    fn set_background(&mut self, color: Color);
    /// Pen up
    fn move_to(&mut self, p: Point);
    /// Pen down, from the previous point
    fn line_to(&mut self, p: Point, color: Color, thickness: u32);
}

/// Serializable form of one sink call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawEvent {
    SetBackground { color: Color },
    MoveTo { x: f64, y: f64 },
    LineTo { x: f64, y: f64, color: Color, thickness: u32 },
}

/// Sink that keeps every event
#[derive(Debug, Default)]
pub struct EventRecorder {
    pub events: Vec<DrawEvent>,
}

impl DrawSink for EventRecorder {
    fn set_background(&mut self, color: Color) {
        self.events.push(DrawEvent::SetBackground { color });
    }

    fn move_to(&mut self, p: Point) {
        self.events.push(DrawEvent::MoveTo { x: p[0], y: p[1] });
    }

    fn line_to(&mut self, p: Point, color: Color, thickness: u32) {
        self.events.push(DrawEvent::LineTo {
            x: p[0],
            y: p[1],
            color,
            thickness,
        });
    }
}
