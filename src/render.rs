//! PNG and event-stream export
//!
//! Rasterizes a finished pattern onto an image the size of the canvas. The
//! canvas origin maps to the image center with y pointing up. Runs only after
//! generation completes and never touches the pattern itself.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use tracing::info;

use crate::error::{CamoError, Result};
use crate::palette::Color;
use crate::pattern::Pattern;
use crate::sink::{DrawSink, EventRecorder};
use crate::turtle::{Canvas, Point};

/// Draw sink backed by an RGB image
pub struct Rasterizer {
    image: RgbImage,
    canvas: Canvas,
    cursor: Option<Point>,
}

impl Rasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::new(width, height),
            canvas: Canvas::new(width, height),
            cursor: None,
        }
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    fn to_pixel(&self, p: Point) -> (f32, f32) {
        (
            (p[0] + self.canvas.half_width) as f32,
            (self.canvas.half_height - p[1]) as f32,
        )
    }

    /// Longest stroke worth stamping; anything beyond is off-image anyway
    fn max_stamps(&self) -> usize {
        4 * (self.image.width() + self.image.height()) as usize
    }
}

impl DrawSink for Rasterizer {
    fn set_background(&mut self, color: Color) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgb(color.0);
        }
    }

    fn move_to(&mut self, p: Point) {
        self.cursor = Some(p);
    }

    fn line_to(&mut self, p: Point, color: Color, thickness: u32) {
        let from = self.to_pixel(self.cursor.unwrap_or(p));
        let to = self.to_pixel(p);
        let max_stamps = self.max_stamps();
        stroke(&mut self.image, from, to, Rgb(color.0), thickness, max_stamps);
        self.cursor = Some(p);
    }
}

/// Thick line: round pen stamped along the segment
fn stroke(
    image: &mut RgbImage,
    from: (f32, f32),
    to: (f32, f32),
    color: Rgb<u8>,
    thickness: u32,
    max_stamps: usize,
) {
    draw_line_segment_mut(image, from, to, color);
    if thickness <= 1 {
        return;
    }

    let radius = (thickness / 2) as i32;
    let (dx, dy) = (to.0 - from.0, to.1 - from.1);
    let steps = ((dx.hypot(dy)).ceil() as usize).clamp(1, max_stamps);

    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        let center = (
            (from.0 + dx * t).round() as i32,
            (from.1 + dy * t).round() as i32,
        );
        draw_filled_circle_mut(image, center, radius, color);
    }
}

/// Rasterize `pattern` at `width` x `height`
pub fn rasterize(pattern: &Pattern, width: u32, height: u32) -> RgbImage {
    let mut rasterizer = Rasterizer::new(width, height);
    pattern.replay(&mut rasterizer);
    rasterizer.into_image()
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .map_err(|e| CamoError::ExportFailure(format!("{}: {}", dir.display(), e))),
        _ => Ok(()),
    }
}

/// Save `pattern` as a PNG
pub fn export_png(pattern: &Pattern, width: u32, height: u32, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let image = rasterize(pattern, width, height);
    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|e| CamoError::ExportFailure(format!("{}: {}", path.display(), e)))?;

    info!("Saved {}", path.display());
    Ok(())
}

/// Save the draw-event stream as JSON
pub fn export_events_json(pattern: &Pattern, path: &Path) -> Result<()> {
    ensure_parent(path)?;
    let mut recorder = EventRecorder::default();
    pattern.replay(&mut recorder);

    let data = serde_json::json!({
        "generated": chrono::Local::now().to_rfc3339(),
        "background": pattern.background,
        "foreground": pattern.foreground,
        "stats": pattern.stats(),
        "events": recorder.events,
    });

    let text = serde_json::to_string_pretty(&data)
        .map_err(|e| CamoError::ExportFailure(e.to_string()))?;
    std::fs::write(path, text)
        .map_err(|e| CamoError::ExportFailure(format!("{}: {}", path.display(), e)))?;

    info!("Wrote {} events to {}", recorder.events.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Tree;
    use crate::turtle::{DrawParams, PathEvent, TurtleState};

    fn pattern_with_line(thickness: u32) -> Pattern {
        Pattern {
            background: Color::rgb(10, 20, 30),
            foreground: vec![Color::rgb(200, 0, 0)],
            trees: vec![Tree {
                color: Color::rgb(200, 0, 0),
                thickness,
                start: TurtleState::new([-20.0, 0.0], 0.0),
                params: DrawParams {
                    angle: 25.0,
                    length: 40.0,
                    deviation: 0.0,
                },
                events: vec![PathEvent::MoveTo([-20.0, 0.0]), PathEvent::LineTo([20.0, 0.0])],
                wraps: 0,
            }],
        }
    }

    #[test]
    fn test_background_and_line() {
        let image = rasterize(&pattern_with_line(1), 100, 100);

        assert_eq!(image.dimensions(), (100, 100));
        assert_eq!(*image.get_pixel(0, 0), Rgb([10, 20, 30]));
        assert_eq!(*image.get_pixel(50, 50), Rgb([200, 0, 0]));
        assert_eq!(*image.get_pixel(50, 60), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_thickness_widens_stroke() {
        let image = rasterize(&pattern_with_line(8), 100, 100);
        assert_eq!(*image.get_pixel(50, 53), Rgb([200, 0, 0]));
        assert_eq!(*image.get_pixel(50, 47), Rgb([200, 0, 0]));
        assert_eq!(*image.get_pixel(50, 60), Rgb([10, 20, 30]));
    }

    #[test]
    fn test_export_png_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("nested").join("camo.png");
        let json = dir.path().join("camo.json");
        let pattern = pattern_with_line(3);

        export_png(&pattern, 64, 48, &png).unwrap();
        let loaded = image::open(&png).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (64, 48));

        export_events_json(&pattern, &json).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(value["background"], "#0a141e");
        assert_eq!(value["events"].as_array().unwrap().len(), 3);
        assert_eq!(value["stats"]["segments"], 1);
    }

    #[test]
    fn test_export_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();
        let pattern = pattern_with_line(1);

        let result = export_png(&pattern, 10, 10, &blocker.join("out.png"));
        assert!(matches!(result, Err(CamoError::ExportFailure(_))));
        assert_eq!(pattern, pattern_with_line(1));
    }
}
