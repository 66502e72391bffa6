//! Palette and seed management
//!
//! All randomness in a pattern flows from one `StdRng` created by
//! [`seeded_rng`]. Color selection consumes the stream first, then every
//! tree's parameter draws and turn jitter, so the draw order is part of the
//! output: same seed, palette and color count give the same pattern.

use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{CamoError, Result};

/// Urban camouflage tones: greys, blues, greens, beiges
pub const URBAN_PALETTE: [Color; 10] = [
    Color::rgb(0x70, 0x80, 0x90),
    Color::rgb(0x2f, 0x4f, 0x4f),
    Color::rgb(0xd3, 0xd3, 0xd3),
    Color::rgb(0x46, 0x82, 0xb4),
    Color::rgb(0x77, 0x88, 0x99),
    Color::rgb(0xa9, 0xa9, 0xa9),
    Color::rgb(0x69, 0x69, 0x69),
    Color::rgb(0xbd, 0xb7, 0x6b),
    Color::rgb(0x8b, 0x45, 0x13),
    Color::rgb(0x55, 0x6b, 0x2f),
];

/// 8-bit RGB color, written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color([r, g, b])
    }

    /// Parse `#rrggbb` or `#rgb`
    pub fn parse_hex(s: &str) -> Result<Self> {
        let s = s.trim();
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| CamoError::config(format!("color '{}' must start with '#'", s)))?;

        if let Some(bad) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(CamoError::config(format!(
                "invalid hex character '{}' in color '{}'",
                bad, s
            )));
        }

        let channel = |i: usize, width: usize| -> u8 {
            let v = u8::from_str_radix(&hex[i * width..(i + 1) * width], 16).unwrap_or(0);
            if width == 1 {
                v * 17
            } else {
                v
            }
        };

        match hex.len() {
            3 => Ok(Color([channel(0, 1), channel(1, 1), channel(2, 1)])),
            6 => Ok(Color([channel(0, 2), channel(1, 2), channel(2, 2)])),
            n => Err(CamoError::config(format!(
                "color '{}' has {} hex digits, expected 3 or 6",
                s, n
            ))),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

impl FromStr for Color {
    type Err = CamoError;

    fn from_str(s: &str) -> Result<Self> {
        Color::parse_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = CamoError;

    fn try_from(s: String) -> Result<Self> {
        Color::parse_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

/// Ordered candidate colors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    pub fn new(colors: Vec<Color>) -> Self {
        Self { colors }
    }

    pub fn urban() -> Self {
        Self {
            colors: URBAN_PALETTE.to_vec(),
        }
    }

    pub fn from_hex<I, S>(hexes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let colors = hexes
            .into_iter()
            .map(|h| Color::parse_hex(h.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { colors })
    }

    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Largest foreground set this palette can supply
    pub fn max_foreground(&self) -> usize {
        self.colors.len().saturating_sub(1)
    }

    /// Needs two or more colors and no repeats, so background and
    /// foreground stay disjoint
    pub fn validate(&self) -> Result<()> {
        if self.colors.len() < 2 {
            return Err(CamoError::config(format!(
                "palette needs at least 2 colors, has {}",
                self.colors.len()
            )));
        }
        for (i, color) in self.colors.iter().enumerate() {
            if self.colors[..i].contains(color) {
                return Err(CamoError::config(format!(
                    "palette lists {} more than once",
                    color
                )));
            }
        }
        Ok(())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::urban()
    }
}

/// Background plus the foreground colors trees are painted with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColorSelection {
    pub background: Color,
    pub foreground: Vec<Color>,
}

/// The single random source for a pattern
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Uniform draw from [-deviation, deviation]
///
/// Always consumes one value from the stream, even for zero deviation.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, deviation: f64) -> f64 {
    // Range width must stay finite for the sampler
    let d = deviation.abs().min(f64::MAX / 4.0);
    rng.gen_range(-d..=d)
}

/// Pick the background, then `num_colors` distinct foreground colors
pub fn select_colors<R: Rng + ?Sized>(
    rng: &mut R,
    palette: &Palette,
    num_colors: usize,
) -> Result<ColorSelection> {
    palette.validate()?;

    if num_colors == 0 || num_colors > palette.max_foreground() {
        return Err(CamoError::config(format!(
            "num_colors must be between 1 and {} for a {}-color palette, got {}",
            palette.max_foreground(),
            palette.len(),
            num_colors
        )));
    }

    let mut pool = palette.colors.clone();
    let background = pool.remove(rng.gen_range(0..pool.len()));

    let foreground: Vec<Color> = pool.choose_multiple(rng, num_colors).copied().collect();

    Ok(ColorSelection {
        background,
        foreground,
    })
}
