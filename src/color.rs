use ratatui::style::Color;
use serde::{Deserialize, Serialize};

/// Number of entries in a color lookup table
pub const LUT_SIZE: usize = 256;

/// Precomputed gradient, indexed by intensity in [0, 1]
pub type ColorLut = [Color; LUT_SIZE];

/// Gradient used to paint trail intensity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ColorScheme {
    /// Yellow-green slime mold on black
    #[default]
    Slime,
    Ocean,
    Fire,
    Neon,
    Grayscale,
}

impl ColorScheme {
    pub fn name(&self) -> &str {
        match self {
            ColorScheme::Slime => "Slime",
            ColorScheme::Ocean => "Ocean",
            ColorScheme::Fire => "Fire",
            ColorScheme::Neon => "Neon",
            ColorScheme::Grayscale => "Grayscale",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            ColorScheme::Slime => ColorScheme::Ocean,
            ColorScheme::Ocean => ColorScheme::Fire,
            ColorScheme::Fire => ColorScheme::Neon,
            ColorScheme::Neon => ColorScheme::Grayscale,
            ColorScheme::Grayscale => ColorScheme::Slime,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            ColorScheme::Slime => ColorScheme::Grayscale,
            ColorScheme::Ocean => ColorScheme::Slime,
            ColorScheme::Fire => ColorScheme::Ocean,
            ColorScheme::Neon => ColorScheme::Fire,
            ColorScheme::Grayscale => ColorScheme::Neon,
        }
    }

    /// Gradient stops from low to high intensity
    fn stops(&self) -> &'static [(u8, u8, u8)] {
        match self {
            ColorScheme::Slime => &[(20, 30, 0), (110, 160, 10), (210, 230, 40), (255, 255, 170)],
            ColorScheme::Ocean => &[(0, 20, 60), (0, 90, 160), (40, 180, 220), (200, 250, 255)],
            ColorScheme::Fire => &[(60, 0, 0), (180, 30, 0), (255, 140, 0), (255, 240, 120)],
            ColorScheme::Neon => &[(80, 0, 120), (220, 0, 180), (0, 220, 255), (200, 255, 200)],
            ColorScheme::Grayscale => &[(40, 40, 40), (255, 255, 255)],
        }
    }

    pub fn build_lut(&self) -> ColorLut {
        let stops = self.stops();
        let segments = (stops.len() - 1) as f32;
        let mut lut = [Color::Black; LUT_SIZE];
        for (i, entry) in lut.iter_mut().enumerate() {
            let t = i as f32 / (LUT_SIZE - 1) as f32;
            let pos = t * segments;
            let seg = (pos.floor() as usize).min(stops.len() - 2);
            let local = pos - seg as f32;
            let (r0, g0, b0) = stops[seg];
            let (r1, g1, b1) = stops[seg + 1];
            *entry = Color::Rgb(lerp(r0, r1, local), lerp(g0, g1, local), lerp(b0, b1, local));
        }
        lut
    }
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (a as f32 + (b as f32 - a as f32) * t).round() as u8
}

/// Look up a color for `t` in [0, 1]; out-of-range values saturate
#[inline]
pub fn map_from_lut(lut: &ColorLut, t: f32) -> Color {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    lut[(t * (LUT_SIZE - 1) as f32) as usize]
}
