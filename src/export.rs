use crate::color::{ColorLut, ColorScheme, LUT_SIZE};
use crate::error::{Result, SimError};
use crate::simulation::SimulationState;
use image::{Rgb, RgbImage};
use ratatui::style::Color;
use std::borrow::Cow;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Centiseconds between recorded GIF frames
const GIF_FRAME_DELAY: u16 = 4;

/// Quantize the field to 0..=255 per cell, with every particle's cell
/// forced to full intensity
pub fn intensity_buffer(state: &SimulationState<'_>, show_particles: bool) -> Vec<u8> {
    let mut out: Vec<u8> = state
        .field
        .iter()
        .map(|v| (v.clamp(0.0, 1.0) * (LUT_SIZE - 1) as f32) as u8)
        .collect();

    if show_particles {
        for p in state.particles {
            let (x, y) = (p.x as usize, p.y as usize);
            if x < state.width && y < state.height {
                out[y * state.width + x] = u8::MAX;
            }
        }
    }
    out
}

fn rgb_of(color: Color) -> [u8; 3] {
    match color {
        Color::Rgb(r, g, b) => [r, g, b],
        _ => [255, 255, 255],
    }
}

fn palette_bytes(lut: &ColorLut) -> Vec<u8> {
    lut.iter().flat_map(|c| rgb_of(*c)).collect()
}

fn ensure_non_empty(state: &SimulationState<'_>) -> Result<()> {
    if state.width == 0 || state.height == 0 {
        return Err(SimError::EmptyField {
            width: state.width,
            height: state.height,
        });
    }
    Ok(())
}

/// Write the current field, colored with `scheme`, as a PNG
pub fn save_png(state: &SimulationState<'_>, scheme: ColorScheme, show_particles: bool, path: &Path) -> Result<()> {
    ensure_non_empty(state)?;
    let lut = scheme.build_lut();
    let intensity = intensity_buffer(state, show_particles);
    let mut img = RgbImage::new(state.width as u32, state.height as u32);
    for (pixel, value) in img.pixels_mut().zip(intensity) {
        *pixel = Rgb(rgb_of(lut[value as usize]));
    }
    img.save(path)?;
    Ok(())
}

/// Streams simulation frames into an animated, looping GIF
pub struct GifRecorder {
    encoder: gif::Encoder<BufWriter<File>>,
    width: usize,
    height: usize,
    show_particles: bool,
    frames: usize,
}

impl GifRecorder {
    pub fn create(path: &Path, width: usize, height: usize, scheme: ColorScheme, show_particles: bool) -> Result<Self> {
        if width == 0 || height == 0 || width > u16::MAX as usize || height > u16::MAX as usize {
            return Err(SimError::EmptyField { width, height });
        }
        let file = File::create(path).map_err(|e| SimError::io(path, e))?;
        let palette = palette_bytes(&scheme.build_lut());
        let mut encoder = gif::Encoder::new(BufWriter::new(file), width as u16, height as u16, &palette)?;
        encoder.set_repeat(gif::Repeat::Infinite)?;
        Ok(Self {
            encoder,
            width,
            height,
            show_particles,
            frames: 0,
        })
    }

    /// Append the current state as one frame. States of a different size
    /// than the recording are skipped.
    pub fn record(&mut self, state: &SimulationState<'_>) -> Result<bool> {
        if state.width != self.width || state.height != self.height {
            return Ok(false);
        }
        let frame = gif::Frame {
            width: self.width as u16,
            height: self.height as u16,
            delay: GIF_FRAME_DELAY,
            buffer: Cow::Owned(intensity_buffer(state, self.show_particles)),
            ..Default::default()
        };
        self.encoder.write_frame(&frame)?;
        self.frames += 1;
        Ok(true)
    }

    pub fn frames(&self) -> usize {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SimulationParams;
    use crate::simulation::Simulation;
    use tempfile::TempDir;

    fn small_sim() -> Simulation {
        let params = SimulationParams {
            particle_count: 20,
            ..Default::default()
        };
        let mut sim = Simulation::with_seed(24, 16, params, 7);
        sim.add_food_source(5.0, 5.0, 2.0, 1.0);
        sim.tick();
        sim
    }

    #[test]
    fn test_intensity_buffer_marks_particles() {
        let sim = small_sim();
        let state = sim.get_state();
        let with = intensity_buffer(&state, true);
        let without = intensity_buffer(&state, false);
        assert_eq!(with.len(), 24 * 16);
        let p = state.particles[0];
        assert_eq!(with[p.y as usize * 24 + p.x as usize], u8::MAX);
        assert!(with.iter().zip(&without).all(|(a, b)| a >= b));
    }

    #[test]
    fn test_save_png_writes_file_of_field_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("field.png");
        let sim = small_sim();
        save_png(&sim.get_state(), ColorScheme::Fire, true, &path).unwrap();

        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (24, 16));
    }

    #[test]
    fn test_gif_recorder_counts_frames() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("run.gif");
        let mut sim = small_sim();
        {
            let mut recorder = GifRecorder::create(&path, 24, 16, ColorScheme::Slime, false).unwrap();
            for _ in 0..3 {
                sim.tick();
                assert!(recorder.record(&sim.get_state()).unwrap());
            }
            assert_eq!(recorder.frames(), 3);
        }
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_gif_recorder_rejects_empty_size() {
        let dir = TempDir::new().unwrap();
        let result = GifRecorder::create(&dir.path().join("x.gif"), 0, 10, ColorScheme::Slime, false);
        assert!(matches!(result, Err(SimError::EmptyField { .. })));
    }
}
