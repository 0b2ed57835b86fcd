use crate::color::{map_from_lut, ColorLut};
use crate::settings::FieldView;
use crate::simulation::SimulationState;
use ratatui::style::Color;

/// Braille character rendering for high-resolution terminal graphics.
/// Each Braille character represents a 2x4 grid of dots (8 dots total).
///
/// Dot positions and their bit values:
/// ```text
/// (0,0)=0x01  (1,0)=0x08
/// (0,1)=0x02  (1,1)=0x10
/// (0,2)=0x04  (1,2)=0x20
/// (0,3)=0x40  (1,3)=0x80
/// ```
const BRAILLE_BASE: u32 = 0x2800;

const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// Field values at or below this are drawn as empty
const TRAIL_THRESHOLD: f32 = 0.02;

/// LUT position used for free particles when no trail is under them
const PARTICLE_INTENSITY: f32 = 0.85;

const STUCK_COLOR: Color = Color::Rgb(255, 255, 255);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Occupant {
    Empty,
    Free,
    Stuck,
}

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// What to draw and how to color it
#[derive(Clone, Copy)]
pub struct RenderOptions<'a> {
    pub color_lut: &'a ColorLut,
    pub view: FieldView,
    pub highlight_stuck: bool,
}

fn occupancy(state: &SimulationState<'_>) -> Vec<Occupant> {
    let mut grid = vec![Occupant::Empty; state.width * state.height];
    for p in state.particles {
        let (x, y) = (p.x as usize, p.y as usize);
        if x >= state.width || y >= state.height {
            continue;
        }
        let slot = &mut grid[y * state.width + x];
        // Stuck wins so aggregates stay visible under traffic
        if p.is_stuck {
            *slot = Occupant::Stuck;
        } else if *slot == Occupant::Empty {
            *slot = Occupant::Free;
        }
    }
    grid
}

/// Render the field and particles to Braille characters
pub fn render_to_braille(
    state: &SimulationState<'_>,
    canvas_width: u16,
    canvas_height: u16,
    options: RenderOptions<'_>,
) -> Vec<BrailleCell> {
    if state.width == 0 || state.height == 0 {
        return Vec::new();
    }

    let braille_width = canvas_width as usize * 2;
    let braille_height = canvas_height as usize * 4;
    let scale_x = state.width as f32 / braille_width.max(1) as f32;
    let scale_y = state.height as f32 / braille_height.max(1) as f32;

    let show_trails = options.view.shows_trails();
    let show_particles = options.view.shows_particles();
    let occupants = if show_particles {
        occupancy(state)
    } else {
        Vec::new()
    };

    let mut cells = Vec::with_capacity(canvas_width as usize * canvas_height as usize);

    for cy in 0..canvas_height {
        for cx in 0..canvas_width {
            let mut pattern: u8 = 0;
            let mut peak: f32 = 0.0;
            let mut has_stuck = false;

            let base_bx = cx as usize * 2;
            let base_by = cy as usize * 4;

            for dx in 0..2 {
                for dy in 0..4 {
                    let sim_x = ((base_bx + dx) as f32 * scale_x) as usize;
                    let sim_y = ((base_by + dy) as f32 * scale_y) as usize;
                    if sim_x >= state.width || sim_y >= state.height {
                        continue;
                    }
                    let idx = sim_y * state.width + sim_x;

                    let trail = if show_trails { state.field[idx] } else { 0.0 };
                    let occupant = if show_particles {
                        occupants[idx]
                    } else {
                        Occupant::Empty
                    };

                    match occupant {
                        Occupant::Stuck => {
                            pattern |= BRAILLE_DOTS[dx][dy];
                            has_stuck = true;
                            peak = peak.max(trail.max(PARTICLE_INTENSITY));
                        }
                        Occupant::Free => {
                            pattern |= BRAILLE_DOTS[dx][dy];
                            peak = peak.max(trail.max(PARTICLE_INTENSITY));
                        }
                        Occupant::Empty if trail > TRAIL_THRESHOLD => {
                            pattern |= BRAILLE_DOTS[dx][dy];
                            peak = peak.max(trail);
                        }
                        Occupant::Empty => {}
                    }
                }
            }

            if pattern != 0 {
                let braille_char = char::from_u32(BRAILLE_BASE + pattern as u32).unwrap_or(' ');
                let color = if has_stuck && options.highlight_stuck {
                    STUCK_COLOR
                } else {
                    map_from_lut(options.color_lut, peak)
                };

                cells.push(BrailleCell {
                    x: cx,
                    y: cy,
                    char: braille_char,
                    color,
                });
            }
        }
    }

    cells
}

/// Simulation field size for a given canvas size, one cell per Braille dot
pub fn calculate_simulation_size(canvas_width: u16, canvas_height: u16) -> (usize, usize) {
    let width = (canvas_width as usize * 2).max(64);
    let height = (canvas_height as usize * 4).max(64);
    (width, height)
}

/// Map a terminal cell inside the canvas to the field cell under its center
pub fn canvas_to_field(
    col: u16,
    row: u16,
    canvas_width: u16,
    canvas_height: u16,
    field_width: usize,
    field_height: usize,
) -> Option<(f32, f32)> {
    if col >= canvas_width || row >= canvas_height {
        return None;
    }
    let bx = col as f32 * 2.0 + 1.0;
    let by = row as f32 * 4.0 + 2.0;
    let scale_x = field_width as f32 / (canvas_width as f32 * 2.0);
    let scale_y = field_height as f32 / (canvas_height as f32 * 4.0);
    Some((bx * scale_x, by * scale_y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorScheme;
    use crate::particles::Particle;

    fn state<'a>(field: &'a [f32], particles: &'a [Particle], width: usize, height: usize) -> SimulationState<'a> {
        SimulationState {
            width,
            height,
            particles,
            field,
            food_sources: &[],
        }
    }

    #[test]
    fn test_braille_pattern() {
        assert_eq!(BRAILLE_DOTS[0][0], 0x01);
        assert_eq!(BRAILLE_DOTS[1][3], 0x80);
        let all_dots: u8 = BRAILLE_DOTS[0].iter().sum::<u8>() + BRAILLE_DOTS[1].iter().sum::<u8>();
        assert_eq!(all_dots, 0xFF);
    }

    #[test]
    fn test_empty_field_renders_nothing() {
        let lut = ColorScheme::Slime.build_lut();
        let field = vec![0.0; 4 * 8];
        let cells = render_to_braille(
            &state(&field, &[], 4, 8),
            2,
            2,
            RenderOptions {
                color_lut: &lut,
                view: FieldView::Combined,
                highlight_stuck: true,
            },
        );
        assert!(cells.is_empty());
    }

    #[test]
    fn test_trail_lights_single_dot() {
        let lut = ColorScheme::Slime.build_lut();
        let mut field = vec![0.0; 2 * 4];
        field[1] = 0.5; // (1, 0) -> top-right dot
        let cells = render_to_braille(
            &state(&field, &[], 2, 4),
            1,
            1,
            RenderOptions {
                color_lut: &lut,
                view: FieldView::Trails,
                highlight_stuck: true,
            },
        );
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].char, char::from_u32(BRAILLE_BASE + 0x08).unwrap());
        assert_eq!(cells[0].color, map_from_lut(&lut, 0.5));
    }

    #[test]
    fn test_view_filters_layers() {
        let lut = ColorScheme::Slime.build_lut();
        let mut field = vec![0.0; 2 * 4];
        field[0] = 1.0;
        let particles = [Particle::pinned(1.0, 3.0)];
        let st = state(&field, &particles, 2, 4);
        let render = |view| {
            render_to_braille(
                &st,
                1,
                1,
                RenderOptions {
                    color_lut: &lut,
                    view,
                    highlight_stuck: true,
                },
            )
        };

        assert_eq!(render(FieldView::Trails)[0].char, '\u{2801}');
        let particles_only = render(FieldView::Particles);
        assert_eq!(particles_only[0].char, '\u{2880}');
        assert_eq!(particles_only[0].color, STUCK_COLOR);
        assert_eq!(render(FieldView::Combined)[0].char, '\u{2881}');
    }

    #[test]
    fn test_canvas_to_field_maps_cell_centers() {
        assert_eq!(canvas_to_field(0, 0, 10, 5, 20, 20), Some((1.0, 2.0)));
        assert_eq!(canvas_to_field(3, 1, 10, 5, 20, 20), Some((7.0, 6.0)));
        assert_eq!(canvas_to_field(10, 0, 10, 5, 20, 20), None);
    }

    #[test]
    fn test_simulation_size_has_minimum() {
        assert_eq!(calculate_simulation_size(10, 5), (64, 64));
        assert_eq!(calculate_simulation_size(100, 40), (200, 160));
    }
}
