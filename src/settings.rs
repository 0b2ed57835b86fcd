use crate::color::ColorScheme;
use serde::{Deserialize, Serialize};

/// What the renderer draws for the field layer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum FieldView {
    /// Trail intensity only
    Trails,
    /// Trails with particles drawn on top (default)
    #[default]
    Combined,
    /// Particles only, no trail layer
    Particles,
}

impl FieldView {
    pub fn name(&self) -> &str {
        match self {
            FieldView::Trails => "Trails",
            FieldView::Combined => "Combined",
            FieldView::Particles => "Particles",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            FieldView::Trails => FieldView::Combined,
            FieldView::Combined => FieldView::Particles,
            FieldView::Particles => FieldView::Trails,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            FieldView::Trails => FieldView::Particles,
            FieldView::Combined => FieldView::Trails,
            FieldView::Particles => FieldView::Combined,
        }
    }

    pub fn shows_trails(&self) -> bool {
        !matches!(self, FieldView::Particles)
    }

    pub fn shows_particles(&self) -> bool {
        !matches!(self, FieldView::Trails)
    }
}

/// Parameter record read once per tick by the engine.
///
/// Angles are radians, distances are field cells. The engine never mutates a
/// record it was handed; `Simulation::update_parameters` reconciles a new one
/// against the live particle set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    // === Population ===
    /// Number of live particles (0-20000)
    pub particle_count: usize,
    /// Target velocity magnitude in cells per tick (0.1-5.0)
    pub move_speed: f32,

    // === Chemotaxis ===
    /// Turn applied when a side sensor wins, radians (0.0-PI)
    pub turn_speed: f32,
    /// Angular offset of the side sensors, radians (0.0-PI/2)
    pub sensor_angle: f32,
    /// Sensor reach in multiples of particle size (1.0-40.0)
    pub sensor_distance: f32,

    // === Field ===
    /// Weight of the neighborhood mean during diffusion (0.0-1.0)
    pub diffusion_rate: f32,
    /// Fraction removed from every cell each tick (0.0-1.0)
    pub decay_rate: f32,
    /// Total chemical laid down by one particle per tick (0.0-1.0)
    pub chemical_deposit_rate: f32,

    // === Flocking ===
    /// Weight on the neighbor-average velocity (0.0-3.0)
    pub alignment_force: f32,
    /// Weight on steering toward the neighbor centroid (0.0-3.0)
    pub cohesion_force: f32,
    /// Weight on steering away from close neighbors (0.0-3.0)
    pub separation_force: f32,
    /// Flocking neighborhood radius in cells (1.0-100.0)
    pub perception_radius: f32,

    // === Aggregation ===
    /// Particle radius in cells; scales deposit, sensing and contact (0.5-8.0)
    pub particle_size: f32,
    /// Chance per tick that a free particle touching a stuck one sticks (0.0-1.0)
    pub sticking_probability: f32,
    /// Chance per tick that a stuck particle lets go (0.0-1.0)
    pub release_probability: f32,

    // === Cosmetic (no effect on simulation state) ===
    pub paused: bool,
    pub color_scheme: ColorScheme,
    pub field_view: FieldView,
    /// Draw stuck particles in the highlight color
    pub highlight_stuck: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            particle_count: 2000,
            move_speed: 1.0,

            turn_speed: 0.4,
            sensor_angle: 0.5,
            sensor_distance: 9.0,

            diffusion_rate: 0.3,
            decay_rate: 0.05,
            chemical_deposit_rate: 0.1,

            alignment_force: 0.5,
            cohesion_force: 0.3,
            separation_force: 0.8,
            perception_radius: 12.0,

            particle_size: 1.0,
            sticking_probability: 0.0,
            release_probability: 0.0,

            paused: false,
            color_scheme: ColorScheme::default(),
            field_view: FieldView::default(),
            highlight_stuck: true,
        }
    }
}

impl SimulationParams {
    pub const MAX_PARTICLES: usize = 20_000;

    /// Adjust the particle count within bounds
    pub fn adjust_particle_count(&mut self, delta: i64) {
        let value = (self.particle_count as i64 + delta).clamp(0, Self::MAX_PARTICLES as i64);
        self.particle_count = value as usize;
    }

    pub fn adjust_move_speed(&mut self, delta: f32) {
        self.move_speed = (self.move_speed + delta).clamp(0.1, 5.0);
    }

    pub fn adjust_turn_speed(&mut self, delta: f32) {
        self.turn_speed = (self.turn_speed + delta).clamp(0.0, std::f32::consts::PI);
    }

    pub fn adjust_sensor_angle(&mut self, delta: f32) {
        self.sensor_angle = (self.sensor_angle + delta).clamp(0.0, std::f32::consts::FRAC_PI_2);
    }

    pub fn adjust_sensor_distance(&mut self, delta: f32) {
        self.sensor_distance = (self.sensor_distance + delta).clamp(1.0, 40.0);
    }

    pub fn adjust_diffusion_rate(&mut self, delta: f32) {
        self.diffusion_rate = (self.diffusion_rate + delta).clamp(0.0, 1.0);
    }

    pub fn adjust_decay_rate(&mut self, delta: f32) {
        self.decay_rate = (self.decay_rate + delta).clamp(0.0, 1.0);
    }

    pub fn adjust_deposit_rate(&mut self, delta: f32) {
        self.chemical_deposit_rate = (self.chemical_deposit_rate + delta).clamp(0.0, 1.0);
    }

    pub fn adjust_alignment_force(&mut self, delta: f32) {
        self.alignment_force = (self.alignment_force + delta).clamp(0.0, 3.0);
    }

    pub fn adjust_cohesion_force(&mut self, delta: f32) {
        self.cohesion_force = (self.cohesion_force + delta).clamp(0.0, 3.0);
    }

    pub fn adjust_separation_force(&mut self, delta: f32) {
        self.separation_force = (self.separation_force + delta).clamp(0.0, 3.0);
    }

    pub fn adjust_perception_radius(&mut self, delta: f32) {
        self.perception_radius = (self.perception_radius + delta).clamp(1.0, 100.0);
    }

    pub fn adjust_particle_size(&mut self, delta: f32) {
        self.particle_size = (self.particle_size + delta).clamp(0.5, 8.0);
    }

    pub fn adjust_sticking_probability(&mut self, delta: f32) {
        self.sticking_probability = (self.sticking_probability + delta).clamp(0.0, 1.0);
    }

    pub fn adjust_release_probability(&mut self, delta: f32) {
        self.release_probability = (self.release_probability + delta).clamp(0.0, 1.0);
    }

    /// Bring every field into its documented range. Used on records that came
    /// from outside (CLI, config files, presets). Non-finite values fall back
    /// to their defaults before clamping.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        for (value, default) in [
            (&mut self.move_speed, defaults.move_speed),
            (&mut self.turn_speed, defaults.turn_speed),
            (&mut self.sensor_angle, defaults.sensor_angle),
            (&mut self.sensor_distance, defaults.sensor_distance),
            (&mut self.diffusion_rate, defaults.diffusion_rate),
            (&mut self.decay_rate, defaults.decay_rate),
            (&mut self.chemical_deposit_rate, defaults.chemical_deposit_rate),
            (&mut self.alignment_force, defaults.alignment_force),
            (&mut self.cohesion_force, defaults.cohesion_force),
            (&mut self.separation_force, defaults.separation_force),
            (&mut self.perception_radius, defaults.perception_radius),
            (&mut self.particle_size, defaults.particle_size),
            (&mut self.sticking_probability, defaults.sticking_probability),
            (&mut self.release_probability, defaults.release_probability),
        ] {
            if !value.is_finite() {
                *value = default;
            }
        }

        self.particle_count = self.particle_count.min(Self::MAX_PARTICLES);
        self.adjust_move_speed(0.0);
        self.adjust_turn_speed(0.0);
        self.adjust_sensor_angle(0.0);
        self.adjust_sensor_distance(0.0);
        self.adjust_diffusion_rate(0.0);
        self.adjust_decay_rate(0.0);
        self.adjust_deposit_rate(0.0);
        self.adjust_alignment_force(0.0);
        self.adjust_cohesion_force(0.0);
        self.adjust_separation_force(0.0);
        self.adjust_perception_radius(0.0);
        self.adjust_particle_size(0.0);
        self.adjust_sticking_probability(0.0);
        self.adjust_release_probability(0.0);
        self
    }

    /// Integer radius used for deposits and the diffusion neighborhood
    pub fn footprint_radius(&self) -> usize {
        (self.particle_size.floor() as usize).max(1)
    }
}
