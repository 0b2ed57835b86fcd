use crate::behavior::{self, StepOutcome};
use crate::field::{DiffusionParams, ScalarField};
use crate::food::{FoodRegistry, FoodSource};
use crate::particles::{wrap_coord, Particle, ParticleStore};
use crate::rng::SimRng;
use crate::settings::SimulationParams;
use crate::spatial::SpatialIndex;
use tracing::{debug, trace};

/// Read-only view of the simulation handed to renderers
#[derive(Debug, Clone, Copy)]
pub struct SimulationState<'a> {
    pub width: usize,
    pub height: usize,
    pub particles: &'a [Particle],
    /// Row-major field buffer of `width * height` cells
    pub field: &'a [f32],
    pub food_sources: &'a [FoodSource],
}

/// Summary counters for status displays and logs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SimulationStats {
    pub tick: u64,
    pub particles: usize,
    pub stuck: usize,
    pub food_sources: usize,
    pub field_total: f32,
    pub field_peak: f32,
}

/// The simulation engine: particles, chemical field, food sources and the
/// random source, advanced one tick at a time.
///
/// Every command and `tick` take `&mut self`, so commands are always
/// sequenced between ticks.
pub struct Simulation {
    width: usize,
    height: usize,
    params: SimulationParams,
    particles: ParticleStore,
    field: ScalarField,
    index: SpatialIndex,
    food: FoodRegistry,
    rng: SimRng,
    tick_count: u64,
}

impl Simulation {
    /// Allocate a `width * height` field and spawn `params.particle_count`
    /// particles, seeding the random source from entropy
    pub fn new(width: usize, height: usize, params: SimulationParams) -> Self {
        Self::with_rng(width, height, params, SimRng::from_entropy())
    }

    /// Like `new`, with a fixed seed for reproducible runs
    pub fn with_seed(width: usize, height: usize, params: SimulationParams, seed: u64) -> Self {
        Self::with_rng(width, height, params, SimRng::from_seed(seed))
    }

    fn with_rng(width: usize, height: usize, params: SimulationParams, rng: SimRng) -> Self {
        let mut sim = Self {
            width,
            height,
            particles: ParticleStore::new(width, height),
            field: ScalarField::new(width, height),
            index: SpatialIndex::new(width, height),
            food: FoodRegistry::new(),
            rng,
            params,
            tick_count: 0,
        };
        sim.particles
            .initialize(sim.params.particle_count, sim.params.move_speed, &mut sim.rng);
        debug!(
            width,
            height,
            particles = sim.params.particle_count,
            seed = sim.rng.seed(),
            "simulation created"
        );
        sim
    }

    /// Advance one step. Returns false (and changes nothing) while paused.
    pub fn tick(&mut self) -> bool {
        if self.params.paused {
            return false;
        }

        self.index.rebuild(self.particles.as_slice());

        let width = self.width as f32;
        let height = self.height as f32;
        let radius = self.params.footprint_radius();
        let amount = self.params.chemical_deposit_rate / (radius * radius) as f32;

        for idx in 0..self.particles.len() {
            let outcome = behavior::step_particle(
                self.particles.as_mut_slice(),
                idx,
                &self.index,
                &self.field,
                &self.params,
                &mut self.rng,
            );
            if !outcome.moves() {
                continue;
            }

            let p = &mut self.particles.as_mut_slice()[idx];
            p.x = wrap_coord(p.x + p.vx, width);
            p.y = wrap_coord(p.y + p.vy, height);
            let (x, y) = (p.x, p.y);
            self.field.deposit_disk(x, y, radius, amount);
        }

        self.field.step_diffusion(
            self.food.as_slice(),
            DiffusionParams {
                diffusion_rate: self.params.diffusion_rate,
                decay_rate: self.params.decay_rate,
                radius,
            },
        );

        self.tick_count += 1;
        trace!(tick = self.tick_count, particles = self.particles.len(), "tick");
        true
    }

    /// Swap in a new parameter record.
    ///
    /// A changed particle count is reconciled in place and a changed move
    /// speed rescales free particles; nothing else touches particle state.
    pub fn update_parameters(&mut self, params: SimulationParams) {
        if params.particle_count != self.params.particle_count {
            let delta = self
                .particles
                .reconcile_count(params.particle_count, params.move_speed, &mut self.rng);
            debug!(target = params.particle_count, delta, "particle count reconciled");
        }
        if params.move_speed != self.params.move_speed {
            self.particles.rescale_speed(params.move_speed);
            debug!(speed = params.move_speed, "speed rescaled");
        }
        self.params = params;
    }

    /// Respawn all particles and clear the field. Food sources are kept.
    pub fn restart(&mut self) {
        self.particles
            .initialize(self.params.particle_count, self.params.move_speed, &mut self.rng);
        self.field.clear();
        self.tick_count = 0;
        debug!(particles = self.params.particle_count, "simulation restarted");
    }

    /// Reallocate for a new field size and restart. Food sources that fall
    /// outside the new bounds are dropped.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.field = ScalarField::new(width, height);
        self.index = SpatialIndex::new(width, height);
        self.particles = ParticleStore::new(width, height);

        let mut kept = FoodRegistry::new();
        for source in self.food.iter() {
            if source.x < width as f32 && source.y < height as f32 {
                kept.add(*source);
            }
        }
        self.food = kept;
        self.restart();
        debug!(width, height, "simulation resized");
    }

    /// Add a stuck particle at (x, y)
    pub fn spawn_pinned(&mut self, x: f32, y: f32) {
        self.particles.spawn_pinned(x, y);
        debug!(x, y, "pinned particle spawned");
    }

    pub fn add_food_source(&mut self, x: f32, y: f32, radius: f32, strength: f32) {
        self.food.add(FoodSource::new(x, y, radius, strength));
        debug!(x, y, radius, strength, "food source added");
    }

    /// Remove every food source centered strictly within `radius` of (x, y)
    pub fn remove_food_sources_near(&mut self, x: f32, y: f32, radius: f32) -> usize {
        let removed = self.food.remove_near(x, y, radius);
        if removed > 0 {
            debug!(x, y, radius, removed, "food sources removed");
        }
        removed
    }

    /// Drop every food source and zero the field
    pub fn clear_food_sources(&mut self) {
        self.food.clear();
        self.field.clear();
        debug!("food sources cleared");
    }

    pub fn get_state(&self) -> SimulationState<'_> {
        SimulationState {
            width: self.width,
            height: self.height,
            particles: self.particles.as_slice(),
            field: self.field.as_slice(),
            food_sources: self.food.as_slice(),
        }
    }

    pub fn stats(&self) -> SimulationStats {
        SimulationStats {
            tick: self.tick_count,
            particles: self.particles.len(),
            stuck: self.particles.stuck_count(),
            food_sources: self.food.len(),
            field_total: self.field.total(),
            field_peak: self.field.max(),
        }
    }

    pub fn toggle_pause(&mut self) {
        self.params.paused = !self.params.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.params.paused
    }

    /// Restart the random stream; the particle set is left as is
    pub fn reseed(&mut self, seed: u64) {
        self.rng.reseed(seed);
    }

    pub fn seed(&self) -> u64 {
        self.rng.seed()
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    pub fn field(&self) -> &ScalarField {
        &self.field
    }

    pub fn particles(&self) -> &[Particle] {
        self.particles.as_slice()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_params(count: usize) -> SimulationParams {
        SimulationParams {
            particle_count: count,
            turn_speed: 0.0,
            alignment_force: 0.0,
            cohesion_force: 0.0,
            separation_force: 0.0,
            diffusion_rate: 0.0,
            decay_rate: 0.0,
            ..Default::default()
        }
    }

    fn heading_east(x: f32, y: f32) -> Particle {
        Particle {
            x,
            y,
            angle: 0.0,
            speed: 1.0,
            vx: 1.0,
            vy: 0.0,
            is_stuck: false,
        }
    }

    #[test]
    fn test_new_spawns_requested_particles() {
        let sim = Simulation::with_seed(40, 30, still_params(25), 1);
        let state = sim.get_state();
        assert_eq!(state.particles.len(), 25);
        assert_eq!(state.field.len(), 40 * 30);
        assert_eq!((state.width, state.height), (40, 30));
    }

    #[test]
    fn test_particle_wraps_across_right_edge() {
        let mut sim = Simulation::with_seed(16, 16, still_params(0), 1);
        sim.particles.push(heading_east(16.0 - 0.1, 8.0));
        sim.tick();
        let p = sim.particles()[0];
        assert!((p.x - 0.9).abs() < 1e-4, "x = {}", p.x);
        assert!(p.x < 16.0);
        assert_eq!(p.y, 8.0);
    }

    #[test]
    fn test_deposit_fills_whole_disk_at_rate_over_r_squared() {
        for (size, disk_cells) in [(1.0, 5.0), (2.0, 13.0), (3.0, 29.0)] {
            let params = SimulationParams {
                particle_size: size,
                chemical_deposit_rate: 0.1,
                ..still_params(0)
            };
            let mut sim = Simulation::with_seed(32, 32, params, 1);
            sim.particles.push(heading_east(10.5, 16.5));
            sim.tick();

            let r = size as f32;
            let expected = 0.1 * disk_cells / (r * r);
            assert!((sim.field().total() - expected).abs() < 1e-5, "size {size}");
            assert!((sim.field().get_cell(11, 16) - 0.1 / (r * r)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_stuck_particle_never_moves() {
        let params = SimulationParams {
            release_probability: 0.0,
            sticking_probability: 0.0,
            ..SimulationParams {
                particle_count: 200,
                ..Default::default()
            }
        };
        let mut sim = Simulation::with_seed(64, 64, params, 42);
        sim.spawn_pinned(30.0, 30.0);
        let before = *sim.particles().last().unwrap();

        for _ in 0..100 {
            sim.tick();
        }
        let after = *sim.particles().last().unwrap();
        assert_eq!(after.x.to_bits(), before.x.to_bits());
        assert_eq!(after.y.to_bits(), before.y.to_bits());
        assert_eq!(after.vx.to_bits(), before.vx.to_bits());
        assert_eq!(after.vy.to_bits(), before.vy.to_bits());
        assert!(after.is_stuck);
    }

    #[test]
    fn test_paused_tick_changes_nothing() {
        let mut sim = Simulation::with_seed(32, 32, SimulationParams::default(), 3);
        sim.add_food_source(5.0, 5.0, 2.0, 1.0);
        sim.tick();
        sim.toggle_pause();

        let particles = sim.particles().to_vec();
        let field = sim.field().as_slice().to_vec();
        assert!(!sim.tick());
        assert_eq!(sim.particles(), &particles[..]);
        assert_eq!(sim.field().as_slice(), &field[..]);
        assert_eq!(sim.tick_count(), 1);
    }

    #[test]
    fn test_food_source_scenario() {
        let params = SimulationParams {
            decay_rate: 0.2,
            ..still_params(0)
        };
        let mut sim = Simulation::with_seed(4, 4, params, 1);
        sim.add_food_source(1.0, 1.0, 1.0, 0.7);
        sim.tick();

        let expected = 0.7 * 0.8;
        for (x, y) in [(1, 1), (0, 1), (2, 1), (1, 0), (1, 2)] {
            assert!((sim.field().get_cell(x, y) - expected).abs() < 1e-6);
        }
        assert_eq!(sim.field().get_cell(3, 3), 0.0);
    }

    #[test]
    fn test_remove_and_clear_food() {
        let mut sim = Simulation::with_seed(16, 16, still_params(0), 1);
        sim.add_food_source(2.0, 2.0, 1.0, 1.0);
        sim.add_food_source(12.0, 12.0, 1.0, 1.0);
        assert_eq!(sim.remove_food_sources_near(3.0, 3.0, 2.0), 1);
        assert_eq!(sim.get_state().food_sources.len(), 1);

        sim.tick();
        assert!(sim.field().total() > 0.0);
        sim.clear_food_sources();
        assert_eq!(sim.get_state().food_sources.len(), 0);
        assert_eq!(sim.field().total(), 0.0);
    }

    #[test]
    fn test_update_parameters_keeps_stuck_particles() {
        let mut sim = Simulation::with_seed(32, 32, still_params(10), 8);
        sim.spawn_pinned(4.0, 4.0);
        let pinned = *sim.particles().last().unwrap();

        let params = SimulationParams {
            particle_count: 3,
            ..sim.params().clone()
        };
        sim.update_parameters(params);
        // 11 live particles reconciled down to 3, the pinned one survives
        assert_eq!(sim.particles().len(), 3);
        assert!(sim.particles().contains(&pinned));
    }

    #[test]
    fn test_update_parameters_rescales_speed() {
        let mut sim = Simulation::with_seed(32, 32, still_params(10), 8);
        let params = SimulationParams {
            move_speed: 2.5,
            ..sim.params().clone()
        };
        sim.update_parameters(params);
        for p in sim.particles() {
            assert!((p.velocity_magnitude() - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_cosmetic_update_leaves_state_alone() {
        let mut sim = Simulation::with_seed(32, 32, SimulationParams::default(), 8);
        sim.tick();
        let particles = sim.particles().to_vec();
        let params = SimulationParams {
            highlight_stuck: false,
            color_scheme: sim.params().color_scheme.next(),
            ..sim.params().clone()
        };
        sim.update_parameters(params);
        assert_eq!(sim.particles(), &particles[..]);
    }

    #[test]
    fn test_restart_respawns_and_clears_field() {
        let mut sim = Simulation::with_seed(32, 32, SimulationParams::default(), 2);
        sim.spawn_pinned(1.0, 1.0);
        for _ in 0..5 {
            sim.tick();
        }
        sim.restart();
        assert_eq!(sim.particles().len(), sim.params().particle_count);
        assert_eq!(sim.stats().stuck, 0);
        assert_eq!(sim.field().total(), 0.0);
        assert_eq!(sim.tick_count(), 0);
    }

    #[test]
    fn test_same_seed_same_run() {
        let params = SimulationParams {
            particle_count: 300,
            sticking_probability: 0.3,
            release_probability: 0.01,
            ..Default::default()
        };
        let mut a = Simulation::with_seed(48, 48, params.clone(), 99);
        let mut b = Simulation::with_seed(48, 48, params, 99);
        a.spawn_pinned(24.0, 24.0);
        b.spawn_pinned(24.0, 24.0);
        for _ in 0..30 {
            a.tick();
            b.tick();
        }
        assert_eq!(a.particles(), b.particles());
        assert_eq!(a.field().as_slice(), b.field().as_slice());
    }

    #[test]
    fn test_reseed_and_restart_replays_initial_state() {
        let params = still_params(40);
        let fresh = Simulation::with_seed(32, 32, params.clone(), 21);

        let mut sim = Simulation::with_seed(32, 32, params, 5);
        for _ in 0..3 {
            sim.tick();
        }
        sim.reseed(21);
        sim.restart();
        assert_eq!(sim.seed(), 21);
        assert_eq!(sim.particles(), fresh.particles());
    }

    #[test]
    fn test_aggregate_grows_around_pinned_seed() {
        let params = SimulationParams {
            particle_count: 400,
            sticking_probability: 1.0,
            release_probability: 0.0,
            ..Default::default()
        };
        let mut sim = Simulation::with_seed(40, 40, params, 5);
        sim.spawn_pinned(20.0, 20.0);
        for _ in 0..200 {
            sim.tick();
        }
        assert!(sim.stats().stuck > 1);
        for p in sim.particles().iter().filter(|p| p.is_stuck) {
            assert_eq!((p.vx, p.vy), (0.0, 0.0));
        }
    }

    #[test]
    fn test_long_run_stays_finite() {
        let mut sim = Simulation::with_seed(64, 48, SimulationParams::default(), 17);
        sim.add_food_source(10.0, 10.0, 3.0, 1.0);
        for _ in 0..60 {
            sim.tick();
        }
        for p in sim.particles() {
            assert!(p.x.is_finite() && p.y.is_finite());
            assert!(p.x >= 0.0 && p.x < 64.0 && p.y >= 0.0 && p.y < 48.0);
        }
        assert!(sim.field().as_slice().iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_resize_reallocates_field() {
        let mut sim = Simulation::with_seed(32, 32, still_params(12), 4);
        sim.add_food_source(30.0, 30.0, 1.0, 1.0);
        sim.add_food_source(4.0, 4.0, 1.0, 1.0);
        sim.resize(20, 10);
        let state = sim.get_state();
        assert_eq!(state.field.len(), 200);
        assert_eq!(state.particles.len(), 12);
        assert_eq!(state.food_sources.len(), 1);
        assert!(state.particles.iter().all(|p| p.x < 20.0 && p.y < 10.0));
    }
}
