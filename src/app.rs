use crate::braille;
use crate::color::ColorLut;
use crate::config::AppConfig;
use crate::presets::{Preset, PresetManager};
use crate::settings::SimulationParams;
use crate::simulation::Simulation;
use tracing::{info, warn};

/// Food source radius laid down by the attract tool
const FOOD_RADIUS: f32 = 3.0;
const FOOD_STRENGTH: f32 = 1.0;
/// Reach of the erase tool
const ERASE_RADIUS: f32 = 6.0;

pub const MAX_STEPS_PER_FRAME: usize = 20;

/// Focus state for parameter editing in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Focus {
    #[default]
    None,
    Particles,
    MoveSpeed,
    TurnSpeed,
    SensorAngle,
    SensorDistance,
    Diffusion,
    Decay,
    Deposit,
    Alignment,
    Cohesion,
    Separation,
    Perception,
    Size,
    Sticking,
    Release,
    ColorScheme,
    View,
    Highlight,
    Steps,
    // Controls box (not a param)
    Controls,
}

/// Order of the parameters box, top to bottom
const PARAM_ORDER: [Focus; 19] = [
    Focus::Particles,
    Focus::MoveSpeed,
    Focus::TurnSpeed,
    Focus::SensorAngle,
    Focus::SensorDistance,
    Focus::Diffusion,
    Focus::Decay,
    Focus::Deposit,
    Focus::Alignment,
    Focus::Cohesion,
    Focus::Separation,
    Focus::Perception,
    Focus::Size,
    Focus::Sticking,
    Focus::Release,
    Focus::ColorScheme,
    Focus::View,
    Focus::Highlight,
    Focus::Steps,
];

impl Focus {
    /// Tab walks down the parameters box, wrapping at the end
    pub fn next(&self) -> Focus {
        match self.position() {
            Some(i) => PARAM_ORDER[(i + 1) % PARAM_ORDER.len()],
            None => PARAM_ORDER[0],
        }
    }

    /// Shift+Tab walks up
    pub fn prev(&self) -> Focus {
        match self.position() {
            Some(0) | None => PARAM_ORDER[PARAM_ORDER.len() - 1],
            Some(i) => PARAM_ORDER[i - 1],
        }
    }

    fn position(&self) -> Option<usize> {
        PARAM_ORDER.iter().position(|f| f == self)
    }

    /// Line index in the parameters box
    pub fn line_index(&self) -> u16 {
        self.position().unwrap_or(0) as u16
    }

    /// Check if focus is on a parameter (not Controls or None)
    pub fn is_param(&self) -> bool {
        !matches!(self, Focus::None | Focus::Controls)
    }

    pub fn all() -> &'static [Focus] {
        &PARAM_ORDER
    }
}

/// What a mouse click on the canvas does
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Tool {
    /// Drop a food source
    #[default]
    Attract,
    /// Remove nearby food sources
    Erase,
    /// Place a stuck particle
    Pin,
}

impl Tool {
    pub fn name(&self) -> &str {
        match self {
            Tool::Attract => "Attract",
            Tool::Erase => "Erase",
            Tool::Pin => "Pin",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Tool::Attract => Tool::Erase,
            Tool::Erase => Tool::Pin,
            Tool::Pin => Tool::Attract,
        }
    }
}

/// Main application state
pub struct App {
    pub simulation: Simulation,
    pub color_lut: ColorLut,
    pub focus: Focus,
    pub tool: Tool,
    pub presets: PresetManager,
    /// Index into `presets.all_presets()` of the last applied preset
    pub preset_index: Option<usize>,
    pub fullscreen_mode: bool,
    pub steps_per_frame: usize,
    pub show_help: bool,
    pub help_scroll: u16,
    pub controls_scroll: u16,
    /// One-line feedback shown in the status box
    pub status_message: Option<String>,
}

impl App {
    pub fn new(canvas_width: u16, canvas_height: u16, config: &AppConfig, presets: PresetManager) -> Self {
        let (sim_width, sim_height) = braille::calculate_simulation_size(canvas_width, canvas_height);
        let params = config.params.clone();
        let color_lut = params.color_scheme.build_lut();
        let simulation = match config.seed {
            Some(seed) => Simulation::with_seed(sim_width, sim_height, params, seed),
            None => Simulation::new(sim_width, sim_height, params),
        };
        Self {
            simulation,
            color_lut,
            focus: Focus::Controls,
            tool: Tool::default(),
            presets,
            preset_index: None,
            fullscreen_mode: false,
            steps_per_frame: config.steps_per_frame.clamp(1, MAX_STEPS_PER_FRAME),
            show_help: false,
            help_scroll: 0,
            controls_scroll: 0,
            status_message: None,
        }
    }

    /// Run simulation steps for current frame
    pub fn tick(&mut self) {
        for _ in 0..self.steps_per_frame {
            if !self.simulation.tick() {
                break;
            }
        }
    }

    pub fn params(&self) -> &SimulationParams {
        self.simulation.params()
    }

    /// Hand a new parameter record to the engine, rebuilding the LUT if the
    /// color scheme changed
    pub fn apply_params(&mut self, params: SimulationParams) {
        if params.color_scheme != self.params().color_scheme {
            self.color_lut = params.color_scheme.build_lut();
        }
        self.simulation.update_parameters(params);
    }

    fn edit_params(&mut self, edit: impl FnOnce(&mut SimulationParams)) {
        let mut params = self.params().clone();
        edit(&mut params);
        self.apply_params(params);
    }

    /// Step the focused parameter one notch; `dir` is +1 or -1
    fn adjust_focused(&mut self, dir: f32) {
        let up = dir > 0.0;
        match self.focus {
            Focus::None | Focus::Controls => {}
            Focus::Steps => {
                if up {
                    self.increase_speed();
                } else {
                    self.decrease_speed();
                }
            }
            Focus::Particles => self.edit_params(|p| p.adjust_particle_count(if up { 250 } else { -250 })),
            Focus::MoveSpeed => self.edit_params(|p| p.adjust_move_speed(0.1 * dir)),
            Focus::TurnSpeed => self.edit_params(|p| p.adjust_turn_speed(0.05 * dir)),
            Focus::SensorAngle => self.edit_params(|p| p.adjust_sensor_angle(0.05 * dir)),
            Focus::SensorDistance => self.edit_params(|p| p.adjust_sensor_distance(dir)),
            Focus::Diffusion => self.edit_params(|p| p.adjust_diffusion_rate(0.05 * dir)),
            Focus::Decay => self.edit_params(|p| p.adjust_decay_rate(0.01 * dir)),
            Focus::Deposit => self.edit_params(|p| p.adjust_deposit_rate(0.02 * dir)),
            Focus::Alignment => self.edit_params(|p| p.adjust_alignment_force(0.1 * dir)),
            Focus::Cohesion => self.edit_params(|p| p.adjust_cohesion_force(0.1 * dir)),
            Focus::Separation => self.edit_params(|p| p.adjust_separation_force(0.1 * dir)),
            Focus::Perception => self.edit_params(|p| p.adjust_perception_radius(dir)),
            Focus::Size => self.edit_params(|p| p.adjust_particle_size(0.5 * dir)),
            Focus::Sticking => self.edit_params(|p| p.adjust_sticking_probability(0.05 * dir)),
            Focus::Release => self.edit_params(|p| p.adjust_release_probability(0.005 * dir)),
            Focus::ColorScheme => self.edit_params(|p| {
                p.color_scheme = if up { p.color_scheme.next() } else { p.color_scheme.prev() }
            }),
            Focus::View => self.edit_params(|p| {
                p.field_view = if up { p.field_view.next() } else { p.field_view.prev() }
            }),
            Focus::Highlight => self.edit_params(|p| p.highlight_stuck = !p.highlight_stuck),
        }
    }

    pub fn adjust_focused_up(&mut self) {
        self.adjust_focused(1.0);
    }

    pub fn adjust_focused_down(&mut self) {
        self.adjust_focused(-1.0);
    }

    pub fn next_focus(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn prev_focus(&mut self) {
        self.focus = self.focus.prev();
    }

    pub fn toggle_pause(&mut self) {
        self.simulation.toggle_pause();
    }

    pub fn restart(&mut self) {
        self.simulation.restart();
    }

    /// Restart from the current seed so the run repeats from its first tick
    pub fn replay(&mut self) {
        let seed = self.simulation.seed();
        self.simulation.reseed(seed);
        self.simulation.restart();
        self.status_message = Some(format!("Replaying seed {}", seed));
    }

    pub fn cycle_tool(&mut self) {
        self.tool = self.tool.next();
    }

    /// Apply the current tool at field coordinates (x, y)
    pub fn apply_tool(&mut self, x: f32, y: f32) {
        match self.tool {
            Tool::Attract => self.simulation.add_food_source(x, y, FOOD_RADIUS, FOOD_STRENGTH),
            Tool::Erase => {
                self.simulation.remove_food_sources_near(x, y, ERASE_RADIUS);
            }
            Tool::Pin => self.simulation.spawn_pinned(x, y),
        }
    }

    pub fn clear_food(&mut self) {
        self.simulation.clear_food_sources();
    }

    fn apply_preset_params(&mut self, preset: Preset) {
        // Pause state belongs to the session, not the preset
        let params = SimulationParams {
            paused: self.params().paused,
            ..preset.params
        };
        self.apply_params(params);
        info!(preset = %preset.name, "preset applied");
        self.status_message = Some(format!("Preset: {}", preset.name));
    }

    /// Apply the preset after the last one applied, wrapping around
    pub fn next_preset(&mut self) {
        let index = self.preset_index.map_or(0, |i| i + 1);
        if let Some(preset) = self.presets.cycle(index).cloned() {
            let total = self.presets.preset_names().len();
            self.preset_index = Some(index % total);
            self.apply_preset_params(preset);
        }
    }

    /// Apply a preset by name. Returns false if no preset matches.
    pub fn apply_preset(&mut self, name: &str) -> bool {
        let Some(index) = self
            .presets
            .all_presets()
            .position(|p| p.name.eq_ignore_ascii_case(name))
        else {
            return false;
        };
        if let Some(preset) = self.presets.cycle(index).cloned() {
            self.preset_index = Some(index);
            self.apply_preset_params(preset);
        }
        true
    }

    /// Save the live parameters as a user preset named after the tick count
    pub fn save_current_preset(&mut self) {
        let name = format!("Saved {}", self.simulation.tick_count());
        let preset = Preset::new(name.clone(), "Saved from the running simulation", self.params().clone());
        match self.presets.save_preset(preset) {
            Ok(()) => {
                info!(preset = %name, "preset saved");
                self.status_message = Some(format!("Saved '{}'", name));
            }
            Err(err) => {
                warn!(%err, "failed to save preset");
                self.status_message = Some(format!("Save failed: {}", err));
            }
        }
    }

    pub fn cycle_color_scheme(&mut self) {
        self.edit_params(|p| p.color_scheme = p.color_scheme.next());
    }

    pub fn cycle_view(&mut self) {
        self.edit_params(|p| p.field_view = p.field_view.next());
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen_mode = !self.fullscreen_mode;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        if self.show_help {
            self.help_scroll = 0;
        }
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll = self.help_scroll.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self, max_scroll: u16) {
        self.help_scroll = (self.help_scroll + 1).min(max_scroll);
    }

    pub fn scroll_controls_up(&mut self) {
        self.controls_scroll = self.controls_scroll.saturating_sub(1);
    }

    pub fn scroll_controls_down(&mut self, max_scroll: u16) {
        self.controls_scroll = (self.controls_scroll + 1).min(max_scroll);
    }

    /// Resize simulation to match new canvas size
    pub fn resize(&mut self, canvas_width: u16, canvas_height: u16) {
        let (sim_width, sim_height) = braille::calculate_simulation_size(canvas_width, canvas_height);
        self.simulation.resize(sim_width, sim_height);
    }

    pub fn increase_speed(&mut self) {
        self.steps_per_frame = (self.steps_per_frame + 1).min(MAX_STEPS_PER_FRAME);
    }

    pub fn decrease_speed(&mut self) {
        self.steps_per_frame = self.steps_per_frame.saturating_sub(1).max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorScheme;

    fn test_app() -> App {
        let config = AppConfig {
            params: SimulationParams {
                particle_count: 50,
                ..Default::default()
            },
            seed: Some(11),
            ..Default::default()
        };
        App::new(40, 20, &config, PresetManager::with_dir(None))
    }

    #[test]
    fn test_focus_cycles_through_all_params() {
        let mut focus = Focus::Controls;
        for _ in 0..Focus::all().len() {
            focus = focus.next();
            assert!(focus.is_param());
        }
        assert_eq!(focus, Focus::Steps);
        assert_eq!(focus.next(), Focus::Particles);
        assert_eq!(Focus::Particles.prev(), Focus::Steps);
        assert_eq!(Focus::Steps.line_index() as usize, Focus::all().len() - 1);
    }

    #[test]
    fn test_adjust_particle_count_reaches_engine() {
        let mut app = test_app();
        app.focus = Focus::Particles;
        app.adjust_focused_up();
        assert_eq!(app.params().particle_count, 300);
        assert_eq!(app.simulation.particles().len(), 300);
        app.adjust_focused_down();
        assert_eq!(app.simulation.particles().len(), 50);
    }

    #[test]
    fn test_color_scheme_change_rebuilds_lut() {
        let mut app = test_app();
        let before = app.color_lut;
        app.cycle_color_scheme();
        assert_eq!(app.params().color_scheme, ColorScheme::Slime.next());
        assert_ne!(app.color_lut, before);
    }

    #[test]
    fn test_tools_drive_engine_commands() {
        let mut app = test_app();
        app.apply_tool(10.0, 10.0);
        assert_eq!(app.simulation.stats().food_sources, 1);

        app.cycle_tool();
        app.apply_tool(12.0, 10.0);
        assert_eq!(app.simulation.stats().food_sources, 0);

        app.cycle_tool();
        app.apply_tool(5.0, 5.0);
        assert_eq!(app.simulation.stats().stuck, 1);

        app.cycle_tool();
        assert_eq!(app.tool, Tool::Attract);
    }

    #[test]
    fn test_presets_keep_pause_state() {
        let mut app = test_app();
        app.toggle_pause();
        assert!(app.apply_preset("flocking"));
        assert!(app.simulation.is_paused());
        assert_eq!(app.params().alignment_force, 2.0);
        assert!(!app.apply_preset("nope"));
    }

    #[test]
    fn test_next_preset_wraps() {
        let mut app = test_app();
        let total = app.presets.preset_names().len();
        for _ in 0..total + 1 {
            app.next_preset();
        }
        assert_eq!(app.preset_index, Some(0));
    }

    #[test]
    fn test_save_preset_without_dir_reports_failure() {
        let mut app = test_app();
        app.save_current_preset();
        assert!(app.status_message.unwrap().starts_with("Save failed"));
    }

    #[test]
    fn test_speed_bounds() {
        let mut app = test_app();
        for _ in 0..50 {
            app.increase_speed();
        }
        assert_eq!(app.steps_per_frame, MAX_STEPS_PER_FRAME);
        for _ in 0..50 {
            app.decrease_speed();
        }
        assert_eq!(app.steps_per_frame, 1);
    }

    #[test]
    fn test_replay_repeats_the_run() {
        let mut app = test_app();
        app.tick();
        let first = app.simulation.particles().to_vec();

        for _ in 0..5 {
            app.tick();
        }
        app.replay();
        app.tick();
        assert_eq!(app.simulation.particles(), &first[..]);
        assert_eq!(app.simulation.seed(), 11);
    }

    #[test]
    fn test_tick_runs_steps_per_frame() {
        let mut app = test_app();
        app.steps_per_frame = 3;
        app.tick();
        assert_eq!(app.simulation.tick_count(), 3);
        app.toggle_pause();
        app.tick();
        assert_eq!(app.simulation.tick_count(), 3);
    }
}
