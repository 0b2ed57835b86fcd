use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use slime_simulation::app::{App, Focus, MAX_STEPS_PER_FRAME};
use slime_simulation::braille;
use slime_simulation::color::ColorScheme;
use slime_simulation::config::AppConfig;
use slime_simulation::export::{self, GifRecorder};
use slime_simulation::presets::PresetManager;
use slime_simulation::settings::FieldView;
use slime_simulation::ui;
use slime_simulation::Simulation;
use std::error::Error;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "slime-simulator")]
#[command(about = "Slime-mold trails, flocking and sticky aggregation in the terminal")]
struct Args {
    // === Basic Parameters ===
    /// Number of particles to simulate (0-20000)
    #[arg(short = 'p', long)]
    particles: Option<usize>,

    /// Random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Simulation speed (ticks per frame, 1-20)
    #[arg(long)]
    speed: Option<usize>,

    /// Start from a named preset (see --list-presets)
    #[arg(long)]
    preset: Option<String>,

    /// Print the available presets and exit
    #[arg(long = "list-presets")]
    list_presets: bool,

    /// Load parameters from a JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the resolved configuration to a JSON file and exit
    #[arg(long = "export-config")]
    export_config: Option<PathBuf>,

    // === Chemotaxis ===
    /// Particle speed in cells per tick (0.1-5.0)
    #[arg(long = "move-speed")]
    move_speed: Option<f32>,

    /// Turn per tick toward the strongest sensor, radians (0-PI)
    #[arg(long = "turn-speed")]
    turn_speed: Option<f32>,

    /// Side sensor offset, radians (0-PI/2)
    #[arg(long = "sensor-angle")]
    sensor_angle: Option<f32>,

    /// Sensor reach in multiples of particle size (1-40)
    #[arg(long = "sensor-distance")]
    sensor_distance: Option<f32>,

    // === Field ===
    /// Diffusion rate (0.0-1.0)
    #[arg(long)]
    diffusion: Option<f32>,

    /// Decay rate (0.0-1.0)
    #[arg(long)]
    decay: Option<f32>,

    /// Chemical deposited per particle per tick (0.0-1.0)
    #[arg(long)]
    deposit: Option<f32>,

    // === Flocking ===
    /// Alignment force (0.0-3.0)
    #[arg(long)]
    alignment: Option<f32>,

    /// Cohesion force (0.0-3.0)
    #[arg(long)]
    cohesion: Option<f32>,

    /// Separation force (0.0-3.0)
    #[arg(long)]
    separation: Option<f32>,

    /// Flocking perception radius in cells (1-100)
    #[arg(long)]
    perception: Option<f32>,

    // === Aggregation ===
    /// Particle size in cells (0.5-8.0)
    #[arg(long)]
    size: Option<f32>,

    /// Chance a free particle sticks on contact (0.0-1.0)
    #[arg(long)]
    sticking: Option<f32>,

    /// Chance a stuck particle lets go each tick (0.0-1.0)
    #[arg(long)]
    release: Option<f32>,

    // === Visual ===
    /// Color scheme (slime, ocean, fire, neon, grayscale)
    #[arg(long)]
    color: Option<String>,

    /// What to draw (trails, combined, particles)
    #[arg(long)]
    view: Option<String>,

    // === Headless ===
    /// Run without the terminal UI
    #[arg(long)]
    headless: bool,

    /// Ticks to run in headless mode
    #[arg(long, default_value = "500")]
    ticks: u64,

    /// Field width in headless mode
    #[arg(long, default_value = "256")]
    width: usize,

    /// Field height in headless mode
    #[arg(long, default_value = "256")]
    height: usize,

    /// Write the final field to this PNG (headless)
    #[arg(long)]
    png: Option<PathBuf>,

    /// Record an animated GIF to this path (headless)
    #[arg(long)]
    gif: Option<PathBuf>,

    /// Ticks between recorded GIF frames
    #[arg(long = "gif-every", default_value = "5")]
    gif_every: u64,

    /// Write logs to this file (the TUI logs nowhere otherwise)
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

fn parse_color_scheme(s: &str) -> ColorScheme {
    match s.to_lowercase().as_str() {
        "ocean" | "blue" => ColorScheme::Ocean,
        "fire" | "heat" => ColorScheme::Fire,
        "neon" => ColorScheme::Neon,
        "grayscale" | "greyscale" | "gray" | "grey" => ColorScheme::Grayscale,
        _ => ColorScheme::Slime,
    }
}

fn parse_view(s: &str) -> FieldView {
    match s.to_lowercase().as_str() {
        "trails" | "trail" | "field" => FieldView::Trails,
        "particles" | "particle" => FieldView::Particles,
        _ => FieldView::Combined,
    }
}

fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<(), Box<dyn Error>> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match log_file {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        // Logging to the terminal would tear the TUI
        None if headless => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}

/// Defaults, then the config file, then the preset, then explicit flags
fn resolve_config(args: &Args, presets: &PresetManager) -> Result<AppConfig, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(name) = &args.preset {
        let preset = presets
            .find(name)
            .ok_or_else(|| format!("unknown preset '{}' (try --list-presets)", name))?;
        config.params = preset.params.clone();
    }

    let p = &mut config.params;
    if let Some(v) = args.particles {
        p.particle_count = v;
    }
    if let Some(v) = args.move_speed {
        p.move_speed = v;
    }
    if let Some(v) = args.turn_speed {
        p.turn_speed = v;
    }
    if let Some(v) = args.sensor_angle {
        p.sensor_angle = v;
    }
    if let Some(v) = args.sensor_distance {
        p.sensor_distance = v;
    }
    if let Some(v) = args.diffusion {
        p.diffusion_rate = v;
    }
    if let Some(v) = args.decay {
        p.decay_rate = v;
    }
    if let Some(v) = args.deposit {
        p.chemical_deposit_rate = v;
    }
    if let Some(v) = args.alignment {
        p.alignment_force = v;
    }
    if let Some(v) = args.cohesion {
        p.cohesion_force = v;
    }
    if let Some(v) = args.separation {
        p.separation_force = v;
    }
    if let Some(v) = args.perception {
        p.perception_radius = v;
    }
    if let Some(v) = args.size {
        p.particle_size = v;
    }
    if let Some(v) = args.sticking {
        p.sticking_probability = v;
    }
    if let Some(v) = args.release {
        p.release_probability = v;
    }
    if let Some(name) = &args.color {
        p.color_scheme = parse_color_scheme(name);
    }
    if let Some(name) = &args.view {
        p.field_view = parse_view(name);
    }
    config.params = std::mem::take(&mut config.params).sanitized();

    if args.seed.is_some() {
        config.seed = args.seed;
    }
    if let Some(speed) = args.speed {
        config.steps_per_frame = speed.clamp(1, MAX_STEPS_PER_FRAME);
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.headless)?;

    let presets = PresetManager::new();

    if args.list_presets {
        for preset in presets.all_presets() {
            println!("{:<12} {}", preset.name, preset.description);
        }
        return Ok(());
    }

    let config = resolve_config(&args, &presets)?;

    if let Some(path) = &args.export_config {
        config.save_to_file(path)?;
        println!("Config written to {}", path.display());
        return Ok(());
    }

    if args.headless {
        return run_headless(&args, &config);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let (canvas_width, canvas_height) = ui::get_canvas_size(Rect::new(0, 0, size.width, size.height), false);
    let mut app = App::new(canvas_width, canvas_height, &config, presets);
    info!(seed = app.simulation.seed(), "starting terminal ui");

    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_headless(args: &Args, config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let mut params = config.params.clone();
    params.paused = false;
    let scheme = params.color_scheme;
    let show_particles = params.field_view.shows_particles();

    let mut sim = match config.seed {
        Some(seed) => Simulation::with_seed(args.width, args.height, params, seed),
        None => Simulation::new(args.width, args.height, params),
    };
    info!(
        width = args.width,
        height = args.height,
        ticks = args.ticks,
        seed = sim.seed(),
        "headless run"
    );

    let mut recorder = match &args.gif {
        Some(path) => Some(GifRecorder::create(path, args.width, args.height, scheme, show_particles)?),
        None => None,
    };
    let gif_every = args.gif_every.max(1);

    for tick in 1..=args.ticks {
        sim.tick();
        if let Some(recorder) = recorder.as_mut() {
            if tick % gif_every == 0 {
                recorder.record(&sim.get_state())?;
            }
        }
        if tick % 100 == 0 {
            let stats = sim.stats();
            debug!(tick, stuck = stats.stuck, field_total = stats.field_total, "progress");
        }
    }

    if let Some(path) = &args.png {
        export::save_png(&sim.get_state(), scheme, show_particles, path)?;
        info!(path = %path.display(), "png written");
    }
    if let Some(recorder) = recorder {
        info!(frames = recorder.frames(), "gif written");
    }

    let stats = sim.stats();
    println!(
        "ticks={} particles={} stuck={} field_total={:.3} field_peak={:.3} seed={}",
        stats.tick,
        stats.particles,
        stats.stuck,
        stats.field_total,
        stats.field_peak,
        sim.seed()
    );
    Ok(())
}

fn handle_mouse(app: &mut App, mouse: MouseEvent, frame_area: Rect) {
    let applies = matches!(
        mouse.kind,
        MouseEventKind::Down(MouseButton::Left) | MouseEventKind::Drag(MouseButton::Left)
    );
    if !applies || app.show_help {
        return;
    }

    let canvas = ui::canvas_rect(frame_area, app.fullscreen_mode);
    if mouse.column < canvas.x || mouse.row < canvas.y {
        return;
    }
    let point = braille::canvas_to_field(
        mouse.column - canvas.x,
        mouse.row - canvas.y,
        canvas.width,
        canvas.height,
        app.simulation.width(),
        app.simulation.height(),
    );
    if let Some((x, y)) = point {
        app.apply_tool(x, y);
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') | KeyCode::Char('R') => app.restart(),
                        KeyCode::Char('z') | KeyCode::Char('Z') => app.replay(),
                        KeyCode::Char('t') | KeyCode::Char('T') => app.cycle_tool(),
                        KeyCode::Char('x') | KeyCode::Char('X') => app.clear_food(),
                        KeyCode::Char('p') | KeyCode::Char('P') => app.next_preset(),
                        KeyCode::Char('s') | KeyCode::Char('S') => app.save_current_preset(),
                        KeyCode::Char('v') | KeyCode::Char('V') => app.toggle_fullscreen(),
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => app.toggle_help(),
                        KeyCode::Char('c') | KeyCode::Char('C') => {
                            app.cycle_color_scheme();
                            app.focus = Focus::ColorScheme;
                        }
                        KeyCode::Char('f') | KeyCode::Char('F') => {
                            app.cycle_view();
                            app.focus = Focus::View;
                        }
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.increase_speed();
                            app.focus = Focus::Steps;
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            app.decrease_speed();
                            app.focus = Focus::Steps;
                        }

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Up => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_up();
                                } else {
                                    app.scroll_controls_up();
                                }
                            }
                        }
                        KeyCode::Down => {
                            if !app.show_help {
                                if app.focus.is_param() {
                                    app.adjust_focused_down();
                                } else {
                                    let term_size = terminal.size()?;
                                    let visible = ui::get_controls_visible_lines(term_size.height);
                                    let lines = ui::controls_content_lines(app);
                                    app.scroll_controls_down(lines.saturating_sub(visible));
                                }
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            }
                        }
                        KeyCode::Char('j') | KeyCode::Char('J') => {
                            if app.show_help {
                                app.scroll_help_down(ui::HELP_CONTENT_LINES);
                            }
                        }
                        KeyCode::Char('k') | KeyCode::Char('K') => {
                            if app.show_help {
                                app.scroll_help_up();
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(mouse) => {
                    let size = terminal.size()?;
                    handle_mouse(app, mouse, Rect::new(0, 0, size.width, size.height));
                }
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) =
                        ui::get_canvas_size(Rect::new(0, 0, width, height), app.fullscreen_mode);
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        app.tick();
    }
}
