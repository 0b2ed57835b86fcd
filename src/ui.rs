use crate::app::{App, Focus};
use crate::braille::{self, RenderOptions};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

pub const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 60;

const STATUS_HEIGHT: u16 = 8;
const PARAMS_HEIGHT: u16 = 12;

// UI color scheme
const BORDER_COLOR: Color = Color::Green;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if app.fullscreen_mode {
        render_canvas(frame, area, app);
    } else {
        let layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
            .split(area);

        render_sidebar(frame, layout[0], app);
        render_canvas(frame, layout[1], app);
    }

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Inner canvas rectangle (inside the border) for a frame of this size
pub fn canvas_rect(frame_area: Rect, fullscreen: bool) -> Rect {
    let left = if fullscreen { 0 } else { SIDEBAR_WIDTH };
    Rect {
        x: frame_area.x + left + 1,
        y: frame_area.y + 1,
        width: frame_area.width.saturating_sub(left + 2),
        height: frame_area.height.saturating_sub(2),
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect, fullscreen: bool) -> (u16, u16) {
    let rect = canvas_rect(frame_area, fullscreen);
    (rect.width, rect.height)
}

/// Lines of the controls box visible for a terminal of `height` rows
pub fn get_controls_visible_lines(height: u16) -> u16 {
    height
        .saturating_sub(STATUS_HEIGHT + PARAMS_HEIGHT)
        .saturating_sub(2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(PARAMS_HEIGHT),
            Constraint::Min(5),
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_controls_box(frame, sections[2], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Slime Simulator ");
    let stats = app.simulation.stats();

    let (status_text, status_color) = if app.simulation.is_paused() {
        ("PAUSED", HIGHLIGHT_COLOR)
    } else {
        ("RUNNING", BORDER_COLOR)
    };

    let dim = Style::default().fg(DIM_TEXT_COLOR);
    let text = Style::default().fg(TEXT_COLOR);

    let mut content = vec![
        Line::from(vec![
            Span::styled(status_text, Style::default().fg(status_color)),
            Span::styled(format!("  t={}", stats.tick), dim),
        ]),
        Line::from(Span::styled(
            format!("{} particles, {} stuck", stats.particles, stats.stuck),
            text,
        )),
        Line::from(Span::styled(
            format!("food {}  peak {:.2}", stats.food_sources, stats.field_peak),
            text,
        )),
        Line::from(vec![
            Span::styled("Tool: ", dim),
            Span::styled(app.tool.name().to_string(), Style::default().fg(HIGHLIGHT_COLOR)),
        ]),
    ];
    if let Some(message) = &app.status_message {
        content.push(Line::from(Span::styled(message.clone(), dim)));
    } else {
        content.push(Line::from(Span::styled(format!("seed {}", app.simulation.seed()), dim)));
    }

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn param_value(app: &App, focus: Focus) -> (&'static str, String) {
    let p = app.params();
    match focus {
        Focus::Particles => ("Particles", p.particle_count.to_string()),
        Focus::MoveSpeed => ("Speed", format!("{:.1}", p.move_speed)),
        Focus::TurnSpeed => ("Turn", format!("{:.2}", p.turn_speed)),
        Focus::SensorAngle => ("Sensor ang", format!("{:.2}", p.sensor_angle)),
        Focus::SensorDistance => ("Sensor dist", format!("{:.0}", p.sensor_distance)),
        Focus::Diffusion => ("Diffusion", format!("{:.2}", p.diffusion_rate)),
        Focus::Decay => ("Decay", format!("{:.2}", p.decay_rate)),
        Focus::Deposit => ("Deposit", format!("{:.2}", p.chemical_deposit_rate)),
        Focus::Alignment => ("Align", format!("{:.1}", p.alignment_force)),
        Focus::Cohesion => ("Cohesion", format!("{:.1}", p.cohesion_force)),
        Focus::Separation => ("Separate", format!("{:.1}", p.separation_force)),
        Focus::Perception => ("Perception", format!("{:.0}", p.perception_radius)),
        Focus::Size => ("Size", format!("{:.1}", p.particle_size)),
        Focus::Sticking => ("Sticking", format!("{:.2}", p.sticking_probability)),
        Focus::Release => ("Release", format!("{:.3}", p.release_probability)),
        Focus::ColorScheme => ("Color", p.color_scheme.name().to_string()),
        Focus::View => ("View", p.field_view.name().to_string()),
        Focus::Highlight => ("Highlight", if p.highlight_stuck { "on" } else { "off" }.to_string()),
        Focus::Steps => ("Steps", app.steps_per_frame.to_string()),
        Focus::None | Focus::Controls => ("", String::new()),
    }
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let content: Vec<Line> = Focus::all()
        .iter()
        .map(|&focus| {
            let (label, value) = param_value(app, focus);
            let focused = app.focus == focus;
            let prefix = if focused { "> " } else { "  " };
            let style = if focused {
                Style::default().fg(HIGHLIGHT_COLOR)
            } else {
                Style::default().fg(TEXT_COLOR)
            };
            Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
        })
        .collect();

    // Keep the focused line visible
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2);
    let content_height = content.len() as u16;

    let scroll = if visible_height == 0 || visible_height >= content_height {
        0
    } else if focus_line >= visible_height {
        focus_line.saturating_sub(visible_height - 1)
    } else {
        0
    };

    let paragraph = Paragraph::new(content).block(block).scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn controls_content(app: &App) -> Vec<Line<'static>> {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    let make_control = |key: &'static str, desc: String| -> Line<'static> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    vec![
        make_control("Space", "pause/resume".to_string()),
        make_control("H/?", "help".to_string()),
        make_control("R", "restart".to_string()),
        make_control("Z", "replay seed".to_string()),
        make_control("Mouse", app.tool.name().to_lowercase()),
        make_control("T", "cycle tool".to_string()),
        make_control("X", "clear food".to_string()),
        make_control("P", "next preset".to_string()),
        make_control("S", "save preset".to_string()),
        make_control("C", format!("color: {}", app.params().color_scheme.name())),
        make_control("F", format!("view: {}", app.params().field_view.name())),
        make_control("V", "fullscreen".to_string()),
        make_control("Tab", "select param".to_string()),
        make_control("↑/↓", "adjust param".to_string()),
        make_control("+/-", "steps/frame".to_string()),
        make_control("Q", "quit".to_string()),
    ]
}

/// Number of lines in the controls box
pub fn controls_content_lines(app: &App) -> u16 {
    controls_content(app).len() as u16
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let content = controls_content(app);

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2);
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 { " Controls (↑↓) " } else { " Controls " };

    let paragraph = Paragraph::new(content)
        .block(styled_block(title))
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block("");

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let params = app.params();
    let cells = braille::render_to_braille(
        &app.simulation.get_state(),
        inner.width,
        inner.height,
        RenderOptions {
            color_lut: &app.color_lut,
            view: params.field_view,
            highlight_stuck: params.highlight_stuck,
        },
    );

    let buf = frame.buffer_mut();
    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            buf[(x, y)]
                .set_char(cell.char)
                .set_style(Style::default().fg(cell.color));
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let canvas_x = if app.fullscreen_mode { 0 } else { SIDEBAR_WIDTH };
    let canvas_width = area.width.saturating_sub(canvas_x);

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(40);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    frame.render_widget(Clear, help_area);

    let heading = Style::default().fg(HIGHLIGHT_COLOR);
    let title = Style::default().fg(TEXT_COLOR);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("SLIME MOLD & FLOCKING", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Particles lay down a chemical trail and steer toward the strongest reading ahead of them. The trail spreads and fades every tick."),
        Line::from(""),
        Line::from(Span::styled("CHEMOTAXIS:", heading)),
        Line::from(Span::styled("Turn / Sensor ang / Sensor dist", title)),
        Line::from("Three sensors sample the field; the particle turns toward the strongest one."),
        Line::from(Span::styled("Diffusion / Decay / Deposit", title)),
        Line::from("How fast trails spread, how fast they fade, and how much each particle leaves behind."),
        Line::from(""),
        Line::from(Span::styled("FLOCKING:", heading)),
        Line::from("Align matches neighbors' velocity, Cohesion pulls toward their center, Separate pushes apart. Perception sets the neighborhood radius."),
        Line::from(""),
        Line::from(Span::styled("AGGREGATION:", heading)),
        Line::from("Free particles touching a stuck one stick with the Sticking chance. Stuck particles let go with the Release chance. Use the Pin tool to seed clusters."),
        Line::from(""),
        Line::from(Span::styled("TOOLS (T to cycle, click/drag to use):", heading)),
        Line::from("Attract drops a food source, Erase removes nearby food, Pin places a stuck particle."),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", heading)),
        Line::from("Space=Pause, R=Restart, Z=Replay seed, X=Clear food, P=Next preset, S=Save preset, C=Colors, F=View, V=Fullscreen, Tab/Arrows=Adjust, +/-=Steps, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2);
    let max_scroll = content_height.saturating_sub(visible_height);

    let title = if max_scroll > 0 {
        " Help (J/K scroll, H to close) "
    } else {
        " Help (H to close) "
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(HIGHLIGHT_COLOR))
        .title(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.help_scroll, 0));

    frame.render_widget(paragraph, help_area);
}
