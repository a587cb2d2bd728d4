mod app;
mod attention;
mod braille;
mod color;
mod config;
mod feed;
mod particle;
mod presets;
mod settings;
mod simulation;
mod ui;

use app::{App, Focus};
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use feed::EntryFeed;
use presets::PresetManager;
use ratatui::{backend::CrosstermBackend, Terminal};
use simulation::ViewMode;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "pile-simulation")]
#[command(about = "Falling journal-entry pile simulation in the terminal")]
struct Args {
    // === Mode ===
    /// Start in the pre-settled archive view instead of the live fall
    #[arg(short = 'a', long)]
    archive: bool,

    /// JSON file with entry descriptors (defaults to a built-in demo day)
    #[arg(short = 'e', long)]
    entries: Option<PathBuf>,

    /// Load tunables from an exported config file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Start from a named physics preset (soft pile, bouncy, syrup, marbles)
    #[arg(long)]
    preset: Option<String>,

    /// Random seed for spawn jitter and the attention scheduler
    #[arg(long, default_value = "42")]
    seed: u64,

    // === Feed ===
    /// Seconds between entry reveals in live mode (0-30)
    #[arg(long, default_value = "1.5")]
    drip: f32,

    /// Simulation speed (steps per frame, 1-10)
    #[arg(long, default_value = "1")]
    speed: usize,

    // === Physics overrides ===
    /// Per-step downward acceleration (0.05-0.6)
    #[arg(short = 'g', long)]
    gravity: Option<f32>,

    /// Global velocity damping per step (0.9-1.0)
    #[arg(long)]
    damping: Option<f32>,

    /// Particle-particle bounce factor (0.0-1.0)
    #[arg(long)]
    restitution: Option<f32>,

    /// Floor bounce factor before impact softening (0.0-1.0)
    #[arg(long = "floor-bounce")]
    floor_bounce: Option<f32>,

    /// Wall bounce factor (0.0-1.0)
    #[arg(long = "wall-bounce")]
    wall_bounce: Option<f32>,

    /// Horizontal velocity kept on floor contact (0.5-1.0)
    #[arg(long)]
    friction: Option<f32>,

    /// Landing squash strength (0.0-0.2)
    #[arg(long)]
    squash: Option<f32>,

    /// Per-entry release stagger in seconds (0.0-2.0)
    #[arg(long)]
    stagger: Option<f32>,

    /// Number of decorative pearls (0-40)
    #[arg(long)]
    pearls: Option<usize>,
}

fn build_config(args: &Args) -> Result<AppConfig, String> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(name) = &args.preset {
        let presets = PresetManager::new();
        let preset = presets
            .find(name)
            .ok_or_else(|| format!("unknown preset '{}'", name))?;
        config.settings = preset.settings.clone();
    }

    let s = &mut config.settings;
    if let Some(v) = args.gravity {
        s.gravity = v;
    }
    if let Some(v) = args.damping {
        s.damping = v;
    }
    if let Some(v) = args.restitution {
        s.collision_restitution = v;
    }
    if let Some(v) = args.floor_bounce {
        s.floor_restitution = v;
    }
    if let Some(v) = args.wall_bounce {
        s.wall_restitution = v;
    }
    if let Some(v) = args.friction {
        s.floor_friction = v;
    }
    if let Some(v) = args.squash {
        s.squash_factor = v;
    }
    if let Some(v) = args.stagger {
        s.release_stagger = v;
    }
    if let Some(v) = args.pearls {
        s.pearl_count = v;
    }
    s.clamp_all();

    config.drip = args.drip.clamp(0.0, 30.0);
    config.steps_per_frame = args.speed.clamp(1, 10);
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = build_config(&args)?;

    // Load the feed before touching the terminal so errors print cleanly
    let feed = match &args.entries {
        Some(path) => EntryFeed::from_file(Path::new(path), config.drip)?,
        None => EntryFeed::demo(config.drip),
    };

    let mode = if args.archive {
        ViewMode::Archive
    } else {
        ViewMode::Live
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Get initial terminal size and create app
    let size = terminal.size()?;
    let frame_rect = ratatui::layout::Rect {
        x: 0,
        y: 0,
        width: size.width,
        height: size.height,
    };
    let (canvas_width, canvas_height) = ui::get_canvas_size(frame_rect);
    let mut app = App::new(canvas_width, canvas_height, mode, config, feed, args.seed);

    // Run the app
    let res = run_app(&mut terminal, &mut app);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Canvas size for the terminal's current dimensions
fn current_canvas<B: ratatui::backend::Backend>(terminal: &Terminal<B>) -> (u16, u16) {
    let size = terminal.size().unwrap_or_default();
    ui::get_canvas_size(ratatui::layout::Rect {
        x: 0,
        y: 0,
        width: size.width,
        height: size.height,
    })
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    loop {
        // Render current state
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events with timeout
        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => {
                    // Only process Press events
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }

                    // Handle Ctrl+C
                    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                        return Ok(());
                    }

                    match key.code {
                        // System controls
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char(' ') => app.toggle_pause(),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            let (w, h) = current_canvas(terminal);
                            app.reset(w, h);
                        }
                        KeyCode::Char('a') | KeyCode::Char('A') => {
                            let (w, h) = current_canvas(terminal);
                            app.toggle_mode(w, h);
                        }
                        KeyCode::Char('u') | KeyCode::Char('U') => app.toggle_seal(),
                        KeyCode::Char('p') | KeyCode::Char('P') => app.cycle_preset(),
                        KeyCode::Char('s') | KeyCode::Char('S') => app.save_current_preset(),
                        KeyCode::Char('x') | KeyCode::Char('X') => app.export_config(),
                        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
                            app.toggle_help()
                        }
                        KeyCode::Char('+') | KeyCode::Char('=') => {
                            app.steps_per_frame = (app.steps_per_frame + 1).min(10);
                            app.focus = Focus::Speed;
                        }
                        KeyCode::Char('-') | KeyCode::Char('_') => {
                            app.steps_per_frame = app.steps_per_frame.saturating_sub(1).max(1);
                            app.focus = Focus::Speed;
                        }

                        // Navigation
                        KeyCode::Tab => app.next_focus(),
                        KeyCode::BackTab => app.prev_focus(),
                        KeyCode::Left => app.select_prev(),
                        KeyCode::Right => app.select_next(),
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
                                    let term_size = terminal.size().unwrap_or_default();
                                    let visible = ui::get_controls_visible_lines(term_size.height);
                                    app.scroll_controls_down(
                                        ui::CONTROLS_CONTENT_LINES.saturating_sub(visible),
                                    );
                                }
                            }
                        }
                        KeyCode::Esc => {
                            if app.show_help {
                                app.toggle_help();
                            } else if app.focus.is_param() {
                                app.focus = Focus::Controls;
                            } else if app.selected.is_some() {
                                app.selected = None;
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
                Event::Resize(width, height) => {
                    let (canvas_width, canvas_height) = ui::get_canvas_size(
                        ratatui::layout::Rect {
                            x: 0,
                            y: 0,
                            width,
                            height,
                        },
                    );
                    app.resize(canvas_width, canvas_height);
                }
                _ => {}
            }
        }

        // Run simulation tick
        app.tick();
    }
}
