use crate::app::{App, Focus};
use crate::braille::{self, RenderOverlays};
use crate::simulation::ViewMode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Wrap},
    Frame,
};

const SIDEBAR_WIDTH: u16 = 24;

/// Max scroll for help content (generous to account for text wrapping on small screens)
pub const HELP_CONTENT_LINES: u16 = 40;

/// Number of lines in controls content
pub const CONTROLS_CONTENT_LINES: u16 = 13;

// UI color scheme
const BORDER_COLOR: Color = Color::Cyan;
const HIGHLIGHT_COLOR: Color = Color::Yellow;
const TEXT_COLOR: Color = Color::White;
const DIM_TEXT_COLOR: Color = Color::Gray;

/// Creates a standard styled block with rounded borders
fn styled_block<'a, T: Into<Line<'a>>>(title: T) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(BORDER_COLOR))
        .title(title)
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(0)])
        .split(area);

    render_sidebar(frame, layout[0], app);
    render_canvas(frame, layout[1], app);

    if app.show_help {
        render_help_overlay(frame, area, app);
    }
}

/// Calculate the canvas size (excluding borders)
pub fn get_canvas_size(frame_area: Rect) -> (u16, u16) {
    let canvas_width = frame_area.width.saturating_sub(SIDEBAR_WIDTH + 2);
    let canvas_height = frame_area.height.saturating_sub(2);
    (canvas_width, canvas_height)
}

/// Visible lines inside the controls box for the current terminal height
pub fn get_controls_visible_lines(terminal_height: u16) -> u16 {
    // Status (5) + params (10) + entry (8) come first, minus the box borders
    terminal_height.saturating_sub(5 + 10 + 8).saturating_sub(2)
}

fn render_sidebar(frame: &mut Frame, area: Rect, app: &App) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),  // Status
            Constraint::Length(10), // Parameters
            Constraint::Length(8),  // Selected entry
            Constraint::Min(8),     // Controls
        ])
        .split(area);

    render_status_box(frame, sections[0], app);
    render_params_box(frame, sections[1], app);
    render_entry_box(frame, sections[2], app);
    render_controls_box(frame, sections[3], app);
}

fn render_status_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(format!(" Pile · {} ", app.sim.mode.name()));

    let total = app.sim.particles().len();
    let settled = app.sim.settled_count();
    let progress = if total == 0 {
        0.0
    } else {
        settled as f32 / total as f32
    };
    let progress_width = (area.width.saturating_sub(4)) as usize;
    let filled = (progress * progress_width as f32) as usize;
    let empty = progress_width.saturating_sub(filled);

    let status_text = if app.sim.mode == ViewMode::Archive {
        if app.sealed {
            "SEALED"
        } else {
            "ARCHIVED"
        }
    } else if app.paused {
        "PAUSED"
    } else if settled == total && app.sim.blob_count() == app.feed.len() {
        "AT REST"
    } else {
        "FALLING"
    };

    let status_color = if app.paused {
        HIGHLIGHT_COLOR
    } else if status_text == "SEALED" || status_text == "AT REST" {
        Color::Green
    } else {
        BORDER_COLOR
    };

    let content = vec![
        Line::from(Span::styled(
            format!("{} entries · {} rest", app.sim.blob_count(), settled),
            Style::default().fg(TEXT_COLOR),
        )),
        Line::from(vec![
            Span::styled("█".repeat(filled), Style::default().fg(Color::Green)),
            Span::styled("░".repeat(empty), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::styled(status_text, Style::default().fg(status_color))),
    ];

    let paragraph = Paragraph::new(content).block(block);
    frame.render_widget(paragraph, area);
}

fn render_params_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Parameters ");

    let make_line = |label: &str, value: String, focused: bool| {
        let prefix = if focused { "> " } else { "  " };
        let style = if focused {
            Style::default().fg(HIGHLIGHT_COLOR)
        } else {
            Style::default().fg(TEXT_COLOR)
        };
        Line::from(Span::styled(format!("{}{}: {}", prefix, label, value), style))
    };

    let settings = &app.sim.settings;

    let content = vec![
        make_line(
            "Collision",
            format!("{:.2}", settings.collision_restitution),
            app.focus == Focus::Collision,
        ),
        make_line(
            "Damping",
            format!("{:.3}", settings.damping),
            app.focus == Focus::Damping,
        ),
        make_line(
            "Floor bnc",
            format!("{:.2}", settings.floor_restitution),
            app.focus == Focus::FloorBounce,
        ),
        make_line(
            "Gravity",
            format!("{:.2}", settings.gravity),
            app.focus == Focus::Gravity,
        ),
        make_line(
            "Speed",
            format!("{}x", app.steps_per_frame),
            app.focus == Focus::Speed,
        ),
        make_line(
            "Squash",
            format!("{:.2}", settings.squash_factor),
            app.focus == Focus::Squash,
        ),
        make_line(
            "Stagger",
            format!("{:.2}s", settings.release_stagger),
            app.focus == Focus::Stagger,
        ),
        make_line(
            "Wall bnc",
            format!("{:.2}", settings.wall_restitution),
            app.focus == Focus::WallBounce,
        ),
    ];

    // Calculate scroll to keep focused item visible based on actual area
    let focus_line = app.focus.line_index();
    let visible_height = area.height.saturating_sub(2); // minus borders
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

fn render_entry_box(frame: &mut Frame, area: Rect, app: &App) {
    let block = styled_block(" Entry ");

    let content = match app.selected_particle() {
        Some(p) => {
            let mut lines = vec![Line::from(Span::styled(
                p.meta.label.clone(),
                Style::default().fg(HIGHLIGHT_COLOR),
            ))];
            lines.push(Line::from(Span::styled(
                p.meta.note.clone(),
                Style::default().fg(TEXT_COLOR),
            )));
            let mut tags = Vec::new();
            if let Some(color) = &p.meta.color {
                tags.push(color.clone());
            }
            if p.meta.discussed {
                tags.push("discussed".to_string());
            }
            if p.optimistic {
                tags.push("pending".to_string());
            }
            if !tags.is_empty() {
                lines.push(Line::from(Span::styled(
                    tags.join(" · "),
                    Style::default().fg(DIM_TEXT_COLOR),
                )));
            }
            lines
        }
        None => vec![Line::from(Span::styled(
            "←/→ to browse entries",
            Style::default().fg(DIM_TEXT_COLOR),
        ))],
    };

    let paragraph = Paragraph::new(content)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_controls_box(frame: &mut Frame, area: Rect, app: &App) {
    let key_style = Style::default().fg(HIGHLIGHT_COLOR);
    let desc_style = Style::default().fg(DIM_TEXT_COLOR);

    // Helper to create a control line
    let make_control = |key: &str, desc: String| -> Line<'_> {
        Line::from(vec![
            Span::styled(format!("{:>5}", key), key_style),
            Span::styled(format!(" {}", desc), desc_style),
        ])
    };

    let mut content = vec![
        make_control("Space", "pause/resume".to_string()),
        make_control("H/?", "help".to_string()),
        make_control("A", format!("view: {}", app.sim.mode.name())),
        make_control("U", "seal archive".to_string()),
        make_control("P", "cycle preset".to_string()),
        make_control("S", "save preset".to_string()),
        make_control("X", "export config".to_string()),
        make_control("R", "reset".to_string()),
        make_control("Tab", "focus param".to_string()),
        make_control("↑/↓", "adjust".to_string()),
        make_control("←/→", "select entry".to_string()),
        make_control("Q", "quit".to_string()),
    ];

    if let Some(status) = &app.status {
        content.push(Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Green),
        )));
    }

    let content_height = content.len() as u16;
    let visible_height = area.height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);
    let is_scrollable = max_scroll > 0;

    let title = if is_scrollable {
        " Controls (↑↓) "
    } else {
        " Controls "
    };

    let block = styled_block(title);

    let paragraph = Paragraph::new(content)
        .block(block)
        .scroll((app.controls_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_canvas(frame: &mut Frame, area: Rect, app: &App) {
    let title = if app.sim.mode == ViewMode::Archive && app.sealed {
        " sealed "
    } else {
        ""
    };
    let block = styled_block(title);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let overlays = RenderOverlays {
        emphasized: app.attention.emphasized(),
        recent: &app.recent,
        selected: app.selected.as_deref(),
    };

    let cells = braille::render_to_braille(app.sim.particles(), inner.width, inner.height, &overlays);

    for cell in cells {
        let x = inner.x + cell.x;
        let y = inner.y + cell.y;

        if x < inner.x + inner.width && y < inner.y + inner.height {
            let cell_rect = Rect {
                x,
                y,
                width: 1,
                height: 1,
            };
            let span = Span::styled(cell.char.to_string(), Style::default().fg(cell.color));
            let paragraph = Paragraph::new(Line::from(span));
            frame.render_widget(paragraph, cell_rect);
        }
    }
}

fn render_help_overlay(frame: &mut Frame, area: Rect, app: &App) {
    let canvas_x = SIDEBAR_WIDTH;
    let canvas_width = area.width.saturating_sub(SIDEBAR_WIDTH);

    // Center the help dialog within the canvas
    let help_width = 56.min(canvas_width.saturating_sub(4));
    let help_height = area.height.saturating_sub(4).min(32);
    let x = canvas_x + (canvas_width.saturating_sub(help_width)) / 2;
    let y = (area.height.saturating_sub(help_height)) / 2;

    let help_area = Rect {
        x: area.x + x,
        y: area.y + y,
        width: help_width,
        height: help_height,
    };

    // Clear the background
    frame.render_widget(Clear, help_area);

    let content = vec![
        Line::from(""),
        Line::from(Span::styled("JOURNAL PILE", Style::default().fg(BORDER_COLOR))),
        Line::from(""),
        Line::from("Each journal entry falls into the jar as a soft blob and settles on the pile. Pearls are decoration; they never match an entry."),
        Line::from(""),
        Line::from(Span::styled("VIEWS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Live drops entries one by one with a staggered delay. Archive pre-settles the whole day instantly and freezes it."),
        Line::from(""),
        Line::from(Span::styled("A - Toggle Live/Archive", Style::default().fg(TEXT_COLOR))),
        Line::from(Span::styled("U - Seal/unseal the archive banner", Style::default().fg(TEXT_COLOR))),
        Line::from(Span::styled("←/→ - Select an entry", Style::default().fg(TEXT_COLOR))),
        Line::from("The Entry box shows its label, note, and tags. Pending entries have not been confirmed upstream yet."),
        Line::from(""),
        Line::from(Span::styled("PHYSICS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Tab/Shift+Tab focus a parameter, ↑/↓ adjust it. Gravity, bounce, damping, and squash apply immediately."),
        Line::from(""),
        Line::from(Span::styled("P - Cycle Presets, S - Save Preset", Style::default().fg(TEXT_COLOR))),
        Line::from("Soft Pile, Bouncy, Syrup, Marbles, plus any saved in your config directory."),
        Line::from(""),
        Line::from(Span::styled("X - Export Config", Style::default().fg(TEXT_COLOR))),
        Line::from("Writes pile-config.json with the current tuning; load it back with --config."),
        Line::from(""),
        Line::from(Span::styled("BASIC CONTROLS:", Style::default().fg(HIGHLIGHT_COLOR))),
        Line::from("Space=Pause, R=Reset, A=Archive, P=Preset, +/-=Speed, Q=Quit"),
        Line::from(""),
    ];

    let content_height = content.len() as u16;
    let visible_height = help_height.saturating_sub(2); // minus borders
    let max_scroll = content_height.saturating_sub(visible_height);
    let is_scrollable = max_scroll > 0;

    let title = if is_scrollable {
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
