use crate::particle::Particle;
use ratatui::style::Color;

pub const PEARL_COLOR: Color = Color::DarkGray;
pub const EMPHASIS_COLOR: Color = Color::White;
pub const RECENT_COLOR: Color = Color::LightYellow;
pub const SELECTED_COLOR: Color = Color::LightCyan;
pub const OPTIMISTIC_COLOR: Color = Color::Gray;

/// Category tag -> terminal color. Unknown or missing tags fall back to a
/// neutral blob color so sparse descriptors still render.
pub fn category_color(tag: Option<&str>) -> Color {
    match tag {
        Some("amber") => Color::Yellow,
        Some("rose") => Color::Red,
        Some("moss") => Color::Green,
        Some("sky") => Color::Cyan,
        Some("lilac") => Color::Magenta,
        Some("sea") => Color::Blue,
        _ => Color::LightBlue,
    }
}

/// Resolve the render color of one particle given the cosmetic overlays.
/// Priority: selection > emphasis > recent flash > optimistic > category.
pub fn particle_color(p: &Particle, emphasized: bool, recent: bool, selected: bool) -> Color {
    if p.pearl {
        return PEARL_COLOR;
    }
    if selected {
        SELECTED_COLOR
    } else if emphasized {
        EMPHASIS_COLOR
    } else if recent {
        RECENT_COLOR
    } else if p.optimistic {
        OPTIMISTIC_COLOR
    } else {
        category_color(p.meta.color.as_deref())
    }
}
