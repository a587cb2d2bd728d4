use crate::color;
use crate::particle::Particle;
use ratatui::style::Color;
use std::collections::HashSet;

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
///
/// Unicode Braille patterns: U+2800 to U+28FF (256 patterns)
const BRAILLE_BASE: u32 = 0x2800;

/// Dot position to bit mapping for Braille characters
const BRAILLE_DOTS: [[u8; 4]; 2] = [
    [0x01, 0x02, 0x04, 0x40], // Left column (x=0): rows 0,1,2,3
    [0x08, 0x10, 0x20, 0x80], // Right column (x=1): rows 0,1,2,3
];

/// A single rendered Braille cell with position and color
#[derive(Clone, Copy)]
pub struct BrailleCell {
    pub x: u16,
    pub y: u16,
    pub char: char,
    pub color: Color,
}

/// Container dimensions in simulation units for a given canvas: one dot is
/// one simulation unit, so the container is 2x the columns and 4x the rows.
pub fn calculate_container_size(canvas_width: u16, canvas_height: u16) -> (f32, f32) {
    (
        canvas_width.max(1) as f32 * 2.0,
        canvas_height.max(1) as f32 * 4.0,
    )
}

/// Overlay state the renderer needs to pick particle colors
pub struct RenderOverlays<'a> {
    pub emphasized: Option<&'a str>,
    pub recent: &'a HashSet<String>,
    pub selected: Option<&'a str>,
}

/// Rasterize the particle snapshot onto the Braille dot grid.
///
/// Each particle is drawn as an ellipse with its current squash/stretch
/// applied; when several particles touch a cell, the highest-priority color
/// (selection > emphasis > recent > blob > pearl) wins the cell.
pub fn render_to_braille(
    particles: &[Particle],
    canvas_width: u16,
    canvas_height: u16,
    overlays: &RenderOverlays,
) -> Vec<BrailleCell> {
    let cw = canvas_width as usize;
    let ch = canvas_height as usize;
    if cw == 0 || ch == 0 {
        return Vec::new();
    }
    let dot_width = cw * 2;
    let dot_height = ch * 4;

    let mut masks = vec![0u8; cw * ch];
    let mut cell_colors: Vec<Option<(u8, Color)>> = vec![None; cw * ch];

    for p in particles {
        // Deformed radii; degenerate scales still draw a sliver
        let rx = (p.r * p.sx).max(0.5);
        let ry = (p.r * p.sy).max(0.5);

        let min_px = ((p.x - rx).floor().max(0.0)) as usize;
        let max_px = ((p.x + rx).ceil() as usize).min(dot_width.saturating_sub(1));
        let min_py = ((p.y - ry).floor().max(0.0)) as usize;
        let max_py = ((p.y + ry).ceil() as usize).min(dot_height.saturating_sub(1));
        if p.y + ry < 0.0 {
            continue; // Still above the container mouth
        }

        let selected = overlays.selected == Some(p.id.as_str());
        let emphasized = overlays.emphasized == Some(p.id.as_str());
        let recent = overlays.recent.contains(&p.id);
        let rank = if p.pearl {
            0
        } else if selected {
            4
        } else if emphasized {
            3
        } else if recent {
            2
        } else {
            1
        };
        let particle_color = color::particle_color(p, emphasized, recent, selected);

        for py in min_py..=max_py {
            for px in min_px..=max_px {
                let ex = (px as f32 + 0.5 - p.x) / rx;
                let ey = (py as f32 + 0.5 - p.y) / ry;
                if ex * ex + ey * ey > 1.0 {
                    continue;
                }

                let cell_x = px / 2;
                let cell_y = py / 4;
                let idx = cell_y * cw + cell_x;
                masks[idx] |= BRAILLE_DOTS[px % 2][py % 4];
                match cell_colors[idx] {
                    Some((existing, _)) if existing >= rank => {}
                    _ => cell_colors[idx] = Some((rank, particle_color)),
                }
            }
        }
    }

    let mut cells = Vec::new();
    for cy in 0..ch {
        for cx in 0..cw {
            let idx = cy * cw + cx;
            if masks[idx] == 0 {
                continue;
            }
            let ch_code = BRAILLE_BASE + masks[idx] as u32;
            cells.push(BrailleCell {
                x: cx as u16,
                y: cy as u16,
                char: char::from_u32(ch_code).unwrap_or(' '),
                color: cell_colors[idx].map(|(_, c)| c).unwrap_or(Color::White),
            });
        }
    }
    cells
}
