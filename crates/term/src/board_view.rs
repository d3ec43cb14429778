//! BoardView: maps a [`GridSnapshot`] into a terminal framebuffer.
//!
//! The view also owns the screen layout, so it is the one place that knows how
//! terminal coordinates relate to world space: [`BoardView::camera`] returns
//! the [`OrthoCamera`] matching what [`BoardView::render_into`] draws.
//!
//! Pure (no I/O); unit-testable.

use crate::core::{GridSnapshot, GridStore, OrthoCamera, Palette};
use crate::fb::{FrameBuffer, Glyph, Rgb, Style};
use crate::types::{ColorId, Vec2, Vec3};

const BOARD_BG: Rgb = Rgb::new(30, 30, 40);

const COLOR_TABLE: [Rgb; 8] = [
    Rgb::new(220, 80, 80),
    Rgb::new(100, 220, 120),
    Rgb::new(80, 120, 220),
    Rgb::new(240, 220, 80),
    Rgb::new(200, 120, 220),
    Rgb::new(80, 220, 220),
    Rgb::new(255, 165, 0),
    Rgb::new(200, 200, 200),
];

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

/// Where the board frame sits on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardLayout {
    pub start_x: u16,
    pub start_y: u16,
    pub frame_w: u16,
    pub frame_h: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardView {
    /// Board cell width in terminal columns.
    cell_w: u16,
    /// Board cell height in terminal rows.
    cell_h: u16,
}

impl Default for BoardView {
    fn default() -> Self {
        // 4x2 keeps cells roughly square on common terminal fonts.
        Self::new(4, 2)
    }
}

impl BoardView {
    pub fn new(cell_w: u16, cell_h: u16) -> Self {
        Self {
            cell_w: cell_w.max(1),
            cell_h: cell_h.max(1),
        }
    }

    /// Centered frame for a `grid_w × grid_h` board
    pub fn layout(&self, grid_w: u16, grid_h: u16, viewport: Viewport) -> BoardLayout {
        let frame_w = grid_w.saturating_mul(self.cell_w).saturating_add(2);
        let frame_h = grid_h.saturating_mul(self.cell_h).saturating_add(2);
        BoardLayout {
            start_x: viewport.width.saturating_sub(frame_w) / 2,
            start_y: viewport.height.saturating_sub(frame_h) / 2,
            frame_w,
            frame_h,
        }
    }

    /// Camera mapping terminal cells onto the board's world rectangle
    ///
    /// Row 0 of the grid is drawn at the bottom of the frame, so screen y grows
    /// opposite to world y.
    pub fn camera(&self, grid: &GridStore, viewport: Viewport) -> OrthoCamera {
        let layout = self.layout(grid.width(), grid.height(), viewport);
        let geometry = grid.geometry();
        let top_left = grid.world_position(0, grid.height() as i32, false);

        OrthoCamera::new(
            Vec2::new(layout.start_x as f32 + 1.0, layout.start_y as f32 + 1.0),
            Vec3::new(top_left.x, top_left.y, geometry.origin.z),
            Vec2::new(
                geometry.cell_size.x / self.cell_w as f32,
                -geometry.cell_size.y / self.cell_h as f32,
            ),
        )
    }

    /// Render into an existing framebuffer, resizing it to the viewport.
    pub fn render_into(
        &self,
        snap: &GridSnapshot,
        camera: &OrthoCamera,
        palette: Option<&Palette>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.fill(Glyph::default());

        let layout = self.layout(snap.width, snap.height, viewport);
        let board_w = layout.frame_w - 2;
        let board_h = layout.frame_h - 2;

        fb.fill_rect(
            layout.start_x + 1,
            layout.start_y + 1,
            board_w,
            board_h,
            ' ',
            Style::new(Rgb::new(80, 80, 90), BOARD_BG),
        );
        self.draw_border(fb, layout);

        let empty = Style::new(Rgb::new(90, 90, 100), BOARD_BG).dim();
        for y in 0..snap.height {
            for x in 0..snap.width {
                if snap.color_at(x as i32, y as i32).is_none() {
                    let (px, py) = self.slot_origin(layout, snap.height, x, y);
                    fb.put(px + self.cell_w / 2, py + self.cell_h / 2, '·', empty);
                }
            }
        }

        // Placed cells first, then held cells on top.
        for cell in &snap.cells {
            let Some(center) = camera.to_screen(cell.position) else {
                continue;
            };
            let mut style = Style::new(color_rgb(cell.color), BOARD_BG);
            if cell.merged {
                style = style.bold();
            }
            if cell.slot.is_none() {
                style.bg = Rgb::new(60, 60, 75);
            }

            let ch = glyph_for(palette, cell.color);
            let ch = if cell.scale < 0.5 { '·' } else { ch };
            // Shrinking cells cover less of their footprint.
            let w = ((self.cell_w as f32 * cell.scale.clamp(0.0, 1.0)).round() as i32).max(1);
            let h = ((self.cell_h as f32 * cell.scale.clamp(0.0, 1.0)).round() as i32).max(1);
            let left = (center.x - w as f32 / 2.0).round() as i32;
            let top = (center.y - h as f32 / 2.0).round() as i32;
            for dy in 0..h {
                for dx in 0..w {
                    fb.put_i32(left + dx, top + dy, ch, style);
                }
            }
        }

        self.draw_side_panel(fb, snap, palette, viewport, layout);
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(
        &self,
        snap: &GridSnapshot,
        camera: &OrthoCamera,
        palette: Option<&Palette>,
        viewport: Viewport,
    ) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(snap, camera, palette, viewport, &mut fb);
        fb
    }

    /// Top-left terminal cell of grid slot (x, y)
    fn slot_origin(&self, layout: BoardLayout, grid_h: u16, x: u16, y: u16) -> (u16, u16) {
        let row_from_top = grid_h.saturating_sub(1).saturating_sub(y);
        (
            layout.start_x + 1 + x * self.cell_w,
            layout.start_y + 1 + row_from_top * self.cell_h,
        )
    }

    fn draw_border(&self, fb: &mut FrameBuffer, layout: BoardLayout) {
        let BoardLayout {
            start_x: x,
            start_y: y,
            frame_w: w,
            frame_h: h,
        } = layout;
        if w < 2 || h < 2 {
            return;
        }
        let style = Style::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));

        fb.put(x, y, '┌', style);
        fb.put(x + w - 1, y, '┐', style);
        fb.put(x, y + h - 1, '└', style);
        fb.put(x + w - 1, y + h - 1, '┘', style);
        for dx in 1..w - 1 {
            fb.put(x + dx, y, '─', style);
            fb.put(x + dx, y + h - 1, '─', style);
        }
        for dy in 1..h - 1 {
            fb.put(x, y + dy, '│', style);
            fb.put(x + w - 1, y + dy, '│', style);
        }
    }

    fn draw_side_panel(
        &self,
        fb: &mut FrameBuffer,
        snap: &GridSnapshot,
        palette: Option<&Palette>,
        viewport: Viewport,
        layout: BoardLayout,
    ) {
        let panel_x = layout.start_x.saturating_add(layout.frame_w).saturating_add(2);
        if panel_x >= viewport.width || viewport.width - panel_x < 12 {
            return;
        }

        let label = Style::default().bold();
        let value = Style::new(Rgb::new(200, 200, 200), Rgb::new(0, 0, 0));
        let mut y = layout.start_y;

        fb.put_str(panel_x, y, "STATUS", label);
        y += 1;
        let status = if snap.locked {
            "SETTLING"
        } else if snap.merging {
            "MERGING"
        } else if snap.dragging {
            "DRAGGING"
        } else {
            "READY"
        };
        fb.put_str(panel_x, y, status, value);
        y += 2;

        fb.put_str(panel_x, y, "STACK", label);
        y += 1;
        fb.put_str(panel_x, y, &snap.stack_count.to_string(), value);
        if let Some(color) = snap.anchor_color {
            let name = palette
                .and_then(|p| p.get(color))
                .map_or("?", |e| e.name.as_str());
            fb.put_str(
                panel_x + 3,
                y,
                name,
                Style::new(color_rgb(color), Rgb::new(0, 0, 0)),
            );
        }
        y += 2;

        let help = Style::new(Rgb::new(140, 140, 140), Rgb::new(0, 0, 0)).dim();
        for line in [
            "drag: collect",
            "esc: cancel",
            "r: new grid",
            "x: clear",
            "n: recolor",
            "q: quit",
        ] {
            if y >= viewport.height {
                break;
            }
            fb.put_str(panel_x, y, line, help);
            y += 1;
        }
    }
}

fn color_rgb(color: ColorId) -> Rgb {
    COLOR_TABLE[color.0 as usize % COLOR_TABLE.len()]
}

fn glyph_for(palette: Option<&Palette>, color: ColorId) -> char {
    palette.and_then(|p| p.get(color)).map_or('█', |e| e.glyph)
}
