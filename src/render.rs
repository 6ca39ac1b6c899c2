//! Terminal rendering backend for the edit engine.
//!
//! [`CellMetrics`] measures 8-bit text in character cells and
//! [`TerminalSurface`] paints the engine's drawing callbacks into a ratatui
//! [`Buffer`]. With a 1x1 cell size one engine pixel is one terminal cell.

use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect as Area};
use ratatui::style::{Color, Modifier};
use unicode_width::UnicodeWidthChar;

use crate::editor::{
    BlockId, FontDescriptor, FontMetrics, Listener, Modifiers, MouseButton, Rect, Style,
};
use crate::theme::Theme;

const RULE_GLYPH: char = '─';
const BOX_GLYPH: char = '▒';

/// Fixed-size character cells. Widths come from the Unicode width of each
/// byte read as a Latin-1 character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellMetrics {
    cell_width: i32,
    cell_height: i32,
}

impl CellMetrics {
    pub const fn new(cell_width: i32, cell_height: i32) -> Self {
        Self {
            cell_width,
            cell_height,
        }
    }

    /// One pixel per terminal cell.
    pub const fn terminal() -> Self {
        Self::new(1, 1)
    }
}

impl Default for CellMetrics {
    fn default() -> Self {
        Self::terminal()
    }
}

impl FontMetrics for CellMetrics {
    fn string_width(&self, _font: &FontDescriptor, text: &[u8]) -> i32 {
        text.iter().map(|&byte| cell_count(byte)).sum::<i32>() * self.cell_width
    }

    fn font_height(&self, _font: &FontDescriptor) -> i32 {
        self.cell_height
    }
}

/// Cells taken by one byte. Control characters show up as a single
/// replacement glyph.
fn cell_count(byte: u8) -> i32 {
    char::from(byte).width().unwrap_or(1) as i32
}

fn glyph(byte: u8) -> char {
    let ch = char::from(byte);
    if ch.is_control() { '?' } else { ch }
}

/// Listener painting into an off-screen ratatui buffer the size of the
/// editor viewport.
pub struct TerminalSurface {
    buffer: Buffer,
    theme: Theme,
    fg: Color,
    modifier: Modifier,
    caret: Option<Position>,
    blinking: bool,
    dirty: bool,
    changed: bool,
    scrollbars_changed: bool,
    clicks: Vec<u32>,
}

impl TerminalSurface {
    pub fn new(width: u16, height: u16, theme: Theme) -> Self {
        let fg = theme.foreground;
        Self {
            buffer: Buffer::empty(Area::new(0, 0, width, height)),
            theme,
            fg,
            modifier: Modifier::empty(),
            caret: None,
            blinking: false,
            dirty: true,
            changed: false,
            scrollbars_changed: false,
            clicks: Vec::new(),
        }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.buffer.resize(Area::new(0, 0, width, height));
        self.dirty = true;
    }

    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Clears the surface before the engine paints a new frame.
    pub fn begin_frame(&mut self) {
        self.caret = None;
        self.fg = self.theme.foreground;
        self.modifier = Modifier::empty();
        let area = self.buffer.area;
        self.fill(
            Rect::new(0, 0, i32::from(area.width), i32::from(area.height)),
            |cell, theme| {
                cell.reset();
                cell.set_bg(theme.background);
            },
        );
        self.dirty = false;
    }

    /// Cell the terminal cursor should be shown in, if the caret was painted
    /// inside the viewport.
    pub fn caret_position(&self) -> Option<Position> {
        self.caret
    }

    pub fn is_blinking(&self) -> bool {
        self.blinking
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns whether the document reported a change since the last call.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    pub fn take_scrollbars_changed(&mut self) -> bool {
        std::mem::take(&mut self.scrollbars_changed)
    }

    /// Ids of content elements clicked since the last call.
    pub fn take_clicks(&mut self) -> Vec<u32> {
        std::mem::take(&mut self.clicks)
    }

    /// Copies the surface into `target` with its top left corner at the top
    /// left of `area`, clipped to `area`.
    pub fn blit(&self, target: &mut Buffer, area: Area) {
        let width = area.width.min(self.buffer.area.width);
        let height = area.height.min(self.buffer.area.height);
        for y in 0..height {
            for x in 0..width {
                let Some(src) = self.buffer.cell(Position::new(x, y)) else {
                    continue;
                };
                if let Some(dst) = target.cell_mut(Position::new(area.x + x, area.y + y)) {
                    *dst = src.clone();
                }
            }
        }
    }

    fn color(&self, rgb: u32) -> Color {
        if rgb == 0 {
            return self.theme.foreground;
        }
        let [_, r, g, b] = rgb.to_be_bytes();
        Color::Rgb(r, g, b)
    }

    fn position(x: i32, y: i32) -> Option<Position> {
        Some(Position::new(u16::try_from(x).ok()?, u16::try_from(y).ok()?))
    }

    fn fill(&mut self, rect: Rect, mut paint: impl FnMut(&mut ratatui::buffer::Cell, &Theme)) {
        let area = self.buffer.area;
        let x0 = rect.x.max(0);
        let y0 = rect.y.max(0);
        let x1 = (rect.x + rect.w).min(i32::from(area.width));
        let y1 = (rect.y + rect.h).min(i32::from(area.height));
        for y in y0..y1 {
            for x in x0..x1 {
                let Some(pos) = Self::position(x, y) else {
                    continue;
                };
                if let Some(cell) = self.buffer.cell_mut(pos) {
                    paint(cell, &self.theme);
                }
            }
        }
    }
}

impl Listener for TerminalSurface {
    fn invalidate(&mut self, _rect: Rect) {
        self.dirty = true;
    }

    fn draw_background(&mut self, rect: Rect, _block: Option<BlockId>) {
        self.fill(rect, |cell, theme| {
            cell.reset();
            cell.set_bg(theme.background);
        });
    }

    fn draw_string(&mut self, x: i32, y: i32, text: &[u8]) {
        let mut cx = x;
        for &byte in text {
            let width = cell_count(byte);
            if width == 0 {
                continue;
            }
            if let Some(cell) = Self::position(cx, y).and_then(|pos| self.buffer.cell_mut(pos)) {
                cell.set_char(glyph(byte)).set_fg(self.fg);
                cell.modifier = self.modifier;
            }
            cx += width;
        }
    }

    fn draw_text_selection_bg(&mut self, rect: Rect) {
        self.fill(rect, |cell, theme| {
            cell.set_bg(theme.selection_bg);
        });
    }

    fn draw_content_selection_fg(&mut self, rect: Rect) {
        self.fill(rect, |cell, _| {
            cell.modifier.insert(Modifier::REVERSED);
        });
    }

    fn draw_caret(&mut self, rect: Rect) {
        let area = self.buffer.area;
        self.caret = Self::position(rect.x, rect.y)
            .filter(|pos| pos.x < area.width && pos.y < area.height);
    }

    fn set_style(&mut self, style: &Style) {
        self.fg = self.color(style.color);
        let mut modifier = Modifier::empty();
        if style.font.bold {
            modifier |= Modifier::BOLD;
        }
        if style.font.italic {
            modifier |= Modifier::ITALIC;
        }
        self.modifier = modifier;
    }

    fn scroll(&mut self, _dx: i32, _dy: i32) {
        self.dirty = true;
    }

    fn update_scrollbars(&mut self) {
        self.scrollbars_changed = true;
    }

    fn caret_blink_start(&mut self) {
        self.blinking = true;
    }

    fn caret_blink_stop(&mut self) {
        self.blinking = false;
    }

    fn on_change(&mut self) {
        self.changed = true;
    }

    fn draw_rect(&mut self, rect: Rect, color: u32) {
        let fg = self.color(color);
        self.fill(rect, |cell, _| {
            cell.set_char(RULE_GLYPH).set_fg(fg);
        });
    }

    fn draw_inline_box(&mut self, rect: Rect, _id: u32) {
        self.fill(rect, |cell, theme| {
            cell.set_char(BOX_GLYPH)
                .set_fg(theme.inline_box_fg)
                .set_bg(theme.inline_box_bg);
        });
    }

    fn content_clicked(&mut self, id: u32, _button: MouseButton, _modifiers: Modifiers) {
        self.clicks.push(id);
    }
}
