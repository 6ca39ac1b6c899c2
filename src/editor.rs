use std::path::Path;
use std::rc::Rc;

mod block;
mod blocks;
mod caret;
mod element;
mod error;
mod import;
mod listener;
mod selection;
mod structure;
mod style;
mod text;
mod undo;

pub use block::Block;
pub use blocks::BlockId;
pub use caret::Caret;
pub use element::{Element, ElementContent, ElementKind, HorizontalRule, InlineBox};
pub use error::EditError;
pub use import::{Import, PlainTextImport};
pub use listener::{
    Clipboard, Key, Listener, MemoryClipboard, Modifiers, MouseButton, Point, Rect,
};
pub use selection::{Selection, SelectionRange, TextPos};
pub use style::{FontDescriptor, FontMetrics, Style, StyleRegistry, TAB_SPACE};
pub use text::{EMBED_MARKER, PASSWORD_CHAR};
pub use undo::{UndoEvent, UndoRedoStack};

use block::LayoutContext;
use blocks::BlockList;
use text::{GLYPH_LINE_BREAK, GLYPH_TAB, sanitize, strip_markers};

/// Far enough right to hit the last element of any line.
const FAR_RIGHT: i32 = i32::MAX / 2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
}

/// Bytes inserted by the Enter key.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineBreak {
    #[default]
    CrLf,
    Lf,
}

impl LineBreak {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            LineBreak::CrLf => b"\r\n",
            LineBreak::Lf => b"\n",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorOptions {
    pub multiline: bool,
    pub wrapping: bool,
    pub read_only: bool,
    pub password: bool,
    pub enabled: bool,
    /// Paint tabs and line breaks as visible glyphs.
    pub show_whitespace: bool,
    /// Keep the caret from resting inside or after a line break while
    /// moving.
    pub snap_line_breaks: bool,
    pub line_break: LineBreak,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            multiline: false,
            wrapping: false,
            read_only: false,
            password: false,
            enabled: true,
            show_whitespace: false,
            snap_line_breaks: false,
            line_break: LineBreak::CrLf,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum SelectState {
    #[default]
    Idle,
    Chars,
    Words,
}

/// The edit engine: a chain of blocks with caret, selection and history,
/// laid out through a [`FontMetrics`] and reporting to a [`Listener`].
pub struct StyleEdit {
    blocks: BlockList,
    styles: StyleRegistry,
    metrics: Box<dyn FontMetrics>,
    listener: Option<Box<dyn Listener>>,
    clipboard: Option<Box<dyn Clipboard>>,
    caret: Caret,
    selection: Selection,
    undo_redo: UndoRedoStack,
    options: EditorOptions,
    align: Align,
    layout_width: i32,
    layout_height: i32,
    content_width: i32,
    content_height: i32,
    scroll_x: i32,
    scroll_y: i32,
    select_state: SelectState,
    mouse_down_point: Point,
    mouse_down_element: Option<(BlockId, usize)>,
}

impl StyleEdit {
    pub fn new(metrics: impl FontMetrics + 'static) -> Self {
        Self::with_options(metrics, EditorOptions::default())
    }

    pub fn with_options(metrics: impl FontMetrics + 'static, options: EditorOptions) -> Self {
        let mut blocks = BlockList::new();
        let first = blocks.push_back(Block::new(Align::Left));
        let mut editor = Self {
            blocks,
            styles: StyleRegistry::new(),
            metrics: Box::new(metrics),
            listener: None,
            clipboard: Some(Box::new(MemoryClipboard::new())),
            caret: Caret::new(first),
            selection: Selection::default(),
            undo_redo: UndoRedoStack::new(),
            options,
            align: Align::Left,
            layout_width: 0,
            layout_height: 0,
            content_width: 0,
            content_height: 0,
            scroll_x: 0,
            scroll_y: 0,
            select_state: SelectState::Idle,
            mouse_down_point: Point::default(),
            mouse_down_element: None,
        };
        editor.clear();
        editor
    }

    pub fn set_listener(&mut self, listener: Box<dyn Listener>) {
        self.listener = Some(listener);
    }

    pub fn take_listener(&mut self) -> Option<Box<dyn Listener>> {
        self.listener.take()
    }

    pub fn set_clipboard(&mut self, clipboard: Box<dyn Clipboard>) {
        self.clipboard = Some(clipboard);
    }

    pub(crate) fn notify(&mut self, f: impl FnOnce(&mut dyn Listener)) {
        if let Some(listener) = self.listener.as_deref_mut() {
            f(listener);
        }
    }

    // ------------------------------------------------------------------------
    // Document
    // ------------------------------------------------------------------------

    /// Empties the document down to a single empty block and forgets the
    /// history.
    pub fn clear(&mut self) {
        self.undo_redo.clear(true, true);
        self.select_nothing();
        let ids: Vec<BlockId> = self.blocks.ids().collect();
        for id in ids {
            self.invalidate_block(id);
        }
        self.blocks.clear();
        let first = self.blocks.push_back(Block::new(self.align));
        self.caret.block = first;
        self.caret.ofs = 0;
        self.mouse_down_element = None;
        self.content_width = 0;
        self.layout_block(first);
        self.place_caret(first, 0);
        self.update_wanted_x();
    }

    pub fn set_text(&mut self, text: &[u8]) -> Result<(), EditError> {
        self.set_text_with(text, false)
    }

    /// Replaces the document. Line breaks split it into blocks when
    /// multiline is on; otherwise only the first line is kept.
    pub fn set_text_with(&mut self, text: &[u8], place_caret_at_end: bool) -> Result<(), EditError> {
        tracing::debug!(len = text.len(), "set text");
        self.clear();
        if text.is_empty() {
            return Ok(());
        }
        let first = self.caret.block;
        self.insert_into_block(first, 0, text, false)?;
        self.place_caret_at_start();
        self.update_wanted_x();
        self.scroll_if_needed(true, false);
        if place_caret_at_end {
            self.place_caret_at_end();
        }
        Ok(())
    }

    /// Replaces the document with whatever `importer` makes of `buf`.
    pub fn import(&mut self, buf: &[u8], importer: &dyn Import) -> Result<(), EditError> {
        self.clear();
        importer.parse(buf, self)
    }

    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), EditError> {
        self.load_with(path, &PlainTextImport)
    }

    pub fn load_with(&mut self, path: impl AsRef<Path>, importer: &dyn Import) -> Result<(), EditError> {
        importer.load(path.as_ref(), self)
    }

    /// The whole document, embed markers included.
    pub fn text(&self) -> Vec<u8> {
        let mut text = Vec::new();
        for (_, block) in self.blocks.iter() {
            text.extend_from_slice(block.text());
        }
        text
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.len() == 1 && self.blocks.iter().all(|(_, block)| block.is_empty())
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn blocks(&self) -> impl Iterator<Item = (BlockId, &Block)> {
        self.blocks.iter()
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id]
    }

    pub fn first_block(&self) -> BlockId {
        self.blocks.first().unwrap_or(self.caret.block)
    }

    pub fn last_block(&self) -> BlockId {
        self.blocks.last().unwrap_or(self.caret.block)
    }

    pub fn styles(&self) -> &StyleRegistry {
        &self.styles
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn align(&self) -> Align {
        self.align
    }

    // ------------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------------

    pub fn insert_text(&mut self, text: &[u8]) -> Result<(), EditError> {
        self.insert_text_with(text, false, false)
    }

    /// Replaces the selection with `text` at the caret, or at the end of the
    /// document when `after_last` is set, and records the insert for undo
    /// unless `clear_undo_redo` asks to forget the history instead.
    pub fn insert_text_with(
        &mut self,
        text: &[u8],
        after_last: bool,
        clear_undo_redo: bool,
    ) -> Result<(), EditError> {
        self.remove_selection()?;
        if after_last {
            self.place_caret_at_end();
        }
        let gofs = self.caret_global_ofs();
        let inserted = self.insert_into_block(self.caret.block, self.caret.ofs, text, false)?;
        if clear_undo_redo {
            self.undo_redo.clear(true, true);
        } else if inserted > 0 {
            let mut recorded = text[..inserted].to_vec();
            sanitize(&mut recorded, false);
            self.undo_redo
                .commit(gofs, &recorded, true, self.options.read_only);
        }
        self.set_caret_global_ofs(gofs + inserted);
        self.advance_past_line_break();
        self.update_wanted_x();
        Ok(())
    }

    pub fn insert_style(&mut self, style: Rc<Style>) -> Result<(), EditError> {
        self.insert_style_with(style, false)
    }

    /// Switches to `style` at the caret. Over a selection the range gets a
    /// switch to `style` at its start and a switch back to the default style
    /// at its end.
    pub fn insert_style_with(&mut self, style: Rc<Style>, after_last: bool) -> Result<(), EditError> {
        let style_id = self.styles.register(style);
        if after_last {
            self.place_caret_at_end();
        }
        if let Some(range) = self.selection.range {
            let (stop_block, stop_ofs) = self.normalize_insert_pos(range.stop.block, range.stop.ofs);
            let (start_block, start_ofs) =
                self.normalize_insert_pos(range.start.block, range.start.ofs);
            let stop_gofs = self.global_ofs(stop_block, stop_ofs);
            let start_gofs = self.global_ofs(start_block, start_ofs);
            let reset = ElementContent::StyleSwitch { style_id: 0 };
            self.insert_embedded_at(stop_block, stop_ofs, reset.clone())?;
            self.commit_embedded(stop_gofs, reset);
            let switch = ElementContent::StyleSwitch { style_id };
            self.insert_embedded_at(start_block, start_ofs, switch.clone())?;
            self.commit_embedded(start_gofs, switch);
            let shift = if start_block == stop_block { 2 } else { 1 };
            self.selection.range = Some(SelectionRange {
                start: TextPos::new(start_block, start_ofs),
                stop: TextPos::new(stop_block, stop_ofs + shift),
            });
            self.place_caret(start_block, start_ofs as isize);
            self.invalidate_selection();
        } else {
            let gofs = self.caret_global_ofs();
            let switch = ElementContent::StyleSwitch { style_id };
            self.insert_embedded_at(self.caret.block, self.caret.ofs, switch.clone())?;
            self.commit_embedded(gofs, switch);
            self.set_caret_global_ofs(gofs + 1);
            self.advance_past_line_break();
            self.update_wanted_x();
        }
        Ok(())
    }

    pub fn insert_embedded(&mut self, content: ElementContent) -> Result<(), EditError> {
        self.insert_embedded_with(content, false)
    }

    pub fn insert_embedded_with(&mut self, content: ElementContent, after_last: bool) -> Result<(), EditError> {
        self.remove_selection()?;
        if after_last {
            self.place_caret_at_end();
        }
        let gofs = self.caret_global_ofs();
        self.insert_embedded_at(self.caret.block, self.caret.ofs, content.clone())?;
        self.commit_embedded(gofs, content);
        self.set_caret_global_ofs(gofs + 1);
        self.advance_past_line_break();
        self.update_wanted_x();
        Ok(())
    }

    fn commit_embedded(&mut self, gofs: usize, content: ElementContent) {
        self.undo_redo
            .commit_with(gofs, &[EMBED_MARKER], vec![content], true, self.options.read_only);
    }

    pub fn cut(&mut self) -> Result<(), EditError> {
        if self.options.password {
            return Ok(());
        }
        self.copy();
        self.delete()
    }

    pub fn copy(&mut self) {
        if self.options.password || !self.selection.is_selected() {
            return;
        }
        let text = strip_markers(&self.selected_text());
        if let Some(clipboard) = self.clipboard.as_deref_mut() {
            clipboard.set_text(&text);
        }
    }

    pub fn paste(&mut self) -> Result<(), EditError> {
        let text = self
            .clipboard
            .as_deref()
            .filter(|clipboard| clipboard.has_text())
            .and_then(|clipboard| clipboard.text());
        if let Some(text) = text {
            self.insert_text(&text)?;
            self.notify(|listener| listener.on_change());
        }
        Ok(())
    }

    /// Removes the selection, if any.
    pub fn delete(&mut self) -> Result<(), EditError> {
        if self.selection.is_selected() {
            self.remove_selection()?;
            self.notify(|listener| listener.on_change());
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Layout and painting
    // ------------------------------------------------------------------------

    pub fn layout_width(&self) -> i32 {
        self.layout_width
    }

    pub fn layout_height(&self) -> i32 {
        self.layout_height
    }

    pub fn content_width(&self) -> i32 {
        self.content_width
    }

    pub fn content_height(&self) -> i32 {
        self.content_height
    }

    /// Resizes the viewport. Blocks are only laid out again when the width
    /// changed and wrapping, alignment or a full-width element depends on it.
    pub fn set_layout_size(&mut self, width: i32, height: i32) {
        if width == self.layout_width && height == self.layout_height {
            return;
        }
        let reformat = width != self.layout_width;
        self.layout_width = width;
        self.layout_height = height;
        tracing::debug!(width, height, reformat, "layout size changed");
        if reformat && self.layout_depends_on_width() {
            self.reformat();
        }
        self.update_caret_pos();
        self.update_wanted_x();
        self.set_scroll_pos(self.scroll_x, self.scroll_y);
    }

    fn layout_depends_on_width(&self) -> bool {
        self.options.wrapping
            || self.align != Align::Left
            || self
                .blocks
                .iter()
                .any(|(_, block)| block.align != Align::Left || !block.specials.is_empty())
    }

    /// Lays out every block again.
    pub fn reformat(&mut self) {
        tracing::debug!(blocks = self.blocks.len(), "reformat");
        let ids: Vec<BlockId> = self.blocks.ids().collect();
        let ctx = LayoutContext {
            styles: &self.styles,
            metrics: self.metrics.as_ref(),
            layout_width: self.layout_width,
            wrapping: self.options.wrapping,
            password: self.options.password,
        };
        let mut ypos = 0;
        let mut width = 0;
        for id in ids {
            let block = &mut self.blocks[id];
            block.ypos = ypos;
            let extent = block.layout(&ctx);
            block.width = extent.width;
            block.height = extent.height;
            ypos += extent.height;
            width = width.max(extent.width);
        }
        self.content_width = width;
        self.update_content_size();
        let rect = Rect::new(0, 0, self.layout_width, self.layout_height);
        self.notify(|listener| listener.invalidate(rect));
        self.update_caret_pos();
    }

    /// Paints everything intersecting `rect` (viewport coordinates) through
    /// the listener.
    pub fn paint(&mut self, rect: Rect) {
        let Some(mut listener) = self.listener.take() else {
            return;
        };
        self.paint_into(listener.as_mut(), rect);
        self.listener = Some(listener);
    }

    fn paint_into(&self, listener: &mut dyn Listener, rect: Rect) {
        let ctx = self.layout_context();
        let mut reached_end = true;
        for (id, block) in self.blocks.iter() {
            if block.ypos - self.scroll_y > rect.y + rect.h {
                reached_end = false;
                break;
            }
            if block.ypos + block.height - self.scroll_y >= 0 {
                self.paint_block(listener, id, block, &ctx);
            }
        }
        if reached_end {
            let end_y = self.content_height - self.scroll_y;
            listener.draw_background(
                Rect::new(0, end_y, self.layout_width, self.layout_height - end_y),
                None,
            );
        }
        if self.caret.on || self.select_state != SelectState::Idle {
            listener.draw_caret(Rect::new(
                self.caret.x - self.scroll_x,
                self.caret.y - self.scroll_y,
                self.caret.width,
                self.caret.height,
            ));
        }
    }

    fn paint_block(&self, listener: &mut dyn Listener, id: BlockId, block: &Block, ctx: &LayoutContext<'_>) {
        let top = block.ypos - self.scroll_y;
        listener.draw_background(Rect::new(0, top, self.layout_width, block.height), Some(id));
        let selected = self.selected_range_in(id);
        for (index, element) in block.elements.iter().enumerate() {
            let x = element.x - self.scroll_x;
            let y = top + element.y;
            let selection = selected.filter(|&(start, stop)| start < element.end() && element.ofs < stop);
            if let Some(content) = element.content() {
                let rect = Rect::new(x, y, element.width, element.height);
                match content {
                    ElementContent::HorizontalRule(rule) => {
                        let w = element.width * rule.width_percent / 100;
                        let rule_rect = Rect::new(x + (element.width - w) / 2, y, w, element.height);
                        listener.draw_rect(rule_rect, rule.color);
                    }
                    ElementContent::InlineBox(inline) => listener.draw_inline_box(rect, inline.id),
                    ElementContent::StyleSwitch { .. } => {}
                }
                if selection.is_some() {
                    listener.draw_content_selection_fg(rect);
                }
                continue;
            }

            if let Some((start, stop)) = selection {
                let from = start.max(element.ofs) - element.ofs;
                let to = stop.min(element.end()) - element.ofs;
                let x1 = block.char_x(index, from, ctx);
                let x2 = block.char_x(index, to, ctx);
                listener.draw_text_selection_bg(Rect::new(x + x1, y, x2 - x1, element.height));
            }

            listener.set_style(self.styles.get(element.style_id));
            match element.kind {
                ElementKind::Text if element.len == 0 => {}
                ElementKind::Text if self.options.password => {
                    let cw = ctx.text_width(element.style_id, &[PASSWORD_CHAR]);
                    for i in 0..element.len as i32 {
                        listener.draw_string(x + i * cw, y, &[PASSWORD_CHAR]);
                    }
                }
                ElementKind::Text => listener.draw_string(x, y, &block.text[element.ofs..element.end()]),
                ElementKind::Tab if self.options.show_whitespace => listener.draw_string(x, y, &[GLYPH_TAB]),
                ElementKind::Break if self.options.show_whitespace => {
                    listener.draw_string(x, y, &[GLYPH_LINE_BREAK])
                }
                _ => {}
            }
        }
    }

    // ------------------------------------------------------------------------
    // Scrolling
    // ------------------------------------------------------------------------

    pub fn scroll_pos(&self) -> Point {
        Point::new(self.scroll_x, self.scroll_y)
    }

    /// Scrolls to `(x, y)`, clamped to the content. Single-line editors never
    /// scroll vertically.
    pub fn set_scroll_pos(&mut self, x: i32, y: i32) {
        let x = x.min(self.content_width - self.layout_width).max(0);
        let mut y = y.min(self.content_height - self.layout_height).max(0);
        if !self.options.multiline {
            y = 0;
        }
        let dx = self.scroll_x - x;
        let dy = self.scroll_y - y;
        if dx != 0 || dy != 0 {
            self.scroll_x = x;
            self.scroll_y = y;
            self.notify(|listener| listener.scroll(dx, dy));
        }
    }

    /// Scrolls just enough to bring the caret into view.
    pub fn scroll_if_needed(&mut self, x: bool, y: bool) {
        let caret = self.caret.rect();
        let mut new_x = self.scroll_x;
        let mut new_y = self.scroll_y;
        if x {
            if caret.x - self.scroll_x < 0 {
                new_x = caret.x;
            }
            if caret.x + caret.w - self.scroll_x > self.layout_width {
                new_x = caret.x + caret.w - self.layout_width;
            }
        }
        if y {
            if caret.y - self.scroll_y < 0 {
                new_y = caret.y;
            }
            if caret.y + caret.h - self.scroll_y > self.layout_height {
                new_y = caret.y + caret.h - self.layout_height;
            }
        }
        self.set_scroll_pos(new_x, new_y);
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    /// Handles a key press. Returns whether the key did anything.
    pub fn key_down(&mut self, key: Key, modifiers: Modifiers) -> bool {
        if self.select_state != SelectState::Idle {
            return false;
        }
        let move_caret = key.moves_caret();
        if !modifiers.shift && move_caret {
            self.select_nothing();
        }

        let old_caret = self.caret_pos();
        let (line_top, line_height) = {
            let block = &self.blocks[old_caret.block];
            let element = &block.elements[self.caret_element()];
            (block.ypos + element.line_y, element.line_height)
        };
        let read_only = self.options.read_only;
        let ctrl = modifiers.ctrl;
        let wanted_x = self.caret.wanted_x;

        let mut handled = true;
        let mut follow_caret = true;
        let outcome = match key {
            Key::Up | Key::Down if ctrl => {
                let step = self.styles.default_style().height(self.metrics.as_ref());
                let dy = if key == Key::Up { -step } else { step };
                self.set_scroll_pos(self.scroll_x, self.scroll_y + dy);
                follow_caret = false;
                Ok(())
            }
            Key::Left => {
                self.move_caret(false, ctrl);
                Ok(())
            }
            Key::Right => {
                self.move_caret(true, ctrl);
                Ok(())
            }
            Key::Up => {
                handled = self.place_caret_at_point(Point::new(wanted_x, line_top - 1));
                Ok(())
            }
            Key::Down => {
                handled = self.place_caret_at_point(Point::new(wanted_x, line_top + line_height));
                Ok(())
            }
            Key::PageUp => {
                self.place_caret_at_point(Point::new(wanted_x, self.caret.y - self.layout_height));
                Ok(())
            }
            Key::PageDown => {
                let y = self.caret.y + self.layout_height + line_height;
                self.place_caret_at_point(Point::new(wanted_x, y));
                Ok(())
            }
            Key::Home if ctrl => {
                self.place_caret_at_point(Point::new(0, 0));
                Ok(())
            }
            Key::End if ctrl => {
                let y = self.content_height;
                self.place_caret_at_point(Point::new(FAR_RIGHT, y));
                Ok(())
            }
            Key::Home => {
                self.place_caret_at_point(Point::new(0, self.caret.y));
                Ok(())
            }
            Key::End => {
                self.place_caret_at_point(Point::new(FAR_RIGHT, self.caret.y));
                Ok(())
            }
            Key::Char(b'8') if ctrl => {
                self.options.show_whitespace = !self.options.show_whitespace;
                let rect = Rect::new(0, 0, self.layout_width, self.layout_height);
                self.notify(|listener| listener.invalidate(rect));
                Ok(())
            }
            k if ctrl && k.is_shortcut(b'A') => {
                self.select_all();
                Ok(())
            }
            Key::Delete | Key::Backspace if !read_only => self.delete_key(key == Key::Delete, ctrl),
            k if ctrl && (k.is_shortcut(b'Z') || k.is_shortcut(b'Y')) => {
                if read_only {
                    Ok(())
                } else if k.is_shortcut(b'Z') != modifiers.shift {
                    self.undo()
                } else {
                    self.redo()
                }
            }
            k if ctrl && !read_only && k.is_shortcut(b'X') => self.cut(),
            k if ctrl && (k.is_shortcut(b'C') || k == Key::Insert) => {
                self.copy();
                Ok(())
            }
            k if !read_only && ((ctrl && k.is_shortcut(b'V')) || (k == Key::Insert && modifiers.shift)) => {
                self.paste()
            }
            Key::Tab if !read_only && !modifiers.shift && self.options.multiline => self.insert_text(b"\t"),
            Key::Enter if !read_only && self.options.multiline && !ctrl => {
                self.insert_text(self.options.line_break.as_bytes())
            }
            Key::Char(ch) if !read_only && !ctrl && ch != 0 => self.insert_text(&[ch]),
            _ => {
                handled = false;
                Ok(())
            }
        };
        if let Err(err) = outcome {
            tracing::warn!(%err, ?key, "key press failed");
        }

        if modifiers.shift && move_caret {
            self.select_to_caret(old_caret);
        }
        if !matches!(key, Key::Up | Key::Down | Key::PageUp | Key::PageDown) {
            self.update_wanted_x();
        }
        self.reset_blink();
        if !move_caret {
            self.notify(|listener| listener.on_change());
        }
        if handled && follow_caret {
            self.scroll_if_needed(true, true);
        }
        handled
    }

    /// Deletes the selection, or the character (word with `word`) next to
    /// the caret. Steps over positions that only differ by block so the end
    /// of one block and the start of the next count as one place.
    fn delete_key(&mut self, forward: bool, word: bool) -> Result<(), EditError> {
        if !self.selection.is_selected() {
            let old_caret = self.caret_pos();
            let old_gofs = self.caret_global_ofs();
            loop {
                let before = self.caret_pos();
                self.move_caret(forward, word);
                if self.caret_global_ofs() != old_gofs || self.caret_pos() == before {
                    break;
                }
            }
            self.select_to_caret(old_caret);
        }
        self.remove_selection()
    }

    /// Starts a selection. An even click count selects whole words while
    /// dragging.
    pub fn mouse_down(&mut self, point: Point, button: MouseButton, clicks: u32, _modifiers: Modifiers) {
        if button != MouseButton::Left {
            return;
        }
        self.mouse_down_point = Point::new(point.x + self.scroll_x, point.y + self.scroll_y);
        self.select_nothing();
        self.select_state = if clicks.max(1) % 2 == 1 {
            SelectState::Chars
        } else {
            SelectState::Words
        };
        self.mouse_move(point);
        let block = &self.blocks[self.caret.block];
        let index = block.find_element_at(self.mouse_down_point.x, self.mouse_down_point.y - block.ypos);
        self.mouse_down_element = Some((self.caret.block, index));
        self.reset_blink();
    }

    /// Ends a selection and clicks the content element under the pointer if
    /// it is the one the button went down on.
    pub fn mouse_up(&mut self, point: Point, button: MouseButton, modifiers: Modifiers) {
        self.select_state = SelectState::Idle;
        let id = self.caret.block;
        let block = &self.blocks[id];
        let index = block.find_element_at(point.x + self.scroll_x, point.y + self.scroll_y - block.ypos);
        let clicked = match self.mouse_down_element.take() {
            Some(pressed) if pressed == (id, index) => block
                .elements
                .get(index)
                .and_then(Element::content)
                .and_then(ElementContent::click_id),
            _ => None,
        };
        if let Some(click_id) = clicked {
            self.notify(|listener| listener.content_clicked(click_id, button, modifiers));
        }
    }

    pub fn mouse_move(&mut self, point: Point) {
        if self.select_state == SelectState::Idle {
            return;
        }
        let to = Point::new(point.x + self.scroll_x, point.y + self.scroll_y);
        self.select_points(self.mouse_down_point, to);
        if self.select_state != SelectState::Words {
            return;
        }
        let initial = self.selection.range;
        if let Some(range) = initial {
            self.place_caret(range.start.block, range.start.ofs as isize);
        }
        self.move_caret(false, true);
        let start = self.caret_pos();
        if let Some(range) = initial {
            self.place_caret(range.stop.block, range.stop.ofs as isize);
        }
        self.move_caret(true, true);
        let stop = self.caret_pos();
        self.selection.range = Some(SelectionRange { start, stop });
        self.correct_selection_order();
        self.invalidate_selection();
        self.update_wanted_x();
    }

    pub fn focus(&mut self, focus: bool) {
        self.notify(|listener| {
            if focus {
                listener.caret_blink_start();
            } else {
                listener.caret_blink_stop();
            }
        });
        self.caret.on = focus;
        self.invalidate_caret();
        self.invalidate_selection();
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    /// Replaces the default style (id 0).
    pub fn set_style(&mut self, style: Rc<Style>) {
        self.styles.set_default(style);
        self.reformat();
    }

    /// Sets the alignment of new blocks and of the block holding the caret.
    pub fn set_align(&mut self, align: Align) {
        if self.align == align {
            return;
        }
        self.align = align;
        let block = self.caret.block;
        self.blocks[block].align = align;
        self.layout_block(block);
        self.update_caret_pos();
    }

    pub fn set_multiline(&mut self, multiline: bool) {
        self.options.multiline = multiline;
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.options.read_only = read_only;
    }

    pub fn set_password(&mut self, password: bool) {
        if self.options.password == password {
            return;
        }
        self.options.password = password;
        self.reformat();
    }

    pub fn set_wrapping(&mut self, wrapping: bool) {
        if self.options.wrapping == wrapping {
            return;
        }
        self.options.wrapping = wrapping;
        self.reformat();
    }

    /// A disabled editor is also read-only.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.options.enabled = enabled;
        self.set_read_only(!enabled);
    }

    pub fn set_show_whitespace(&mut self, show: bool) {
        if self.options.show_whitespace == show {
            return;
        }
        self.options.show_whitespace = show;
        let rect = Rect::new(0, 0, self.layout_width, self.layout_height);
        self.notify(|listener| listener.invalidate(rect));
    }

    pub fn set_snap_line_breaks(&mut self, snap: bool) {
        self.options.snap_line_breaks = snap;
    }

    pub fn set_line_break(&mut self, line_break: LineBreak) {
        self.options.line_break = line_break;
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
