use super::block::LayoutContext;
use super::listener::{Point, Rect};
use super::text::is_word_break;
use super::{BlockId, StyleEdit};

const CARET_WIDTH: i32 = 2;

/// Insertion point as a block and an offset into its text, plus the pixel
/// rectangle derived from the current layout.
#[derive(Clone, Debug)]
pub struct Caret {
    pub(crate) block: BlockId,
    pub(crate) ofs: usize,
    pub(crate) x: i32,
    pub(crate) y: i32,
    pub(crate) width: i32,
    pub(crate) height: i32,
    /// Column vertical movement tries to return to.
    pub(crate) wanted_x: i32,
    /// Which element owns an offset sitting exactly between two of them.
    pub(crate) prefer_first: bool,
    pub(crate) on: bool,
}

impl Caret {
    pub(crate) fn new(block: BlockId) -> Self {
        Self {
            block,
            ofs: 0,
            x: 0,
            y: 0,
            width: CARET_WIDTH,
            height: 0,
            wanted_x: 0,
            prefer_first: true,
            on: false,
        }
    }

    pub fn block(&self) -> BlockId {
        self.block
    }

    pub fn ofs(&self) -> usize {
        self.ofs
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn wanted_x(&self) -> i32 {
        self.wanted_x
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl StyleEdit {
    pub fn caret(&self) -> &Caret {
        &self.caret
    }

    /// Index of the element the caret is drawn in.
    pub(crate) fn caret_element(&self) -> usize {
        self.blocks[self.caret.block].find_element(self.caret.ofs, self.caret.prefer_first)
    }

    pub(crate) fn layout_context(&self) -> LayoutContext<'_> {
        LayoutContext {
            styles: &self.styles,
            metrics: self.metrics.as_ref(),
            layout_width: self.layout_width,
            wrapping: self.options.wrapping,
            password: self.options.password,
        }
    }

    pub(crate) fn update_caret_pos(&mut self) {
        self.invalidate_caret();
        let (x, y, height) = {
            let block = &self.blocks[self.caret.block];
            let index = self.caret_element();
            let element = &block.elements[index];
            let ctx = self.layout_context();
            let x = element.x + block.char_x(index, self.caret.ofs - element.ofs, &ctx);
            if element.height > 0 {
                (x, block.ypos + element.y, element.height)
            } else {
                (x, block.ypos + element.line_y, element.line_height)
            }
        };
        self.caret.x = x;
        self.caret.y = y;
        self.caret.height = height;
        self.invalidate_caret();
    }

    pub(crate) fn update_wanted_x(&mut self) {
        self.caret.wanted_x = self.caret.x;
    }

    pub(crate) fn invalidate_caret(&mut self) {
        let rect = Rect::new(
            self.caret.x - self.scroll_x,
            self.caret.y - self.scroll_y,
            self.caret.width,
            self.caret.height,
        );
        self.notify(|listener| listener.invalidate(rect));
    }

    pub(crate) fn reset_blink(&mut self) {
        self.caret.on = true;
        self.notify(|listener| {
            listener.caret_blink_stop();
            listener.caret_blink_start();
        });
    }

    /// Moves one character, or one word when `word` is set and the document
    /// is not masked. A CR LF pair counts as one character. Returns whether
    /// the position changed.
    pub(crate) fn move_caret(&mut self, forward: bool, word: bool) -> bool {
        self.caret.prefer_first = forward;
        let word = word && !self.options.password;
        let mut block = self.caret.block;
        let text = self.blocks[block].text();
        let len = text.len();
        let mut ofs = self.caret.ofs as isize;
        let at_edge = if forward { self.caret.ofs == len } else { self.caret.ofs == 0 };
        if word && !at_edge {
            let mut i = self.caret.ofs;
            if forward {
                while i < len && !is_word_break(text[i]) {
                    i += 1;
                }
                while i < len && is_word_break(text[i]) {
                    i += 1;
                }
            } else {
                while i > 0 && is_word_break(text[i - 1]) {
                    i -= 1;
                }
                while i > 0 && !is_word_break(text[i - 1]) {
                    i -= 1;
                }
            }
            ofs = i as isize;
        } else {
            let i = self.caret.ofs;
            let crlf_ahead = forward && text.get(i) == Some(&b'\r') && text.get(i + 1) == Some(&b'\n');
            let crlf_behind = !forward && i >= 2 && &text[i - 2..i] == b"\r\n";
            let step = if crlf_ahead || crlf_behind { 2 } else { 1 };
            ofs += if forward { step } else { -step };
            if ofs > len as isize {
                if let Some(next) = self.blocks.next(block) {
                    block = next;
                    ofs = 0;
                }
            }
            if ofs < 0 {
                if let Some(prev) = self.blocks.prev(block) {
                    block = prev;
                    ofs = self.blocks[prev].len() as isize;
                }
            }
        }
        self.place_caret_snapped(block, ofs, true, forward)
    }

    /// Places the caret at the character closest to `point` (document
    /// coordinates).
    pub(crate) fn place_caret_at_point(&mut self, point: Point) -> bool {
        let block = self.find_block_at(point.y);
        let (index, ofs) = {
            let b = &self.blocks[block];
            let index = b.find_element_at(point.x, point.y - b.ypos);
            let element = &b.elements[index];
            let ctx = self.layout_context();
            (index, element.ofs + b.char_offset_at(index, point.x - element.x, &ctx))
        };
        let changed = self.place_caret(block, ofs as isize);
        if self.caret_element() != index {
            self.caret.prefer_first = !self.caret.prefer_first;
            self.place_caret(block, ofs as isize);
        }
        changed
    }

    pub(crate) fn place_caret(&mut self, block: BlockId, ofs: isize) -> bool {
        self.place_caret_snapped(block, ofs, false, false)
    }

    /// Places the caret, carrying offsets past either end of `block` into
    /// the neighbouring blocks and clamping at the document bounds.
    pub(crate) fn place_caret_snapped(
        &mut self,
        mut block: BlockId,
        mut ofs: isize,
        allow_snap: bool,
        snap_forward: bool,
    ) -> bool {
        while ofs > self.blocks[block].len() as isize {
            let Some(next) = self.blocks.next(block) else {
                break;
            };
            ofs -= self.blocks[block].len() as isize;
            block = next;
        }
        while ofs < 0 {
            let Some(prev) = self.blocks.prev(block) else {
                break;
            };
            block = prev;
            ofs += self.blocks[block].len() as isize;
        }
        let mut ofs = ofs.clamp(0, self.blocks[block].len() as isize) as usize;

        if allow_snap && self.options.snap_line_breaks {
            let b = &self.blocks[block];
            let element = &b.elements[b.find_element(ofs, self.caret.prefer_first)];
            if ofs > element.ofs && element.is_break() {
                match self.blocks.next(block) {
                    Some(next) if snap_forward => {
                        block = next;
                        ofs = 0;
                    }
                    _ => ofs = element.ofs,
                }
            }
        }

        let changed = self.caret.block != block || self.caret.ofs != ofs;
        self.caret.block = block;
        self.caret.ofs = ofs;
        self.update_caret_pos();
        changed
    }

    pub(crate) fn place_caret_at_start(&mut self) {
        if let Some(first) = self.blocks.first() {
            self.place_caret(first, 0);
        }
    }

    pub(crate) fn place_caret_at_end(&mut self) {
        if let Some(last) = self.blocks.last() {
            let len = self.blocks[last].len();
            self.place_caret(last, len as isize);
        }
    }

    /// Moves a caret that ended up right after a block's line break to the
    /// start of the next block, where typing continues.
    pub(crate) fn advance_past_line_break(&mut self) {
        let (block, ofs) = self.normalize_insert_pos(self.caret.block, self.caret.ofs);
        if block != self.caret.block {
            self.caret.prefer_first = true;
            self.place_caret(block, ofs as isize);
        }
    }

    pub(crate) fn find_block_at(&self, y: i32) -> BlockId {
        self.blocks
            .iter()
            .find(|(_, block)| y < block.ypos + block.height)
            .map(|(id, _)| id)
            .or(self.blocks.last())
            .unwrap_or(self.caret.block)
    }

    pub fn global_ofs(&self, block: BlockId, ofs: usize) -> usize {
        self.blocks
            .iter()
            .take_while(|(id, _)| *id != block)
            .map(|(_, b)| b.len())
            .sum::<usize>()
            + ofs
    }

    pub fn caret_global_ofs(&self) -> usize {
        self.global_ofs(self.caret.block, self.caret.ofs)
    }

    /// Places the caret at a document-wide offset. A boundary between two
    /// blocks resolves to the end of the earlier one.
    ///
    /// # Panics
    ///
    /// Panics when `gofs` is past the end of the document.
    pub fn set_caret_global_ofs(&mut self, gofs: usize) {
        let mut remaining = gofs;
        let mut target = None;
        for (id, block) in self.blocks.iter() {
            if remaining <= block.len() {
                target = Some(id);
                break;
            }
            remaining -= block.len();
        }
        match target {
            Some(id) => {
                self.place_caret(id, remaining as isize);
            }
            None => panic!("global offset {gofs} is outside the document"),
        }
    }
}
