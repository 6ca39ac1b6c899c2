use super::block::{Block, Extent, LayoutContext};
use super::element::ElementContent;
use super::listener::Rect;
use super::text::{EMBED_MARKER, first_line_len};
use super::{BlockId, EditError, StyleEdit};

// ============================================================================
// Block structure: insertion, removal, split and merge
// ============================================================================

impl StyleEdit {
    /// A position right after a block's terminating break is the same place
    /// as the start of the following block. Content always goes there.
    pub(crate) fn normalize_insert_pos(&self, block: BlockId, ofs: usize) -> (BlockId, usize) {
        let b = &self.blocks[block];
        if ofs >= b.len() && b.ends_with_break() {
            if let Some(next) = self.blocks.next(block) {
                return (next, 0);
            }
        }
        (block, ofs.min(b.len()))
    }

    /// Inserts `text` at `ofs`. In multiline mode every line after the first
    /// goes into the following blocks, which are created as needed. Returns
    /// the number of bytes consumed; in single-line mode that stops before
    /// the first line break.
    pub(crate) fn insert_into_block(
        &mut self,
        block: BlockId,
        ofs: usize,
        text: &[u8],
        allow_embeds: bool,
    ) -> Result<usize, EditError> {
        if text.is_empty() {
            return Ok(0);
        }
        let (block, ofs) = self.normalize_insert_pos(block, ofs);
        let mut consumed = self.insert_line(block, ofs, text, allow_embeds)?;
        if self.options.multiline {
            let mut next = self.blocks.next(block);
            while consumed < text.len() {
                let target = match next {
                    Some(target) => target,
                    None => self.blocks.push_back(Block::new(self.align)),
                };
                consumed += self.insert_line(target, 0, &text[consumed..], allow_embeds)?;
                next = self.blocks.next(target);
            }
        }
        self.ensure_open_last_block();
        Ok(consumed)
    }

    fn insert_line(
        &mut self,
        block: BlockId,
        ofs: usize,
        text: &[u8],
        allow_embeds: bool,
    ) -> Result<usize, EditError> {
        let len = first_line_len(text, self.options.multiline);
        self.blocks[block].insert_bytes(ofs, &text[..len], allow_embeds)?;
        self.split_block(block);
        Ok(len)
    }

    pub(crate) fn insert_embedded_at(
        &mut self,
        block: BlockId,
        ofs: usize,
        content: ElementContent,
    ) -> Result<(), EditError> {
        let (block, ofs) = self.normalize_insert_pos(block, ofs);
        let b = &mut self.blocks[block];
        b.insert_bytes(ofs, &[EMBED_MARKER], true)?;
        b.insert_special(ofs, content);
        self.layout_block(block);
        Ok(())
    }

    /// The last block never ends with a line break; a break typed at the
    /// very end opens a new, empty block.
    fn ensure_open_last_block(&mut self) {
        let Some(last) = self.blocks.last() else {
            return;
        };
        if self.blocks[last].ends_with_break() {
            let id = self.blocks.push_back(Block::new(self.align));
            self.layout_block(id);
        }
    }

    /// Removes `len` bytes at `ofs`. With `keep_style` a removed style
    /// switch may be put back at `ofs`; it is returned in that case.
    pub(crate) fn remove_from_block(
        &mut self,
        block: BlockId,
        ofs: usize,
        len: usize,
        keep_style: bool,
    ) -> Option<ElementContent> {
        let kept = if keep_style {
            self.blocks[block].remove_range(ofs, len)
        } else {
            self.blocks[block].remove_exact(ofs, len);
            None
        };
        self.layout_block(block);
        kept
    }

    /// Moves everything after each interior line break into a new block
    /// following `block`, then lays out every block touched.
    pub(crate) fn split_block(&mut self, block: BlockId) {
        let mut current = block;
        while let Some((text, specials)) = self.blocks[current].split_after_break() {
            let mut tail = Block::new(self.blocks[current].align);
            tail.text = text;
            tail.specials = specials;
            self.layout_block(current);
            current = self.blocks.insert_after(current, tail);
        }
        self.layout_block(current);
    }

    /// Absorbs following blocks while `block` has no terminating line
    /// break. Their specials move along with their text.
    pub(crate) fn merge_block(&mut self, block: BlockId) -> Result<(), EditError> {
        let mut merged = false;
        while !self.blocks[block].ends_with_break() {
            let Some(next) = self.blocks.next(block) else {
                break;
            };
            let additional = self.blocks[next].len();
            self.blocks[block].text.try_reserve(additional)?;
            self.invalidate_block(next);
            let absorbed = self.blocks.remove(next);
            self.blocks[block].absorb(absorbed);
            merged = true;
        }
        if merged {
            self.layout_block(block);
            self.refresh_positions(block);
        }
        Ok(())
    }

    /// Re-lays out one block and moves the following blocks when its height
    /// changed.
    pub(crate) fn layout_block(&mut self, block: BlockId) {
        let ypos = match self.blocks.prev(block) {
            Some(prev) => self.blocks[prev].ypos + self.blocks[prev].height,
            None => 0,
        };
        let ctx = LayoutContext {
            styles: &self.styles,
            metrics: self.metrics.as_ref(),
            layout_width: self.layout_width,
            wrapping: self.options.wrapping,
            password: self.options.password,
        };
        let b = &mut self.blocks[block];
        b.ypos = ypos;
        let extent = b.layout(&ctx);
        tracing::trace!(
            ?block,
            len = b.len(),
            elements = b.elements.len(),
            width = extent.width,
            height = extent.height,
            "laid out block"
        );
        self.set_block_size(block, extent, true);
    }

    pub(crate) fn set_block_size(&mut self, block: BlockId, extent: Extent, propagate: bool) {
        let b = &mut self.blocks[block];
        let dh = extent.height - b.height;
        b.height = extent.height;
        b.width = extent.width;
        self.invalidate_block(block);
        if self.options.multiline || self.options.wrapping {
            self.content_width = self.content_width.max(extent.width);
        } else {
            self.content_width = extent.width;
        }
        if dh != 0 && propagate {
            self.refresh_positions(block);
        } else {
            self.update_content_size();
        }
    }

    /// Recomputes the y position of every block after `block`.
    pub(crate) fn refresh_positions(&mut self, block: BlockId) {
        let mut prev = block;
        while let Some(id) = self.blocks.next(prev) {
            self.blocks[id].ypos = self.blocks[prev].ypos + self.blocks[prev].height;
            self.invalidate_block(id);
            prev = id;
        }
        self.update_content_size();
    }

    /// Invalidates the area uncovered when the content got shorter and tells
    /// the host about scrollbar changes.
    pub(crate) fn update_content_size(&mut self) {
        let Some(last) = self.blocks.last() else {
            return;
        };
        let height = self.blocks[last].ypos + self.blocks[last].height;
        let dbottom = height - self.content_height;
        if dbottom < 0 {
            let rect = Rect::new(0, height - self.scroll_y, self.layout_width, -dbottom);
            self.notify(|listener| listener.invalidate(rect));
        }
        if dbottom != 0 {
            self.notify(|listener| listener.update_scrollbars());
        }
        self.content_height = height;
    }

    pub(crate) fn invalidate_block(&mut self, block: BlockId) {
        let b = &self.blocks[block];
        let rect = Rect::new(0, b.ypos - self.scroll_y, self.layout_width, b.height);
        self.notify(|listener| listener.invalidate(rect));
    }
}
