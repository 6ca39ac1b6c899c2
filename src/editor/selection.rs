use super::element::{Element, ElementContent};
use super::listener::Point;
use super::text::EMBED_MARKER;
use super::{BlockId, EditError, StyleEdit};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextPos {
    pub block: BlockId,
    pub ofs: usize,
}

impl TextPos {
    pub const fn new(block: BlockId, ofs: usize) -> Self {
        Self { block, ofs }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: TextPos,
    pub stop: TextPos,
}

/// Selected range, `start` never after `stop` once an operation finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    pub(crate) range: Option<SelectionRange>,
}

impl Selection {
    pub fn is_selected(&self) -> bool {
        self.range.is_some()
    }

    pub fn range(&self) -> Option<SelectionRange> {
        self.range
    }
}

impl StyleEdit {
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub(crate) fn caret_pos(&self) -> TextPos {
        TextPos::new(self.caret.block, self.caret.ofs)
    }

    /// Swaps reversed endpoints and drops an empty selection. The end of a
    /// block and the start of the next one count as the same position.
    pub(crate) fn correct_selection_order(&mut self) {
        let Some(range) = self.selection.range else {
            return;
        };
        let start = self.global_ofs(range.start.block, range.start.ofs);
        let stop = self.global_ofs(range.stop.block, range.stop.ofs);
        if start == stop {
            self.selection.range = None;
        } else if start > stop {
            self.selection.range = Some(SelectionRange {
                start: range.stop,
                stop: range.start,
            });
        }
    }

    pub fn select(&mut self, start: TextPos, stop: TextPos) {
        self.invalidate_selection();
        self.selection.range = Some(SelectionRange { start, stop });
        self.correct_selection_order();
        self.invalidate_selection();
    }

    /// Selects between two points in document coordinates. The caret ends
    /// up at `to`.
    pub fn select_points(&mut self, from: Point, to: Point) {
        self.invalidate_selection();
        self.place_caret_at_point(from);
        let start = self.caret_pos();
        self.place_caret_at_point(to);
        let stop = self.caret_pos();
        self.selection.range = Some(SelectionRange { start, stop });
        self.correct_selection_order();
        self.invalidate_selection();
        self.update_wanted_x();
    }

    /// Extends the selection to the caret, anchored at the caret position
    /// before the move.
    pub(crate) fn select_to_caret(&mut self, old_caret: TextPos) {
        self.invalidate_selection();
        let caret = self.caret_pos();
        self.selection.range = Some(match self.selection.range {
            None => SelectionRange {
                start: old_caret,
                stop: caret,
            },
            Some(range) if range.start == old_caret => SelectionRange {
                start: caret,
                stop: range.stop,
            },
            Some(range) => SelectionRange {
                start: range.start,
                stop: caret,
            },
        });
        self.correct_selection_order();
        self.invalidate_selection();
    }

    pub fn select_all(&mut self) {
        let (Some(first), Some(last)) = (self.blocks.first(), self.blocks.last()) else {
            return;
        };
        let stop = TextPos::new(last, self.blocks[last].len());
        self.selection.range = Some(SelectionRange {
            start: TextPos::new(first, 0),
            stop,
        });
        self.correct_selection_order();
        self.invalidate_selection();
    }

    pub fn select_nothing(&mut self) {
        self.invalidate_selection();
        self.selection.range = None;
    }

    pub(crate) fn invalidate_selection(&mut self) {
        let Some(range) = self.selection.range else {
            return;
        };
        let mut current = Some(range.start.block);
        while let Some(block) = current {
            self.invalidate_block(block);
            if block == range.stop.block {
                break;
            }
            current = self.blocks.next(block);
        }
    }

    /// Byte range of `block` covered by the selection.
    pub(crate) fn selected_range_in(&self, block: BlockId) -> Option<(usize, usize)> {
        let range = self.selection.range?;
        let len = self.blocks[block].len();
        if range.start.block == range.stop.block {
            return (block == range.start.block).then_some((range.start.ofs, range.stop.ofs));
        }
        if block == range.start.block {
            return Some((range.start.ofs, len));
        }
        if block == range.stop.block {
            return Some((0, range.stop.ofs));
        }
        let ypos = self.blocks[block].ypos;
        let between = ypos > self.blocks[range.start.block].ypos
            && ypos < self.blocks[range.stop.block].ypos;
        between.then_some((0, len))
    }

    pub fn is_element_selected(&self, block: BlockId, element: &Element) -> bool {
        self.selected_range_in(block)
            .is_some_and(|(start, stop)| start < element.end() && element.ofs < stop)
    }

    /// Selected bytes, embed markers included.
    pub fn selected_text(&self) -> Vec<u8> {
        self.selected_content().0
    }

    /// Selected bytes and the specials of the markers among them.
    pub(crate) fn selected_content(&self) -> (Vec<u8>, Vec<ElementContent>) {
        let mut text = Vec::new();
        let mut specials = Vec::new();
        let Some(range) = self.selection.range else {
            return (text, specials);
        };
        let mut current = Some(range.start.block);
        while let Some(block) = current {
            let b = &self.blocks[block];
            let from = if block == range.start.block { range.start.ofs } else { 0 };
            let to = if block == range.stop.block { range.stop.ofs } else { b.len() };
            text.extend_from_slice(&b.text()[from..to]);
            specials.extend_from_slice(b.specials_between(from, to));
            if block == range.stop.block {
                break;
            }
            current = self.blocks.next(block);
        }
        (text, specials)
    }

    /// Deletes the selected range and leaves the caret where it started.
    /// The removal is recorded as a single undo event, followed by an
    /// insert event when a removed style switch had to stay behind.
    ///
    /// Replaying history removes exactly the selected bytes.
    pub(crate) fn remove_selection(&mut self) -> Result<(), EditError> {
        let Some(range) = self.selection.range else {
            return Ok(());
        };
        let stop = range.stop;
        // A start after a line break is the start of the next block.
        let start = {
            let (block, ofs) = self.normalize_insert_pos(range.start.block, range.start.ofs);
            TextPos::new(block, ofs)
        };
        let recording = !self.undo_redo.is_applying();
        let gofs = self.global_ofs(start.block, start.ofs);
        if recording {
            let (removed, specials) = self.selected_content();
            self.undo_redo
                .commit_with(gofs, &removed, specials, false, self.options.read_only);
        }
        let kept = if start.block == stop.block {
            self.remove_from_block(start.block, start.ofs, stop.ofs - start.ofs, recording)
        } else {
            let start_len = self.blocks[start.block].len();
            self.blocks[start.block].remove_exact(start.ofs, start_len - start.ofs);
            while let Some(next) = self.blocks.next(start.block) {
                if next == stop.block {
                    break;
                }
                self.invalidate_block(next);
                self.blocks.remove(next);
            }
            let kept = self.remove_from_block(stop.block, 0, stop.ofs, recording);
            self.layout_block(start.block);
            kept
        };
        if let Some(style) = kept {
            self.undo_redo.commit_with(
                gofs,
                &[EMBED_MARKER],
                vec![style],
                true,
                self.options.read_only,
            );
        }
        self.merge_block(start.block)?;
        self.selection.range = None;
        self.place_caret(start.block, start.ofs as isize);
        self.update_wanted_x();
        Ok(())
    }
}
