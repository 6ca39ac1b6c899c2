use super::element::ElementContent;
use super::text::{EMBED_MARKER, is_space, is_undo_whitespace};
use super::{EditError, StyleEdit};

/// One atomic change, addressed by document-wide offset. `specials` holds
/// the payload of every embed marker in `text`, in marker order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoEvent {
    pub gofs: usize,
    pub text: Vec<u8>,
    pub specials: Vec<ElementContent>,
    pub insert: bool,
}

#[derive(Clone, Debug, Default)]
pub struct UndoRedoStack {
    undos: Vec<UndoEvent>,
    redos: Vec<UndoEvent>,
    applying: bool,
}

impl UndoRedoStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn undos(&self) -> &[UndoEvent] {
        &self.undos
    }

    pub fn redos(&self) -> &[UndoEvent] {
        &self.redos
    }

    pub fn can_undo(&self) -> bool {
        !self.undos.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redos.is_empty()
    }

    pub fn is_applying(&self) -> bool {
        self.applying
    }

    pub fn clear(&mut self, clear_undo: bool, clear_redo: bool) {
        debug_assert!(!self.applying, "history cleared while replaying it");
        if clear_undo {
            self.undos.clear();
        }
        if clear_redo {
            self.redos.clear();
        }
    }

    /// Records a change of plain text. A single typed character directly
    /// after the text of the previous insert is appended to it, as long as
    /// whitespace only joins whitespace and other characters only join other
    /// characters.
    pub fn commit(&mut self, gofs: usize, text: &[u8], insert: bool, read_only: bool) -> bool {
        self.commit_with(gofs, text, Vec::new(), insert, read_only)
    }

    /// Records a change whose text may hold embed markers. Events carrying
    /// markers never coalesce.
    pub fn commit_with(
        &mut self,
        gofs: usize,
        text: &[u8],
        specials: Vec<ElementContent>,
        insert: bool,
        read_only: bool,
    ) -> bool {
        if self.applying || read_only {
            return false;
        }
        self.redos.clear();

        if let ([ch], true, Some(last)) = (text, insert, self.undos.last_mut()) {
            let adjacent = last.insert && last.gofs + last.text.len() == gofs;
            let plain = *ch != EMBED_MARKER && last.specials.is_empty();
            let joins_spaces = is_space(*ch) && last.text.iter().all(|&c| is_space(c));
            let joins_word = !is_undo_whitespace(*ch)
                && !last.text.iter().any(|&c| is_undo_whitespace(c));
            if adjacent && plain && (joins_spaces || joins_word) {
                last.text.push(*ch);
                return true;
            }
        }

        self.undos.push(UndoEvent {
            gofs,
            text: text.to_vec(),
            specials,
            insert,
        });
        true
    }
}

impl StyleEdit {
    pub fn undo_redo(&self) -> &UndoRedoStack {
        &self.undo_redo
    }

    pub fn undo(&mut self) -> Result<(), EditError> {
        let Some(event) = self.undo_redo.undos.pop() else {
            return Ok(());
        };
        tracing::debug!(gofs = event.gofs, len = event.text.len(), insert = event.insert, "undo");
        self.undo_redo.redos.push(event.clone());
        self.apply_undo_event(&event, true)
    }

    pub fn redo(&mut self) -> Result<(), EditError> {
        let Some(event) = self.undo_redo.redos.pop() else {
            return Ok(());
        };
        tracing::debug!(gofs = event.gofs, len = event.text.len(), insert = event.insert, "redo");
        self.undo_redo.undos.push(event.clone());
        self.apply_undo_event(&event, false)
    }

    /// Replays `event`, inverted when `reverse` is set: undoing an insert
    /// and redoing a delete both remove the recorded text.
    fn apply_undo_event(&mut self, event: &UndoEvent, reverse: bool) -> Result<(), EditError> {
        self.undo_redo.applying = true;
        self.select_nothing();
        let result = if event.insert == reverse {
            self.set_caret_global_ofs(event.gofs);
            let start = self.caret_pos();
            self.set_caret_global_ofs(event.gofs + event.text.len());
            let stop = self.caret_pos();
            self.select(start, stop);
            self.remove_selection()
        } else {
            self.reinsert(event.gofs, &event.text, &event.specials)
        };
        self.undo_redo.applying = false;
        self.notify(|listener| listener.on_change());
        result
    }

    /// Puts recorded bytes back at `gofs`, each marker together with its
    /// special, and leaves the caret after them.
    fn reinsert(
        &mut self,
        gofs: usize,
        text: &[u8],
        specials: &[ElementContent],
    ) -> Result<(), EditError> {
        let mut specials = specials.iter();
        let mut at = gofs;
        let mut rest = text;
        while let Some(&first) = rest.first() {
            self.set_caret_global_ofs(at);
            let (block, ofs) = (self.caret.block, self.caret.ofs);
            if first == EMBED_MARKER {
                let content = match specials.next() {
                    Some(content) => content.clone(),
                    None => {
                        tracing::warn!(at, "recorded marker without special element");
                        ElementContent::StyleSwitch { style_id: 0 }
                    }
                };
                self.insert_embedded_at(block, ofs, content)?;
                at += 1;
                rest = &rest[1..];
            } else {
                let len = rest
                    .iter()
                    .position(|&ch| ch == EMBED_MARKER)
                    .unwrap_or(rest.len());
                let consumed = self.insert_into_block(block, ofs, &rest[..len], false)?;
                at += consumed;
                if consumed < len {
                    break;
                }
                rest = &rest[len..];
            }
        }
        self.set_caret_global_ofs(at);
        self.advance_past_line_break();
        self.update_wanted_x();
        Ok(())
    }
}
