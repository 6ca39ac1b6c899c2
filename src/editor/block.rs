use super::element::{Element, ElementContent, ElementKind};
use super::style::{FontMetrics, StyleRegistry};
use super::text::{
    BULLET, EMBED_MARKER, PASSWORD_CHAR, RunKind, count_markers, is_line_break, next_run,
    sanitize, trailing_break_len,
};
use super::{Align, EditError};

/// Everything layout needs from the editor, borrowed for one pass.
pub(crate) struct LayoutContext<'a> {
    pub styles: &'a StyleRegistry,
    pub metrics: &'a dyn FontMetrics,
    pub layout_width: i32,
    pub wrapping: bool,
    pub password: bool,
}

impl LayoutContext<'_> {
    pub(crate) fn text_width(&self, style_id: usize, text: &[u8]) -> i32 {
        let style = self.styles.get(style_id);
        if self.password {
            style.string_width(self.metrics, &[PASSWORD_CHAR]) * text.len() as i32
        } else {
            style.string_width(self.metrics, text)
        }
    }

    /// Distance from `x` to the next tab stop.
    pub(crate) fn tab_width(&self, style_id: usize, x: i32) -> i32 {
        let size = self.styles.get(style_id).tab_width(self.metrics);
        if size <= 0 {
            return 0;
        }
        size - x.rem_euclid(size)
    }

    pub(crate) fn line_height(&self, style_id: usize) -> i32 {
        self.styles.get(style_id).height(self.metrics)
    }

    pub(crate) fn baseline(&self, style_id: usize) -> i32 {
        self.styles.get(style_id).baseline(self.metrics)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Extent {
    pub width: i32,
    pub height: i32,
}

/// One paragraph: text up to and including its line break.
///
/// `specials` holds the payload of every embed marker in `text`, in marker
/// order. `elements` is the result of the last layout and is rebuilt from
/// scratch every time.
#[derive(Clone, Debug)]
pub struct Block {
    pub(crate) text: Vec<u8>,
    pub(crate) ypos: i32,
    pub(crate) height: i32,
    pub(crate) width: i32,
    pub(crate) align: Align,
    pub(crate) elements: Vec<Element>,
    pub(crate) specials: Vec<ElementContent>,
}

impl Block {
    pub(crate) fn new(align: Align) -> Self {
        Self {
            text: Vec::new(),
            ypos: 0,
            height: 0,
            width: 0,
            align,
            elements: vec![Element::new(0, 0, ElementKind::Text, 0)],
            specials: Vec::new(),
        }
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn ypos(&self) -> i32 {
        self.ypos
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn align(&self) -> Align {
        self.align
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn specials(&self) -> &[ElementContent] {
        &self.specials
    }

    pub fn ends_with_break(&self) -> bool {
        trailing_break_len(&self.text) > 0
    }

    /// Offset where the terminating line break starts, or the length when
    /// there is none.
    pub fn break_start(&self) -> usize {
        self.text.len() - trailing_break_len(&self.text)
    }

    pub(crate) fn insert_bytes(
        &mut self,
        ofs: usize,
        bytes: &[u8],
        allow_embeds: bool,
    ) -> Result<(), EditError> {
        self.text.try_reserve(bytes.len())?;
        self.text.splice(ofs..ofs, bytes.iter().copied());
        sanitize(&mut self.text[ofs..ofs + bytes.len()], allow_embeds);
        Ok(())
    }

    /// Inserts `content` into the special list at the slot matching a marker
    /// placed at `ofs`. The marker byte itself is inserted separately.
    pub(crate) fn insert_special(&mut self, ofs: usize, content: ElementContent) {
        let index = count_markers(&self.text[..ofs]);
        self.specials.insert(index, content);
    }

    /// Specials of the markers in `from..to`.
    pub(crate) fn specials_between(&self, from: usize, to: usize) -> &[ElementContent] {
        let first = count_markers(&self.text[..from]);
        &self.specials[first..first + count_markers(&self.text[from..to])]
    }

    /// Removes `len` bytes at `ofs` together with the specials of every
    /// marker in the range, and returns those specials.
    pub(crate) fn remove_exact(&mut self, ofs: usize, len: usize) -> Vec<ElementContent> {
        let end = (ofs + len).min(self.text.len());
        if ofs >= end {
            return Vec::new();
        }
        let before = count_markers(&self.text[..ofs]);
        let removed = count_markers(&self.text[ofs..end]);
        self.text.drain(ofs..end);
        self.specials.drain(before..before + removed).collect()
    }

    /// Like [`Block::remove_exact`], but when the last removed special
    /// switches style and text follows the range, that switch is put back
    /// where the range was so the following text keeps its style. Returns
    /// the switch put back.
    pub(crate) fn remove_range(&mut self, ofs: usize, len: usize) -> Option<ElementContent> {
        let kept_style = self
            .remove_exact(ofs, len)
            .into_iter()
            .filter(ElementContent::is_style_switch)
            .last()?;
        if ofs >= self.text.len() {
            return None;
        }
        let before = count_markers(&self.text[..ofs]);
        self.specials.insert(before, kept_style.clone());
        self.text.insert(ofs, EMBED_MARKER);
        Some(kept_style)
    }

    /// Detaches everything after the first line break that is not the
    /// block's own terminating break. Returns the detached text and the
    /// specials belonging to it.
    pub(crate) fn split_after_break(&mut self) -> Option<(Vec<u8>, Vec<ElementContent>)> {
        let scan_end = self.break_start();
        let pos = self.text[..scan_end]
            .iter()
            .position(|&ch| is_line_break(ch))?;
        let mut tail_start = pos + 1;
        if self.text[pos] == b'\r' && self.text.get(tail_start) == Some(&b'\n') {
            tail_start += 1;
        }
        let tail = self.text.split_off(tail_start);
        let keep = count_markers(&self.text);
        let specials = self.specials.split_off(keep);
        Some((tail, specials))
    }

    /// Appends the text and specials of the following block. The caller
    /// reserves room for the text first.
    pub(crate) fn absorb(&mut self, other: Block) {
        self.text.extend_from_slice(&other.text);
        self.specials.extend(other.specials);
    }

    /// Element containing `ofs`. An offset on the boundary of two elements
    /// belongs to the first one when `prefer_first` is set.
    pub fn find_element(&self, ofs: usize, prefer_first: bool) -> usize {
        self.elements
            .iter()
            .position(|element| {
                if prefer_first {
                    ofs <= element.end()
                } else {
                    ofs < element.end()
                }
            })
            .unwrap_or(self.elements.len().saturating_sub(1))
    }

    /// Element under a point relative to the block's top left corner. Points
    /// right of a line hit the line's last element, points below all content
    /// hit the block's last element.
    pub fn find_element_at(&self, x: i32, y: i32) -> usize {
        for (index, element) in self.elements.iter().enumerate() {
            if y >= element.line_y + element.line_height {
                continue;
            }
            if x < element.x + element.width {
                return index;
            }
            match self.elements.get(index + 1) {
                Some(next) if next.line_y > element.line_y => return index,
                _ => {}
            }
        }
        self.elements.len().saturating_sub(1)
    }

    /// Horizontal distance from the element start to character `ofs` within
    /// it.
    pub(crate) fn char_x(&self, index: usize, ofs: usize, ctx: &LayoutContext<'_>) -> i32 {
        let element = &self.elements[index];
        let ofs = ofs.min(element.len);
        match element.kind {
            ElementKind::Text => {
                ctx.text_width(element.style_id, &self.text[element.ofs..element.ofs + ofs])
            }
            ElementKind::Break => {
                if ofs == 0 {
                    0
                } else {
                    ctx.text_width(element.style_id, b" ")
                }
            }
            ElementKind::Tab | ElementKind::Embedded(_) => {
                if ofs == 0 {
                    0
                } else {
                    element.width
                }
            }
        }
    }

    /// Character within the element closest to `x` (relative to the element).
    pub(crate) fn char_offset_at(&self, index: usize, x: i32, ctx: &LayoutContext<'_>) -> usize {
        let element = &self.elements[index];
        match element.kind {
            ElementKind::Break => 0,
            ElementKind::Tab | ElementKind::Embedded(_) => usize::from(x > element.width / 2),
            ElementKind::Text => {
                let text = &self.text[element.ofs..element.end()];
                for i in 0..text.len() {
                    let w = ctx.text_width(element.style_id, &text[..i]);
                    let cw = ctx.text_width(element.style_id, &text[i..i + 1]);
                    if x < w + cw / 2 {
                        return i;
                    }
                }
                text.len()
            }
        }
    }

    /// Word-wraps the text into elements and returns the block's size.
    pub(crate) fn layout(&mut self, ctx: &LayoutContext<'_>) -> Extent {
        let mut builder = LineBuilder::new(ctx, &self.text, self.align);
        let mut special_index = 0;
        let mut ofs = 0;
        while let Some(run) = next_run(&self.text[ofs..]) {
            match run.kind {
                RunKind::Break => {
                    builder.commit_text(ofs);
                    let style_id = builder.style_id;
                    let mut element = Element::new(ofs, run.len, ElementKind::Break, style_id);
                    element.x = builder.line_w;
                    element.height = ctx.line_height(style_id);
                    element.baseline = ctx.baseline(style_id);
                    builder.push(element);
                    builder.pending = ofs + run.len;
                }
                RunKind::Tab => {
                    let mut width = ctx.tab_width(builder.style_id, builder.line_w);
                    if builder.overflows(width) {
                        builder.wrap(ofs);
                        width = ctx.tab_width(builder.style_id, builder.line_w);
                    }
                    builder.commit_text(ofs);
                    let style_id = builder.style_id;
                    let mut element = Element::new(ofs, 1, ElementKind::Tab, style_id);
                    element.width = width;
                    element.height = ctx.line_height(style_id);
                    element.baseline = ctx.baseline(style_id);
                    builder.push_inline(element, ofs + 1);
                }
                RunKind::Embedded => {
                    let content = match self.specials.get(special_index) {
                        Some(content) => content.clone(),
                        None => {
                            debug_assert!(false, "embed marker without special element");
                            tracing::warn!(ofs, "embed marker without special element");
                            ElementContent::StyleSwitch {
                                style_id: builder.style_id,
                            }
                        }
                    };
                    special_index += 1;
                    let width = content.width(ctx.layout_width);
                    if builder.overflows(width) {
                        builder.wrap(ofs);
                    }
                    builder.commit_text(ofs);
                    let next_style = match content {
                        ElementContent::StyleSwitch { style_id } => Some(style_id),
                        _ => None,
                    };
                    let mut element = Element::new(ofs, 1, ElementKind::Embedded(content), builder.style_id);
                    element.width = width;
                    element.height = element.content().map_or(0, ElementContent::height);
                    element.baseline = element.content().map_or(0, ElementContent::baseline);
                    builder.push_inline(element, ofs + 1);
                    if let Some(style_id) = next_style {
                        builder.style_id = style_id;
                    }
                }
                RunKind::Word => {
                    let style_id = builder.style_id;
                    let word_w = ctx.text_width(style_id, &self.text[ofs..ofs + run.len]);
                    let seg_w = ctx.text_width(style_id, &self.text[ofs..ofs + run.seg_len]);
                    if builder.overflows(word_w) {
                        builder.wrap(ofs);
                    }
                    builder.visible_w = builder.line_w + word_w;
                    builder.line_w += seg_w;
                }
            }
            ofs += run.seg_len;
        }
        let (elements, extent) = builder.finish();
        self.elements = elements;
        extent
    }
}

/// Width of leading tabs, spaces and list bullets. Wrapped lines start at
/// this indentation so lists and indented code stay aligned.
pub(crate) fn start_indentation(text: &[u8], ctx: &LayoutContext<'_>) -> i32 {
    let mut indentation = 0;
    for &ch in text {
        match ch {
            b'\t' => indentation += ctx.tab_width(0, indentation),
            b' ' | b'-' | b'*' | BULLET => indentation += ctx.text_width(0, &[ch]),
            _ => break,
        }
    }
    indentation
}

/// Accumulates elements of the visual line being laid out. Text is kept
/// pending until something forces a commit (a tab, marker, break, wrap or
/// the end of the block) and then becomes a single element.
struct LineBuilder<'a, 'b> {
    ctx: &'b LayoutContext<'a>,
    text: &'b [u8],
    align: Align,
    elements: Vec<Element>,
    line_start: usize,
    line_y: i32,
    line_height: i32,
    line_baseline: i32,
    line_indent: i32,
    line_w: i32,
    visible_w: i32,
    pending: usize,
    pending_x: i32,
    style_id: usize,
    wrap_indent: Option<i32>,
    max_w: i32,
}

impl<'a, 'b> LineBuilder<'a, 'b> {
    fn new(ctx: &'b LayoutContext<'a>, text: &'b [u8], align: Align) -> Self {
        Self {
            ctx,
            text,
            align,
            elements: Vec::new(),
            line_start: 0,
            line_y: 0,
            line_height: 0,
            line_baseline: 0,
            line_indent: 0,
            line_w: 0,
            visible_w: 0,
            pending: 0,
            pending_x: 0,
            style_id: 0,
            wrap_indent: None,
            max_w: 0,
        }
    }

    /// A run of `width` does not fit, unless the line holds nothing but its
    /// indentation: a word wider than the line is never split.
    fn overflows(&self, width: i32) -> bool {
        self.ctx.wrapping
            && self.line_w + width > self.ctx.layout_width
            && self.line_w > self.line_indent
    }

    fn push(&mut self, element: Element) {
        self.line_height = self.line_height.max(element.height);
        self.line_baseline = self.line_baseline.max(element.baseline);
        self.elements.push(element);
    }

    /// Pushes a fixed-width element at the end of the line and continues
    /// pending text after it.
    fn push_inline(&mut self, mut element: Element, resume: usize) {
        element.x = self.line_w;
        self.line_w += element.width;
        self.visible_w = self.line_w;
        self.push(element);
        self.pending = resume;
        self.pending_x = self.line_w;
    }

    fn commit_text(&mut self, end: usize) {
        if end <= self.pending {
            return;
        }
        let style_id = self.style_id;
        let mut element = Element::new(self.pending, end - self.pending, ElementKind::Text, style_id);
        element.x = self.pending_x;
        element.width = self.ctx.text_width(style_id, &self.text[self.pending..end]);
        element.height = self.ctx.line_height(style_id);
        element.baseline = self.ctx.baseline(style_id);
        self.pending_x += element.width;
        self.pending = end;
        self.push(element);
    }

    fn wrap(&mut self, at: usize) {
        self.commit_text(at);
        self.finish_line();
        self.line_y += self.line_height;
        self.line_start = self.elements.len();
        self.line_height = 0;
        self.line_baseline = 0;
        let (ctx, text) = (self.ctx, self.text);
        let indent = *self
            .wrap_indent
            .get_or_insert_with(|| start_indentation(text, ctx));
        self.line_indent = indent;
        self.line_w = indent;
        self.visible_w = indent;
        self.pending_x = indent;
    }

    /// Aligns the finished line horizontally and puts all its elements on a
    /// common baseline.
    fn finish_line(&mut self) {
        if self.line_height == 0 {
            self.line_height = self.ctx.line_height(self.style_id);
        }
        let free = self.ctx.layout_width - self.visible_w;
        let x_offset = match self.align {
            Align::Left => 0,
            Align::Right => free.max(0),
            Align::Center => (free / 2).max(0),
        };
        for element in &mut self.elements[self.line_start..] {
            element.line_y = self.line_y;
            element.line_height = self.line_height;
            element.y = self.line_y + self.line_baseline - element.baseline;
            element.x += x_offset;
        }
        self.max_w = self.max_w.max(self.visible_w);
    }

    fn finish(mut self) -> (Vec<Element>, Extent) {
        self.commit_text(self.text.len());
        if self.elements.len() == self.line_start {
            let style_id = self.style_id;
            let mut element = Element::new(self.pending, 0, ElementKind::Text, style_id);
            element.x = self.pending_x;
            element.height = self.ctx.line_height(style_id);
            element.baseline = self.ctx.baseline(style_id);
            self.push(element);
        }
        self.finish_line();
        let extent = Extent {
            width: self.max_w,
            height: self.line_y + self.line_height,
        };
        (self.elements, extent)
    }
}
