use super::listener::Rect;

/// Payload carried by an embed marker in a block's text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementContent {
    /// Text after the marker is drawn with the registered style `style_id`.
    StyleSwitch { style_id: usize },
    InlineBox(InlineBox),
    HorizontalRule(HorizontalRule),
}

/// Opaque inline object of fixed size, painted and clicked by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InlineBox {
    pub id: u32,
    pub width: i32,
    pub height: i32,
    pub baseline: i32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HorizontalRule {
    pub width_percent: i32,
    pub height: i32,
    pub color: u32,
}

impl ElementContent {
    pub fn width(&self, layout_width: i32) -> i32 {
        match self {
            ElementContent::StyleSwitch { .. } => 0,
            ElementContent::InlineBox(inline) => inline.width,
            ElementContent::HorizontalRule(_) => layout_width.max(0),
        }
    }

    pub fn height(&self) -> i32 {
        match self {
            ElementContent::StyleSwitch { .. } => 0,
            ElementContent::InlineBox(inline) => inline.height,
            ElementContent::HorizontalRule(rule) => rule.height,
        }
    }

    pub fn baseline(&self) -> i32 {
        match self {
            ElementContent::StyleSwitch { .. } => 0,
            ElementContent::InlineBox(inline) => inline.baseline,
            ElementContent::HorizontalRule(rule) => rule.height,
        }
    }

    pub fn is_style_switch(&self) -> bool {
        matches!(self, ElementContent::StyleSwitch { .. })
    }

    /// Id reported to the listener when the element is clicked.
    pub fn click_id(&self) -> Option<u32> {
        match self {
            ElementContent::InlineBox(inline) => Some(inline.id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ElementKind {
    Text,
    Tab,
    Break,
    Embedded(ElementContent),
}

/// One laid-out fragment of a block: a run of text, a tab, the line break
/// or an embedded object. Positions are relative to the owning block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub ofs: usize,
    pub len: usize,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub baseline: i32,
    pub line_y: i32,
    pub line_height: i32,
    /// Style in effect where the element starts.
    pub style_id: usize,
    pub kind: ElementKind,
}

impl Element {
    pub(crate) fn new(ofs: usize, len: usize, kind: ElementKind, style_id: usize) -> Self {
        Self {
            ofs,
            len,
            x: 0,
            y: 0,
            width: 0,
            height: 0,
            baseline: 0,
            line_y: 0,
            line_height: 0,
            style_id,
            kind,
        }
    }

    pub fn end(&self) -> usize {
        self.ofs + self.len
    }

    pub fn is_break(&self) -> bool {
        matches!(self.kind, ElementKind::Break)
    }

    pub fn is_tab(&self) -> bool {
        matches!(self.kind, ElementKind::Tab)
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, ElementKind::Text)
    }

    pub fn content(&self) -> Option<&ElementContent> {
        match &self.kind {
            ElementKind::Embedded(content) => Some(content),
            _ => None,
        }
    }

    pub fn is_embedded(&self) -> bool {
        self.content().is_some()
    }

    pub fn is_style_switch(&self) -> bool {
        self.content().is_some_and(ElementContent::is_style_switch)
    }

    pub fn contains_offset(&self, ofs: usize) -> bool {
        ofs >= self.ofs && ofs < self.end()
    }

    /// Bounding rectangle once the block's top is known.
    pub fn rect(&self, block_y: i32) -> Rect {
        Rect::new(self.x, block_y + self.y, self.width, self.height)
    }
}
