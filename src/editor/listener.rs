use std::cell::RefCell;
use std::rc::Rc;

use super::BlockId;
use super::style::Style;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Pixel rectangle. Coordinates may be negative when content is scrolled
/// out of view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.y >= self.y && point.x < self.x + self.w && point.y < self.y + self.h
    }
}

/// Callbacks from the edit engine to the widget hosting it.
///
/// All calls are made synchronously while an editing operation runs; a
/// host that wants to batch repaints should only record the invalidated
/// regions.
pub trait Listener {
    fn invalidate(&mut self, rect: Rect);
    fn draw_background(&mut self, rect: Rect, block: Option<BlockId>);
    fn draw_string(&mut self, x: i32, y: i32, text: &[u8]);
    fn draw_text_selection_bg(&mut self, rect: Rect);
    fn draw_content_selection_fg(&mut self, rect: Rect);
    fn draw_caret(&mut self, rect: Rect);
    fn set_style(&mut self, style: &Style);
    fn scroll(&mut self, dx: i32, dy: i32);
    fn update_scrollbars(&mut self);
    fn caret_blink_start(&mut self);
    fn caret_blink_stop(&mut self);
    fn on_change(&mut self);

    fn draw_rect(&mut self, _rect: Rect, _color: u32) {}

    fn draw_inline_box(&mut self, _rect: Rect, _id: u32) {}

    fn content_clicked(&mut self, _id: u32, _button: MouseButton, _modifiers: Modifiers) {}
}

/// Lets the host keep a handle on its listener after handing it to the
/// editor.
impl<T: Listener> Listener for Rc<RefCell<T>> {
    fn invalidate(&mut self, rect: Rect) {
        self.borrow_mut().invalidate(rect);
    }

    fn draw_background(&mut self, rect: Rect, block: Option<BlockId>) {
        self.borrow_mut().draw_background(rect, block);
    }

    fn draw_string(&mut self, x: i32, y: i32, text: &[u8]) {
        self.borrow_mut().draw_string(x, y, text);
    }

    fn draw_text_selection_bg(&mut self, rect: Rect) {
        self.borrow_mut().draw_text_selection_bg(rect);
    }

    fn draw_content_selection_fg(&mut self, rect: Rect) {
        self.borrow_mut().draw_content_selection_fg(rect);
    }

    fn draw_caret(&mut self, rect: Rect) {
        self.borrow_mut().draw_caret(rect);
    }

    fn set_style(&mut self, style: &Style) {
        self.borrow_mut().set_style(style);
    }

    fn scroll(&mut self, dx: i32, dy: i32) {
        self.borrow_mut().scroll(dx, dy);
    }

    fn update_scrollbars(&mut self) {
        self.borrow_mut().update_scrollbars();
    }

    fn caret_blink_start(&mut self) {
        self.borrow_mut().caret_blink_start();
    }

    fn caret_blink_stop(&mut self) {
        self.borrow_mut().caret_blink_stop();
    }

    fn on_change(&mut self) {
        self.borrow_mut().on_change();
    }

    fn draw_rect(&mut self, rect: Rect, color: u32) {
        self.borrow_mut().draw_rect(rect, color);
    }

    fn draw_inline_box(&mut self, rect: Rect, id: u32) {
        self.borrow_mut().draw_inline_box(rect, id);
    }

    fn content_clicked(&mut self, id: u32, button: MouseButton, modifiers: Modifiers) {
        self.borrow_mut().content_clicked(id, button, modifiers);
    }
}

pub trait Clipboard {
    fn has_text(&self) -> bool;
    fn text(&self) -> Option<Vec<u8>>;
    fn set_text(&mut self, text: &[u8]);
}

/// Clipboard that lives as long as the process, for hosts without access to
/// the system clipboard.
#[derive(Clone, Debug, Default)]
pub struct MemoryClipboard {
    contents: Option<Vec<u8>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemoryClipboard {
    fn has_text(&self) -> bool {
        self.contents.as_ref().is_some_and(|text| !text.is_empty())
    }

    fn text(&self) -> Option<Vec<u8>> {
        self.contents.clone()
    }

    fn set_text(&mut self, text: &[u8]) {
        self.contents = Some(text.to_vec());
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };
    pub const SHIFT: Self = Self {
        shift: true,
        ctrl: false,
        alt: false,
    };
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };
    pub const CTRL_SHIFT: Self = Self {
        shift: true,
        ctrl: true,
        alt: false,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    /// A printable 8-bit character, or the letter of a Ctrl shortcut.
    Char(u8),
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    Delete,
    Backspace,
    Insert,
    Tab,
    Enter,
}

impl Key {
    pub(crate) fn moves_caret(self) -> bool {
        matches!(
            self,
            Key::Left
                | Key::Right
                | Key::Up
                | Key::Down
                | Key::Home
                | Key::End
                | Key::PageUp
                | Key::PageDown
        )
    }

    pub(crate) fn is_shortcut(self, letter: u8) -> bool {
        matches!(self, Key::Char(ch) if ch.to_ascii_uppercase() == letter)
    }
}
