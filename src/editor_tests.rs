use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::render::CellMetrics;

// Every character is 8x16, the baseline sits at 12 and tab stops are 32
// apart.
fn metrics() -> CellMetrics {
    CellMetrics::new(8, 16)
}

fn single_line() -> StyleEdit {
    let mut editor = StyleEdit::new(metrics());
    editor.set_layout_size(800, 100);
    editor
}

fn multiline(width: i32, height: i32) -> StyleEdit {
    let options = EditorOptions {
        multiline: true,
        ..EditorOptions::default()
    };
    let mut editor = StyleEdit::with_options(metrics(), options);
    editor.set_layout_size(width, height);
    editor
}

fn texts(editor: &StyleEdit) -> Vec<String> {
    editor
        .blocks()
        .map(|(_, block)| String::from_utf8_lossy(block.text()).into_owned())
        .collect()
}

fn press(editor: &mut StyleEdit, key: Key) -> bool {
    editor.key_down(key, Modifiers::NONE)
}

fn type_text(editor: &mut StyleEdit, text: &str) {
    for &ch in text.as_bytes() {
        press(editor, Key::Char(ch));
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    Invalidate,
    Background(Rect),
    String(i32, i32, Vec<u8>),
    SelectionBg(Rect),
    ContentFg(Rect),
    Caret(Rect),
    Style(u32),
    Scroll(i32, i32),
    Scrollbars,
    BlinkStart,
    BlinkStop,
    Change,
    Rule(Rect, u32),
    InlineBox(Rect, u32),
    Clicked(u32, MouseButton),
}

#[derive(Default)]
struct Recorder {
    calls: Vec<Call>,
}

impl Recorder {
    fn take(&mut self) -> Vec<Call> {
        std::mem::take(&mut self.calls)
    }
}

impl Listener for Recorder {
    fn invalidate(&mut self, _rect: Rect) {
        self.calls.push(Call::Invalidate);
    }

    fn draw_background(&mut self, rect: Rect, _block: Option<BlockId>) {
        self.calls.push(Call::Background(rect));
    }

    fn draw_string(&mut self, x: i32, y: i32, text: &[u8]) {
        self.calls.push(Call::String(x, y, text.to_vec()));
    }

    fn draw_text_selection_bg(&mut self, rect: Rect) {
        self.calls.push(Call::SelectionBg(rect));
    }

    fn draw_content_selection_fg(&mut self, rect: Rect) {
        self.calls.push(Call::ContentFg(rect));
    }

    fn draw_caret(&mut self, rect: Rect) {
        self.calls.push(Call::Caret(rect));
    }

    fn set_style(&mut self, style: &Style) {
        self.calls.push(Call::Style(style.color));
    }

    fn scroll(&mut self, dx: i32, dy: i32) {
        self.calls.push(Call::Scroll(dx, dy));
    }

    fn update_scrollbars(&mut self) {
        self.calls.push(Call::Scrollbars);
    }

    fn caret_blink_start(&mut self) {
        self.calls.push(Call::BlinkStart);
    }

    fn caret_blink_stop(&mut self) {
        self.calls.push(Call::BlinkStop);
    }

    fn on_change(&mut self) {
        self.calls.push(Call::Change);
    }

    fn draw_rect(&mut self, rect: Rect, color: u32) {
        self.calls.push(Call::Rule(rect, color));
    }

    fn draw_inline_box(&mut self, rect: Rect, id: u32) {
        self.calls.push(Call::InlineBox(rect, id));
    }

    fn content_clicked(&mut self, id: u32, button: MouseButton, _modifiers: Modifiers) {
        self.calls.push(Call::Clicked(id, button));
    }
}

fn record(editor: &mut StyleEdit) -> Rc<RefCell<Recorder>> {
    let recorder = Rc::new(RefCell::new(Recorder::default()));
    editor.set_listener(Box::new(recorder.clone()));
    recorder
}

fn inline_box(id: u32) -> ElementContent {
    ElementContent::InlineBox(InlineBox {
        id,
        width: 16,
        height: 16,
        baseline: 12,
    })
}

#[test]
fn hello_world_is_a_single_block() {
    let mut editor = single_line();
    editor.set_text(b"hello world").unwrap();
    assert!(!editor.is_empty());
    assert_eq!(editor.block_count(), 1);
    assert_eq!(editor.text(), b"hello world");
    assert_eq!(editor.content_width(), 88);
    assert_eq!(editor.content_height(), 16);
}

#[test]
fn empty_text_leaves_editor_empty() {
    let mut editor = single_line();
    assert!(editor.is_empty());
    editor.set_text(b"something").unwrap();
    editor.set_text(b"").unwrap();
    assert!(editor.is_empty());
    assert_eq!(editor.block_count(), 1);
}

#[test]
fn line_break_in_empty_document_opens_second_block() {
    let mut editor = multiline(800, 100);
    editor.insert_text(b"\r\n").unwrap();
    assert_eq!(editor.block_count(), 2);
    assert_eq!(texts(&editor), vec!["\r\n", ""]);
    assert_eq!(editor.caret().block(), editor.last_block());
    assert_eq!(editor.caret().ofs(), 0);
    assert_eq!(editor.block(editor.last_block()).ypos(), 16);
}

#[test]
fn multiline_text_is_split_at_every_break_kind() {
    let mut editor = multiline(800, 100);
    editor.set_text(b"a\r\nb\nc\rd").unwrap();
    assert_eq!(texts(&editor), vec!["a\r\n", "b\n", "c\r", "d"]);
    assert_eq!(editor.text(), b"a\r\nb\nc\rd");
    assert_eq!(editor.content_height(), 64);
}

#[test]
fn single_line_editor_keeps_only_first_line() {
    let mut editor = single_line();
    editor.set_text(b"one\r\ntwo").unwrap();
    assert_eq!(editor.text(), b"one");
    editor.insert_text_with(b"!\nthree", true, false).unwrap();
    assert_eq!(editor.text(), b"one!");
    assert_eq!(editor.block_count(), 1);
}

#[test]
fn embed_markers_in_plain_text_become_spaces() {
    let mut editor = single_line();
    editor.set_text(&[b'a', EMBED_MARKER, 0, b'b']).unwrap();
    assert_eq!(editor.text(), b"a  b");
}

#[test]
fn delete_at_end_of_block_merges_with_next() {
    let mut editor = multiline(800, 100);
    editor.set_text(b"ab\r\ncd").unwrap();
    press(&mut editor, Key::End);
    assert_eq!(editor.caret().ofs(), 2);
    press(&mut editor, Key::Delete);
    assert_eq!(texts(&editor), vec!["abcd"]);
    assert_eq!(editor.caret().ofs(), 2);
    assert_eq!(editor.content_height(), 16);
}

#[test]
fn backspace_at_block_start_removes_whole_crlf() {
    let mut editor = multiline(800, 100);
    editor.set_text(b"ab\r\ncd").unwrap();
    press(&mut editor, Key::Down);
    assert_eq!(editor.caret().block(), editor.last_block());
    assert_eq!(editor.caret().ofs(), 0);
    press(&mut editor, Key::Backspace);
    assert_eq!(texts(&editor), vec!["abcd"]);
    assert_eq!(editor.caret_global_ofs(), 2);
}

#[test]
fn enter_inserts_configured_line_break() {
    let mut editor = multiline(800, 100);
    type_text(&mut editor, "ab");
    press(&mut editor, Key::Enter);
    type_text(&mut editor, "c");
    assert_eq!(texts(&editor), vec!["ab\r\n", "c"]);

    editor.set_line_break(LineBreak::Lf);
    press(&mut editor, Key::Enter);
    assert_eq!(texts(&editor), vec!["ab\r\n", "c\n", ""]);
}

#[test]
fn enter_and_tab_need_multiline() {
    let mut editor = single_line();
    assert!(!press(&mut editor, Key::Enter));
    assert!(!press(&mut editor, Key::Tab));
    assert!(editor.is_empty());

    let mut editor = multiline(800, 100);
    assert!(press(&mut editor, Key::Tab));
    assert_eq!(editor.text(), b"\t");
}

#[test]
fn typing_replaces_selection() {
    let mut editor = single_line();
    editor.set_text(b"abc").unwrap();
    editor.key_down(Key::Char(b'a'), Modifiers::CTRL);
    let range = editor.selection().range().unwrap();
    assert_eq!((range.start.ofs, range.stop.ofs), (0, 3));
    press(&mut editor, Key::Char(b'x'));
    assert_eq!(editor.text(), b"x");
    assert!(!editor.selection().is_selected());
}

#[test]
fn shift_arrows_extend_selection() {
    let mut editor = single_line();
    editor.set_text(b"abc").unwrap();
    editor.key_down(Key::Right, Modifiers::SHIFT);
    editor.key_down(Key::Right, Modifiers::SHIFT);
    assert_eq!(editor.selected_text(), b"ab");
    editor.key_down(Key::Left, Modifiers::SHIFT);
    assert_eq!(editor.selected_text(), b"a");
    press(&mut editor, Key::Right);
    assert!(!editor.selection().is_selected());
}

#[test]
fn home_end_and_word_moves() {
    let mut editor = single_line();
    editor.set_text(b"hello world").unwrap();
    press(&mut editor, Key::End);
    assert_eq!(editor.caret().ofs(), 11);
    editor.key_down(Key::Left, Modifiers::CTRL);
    assert_eq!(editor.caret().ofs(), 6);
    press(&mut editor, Key::Home);
    assert_eq!(editor.caret().ofs(), 0);
    editor.key_down(Key::Right, Modifiers::CTRL);
    assert_eq!(editor.caret().ofs(), 6);
}

#[test]
fn ctrl_backspace_deletes_word() {
    let mut editor = single_line();
    editor.set_text(b"hello world").unwrap();
    press(&mut editor, Key::End);
    editor.key_down(Key::Backspace, Modifiers::CTRL);
    assert_eq!(editor.text(), b"hello ");
}

#[test]
fn read_only_blocks_editing_keys() {
    let mut editor = single_line();
    editor.set_text(b"fixed").unwrap();
    editor.set_read_only(true);
    press(&mut editor, Key::End);
    press(&mut editor, Key::Backspace);
    press(&mut editor, Key::Char(b'x'));
    editor.key_down(Key::Char(b'v'), Modifiers::CTRL);
    assert_eq!(editor.text(), b"fixed");
    assert!(!editor.undo_redo().can_undo());
}

#[test]
fn disabling_makes_read_only() {
    let mut editor = single_line();
    editor.set_enabled(false);
    assert!(editor.options().read_only);
    press(&mut editor, Key::Char(b'x'));
    assert!(editor.is_empty());
}

#[test]
fn undo_and_redo_shortcuts() {
    let mut editor = single_line();
    type_text(&mut editor, "ab");
    editor.key_down(Key::Char(b'z'), Modifiers::CTRL);
    assert!(editor.is_empty());
    editor.key_down(Key::Char(b'y'), Modifiers::CTRL);
    assert_eq!(editor.text(), b"ab");
    editor.key_down(Key::Char(b'z'), Modifiers::CTRL);
    editor.key_down(Key::Char(b'z'), Modifiers::CTRL_SHIFT);
    assert_eq!(editor.text(), b"ab");
}

#[test]
fn copy_and_paste_through_memory_clipboard() {
    let mut editor = single_line();
    editor.set_text(b"hello world").unwrap();
    let block = editor.first_block();
    editor.select(TextPos::new(block, 0), TextPos::new(block, 5));
    editor.copy();
    press(&mut editor, Key::End);
    editor.paste().unwrap();
    assert_eq!(editor.text(), b"hello worldhello");
}

#[test]
fn cut_removes_selection_only() {
    let mut editor = single_line();
    editor.set_text(b"hello world").unwrap();
    let block = editor.first_block();
    editor.select(TextPos::new(block, 0), TextPos::new(block, 6));
    editor.cut().unwrap();
    assert_eq!(editor.text(), b"world");
    assert_eq!(editor.caret().ofs(), 0);
    editor.paste().unwrap();
    assert_eq!(editor.text(), b"hello world");
}

#[test]
fn custom_clipboard_is_used() {
    struct Fixed;
    impl Clipboard for Fixed {
        fn has_text(&self) -> bool {
            true
        }
        fn text(&self) -> Option<Vec<u8>> {
            Some(b"pasted".to_vec())
        }
        fn set_text(&mut self, _text: &[u8]) {}
    }

    let mut editor = single_line();
    editor.set_clipboard(Box::new(Fixed));
    editor.key_down(Key::Insert, Modifiers::SHIFT);
    assert_eq!(editor.text(), b"pasted");
}

#[test]
fn password_mode_suppresses_clipboard_and_word_moves() {
    let mut editor = single_line();
    editor.set_password(true);
    editor.set_text(b"se cret").unwrap();
    editor.select_all();
    editor.copy();
    editor.cut().unwrap();
    assert_eq!(editor.text(), b"se cret");

    editor.select_nothing();
    press(&mut editor, Key::End);
    editor.paste().unwrap();
    assert_eq!(editor.text(), b"se cret");

    press(&mut editor, Key::Home);
    editor.key_down(Key::Right, Modifiers::CTRL);
    assert_eq!(editor.caret().ofs(), 1);
}

#[test]
fn password_mode_paints_mask_characters() {
    let mut editor = single_line();
    editor.set_password(true);
    editor.set_text(b"abc").unwrap();
    let recorder = record(&mut editor);
    editor.paint(Rect::new(0, 0, 800, 100));
    let strings: Vec<Call> = recorder
        .borrow_mut()
        .take()
        .into_iter()
        .filter(|call| matches!(call, Call::String(..)))
        .collect();
    assert_eq!(
        strings,
        vec![
            Call::String(0, 0, vec![PASSWORD_CHAR]),
            Call::String(8, 0, vec![PASSWORD_CHAR]),
            Call::String(16, 0, vec![PASSWORD_CHAR]),
        ]
    );
}

#[test]
fn paint_draws_blocks_selection_and_caret() {
    let mut editor = multiline(800, 100);
    editor.set_text(b"ab\r\ncd").unwrap();
    editor.focus(true);
    let last = editor.last_block();
    editor.select(TextPos::new(last, 0), TextPos::new(last, 1));
    let recorder = record(&mut editor);
    editor.paint(Rect::new(0, 0, 800, 100));
    let calls = recorder.borrow_mut().take();
    assert!(calls.contains(&Call::Background(Rect::new(0, 0, 800, 16))));
    assert!(calls.contains(&Call::Background(Rect::new(0, 16, 800, 16))));
    assert!(calls.contains(&Call::Background(Rect::new(0, 32, 800, 68))));
    assert!(calls.contains(&Call::String(0, 0, b"ab".to_vec())));
    assert!(calls.contains(&Call::String(0, 16, b"cd".to_vec())));
    assert!(calls.contains(&Call::SelectionBg(Rect::new(0, 16, 8, 16))));
    assert_eq!(calls.last(), Some(&Call::Caret(Rect::new(0, 0, 2, 16))));
}

#[test]
fn show_whitespace_paints_glyphs() {
    let mut editor = multiline(800, 100);
    editor.set_text(b"a\tb\r\n").unwrap();
    let recorder = record(&mut editor);
    editor.paint(Rect::new(0, 0, 800, 100));
    assert!(!recorder.borrow().calls.contains(&Call::String(8, 0, vec![GLYPH_TAB])));

    editor.key_down(Key::Char(b'8'), Modifiers::CTRL);
    assert!(editor.options().show_whitespace);
    recorder.borrow_mut().take();
    editor.paint(Rect::new(0, 0, 800, 100));
    let calls = recorder.borrow_mut().take();
    assert!(calls.contains(&Call::String(8, 0, vec![GLYPH_TAB])));
    assert!(calls.contains(&Call::String(40, 0, vec![GLYPH_LINE_BREAK])));
}

#[test]
fn styles_over_selection_become_marker_pair() {
    let mut editor = single_line();
    editor.set_text(b"hello world").unwrap();
    let block = editor.first_block();
    editor.select(TextPos::new(block, 0), TextPos::new(block, 5));
    editor.insert_style(Rc::new(Style::with_color(0xff0000))).unwrap();

    assert_eq!(editor.text(), b"\x01hello\x01 world");
    assert_eq!(editor.styles().len(), 2);
    let b = editor.block(block);
    assert_eq!(
        b.specials(),
        &[
            ElementContent::StyleSwitch { style_id: 1 },
            ElementContent::StyleSwitch { style_id: 0 },
        ]
    );
    let styles: Vec<usize> = b.elements().iter().map(|e| e.style_id).collect();
    assert_eq!(styles, vec![0, 1, 1, 0]);
    assert_eq!(editor.selected_text(), b"\x01hello\x01");

    let recorder = record(&mut editor);
    editor.paint(Rect::new(0, 0, 800, 100));
    let calls = recorder.borrow_mut().take();
    assert!(calls.contains(&Call::Style(0xff0000)));
    assert!(calls.contains(&Call::String(0, 0, b"hello".to_vec())));
}

#[test]
fn style_at_caret_applies_to_following_text() {
    let mut editor = single_line();
    let red = Rc::new(Style::with_color(0xff0000));
    editor.insert_style(red.clone()).unwrap();
    type_text(&mut editor, "hi");
    editor.insert_style(red).unwrap();
    assert_eq!(editor.styles().len(), 2);
    assert_eq!(editor.text(), b"\x01hi\x01");
    assert_eq!(editor.caret().ofs(), 4);
    let block = editor.block(editor.first_block());
    assert_eq!(block.specials().len(), 2);
    assert_eq!(block.elements()[1].style_id, 1);
}

#[test]
fn clicking_inline_box_reports_its_id() {
    let mut editor = multiline(200, 100);
    editor.insert_embedded(inline_box(42)).unwrap();
    editor.insert_text(b"abc").unwrap();
    let recorder = record(&mut editor);

    editor.mouse_down(Point::new(4, 4), MouseButton::Left, 1, Modifiers::NONE);
    editor.mouse_up(Point::new(4, 4), MouseButton::Left, Modifiers::NONE);
    assert!(recorder.borrow().calls.contains(&Call::Clicked(42, MouseButton::Left)));

    recorder.borrow_mut().take();
    editor.mouse_down(Point::new(4, 4), MouseButton::Left, 1, Modifiers::NONE);
    editor.mouse_up(Point::new(30, 4), MouseButton::Left, Modifiers::NONE);
    let clicked = recorder
        .borrow()
        .calls
        .iter()
        .any(|call| matches!(call, Call::Clicked(..)));
    assert!(!clicked);
}

#[test]
fn horizontal_rule_spans_layout_width() {
    let mut editor = multiline(200, 100);
    editor
        .insert_embedded(ElementContent::HorizontalRule(HorizontalRule {
            width_percent: 50,
            height: 4,
            color: 0x808080,
        }))
        .unwrap();
    let block = editor.block(editor.first_block());
    assert_eq!(block.elements()[0].width, 200);

    let recorder = record(&mut editor);
    editor.paint(Rect::new(0, 0, 200, 100));
    let calls = recorder.borrow_mut().take();
    assert!(calls.contains(&Call::Rule(Rect::new(50, 0, 100, 4), 0x808080)));

    editor.set_layout_size(100, 100);
    let block = editor.block(editor.first_block());
    assert_eq!(block.elements()[0].width, 100);
}

#[test]
fn drag_selects_characters_and_double_click_words() {
    let mut editor = single_line();
    editor.set_text(b"hello big world").unwrap();
    editor.mouse_down(Point::new(9, 4), MouseButton::Left, 1, Modifiers::NONE);
    editor.mouse_move(Point::new(30, 4));
    editor.mouse_up(Point::new(30, 4), MouseButton::Left, Modifiers::NONE);
    assert_eq!(editor.selected_text(), b"ell");

    editor.mouse_down(Point::new(52, 4), MouseButton::Left, 2, Modifiers::NONE);
    editor.mouse_up(Point::new(52, 4), MouseButton::Left, Modifiers::NONE);
    assert_eq!(editor.selected_text(), b"big ");
}

#[test]
fn keys_are_ignored_while_dragging() {
    let mut editor = single_line();
    editor.set_text(b"abc").unwrap();
    editor.mouse_down(Point::new(0, 0), MouseButton::Left, 1, Modifiers::NONE);
    assert!(!press(&mut editor, Key::Char(b'x')));
    editor.mouse_up(Point::new(0, 0), MouseButton::Left, Modifiers::NONE);
    assert!(press(&mut editor, Key::Char(b'x')));
    assert_eq!(editor.text(), b"xabc");
}

#[test]
fn caret_stays_visible_when_moving_to_end() {
    let mut editor = multiline(80, 32);
    editor.set_text(b"1\r\n2\r\n3\r\n4\r\n5").unwrap();
    let recorder = record(&mut editor);
    editor.key_down(Key::End, Modifiers::CTRL);
    assert_eq!(editor.caret().block(), editor.last_block());
    assert_eq!(editor.scroll_pos(), Point::new(0, 48));
    assert!(recorder.borrow().calls.contains(&Call::Scroll(0, -48)));

    editor.key_down(Key::Home, Modifiers::CTRL);
    assert_eq!(editor.scroll_pos(), Point::new(0, 0));
}

#[test]
fn scroll_position_is_clamped() {
    let mut editor = multiline(80, 32);
    editor.set_text(b"1\r\n2\r\n3\r\n4\r\n5").unwrap();
    editor.set_scroll_pos(0, 1000);
    assert_eq!(editor.scroll_pos(), Point::new(0, 48));
    editor.set_scroll_pos(-5, -5);
    assert_eq!(editor.scroll_pos(), Point::new(0, 0));
    editor.key_down(Key::Down, Modifiers::CTRL);
    assert_eq!(editor.scroll_pos(), Point::new(0, 16));

    let mut editor = single_line();
    editor.set_layout_size(40, 16);
    editor.set_text(b"a rather long line").unwrap();
    editor.set_scroll_pos(1000, 1000);
    assert_eq!(editor.scroll_pos(), Point::new(144 - 40, 0));
}

#[test]
fn shrinking_content_invalidates_and_updates_scrollbars() {
    let mut editor = multiline(80, 100);
    editor.set_text(b"1\r\n2\r\n3").unwrap();
    let recorder = record(&mut editor);
    editor.select_all();
    press(&mut editor, Key::Delete);
    assert_eq!(editor.block_count(), 1);
    assert_eq!(editor.content_height(), 16);
    let calls = recorder.borrow_mut().take();
    assert!(calls.contains(&Call::Scrollbars));
    assert!(calls.contains(&Call::Change));
}

#[test]
fn typing_notifies_change_and_restarts_blink() {
    let mut editor = single_line();
    let recorder = record(&mut editor);
    press(&mut editor, Key::Char(b'a'));
    let calls = recorder.borrow_mut().take();
    assert!(calls.contains(&Call::Change));
    assert!(calls.contains(&Call::BlinkStart));
    assert!(editor.caret().is_on());

    press(&mut editor, Key::Left);
    let calls = recorder.borrow_mut().take();
    assert!(!calls.contains(&Call::Change));
}

#[test]
fn focus_toggles_blinking() {
    let mut editor = single_line();
    let recorder = record(&mut editor);
    editor.focus(true);
    assert!(editor.caret().is_on());
    editor.focus(false);
    assert!(!editor.caret().is_on());
    let calls = recorder.borrow_mut().take();
    assert!(calls.contains(&Call::BlinkStart));
    assert!(calls.contains(&Call::BlinkStop));
}

#[test]
fn right_alignment_moves_text_to_edge() {
    let mut editor = single_line();
    editor.set_text(b"abc").unwrap();
    editor.set_align(Align::Right);
    let block = editor.block(editor.first_block());
    assert_eq!(block.align(), Align::Right);
    assert_eq!(block.elements()[0].x, 800 - 24);

    editor.set_layout_size(400, 100);
    let block = editor.block(editor.first_block());
    assert_eq!(block.elements()[0].x, 400 - 24);
}

#[test]
fn wrapping_reflows_on_width_change() {
    let mut editor = multiline(800, 100);
    editor.set_wrapping(true);
    editor.set_text(b"aaa bbb ccc ddd").unwrap();
    assert_eq!(editor.content_height(), 16);
    editor.set_layout_size(80, 100);
    assert_eq!(editor.content_height(), 32);
    editor.set_wrapping(false);
    assert_eq!(editor.content_height(), 16);
}

#[test]
fn set_style_reformats_with_new_metrics() {
    struct Scaled;
    impl FontMetrics for Scaled {
        fn string_width(&self, font: &FontDescriptor, text: &[u8]) -> i32 {
            text.len() as i32 * i32::from(font.size)
        }
        fn font_height(&self, font: &FontDescriptor) -> i32 {
            i32::from(font.size) * 2
        }
    }

    let mut editor = StyleEdit::new(Scaled);
    editor.set_layout_size(800, 100);
    editor.set_text(b"abcd").unwrap();
    assert_eq!(editor.content_width(), 56);
    let big = FontDescriptor {
        size: 20,
        ..FontDescriptor::default()
    };
    editor.set_style(Rc::new(Style::new(0, big)));
    assert_eq!(editor.content_width(), 80);
    assert_eq!(editor.content_height(), 40);
}

#[test]
fn import_runs_custom_parser() {
    struct Upper;
    impl Import for Upper {
        fn parse(&self, buf: &[u8], editor: &mut StyleEdit) -> Result<(), EditError> {
            editor.set_text(&buf.to_ascii_uppercase())
        }
    }

    let mut editor = single_line();
    editor.set_text(b"old").unwrap();
    editor.import(b"new", &Upper).unwrap();
    assert_eq!(editor.text(), b"NEW");
}

#[test]
fn load_reads_file_and_keeps_document_on_failure() {
    let dir = std::env::temp_dir();
    let path = dir.join(format!("styledit-load-{}.txt", std::process::id()));
    std::fs::write(&path, b"first\r\nsecond").unwrap();

    let mut editor = multiline(800, 100);
    editor.load(&path).unwrap();
    assert_eq!(texts(&editor), vec!["first\r\n", "second"]);
    std::fs::remove_file(&path).unwrap();

    let err = editor.load(&path).unwrap_err();
    assert!(matches!(err, EditError::Io { .. }));
    assert_eq!(editor.text(), b"first\r\nsecond");
}

#[test]
fn clear_resets_document_and_history() {
    let mut editor = multiline(800, 100);
    type_text(&mut editor, "abc");
    press(&mut editor, Key::Enter);
    editor.clear();
    assert!(editor.is_empty());
    assert!(!editor.undo_redo().can_undo());
    assert_eq!(editor.caret().ofs(), 0);
    assert_eq!(editor.content_height(), 16);
}

#[test]
fn detached_listener_hears_nothing() {
    let mut editor = single_line();
    let recorder = record(&mut editor);
    assert!(editor.take_listener().is_some());
    assert!(editor.take_listener().is_none());
    type_text(&mut editor, "abc");
    assert_eq!(editor.text(), b"abc");
    assert!(recorder.borrow_mut().take().is_empty());
}
