//! Byte classification and the word scanner used by layout and caret
//! movement. Text is treated as 8-bit characters; there is no shaping.

/// Reserved byte marking the position of an embedded element in a block.
pub const EMBED_MARKER: u8 = 1;

/// Drawn and measured instead of every character in password mode.
pub const PASSWORD_CHAR: u8 = b'*';

pub(crate) const GLYPH_LINE_BREAK: u8 = 0xB6;
pub(crate) const GLYPH_TAB: u8 = 0xBB;

/// Middle dot, used as a list bullet in plain text.
pub(crate) const BULLET: u8 = 0xB7;

pub(crate) fn is_space(ch: u8) -> bool {
    ch == b' '
}

pub(crate) fn is_line_break(ch: u8) -> bool {
    matches!(ch, b'\r' | b'\n')
}

/// Characters that end a word for caret stepping and wrapping.
pub(crate) fn is_word_break(ch: u8) -> bool {
    matches!(
        ch,
        EMBED_MARKER
            | 0
            | b'\n'
            | b'\r'
            | b'-'
            | b'\t'
            | b'"'
            | b'('
            | b')'
            | b'/'
            | b'\\'
            | b'*'
            | b'+'
            | b','
            | b'.'
            | b';'
            | b':'
            | b'>'
            | b'<'
            | b'&'
            | b'#'
            | b'!'
            | b'='
            | b'['
            | b']'
            | b'{'
            | b'}'
            | b'^'
    ) || is_space(ch)
}

/// Whitespace as far as undo coalescing is concerned.
pub(crate) fn is_undo_whitespace(ch: u8) -> bool {
    matches!(ch, b' ' | b'\r' | b'\n')
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RunKind {
    Embedded,
    Tab,
    Break,
    Word,
}

/// One scanner step. For words, `len` covers the word itself and `seg_len`
/// extends over the spaces following it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Run {
    pub kind: RunKind,
    pub len: usize,
    pub seg_len: usize,
    pub more: bool,
}

/// Classifies the run at the start of `text`. Returns `None` at the end of
/// the text.
pub(crate) fn next_run(text: &[u8]) -> Option<Run> {
    let at = |i: usize| text.get(i).copied().unwrap_or(0);
    let first = *text.first()?;
    let run = match first {
        EMBED_MARKER | b'\t' => Run {
            kind: if first == b'\t' {
                RunKind::Tab
            } else {
                RunKind::Embedded
            },
            len: 1,
            seg_len: 1,
            more: text.len() > 1,
        },
        b'\r' | b'\n' => {
            let len = if first == b'\r' && at(1) == b'\n' { 2 } else { 1 };
            Run {
                kind: RunKind::Break,
                len,
                seg_len: len,
                more: text.len() > len,
            }
        }
        _ => {
            let mut i = 1;
            while i < text.len() && !is_word_break(text[i]) {
                i += 1;
            }
            let len = i;
            while i < text.len() && is_space(text[i]) {
                i += 1;
            }
            Run {
                kind: RunKind::Word,
                len,
                seg_len: i,
                more: i < text.len(),
            }
        }
    };
    Some(run)
}

/// Length of the line break terminating `text`, 0 if it has none.
pub(crate) fn trailing_break_len(text: &[u8]) -> usize {
    match text {
        [.., b'\r', b'\n'] => 2,
        [.., last] if is_line_break(*last) => 1,
        _ => 0,
    }
}

/// Length of the first line of `text`, up to and including its line break
/// when `include_break` is set.
pub(crate) fn first_line_len(text: &[u8], include_break: bool) -> usize {
    let Some(pos) = text.iter().position(|&ch| is_line_break(ch)) else {
        return text.len();
    };
    if !include_break {
        return pos;
    }
    if text[pos] == b'\r' && text.get(pos + 1) == Some(&b'\n') {
        pos + 2
    } else {
        pos + 1
    }
}

pub(crate) fn count_markers(text: &[u8]) -> usize {
    text.iter().filter(|&&ch| ch == EMBED_MARKER).count()
}

/// Replaces bytes that may not appear in inserted text.
pub(crate) fn sanitize(text: &mut [u8], allow_embeds: bool) {
    for ch in text.iter_mut() {
        if *ch == 0 || (!allow_embeds && *ch == EMBED_MARKER) {
            *ch = b' ';
        }
    }
}

pub(crate) fn strip_markers(text: &[u8]) -> Vec<u8> {
    text.iter()
        .copied()
        .filter(|&ch| ch != EMBED_MARKER)
        .collect()
}
