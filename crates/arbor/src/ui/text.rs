//! Cell-width helpers for styled text.
//!
//! Frames carry ANSI escape sequences for styling. Every width and column
//! computation here skips those sequences and measures the remaining
//! characters in terminal cells, so wide glyphs count as two and combining
//! marks as zero.

use unicode_width::UnicodeWidthChar;

pub const RESET: &str = "\x1b[0m";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token<'a> {
    Escape(&'a str),
    Char(char),
}

/// Split a line into escape sequences and printable characters.
fn tokens(line: &str) -> Vec<Token<'_>> {
    let bytes = line.as_bytes();
    let mut out = Vec::new();
    let mut idx = 0;
    while idx < line.len() {
        if bytes[idx] == 0x1b {
            let end = escape_end(bytes, idx);
            out.push(Token::Escape(&line[idx..end]));
            idx = end;
            continue;
        }
        let Some(ch) = line[idx..].chars().next() else {
            break;
        };
        out.push(Token::Char(ch));
        idx += ch.len_utf8();
    }
    out
}

/// Byte index just past the escape sequence that starts at `start`.
fn escape_end(bytes: &[u8], start: usize) -> usize {
    let len = bytes.len();
    let Some(&kind) = bytes.get(start + 1) else {
        return len;
    };
    match kind {
        // CSI: parameters then a final byte in 0x40..=0x7e.
        b'[' => {
            let mut idx = start + 2;
            while idx < len {
                if (0x40..=0x7e).contains(&bytes[idx]) {
                    return idx + 1;
                }
                idx += 1;
            }
            len
        }
        // OSC: terminated by BEL or ESC \.
        b']' => {
            let mut idx = start + 2;
            while idx < len {
                if bytes[idx] == 0x07 {
                    return idx + 1;
                }
                if bytes[idx] == 0x1b && bytes.get(idx + 1) == Some(&b'\\') {
                    return idx + 2;
                }
                idx += 1;
            }
            len
        }
        _ => (start + 2).min(len),
    }
}

fn char_width(ch: char) -> usize {
    ch.width().unwrap_or(0)
}

/// Display width of a line in terminal cells, ignoring escape sequences.
pub fn display_width(line: &str) -> usize {
    tokens(line)
        .into_iter()
        .map(|token| match token {
            Token::Escape(_) => 0,
            Token::Char(ch) => char_width(ch),
        })
        .sum()
}

/// Widest line of a multi-line block.
pub fn block_width(block: &str) -> usize {
    block.lines().map(display_width).max().unwrap_or(0)
}

/// Right-pad with spaces until the line is at least `width` cells wide.
pub fn pad_to(line: &str, width: usize) -> String {
    let current = display_width(line);
    if current >= width {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + width - current);
    out.push_str(line);
    out.extend(std::iter::repeat(' ').take(width - current));
    out
}

/// Cut the cells `[start, end)` out of a styled line.
///
/// Escape sequences seen before `end` are kept so the slice renders with the
/// style that was active at `start`; a reset is appended when any were kept.
/// A wide glyph straddling either boundary is replaced by spaces so the slice
/// is exactly `end - start` cells wide when the line is long enough.
pub fn slice_columns(line: &str, start: usize, end: usize) -> String {
    let mut out = String::new();
    if end <= start {
        return out;
    }
    let mut col = 0usize;
    let mut styled = false;
    let mut last_included = false;
    for token in tokens(line) {
        match token {
            Token::Escape(seq) => {
                if col < end {
                    out.push_str(seq);
                    styled = true;
                }
            }
            Token::Char(ch) => {
                let width = char_width(ch);
                if width == 0 {
                    if last_included {
                        out.push(ch);
                    }
                    continue;
                }
                let next = col + width;
                if col >= start && next <= end {
                    out.push(ch);
                    last_included = true;
                } else {
                    let overlap_start = col.max(start);
                    let overlap_end = next.min(end);
                    if overlap_end > overlap_start {
                        out.extend(std::iter::repeat(' ').take(overlap_end - overlap_start));
                    }
                    last_included = false;
                }
                col = next;
            }
        }
    }
    if styled {
        out.push_str(RESET);
    }
    out
}

/// Truncate a styled line to at most `width` cells.
pub fn truncate(line: &str, width: usize) -> String {
    if display_width(line) <= width {
        return line.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut cut = slice_columns(line, 0, width - 1);
    cut.push('…');
    cut
}
