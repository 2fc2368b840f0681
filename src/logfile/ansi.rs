//! Escape sequence stripping for decorated log text.
//!
//! Build tools colour parts of their output (status words, levels). Text
//! scans that look for plain tokens run on the stripped form so that a
//! coloured `FAIL` still reads as `FAIL`.

use std::borrow::Cow;
use vte::{Parser as AnsiParser, Perform};

/// Collects printable text and layout control characters, dropping every
/// CSI, OSC and ESC sequence.
struct PlainText {
    out: String,
}

impl Perform for PlainText {
    fn print(&mut self, c: char) {
        self.out.push(c);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            b'\n' => self.out.push('\n'),
            b'\t' => self.out.push('\t'),
            _ => {}
        }
    }
}

/// Strip escape sequences from `text`.
///
/// Returns `Cow::Borrowed` when there is nothing to strip.
pub fn strip_decorations(text: &str) -> Cow<'_, str> {
    if !text.contains('\x1b') {
        return Cow::Borrowed(text);
    }

    let mut parser = AnsiParser::new();
    let mut performer = PlainText {
        out: String::with_capacity(text.len()),
    };
    for byte in text.bytes() {
        parser.advance(&mut performer, byte);
    }
    Cow::Owned(performer.out)
}
