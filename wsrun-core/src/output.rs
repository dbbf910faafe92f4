//! Chunk-to-line processing for child process output.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

/// Cursor positioning, erase and mode set/reset sequences. Anything else
/// (notably SGR color codes) passes through untouched.
static ANSI_CURSOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\x1b(?:c|\[\d+;\d+[Hf]|\[[HMsuJK]|\[\d+[ABCDEFGnJK]|\[[=?]\d+[hl])")
        .expect("cursor escape pattern is valid")
});

/// Which child stream a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// One prefixed line ready for the terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    /// Fixed-width, left-justified package label.
    pub label: String,
    pub line: String,
    pub stream: OutputStream,
}

pub fn strip_ansi_cursor(text: &str) -> Cow<'_, str> {
    ANSI_CURSOR.replace_all(text, "")
}

/// Splits on LF, CRLF and bare CR.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split("\r\n").flat_map(|part| part.split(['\n', '\r']))
}

/// Turns one decoded chunk into the lines that should be printed.
///
/// The chunk is stripped of cursor sequences and trimmed; a chunk that is
/// empty afterwards produces nothing.
pub fn chunk_lines(chunk: &str) -> Vec<String> {
    let stripped = strip_ansi_cursor(chunk);
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    split_lines(trimmed).map(str::to_string).collect()
}

/// Decodes raw reads as UTF-8, holding back a multi-byte character that was
/// cut off at the end of a read until the next one arrives.
#[derive(Debug, Default)]
pub struct Utf8Chunker {
    pending: Vec<u8>,
}

impl Utf8Chunker {
    pub fn push(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut text = String::new();
        let mut consumed = 0;
        while consumed < self.pending.len() {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(valid) => {
                    text.push_str(valid);
                    consumed = self.pending.len();
                }
                Err(e) => {
                    let valid_end = consumed + e.valid_up_to();
                    text.push_str(&String::from_utf8_lossy(&self.pending[consumed..valid_end]));
                    match e.error_len() {
                        Some(invalid) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            consumed = valid_end + invalid;
                        }
                        None => {
                            consumed = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..consumed);
        text
    }

    /// Flushes whatever is still held back, lossily.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_clear_and_home() {
        assert_eq!(chunk_lines("\u{1b}[2Jhello\u{1b}[H"), vec!["hello"]);
    }

    #[test]
    fn keeps_color_codes() {
        let colored = "\u{1b}[32mok\u{1b}[39m";
        assert_eq!(strip_ansi_cursor(colored), colored);
    }

    #[test]
    fn strips_each_recognized_family() {
        let input = "\u{1b}c\u{1b}[12;4Ha\u{1b}[3Ab\u{1b}[?25lc\u{1b}[=7hd\u{1b}[K";
        assert_eq!(strip_ansi_cursor(input), "abcd");
    }

    #[test]
    fn splits_mixed_line_endings() {
        let lines: Vec<&str> = split_lines("a\nb\r\nc\rd").collect();
        assert_eq!(lines, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn whitespace_only_chunk_is_dropped() {
        assert!(chunk_lines("  \n\r\n ").is_empty());
        assert!(chunk_lines("\u{1b}[2J").is_empty());
    }

    #[test]
    fn inner_blank_lines_survive() {
        assert_eq!(chunk_lines("\na\n\nb\n"), vec!["a", "", "b"]);
    }

    #[test]
    fn chunker_holds_split_character() {
        let bytes = "héllo".as_bytes();
        let mut chunker = Utf8Chunker::default();
        let first = chunker.push(&bytes[..2]);
        let second = chunker.push(&bytes[2..]);
        assert_eq!(first, "h");
        assert_eq!(second, "éllo");
        assert_eq!(chunker.finish(), None);
    }

    #[test]
    fn chunker_holds_split_character_after_invalid_byte() {
        let mut chunker = Utf8Chunker::default();
        assert_eq!(chunker.push(&[b'a', 0xFF, b'b', 0xC3]), "a\u{FFFD}b");
        assert_eq!(chunker.push(&[0xA9, b'!']), "\u{e9}!");
        assert_eq!(chunker.finish(), None);
    }
}
