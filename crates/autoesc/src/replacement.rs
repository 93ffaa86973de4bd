//! Character replacement tables.
//!
//! A [`ReplacementTable`] maps 7-bit code points to replacement strings and
//! carries a short supplemental list for specific non-ASCII code points
//! (U+2028 and U+2029 matter inside JavaScript). Tables compose by
//! copy-and-override, which is how the single-quote-ok and normalizing
//! variants are derived from the base HTML table.

use std::io;

use crate::sink::TextSink;

#[derive(Clone)]
pub struct ReplacementTable {
    ascii: [Option<&'static str>; 0x80],
    non_ascii: Vec<(char, &'static str)>,
    /// Emitted in place of an empty input value. The JS regexp table uses
    /// `(?:)` here so `/$x/` cannot collapse into a `//` line comment.
    empty: Option<&'static str>,
}

impl ReplacementTable {
    pub fn new() -> Self {
        ReplacementTable {
            ascii: [None; 0x80],
            non_ascii: Vec::new(),
            empty: None,
        }
    }

    /// Adds a replacement, or removes one when `repl` is `None`.
    pub fn add(mut self, ch: char, repl: Option<&'static str>) -> Self {
        let cp = ch as usize;
        if cp < 0x80 {
            self.ascii[cp] = repl;
        } else {
            self.non_ascii.retain(|&(c, _)| c != ch);
            if let Some(r) = repl {
                self.non_ascii.push((ch, r));
            }
        }
        self
    }

    pub fn on_empty(mut self, repl: &'static str) -> Self {
        self.empty = Some(repl);
        self
    }

    fn replacement(&self, ch: char) -> Option<&'static str> {
        let cp = ch as usize;
        if cp < 0x80 {
            self.ascii[cp]
        } else {
            self.non_ascii
                .iter()
                .find(|&&(c, _)| c == ch)
                .map(|&(_, r)| r)
        }
    }

    /// Streams `s` to `out`, replacing mapped characters. Unmapped spans are
    /// written as single slices.
    pub fn escape_onto<S: TextSink>(&self, s: &str, out: &mut S) -> io::Result<()> {
        let mut written = 0;
        for (i, ch) in s.char_indices() {
            if let Some(repl) = self.replacement(ch) {
                if written < i {
                    out.write_str(&s[written..i])?;
                }
                out.write_str(repl)?;
                written = i + ch.len_utf8();
            }
        }
        out.write_str(&s[written..])
    }

    pub fn escape_char_onto<S: TextSink>(&self, ch: char, out: &mut S) -> io::Result<()> {
        match self.replacement(ch) {
            Some(repl) => out.write_str(repl),
            None => out.write_char(ch),
        }
    }

    /// Escapes a complete value, honoring the empty-input hook.
    pub fn escape_value_onto<S: TextSink>(&self, s: &str, out: &mut S) -> io::Result<()> {
        if s.is_empty() {
            if let Some(repl) = self.empty {
                return out.write_str(repl);
            }
            return Ok(());
        }
        self.escape_onto(s, out)
    }
}

impl Default for ReplacementTable {
    fn default() -> Self {
        ReplacementTable::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn table() -> ReplacementTable {
        ReplacementTable::new()
            .add('<', Some("&lt;"))
            .add('&', Some("&amp;"))
            .add('\u{2028}', Some("\\u2028"))
    }

    #[test]
    fn passes_through_unmapped_spans() {
        let mut out = String::new();
        table().escape_onto("a<b&c\u{2028}d", &mut out).unwrap();
        assert_eq!(out, "a&lt;b&amp;c\\u2028d");
    }

    #[test]
    fn override_removes_entry() {
        let t = table().add('&', None);
        let mut out = String::new();
        t.escape_onto("<&>", &mut out).unwrap();
        assert_eq!(out, "&lt;&>");
    }

    #[test]
    fn empty_hook_fires_only_for_values() {
        let t = ReplacementTable::new().on_empty("(?:)");
        let mut out = String::new();
        t.escape_onto("", &mut out).unwrap();
        assert_eq!(out, "");
        t.escape_value_onto("", &mut out).unwrap();
        assert_eq!(out, "(?:)");
    }
}
