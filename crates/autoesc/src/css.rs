//! Escapers and filters for CSS contexts.

use std::io;

use crate::content::{ContentType, Value};
use crate::sink::TextSink;

/// The inert keyword substituted for CSS values that fail the filter.
pub const FILTER_REPLACEMENT: &str = "ZautoescZ";

/// CSS whitespace per the `wc` production: space, tab, and newlines
/// (including the form feed).
pub fn is_css_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\x0C' | b'\r')
}

fn is_css_nmchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c as u32 >= 0x80
}

/// Decodes CSS backslash escapes so URL-part analysis and value filtering
/// operate on logical characters. `\HH... ` hex escapes consume up to six
/// digits and one trailing whitespace; `\` before any other character
/// yields that character.
pub fn decode_css(s: &str) -> String {
    let mut decoded = String::with_capacity(s.len());
    let mut chars = s.char_indices().peekable();
    while let Some((_, c)) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.peek() {
            None => decoded.push('\\'),
            Some(&(_, next)) if next.is_ascii_hexdigit() => {
                let mut cp: u32 = 0;
                let mut digits = 0;
                while digits < 6 {
                    match chars.peek() {
                        Some(&(_, d)) if d.is_ascii_hexdigit() => {
                            cp = cp * 16 + d.to_digit(16).unwrap_or(0);
                            chars.next();
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                // One whitespace character after the digits is part of
                // the escape.
                if let Some(&(_, d)) = chars.peek() {
                    if d.is_ascii() && is_css_space(d as u8) {
                        chars.next();
                    }
                }
                decoded.push(char::from_u32(cp).unwrap_or('\u{FFFD}'));
            }
            Some(&(_, next)) => {
                decoded.push(next);
                chars.next();
            }
        }
    }
    decoded
}

/// Decodes only when `s` actually contains a backslash.
pub fn maybe_decode_css(s: &str) -> Option<String> {
    if s.as_bytes().contains(&b'\\') {
        Some(decode_css(s))
    } else {
        None
    }
}

/// Escapes a value for a CSS string literal. Characters that could close
/// the string, open a comment, or read as HTML markup become `\HH ` hex
/// escapes; a trailing space keeps the escape from absorbing a following
/// hex digit.
pub fn escape_str_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    escape_str_str_onto(&v.text(), out)
}

pub fn escape_str_str_onto<S: TextSink>(s: &str, out: &mut S) -> io::Result<()> {
    let mut written = 0;
    for (i, c) in s.char_indices() {
        let repl: Option<&str> = match c {
            '\0' => Some("\\0 "),
            '\t' => Some("\\9 "),
            '\n' => Some("\\a "),
            '\u{B}' => Some("\\b "),
            '\x0C' => Some("\\c "),
            '\r' => Some("\\d "),
            '"' => Some("\\22 "),
            '&' => Some("\\26 "),
            '\'' => Some("\\27 "),
            '(' => Some("\\28 "),
            ')' => Some("\\29 "),
            '*' => Some("\\2a "),
            '+' => Some("\\2b "),
            '/' => Some("\\2f "),
            ':' => Some("\\3a "),
            ';' => Some("\\3b "),
            '<' => Some("\\3c "),
            '>' => Some("\\3e "),
            '\\' => Some("\\\\"),
            '{' => Some("\\7b "),
            '}' => Some("\\7d "),
            _ => None,
        };
        if let Some(repl) = repl {
            if written < i {
                out.write_str(&s[written..i])?;
            }
            out.write_str(repl)?;
            written = i + c.len_utf8();
        }
    }
    out.write_str(&s[written..])
}

/// Allows innocuous CSS values: quantities (`10px`, `25%`), identifiers
/// (`sans-serif`), colors (`#ff0000`), and short lists thereof. Anything
/// that could escape the declaration or reach script — string or comment
/// delimiters, brackets, `expression(...)`, `-moz-binding` — is replaced
/// wholesale with the inert [`FILTER_REPLACEMENT`] keyword.
pub fn filter_value_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    if let Some(safe) = v.deref_safe(ContentType::Css) {
        return out.write_str(safe);
    }
    let text = v.text();
    let decoded = maybe_decode_css(&text);
    let checked = decoded.as_deref().unwrap_or(&text);

    let mut id = String::new();
    let mut last = '\0';
    for c in checked.chars() {
        let ok = match c {
            _ if is_css_nmchar(c) => {
                if c.is_ascii_alphabetic() {
                    id.push(c.to_ascii_lowercase());
                }
                // Two adjacent dashes read as part of an HTML comment
                // marker inside a style attribute.
                !(c == '-' && last == '-')
            }
            ' ' | '\t' | '\n' | '\x0C' | '\r' => true,
            '!' | '#' | '%' | '*' | '+' | ',' | '.' | '/' | ':' | '=' | '?' | '~' => true,
            _ => false,
        };
        if !ok {
            return out.write_str(FILTER_REPLACEMENT);
        }
        last = c;
    }
    if id.contains("expression") || id.contains("mozbinding") {
        return out.write_str(FILTER_REPLACEMENT);
    }
    out.write_str(&text)
}
