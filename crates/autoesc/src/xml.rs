//! Escapers for XML text and CDATA contexts.

use std::io;

use lazy_static::lazy_static;

use crate::content::{ContentType, Value};
use crate::replacement::ReplacementTable;
use crate::sink::TextSink;

lazy_static! {
    /// XML cannot contain NULs even when encoded, so NUL becomes U+FFFD.
    pub static ref REPLACEMENT_TABLE: ReplacementTable = ReplacementTable::new()
        .add('\0', Some("\u{FFFD}"))
        .add('"', Some("&#34;"))
        .add('&', Some("&amp;"))
        .add('\'', Some("&#39;"))
        .add('+', Some("&#43;"))
        .add('<', Some("&lt;"))
        .add('>', Some("&gt;"))
        .add('`', Some("&#96;"));

    pub static ref NORM_REPLACEMENT_TABLE: ReplacementTable =
        REPLACEMENT_TABLE.clone().add('&', None);
}

/// Escapes a value for an XML text node. Markup-tagged content passes
/// through verbatim.
pub fn escape_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    if let Some(safe) = v.deref_safe(ContentType::Markup) {
        return out.write_str(safe);
    }
    REPLACEMENT_TABLE.escape_onto(&v.text(), out)
}

/// Escapes for XML text without re-encoding existing entities.
pub fn normalize_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    if let Some(safe) = v.deref_safe(ContentType::Markup) {
        return out.write_str(safe);
    }
    NORM_REPLACEMENT_TABLE.escape_onto(&v.text(), out)
}

/// Emits a value inside a `<![CDATA[...]]>` section.
///
/// The text passes through unchanged unless it could terminate the section:
/// any embedded `]]>` splits the CDATA section around the `>`
/// (`"foo]]>bar"` becomes `"foo]]]]><![CDATA[>bar"`), and a leading `>` or
/// `]>` or trailing `]` is fenced off the same way so it cannot combine
/// with bytes already on, or later written to, the sink. NULs are elided
/// since XML disallows them outright.
pub fn escape_cdata_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    let text = v.text();
    escape_cdata_str_onto(&text, out)
}

pub fn escape_cdata_str_onto<S: TextSink>(s: &str, out: &mut S) -> io::Result<()> {
    if s.is_empty() {
        return Ok(());
    }

    if s.as_bytes().contains(&0) {
        let stripped: String = s.chars().filter(|&c| c != '\0').collect();
        return escape_cdata_str_onto(&stripped, out);
    }

    let bytes = s.as_bytes();
    if bytes[0] == b'>' || (bytes.len() > 1 && bytes[0] == b']' && bytes[1] == b'>') {
        out.write_str("]]><![CDATA[")?;
    }

    let mut off = 0;
    let mut i = 0;
    while i + 2 < bytes.len() {
        if bytes[i] == b']' && bytes[i + 1] == b']' && bytes[i + 2] == b'>' {
            out.write_str(&s[off..i])?;
            out.write_str("]]]]><![CDATA[>")?;
            i += 3;
            off = i;
        } else {
            i += 1;
        }
    }
    out.write_str(&s[off..])?;

    if bytes[bytes.len() - 1] == b']' {
        out.write_str("]]><![CDATA[")?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn cdata(s: &str) -> String {
        let mut out = String::new();
        escape_cdata_str_onto(s, &mut out).unwrap();
        out
    }

    #[test]
    fn plain_content_is_untouched() {
        assert_eq!(cdata("x < y && z"), "x < y && z");
    }

    #[test]
    fn embedded_close_is_split() {
        assert_eq!(cdata("foo]]>bar"), "foo]]]]><![CDATA[>bar");
        assert_eq!(cdata("a]]>b]]>c"), "a]]]]><![CDATA[>b]]]]><![CDATA[>c");
    }

    #[test]
    fn boundary_characters_are_fenced() {
        assert_eq!(cdata(">rest"), "]]><![CDATA[>rest");
        assert_eq!(cdata("]>rest"), "]]><![CDATA[]>rest");
        assert_eq!(cdata("tail]"), "tail]]]><![CDATA[");
    }

    #[test]
    fn nuls_are_elided() {
        assert_eq!(cdata("a\0b"), "ab");
    }

    #[test]
    fn xml_escape_replaces_nul() {
        let mut out = String::new();
        escape_onto(&Value::from("a\0<b"), &mut out).unwrap();
        assert_eq!(out, "a\u{FFFD}&lt;b");
    }
}
