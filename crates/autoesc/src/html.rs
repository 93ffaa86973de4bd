//! Escapers for HTML text and attribute contexts.

use std::io;

use lazy_static::lazy_static;

use crate::content::{ContentType, Value};
use crate::error::{Error, Result};
use crate::replacement::ReplacementTable;
use crate::sink::TextSink;

lazy_static! {
    /// Escapes everything that can change meaning in HTML text or a quoted
    /// attribute. The backtick is included because IE treats it as an
    /// attribute quote; `+` defends against UTF-7 sniffing.
    pub static ref REPLACEMENT_TABLE: ReplacementTable = ReplacementTable::new()
        .add('\0', Some("\u{FFFD}"))
        .add('"', Some("&#34;"))
        .add('&', Some("&amp;"))
        .add('\'', Some("&#39;"))
        .add('+', Some("&#43;"))
        .add('<', Some("&lt;"))
        .add('>', Some("&gt;"))
        .add('`', Some("&#96;"));

    /// Like [`struct@REPLACEMENT_TABLE`] but leaves `&` alone so existing
    /// entities are not re-encoded.
    pub static ref NORM_REPLACEMENT_TABLE: ReplacementTable =
        REPLACEMENT_TABLE.clone().add('&', None);

    /// Allows single quotes, for content inside double-quoted attributes.
    pub static ref HTML_SQ_OK: ReplacementTable = REPLACEMENT_TABLE.clone().add('\'', None);

    /// Allows double quotes, for content inside single-quoted attributes.
    pub static ref HTML_DQ_OK: ReplacementTable = REPLACEMENT_TABLE.clone().add('"', None);

    pub static ref NORM_HTML_SQ_OK: ReplacementTable = HTML_SQ_OK.clone().add('&', None);

    pub static ref NORM_HTML_DQ_OK: ReplacementTable = HTML_DQ_OK.clone().add('&', None);
}

/// Escapes a value for an HTML text node. Markup-tagged safe content is
/// emitted verbatim.
pub fn escape_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    if let Some(safe) = v.deref_safe(ContentType::Markup) {
        return out.write_str(safe);
    }
    REPLACEMENT_TABLE.escape_onto(&v.text(), out)
}

/// Like [`escape_onto`] but preserves entities already present in the
/// value. Used in soft mode to interoperate with pre-escaped inputs.
pub fn normalize_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    if let Some(safe) = v.deref_safe(ContentType::Markup) {
        return out.write_str(safe);
    }
    NORM_REPLACEMENT_TABLE.escape_onto(&v.text(), out)
}

/// Escapes a value for RCDATA element content (`<textarea>`, `<title>`).
/// Tags are inert there, so Markup-tagged content only needs its existing
/// entities preserved.
pub fn escape_rcdata_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    if let Some(safe) = v.deref_safe(ContentType::Markup) {
        return NORM_REPLACEMENT_TABLE.escape_onto(safe, out);
    }
    REPLACEMENT_TABLE.escape_onto(&v.text(), out)
}

/// Emits the longest prefix of `s` that is valid in an HTML tag or
/// attribute name, dropping the remainder. A name that is empty or does
/// not even start with a valid character would leave a nameless tag or
/// attribute behind, letting a following `=value` bind to the wrong
/// attribute, so it is an error.
pub fn filter_name_onto<S: TextSink>(s: &str, out: &mut S) -> Result<()> {
    let bytes = s.as_bytes();
    let valid = strspn!(bytes, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-');
    if valid == 0 {
        return Err(Error::template_at(
            s,
            0,
            0,
            s.len(),
            "expected tag or attribute name, but got ",
        ));
    }
    out.write_str(&s[..valid]).map_err(Error::from)
}

#[cfg(test)]
mod test {
    use super::*;

    fn escaped(v: &Value) -> String {
        let mut out = String::new();
        escape_onto(v, &mut out).unwrap();
        out
    }

    #[test]
    fn escapes_html_specials() {
        assert_eq!(
            escaped(&Value::from("<b>&'\"`+\0</b>")),
            "&lt;b&gt;&amp;&#39;&#34;&#96;&#43;\u{FFFD}&lt;/b&gt;"
        );
    }

    #[test]
    fn markup_passes_through() {
        assert_eq!(escaped(&Value::safe(ContentType::Markup, "<b>hi</b>")), "<b>hi</b>");
    }

    #[test]
    fn normalize_keeps_entities() {
        let mut out = String::new();
        normalize_onto(&Value::from("foo&amp <bar>"), &mut out).unwrap();
        assert_eq!(out, "foo&amp &lt;bar&gt;");
    }

    #[test]
    fn rcdata_strips_tag_syntax_from_markup() {
        let mut out = String::new();
        escape_rcdata_onto(&Value::safe(ContentType::Markup, "a&amp;<b>"), &mut out).unwrap();
        assert_eq!(out, "a&amp;&lt;b&gt;");
    }

    #[test]
    fn name_filter_truncates() {
        let mut out = String::new();
        filter_name_onto("data-foo", &mut out).unwrap();
        assert_eq!(out, "data-foo");
        out.clear();
        filter_name_onto("on click='x'", &mut out).unwrap();
        assert_eq!(out, "on");
    }

    #[test]
    fn name_filter_rejects_nameless_names() {
        let mut out = String::new();
        assert!(matches!(
            filter_name_onto("=bad", &mut out),
            Err(Error::Template(_))
        ));
        assert!(matches!(
            filter_name_onto("", &mut out),
            Err(Error::Template(_))
        ));
        assert_eq!(out, "");
    }
}
