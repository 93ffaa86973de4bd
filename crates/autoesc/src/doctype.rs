//! Classifies `<!doctype ...>` declarations.
//!
//! HTML5 allows only a handful of root element names in a doctype that
//! still parses as HTML; SVG and MathML are HTML5 subsets now, so they stay
//! in HTML mode too. Any other doctype switches the writer into its XML
//! mode, where comments are preserved and CDATA sections pass through.

use lazy_static::lazy_static;

use crate::context::State;
use crate::trie::Trie;

lazy_static! {
    static ref TOP_LEVEL_TAG_NAME: Trie<State> = Trie::builder()
        .put("html", State::Text)
        .put("svg", State::Text)
        .put("math", State::Text)
        .build();
}

/// Returns the state the document body will be scanned in, given the text
/// following `<!doctype`.
pub fn classify(s: &str) -> State {
    let bytes = s.as_bytes();
    let off = strspn!(bytes, b'\t' | b'\n' | b'\r' | b' ');
    let len = strspn!(bytes, b'A'..=b'Z' | b'a'..=b'z', off);
    match TOP_LEVEL_TAG_NAME.get_ignore_case(&bytes[off..off + len]) {
        Some(&state) => state,
        None => State::Xml,
    }
}
