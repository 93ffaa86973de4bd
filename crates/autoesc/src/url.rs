//! Escapers and the protocol filter for URL contexts.

use std::io;

use memchr::memchr;
use percent_encoding::percent_encode_byte;

use crate::content::{ContentType, Value};
use crate::context::UrlPart;
use crate::sink::TextSink;

/// The replacement emitted for URLs whose protocol is not allowed. Chosen
/// to be syntactically inert in every context where a URL is accepted.
pub const FILTER_REPLACEMENT_URL: &str = "#ZautoescZ";

/// Unreserved per RFC 3986 sec 2.3; producers should never encode these.
fn no_encode(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

/// When normalizing, reserved and sub-delim punctuation is preserved too.
/// Single quote and parens stay encoded so the output survives inside
/// single-quoted attributes and unquoted CSS `url(...)` constructs.
fn no_encode_norm(b: u8) -> bool {
    no_encode(b)
        || matches!(
            b,
            b'!' | b'#' | b'$' | b'&' | b'*' | b'+' | b',' | b'/' | b':' | b';' | b'=' | b'?'
                | b'@' | b'[' | b']'
        )
}

/// Normalizes (`norm`) or escapes a value to produce a valid hierarchical
/// or opaque URL part. URL-tagged safe content is always normalized, never
/// re-escaped.
pub fn escape_onto<S: TextSink>(v: &Value, norm: bool, out: &mut S) -> io::Result<()> {
    if let Some(safe) = v.deref_safe(ContentType::Url) {
        return escape_str_onto(safe, true, out);
    }
    escape_str_onto(&v.text(), norm, out)
}

/// Percent-encodes UTF-8, the same scheme as the EcmaScript built-in
/// `encodeURIComponent`. When normalizing, existing `%HH` sequences are
/// left alone instead of being double-encoded.
pub fn escape_str_onto<S: TextSink>(s: &str, norm: bool, out: &mut S) -> io::Result<()> {
    let bytes = s.as_bytes();
    let mut written = 0;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let keep = if norm { no_encode_norm(b) } else { no_encode(b) };
        if keep {
            i += 1;
            continue;
        }
        if b == b'%'
            && norm
            && i + 2 < bytes.len()
            && bytes[i + 1].is_ascii_hexdigit()
            && bytes[i + 2].is_ascii_hexdigit()
        {
            i += 3;
            continue;
        }
        if written < i {
            out.write_str(&s[written..i])?;
        }
        // Encode the full UTF-8 sequence of the code point at i.
        let ch_len = s[i..].chars().next().map(char::len_utf8).unwrap_or(1);
        for &octet in &bytes[i..i + ch_len] {
            out.write_str(percent_encode_byte(octet))?;
        }
        i += ch_len;
        written = i;
    }
    out.write_str(&s[written..])
}

/// Whether the URL's protocol, if any, is on the allow list. A `:` only
/// counts as a protocol delimiter when it appears before the first `/`.
pub fn url_prefix_allowed(s: &str) -> bool {
    let bytes = s.as_bytes();
    let colon = match memchr(b':', bytes) {
        None => return true,
        Some(at) => at,
    };
    if memchr(b'/', &bytes[..colon]).is_some() {
        return true;
    }
    match colon {
        4 => bytes[..4].eq_ignore_ascii_case(b"http"),
        5 => bytes[..5].eq_ignore_ascii_case(b"https"),
        6 => bytes[..6].eq_ignore_ascii_case(b"mailto"),
        _ => false,
    }
}

/// Advances the URL part past the characters of `s`: query or fragment
/// punctuation moves to `QueryOrFrag`, and any non-whitespace content moves
/// an empty URL to `PreQuery`.
///
/// @see https://url.spec.whatwg.org/ and HTML5's "valid URL potentially
/// surrounded by spaces" for why surrounding whitespace is discounted.
pub fn next_url_part(s: &str, part: UrlPart) -> UrlPart {
    let bytes = s.as_bytes();
    if memchr(b'?', bytes).is_some() || memchr(b'#', bytes).is_some() {
        UrlPart::QueryOrFrag
    } else if part == UrlPart::None
        && strspn!(bytes, b' ' | b'\t' | b'\n' | b'\x0C' | b'\r') != bytes.len()
    {
        UrlPart::PreQuery
    } else {
        part
    }
}
