//! A streaming, context-aware auto-escaping writer for HTML and XML.
//!
//! Trusted template text and untrusted values are interleaved through one
//! [`HtmlEscapingWriter`]. The trusted chunks are scanned just deeply
//! enough to know where the next untrusted value will land — HTML text, a
//! quoted or unquoted attribute value, a URL, a `<script>` body, a JS
//! string or regexp, a `<style>` body, a CSS string or `url(...)`, a
//! comment, CDATA, or an XML subtree — and the value is escaped, filtered,
//! or elided with the policy for exactly that spot.
//!
//! ```
//! use autoesc::{HtmlEscapingWriter, Value};
//!
//! let mut out = String::new();
//! let mut w = HtmlEscapingWriter::new(&mut out);
//! w.write_safe("<a href=\"/search?q=").unwrap();
//! w.write(&Value::from("a b&c")).unwrap();
//! w.write_safe("\" onclick=\"alert(").unwrap();
//! w.write(&Value::from("O'Reilly & Sons")).unwrap();
//! w.write_safe(")\">link</a>").unwrap();
//! drop(w);
//! assert_eq!(
//!     out,
//!     "<a href=\"/search?q=a%20b%26c\" onclick=\"alert('O\\x27Reilly \\x26 Sons')\">link</a>"
//! );
//! ```

#[macro_use]
mod macros;

mod attr;
mod content;
mod context;
mod css;
mod doctype;
mod entities;
mod error;
mod html;
mod js;
mod replacement;
mod sink;
mod str_fns;
mod trie;
mod url;
mod writer;
mod xml;

pub use content::{ContentType, JsonMarshaler, Value};
pub use context::{AttrKind, Context, Delim, Element, JsCtx, State, UrlPart};
pub use error::{Error, Result};
pub use sink::{IoSink, TextSink};
pub use writer::HtmlEscapingWriter;
