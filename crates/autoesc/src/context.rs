//! The context word the writer maintains between chunks.
//!
//! A [`Context`] records where in the document the next write will land:
//! which sublanguage is active (`state`), how the surrounding attribute
//! value is delimited (`delim`), which part of a URL has been seen
//! (`url_part`), whether a `/` in JavaScript would start a regular
//! expression or a division (`js_ctx`), what kind of attribute is being
//! parsed (`attr`), and which special element encloses the position
//! (`element`).
//!
//! Contexts have value semantics: transition functions copy, update, and
//! store them; nothing aliases a context across a write boundary.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum State {
    /// Plain HTML text between tags.
    #[default]
    Text,
    /// Inside a tag name, e.g. `<textar`.
    TagName,
    /// Inside a tag but not in a name or value, e.g. `<input |checked`.
    Tag,
    /// Inside an attribute name.
    AttrName,
    /// After an attribute name, before `=` or the next name.
    AfterName,
    /// After `=`, before the value.
    BeforeValue,
    /// Inside a plain attribute value.
    Attr,
    /// Inside a URL-valued attribute or CSS `url(...)` payload.
    Url,
    /// Inside JavaScript code.
    Js,
    /// Inside a double-quoted JS string.
    JsDqStr,
    /// Inside a single-quoted JS string.
    JsSqStr,
    /// Inside a JS regular expression literal.
    JsRegexp,
    /// Inside a JS `/* block comment */`.
    JsBlockCmt,
    /// Inside a JS `// line comment`.
    JsLineCmt,
    /// Inside CSS code.
    Css,
    /// Inside a double-quoted CSS string.
    CssDqStr,
    /// Inside a single-quoted CSS string.
    CssSqStr,
    /// Inside a double-quoted CSS `url("...")`.
    CssDqUrl,
    /// Inside a single-quoted CSS `url('...')`.
    CssSqUrl,
    /// Inside an unquoted CSS `url(...)`.
    CssUrl,
    /// Inside a CSS `/* block comment */`.
    CssBlockCmt,
    /// Inside a CSS `// line comment`.
    CssLineCmt,
    /// Inside an HTML or XML `<!-- comment -->`.
    MarkupCmt,
    /// Inside an RCDATA element body such as `<textarea>` or `<title>`.
    Rcdata,
    /// Inside a `<![CDATA[...]]>` section.
    Cdata,
    /// Inside XML text outside the HTML sublanguages.
    Xml,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Delim {
    /// Not inside an attribute value.
    #[default]
    None,
    /// `"` closes the value.
    DoubleQuote,
    /// `'` closes the value.
    SingleQuote,
    /// Whitespace or `>` closes the value. The writer inserts a `"` of its
    /// own for these, so downstream escaping can assume a quoted context.
    SpaceOrTagEnd,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UrlPart {
    /// No URL content seen yet.
    #[default]
    None,
    /// Before the first `?` or `#`.
    PreQuery,
    /// In the query or fragment.
    QueryOrFrag,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JsCtx {
    /// A following `/` starts a regular expression literal.
    #[default]
    Regexp,
    /// A following `/` is a division operator.
    DivOp,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AttrKind {
    #[default]
    None,
    /// The attribute value is script, e.g. `onclick`.
    Script,
    /// The attribute value is CSS, e.g. `style`.
    Style,
    /// The attribute value is a URL, e.g. `href` or `src`.
    Url,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Element {
    #[default]
    None,
    Script,
    Style,
    Textarea,
    Title,
    /// A foreign XML document or subtree entered via a doctype or an
    /// XML declaration.
    Xml,
}

/// The packed position record. See the module docs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Context {
    pub state: State,
    pub delim: Delim,
    pub url_part: UrlPart,
    pub js_ctx: JsCtx,
    pub attr: AttrKind,
    pub element: Element,
}

impl Context {
    /// The start context: HTML text at the top level.
    pub const TEXT: Context = Context {
        state: State::Text,
        delim: Delim::None,
        url_part: UrlPart::None,
        js_ctx: JsCtx::Regexp,
        attr: AttrKind::None,
        element: Element::None,
    };

    /// XML text with no HTML element tracking.
    pub const XML: Context = Context {
        state: State::Xml,
        delim: Delim::None,
        url_part: UrlPart::None,
        js_ctx: JsCtx::Regexp,
        attr: AttrKind::None,
        element: Element::Xml,
    };

    /// A tag interior with all per-attribute fields cleared.
    pub const GENERIC_TAG: Context = Context {
        state: State::Tag,
        delim: Delim::None,
        url_part: UrlPart::None,
        js_ctx: JsCtx::Regexp,
        attr: AttrKind::None,
        element: Element::None,
    };

    pub(crate) fn with_state(self, state: State) -> Context {
        Context { state, ..self }
    }

    pub(crate) fn with_element(self, element: Element) -> Context {
        Context { element, ..self }
    }

    /// Drops everything except the state and element, as happens when an
    /// attribute value ends.
    pub(crate) fn exit_attr(self) -> Context {
        Context {
            state: State::Tag,
            element: self.element,
            ..Context::TEXT
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}", self.state)?;
        if self.delim != Delim::None {
            write!(f, " delim={:?}", self.delim)?;
        }
        if self.url_part != UrlPart::None {
            write!(f, " urlPart={:?}", self.url_part)?;
        }
        if self.js_ctx != JsCtx::Regexp {
            write!(f, " jsCtx={:?}", self.js_ctx)?;
        }
        if self.attr != AttrKind::None {
            write!(f, " attr={:?}", self.attr)?;
        }
        if self.element != Element::None {
            write!(f, " element={:?}", self.element)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn exit_attr_keeps_element_only() {
        let c = Context {
            state: State::JsDqStr,
            delim: Delim::DoubleQuote,
            url_part: UrlPart::PreQuery,
            js_ctx: JsCtx::DivOp,
            attr: AttrKind::Script,
            element: Element::Script,
        };
        let c = c.exit_attr();
        assert_eq!(c.state, State::Tag);
        assert_eq!(c.delim, Delim::None);
        assert_eq!(c.url_part, UrlPart::None);
        assert_eq!(c.js_ctx, JsCtx::Regexp);
        assert_eq!(c.attr, AttrKind::None);
        assert_eq!(c.element, Element::Script);
    }

    #[test]
    fn display_elides_default_fields() {
        assert_eq!(Context::TEXT.to_string(), "[Text]");
        let c = Context {
            state: State::JsSqStr,
            delim: Delim::DoubleQuote,
            element: Element::Script,
            ..Context::TEXT
        };
        assert_eq!(
            c.to_string(),
            "[JsSqStr delim=DoubleQuote element=Script]"
        );
    }
}
