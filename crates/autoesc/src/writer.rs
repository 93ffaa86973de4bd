//! The escaping writer.
//!
//! An [`HtmlEscapingWriter`] receives chunks of trusted template text via
//! [`write_safe`](HtmlEscapingWriter::write_safe) and untrusted values via
//! [`write`](HtmlEscapingWriter::write). Trusted chunks advance a context
//! state machine that is simultaneously an HTML tokenizer, a JS tokenizer,
//! a CSS tokenizer, and a URL-part classifier; untrusted values are escaped
//! with whichever escaper that context calls for.
//!
//! For example, after the safe prefix `<a onclick="alert(` a JavaScript
//! value is expected, but after `<a href="/search?q=` a URL query
//! parameter is expected.

use crate::attr::attr_type;
use crate::content::{ContentType, Value};
use crate::context::{AttrKind, Context, Delim, Element, JsCtx, State, UrlPart};
use crate::css;
use crate::doctype;
use crate::entities;
use crate::error::{Error, Result};
use crate::html;
use crate::js;
use crate::replacement::ReplacementTable;
use crate::sink::{EscapingSink, TextSink};
use crate::str_fns::{starts_with_ignore_case, stripos, strpos};
use crate::url;
use crate::xml;

/// The escaper identities the selector can produce. Dispatch is a single
/// match, which keeps the policy matrix auditable: each
/// `(state, url_part, delim)` triple maps to exactly one of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Escaper {
    Elide,
    OneSpace,
    EscapeHtml,
    NormalizeHtml,
    EscapeXml,
    NormalizeXml,
    EscapeHtmlAttr,
    EscapeRcdata,
    EscapeCdata,
    EscapeUrl,
    NormalizeUrl,
    FilterUrl,
    FilterCssUrl,
    FilterCssValue,
    EscapeCss,
    EscapeJsValue,
    EscapeJsString,
    EscapeJsRegexp,
    FilterNameOnto,
}

pub struct HtmlEscapingWriter<W: TextSink> {
    out: W,
    context: Context,
    /// When processing attribute content, the value is unescaped so one
    /// state machine recognizes delimiters in both
    /// `<script>"quoted"</script>` and `<a href="&quot;quoted&quot;">`.
    /// This table reverses that unescaping before content reaches the
    /// sink. `None` means no transformation.
    rtable: Option<&'static ReplacementTable>,
    /// Set while re-running the scanner over trusted markup interpolated
    /// into an attribute value, so only non-tag content is emitted.
    is_stripping_tags: bool,
    /// While stripping, transition output inside tags and raw-text bodies
    /// is dropped instead of written.
    discarding: bool,
    /// See [`HtmlEscapingWriter::is_soft`].
    soft: bool,
    /// Buffers codepoint writes until a likely-safe break character.
    unsafe_buffered: String,
    poisoned: bool,
}

impl<W: TextSink> HtmlEscapingWriter<W> {
    pub fn new(out: W) -> Self {
        HtmlEscapingWriter {
            out,
            context: Context::TEXT,
            rtable: None,
            is_stripping_tags: false,
            discarding: false,
            soft: false,
            unsafe_buffered: String::new(),
            poisoned: false,
        }
    }

    /// Whether this writer interoperates with systems that HTML-escape
    /// inputs by default before they reach it. When soft, unsafe content in
    /// HTML text and attribute contexts is treated as partially escaped
    /// HTML instead of plain text: interpolating `foo&amp <bar>` into text
    /// yields `foo&amp &lt;bar&gt;` instead of `foo&amp;amp &lt;bar&gt;` —
    /// existing entities are not re-encoded.
    pub fn is_soft(&self) -> bool {
        self.soft
    }

    pub fn set_soft(&mut self, soft: bool) {
        self.soft = soft;
    }

    #[cfg(test)]
    pub(crate) fn context(&self) -> Context {
        self.context
    }

    /// Emits content from a trusted source such as a template author. The
    /// content may be normalized — attributes quoted, comments elided, a
    /// stray `<` escaped to `&lt;` — but is never converted from one type
    /// to another.
    pub fn write_safe(&mut self, s: &str) -> Result<()> {
        self.check_usable()?;
        self.flush()?;
        let mut off = 0;
        let end = s.len();
        while off < end {
            let oc = self.context;
            let noff = self.write_chunk(s, off, end)?;
            // Die early on infinite loops.
            debug_assert!(
                noff > off || (noff == off && oc.state != self.context.state),
                "no progress at {off}: {oc} -> {}",
                self.context
            );
            off = noff;
        }
        Ok(())
    }

    /// Emits a value from an untrusted source by encoding it in the
    /// context established by the safe strings written before it. Empty
    /// string values are ignored except in the few states where emitting
    /// nothing would change the meaning of the surrounding program.
    pub fn write(&mut self, v: &Value) -> Result<()> {
        self.check_usable()?;
        if v.is_empty_text() && self.ignore_empty_unsafe() {
            return Ok(());
        }
        self.flush()?;
        match self.write_unsafe_value(v) {
            Ok(()) => Ok(()),
            Err(e) => {
                /*
                 * Recovering from a failure mid-value is problematic since
                 * the output could sit at an inconsistent boundary. Refuse
                 * reuse of this instance instead.
                 */
                self.poison();
                Err(e)
            }
        }
    }

    /// Convenience for writing an untrusted string.
    pub fn write_str(&mut self, s: &str) -> Result<()> {
        self.check_usable()?;
        if s.is_empty() && self.ignore_empty_unsafe() {
            return Ok(());
        }
        self.write(&Value::Str(s.to_string()))
    }

    /// Buffers one untrusted codepoint. The buffer flushes on chunks: `/`
    /// occurs reasonably often in markup and cannot appear inside a URL
    /// protocol, where splitting a value could change how it filters.
    pub fn write_char(&mut self, c: char) -> Result<()> {
        self.check_usable()?;
        self.unsafe_buffered.push(c);
        if self.unsafe_buffered.len() > 128 && c == '/' {
            self.flush()?;
        }
        Ok(())
    }

    /// Drains the codepoint buffer by replaying it as one unsafe write.
    pub fn flush(&mut self) -> Result<()> {
        if self.unsafe_buffered.is_empty() {
            return Ok(());
        }
        let buffered = std::mem::take(&mut self.unsafe_buffered);
        self.write(&Value::Str(buffered))
    }

    /// Flushes and closes the underlying sink, and reports an error if a
    /// full, valid fragment has not been written — i.e. if the context did
    /// not end in text. A document that switched into XML mode never
    /// returns to the HTML text state, so XML text is the terminal state
    /// for those documents.
    pub fn close(mut self) -> Result<W> {
        self.check_usable()?;
        self.flush()?;
        self.out.close()?;
        if !matches!(self.context.state, State::Text | State::Xml) {
            return Err(Error::IncompleteDocument(self.context));
        }
        Ok(self.out)
    }

    /// Releases the sink without the end-of-document checks.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn check_usable(&self) -> Result<()> {
        if self.poisoned {
            return Err(Error::Poisoned);
        }
        Ok(())
    }

    fn poison(&mut self) {
        self.poisoned = true;
        self.context = Context::TEXT;
        self.rtable = None;
        self.unsafe_buffered = String::new();
    }

    /// Normally an empty value moves nothing, but in some contexts the
    /// empty output is significant:
    /// in `AfterName`, a valueless attribute would adopt the next
    /// attribute's value; in `Js`, a statement could be pulled left across
    /// an inserted semicolon; in `JsRegexp`, `/$x/` would become a line
    /// comment; in `Tag`, an attribute name must appear.
    fn ignore_empty_unsafe(&self) -> bool {
        !matches!(
            self.context.state,
            State::AfterName | State::Js | State::JsRegexp | State::Tag
        )
    }

    fn write_unsafe_value(&mut self, v: &Value) -> Result<()> {
        self.nudge()?;
        let esc = self.choose_escaper()?;
        if esc == Escaper::EscapeHtmlAttr {
            return self.escape_html_attr_onto(v);
        }

        /*
         * Wrap the sink to re-encode the active attribute delimiter in the
         * escaper's output. This lets the JS/CSS escapers behave the same
         * whether the code sits in a <script> or an onclick="...". Unquoted
         * attributes got a double quote inserted, so they re-encode as
         * double-quoted.
         */
        let wrap: Option<&'static ReplacementTable> = match self.context.delim {
            Delim::None => None,
            Delim::SingleQuote => Some(&html::HTML_DQ_OK),
            Delim::DoubleQuote | Delim::SpaceOrTagEnd => Some(&html::HTML_SQ_OK),
        };

        let mut context = self.context;
        let result = match wrap {
            None => run_escaper(&mut context, esc, v, &mut self.out),
            Some(table) => {
                let mut sink = EscapingSink::new(&mut self.out, table);
                run_escaper(&mut context, esc, v, &mut sink)
            }
        };
        self.context = context;
        result
    }

    /// Selects the escaper for the current context and applies any context
    /// effects the selection implies.
    fn choose_escaper(&mut self) -> Result<Escaper> {
        let c = self.context;
        Ok(match c.state {
            State::Url
            | State::CssDqStr
            | State::CssSqStr
            | State::CssDqUrl
            | State::CssSqUrl
            | State::CssUrl => match c.url_part {
                UrlPart::None => match c.state {
                    /*
                     * Conservatively treat <style>background: "$x"</style>
                     * as a URL to prevent protocol injection, but CSS
                     * escape the value instead of URL normalizing it.
                     */
                    State::CssDqStr | State::CssSqStr => Escaper::FilterCssUrl,
                    _ => Escaper::FilterUrl,
                },
                UrlPart::PreQuery => match c.state {
                    State::CssDqStr | State::CssSqStr => Escaper::EscapeCss,
                    _ => Escaper::NormalizeUrl,
                },
                UrlPart::QueryOrFrag => Escaper::EscapeUrl,
            },
            State::Js => {
                // A slash after a value starts a div operator.
                self.context.js_ctx = JsCtx::DivOp;
                Escaper::EscapeJsValue
            }
            State::JsDqStr | State::JsSqStr => Escaper::EscapeJsString,
            State::JsRegexp => Escaper::EscapeJsRegexp,
            State::Css => Escaper::FilterCssValue,
            State::Text => {
                if self.soft {
                    Escaper::NormalizeHtml
                } else {
                    Escaper::EscapeHtml
                }
            }
            State::Xml => {
                if self.soft {
                    Escaper::NormalizeXml
                } else {
                    Escaper::EscapeXml
                }
            }
            State::Cdata => {
                if c.element == Element::Xml {
                    Escaper::EscapeCdata
                } else {
                    // The content is being normalized to a text node, so
                    // treat it as RCDATA, which handles known-safe markup.
                    Escaper::EscapeRcdata
                }
            }
            State::Rcdata => Escaper::EscapeRcdata,
            State::Attr => Escaper::EscapeHtmlAttr,
            State::AttrName | State::TagName => Escaper::FilterNameOnto,
            State::JsBlockCmt | State::JsLineCmt | State::CssBlockCmt | State::CssLineCmt => {
                // Comment contents are elided from safe text, so skip any
                // value written into one.
                Escaper::Elide
            }
            State::MarkupCmt => {
                if c.element == Element::Xml {
                    // Prevent dashes inside a preserved comment from
                    // merging into a -- sequence that closes it early.
                    Escaper::OneSpace
                } else {
                    Escaper::Elide
                }
            }
            State::Tag | State::AfterName | State::BeforeValue => {
                return Err(Error::Template(format!("unexpected state {c}")));
            }
        })
    }

    /// Follows the empty-string transitions out of a transitional context.
    /// Parsing `<a href=` ends in `BeforeValue`, but one more character
    /// `<a href=x` would end inside the value; nudging performs the first
    /// of those two transitions so the untrusted write is treated as the
    /// value itself.
    fn nudge(&mut self) -> Result<()> {
        match self.context.state {
            State::Tag => {
                // In `<foo $x`, the value is an attribute name.
                self.context.state = State::AttrName;
            }
            State::BeforeValue => {
                // Open a double quote to match the one the scanner emits
                // when it sees an unquoted value start.
                self.out.write_char('"')?;
                self.context = Context {
                    state: attr_start_state(self.context.attr),
                    delim: Delim::SpaceOrTagEnd,
                    attr: AttrKind::None,
                    ..self.context
                };
            }
            State::AfterName => {
                // In `<foo bar $x`, the value is a replacement name.
                self.context.state = State::AttrName;
                self.context.attr = AttrKind::None;
            }
            _ => {}
        }
        Ok(())
    }

    /// Escapes a value for a plain attribute context. A Markup-tagged
    /// value is stripped of its tags instead, so only its text content
    /// lands in the attribute.
    fn escape_html_attr_onto(&mut self, v: &Value) -> Result<()> {
        if let Some(safe) = v.deref_safe(ContentType::Markup) {
            return match self.strip_tags(safe, self.context.delim) {
                // A parse failure truncates the value; the content already
                // written is plain text normalized as an attribute.
                Err(Error::Template(_)) => Ok(()),
                other => other,
            };
        }
        let table = self.attr_value_escaper();
        table
            .escape_onto(&v.text(), &mut self.out)
            .map_err(Error::from)
    }

    fn attr_value_escaper(&self) -> &'static ReplacementTable {
        match self.context.delim {
            Delim::None => {
                if self.soft {
                    &html::NORM_REPLACEMENT_TABLE
                } else {
                    &html::REPLACEMENT_TABLE
                }
            }
            Delim::SingleQuote => {
                if self.soft {
                    &html::NORM_HTML_DQ_OK
                } else {
                    &html::HTML_DQ_OK
                }
            }
            _ => {
                if self.soft {
                    &html::NORM_HTML_SQ_OK
                } else {
                    &html::HTML_SQ_OK
                }
            }
        }
    }

    /// Takes a snippet of trusted HTML and writes only its text content,
    /// e.g. `<b>&iexcl;Hi!</b> <script>alert(1)</script>` → `&iexcl;Hi! `.
    ///
    /// This reuses the context state machine with output redirected: while
    /// in a text or RCDATA state the content is emitted (normalized for
    /// the active attribute delimiter), everywhere else it is discarded.
    fn strip_tags(&mut self, s: &str, delim: Delim) -> Result<()> {
        let ortable = self.rtable;
        let ocontext = self.context;
        let odiscarding = self.discarding;
        let normtable: &'static ReplacementTable = if delim == Delim::SingleQuote {
            &html::NORM_HTML_DQ_OK
        } else {
            &html::NORM_HTML_SQ_OK
        };
        self.context = Context::TEXT;
        self.is_stripping_tags = true;

        let result = self.strip_tags_loop(s, normtable);

        self.rtable = ortable;
        self.context = ocontext;
        self.discarding = odiscarding;
        self.is_stripping_tags = false;
        result
    }

    fn strip_tags_loop(
        &mut self,
        s: &str,
        normtable: &'static ReplacementTable,
    ) -> Result<()> {
        let mut off = 0;
        let end = s.len();
        // Using the transition functions avoids mangling
        // `<div title="1>2">` or `I <3 Ponies!`.
        while off < end {
            if self.context.delim != Delim::None {
                break;
            }
            match self.context.state {
                State::Text => {
                    self.discarding = false;
                    self.rtable = Some(normtable);
                }
                State::Rcdata => {
                    let i = match self.find_special_tag_end(s, off, end) {
                        None => break,
                        Some(i) => i,
                    };
                    if self.context.element == Element::Textarea {
                        let tag_start = s[..i].rfind('<').unwrap_or(off);
                        normtable.escape_onto(&s[off..tag_start], &mut self.out)?;
                    }
                    off = i;
                    self.context = Context::GENERIC_TAG;
                    continue;
                }
                _ => {
                    self.discarding = true;
                    self.rtable = None;
                }
            }
            off = self.transition(s, off, end)?;
        }
        Ok(())
    }

    /// Processes one step of a safe chunk: either a whole attribute value
    /// or one transition. Returns the offset of the remaining unprocessed
    /// portion.
    fn write_chunk(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        if self.context.delim == Delim::None {
            if let Some(i) = self.find_special_tag_end(s, off, end) {
                // A special end tag such as `</script>` is ahead; consume
                // all content before it in the current sublanguage, then
                // drop back into HTML text.
                let mut off = off;
                while off != i {
                    off = self.transition(s, off, i)?;
                }
                self.context = Context::TEXT;
                return Ok(i);
            }
            return self.transition(s, off, end);
        }

        // Inside an attribute value: find its end and set the table that
        // re-encodes the value on the way out.
        let bytes = s.as_bytes();
        let mut value_end = end; // After any close quote.
        let mut content_end = end; // Before any close quote.
        match self.context.delim {
            Delim::DoubleQuote => {
                let at = off + strcspn!(&bytes[..end], b'"', off);
                if at < end {
                    content_end = at;
                    value_end = at + 1;
                }
                self.rtable = Some(&html::HTML_SQ_OK);
            }
            Delim::SingleQuote => {
                let at = off + strcspn!(&bytes[..end], b'\'', off);
                if at < end {
                    content_end = at;
                    value_end = at + 1;
                }
                self.rtable = Some(&html::HTML_DQ_OK);
            }
            Delim::SpaceOrTagEnd => {
                /*
                 * Browsers close unquoted attribute values on '\t', '\n',
                 * '\f', '\r', ' ', and '>'. Treating every control
                 * character as a breaker is safe because the inserted
                 * quotes pick up the slack.
                 */
                let at = off + strcspn!(&bytes[..end], b'>' | 0x00..=0x20, off);
                if at < end {
                    content_end = at;
                    value_end = at;
                }
                /*
                 * HTML parsers differ on whether
                 * `<a id= onclick=f(`       ends inside id's or onclick's value,
                 * `<a class=`foo `          ends inside a value,
                 * `<a style=font:'Arial'`   needs open-quote fixup,
                 * so these characters are errors in unquoted values.
                 * IE treats '`' as a quotation character.
                 */
                for i in off..value_end {
                    if matches!(bytes[i], b'"' | b'\'' | b'<' | b'=' | b'`') {
                        return Err(Error::template_at(
                            s,
                            off,
                            i,
                            value_end,
                            &format!("{} in unquoted attr: ", bytes[i] as char),
                        ));
                    }
                }
                // The scanner inserted an open double quote for this value.
                self.rtable = Some(&html::HTML_SQ_OK);
            }
            Delim::None => unreachable!("checked above"),
        }

        /*
         * Unescape character references so the nested sublanguage scan
         * sees logical characters; rtable re-applies a quote-preserving
         * encoding on emission.
         */
        match entities::maybe_unescape(&s[off..content_end]) {
            Some(u) => {
                let mut offu = 0;
                let endu = u.len();
                while offu < endu {
                    offu = self.transition(&u, offu, endu)?;
                }
            }
            None => {
                let mut o = off;
                while o < content_end {
                    o = self.transition(s, o, content_end)?;
                }
            }
        }
        if content_end == end {
            return Ok(end); // Remain inside the attribute.
        }
        self.rtable = None;
        if self.context.delim == Delim::SpaceOrTagEnd {
            // Close the quote the scanner introduced.
            self.write_out("\"")?;
        } else {
            self.emit(s, content_end, value_end)?;
        }
        // On exiting an attribute, discard everything but state and element.
        self.context = self.context.exit_attr();
        Ok(value_end)
    }

    fn transition(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        match self.context.state {
            State::Text => self.t_text(s, off, end),
            State::TagName => self.t_tag_name(s, off, end),
            State::Tag => self.t_tag(s, off, end),
            State::AttrName => self.t_attr_name(s, off, end),
            State::AfterName => self.t_after_name(s, off, end),
            State::BeforeValue => self.t_before_value(s, off, end),
            State::MarkupCmt => self.t_markup_cmt(s, off, end),
            State::Rcdata => self.t_rcdata(s, off, end),
            State::Cdata => self.t_cdata(s, off, end),
            State::Attr => self.t_attr(s, off, end),
            State::Url => self.t_url(s, off, end),
            State::Js => self.t_js(s, off, end),
            State::JsDqStr | State::JsSqStr | State::JsRegexp => self.t_js_delimited(s, off, end),
            State::JsBlockCmt | State::CssBlockCmt => self.t_block_cmt(s, off, end),
            State::JsLineCmt | State::CssLineCmt => self.t_line_cmt(s, off, end),
            State::Css => self.t_css(s, off, end),
            State::CssDqStr
            | State::CssSqStr
            | State::CssDqUrl
            | State::CssSqUrl
            | State::CssUrl => self.t_css_str(s, off, end),
            State::Xml => self.t_xml(s, off, end),
        }
    }

    /// Transition function for HTML text.
    fn t_text(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let bytes = s.as_bytes();
        let mut off = off;
        loop {
            let lt = off + strcspn!(&bytes[..end], b'<', off);
            if lt + 1 >= end {
                // At end or not found.
                self.emit(s, off, lt)?;
                if lt < end {
                    self.write_out("&lt;")?;
                }
                return Ok(end);
            }
            let next = bytes[lt + 1];
            let mut is_doctype = false;
            if next == b'!' {
                if lt + 4 <= end {
                    if bytes[lt + 2] == b'-' && bytes[lt + 3] == b'-' {
                        self.context.state = State::MarkupCmt;
                        self.emit(s, off, lt)?; // Elide <!--
                        return Ok(lt + 4);
                    } else if slice_at(bytes, lt + 2, end, b"[CDATA[") {
                        self.context.state = State::Cdata;
                        self.emit(s, off, lt)?;
                        return Ok(lt + 9); // Elide <![CDATA[
                    }
                    is_doctype = end - (lt + 1) >= 8
                        && starts_with_ignore_case(bytes, lt + 1, b"!doctype");
                }
            } else if next == b'?' {
                // XMLDecl ::= '<?xml' VersionInfo EncodingDecl? SDDecl? S? '?>'
                if slice_at(bytes, lt + 2, end, b"xml") {
                    self.context = Context::XML;
                    self.emit(s, off, lt + 5)?;
                    return Ok(lt + 5);
                }
            } else {
                let mut tag_start = lt + 1;
                let mut is_end_tag = false;
                if bytes[tag_start] == b'/' {
                    if tag_start + 1 == end {
                        self.emit(s, off, lt)?;
                        self.write_out("&lt;/")?;
                        return Ok(end);
                    }
                    is_end_tag = true;
                    tag_start += 1;
                }
                let tag_end = eat_tag_name(bytes, tag_start, end);
                if tag_start != tag_end {
                    // An HTML tag.
                    let el = if is_end_tag {
                        Element::None
                    } else {
                        classify_tag_name(&bytes[tag_start..tag_end])
                    };
                    self.context.state = State::TagName;
                    self.context.element = el;
                    let emit_to = if self.is_stripping_tags { lt } else { tag_end };
                    self.emit(s, off, emit_to)?;
                    return Ok(tag_end);
                }
            }
            if self.is_stripping_tags || !is_doctype {
                // A "<" that opens no token is plain text, e.g. "I <3 Ponies!".
                self.emit(s, off, lt)?;
                self.write_out("&lt;")?;
                off = lt + 1;
            } else {
                self.emit(s, off, lt + 9)?;
                off = lt + 9;
                // Switch to XML mode on a doctype for an XML kind that
                // cannot appear as foreign content in an HTML5 document.
                if doctype::classify(&s[off..end]) != State::Text {
                    self.context = Context::XML;
                    return Ok(off);
                }
            }
        }
    }

    /// Transition function for the tag name state.
    fn t_tag_name(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let i = eat_tag_name(s.as_bytes(), off, end);
        if i == end {
            self.emit(s, off, end)?;
            return Ok(end);
        }
        self.emit(s, off, i)?;
        self.context.state = State::Tag;
        Ok(i)
    }

    /// Transition function for the tag state: finds the next attribute
    /// name or the tag end.
    fn t_tag(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let bytes = s.as_bytes();
        let i;
        if !self.is_stripping_tags {
            i = eat_whitespace(bytes, off, end);
            if i == end {
                self.emit(s, off, end)?;
                return Ok(end);
            }
        } else {
            // When stripping there is no need to parse attribute context,
            // and malformed names or values are not errors; just find the
            // tag end outside any quotes.
            let mut delim = 0u8;
            let mut j = off;
            while j < end {
                match bytes[j] {
                    b'>' if delim == 0 => break,
                    ch @ (b'"' | b'\'') => {
                        if delim == ch {
                            delim = 0;
                        } else if delim == 0 {
                            delim = ch;
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
            i = j;
            if i == end {
                if delim != 0 {
                    self.context.state = State::Attr;
                    self.context.delim = if delim == b'"' {
                        Delim::DoubleQuote
                    } else {
                        Delim::SingleQuote
                    };
                }
                return Ok(end);
            }
        }
        if bytes[i] == b'>' {
            self.emit(s, off, i + 1)?;
            let element = self.context.element;
            if element == Element::Xml {
                self.context = Context::XML;
                return Ok(i + 1);
            }
            self.context.state = if element == Element::None {
                State::Text
            } else if self.is_stripping_tags {
                // Treat all special content as RCDATA while stripping to
                // avoid parsing CSS and JS that will be discarded anyway.
                State::Rcdata
            } else {
                match element {
                    Element::Script => State::Js,
                    Element::Style => State::Css,
                    _ => State::Rcdata,
                }
            };
            return Ok(i + 1);
        }
        let j = eat_attr_name(s, i, end)?;
        if i == j {
            return Err(Error::template_at(
                s,
                off,
                i,
                end,
                "expected space, attr name, or end of tag, but got ",
            ));
        }
        let attr = match attr_type(&bytes[i..j]) {
            ContentType::Url => AttrKind::Url,
            ContentType::Css => AttrKind::Style,
            ContentType::Js => AttrKind::Script,
            _ => AttrKind::None,
        };
        self.context.state = if j == end {
            State::AttrName
        } else {
            State::AfterName
        };
        self.context.attr = attr;
        self.emit(s, off, j)?;
        Ok(j)
    }

    /// Transition function for an in-progress attribute name.
    fn t_attr_name(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let i = eat_attr_name(s, off, end)?;
        if i != end {
            self.context.state = State::AfterName;
        }
        self.emit(s, off, i)?;
        Ok(i)
    }

    /// Transition function for the space between a name and its value.
    fn t_after_name(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let bytes = s.as_bytes();
        let i = eat_whitespace(bytes, off, end);
        if i == end {
            self.emit(s, off, end)?;
            return Ok(end);
        }
        if bytes[i] != b'=' {
            // A tag-ending '>' or a valueless attribute.
            self.context.state = State::Tag;
            self.emit(s, off, i)?;
            return Ok(i);
        }
        self.context.state = State::BeforeValue;
        // Consume the "=".
        self.emit(s, off, i + 1)?;
        Ok(i + 1)
    }

    /// Transition function for the position right before a value.
    fn t_before_value(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let bytes = s.as_bytes();
        let mut off = off;
        let mut i = eat_whitespace(bytes, off, end);
        if i == end {
            self.emit(s, off, end)?;
            return Ok(end);
        }
        let delim = match bytes[i] {
            b'\'' => {
                i += 1;
                Delim::SingleQuote
            }
            b'"' => {
                i += 1;
                Delim::DoubleQuote
            }
            _ => {
                /*
                 * Quote an unquoted value so everything downstream can
                 * assume a quoted context; the matching close quote is
                 * written when the value ends.
                 */
                self.emit(s, off, i)?;
                self.write_out("\"")?;
                off = i;
                Delim::SpaceOrTagEnd
            }
        };
        self.context = Context {
            state: attr_start_state(self.context.attr),
            delim,
            attr: AttrKind::None,
            ..self.context
        };
        self.emit(s, off, i)?;
        Ok(i)
    }

    /// Transition function for `<!-- comments -->`. HTML comments are
    /// elided; XML comments are preserved.
    fn t_markup_cmt(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let is_xml = self.context.element == Element::Xml;
        match strpos(&s.as_bytes()[..end], b"-->", off) {
            Some(i) => {
                if is_xml {
                    self.emit(s, off, i + 3)?;
                    self.context = Context::XML;
                } else {
                    // Do not emit.
                    self.context = Context::TEXT;
                }
                Ok(i + 3)
            }
            None => {
                if is_xml {
                    self.emit(s, off, end)?;
                }
                Ok(end)
            }
        }
    }

    /// Looks ahead for the end tag that closes the current special
    /// element's body, e.g. `</script` for `<script>...`, and returns the
    /// offset just past its tag name.
    fn find_special_tag_end(&self, s: &str, off: usize, end: usize) -> Option<usize> {
        let needle: &[u8] = match self.context.element {
            Element::Script => b"</script",
            Element::Style => b"</style",
            Element::Textarea => b"</textarea",
            Element::Title => b"</title",
            Element::None | Element::Xml => return None,
        };
        let bytes = s.as_bytes();
        let mut at = off;
        while let Some(lt) = stripos(&bytes[..end], needle, at) {
            let j = lt + needle.len();
            /*
             * Ensure the tag name terminates to avoid matching on
             * substrings of a longer name: "</textarearug" must not end a
             * "</textarea" region even though the needle occurs in it.
             */
            if eat_tag_name(bytes, lt + 2, end) == j {
                return Some(j);
            }
            at = lt + 2;
        }
        None
    }

    /// Transition function for RCDATA element bodies. Content is
    /// normalized so it cannot open a tag, until the matching end tag.
    fn t_rcdata(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let found = self.find_special_tag_end(s, off, end);
        self.rtable = Some(&html::NORM_REPLACEMENT_TABLE);
        match found {
            Some(i) => {
                let tag_start = s[..i].rfind('<').unwrap_or(off);
                self.emit(s, off, tag_start)?;
                self.rtable = None;
                self.emit(s, tag_start, i)?;
                self.context = Context::TEXT;
                Ok(i)
            }
            None => {
                self.emit(s, off, end)?;
                Ok(end)
            }
        }
    }

    /// Transition function for `<![CDATA[...]]>` sections, whether inside
    /// a foreign XML element or not.
    fn t_cdata(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let is_xml = self.context.element == Element::Xml;
        let bytes = s.as_bytes();
        let mut pos = off;
        let mut i = off;
        while i < end {
            // Normalize HTML text special characters.
            let repl = match bytes[i] {
                b'>' => {
                    // ]]> ends the section.
                    if i >= off + 2 && bytes[i - 1] == b']' && bytes[i - 2] == b']' {
                        if is_xml {
                            self.emit(s, pos, i + 1)?;
                            self.context = Context::XML;
                        } else {
                            self.emit(s, pos, i - 2)?;
                            // Elide the ]]>
                            self.context = Context::TEXT;
                        }
                        return Ok(i + 1);
                    }
                    "&gt;"
                }
                b'&' => "&amp;",
                b'<' => "&lt;",
                _ => {
                    i += 1;
                    continue;
                }
            };
            if !is_xml {
                self.emit(s, pos, i)?;
                self.write_out(repl)?;
                pos = i + 1;
            }
            i += 1;
        }
        self.emit(s, pos, end)?;
        Ok(end)
    }

    /// Transition function for a plain attribute value.
    fn t_attr(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        self.emit(s, off, end)?;
        Ok(end)
    }

    /// Transition function for URL attribute values.
    fn t_url(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        self.context.url_part = url::next_url_part(&s[off..end], self.context.url_part);
        self.emit(s, off, end)?;
        Ok(end)
    }

    /// Transition function for JavaScript code.
    fn t_js(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let bytes = s.as_bytes();
        let mut i = off;
        while i < end {
            match bytes[i] {
                quote @ (b'"' | b'\'') => {
                    self.context.state = if quote == b'"' {
                        State::JsDqStr
                    } else {
                        State::JsSqStr
                    };
                    self.context.js_ctx = JsCtx::Regexp;
                    self.emit(s, off, i + 1)?;
                    return Ok(i + 1);
                }
                b'/' => {
                    self.update_js_ctx(&s[off..i]);
                    if i + 1 < end {
                        if bytes[i + 1] == b'/' {
                            self.context.state = State::JsLineCmt;
                            self.emit(s, off, i)?;
                            return Ok(i + 2);
                        } else if bytes[i + 1] == b'*' {
                            self.context.state = State::JsBlockCmt;
                            self.emit(s, off, i)?;
                            return Ok(i + 2);
                        }
                    }
                    match self.context.js_ctx {
                        JsCtx::Regexp => {
                            self.context.state = State::JsRegexp;
                            self.emit(s, off, i + 1)?;
                            return Ok(i + 1);
                        }
                        JsCtx::DivOp => {
                            // After a division the next slash could start
                            // a regexp again.
                            self.context.js_ctx = JsCtx::Regexp;
                        }
                    }
                }
                _ => {}
            }
            i += 1;
        }
        self.update_js_ctx(&s[off..end]);
        self.emit(s, off, end)?;
        Ok(end)
    }

    /// Transition function for JS strings and regexp literals.
    fn t_js_delimited(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let bytes = s.as_bytes();
        let mut in_charset = false;
        let mut off = off;
        loop {
            let mut i = off;
            match self.context.state {
                State::JsDqStr => {
                    i += strcspn!(&bytes[..end], b'\\' | b'"', i);
                }
                State::JsSqStr => {
                    i += strcspn!(&bytes[..end], b'\\' | b'\'', i);
                }
                State::JsRegexp => {
                    i += strcspn!(&bytes[..end], b'\\' | b'/' | b'[' | b']', i);
                }
                _ => unreachable!("t_js_delimited from {}", self.context),
            }
            if i == end {
                break;
            }
            match bytes[i] {
                b'\\' => {
                    i += 1;
                    if i == end {
                        return Err(Error::template_at(
                            s,
                            off,
                            i - 1,
                            end,
                            "unfinished escape sequence in JS string: ",
                        ));
                    }
                    // Consume the whole escaped codepoint so the emit
                    // below lands on a character boundary.
                    i += char_len_at(bytes, i) - 1;
                }
                b'[' => in_charset = true,
                b']' => in_charset = false,
                _ => {
                    // The end delimiter, unless inside a regexp charset.
                    if !in_charset {
                        self.context.state = State::Js;
                        self.context.js_ctx = JsCtx::DivOp;
                        self.emit(s, off, i + 1)?;
                        return Ok(i + 1);
                    }
                }
            }
            self.emit(s, off, i + 1)?;
            off = i + 1;
        }

        if in_charset {
            // This could be supported by making the context richer if
            // interpolation into charsets is ever needed.
            return Err(Error::template_at(
                s,
                off,
                end,
                end,
                "unfinished JS regexp charset: ",
            ));
        }
        self.emit(s, off, end)?;
        Ok(end)
    }

    /// Transition function for `/* block comments */` in JS or CSS. The
    /// content is elided; the whole comment collapses to one space, or a
    /// newline when a JS comment contained a line terminator, which
    /// matters for automatic semicolon insertion.
    fn t_block_cmt(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let is_js = self.context.state == State::JsBlockCmt;
        let bytes = s.as_bytes();
        let mut replacement = " ";
        let mut i = off;
        while i < end {
            if bytes[i] == b'*' && i + 1 < end && bytes[i + 1] == b'/' {
                self.context.state = if is_js { State::Js } else { State::Css };
                // Do not emit the contents.
                self.write_out(replacement)?;
                return Ok(i + 2);
            }
            if is_js && (matches!(bytes[i], b'\r' | b'\n') || is_line_sep_at(bytes, i, end)) {
                replacement = "\n";
            }
            i += 1;
        }
        // Do not emit.
        self.write_out(replacement)?;
        Ok(end)
    }

    /// Transition function for `// line comments`. The terminator itself
    /// is not part of the comment; it is emitted by the following state.
    fn t_line_cmt(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let is_js = self.context.state == State::JsLineCmt;
        let bytes = s.as_bytes();
        let mut i = off;
        while i < end {
            let terminated = if is_js {
                matches!(bytes[i], b'\n' | b'\r') || is_line_sep_at(bytes, i, end)
            } else {
                /*
                 * Line comments are not part of any published CSS standard
                 * but the major browsers support them. CSS3 defines
                 * newlines as #xA | #xD #xA | #xD | #xC.
                 */
                matches!(bytes[i], b'\n' | b'\r' | b'\x0C')
            };
            if terminated {
                self.context.state = if is_js { State::Js } else { State::Css };
                break;
            }
            i += 1;
        }
        Ok(i)
    }

    /// Transition function for CSS code.
    fn t_css(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        /*
         * CSS quoted strings are almost never used except for URLs
         * (background: "/foo.png"), multiword font names, list separators
         * in content values, and attribute value selectors. All strings
         * are conservatively treated as URLs: for font names that is
         * harmless since valid names never contain ':', '?', or '#', and
         * for the others only RFC 3986 reserved characters get encoded.
         */
        let bytes = s.as_bytes();
        let mut off = off;
        loop {
            let i = off + strcspn!(&bytes[..end], b'(' | b'"' | b'\'' | b'/', off);
            if i == end {
                self.emit(s, off, end)?;
                return Ok(end);
            }
            match bytes[i] {
                b'(' => {
                    // Look for url to the left.
                    let mut p = i;
                    while p > off && css::is_css_space(bytes[p - 1]) {
                        p -= 1;
                    }
                    if p >= off + 3 && bytes[p - 3..p].eq_ignore_ascii_case(b"url") {
                        let mut j = i + 1;
                        while j < end && css::is_css_space(bytes[j]) {
                            j += 1;
                        }
                        self.context.state = if j < end && bytes[j] == b'"' {
                            j += 1;
                            State::CssDqUrl
                        } else if j < end && bytes[j] == b'\'' {
                            j += 1;
                            State::CssSqUrl
                        } else {
                            State::CssUrl
                        };
                        self.emit(s, off, j)?;
                        return Ok(j);
                    }
                }
                b'/' => {
                    if i + 1 < end {
                        match bytes[i + 1] {
                            b'/' => {
                                self.context.state = State::CssLineCmt;
                                self.emit(s, off, i)?; // Skip the comment open.
                                return Ok(i + 2);
                            }
                            b'*' => {
                                self.context.state = State::CssBlockCmt;
                                self.emit(s, off, i)?; // Skip the comment open.
                                return Ok(i + 2);
                            }
                            _ => {}
                        }
                    }
                }
                b'"' => {
                    self.context.state = State::CssDqStr;
                    self.emit(s, off, i + 1)?;
                    return Ok(i + 1);
                }
                b'\'' => {
                    self.context.state = State::CssSqStr;
                    self.emit(s, off, i + 1)?;
                    return Ok(i + 1);
                }
                _ => unreachable!("strcspn stopped on an unknown byte"),
            }
            self.emit(s, off, i + 1)?;
            off = i + 1;
        }
    }

    /// Transition function for CSS strings and `url(...)` payloads.
    fn t_css_str(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let bytes = s.as_bytes();
        let mut off = off;
        loop {
            let mut i = off;
            match self.context.state {
                State::CssDqStr | State::CssDqUrl => {
                    i += strcspn!(&bytes[..end], b'\\' | b'"', i);
                }
                State::CssSqStr | State::CssSqUrl => {
                    i += strcspn!(&bytes[..end], b'\\' | b'\'', i);
                }
                State::CssUrl => {
                    // Unquoted URLs end with whitespace or a close paren.
                    while i < end
                        && bytes[i] != b'\\'
                        && !css::is_css_space(bytes[i])
                        && bytes[i] != b')'
                    {
                        i += 1;
                    }
                }
                _ => unreachable!("t_css_str from {}", self.context),
            }
            if i == end {
                self.advance_url_part_decoded(&s[off..end]);
                self.emit(s, off, end)?;
                return Ok(end);
            }
            if bytes[i] == b'\\' {
                i += 1;
                if i == end {
                    return Err(Error::template_at(
                        s,
                        off,
                        i - 1,
                        end,
                        "unfinished escape sequence in CSS string: ",
                    ));
                }
                i += char_len_at(bytes, i) - 1;
            } else {
                self.context.state = State::Css;
                self.emit(s, off, i + 1)?;
                return Ok(i + 1);
            }
            self.advance_url_part_decoded(&s[off..i + 1]);
            self.emit(s, off, i + 1)?;
            off = i + 1;
        }
    }

    /// URL-part analysis over CSS content operates on the logical
    /// characters, so backslash escapes are decoded first.
    fn advance_url_part_decoded(&mut self, chunk: &str) {
        self.context.url_part = match css::maybe_decode_css(chunk) {
            Some(decoded) => url::next_url_part(&decoded, self.context.url_part),
            None => url::next_url_part(chunk, self.context.url_part),
        };
    }

    /// Transition function for XML text.
    fn t_xml(&mut self, s: &str, off: usize, end: usize) -> Result<usize> {
        let bytes = s.as_bytes();
        let mut off = off;
        loop {
            let lt = off + strcspn!(&bytes[..end], b'<', off);
            if lt + 1 >= end {
                // At end or not found.
                self.emit(s, off, lt)?;
                if lt < end {
                    self.write_out("&lt;")?;
                }
                return Ok(end);
            }
            if lt + 4 <= end && bytes[lt + 1] == b'!' {
                if bytes[lt + 2] == b'-' && bytes[lt + 3] == b'-' {
                    // XML comments are preserved, marker included.
                    self.context.state = State::MarkupCmt;
                    self.context.element = Element::Xml;
                    self.emit(s, off, lt + 4)?;
                    return Ok(lt + 4);
                } else if slice_at(bytes, lt + 2, end, b"[CDATA[") {
                    self.context.state = State::Cdata;
                    self.context.element = Element::Xml;
                    self.emit(s, off, lt + 9)?;
                    return Ok(lt + 9);
                }
            }
            let mut tag_start = lt + 1;
            if bytes[tag_start] == b'/' {
                if tag_start + 1 == end {
                    self.emit(s, off, lt)?;
                    self.write_out("&lt;/")?;
                    return Ok(end);
                }
                tag_start += 1;
            }
            let tag_end = eat_tag_name(bytes, tag_start, end);
            if tag_start != tag_end {
                // An XML tag.
                self.context.state = State::TagName;
                self.context.element = Element::Xml;
                let emit_to = if self.is_stripping_tags { lt } else { tag_end };
                self.emit(s, off, emit_to)?;
                return Ok(tag_end);
            }
            self.emit(s, off, lt + 1)?;
            off = lt + 1;
        }
    }

    /// Updates the slash disambiguation from a run of JS tokens.
    fn update_js_ctx(&mut self, run: &str) {
        self.context.js_ctx = js::next_js_ctx(run, self.context.js_ctx);
    }

    /// Writes `s[off..end]` with any active re-encoding applied.
    fn emit(&mut self, s: &str, off: usize, end: usize) -> Result<()> {
        if self.discarding || off >= end {
            return Ok(());
        }
        match self.rtable {
            Some(table) => table.escape_onto(&s[off..end], &mut self.out)?,
            None => self.out.write_str(&s[off..end])?,
        }
        Ok(())
    }

    /// Writes synthesized output (inserted quotes, `&lt;`, comment
    /// replacements), which bypasses the re-encoding table.
    fn write_out(&mut self, s: &str) -> Result<()> {
        if !self.discarding {
            self.out.write_str(s)?;
        }
        Ok(())
    }
}

/// The value of e.g. the `style="..."` attribute starts in the CSS state.
fn attr_start_state(attr: AttrKind) -> State {
    match attr {
        AttrKind::None => State::Attr,
        AttrKind::Script => State::Js,
        AttrKind::Style => State::Css,
        AttrKind::Url => State::Url,
    }
}

/// Runs an escaper against a value. `context` effects (URL-part advances)
/// are applied to the caller's copy.
fn run_escaper<S: TextSink>(
    context: &mut Context,
    esc: Escaper,
    v: &Value,
    out: &mut S,
) -> Result<()> {
    match esc {
        Escaper::Elide => Ok(()),
        Escaper::OneSpace => out.write_char(' ').map_err(Error::from),
        Escaper::EscapeHtml => html::escape_onto(v, out).map_err(Error::from),
        Escaper::NormalizeHtml => html::normalize_onto(v, out).map_err(Error::from),
        Escaper::EscapeXml => xml::escape_onto(v, out).map_err(Error::from),
        Escaper::NormalizeXml => xml::normalize_onto(v, out).map_err(Error::from),
        Escaper::EscapeRcdata => html::escape_rcdata_onto(v, out).map_err(Error::from),
        Escaper::EscapeCdata => xml::escape_cdata_onto(v, out).map_err(Error::from),
        Escaper::EscapeCss => css::escape_str_onto(v, out).map_err(Error::from),
        Escaper::FilterCssValue => css::filter_value_onto(v, out).map_err(Error::from),
        Escaper::EscapeJsString => js::escape_str_onto(v, out).map_err(Error::from),
        Escaper::EscapeJsRegexp => js::escape_regexp_onto(v, out).map_err(Error::from),
        Escaper::EscapeJsValue => js::escape_value_onto(v, out).map_err(Error::from),
        Escaper::EscapeUrl => url::escape_onto(v, false, out).map_err(Error::from),
        Escaper::NormalizeUrl => url::escape_onto(v, true, out).map_err(Error::from),
        Escaper::FilterUrl | Escaper::FilterCssUrl => {
            let safe = v.deref_safe(ContentType::Url);
            let text;
            let s: &str = match safe {
                Some(s) => s,
                None => {
                    text = v.text();
                    if !url::url_prefix_allowed(&text) {
                        // The anti-javascript: gate. The replacement is
                        // inert in every context that accepts a URL.
                        out.write_str(url::FILTER_REPLACEMENT_URL)?;
                        context.url_part = UrlPart::QueryOrFrag;
                        return Ok(());
                    }
                    &*text
                }
            };
            let s = s.trim_start();
            if s.is_empty() {
                return Ok(());
            }
            context.url_part = url::next_url_part(s, context.url_part);
            if esc == Escaper::FilterCssUrl {
                // CSS escaping allows the value to keep CSS backslash
                // escapes while still preventing protocol injection.
                css::escape_str_str_onto(s, out).map_err(Error::from)
            } else {
                url::escape_str_onto(s, true, out).map_err(Error::from)
            }
        }
        Escaper::FilterNameOnto => html::filter_name_onto(&v.text(), out),
        Escaper::EscapeHtmlAttr => unreachable!("handled by the writer"),
    }
}

/// Returns an [`Element`] for a tag name, identifying elements whose
/// bodies are scanned in another sublanguage.
fn classify_tag_name(name: &[u8]) -> Element {
    match name.len() {
        5 if name.eq_ignore_ascii_case(b"style") => Element::Style,
        5 if name.eq_ignore_ascii_case(b"title") => Element::Title,
        6 if name.eq_ignore_ascii_case(b"script") => Element::Script,
        8 if name.eq_ignore_ascii_case(b"textarea") => Element::Textarea,
        _ => Element::None,
    }
}

/// Returns the largest `i` such that `bytes[off..i]` is a tag name.
/// "x-y" and "x:y" are allowed but not "x-", "-y", or "x--y".
fn eat_tag_name(bytes: &[u8], off: usize, end: usize) -> usize {
    if off == end || !bytes[off].is_ascii_alphabetic() {
        return off;
    }
    let mut i = off + 1;
    while i < end {
        let b = bytes[i];
        if b.is_ascii_alphanumeric() {
            i += 1;
            continue;
        }
        if (b == b':' || b == b'-') && i + 1 < end && bytes[i + 1].is_ascii_alphanumeric() {
            i += 2;
            continue;
        }
        break;
    }
    i
}

/// Returns the largest `i` such that `bytes[off..i]` is white space.
fn eat_whitespace(bytes: &[u8], off: usize, end: usize) -> usize {
    off + strspn!(&bytes[..end], b' ' | b'\t' | b'\n' | b'\x0C' | b'\r', off)
}

/// Returns the largest `j` such that `s[off..j]` is an attribute name.
/// Quote marks and `<` are indicative of serious problems when they show
/// up in an attribute name in a template, so they are fatal.
fn eat_attr_name(s: &str, off: usize, end: usize) -> Result<usize> {
    let bytes = s.as_bytes();
    for j in off..end {
        match bytes[j] {
            b' ' | b'\t' | b'\n' | b'\x0C' | b'\r' | b'=' | b'>' => return Ok(j),
            ch @ (b'\'' | b'"' | b'<') => {
                return Err(Error::template_at(
                    s,
                    off,
                    j,
                    end,
                    &format!("{} in attribute name: ", ch as char),
                ));
            }
            _ => {}
        }
    }
    Ok(end)
}

/// Whether `pattern` appears at `off`, staying inside `[off, end)`.
fn slice_at(bytes: &[u8], off: usize, end: usize, pattern: &[u8]) -> bool {
    off + pattern.len() <= end && &bytes[off..off + pattern.len()] == pattern
}

/// Whether a U+2028 or U+2029 line separator is encoded at `i`.
fn is_line_sep_at(bytes: &[u8], i: usize, end: usize) -> bool {
    i + 2 < end && bytes[i] == 0xE2 && bytes[i + 1] == 0x80 && matches!(bytes[i + 2], 0xA8 | 0xA9)
}

/// The UTF-8 length of the character starting at `i`.
fn char_len_at(bytes: &[u8], i: usize) -> usize {
    match bytes[i] {
        b if b < 0x80 => 1,
        b if b < 0xE0 => 2,
        b if b < 0xF0 => 3,
        _ => 4,
    }
}
