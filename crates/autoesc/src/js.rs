//! Escapers and tokenizer support for JavaScript contexts.

use std::io;

use lazy_static::lazy_static;
use rustc_hash::FxHashSet;

use crate::content::{ContentType, Value};
use crate::context::JsCtx;
use crate::replacement::ReplacementTable;
use crate::sink::TextSink;

lazy_static! {
    /// Escapes for the inside of a JS string literal. HTML specials are
    /// encoded as hex so the output can be embedded in HTML attributes
    /// without further encoding; `</` cannot appear (close-tag sniffing),
    /// nor can `+` (UTF-7), parens (call syntax even after escaping), or
    /// the JS-specific line terminators U+2028/U+2029.
    pub static ref STR_REPLACEMENT_TABLE: ReplacementTable = ReplacementTable::new()
        .add('\0', Some("\\0"))
        .add('`', Some("\\x60"))
        .add('"', Some("\\x22"))
        .add('&', Some("\\x26"))
        .add('\'', Some("\\x27"))
        .add('\t', Some("\\t"))
        .add('\n', Some("\\n"))
        .add('\u{B}', Some("\\x0b")) // "\v" == "v" on IE 6.
        .add('\x0C', Some("\\f"))
        .add('\r', Some("\\r"))
        .add('(', Some("\\("))
        .add(')', Some("\\)"))
        .add('+', Some("\\x2b"))
        .add('/', Some("\\/"))
        .add('<', Some("\\x3c"))
        .add('>', Some("\\x3e"))
        .add('\\', Some("\\\\"))
        .add('\u{2028}', Some("\\u2028"))
        .add('\u{2029}', Some("\\u2029"));

    /// Like [`struct@STR_REPLACEMENT_TABLE`] but does not over-encode
    /// existing escapes: there is no entry for `\`.
    pub static ref STR_NORM_REPLACEMENT_TABLE: ReplacementTable =
        STR_REPLACEMENT_TABLE.clone().add('\\', None);

    /// The string table plus regexp metacharacters, so interpolated text
    /// matches as a literal sequence. The empty replacement `(?:)` keeps
    /// `/$x/` from collapsing into a `//` line comment.
    pub static ref REGEX_REPLACEMENT_TABLE: ReplacementTable = STR_REPLACEMENT_TABLE
        .clone()
        .add('{', Some("\\{"))
        .add('|', Some("\\|"))
        .add('}', Some("\\}"))
        .add('$', Some("\\$"))
        .add('*', Some("\\*"))
        .add('-', Some("\\-"))
        .add('.', Some("\\."))
        .add('?', Some("\\?"))
        .add('[', Some("\\["))
        .add(']', Some("\\]"))
        .add('^', Some("\\^"))
        .on_empty("(?:)");

    /// A sequence of one or more valid JSON tokens as defined in RFC 4627.
    /// This does not match brackets, but it does guarantee that string
    /// boundaries are preserved and no free variables are read.
    static ref JSON_TOKENS: fancy_regex::Regex = fancy_regex::Regex::new(concat!(
        r#"[\t\n\r ]*"#,
        r#"(?:(?:[\[\]{}:,]|"#,
        r#"(?:false|null|true|"#,
        r#"-?(?:0|[1-9][0-9]*)(?:[.][0-9]+)?(?:[eE][+-]?[0-9]+)?"#,
        // Keywords and numbers cannot be followed by identifier chars.
        r#"(?![a-zA-Z0-9_$])"#,
        r#")|"#,
        r#""(?:[^\\"\x00-\x1f]|\\(?:["\\/bfnrt]|u[0-9a-fA-F]{4}))*""#,
        r#")"#,
        r#"[\t\n\r ]*)+"#,
    ))
    .expect("JSON token pattern must compile");
}

/// Whether a `/` after the given run of JS tokens starts a regular
/// expression rather than a division operator.
///
/// This assumes the run contains no string, comment, or regexp tokens and
/// no division operators. It requires one token of lookbehind and fails
/// only on nonsensical programs like `x = ++/foo/i`; it is based on the
/// draft JavaScript 2.0 lexical grammar.
///
/// `prec` is used when the run is empty.
pub fn next_js_ctx(s: &str, prec: JsCtx) -> JsCtx {
    let t = s.trim_end_matches(['\t', '\n', '\r', ' ', '\u{2028}', '\u{2029}']);
    let last = match t.chars().last() {
        None => return prec,
        Some(c) => c,
    };
    match last {
        '+' | '-' => {
            /*
             * ++ and -- are not regexp preceders, but + and - are whether
             * used as infix or prefix operators. Count the adjacent run:
             * "---" is the same as "-- -".
             */
            let run = t.chars().rev().take_while(|&c| c == last).count();
            if run % 2 == 1 {
                JsCtx::Regexp
            } else {
                JsCtx::DivOp
            }
        }
        '.' => {
            // Handle "42."
            let mut rev = t.chars().rev();
            rev.next();
            match rev.next() {
                Some(d) if d.is_ascii_digit() => JsCtx::DivOp,
                _ => JsCtx::Regexp,
            }
        }
        // Binary operator suffixes, prefix operators, open brackets, and
        // expression-start punctuators from section 7.7 of the language
        // spec.
        ',' | '<' | '>' | '=' | '*' | '%' | '&' | '|' | '^' | '?' => JsCtx::Regexp,
        '!' | '~' => JsCtx::Regexp,
        '(' | '[' => JsCtx::Regexp,
        ':' | ';' | '{' => JsCtx::Regexp,
        /*
         * The close punctuators ']' and ')' precede div ops, and '}' can
         * too, as in `({valueOf: function () { return 42 }}) / 2`, but in
         * practice developers do not divide object literals, so treating
         * '}' as a regexp preceder works well for code like
         * `function () { ... }  /foo/.test(x) && sideEffect();`.
         */
        '}' => JsCtx::Regexp,
        _ => {
            let ident: String = t
                .chars()
                .rev()
                .take_while(|&c| is_js_ident_part(c))
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            if is_regexp_preceder_keyword(&ident) {
                JsCtx::Regexp
            } else {
                // A punctuator not listed above, or a string or identifier,
                // all of which precede a div op.
                JsCtx::DivOp
            }
        }
    }
}

fn is_regexp_preceder_keyword(s: &str) -> bool {
    matches!(
        s,
        "do" | "in"
            | "try"
            | "case"
            | "else"
            | "void"
            | "break"
            | "throw"
            | "delete"
            | "return"
            | "typeof"
            | "finally"
            | "continue"
            | "instanceof"
    )
}

/// Whether `c` is a JS identifier part. This does not handle all the
/// non-Latin letters, joiners, and combining marks, but it does handle
/// every code point that can occur in a numeric literal or a keyword.
pub(crate) fn is_js_ident_part(c: char) -> bool {
    c == '$' || c == '_' || c.is_ascii_alphanumeric()
}

pub(crate) fn float_text(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f.is_sign_positive() { "Infinity" } else { "-Infinity" }.to_string()
    } else {
        f.to_string()
    }
}

/// Escapes a value for the inside of a JS string literal. JsStr-tagged
/// content is only normalized so existing escapes are not doubled.
pub fn escape_str_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    if let Some(safe) = v.deref_safe(ContentType::JsStr) {
        return STR_NORM_REPLACEMENT_TABLE.escape_onto(safe, out);
    }
    STR_REPLACEMENT_TABLE.escape_onto(&v.text(), out)
}

/// Escapes a value for the inside of a JS regular expression literal.
pub fn escape_regexp_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    REGEX_REPLACEMENT_TABLE.escape_value_onto(&v.text(), out)
}

/// Escapes a value as a complete JS expression: numbers and keywords
/// space-padded, strings quoted, containers as array/object literals.
pub fn escape_value_onto<S: TextSink>(v: &Value, out: &mut S) -> io::Result<()> {
    JsValueEscaper::default().escape(v, true, out)
}

#[derive(Default)]
struct JsValueEscaper {
    /// Shared containers already being rendered, by identity. A revisit
    /// emits `null` instead of recursing forever.
    seen: FxHashSet<*const Value>,
}

impl JsValueEscaper {
    /// `protect` surrounds keyword and numeric output with spaces so it
    /// cannot merge with neighboring tokens. Parentheses would be wrong:
    /// they can introduce call operators.
    fn escape<S: TextSink>(&mut self, v: &Value, protect: bool, out: &mut S) -> io::Result<()> {
        match v {
            Value::Null => self.padded("null", protect, out),
            Value::Bool(b) => self.padded(if *b { "true" } else { "false" }, protect, out),
            Value::Int(n) => self.padded(&n.to_string(), protect, out),
            Value::Float(n) => self.padded(&float_text(*n), protect, out),
            Value::Safe(ContentType::Js, s) => self.padded(s, protect, out),
            Value::Safe(ContentType::JsStr, s) => {
                out.write_char('\'')?;
                STR_NORM_REPLACEMENT_TABLE.escape_onto(s, out)?;
                // If s ends with an incomplete escape sequence, complete it.
                let trailing_slashes = s.len() - s.trim_end_matches('\\').len();
                if trailing_slashes % 2 == 1 {
                    out.write_char('\\')?;
                }
                out.write_char('\'')
            }
            Value::Str(s) | Value::Safe(_, s) => {
                out.write_char('\'')?;
                STR_REPLACEMENT_TABLE.escape_onto(s, out)?;
                out.write_char('\'')
            }
            Value::Json(m) => {
                let json = sanity_check_json(&m.to_json());
                let first = json.chars().next();
                let last = json.chars().last();
                if protect && first.is_some_and(is_js_ident_part) {
                    out.write_char(' ')?;
                }
                out.write_str(&json)?;
                if protect && last.is_some_and(is_js_ident_part) {
                    out.write_char(' ')?;
                }
                Ok(())
            }
            Value::List(items) => {
                if items.is_empty() {
                    return out.write_str("[]");
                }
                for (i, item) in items.iter().enumerate() {
                    out.write_char(if i == 0 { '[' } else { ',' })?;
                    self.escape(item, false, out)?;
                }
                out.write_char(']')
            }
            Value::Map(entries) => {
                if entries.is_empty() {
                    return out.write_str("{}");
                }
                for (i, (k, v)) in entries.iter().enumerate() {
                    out.write_char(if i == 0 { '{' } else { ',' })?;
                    out.write_char('\'')?;
                    STR_REPLACEMENT_TABLE.escape_onto(k, out)?;
                    out.write_str("':")?;
                    self.escape(v, false, out)?;
                }
                out.write_char('}')
            }
            Value::Shared(inner) => {
                if !self.seen.insert(std::rc::Rc::as_ptr(inner)) {
                    return self.padded("null", protect, out);
                }
                self.escape(inner, protect, out)
            }
        }
    }

    fn padded<S: TextSink>(&self, text: &str, protect: bool, out: &mut S) -> io::Result<()> {
        if protect {
            out.write_char(' ')?;
        }
        out.write_str(text)?;
        if protect {
            out.write_char(' ')?;
        }
        Ok(())
    }
}

/// Sanity checks marshalled JSON: it must consist solely of JSON tokens so
/// it preserves string boundaries and reads no free variables. U+2028 and
/// U+2029 are allowed unencoded in JSON strings but not in JS, so they are
/// rewritten. Invalid JSON is replaced by a comment naming the problem
/// followed by `null`.
fn sanity_check_json(json: &str) -> String {
    match JSON_TOKENS.find(json) {
        Ok(Some(m)) if m.start() == 0 && m.end() == json.len() => {
            return json.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029");
        }
        found => {
            let problem = match found {
                Ok(Some(m)) if m.start() != 0 => &json[..m.start()],
                Ok(Some(m)) => &json[m.end()..],
                _ => json,
            };
            let mut problem: String = if problem.chars().count() > 40 {
                problem.chars().take(37).collect::<String>() + "..."
            } else {
                problem.to_string()
            };
            // Break any "*/" so the problem text cannot close the comment.
            problem = problem.replace('*', "* ");
            // The leading space prevents the comment from combining with a
            // div op into a line comment.
            format!(" /* json: {problem} */ null ")
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn slash_disambiguation() {
        assert_eq!(next_js_ctx("", JsCtx::Regexp), JsCtx::Regexp);
        assert_eq!(next_js_ctx("", JsCtx::DivOp), JsCtx::DivOp);
        assert_eq!(next_js_ctx("x", JsCtx::Regexp), JsCtx::DivOp);
        assert_eq!(next_js_ctx("x()", JsCtx::Regexp), JsCtx::DivOp);
        assert_eq!(next_js_ctx("a[0]", JsCtx::Regexp), JsCtx::DivOp);
        assert_eq!(next_js_ctx("42", JsCtx::Regexp), JsCtx::DivOp);
        assert_eq!(next_js_ctx("42.", JsCtx::Regexp), JsCtx::DivOp);
        assert_eq!(next_js_ctx("x =", JsCtx::Regexp), JsCtx::Regexp);
        assert_eq!(next_js_ctx("return", JsCtx::Regexp), JsCtx::Regexp);
        assert_eq!(next_js_ctx("typeof", JsCtx::Regexp), JsCtx::Regexp);
        assert_eq!(next_js_ctx("if (b) {", JsCtx::Regexp), JsCtx::Regexp);
        assert_eq!(next_js_ctx("x++", JsCtx::Regexp), JsCtx::DivOp);
        assert_eq!(next_js_ctx("x+", JsCtx::Regexp), JsCtx::Regexp);
        assert_eq!(next_js_ctx("x---", JsCtx::Regexp), JsCtx::Regexp);
        assert_eq!(next_js_ctx("returned", JsCtx::Regexp), JsCtx::DivOp);
        assert_eq!(next_js_ctx("x  \u{2028}", JsCtx::Regexp), JsCtx::DivOp);
    }

    fn str_escaped(s: &str) -> String {
        let mut out = String::new();
        escape_str_onto(&Value::from(s), &mut out).unwrap();
        out
    }

    #[test]
    fn string_escapes() {
        assert_eq!(str_escaped("a\"b"), "a\\x22b");
        assert_eq!(str_escaped("</script>"), "\\x3c\\/script\\x3e");
        assert_eq!(str_escaped("line\nbreak"), "line\\nbreak");
        assert_eq!(str_escaped("\u{2028}\u{2029}"), "\\u2028\\u2029");
        assert_eq!(str_escaped("f(x)+1"), "f\\(x\\)\\x2b1");
    }

    #[test]
    fn regexp_escapes_metacharacters() {
        let mut out = String::new();
        escape_regexp_onto(&Value::from("a.b*c"), &mut out).unwrap();
        assert_eq!(out, "a\\.b\\*c");
        out.clear();
        escape_regexp_onto(&Value::from(""), &mut out).unwrap();
        assert_eq!(out, "(?:)");
    }

    fn value_escaped(v: &Value) -> String {
        let mut out = String::new();
        escape_value_onto(v, &mut out).unwrap();
        out
    }

    #[test]
    fn value_primitives() {
        assert_eq!(value_escaped(&Value::Null), " null ");
        assert_eq!(value_escaped(&Value::from(true)), " true ");
        assert_eq!(value_escaped(&Value::from(42)), " 42 ");
        assert_eq!(value_escaped(&Value::from(1.5)), " 1.5 ");
        assert_eq!(value_escaped(&Value::from("O'Reilly")), "'O\\x27Reilly'");
    }

    #[test]
    fn value_containers() {
        let v = Value::List(vec![Value::from(1), Value::from("a,b")]);
        assert_eq!(value_escaped(&v), "[1,'a,b']");
        let v = Value::Map(vec![("k".to_string(), Value::from(1))]);
        assert_eq!(value_escaped(&v), "{'k':1}");
        assert_eq!(value_escaped(&Value::List(vec![])), "[]");
        assert_eq!(value_escaped(&Value::Map(vec![])), "{}");
    }

    #[test]
    fn value_safe_content() {
        assert_eq!(
            value_escaped(&Value::safe(ContentType::Js, "x + 1")),
            " x + 1 "
        );
        assert_eq!(
            value_escaped(&Value::safe(ContentType::JsStr, "a\\nb")),
            "'a\\nb'"
        );
        // A trailing incomplete escape is completed.
        assert_eq!(
            value_escaped(&Value::safe(ContentType::JsStr, "tail\\")),
            "'tail\\\\'"
        );
    }

    #[test]
    fn shared_values_terminate() {
        let shared = Rc::new(Value::List(vec![Value::from(1)]));
        let v = Value::List(vec![
            Value::Shared(shared.clone()),
            Value::Shared(shared.clone()),
        ]);
        // The second visit of the same container renders as null.
        assert_eq!(value_escaped(&v), "[[1],null]");
    }

    struct Marshalled(&'static str);
    impl crate::content::JsonMarshaler for Marshalled {
        fn to_json(&self) -> String {
            self.0.to_string()
        }
    }

    #[test]
    fn json_is_sanity_checked() {
        let ok = Value::Json(Rc::new(Marshalled(r#"{"a": [1, 2.5e3, "x"], "b": null}"#)));
        assert_eq!(value_escaped(&ok), r#"{"a": [1, 2.5e3, "x"], "b": null}"#);

        let keyword = Value::Json(Rc::new(Marshalled("null")));
        assert_eq!(value_escaped(&keyword), " null ");

        // The first valid token is the "1", so the reported problem text
        // is the invalid prefix.
        let bad = Value::Json(Rc::new(Marshalled("alert(1)")));
        assert_eq!(value_escaped(&bad), " /* json: alert( */ null ");

        let evil = Value::Json(Rc::new(Marshalled("42 */ alert(1) /* ")));
        assert!(!value_escaped(&evil).contains("*/ alert"));
    }
}
