//! End-to-end escaping scenarios driven through the public writer API.

use autoesc::{ContentType, Error, HtmlEscapingWriter, State, Value};
use pretty_assertions::assert_eq;
use quickcheck_macros::quickcheck;

fn render(f: impl FnOnce(&mut HtmlEscapingWriter<&mut String>) -> autoesc::Result<()>) -> String {
    let mut out = String::new();
    let mut w = HtmlEscapingWriter::new(&mut out);
    f(&mut w).expect("render must succeed");
    drop(w);
    out
}

fn prefix_then(prefix: &str, value: &str) -> String {
    render(|w| {
        w.write_safe(prefix)?;
        w.write(&Value::from(value))
    })
}

#[test]
fn context_scenarios() {
    // (safe prefix, unsafe value, expected output)
    let cases: &[(&str, &str, &str)] = &[
        ("<a href=\"", "javascript:alert(1)", "<a href=\"#ZautoescZ"),
        ("<a href=\"/search?q=", "a b&c", "<a href=\"/search?q=a%20b%26c"),
        (
            "<a onclick=\"alert(",
            "hello \"world\"",
            "<a onclick=\"alert('hello \\x22world\\x22'",
        ),
        (
            "<script>var x=",
            "\"</script>\"",
            "<script>var x='\\x22\\x3c\\/script\\x3e\\x22'",
        ),
        ("<script>var r = /", "", "<script>var r = /(?:)"),
        (
            "<style>background: url(",
            "foo bar",
            "<style>background: url(foo%20bar",
        ),
        (
            "<textarea>",
            "<b>hi</b>",
            "<textarea>&lt;b&gt;hi&lt;/b&gt;",
        ),
    ];
    for &(prefix, value, expected) in cases {
        assert_eq!(prefix_then(prefix, value), expected, "prefix {prefix:?}");
    }
}

#[test]
fn unquoted_value_is_quoted_and_closed_at_tag_end() {
    assert_eq!(
        render(|w| {
            w.write_safe("<input value=")?;
            w.write(&Value::from("a b"))?;
            w.write_safe(" name=x>")
        }),
        "<input value=\"a b\" name=x>"
    );
}

#[test]
fn well_formed_html_round_trips() {
    // Apart from comment elision, quote insertion, and doctype switching,
    // well-formed trusted text passes through unchanged.
    let doc = "<!doctype html><html><head><title>T</title></head>\
               <body><p class=\"big\">x &amp; y</p></body></html>";
    assert_eq!(render(|w| w.write_safe(doc)), doc);
}

#[test]
fn full_template_interleaving() {
    let out = render(|w| {
        w.write_safe("<html><body><h1>")?;
        w.write(&Value::from("Hi, <script>!"))?;
        w.write_safe("</h1><a href=\"")?;
        w.write(&Value::from("/u?q=x&lang=fr"))?;
        w.write_safe("\" title=\"")?;
        w.write(&Value::from("it's here"))?;
        w.write_safe("\">go</a></body></html>")
    });
    // The quote-respecting wrapper re-encodes '&' inside the attribute.
    assert_eq!(
        out,
        "<html><body><h1>Hi, &lt;script&gt;!</h1>\
         <a href=\"/u?q=x&amp;lang=fr\" title=\"it&#39;s here\">go</a></body></html>"
    );
}

#[test]
fn safe_content_is_idempotent() {
    // Markup in a text context.
    assert_eq!(
        render(|w| w.write(&Value::safe(ContentType::Markup, "<b>&amp;</b>"))),
        "<b>&amp;</b>"
    );
    // A URL in a URL context is normalized, not re-escaped.
    assert_eq!(
        render(|w| {
            w.write_safe("<a href=\"")?;
            w.write(&Value::safe(ContentType::Url, "/a%20b?x=1"))
        }),
        "<a href=\"/a%20b?x=1"
    );
    // JS in a script context.
    assert_eq!(
        render(|w| {
            w.write_safe("<script>f(")?;
            w.write(&Value::safe(ContentType::Js, "a + b"))
        }),
        "<script>f( a + b "
    );
}

#[test]
fn js_value_renders_containers() {
    let v = Value::Map(vec![
        ("msg".to_string(), Value::from("</script>")),
        (
            "counts".to_string(),
            Value::List(vec![Value::from(1), Value::from(2)]),
        ),
    ]);
    assert_eq!(
        prefix_then_value("<script>var data=", &v),
        "<script>var data={'msg':'\\x3c\\/script\\x3e','counts':[1,2]}"
    );
}

fn prefix_then_value(prefix: &str, v: &Value) -> String {
    render(|w| {
        w.write_safe(prefix)?;
        w.write(v)
    })
}

#[test]
fn shared_containers_render_null_on_revisit() {
    use std::rc::Rc;
    let inner = Rc::new(Value::List(vec![Value::from("x")]));
    let v = Value::List(vec![Value::Shared(inner.clone()), Value::Shared(inner)]);
    assert_eq!(
        prefix_then_value("<script>var v=", &v),
        "<script>var v=[['x'],null]"
    );
}

#[test]
fn close_reports_the_terminal_context() {
    let mut out = String::new();
    let mut w = HtmlEscapingWriter::new(&mut out);
    w.write_safe("<script>var x = 1;").unwrap();
    let err = w.close().unwrap_err();
    match err {
        Error::IncompleteDocument(c) => assert_eq!(c.state, State::Js),
        other => panic!("unexpected error {other:?}"),
    }

    let mut out = String::new();
    let mut w = HtmlEscapingWriter::new(&mut out);
    w.write_safe("<p>done</p>").unwrap();
    w.close().unwrap();
    assert_eq!(out, "<p>done</p>");
}

#[test]
fn complete_xml_documents_close_cleanly() {
    let mut out = String::new();
    let mut w = HtmlEscapingWriter::new(&mut out);
    w.write_safe("<!doctype feed><feed><title>").unwrap();
    w.write(&Value::from("a & b")).unwrap();
    w.write_safe("</title></feed>").unwrap();
    w.close().unwrap();
    assert_eq!(
        out,
        "<!doctype feed><feed><title>a &amp; b</title></feed>"
    );
}

#[test]
fn dynamic_names_must_be_names() {
    let mut out = String::new();
    let mut w = HtmlEscapingWriter::new(&mut out);
    w.write_safe("<div ").unwrap();
    // A name with no valid leading character would leave `="1"` to bind
    // to a nameless attribute.
    assert!(matches!(
        w.write(&Value::from("@bad")),
        Err(Error::Template(_))
    ));
}

#[test]
fn soft_mode_round_trips_pre_escaped_values() {
    let mut out = String::new();
    let mut w = HtmlEscapingWriter::new(&mut out);
    w.set_soft(true);
    w.write_safe("<p>").unwrap();
    w.write(&Value::from("a&nbsp;&lt;b")).unwrap();
    w.write_safe("</p>").unwrap();
    drop(w);
    assert_eq!(out, "<p>a&nbsp;&lt;b</p>");
}

#[test]
fn markup_into_attribute_strips_tags() {
    assert_eq!(
        render(|w| {
            w.write_safe("<a title=\"")?;
            w.write(&Value::safe(
                ContentType::Markup,
                "<b>bold</b> text <style>p{}</style><textarea>area</textarea>",
            ))?;
            w.write_safe("\">")
        }),
        "<a title=\"bold text area\">"
    );
}

#[test]
fn dynamic_attribute_values_after_entities() {
    // The scanner decodes entities inside attribute values so the nested
    // JS scan sees logical characters, then re-encodes on emission.
    assert_eq!(
        render(|w| {
            w.write_safe("<a onclick=\"f(&quot;a&quot;, ")?;
            w.write(&Value::from("b"))?;
            w.write_safe(")\">")
        }),
        "<a onclick=\"f(&#34;a&#34;, 'b')\">"
    );
}

#[test]
fn xml_cdata_sections_pass_through_split_safe() {
    let out = render(|w| {
        w.write_safe("<!doctype feed><item><![CDATA[")?;
        w.write(&Value::from("a]]>b"))?;
        w.write_safe("]]></item>")
    });
    assert_eq!(
        out,
        "<!doctype feed><item><![CDATA[a]]]]><![CDATA[>b]]></item>"
    );
}

// ---- properties ----

#[quickcheck]
fn escaped_text_never_opens_a_tag(s: String) -> bool {
    let out = prefix_then("<p>", &s);
    !out["<p>".len()..].contains('<')
}

#[quickcheck]
fn js_string_context_cannot_break_out(s: String) -> bool {
    let prefix = "<script>var x = \"";
    let out = prefix_then(prefix, &s);
    let emitted = &out[prefix.len()..];
    !emitted.contains('"')
        && !emitted.contains('\n')
        && !emitted.contains("</script")
        && !emitted.contains('\u{2028}')
        && !emitted.contains('\u{2029}')
}

#[quickcheck]
fn url_context_never_smuggles_a_protocol(s: String) -> bool {
    let prefix = "<a href=\"";
    let out = prefix_then(prefix, &s);
    let emitted = &out[prefix.len()..];
    match emitted.find(':') {
        None => true,
        Some(colon) => {
            let before = &emitted[..colon];
            before.contains('/')
                || before.eq_ignore_ascii_case("http")
                || before.eq_ignore_ascii_case("https")
                || before.eq_ignore_ascii_case("mailto")
                || before.starts_with('#')
        }
    }
}

#[quickcheck]
fn unquoted_attr_values_stay_inside_their_quotes(s: String) -> bool {
    let out = render(|w| {
        w.write_safe("<input value=")?;
        w.write(&Value::from(s.clone()))?;
        w.write_safe(">")
    });
    // The inserted quotes must still be the value boundary: no '>', '"',
    // or whitespace escapes the value.
    let inner = out
        .strip_prefix("<input value=\"")
        .and_then(|rest| rest.strip_suffix("\">"));
    match inner {
        None => false,
        Some(inner) => !inner.contains('"') && !inner.contains('>'),
    }
}
