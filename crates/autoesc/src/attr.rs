//! Attribute-name classification.
//!
//! When the transition scanner reads an attribute name it asks
//! [`attr_type`] what kind of content the value will hold, and stashes the
//! answer in the context so the right sublanguage state is entered at the
//! value boundary.

use lazy_static::lazy_static;

use crate::content::ContentType;
use crate::str_fns::starts_with_ignore_case;
use crate::trie::Trie;

lazy_static! {
    /// Describes the value of each known attribute. If an attribute affects
    /// (or can mask) the encoding or interpretation of other content, or
    /// affects the contents, idempotency, or credentials of a network
    /// message, it maps to `Unsafe`. Derived from the HTML5 attribute index
    /// plus the "%URI"-typed attributes of HTML4.
    ///
    /// @see https://html.spec.whatwg.org/multipage/indices.html#attributes-3
    static ref ATTR_TYPE_MAP: Trie<ContentType> = Trie::builder()
        .put("accept",          ContentType::Plain)
        .put("accept-charset",  ContentType::Unsafe)
        .put("action",          ContentType::Url)
        .put("alt",             ContentType::Plain)
        .put("archive",         ContentType::Url)
        .put("async",           ContentType::Unsafe)
        .put("attributename",   ContentType::Unsafe) // From <svg:set attributeName>.
        .put("autocomplete",    ContentType::Plain)
        .put("autofocus",       ContentType::Plain)
        .put("autoplay",        ContentType::Plain)
        .put("background",      ContentType::Url)
        .put("border",          ContentType::Plain)
        .put("checked",         ContentType::Plain)
        .put("cite",            ContentType::Url)
        .put("challenge",       ContentType::Unsafe)
        .put("charset",         ContentType::Unsafe)
        .put("class",           ContentType::Plain)
        .put("classid",         ContentType::Url)
        .put("codebase",        ContentType::Url)
        .put("cols",            ContentType::Plain)
        .put("colspan",         ContentType::Plain)
        .put("content",         ContentType::Unsafe)
        .put("contenteditable", ContentType::Plain)
        .put("contextmenu",     ContentType::Plain)
        .put("controls",        ContentType::Plain)
        .put("coords",          ContentType::Plain)
        .put("crossorigin",     ContentType::Unsafe)
        .put("data",            ContentType::Url)
        .put("datetime",        ContentType::Plain)
        .put("default",         ContentType::Plain)
        .put("defer",           ContentType::Unsafe)
        .put("dir",             ContentType::Plain)
        .put("dirname",         ContentType::Plain)
        .put("disabled",        ContentType::Plain)
        .put("draggable",       ContentType::Plain)
        .put("dropzone",        ContentType::Plain)
        .put("enctype",         ContentType::Unsafe)
        .put("for",             ContentType::Plain)
        .put("form",            ContentType::Unsafe)
        .put("formaction",      ContentType::Url)
        .put("formenctype",     ContentType::Unsafe)
        .put("formmethod",      ContentType::Unsafe)
        .put("formnovalidate",  ContentType::Unsafe)
        .put("formtarget",      ContentType::Plain)
        .put("headers",         ContentType::Plain)
        .put("height",          ContentType::Plain)
        .put("hidden",          ContentType::Plain)
        .put("high",            ContentType::Plain)
        .put("href",            ContentType::Url)
        .put("hreflang",        ContentType::Plain)
        .put("http-equiv",      ContentType::Unsafe)
        .put("icon",            ContentType::Url)
        .put("id",              ContentType::Plain)
        .put("ismap",           ContentType::Plain)
        .put("keytype",         ContentType::Unsafe)
        .put("kind",            ContentType::Plain)
        .put("label",           ContentType::Plain)
        .put("lang",            ContentType::Plain)
        .put("language",        ContentType::Unsafe)
        .put("list",            ContentType::Plain)
        .put("longdesc",        ContentType::Url)
        .put("loop",            ContentType::Plain)
        .put("low",             ContentType::Plain)
        .put("manifest",        ContentType::Url)
        .put("max",             ContentType::Plain)
        .put("maxlength",       ContentType::Plain)
        .put("media",           ContentType::Plain)
        .put("mediagroup",      ContentType::Plain)
        .put("method",          ContentType::Unsafe)
        .put("min",             ContentType::Plain)
        .put("multiple",        ContentType::Plain)
        .put("name",            ContentType::Plain)
        .put("novalidate",      ContentType::Unsafe)
        // Event handler names are not listed here; attr_type special-cases
        // the on* prefix instead.
        .put("open",            ContentType::Plain)
        .put("optimum",         ContentType::Plain)
        .put("pattern",         ContentType::Unsafe)
        .put("placeholder",     ContentType::Plain)
        .put("poster",          ContentType::Url)
        .put("profile",         ContentType::Url)
        .put("preload",         ContentType::Plain)
        .put("pubdate",         ContentType::Plain)
        .put("radiogroup",      ContentType::Plain)
        .put("readonly",        ContentType::Plain)
        .put("rel",             ContentType::Unsafe)
        .put("required",        ContentType::Plain)
        .put("reversed",        ContentType::Plain)
        .put("rows",            ContentType::Plain)
        .put("rowspan",         ContentType::Plain)
        .put("sandbox",         ContentType::Unsafe)
        .put("spellcheck",      ContentType::Plain)
        .put("scope",           ContentType::Plain)
        .put("scoped",          ContentType::Plain)
        .put("seamless",        ContentType::Plain)
        .put("selected",        ContentType::Plain)
        .put("shape",           ContentType::Plain)
        .put("size",            ContentType::Plain)
        .put("sizes",           ContentType::Plain)
        .put("span",            ContentType::Plain)
        .put("src",             ContentType::Url)
        .put("srcdoc",          ContentType::Markup)
        .put("srchtml",         ContentType::Unsafe)
        .put("srclang",         ContentType::Plain)
        .put("start",           ContentType::Plain)
        .put("step",            ContentType::Plain)
        .put("style",           ContentType::Css)
        .put("tabindex",        ContentType::Plain)
        .put("target",          ContentType::Plain)
        .put("title",           ContentType::Plain)
        .put("type",            ContentType::Unsafe)
        .put("usemap",          ContentType::Url)
        .put("value",           ContentType::Unsafe)
        .put("width",           ContentType::Plain)
        .put("wrap",            ContentType::Plain)
        .put("xmlns",           ContentType::Url)
        .build();
}

/// Returns a conservative (upper bound on authority) guess at the content
/// type of the named attribute's value.
pub fn attr_type(name: &[u8]) -> ContentType {
    let mut name = name;
    if starts_with_ignore_case(name, 0, b"data-") {
        // Strip data- so the custom-attribute heuristics below still apply.
        // data-action is treated as a URL the same as action.
        name = &name[5..];
    } else if let Some(colon) = name.iter().position(|&b| b == b':') {
        if colon == 5 && name[..5].eq_ignore_ascii_case(b"xmlns") {
            return ContentType::Url;
        }
        // Namespaced attributes like xlink:href classify by local name.
        name = &name[colon + 1..];
    }

    if let Some(&t) = ATTR_TYPE_MAP.get_ignore_case(name) {
        return t;
    }
    // Partial event handler names are script.
    if starts_with_ignore_case(name, 0, b"on") {
        return ContentType::Js;
    }

    /*
     * Heuristics to prevent "javascript:..." injection through custom
     * attributes like g:tweetUrl and custom data attributes. Developers
     * routinely store URL content in attributes whose names start or end
     * with "src", "uri", or "url".
     */
    let lower = name.to_ascii_lowercase();
    if crate::str_fns::strpos(&lower, b"src", 0).is_some()
        || crate::str_fns::strpos(&lower, b"uri", 0).is_some()
        || crate::str_fns::strpos(&lower, b"url", 0).is_some()
    {
        return ContentType::Url;
    }

    // Unknown attributes get the strictest treatment.
    ContentType::Unsafe
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_names() {
        assert_eq!(attr_type(b"href"), ContentType::Url);
        assert_eq!(attr_type(b"HREF"), ContentType::Url);
        assert_eq!(attr_type(b"style"), ContentType::Css);
        assert_eq!(attr_type(b"srcdoc"), ContentType::Markup);
        assert_eq!(attr_type(b"title"), ContentType::Plain);
        assert_eq!(attr_type(b"value"), ContentType::Unsafe);
    }

    #[test]
    fn event_handlers_are_script() {
        assert_eq!(attr_type(b"onclick"), ContentType::Js);
        assert_eq!(attr_type(b"ONMOUSEOVER"), ContentType::Js);
        assert_eq!(attr_type(b"data-onfocus"), ContentType::Js);
    }

    #[test]
    fn prefixes_strip_before_lookup() {
        assert_eq!(attr_type(b"data-href"), ContentType::Url);
        assert_eq!(attr_type(b"data-action"), ContentType::Url);
        assert_eq!(attr_type(b"xlink:href"), ContentType::Url);
        assert_eq!(attr_type(b"svg:style"), ContentType::Css);
        assert_eq!(attr_type(b"xmlns:xlink"), ContentType::Url);
    }

    #[test]
    fn url_substring_heuristic() {
        assert_eq!(attr_type(b"g:tweeturl"), ContentType::Url);
        assert_eq!(attr_type(b"data-avatar-src"), ContentType::Url);
        assert_eq!(attr_type(b"turic"), ContentType::Url);
        assert_eq!(attr_type(b"frobnicate"), ContentType::Unsafe);
    }
}
