//! Output escaping.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Escape `&`, `<` and `>` for HTML text content.
pub fn escape_html(text: &str) -> String {
    html_escape::encode_text(text).into_owned()
}

/// Bytes kept as-is by [`url_encode_component`]: ASCII alphanumerics and
/// `-_.!~*'()`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode text for use as a URL component.
pub fn url_encode_component(text: &str) -> String {
    utf8_percent_encode(text, URI_COMPONENT).to_string()
}

/// Turn `\{` and `\}` into literal braces.
pub fn unescape_braces(text: &str) -> Cow<'_, str> {
    if !text.contains("\\{") && !text.contains("\\}") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && matches!(chars.peek(), Some('{' | '}')) {
            continue;
        }
        out.push(c);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_leaves_quotes() {
        assert_eq!(escape_html(r#"<a href="x">&</a>"#), r#"&lt;a href="x"&gt;&amp;&lt;/a&gt;"#);
    }

    #[test]
    fn test_url_encode_component() {
        assert_eq!(url_encode_component("hello world?x=1&y=ä"), "hello%20world%3Fx%3D1%26y%3D%C3%A4");
        assert_eq!(url_encode_component("keep-_.!~*'()"), "keep-_.!~*'()");
    }

    #[test]
    fn test_unescape_braces() {
        assert_eq!(unescape_braces(r"\{\{ not a placeholder \}\}"), "{{ not a placeholder }}");
        assert_eq!(unescape_braces(r"a \\n b"), r"a \\n b");
        assert!(matches!(unescape_braces("plain"), Cow::Borrowed("plain")));
    }
}
