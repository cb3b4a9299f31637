//! Security validation tests
//!
//! This suite feeds hostile post text through the public entry points and
//! checks that nothing outside the whitelist reaches the rendered fragment:
//! no script-bearing elements, no event handlers, no markup smuggled out of
//! attribute values, and no document-level constructs.

use forum_markup::error::FormatError;
use forum_markup::formatter::{FormatOptions, Formatter};
use forum_markup::policy::{DANGEROUS_URL_SCHEMES, FORUM_ATTRIBUTES, FORUM_TAGS, WhitelistPolicy};
use forum_markup::{escape_text, format_for_display};
use proptest::prelude::*;
use regex::Regex;

fn display(raw: &str) -> String {
    format_for_display(raw).expect("Failed to format")
}

fn url_filtering_formatter() -> Formatter {
    Formatter::new(
        WhitelistPolicy::forum().with_blocked_url_schemes(DANGEROUS_URL_SCHEMES),
        FormatOptions::default(),
    )
}

/// Every tag and attribute name appearing in serialized output
fn markup_names(html: &str) -> (Vec<String>, Vec<String>) {
    let tag_re = Regex::new(r#"<([a-z][a-z0-9:]*)((?:\s+[^\s=/>]+="[^"]*")*)\s*/?>"#)
        .expect("tag regex");
    let attr_re = Regex::new(r#"([^\s=/>]+)="[^"]*""#).expect("attribute regex");

    let mut tags = Vec::new();
    let mut attrs = Vec::new();
    for caps in tag_re.captures_iter(html) {
        tags.push(caps[1].to_string());
        for attr in attr_re.captures_iter(&caps[2]) {
            attrs.push(attr[1].to_string());
        }
    }
    (tags, attrs)
}

/// Script elements are removed together with their content
#[test]
fn test_xss_script_tag_removal() {
    let html = display("Before dangerous element\n\n<script>alert('xss')</script>\n\nAfter dangerous element");
    assert_eq!(
        html,
        "<p>Before dangerous element</p><p></p><p>After dangerous element</p>"
    );
}

/// Inline script elements leave the surrounding text alone
#[test]
fn test_xss_inline_script_removal() {
    let html = display("Text <script>malicious()</script> more text");
    assert_eq!(html, "<p>Text  more text</p>");
}

/// Event handler attributes are removed, the elements are kept
#[test]
fn test_xss_event_handler_removal() {
    let html = display(
        "<b onclick=\"alert('xss')\">Click me</b> <a href=\"test.html\" onmouseover=\"attack()\">Link</a>",
    );
    assert_eq!(html, "<p><b>Click me</b> <a href=\"test.html\">Link</a></p>");
}

#[test]
fn test_xss_image_onerror_removal() {
    let html = display("<img src=\"x.png\" onerror=\"alert(1)\" style=\"width:9999px\">");
    assert_eq!(html, "<p><img src=\"x.png\" /></p>");
}

/// Upper-case markup is matched case-insensitively
#[test]
fn test_xss_uppercase_markup() {
    let html = display("<SCRIPT>x()</SCRIPT><B ONCLICK=\"y()\">bold</B>");
    assert_eq!(html, "<p><b>bold</b></p>");
}

/// Disallowed elements are pruned, never unwrapped
#[test]
fn test_disallowed_wrapper_takes_content_with_it() {
    let html = display("<span><b>hidden</b></span>shown");
    assert_eq!(html, "<p>shown</p>");
}

#[test]
fn test_svg_payload_removal() {
    let html = display("<svg onload=\"alert(1)\"><circle r=\"1\"/></svg>");
    assert_eq!(html, "<p></p>");
}

#[test]
fn test_ssrf_iframe_removal() {
    let html = display("<iframe src=\"http://169.254.169.254/\">fallback</iframe>");
    assert_eq!(html, "<p></p>");
}

#[test]
fn test_ssrf_object_and_embed_removal() {
    let html = display(
        "<object data=\"http://internal/x.swf\"><param name=\"a\" value=\"b\"></object><embed src=\"http://internal/y.swf\">",
    );
    assert!(!html.contains("object"));
    assert!(!html.contains("embed"));
    assert!(!html.contains("internal"));
}

/// Document-level elements in post text are pruned
#[test]
fn test_style_link_base_meta_removal() {
    let html = display(
        "<style>body{display:none}</style><link rel=\"stylesheet\" href=\"http://evil/x.css\"><base href=\"http://evil/\"><meta http-equiv=\"refresh\" content=\"0;url=http://evil/\">text",
    );
    assert_eq!(html, "<p>text</p>");
}

#[test]
fn test_form_elements_removal() {
    let html = display("<form action=\"http://evil/\"><input name=\"p\" type=\"password\"><button>Go</button></form>after");
    assert!(!html.contains("form"));
    assert!(!html.contains("input"));
    assert!(!html.contains("Go"));
    assert!(html.contains("after"));
}

/// Comments never reach the output, not even as text
#[test]
fn test_comment_hidden_payload() {
    let html = display("<!-- <script>alert(1)</script> -->visible");
    assert_eq!(html, "<p>visible</p>");
}

/// Doctypes with entity declarations are dropped; nothing is resolved
#[test]
fn test_xxe_prevention_doctype() {
    let html = display("<!DOCTYPE foo [<!ENTITY xxe SYSTEM \"file:///etc/passwd\">]>\n<b>&xxe;</b>");
    assert!(!html.contains("DOCTYPE"));
    assert!(!html.contains("ENTITY"));
    assert!(!html.contains("passwd"));
    assert!(html.contains("<b>&amp;xxe;</b>"));
}

/// Quotes inside attribute values cannot open new attributes
#[test]
fn test_attribute_breakout_is_escaped() {
    let html = display("<a title='x\" onclick=\"y'>t</a>");
    assert_eq!(html, "<p><a title=\"x&quot; onclick=&quot;y\">t</a></p>");
}

/// Escaped markup stays text and is escaped again on output
#[test]
fn test_entity_encoded_markup_stays_text() {
    let html = display("&lt;script&gt;alert(1)&lt;/script&gt;");
    assert_eq!(html, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>");
}

#[test]
fn test_null_bytes_do_not_survive() {
    let html = display("a\0b<b>c\0</b>");
    assert!(!html.contains('\0'));
    assert!(html.contains('a'));
    assert!(html.contains('b'));
}

/// The forum policy leaves attribute values as written
#[test]
fn test_default_policy_keeps_url_values() {
    let html = display("<a href=\"javascript:alert('xss')\">Click</a>");
    assert_eq!(html, "<p><a href=\"javascript:alert('xss')\">Click</a></p>");
}

#[test]
fn test_xss_javascript_url_in_link_when_filtering() {
    let html = url_filtering_formatter()
        .format("<a href=\"javascript:alert('xss')\" title=\"Click\">Click</a>")
        .expect("Failed to format");
    assert_eq!(html, "<p><a title=\"Click\">Click</a></p>");
}

#[test]
fn test_xss_javascript_url_obfuscation_when_filtering() {
    let formatter = url_filtering_formatter();
    for raw in [
        "<a href=\"JaVaScRiPt:alert(1)\">x</a>",
        "<a href=\"  javascript:alert(1)\">x</a>",
        "<a href=\"java&#x09;script:alert(1)\">x</a>",
        "<a href=\"&#106;avascript:alert(1)\">x</a>",
        "<a href=\"vbscript:msgbox(1)\">x</a>",
        "<a href=\"file:///etc/passwd\">x</a>",
    ] {
        let html = formatter.format(raw).expect("Failed to format");
        assert_eq!(html, "<p><a>x</a></p>", "input: {raw}");
    }
}

#[test]
fn test_xss_data_url_in_image_when_filtering() {
    let html = url_filtering_formatter()
        .format("<img src=\"data:image/svg+xml,<svg onload='alert(1)'>\" alt=\"SVG\">")
        .expect("Failed to format");
    assert_eq!(html, "<p><img alt=\"SVG\" /></p>");
}

#[test]
fn test_safe_urls_preserved_when_filtering() {
    let html = url_filtering_formatter()
        .format("<a href=\"https://example.com/a?b=c&amp;d=e\">x</a> <a href=\"/relative\">y</a> <a href=\"#top\">z</a>")
        .expect("Failed to format");
    assert_eq!(
        html,
        "<p><a href=\"https://example.com/a?b=c&amp;d=e\">x</a> <a href=\"/relative\">y</a> <a href=\"#top\">z</a></p>"
    );
}

/// Deep nesting is handled like any other input: a disallowed wrapper still
/// takes its whole subtree with it
#[test]
fn test_deeply_nested_html() {
    let raw = format!("{}x", "<span>".repeat(2_000));
    assert_eq!(format_for_display(&raw), Ok("<p></p>".to_string()));

    let raw = format!("{}x", "<div>".repeat(5_000));
    assert_eq!(format_for_display(&raw), Ok("<p></p>".to_string()));
}

/// Deeply nested allowed markup keeps all of its formatting
#[test]
fn test_deeply_nested_allowed_markup() {
    let raw = format!("{}x\n\n<b onclick=\"y()\">after</b>", "<i>".repeat(2_000));
    let html = display(&raw);

    assert!(html.starts_with("<p><i><i>"));
    assert_eq!(html.matches("<i>").count(), html.matches("</i>").count());
    assert!(html.contains("<b>after</b>"));
    assert!(!html.contains("onclick"));
}

/// Nesting past the configured limit is a distinct failure with a readable fallback
#[test]
fn test_nesting_past_configured_limit() {
    let formatter = Formatter::new(
        WhitelistPolicy::forum(),
        FormatOptions {
            max_depth: 64,
            ..Default::default()
        },
    );
    let raw = format!("{}x", "<b>".repeat(100));
    assert!(matches!(formatter.format(&raw), Err(FormatError::TooDeep { .. })));

    let fallback = formatter.format_or_escape(&raw);
    assert!(fallback.starts_with("&lt;b&gt;&lt;b&gt;"));
    assert!(!fallback.contains('<'));
}

#[test]
fn test_escape_text_neutralises_markup() {
    let escaped = escape_text("<img src=x onerror=\"alert('1')\">");
    assert_eq!(
        escaped,
        "&lt;img src=x onerror=&quot;alert(&#39;1&#39;)&quot;&gt;"
    );
}

#[test]
fn test_multiple_xss_vectors() {
    let raw = r#"<p onclick="a()">one</p>
<script>b()</script><img src="x" onerror="c()">
<a href="ok" style="color:red" onfocus="d()">two</a><iframe src="e"></iframe>

<object data="f"></object><b><i onmouseover="g()">three</i></b>"#;
    let html = display(raw);

    let (tags, attrs) = markup_names(&html);
    for tag in &tags {
        assert!(FORUM_TAGS.contains(&tag.as_str()), "tag leaked: {tag}");
    }
    for attr in &attrs {
        assert!(FORUM_ATTRIBUTES.contains(&attr.as_str()), "attribute leaked: {attr}");
    }
    for payload in ["a()", "b()", "c()", "d()", "g()", "color:red"] {
        assert!(!html.contains(payload), "payload leaked: {payload}");
    }
    assert!(html.contains("one"));
    assert!(html.contains("two"));
    assert!(html.contains("three"));
}

fn hostile_fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "<script>",
        "</script>",
        "<b onclick=\"x()\">",
        "</b>",
        "<i>",
        "<div>",
        "</div>",
        "<img src=\"a\" onerror=\"y()\">",
        "<a href=\"h\" style=\"s\">",
        "</a>",
        "<iframe>",
        "<svg><foreignObject>",
        "<!--",
        "-->",
        "<p>",
        "text",
        " < ",
        "&amp;",
        "\"",
        "'",
        "\n",
        "\n\n",
    ])
}

proptest! {
    /// Whatever the input, every tag and attribute in the output is allowed
    #[test]
    fn prop_output_only_contains_whitelisted_markup(
        parts in prop::collection::vec(hostile_fragment(), 0..40)
    ) {
        let raw = parts.concat();
        let html = display(&raw);
        let (tags, attrs) = markup_names(&html);

        for tag in &tags {
            prop_assert!(FORUM_TAGS.contains(&tag.as_str()), "tag leaked: {} from {:?}", tag, raw);
        }
        for attr in &attrs {
            prop_assert!(FORUM_ATTRIBUTES.contains(&attr.as_str()), "attribute leaked: {} from {:?}", attr, raw);
        }

        // Every '<' in the output opens a whitelisted tag or closing tag.
        let stray = Regex::new(r"<(?:/?(?:a|abbr|b|br|i|img|p)[\s/>])").expect("regex");
        prop_assert_eq!(stray.find_iter(&html).count(), html.matches('<').count());
    }
}
