// src/sanitize.rs
//! Job description HTML -> readable plain text.

use scraper::{ElementRef, Html, Node};

/// Returned for an absent or empty description.
pub const NOT_SPECIFIED: &str = "Not specified";

/// `div` classes that wrap board boilerplate (company intro, outro, pay ranges).
pub const BOILERPLATE_CLASSES: [&str; 3] = [
    "content-intro",
    "content-conclusion",
    "content-pay-transparency",
];

/// Elements whose text is never user-visible copy.
const NON_TEXT_ELEMENTS: [&str; 4] = ["script", "style", "template", "noscript"];

fn is_boilerplate(el: &ElementRef<'_>) -> bool {
    el.value().name() == "div"
        && el
            .value()
            .classes()
            .any(|c| BOILERPLATE_CLASSES.contains(&c))
}

fn is_skipped(el: &ElementRef<'_>) -> bool {
    NON_TEXT_ELEMENTS.contains(&el.value().name()) || is_boilerplate(el)
}

/// Strip markup and boilerplate sections from a description.
///
/// Upstream ships entity-escaped HTML (`&lt;p&gt;...`), so entities are
/// decoded before parsing. Each remaining text node is trimmed, empty ones
/// are dropped, and the rest are joined with single spaces. Malformed
/// markup degrades to whatever text the parser recovers.
pub fn clean_html_text(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(s) if !s.is_empty() => s,
        _ => return NOT_SPECIFIED.to_string(),
    };

    let unescaped = html_escape::decode_html_entities(raw);
    let document = Html::parse_fragment(&unescaped);

    let mut parts: Vec<&str> = Vec::new();
    let mut stack = vec![*document.root_element()];
    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => {
                let t = text.trim();
                if !t.is_empty() {
                    parts.push(t);
                }
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(node) {
                    if is_skipped(&el) {
                        continue;
                    }
                }
                // reversed so pops come out in document order
                stack.extend(node.children().rev());
            }
            _ => {}
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_or_empty_is_not_specified() {
        assert_eq!(clean_html_text(None), NOT_SPECIFIED);
        assert_eq!(clean_html_text(Some("")), NOT_SPECIFIED);
    }

    #[test]
    fn joins_text_nodes_with_single_spaces() {
        let out = clean_html_text(Some("<p>Build <b>fast</b> things.</p>\n<ul><li>Rust</li><li>Go</li></ul>"));
        assert_eq!(out, "Build fast things. Rust Go");
    }

    #[test]
    fn decodes_escaped_markup_first() {
        let out = clean_html_text(Some("&lt;p&gt;Hello&amp;nbsp;world &amp;amp; friends&lt;/p&gt;"));
        assert_eq!(out, "Hello\u{a0}world & friends");
    }

    #[test]
    fn boilerplate_sections_are_removed() {
        let html = r#"<div class="content-intro"><p>About Figma: we love design.</p></div>
<p>You will write code.</p>
<div class="content-pay-transparency"><div class="title">Pay range</div><p>$100k</p></div>
<div class="extra content-conclusion">Equal opportunity employer.</div>"#;
        let out = clean_html_text(Some(html));
        assert_eq!(out, "You will write code.");
    }

    #[test]
    fn only_divs_count_as_boilerplate() {
        let out = clean_html_text(Some(r#"<span class="content-intro">kept</span>"#));
        assert_eq!(out, "kept");
    }

    #[test]
    fn script_and_style_text_is_dropped() {
        let out = clean_html_text(Some("<style>p{color:red}</style><p>Role</p><script>alert(1)</script>"));
        assert_eq!(out, "Role");
    }

    #[test]
    fn malformed_markup_is_best_effort() {
        let out = clean_html_text(Some("<p>Unclosed <b>bold <i>text"));
        assert_eq!(out, "Unclosed bold text");
    }
}
