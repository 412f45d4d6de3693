//! Structural parsing of raw HTML: document metadata, embedded JSON-LD,
//! heading occurrences, and fragment-to-text conversion.
//!
//! Element removal and link/meta enumeration go through a real HTML tree
//! (`scraper`). Heading *positions* come from a regex scan of the raw markup,
//! because the tree does not expose source offsets and the segmenter needs
//! byte spans between headings.

use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;

use ego_tree::NodeRef;
use regex::Regex;
use scraper::{Html, Node, Selector};
use serde::{Deserialize, Serialize};

/// One regex per heading level, so a heading only closes at its own level and
/// a stray mismatched closing tag never ends someone else's heading.
static HEADING_RES: LazyLock<Vec<(u8, Regex)>> = LazyLock::new(|| {
    (1..=6u8)
        .map(|level| {
            let re = Regex::new(&format!(r"(?is)<h{level}[^>]*>(.*?)</h{level}\s*>")).unwrap();
            (level, re)
        })
        .collect()
});
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Elements whose subtrees never contribute body text.
const EXCLUDED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer", "aside", "template"];

/// Elements that force a line break around their content.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "table", "tr",
    "section", "article", "header", "blockquote", "pre", "dt", "dd",
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocMeta {
    pub description: String,
    pub keywords: String,
    pub author: String,
    pub og: BTreeMap<String, String>,
    pub twitter: BTreeMap<String, String>,
}

/// One heading occurrence in the raw markup. `start`/`end` are byte offsets
/// of the full `<hN>…</hN>` match.
#[derive(Debug, Clone)]
pub struct Heading {
    pub level: u8,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

pub fn extract_title(doc: &Html) -> String {
    let sel = Selector::parse("title").unwrap();
    doc.select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

pub fn extract_meta(doc: &Html) -> DocMeta {
    let mut meta = DocMeta::default();
    let sel = Selector::parse("meta").unwrap();

    for el in doc.select(&sel) {
        let Some(content) = el.value().attr("content") else {
            continue;
        };
        let content = content.trim();
        if content.is_empty() {
            continue;
        }

        if let Some(name) = el.value().attr("name") {
            match name {
                "description" => meta.description = content.to_string(),
                "keywords" => meta.keywords = content.to_string(),
                "author" => meta.author = content.to_string(),
                _ => {
                    if let Some(key) = name.strip_prefix("twitter:") {
                        meta.twitter.insert(key.to_string(), content.to_string());
                    }
                }
            }
        }
        if let Some(property) = el.value().attr("property") {
            if let Some(key) = property.strip_prefix("og:") {
                meta.og.insert(key.to_string(), content.to_string());
            }
        }
    }

    meta
}

/// All embedded JSON-LD blocks, in document order. Blocks that fail to parse
/// are dropped; one malformed block never aborts the rest of the document.
pub fn extract_json_ld(doc: &Html) -> Vec<serde_json::Value> {
    let sel = Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    doc.select(&sel)
        .filter_map(|el| {
            let raw = el.text().collect::<String>();
            serde_json::from_str(raw.trim()).ok()
        })
        .collect()
}

/// Heading occurrences with byte spans, in document order.
pub fn find_headings(html: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    for (level, re) in HEADING_RES.iter() {
        for caps in re.captures_iter(html) {
            let m = caps.get(0).unwrap();
            let inner = TAG_RE.replace_all(&caps[1], " ");
            headings.push(Heading {
                level: *level,
                text: inner.split_whitespace().collect::<Vec<_>>().join(" "),
                start: m.start(),
                end: m.end(),
            });
        }
    }
    headings.sort_by_key(|h| h.start);
    // A heading starting inside an earlier span was swallowed by an unclosed
    // tag at another level; keep the outer match only.
    headings.dedup_by(|later, earlier| later.start < earlier.end);
    headings
}

/// Inner HTML of `<body>`, or the whole document when no body exists.
pub fn body_html(doc: &Html, fallback: &str) -> String {
    let sel = Selector::parse("body").unwrap();
    doc.select(&sel)
        .next()
        .map(|el| el.inner_html())
        .unwrap_or_else(|| fallback.to_string())
}

/// Convert an HTML fragment to line-structured plain text.
///
/// Skips `script/style/nav/footer/aside` subtrees wholesale, breaks lines at
/// block elements, and collapses intra-line whitespace. One line per block;
/// blank lines are dropped so adjacent blocks stay adjacent.
pub fn fragment_text(fragment: &str) -> String {
    let doc = Html::parse_fragment(fragment);
    let mut raw = String::new();
    collect_text(doc.tree.root(), &mut raw);
    normalize_lines(&raw)
}

/// Anchor-link texts in a fragment (lowercased, under 100 chars), used by the
/// scrubber to recognize navigation labels.
pub fn anchor_texts(fragment: &str) -> HashSet<String> {
    let doc = Html::parse_fragment(fragment);
    let sel = Selector::parse("a").unwrap();
    doc.select(&sel)
        .filter_map(|el| {
            let text = el.text().collect::<String>().trim().to_string();
            if !text.is_empty() && text.chars().count() < 100 {
                Some(text.to_lowercase())
            } else {
                None
            }
        })
        .collect()
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Element(el) => {
                let name = el.name();
                if EXCLUDED_ELEMENTS.contains(&name) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                collect_text(child, out);
                if block {
                    out.push('\n');
                }
            }
            Node::Text(t) => out.push_str(&t.text),
            _ => {}
        }
    }
}

fn normalize_lines(raw: &str) -> String {
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_and_meta() {
        let html = r#"<html><head><title> Acme — Widgets </title>
            <meta name="description" content="All about widgets">
            <meta name="keywords" content="widgets, acme">
            <meta name="author" content="Jo">
            <meta property="og:title" content="Acme">
            <meta name="twitter:card" content="summary">
            </head><body></body></html>"#;
        let doc = Html::parse_document(html);
        assert_eq!(extract_title(&doc), "Acme — Widgets");
        let meta = extract_meta(&doc);
        assert_eq!(meta.description, "All about widgets");
        assert_eq!(meta.author, "Jo");
        assert_eq!(meta.og.get("title").map(String::as_str), Some("Acme"));
        assert_eq!(meta.twitter.get("card").map(String::as_str), Some("summary"));
    }

    #[test]
    fn malformed_json_ld_is_dropped() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"Organization","name":"Acme"}</script>
            <script type="application/ld+json">{not json at all</script>
            </head><body></body></html>"#;
        let doc = Html::parse_document(html);
        let blocks = extract_json_ld(&doc);
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0]["name"], "Acme");
    }

    #[test]
    fn headings_have_spans() {
        let html = "<body><h1>First</h1><p>x</p><h2 class=\"a\">Second <em>part</em></h2></body>";
        let hs = find_headings(html);
        assert_eq!(hs.len(), 2);
        assert_eq!(hs[0].level, 1);
        assert_eq!(hs[0].text, "First");
        assert_eq!(hs[1].level, 2);
        assert_eq!(hs[1].text, "Second part");
        assert!(hs[0].end <= hs[1].start);
        assert_eq!(&html[hs[0].start..hs[0].end], "<h1>First</h1>");
    }

    #[test]
    fn unclosed_heading_levels_are_ignored() {
        let html = "<body><h2>Broken</h3><p>x</p><h3>Real</h3></body>";
        let hs = find_headings(html);
        assert_eq!(hs.len(), 1);
        assert_eq!(hs[0].level, 3);
        assert_eq!(hs[0].text, "Real");
    }

    #[test]
    fn fragment_text_strips_chrome_and_keeps_lines() {
        let html = "<p>One   two</p><nav>Home About</nav><script>x()</script><p>Three</p>";
        let text = fragment_text(html);
        assert_eq!(text, "One two\nThree");
    }

    #[test]
    fn fragment_text_drops_blank_lines() {
        let html = "<div><p>a</p></div><div></div><div><p>b</p></div>";
        let text = fragment_text(html);
        assert_eq!(text, "a\nb");
    }

    #[test]
    fn anchor_texts_are_lowercased() {
        let html = r#"<a href="/x">View Services</a><a href="/y"><b>Contact</b> Us</a>"#;
        let anchors = anchor_texts(html);
        assert!(anchors.contains("view services"));
        assert!(anchors.contains("contact us"));
    }
}
