//! Partitioning cleaned body text into path-addressed sections.

use scraper::Html;
use serde::{Deserialize, Serialize};

use super::dom;
use super::scrub::{self, BoilerplateSignals};
use crate::ids::stable_id;

/// Sections with less cleaned text than this are noise, not knowledge.
pub const MIN_SECTION_CHARS: usize = 100;
/// Cleaned text beyond this is split into successive windows.
pub const MAX_SECTION_CHARS: usize = 3000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub section_id: String,
    pub doc_id: String,
    pub url: String,
    /// `>`-joined heading breadcrumb, or "Document" for the synthetic section.
    pub section_path: String,
    pub heading_text: String,
    /// 0 = synthetic whole-document section.
    pub heading_level: u8,
    /// Absolute byte offsets into `doc_clean_text`, assigned by the canonical
    /// text builder.
    pub char_start: usize,
    pub char_end: usize,
    pub clean_text: String,
    pub prev_section_id: Option<String>,
    pub next_section_id: Option<String>,
}

/// Split raw HTML into sections along its heading hierarchy.
///
/// No headings → one synthetic section from the whole body, never windowed.
/// Oversized heading sections are split into ≤3000-char windows sharing path
/// and heading metadata. All emitted sections are doubly linked in emission
/// order.
pub fn segment(
    html: &str,
    url: &str,
    doc_id: &str,
    signals: &mut BoilerplateSignals,
) -> Vec<Section> {
    let headings = dom::find_headings(html);
    let mut sections = Vec::new();

    if headings.is_empty() {
        let doc = Html::parse_document(html);
        let body = dom::body_html(&doc, html);
        let clean = clean_span(&body, signals);
        if clean.chars().count() >= MIN_SECTION_CHARS {
            sections.push(Section {
                section_id: stable_id(&[url, "section", "0"]),
                doc_id: doc_id.to_string(),
                url: url.to_string(),
                section_path: "Document".to_string(),
                heading_text: String::new(),
                heading_level: 0,
                char_start: 0,
                char_end: 0,
                clean_text: clean,
                prev_section_id: None,
                next_section_id: None,
            });
        }
        return sections;
    }

    // Ancestor stack: pop everything at or below the current level, push self.
    let mut path_stack: Vec<(u8, String)> = Vec::new();

    for (i, heading) in headings.iter().enumerate() {
        while path_stack
            .last()
            .is_some_and(|(level, _)| *level >= heading.level)
        {
            path_stack.pop();
        }
        path_stack.push((heading.level, heading.text.clone()));
        let section_path = path_stack
            .iter()
            .map(|(_, text)| text.as_str())
            .collect::<Vec<_>>()
            .join(" > ");

        let span_end = headings.get(i + 1).map(|h| h.start).unwrap_or(html.len());
        let span = &html[heading.end..span_end];
        let clean = clean_span(span, signals);
        if clean.chars().count() < MIN_SECTION_CHARS {
            continue;
        }

        for (idx, window) in char_windows(&clean, MAX_SECTION_CHARS).into_iter().enumerate() {
            sections.push(Section {
                section_id: stable_id(&[url, &section_path, &idx.to_string()]),
                doc_id: doc_id.to_string(),
                url: url.to_string(),
                section_path: section_path.clone(),
                heading_text: heading.text.clone(),
                heading_level: heading.level,
                char_start: 0,
                char_end: 0,
                clean_text: window,
                prev_section_id: None,
                next_section_id: None,
            });
        }
    }

    link_sections(&mut sections);
    sections
}

fn clean_span(span: &str, signals: &mut BoilerplateSignals) -> String {
    let anchors = dom::anchor_texts(span);
    let text = dom::fragment_text(span);
    scrub::scrub(&text, &anchors, signals)
}

/// Successive windows of at most `max_chars` characters, on char boundaries.
fn char_windows(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

fn link_sections(sections: &mut [Section]) {
    for i in 1..sections.len() {
        let prev_id = sections[i - 1].section_id.clone();
        let cur_id = sections[i].section_id.clone();
        sections[i].prev_section_id = Some(prev_id);
        sections[i - 1].next_section_id = Some(cur_id);
    }
}
