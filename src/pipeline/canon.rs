//! Canonical document text: the single place absolute offsets are
//! established. Downstream components derive offsets from these sections,
//! never recompute them.

use super::segment::Section;

/// Fixed separator between sections in the canonical text.
pub const SEPARATOR: &str = "\n\n—\n\n";

/// Concatenate sections in emission order, assigning each its absolute byte
/// span in the joined text. Consumes and returns the section list rather than
/// mutating shared state.
pub fn build_canonical(sections: Vec<Section>) -> (String, Vec<Section>) {
    let mut text = String::new();
    let mut out = Vec::with_capacity(sections.len());
    for (i, mut section) in sections.into_iter().enumerate() {
        if i > 0 {
            text.push_str(SEPARATOR);
        }
        section.char_start = text.len();
        text.push_str(&section.clean_text);
        section.char_end = text.len();
        out.push(section);
    }
    (text, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, text: &str) -> Section {
        Section {
            section_id: id.to_string(),
            doc_id: "doc".to_string(),
            url: "https://example.com".to_string(),
            section_path: "Document".to_string(),
            heading_text: String::new(),
            heading_level: 0,
            char_start: 0,
            char_end: 0,
            clean_text: text.to_string(),
            prev_section_id: None,
            next_section_id: None,
        }
    }

    #[test]
    fn joined_sections_reconstruct_exactly() {
        let sections = vec![section("a", "first body"), section("b", "second body"), section("c", "third")];
        let (text, sections) = build_canonical(sections);
        let joined = sections
            .iter()
            .map(|s| s.clean_text.as_str())
            .collect::<Vec<_>>()
            .join(SEPARATOR);
        assert_eq!(text, joined);
    }

    #[test]
    fn offsets_slice_back_to_section_text() {
        let (text, sections) = build_canonical(vec![section("a", "first body"), section("b", "ünïcode body")]);
        for s in &sections {
            assert_eq!(&text[s.char_start..s.char_end], s.clean_text);
            assert_eq!(s.char_end - s.char_start, s.clean_text.len());
        }
    }

    #[test]
    fn adjacent_sections_differ_by_separator_length() {
        let (_, sections) = build_canonical(vec![section("a", "x"), section("b", "y"), section("c", "z")]);
        for pair in sections.windows(2) {
            assert_eq!(pair[1].char_start, pair[0].char_end + SEPARATOR.len());
        }
    }

    #[test]
    fn empty_input_yields_empty_text() {
        let (text, sections) = build_canonical(Vec::new());
        assert!(text.is_empty());
        assert!(sections.is_empty());
    }
}
