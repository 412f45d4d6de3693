//! Assertive claim sentences matched against a fixed pattern table.

use std::sync::LazyLock;

use regex::Regex;

use super::{anchor_span, enriched_text, Unit, UnitType};
use crate::ids::stable_id;
use crate::pipeline::atomize::{atomize, split_sentences, UNIT_TARGET_CAP};
use crate::pipeline::segment::Section;

/// Claim sentences shorter than this carry too little to stand alone.
const MIN_CLAIM_CHARS: usize = 50;

static CLAIM_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(
            r"(?i)(?:AI systems|Generative AI|ChatGPT|Google AI Overviews)\s+(?:do not|fundamentally|prioritize|evaluate|extract)",
        )
        .unwrap(),
        Regex::new(r"(?i)(?:Traditional SEO|Indexing and retrieval)\s+(?:are|is|optimizes|measures)")
            .unwrap(),
    ]
});

pub fn extract(sections: &[Section], doc_id: &str, url: &str) -> Vec<Unit> {
    let mut units = Vec::new();

    for section in sections {
        for sentence in split_sentences(&section.clean_text) {
            let sentence = sentence.trim();
            if sentence.chars().count() <= MIN_CLAIM_CHARS {
                continue;
            }
            if !CLAIM_PATTERNS.iter().any(|re| re.is_match(sentence)) {
                continue;
            }
            let sentence_local = section.clean_text.find(sentence).unwrap_or(0);
            build_units(section, doc_id, url, sentence, sentence_local, &mut units);
        }
    }

    units
}

fn build_units(
    section: &Section,
    doc_id: &str,
    url: &str,
    sentence: &str,
    sentence_local: usize,
    units: &mut Vec<Unit>,
) {
    let mut local = sentence_local;
    for fragment in atomize(sentence, UNIT_TARGET_CAP) {
        let Some((char_start, char_end)) = anchor_span(section, local, fragment.len()) else {
            continue;
        };
        local = char_end - section.char_start + 1;
        let prefix: String = fragment.chars().take(50).collect();
        units.push(Unit {
            unit_id: stable_id(&[url, "claim", &prefix]),
            section_id: section.section_id.clone(),
            doc_id: doc_id.to_string(),
            url: url.to_string(),
            unit_type: UnitType::Claim,
            enriched_text_for_embedding: enriched_text(
                &section.section_path,
                url,
                UnitType::Claim,
                &fragment,
            ),
            clean_text: fragment,
            char_start,
            char_end,
            entity_refs: Vec::new(),
            triple: None,
            assertion: None,
        });
    }
}
