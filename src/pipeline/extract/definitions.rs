//! Canonical definitions as first-class units.
//!
//! Matches `TERM (EXPANSION): definition`, `TERM is definition` and
//! `TERM: definition` per line, where TERM is an uppercase sequence. The
//! first matching pattern per line wins.

use std::sync::LazyLock;

use regex::Regex;

use super::{anchor_span, enriched_text, Unit, UnitType};
use crate::ids::stable_id;
use crate::pipeline::atomize::{atomize, UNIT_TARGET_CAP};
use crate::pipeline::segment::Section;

/// Definition bodies at or under this length are too thin to keep.
const MIN_DEFINITION_CHARS: usize = 30;

static TERM_EXPANSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Z\s]{1,40}?)\s*\(([^)]+)\)\s*[:\-]\s*(.+)$").unwrap()
});
static TERM_IS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Z\s]{1,40}?)\s+is\s+(.+)$").unwrap());
static TERM_COLON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z][A-Z\s]{1,40}?)\s*:\s*(.+)$").unwrap());

struct DefinitionMatch {
    term: String,
    expansion: Option<String>,
    body: String,
}

pub fn extract(sections: &[Section], doc_id: &str, url: &str) -> Vec<Unit> {
    let mut units = Vec::new();

    for section in sections {
        let mut line_offset = 0usize;
        for line in section.clean_text.lines() {
            if let Some(m) = match_line(line) {
                if m.body.chars().count() > MIN_DEFINITION_CHARS {
                    build_units(section, doc_id, url, &m, line_offset, &mut units);
                }
            }
            line_offset += line.len() + 1;
        }
    }

    units
}

fn match_line(line: &str) -> Option<DefinitionMatch> {
    if let Some(caps) = TERM_EXPANSION_RE.captures(line) {
        return Some(DefinitionMatch {
            term: caps[1].trim().to_string(),
            expansion: Some(caps[2].trim().to_string()),
            body: caps[3].trim().to_string(),
        });
    }
    if let Some(caps) = TERM_IS_RE.captures(line) {
        return Some(DefinitionMatch {
            term: caps[1].trim().to_string(),
            expansion: None,
            body: caps[2].trim().to_string(),
        });
    }
    if let Some(caps) = TERM_COLON_RE.captures(line) {
        return Some(DefinitionMatch {
            term: caps[1].trim().to_string(),
            expansion: None,
            body: caps[2].trim().to_string(),
        });
    }
    None
}

fn build_units(
    section: &Section,
    doc_id: &str,
    url: &str,
    m: &DefinitionMatch,
    line_offset: usize,
    units: &mut Vec<Unit>,
) {
    for fragment in atomize(&m.body, UNIT_TARGET_CAP) {
        let full_text = match &m.expansion {
            Some(exp) => format!("{} ({}): {}", m.term, exp, fragment),
            None => format!("{}: {}", m.term, fragment),
        };
        let Some((char_start, char_end)) = anchor_span(section, line_offset, full_text.len())
        else {
            continue;
        };

        let prefix: String = fragment.chars().take(50).collect();
        let mut entity_refs = vec![m.term.clone()];
        if let Some(exp) = &m.expansion {
            entity_refs.push(exp.clone());
        }

        units.push(Unit {
            unit_id: stable_id(&[url, "definition", &m.term, &prefix]),
            section_id: section.section_id.clone(),
            doc_id: doc_id.to_string(),
            url: url.to_string(),
            unit_type: UnitType::Definition,
            enriched_text_for_embedding: enriched_text(
                &section.section_path,
                url,
                UnitType::Definition,
                &full_text,
            ),
            clean_text: full_text,
            char_start,
            char_end,
            entity_refs,
            triple: None,
            assertion: None,
        });
    }
}
