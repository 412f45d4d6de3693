//! Assertion frames: each unit restated as subject/predicate/object with
//! modality and provenance, so downstream consumers can cite without
//! re-parsing text.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::extract::{Unit, UnitType};
use super::segment::Section;

static CLAIM_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([^,]+?)\s+(?:is|are|do not|fundamentally|prioritize|evaluate|extract)\s+(.+)$")
        .unwrap()
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub url: String,
    pub section_id: String,
    pub char_start: usize,
    pub char_end: usize,
    pub content_hash: String,
}

/// Whether the frame states verified structure or repeats page prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Is,
    Claims,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionFrame {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    pub qualifiers: Vec<String>,
    pub modality: Modality,
    pub scope: String,
    pub provenance: Provenance,
}

pub fn build(unit: &Unit, section: Option<&Section>, url: &str, content_hash: &str) -> AssertionFrame {
    let provenance = Provenance {
        url: url.to_string(),
        section_id: unit.section_id.clone(),
        char_start: unit.char_start,
        char_end: unit.char_end,
        content_hash: content_hash.to_string(),
    };
    let scope = section
        .map(|s| s.section_path.clone())
        .unwrap_or_else(|| "Document".to_string());
    let default_subject = unit
        .entity_refs
        .first()
        .cloned()
        .unwrap_or_else(|| unit.url.clone());

    let (subject, predicate, object, modality) = match unit.unit_type {
        UnitType::Definition => {
            let (term, body) = unit
                .clean_text
                .split_once(':')
                .map(|(t, b)| (t.trim().to_string(), b.trim().to_string()))
                .unwrap_or_else(|| (default_subject.clone(), unit.clean_text.clone()));
            (term, "is defined as".to_string(), body, Modality::Is)
        }
        UnitType::Fact => match &unit.triple {
            Some(t) => (
                t.subject_id.clone(),
                t.predicate.clone(),
                t.object.clone(),
                Modality::Is,
            ),
            None => (
                default_subject,
                "states".to_string(),
                unit.clean_text.clone(),
                Modality::Is,
            ),
        },
        UnitType::FaqQ => (
            default_subject,
            "asks".to_string(),
            unit.clean_text.clone(),
            Modality::Is,
        ),
        UnitType::FaqA => (
            default_subject,
            "answers".to_string(),
            unit.clean_text.clone(),
            Modality::Is,
        ),
        UnitType::Claim => match CLAIM_SPLIT_RE.captures(&unit.clean_text) {
            Some(caps) => (
                caps[1].trim().to_string(),
                "asserts".to_string(),
                caps[2].trim().to_string(),
                Modality::Claims,
            ),
            None => (
                default_subject,
                "asserts".to_string(),
                unit.clean_text.clone(),
                Modality::Claims,
            ),
        },
    };

    AssertionFrame {
        subject,
        predicate,
        object,
        qualifiers: Vec::new(),
        modality,
        scope,
        provenance,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::extract::Triple;

    const URL: &str = "https://example.com/page";

    fn unit(unit_type: UnitType, text: &str, entity_refs: Vec<String>) -> Unit {
        Unit {
            unit_id: "u1".to_string(),
            section_id: "s1".to_string(),
            doc_id: "d1".to_string(),
            url: URL.to_string(),
            unit_type,
            clean_text: text.to_string(),
            char_start: 10,
            char_end: 10 + text.len(),
            entity_refs,
            triple: None,
            assertion: None,
            enriched_text_for_embedding: String::new(),
        }
    }

    #[test]
    fn definitions_split_on_the_first_colon() {
        let u = unit(
            UnitType::Definition,
            "SINR: a retrieval substrate for deterministic anchoring.",
            vec!["SINR".to_string()],
        );
        let frame = build(&u, None, URL, "hash");
        assert_eq!(frame.subject, "SINR");
        assert_eq!(frame.predicate, "is defined as");
        assert!(frame.object.starts_with("a retrieval substrate"));
        assert_eq!(frame.modality, Modality::Is);
    }

    #[test]
    fn facts_copy_their_triple() {
        let mut u = unit(UnitType::Fact, "Acme telephone is 555-0100.", vec!["Acme".to_string()]);
        u.triple = Some(Triple {
            subject_id: "ent1".to_string(),
            subject_type: "Organization".to_string(),
            predicate: "telephone".to_string(),
            object: "555-0100".to_string(),
            source_ref: String::new(),
        });
        let frame = build(&u, None, URL, "hash");
        assert_eq!(frame.subject, "ent1");
        assert_eq!(frame.predicate, "telephone");
        assert_eq!(frame.object, "555-0100");
    }

    #[test]
    fn claims_get_the_claims_modality() {
        let u = unit(
            UnitType::Claim,
            "AI systems do not crawl pages the way classic crawlers did.",
            vec![],
        );
        let frame = build(&u, None, URL, "hash");
        assert_eq!(frame.modality, Modality::Claims);
        assert_eq!(frame.predicate, "asserts");
        assert_eq!(frame.subject, "AI systems");
        assert!(frame.object.starts_with("crawl pages"));
    }

    #[test]
    fn provenance_mirrors_the_unit_span() {
        let u = unit(UnitType::FaqQ, "How are widgets shipped?", vec![]);
        let frame = build(&u, None, URL, "abc123");
        assert_eq!(frame.predicate, "asks");
        assert_eq!(frame.provenance.char_start, 10);
        assert_eq!(frame.provenance.char_end, 10 + u.clean_text.len());
        assert_eq!(frame.provenance.content_hash, "abc123");
        assert_eq!(frame.scope, "Document");
    }
}
