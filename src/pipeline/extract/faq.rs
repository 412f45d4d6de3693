//! Question/answer pairs from FAQPage structured data.
//!
//! Questions stay whole; answers are atomized so each fragment embeds on its
//! own. Every answer fragment is linked back to its question with a
//! high-confidence edge.

use serde_json::Value;

use super::{anchor_span, enriched_text, item_type, schema_items, Unit, UnitType};
use crate::ids::stable_id;
use crate::pipeline::atomize::{atomize, UNIT_TARGET_CAP};
use crate::pipeline::edges::{Edge, EdgeType};
use crate::pipeline::segment::Section;

pub fn extract(
    schemas: &[Value],
    sections: &[Section],
    doc_id: &str,
    url: &str,
) -> (Vec<Unit>, Vec<Edge>) {
    let mut units = Vec::new();
    let mut edges = Vec::new();

    let Some(section) = faq_section(sections) else {
        return (units, edges);
    };

    for item in schema_items(schemas) {
        if item_type(item) != Some("FAQPage") {
            continue;
        }
        let Some(questions) = item.get("mainEntity").and_then(Value::as_array) else {
            continue;
        };
        for question in questions {
            if item_type(question) != Some("Question") {
                continue;
            }
            let q_text = question
                .get("name")
                .or_else(|| question.get("text"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            let answer = question
                .get("acceptedAnswer")
                .and_then(|a| a.get("text"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .trim()
                .to_string();
            if q_text.is_empty() || answer.is_empty() {
                continue;
            }
            build_pair(section, doc_id, url, &q_text, &answer, &mut units, &mut edges);
        }
    }

    (units, edges)
}

/// The section whose heading mentions questions, falling back to the first.
fn faq_section(sections: &[Section]) -> Option<&Section> {
    sections
        .iter()
        .find(|s| {
            let heading = s.heading_text.to_lowercase();
            heading.contains("question") || heading.contains("faq")
        })
        .or_else(|| sections.first())
}

fn build_pair(
    section: &Section,
    doc_id: &str,
    url: &str,
    q_text: &str,
    answer: &str,
    units: &mut Vec<Unit>,
    edges: &mut Vec<Edge>,
) {
    let Some((q_start, q_end)) = anchor_span(section, 0, q_text.len()) else {
        return;
    };
    let q_id = stable_id(&[url, "faq_q", q_text]);
    units.push(make_unit(
        section, doc_id, url, UnitType::FaqQ, q_id.clone(), q_text, q_start, q_end,
    ));

    // Answer fragments lay out after the question, shifting left if the
    // section is too small to hold the tail.
    let mut local = q_end - section.char_start + 1;
    for fragment in atomize(answer, UNIT_TARGET_CAP) {
        let Some((a_start, a_end)) = anchor_span(section, local, fragment.len()) else {
            continue;
        };
        local = a_end - section.char_start + 1;
        let prefix: String = fragment.chars().take(50).collect();
        let a_id = stable_id(&[url, "faq_a", q_text, &prefix]);
        units.push(make_unit(
            section, doc_id, url, UnitType::FaqA, a_id.clone(), &fragment, a_start, a_end,
        ));
        edges.push(Edge {
            from_unit_id: q_id.clone(),
            to_unit_id: a_id,
            edge_type: EdgeType::Answers,
            edge_label: "answers".to_string(),
            confidence: 0.99,
        });
    }
}

#[allow(clippy::too_many_arguments)]
fn make_unit(
    section: &Section,
    doc_id: &str,
    url: &str,
    unit_type: UnitType,
    unit_id: String,
    text: &str,
    char_start: usize,
    char_end: usize,
) -> Unit {
    Unit {
        unit_id,
        section_id: section.section_id.clone(),
        doc_id: doc_id.to_string(),
        url: url.to_string(),
        unit_type,
        enriched_text_for_embedding: enriched_text(&section.section_path, url, unit_type, text),
        clean_text: text.to_string(),
        char_start,
        char_end,
        entity_refs: Vec::new(),
        triple: None,
        assertion: None,
    }
}
