//! NDJSON export of stored extraction artifacts.
//!
//! Three record kinds share one stream, tagged by `kind`: factlets (one per
//! unit), triples (one per fact triple) and edges. Field names follow the
//! downstream index schema; this module only reshapes, it never recomputes.

use anyhow::Result;
use serde::Serialize;

use crate::pipeline::assertion::AssertionFrame;
use crate::pipeline::ExtractionResult;

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Record<'a> {
    Factlet {
        id: &'a str,
        doc_id: &'a str,
        url: &'a str,
        #[serde(rename = "type")]
        unit_type: &'a str,
        text: &'a str,
        embed_text: &'a str,
        section_id: &'a str,
        char_start: usize,
        char_end: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        assertion: Option<&'a AssertionFrame>,
    },
    Triple {
        doc_id: &'a str,
        subject_id: &'a str,
        subject_type: &'a str,
        predicate: &'a str,
        object: &'a str,
        source_url: &'a str,
        source_ref: &'a str,
    },
    Edge {
        doc_id: &'a str,
        from_id: &'a str,
        to_id: &'a str,
        relation: &'a str,
        confidence: f64,
    },
}

/// Serialize one artifact into NDJSON lines, factlets first, then triples,
/// then edges.
pub fn to_ndjson(result: &ExtractionResult) -> Result<Vec<String>> {
    let mut lines = Vec::new();

    for u in &result.units {
        lines.push(serde_json::to_string(&Record::Factlet {
            id: &u.unit_id,
            doc_id: &result.doc_id,
            url: &u.url,
            unit_type: u.unit_type.as_str(),
            text: &u.clean_text,
            embed_text: &u.enriched_text_for_embedding,
            section_id: &u.section_id,
            char_start: u.char_start,
            char_end: u.char_end,
            assertion: u.assertion.as_ref(),
        })?);
    }

    for u in &result.units {
        if let Some(t) = &u.triple {
            lines.push(serde_json::to_string(&Record::Triple {
                doc_id: &result.doc_id,
                subject_id: &t.subject_id,
                subject_type: &t.subject_type,
                predicate: &t.predicate,
                object: &t.object,
                source_url: &u.url,
                source_ref: &t.source_ref,
            })?);
        }
    }

    for e in &result.edges {
        lines.push(serde_json::to_string(&Record::Edge {
            doc_id: &result.doc_id,
            from_id: &e.from_unit_id,
            to_id: &e.to_unit_id,
            relation: e.edge_type.as_str(),
            confidence: e.confidence,
        })?);
    }

    Ok(lines)
}
