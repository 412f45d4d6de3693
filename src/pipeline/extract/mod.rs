//! Typed knowledge units extracted from sections and structured data.

pub mod claims;
pub mod definitions;
pub mod facts;
pub mod faq;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::assertion::AssertionFrame;
use super::segment::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitType {
    Definition,
    Fact,
    Claim,
    FaqQ,
    FaqA,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Definition => "definition",
            UnitType::Fact => "fact",
            UnitType::Claim => "claim",
            UnitType::FaqQ => "faq_q",
            UnitType::FaqA => "faq_a",
        }
    }
}

/// Subject–predicate–object relation derived from structured metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Triple {
    pub subject_id: String,
    pub subject_type: String,
    pub predicate: String,
    pub object: String,
    /// `@id` of the structured-data node this came from, if any.
    pub source_ref: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub unit_id: String,
    pub section_id: String,
    pub doc_id: String,
    pub url: String,
    pub unit_type: UnitType,
    pub clean_text: String,
    /// Absolute byte offsets into the canonical text; always within the
    /// owning section's span.
    pub char_start: usize,
    pub char_end: usize,
    pub entity_refs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triple: Option<Triple>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion: Option<AssertionFrame>,
    pub enriched_text_for_embedding: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub entity_id: String,
    pub entity_type: String,
    pub name: String,
    pub url: String,
}

/// Synthetic string combining provenance context with the unit text, consumed
/// by downstream indexing only.
pub fn enriched_text(section_path: &str, url: &str, unit_type: UnitType, text: &str) -> String {
    format!(
        "DOC: {} | URL: {} | TYPE: {} | TEXT: {}",
        section_path,
        url,
        unit_type.as_str(),
        text
    )
}

/// Flatten structured-data blocks into items, expanding `@graph` arrays.
pub fn schema_items(schemas: &[Value]) -> Vec<&Value> {
    let mut items = Vec::new();
    for schema in schemas {
        match schema.get("@graph").and_then(Value::as_array) {
            Some(graph) => items.extend(graph.iter()),
            None => items.push(schema),
        }
    }
    items
}

/// `@type` of an item: the string itself, or the first entry of an array.
pub fn item_type(item: &Value) -> Option<&str> {
    match item.get("@type") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Array(arr)) => arr.first().and_then(Value::as_str),
        _ => None,
    }
}

/// Place a unit of `len` bytes at `desired_local` bytes into a section,
/// left-shifting as needed so the span stays inside the section. Returns
/// `None` when the text cannot fit at all (parse-local failure: skip the
/// unit, never abort).
pub fn anchor_span(section: &Section, desired_local: usize, len: usize) -> Option<(usize, usize)> {
    let span_len = section.char_end - section.char_start;
    if len > span_len {
        return None;
    }
    let max_local = span_len - len;
    let start = section.char_start + desired_local.min(max_local);
    Some((start, start + len))
}
