//! The extraction pipeline: raw HTML in, retrieval-ready artifact out.
//!
//! Stages run in a fixed order. Structural parse, section segmentation with
//! boilerplate scrubbing, canonical text assembly, typed unit extraction,
//! assertion framing, edge generation, audience inference, quality metrics.
//! The whole pass is deterministic for a given (html, url) pair.

pub mod assertion;
pub mod atomize;
pub mod audience;
pub mod canon;
pub mod dom;
pub mod edges;
pub mod extract;
pub mod qa;
pub mod scrub;
pub mod segment;

use std::collections::BTreeMap;

use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::ids::{content_hash, stable_id};
use self::audience::{IntendedUser, View};
use self::dom::DocMeta;
use self::edges::Edge;
use self::extract::{Entity, Unit};
use self::qa::QaMetrics;
use self::scrub::BoilerplateSignals;
use self::segment::Section;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub doc_id: String,
    pub url: String,
    pub title: String,
    pub meta: DocMeta,
    pub structured_data: Vec<Value>,
    pub doc_clean_text: String,
    pub content_hash: String,
    pub boilerplate_signals: BoilerplateSignals,
    pub sections: Vec<Section>,
    pub units: Vec<Unit>,
    pub entities: Vec<Entity>,
    pub edges: Vec<Edge>,
    pub intended_users: Vec<IntendedUser>,
    pub views: BTreeMap<String, View>,
    pub qa: QaMetrics,
}

/// Run the full pipeline over one document.
pub fn extract(html: &str, url: &str) -> ExtractionResult {
    let doc_id = stable_id(&[url, "doc"]);

    let doc = Html::parse_document(html);
    let title = dom::extract_title(&doc);
    let meta = dom::extract_meta(&doc);
    let structured_data = dom::extract_json_ld(&doc);

    let mut signals = BoilerplateSignals::default();
    let sections = segment::segment(html, url, &doc_id, &mut signals);
    let (doc_clean_text, sections) = canon::build_canonical(sections);
    let content_hash = content_hash(&doc_clean_text);

    let mut units = extract::definitions::extract(&sections, &doc_id, url);
    let (entities, fact_units) = extract::facts::extract(&structured_data, &sections, &doc_id, url);
    units.extend(fact_units);
    let (faq_units, faq_edges) = extract::faq::extract(&structured_data, &sections, &doc_id, url);
    units.extend(faq_units);
    units.extend(extract::claims::extract(&sections, &doc_id, url));

    for unit in &mut units {
        let section = sections.iter().find(|s| s.section_id == unit.section_id);
        let frame = assertion::build(unit, section, url, &content_hash);
        unit.assertion = Some(frame);
    }

    let mut all_edges = edges::generate(&units, &sections);
    all_edges.extend(faq_edges);
    let all_edges = edges::dedup(all_edges);

    let intended_users = audience::infer_users(&structured_data, &doc_clean_text, &units);
    let views = audience::compose_views(url, &units, &sections);
    let qa = qa::compute(&doc_clean_text, &units, &all_edges, &signals);

    debug!(
        url,
        sections = sections.len(),
        units = units.len(),
        edges = all_edges.len(),
        "extraction complete"
    );

    ExtractionResult {
        doc_id,
        url: url.to_string(),
        title,
        meta,
        structured_data,
        doc_clean_text,
        content_hash,
        boilerplate_signals: signals,
        sections,
        units,
        entities,
        edges: all_edges,
        intended_users,
        views,
        qa,
    }
}
