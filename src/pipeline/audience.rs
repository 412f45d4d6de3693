//! Audience inference and per-audience retrieval views.
//!
//! Audiences are scored from structured-data types and content cues, then the
//! fixed research/support/buyer views are composed over the extracted units.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::extract::{item_type, schema_items, Unit, UnitType};
use super::segment::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Audience {
    Buyer,
    Patient,
    Developer,
    Support,
    LocalService,
    Research,
}

impl Audience {
    pub fn id(&self) -> &'static str {
        match self {
            Audience::Buyer => "buyer_view",
            Audience::Patient => "patient_view",
            Audience::Developer => "developer_view",
            Audience::Support => "support_view",
            Audience::LocalService => "local_service_view",
            Audience::Research => "research_view",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Audience::Buyer => "buyer",
            Audience::Patient => "patient",
            Audience::Developer => "developer",
            Audience::Support => "support",
            Audience::LocalService => "local service",
            Audience::Research => "research",
        }
    }
}

/// Weight granted to a structured-data type match.
const SCHEMA_WEIGHT: f64 = 3.0;
/// Score at which confidence saturates.
const SCORE_CEILING: f64 = 5.0;
/// More definitions than this reads as research-oriented content.
const RESEARCH_DEFINITION_FLOOR: usize = 2;

static BUYER_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:pricing|payment|quote|booking|purchase|buy|order)").unwrap()
});
static DEVELOPER_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:code|endpoint|api|auth|token|function|class|import)").unwrap()
});
static SUPPORT_CONTENT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:troubleshoot|error|fix|issue|problem|solution)").unwrap()
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudienceSignal {
    #[serde(rename = "type")]
    pub kind: String,
    pub signal: String,
    pub user: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntendedUser {
    pub id: String,
    pub label: String,
    pub confidence: f64,
    pub signals: Vec<AudienceSignal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqPair {
    pub q_unit_id: String,
    pub a_unit_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct View {
    pub audience_id: String,
    pub summary_1_sentence: String,
    pub key_entities: Vec<String>,
    pub identity: Vec<String>,
    pub definitions: Vec<String>,
    pub key_claims: Vec<String>,
    pub faqs: Vec<FaqPair>,
    pub supporting_sections: Vec<String>,
    pub actions: Vec<String>,
}

/// Score each audience from schema types and content cues. Audiences with no
/// evidence are omitted; the rest are ordered by confidence, id as tiebreak.
pub fn infer_users(schemas: &[Value], doc_clean_text: &str, units: &[Unit]) -> Vec<IntendedUser> {
    let mut scores: BTreeMap<Audience, (f64, Vec<AudienceSignal>)> = BTreeMap::new();

    let mut add = |audience: Audience, weight: f64, kind: &str, signal: &str| {
        let entry = scores.entry(audience).or_insert_with(|| (0.0, Vec::new()));
        entry.0 += weight;
        entry.1.push(AudienceSignal {
            kind: kind.to_string(),
            signal: signal.to_string(),
            user: audience.id().to_string(),
        });
    };

    for item in schema_items(schemas) {
        let Some(schema_type) = item_type(item) else {
            continue;
        };
        let audience = match schema_type {
            "Product" | "Offer" | "Review" | "AggregateRating" => Some(Audience::Buyer),
            t if t.starts_with("Medical") => Some(Audience::Patient),
            "APIReference" | "TechArticle" | "SoftwareApplication" => Some(Audience::Developer),
            "FAQPage" | "HowTo" => Some(Audience::Support),
            "LocalBusiness" | "Service" if item.get("areaServed").is_some() => {
                Some(Audience::LocalService)
            }
            "ScholarlyArticle" | "Report" => Some(Audience::Research),
            _ => None,
        };
        if let Some(audience) = audience {
            add(audience, SCHEMA_WEIGHT, "schema", schema_type);
        }
    }

    if BUYER_CONTENT_RE.is_match(doc_clean_text) {
        add(Audience::Buyer, 1.0, "content", "transactional language");
        add(Audience::LocalService, 1.0, "content", "transactional language");
    }
    if DEVELOPER_CONTENT_RE.is_match(doc_clean_text) {
        add(Audience::Developer, 2.0, "content", "technical vocabulary");
    }
    if SUPPORT_CONTENT_RE.is_match(doc_clean_text) {
        add(Audience::Support, 1.0, "content", "troubleshooting language");
    }
    let definition_count = units
        .iter()
        .filter(|u| u.unit_type == UnitType::Definition)
        .count();
    if definition_count > RESEARCH_DEFINITION_FLOOR {
        add(Audience::Research, 2.0, "content", "definition density");
    }

    let mut users: Vec<IntendedUser> = scores
        .into_iter()
        .map(|(audience, (score, signals))| IntendedUser {
            id: audience.id().to_string(),
            label: audience.label().to_string(),
            confidence: (score / SCORE_CEILING).min(1.0),
            signals,
        })
        .collect();
    users.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    users
}

/// The fixed research/support/buyer views over the extracted units.
pub fn compose_views(url: &str, units: &[Unit], sections: &[Section]) -> BTreeMap<String, View> {
    let mut views = BTreeMap::new();
    for audience in [Audience::Research, Audience::Support, Audience::Buyer] {
        views.insert(
            audience.id().to_string(),
            compose_view(audience, url, units, sections),
        );
    }
    views
}

fn compose_view(audience: Audience, url: &str, units: &[Unit], sections: &[Section]) -> View {
    let mut key_entities = Vec::new();
    for u in units.iter().filter(|u| u.unit_type == UnitType::Fact) {
        if let Some(name) = u.entity_refs.first() {
            if !key_entities.contains(name) {
                key_entities.push(name.clone());
            }
        }
    }

    let ids_of = |t: UnitType| -> Vec<String> {
        units
            .iter()
            .filter(|u| u.unit_type == t)
            .map(|u| u.unit_id.clone())
            .collect()
    };

    let mut faqs = Vec::new();
    for q in units.iter().filter(|u| u.unit_type == UnitType::FaqQ) {
        let answer = units.iter().find(|a| {
            a.unit_type == UnitType::FaqA
                && a.section_id == q.section_id
                && a.char_start > q.char_end
        });
        if let Some(a) = answer {
            faqs.push(FaqPair {
                q_unit_id: q.unit_id.clone(),
                a_unit_id: a.unit_id.clone(),
            });
        }
    }

    View {
        audience_id: audience.id().to_string(),
        summary_1_sentence: format!("{} view of {}", audience.label(), url),
        key_entities,
        identity: ids_of(UnitType::Fact),
        definitions: ids_of(UnitType::Definition),
        key_claims: ids_of(UnitType::Claim),
        faqs,
        supporting_sections: sections.iter().map(|s| s.section_id.clone()).collect(),
        actions: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fact_unit(id: &str, entity: &str) -> Unit {
        Unit {
            unit_id: id.to_string(),
            section_id: "sec1".to_string(),
            doc_id: "doc1".to_string(),
            url: "https://example.com".to_string(),
            unit_type: UnitType::Fact,
            clean_text: format!("{} name is {}.", entity, entity),
            char_start: 0,
            char_end: 10,
            entity_refs: vec![entity.to_string()],
            triple: None,
            assertion: None,
            enriched_text_for_embedding: String::new(),
        }
    }

    fn typed_unit(id: &str, unit_type: UnitType, section: &str, start: usize, end: usize) -> Unit {
        Unit {
            unit_id: id.to_string(),
            section_id: section.to_string(),
            doc_id: "doc1".to_string(),
            url: "https://example.com".to_string(),
            unit_type,
            clean_text: "text".to_string(),
            char_start: start,
            char_end: end,
            entity_refs: vec![],
            triple: None,
            assertion: None,
            enriched_text_for_embedding: String::new(),
        }
    }

    #[test]
    fn faq_schema_scores_the_support_audience() {
        let schemas = vec![json!({"@type": "FAQPage", "mainEntity": []})];
        let users = infer_users(&schemas, "plain prose", &[]);
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, "support_view");
        assert!((users[0].confidence - 0.6).abs() < 1e-9);
        assert_eq!(users[0].signals[0].kind, "schema");
        assert_eq!(users[0].signals[0].signal, "FAQPage");
        // Signals name the audience by id, not display label.
        assert_eq!(users[0].signals[0].user, "support_view");
    }

    #[test]
    fn local_service_needs_area_served() {
        let with = vec![json!({"@type": "LocalBusiness", "areaServed": "Springfield"})];
        let without = vec![json!({"@type": "LocalBusiness"})];
        assert!(infer_users(&with, "", &[]).iter().any(|u| u.id == "local_service_view"));
        assert!(!infer_users(&without, "", &[]).iter().any(|u| u.id == "local_service_view"));
    }

    #[test]
    fn content_cues_stack_and_saturate() {
        let schemas = vec![
            json!({"@type": "Product", "name": "Widget"}),
            json!({"@type": "Offer"}),
        ];
        let users = infer_users(&schemas, "pricing and ordering details inside", &[]);
        let buyer = users.iter().find(|u| u.id == "buyer_view").unwrap();
        // 3 + 3 + 1 caps at the ceiling.
        assert!((buyer.confidence - 1.0).abs() < f64::EPSILON);
        assert_eq!(buyer.signals.len(), 3);
    }

    #[test]
    fn users_sort_by_confidence_then_id() {
        let schemas = vec![json!({"@type": "FAQPage"}), json!({"@type": "Report"})];
        let users = infer_users(&schemas, "", &[]);
        assert_eq!(users.len(), 2);
        // Equal scores: research_view sorts before support_view.
        assert_eq!(users[0].id, "research_view");
        assert_eq!(users[1].id, "support_view");
    }

    #[test]
    fn views_pair_questions_with_their_answers() {
        let units = vec![
            typed_unit("q1", UnitType::FaqQ, "sec1", 0, 20),
            typed_unit("a1", UnitType::FaqA, "sec1", 21, 80),
            fact_unit("f1", "Acme"),
        ];
        let views = compose_views("https://example.com", &units, &[]);
        assert_eq!(views.len(), 3);
        let support = &views["support_view"];
        assert_eq!(support.faqs.len(), 1);
        assert_eq!(support.faqs[0].q_unit_id, "q1");
        assert_eq!(support.faqs[0].a_unit_id, "a1");
        assert_eq!(support.key_entities, vec!["Acme"]);
        assert_eq!(support.identity, vec!["f1"]);
        assert!(support.actions.is_empty());
        assert_eq!(support.summary_1_sentence, "support view of https://example.com");
    }
}
