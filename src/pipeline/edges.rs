//! Typed edges between units, derived from lexical overlap and containment.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::extract::{Unit, UnitType};
use super::segment::Section;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    Elaborates,
    Supports,
    Defines,
    SupportedBy,
    LocatedIn,
    Answers,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeType::Elaborates => "elaborates",
            EdgeType::Supports => "supports",
            EdgeType::Defines => "defines",
            EdgeType::SupportedBy => "supported_by",
            EdgeType::LocatedIn => "located_in",
            EdgeType::Answers => "answers",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub from_unit_id: String,
    pub to_unit_id: String,
    pub edge_type: EdgeType,
    pub edge_label: String,
    pub confidence: f64,
}

struct LexicalRule {
    from: UnitType,
    to: UnitType,
    edge_type: EdgeType,
    confidence: f64,
}

const LEXICAL_RULES: [LexicalRule; 4] = [
    LexicalRule {
        from: UnitType::FaqQ,
        to: UnitType::Definition,
        edge_type: EdgeType::Elaborates,
        confidence: 0.85,
    },
    LexicalRule {
        from: UnitType::FaqA,
        to: UnitType::Definition,
        edge_type: EdgeType::Supports,
        confidence: 0.80,
    },
    LexicalRule {
        from: UnitType::Claim,
        to: UnitType::Definition,
        edge_type: EdgeType::Defines,
        confidence: 0.75,
    },
    LexicalRule {
        from: UnitType::Claim,
        to: UnitType::Fact,
        edge_type: EdgeType::SupportedBy,
        confidence: 0.70,
    },
];

/// Lexical edges between units plus a containment edge from every definition
/// to its owning section. Deduplicated on (from, to, type).
pub fn generate(units: &[Unit], sections: &[Section]) -> Vec<Edge> {
    let mut edges = Vec::new();

    for from in units {
        for to in units {
            if from.unit_id == to.unit_id {
                continue;
            }
            for rule in &LEXICAL_RULES {
                if from.unit_type != rule.from || to.unit_type != rule.to {
                    continue;
                }
                if !mentions_any(&from.clean_text, &to.entity_refs) {
                    continue;
                }
                edges.push(Edge {
                    from_unit_id: from.unit_id.clone(),
                    to_unit_id: to.unit_id.clone(),
                    edge_type: rule.edge_type,
                    edge_label: rule.edge_type.as_str().to_string(),
                    confidence: rule.confidence,
                });
            }
        }
    }

    let section_ids: HashSet<&str> = sections.iter().map(|s| s.section_id.as_str()).collect();
    for unit in units.iter().filter(|u| u.unit_type == UnitType::Definition) {
        if section_ids.contains(unit.section_id.as_str()) {
            edges.push(Edge {
                from_unit_id: unit.unit_id.clone(),
                to_unit_id: unit.section_id.clone(),
                edge_type: EdgeType::LocatedIn,
                edge_label: "located_in".to_string(),
                confidence: 1.0,
            });
        }
    }

    dedup(edges)
}

/// Drop repeated (from, to, type) triples, keeping the first occurrence.
pub fn dedup(edges: Vec<Edge>) -> Vec<Edge> {
    let mut seen = HashSet::new();
    edges
        .into_iter()
        .filter(|e| seen.insert((e.from_unit_id.clone(), e.to_unit_id.clone(), e.edge_type)))
        .collect()
}

fn mentions_any(text: &str, entity_refs: &[String]) -> bool {
    if entity_refs.is_empty() {
        return false;
    }
    let haystack = text.to_lowercase();
    entity_refs
        .iter()
        .any(|r| !r.is_empty() && haystack.contains(&r.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(id: &str, unit_type: UnitType, text: &str, entity_refs: Vec<&str>) -> Unit {
        Unit {
            unit_id: id.to_string(),
            section_id: "sec1".to_string(),
            doc_id: "doc1".to_string(),
            url: "https://example.com".to_string(),
            unit_type,
            clean_text: text.to_string(),
            char_start: 0,
            char_end: text.len(),
            entity_refs: entity_refs.into_iter().map(str::to_string).collect(),
            triple: None,
            assertion: None,
            enriched_text_for_embedding: String::new(),
        }
    }

    fn section(id: &str) -> Section {
        Section {
            section_id: id.to_string(),
            doc_id: "doc1".to_string(),
            url: "https://example.com".to_string(),
            section_path: "Document".to_string(),
            heading_text: String::new(),
            heading_level: 0,
            char_start: 0,
            char_end: 100,
            clean_text: "x".repeat(100),
            prev_section_id: None,
            next_section_id: None,
        }
    }

    #[test]
    fn claim_mentioning_a_defined_term_gets_a_defines_edge() {
        let units = vec![
            unit("def1", UnitType::Definition, "SINR: a retrieval substrate.", vec!["SINR"]),
            unit("clm1", UnitType::Claim, "AI systems evaluate sinr pages directly.", vec![]),
        ];
        let edges = generate(&units, &[]);
        let defines: Vec<&Edge> = edges.iter().filter(|e| e.edge_type == EdgeType::Defines).collect();
        assert_eq!(defines.len(), 1);
        assert_eq!(defines[0].from_unit_id, "clm1");
        assert_eq!(defines[0].to_unit_id, "def1");
        assert!((defines[0].confidence - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn units_never_point_at_themselves() {
        let units = vec![unit(
            "def1",
            UnitType::Definition,
            "SINR: SINR explained in terms of itself.",
            vec!["SINR"],
        )];
        let edges = generate(&units, &[]);
        assert!(edges.iter().all(|e| e.from_unit_id != e.to_unit_id));
    }

    #[test]
    fn definitions_link_to_their_section() {
        let units = vec![
            unit("def1", UnitType::Definition, "SINR: a substrate.", vec!["SINR"]),
            unit("clm1", UnitType::Claim, "Traditional SEO is ranked lists.", vec![]),
        ];
        let edges = generate(&units, &[section("sec1")]);
        let located: Vec<&Edge> = edges.iter().filter(|e| e.edge_type == EdgeType::LocatedIn).collect();
        assert_eq!(located.len(), 1);
        assert_eq!(located[0].from_unit_id, "def1");
        assert!(located.iter().all(|e| e.to_unit_id == "sec1" && e.confidence == 1.0));
    }

    #[test]
    fn duplicate_edges_collapse_to_one() {
        let edge = Edge {
            from_unit_id: "a".to_string(),
            to_unit_id: "b".to_string(),
            edge_type: EdgeType::Answers,
            edge_label: "answers".to_string(),
            confidence: 0.99,
        };
        let deduped = dedup(vec![edge.clone(), edge.clone(), edge]);
        assert_eq!(deduped.len(), 1);
    }

    #[test]
    fn no_edge_without_lexical_overlap() {
        let units = vec![
            unit("def1", UnitType::Definition, "SINR: a substrate.", vec!["SINR"]),
            unit("clm1", UnitType::Claim, "AI systems evaluate widgets only.", vec![]),
        ];
        let edges = generate(&units, &[]);
        assert!(edges.iter().all(|e| e.edge_type != EdgeType::Defines));
    }
}
