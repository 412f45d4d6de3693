//! Extraction quality metrics computed over the finished artifact.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::edges::{Edge, EdgeType};
use super::extract::{Unit, UnitType};
use super::scrub::BoilerplateSignals;

/// Units over this length count against atomization.
const ATOMIZATION_CAP: usize = 800;
/// Prefix length used to detect near-duplicate units.
const DUPLICATE_PREFIX_CHARS: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaMetrics {
    pub boilerplate_ratio: f64,
    pub unit_atomization_score: f64,
    pub provenance_coverage: f64,
    pub duplicate_unit_rate: f64,
    pub view_coherence: f64,
}

pub fn compute(
    doc_clean_text: &str,
    units: &[Unit],
    edges: &[Edge],
    signals: &BoilerplateSignals,
) -> QaMetrics {
    QaMetrics {
        boilerplate_ratio: boilerplate_ratio(doc_clean_text, signals),
        unit_atomization_score: atomization_score(units),
        provenance_coverage: provenance_coverage(doc_clean_text, units),
        duplicate_unit_rate: duplicate_rate(units),
        view_coherence: view_coherence(units, edges),
    }
}

fn boilerplate_ratio(doc_clean_text: &str, signals: &BoilerplateSignals) -> f64 {
    let kept = doc_clean_text.chars().count();
    if kept == 0 {
        return 0.0;
    }
    let removed: usize = signals
        .removed_fragments
        .iter()
        .map(|f| f.chars().count())
        .sum();
    removed as f64 / kept as f64
}

fn atomization_score(units: &[Unit]) -> f64 {
    if units.is_empty() {
        return 0.0;
    }
    let within = units
        .iter()
        .filter(|u| u.clean_text.chars().count() <= ATOMIZATION_CAP)
        .count();
    within as f64 / units.len() as f64
}

/// A unit has valid provenance when its span sits inside the canonical text
/// and its length matches its text byte for byte.
fn provenance_coverage(doc_clean_text: &str, units: &[Unit]) -> f64 {
    if units.is_empty() {
        return 0.0;
    }
    let valid = units
        .iter()
        .filter(|u| {
            u.char_end <= doc_clean_text.len()
                && u.char_start <= u.char_end
                && u.char_end - u.char_start == u.clean_text.len()
        })
        .count();
    valid as f64 / units.len() as f64
}

fn duplicate_rate(units: &[Unit]) -> f64 {
    if units.is_empty() {
        return 0.0;
    }
    let distinct: HashSet<String> = units
        .iter()
        .map(|u| {
            u.clean_text
                .to_lowercase()
                .chars()
                .take(DUPLICATE_PREFIX_CHARS)
                .collect()
        })
        .collect();
    (units.len() - distinct.len()) as f64 / units.len() as f64
}

/// Ordering checks over the composed views: definitions precede the claims
/// that lean on them, and identity facts precede everything else. 1.0 when
/// nothing is checkable.
fn view_coherence(units: &[Unit], edges: &[Edge]) -> f64 {
    let mut checks = 0usize;
    let mut passed = 0usize;

    let find = |id: &str| units.iter().find(|u| u.unit_id == id);
    for edge in edges.iter().filter(|e| e.edge_type == EdgeType::Defines) {
        let (Some(claim), Some(definition)) = (find(&edge.from_unit_id), find(&edge.to_unit_id))
        else {
            continue;
        };
        checks += 1;
        if definition.char_start <= claim.char_start {
            passed += 1;
        }
    }

    let first_fact = units
        .iter()
        .filter(|u| u.unit_type == UnitType::Fact)
        .map(|u| u.char_start)
        .min();
    let first_other = units
        .iter()
        .filter(|u| u.unit_type != UnitType::Fact)
        .map(|u| u.char_start)
        .min();
    if let (Some(fact), Some(other)) = (first_fact, first_other) {
        checks += 1;
        if fact <= other {
            passed += 1;
        }
    }

    if checks == 0 {
        return 1.0;
    }
    passed as f64 / checks as f64
}
