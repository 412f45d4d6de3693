//! Hard boilerplate and CTA scrubbing.
//!
//! Every rule has a name; everything a rule removes is recorded in the
//! per-call [`BoilerplateSignals`] accumulator, which is threaded through the
//! segmenter by `&mut` and returned as part of the extraction result.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub const RULE_CTA_PATTERN: &str = "cta_pattern";
pub const RULE_CTA_CLUSTER: &str = "cta_cluster";
pub const RULE_NAV_LABEL: &str = "nav_label";
pub const RULE_PUNCTUATION_LINE: &str = "punctuation_line";

/// Call-to-action phrase rules, applied at line starts anywhere in the text.
static CTA_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    vec![
        (
            RULE_CTA_PATTERN,
            Regex::new(
                r"(?im)^(?:book consultation|view services|learn about|start learning|get started|contact|schedule|request a quote|free consultation)",
            )
            .unwrap(),
        ),
        (
            RULE_CTA_PATTERN,
            Regex::new(
                r"(?im)^(?:book|learn|start|get|view|contact|schedule|request|free)\s+(?:consultation|services|learning|started|contact|schedule|quote)",
            )
            .unwrap(),
        ),
    ]
});

/// Trailing cluster of 3+ consecutive short Title-Case lines (≤3 words each),
/// the usual shape of a footer CTA link list.
static CTA_CLUSTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\n[A-Z][a-z]+(?: [A-Z][a-z]+){0,2}){3,}\s*$").unwrap());

static PUNCT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\w\s]+$").unwrap());
static BLANK_RUN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());

/// What the scrubber removed during one extraction call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoilerplateSignals {
    pub removed_fragments: Vec<String>,
    pub rules_fired: BTreeSet<String>,
}

impl BoilerplateSignals {
    pub(crate) fn record(&mut self, rule: &str, fragment: &str) {
        let fragment = fragment.trim();
        if !fragment.is_empty() {
            self.removed_fragments.push(fragment.to_string());
        }
        self.rules_fired.insert(rule.to_string());
    }
}

/// Scrub boilerplate and CTA noise from a text blob.
///
/// The trailing-cluster rule runs before the phrase rules so a footer link
/// list is recognized as a cluster before its individual lines are eaten.
pub fn scrub(text: &str, anchors: &HashSet<String>, signals: &mut BoilerplateSignals) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut cleaned = text.to_string();

    // Trailing CTA cluster, removed wholesale.
    if let Some(start) = CTA_CLUSTER_RE.find(&cleaned).map(|m| m.start()) {
        for line in cleaned[start..].lines().filter(|l| !l.trim().is_empty()) {
            signals.record(RULE_CTA_CLUSTER, line);
        }
        cleaned.truncate(start);
    }

    // CTA phrases anywhere in the text.
    for (rule, re) in CTA_PATTERNS.iter() {
        if re.is_match(&cleaned) {
            for m in re.find_iter(&cleaned) {
                signals.record(rule, m.as_str());
            }
            cleaned = re.replace_all(&cleaned, "").to_string();
        }
    }

    // Line-level filtering: nav labels and punctuation-only lines.
    let mut kept: Vec<&str> = Vec::new();
    for line in cleaned.lines() {
        let line = line.trim();
        if line.is_empty() {
            kept.push("");
            continue;
        }
        if anchors.contains(&line.to_lowercase()) {
            signals.record(RULE_NAV_LABEL, line);
            continue;
        }
        if PUNCT_LINE_RE.is_match(line) {
            signals.record(RULE_PUNCTUATION_LINE, line);
            continue;
        }
        kept.push(line);
    }

    let joined = kept.join("\n");
    BLANK_RUN_RE.replace_all(&joined, "\n\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scrub_plain(text: &str) -> (String, BoilerplateSignals) {
        let mut signals = BoilerplateSignals::default();
        let out = scrub(text, &HashSet::new(), &mut signals);
        (out, signals)
    }

    #[test]
    fn trailing_title_case_cluster_is_removed() {
        let text = "Our widgets are assembled locally and ship within two days.\nBook Consultation\nLearn About Us\nGet Started";
        let (out, signals) = scrub_plain(text);
        assert_eq!(out, "Our widgets are assembled locally and ship within two days.");
        assert!(signals.rules_fired.contains(RULE_CTA_CLUSTER));
        assert!(signals
            .removed_fragments
            .iter()
            .any(|f| f == "Book Consultation"));
    }

    #[test]
    fn cta_phrase_at_line_start_is_removed() {
        let text = "Widgets rule.\nGet started with our premium plan today";
        let (out, signals) = scrub_plain(text);
        assert!(!out.to_lowercase().contains("get started"));
        assert!(signals.rules_fired.contains(RULE_CTA_PATTERN));
    }

    #[test]
    fn anchor_text_lines_are_dropped() {
        let mut anchors = HashSet::new();
        anchors.insert("pricing".to_string());
        let mut signals = BoilerplateSignals::default();
        let out = scrub("Real content about widgets.\nPricing", &anchors, &mut signals);
        assert_eq!(out, "Real content about widgets.");
        assert!(signals.rules_fired.contains(RULE_NAV_LABEL));
        assert_eq!(signals.removed_fragments, vec!["Pricing"]);
    }

    #[test]
    fn punctuation_only_lines_are_dropped() {
        let (out, signals) = scrub_plain("Above\n***\nBelow");
        assert_eq!(out, "Above\nBelow");
        assert!(signals.rules_fired.contains(RULE_PUNCTUATION_LINE));
    }

    #[test]
    fn blank_runs_collapse_to_one_blank_line() {
        let (out, _) = scrub_plain("First paragraph here.\n\n\n\nSecond paragraph here.");
        assert_eq!(out, "First paragraph here.\n\nSecond paragraph here.");
    }

    #[test]
    fn clean_text_passes_through() {
        let text = "Nothing suspicious in this paragraph at all.";
        let (out, signals) = scrub_plain(text);
        assert_eq!(out, text);
        assert!(signals.rules_fired.is_empty());
        assert!(signals.removed_fragments.is_empty());
    }
}
