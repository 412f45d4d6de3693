//! Splitting oversized text into bounded atomic fragments.
//!
//! Colon-chain boundaries (`": "` followed by a capital) are tried first,
//! since they mark structured enumerations; anything still over the bound is
//! packed greedily along sentence boundaries. Deterministic and
//! order-preserving.

use std::sync::LazyLock;

use regex::Regex;

/// Hard cap on any unit's text.
pub const UNIT_HARD_CAP: usize = 800;
/// Target cap for definitions, FAQ answers and claims.
pub const UNIT_TARGET_CAP: usize = 350;
/// Fragments below this are discarded as noise.
pub const MIN_FRAGMENT_CHARS: usize = 50;

static COLON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r":\s+").unwrap());
static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]\s+").unwrap());

/// Split `text` into fragments of at most `max_chars` characters.
///
/// Text already within the bound is returned unchanged as a single fragment.
pub fn atomize(text: &str, max_chars: usize) -> Vec<String> {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let pieces = split_colon_chains(text);
    let pieces = if pieces.is_empty() {
        vec![text.to_string()]
    } else {
        pieces
    };

    let mut fragments = Vec::new();
    for piece in pieces {
        if piece.chars().count() > max_chars {
            fragments.extend(pack_sentences(&piece, max_chars));
        } else {
            fragments.push(piece);
        }
    }

    fragments
        .into_iter()
        .flat_map(|f| hard_wrap(&f, max_chars))
        .map(|f| f.trim().to_string())
        .filter(|f| f.chars().count() >= MIN_FRAGMENT_CHARS)
        .collect()
}

/// Sentence boundaries: `.`, `!`, `?` followed by whitespace.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for m in SENTENCE_END_RE.find_iter(text) {
        let cut = m.start() + 1; // keep the punctuation with its sentence
        out.push(text[start..cut].trim());
        start = m.end();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        out.push(tail);
    }
    out
}

/// Split on `": "` boundaries followed by a capital letter. Returns an empty
/// vec when no such boundary exists.
fn split_colon_chains(text: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    for m in COLON_RE.find_iter(text) {
        let next_is_capital = text[m.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_uppercase());
        if next_is_capital && m.start() > start {
            parts.push(format!("{}:", text[start..m.start()].trim()));
            start = m.end();
        }
    }
    if parts.is_empty() {
        return Vec::new();
    }
    let tail = text[start..].trim();
    if !tail.is_empty() {
        parts.push(tail.to_string());
    }
    parts
}

/// Greedily pack sentences into fragments of at most `max_chars` characters.
fn pack_sentences(text: &str, max_chars: usize) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    for sentence in split_sentences(text) {
        let would_be = if current.is_empty() {
            sentence.chars().count()
        } else {
            current.chars().count() + 1 + sentence.chars().count()
        };
        if would_be > max_chars && !current.is_empty() {
            fragments.push(std::mem::take(&mut current));
            current = sentence.to_string();
        } else if current.is_empty() {
            current = sentence.to_string();
        } else {
            current.push(' ');
            current.push_str(sentence);
        }
    }
    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}

/// Last resort for a single sentence with no usable boundary: fixed-width
/// windows on char boundaries, so the hard cap always holds.
fn hard_wrap(text: &str, max_chars: usize) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max_chars)
        .map(|w| w.iter().collect::<String>())
        .collect()
}
