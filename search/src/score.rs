//! Fuzzy scoring of one candidate against a search pattern.
//!
//! A candidate is scored field by field (name, category, then synonyms),
//! and each field consumes part of the pattern. Within a field the first
//! strategy that applies wins:
//!
//! 1. the remaining pattern is a substring of the field,
//! 2. pattern tokens are prefixes of field tokens, in order,
//! 3. the pattern spells the initials of the field's words.

use crate::candidate::Candidate;

const EXACT_SCORE: f32 = 100.0;
const TOKEN_SCORE: f32 = 60.0;
const ACRONYM_SCORE: f32 = 80.0;

const NAME_WEIGHT: f32 = 1.0;
const CATEGORY_WEIGHT: f32 = 0.5;
const SYNONYM_WEIGHT: f32 = 0.75;

/// Splits on spaces, pipes, underscores, dots and camel humps, and
/// lowercases each token.
///
/// `HTTPServer_config` becomes `["http", "server", "config"]`.
pub fn tokenize(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if matches!(c, ' ' | '|' | '_' | '.') {
            if !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                tokens.push(std::mem::take(&mut current));
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// A tokenized search string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    tokens: Vec<String>,
}

impl Pattern {
    pub fn new(text: &str) -> Self {
        Self {
            tokens: tokenize(text),
        }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Result of scoring one field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMatch {
    pub score: f32,
    /// Number of pattern tokens the field used up.
    pub consumed: usize,
}

/// Scores `text` against the pattern tokens still unmatched.
pub fn score_field(text: &str, remaining: &[String]) -> Option<FieldMatch> {
    if remaining.is_empty() {
        return None;
    }
    let source = tokenize(text);
    if source.is_empty() {
        return None;
    }

    let normalized = source.join(" ");
    let needle = remaining.join(" ");
    if normalized.contains(&needle) {
        let coverage = needle.chars().count() as f32 / normalized.chars().count() as f32;
        return Some(FieldMatch {
            score: EXACT_SCORE * (0.5 + 0.5 * coverage),
            consumed: remaining.len(),
        });
    }

    if let Some(found) = token_prefix_match(&source, remaining) {
        return Some(found);
    }

    let compact: String = remaining.concat();
    let initials: String = source.iter().filter_map(|t| t.chars().next()).collect();
    if compact.chars().count() >= 2 && initials.starts_with(&compact) {
        return Some(FieldMatch {
            score: ACRONYM_SCORE,
            consumed: remaining.len(),
        });
    }
    None
}

fn token_prefix_match(source: &[String], remaining: &[String]) -> Option<FieldMatch> {
    let mut used = vec![false; source.len()];
    let mut ratio_sum = 0.0;
    let mut consumed = 0;

    for pattern_token in remaining {
        let hit = source
            .iter()
            .enumerate()
            .find(|(i, token)| !used[*i] && token.starts_with(pattern_token.as_str()));
        let Some((i, token)) = hit else {
            break;
        };
        used[i] = true;
        ratio_sum += pattern_token.chars().count() as f32 / token.chars().count() as f32;
        consumed += 1;
    }

    (consumed > 0).then(|| FieldMatch {
        score: TOKEN_SCORE * ratio_sum / source.len() as f32,
        consumed,
    })
}

/// Total score of a candidate; zero means no match.
///
/// Fields are visited until the pattern is used up. A pattern left
/// partially unmatched scales the score by the fraction that matched.
pub fn score_candidate(candidate: &Candidate, pattern: &Pattern) -> f32 {
    let tokens = pattern.tokens();
    if tokens.is_empty() {
        return 0.0;
    }

    let fields = [
        (candidate.name.as_str(), NAME_WEIGHT),
        (candidate.category.as_str(), CATEGORY_WEIGHT),
    ]
    .into_iter()
    .chain(candidate.synonyms.iter().map(|s| (s.as_str(), SYNONYM_WEIGHT)));

    let mut offset = 0;
    let mut total = 0.0;
    for (text, weight) in fields {
        if offset == tokens.len() {
            break;
        }
        if let Some(found) = score_field(text, &tokens[offset..]) {
            total += found.score * weight;
            offset += found.consumed;
        }
    }
    total * offset as f32 / tokens.len() as f32
}
