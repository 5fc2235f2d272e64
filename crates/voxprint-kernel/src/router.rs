//! Keyword-group router.
//!
//! The router scores an utterance against named groups of phrases and
//! returns the groups that matched, best first.  Two matching techniques
//! feed the same score:
//!
//! | Technique | Engine | Counts as |
//! |-----------|--------|-----------|
//! | Phrase match on word boundaries | [`aho_corasick`] (all phrases in one automaton) | one hit per distinct phrase |
//! | Pattern match with named captures | compiled [`regex`] | two hits |
//!
//! A group's confidence is
//! `0.6 * min(1, matched_chars / input_chars) + 0.4 * min(1, hits / 2)`,
//! so short utterances made entirely of a group's phrases score highest.
//!
//! # Example
//!
//! ```rust
//! # use voxprint_kernel::router::KeywordRouter;
//! let mut router = KeywordRouter::new();
//! router.add_group("cancel", &["cancel", "stop", "never mind"]).unwrap();
//! router.add_group("help", &["help", "what can i say"]).unwrap();
//!
//! let best = router.route("cancel").unwrap();
//! assert_eq!(best.group, "cancel");
//! assert!(best.confidence > 0.75);
//! ```

use std::collections::HashMap;
use std::fmt::Debug;

use aho_corasick::AhoCorasick;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{KernelError, Result};
use crate::lexicon::{COVERAGE_WEIGHT, MATCH_COUNT_SATURATION, MATCH_COUNT_WEIGHT};

/// Hits credited to a regex pattern match.
const PATTERN_HITS: usize = 2;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One group that matched an utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMatch<G> {
    /// The group the matched phrases belong to.
    pub group: G,
    /// Keyword score in `[0, 1]`.
    pub confidence: f64,
    /// The phrases (or pattern texts) that contributed to the score.
    pub matched: Vec<String>,
    /// Named captures from the first matching pattern of this group.
    pub captures: HashMap<String, String>,
}

/// A regex-based route with named captures.
#[derive(Debug, Clone)]
struct PatternRoute {
    /// Index into the router's group table.
    slot: usize,
    compiled: Regex,
}

/// A matched span inside the lowered input.
#[derive(Debug, Clone)]
struct Span {
    start: usize,
    end: usize,
    text: String,
    hits: usize,
}

// ---------------------------------------------------------------------------
// KeywordRouter
// ---------------------------------------------------------------------------

/// Scores utterances against keyword groups.
///
/// The automaton is rebuilt on every registration, so routers are meant to
/// be assembled once at startup and then shared read-only.
#[derive(Debug)]
pub struct KeywordRouter<G> {
    /// Group labels in registration order.  Ties are broken by this order.
    groups: Vec<G>,

    /// Lowercased phrases and the group slot they belong to.
    phrases: Vec<(String, usize)>,

    /// Automaton over every phrase in `phrases`.
    automaton: Option<AhoCorasick>,

    /// Regex routes, evaluated in registration order.
    patterns: Vec<PatternRoute>,
}

impl<G> KeywordRouter<G>
where
    G: Copy + PartialEq + Debug,
{
    /// Create an empty router with no groups registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: Vec::new(),
            phrases: Vec::new(),
            automaton: None,
            patterns: Vec::new(),
        }
    }

    /// Build a router from a table of groups in one call.
    pub fn from_groups(groups: &[(G, &[&str])]) -> Result<Self> {
        let mut router = Self::new();
        for (group, phrases) in groups {
            router.add_group(*group, phrases)?;
        }
        Ok(router)
    }

    /// Register phrases under `group`.
    ///
    /// Registering the same group twice extends its phrase list.  Matching is
    /// case-insensitive.
    pub fn add_group(&mut self, group: G, phrases: &[&str]) -> Result<()> {
        if phrases.is_empty() {
            return Err(KernelError::EmptyKeywordGroup {
                group: format!("{group:?}"),
            });
        }

        let slot = self.slot_for(group);
        for phrase in phrases {
            self.phrases.push((phrase.trim().to_lowercase(), slot));
        }
        tracing::trace!(group = ?group, count = phrases.len(), "keyword group added");

        self.rebuild_automaton()
    }

    /// Register a regex pattern under `group`.
    ///
    /// Patterns are matched against the lowercased input and may contain
    /// named captures, which are returned in [`RouteMatch::captures`].
    pub fn add_pattern(&mut self, pattern: &str, group: G) -> Result<()> {
        let compiled = Regex::new(pattern).map_err(|e| KernelError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        let slot = self.slot_for(group);
        tracing::trace!(pattern = %pattern, group = ?group, "pattern route added");
        self.patterns.push(PatternRoute { slot, compiled });
        Ok(())
    }

    /// Return the best-scoring group for `text`, if any phrase matched.
    pub fn route(&self, text: &str) -> Option<RouteMatch<G>> {
        self.route_all(text).into_iter().next()
    }

    /// Return every matching group, highest confidence first.
    pub fn route_all(&self, text: &str) -> Vec<RouteMatch<G>> {
        let lowered = text.trim().to_lowercase();
        let input_chars = lowered.chars().count();
        if input_chars == 0 {
            return Vec::new();
        }

        let mut spans: Vec<Vec<Span>> = vec![Vec::new(); self.groups.len()];
        let mut captures: Vec<Option<HashMap<String, String>>> = vec![None; self.groups.len()];

        if let Some(ac) = &self.automaton {
            for mat in ac.find_overlapping_iter(&lowered) {
                if !is_word_bounded(&lowered, mat.start(), mat.end()) {
                    continue;
                }
                let (phrase, slot) = &self.phrases[mat.pattern().as_usize()];
                spans[*slot].push(Span {
                    start: mat.start(),
                    end: mat.end(),
                    text: phrase.clone(),
                    hits: 1,
                });
            }
        }

        for route in &self.patterns {
            let Some(caps) = route.compiled.captures(&lowered) else {
                continue;
            };
            let Some(whole) = caps.get(0) else {
                continue;
            };
            spans[route.slot].push(Span {
                start: whole.start(),
                end: whole.end(),
                text: whole.as_str().to_string(),
                hits: PATTERN_HITS,
            });
            if captures[route.slot].is_none() {
                let named: HashMap<String, String> = route
                    .compiled
                    .capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_string(), m.as_str().to_string()))
                    })
                    .collect();
                captures[route.slot] = Some(named);
            }
        }

        let mut results: Vec<RouteMatch<G>> = Vec::new();
        for (slot, group_spans) in spans.into_iter().enumerate() {
            if group_spans.is_empty() {
                continue;
            }
            let kept = collapse_contained(group_spans);
            let matched_chars: usize = kept
                .iter()
                .map(|s| lowered[s.start..s.end].chars().count())
                .sum();
            let hits: usize = kept.iter().map(|s| s.hits).sum();

            results.push(RouteMatch {
                group: self.groups[slot],
                confidence: keyword_confidence(matched_chars, input_chars, hits),
                matched: kept.into_iter().map(|s| s.text).collect(),
                captures: captures[slot].take().unwrap_or_default(),
            });
        }

        // Stable sort keeps registration order for equal scores.
        results.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

        if let Some(best) = results.first() {
            tracing::trace!(
                group = ?best.group,
                confidence = best.confidence,
                candidates = results.len(),
                "keyword route"
            );
        }
        results
    }

    /// Return the number of registered phrases.
    pub fn phrase_count(&self) -> usize {
        self.phrases.len()
    }

    /// Return the number of registered pattern routes.
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    // -- Private helpers ----------------------------------------------------

    fn slot_for(&mut self, group: G) -> usize {
        if let Some(slot) = self.groups.iter().position(|g| *g == group) {
            return slot;
        }
        self.groups.push(group);
        self.groups.len() - 1
    }

    fn rebuild_automaton(&mut self) -> Result<()> {
        let phrases: Vec<&str> = self.phrases.iter().map(|(p, _)| p.as_str()).collect();
        let ac = AhoCorasick::new(&phrases).map_err(|e| KernelError::RouterBuildError {
            reason: e.to_string(),
        })?;
        self.automaton = Some(ac);
        Ok(())
    }
}

impl<G> Default for KeywordRouter<G>
where
    G: Copy + PartialEq + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Scoring helpers
// ---------------------------------------------------------------------------

/// Keyword-group confidence.
///
/// `0.6 * min(1, matched_chars / input_chars) + 0.4 * min(1, hits / 2)`.
/// Returns `0.0` for empty input.
pub fn keyword_confidence(matched_chars: usize, input_chars: usize, hits: usize) -> f64 {
    if input_chars == 0 {
        return 0.0;
    }
    let coverage = (matched_chars as f64 / input_chars as f64).min(1.0);
    let count = (hits as f64 / MATCH_COUNT_SATURATION).min(1.0);
    (COVERAGE_WEIGHT * coverage + MATCH_COUNT_WEIGHT * count).clamp(0.0, 1.0)
}

/// Whether `phrase` occurs in `haystack` delimited by word boundaries.
///
/// Both arguments are expected to be lowercase already.
pub fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    haystack
        .match_indices(phrase)
        .any(|(start, m)| is_word_bounded(haystack, start, start + m.len()))
}

/// The first phrase of `phrases` found in `haystack`, in table order.
pub fn first_phrase<'a>(haystack: &str, phrases: &[&'a str]) -> Option<&'a str> {
    phrases.iter().copied().find(|p| contains_phrase(haystack, p))
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
}

/// Drop spans fully contained in a longer kept span.
fn collapse_contained(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| {
        (b.end - b.start)
            .cmp(&(a.end - a.start))
            .then(a.start.cmp(&b.start))
    });
    let mut kept: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        let covered = kept
            .iter()
            .any(|k| k.start <= span.start && span.end <= k.end);
        if !covered {
            kept.push(span);
        }
    }
    kept.sort_by_key(|s| s.start);
    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cmd {
        Cancel,
        Help,
        NextStep,
        NextDocument,
        Copies,
    }

    fn router() -> KeywordRouter<Cmd> {
        KeywordRouter::from_groups(&[
            (Cmd::Cancel, &["cancel", "stop", "never mind"]),
            (Cmd::Help, &["help", "what can i say"]),
            (Cmd::NextStep, &["next", "next step", "continue"]),
            (Cmd::NextDocument, &["next document", "next file"]),
        ])
        .expect("valid router")
    }

    #[test]
    fn single_word_utterance_scores_high() {
        let best = router().route("Cancel").unwrap();
        assert_eq!(best.group, Cmd::Cancel);
        // Full coverage, one hit: 0.6 + 0.2.
        assert!((best.confidence - 0.8).abs() < 1e-9);
    }

    #[test]
    fn matches_respect_word_boundaries() {
        let r = router();
        assert!(r.route("helpful advice").is_none());
        assert!(r.route("nonstop").is_none());
        assert_eq!(r.route("please help").unwrap().group, Cmd::Help);
    }

    #[test]
    fn longer_phrase_wins_over_contained_phrase() {
        let results = router().route_all("next document");
        assert_eq!(results[0].group, Cmd::NextDocument);
        let next_step = results.iter().find(|m| m.group == Cmd::NextStep).unwrap();
        assert!(next_step.confidence < results[0].confidence);
    }

    #[test]
    fn contained_phrases_are_counted_once() {
        let best = router().route("next step").unwrap();
        assert_eq!(best.group, Cmd::NextStep);
        assert_eq!(best.matched, vec!["next step".to_string()]);
    }

    #[test]
    fn two_hits_saturate_count_term() {
        let best = router().route("stop, never mind").unwrap();
        assert_eq!(best.group, Cmd::Cancel);
        assert!(best.confidence > 0.9);
        assert!(best.confidence <= 1.0);
    }

    #[test]
    fn pattern_match_with_captures() {
        let mut r = router();
        r.add_pattern(r"(?P<count>\d+)\s+cop(?:y|ies)", Cmd::Copies)
            .expect("valid pattern");

        let best = r.route("make 3 copies").unwrap();
        assert_eq!(best.group, Cmd::Copies);
        assert_eq!(best.captures.get("count").map(String::as_str), Some("3"));
    }

    #[test]
    fn invalid_regex_is_rejected() {
        let mut r = router();
        let result = r.add_pattern("[invalid(", Cmd::Copies);
        assert!(matches!(result, Err(KernelError::InvalidPattern { .. })));
    }

    #[test]
    fn empty_group_is_rejected() {
        let mut r: KeywordRouter<Cmd> = KeywordRouter::new();
        assert!(matches!(
            r.add_group(Cmd::Help, &[]),
            Err(KernelError::EmptyKeywordGroup { .. })
        ));
    }

    #[test]
    fn empty_input_matches_nothing() {
        assert!(router().route("   ").is_none());
    }

    #[test]
    fn groups_extend_at_runtime() {
        let mut r = router();
        let before = r.phrase_count();
        r.add_group(Cmd::Help, &["assist me"]).unwrap();
        assert_eq!(r.phrase_count(), before + 1);
        assert_eq!(r.route("assist me").unwrap().group, Cmd::Help);
    }

    #[test]
    fn confidence_formula() {
        assert_eq!(keyword_confidence(0, 0, 0), 0.0);
        assert!((keyword_confidence(5, 10, 1) - 0.5).abs() < 1e-9);
        assert!((keyword_confidence(20, 10, 4) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn contains_phrase_is_boundary_aware() {
        assert!(contains_phrase("i'm sorry, scan", "sorry"));
        assert!(!contains_phrase("sorryful", "sorry"));
        assert!(contains_phrase("excuse me please", "excuse me"));
        assert_eq!(first_phrase("two sided please", &["one sided", "two sided"]), Some("two sided"));
    }
}
