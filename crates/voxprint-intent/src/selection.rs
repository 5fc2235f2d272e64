//! Document-selection grammar.
//!
//! Parses set expressions over the visible document list: single numbers,
//! lists, ranges, "first/last N", "every Nth", "from N onward" and
//! "all except ...".  Users speak 1-based numbers; every index produced here
//! is 0-based and inside `[0, total)`.  Out-of-range numbers are dropped,
//! never reported as errors.
//!
//! Stages run in a fixed order and the first structural match wins:
//!
//! | # | Stage | Confidence |
//! |---|-------|-----------|
//! | 1 | clear / reset / none | 0.95 |
//! | 2 | select vs. deselect keyword family (sets the kind) | -- |
//! | 3 | all / everything (with optional `except ...`) | 0.9 |
//! | 4 | every Nth document, optional `from X` and `to Y` | 0.9 |
//! | 5 | from N onward | 0.9 |
//! | 6 | first N / last N | 0.9 |
//! | 7 | explicit range | 0.9 |
//! | 8 | list of two or more numbers | 0.85 |
//! | 9 | any loose numbers | 0.8 |
//! | 10 | keywords only: operate on the focused document | 0.6 |

use std::collections::BTreeSet;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;
use voxprint_kernel::contains_phrase;
use voxprint_kernel::lexicon::{
    LAST_SENTINEL, MEDIUM_CONFIDENCE, SELECTION_ALL_WORDS, SELECTION_CLEAR_PHRASES,
    SELECTION_CLEAR_WORDS, SELECTION_DESELECT_WORDS, SELECTION_EXCEPT_WORDS,
    SELECTION_FILLER_WORDS, SELECTION_SELECT_WORDS, SELECTION_STEP_WORDS,
};

use crate::error::Result;
use crate::text::{normalize, parse_digits, parse_number_token, tokens};

const CLEAR_CONFIDENCE: f64 = 0.95;
const STRUCTURAL_CONFIDENCE: f64 = 0.9;
const LIST_CONFIDENCE: f64 = 0.85;
const LOOSE_NUMBERS_CONFIDENCE: f64 = 0.8;

/// Words joining the two ends of a range.
const RANGE_CONNECTORS: &[&str] = &["to", "through", "thru", "till", "until"];

/// Tokens allowed between the members of a list.
const LIST_SEPARATORS: &[&str] = &[",", "and", "&", "or", "plus"];

/// Tokens dropped before range and list scanning.
const NOISE_WORDS: &[&str] = &["the", "from", "#", "numbers", "number", "no"];

const EVERY_NTH_PATTERN: &str = r"\bevery\s+(?P<step>[a-z0-9#]+)\s+(?:documents?|files?|items?|pages?|ones?)\b(?:\s+(?:from|between|starting\s+(?:at|from))\s+(?:the\s+)?(?:(?:documents?|files?|number)\s+)?(?P<from>[a-z0-9#]+)(?:\s+(?:to|and|through|thru|till|until)\s+(?:(?:documents?|files?|number)\s+)?(?:the\s+)?(?P<to>[a-z0-9#]+))?)?";

const ONWARD_PATTERNS: &[&str] = &[
    r"\b(?:from|starting\s+(?:at|from|with))\s+(?:the\s+)?(?:(?:documents?|files?|items?|number|pages?)\s+)?(?P<n>[a-z0-9#]+)(?:\s+(?:documents?|files?|items?|ones?))?\s+(?:onwards?|on|forward|and\s+(?:up|above|after|beyond|later)|to\s+the\s+end)\b",
    r"\b(?P<n>[a-z0-9#]+)\s+(?:and\s+)?onwards?\b",
];

const FIRST_LAST_COUNT_PATTERN: &str = r"\b(?P<which>first|last|top|bottom)\s+(?P<n>\d+|one|two|three|four|five|six|seven|eight|nine|ten)\b";

const FIRST_LAST_SINGLE_PATTERN: &str =
    r"\b(?P<which>first|last)\s+(?:documents?|files?|items?|ones?|pages?)\b";

const DASH_RANGE_PATTERN: &str = r"\b(?P<from>\d+)\s*[-\u{2013}]\s*(?P<to>\d+)\b";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What a selection expression does to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    Select,
    Deselect,
    SelectAll,
    Clear,
    /// Flip membership.  With no indices it means "the focused document",
    /// which the host tracks.
    Toggle,
}

/// A parsed selection expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionCommand {
    pub kind: SelectionKind,
    /// 0-based, ascending, deduplicated, inside `[0, total)`.
    pub indices: Vec<usize>,
    /// Indices left out of a select-all.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<usize>,
    /// Whether the indices came from a contiguous range expression.
    pub is_range: bool,
    pub confidence: f64,
}

impl SelectionCommand {
    fn new(kind: SelectionKind, indices: Vec<usize>, confidence: f64) -> Self {
        Self {
            kind,
            indices,
            excluded: Vec::new(),
            is_range: false,
            confidence,
        }
    }

    fn ranged(mut self) -> Self {
        self.is_range = true;
        self
    }
}

// ---------------------------------------------------------------------------
// SelectionParser
// ---------------------------------------------------------------------------

/// Parser for selection expressions.  Build once, share read-only.
#[derive(Debug, Clone)]
pub struct SelectionParser {
    every_nth: Regex,
    onward: Vec<Regex>,
    first_last_count: Regex,
    first_last_single: Regex,
    dash_range: Regex,
}

impl SelectionParser {
    /// Compile the grammar's patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            every_nth: Regex::new(EVERY_NTH_PATTERN)?,
            onward: ONWARD_PATTERNS
                .iter()
                .map(|p| Regex::new(p))
                .collect::<std::result::Result<_, _>>()?,
            first_last_count: Regex::new(FIRST_LAST_COUNT_PATTERN)?,
            first_last_single: Regex::new(FIRST_LAST_SINGLE_PATTERN)?,
            dash_range: Regex::new(DASH_RANGE_PATTERN)?,
        })
    }

    /// Parse `text` against a list of `total` documents.
    ///
    /// Returns `None` when the utterance contains neither numbers nor any
    /// selection vocabulary.
    pub fn parse(&self, text: &str, total: usize) -> Option<SelectionCommand> {
        let lowered = normalize(text);
        if lowered.is_empty() {
            return None;
        }
        let toks = tokens(&lowered);
        let words: Vec<&str> = toks.iter().map(String::as_str).collect();

        // 1. Clear.
        if SELECTION_CLEAR_PHRASES
            .iter()
            .any(|p| contains_phrase(&lowered, p))
            || words.iter().any(|w| SELECTION_CLEAR_WORDS.contains(w))
        {
            debug!(stage = "clear", "selection parsed");
            return Some(SelectionCommand::new(
                SelectionKind::Clear,
                Vec::new(),
                CLEAR_CONFIDENCE,
            ));
        }

        // 2. Keyword family.
        let deselect = words.iter().any(|w| SELECTION_DESELECT_WORDS.contains(w));
        let select = words.iter().any(|w| SELECTION_SELECT_WORDS.contains(w));
        let kind = if deselect {
            SelectionKind::Deselect
        } else {
            SelectionKind::Select
        };

        let cleaned: Vec<&str> = words
            .iter()
            .copied()
            .filter(|w| !SELECTION_FILLER_WORDS.contains(w) && !NOISE_WORDS.contains(w))
            .collect();
        let range = self.find_range(&lowered, &cleaned);
        let onward = self.find_onward(&lowered);

        // 3. All / everything.
        if range.is_none()
            && onward.is_none()
            && let Some(pos) = words.iter().position(|w| SELECTION_ALL_WORDS.contains(w))
        {
            let counted = words
                .get(pos + 1)
                .is_some_and(|next| parse_number_token(next).is_some() || step_word(next).is_some());
            if !counted {
                return Some(select_all(kind, &words, total));
            }
        }

        // 4. Every Nth.
        if let Some(caps) = self.every_nth.captures(&lowered)
            && let Some(cmd) = every_nth(kind, &caps, total)
        {
            debug!(stage = "every_nth", indices = ?cmd.indices, "selection parsed");
            return Some(cmd);
        }

        // 5. From N onward.
        if let Some(start) = onward {
            let start = resolve_bound(start, total);
            let indices = span_indices(start, to_i64(total), total);
            debug!(stage = "onward", start, "selection parsed");
            return Some(SelectionCommand::new(kind, indices, STRUCTURAL_CONFIDENCE).ranged());
        }

        // 6. First N / last N.
        if range.is_none()
            && let Some(cmd) = self.first_last(kind, &lowered, total)
        {
            debug!(stage = "first_last", indices = ?cmd.indices, "selection parsed");
            return Some(cmd);
        }

        // 7. Explicit range.
        if let Some((from, to)) = range {
            let indices = span_indices(resolve_bound(from, total), resolve_bound(to, total), total);
            debug!(stage = "range", from, to, "selection parsed");
            return Some(SelectionCommand::new(kind, indices, STRUCTURAL_CONFIDENCE).ranged());
        }

        // 8. List.
        if let Some(list) = number_list(&cleaned) {
            let indices: BTreeSet<usize> = list
                .into_iter()
                .filter_map(|n| to_index(resolve_bound(n, total), total))
                .collect();
            debug!(stage = "list", indices = ?indices, "selection parsed");
            return Some(SelectionCommand::new(
                kind,
                indices.into_iter().collect(),
                LIST_CONFIDENCE,
            ));
        }

        // 9. Loose numbers.
        let loose: Vec<i64> = cleaned
            .iter()
            .filter_map(|w| parse_number_token(w))
            .filter(|n| *n != LAST_SENTINEL)
            .collect();
        if !loose.is_empty() {
            let indices: BTreeSet<usize> =
                loose.into_iter().filter_map(|n| to_index(n, total)).collect();
            debug!(stage = "loose_numbers", indices = ?indices, "selection parsed");
            return Some(SelectionCommand::new(
                kind,
                indices.into_iter().collect(),
                LOOSE_NUMBERS_CONFIDENCE,
            ));
        }

        // 10. Keywords only: act on the focused document.
        if deselect {
            return Some(SelectionCommand::new(
                SelectionKind::Deselect,
                Vec::new(),
                MEDIUM_CONFIDENCE,
            ));
        }
        if select {
            return Some(SelectionCommand::new(
                SelectionKind::Toggle,
                Vec::new(),
                MEDIUM_CONFIDENCE,
            ));
        }
        None
    }

    fn find_onward(&self, lowered: &str) -> Option<i64> {
        self.onward.iter().find_map(|re| {
            let caps = re.captures(lowered)?;
            let n = parse_number_token(caps.name("n")?.as_str())?;
            (n >= 1 || n == LAST_SENTINEL).then_some(n)
        })
    }

    /// Raw 1-based range bounds (`last` still as the sentinel).
    fn find_range(&self, lowered: &str, cleaned: &[&str]) -> Option<(i64, i64)> {
        if let Some(caps) = self.dash_range.captures(lowered) {
            let from = parse_digits(caps.name("from")?.as_str());
            let to = parse_digits(caps.name("to")?.as_str());
            return Some((from, to));
        }
        cleaned.iter().enumerate().find_map(|(i, word)| {
            if *word == "between" && cleaned.get(i + 2) == Some(&"and") {
                let from = parse_number_token(cleaned.get(i + 1)?)?;
                let to = parse_number_token(cleaned.get(i + 3)?)?;
                return Some((from, to));
            }
            if RANGE_CONNECTORS.contains(cleaned.get(i + 1)?) {
                let from = parse_number_token(word)?;
                let to = parse_number_token(cleaned.get(i + 2)?)?;
                return Some((from, to));
            }
            None
        })
    }

    fn first_last(&self, kind: SelectionKind, lowered: &str, total: usize) -> Option<SelectionCommand> {
        if let Some(caps) = self.first_last_count.captures(lowered) {
            let n = parse_number_token(caps.name("n")?.as_str())?;
            let count = usize::try_from(n).ok()?.min(total);
            let indices: Vec<usize> = match caps.name("which")?.as_str() {
                "first" | "top" => (0..count).collect(),
                _ => (total - count..total).collect(),
            };
            return Some(SelectionCommand::new(kind, indices, STRUCTURAL_CONFIDENCE).ranged());
        }
        let caps = self.first_last_single.captures(lowered)?;
        let indices = match (caps.name("which")?.as_str(), total) {
            (_, 0) => Vec::new(),
            ("first", _) => vec![0],
            _ => vec![total - 1],
        };
        Some(SelectionCommand::new(kind, indices, STRUCTURAL_CONFIDENCE))
    }
}

// ---------------------------------------------------------------------------
// Stage helpers
// ---------------------------------------------------------------------------

fn select_all(kind: SelectionKind, words: &[&str], total: usize) -> SelectionCommand {
    if kind == SelectionKind::Deselect {
        debug!(stage = "all", "deselect all parsed as clear");
        return SelectionCommand::new(SelectionKind::Clear, Vec::new(), STRUCTURAL_CONFIDENCE);
    }
    let excluded: BTreeSet<usize> = except_tail(words)
        .iter()
        .filter_map(|w| parse_number_token(w))
        .filter_map(|n| to_index(resolve_bound(n, total), total))
        .collect();
    let indices = (0..total).filter(|i| !excluded.contains(i)).collect();
    debug!(stage = "all", excluded = ?excluded, "selection parsed");
    SelectionCommand {
        kind: SelectionKind::SelectAll,
        indices,
        excluded: excluded.into_iter().collect(),
        is_range: false,
        confidence: STRUCTURAL_CONFIDENCE,
    }
}

/// The words following the first `except`-style marker.
fn except_tail<'a>(words: &'a [&'a str]) -> &'a [&'a str] {
    for (i, _) in words.iter().enumerate() {
        for marker in SELECTION_EXCEPT_WORDS {
            let parts: Vec<&str> = marker.split_whitespace().collect();
            let end = i + parts.len();
            if end <= words.len() && words[i..end] == parts[..] {
                return &words[end..];
            }
        }
    }
    &[]
}

fn every_nth(kind: SelectionKind, caps: &Captures<'_>, total: usize) -> Option<SelectionCommand> {
    let raw_step = caps.name("step")?.as_str();
    let step = step_word(raw_step).or_else(|| parse_number_token(raw_step))?;
    let step = usize::try_from(step).ok().filter(|s| *s >= 1)?;

    let from = caps
        .name("from")
        .and_then(|m| parse_number_token(m.as_str()))
        .map_or(1, |n| resolve_bound(n, total));
    let to = caps
        .name("to")
        .and_then(|m| parse_number_token(m.as_str()))
        .map_or(to_i64(total), |n| resolve_bound(n, total));

    let indices = span_indices(from, to, total).into_iter().step_by(step).collect();
    Some(SelectionCommand::new(kind, indices, STRUCTURAL_CONFIDENCE))
}

fn step_word(word: &str) -> Option<i64> {
    SELECTION_STEP_WORDS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, n)| *n)
}

/// The first run of two or more numbers joined by separators or adjacency.
fn number_list(cleaned: &[&str]) -> Option<Vec<i64>> {
    let mut run: Vec<i64> = Vec::new();
    for word in cleaned {
        if let Some(n) = parse_number_token(word) {
            run.push(n);
        } else if LIST_SEPARATORS.contains(word) {
            continue;
        } else if run.len() >= 2 {
            return Some(run);
        } else {
            run.clear();
        }
    }
    (run.len() >= 2).then_some(run)
}

// ---------------------------------------------------------------------------
// Index arithmetic
// ---------------------------------------------------------------------------

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Map the `last` sentinel to the 1-based number of the final document.
fn resolve_bound(n: i64, total: usize) -> i64 {
    if n == LAST_SENTINEL { to_i64(total) } else { n }
}

/// 1-based spoken number to 0-based index, if it names a document.
fn to_index(n: i64, total: usize) -> Option<usize> {
    let n = usize::try_from(n).ok()?;
    (1..=total).contains(&n).then(|| n - 1)
}

/// Inclusive 1-based span to 0-based indices, clamped into `[0, total)`.
/// Reversed bounds are swapped.
fn span_indices(from: i64, to: i64, total: usize) -> Vec<usize> {
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    let lo = lo.max(1);
    let hi = hi.min(to_i64(total));
    if lo > hi {
        return Vec::new();
    }
    (lo..=hi).filter_map(|n| to_index(n, total)).collect()
}

// ---------------------------------------------------------------------------
// Applying a selection
// ---------------------------------------------------------------------------

/// Apply `command` to `current`, returning the new selection.
///
/// Indices at or past `total` never enter the result.
pub fn apply_selection(
    current: &BTreeSet<usize>,
    command: &SelectionCommand,
    total: usize,
) -> BTreeSet<usize> {
    let in_range = |i: &usize| *i < total;
    match command.kind {
        SelectionKind::Select => current
            .iter()
            .chain(command.indices.iter())
            .copied()
            .filter(in_range)
            .collect(),
        SelectionKind::Deselect => current
            .iter()
            .copied()
            .filter(|i| !command.indices.contains(i))
            .collect(),
        SelectionKind::SelectAll => (0..total)
            .filter(|i| !command.excluded.contains(i))
            .collect(),
        SelectionKind::Clear => BTreeSet::new(),
        SelectionKind::Toggle => {
            let mut next = current.clone();
            for index in command.indices.iter().copied().filter(in_range) {
                if !next.remove(&index) {
                    next.insert(index);
                }
            }
            next
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
