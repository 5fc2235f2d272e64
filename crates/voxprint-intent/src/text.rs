//! Utterance normalization and number extraction.

use voxprint_kernel::contains_phrase;
use voxprint_kernel::lexicon::{POLITENESS_MARKERS, WORD_NUMBERS};

/// Lowercase, trim and collapse runs of whitespace.
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split normalized text into word tokens.
///
/// Commas become their own `","` token so list parsing can see separators.
/// Other surrounding punctuation is trimmed; `-` inside a token is kept.
pub fn tokens(text: &str) -> Vec<String> {
    let spaced = text.replace(',', " , ");
    spaced
        .split_whitespace()
        .filter_map(|raw| {
            if raw == "," {
                return Some(",".to_string());
            }
            let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '#' && c != '&');
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect()
}

/// Parse one token as a spoken number.
///
/// Accepts digits (`3`, `#3`, `3rd`) and the word-number table, including
/// the `last` sentinel.
pub fn parse_number_token(token: &str) -> Option<i64> {
    let token = token.trim_start_matches('#');
    if let Some((_, n)) = WORD_NUMBERS.iter().find(|(word, _)| *word == token) {
        return Some(*n);
    }
    let digits: String = token.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let suffix = &token[digits.len()..];
    if !matches!(suffix, "" | "st" | "nd" | "rd" | "th") {
        return None;
    }
    Some(parse_digits(&digits))
}

/// Value of a non-empty ASCII digit run.  Runs too long for `i64`
/// saturate, so they read as out of range rather than as no number.
pub fn parse_digits(digits: &str) -> i64 {
    digits.parse().unwrap_or(i64::MAX)
}

/// The first number mentioned in `text`.
///
/// Word numbers are tried first in table order, then the first run of
/// digits.  `last` yields [`LAST_SENTINEL`](voxprint_kernel::lexicon::LAST_SENTINEL).
pub fn extract_number(text: &str) -> Option<i64> {
    let lowered = text.to_lowercase();
    if let Some((_, n)) = WORD_NUMBERS
        .iter()
        .find(|(word, _)| contains_phrase(&lowered, word))
    {
        return Some(*n);
    }
    first_digit_run(&lowered)
}

fn first_digit_run(text: &str) -> Option<i64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let run: String = text[start..].chars().take_while(char::is_ascii_digit).collect();
    Some(parse_digits(&run))
}

/// The politeness markers present in `lowered`, in table order.
pub fn politeness_markers(lowered: &str) -> Vec<&'static str> {
    POLITENESS_MARKERS
        .iter()
        .copied()
        .filter(|marker| contains_phrase(lowered, marker))
        .collect()
}

/// Whether the utterance carries one of the politeness markers that
/// unlock a switch between running workflows.
pub fn has_politeness_marker(lowered: &str) -> bool {
    !politeness_markers(lowered).is_empty()
}

/// Whether the whole utterance is exactly one of `phrases`, ignoring
/// trailing punctuation and a leading "please".
pub fn is_exact_phrase(lowered: &str, phrases: &[&str]) -> bool {
    let core = lowered
        .trim_end_matches(|c: char| c.is_ascii_punctuation() && c != '\'')
        .trim();
    let core = core.strip_prefix("please ").unwrap_or(core);
    let core = core.strip_suffix(" please").unwrap_or(core);
    phrases.iter().any(|p| *p == core)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize("  Select   Document\tTwo "), "select document two");
    }

    #[test]
    fn tokens_split_commas() {
        assert_eq!(
            tokens("documents 1, 2, and 3."),
            vec!["documents", "1", ",", "2", ",", "and", "3"]
        );
    }

    #[test]
    fn number_tokens() {
        assert_eq!(parse_number_token("3"), Some(3));
        assert_eq!(parse_number_token("#4"), Some(4));
        assert_eq!(parse_number_token("2nd"), Some(2));
        assert_eq!(parse_number_token("third"), Some(3));
        assert_eq!(parse_number_token("last"), Some(-1));
        assert_eq!(parse_number_token("3x"), None);
        assert_eq!(parse_number_token("word"), None);
    }

    #[test]
    fn extract_prefers_word_numbers() {
        assert_eq!(extract_number("select document three"), Some(3));
        assert_eq!(extract_number("select document 12"), Some(12));
        assert_eq!(extract_number("select the last document"), Some(-1));
        assert_eq!(extract_number("select a document"), None);
    }

    #[test]
    fn word_numbers_need_word_boundaries() {
        // "someone" contains "one" but is not a number.
        assert_eq!(extract_number("someone said 4"), Some(4));
    }

    #[test]
    fn politeness_marker_detection() {
        assert!(has_politeness_marker("sorry, scan instead"));
        assert!(has_politeness_marker("excuse me, print"));
        assert!(!has_politeness_marker("scan please"));
        assert_eq!(politeness_markers("sorry, pardon me"), vec!["sorry", "pardon"]);
    }

    #[test]
    fn exact_phrases() {
        assert!(is_exact_phrase("yes.", &["yes", "ok"]));
        assert!(is_exact_phrase("please confirm", &["confirm"]));
        assert!(!is_exact_phrase("yes but change the layout", &["yes"]));
    }

    #[test]
    fn overlong_digit_runs_saturate() {
        assert_eq!(parse_number_token("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_number_token("99999999999999999999th"), Some(i64::MAX));
        assert_eq!(extract_number("copies 99999999999999999999"), Some(i64::MAX));
    }
}
