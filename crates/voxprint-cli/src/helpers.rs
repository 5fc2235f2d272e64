//! Shared helper functions used across CLI subcommands.

use tracing_subscriber::EnvFilter;
use voxprint_intent::{AIResponse, FeedbackType};

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

pub fn feedback_tag(feedback: FeedbackType) -> &'static str {
    match feedback {
        FeedbackType::Success => "ok",
        FeedbackType::Info => "info",
        FeedbackType::Warning => "warn",
        FeedbackType::Error => "error",
    }
}

/// One display line for a response.  Spoken responses carry `speak_prefix`.
pub fn format_response(response: &AIResponse, speak_prefix: &str) -> String {
    let tag = feedback_tag(response.feedback_type);
    if response.should_speak && !speak_prefix.is_empty() {
        format!("{speak_prefix} [{tag}] {}", response.text)
    } else {
        format!("[{tag}] {}", response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spoken_responses_get_the_prefix() {
        let response = AIResponse::success("Selected document 2.");
        assert_eq!(format_response(&response, ">>"), ">> [ok] Selected document 2.");
        assert_eq!(format_response(&response, ""), "[ok] Selected document 2.");
    }
}
