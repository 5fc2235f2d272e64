//! One-call turn processing: parse, validate, dispatch.

use tracing::{debug, info};

use crate::command::ParsedCommand;
use crate::context::WorkflowContext;
use crate::dispatcher::{AIResponse, ActionDispatcher, DispatchResult, HostCallbacks};
use crate::error::Result;
use crate::parser::IntentParser;

/// Spoken when no category matched the utterance.
pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't catch that. Say \"help\" for options.";

/// Parser and dispatcher wired together.
///
/// Build once and reuse; the engine holds compiled automata and patterns
/// but no per-session state.  The caller owns the [`WorkflowContext`] and
/// threads the returned one into the next turn.
#[derive(Debug)]
pub struct VoiceEngine {
    parser: IntentParser,
    dispatcher: ActionDispatcher,
}

impl VoiceEngine {
    pub fn new() -> Result<Self> {
        Ok(Self {
            parser: IntentParser::new()?,
            dispatcher: ActionDispatcher::new(),
        })
    }

    pub fn parser(&self) -> &IntentParser {
        &self.parser
    }

    pub fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// Parse `text` against `context`, with validation attached.
    pub fn parse(&self, text: &str, context: &WorkflowContext) -> Option<ParsedCommand> {
        self.parser
            .parse_command_with_state(text, &context.parser_state())
    }

    /// Handle one utterance end to end.
    pub fn process(
        &self,
        text: &str,
        context: &WorkflowContext,
        callbacks: &mut HostCallbacks,
    ) -> DispatchResult {
        let Some(command) = self.parse(text, context) else {
            debug!(text, "utterance not understood");
            return DispatchResult {
                response: AIResponse::info(NOT_UNDERSTOOD),
                context: context.clone(),
            };
        };

        info!(
            action = ?command.action,
            confidence = command.confidence,
            valid = command.is_valid(),
            "utterance parsed"
        );
        self.dispatcher
            .handle_with_state(&command, context, callbacks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::AppState;
    use crate::dispatcher::FeedbackType;

    #[test]
    fn gibberish_is_not_understood() {
        let engine = VoiceEngine::new().unwrap();
        let ctx = WorkflowContext::new();
        let result = engine.process("the weather is lovely", &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.text, NOT_UNDERSTOOD);
        assert_eq!(result.response.feedback_type, FeedbackType::Info);
        assert_eq!(result.context, ctx);
    }

    #[test]
    fn opening_print_from_dashboard() {
        let engine = VoiceEngine::new().unwrap();
        let ctx = WorkflowContext::new().with_total_documents(3);
        let result = engine.process("print", &ctx, &mut HostCallbacks::new());
        assert_eq!(result.context.app_state, AppState::PrintWorkflow);
        assert_eq!(result.response.feedback_type, FeedbackType::Success);
        assert_eq!(result.context.total_documents, 3);
    }
}
