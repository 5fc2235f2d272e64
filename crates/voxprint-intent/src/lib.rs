//! Command interpretation engine for voxprint.
//!
//! This crate provides:
//!
//! - **Intent parsing**: priority-ordered category stages that turn an
//!   utterance into a confidence-scored [`command::ParsedCommand`] via
//!   [`parser::IntentParser`].
//! - **Document selection**: ranges, lists, "all except", "every other",
//!   "first/last N" and onward expressions via
//!   [`selection::SelectionParser`].
//! - **Workflow state machine**: the dashboard / print / scan step graph,
//!   the politeness-gated mode switch and per-state command validation in
//!   [`workflow`].
//! - **Action dispatch**: side effects through [`dispatcher::HostCallbacks`]
//!   plus a short spoken [`dispatcher::AIResponse`] via
//!   [`dispatcher::ActionDispatcher`].
//! - **Engine facade**: the whole turn as one call through
//!   [`engine::VoiceEngine`].
//!
//! The engine is synchronous and holds no session state; the caller owns
//! the [`context::WorkflowContext`].

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod parser;
pub mod selection;
pub mod settings;
pub mod text;
pub mod workflow;

pub use command::{CommandAction, CommandCategory, CommandParams, ParamValue, ParsedCommand, StateValidation, param};
pub use context::{
    AppState, ModeSwitchAttempt, ParserState, PrintStep, ScanSource, ScanStep, WorkflowContext,
    WorkflowMode, WorkflowStep, deserialize_context, serialize_context, try_deserialize_context,
};
pub use dispatcher::{
    AIResponse, ActionDispatcher, DispatchResult, ExecuteRequest, FeedbackType, HostCallbacks,
    ModalKind, ModalRequest, Navigation, StateUpdate,
};
pub use engine::VoiceEngine;
pub use error::{IntentError, Result};
pub use parser::IntentParser;
pub use selection::{SelectionCommand, SelectionKind, SelectionParser, apply_selection};
pub use settings::{SettingChange, Settings, SettingsUpdate, apply_setting_change};
pub use workflow::{Transition, TransitionOutcome, transition, validate_command};
