//! Action dispatcher.
//!
//! Combines a validated [`ParsedCommand`] with the current
//! [`WorkflowContext`] and produces three things:
//!
//! 1. side effects, through the host's [`HostCallbacks`];
//! 2. the next context (the input is never modified);
//! 3. a short, voice-friendly [`AIResponse`].
//!
//! Every failure becomes a response with a [`FeedbackType`]; nothing here
//! returns an error or panics.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::command::{CommandAction, CommandCategory, CommandParams, ParsedCommand, param};
use crate::context::{
    AppState, ModeSwitchAttempt, PrintStep, ScanSource, ScanStep, WorkflowContext, WorkflowMode,
    WorkflowStep,
};
use crate::error::IntentError;
use crate::selection::{SelectionCommand, SelectionKind, apply_selection};
use crate::settings::{Settings, SettingChange, apply_setting_change};
use crate::workflow::{
    CHOOSE_SOURCE_FIRST, DASHBOARD_ACTIONS, DASHBOARD_REDIRECT, Transition, TransitionOutcome,
    switch_target, transition, validate_command,
};

/// Spoken when a valid action has no host handler wired.
pub const ACTION_RECEIVED: &str = "Action received.";

const SELECT_SOMETHING_FIRST: &str = "Select at least one document first.";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// How the UI should style a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Success,
    Info,
    Warning,
    Error,
}

/// Where the context owner should move next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_state: Option<AppState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_step: Option<WorkflowStep>,
}

impl StateUpdate {
    /// The position `context` is at.
    pub fn of(context: &WorkflowContext) -> Self {
        Self {
            new_state: Some(context.app_state),
            new_step: context.current_step(),
        }
    }
}

/// The engine's reply to one command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AIResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<CommandAction>,
    #[serde(default, skip_serializing_if = "CommandParams::is_empty")]
    pub params: CommandParams,
    pub should_speak: bool,
    pub feedback_type: FeedbackType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_update: Option<StateUpdate>,
}

impl AIResponse {
    fn new(text: impl Into<String>, feedback_type: FeedbackType) -> Self {
        Self {
            text: text.into(),
            action: None,
            params: CommandParams::new(),
            should_speak: true,
            feedback_type,
            state_update: None,
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, FeedbackType::Success)
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(text, FeedbackType::Info)
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self::new(text, FeedbackType::Warning)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, FeedbackType::Error)
    }

    /// Echo the handled command.
    fn for_command(mut self, command: &ParsedCommand) -> Self {
        self.action = Some(command.action);
        self.params = command.params.clone();
        self
    }

    fn with_state_update(mut self, update: StateUpdate) -> Self {
        self.state_update = Some(update);
        self
    }

    fn silent(mut self) -> Self {
        self.should_speak = false;
        self
    }
}

/// A response together with the context to use for the next turn.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    pub response: AIResponse,
    pub context: WorkflowContext,
}

// ---------------------------------------------------------------------------
// Host callbacks
// ---------------------------------------------------------------------------

/// Navigation requests forwarded to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Navigation {
    NextDocument,
    PreviousDocument,
    ScrollUp,
    ScrollDown,
    NextStep,
    PreviousStep,
}

/// Job control requests forwarded to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecuteRequest {
    Print,
    Scan,
    Cancel,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalKind {
    Upload,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalRequest {
    Open(ModalKind),
    Close,
}

/// The host's side-effect capabilities.  Every callback is optional; an
/// absent one degrades to an informational response.
#[derive(Default)]
pub struct HostCallbacks {
    pub on_select_document: Option<Box<dyn FnMut(usize) + Send>>,
    pub on_select_multiple_documents: Option<Box<dyn FnMut(&[usize]) + Send>>,
    /// An empty slice means the focused document.
    pub on_deselect_documents: Option<Box<dyn FnMut(&[usize]) + Send>>,
    pub on_clear_selection: Option<Box<dyn FnMut() + Send>>,
    /// Flip the document the host's UI currently has focused.
    pub on_toggle_focused_document: Option<Box<dyn FnMut() + Send>>,
    pub on_switch_section: Option<Box<dyn FnMut(&str) + Send>>,
    /// Receives only the changed field.
    pub on_update_settings: Option<Box<dyn FnMut(&Settings) + Send>>,
    pub on_navigate: Option<Box<dyn FnMut(Navigation) + Send>>,
    pub on_execute: Option<Box<dyn FnMut(ExecuteRequest) + Send>>,
    pub on_feed_documents: Option<Box<dyn FnMut() + Send>>,
    pub on_modal: Option<Box<dyn FnMut(ModalRequest) + Send>>,
    pub on_show_toast: Option<Box<dyn FnMut(&str, FeedbackType) + Send>>,
    /// Target workflow and whether the utterance was polite.
    pub on_mode_switch: Option<Box<dyn FnMut(WorkflowMode, bool) + Send>>,
    pub on_set_scan_source: Option<Box<dyn FnMut(ScanSource) + Send>>,
    pub on_state_change: Option<Box<dyn FnMut(&StateUpdate) + Send>>,
}

impl HostCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_select_document(mut self, f: impl FnMut(usize) + Send + 'static) -> Self {
        self.on_select_document = Some(Box::new(f));
        self
    }

    pub fn with_select_multiple_documents(mut self, f: impl FnMut(&[usize]) + Send + 'static) -> Self {
        self.on_select_multiple_documents = Some(Box::new(f));
        self
    }

    pub fn with_deselect_documents(mut self, f: impl FnMut(&[usize]) + Send + 'static) -> Self {
        self.on_deselect_documents = Some(Box::new(f));
        self
    }

    pub fn with_clear_selection(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_clear_selection = Some(Box::new(f));
        self
    }

    pub fn with_toggle_focused_document(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_toggle_focused_document = Some(Box::new(f));
        self
    }

    pub fn with_switch_section(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_switch_section = Some(Box::new(f));
        self
    }

    pub fn with_update_settings(mut self, f: impl FnMut(&Settings) + Send + 'static) -> Self {
        self.on_update_settings = Some(Box::new(f));
        self
    }

    pub fn with_navigate(mut self, f: impl FnMut(Navigation) + Send + 'static) -> Self {
        self.on_navigate = Some(Box::new(f));
        self
    }

    pub fn with_execute(mut self, f: impl FnMut(ExecuteRequest) + Send + 'static) -> Self {
        self.on_execute = Some(Box::new(f));
        self
    }

    pub fn with_feed_documents(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.on_feed_documents = Some(Box::new(f));
        self
    }

    pub fn with_modal(mut self, f: impl FnMut(ModalRequest) + Send + 'static) -> Self {
        self.on_modal = Some(Box::new(f));
        self
    }

    pub fn with_show_toast(mut self, f: impl FnMut(&str, FeedbackType) + Send + 'static) -> Self {
        self.on_show_toast = Some(Box::new(f));
        self
    }

    pub fn with_mode_switch(mut self, f: impl FnMut(WorkflowMode, bool) + Send + 'static) -> Self {
        self.on_mode_switch = Some(Box::new(f));
        self
    }

    pub fn with_set_scan_source(mut self, f: impl FnMut(ScanSource) + Send + 'static) -> Self {
        self.on_set_scan_source = Some(Box::new(f));
        self
    }

    pub fn with_state_change(mut self, f: impl FnMut(&StateUpdate) + Send + 'static) -> Self {
        self.on_state_change = Some(Box::new(f));
        self
    }

    // -- Invocation helpers: each returns whether a handler ran. -------------

    fn select_document(&mut self, index: usize) -> bool {
        self.on_select_document.as_mut().map(|f| f(index)).is_some()
    }

    fn select_multiple_documents(&mut self, indices: &[usize]) -> bool {
        self.on_select_multiple_documents
            .as_mut()
            .map(|f| f(indices))
            .is_some()
    }

    fn deselect_documents(&mut self, indices: &[usize]) -> bool {
        self.on_deselect_documents.as_mut().map(|f| f(indices)).is_some()
    }

    fn clear_selection(&mut self) -> bool {
        self.on_clear_selection.as_mut().map(|f| f()).is_some()
    }

    /// One document: the single-select handler, else the multi-select one.
    fn select_one(&mut self, index: usize) -> bool {
        self.select_document(index) || self.select_multiple_documents(&[index])
    }

    /// Several documents: the multi-select handler, else one single-select
    /// call per document.
    fn select_many(&mut self, indices: &[usize]) -> bool {
        if self.select_multiple_documents(indices) {
            return true;
        }
        let Some(f) = self.on_select_document.as_mut() else {
            return false;
        };
        for &index in indices {
            f(index);
        }
        true
    }

    /// Empty the selection: the clear handler, else a deselect of `current`.
    fn clear_or_deselect(&mut self, current: &[usize]) -> bool {
        self.clear_selection() || (!current.is_empty() && self.deselect_documents(current))
    }

    fn toggle_focused_document(&mut self) -> bool {
        self.on_toggle_focused_document.as_mut().map(|f| f()).is_some()
    }

    fn switch_section(&mut self, section: &str) -> bool {
        self.on_switch_section.as_mut().map(|f| f(section)).is_some()
    }

    fn update_settings(&mut self, patch: &Settings) -> bool {
        self.on_update_settings.as_mut().map(|f| f(patch)).is_some()
    }

    fn navigate(&mut self, navigation: Navigation) -> bool {
        self.on_navigate.as_mut().map(|f| f(navigation)).is_some()
    }

    fn execute(&mut self, request: ExecuteRequest) -> bool {
        self.on_execute.as_mut().map(|f| f(request)).is_some()
    }

    fn feed_documents(&mut self) -> bool {
        self.on_feed_documents.as_mut().map(|f| f()).is_some()
    }

    fn modal(&mut self, request: ModalRequest) -> bool {
        self.on_modal.as_mut().map(|f| f(request)).is_some()
    }

    fn show_toast(&mut self, text: &str, feedback: FeedbackType) -> bool {
        self.on_show_toast.as_mut().map(|f| f(text, feedback)).is_some()
    }

    fn mode_switch(&mut self, target: WorkflowMode, polite: bool) -> bool {
        self.on_mode_switch.as_mut().map(|f| f(target, polite)).is_some()
    }

    fn set_scan_source(&mut self, source: ScanSource) -> bool {
        self.on_set_scan_source.as_mut().map(|f| f(source)).is_some()
    }

    fn state_change(&mut self, update: &StateUpdate) -> bool {
        self.on_state_change.as_mut().map(|f| f(update)).is_some()
    }
}

impl fmt::Debug for HostCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let wired = [
            ("select_document", self.on_select_document.is_some()),
            ("select_multiple_documents", self.on_select_multiple_documents.is_some()),
            ("deselect_documents", self.on_deselect_documents.is_some()),
            ("clear_selection", self.on_clear_selection.is_some()),
            ("toggle_focused_document", self.on_toggle_focused_document.is_some()),
            ("switch_section", self.on_switch_section.is_some()),
            ("update_settings", self.on_update_settings.is_some()),
            ("navigate", self.on_navigate.is_some()),
            ("execute", self.on_execute.is_some()),
            ("feed_documents", self.on_feed_documents.is_some()),
            ("modal", self.on_modal.is_some()),
            ("show_toast", self.on_show_toast.is_some()),
            ("mode_switch", self.on_mode_switch.is_some()),
            ("set_scan_source", self.on_set_scan_source.is_some()),
            ("state_change", self.on_state_change.is_some()),
        ];
        f.debug_struct("HostCallbacks")
            .field(
                "wired",
                &wired
                    .iter()
                    .filter(|(_, on)| *on)
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ActionDispatcher
// ---------------------------------------------------------------------------

/// Turns commands into side effects, context updates and responses.
#[derive(Debug, Clone, Default)]
pub struct ActionDispatcher;

impl ActionDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Dispatch with the dashboard allowlist applied first, and validation
    /// attached when the command arrives without one.
    pub fn handle_with_state(
        &self,
        command: &ParsedCommand,
        context: &WorkflowContext,
        callbacks: &mut HostCallbacks,
    ) -> DispatchResult {
        if context.app_state == AppState::Dashboard && !DASHBOARD_ACTIONS.contains(&command.action) {
            debug!(action = ?command.action, "not available on the dashboard");
            return DispatchResult {
                response: AIResponse::info(DASHBOARD_REDIRECT).for_command(command),
                context: context.clone(),
            };
        }

        if command.state_validation.is_some() {
            return self.handle(command, context, callbacks);
        }
        let validated = command.clone().with_validation(validate_command(
            &context.parser_state(),
            command.action,
            &command.params,
        ));
        self.handle(&validated, context, callbacks)
    }

    /// Dispatch one command.
    pub fn handle(
        &self,
        command: &ParsedCommand,
        context: &WorkflowContext,
        callbacks: &mut HostCallbacks,
    ) -> DispatchResult {
        if !command.is_valid() {
            return rejected(command, context);
        }

        let mut turn = Turn {
            command,
            context,
            callbacks,
        };
        let (response, next) = match command.category {
            CommandCategory::ModeSwitch => turn.mode_switch(),
            CommandCategory::ScanSource => turn.scan_source(),
            CommandCategory::DocumentSelection => turn.document_selection(),
            CommandCategory::Navigation => turn.navigation(),
            CommandCategory::WorkflowAction => turn.workflow_action(),
            CommandCategory::Confirmation => turn.confirm(),
            CommandCategory::SettingsChange => turn.settings_change(),
            CommandCategory::System => turn.system(),
        };

        info!(
            action = ?command.action,
            feedback = ?response.feedback_type,
            state = ?next.app_state,
            step = ?next.current_step(),
            "command handled"
        );
        DispatchResult {
            response: response.for_command(command),
            context: next,
        }
    }
}

/// Short-circuit for a command the state machine refused.  Only the
/// mode-switch attempt is recorded; no callback runs.
fn rejected(command: &ParsedCommand, context: &WorkflowContext) -> DispatchResult {
    let reason = command
        .state_validation
        .as_ref()
        .and_then(|v| v.reason.clone())
        .unwrap_or_else(|| "That isn't available right now.".to_string());
    warn!(action = ?command.action, %reason, "command rejected");

    let mut next = context.clone();
    if command.action.is_mode_switch()
        && let (Some(current), Some(target)) = (context.mode(), switch_target(command.action, &command.params))
        && current != target
    {
        next.last_mode_switch_attempt = Some(ModeSwitchAttempt {
            target,
            had_politeness: command.flag(param::HAS_SORRY).unwrap_or(false),
            from_state: context.app_state,
        });
    }

    DispatchResult {
        response: AIResponse::warning(reason).for_command(command),
        context: next,
    }
}

type Handled = (AIResponse, WorkflowContext);

/// One dispatch in progress.
struct Turn<'a> {
    command: &'a ParsedCommand,
    context: &'a WorkflowContext,
    callbacks: &'a mut HostCallbacks,
}

impl Turn<'_> {
    fn unchanged(&self, response: AIResponse) -> Handled {
        (response, self.context.clone())
    }

    /// Response for a host-only action: full text when a handler ran.
    fn acknowledged(&self, invoked: bool, text: impl Into<String>) -> Handled {
        if invoked {
            self.unchanged(AIResponse::success(text))
        } else {
            debug!(action = ?self.command.action, "no host handler wired");
            self.unchanged(AIResponse::info(ACTION_RECEIVED))
        }
    }

    /// Notify the host of a position change and build the response.
    fn moved(&mut self, outcome: TransitionOutcome, text: impl Into<String>) -> Handled {
        if !outcome.validation.valid {
            let reason = outcome.validation.reason.unwrap_or_default();
            return (AIResponse::warning(reason), outcome.context);
        }
        let update = StateUpdate::of(&outcome.context);
        if outcome.changed {
            self.callbacks.state_change(&update);
        }
        (
            AIResponse::success(text).with_state_update(update),
            outcome.context,
        )
    }

    /// Apply `selection` to the context.  The response is a success only
    /// when a host handler ran; otherwise the same text goes out as info.
    fn with_selection(
        &mut self,
        invoked: bool,
        selection: &SelectionCommand,
        text: impl Into<String>,
    ) -> Handled {
        let mut next = self.context.clone();
        next.selected_document_indices =
            apply_selection(&self.context.selected_document_indices, selection, self.context.total_documents);
        let response = if invoked {
            AIResponse::success(text)
        } else {
            debug!(action = ?self.command.action, "no selection handler wired");
            AIResponse::info(text)
        };
        (response, next)
    }

    // -- Mode switch --------------------------------------------------------

    fn mode_switch(&mut self) -> Handled {
        let Some(target) = switch_target(self.command.action, &self.command.params) else {
            return self.unchanged(AIResponse::info("Which mode? Say \"print\" or \"scan\"."));
        };
        let polite = self.command.flag(param::HAS_SORRY).unwrap_or(false);
        let from = self.context.mode();

        if from == Some(target) {
            return self.unchanged(AIResponse::info(format!(
                "You're already in {} mode.",
                target.label()
            )));
        }

        let outcome = transition(
            self.context,
            Transition::RequestModeSwitch {
                target,
                has_politeness: polite,
            },
        );
        if outcome.validation.valid {
            self.callbacks.mode_switch(target, polite);
        }
        let opening = match target {
            WorkflowMode::Print => "Print mode. Which documents would you like to print?",
            WorkflowMode::Scan => "Scan mode. Scan existing documents, or use the feeder?",
        };
        let text = match from {
            Some(_) => format!("No problem, switching. {opening}"),
            None => opening.to_string(),
        };
        self.moved(outcome, text)
    }

    // -- Scan source --------------------------------------------------------

    fn scan_source(&mut self) -> Handled {
        let Some(source) = self.command.text(param::SOURCE).and_then(ScanSource::from_label) else {
            return self.unchanged(AIResponse::info(CHOOSE_SOURCE_FIRST));
        };
        let outcome = transition(self.context, Transition::SetScanSource { source });
        if outcome.validation.valid {
            self.callbacks.set_scan_source(source);
        }
        let text = match source {
            ScanSource::Select => "Okay, pick the documents to scan.",
            ScanSource::Feed => "Using the feeder. Load your pages, then adjust settings or say \"scan\".",
        };
        self.moved(outcome, text)
    }

    // -- Document selection -------------------------------------------------

    fn document_selection(&mut self) -> Handled {
        let total = self.context.total_documents;
        match self.command.action {
            CommandAction::SelectDocument => {
                let Some(index) = self.command.index(param::INDEX) else {
                    return self.unchanged(AIResponse::info(
                        "Which document? Say a number, like \"document 2\".",
                    ));
                };
                if index >= total {
                    return self.unchanged(AIResponse::warning(no_such_document(index, total)));
                }
                let invoked = self.callbacks.select_one(index);
                let text = format!("Selected document {}.", index + 1);
                self.with_selection(invoked, &selection(SelectionKind::Select, vec![index]), text)
            }
            CommandAction::SelectMultipleDocuments => {
                let indices = self.in_range_indices();
                if indices.is_empty() {
                    return self.unchanged(AIResponse::warning("None of those documents exist."));
                }
                let invoked = self.callbacks.select_many(&indices);
                let is_range = self.command.flag(param::IS_RANGE).unwrap_or(false);
                let text = format!("Selected documents {}.", spoken_indices(&indices, is_range));
                self.with_selection(invoked, &selection(SelectionKind::Select, indices), text)
            }
            CommandAction::DeselectDocument => {
                let mut indices = self.in_range_indices();
                if let Some(index) = self.command.index(param::INDEX).filter(|i| *i < total) {
                    indices.push(index);
                }
                if indices.is_empty() {
                    // No number spoken: the host's focused document.
                    let invoked = self.callbacks.deselect_documents(&[]);
                    return self.acknowledged(invoked, "Deselected.");
                }
                let invoked = self.callbacks.deselect_documents(&indices);
                let is_range = self.command.flag(param::IS_RANGE).unwrap_or(false);
                let text = format!("Deselected {}.", document_phrase(&indices, is_range));
                self.with_selection(invoked, &selection(SelectionKind::Deselect, indices), text)
            }
            CommandAction::SelectAll => {
                if total == 0 {
                    return self.unchanged(AIResponse::warning("There are no documents to select."));
                }
                let excluded: Vec<usize> = self
                    .command
                    .indices(param::EXCLUDED)
                    .map(|e| e.iter().copied().filter(|i| *i < total).collect())
                    .unwrap_or_default();
                let indices: Vec<usize> = (0..total).filter(|i| !excluded.contains(i)).collect();
                let invoked = self.callbacks.select_many(&indices);
                let text = if excluded.is_empty() {
                    format!("Selected all {}.", documents_count(total))
                } else {
                    format!("Selected all documents except {}.", spoken_indices(&excluded, false))
                };
                let mut all = selection(SelectionKind::SelectAll, indices);
                all.excluded = excluded;
                self.with_selection(invoked, &all, text)
            }
            CommandAction::ClearSelection => {
                let current: Vec<usize> = self.context.selected();
                let invoked = self.callbacks.clear_or_deselect(&current);
                self.with_selection(
                    invoked,
                    &selection(SelectionKind::Clear, Vec::new()),
                    "Selection cleared.",
                )
            }
            CommandAction::ToggleSelection => {
                let indices = self.in_range_indices();
                if indices.is_empty() {
                    let invoked = self.callbacks.toggle_focused_document();
                    return self.acknowledged(invoked, "Toggled the current document.");
                }
                let (removed, added): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .copied()
                    .partition(|i| self.context.selected_document_indices.contains(i));
                let selected = added.is_empty() || self.callbacks.select_many(&added);
                let deselected = removed.is_empty() || self.callbacks.deselect_documents(&removed);
                let text = format!("Toggled {}.", document_phrase(&indices, false));
                self.with_selection(selected && deselected, &selection(SelectionKind::Toggle, indices), text)
            }
            CommandAction::SwitchSection => {
                let Some(section) = self.command.text(param::SECTION) else {
                    return self.unchanged(AIResponse::info(
                        "Which section? Recent, uploaded, scanned, favorites, or shared.",
                    ));
                };
                let invoked = self.callbacks.switch_section(section);
                self.acknowledged(invoked, format!("Showing {section} documents."))
            }
            CommandAction::UploadDocument => {
                let invoked = self.callbacks.modal(ModalRequest::Open(ModalKind::Upload));
                self.acknowledged(invoked, "Opening upload.")
            }
            other => self.unknown(other),
        }
    }

    /// `indices` parameter filtered to the document list, ascending.
    fn in_range_indices(&self) -> Vec<usize> {
        let total = self.context.total_documents;
        let mut indices: Vec<usize> = self
            .command
            .indices(param::INDICES)
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|i| *i < total)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    // -- Navigation ---------------------------------------------------------

    fn navigation(&mut self) -> Handled {
        match self.command.action {
            CommandAction::NextDocument => {
                let invoked = self.callbacks.navigate(Navigation::NextDocument);
                self.acknowledged(invoked, "Next document.")
            }
            CommandAction::PreviousDocument => {
                let invoked = self.callbacks.navigate(Navigation::PreviousDocument);
                self.acknowledged(invoked, "Previous document.")
            }
            CommandAction::ScrollUp => {
                let invoked = self.callbacks.navigate(Navigation::ScrollUp);
                let (response, next) = self.acknowledged(invoked, "Scrolling up.");
                (response.silent(), next)
            }
            CommandAction::ScrollDown => {
                let invoked = self.callbacks.navigate(Navigation::ScrollDown);
                let (response, next) = self.acknowledged(invoked, "Scrolling down.");
                (response.silent(), next)
            }
            CommandAction::NextStep => self.step(Transition::NextStep, Navigation::NextStep),
            CommandAction::PreviousStep => self.step(Transition::PreviousStep, Navigation::PreviousStep),
            other => self.unknown(other),
        }
    }

    fn step(&mut self, request: Transition, navigation: Navigation) -> Handled {
        // Past review is the job itself.
        if request == Transition::NextStep
            && matches!(
                self.context.current_step(),
                Some(WorkflowStep::Print(PrintStep::Review) | WorkflowStep::Scan(ScanStep::Review))
            )
        {
            return self.execute();
        }
        if request == Transition::NextStep
            && self
                .context
                .current_step()
                .is_some_and(WorkflowStep::is_select_document)
            && self.context.selected_document_indices.is_empty()
            && self.context.app_state == AppState::PrintWorkflow
        {
            return self.unchanged(AIResponse::warning(SELECT_SOMETHING_FIRST));
        }

        let outcome = transition(self.context, request);
        if outcome.validation.valid && !outcome.changed {
            let edge = if request == Transition::NextStep { "last" } else { "first" };
            return (
                AIResponse::info(format!("You're already at the {edge} step.")),
                outcome.context,
            );
        }
        if outcome.validation.valid {
            self.callbacks.navigate(navigation);
        }
        let text = step_prompt(&outcome.context);
        self.moved(outcome, text)
    }

    // -- Workflow actions ---------------------------------------------------

    fn workflow_action(&mut self) -> Handled {
        match self.command.action {
            CommandAction::Execute => self.execute(),
            CommandAction::Cancel => {
                self.callbacks.execute(ExecuteRequest::Cancel);
                let outcome = transition(self.context, Transition::Cancel);
                self.to_dashboard(outcome, "Cancelled. Back to the dashboard.")
            }
            CommandAction::Reset => {
                let outcome = transition(self.context, Transition::Reset);
                self.to_dashboard(outcome, "Starting over. Back to the dashboard.")
            }
            CommandAction::FeedDocuments => {
                if self.context.mode() != Some(WorkflowMode::Scan) {
                    return self.unchanged(AIResponse::warning("Feeding only works while scanning."));
                }
                let invoked = self.callbacks.feed_documents();
                self.acknowledged(invoked, "Feeding documents.")
            }
            other => self.unknown(other),
        }
    }

    fn to_dashboard(&mut self, outcome: TransitionOutcome, text: &str) -> Handled {
        let update = StateUpdate::of(&outcome.context);
        self.callbacks.state_change(&update);
        (
            AIResponse::info(text).with_state_update(update),
            outcome.context,
        )
    }

    fn execute(&mut self) -> Handled {
        let Some(mode) = self.context.mode() else {
            return self.unchanged(AIResponse::info(DASHBOARD_REDIRECT));
        };
        let count = self.context.selected_count();
        let request = match mode {
            WorkflowMode::Print => {
                if count == 0 {
                    return self.unchanged(AIResponse::warning(SELECT_SOMETHING_FIRST));
                }
                ExecuteRequest::Print
            }
            WorkflowMode::Scan => match self.context.scan_source {
                None => return self.unchanged(AIResponse::warning(CHOOSE_SOURCE_FIRST)),
                Some(ScanSource::Select) if count == 0 => {
                    return self.unchanged(AIResponse::warning(SELECT_SOMETHING_FIRST));
                }
                Some(_) => ExecuteRequest::Scan,
            },
        };

        let outcome = transition(self.context, Transition::Execute);
        if outcome.validation.valid {
            self.callbacks.execute(request);
        }
        let text = match (mode, self.context.scan_source) {
            (WorkflowMode::Print, _) => format!("Printing {}.", documents_count(count)),
            (WorkflowMode::Scan, Some(ScanSource::Feed)) => "Scanning from the feeder.".to_string(),
            (WorkflowMode::Scan, _) => format!("Scanning {}.", documents_count(count)),
        };
        self.moved(outcome, text)
    }

    // -- Confirmation -------------------------------------------------------

    fn confirm(&mut self) -> Handled {
        match self.context.current_step() {
            None => self.unchanged(AIResponse::info(DASHBOARD_REDIRECT)),
            Some(WorkflowStep::Scan(ScanStep::SourceSelection)) => {
                self.unchanged(AIResponse::info(CHOOSE_SOURCE_FIRST))
            }
            Some(step) if step.is_select_document() => {
                let count = self.context.selected_count();
                if count == 0 {
                    return self.unchanged(AIResponse::warning(SELECT_SOMETHING_FIRST));
                }
                self.callbacks.execute(ExecuteRequest::Confirm);
                let outcome = transition(self.context, Transition::NextStep);
                let text = format!(
                    "{} selected. {}",
                    capitalize(&documents_count(count)),
                    step_prompt(&outcome.context)
                );
                self.moved(outcome, text)
            }
            Some(WorkflowStep::Print(PrintStep::Configuration) | WorkflowStep::Scan(ScanStep::Configuration)) => {
                self.callbacks.execute(ExecuteRequest::Confirm);
                let outcome = transition(self.context, Transition::NextStep);
                let text = step_prompt(&outcome.context);
                self.moved(outcome, text)
            }
            Some(WorkflowStep::Print(PrintStep::Review) | WorkflowStep::Scan(ScanStep::Review)) => self.execute(),
            Some(_) => self.unchanged(AIResponse::info("The job is already running.")),
        }
    }

    // -- Settings -----------------------------------------------------------

    fn settings_change(&mut self) -> Handled {
        let Some(mode) = self.context.mode() else {
            return self.unchanged(AIResponse::info(DASHBOARD_REDIRECT));
        };
        let update = SettingChange::from_command(self.command, mode).and_then(|change| {
            apply_setting_change(self.context.current_settings.as_ref(), &change, mode)
        });

        match update {
            Ok(update) => {
                self.callbacks.update_settings(&update.patch);
                let mut next = self.context.clone();
                next.current_settings = Some(update.settings);
                (AIResponse::success(update.message), next)
            }
            Err(IntentError::MissingParameter { action, .. }) => {
                self.unchanged(AIResponse::info(SettingChange::prompt_for(action)))
            }
            Err(IntentError::InvalidSettingValue { field, value }) => {
                warn!(field, %value, "invalid setting value");
                let text = format!("Sorry, {value} isn't a valid {field}.");
                self.callbacks.show_toast(&text, FeedbackType::Warning);
                self.unchanged(AIResponse::warning(text))
            }
            Err(IntentError::UnsupportedSetting { mode, .. }) => self.unchanged(AIResponse::warning(
                format!("That setting isn't available while {}.", doing(mode)),
            )),
            Err(e) => {
                warn!(error = %e, "settings change failed");
                self.unchanged(AIResponse::error("Something went wrong changing that setting."))
            }
        }
    }

    // -- System -------------------------------------------------------------

    fn system(&mut self) -> Handled {
        match self.command.action {
            CommandAction::Help => {
                self.callbacks.modal(ModalRequest::Open(ModalKind::Help));
                self.unchanged(AIResponse::info(help_text(self.context)))
            }
            CommandAction::Status => self.unchanged(AIResponse::info(status_text(self.context))),
            other => self.unknown(other),
        }
    }

    fn unknown(&self, action: CommandAction) -> Handled {
        warn!(?action, category = ?action.category(), "no handler for action");
        self.unchanged(AIResponse::warning("Sorry, I can't do that here."))
    }
}

// ---------------------------------------------------------------------------
// Texts
// ---------------------------------------------------------------------------

fn selection(kind: SelectionKind, indices: Vec<usize>) -> SelectionCommand {
    SelectionCommand {
        kind,
        indices,
        excluded: Vec::new(),
        is_range: false,
        confidence: 1.0,
    }
}

fn doing(mode: WorkflowMode) -> &'static str {
    match mode {
        WorkflowMode::Print => "printing",
        WorkflowMode::Scan => "scanning",
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn documents_count(n: usize) -> String {
    if n == 1 {
        "1 document".to_string()
    } else {
        format!("{n} documents")
    }
}

fn no_such_document(index: usize, total: usize) -> String {
    match total {
        0 => "There are no documents yet.".to_string(),
        _ => format!("There's no document {}. There are {}.", index + 1, documents_count(total)),
    }
}

/// 1-based spoken form: "2 to 5" for ranges, "1, 3 and 4" for lists.
fn spoken_indices(indices: &[usize], is_range: bool) -> String {
    let numbers: Vec<String> = indices.iter().map(|i| (i + 1).to_string()).collect();
    match numbers.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, .., last] if is_range => format!("{first} to {last}"),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

fn document_phrase(indices: &[usize], is_range: bool) -> String {
    match indices {
        [only] => format!("document {}", only + 1),
        _ => format!("documents {}", spoken_indices(indices, is_range)),
    }
}

/// What to say on arriving at the context's current step.
pub fn step_prompt(context: &WorkflowContext) -> String {
    match context.current_step() {
        None => DASHBOARD_REDIRECT.to_string(),
        Some(WorkflowStep::Scan(ScanStep::SourceSelection)) => CHOOSE_SOURCE_FIRST.to_string(),
        Some(step) if step.is_select_document() => {
            "Which documents? Say a number, a range, or \"select all\".".to_string()
        }
        Some(WorkflowStep::Print(PrintStep::Configuration) | WorkflowStep::Scan(ScanStep::Configuration)) => {
            "Adjust settings, or say \"next\" to review.".to_string()
        }
        Some(WorkflowStep::Print(PrintStep::Review) | WorkflowStep::Scan(ScanStep::Review)) => {
            let summary = context
                .current_settings
                .as_ref()
                .map_or_else(|| "default settings".to_string(), Settings::summary);
            format!("Review: {summary}. Say \"confirm\" to start.")
        }
        Some(_) => "Working on it.".to_string(),
    }
}

/// Per-step help.
pub fn help_text(context: &WorkflowContext) -> String {
    let text = match (context.mode(), context.current_step()) {
        (None, _) | (_, None) => {
            "Say \"print\" to print documents or \"scan\" to scan. You can also ask for status."
        }
        (_, Some(WorkflowStep::Scan(ScanStep::SourceSelection))) => {
            "Say \"select\" to scan existing documents or \"feed\" to use the document feeder. Say \"cancel\" to go back."
        }
        (_, Some(step)) if step.is_select_document() => {
            "Say a document number, a range like \"1 to 3\", \"the last 2\", or \"select all\". Say \"next\" when you're done."
        }
        (Some(WorkflowMode::Print), Some(WorkflowStep::Print(PrintStep::Configuration))) => {
            "Change layout, paper size, color, copies, double-sided, quality, pages, or margins. Say \"next\" to review."
        }
        (Some(WorkflowMode::Scan), Some(WorkflowStep::Scan(ScanStep::Configuration))) => {
            "Change resolution, color, format, paper size, or double-sided. Say \"next\" to review."
        }
        (_, Some(step)) if step.is_executing() => "A job is running. Say \"status\" or \"cancel\".",
        _ => "Say \"confirm\" to start, or \"back\" to change something.",
    };
    text.to_string()
}

/// Spoken summary of the current position.
pub fn status_text(context: &WorkflowContext) -> String {
    let (Some(mode), Some(step)) = (context.mode(), context.current_step()) else {
        return match context.total_documents {
            0 => "You're on the dashboard.".to_string(),
            n => format!("You're on the dashboard. {} available.", capitalize(&documents_count(n))),
        };
    };

    let mut parts = vec![format!("{} mode, {} step.", capitalize(mode.label()), step.label())];
    if mode == WorkflowMode::Scan
        && let Some(source) = context.scan_source
    {
        parts.push(match source {
            ScanSource::Select => "Scanning existing documents.".to_string(),
            ScanSource::Feed => "Scanning from the feeder.".to_string(),
        });
    }
    if context.scan_source != Some(ScanSource::Feed) {
        parts.push(format!(
            "{} of {} selected.",
            context.selected_count(),
            documents_count(context.total_documents)
        ));
    }
    if let Some(settings) = &context.current_settings
        && !matches!(step, WorkflowStep::Print(PrintStep::SelectDocument) | WorkflowStep::Scan(ScanStep::SourceSelection | ScanStep::SelectDocument))
    {
        parts.push(format!("Settings: {}.", settings.summary()));
    }
    parts.join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::command::StateValidation;

    fn print_at(step: PrintStep, selected: &[usize]) -> WorkflowContext {
        let mut ctx = WorkflowContext::new().with_total_documents(5);
        ctx.app_state = AppState::PrintWorkflow;
        ctx.print_step = Some(step);
        ctx.current_settings = Some(Settings::for_mode(WorkflowMode::Print));
        ctx.with_selection(selected.iter().copied()).repaired()
    }

    fn command(action: CommandAction) -> ParsedCommand {
        ParsedCommand::new(action, 0.8, "test")
    }

    fn recorder() -> (HostCallbacks, Arc<Mutex<Vec<String>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let (a, b, c, d, e) = (log.clone(), log.clone(), log.clone(), log.clone(), log.clone());
        let callbacks = HostCallbacks::new()
            .with_select_document(move |i| a.lock().unwrap().push(format!("select {i}")))
            .with_select_multiple_documents(move |ix| b.lock().unwrap().push(format!("select {ix:?}")))
            .with_execute(move |r| c.lock().unwrap().push(format!("execute {r:?}")))
            .with_state_change(move |u| d.lock().unwrap().push(format!("state {:?}", u.new_state)))
            .with_mode_switch(move |m, polite| e.lock().unwrap().push(format!("mode {m:?} {polite}")));
        (callbacks, log)
    }

    #[test]
    fn invalid_command_short_circuits_without_side_effects() {
        let ctx = print_at(PrintStep::Configuration, &[]);
        let cmd = command(CommandAction::SetLayout).with_validation(StateValidation::rejected("nope"));
        let (mut callbacks, log) = recorder();

        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut callbacks);
        assert_eq!(result.response.feedback_type, FeedbackType::Warning);
        assert_eq!(result.response.text, "nope");
        assert_eq!(result.context, ctx);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn rejected_switch_records_attempt() {
        let ctx = print_at(PrintStep::Configuration, &[]);
        let cmd = command(CommandAction::RequestModeSwitch)
            .with_param(param::TARGET, "scan")
            .with_param(param::HAS_SORRY, false);
        let result = ActionDispatcher::new().handle_with_state(&cmd, &ctx, &mut HostCallbacks::new());

        assert_eq!(result.response.feedback_type, FeedbackType::Warning);
        assert!(result.response.text.contains("Sorry, scan"));
        assert_eq!(result.context.app_state, AppState::PrintWorkflow);
        assert_eq!(
            result.context.last_mode_switch_attempt.map(|a| a.target),
            Some(WorkflowMode::Scan)
        );
    }

    #[test]
    fn polite_switch_notifies_host() {
        let ctx = print_at(PrintStep::Review, &[1]);
        let cmd = command(CommandAction::RequestModeSwitch)
            .with_param(param::TARGET, "scan")
            .with_param(param::HAS_SORRY, true);
        let (mut callbacks, log) = recorder();

        let result = ActionDispatcher::new().handle_with_state(&cmd, &ctx, &mut callbacks);
        assert_eq!(result.response.feedback_type, FeedbackType::Success);
        assert_eq!(result.context.app_state, AppState::ScanWorkflow);
        let update = result.response.state_update.unwrap();
        assert_eq!(update.new_step, Some(WorkflowStep::Scan(ScanStep::SourceSelection)));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["mode Scan true".to_string(), "state Some(ScanWorkflow)".to_string()]
        );
    }

    #[test]
    fn dashboard_redirects_without_mutation() {
        let ctx = WorkflowContext::new().with_total_documents(3);
        let cmd = command(CommandAction::SelectAll);
        let result = ActionDispatcher::new().handle_with_state(&cmd, &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.text, DASHBOARD_REDIRECT);
        assert_eq!(result.response.feedback_type, FeedbackType::Info);
        assert_eq!(result.context, ctx);
    }

    #[test]
    fn select_document_updates_selection_and_host() {
        let ctx = print_at(PrintStep::SelectDocument, &[]);
        let cmd = command(CommandAction::SelectDocument).with_param(param::INDEX, 2usize);
        let (mut callbacks, log) = recorder();

        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut callbacks);
        assert_eq!(result.response.text, "Selected document 3.");
        assert_eq!(result.context.selected(), vec![2]);
        assert_eq!(*log.lock().unwrap(), vec!["select 2".to_string()]);
    }

    #[test]
    fn select_document_out_of_range_warns() {
        let ctx = print_at(PrintStep::SelectDocument, &[]);
        let cmd = command(CommandAction::SelectDocument).with_param(param::INDEX, 9usize);
        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.feedback_type, FeedbackType::Warning);
        assert!(result.context.selected_document_indices.is_empty());
    }

    #[test]
    fn range_selection_text() {
        let ctx = print_at(PrintStep::SelectDocument, &[]);
        let cmd = command(CommandAction::SelectMultipleDocuments)
            .with_param(param::INDICES, vec![1usize, 2, 3])
            .with_param(param::IS_RANGE, true);
        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.text, "Selected documents 2 to 4.");
        assert_eq!(result.context.selected(), vec![1, 2, 3]);
    }

    #[test]
    fn selection_without_handlers_is_informational() {
        let ctx = print_at(PrintStep::SelectDocument, &[2]);
        let dispatcher = ActionDispatcher::new();

        let cmd = command(CommandAction::SelectMultipleDocuments).with_param(param::INDICES, vec![0usize, 1]);
        let result = dispatcher.handle(&cmd, &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.text, "Selected documents 1 and 2.");
        assert_eq!(result.response.feedback_type, FeedbackType::Info);
        assert_eq!(result.context.selected(), vec![0, 1, 2]);

        let result = dispatcher.handle(&command(CommandAction::ClearSelection), &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.feedback_type, FeedbackType::Info);
        assert!(result.context.selected_document_indices.is_empty());
    }

    #[test]
    fn single_select_falls_back_to_multi_select_handler() {
        let ctx = print_at(PrintStep::SelectDocument, &[]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let mut callbacks =
            HostCallbacks::new().with_select_multiple_documents(move |ix| sink.lock().unwrap().push(ix.to_vec()));

        let cmd = command(CommandAction::SelectDocument).with_param(param::INDEX, 2usize);
        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut callbacks);
        assert_eq!(result.response.text, "Selected document 3.");
        assert_eq!(result.response.feedback_type, FeedbackType::Success);
        assert_eq!(*calls.lock().unwrap(), vec![vec![2]]);
    }

    #[test]
    fn multi_select_falls_back_to_single_select_handler() {
        let ctx = print_at(PrintStep::SelectDocument, &[]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let mut callbacks = HostCallbacks::new().with_select_document(move |i| sink.lock().unwrap().push(i));

        let result = ActionDispatcher::new().handle(&command(CommandAction::SelectAll), &ctx, &mut callbacks);
        assert_eq!(result.response.feedback_type, FeedbackType::Success);
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn clear_falls_back_to_deselecting_current_selection() {
        let ctx = print_at(PrintStep::SelectDocument, &[1, 3]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let mut callbacks =
            HostCallbacks::new().with_deselect_documents(move |ix| sink.lock().unwrap().push(ix.to_vec()));

        let result = ActionDispatcher::new().handle(&command(CommandAction::ClearSelection), &ctx, &mut callbacks);
        assert_eq!(result.response.feedback_type, FeedbackType::Success);
        assert_eq!(*calls.lock().unwrap(), vec![vec![1, 3]]);
    }

    #[test]
    fn toggle_without_indices_goes_to_focused_document() {
        let ctx = print_at(PrintStep::SelectDocument, &[]);
        let cmd = command(CommandAction::ToggleSelection).with_param(param::INDICES, Vec::<usize>::new());

        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.text, ACTION_RECEIVED);
        assert_eq!(result.response.feedback_type, FeedbackType::Info);

        let toggled = Arc::new(Mutex::new(0));
        let counter = toggled.clone();
        let mut callbacks = HostCallbacks::new().with_toggle_focused_document(move || *counter.lock().unwrap() += 1);
        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut callbacks);
        assert_eq!(result.response.feedback_type, FeedbackType::Success);
        assert_eq!(*toggled.lock().unwrap(), 1);
    }

    #[test]
    fn scroll_is_not_spoken() {
        let ctx = print_at(PrintStep::SelectDocument, &[]);
        let result = ActionDispatcher::new().handle(&command(CommandAction::ScrollDown), &ctx, &mut HostCallbacks::new());
        assert!(!result.response.should_speak);
    }

    #[test]
    fn cancel_resets_to_dashboard() {
        let ctx = print_at(PrintStep::Configuration, &[0, 1]);
        let (mut callbacks, log) = recorder();
        let result = ActionDispatcher::new().handle_with_state(&command(CommandAction::Cancel), &ctx, &mut callbacks);

        assert_eq!(result.response.text, "Cancelled. Back to the dashboard.");
        assert!(result.response.should_speak);
        assert_eq!(
            result.response.state_update,
            Some(StateUpdate {
                new_state: Some(AppState::Dashboard),
                new_step: None
            })
        );
        assert_eq!(result.context, WorkflowContext::new().with_total_documents(5));
        assert!(log.lock().unwrap().contains(&"execute Cancel".to_string()));
    }

    #[test]
    fn confirm_walks_the_print_workflow() {
        let dispatcher = ActionDispatcher::new();
        let (mut callbacks, log) = recorder();
        let confirm = command(CommandAction::Confirm);

        let empty = print_at(PrintStep::SelectDocument, &[]);
        let result = dispatcher.handle(&confirm, &empty, &mut callbacks);
        assert_eq!(result.response.text, SELECT_SOMETHING_FIRST);

        let ctx = print_at(PrintStep::SelectDocument, &[0, 3]);
        let result = dispatcher.handle(&confirm, &ctx, &mut callbacks);
        assert_eq!(result.context.print_step, Some(PrintStep::Configuration));
        assert!(result.response.text.starts_with("2 documents selected."));

        let result = dispatcher.handle(&confirm, &result.context, &mut callbacks);
        assert_eq!(result.context.print_step, Some(PrintStep::Review));

        let result = dispatcher.handle(&confirm, &result.context, &mut callbacks);
        assert_eq!(result.context.print_step, Some(PrintStep::Executing));
        assert_eq!(result.response.text, "Printing 2 documents.");
        assert!(log.lock().unwrap().contains(&"execute Print".to_string()));
    }

    #[test]
    fn execute_requires_selection() {
        let ctx = print_at(PrintStep::Review, &[]);
        let result = ActionDispatcher::new().handle(&command(CommandAction::Execute), &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.feedback_type, FeedbackType::Warning);
        assert_eq!(result.context.print_step, Some(PrintStep::Review));
    }

    #[test]
    fn settings_change_applies_and_reports() {
        let ctx = print_at(PrintStep::Configuration, &[0]);
        let patches = Arc::new(Mutex::new(Vec::new()));
        let sink = patches.clone();
        let mut callbacks = HostCallbacks::new().with_update_settings(move |s| sink.lock().unwrap().push(s.clone()));

        let cmd = command(CommandAction::SetLayout).with_param(param::VALUE, "landscape");
        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut callbacks);
        assert_eq!(result.response.text, "Layout: landscape.");
        assert_eq!(result.response.feedback_type, FeedbackType::Success);
        assert!(result.response.should_speak);
        assert_eq!(patches.lock().unwrap().len(), 1);
        assert_eq!(result.context.current_settings.unwrap().summary(), "landscape");
    }

    #[test]
    fn invalid_setting_value_warns() {
        let ctx = print_at(PrintStep::Configuration, &[0]);
        let cmd = command(CommandAction::SetCopies).with_param(param::VALUE, 400i64);
        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.feedback_type, FeedbackType::Warning);
        assert_eq!(result.context, ctx);
    }

    #[test]
    fn missing_setting_value_prompts() {
        let ctx = print_at(PrintStep::Configuration, &[0]);
        let result = ActionDispatcher::new().handle(&command(CommandAction::SetLayout), &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.text, SettingChange::prompt_for(CommandAction::SetLayout));
        assert_eq!(result.response.feedback_type, FeedbackType::Info);
    }

    #[test]
    fn host_only_action_without_callback_is_acknowledged() {
        let ctx = print_at(PrintStep::SelectDocument, &[]);
        let cmd = command(CommandAction::SwitchSection).with_param(param::SECTION, "recent");
        let result = ActionDispatcher::new().handle(&cmd, &ctx, &mut HostCallbacks::new());
        assert_eq!(result.response.text, ACTION_RECEIVED);
    }

    #[test]
    fn status_describes_position() {
        let ctx = print_at(PrintStep::SelectDocument, &[0, 1]);
        assert_eq!(
            status_text(&ctx),
            "Print mode, document selection step. 2 of 5 documents selected."
        );
        assert_eq!(status_text(&WorkflowContext::new()), "You're on the dashboard.");
    }

    #[test]
    fn spoken_index_lists() {
        assert_eq!(spoken_indices(&[0, 2, 3], false), "1, 3 and 4");
        assert_eq!(spoken_indices(&[4], false), "5");
        assert_eq!(spoken_indices(&[1, 2, 3], true), "2 to 4");
    }

    #[test]
    fn response_serializes_feedback_lowercase() {
        let json = serde_json::to_value(AIResponse::warning("x")).unwrap();
        assert_eq!(json["feedback_type"], "warning");
        assert_eq!(json["should_speak"], true);
    }
}
