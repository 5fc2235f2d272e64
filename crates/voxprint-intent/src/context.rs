//! Workflow context: the single record of where the user is.
//!
//! The context is an immutable snapshot.  Every mutator consumes or borrows
//! it and returns a new value; the host owns the one mutable reference and
//! swaps it between turns.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// States and steps
// ---------------------------------------------------------------------------

/// Top-level application state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppState {
    #[default]
    Dashboard,
    PrintWorkflow,
    ScanWorkflow,
}

/// The two independently steppable workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowMode {
    Print,
    Scan,
}

impl WorkflowMode {
    /// The app state a workflow runs in.
    pub fn app_state(self) -> AppState {
        match self {
            Self::Print => AppState::PrintWorkflow,
            Self::Scan => AppState::ScanWorkflow,
        }
    }

    /// The workflow an app state belongs to, if any.
    pub fn from_app_state(state: AppState) -> Option<Self> {
        match state {
            AppState::Dashboard => None,
            AppState::PrintWorkflow => Some(Self::Print),
            AppState::ScanWorkflow => Some(Self::Scan),
        }
    }

    /// Parse the `target` parameter form.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "print" => Some(Self::Print),
            "scan" => Some(Self::Scan),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Scan => "scan",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Print => Self::Scan,
            Self::Scan => Self::Print,
        }
    }
}

/// Steps of the print workflow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintStep {
    SelectDocument,
    Configuration,
    Review,
    Executing,
}

impl PrintStep {
    pub const ORDER: [PrintStep; 4] = [
        PrintStep::SelectDocument,
        PrintStep::Configuration,
        PrintStep::Review,
        PrintStep::Executing,
    ];

    pub fn position(self) -> usize {
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }
}

/// Steps of the scan workflow, in order.  `SelectDocument` is skipped when
/// the source is the feeder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanStep {
    SourceSelection,
    SelectDocument,
    Configuration,
    Review,
    Executing,
}

impl ScanStep {
    pub const ORDER: [ScanStep; 5] = [
        ScanStep::SourceSelection,
        ScanStep::SelectDocument,
        ScanStep::Configuration,
        ScanStep::Review,
        ScanStep::Executing,
    ];

    pub fn position(self) -> usize {
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }
}

/// Where scanned pages come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanSource {
    /// Pick existing documents from the list.
    Select,
    /// Pull paper through the document feeder.
    Feed,
}

impl ScanSource {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "select" => Some(Self::Select),
            "feed" => Some(Self::Feed),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Feed => "feed",
        }
    }
}

/// A step in either workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", content = "step", rename_all = "lowercase")]
pub enum WorkflowStep {
    Print(PrintStep),
    Scan(ScanStep),
}

impl WorkflowStep {
    pub fn is_executing(self) -> bool {
        matches!(
            self,
            Self::Print(PrintStep::Executing) | Self::Scan(ScanStep::Executing)
        )
    }

    pub fn is_select_document(self) -> bool {
        matches!(
            self,
            Self::Print(PrintStep::SelectDocument) | Self::Scan(ScanStep::SelectDocument)
        )
    }

    /// Spoken name of the step.
    pub fn label(self) -> &'static str {
        match self {
            Self::Print(PrintStep::SelectDocument) | Self::Scan(ScanStep::SelectDocument) => {
                "document selection"
            }
            Self::Print(PrintStep::Configuration) | Self::Scan(ScanStep::Configuration) => {
                "configuration"
            }
            Self::Print(PrintStep::Review) | Self::Scan(ScanStep::Review) => "review",
            Self::Print(PrintStep::Executing) | Self::Scan(ScanStep::Executing) => "executing",
            Self::Scan(ScanStep::SourceSelection) => "source selection",
        }
    }

    /// Position in the mode's step order.
    pub fn position(self) -> usize {
        match self {
            Self::Print(step) => step.position(),
            Self::Scan(step) => step.position(),
        }
    }
}

// ---------------------------------------------------------------------------
// Mode-switch history
// ---------------------------------------------------------------------------

/// The most recent attempt to move between the two workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSwitchAttempt {
    pub target: WorkflowMode,
    pub had_politeness: bool,
    pub from_state: AppState,
}

// ---------------------------------------------------------------------------
// WorkflowContext
// ---------------------------------------------------------------------------

/// Legacy numeric mode mirror.
pub const LEGACY_MODE_DASHBOARD: u8 = 0;
pub const LEGACY_MODE_PRINT: u8 = 1;
pub const LEGACY_MODE_SCAN: u8 = 2;

/// The single source of truth for the user's position in the workflows.
///
/// Invariants, restored by [`WorkflowContext::repaired`]:
/// - `Dashboard` has neither a print nor a scan step.
/// - `PrintWorkflow` has no scan step or source, and vice versa.
/// - Every selected index is below `total_documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowContext {
    pub app_state: AppState,
    pub print_step: Option<PrintStep>,
    pub scan_step: Option<ScanStep>,
    pub scan_source: Option<ScanSource>,
    pub selected_document_indices: BTreeSet<usize>,
    pub total_documents: usize,
    pub current_settings: Option<Settings>,
    pub last_mode_switch_attempt: Option<ModeSwitchAttempt>,
    /// Legacy mirror of `app_state`: 0 dashboard, 1 print, 2 scan.
    pub mode: u8,
    /// Legacy mirror of the current step's position in its mode.
    pub step: u8,
}

impl Default for WorkflowContext {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowContext {
    /// A fresh session: dashboard, nothing selected, no settings.
    pub fn new() -> Self {
        Self {
            app_state: AppState::Dashboard,
            print_step: None,
            scan_step: None,
            scan_source: None,
            selected_document_indices: BTreeSet::new(),
            total_documents: 0,
            current_settings: None,
            last_mode_switch_attempt: None,
            mode: LEGACY_MODE_DASHBOARD,
            step: 0,
        }
    }

    /// Set the number of visible documents, dropping selections past the end.
    pub fn with_total_documents(mut self, total: usize) -> Self {
        self.total_documents = total;
        self.selected_document_indices.retain(|i| *i < total);
        self
    }

    /// Replace the selection.  Indices outside the document list are dropped.
    pub fn with_selection(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        let total = self.total_documents;
        self.selected_document_indices = indices.into_iter().filter(|i| *i < total).collect();
        self
    }

    /// The running workflow, if any.
    pub fn mode(&self) -> Option<WorkflowMode> {
        WorkflowMode::from_app_state(self.app_state)
    }

    /// The current step of the running workflow.
    pub fn current_step(&self) -> Option<WorkflowStep> {
        match self.app_state {
            AppState::Dashboard => None,
            AppState::PrintWorkflow => self.print_step.map(WorkflowStep::Print),
            AppState::ScanWorkflow => self.scan_step.map(WorkflowStep::Scan),
        }
    }

    pub fn is_executing(&self) -> bool {
        self.current_step().is_some_and(WorkflowStep::is_executing)
    }

    pub fn selected_count(&self) -> usize {
        self.selected_document_indices.len()
    }

    /// Selected indices in ascending order.
    pub fn selected(&self) -> Vec<usize> {
        self.selected_document_indices.iter().copied().collect()
    }

    /// The view of this context the parser and validator work from.
    pub fn parser_state(&self) -> ParserState {
        ParserState {
            app_state: self.app_state,
            print_step: self.print_step,
            scan_step: self.scan_step,
            scan_source: self.scan_source,
            total_documents: self.total_documents,
        }
    }

    /// Restore the invariants on a context of unknown provenance.
    pub fn repaired(mut self) -> Self {
        match self.app_state {
            AppState::Dashboard => {
                self.print_step = None;
                self.scan_step = None;
                self.scan_source = None;
            }
            AppState::PrintWorkflow => {
                self.scan_step = None;
                self.scan_source = None;
                self.print_step.get_or_insert(PrintStep::SelectDocument);
            }
            AppState::ScanWorkflow => {
                self.print_step = None;
                self.scan_step.get_or_insert(ScanStep::SourceSelection);
            }
        }
        if let Some(mode) = self.mode()
            && self.current_settings.as_ref().is_some_and(|s| s.mode() != mode)
        {
            self.current_settings = Some(Settings::for_mode(mode));
        }
        let total = self.total_documents;
        self.selected_document_indices.retain(|i| *i < total);
        self.sync_legacy();
        self
    }

    /// Recompute the legacy `mode`/`step` mirror.
    pub(crate) fn sync_legacy(&mut self) {
        self.mode = match self.app_state {
            AppState::Dashboard => LEGACY_MODE_DASHBOARD,
            AppState::PrintWorkflow => LEGACY_MODE_PRINT,
            AppState::ScanWorkflow => LEGACY_MODE_SCAN,
        };
        self.step = self
            .current_step()
            .map(|s| u8::try_from(s.position()).unwrap_or(u8::MAX))
            .unwrap_or(0);
    }
}

// ---------------------------------------------------------------------------
// ParserState
// ---------------------------------------------------------------------------

/// The slice of context that parsing and validation depend on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserState {
    pub app_state: AppState,
    pub print_step: Option<PrintStep>,
    pub scan_step: Option<ScanStep>,
    pub scan_source: Option<ScanSource>,
    pub total_documents: usize,
}

impl ParserState {
    pub fn mode(&self) -> Option<WorkflowMode> {
        WorkflowMode::from_app_state(self.app_state)
    }

    pub fn current_step(&self) -> Option<WorkflowStep> {
        match self.app_state {
            AppState::Dashboard => None,
            AppState::PrintWorkflow => self.print_step.map(WorkflowStep::Print),
            AppState::ScanWorkflow => self.scan_step.map(WorkflowStep::Scan),
        }
    }

    pub fn is_source_selection(&self) -> bool {
        self.app_state == AppState::ScanWorkflow && self.scan_step == Some(ScanStep::SourceSelection)
    }

    pub fn is_select_document(&self) -> bool {
        self.current_step().is_some_and(WorkflowStep::is_select_document)
    }
}

// ---------------------------------------------------------------------------
// Serialization
// ---------------------------------------------------------------------------

/// Encode a context for the host's store.
pub fn serialize_context(context: &WorkflowContext) -> Result<String> {
    Ok(serde_json::to_string_pretty(context)?)
}

/// Decode a stored context, restoring its invariants.
pub fn try_deserialize_context(json: &str) -> Result<WorkflowContext> {
    let context: WorkflowContext = serde_json::from_str(json)?;
    Ok(context.repaired())
}

/// Decode a stored context, falling back to a fresh one on any failure.
pub fn deserialize_context(json: &str) -> WorkflowContext {
    match try_deserialize_context(json) {
        Ok(context) => context,
        Err(e) => {
            warn!(error = %e, "stored context unreadable, starting fresh");
            WorkflowContext::new()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PrintSettings;

    #[test]
    fn new_context_is_dashboard() {
        let ctx = WorkflowContext::new();
        assert_eq!(ctx.app_state, AppState::Dashboard);
        assert!(ctx.print_step.is_none() && ctx.scan_step.is_none());
        assert!(ctx.current_settings.is_none());
        assert_eq!(ctx.mode, LEGACY_MODE_DASHBOARD);
        assert_eq!(ctx.current_step(), None);
    }

    #[test]
    fn selection_is_clamped_to_document_count() {
        let ctx = WorkflowContext::new()
            .with_total_documents(3)
            .with_selection([0, 2, 3, 9]);
        assert_eq!(ctx.selected(), vec![0, 2]);

        let ctx = ctx.with_total_documents(2);
        assert_eq!(ctx.selected(), vec![0]);
    }

    #[test]
    fn repair_clears_foreign_steps() {
        let mut ctx = WorkflowContext::new();
        ctx.app_state = AppState::PrintWorkflow;
        ctx.scan_step = Some(ScanStep::Review);
        ctx.scan_source = Some(ScanSource::Feed);
        let ctx = ctx.repaired();

        assert_eq!(ctx.print_step, Some(PrintStep::SelectDocument));
        assert!(ctx.scan_step.is_none());
        assert!(ctx.scan_source.is_none());
        assert_eq!(ctx.mode, LEGACY_MODE_PRINT);
        assert_eq!(ctx.step, 0);
    }

    #[test]
    fn repair_replaces_settings_of_the_wrong_mode() {
        let mut ctx = WorkflowContext::new();
        ctx.app_state = AppState::ScanWorkflow;
        ctx.current_settings = Some(Settings::Print(PrintSettings::default()));
        let ctx = ctx.repaired();
        assert_eq!(ctx.current_settings.map(|s| s.mode()), Some(WorkflowMode::Scan));
    }

    #[test]
    fn legacy_step_mirrors_position() {
        let mut ctx = WorkflowContext::new();
        ctx.app_state = AppState::ScanWorkflow;
        ctx.scan_step = Some(ScanStep::Review);
        let ctx = ctx.repaired();
        assert_eq!(ctx.mode, LEGACY_MODE_SCAN);
        assert_eq!(ctx.step, 3);
    }

    #[test]
    fn context_round_trips_through_json() {
        let mut ctx = WorkflowContext::new().with_total_documents(5);
        ctx.app_state = AppState::PrintWorkflow;
        ctx.print_step = Some(PrintStep::Configuration);
        let ctx = ctx.with_selection([1, 3]).repaired();

        let json = serialize_context(&ctx).unwrap();
        assert!(json.contains("PRINT_WORKFLOW"));
        assert_eq!(deserialize_context(&json), ctx);
    }

    #[test]
    fn malformed_context_falls_back_to_fresh() {
        assert_eq!(deserialize_context("{not json"), WorkflowContext::new());
        assert_eq!(deserialize_context("[1, 2]"), WorkflowContext::new());
        assert!(try_deserialize_context("{not json").is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let ctx = deserialize_context(r#"{"app_state": "SCAN_WORKFLOW", "total_documents": 4}"#);
        assert_eq!(ctx.app_state, AppState::ScanWorkflow);
        assert_eq!(ctx.scan_step, Some(ScanStep::SourceSelection));
        assert_eq!(ctx.total_documents, 4);
    }

    #[test]
    fn workflow_mode_labels() {
        assert_eq!(WorkflowMode::from_label("scan"), Some(WorkflowMode::Scan));
        assert_eq!(WorkflowMode::Print.other(), WorkflowMode::Scan);
        assert_eq!(WorkflowMode::Scan.app_state(), AppState::ScanWorkflow);
        assert_eq!(WorkflowMode::from_label("fax"), None);
    }
}
