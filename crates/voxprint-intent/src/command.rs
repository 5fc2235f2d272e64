//! The parsed-command model.
//!
//! A [`ParsedCommand`] is produced once per utterance by the
//! [`IntentParser`](crate::parser::IntentParser), optionally stamped with a
//! [`StateValidation`] by the workflow state machine, and consumed by the
//! [`ActionDispatcher`](crate::dispatcher::ActionDispatcher).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Actions and categories
// ---------------------------------------------------------------------------

/// Every command the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandAction {
    // Mode switching
    OpenPrintMode,
    OpenScanMode,
    RequestModeSwitch,

    // Scan source
    SelectScanSource,

    // Document selection
    SelectDocument,
    SelectMultipleDocuments,
    DeselectDocument,
    SelectAll,
    ClearSelection,
    ToggleSelection,
    SwitchSection,
    UploadDocument,

    // Navigation
    NextDocument,
    PreviousDocument,
    ScrollUp,
    ScrollDown,
    NextStep,
    PreviousStep,

    // Workflow
    Confirm,
    Execute,
    Cancel,
    Reset,
    FeedDocuments,

    // Settings
    SetLayout,
    SetPaperSize,
    SetColorMode,
    SetCopies,
    SetDuplex,
    SetQuality,
    SetPageRange,
    SetPagesPerSheet,
    SetMargins,
    SetResolution,
    SetScanFormat,

    // System
    Help,
    Status,
}

/// Coarse grouping used to route a command to a dispatcher branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandCategory {
    DocumentSelection,
    ModeSwitch,
    ScanSource,
    Navigation,
    WorkflowAction,
    Confirmation,
    SettingsChange,
    System,
}

impl CommandAction {
    /// The category this action belongs to.
    pub fn category(self) -> CommandCategory {
        use CommandAction::*;
        match self {
            OpenPrintMode | OpenScanMode | RequestModeSwitch => CommandCategory::ModeSwitch,
            SelectScanSource => CommandCategory::ScanSource,
            SelectDocument | SelectMultipleDocuments | DeselectDocument | SelectAll
            | ClearSelection | ToggleSelection | SwitchSection | UploadDocument => {
                CommandCategory::DocumentSelection
            }
            NextDocument | PreviousDocument | ScrollUp | ScrollDown | NextStep | PreviousStep => {
                CommandCategory::Navigation
            }
            Confirm => CommandCategory::Confirmation,
            Execute | Cancel | Reset | FeedDocuments => CommandCategory::WorkflowAction,
            SetLayout | SetPaperSize | SetColorMode | SetCopies | SetDuplex | SetQuality
            | SetPageRange | SetPagesPerSheet | SetMargins | SetResolution | SetScanFormat => {
                CommandCategory::SettingsChange
            }
            Help | Status => CommandCategory::System,
        }
    }

    /// Whether this action opens or switches a workflow.
    pub fn is_mode_switch(self) -> bool {
        self.category() == CommandCategory::ModeSwitch
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameter keys used across parser and dispatcher.
pub mod param {
    /// 0-based document index.
    pub const INDEX: &str = "index";
    /// 0-based document indices.
    pub const INDICES: &str = "indices";
    /// Indices excluded from a select-all.
    pub const EXCLUDED: &str = "excluded";
    /// Whether `indices` came from a contiguous range expression.
    pub const IS_RANGE: &str = "isRange";
    /// Target workflow: `"print"` or `"scan"`.
    pub const TARGET: &str = "target";
    /// Whether the utterance carried a politeness marker.
    pub const HAS_SORRY: &str = "hasSorry";
    /// Scan source: `"select"` or `"feed"`.
    pub const SOURCE: &str = "source";
    /// Canonical setting value.
    pub const VALUE: &str = "value";
    /// Document-list section name.
    pub const SECTION: &str = "section";
}

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Flag(bool),
    Number(i64),
    Indices(Vec<usize>),
    Text(String),
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Flag(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Number(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Number(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<Vec<usize>> for ParamValue {
    fn from(v: Vec<usize>) -> Self {
        Self::Indices(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// Parameter map attached to a command.  Shape depends on the action.
pub type CommandParams = BTreeMap<String, ParamValue>;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Outcome of checking a command against the workflow state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StateValidation {
    /// The command is admissible.
    pub fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    /// The command is not admissible; `reason` is spoken to the user.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            reason: Some(reason.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// ParsedCommand
// ---------------------------------------------------------------------------

/// A structured, confidence-scored interpretation of one utterance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub action: CommandAction,
    pub category: CommandCategory,
    #[serde(default)]
    pub params: CommandParams,
    /// Heuristic match score in `[0, 1]`.
    pub confidence: f64,
    /// The literal input, kept for diagnostics.
    pub original_text: String,
    /// Attached after parsing by the state machine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_validation: Option<StateValidation>,
}

impl ParsedCommand {
    /// Create a command for `action`.  The confidence is clamped to `[0, 1]`.
    pub fn new(action: CommandAction, confidence: f64, original_text: impl Into<String>) -> Self {
        Self {
            action,
            category: action.category(),
            params: CommandParams::new(),
            confidence: if confidence.is_finite() {
                confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
            original_text: original_text.into(),
            state_validation: None,
        }
    }

    /// Attach a parameter.
    pub fn with_param(mut self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// Attach the state-machine verdict.
    pub fn with_validation(mut self, validation: StateValidation) -> Self {
        self.state_validation = Some(validation);
        self
    }

    /// `false` only when a validation was attached and rejected the command.
    pub fn is_valid(&self) -> bool {
        self.state_validation.as_ref().is_none_or(|v| v.valid)
    }

    pub fn number(&self, key: &str) -> Option<i64> {
        match self.params.get(key)? {
            ParamValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// A non-negative number parameter as an index.
    pub fn index(&self, key: &str) -> Option<usize> {
        self.number(key).and_then(|n| usize::try_from(n).ok())
    }

    pub fn indices(&self, key: &str) -> Option<&[usize]> {
        match self.params.get(key)? {
            ParamValue::Indices(v) => Some(v),
            _ => None,
        }
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.params.get(key)? {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.params.get(key)? {
            ParamValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
