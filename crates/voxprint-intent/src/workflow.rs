//! Workflow state machine.
//!
//! Two pure functions over [`WorkflowContext`]:
//!
//! - [`transition`] `(context, transition) -> outcome` moves the user between
//!   the dashboard and the two workflows and along each workflow's steps.
//! - [`validate_command`] `(state, action) -> {valid, reason}` decides whether
//!   a parsed command is admissible at the current position.
//!
//! ```text
//! DASHBOARD
//!   -> PRINT_WORKFLOW  SELECT_DOCUMENT -> CONFIGURATION -> REVIEW -> EXECUTING
//!   -> SCAN_WORKFLOW   SOURCE_SELECTION -> [SELECT_DOCUMENT] -> CONFIGURATION -> REVIEW -> EXECUTING
//! ```
//!
//! The scan path skips `SELECT_DOCUMENT` when the source is the feeder.
//! Moving between the two running workflows requires a politeness marker in
//! the utterance; without one the attempt is recorded and nothing moves.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::command::{CommandAction, CommandParams, ParamValue, StateValidation, param};
use crate::context::{
    AppState, ModeSwitchAttempt, ParserState, PrintStep, ScanSource, ScanStep, WorkflowContext,
    WorkflowMode, WorkflowStep,
};
use crate::settings::Settings;

/// Spoken when a dashboard command is not on the allowlist.
pub const DASHBOARD_REDIRECT: &str = "You're on the dashboard. Say \"print\" or \"scan\" to get started.";

/// Spoken when anything but status or cancel arrives during a job.
pub const JOB_IN_PROGRESS: &str =
    "A job is in progress. Say \"status\" to check on it or \"cancel\" to stop it.";

/// Spoken when the scan source has not been chosen yet.
pub const CHOOSE_SOURCE_FIRST: &str =
    "Choose a source first. Say \"select\" to pick documents or \"feed\" to use the feeder.";

/// Actions admitted on the dashboard.
pub const DASHBOARD_ACTIONS: &[CommandAction] = &[
    CommandAction::OpenPrintMode,
    CommandAction::OpenScanMode,
    CommandAction::Help,
    CommandAction::Status,
];

/// Actions admitted while a job is executing.
pub const EXECUTING_ACTIONS: &[CommandAction] = &[CommandAction::Status, CommandAction::Cancel];

/// Actions admitted at scan source selection.
pub const SOURCE_SELECTION_ACTIONS: &[CommandAction] = &[
    CommandAction::SelectScanSource,
    CommandAction::Help,
    CommandAction::Cancel,
];

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// A request to move the workflow position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transition {
    /// Open a workflow.  From inside the other workflow this is an
    /// unapologetic switch attempt.
    OpenMode { mode: WorkflowMode },
    /// Move from one running workflow to the other.
    RequestModeSwitch {
        target: WorkflowMode,
        has_politeness: bool,
    },
    SetScanSource { source: ScanSource },
    NextStep,
    PreviousStep,
    Execute,
    Cancel,
    Reset,
}

/// The result of a transition.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionOutcome {
    /// The next context.  Equal to the input when nothing moved, except for a
    /// recorded mode-switch attempt.
    pub context: WorkflowContext,
    pub validation: StateValidation,
    /// Whether the workflow position changed.
    pub changed: bool,
}

impl TransitionOutcome {
    fn moved(before: &WorkflowContext, mut context: WorkflowContext) -> Self {
        context.sync_legacy();
        let changed = context.app_state != before.app_state
            || context.current_step() != before.current_step();
        Self {
            context,
            validation: StateValidation::ok(),
            changed,
        }
    }

    fn rejected(context: WorkflowContext, reason: impl Into<String>) -> Self {
        Self {
            context,
            validation: StateValidation::rejected(reason),
            changed: false,
        }
    }
}

/// Apply `transition` to `context`.  The input is never modified.
pub fn transition(context: &WorkflowContext, transition: Transition) -> TransitionOutcome {
    let outcome = match transition {
        Transition::OpenMode { mode } => switch_mode(context, mode, false),
        Transition::RequestModeSwitch {
            target,
            has_politeness,
        } => switch_mode(context, target, has_politeness),
        Transition::SetScanSource { source } => set_scan_source(context, source),
        Transition::NextStep => step(context, Direction::Forward),
        Transition::PreviousStep => step(context, Direction::Back),
        Transition::Execute => execute(context),
        Transition::Cancel | Transition::Reset => {
            let fresh = WorkflowContext::new().with_total_documents(context.total_documents);
            TransitionOutcome::moved(context, fresh)
        }
    };

    if outcome.changed {
        info!(
            ?transition,
            from = ?context.app_state,
            to = ?outcome.context.app_state,
            step = ?outcome.context.current_step(),
            "workflow transition"
        );
    } else if !outcome.validation.valid {
        warn!(?transition, reason = ?outcome.validation.reason, "transition refused");
    }
    outcome
}

/// A fresh context positioned at the first step of `mode`.
fn start(context: &WorkflowContext, mode: WorkflowMode) -> WorkflowContext {
    let mut next = WorkflowContext::new().with_total_documents(context.total_documents);
    next.app_state = mode.app_state();
    match mode {
        WorkflowMode::Print => next.print_step = Some(PrintStep::SelectDocument),
        WorkflowMode::Scan => next.scan_step = Some(ScanStep::SourceSelection),
    }
    next.current_settings = Some(Settings::for_mode(mode));
    next.last_mode_switch_attempt = context.last_mode_switch_attempt;
    next
}

fn switch_mode(context: &WorkflowContext, target: WorkflowMode, has_politeness: bool) -> TransitionOutcome {
    let Some(current) = context.mode() else {
        return TransitionOutcome::moved(context, start(context, target));
    };
    if current == target {
        return TransitionOutcome::moved(context, context.clone());
    }

    let attempt = ModeSwitchAttempt {
        target,
        had_politeness: has_politeness,
        from_state: context.app_state,
    };
    if has_politeness {
        let mut next = start(context, target);
        next.last_mode_switch_attempt = Some(attempt);
        return TransitionOutcome::moved(context, next);
    }

    let mut held = context.clone();
    held.last_mode_switch_attempt = Some(attempt);
    TransitionOutcome::rejected(held, switch_prompt(current, target))
}

/// `You're in the middle of printing. Say "Sorry, scan" to switch.`
pub fn switch_prompt(current: WorkflowMode, target: WorkflowMode) -> String {
    let doing = match current {
        WorkflowMode::Print => "printing",
        WorkflowMode::Scan => "scanning",
    };
    format!(
        "You're in the middle of {doing}. Say \"Sorry, {}\" to switch.",
        target.label()
    )
}

fn set_scan_source(context: &WorkflowContext, source: ScanSource) -> TransitionOutcome {
    if context.app_state != AppState::ScanWorkflow {
        return TransitionOutcome::rejected(context.clone(), "The scan source only applies when scanning.");
    }
    let mut next = context.clone();
    next.scan_source = Some(source);
    if next.scan_step == Some(ScanStep::SourceSelection) {
        next.scan_step = Some(first_step_after_source(source));
    }
    TransitionOutcome::moved(context, next)
}

fn first_step_after_source(source: ScanSource) -> ScanStep {
    match source {
        ScanSource::Select => ScanStep::SelectDocument,
        ScanSource::Feed => ScanStep::Configuration,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Back,
}

fn step(context: &WorkflowContext, direction: Direction) -> TransitionOutcome {
    let mut next = context.clone();
    match context.current_step() {
        None => return TransitionOutcome::rejected(next, DASHBOARD_REDIRECT),
        Some(WorkflowStep::Print(current)) => {
            next.print_step = Some(neighbour(&PrintStep::ORDER, current, direction, |_| false));
        }
        Some(WorkflowStep::Scan(ScanStep::SourceSelection))
            if direction == Direction::Forward && context.scan_source.is_none() =>
        {
            return TransitionOutcome::rejected(next, CHOOSE_SOURCE_FIRST);
        }
        Some(WorkflowStep::Scan(current)) => {
            let feeder = context.scan_source == Some(ScanSource::Feed);
            next.scan_step = Some(neighbour(&ScanStep::ORDER, current, direction, |s| {
                feeder && s == ScanStep::SelectDocument
            }));
        }
    }
    let outcome = TransitionOutcome::moved(context, next);
    if !outcome.changed {
        debug!(?direction, "already at the end of the workflow");
    }
    outcome
}

/// The adjacent step in `order`, skipping steps for which `skip` holds.
/// Stays put at either end.
fn neighbour<S: Copy + PartialEq>(order: &[S], current: S, direction: Direction, skip: impl Fn(S) -> bool) -> S {
    let Some(mut pos) = order.iter().position(|s| *s == current) else {
        return current;
    };
    loop {
        pos = match direction {
            Direction::Forward if pos + 1 < order.len() => pos + 1,
            Direction::Back if pos > 0 => pos - 1,
            _ => return current,
        };
        if !skip(order[pos]) {
            return order[pos];
        }
    }
}

fn execute(context: &WorkflowContext) -> TransitionOutcome {
    let mut next = context.clone();
    match context.app_state {
        AppState::Dashboard => return TransitionOutcome::rejected(next, DASHBOARD_REDIRECT),
        AppState::PrintWorkflow => next.print_step = Some(PrintStep::Executing),
        AppState::ScanWorkflow => next.scan_step = Some(ScanStep::Executing),
    }
    TransitionOutcome::moved(context, next)
}

// ---------------------------------------------------------------------------
// Admissibility
// ---------------------------------------------------------------------------

/// Whether `action` is admissible at the position described by `state`.
///
/// `params` supplies the mode-switch target and politeness flag.
pub fn validate_command(state: &ParserState, action: CommandAction, params: &CommandParams) -> StateValidation {
    let Some(mode) = state.mode() else {
        return if DASHBOARD_ACTIONS.contains(&action) {
            StateValidation::ok()
        } else {
            StateValidation::rejected(DASHBOARD_REDIRECT)
        };
    };

    if state.current_step().is_some_and(WorkflowStep::is_executing) {
        return if EXECUTING_ACTIONS.contains(&action) {
            StateValidation::ok()
        } else {
            StateValidation::rejected(JOB_IN_PROGRESS)
        };
    }

    if action.is_mode_switch() {
        let target = switch_target(action, params).unwrap_or(mode);
        let polite = matches!(params.get(param::HAS_SORRY), Some(ParamValue::Flag(true)));
        if target != mode && !polite {
            return StateValidation::rejected(switch_prompt(mode, target));
        }
        return StateValidation::ok();
    }

    if state.is_source_selection() && !SOURCE_SELECTION_ACTIONS.contains(&action) {
        return StateValidation::rejected(CHOOSE_SOURCE_FIRST);
    }

    if action == CommandAction::SelectScanSource && mode == WorkflowMode::Print {
        return StateValidation::rejected("There's no scan source when printing.");
    }

    StateValidation::ok()
}

/// The workflow a mode-switch command points at.
pub fn switch_target(action: CommandAction, params: &CommandParams) -> Option<WorkflowMode> {
    if let Some(ParamValue::Text(label)) = params.get(param::TARGET)
        && let Some(mode) = WorkflowMode::from_label(label)
    {
        return Some(mode);
    }
    match action {
        CommandAction::OpenPrintMode => Some(WorkflowMode::Print),
        CommandAction::OpenScanMode => Some(WorkflowMode::Scan),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
