//! End-to-end scenarios across parser, state machine and dispatcher.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use voxprint_intent::{
    AppState, CommandAction, CommandParams, ExecuteRequest, FeedbackType, HostCallbacks,
    IntentParser, ParsedCommand, ParserState, PrintStep, ScanSource, ScanStep, SelectionCommand,
    SelectionKind, Transition, VoiceEngine, WorkflowContext, WorkflowMode, WorkflowStep,
    apply_selection, deserialize_context, param, serialize_context, transition, validate_command,
};

const ALL_ACTIONS: &[CommandAction] = &[
    CommandAction::OpenPrintMode,
    CommandAction::OpenScanMode,
    CommandAction::RequestModeSwitch,
    CommandAction::SelectScanSource,
    CommandAction::SelectDocument,
    CommandAction::SelectMultipleDocuments,
    CommandAction::DeselectDocument,
    CommandAction::SelectAll,
    CommandAction::ClearSelection,
    CommandAction::ToggleSelection,
    CommandAction::SwitchSection,
    CommandAction::UploadDocument,
    CommandAction::NextDocument,
    CommandAction::PreviousDocument,
    CommandAction::ScrollUp,
    CommandAction::ScrollDown,
    CommandAction::NextStep,
    CommandAction::PreviousStep,
    CommandAction::Confirm,
    CommandAction::Execute,
    CommandAction::Cancel,
    CommandAction::Reset,
    CommandAction::FeedDocuments,
    CommandAction::SetLayout,
    CommandAction::SetPaperSize,
    CommandAction::SetColorMode,
    CommandAction::SetCopies,
    CommandAction::SetDuplex,
    CommandAction::SetQuality,
    CommandAction::SetPageRange,
    CommandAction::SetPagesPerSheet,
    CommandAction::SetMargins,
    CommandAction::SetResolution,
    CommandAction::SetScanFormat,
    CommandAction::Help,
    CommandAction::Status,
];

const UTTERANCES: &[&str] = &[
    "print",
    "scan",
    "sorry, scan instead",
    "pardon me, I want to print",
    "cancel",
    "yes",
    "confirm please",
    "next",
    "go back",
    "help",
    "what's the status",
    "select all",
    "select all except 3",
    "select the last 2 documents",
    "select documents 1, 2, 3, 5, and 7",
    "every second document from 1 to 10",
    "deselect document 2",
    "clear the selection",
    "select this",
    "landscape",
    "A4 paper",
    "make 3 copies",
    "black and white",
    "double sided",
    "only pages 2 to 5",
    "4 pages per sheet",
    "narrow margins",
    "high quality",
    "scan at 600 dpi",
    "save as pdf",
    "use the document feeder",
    "feed the pages",
    "scroll down",
    "next document",
    "show favorites",
    "upload a file",
    "",
    "   ",
    "the weather is lovely",
    "print print print print print print",
];

fn print_context(step: PrintStep, total: usize) -> WorkflowContext {
    let mut ctx = WorkflowContext::new().with_total_documents(total);
    ctx.app_state = AppState::PrintWorkflow;
    ctx.print_step = Some(step);
    ctx.repaired()
}

fn scan_context(step: ScanStep, source: Option<ScanSource>) -> WorkflowContext {
    let mut ctx = WorkflowContext::new().with_total_documents(5);
    ctx.app_state = AppState::ScanWorkflow;
    ctx.scan_step = Some(step);
    ctx.scan_source = source;
    ctx.repaired()
}

fn states() -> Vec<ParserState> {
    let mut out = vec![ParserState::default()];
    for step in PrintStep::ORDER {
        out.push(print_context(step, 10).parser_state());
    }
    for step in ScanStep::ORDER {
        out.push(scan_context(step, Some(ScanSource::Select)).parser_state());
    }
    out
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn confidence_stays_in_unit_interval() {
    let parser = IntentParser::new().unwrap();
    for text in UTTERANCES {
        if let Some(cmd) = parser.parse_command(text) {
            assert!((0.0..=1.0).contains(&cmd.confidence), "{text:?}: {}", cmd.confidence);
        }
        for state in states() {
            if let Some(cmd) = parser.parse_command_with_state(text, &state) {
                assert!(
                    (0.0..=1.0).contains(&cmd.confidence),
                    "{text:?} in {state:?}: {}",
                    cmd.confidence
                );
            }
        }
    }
}

#[test]
fn selection_never_leaves_document_list() {
    let parser = IntentParser::new().unwrap();
    let inputs = [
        "select the last 2 documents",
        "first ten files",
        "select 3 to 20",
        "documents 1, 2, 3, 5, and 7",
        "every second document from 1 to 10",
        "every other document",
        "select every document from 3 onward",
        "everything except 2 and 4",
        "select 99",
        "between two and twelve",
        "select all",
    ];
    for total in [0usize, 1, 3, 5, 8] {
        for text in inputs {
            if let Some(cmd) = parser.parse_selection(text, total) {
                assert!(
                    cmd.indices.iter().all(|i| *i < total),
                    "{text:?} with {total} documents gave {:?}",
                    cmd.indices
                );
            }
        }
    }
}

#[test]
fn select_then_deselect_restores_selection() {
    let total = 10;
    let cases: &[(&[usize], &[usize])] = &[
        (&[], &[0, 1, 2]),
        (&[4, 7], &[0, 9]),
        (&[1, 3, 5], &[2, 4, 6, 8]),
        (&[0, 1, 2, 3, 4], &[]),
    ];
    for (start, indices) in cases {
        let start: BTreeSet<usize> = start.iter().copied().collect();
        let select = SelectionCommand {
            kind: SelectionKind::Select,
            indices: indices.to_vec(),
            excluded: Vec::new(),
            is_range: false,
            confidence: 1.0,
        };
        let deselect = SelectionCommand {
            kind: SelectionKind::Deselect,
            ..select.clone()
        };
        let round_trip = apply_selection(&apply_selection(&start, &select, total), &deselect, total);
        assert_eq!(round_trip, start, "start {start:?}, indices {indices:?}");
    }
}

#[test]
fn mode_switch_needs_politeness() {
    let ctx = print_context(PrintStep::Configuration, 4);

    let mut params = CommandParams::new();
    params.insert(param::TARGET.to_string(), "scan".into());
    params.insert(param::HAS_SORRY.to_string(), false.into());
    let verdict = validate_command(&ctx.parser_state(), CommandAction::RequestModeSwitch, &params);
    assert!(!verdict.valid);

    let outcome = transition(
        &ctx,
        Transition::RequestModeSwitch {
            target: WorkflowMode::Scan,
            has_politeness: false,
        },
    );
    assert!(!outcome.validation.valid);
    assert_eq!(outcome.context.app_state, AppState::PrintWorkflow);

    let outcome = transition(
        &ctx,
        Transition::RequestModeSwitch {
            target: WorkflowMode::Scan,
            has_politeness: true,
        },
    );
    assert!(outcome.validation.valid);
    assert_eq!(outcome.context.app_state, AppState::ScanWorkflow);
    assert_eq!(outcome.context.scan_step, Some(ScanStep::SourceSelection));
}

#[test]
fn dashboard_only_admits_allowlisted_actions() {
    let engine = VoiceEngine::new().unwrap();
    let ctx = WorkflowContext::new().with_total_documents(4);
    let allowed = [
        CommandAction::OpenPrintMode,
        CommandAction::OpenScanMode,
        CommandAction::Help,
        CommandAction::Status,
    ];

    for action in ALL_ACTIONS.iter().copied().filter(|a| !allowed.contains(a)) {
        let calls = Arc::new(Mutex::new(0usize));
        let counter = calls.clone();
        let mut callbacks = HostCallbacks::new()
            .with_state_change(move |_| *counter.lock().unwrap() += 1);
        let cmd = ParsedCommand::new(action, 0.9, "test").with_param(param::INDEX, 1usize);

        let result = engine.dispatcher().handle_with_state(&cmd, &ctx, &mut callbacks);
        assert_eq!(result.response.feedback_type, FeedbackType::Info, "{action:?}");
        assert!(result.response.text.contains("dashboard"), "{action:?}");
        assert_eq!(result.context, ctx, "{action:?}");
        assert_eq!(*calls.lock().unwrap(), 0, "{action:?}");
    }

    for action in allowed {
        assert!(validate_command(&ctx.parser_state(), action, &CommandParams::new()).valid);
    }
}

#[test]
fn executing_admits_only_status_and_cancel() {
    let contexts = [
        print_context(PrintStep::Executing, 3),
        scan_context(ScanStep::Executing, Some(ScanSource::Feed)),
    ];
    for ctx in contexts {
        let state = ctx.parser_state();
        for action in ALL_ACTIONS.iter().copied() {
            let valid = validate_command(&state, action, &CommandParams::new()).valid;
            let expected = matches!(action, CommandAction::Status | CommandAction::Cancel);
            assert_eq!(valid, expected, "{action:?} in {state:?}");
        }
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn last_two_documents() {
    let cmd = IntentParser::new()
        .unwrap()
        .parse_selection("select the last 2 documents", 5)
        .unwrap();
    assert_eq!(cmd.indices, vec![3, 4]);
}

#[test]
fn comma_separated_list() {
    let cmd = IntentParser::new()
        .unwrap()
        .parse_selection("select documents 1, 2, 3, 5, and 7", 10)
        .unwrap();
    assert_eq!(cmd.indices, vec![0, 1, 2, 4, 6]);
}

#[test]
fn every_second_document_in_range() {
    let cmd = IntentParser::new()
        .unwrap()
        .parse_selection("every second document from 1 to 10", 10)
        .unwrap();
    assert_eq!(cmd.indices, vec![0, 2, 4, 6, 8]);
}

#[test]
fn all_except_selects_the_rest() {
    let engine = VoiceEngine::new().unwrap();
    let ctx = print_context(PrintStep::SelectDocument, 5);
    let selected = Arc::new(Mutex::new(Vec::new()));
    let sink = selected.clone();
    let mut callbacks =
        HostCallbacks::new().with_select_multiple_documents(move |ix| sink.lock().unwrap().push(ix.to_vec()));

    let result = engine.process("select all documents except 2 and 4", &ctx, &mut callbacks);
    assert_eq!(result.context.selected(), vec![0, 2, 4]);
    assert!(result.response.text.contains("except"), "{}", result.response.text);
    assert_eq!(result.response.feedback_type, FeedbackType::Success);
    assert_eq!(*selected.lock().unwrap(), vec![vec![0, 2, 4]]);
}

#[test]
fn cancel_from_configuration_returns_to_dashboard() {
    let engine = VoiceEngine::new().unwrap();
    let ctx = print_context(PrintStep::Configuration, 3).with_selection([0, 2]);

    let cmd = engine.parse("cancel", &ctx).unwrap();
    assert_eq!(cmd.action, CommandAction::Cancel);

    let result = engine.process("cancel", &ctx, &mut HostCallbacks::new());
    assert!(result.response.should_speak);
    let update = result.response.state_update.unwrap();
    assert_eq!(update.new_state, Some(AppState::Dashboard));
    assert_eq!(update.new_step, None);
    assert_eq!(result.context.app_state, AppState::Dashboard);
    assert!(result.context.selected_document_indices.is_empty());
    assert_eq!(result.context.total_documents, 3);
}

#[test]
fn full_print_session() {
    let engine = VoiceEngine::new().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let sink = requests.clone();
    let mut callbacks = HostCallbacks::new().with_execute(move |r| sink.lock().unwrap().push(r));

    let mut ctx = WorkflowContext::new().with_total_documents(5);
    let steps: &[(&str, Option<WorkflowStep>)] = &[
        ("print", Some(WorkflowStep::Print(PrintStep::SelectDocument))),
        ("select documents 1 and 3", Some(WorkflowStep::Print(PrintStep::SelectDocument))),
        ("confirm", Some(WorkflowStep::Print(PrintStep::Configuration))),
        ("landscape", Some(WorkflowStep::Print(PrintStep::Configuration))),
        ("confirm", Some(WorkflowStep::Print(PrintStep::Review))),
        ("print", Some(WorkflowStep::Print(PrintStep::Executing))),
    ];
    for (text, expected) in steps {
        let result = engine.process(text, &ctx, &mut callbacks);
        assert_ne!(result.response.feedback_type, FeedbackType::Warning, "{text:?}: {}", result.response.text);
        ctx = result.context;
        assert_eq!(ctx.current_step(), *expected, "{text:?}");
    }

    assert_eq!(ctx.selected(), vec![0, 2]);
    assert_eq!(
        ctx.current_settings.as_ref().map(|s| s.summary()),
        Some("landscape".to_string())
    );
    assert_eq!(*requests.lock().unwrap().last().unwrap(), ExecuteRequest::Print);

    let result = engine.process("landscape", &ctx, &mut callbacks);
    assert_eq!(result.response.feedback_type, FeedbackType::Warning);
    assert_eq!(result.context, ctx);
}

#[test]
fn feeder_scan_skips_document_selection() {
    let engine = VoiceEngine::new().unwrap();
    let mut callbacks = HostCallbacks::new();
    let mut ctx = WorkflowContext::new().with_total_documents(2);

    for text in ["scan", "use the document feeder", "scan at 600 dpi"] {
        ctx = engine.process(text, &ctx, &mut callbacks).context;
    }
    assert_eq!(ctx.scan_source, Some(ScanSource::Feed));
    assert_eq!(ctx.current_step(), Some(WorkflowStep::Scan(ScanStep::Configuration)));
    assert_eq!(
        ctx.current_settings.as_ref().map(|s| s.summary()),
        Some("600 dpi".to_string())
    );
}

#[test]
fn impolite_switch_is_remembered_then_polite_switch_succeeds() {
    let engine = VoiceEngine::new().unwrap();
    let ctx = print_context(PrintStep::Review, 3).with_selection([1]);

    let refused = engine.process("scan", &ctx, &mut HostCallbacks::new());
    assert_eq!(refused.response.feedback_type, FeedbackType::Warning);
    assert_eq!(refused.context.app_state, AppState::PrintWorkflow);
    let attempt = refused.context.last_mode_switch_attempt.unwrap();
    assert_eq!(attempt.target, WorkflowMode::Scan);
    assert!(!attempt.had_politeness);

    let accepted = engine.process("sorry, scan instead", &refused.context, &mut HostCallbacks::new());
    assert_eq!(accepted.response.feedback_type, FeedbackType::Success);
    assert_eq!(accepted.context.app_state, AppState::ScanWorkflow);
    assert_eq!(accepted.context.scan_step, Some(ScanStep::SourceSelection));
    assert!(accepted.context.selected_document_indices.is_empty());
}

#[test]
fn context_survives_a_serialization_round_trip() {
    let ctx = print_context(PrintStep::Review, 6).with_selection([0, 5]);
    let json = serialize_context(&ctx).unwrap();
    assert_eq!(deserialize_context(&json), ctx);
    assert_eq!(deserialize_context("{not json"), WorkflowContext::new());
}
