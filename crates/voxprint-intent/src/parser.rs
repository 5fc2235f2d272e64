//! Intent parser: one utterance in, at most one [`ParsedCommand`] out.
//!
//! Categories are tried in a fixed priority order.  Each stage is a pair of
//! an applicability predicate over the parser state and a builder that
//! returns at most one candidate:
//!
//! | # | Stage | Applies | Short-circuits |
//! |---|-------|---------|----------------|
//! | 1 | mode switch | always | yes, at >= 0.6 |
//! | 2 | scan source | scan workflow, source selection | no |
//! | 3 | document selection grammar | any select-document step | no |
//! | 4 | workflow commands | always | yes, at >= 0.6 |
//! | 5 | basic document commands | always | no |
//! | 6 | settings for the running mode | not on the dashboard | no |
//!
//! The highest-confidence candidate wins; a later stage replaces the current
//! best only when strictly better.

use tracing::{debug, info};
use voxprint_kernel::lexicon::{
    BARE_PRINT_WORDS, BARE_SCAN_WORDS, CANCEL_PHRASES, CLEAR_SELECTION_PHRASES,
    COLOR_MODE_KEYWORDS, COLOR_MODE_VALUES, CONFIRM_PHRASES, COPIES_KEYWORDS,
    DESELECT_DOCUMENT_PHRASES, DUPLEX_KEYWORDS, DUPLEX_VALUES, EXACT_CLEAR_CONFIDENCE,
    EXACT_CONFIRM_CONFIDENCE, EXACT_SELECT_ALL_CONFIDENCE, EXECUTE_PRINT_PHRASES,
    EXECUTE_SCAN_PHRASES, FEED_PHRASES, FORMAT_KEYWORDS, FORMAT_VALUES, HELP_PHRASES,
    LAST_SENTINEL, LAYOUT_KEYWORDS, LAYOUT_VALUES, MARGIN_KEYWORDS, MARGIN_VALUES,
    MEDIUM_CONFIDENCE, NEXT_DOCUMENT_PHRASES, NEXT_STEP_PHRASES, PAGE_RANGE_KEYWORDS,
    PAGES_PER_SHEET_KEYWORDS, PAPER_SIZE_KEYWORDS, PAPER_SIZE_VALUES, PREVIOUS_DOCUMENT_PHRASES,
    PREVIOUS_STEP_PHRASES, PRINT_MODE_PHRASES, QUALITY_KEYWORDS, QUALITY_VALUES, RESET_PHRASES,
    RESOLUTION_KEYWORDS, RESOLUTION_PRESETS, SCAN_MODE_PHRASES, SCROLL_DOWN_PHRASES,
    SCROLL_UP_PHRASES, SECTION_NAMES, SELECT_ALL_PHRASES, SELECT_DOCUMENT_PHRASES,
    SOURCE_FEED_PHRASES, SOURCE_SELECT_PHRASES, STATUS_PHRASES, SWITCH_SECTION_PHRASES,
    UPLOAD_PHRASES,
};
use voxprint_kernel::{KeywordRouter, RouteMatch, contains_phrase, first_phrase, keyword_confidence};

use crate::command::{CommandAction, ParamValue, ParsedCommand, param};
use crate::context::{AppState, ParserState, ScanSource, WorkflowMode};
use crate::error::Result;
use crate::selection::{SelectionCommand, SelectionKind, SelectionParser};
use crate::text::{extract_number, is_exact_phrase, normalize, parse_number_token, politeness_markers};
use crate::workflow::validate_command;

const NUMBER_WORDS: &str = r"\d+|one|two|three|four|five|six|seven|eight|nine|ten";

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

type Applies = fn(Option<&ParserState>) -> bool;
type Build = fn(&IntentParser, &Utterance<'_>, Option<&ParserState>) -> Option<ParsedCommand>;

/// One entry of the priority table.
struct Stage {
    name: &'static str,
    /// Return immediately when this stage produces a medium-confidence hit.
    short_circuit: bool,
    applies: Applies,
    build: Build,
}

const STAGES: &[Stage] = &[
    Stage {
        name: "mode_switch",
        short_circuit: true,
        applies: |_| true,
        build: IntentParser::mode_switch,
    },
    Stage {
        name: "scan_source",
        short_circuit: false,
        applies: |state| state.is_some_and(ParserState::is_source_selection),
        build: IntentParser::scan_source,
    },
    Stage {
        name: "selection",
        short_circuit: false,
        applies: |state| state.is_some_and(ParserState::is_select_document),
        build: IntentParser::selection,
    },
    Stage {
        name: "workflow",
        short_circuit: true,
        applies: |_| true,
        build: IntentParser::workflow,
    },
    Stage {
        name: "documents",
        short_circuit: false,
        applies: |_| true,
        build: IntentParser::documents,
    },
    Stage {
        name: "settings",
        short_circuit: false,
        applies: |state| state.is_none_or(|s| s.app_state != AppState::Dashboard),
        build: IntentParser::settings,
    },
];

/// A normalized utterance shared by every stage.
struct Utterance<'a> {
    original: &'a str,
    lower: String,
    chars: usize,
    /// Characters covered by politeness markers.
    polite_chars: usize,
    polite: bool,
}

impl<'a> Utterance<'a> {
    fn new(original: &'a str) -> Self {
        let lower = normalize(original);
        let markers = politeness_markers(&lower);
        Self {
            original,
            chars: lower.chars().count(),
            polite_chars: markers.iter().map(|m| m.chars().count()).sum(),
            polite: !markers.is_empty(),
            lower,
        }
    }

    fn command(&self, action: CommandAction, confidence: f64) -> ParsedCommand {
        ParsedCommand::new(action, confidence, self.original)
    }
}

// ---------------------------------------------------------------------------
// IntentParser
// ---------------------------------------------------------------------------

/// Rule-based intent parser.  Build once at startup, then share read-only.
#[derive(Debug)]
pub struct IntentParser {
    mode: KeywordRouter<WorkflowMode>,
    source: KeywordRouter<ScanSource>,
    workflow: KeywordRouter<CommandAction>,
    execute: KeywordRouter<WorkflowMode>,
    documents: KeywordRouter<CommandAction>,
    print_settings: KeywordRouter<CommandAction>,
    scan_settings: KeywordRouter<CommandAction>,
    selection: SelectionParser,
}

impl IntentParser {
    /// Build every router and compile every pattern.
    pub fn new() -> Result<Self> {
        let mode = KeywordRouter::from_groups(&[
            (WorkflowMode::Print, PRINT_MODE_PHRASES),
            (WorkflowMode::Scan, SCAN_MODE_PHRASES),
        ])?;

        let source = KeywordRouter::from_groups(&[
            (ScanSource::Feed, SOURCE_FEED_PHRASES),
            (ScanSource::Select, SOURCE_SELECT_PHRASES),
        ])?;

        let workflow = KeywordRouter::from_groups(&[
            (CommandAction::Cancel, CANCEL_PHRASES),
            (CommandAction::Confirm, CONFIRM_PHRASES),
            (CommandAction::Status, STATUS_PHRASES),
            (CommandAction::Help, HELP_PHRASES),
            (CommandAction::FeedDocuments, FEED_PHRASES),
            (CommandAction::ScrollUp, SCROLL_UP_PHRASES),
            (CommandAction::ScrollDown, SCROLL_DOWN_PHRASES),
            (CommandAction::NextStep, NEXT_STEP_PHRASES),
            (CommandAction::PreviousStep, PREVIOUS_STEP_PHRASES),
            (CommandAction::Reset, RESET_PHRASES),
        ])?;

        let execute = KeywordRouter::from_groups(&[
            (WorkflowMode::Print, EXECUTE_PRINT_PHRASES),
            (WorkflowMode::Scan, EXECUTE_SCAN_PHRASES),
        ])?;

        let documents = KeywordRouter::from_groups(&[
            (CommandAction::SelectAll, SELECT_ALL_PHRASES),
            (CommandAction::ClearSelection, CLEAR_SELECTION_PHRASES),
            (CommandAction::NextDocument, NEXT_DOCUMENT_PHRASES),
            (CommandAction::PreviousDocument, PREVIOUS_DOCUMENT_PHRASES),
            (CommandAction::UploadDocument, UPLOAD_PHRASES),
            (CommandAction::DeselectDocument, DESELECT_DOCUMENT_PHRASES),
            (CommandAction::SelectDocument, SELECT_DOCUMENT_PHRASES),
            (CommandAction::SwitchSection, SWITCH_SECTION_PHRASES),
        ])?;

        let mut print_settings = KeywordRouter::from_groups(&[
            (CommandAction::SetLayout, LAYOUT_KEYWORDS),
            (CommandAction::SetPaperSize, PAPER_SIZE_KEYWORDS),
            (CommandAction::SetColorMode, COLOR_MODE_KEYWORDS),
            (CommandAction::SetCopies, COPIES_KEYWORDS),
            (CommandAction::SetDuplex, DUPLEX_KEYWORDS),
            (CommandAction::SetQuality, QUALITY_KEYWORDS),
            (CommandAction::SetPageRange, PAGE_RANGE_KEYWORDS),
            (CommandAction::SetPagesPerSheet, PAGES_PER_SHEET_KEYWORDS),
            (CommandAction::SetMargins, MARGIN_KEYWORDS),
        ])?;
        print_settings.add_pattern(
            &format!(r"\b(?P<n>{NUMBER_WORDS})\s+(?:copies|copy)\b"),
            CommandAction::SetCopies,
        )?;
        print_settings.add_pattern(
            &format!(r"\b(?P<n>{NUMBER_WORDS})\s+(?:pages?\s+)?(?:per|on\s+(?:a|one|each))\s+(?:sheet|page)\b"),
            CommandAction::SetPagesPerSheet,
        )?;
        print_settings.add_pattern(
            r"\bpages?\s+(?P<from>\d+)\s*(?:-|to|through|thru)\s*(?P<to>\d+)\b",
            CommandAction::SetPageRange,
        )?;

        let mut scan_settings = KeywordRouter::from_groups(&[
            (CommandAction::SetResolution, RESOLUTION_KEYWORDS),
            (CommandAction::SetColorMode, COLOR_MODE_KEYWORDS),
            (CommandAction::SetScanFormat, FORMAT_KEYWORDS),
            (CommandAction::SetPaperSize, PAPER_SIZE_KEYWORDS),
            (CommandAction::SetDuplex, DUPLEX_KEYWORDS),
        ])?;
        scan_settings.add_pattern(
            r"\b(?P<dpi>\d+)\s*(?:dpi|dots\s+per\s+inch)\b",
            CommandAction::SetResolution,
        )?;

        debug!(
            print_phrases = print_settings.phrase_count(),
            scan_phrases = scan_settings.phrase_count(),
            "intent parser built"
        );

        Ok(Self {
            mode,
            source,
            workflow,
            execute,
            documents,
            print_settings,
            scan_settings,
            selection: SelectionParser::new()?,
        })
    }

    /// Parse without workflow context.  No validation is attached, every
    /// stage that does not need context runs, and mode switches come out as
    /// open-mode commands.
    pub fn parse_command(&self, text: &str) -> Option<ParsedCommand> {
        self.run_stages(text, None)
    }

    /// Parse against the current workflow position and attach the state
    /// machine's verdict.
    pub fn parse_command_with_state(&self, text: &str, state: &ParserState) -> Option<ParsedCommand> {
        let command = self.run_stages(text, Some(state))?;
        let validation = validate_command(state, command.action, &command.params);
        if !validation.valid {
            debug!(action = ?command.action, reason = ?validation.reason, "command rejected by state");
        }
        Some(command.with_validation(validation))
    }

    /// The document-selection grammar on its own.
    pub fn parse_selection(&self, text: &str, total_documents: usize) -> Option<SelectionCommand> {
        self.selection.parse(text, total_documents)
    }

    fn run_stages(&self, text: &str, state: Option<&ParserState>) -> Option<ParsedCommand> {
        let utterance = Utterance::new(text);
        if utterance.lower.is_empty() {
            return None;
        }

        let mut best: Option<ParsedCommand> = None;
        for stage in STAGES {
            if !(stage.applies)(state) {
                continue;
            }
            let Some(candidate) = (stage.build)(self, &utterance, state) else {
                continue;
            };
            debug!(
                stage = stage.name,
                action = ?candidate.action,
                confidence = candidate.confidence,
                "stage candidate"
            );

            let stop = stage.short_circuit && candidate.confidence >= MEDIUM_CONFIDENCE;
            if best.as_ref().is_none_or(|b| candidate.confidence > b.confidence) {
                best = Some(candidate);
            }
            if stop {
                break;
            }
        }

        match &best {
            Some(cmd) => info!(action = ?cmd.action, confidence = cmd.confidence, "command parsed"),
            None => debug!(text = %utterance.lower, "no command matched"),
        }
        best
    }

    // -- Stage 1: mode switch -----------------------------------------------

    fn mode_switch(&self, utt: &Utterance<'_>, state: Option<&ParserState>) -> Option<ParsedCommand> {
        let current = state.and_then(ParserState::mode);

        let (target, matched_chars, hits) = match self.mode.route(&utt.lower) {
            // Asking for the workflow that is already running is not a switch.
            Some(route) if Some(route.group) == current => return None,
            Some(route) => (route.group, route_chars(&route), route.matched.len()),
            None => bare_mode_word(&utt.lower, current)?,
        };

        let confidence = keyword_confidence(
            matched_chars + utt.polite_chars,
            utt.chars,
            hits + usize::from(utt.polite),
        );
        let action = match (state.map(|s| s.app_state), target) {
            (Some(AppState::PrintWorkflow | AppState::ScanWorkflow), _) => {
                CommandAction::RequestModeSwitch
            }
            (_, WorkflowMode::Print) => CommandAction::OpenPrintMode,
            (_, WorkflowMode::Scan) => CommandAction::OpenScanMode,
        };

        Some(
            utt.command(action, confidence)
                .with_param(param::TARGET, target.label())
                .with_param(param::HAS_SORRY, utt.polite),
        )
    }

    // -- Stage 2: scan source -----------------------------------------------

    fn scan_source(&self, utt: &Utterance<'_>, _state: Option<&ParserState>) -> Option<ParsedCommand> {
        let route = self.source.route(&utt.lower)?;
        Some(
            utt.command(CommandAction::SelectScanSource, route.confidence)
                .with_param(param::SOURCE, route.group.label()),
        )
    }

    // -- Stage 3: document-selection grammar --------------------------------

    fn selection(&self, utt: &Utterance<'_>, state: Option<&ParserState>) -> Option<ParsedCommand> {
        let total = state.map_or(0, |s| s.total_documents);
        let sel = self.selection.parse(&utt.lower, total)?;

        let command = match sel.kind {
            SelectionKind::Clear => utt.command(CommandAction::ClearSelection, sel.confidence),
            SelectionKind::SelectAll => utt
                .command(CommandAction::SelectAll, sel.confidence)
                .with_param(param::INDICES, sel.indices)
                .with_param(param::EXCLUDED, sel.excluded),
            SelectionKind::Select if sel.indices.len() == 1 && !sel.is_range => utt
                .command(CommandAction::SelectDocument, sel.confidence)
                .with_param(param::INDEX, sel.indices[0]),
            SelectionKind::Select => utt
                .command(CommandAction::SelectMultipleDocuments, sel.confidence)
                .with_param(param::INDICES, sel.indices)
                .with_param(param::IS_RANGE, sel.is_range),
            SelectionKind::Deselect => utt
                .command(CommandAction::DeselectDocument, sel.confidence)
                .with_param(param::INDICES, sel.indices)
                .with_param(param::IS_RANGE, sel.is_range),
            SelectionKind::Toggle => utt
                .command(CommandAction::ToggleSelection, sel.confidence)
                .with_param(param::INDICES, sel.indices),
        };
        Some(command)
    }

    // -- Stage 4: workflow commands -----------------------------------------

    fn workflow(&self, utt: &Utterance<'_>, state: Option<&ParserState>) -> Option<ParsedCommand> {
        if is_exact_phrase(&utt.lower, CONFIRM_PHRASES) {
            return Some(utt.command(CommandAction::Confirm, EXACT_CONFIRM_CONFIDENCE));
        }

        let general = self
            .workflow
            .route(&utt.lower)
            .map(|route| utt.command(route.group, route.confidence));

        // Execute phrases only count for the workflow that is running.
        let execute = self
            .execute
            .route_all(&utt.lower)
            .into_iter()
            .find(|route| state.is_none_or(|s| s.mode() == Some(route.group)))
            .map(|route| {
                utt.command(CommandAction::Execute, route.confidence)
                    .with_param(param::TARGET, route.group.label())
            });

        match (general, execute) {
            (Some(g), Some(e)) if e.confidence > g.confidence => Some(e),
            (Some(g), _) => Some(g),
            (None, e) => e,
        }
    }

    // -- Stage 5: basic document commands -----------------------------------

    fn documents(&self, utt: &Utterance<'_>, state: Option<&ParserState>) -> Option<ParsedCommand> {
        let route = self.documents.route(&utt.lower)?;
        let command = match route.group {
            // Fixed scores only for the bare phrase.
            CommandAction::SelectAll => {
                let confidence = if is_exact_phrase(&utt.lower, SELECT_ALL_PHRASES) {
                    EXACT_SELECT_ALL_CONFIDENCE
                } else {
                    route.confidence
                };
                utt.command(CommandAction::SelectAll, confidence)
            }
            CommandAction::ClearSelection => {
                let confidence = if is_exact_phrase(&utt.lower, CLEAR_SELECTION_PHRASES) {
                    EXACT_CLEAR_CONFIDENCE
                } else {
                    route.confidence
                };
                utt.command(CommandAction::ClearSelection, confidence)
            }
            action @ (CommandAction::SelectDocument | CommandAction::DeselectDocument) => {
                let command = utt.command(action, route.confidence);
                match spoken_index(&utt.lower, state) {
                    Some(index) if action == CommandAction::SelectDocument => {
                        command.with_param(param::INDEX, index)
                    }
                    Some(index) => command.with_param(param::INDICES, vec![index]),
                    None => command,
                }
            }
            CommandAction::SwitchSection => {
                let (_, section) = SECTION_NAMES
                    .iter()
                    .find(|(name, _)| contains_phrase(&utt.lower, name))?;
                utt.command(CommandAction::SwitchSection, route.confidence)
                    .with_param(param::SECTION, *section)
            }
            action => utt.command(action, route.confidence),
        };
        Some(command)
    }

    // -- Stage 6: settings --------------------------------------------------

    fn settings(&self, utt: &Utterance<'_>, state: Option<&ParserState>) -> Option<ParsedCommand> {
        let routers: Vec<&KeywordRouter<CommandAction>> = match state.and_then(ParserState::mode) {
            Some(WorkflowMode::Print) => vec![&self.print_settings],
            Some(WorkflowMode::Scan) => vec![&self.scan_settings],
            None => vec![&self.print_settings, &self.scan_settings],
        };

        let route = routers
            .into_iter()
            .filter_map(|router| router.route(&utt.lower))
            .fold(None, |best: Option<RouteMatch<CommandAction>>, route| match best {
                Some(b) if b.confidence >= route.confidence => Some(b),
                _ => Some(route),
            })?;

        let command = utt.command(route.group, route.confidence);
        Some(match setting_value(route.group, &utt.lower, &route) {
            Some(value) => command.with_param(param::VALUE, value),
            None => command,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn route_chars<G>(route: &RouteMatch<G>) -> usize {
    route.matched.iter().map(|m| m.chars().count()).sum()
}

/// Single-word fallback for mode switching.  A bare word only counts when it
/// names a workflow other than the running one.
fn bare_mode_word(lower: &str, current: Option<WorkflowMode>) -> Option<(WorkflowMode, usize, usize)> {
    [
        (WorkflowMode::Print, BARE_PRINT_WORDS),
        (WorkflowMode::Scan, BARE_SCAN_WORDS),
    ]
    .into_iter()
    .filter(|(mode, _)| Some(*mode) != current)
    .find_map(|(mode, words)| first_phrase(lower, words).map(|w| (mode, w.chars().count(), 1)))
}

/// The 0-based document index spoken in `lower`.  `last` needs the
/// document count to resolve.
fn spoken_index(lower: &str, state: Option<&ParserState>) -> Option<usize> {
    match extract_number(lower)? {
        LAST_SENTINEL => state
            .map(|s| s.total_documents)
            .filter(|total| *total > 0)
            .map(|total| total - 1),
        n => usize::try_from(n).ok().filter(|n| *n >= 1).map(|n| n - 1),
    }
}

fn lookup<V: Copy>(lower: &str, table: &[(&str, V)]) -> Option<V> {
    table
        .iter()
        .find(|(phrase, _)| contains_phrase(lower, phrase))
        .map(|(_, v)| *v)
}

/// A positive spoken number, ignoring the `last` sentinel.
fn spoken_count(lower: &str) -> Option<i64> {
    extract_number(lower).filter(|n| *n > 0)
}

/// Canonical value for a settings command, if one was spoken.
fn setting_value(action: CommandAction, lower: &str, route: &RouteMatch<CommandAction>) -> Option<ParamValue> {
    let captured = |name: &str| route.captures.get(name).map(String::as_str);
    let value: ParamValue = match action {
        CommandAction::SetLayout => lookup(lower, LAYOUT_VALUES)?.into(),
        CommandAction::SetPaperSize => lookup(lower, PAPER_SIZE_VALUES)?.into(),
        CommandAction::SetColorMode => lookup(lower, COLOR_MODE_VALUES)?.into(),
        CommandAction::SetQuality => lookup(lower, QUALITY_VALUES)?.into(),
        CommandAction::SetMargins => lookup(lower, MARGIN_VALUES)?.into(),
        CommandAction::SetScanFormat => lookup(lower, FORMAT_VALUES)?.into(),
        CommandAction::SetDuplex => lookup(lower, DUPLEX_VALUES)?.into(),
        CommandAction::SetCopies | CommandAction::SetPagesPerSheet => captured("n")
            .and_then(parse_number_token)
            .or_else(|| spoken_count(lower))?
            .into(),
        CommandAction::SetResolution => match captured("dpi").and_then(|d| d.parse::<i64>().ok()) {
            Some(dpi) => dpi.into(),
            None => match lookup(lower, RESOLUTION_PRESETS) {
                Some(dpi) => i64::from(dpi).into(),
                None => spoken_count(lower)?.into(),
            },
        },
        CommandAction::SetPageRange => {
            if let (Some(from), Some(to)) = (captured("from"), captured("to")) {
                format!("{from}-{to}").into()
            } else if contains_phrase(lower, "odd") {
                "odd".into()
            } else if contains_phrase(lower, "even") {
                "even".into()
            } else if contains_phrase(lower, "all pages") {
                "all".into()
            } else {
                spoken_count(lower)?.to_string().into()
            }
        }
        _ => return None,
    };
    Some(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
