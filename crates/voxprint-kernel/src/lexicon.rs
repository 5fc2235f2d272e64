//! Static phrase tables.
//!
//! Every word the engine reacts to lives here.  The tables are plain data:
//! phrase lists keyed by what they mean, word-number mappings, canonical
//! setting values, and the confidence constants the parser scores against.
//! Adding a synonym is a one-line edit in this file.
//!
//! All phrases are lowercase.  Multi-word phrases are matched as a unit on
//! word boundaries.

// ---------------------------------------------------------------------------
// Confidence thresholds
// ---------------------------------------------------------------------------

/// Score above which a match is considered unambiguous.
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// Score at which a mode-switch or workflow command short-circuits parsing.
pub const MEDIUM_CONFIDENCE: f64 = 0.6;

/// Score used for weak structural fallbacks.
pub const LOW_CONFIDENCE: f64 = 0.4;

/// Fixed confidence for an utterance that is exactly a confirm phrase.
pub const EXACT_CONFIRM_CONFIDENCE: f64 = 0.95;

/// Fixed confidence for an explicit "select all" phrase.
pub const EXACT_SELECT_ALL_CONFIDENCE: f64 = 0.95;

/// Fixed confidence for an explicit "clear selection" phrase.
pub const EXACT_CLEAR_CONFIDENCE: f64 = 0.9;

/// Weight of the character-coverage term in keyword scoring.
pub const COVERAGE_WEIGHT: f64 = 0.6;

/// Weight of the match-count term in keyword scoring.
pub const MATCH_COUNT_WEIGHT: f64 = 0.4;

/// Number of keyword hits at which the match-count term saturates.
pub const MATCH_COUNT_SATURATION: f64 = 2.0;

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

/// Sentinel returned for "last" by number extraction.
pub const LAST_SENTINEL: i64 = -1;

/// Spoken numbers in lookup order.  Cardinals come first, then ordinals,
/// then the `last` sentinel.
pub const WORD_NUMBERS: &[(&str, i64)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("last", LAST_SENTINEL),
];

// ---------------------------------------------------------------------------
// Mode switching
// ---------------------------------------------------------------------------

/// Words that must accompany a switch between two running workflows.
pub const POLITENESS_MARKERS: &[&str] = &["sorry", "apologies", "excuse me", "pardon"];

pub const PRINT_MODE_PHRASES: &[&str] = &[
    "print mode",
    "printing mode",
    "switch to print",
    "switch to printing",
    "go to print",
    "open print",
    "start printing",
    "i want to print",
    "print something",
    "print a document",
    "print documents",
];

pub const SCAN_MODE_PHRASES: &[&str] = &[
    "scan mode",
    "scanning mode",
    "switch to scan",
    "switch to scanning",
    "go to scan",
    "open scan",
    "start scanning",
    "i want to scan",
    "scan something",
    "scan a document",
    "scan documents",
];

/// Single words that name the print workflow.
pub const BARE_PRINT_WORDS: &[&str] = &["print", "printing", "printer"];

/// Single words that name the scan workflow.
pub const BARE_SCAN_WORDS: &[&str] = &["scan", "scanning", "scanner"];

// ---------------------------------------------------------------------------
// Scan source
// ---------------------------------------------------------------------------

pub const SOURCE_SELECT_PHRASES: &[&str] = &[
    "select",
    "choose",
    "pick",
    "existing",
    "existing files",
    "from files",
    "from my files",
    "from device",
    "browse",
    "documents",
];

pub const SOURCE_FEED_PHRASES: &[&str] = &[
    "feed",
    "feeder",
    "document feeder",
    "adf",
    "tray",
    "paper tray",
    "load paper",
    "put in",
    "physical",
];

// ---------------------------------------------------------------------------
// Workflow commands
// ---------------------------------------------------------------------------

pub const CONFIRM_PHRASES: &[&str] = &[
    "confirm",
    "yes",
    "yeah",
    "yep",
    "ok",
    "okay",
    "sure",
    "correct",
    "looks good",
    "sounds good",
    "go ahead",
    "do it",
    "that's right",
];

pub const CANCEL_PHRASES: &[&str] = &[
    "cancel",
    "stop",
    "abort",
    "quit",
    "exit",
    "never mind",
    "nevermind",
    "forget it",
];

pub const STATUS_PHRASES: &[&str] = &[
    "status",
    "where am i",
    "what step",
    "what's happening",
    "progress",
    "what is selected",
    "what's selected",
];

pub const HELP_PHRASES: &[&str] = &[
    "help",
    "what can i say",
    "what can i do",
    "commands",
    "options",
    "how does this work",
];

pub const FEED_PHRASES: &[&str] = &[
    "feed",
    "feed documents",
    "feed the documents",
    "feed pages",
    "load pages",
    "pull in",
];

pub const SCROLL_UP_PHRASES: &[&str] = &["scroll up", "page up", "up"];

pub const SCROLL_DOWN_PHRASES: &[&str] = &["scroll down", "page down", "down", "scroll"];

pub const NEXT_STEP_PHRASES: &[&str] = &[
    "next",
    "next step",
    "continue",
    "proceed",
    "move on",
    "forward",
];

pub const PREVIOUS_STEP_PHRASES: &[&str] = &[
    "back",
    "go back",
    "previous step",
    "step back",
    "return",
];

pub const RESET_PHRASES: &[&str] = &["start over", "reset", "restart", "from scratch"];

pub const EXECUTE_PRINT_PHRASES: &[&str] = &[
    "print",
    "print it",
    "print now",
    "print them",
    "start printing",
    "send to printer",
    "execute",
    "run it",
];

pub const EXECUTE_SCAN_PHRASES: &[&str] = &[
    "scan",
    "scan it",
    "scan now",
    "start scanning",
    "start the scan",
    "execute",
    "run it",
];

// ---------------------------------------------------------------------------
// Document commands
// ---------------------------------------------------------------------------

pub const SELECT_DOCUMENT_PHRASES: &[&str] = &[
    "select",
    "select document",
    "select file",
    "choose",
    "pick",
    "open document",
    "check",
    "mark",
];

pub const DESELECT_DOCUMENT_PHRASES: &[&str] = &[
    "deselect",
    "unselect",
    "uncheck",
    "unmark",
    "remove document",
];

pub const SELECT_ALL_PHRASES: &[&str] = &[
    "select all",
    "select everything",
    "choose all",
    "all documents",
    "all of them",
];

pub const CLEAR_SELECTION_PHRASES: &[&str] = &[
    "clear selection",
    "clear all",
    "deselect all",
    "unselect all",
    "select none",
];

pub const NEXT_DOCUMENT_PHRASES: &[&str] = &[
    "next document",
    "next file",
    "next one",
    "next page",
];

pub const PREVIOUS_DOCUMENT_PHRASES: &[&str] = &[
    "previous document",
    "previous file",
    "previous one",
    "last one",
    "previous page",
];

pub const UPLOAD_PHRASES: &[&str] = &[
    "upload",
    "upload a file",
    "upload document",
    "add a file",
    "add document",
    "import",
];

pub const SWITCH_SECTION_PHRASES: &[&str] = &[
    "show",
    "go to",
    "switch to",
    "open",
    "section",
    "tab",
];

/// Spoken section names and the canonical section they select.
pub const SECTION_NAMES: &[(&str, &str)] = &[
    ("recent", "recent"),
    ("recents", "recent"),
    ("uploads", "uploaded"),
    ("uploaded", "uploaded"),
    ("scanned", "scanned"),
    ("scans", "scanned"),
    ("favorites", "favorites"),
    ("favourites", "favorites"),
    ("shared", "shared"),
];

// ---------------------------------------------------------------------------
// Document-selection grammar
// ---------------------------------------------------------------------------

pub const SELECTION_CLEAR_WORDS: &[&str] = &["clear", "reset", "none"];

pub const SELECTION_CLEAR_PHRASES: &[&str] =
    &["deselect all", "unselect all", "remove all", "select none"];

pub const SELECTION_SELECT_WORDS: &[&str] = &[
    "select", "choose", "pick", "add", "include", "check", "mark", "want", "take",
];

pub const SELECTION_DESELECT_WORDS: &[&str] = &[
    "deselect", "unselect", "remove", "exclude", "drop", "uncheck", "unmark",
];

pub const SELECTION_ALL_WORDS: &[&str] = &["all", "everything", "every"];

pub const SELECTION_EXCEPT_WORDS: &[&str] = &["except", "excluding", "but not", "other than"];

/// Nouns stripped before list parsing.
pub const SELECTION_FILLER_WORDS: &[&str] = &[
    "documents", "document", "files", "file", "items", "item", "numbers", "number", "pages",
    "page",
];

/// Step words accepted in "every Nth document".  Plain ordinals and digits
/// are handled by number parsing; these are the extras.
pub const SELECTION_STEP_WORDS: &[(&str, i64)] = &[("other", 2), ("alternate", 2)];

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

pub const LAYOUT_KEYWORDS: &[&str] = &[
    "layout",
    "orientation",
    "landscape",
    "portrait",
    "horizontal",
    "vertical",
];

pub const LAYOUT_VALUES: &[(&str, &str)] = &[
    ("landscape", "landscape"),
    ("horizontal", "landscape"),
    ("portrait", "portrait"),
    ("vertical", "portrait"),
];

pub const PAPER_SIZE_KEYWORDS: &[&str] = &[
    "paper",
    "paper size",
    "size",
    "a3",
    "a4",
    "a5",
    "letter",
    "legal",
    "tabloid",
];

pub const PAPER_SIZE_VALUES: &[(&str, &str)] = &[
    ("a3", "a3"),
    ("a4", "a4"),
    ("a5", "a5"),
    ("letter", "letter"),
    ("legal", "legal"),
    ("tabloid", "tabloid"),
];

pub const COLOR_MODE_KEYWORDS: &[&str] = &[
    "color",
    "colour",
    "color mode",
    "full color",
    "grayscale",
    "greyscale",
    "gray",
    "grey",
    "black and white",
    "b&w",
    "bw",
    "monochrome",
];

/// Checked in order: the black-and-white phrases must win over "color".
pub const COLOR_MODE_VALUES: &[(&str, &str)] = &[
    ("black and white", "bw"),
    ("b&w", "bw"),
    ("bw", "bw"),
    ("monochrome", "bw"),
    ("grayscale", "grayscale"),
    ("greyscale", "grayscale"),
    ("gray", "grayscale"),
    ("grey", "grayscale"),
    ("color", "color"),
    ("colour", "color"),
];

pub const COPIES_KEYWORDS: &[&str] = &["copies", "copy"];

pub const DUPLEX_KEYWORDS: &[&str] = &[
    "duplex",
    "double sided",
    "double-sided",
    "two sided",
    "two-sided",
    "both sides",
    "single sided",
    "single-sided",
    "one sided",
    "one-sided",
    "simplex",
];

/// Checked in order: single-sided phrases first.
pub const DUPLEX_VALUES: &[(&str, bool)] = &[
    ("single sided", false),
    ("single-sided", false),
    ("one sided", false),
    ("one-sided", false),
    ("simplex", false),
    ("double sided", true),
    ("double-sided", true),
    ("two sided", true),
    ("two-sided", true),
    ("both sides", true),
    ("duplex", true),
];

pub const QUALITY_KEYWORDS: &[&str] = &[
    "quality",
    "draft",
    "high quality",
    "best quality",
    "normal quality",
    "standard quality",
];

pub const QUALITY_VALUES: &[(&str, &str)] = &[
    ("draft", "draft"),
    ("low", "draft"),
    ("normal", "normal"),
    ("standard", "normal"),
    ("high", "high"),
    ("best", "high"),
];

pub const PAGE_RANGE_KEYWORDS: &[&str] = &[
    "pages",
    "page range",
    "all pages",
    "odd pages",
    "even pages",
    "only page",
];

pub const PAGES_PER_SHEET_KEYWORDS: &[&str] = &[
    "per sheet",
    "pages per sheet",
    "per page",
    "pages per page",
    "n-up",
];

pub const MARGIN_KEYWORDS: &[&str] = &["margin", "margins"];

pub const MARGIN_VALUES: &[(&str, &str)] = &[
    ("no", "none"),
    ("none", "none"),
    ("narrow", "narrow"),
    ("small", "narrow"),
    ("normal", "normal"),
    ("default", "normal"),
    ("wide", "wide"),
    ("large", "wide"),
];

pub const RESOLUTION_KEYWORDS: &[&str] = &["resolution", "dpi", "dots per inch"];

pub const RESOLUTION_PRESETS: &[(&str, u32)] = &[
    ("low", 150),
    ("medium", 300),
    ("standard", 300),
    ("normal", 300),
    ("high", 600),
    ("maximum", 1200),
    ("max", 1200),
];

pub const FORMAT_KEYWORDS: &[&str] = &[
    "format",
    "file type",
    "save as",
    "pdf",
    "jpeg",
    "jpg",
    "png",
    "tiff",
];

pub const FORMAT_VALUES: &[(&str, &str)] = &[
    ("pdf", "pdf"),
    ("jpeg", "jpeg"),
    ("jpg", "jpeg"),
    ("png", "png"),
    ("tiff", "tiff"),
    ("tif", "tiff"),
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
