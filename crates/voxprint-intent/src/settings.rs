//! Print and scan settings.
//!
//! Settings are free-form payload next to the state machine: a partial
//! record per workflow, where every field is optional and unset means "use
//! the device default".  [`Settings`] tags the record with its workflow so a
//! print field can never be written into a scan job.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::command::{CommandAction, ParsedCommand, param};
use crate::context::WorkflowMode;
use crate::error::{IntentError, Result};

/// Legal copy counts.
pub const COPIES_RANGE: RangeInclusive<u32> = 1..=99;

/// Legal pages-per-sheet values.
pub const PAGES_PER_SHEET_VALUES: &[u32] = &[1, 2, 4, 6, 9, 16];

/// Legal scan resolutions in dpi.
pub const RESOLUTION_VALUES: &[u32] = &[75, 150, 200, 300, 600, 1200];

// ---------------------------------------------------------------------------
// Field values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Portrait,
    Landscape,
}

impl Layout {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "portrait" => Some(Self::Portrait),
            "landscape" => Some(Self::Landscape),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Portrait => "portrait",
            Self::Landscape => "landscape",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl PaperSize {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "a3" => Some(Self::A3),
            "a4" => Some(Self::A4),
            "a5" => Some(Self::A5),
            "letter" => Some(Self::Letter),
            "legal" => Some(Self::Legal),
            "tabloid" => Some(Self::Tabloid),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::A3 => "A3",
            Self::A4 => "A4",
            Self::A5 => "A5",
            Self::Letter => "letter",
            Self::Legal => "legal",
            Self::Tabloid => "tabloid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    Color,
    Grayscale,
    Bw,
}

impl ColorMode {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "color" => Some(Self::Color),
            "grayscale" => Some(Self::Grayscale),
            "bw" => Some(Self::Bw),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::Grayscale => "grayscale",
            Self::Bw => "black and white",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintQuality {
    Draft,
    Normal,
    High,
}

impl PrintQuality {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "normal" => Some(Self::Normal),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Normal => "normal",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Margins {
    None,
    Narrow,
    Normal,
    Wide,
}

impl Margins {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "narrow" => Some(Self::Narrow),
            "normal" => Some(Self::Normal),
            "wide" => Some(Self::Wide),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Narrow => "narrow",
            Self::Normal => "normal",
            Self::Wide => "wide",
        }
    }
}

/// Which pages of each document to print.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageRange {
    All,
    Odd,
    Even,
    /// Comma-separated 1-based pages and ranges, e.g. `1-3,5`.
    Custom(String),
}

impl PageRange {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "odd" => Some(Self::Odd),
            "even" => Some(Self::Even),
            custom if is_page_list(custom) => Some(Self::Custom(custom.to_string())),
            _ => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::All => "all".into(),
            Self::Odd => "odd pages".into(),
            Self::Even => "even pages".into(),
            Self::Custom(pages) => pages.clone(),
        }
    }
}

/// `1-3,5` style lists: positive pages, ascending ranges.
fn is_page_list(value: &str) -> bool {
    !value.is_empty()
        && value.split(',').all(|part| {
            let mut bounds = part.splitn(2, '-').map(|b| b.trim().parse::<u32>());
            match (bounds.next(), bounds.next()) {
                (Some(Ok(a)), None) => a >= 1,
                (Some(Ok(a)), Some(Ok(b))) => a >= 1 && a <= b,
                _ => false,
            }
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanFormat {
    Pdf,
    Jpeg,
    Png,
    Tiff,
}

impl ScanFormat {
    pub fn from_value(value: &str) -> Option<Self> {
        match value {
            "pdf" => Some(Self::Pdf),
            "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Tiff => "TIFF",
        }
    }
}

// ---------------------------------------------------------------------------
// Settings records
// ---------------------------------------------------------------------------

/// Print job configuration.  Unset fields use the printer default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrintSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_size: Option<PaperSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<ColorMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub copies: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplex: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<PrintQuality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_range: Option<PageRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages_per_sheet: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margins: Option<Margins>,
}

impl PrintSettings {
    fn merge(&mut self, patch: &PrintSettings) {
        merge_field(&mut self.layout, &patch.layout);
        merge_field(&mut self.paper_size, &patch.paper_size);
        merge_field(&mut self.color_mode, &patch.color_mode);
        merge_field(&mut self.copies, &patch.copies);
        merge_field(&mut self.duplex, &patch.duplex);
        merge_field(&mut self.quality, &patch.quality);
        merge_field(&mut self.page_range, &patch.page_range);
        merge_field(&mut self.pages_per_sheet, &patch.pages_per_sheet);
        merge_field(&mut self.margins, &patch.margins);
    }

    fn describe_fields(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if let Some(v) = self.layout {
            parts.push(v.label().to_string());
        }
        if let Some(v) = self.paper_size {
            parts.push(format!("{} paper", v.label()));
        }
        if let Some(v) = self.color_mode {
            parts.push(v.label().to_string());
        }
        if let Some(n) = self.copies {
            parts.push(plural(n, "copy", "copies"));
        }
        if let Some(d) = self.duplex {
            parts.push(if d { "double-sided" } else { "single-sided" }.to_string());
        }
        if let Some(v) = self.quality {
            parts.push(format!("{} quality", v.label()));
        }
        if let Some(v) = &self.page_range {
            parts.push(format!("pages {}", v.label()));
        }
        if let Some(n) = self.pages_per_sheet {
            parts.push(format!("{n} per sheet"));
        }
        if let Some(v) = self.margins {
            parts.push(format!("{} margins", v.label()));
        }
        parts
    }
}

/// Scan job configuration.  Unset fields use the scanner default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_mode: Option<ColorMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<ScanFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paper_size: Option<PaperSize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplex: Option<bool>,
}

impl ScanSettings {
    fn merge(&mut self, patch: &ScanSettings) {
        merge_field(&mut self.resolution, &patch.resolution);
        merge_field(&mut self.color_mode, &patch.color_mode);
        merge_field(&mut self.format, &patch.format);
        merge_field(&mut self.paper_size, &patch.paper_size);
        merge_field(&mut self.duplex, &patch.duplex);
    }

    fn describe_fields(&self) -> Vec<String> {
        let mut parts = Vec::new();
        if let Some(dpi) = self.resolution {
            parts.push(format!("{dpi} dpi"));
        }
        if let Some(v) = self.color_mode {
            parts.push(v.label().to_string());
        }
        if let Some(v) = self.format {
            parts.push(v.label().to_string());
        }
        if let Some(v) = self.paper_size {
            parts.push(format!("{} paper", v.label()));
        }
        if let Some(d) = self.duplex {
            parts.push(if d { "both sides" } else { "one side" }.to_string());
        }
        parts
    }
}

fn merge_field<T: Clone>(target: &mut Option<T>, patch: &Option<T>) {
    if let Some(v) = patch {
        *target = Some(v.clone());
    }
}

fn plural(n: u32, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {one}")
    } else {
        format!("{n} {many}")
    }
}

/// Settings for whichever workflow is running.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Settings {
    Print(PrintSettings),
    Scan(ScanSettings),
}

impl Settings {
    /// An empty record for `mode`.
    pub fn for_mode(mode: WorkflowMode) -> Self {
        match mode {
            WorkflowMode::Print => Self::Print(PrintSettings::default()),
            WorkflowMode::Scan => Self::Scan(ScanSettings::default()),
        }
    }

    pub fn mode(&self) -> WorkflowMode {
        match self {
            Self::Print(_) => WorkflowMode::Print,
            Self::Scan(_) => WorkflowMode::Scan,
        }
    }

    /// Copy every set field of `patch` onto `self`.  Patches for the other
    /// workflow are ignored.
    pub fn merge(&mut self, patch: &Settings) {
        match (self, patch) {
            (Self::Print(current), Self::Print(p)) => current.merge(p),
            (Self::Scan(current), Self::Scan(p)) => current.merge(p),
            _ => {}
        }
    }

    /// Short spoken summary, e.g. "landscape, A4 paper, 2 copies".
    pub fn summary(&self) -> String {
        let parts = match self {
            Self::Print(p) => p.describe_fields(),
            Self::Scan(s) => s.describe_fields(),
        };
        if parts.is_empty() {
            "default settings".to_string()
        } else {
            parts.join(", ")
        }
    }
}

// ---------------------------------------------------------------------------
// Setting changes
// ---------------------------------------------------------------------------

/// One validated field change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    Layout(Layout),
    PaperSize(PaperSize),
    ColorMode(ColorMode),
    Copies(u32),
    Duplex(bool),
    Quality(PrintQuality),
    PageRange(PageRange),
    PagesPerSheet(u32),
    Margins(Margins),
    Resolution(u32),
    Format(ScanFormat),
}

impl SettingChange {
    /// Read the change carried by a settings command.
    pub fn from_command(command: &ParsedCommand, mode: WorkflowMode) -> Result<Self> {
        let action = command.action;
        let missing = || IntentError::MissingParameter {
            action,
            param: param::VALUE,
        };
        let text = || command.text(param::VALUE).ok_or_else(missing);
        let number = || command.number(param::VALUE).ok_or_else(missing);

        match action {
            CommandAction::SetLayout => {
                let v = text()?;
                Layout::from_value(v)
                    .map(Self::Layout)
                    .ok_or_else(|| invalid("layout", v))
            }
            CommandAction::SetPaperSize => {
                let v = text()?;
                PaperSize::from_value(v)
                    .map(Self::PaperSize)
                    .ok_or_else(|| invalid("paper size", v))
            }
            CommandAction::SetColorMode => {
                let v = text()?;
                ColorMode::from_value(v)
                    .map(Self::ColorMode)
                    .ok_or_else(|| invalid("color mode", v))
            }
            CommandAction::SetQuality => {
                let v = text()?;
                PrintQuality::from_value(v)
                    .map(Self::Quality)
                    .ok_or_else(|| invalid("quality", v))
            }
            CommandAction::SetPageRange => {
                let v = text()?;
                PageRange::from_value(v)
                    .map(Self::PageRange)
                    .ok_or_else(|| invalid("page range", v))
            }
            CommandAction::SetMargins => {
                let v = text()?;
                Margins::from_value(v)
                    .map(Self::Margins)
                    .ok_or_else(|| invalid("margins", v))
            }
            CommandAction::SetScanFormat => {
                let v = text()?;
                ScanFormat::from_value(v)
                    .map(Self::Format)
                    .ok_or_else(|| invalid("format", v))
            }
            CommandAction::SetDuplex => command.flag(param::VALUE).map(Self::Duplex).ok_or_else(missing),
            CommandAction::SetCopies => {
                let n = number()?;
                u32::try_from(n)
                    .ok()
                    .filter(|n| COPIES_RANGE.contains(n))
                    .map(Self::Copies)
                    .ok_or_else(|| invalid("copies", &n.to_string()))
            }
            CommandAction::SetPagesPerSheet => {
                let n = number()?;
                u32::try_from(n)
                    .ok()
                    .filter(|n| PAGES_PER_SHEET_VALUES.contains(n))
                    .map(Self::PagesPerSheet)
                    .ok_or_else(|| invalid("pages per sheet", &n.to_string()))
            }
            CommandAction::SetResolution => {
                let n = number()?;
                u32::try_from(n)
                    .ok()
                    .filter(|n| RESOLUTION_VALUES.contains(n))
                    .map(Self::Resolution)
                    .ok_or_else(|| invalid("resolution", &n.to_string()))
            }
            other => Err(IntentError::UnsupportedSetting {
                action: other,
                mode,
            }),
        }
    }

    /// The command action that produces this change.
    pub fn action(&self) -> CommandAction {
        match self {
            Self::Layout(_) => CommandAction::SetLayout,
            Self::PaperSize(_) => CommandAction::SetPaperSize,
            Self::ColorMode(_) => CommandAction::SetColorMode,
            Self::Copies(_) => CommandAction::SetCopies,
            Self::Duplex(_) => CommandAction::SetDuplex,
            Self::Quality(_) => CommandAction::SetQuality,
            Self::PageRange(_) => CommandAction::SetPageRange,
            Self::PagesPerSheet(_) => CommandAction::SetPagesPerSheet,
            Self::Margins(_) => CommandAction::SetMargins,
            Self::Resolution(_) => CommandAction::SetResolution,
            Self::Format(_) => CommandAction::SetScanFormat,
        }
    }

    /// Spoken confirmation, e.g. "Layout: landscape."
    pub fn describe(&self) -> String {
        match self {
            Self::Layout(v) => format!("Layout: {}.", v.label()),
            Self::PaperSize(v) => format!("Paper size: {}.", v.label()),
            Self::ColorMode(v) => format!("Color: {}.", v.label()),
            Self::Copies(n) => format!("Copies: {n}."),
            Self::Duplex(d) => format!("Double-sided: {}.", if *d { "on" } else { "off" }),
            Self::Quality(v) => format!("Quality: {}.", v.label()),
            Self::PageRange(v) => format!("Pages: {}.", v.label()),
            Self::PagesPerSheet(n) => format!("Pages per sheet: {n}."),
            Self::Margins(v) => format!("Margins: {}.", v.label()),
            Self::Resolution(n) => format!("Resolution: {n} dpi."),
            Self::Format(v) => format!("Format: {}.", v.label()),
        }
    }

    /// The question asked when a settings command carried no value.
    pub fn prompt_for(action: CommandAction) -> &'static str {
        match action {
            CommandAction::SetLayout => "Which layout? Say portrait or landscape.",
            CommandAction::SetPaperSize => "Which paper size? For example A4 or letter.",
            CommandAction::SetColorMode => "Color, grayscale, or black and white?",
            CommandAction::SetCopies => "How many copies?",
            CommandAction::SetDuplex => "Single-sided or double-sided?",
            CommandAction::SetQuality => "Which quality? Draft, normal, or high.",
            CommandAction::SetPageRange => "Which pages? For example all pages or pages 1 to 3.",
            CommandAction::SetPagesPerSheet => "How many pages per sheet?",
            CommandAction::SetMargins => "Which margins? None, narrow, normal, or wide.",
            CommandAction::SetResolution => "Which resolution? For example 300 dpi.",
            CommandAction::SetScanFormat => "Which format? PDF, JPEG, PNG, or TIFF.",
            _ => "Which setting would you like to change?",
        }
    }
}

fn invalid(field: &'static str, value: &str) -> IntentError {
    IntentError::InvalidSettingValue {
        field,
        value: value.to_string(),
    }
}

/// The result of applying one change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsUpdate {
    /// Only the changed field, for the host's settings callback.
    pub patch: Settings,
    /// The full record after the change.
    pub settings: Settings,
    /// Spoken confirmation.
    pub message: String,
}

/// Apply `change` to the settings of `mode`.
///
/// `current` may belong to the other workflow (or be absent); it is then
/// replaced by an empty record for `mode` before the change lands.
pub fn apply_setting_change(
    current: Option<&Settings>,
    change: &SettingChange,
    mode: WorkflowMode,
) -> Result<SettingsUpdate> {
    let mut patch = Settings::for_mode(mode);
    match (&mut patch, change) {
        (Settings::Print(p), SettingChange::Layout(v)) => p.layout = Some(*v),
        (Settings::Print(p), SettingChange::PaperSize(v)) => p.paper_size = Some(*v),
        (Settings::Print(p), SettingChange::ColorMode(v)) => p.color_mode = Some(*v),
        (Settings::Print(p), SettingChange::Copies(n)) => p.copies = Some(*n),
        (Settings::Print(p), SettingChange::Duplex(d)) => p.duplex = Some(*d),
        (Settings::Print(p), SettingChange::Quality(v)) => p.quality = Some(*v),
        (Settings::Print(p), SettingChange::PageRange(v)) => p.page_range = Some(v.clone()),
        (Settings::Print(p), SettingChange::PagesPerSheet(n)) => p.pages_per_sheet = Some(*n),
        (Settings::Print(p), SettingChange::Margins(v)) => p.margins = Some(*v),
        (Settings::Scan(s), SettingChange::Resolution(n)) => s.resolution = Some(*n),
        (Settings::Scan(s), SettingChange::ColorMode(v)) => s.color_mode = Some(*v),
        (Settings::Scan(s), SettingChange::Format(v)) => s.format = Some(*v),
        (Settings::Scan(s), SettingChange::PaperSize(v)) => s.paper_size = Some(*v),
        (Settings::Scan(s), SettingChange::Duplex(d)) => s.duplex = Some(*d),
        (_, change) => {
            return Err(IntentError::UnsupportedSetting {
                action: change.action(),
                mode,
            });
        }
    }

    let mut settings = current
        .filter(|s| s.mode() == mode)
        .cloned()
        .unwrap_or_else(|| Settings::for_mode(mode));
    settings.merge(&patch);

    Ok(SettingsUpdate {
        patch,
        settings,
        message: change.describe(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
