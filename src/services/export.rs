//! Conversation Export
//!
//! Writes the conversation log as plain text, JSON, CSV or PDF.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rgb};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::ensure_parent_dir;
use yoga_gpt_core::{ConversationTurn, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Json,
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(AppError::validation(format!(
                "Unknown export format '{}'. Use txt, json, csv or pdf",
                other
            ))),
        }
    }
}

/// One row of the JSON export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedMessage {
    pub role: String,
    pub message: String,
}

/// `You: ...` / `Yoga GPT: ...` blocks separated by a blank line.
pub fn to_text(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role.display_name(), t.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn to_json(turns: &[ConversationTurn]) -> AppResult<String> {
    let rows: Vec<ExportedMessage> = turns
        .iter()
        .map(|t| ExportedMessage {
            role: t.role.as_str().to_string(),
            message: t.content.clone(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&rows)?)
}

/// Read back a JSON export.
pub fn from_json(json: &str) -> AppResult<Vec<ConversationTurn>> {
    let rows: Vec<ExportedMessage> = serde_json::from_str(json)?;
    rows.into_iter()
        .map(|row| Ok(ConversationTurn::new(row.role.parse::<Role>()?, row.message)))
        .collect()
}

fn csv_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// `role,message` with RFC 4180 quoting and CRLF record ends.
pub fn to_csv(turns: &[ConversationTurn]) -> String {
    let mut out = String::from("role,message\r\n");
    for turn in turns {
        out.push_str(turn.role.as_str());
        out.push(',');
        out.push_str(&csv_field(&turn.content));
        out.push_str("\r\n");
    }
    out
}

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*#{1,6}\s+(.*)$").expect("valid heading regex"))
}

fn bullet_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)[-*]\s+(.*)$").expect("valid bullet regex"))
}

fn bold_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"))
}

/// A markdown line reduced to plain text for the PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanLine {
    pub text: String,
    pub bold: bool,
}

/// Headings become bold lines, `-` and `*` bullets become `•`, and inline
/// `**bold**` markers are dropped.
pub fn clean_markdown(text: &str) -> Vec<CleanLine> {
    text.lines()
        .map(|line| {
            if let Some(caps) = heading_re().captures(line) {
                return CleanLine {
                    text: bold_re().replace_all(&caps[1], "$1").trim().to_string(),
                    bold: true,
                };
            }
            let line = match bullet_re().captures(line) {
                Some(caps) => format!("{}• {}", &caps[1], &caps[2]),
                None => line.to_string(),
            };
            CleanLine {
                text: bold_re().replace_all(&line, "$1").trim_end().to_string(),
                bold: false,
            }
        })
        .collect()
}

/// Greedy word wrap at `width` characters. Words longer than a line are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Restrict `text` to Latin-1 so the builtin PDF fonts can encode it.
/// Common typographic marks get ASCII stand-ins and anything else becomes `?`.
fn pdf_safe(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            ' '..='~' | '\u{a0}'..='\u{ff}' => out.push(c),
            '\u{2022}' | '\u{2013}' | '\u{2014}' | '\u{2212}' => out.push('-'),
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201c}' | '\u{201d}' => out.push('"'),
            '\u{2026}' => out.push_str("..."),
            '\t' => out.push(' '),
            c if c.is_control() => {}
            _ => out.push('?'),
        }
    }
    out
}

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 20.0;
const ASSISTANT_INDENT_MM: f32 = 8.0;

struct TurnStyle {
    size_pt: f32,
    line_mm: f32,
    indent_mm: f32,
    wrap_chars: usize,
    color: Rgb,
}

fn turn_style(role: Role) -> TurnStyle {
    match role {
        Role::User => TurnStyle {
            size_pt: 12.0,
            line_mm: 6.0,
            indent_mm: 0.0,
            wrap_chars: 85,
            color: Rgb::new(0.0, 0.0, 0.0, None),
        },
        Role::Assistant => TurnStyle {
            size_pt: 11.0,
            line_mm: 5.5,
            indent_mm: ASSISTANT_INDENT_MM,
            wrap_chars: 88,
            color: Rgb::new(0.0, 0.0, 0.55, None),
        },
    }
}

struct PdfCursor {
    doc: printpdf::PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
}

impl PdfCursor {
    fn ensure_room(&mut self, line_mm: f32) {
        if self.y - line_mm < MARGIN_MM {
            let (page, layer) =
                self.doc
                    .add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = PAGE_HEIGHT_MM - MARGIN_MM;
        }
    }

    fn write_line(&mut self, text: &str, style: &TurnStyle, font: &IndirectFontRef) {
        self.ensure_room(style.line_mm);
        self.y -= style.line_mm;
        self.layer.set_fill_color(Color::Rgb(style.color.clone()));
        self.layer.use_text(
            pdf_safe(text),
            style.size_pt,
            Mm(MARGIN_MM + style.indent_mm),
            Mm(self.y),
            font,
        );
    }
}

/// A4 PDF with user turns in black and assistant turns indented in dark blue.
pub fn to_pdf(turns: &[ConversationTurn]) -> AppResult<Vec<u8>> {
    let pdf_err = |e: printpdf::Error| AppError::internal(format!("PDF export failed: {}", e));

    let (doc, page, layer) = PdfDocument::new(
        "Yoga GPT Conversation",
        Mm(PAGE_WIDTH_MM),
        Mm(PAGE_HEIGHT_MM),
        "Layer 1",
    );
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(pdf_err)?;

    let layer = doc.get_page(page).get_layer(layer);
    let mut cursor = PdfCursor {
        doc,
        layer,
        y: PAGE_HEIGHT_MM - MARGIN_MM,
    };

    for turn in turns {
        let style = turn_style(turn.role);
        cursor.write_line(&format!("{}:", turn.role.display_name()), &style, &bold);
        for line in clean_markdown(&turn.content) {
            let font = if line.bold { &bold } else { &regular };
            for wrapped in wrap(&line.text, style.wrap_chars) {
                cursor.write_line(&wrapped, &style, font);
            }
        }
        cursor.y -= style.line_mm;
    }

    cursor.doc.save_to_bytes().map_err(pdf_err)
}

/// Write `turns` to `path` in `format`, creating parent directories.
pub fn export_to_file(turns: &[ConversationTurn], format: ExportFormat, path: &Path) -> AppResult<()> {
    ensure_parent_dir(path)?;
    let bytes = match format {
        ExportFormat::Text => to_text(turns).into_bytes(),
        ExportFormat::Json => to_json(turns)?.into_bytes(),
        ExportFormat::Csv => to_csv(turns).into_bytes(),
        ExportFormat::Pdf => to_pdf(turns)?,
    };
    std::fs::write(path, bytes)?;
    info!(path = %path.display(), format = %format, turns = turns.len(), "conversation exported");
    Ok(())
}
