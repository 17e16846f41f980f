use std::fmt;

use serde::Deserialize;

/// Text used wherever a block would otherwise render with no content.
pub const PADDING: &str = " ";

/// A 24-bit color, written as `RRGGBB` in config files and document XML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `RRGGBB`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Self(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value).ok_or_else(|| format!("invalid color `{value}`, expected RRGGBB"))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// Formatting accumulated while descending through inline markup.
///
/// Values are never mutated in place: each `with_*` call returns a new
/// context, and flags can only be switched on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Formatting {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    /// Monospace font with shading.
    pub code: bool,
    pub color: Option<Rgb>,
}

impl Formatting {
    pub fn with_bold(self) -> Self {
        Self { bold: true, ..self }
    }

    pub fn with_italic(self) -> Self {
        Self {
            italic: true,
            ..self
        }
    }

    pub fn with_underline(self) -> Self {
        Self {
            underline: true,
            ..self
        }
    }

    pub fn with_strike(self) -> Self {
        Self {
            strike: true,
            ..self
        }
    }

    pub fn with_code(self) -> Self {
        Self { code: true, ..self }
    }

    /// Hyperlink styling: colored, and underlined unless disabled.
    pub fn with_link(self, color: Rgb, underline: bool) -> Self {
        Self {
            underline: self.underline || underline,
            color: Some(color),
            ..self
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }
}

/// A contiguous span of inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Run {
    Text { text: String, formatting: Formatting },
    LineBreak,
}

impl Run {
    pub fn text(text: impl Into<String>, formatting: Formatting) -> Self {
        Run::Text {
            text: text.into(),
            formatting,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::text(text, Formatting::default())
    }

    /// The single-space run that keeps a block from being structurally empty.
    pub fn padding() -> Self {
        Self::plain(PADDING)
    }

    pub fn is_padding(&self) -> bool {
        matches!(self, Run::Text { text, formatting } if text == PADDING && formatting.is_plain())
    }

    /// Literal text of the run, with line breaks as `\n`.
    pub fn as_str(&self) -> &str {
        match self {
            Run::Text { text, .. } => text,
            Run::LineBreak => "\n",
        }
    }
}

/// Replace an empty run sequence with the padding run.
pub(crate) fn padded(mut runs: Vec<Run>) -> Vec<Run> {
    if runs.is_empty() {
        runs.push(Run::padding());
    }
    runs
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Ordered,
    Unordered,
}

/// One structural unit of the output document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading {
        level: u8,
        runs: Vec<Run>,
    },
    Paragraph {
        runs: Vec<Run>,
    },
    ListItem {
        runs: Vec<Run>,
        /// Zero-based depth relative to the outermost enclosing list.
        level: usize,
        kind: ListKind,
    },
    /// One source line of a code block. Empty lines hold the padding text.
    CodeLine {
        text: String,
    },
    Quote {
        runs: Vec<Run>,
    },
    Rule {
        separator: Run,
    },
    TablePlaceholder,
}

impl Block {
    pub fn paragraph(runs: Vec<Run>) -> Self {
        Block::Paragraph { runs: padded(runs) }
    }

    pub fn padding_paragraph() -> Self {
        Block::Paragraph {
            runs: vec![Run::padding()],
        }
    }

    pub fn code_line(text: &str) -> Self {
        let text = if text.is_empty() { PADDING } else { text };
        Block::CodeLine {
            text: text.to_string(),
        }
    }

    /// Inline runs of the block. Code lines and table placeholders carry none.
    pub fn runs(&self) -> &[Run] {
        match self {
            Block::Heading { runs, .. }
            | Block::Paragraph { runs }
            | Block::ListItem { runs, .. }
            | Block::Quote { runs } => runs,
            Block::Rule { separator } => std::slice::from_ref(separator),
            Block::CodeLine { .. } | Block::TablePlaceholder => &[],
        }
    }

    /// Concatenated literal text of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::CodeLine { text } => text.clone(),
            _ => self.runs().iter().map(Run::as_str).collect(),
        }
    }
}

/// An ordered, never-empty sequence of blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    blocks: Vec<Block>,
}

impl Document {
    /// Build a document, appending a padding paragraph when `blocks` is empty.
    pub fn new(mut blocks: Vec<Block>) -> Self {
        if blocks.is_empty() {
            blocks.push(Block::padding_paragraph());
        }
        Self { blocks }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Always false for a constructed document.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn rgb_parses_with_and_without_hash() {
        assert_eq!(Rgb::from_hex("0000FF"), Some(Rgb(0, 0, 255)));
        assert_eq!(Rgb::from_hex("#f3f4f6"), Some(Rgb(0xF3, 0xF4, 0xF6)));
        assert_eq!(Rgb::from_hex("blue"), None);
        assert_eq!(Rgb::from_hex("00FF"), None);
        assert_eq!(Rgb(0x1A, 0x4F, 0x8B).to_string(), "1A4F8B");
    }

    #[test]
    fn formatting_flags_only_turn_on() {
        let f = Formatting::default().with_bold().with_italic();
        assert!(f.bold && f.italic);
        let linked = f.with_link(Rgb(0, 0, 255), true);
        assert!(linked.bold && linked.italic && linked.underline);
        assert_eq!(linked.color, Some(Rgb(0, 0, 255)));
    }

    #[test]
    fn empty_document_gets_padding_paragraph() {
        let doc = Document::new(Vec::new());
        assert_eq!(doc.blocks(), &[Block::padding_paragraph()]);
        assert!(doc.blocks()[0].runs()[0].is_padding());
    }

    #[test]
    fn empty_code_line_is_padded() {
        assert_eq!(Block::code_line(""), Block::CodeLine { text: " ".into() });
        assert_eq!(Block::code_line("x").plain_text(), "x");
    }
}
