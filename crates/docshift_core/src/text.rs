//! Plain-text helpers: markdown stripping, encodings, line endings, stats.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};
use regex::Regex;

use crate::block::{Block, Document, Run};
use crate::error::ConvertError;

static HEADING_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#{1,6}\s+").expect("Invalid heading pattern"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("Invalid bold pattern"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("Invalid italic pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.+?)\]\(.+?\)").expect("Invalid link pattern"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`(.+?)`").expect("Invalid inline code pattern"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[-*+]\s+").expect("Invalid bullet pattern"));
static NUMBERED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\d+\.\s+").expect("Invalid numbered item pattern"));
static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n").expect("Invalid paragraph break pattern"));

const BULLET_MARK: &str = "\u{2022} ";

/// Unicode encodings a text file can be converted between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

impl TextEncoding {
    fn encoding(self) -> &'static Encoding {
        match self {
            TextEncoding::Utf8 => UTF_8,
            TextEncoding::Utf16Le => UTF_16LE,
            TextEncoding::Utf16Be => UTF_16BE,
        }
    }

    /// Encode text without a byte order mark.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            TextEncoding::Utf8 => text.as_bytes().to_vec(),
            TextEncoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
            TextEncoding::Utf16Be => text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
        })
    }
}

impl FromStr for TextEncoding {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-16le" | "utf16le" => Ok(TextEncoding::Utf16Le),
            "utf-16be" | "utf16be" => Ok(TextEncoding::Utf16Be),
            _ => Err(ConvertError::Encoding(format!("Unsupported encoding: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    Lf,
    Crlf,
    Cr,
}

impl FromStr for LineEnding {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lf" => Ok(LineEnding::Lf),
            "crlf" => Ok(LineEnding::Crlf),
            "cr" => Ok(LineEnding::Cr),
            _ => Err(ConvertError::LineEnding(s.to_string())),
        }
    }
}

/// Text statistics for a file.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStats {
    pub characters: usize,
    pub characters_no_spaces: usize,
    pub words: usize,
    pub lines: usize,
    pub paragraphs: usize,
    pub encoding: TextEncoding,
    /// Size in bytes.
    pub size: usize,
}

impl TextStats {
    pub fn size_kb(&self) -> String {
        format!("{:.2}", self.size as f64 / 1024.0)
    }
}

/// Reflow plain text into markdown paragraphs.
pub fn txt_to_markdown(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|para| !para.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Remove markdown syntax, keeping the text.
pub fn markdown_to_txt(markdown: &str) -> String {
    let text = HEADING_MARKER.replace_all(markdown, "");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = LINK.replace_all(&text, "$1");
    let text = INLINE_CODE.replace_all(&text, "$1");
    let text = BULLET.replace_all(&text, BULLET_MARK);
    NUMBERED.replace_all(&text, BULLET_MARK).into_owned()
}

/// One paragraph per line.
pub fn txt_to_document(text: &str) -> Document {
    let blocks = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| {
            if line.is_empty() {
                Block::padding_paragraph()
            } else {
                Block::paragraph(vec![Run::plain(line)])
            }
        })
        .collect();
    Document::new(blocks)
}

/// Sniff the byte order mark. Anything without one is taken as UTF-8.
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => TextEncoding::Utf8,
        [0xFF, 0xFE, ..] => TextEncoding::Utf16Le,
        [0xFE, 0xFF, ..] => TextEncoding::Utf16Be,
        _ => TextEncoding::Utf8,
    }
}

/// Decode with the detected encoding, dropping any byte order mark.
/// Malformed sequences become U+FFFD.
pub fn decode(bytes: &[u8]) -> String {
    let (text, _had_errors) = detect_encoding(bytes)
        .encoding()
        .decode_with_bom_removal(bytes);
    text.into_owned()
}

/// Re-encode text bytes into `target`, without a byte order mark.
pub fn convert_encoding(bytes: &[u8], target: TextEncoding) -> Vec<u8> {
    target.encode(&decode(bytes))
}

pub fn convert_line_endings(text: &str, target: LineEnding) -> String {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    match target {
        LineEnding::Lf => normalized,
        LineEnding::Crlf => normalized.replace('\n', "\r\n"),
        LineEnding::Cr => normalized.replace('\n', "\r"),
    }
}

pub fn remove_bom(bytes: &[u8]) -> &[u8] {
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => rest,
        [0xFF, 0xFE, rest @ ..] | [0xFE, 0xFF, rest @ ..] => rest,
        _ => bytes,
    }
}

pub fn analyze_text(bytes: &[u8]) -> TextStats {
    let text = decode(bytes);
    TextStats {
        characters: text.chars().count(),
        characters_no_spaces: text.chars().filter(|c| !c.is_whitespace()).count(),
        words: text.split_whitespace().count(),
        lines: text.split('\n').count(),
        paragraphs: PARAGRAPH_BREAK
            .split(&text)
            .filter(|para| !para.trim().is_empty())
            .count(),
        encoding: detect_encoding(bytes),
        size: bytes.len(),
    }
}
