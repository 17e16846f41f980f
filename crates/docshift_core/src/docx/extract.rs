use std::collections::HashMap;
use std::io::{Cursor, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;
use zip::ZipArchive;

use super::writer::MAX_LIST_LEVEL;
use crate::error::ConversionFailure;

const DOCUMENT_PART: &str = "word/document.xml";
const NUMBERING_PART: &str = "word/numbering.xml";

/// A run of text sharing the same emphasis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
}

/// One `w:p` of a WordprocessingML body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedParagraph {
    /// Level from a `HeadingN` paragraph style.
    pub heading: Option<u8>,
    /// `ilvl` of a numbered or bulleted paragraph.
    pub list_level: Option<usize>,
    /// Numbering instance referenced by `numPr`.
    pub num_id: Option<u32>,
    /// The numbering instance counts (decimal, letters, roman) rather than
    /// drawing bullets.
    pub ordered: bool,
    pub segments: Vec<Segment>,
}

impl ExtractedParagraph {
    pub fn text(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }

    fn push_text(&mut self, text: &str, bold: bool, italic: bool) {
        match self.segments.last_mut() {
            Some(last) if last.bold == bold && last.italic == italic => last.text.push_str(text),
            _ => self.segments.push(Segment {
                text: text.to_string(),
                bold,
                italic,
            }),
        }
    }
}

/// Read the paragraphs of a `.docx` package.
pub fn extract(bytes: &[u8]) -> Result<Vec<ExtractedParagraph>, ConversionFailure> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|_| ConversionFailure::MissingPart(DOCUMENT_PART))?
        .read_to_string(&mut xml)?;

    let numbering = match archive.by_name(NUMBERING_PART) {
        Ok(mut part) => {
            let mut numbering_xml = String::new();
            part.read_to_string(&mut numbering_xml)?;
            numbering(&numbering_xml)?
        }
        Err(_) => Numbering::default(),
    };

    let mut paragraphs = paragraphs(&xml)?;
    for paragraph in &mut paragraphs {
        if let (Some(num_id), Some(level)) = (paragraph.num_id, paragraph.list_level) {
            paragraph.ordered = numbering.is_ordered(num_id, level);
        }
    }
    debug!(paragraphs = paragraphs.len(), "extracted docx body");
    Ok(paragraphs)
}

/// Walk `word/document.xml` and collect its paragraphs.
pub fn paragraphs(xml: &str) -> Result<Vec<ExtractedParagraph>, ConversionFailure> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut current: Option<ExtractedParagraph> = None;
    let mut in_run = false;
    let mut in_run_props = false;
    let mut in_text = false;
    let mut bold = false;
    let mut italic = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"p" => current = Some(ExtractedParagraph::default()),
                b"r" => {
                    in_run = true;
                    bold = false;
                    italic = false;
                }
                b"rPr" => in_run_props = true,
                b"t" => in_text = true,
                _ => {
                    if let Some(paragraph) = current.as_mut() {
                        paragraph_property(&e, in_run_props, paragraph, &mut bold, &mut italic)?;
                    }
                }
            },
            Event::Empty(e) => {
                let Some(paragraph) = current.as_mut() else {
                    continue;
                };
                match e.local_name().as_ref() {
                    // Tab stops under `w:pPr/w:tabs` share the name; only run content counts.
                    b"tab" if in_run && !in_run_props => paragraph.push_text("\t", bold, italic),
                    b"br" if in_run && !in_run_props => paragraph.push_text("\n", bold, italic),
                    _ => paragraph_property(&e, in_run_props, paragraph, &mut bold, &mut italic)?,
                }
            }
            Event::Text(e) if in_text => {
                if let Some(paragraph) = current.as_mut() {
                    let text = e.unescape()?;
                    paragraph.push_text(&text, bold, italic);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"p" => paragraphs.extend(current.take()),
                b"r" => in_run = false,
                b"rPr" => in_run_props = false,
                b"t" => in_text = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn paragraph_property(
    e: &BytesStart<'_>,
    in_run_props: bool,
    paragraph: &mut ExtractedParagraph,
    bold: &mut bool,
    italic: &mut bool,
) -> Result<(), ConversionFailure> {
    let value = attribute(e, "w:val")?;

    match e.local_name().as_ref() {
        b"b" if in_run_props => *bold = is_on(value.as_deref()),
        b"i" if in_run_props => *italic = is_on(value.as_deref()),
        b"pStyle" => {
            paragraph.heading = value
                .as_deref()
                .and_then(|style| style.strip_prefix("Heading"))
                .and_then(|level| level.parse().ok());
        }
        b"ilvl" => {
            let level = value.as_deref().and_then(|level| level.parse::<usize>().ok());
            paragraph.list_level = Some(level.unwrap_or(0).min(MAX_LIST_LEVEL));
        }
        b"numId" => {
            paragraph.num_id = value.as_deref().and_then(|id| id.parse().ok());
        }
        b"numPr" => {
            paragraph.list_level.get_or_insert(0);
        }
        _ => {}
    }
    Ok(())
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>, ConversionFailure> {
    match e.try_get_attribute(name).map_err(quick_xml::Error::from)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

/// List formats declared in `word/numbering.xml`.
#[derive(Debug, Default)]
pub struct Numbering {
    /// `numId` → `abstractNumId`
    instances: HashMap<u32, u32>,
    /// (`abstractNumId`, `ilvl`) → counts rather than bullets
    ordered_levels: HashMap<(u32, usize), bool>,
}

impl Numbering {
    pub fn is_ordered(&self, num_id: u32, level: usize) -> bool {
        self.instances
            .get(&num_id)
            .and_then(|abstract_id| self.ordered_levels.get(&(*abstract_id, level)))
            .copied()
            .unwrap_or(false)
    }
}

/// Read the abstract list definitions and numbering instances.
pub fn numbering(xml: &str) -> Result<Numbering, ConversionFailure> {
    let mut reader = Reader::from_str(xml);
    let mut numbering = Numbering::default();
    let mut abstract_id: Option<u32> = None;
    let mut level: Option<usize> = None;
    let mut num_id: Option<u32> = None;

    let number = |e: &BytesStart<'_>, name: &str| -> Result<Option<u32>, ConversionFailure> {
        Ok(attribute(e, name)?.and_then(|value| value.parse().ok()))
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                b"abstractNum" => abstract_id = number(&e, "w:abstractNumId")?,
                b"lvl" => level = number(&e, "w:ilvl")?.map(|l| l as usize),
                b"numFmt" => {
                    if let (Some(abstract_id), Some(level)) = (abstract_id, level) {
                        let format = attribute(&e, "w:val")?.unwrap_or_default();
                        numbering.ordered_levels.insert(
                            (abstract_id, level),
                            !matches!(format.as_str(), "bullet" | "none" | ""),
                        );
                    }
                }
                b"num" => num_id = number(&e, "w:numId")?,
                b"abstractNumId" => {
                    if let (Some(num_id), Some(target)) = (num_id, number(&e, "w:val")?) {
                        numbering.instances.insert(num_id, target);
                    }
                }
                _ => {}
            },
            Event::End(e) => match e.local_name().as_ref() {
                b"abstractNum" => abstract_id = None,
                b"lvl" => level = None,
                b"num" => num_id = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(numbering)
}

/// Toggle properties are on unless explicitly switched off.
fn is_on(value: Option<&str>) -> bool {
    !matches!(value, Some("0" | "false" | "off"))
}

/// Paragraph text separated by blank lines.
pub fn to_plain_text(paragraphs: &[ExtractedParagraph]) -> String {
    paragraphs
        .iter()
        .map(ExtractedParagraph::text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Render extracted paragraphs as markdown.
pub fn to_markdown(paragraphs: &[ExtractedParagraph]) -> String {
    let mut blocks: Vec<String> = Vec::new();
    let mut list_open = false;
    // Per open list level: the item count and the width of its marker.
    let mut counters: Vec<usize> = Vec::new();
    let mut marker_widths: Vec<usize> = Vec::new();

    for paragraph in paragraphs {
        let text = markdown_segments(&paragraph.segments);
        if text.trim().is_empty() {
            list_open = false;
            continue;
        }

        if let Some(level) = paragraph.list_level {
            let level = level.min(MAX_LIST_LEVEL);
            if !list_open {
                counters.clear();
                marker_widths.clear();
            }
            counters.truncate(level + 1);
            counters.resize(level + 1, 0);
            marker_widths.resize(level + 1, 2);

            let marker = if paragraph.ordered {
                counters[level] += 1;
                format!("{}. ", counters[level])
            } else {
                "- ".to_string()
            };
            marker_widths[level] = marker.len();
            let indent: usize = marker_widths[..level].iter().sum();

            let item = format!("{}{marker}{}", " ".repeat(indent), text.trim());
            // Consecutive items form one list.
            match blocks.last_mut() {
                Some(last) if list_open => {
                    last.push('\n');
                    last.push_str(&item);
                }
                _ => blocks.push(item),
            }
            list_open = true;
            continue;
        }

        list_open = false;
        match paragraph.heading {
            Some(level) => blocks.push(format!(
                "{} {}",
                "#".repeat(level.clamp(1, 6) as usize),
                text.trim()
            )),
            None => blocks.push(text.trim().to_string()),
        }
    }

    let mut out = blocks.join("\n\n");
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn markdown_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        let text = segment.text.as_str();
        let body = text.trim();
        if body.is_empty() {
            out.push_str(text);
            continue;
        }
        // Markers hug the text; surrounding whitespace stays outside them.
        let leading = &text[..text.len() - text.trim_start().len()];
        let trailing = &text[text.trim_end().len()..];
        out.push_str(leading);
        match (segment.bold, segment.italic) {
            (true, true) => out.push_str(&format!("**_{body}_**")),
            (true, false) => out.push_str(&format!("**{body}**")),
            (false, true) => out.push_str(&format!("_{body}_")),
            (false, false) => out.push_str(body),
        }
        out.push_str(trailing);
    }
    out
}
