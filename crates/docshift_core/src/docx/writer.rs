use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::block::{Block, Document, ListKind, Run};
use crate::config::Config;
use crate::error::ConversionFailure;

/// Deepest list level WordprocessingML numbering can express.
pub(crate) const MAX_LIST_LEVEL: usize = 8;

const BULLET_NUM_ID: u32 = 1;
/// Ordered lists get their own numbering instances from here upwards, so
/// each list restarts at 1.
const FIRST_DECIMAL_NUM_ID: u32 = 2;

/// Pack a document into `.docx` bytes.
pub fn write(document: &Document, config: &Config) -> Result<Vec<u8>, ConversionFailure> {
    let num_ids = list_numbering(document);
    let document_xml = body_xml(document, &num_ids, config);
    let numbering_xml = numbering_xml(&num_ids);

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opt = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let parts: [(&str, &str); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("_rels/.rels", RELS_XML),
        ("word/document.xml", &document_xml),
        ("word/_rels/document.xml.rels", WORD_RELS_XML),
        ("word/styles.xml", STYLES_XML),
        ("word/numbering.xml", &numbering_xml),
    ];
    for (name, content) in parts {
        zip.start_file(name, opt)?;
        zip.write_all(content.as_bytes())?;
    }

    let bytes = zip.finish()?.into_inner();
    debug!(blocks = document.len(), bytes = bytes.len(), "packed docx");
    Ok(bytes)
}

/// Build `word/document.xml` for a document.
pub fn document_xml(document: &Document, config: &Config) -> String {
    body_xml(document, &list_numbering(document), config)
}

/// Numbering instance of every block; `None` for blocks outside lists.
///
/// A run of ordered items at one level shares an instance. The run ends at
/// any non-list block, at a bullet item on the same level, or when a
/// shallower item closes the nested list.
fn list_numbering(document: &Document) -> Vec<Option<u32>> {
    let mut next_decimal = FIRST_DECIMAL_NUM_ID;
    let mut open: Vec<Option<u32>> = Vec::new();

    document
        .blocks()
        .iter()
        .map(|block| {
            let Block::ListItem { level, kind, .. } = block else {
                open.clear();
                return None;
            };
            let level = (*level).min(MAX_LIST_LEVEL);
            open.truncate(level + 1);
            open.resize(level + 1, None);
            match kind {
                ListKind::Unordered => {
                    open[level] = None;
                    Some(BULLET_NUM_ID)
                }
                ListKind::Ordered => {
                    let id = *open[level].get_or_insert_with(|| {
                        next_decimal += 1;
                        next_decimal - 1
                    });
                    Some(id)
                }
            }
        })
        .collect()
}

fn body_xml(document: &Document, num_ids: &[Option<u32>], config: &Config) -> String {
    let mut body = String::new();
    let mut after_code = false;

    for (block, num_id) in document.blocks().iter().zip(num_ids) {
        write_block(block, *num_id, after_code, config, &mut body);
        after_code = matches!(block, Block::CodeLine { .. });
    }

    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<w:body>
{body}<w:sectPr><w:pgSz w:w="12240" w:h="15840"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr>
</w:body>
</w:document>"#
    )
}

fn write_block(
    block: &Block,
    num_id: Option<u32>,
    after_code: bool,
    config: &Config,
    out: &mut String,
) {
    let spacing = &config.spacing;
    out.push_str("<w:p><w:pPr>");

    match block {
        Block::Heading { level, runs } => {
            out.push_str(&format!(r#"<w:pStyle w:val="Heading{level}"/>"#));
            push_spacing(spacing.heading_before, spacing.heading_after, out);
            out.push_str("</w:pPr>");
            push_runs(runs, config, out);
        }
        Block::Paragraph { runs } => {
            // The blank paragraph closing a code block gets extra room.
            let after = if after_code {
                spacing.block_after
            } else {
                spacing.paragraph_after
            };
            push_spacing(0, after, out);
            out.push_str("</w:pPr>");
            push_runs(runs, config, out);
        }
        Block::ListItem { runs, level, .. } => {
            let num_id = num_id.unwrap_or(BULLET_NUM_ID);
            let level = (*level).min(MAX_LIST_LEVEL);
            out.push_str(r#"<w:pStyle w:val="ListParagraph"/>"#);
            out.push_str(&format!(
                r#"<w:numPr><w:ilvl w:val="{level}"/><w:numId w:val="{num_id}"/></w:numPr>"#
            ));
            push_spacing(0, spacing.list_after, out);
            out.push_str("</w:pPr>");
            push_runs(runs, config, out);
        }
        Block::CodeLine { text } => {
            let code = &config.code;
            out.push_str(&format!(
                r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
                code.shading
            ));
            push_spacing(0, 0, out);
            out.push_str(&format!(r#"<w:ind w:left="{}"/>"#, code.indent));
            out.push_str("</w:pPr><w:r><w:rPr>");
            push_code_font(config, out);
            out.push_str("</w:rPr>");
            push_text(text, out);
            out.push_str("</w:r>");
        }
        Block::Quote { runs } => {
            let quote = &config.quote;
            out.push_str(&format!(
                r#"<w:pBdr><w:left w:val="single" w:sz="6" w:space="1" w:color="{}"/></w:pBdr>"#,
                quote.border_color
            ));
            push_spacing(0, spacing.paragraph_after, out);
            out.push_str(&format!(r#"<w:ind w:left="{}"/>"#, quote.indent));
            out.push_str("</w:pPr>");
            push_runs(runs, config, out);
        }
        Block::Rule { separator } => {
            push_spacing(spacing.block_after, spacing.block_after, out);
            out.push_str("</w:pPr>");
            push_runs(std::slice::from_ref(separator), config, out);
        }
        Block::TablePlaceholder => {
            push_spacing(0, spacing.block_after, out);
            out.push_str("</w:pPr>");
            push_runs(&[Run::plain(config.table.placeholder.as_str())], config, out);
        }
    }

    out.push_str("</w:p>\n");
}

fn push_spacing(before: u32, after: u32, out: &mut String) {
    out.push_str(&format!(
        r#"<w:spacing w:before="{before}" w:after="{after}"/>"#
    ));
}

fn push_code_font(config: &Config, out: &mut String) {
    let code = &config.code;
    let font = escape(code.font.as_str());
    out.push_str(&format!(
        r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/><w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#,
        size = code.size
    ));
}

fn push_runs(runs: &[Run], config: &Config, out: &mut String) {
    for run in runs {
        match run {
            Run::LineBreak => out.push_str("<w:r><w:br/></w:r>"),
            Run::Text { text, formatting } => {
                out.push_str("<w:r>");
                if !formatting.is_plain() {
                    out.push_str("<w:rPr>");
                    // Element order follows the CT_RPr sequence.
                    if formatting.code {
                        let code = &config.code;
                        let font = escape(code.font.as_str());
                        out.push_str(&format!(
                            r#"<w:rFonts w:ascii="{font}" w:hAnsi="{font}" w:cs="{font}"/>"#
                        ));
                    }
                    if formatting.bold {
                        out.push_str("<w:b/>");
                    }
                    if formatting.italic {
                        out.push_str("<w:i/>");
                    }
                    if formatting.strike {
                        out.push_str("<w:strike/>");
                    }
                    if let Some(color) = formatting.color {
                        out.push_str(&format!(r#"<w:color w:val="{color}"/>"#));
                    }
                    if formatting.code {
                        out.push_str(&format!(
                            r#"<w:sz w:val="{size}"/><w:szCs w:val="{size}"/>"#,
                            size = config.code.size
                        ));
                    }
                    if formatting.underline {
                        out.push_str(r#"<w:u w:val="single"/>"#);
                    }
                    if formatting.code {
                        out.push_str(&format!(
                            r#"<w:shd w:val="clear" w:color="auto" w:fill="{}"/>"#,
                            config.code.shading
                        ));
                    }
                    out.push_str("</w:rPr>");
                }
                push_text(text, out);
                out.push_str("</w:r>");
            }
        }
    }
}

fn push_text(text: &str, out: &mut String) {
    // Source line breaks inside inline text are soft; they read as spaces.
    let text: String = text
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .chars()
        .filter(|&c| is_xml_char(c))
        .collect();
    out.push_str(r#"<w:t xml:space="preserve">"#);
    out.push_str(&escape(text.as_str()));
    out.push_str("</w:t>");
}

/// Characters allowed in XML 1.0 documents.
fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

fn numbering_xml(num_ids: &[Option<u32>]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:numbering xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
"#,
    );

    let bullets = ["\u{2022}", "\u{25E6}", "\u{25AA}"];
    out.push_str(r#"<w:abstractNum w:abstractNumId="0"><w:multiLevelType w:val="hybridMultilevel"/>"#);
    for level in 0..=MAX_LIST_LEVEL {
        push_level(level, "bullet", bullets[level % bullets.len()], &mut out);
    }
    out.push_str("</w:abstractNum>\n");

    out.push_str(r#"<w:abstractNum w:abstractNumId="1"><w:multiLevelType w:val="hybridMultilevel"/>"#);
    for level in 0..=MAX_LIST_LEVEL {
        let text = format!("%{}.", level + 1);
        push_level(level, "decimal", &text, &mut out);
    }
    out.push_str("</w:abstractNum>\n");

    out.push_str(&format!(
        r#"<w:num w:numId="{BULLET_NUM_ID}"><w:abstractNumId w:val="0"/></w:num>
"#
    ));
    let last_decimal = num_ids.iter().flatten().copied().max().unwrap_or(BULLET_NUM_ID);
    for num_id in FIRST_DECIMAL_NUM_ID..=last_decimal {
        out.push_str(&format!(
            r#"<w:num w:numId="{num_id}"><w:abstractNumId w:val="1"/>"#
        ));
        for level in 0..=MAX_LIST_LEVEL {
            out.push_str(&format!(
                r#"<w:lvlOverride w:ilvl="{level}"><w:startOverride w:val="1"/></w:lvlOverride>"#
            ));
        }
        out.push_str("</w:num>\n");
    }
    out.push_str("</w:numbering>");
    out
}

fn push_level(level: usize, format: &str, text: &str, out: &mut String) {
    let indent = 720 * (level + 1);
    out.push_str(&format!(
        r#"<w:lvl w:ilvl="{level}"><w:start w:val="1"/><w:numFmt w:val="{format}"/><w:lvlText w:val="{text}"/><w:lvlJc w:val="left"/><w:pPr><w:ind w:left="{indent}" w:hanging="360"/></w:pPr></w:lvl>"#
    ));
}

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
  <Override PartName="/word/numbering.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.numbering+xml"/>
</Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const WORD_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/numbering" Target="numbering.xml"/>
</Relationships>"#;

const STYLES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:qFormat/><w:rPr><w:sz w:val="22"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="28"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading4"><w:name w:val="heading 4"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="3"/></w:pPr><w:rPr><w:b/><w:i/><w:sz w:val="24"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading5"><w:name w:val="heading 5"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="4"/></w:pPr><w:rPr><w:b/><w:sz w:val="22"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="Heading6"><w:name w:val="heading 6"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="5"/></w:pPr><w:rPr><w:i/><w:sz w:val="22"/></w:rPr></w:style>
  <w:style w:type="paragraph" w:styleId="ListParagraph"><w:name w:val="List Paragraph"/><w:basedOn w:val="Normal"/><w:qFormat/></w:style>
</w:styles>"#;
