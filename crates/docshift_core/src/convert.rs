use std::fmt;

use tracing::debug;

use crate::assemble::assemble_with_config;
use crate::block::Document;
use crate::config::Config;
use crate::docx;
use crate::error::{ConversionFailure, ConvertError};
use crate::raster::{self, ImageOptions, RasterFormat};
use crate::render::render_markdown;
use crate::text::{self, LineEnding, TextEncoding};

const DOCUMENT_EXTENSIONS: [&str; 4] = ["docx", "md", "markdown", "txt"];
const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "webp", "gif", "bmp", "heic", "heif"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Docx,
    Markdown,
    Text,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "docx" => Some(DocumentFormat::Docx),
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            "txt" => Some(DocumentFormat::Text),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            DocumentFormat::Docx => "docx",
            DocumentFormat::Markdown => "md",
            DocumentFormat::Text => "txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            DocumentFormat::Markdown => "text/markdown",
            DocumentFormat::Text => "text/plain",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::Markdown => "Markdown",
            DocumentFormat::Text => "TXT",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Document,
    Image,
    Unknown,
}

/// Options for text → text and image conversions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    pub encoding: Option<TextEncoding>,
    pub line_endings: Option<LineEnding>,
    pub image: ImageOptions,
}

/// Output of a conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct Converted {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub extension: &'static str,
}

impl Converted {
    fn new(format: DocumentFormat, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: format.mime_type(),
            extension: format.extension(),
        }
    }

    fn image(format: RasterFormat, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            mime_type: format.mime_type(),
            extension: format.extension(),
        }
    }
}

/// Read source bytes as strict UTF-8, ignoring a leading byte order mark.
fn read_source(bytes: &[u8]) -> Result<&str, ConversionFailure> {
    std::str::from_utf8(text::remove_bom(bytes)).map_err(|_| ConversionFailure::SourceRead)
}

/// Build the block document for markdown source.
pub fn markdown_to_document(markdown: &str, config: &Config) -> Result<Document, ConversionFailure> {
    let nodes = render_markdown(markdown)?;
    Ok(assemble_with_config(&nodes, config))
}

pub fn markdown_to_docx(bytes: &[u8]) -> Result<Vec<u8>, ConvertError> {
    markdown_to_docx_with_config(bytes, &Config::compiled_default())
}

pub fn markdown_to_docx_with_config(bytes: &[u8], config: &Config) -> Result<Vec<u8>, ConvertError> {
    let run = || -> Result<Vec<u8>, ConversionFailure> {
        let markdown = read_source(bytes)?;
        let document = markdown_to_document(markdown, config)?;
        docx::write(&document, config)
    };
    run().map_err(|e| e.converting(DocumentFormat::Markdown, DocumentFormat::Docx))
}

pub fn docx_to_markdown(bytes: &[u8]) -> Result<String, ConvertError> {
    docx::extract(bytes)
        .map(|paragraphs| docx::extract::to_markdown(&paragraphs))
        .map_err(|e| e.converting(DocumentFormat::Docx, DocumentFormat::Markdown))
}

pub fn docx_to_txt(bytes: &[u8]) -> Result<String, ConvertError> {
    docx::extract(bytes)
        .map(|paragraphs| docx::extract::to_plain_text(&paragraphs))
        .map_err(|e| e.converting(DocumentFormat::Docx, DocumentFormat::Text))
}

pub fn txt_to_docx(bytes: &[u8], config: &Config) -> Result<Vec<u8>, ConvertError> {
    let run = || -> Result<Vec<u8>, ConversionFailure> {
        let text = read_source(bytes)?;
        docx::write(&text::txt_to_document(text), config)
    };
    run().map_err(|e| e.converting(DocumentFormat::Text, DocumentFormat::Docx))
}

pub fn txt_to_markdown(bytes: &[u8]) -> Result<String, ConvertError> {
    read_source(bytes)
        .map(text::txt_to_markdown)
        .map_err(|e| e.converting(DocumentFormat::Text, DocumentFormat::Markdown))
}

pub fn markdown_to_txt(bytes: &[u8]) -> Result<String, ConvertError> {
    read_source(bytes)
        .map(text::markdown_to_txt)
        .map_err(|e| e.converting(DocumentFormat::Markdown, DocumentFormat::Text))
}

/// Convert a file to the format named by `target` (an extension, with or
/// without the leading dot).
pub fn convert_file(
    file_name: &str,
    bytes: &[u8],
    target: &str,
    options: &ConvertOptions,
    config: &Config,
) -> Result<Converted, ConvertError> {
    let source_ext = file_extension(file_name);
    let target_ext = target.trim_start_matches('.').to_ascii_lowercase();

    let unsupported = || ConvertError::Unsupported {
        from: source_ext.clone(),
        to: target_ext.clone(),
    };

    if let (Some(source), Some(target)) = (
        RasterFormat::from_extension(&source_ext),
        RasterFormat::from_extension(&target_ext),
    ) {
        debug!(%source, %target, bytes = bytes.len(), "converting {file_name}");
        let bytes = raster::convert_image(bytes, target, &options.image).map_err(|cause| {
            ConvertError::Image {
                from: source,
                to: target,
                cause,
            }
        })?;
        return Ok(Converted::image(target, bytes));
    }

    let source = DocumentFormat::from_extension(&source_ext).ok_or_else(unsupported)?;
    let target = DocumentFormat::from_extension(&target_ext).ok_or_else(unsupported)?;

    debug!(%source, %target, bytes = bytes.len(), "converting {file_name}");

    use DocumentFormat::*;
    let converted = match (source, target) {
        (Docx, Markdown) => Converted::new(target, docx_to_markdown(bytes)?.into_bytes()),
        (Markdown, Docx) => Converted::new(target, markdown_to_docx_with_config(bytes, config)?),
        (Text, Markdown) => Converted::new(target, txt_to_markdown(bytes)?.into_bytes()),
        (Markdown, Text) => Converted::new(target, markdown_to_txt(bytes)?.into_bytes()),
        (Docx, Text) => Converted::new(target, docx_to_txt(bytes)?.into_bytes()),
        (Text, Docx) => Converted::new(target, txt_to_docx(bytes, config)?),
        (Text, Text) if options.encoding.is_some() || options.line_endings.is_some() => {
            Converted::new(target, convert_text(bytes, options))
        }
        _ => return Err(unsupported()),
    };
    Ok(converted)
}

fn convert_text(bytes: &[u8], options: &ConvertOptions) -> Vec<u8> {
    let encoding = options
        .encoding
        .unwrap_or_else(|| text::detect_encoding(bytes));
    match options.line_endings {
        Some(line_endings) => {
            let normalized = text::convert_line_endings(&text::decode(bytes), line_endings);
            encoding.encode(&normalized)
        }
        None => text::convert_encoding(bytes, encoding),
    }
}

/// Extensions a file can be converted to.
pub fn supported_conversions(file_name: &str) -> &'static [&'static str] {
    let ext = file_extension(file_name);
    if let Some(format) = DocumentFormat::from_extension(&ext) {
        return match format {
            DocumentFormat::Docx => &["md", "txt"],
            DocumentFormat::Markdown => &["docx", "txt"],
            DocumentFormat::Text => &["md", "docx"],
        };
    }
    match RasterFormat::from_extension(&ext) {
        Some(RasterFormat::Jpeg) => &["png", "webp", "gif"],
        Some(RasterFormat::Png) => &["jpg", "webp", "gif"],
        Some(RasterFormat::Webp) => &["jpg", "png", "gif"],
        Some(RasterFormat::Gif) => &["jpg", "png", "webp"],
        Some(RasterFormat::Bmp) => &["jpg", "png", "webp"],
        None => &[],
    }
}

pub fn is_file_supported(file_name: &str) -> bool {
    !supported_conversions(file_name).is_empty()
}

pub fn file_category(file_name: &str) -> FileCategory {
    let ext = file_extension(file_name);
    if DOCUMENT_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Document
    } else if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        FileCategory::Image
    } else {
        FileCategory::Unknown
    }
}

/// Lowercased text after the last `.`; the whole name when there is none.
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or(file_name)
        .to_ascii_lowercase()
}

/// Human readable size, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    let rounded = (size * 100.0).round() / 100.0;
    format!("{rounded} {}", UNITS[unit])
}
