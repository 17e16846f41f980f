mod assemble;
mod block;
mod config;
mod convert;
mod dispatch;
pub mod docx;
mod error;
mod inline;
mod list;
mod markup;
mod raster;
mod render;
pub mod text;

pub use assemble::{assemble, assemble_with_config};
pub use block::{Block, Document, Formatting, ListKind, Rgb, Run, PADDING};
pub use config::{Config, ConfigError};
pub use convert::{
    convert_file, docx_to_markdown, docx_to_txt, file_category, file_extension,
    format_file_size, is_file_supported, markdown_to_docx, markdown_to_docx_with_config,
    markdown_to_document, markdown_to_txt, supported_conversions, txt_to_docx, txt_to_markdown,
    ConvertOptions, Converted, DocumentFormat, FileCategory,
};
pub use dispatch::Dispatcher;
pub use error::{ConversionFailure, ConvertError};
pub use inline::{accumulate, accumulate_all};
pub use list::ListNesting;
pub use markup::{MarkupNode, Tag};
pub use raster::{convert_image, ImageOptions, RasterFormat};
pub use render::{markdown_to_html, parse_html, render_markdown};
pub use text::{LineEnding, TextEncoding, TextStats};

/// Parse markdown into the blocks of a document using default config.
pub fn parse(markdown: &str) -> Result<Document, ConversionFailure> {
    convert::markdown_to_document(markdown, &Config::compiled_default())
}
