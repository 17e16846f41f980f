use thiserror::Error;

use crate::convert::DocumentFormat;
use crate::raster::RasterFormat;

/// Error returned by every conversion entry point.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Failed to convert {from} to {to}: {cause}")]
    Conversion {
        from: DocumentFormat,
        to: DocumentFormat,
        #[source]
        cause: ConversionFailure,
    },

    #[error("Failed to convert image from {from} to {to}: {cause}")]
    Image {
        from: RasterFormat,
        to: RasterFormat,
        #[source]
        cause: image::ImageError,
    },

    #[error("Conversion from .{from} to .{to} is not supported")]
    Unsupported { from: String, to: String },

    #[error("Failed to convert encoding: {0}")]
    Encoding(String),

    #[error("Unsupported line ending format: {0}")]
    LineEnding(String),
}

/// The underlying cause of a failed conversion.
#[derive(Debug, Error)]
pub enum ConversionFailure {
    #[error("source is not valid UTF-8 text")]
    SourceRead,

    #[error("markup rendering failed: {0}")]
    Render(String),

    #[error("document is missing `{0}`")]
    MissingPart(&'static str),

    #[error(transparent)]
    Package(#[from] zip::result::ZipError),

    #[error(transparent)]
    Xml(#[from] quick_xml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ConversionFailure {
    /// Attach the conversion direction.
    pub fn converting(self, from: DocumentFormat, to: DocumentFormat) -> ConvertError {
        ConvertError::Conversion {
            from,
            to,
            cause: self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_direction_and_cause() {
        let err = ConversionFailure::SourceRead
            .converting(DocumentFormat::Markdown, DocumentFormat::Docx);
        assert_eq!(
            err.to_string(),
            "Failed to convert Markdown to DOCX: source is not valid UTF-8 text"
        );
    }

    #[test]
    fn unsupported_message() {
        let err = ConvertError::Unsupported {
            from: "png".into(),
            to: "docx".into(),
        };
        assert_eq!(err.to_string(), "Conversion from .png to .docx is not supported");
    }
}
