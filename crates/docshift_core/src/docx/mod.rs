//! WordprocessingML packages.

pub mod extract;
pub mod writer;

pub use extract::{extract, ExtractedParagraph, Segment};
pub use writer::write;
