// file: src/parser/mod.rs
// description: layout extraction and document structure parsing exports
// reference: internal module structure

pub mod layout;
pub mod pdf;
pub mod structure;

pub use layout::{DocumentLayout, LayoutExtractor, PageLayout, TextBlock, TextLine, TextSpan};
pub use pdf::PdfLayoutExtractor;
pub use structure::{
    BlockKind, BlockStyle, DocumentStructure, DocumentStructureParser, HeadingClassifier,
    infer_body_size,
};
