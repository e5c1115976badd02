// file: src/repository/mod.rs
// description: input document discovery exports
// reference: internal module structure

pub mod scanner;

pub use scanner::{DocumentScanner, ScannedDocument, total_size};
