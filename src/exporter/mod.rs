// file: src/exporter/mod.rs
// description: output writers
// reference: internal module structure

pub mod json;

pub use json::JsonExporter;
