// file: src/exporter/json.rs
// description: json export of the ranked output document

use crate::error::{PipelineError, Result};
use crate::models::FinalOutput;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    output_file: PathBuf,
    pretty: bool,
}

impl JsonExporter {
    pub fn new(output_file: impl Into<PathBuf>, pretty: bool) -> Self {
        Self {
            output_file: output_file.into(),
            pretty,
        }
    }

    pub fn output_file(&self) -> &Path {
        &self.output_file
    }

    /// Serialises `value` with 4-space indentation (or compactly).
    pub fn render<T: Serialize>(value: &T, pretty: bool) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let outcome = if pretty {
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
            value.serialize(&mut serializer)
        } else {
            serde_json::to_writer(&mut buffer, value)
        };
        outcome.map_err(|e| PipelineError::Serialization(e.to_string()))?;
        buffer.push(b'\n');
        Ok(buffer)
    }

    /// Writes to a sibling temp file first, then renames over the target.
    pub fn export(&self, output: &FinalOutput) -> Result<()> {
        let bytes = Self::render(output, self.pretty)?;

        if let Some(parent) = self.output_file.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|source| PipelineError::FileOperation {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp_path = self.output_file.with_extension("json.tmp");
        fs::write(&tmp_path, &bytes).map_err(|source| PipelineError::FileOperation {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.output_file).map_err(|source| {
            PipelineError::FileOperation {
                path: self.output_file.clone(),
                source,
            }
        })?;

        info!(
            "Wrote {} sections and {} subsections to {}",
            output.extracted_section.len(),
            output.sub_section_analysis.len(),
            self.output_file.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExtractedSection, RunMetadata, SubsectionAnalysis};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_output() -> FinalOutput {
        FinalOutput {
            metadata: RunMetadata {
                input_documents: vec!["a.pdf".to_string()],
                persona: "Chef".to_string(),
                job_to_be_done: "plan a menu".to_string(),
                processing_timestamp: "2025-01-01T00:00:00+00:00".to_string(),
            },
            extracted_section: vec![ExtractedSection {
                document: "a.pdf".to_string(),
                page_number: 1,
                section_title: "Starters".to_string(),
                importance_rank: 1,
            }],
            sub_section_analysis: vec![SubsectionAnalysis {
                document: "a.pdf".to_string(),
                page_number: 1,
                refined_text: "Soup first".to_string(),
            }],
        }
    }

    #[test]
    fn test_export_creates_parent_dirs_and_roundtrips() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("results.json");
        let exporter = JsonExporter::new(&target, true);

        exporter.export(&sample_output()).unwrap();

        let written = fs::read_to_string(&target).unwrap();
        let parsed: FinalOutput = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, sample_output());
        assert!(!target.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_pretty_output_uses_four_space_indent() {
        let rendered = JsonExporter::render(&sample_output(), true).unwrap();
        let text = String::from_utf8(rendered).unwrap();
        assert!(text.contains("\n    \"metadata\": {"));
        assert!(text.contains("\n        \"persona\": \"Chef\""));
    }

    #[test]
    fn test_compact_output_is_single_line() {
        let rendered = JsonExporter::render(&sample_output(), false).unwrap();
        let text = String::from_utf8(rendered).unwrap();
        assert_eq!(text.trim_end().lines().count(), 1);
    }

    #[test]
    fn test_export_below_a_file_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let exporter = JsonExporter::new(blocker.join("results.json"), true);

        assert!(matches!(
            exporter.export(&sample_output()),
            Err(PipelineError::FileOperation { .. })
        ));
    }
}
