// file: src/repository/scanner.rs
// description: Input directory walking and pdf discovery
// reference: https://docs.rs/walkdir

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Clone, Default)]
pub struct DocumentScanner;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedDocument {
    pub path: PathBuf,
    /// File name, used as the document identity in every result.
    pub name: String,
    pub size: u64,
}

impl DocumentScanner {
    pub fn new() -> Self {
        Self
    }

    /// PDFs directly inside `root`, sorted by file name.
    pub fn scan_directory(&self, root: &Path) -> Result<Vec<ScannedDocument>> {
        info!("Scanning directory: {}", root.display());
        Validator::validate_directory(root)?;

        let mut documents = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| {
                PipelineError::Validation(format!("Cannot read {}: {}", root.display(), e))
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if Validator::validate_pdf_extension(path).is_err() {
                debug!("Skipping non-pdf file: {}", path.display());
                continue;
            }

            let size = entry.metadata().map(|metadata| metadata.len()).unwrap_or(0);
            documents.push(ScannedDocument {
                path: path.to_path_buf(),
                name: entry.file_name().to_string_lossy().to_string(),
                size,
            });
        }

        info!(
            "Found {} pdf files ({} bytes)",
            documents.len(),
            total_size(&documents)
        );
        Ok(documents)
    }
}

/// Combined on-disk size of the scanned documents.
pub fn total_size(documents: &[ScannedDocument]) -> u64 {
    documents.iter().map(|d| d.size).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_directory_sorted_pdfs_only() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("b.pdf"), "%PDF").unwrap();
        fs::write(temp.path().join("A.PDF"), "%PDF").unwrap();
        fs::write(temp.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();
        fs::write(temp.path().join("nested").join("c.pdf"), "%PDF").unwrap();

        let documents = DocumentScanner::new().scan_directory(temp.path()).unwrap();
        let names: Vec<&str> = documents.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["A.PDF", "b.pdf"]);
        assert_eq!(documents[1].size, 4);
    }

    #[test]
    fn test_total_size_sums_documents() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.pdf"), "%PDF-1.5").unwrap();
        fs::write(temp.path().join("b.pdf"), "%PDF").unwrap();

        let documents = DocumentScanner::new().scan_directory(temp.path()).unwrap();
        assert_eq!(total_size(&documents), 12);
        assert_eq!(total_size(&[]), 0);
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp = TempDir::new().unwrap();
        assert!(DocumentScanner::new().scan_directory(temp.path()).unwrap().is_empty());
    }

    #[test]
    fn test_scan_missing_directory() {
        let temp = TempDir::new().unwrap();
        assert!(DocumentScanner::new()
            .scan_directory(&temp.path().join("missing"))
            .is_err());
    }
}
