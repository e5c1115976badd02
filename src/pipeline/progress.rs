// file: src/pipeline/progress.rs
// description: document progress bars and run statistics
// reference: uses indicatif for progress bars and tracks processing metrics

use colored::Colorize;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineStats {
    pub documents_discovered: usize,
    pub documents_parsed: usize,
    pub documents_failed: usize,
    pub sections_detected: usize,
    pub chunks_created: usize,
    pub duration_secs: f64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Percentage of attempted documents that parsed.
    pub fn success_rate(&self) -> f64 {
        let total = self.documents_parsed + self.documents_failed;
        if total == 0 {
            return 0.0;
        }
        (self.documents_parsed as f64 / total as f64) * 100.0
    }

    pub fn chunks_per_document(&self) -> f64 {
        if self.documents_parsed == 0 {
            return 0.0;
        }
        self.chunks_created as f64 / self.documents_parsed as f64
    }

    pub fn summary(&self) -> String {
        format!(
            "{} documents ({} parsed, {} failed), {} sections, {} chunks in {:.2}s",
            self.documents_discovered.to_string().bold(),
            self.documents_parsed,
            self.documents_failed,
            self.sections_detected,
            self.chunks_created,
            self.duration_secs
        )
    }
}

/// Counts parsed documents while driving a bar per run.
pub struct ProgressTracker {
    main_bar: ProgressBar,
    detail_bar: ProgressBar,
    parsed: AtomicUsize,
    failed: AtomicUsize,
    sections: AtomicUsize,
    chunks: AtomicUsize,
    discovered: usize,
    start_time: Instant,
}

impl ProgressTracker {
    pub fn new(total_documents: usize) -> Self {
        Self::with_options(total_documents, true, true)
    }

    pub fn hidden(total_documents: usize) -> Self {
        Self::with_options(total_documents, false, false)
    }

    pub fn with_options(total_documents: usize, visible: bool, colored: bool) -> Self {
        let multi_progress = if visible {
            MultiProgress::new()
        } else {
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let main_bar = create_progress_bar(&multi_progress, total_documents as u64, colored);
        let detail_bar = create_detail_bar(&multi_progress);

        Self {
            main_bar,
            detail_bar,
            parsed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            sections: AtomicUsize::new(0),
            chunks: AtomicUsize::new(0),
            discovered: total_documents,
            start_time: Instant::now(),
        }
    }

    pub fn record_parsed(&self, document: &str, sections: usize, chunks: usize) {
        self.parsed.fetch_add(1, Ordering::SeqCst);
        self.sections.fetch_add(sections, Ordering::SeqCst);
        self.chunks.fetch_add(chunks, Ordering::SeqCst);
        self.main_bar.set_message(document.to_string());
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn record_failed(&self, document: &str) {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.main_bar.set_message(document.to_string());
        self.main_bar.inc(1);
        self.update_detail_bar();
    }

    pub fn finish(&self) {
        self.main_bar.finish_with_message("Parsing complete");
        self.detail_bar.finish_and_clear();
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            documents_discovered: self.discovered,
            documents_parsed: self.parsed.load(Ordering::SeqCst),
            documents_failed: self.failed.load(Ordering::SeqCst),
            sections_detected: self.sections.load(Ordering::SeqCst),
            chunks_created: self.chunks.load(Ordering::SeqCst),
            duration_secs: self.start_time.elapsed().as_secs_f64(),
        }
    }

    fn update_detail_bar(&self) {
        let message = format!(
            "Sections: {} | Chunks: {} | Failed: {}",
            self.sections.load(Ordering::SeqCst),
            self.chunks.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst)
        );
        self.detail_bar.set_message(message);
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        if !self.main_bar.is_finished() {
            self.finish();
        }
    }
}

fn create_progress_bar(multi_progress: &MultiProgress, total: u64, colored: bool) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(total));
    let (template, chars) = if colored {
        (
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            "█▓▒░",
        )
    } else {
        ("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}", "=>-")
    };
    let style = ProgressStyle::default_bar()
        .template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars(chars);
    bar.set_style(style);
    bar
}

fn create_detail_bar(multi_progress: &MultiProgress) -> ProgressBar {
    let bar = multi_progress.add(ProgressBar::new(0));
    if let Ok(style) = ProgressStyle::default_bar().template("{msg}") {
        bar.set_style(style);
    }
    bar
}
