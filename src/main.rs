// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use persona_digest::utils::logging::{
    format_error, format_info, format_step, format_success, format_warning, init_logger,
};
use persona_digest::{
    Config, DocumentScanner, DocumentStructureParser, HealthCheck, HealthReport, JsonExporter,
    LayoutExtractor, PdfLayoutExtractor, PersonaInput, PipelineOrchestrator, Validator,
    build_embedder, total_size,
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "persona-digest")]
#[command(author = "cipher")]
#[command(version)]
#[command(about = "Rank PDF sections by relevance to a persona and their job", long_about = None)]
struct Cli {
    /// TOML configuration file; `config/default.toml` is used when present.
    #[arg(short, long, value_name = "FILE", env = "PERSONA_DIGEST_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank every PDF in the input folder and write the JSON digest
    Run {
        #[arg(long, value_name = "DIR")]
        docs_dir: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        persona: Option<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Log and skip documents that fail to parse instead of aborting
        #[arg(long)]
        skip_failed: bool,
    },

    /// Show the detected structure of a single PDF
    Inspect {
        pdf: PathBuf,

        /// Dump the raw extracted layout as JSON
        #[arg(long)]
        layout: bool,
    },

    /// Check configuration, inputs and the embedding provider
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    colored::control::set_override(cli.color);
    init_logger(cli.color, cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    let outcome = match cli.command {
        Commands::Run {
            docs_dir,
            persona,
            output,
            skip_failed,
        } => cmd_run(config, docs_dir, persona, output, skip_failed).await,
        Commands::Inspect { pdf, layout } => cmd_inspect(&config, &pdf, layout).await,
        Commands::Verify => cmd_verify(&config).await,
    };

    if let Err(e) = &outcome {
        error!("{:#}", e);
        eprintln!("{}", format_error("persona-digest failed"));
    }
    outcome
}

async fn cmd_run(
    mut config: Config,
    docs_dir: Option<PathBuf>,
    persona: Option<PathBuf>,
    output: Option<PathBuf>,
    skip_failed: bool,
) -> Result<()> {
    if let Some(docs_dir) = docs_dir {
        config.input.docs_dir = docs_dir;
    }
    if let Some(persona) = persona {
        config.input.persona_file = persona;
    }
    if let Some(output) = output {
        config.input.output_file = output;
    }
    config.pipeline.skip_failed_documents |= skip_failed;

    info!(
        "Ranking {} for persona file {}",
        config.input.docs_dir.display(),
        config.input.persona_file.display()
    );
    let start_time = Instant::now();

    let exporter = JsonExporter::new(&config.input.output_file, config.pipeline.pretty_output);
    let orchestrator = PipelineOrchestrator::new(config)
        .await
        .context("Failed to initialise the pipeline")?;

    let run = orchestrator.run().await.context("Pipeline run failed")?;
    exporter
        .export(&run.output)
        .context("Failed to write output")?;

    let stats = &run.stats;
    println!("{}", format_success("Digest complete"));
    println!("  {}", stats.summary());
    println!(
        "  success rate {:.1}%, {:.1} chunks/document",
        stats.success_rate(),
        stats.chunks_per_document()
    );
    if stats.documents_failed > 0 {
        println!(
            "{}",
            format_warning(&format!("{} document(s) skipped", stats.documents_failed))
        );
    }
    println!(
        "{}",
        format_info(&format!(
            "Output written to {} in {:.2}s",
            exporter.output_file().display(),
            start_time.elapsed().as_secs_f64()
        ))
    );

    Ok(())
}

async fn cmd_inspect(config: &Config, pdf: &Path, dump_layout: bool) -> Result<()> {
    Validator::validate_file_path(pdf)?;
    Validator::validate_pdf_extension(pdf)?;

    let path = pdf.to_path_buf();
    let layout = tokio::task::spawn_blocking(move || PdfLayoutExtractor::new().extract(&path))
        .await
        .context("Extraction task failed")?
        .with_context(|| format!("Failed to extract {}", pdf.display()))?;

    if dump_layout {
        let rendered = JsonExporter::render(&layout, true)?;
        println!("{}", String::from_utf8_lossy(&rendered));
        return Ok(());
    }

    let structure = DocumentStructureParser::new(config.structure.clone()).analyze(&layout);

    println!(
        "{}",
        format_info(&format!(
            "{}: {} pages, {} blocks, body size {}",
            layout.name,
            layout.pages.len(),
            layout.block_count(),
            structure.body_size
        ))
    );

    if structure.sections.is_empty() {
        println!("{}", format_warning("No sections with body text detected"));
        return Ok(());
    }

    let total = structure.sections.len();
    for (idx, section) in structure.sections.iter().enumerate() {
        println!(
            "{} (page {}, {} words)",
            format_step(idx + 1, total, &section.title),
            section.start_page,
            section.word_count()
        );
        let preview = section.content().split_whitespace().collect::<Vec<_>>().join(" ");
        println!("      {}", Validator::truncate_text(&preview, 100));
    }

    Ok(())
}

async fn cmd_verify(config: &Config) -> Result<()> {
    info!("Running pre-flight checks");

    let mut checks = vec![HealthCheck::healthy(
        "configuration",
        Some(format!(
            "{} embedder, {} workers, {}-word chunks",
            config.embedding.provider.as_str(),
            config.pipeline.parallel_workers,
            config.ranking.chunk_target_word_count
        )),
        std::time::Duration::ZERO,
    )];

    checks.push(check_persona(&config.input.persona_file));
    checks.push(check_documents(&config.input.docs_dir));
    checks.push(check_embedder(config).await);

    let report = HealthReport::new(checks, env!("CARGO_PKG_VERSION"));
    println!("{}", report.format());

    if !report.is_healthy() {
        anyhow::bail!("Pre-flight checks failed");
    }
    Ok(())
}

fn check_persona(path: &Path) -> HealthCheck {
    let start = Instant::now();
    match PersonaInput::load(path) {
        Ok(persona) => {
            let blank = Validator::validate_content_not_empty(&persona.persona).is_err()
                || Validator::validate_content_not_empty(&persona.job_to_be_done).is_err();
            if blank {
                HealthCheck::degraded(
                    "persona",
                    "persona role or task is empty".to_string(),
                    start.elapsed(),
                )
            } else {
                HealthCheck::healthy("persona", Some(persona.persona), start.elapsed())
            }
        }
        Err(e) => HealthCheck::unhealthy("persona", e.to_string(), start.elapsed()),
    }
}

fn check_documents(docs_dir: &Path) -> HealthCheck {
    let start = Instant::now();
    match DocumentScanner::new().scan_directory(docs_dir) {
        Ok(documents) if documents.is_empty() => HealthCheck::unhealthy(
            "documents",
            format!("no pdf files in {}", docs_dir.display()),
            start.elapsed(),
        ),
        Ok(documents) => HealthCheck::healthy(
            "documents",
            Some(format!(
                "{} pdf files, {} bytes",
                documents.len(),
                total_size(&documents)
            )),
            start.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy("documents", e.to_string(), start.elapsed()),
    }
}

async fn check_embedder(config: &Config) -> HealthCheck {
    let start = Instant::now();
    let embedder = match build_embedder(&config.embedding).await {
        Ok(embedder) => embedder,
        Err(e) => return HealthCheck::unhealthy("embedder", e.to_string(), start.elapsed()),
    };

    match embedder.embed_one("pre-flight check").await {
        Ok(vector) if vector.len() == config.embedding.dimensions => HealthCheck::healthy(
            "embedder",
            Some(format!("{} ({} dims)", embedder.name(), vector.len())),
            start.elapsed(),
        ),
        Ok(vector) => HealthCheck::degraded(
            "embedder",
            format!(
                "{} returned {} dims, configured {}",
                embedder.name(),
                vector.len(),
                config.embedding.dimensions
            ),
            start.elapsed(),
        ),
        Err(e) => HealthCheck::unhealthy("embedder", e.to_string(), start.elapsed()),
    }
}
