use anyhow::Result;
use clap::Parser;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

// Import from docsplit-core
use docsplit_core::{extract_doc_id, DocumentProcessor, FileSource, PipelineStages, SegmentationConfig, SegmentedDocument};

#[derive(Parser)]
#[command(name = "docsplit")]
#[command(about = "Split multi-page copy documents into structured page records")]
struct Args {
    /// Source documents to process (exported .html or native .json)
    #[arg(short, long, num_args = 1..)]
    input: Vec<String>,

    /// Process a document by its editor URL, resolved against --source-dir
    #[arg(long)]
    doc_url: Option<String>,

    /// Directory holding <id>.html / <id>.json files for --doc-url
    #[arg(long, default_value = ".")]
    source_dir: String,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output format: document, pages, or report
    #[arg(short = 'f', long, default_value = "document")]
    output_format: String,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,

    /// Output file path (single input only; auto-generated otherwise)
    #[arg(short, long)]
    output: Option<String>,

    /// Directory for auto-generated output files
    #[arg(long, default_value = ".")]
    output_dir: String,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Skip cache and force fresh processing (useful for development/testing)
    #[arg(long)]
    skip_cache: bool,

    /// Cache directory for segmented results (no caching when omitted)
    #[arg(long)]
    cache_dir: Option<String>,

    /// Dump all intermediate pipeline stage outputs to a directory
    /// Captures: rendered markup and final pages as separate files
    #[arg(long)]
    dump_stages: bool,

    /// Directory for stage dump output (default: test_outputs/stages)
    #[arg(long, default_value = "test_outputs/stages")]
    stages_dir: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();

    println!("🦀 Docsplit Document Segmenter");

    if args.show_configs {
        show_help();
        return Ok(());
    }

    if args.input.is_empty() && args.doc_url.is_none() {
        println!("⚠️  Nothing to process: pass --input <file>... or --doc-url <url>");
        return Ok(());
    }

    let config = SegmentationConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    let processor = match &args.cache_dir {
        Some(dir) => {
            println!("🗄️  Caching results in: {}", dir);
            DocumentProcessor::new_cli_with_cache(dir)?
        }
        None => DocumentProcessor::default(),
    };

    if let Some(url) = &args.doc_url {
        if let Err(e) = process_doc_url(&processor, &config, &args, url) {
            eprintln!("❌ Processing failed: {e}");
            std::process::exit(1);
        }
        if args.input.is_empty() {
            return Ok(());
        }
    }

    // Stage dump mode: capture and save all intermediates
    if args.dump_stages {
        println!("\n🔬 Pipeline stage dump mode");
        for input in &args.input {
            let stages_dir = stages_dir_for(&args.stages_dir, input, args.input.len());
            match processor.process_document_capture_stages(input, &config) {
                Ok(stages) => {
                    save_stages(&stages, input, &stages_dir)?;
                    println!("\n✅ All stages dumped to: {}", stages_dir.display());
                }
                Err(e) => {
                    eprintln!("❌ Stage dump failed for {input}: {e}");
                    std::process::exit(1);
                }
            }
        }
        return Ok(());
    }

    if args.output.is_some() && args.input.len() > 1 {
        println!("⚠️  --output ignored with multiple inputs; writing into {}", args.output_dir);
    }

    // One independent pipeline per input
    let failures: Vec<(String, anyhow::Error)> = args
        .input
        .par_iter()
        .filter_map(|input| {
            process_input(&processor, &config, &args, input)
                .err()
                .map(|e| (input.clone(), e))
        })
        .collect();

    let succeeded = args.input.len() - failures.len();
    println!("\n📊 Processed {} of {} document(s)", succeeded, args.input.len());
    if !failures.is_empty() {
        for (input, e) in &failures {
            eprintln!("❌ {input}: {e}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn process_input(processor: &DocumentProcessor, config: &SegmentationConfig, args: &Args, input: &str) -> Result<()> {
    if !Path::new(input).exists() {
        anyhow::bail!("input not found at: {input}");
    }

    println!("📄 Processing: {}", input);
    let document = processor.process_document_with_config_and_profiling(input, config, args.profile, args.skip_cache)?;

    let output_path = match (&args.output, args.input.len()) {
        (Some(output), 1) => PathBuf::from(output),
        _ => default_output_path(&args.output_dir, input, args.config.as_deref()),
    };
    report_and_save(&document, input, &output_path, &args.output_format)
}

fn process_doc_url(processor: &DocumentProcessor, config: &SegmentationConfig, args: &Args, url: &str) -> Result<()> {
    let doc_id = extract_doc_id(url)?;
    let source = FileSource::new(&args.source_dir);
    println!("🔍 Resolving document {} in {}", doc_id, source.root().display());

    let Some(document) = processor.process_document_id(&source, &doc_id, config)? else {
        anyhow::bail!("document {doc_id} not found in {}", args.source_dir);
    };

    let output_path = match &args.output {
        Some(output) => PathBuf::from(output),
        None => default_output_path(&args.output_dir, &doc_id, args.config.as_deref()),
    };
    report_and_save(&document, &doc_id, &output_path, &args.output_format)
}

fn report_and_save(document: &SegmentedDocument, source: &str, output_path: &Path, format: &str) -> Result<()> {
    println!("✅ Successfully processed {}", source);
    println!("📊 Pages: {}", document.pages.len());
    if let Some(client) = &document.globals.client_name {
        println!("   - Client: {}", client);
    }
    if let Some(declared) = document.globals.number_of_pages {
        println!("   - Declared pages: {}", declared);
    }

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let path = output_path.to_string_lossy();
    document.save_with_format(&path, format, source)?;

    match format {
        "pages" => println!("💾 Pages format results saved to: {}", path),
        "report" => println!("💾 Report format results saved to: {}", path),
        "document" => println!("💾 Document format results saved to: {}", path),
        _ => {
            println!("⚠️  Unknown output format '{}', using default document format", format);
            println!("💾 Document format results saved to: {}", path);
        }
    }
    Ok(())
}

/// `<output_dir>/<input stem>[_<config stem>]_docsplit.json`
fn default_output_path(output_dir: &str, input: &str, config: Option<&str>) -> PathBuf {
    let input_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let config_suffix = config
        .and_then(|p| Path::new(p).file_stem())
        .and_then(|s| s.to_str())
        .map(|s| format!("_{s}"))
        .unwrap_or_default();
    Path::new(output_dir).join(format!("{input_name}{config_suffix}_docsplit.json"))
}

/// With several inputs each one gets its own subdirectory.
fn stages_dir_for(stages_dir: &str, input: &str, input_count: usize) -> PathBuf {
    if input_count <= 1 {
        return PathBuf::from(stages_dir);
    }
    let stem = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("input");
    Path::new(stages_dir).join(stem)
}

fn show_help() {
    println!("\n📋 Available Configuration Options:");
    println!("  --config <path>         Load custom config file");
    println!("  --input <path>...       Source documents to process (.html export or .json native)");
    println!("  --doc-url <url>         Process a document by editor URL (looked up in --source-dir)");
    println!("  --output <path>         Output file path (single input only)");
    println!("  --output-dir <dir>      Directory for auto-generated output files");
    println!("  --output-format <fmt>   Output format: document, pages, or report");
    println!("  --cache-dir <dir>       Cache segmented results between runs");
    println!("  --skip-cache            Force fresh processing");
    println!("  --profile               Print per-step timings");
    println!("  --dump-stages           Write rendered markup and pages to --stages-dir");

    println!("\n📄 Output Formats:");
    println!("  document    - Global metadata plus all pages (default)");
    println!("  pages       - Array of page records only");
    println!("  report      - Document wrapped with schema version, id, and timestamp");

    println!("\n📁 Config sections (YAML):");
    println!("  markers                 - Marker pattern and unstyled fallback");
    println!("  classifier              - Title classes, heading tags, text block tags");
    println!("  labels                  - Field label text and colon rules");
    println!("  links                   - Redirect hosts and query parameters");
    println!("  renderer                - Title class emission, default heading level");
    println!("  truncate_to_page_count  - Drop pages beyond the declared count");

    println!("\n📝 Usage Examples:");
    println!("  cargo run -- -i copy.html");
    println!("  cargo run -- -i a.html b.json --output-dir out/ -f pages");
    println!("  cargo run -- --doc-url https://docs.google.com/document/d/<id>/edit --source-dir exports/");
    println!("  RUST_LOG=debug cargo run -- -i copy.html --skip-cache --profile");
}

fn save_stages(stages: &PipelineStages, input: &str, output_dir: &Path) -> Result<()> {
    use std::fs;
    fs::create_dir_all(output_dir)?;

    // Stage 1: Markup fed to the segmenter
    let markup_path = output_dir.join("stage1_markup.html");
    fs::write(&markup_path, &stages.markup)?;
    println!("  💾 {}", markup_path.display());

    // Stage 2: Final pages
    let document_path = output_dir.join("stage2_document.json");
    stages
        .document
        .save_with_format(&document_path.to_string_lossy(), "document", input)?;
    println!("  💾 {} ({} pages)", document_path.display(), stages.document.pages.len());

    // Summary file: quick reference for validation scripts
    let summary = serde_json::json!({
        "input": input,
        "source_kind": stages.source_kind,
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "stage_counts": {
            "markup_bytes": stages.markup.len(),
            "pages": stages.document.pages.len(),
        },
        "globals": stages.document.globals,
    });
    let summary_path = output_dir.join("summary.json");
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    println!("  💾 {}", summary_path.display());

    Ok(())
}
