use anyhow::{anyhow, Result};
use clap::Parser;

// Import from nutrimed-core
use nutrimed_core::serialization::RenderContext;
use nutrimed_core::{
    Document, DocumentProcessor, OutputFormat, PipelineStages, ReportConfig, SectionKind, StepProfiler, ViewState,
};

// Import CLI utilities
use nutrimed::sources::parse_date;
use nutrimed::{AnalysisSource, DisplayOverrides};

#[derive(Parser)]
#[command(name = "nutrimed")]
#[command(about = "Turn AI food analyses into nutrition reports")]
struct Args {
    /// Path to the analysis text file, or "-" to read stdin
    #[arg(short, long)]
    input: Option<String>,

    /// Path to a saved history entry (JSON); takes precedence over --input
    #[arg(long)]
    history_entry: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Output format: document, flat, view, text, or pdf
    #[arg(short = 'f', long, default_value = "document")]
    output_format: String,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Food photo shown in the report header (JPEG is embedded, other formats get a frame)
    #[arg(long)]
    image: Option<String>,

    /// Capture date shown in the report header (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    date: Option<chrono::NaiveDate>,

    /// Current medical condition (repeatable)
    #[arg(long = "current")]
    current: Vec<String>,

    /// Condition the user is concerned about (repeatable)
    #[arg(long = "concerned")]
    concerned: Vec<String>,

    /// Description the user typed with the photo
    #[arg(long)]
    description: Option<String>,

    /// Free-text medical notes printed under the condition tags
    #[arg(long)]
    notes: Option<String>,

    /// Hide a section in the view/text output: current, concerned, general, ... (repeatable)
    #[arg(long = "hide")]
    hide: Vec<String>,

    /// Show every point instead of the collapsed preview
    #[arg(long)]
    expand_all: bool,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Dump all intermediate pipeline stage outputs to a directory
    /// Captures: normalized text, extracted regions, and the final Document as separate files
    #[arg(long)]
    dump_stages: bool,

    /// Directory for stage dump output (default: test_outputs/stages)
    #[arg(long, default_value = "test_outputs/stages")]
    stages_dir: String,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    println!("🥗 NutriMed Report Builder");

    if args.show_configs {
        show_help();
        return Ok(());
    }

    let Some(source) = AnalysisSource::from_args(args.input.as_deref(), args.history_entry.as_deref()) else {
        println!("⚠️  No analysis given.");
        println!("   Pass --input <path|-> or --history-entry <json>.");
        return Ok(());
    };

    if let AnalysisSource::File(path) | AnalysisSource::History(path) = &source {
        if !path.exists() {
            println!("⚠️  Input not found at: {}", path.display());
            println!("   Please check the file path.");
            return Ok(());
        }
    }

    let config = ReportConfig::load_with_fallback(args.config.as_deref());
    if let Some(config_path) = &args.config {
        println!("📋 Loaded config from: {}", config_path);
    } else {
        println!("📋 Using default config");
    }

    let format: OutputFormat = args.output_format.parse()?;
    let loaded = source.load()?;
    let overrides = DisplayOverrides {
        image: args.image.as_ref().map(Into::into),
        date: args.date,
        current: args.current.clone(),
        concerned: args.concerned.clone(),
        description: args.description.clone(),
        notes: args.notes.clone(),
    };
    let fields = overrides.apply(loaded.fields)?;

    let processor = DocumentProcessor::new(&config);
    println!("📄 Processing: {}", loaded.stem);

    // Stage dump mode: capture and save all intermediates
    if args.dump_stages {
        println!("\n🔬 Pipeline stage dump mode");
        let stages = processor.process_capture_stages(&loaded.raw);
        save_stages(&stages, &loaded.stem, &args.stages_dir)?;
        println!("\n✅ All stages dumped to: {}", args.stages_dir);
        return Ok(());
    }

    let mut profiler = StepProfiler::new(args.profile);
    let document = processor.process_with_profiler(&loaded.raw, &mut profiler);
    profiler.print_summary();

    println!("✅ Successfully processed analysis");
    print_document_metrics(&document);

    let mut view_state = ViewState::new();
    if args.expand_all {
        view_state.expand_all(&document);
    }
    for slug in &args.hide {
        let kind = SectionKind::from_slug(slug).ok_or_else(|| anyhow!("Unknown section '{slug}'"))?;
        view_state.hide(kind);
    }

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| format!("nutrimed-report-{}.{}", loaded.stem, format.extension()));

    let ctx = RenderContext {
        config: &config,
        fields: &fields,
        view_state: &view_state,
    };
    if let Err(e) = document.save_with_format(&output_path, format, &ctx) {
        eprintln!("❌ Writing report failed: {e}");
        std::process::exit(1);
    }
    println!("💾 {:?} report saved to: {}", format, output_path);

    Ok(())
}

fn print_document_metrics(document: &Document) {
    println!("📊 Report contents:");
    println!(
        "   - Dish: {}",
        document.dish_name.as_deref().unwrap_or("(not identified)")
    );
    match document.score {
        Some(score) => println!("   - Score: {score}/100"),
        None => println!("   - Score: (none)"),
    }
    println!("   - Sections: {}", document.sections.len());
    println!("   - Points: {}", document.point_texts().len());
    println!("   - Alternatives: {}", document.alternatives.len());
    println!("   - Fingerprint: {}", &document.fingerprint()[..12]);
}

fn show_help() {
    println!("\n📋 Available Configuration Options:");
    println!("  --config <path>         Load custom config file");
    println!("  --input <path|->        Analysis text to process ('-' reads stdin)");
    println!("  --history-entry <path>  Saved history entry (JSON) to re-render");
    println!("  --output <path>         Output file path (auto-generated if not specified)");
    println!("  --output-format <fmt>   Output format: document, flat, view, text, or pdf");
    println!("  --image <path>          Food photo for the report header");
    println!("  --date <YYYY-MM-DD>     Capture date for the report header");
    println!("  --current <condition>   Current medical condition (repeatable)");
    println!("  --concerned <condition> Condition of concern (repeatable)");
    println!("  --notes <text>          Medical notes shown under the condition tags");
    println!("  --hide <section>        Hide a section in view/text output (repeatable)");
    println!("  --expand-all            Show every point in view/text output");

    println!("\n📄 Output Formats:");
    println!("  document  - Parsed Document as JSON (default)");
    println!("  flat      - Simple array of text chunks in report order");
    println!("  view      - Interactive view model as JSON (respects --hide/--expand-all)");
    println!("  text      - Plain-text report for the terminal");
    println!("  pdf       - Paginated PDF report (always shows every section)");

    println!("\n📁 Config sections (YAML):");
    println!("  parsing   - summary line bounds, dish name limit, metric placeholder");
    println!("  pipeline  - ordered extraction rules, each with an enabled flag");
    println!("  layout    - page format (A4/Letter), margins, brand, page numbers");
    println!("  view      - collapsed point limit");

    println!("\n🩺 Condition choices:");
    for option in nutrimed_core::CONDITION_OPTIONS {
        println!("  {option}");
    }

    println!("\n📝 Usage Examples:");
    println!("  cargo run -- -i analysis.txt");
    println!("  cargo run -- -i analysis.txt -f pdf --image lunch.jpg --date 2024-05-01");
    println!("  cat analysis.txt | cargo run -- -i - -f text --expand-all");
    println!("  cargo run -- --history-entry entry.json -f view --hide concerned");
}

fn save_stages(stages: &PipelineStages, input_name: &str, output_dir: &str) -> Result<()> {
    use std::fs;
    fs::create_dir_all(output_dir)?;

    // Stage 1: Normalized text
    let normalized_path = format!("{}/stage1_normalized.txt", output_dir);
    fs::write(&normalized_path, &stages.normalized)?;
    println!("  💾 {}", normalized_path);

    // Stage 2: Extracted regions
    let regions_path = format!("{}/stage2_regions.json", output_dir);
    fs::write(&regions_path, serde_json::to_string_pretty(&stages.regions)?)?;
    println!("  💾 {} ({} regions)", regions_path, stages.regions.len());

    // Stage 3: Final document
    let document_path = format!("{}/stage3_document.json", output_dir);
    fs::write(&document_path, serde_json::to_string_pretty(&stages.document)?)?;
    println!("  💾 {} ({} sections)", document_path, stages.document.sections.len());

    // Summary file: quick reference for validation scripts
    let summary = serde_json::json!({
        "input": input_name,
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "fingerprint": stages.document.fingerprint(),
        "stage_counts": {
            "normalized_bytes": stages.normalized.len(),
            "headers": stages.regions.headers.len(),
            "regions": stages.regions.len(),
            "sections": stages.document.sections.len(),
            "points": stages.document.point_texts().len(),
        }
    });
    let summary_path = format!("{}/summary.json", output_dir);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)?;
    println!("  💾 {}", summary_path);

    Ok(())
}
