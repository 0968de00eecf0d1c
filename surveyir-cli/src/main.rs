use anyhow::Result;
use clap::Parser;
use std::path::Path;

use surveyir::save_stages;
use surveyir_core::config::DEFAULT_PRESET;
use surveyir_core::sources::LayoutBackendImpl;
use surveyir_core::{
    ConfigManager, DebugConfig, DocumentIr, DocumentProcessor, ExtractionConfig, IrSummary,
    LayoutPreprocessor, OutputFormat,
};

#[derive(Parser)]
#[command(name = "surveyir")]
#[command(about = "Extract a sectioned document IR from survey questionnaire layouts")]
struct Args {
    /// Path to the layout dump (JSON or XHTML) to process
    #[arg(short, long)]
    input: Option<String>,

    /// Path to custom config file (YAML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Built-in config preset, used when no config file is given
    #[arg(short, long, default_value = DEFAULT_PRESET)]
    preset: String,

    /// Layout dump format (json or xhtml); detected from extension/content if omitted
    #[arg(long)]
    layout_format: Option<String>,

    /// Output format: ir or records
    #[arg(short = 'f', long, default_value = "ir")]
    output_format: String,

    /// Show available config options and exit
    #[arg(long)]
    show_configs: bool,

    /// Output file path (if not specified, auto-generated based on input)
    #[arg(short, long)]
    output: Option<String>,

    /// Enable detailed profiling of all pipeline steps
    #[arg(long)]
    profile: bool,

    /// Dump all intermediate pipeline stage outputs to a directory
    /// Captures: layout, per-page scans, IR, validation report, summary
    #[arg(long)]
    dump_stages: bool,

    /// Directory for stage dump output
    #[arg(long, default_value = "test_outputs/stages")]
    stages_dir: String,

    /// Trace blocks whose text matches this pattern (repeatable)
    #[arg(long)]
    debug_filter: Vec<String>,

    /// Verbose logging (debug level)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    println!("🦀 Surveyir Questionnaire Extractor");

    let mut config_manager = ConfigManager::new();
    if args.show_configs {
        show_help(&config_manager);
        return Ok(());
    }

    let Some(input) = args.input.as_deref() else {
        eprintln!("❌ No input given. Use --input <layout.json|layout.xhtml>");
        std::process::exit(2);
    };

    // Check if input file exists
    if !Path::new(input).exists() {
        eprintln!("⚠️  Input layout not found at: {}", input);
        eprintln!("   Please check the file path.");
        std::process::exit(1);
    }

    let output_format: OutputFormat = args.output_format.parse()?;
    let config = match load_config(&args, &mut config_manager) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e:#}");
            std::process::exit(1);
        }
    };

    let source = match args.layout_format.as_deref() {
        Some(format) => LayoutPreprocessor::with_backend(format.parse::<LayoutBackendImpl>()?),
        None => LayoutPreprocessor::new(),
    };
    let mut processor = DocumentProcessor::with_source(config, source)?;
    if !args.debug_filter.is_empty() {
        processor.set_debug_config(DebugConfig::new(true, args.debug_filter.clone()));
    }

    println!("📄 Processing: {}", input);

    // Stage dump mode: capture and save all intermediates
    if args.dump_stages {
        println!("\n🔬 Pipeline stage dump mode");
        match processor.process_file_capture_stages(input) {
            Ok(stages) => {
                for path in save_stages(&stages, Path::new(input), Path::new(&args.stages_dir))? {
                    println!("  💾 {}", path.display());
                }
                println!("\n✅ All stages dumped to: {}", args.stages_dir);
            }
            Err(e) => {
                eprintln!("❌ Stage dump failed: {e:#}");
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    match processor.process_file_with_profiling(input, args.profile) {
        Ok(ir) => {
            println!("✅ Successfully processed document");
            print_summary(&ir);
            if let Some(report) = processor.last_validation().filter(|r| r.is_clean()) {
                println!("🔍 Validation: clean (quality score {:.2})", report.quality_score);
            } else if let Some(report) = processor.last_validation() {
                println!(
                    "🔍 Validation: {} issue(s), quality score {:.2}",
                    report.issues.len(),
                    report.quality_score
                );
            }

            let output_path = match &args.output {
                Some(output) => output.clone(),
                None => default_output_path(input, &args),
            };
            ir.save_with_format(&output_path, output_format)?;
            match output_format {
                OutputFormat::Ir => println!("💾 IR saved to: {}", output_path),
                OutputFormat::Records => println!("💾 Records saved to: {}", output_path),
            }
        }
        Err(e) => {
            eprintln!("❌ Processing failed: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn load_config(args: &Args, config_manager: &mut ConfigManager) -> Result<ExtractionConfig> {
    let config_path = args.config.as_deref().map(Path::new);
    let config = config_manager.resolve(config_path, &args.preset)?;
    match &args.config {
        Some(path) => println!("📋 Loaded config from: {}", path),
        None => println!("📋 Using preset: {}", args.preset),
    }
    Ok(config)
}

fn default_output_path(input: &str, args: &Args) -> String {
    let input_name = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let config_suffix = args
        .config
        .as_ref()
        .and_then(|p| Path::new(p).file_stem())
        .and_then(|s| s.to_str())
        .map(|s| format!("_{s}"))
        .unwrap_or_default();
    format!("{input_name}{config_suffix}_surveyir.json")
}

fn print_summary(ir: &DocumentIr) {
    let summary = IrSummary::compute(ir);
    println!("📊 IR metrics:");
    println!("   - Pages: {}", ir.metadata.page_count);
    println!("   - Sections: {}", summary.sections);
    println!("   - Instructions: {}", summary.instruction_blocks);
    println!(
        "   - Data tables: {} ({} continued, {} rows, {} with warnings)",
        summary.data_tables, summary.continuation_tables, summary.data_rows, summary.rows_with_warnings
    );
    println!(
        "   - Checkbox groups: {} ({} of {} items selected)",
        summary.checkbox_groups, summary.selected_items, summary.checkbox_items
    );
    println!("   - Relationships: {}", summary.relationships);
    println!(
        "   - Merged cells: {}, header mismatches: {}",
        ir.diagnostics.merged_cells_detected,
        ir.diagnostics.tables_with_header_mismatch.len()
    );
}

fn show_help(config_manager: &ConfigManager) {
    println!("\n📋 Available Configuration Options:");
    println!("  --input <path>          Layout dump to process (.json or .xhtml)");
    println!("  --config <path>         Load custom config file");
    println!("  --preset <name>         Built-in config preset (default: {})", DEFAULT_PRESET);
    println!("  --output <path>         Output file path (auto-generated if not specified)");
    println!("  --output-format <fmt>   Output format: ir or records");
    println!("  --layout-format <fmt>   Force the layout dump format: json or xhtml");
    println!("  --profile               Time each pipeline step");
    println!("  --dump-stages           Write every pipeline stage to --stages-dir");
    println!("  --debug-filter <regex>  Trace blocks whose text matches");
    println!("  -v, --verbose           Debug-level logging");

    println!("\n🧩 Presets:");
    for name in config_manager.preset_names() {
        let config = config_manager.get_config(name);
        println!(
            "  {:<10} {} ({} checkbox section(s), {} relationship rule(s))",
            name,
            config.document.document_type,
            config.checkbox_groups.sections.len(),
            config.relationships.rules.len()
        );
    }

    println!("\n📄 Output Formats:");
    println!("  ir       - Sectioned document with blocks, relationships and diagnostics (default)");
    println!("  records  - One flat record per data-table row, keyed by semantic column key");

    println!("\n📝 Usage Examples:");
    println!("  cargo run -- -i layout.json");
    println!("  cargo run -- -i layout.xhtml -o /path/to/ir.json");
    println!("  cargo run -- -i layout.json -c config.yaml -f records");
}
