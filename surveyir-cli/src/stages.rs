use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use surveyir_core::ir::{write_atomically, IrSummary, OutputFormat};
use surveyir_core::PipelineStages;

pub const LAYOUT_FILE: &str = "stage1_layout.json";
pub const PAGE_SCANS_FILE: &str = "stage2_page_scans.json";
pub const IR_FILE: &str = "stage3_ir.json";
pub const VALIDATION_FILE: &str = "stage3_validation.json";
pub const SUMMARY_FILE: &str = "summary.json";

/// Write every captured stage into `output_dir`, returning the files written
pub fn save_stages(stages: &PipelineStages, input: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;
    let mut written = Vec::new();

    // Stage 1: decoded layout
    let layout_path = output_dir.join(LAYOUT_FILE);
    write_atomically(&layout_path, serde_json::to_string_pretty(&stages.layout)?.as_bytes())?;
    written.push(layout_path);

    // Stage 2: per-page scan summaries
    let scans_path = output_dir.join(PAGE_SCANS_FILE);
    write_atomically(&scans_path, serde_json::to_string_pretty(&stages.page_scans)?.as_bytes())?;
    written.push(scans_path);

    // Stage 3: IR after post-passes
    let ir_path = output_dir.join(IR_FILE);
    stages.ir.save_with_format(&ir_path, OutputFormat::Ir)?;
    written.push(ir_path);

    if let Some(report) = &stages.validation {
        let validation_path = output_dir.join(VALIDATION_FILE);
        write_atomically(&validation_path, serde_json::to_string_pretty(report)?.as_bytes())?;
        written.push(validation_path);
    }

    // Summary file: quick reference for validation scripts
    let summary = IrSummary::compute(&stages.ir);
    let summary_json = serde_json::json!({
        "input": input.display().to_string(),
        "captured_at": chrono::Utc::now().to_rfc3339(),
        "source_digest": stages.ir.metadata.source_digest,
        "stage_counts": {
            "pages": stages.layout.page_count(),
            "table_regions": stages.layout.table_count(),
            "page_scans": stages.page_scans.len(),
            "sections": summary.sections,
            "blocks": summary.total_blocks(),
            "data_rows": summary.data_rows,
            "checkbox_items": summary.checkbox_items,
            "validation_issues": stages.validation.as_ref().map(|r| r.issues.len()),
        }
    });
    let summary_path = output_dir.join(SUMMARY_FILE);
    write_atomically(&summary_path, serde_json::to_string_pretty(&summary_json)?.as_bytes())?;
    written.push(summary_path);

    Ok(written)
}
