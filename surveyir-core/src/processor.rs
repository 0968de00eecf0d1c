use crate::classifier::{DocumentClassifier, PAGES_SCANNED};
use crate::config::ExtractionConfig;
use crate::error::ExtractResult;
use crate::ir::IrBuilder;
use crate::rules::{DebugConfig, ExtractionEngine, PageScan, ValidationReport};
use crate::sources::{layout_digest, LayoutDocument, LayoutPage, LayoutPreprocessor};
use crate::types::*;
use anyhow::{Context, Result};
use std::path::Path;
use std::time::{Duration, Instant};

/// Captured intermediate outputs from each pipeline stage
/// Used for diagnostics and testing stage boundaries
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineStages {
    pub layout: LayoutDocument,
    pub page_scans: Vec<PageScan>,
    pub ir: DocumentIr,
    pub validation: Option<ValidationReport>,
}

/// Simple profiler that collects timings for pipeline steps
pub struct StepProfiler {
    enabled: bool,
    timings: Vec<(String, Duration)>,
}

impl StepProfiler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            timings: Vec::new(),
        }
    }

    pub fn time_step<F, R>(&mut self, step_name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if !self.enabled {
            return f();
        }

        let start = Instant::now();
        let result = f();
        self.record(step_name, start.elapsed());
        result
    }

    pub fn record(&mut self, step_name: &str, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        log::info!("⏱️  {}: {:.0}ms", step_name, elapsed.as_millis());
        self.timings.push((step_name.to_string(), elapsed));
    }

    pub fn timings(&self) -> &[(String, Duration)] {
        &self.timings
    }

    pub fn print_summary(&self) {
        if !self.enabled || self.timings.is_empty() {
            return;
        }

        log::info!("📊 Performance Summary:");
        let total: Duration = self.timings.iter().map(|(_, d)| *d).sum();

        for (step, duration) in &self.timings {
            let percentage = if total.is_zero() {
                0.0
            } else {
                (duration.as_secs_f64() / total.as_secs_f64()) * 100.0
            };
            log::info!(
                "   {:.<35} {:.0}ms ({:.1}%)",
                step,
                duration.as_millis(),
                percentage
            );
        }
        log::info!("   {:.<35} {:.0}ms", "Total", total.as_millis());
    }
}

struct ExtractionRun {
    ir: DocumentIr,
    page_scans: Vec<PageScan>,
    validation: Option<ValidationReport>,
}

pub struct DocumentProcessor {
    source: LayoutPreprocessor,
    classifier: DocumentClassifier,
    engine: ExtractionEngine,
    last_validation: Option<ValidationReport>,
}

impl DocumentProcessor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        Self::with_source(config, LayoutPreprocessor::new())
    }

    /// Create a processor with a fixed layout source
    pub fn with_source(config: ExtractionConfig, source: LayoutPreprocessor) -> Result<Self> {
        let classifier = DocumentClassifier::new(config.document.clone());
        let engine = ExtractionEngine::new(config).context("invalid extraction config")?;
        Ok(Self {
            source,
            classifier,
            engine,
            last_validation: None,
        })
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.engine.set_debug_config(debug_config);
    }

    pub fn config(&self) -> &ExtractionConfig {
        self.engine.config()
    }

    /// Report from the last structural validation pass, if it ran
    pub fn last_validation(&self) -> Option<&ValidationReport> {
        self.last_validation.as_ref()
    }

    /// Layout dump on disk → IR
    pub fn process_file<P: AsRef<Path>>(&mut self, input: P) -> Result<DocumentIr> {
        self.process_file_with_profiling(input, false)
    }

    pub fn process_file_with_profiling<P: AsRef<Path>>(
        &mut self,
        input: P,
        enable_profiling: bool,
    ) -> Result<DocumentIr> {
        let start_time = Instant::now();
        let input = input.as_ref();
        let mut profiler = StepProfiler::new(enable_profiling);
        log::info!("📄 Processing layout: {}", input.display());

        let bytes = profiler
            .time_step("1. Read input", || std::fs::read(input))
            .with_context(|| format!("failed to read {}", input.display()))?;
        let digest = profiler.time_step("2. Digest", || layout_digest(&bytes));
        let layout = profiler.time_step("3. Layout decoding", || {
            self.source.decode_for_path(input, &bytes)
        })?;

        let run = profiler.time_step("4. Page extraction + post-passes", || {
            self.run_pipeline(layout.pages.iter().map(Ok), Some(digest))
        })?;
        for (pass, elapsed) in self.engine.pass_timings.borrow().iter() {
            profiler.record(&format!("   ↳ {}", pass), *elapsed);
        }

        profiler.print_summary();
        log::info!(
            "⏱️  Total processing time: {:.3}s",
            start_time.elapsed().as_secs_f64()
        );
        self.last_validation = run.validation;
        Ok(run.ir)
    }

    /// Decoded layout → IR
    pub fn process_layout(&mut self, layout: &LayoutDocument, source_digest: Option<String>) -> Result<DocumentIr> {
        self.process_pages(layout.pages.iter().map(Ok), source_digest)
    }

    /// Pages in reading order → IR.
    ///
    /// Pages are consumed one at a time. The first failing page aborts the
    /// whole run and no IR is returned.
    pub fn process_pages<P, I>(&mut self, pages: I, source_digest: Option<String>) -> Result<DocumentIr>
    where
        P: LayoutPage,
        I: IntoIterator<Item = ExtractResult<P>>,
    {
        let run = self.run_pipeline(pages, source_digest)?;
        self.last_validation = run.validation;
        Ok(run.ir)
    }

    /// Process a layout dump and keep every stage boundary
    pub fn process_file_capture_stages<P: AsRef<Path>>(&mut self, input: P) -> Result<PipelineStages> {
        let input = input.as_ref();
        let bytes = std::fs::read(input).with_context(|| format!("failed to read {}", input.display()))?;
        let digest = layout_digest(&bytes);

        // Stage 1: dump → layout
        let layout = self.source.decode_for_path(input, &bytes)?;
        log::info!(
            "📋 Stage 1: layout captured ({} pages, {} table regions)",
            layout.page_count(),
            layout.table_count()
        );

        // Stage 2 + 3: pages → scans → IR
        let run = self.run_pipeline(layout.pages.iter().map(Ok), Some(digest))?;
        log::info!("📋 Stage 2: {} page scans captured", run.page_scans.len());
        log::info!(
            "📋 Stage 3: IR captured ({} sections, {} blocks)",
            run.ir.sections.len(),
            run.ir.block_count()
        );

        self.last_validation = run.validation.clone();
        Ok(PipelineStages {
            layout,
            page_scans: run.page_scans,
            ir: run.ir,
            validation: run.validation,
        })
    }

    fn run_pipeline<P, I>(&self, pages: I, source_digest: Option<String>) -> Result<ExtractionRun>
    where
        P: LayoutPage,
        I: IntoIterator<Item = ExtractResult<P>>,
    {
        let mut ctx = self.engine.new_context();
        let mut builder = IrBuilder::new();
        let mut opening_texts: Vec<String> = Vec::with_capacity(PAGES_SCANNED);
        let mut page_scans = Vec::new();

        for (index, page) in pages.into_iter().enumerate() {
            let page = page.with_context(|| format!("failed to read page at position {}", index + 1))?;
            if opening_texts.len() < PAGES_SCANNED {
                opening_texts.push(page.text().to_string());
            }
            let scan = self
                .engine
                .process_page(&page, &mut ctx, &mut builder)
                .with_context(|| format!("extraction failed on page {}", page.page_number()))?;
            page_scans.push(scan);
        }

        let metadata = self
            .classifier
            .classify(&opening_texts, ctx.pages_seen(), source_digest);
        let outcome = self.engine.run_post_passes(builder.build(metadata))?;

        Ok(ExtractionRun {
            ir: outcome.ir,
            page_scans,
            validation: outcome.validation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::sources::{PageLayout, TableRegion};

    fn page(number: u32, text: &str) -> PageLayout {
        PageLayout {
            page_number: number,
            text: text.to_string(),
            tables: Vec::new(),
        }
    }

    #[test]
    fn metadata_is_filled_from_pages() {
        let mut processor = DocumentProcessor::new(ExtractionConfig::default()).unwrap();
        let layout = LayoutDocument {
            pages: vec![page(1, "LCES 2022-23"), page(2, "SECTION 1 particulars")],
        };
        let ir = processor.process_layout(&layout, None).unwrap();

        assert_eq!(ir.metadata.page_count, 2);
        assert_eq!(ir.metadata.version.as_deref(), Some("2022-23"));
        assert_eq!(ir.metadata.document_type, "LCES Questionnaire");
        assert!(ir.metadata.source_digest.is_none());
        assert_eq!(ir.diagnostics.pages_with_no_tables, vec![1, 2]);
        assert!(processor.last_validation().is_some());
    }

    #[test]
    fn failing_page_aborts_without_ir() {
        let mut processor = DocumentProcessor::new(ExtractionConfig::default()).unwrap();
        let pages: Vec<ExtractResult<PageLayout>> = vec![
            Ok(page(1, "SECTION 1")),
            Err(ExtractError::TableExtraction {
                page: 2,
                message: "grid decode failed".to_string(),
            }),
            Ok(page(3, "SECTION 2")),
        ];
        let err = processor.process_pages(pages, None).unwrap_err();
        assert!(err.to_string().contains("position 2"));
        assert!(processor.last_validation().is_none());
    }

    #[test]
    fn profiling_collects_step_timings() {
        let mut profiler = StepProfiler::new(true);
        let value = profiler.time_step("step", || 7);
        assert_eq!(value, 7);
        assert_eq!(profiler.timings().len(), 1);

        let mut disabled = StepProfiler::new(false);
        disabled.time_step("step", || ());
        assert!(disabled.timings().is_empty());
    }

    #[test]
    fn capture_stages_keeps_scans_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.json");
        let layout = LayoutDocument {
            pages: vec![
                PageLayout {
                    tables: vec![TableRegion::new(
                        vec![
                            vec![Some("Sl. No.".to_string()), Some("Name".to_string())],
                            vec![Some("1".to_string()), Some("Asha".to_string())],
                        ],
                        None,
                    )],
                    ..page(1, "SECTION 3 household members")
                },
                page(2, "continued"),
            ],
        };
        std::fs::write(&path, serde_json::to_vec(&layout).unwrap()).unwrap();

        let mut processor = DocumentProcessor::new(ExtractionConfig::default()).unwrap();
        let stages = processor.process_file_capture_stages(&path).unwrap();

        assert_eq!(stages.layout, layout);
        assert_eq!(stages.page_scans.len(), 2);
        assert_eq!(stages.page_scans[0].section_id, "3");
        assert_eq!(stages.page_scans[0].data_tables, 1);
        assert_eq!(stages.ir.metadata.source_digest.as_ref().map(|d| d.len()), Some(64));
        assert!(stages.validation.is_some());
    }
}
