use crate::config::ExtractionConfig;
use crate::context::ExtractionContext;
use crate::error::ExtractResult;
use crate::ir::IrBuilder;
use crate::sources::{LayoutPage, TableRegion};
use crate::types::*;
use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use std::cell::RefCell;
use std::time::{Duration, Instant};

use super::header_hierarchy::HeaderHierarchyResolver;
use super::relationships::CrossTableRelationshipRule;
use super::row_interpreter::RowInterpreter;
use super::section_tracker::SectionTracker;
use super::table_regions::TableRegionClassifier;
use super::text_scanner::TextScanner;
use super::validation::{ValidationReport, ValidationRule};

#[derive(Debug, Clone)]
enum BlockFilter {
    Pattern(Regex),
    Text(String),
}

impl BlockFilter {
    /// Regex when the pattern compiles, plain substring otherwise
    fn compile(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => BlockFilter::Pattern(regex),
            Err(_) => BlockFilter::Text(pattern.to_string()),
        }
    }

    fn matches(&self, text: &str) -> bool {
        match self {
            BlockFilter::Pattern(regex) => regex.is_match(text),
            BlockFilter::Text(needle) => text.contains(needle.as_str()),
        }
    }
}

// Debug configuration for block tracing
#[derive(Debug, Clone)]
pub struct DebugConfig {
    pub enabled: bool,
    filters: Vec<BlockFilter>,
}

impl DebugConfig {
    pub fn new(enabled: bool, filter_patterns: Vec<String>) -> Self {
        Self {
            enabled,
            filters: filter_patterns.iter().map(|p| BlockFilter::compile(p)).collect(),
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            filters: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled && !self.filters.is_empty()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.filters.iter().any(|filter| filter.matches(text))
    }
}

/// Trace blocks whose text matches any debug filter
pub fn debug_blocks(stage: &str, blocks: &[Block], debug_config: &DebugConfig) {
    if !debug_config.is_active() {
        return;
    }

    let matching: Vec<(usize, &Block, String)> = blocks
        .iter()
        .enumerate()
        .map(|(index, block)| (index, block, block.preview_text()))
        .filter(|(_, _, text)| debug_config.matches(text))
        .collect();

    if matching.is_empty() {
        return;
    }

    log::info!("🔍 [{}] {} matching block(s):", stage, matching.len());
    for (index, block, text) in matching {
        let preview = if text.chars().count() > 60 {
            format!("{}...", text.chars().take(57).collect::<String>())
        } else {
            text
        };
        log::info!(
            "  Block {}: {} \"{}\" (page {})",
            index,
            block.type_name(),
            preview,
            block.provenance().page
        );
    }
}

/// A pass run once over the completed IR
pub trait IrPass {
    fn apply(&self, ir: DocumentIr) -> Result<DocumentIr>;
    fn name(&self) -> &str;
}

/// What one page contributed, for stage dumps and logging
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageScan {
    pub page: u32,
    pub section_id: String,
    pub section_changed: bool,
    pub instruction_blocks: usize,
    pub table_regions: usize,
    pub data_tables: usize,
    pub checkbox_groups: usize,
    pub skipped_empty_tables: usize,
}

/// Result of running the configured post-passes
#[derive(Debug, Clone)]
pub struct PostPassOutcome {
    pub ir: DocumentIr,
    pub validation: Option<ValidationReport>,
}

/// Compiled extraction pipeline for one configuration.
///
/// Regexes are compiled once here; per-page work only borrows them.
pub struct ExtractionEngine {
    config: ExtractionConfig,
    text_scanner: TextScanner,
    section_tracker: SectionTracker,
    region_classifier: TableRegionClassifier,
    debug_config: DebugConfig,
    pub pass_timings: RefCell<Vec<(String, Duration)>>,
}

impl ExtractionEngine {
    pub fn new(config: ExtractionConfig) -> ExtractResult<Self> {
        let text_scanner = TextScanner::new(&config.text_scanner);
        let section_tracker = SectionTracker::new(&config.sections)?;
        let region_classifier = TableRegionClassifier::new(&config.tables)?;

        Ok(Self {
            config,
            text_scanner,
            section_tracker,
            region_classifier,
            debug_config: DebugConfig::disabled(),
            pass_timings: RefCell::new(Vec::new()),
        })
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn set_debug_config(&mut self, debug_config: DebugConfig) {
        self.debug_config = debug_config;
    }

    pub fn new_context(&self) -> ExtractionContext {
        ExtractionContext::new(&self.config.sections.initial_section_id)
    }

    /// Extract one page into the builder.
    ///
    /// The section is resolved from the page text first; every block of the
    /// page goes to that section. A failing `tables()` call aborts before
    /// anything from this page is appended.
    pub fn process_page<P: LayoutPage + ?Sized>(
        &self,
        page: &P,
        ctx: &mut ExtractionContext,
        builder: &mut IrBuilder,
    ) -> ExtractResult<PageScan> {
        let page_no = page.page_number();
        let text = page.text();
        let tables = page.tables()?;

        let changed = self.section_tracker.observe_page(ctx, text);
        let section_id = ctx.current_section_id().to_string();
        if changed.is_some() {
            builder.ensure_section(&section_id, page_no);
        }

        let mut scan = PageScan {
            page: page_no,
            section_id: section_id.clone(),
            section_changed: changed.is_some(),
            table_regions: tables.len(),
            ..PageScan::default()
        };
        let mut page_blocks = Vec::new();

        for instruction in self.text_scanner.scan_page(text, page_no) {
            scan.instruction_blocks += 1;
            page_blocks.push(Block::Instruction(instruction));
        }

        if tables.is_empty() {
            builder.record_page_without_tables(page_no);
        }

        for (index, region) in tables.iter().enumerate() {
            let table_no = index as u32 + 1;
            match self.process_table(region, page_no, table_no, &section_id, ctx, builder) {
                Some(block @ Block::CheckboxGroup(_)) => {
                    scan.checkbox_groups += 1;
                    page_blocks.push(block);
                }
                Some(block) => {
                    scan.data_tables += 1;
                    page_blocks.push(block);
                }
                None => scan.skipped_empty_tables += 1,
            }
        }

        debug_blocks(&format!("Page {}", page_no), &page_blocks, &self.debug_config);
        for block in page_blocks {
            builder.append_block(&section_id, page_no, block);
        }

        ctx.page_done();
        log::debug!(
            "📄 Page {} → section {}: {} instruction(s), {} table(s), {} checkbox group(s)",
            page_no,
            section_id,
            scan.instruction_blocks,
            scan.data_tables,
            scan.checkbox_groups
        );
        Ok(scan)
    }

    fn process_table(
        &self,
        region: &TableRegion,
        page_no: u32,
        table_no: u32,
        section_id: &str,
        ctx: &mut ExtractionContext,
        builder: &mut IrBuilder,
    ) -> Option<Block> {
        let grid = region.extract();
        if region.is_empty() {
            log::debug!("Page {} table {}: empty grid, skipped", page_no, table_no);
            return None;
        }

        let classified = self.region_classifier.classify(grid);
        if !classified.has_data_rows() {
            builder.record_table_without_data_rows(page_no, table_no);
        }

        let resolver = HeaderHierarchyResolver::new(
            &self.config.text_scanner.unit_vocabulary,
            self.config.tables.fill_spanning_right,
        );
        let header = resolver.resolve(classified.header_rows, classified.data_rows);
        let is_continuation = ctx.observe_header_signature(header.signature());
        let table_id = format!("{}_P{}_T{}", section_id, page_no, table_no);
        let provenance = Provenance::table_grid(page_no, region.bbox);

        for key in &header.duplicate_keys {
            builder.record_duplicate_key(page_no, table_no, key);
        }

        let interpreter = RowInterpreter::new(&self.config.tables, &self.config.checkbox_groups);
        let interpreted = interpreter.interpret_rows(classified.data_rows, header.width());
        for mismatch in &interpreted.mismatches {
            builder.record_header_mismatch(HeaderMismatch {
                page: page_no,
                table: table_no,
                row: mismatch.row,
                expected_cols: header.width(),
                actual_cols: mismatch.actual_cols,
            });
        }
        builder.record_merged_cells(interpreted.merged_cells);

        // Selection-list sections keep the diagnostics but emit only the group
        if interpreter.is_checkbox_section(section_id) {
            let items = interpreter.compact_checkbox_group(classified.data_rows);
            return Some(Block::CheckboxGroup(CheckboxGroupBlock {
                table_id,
                is_continuation,
                items,
                provenance,
            }));
        }

        Some(Block::DataTable(DataTableBlock {
            table_id,
            is_continuation,
            columns: header.columns,
            rows: interpreted.rows,
            provenance,
        }))
    }

    /// Run the configured post-passes in order over the finished IR
    pub fn run_post_passes(&self, mut ir: DocumentIr) -> Result<PostPassOutcome> {
        log::info!("🔗 Executing config-driven post-passes...");
        self.pass_timings.borrow_mut().clear();
        let mut validation = None;

        for pass in &self.config.post_passes {
            if !pass.enabled {
                log::info!("   ⏭️  Skipping disabled pass: {}", pass.name);
                continue;
            }
            ir = self.apply_pass_by_name(&pass.name, ir, &mut validation)?;
        }

        Ok(PostPassOutcome { ir, validation })
    }

    fn apply_pass_by_name(
        &self,
        pass_name: &str,
        ir: DocumentIr,
        validation: &mut Option<ValidationReport>,
    ) -> Result<DocumentIr> {
        let pass_start = Instant::now();
        let result = match pass_name {
            "CrossTableRelationships" => {
                CrossTableRelationshipRule::new(&self.config.relationships).apply(ir)
            }
            "StructuralValidation" => {
                let rule = ValidationRule::new();
                let ir = rule.apply(ir)?;
                *validation = rule.take_report();
                Ok(ir)
            }
            _ => {
                log::warn!("⚠️  Unknown post-pass: {}. Skipping...", pass_name);
                Ok(ir)
            }
        };

        self.pass_timings
            .borrow_mut()
            .push((pass_name.to_string(), pass_start.elapsed()));
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PassConfig;
    use crate::error::ExtractError;
    use crate::sources::PageLayout;

    fn grid(rows: &[&[Option<&str>]]) -> Vec<Vec<Option<String>>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.map(|s| s.to_string())).collect())
            .collect()
    }

    fn page(number: u32, text: &str, tables: Vec<Vec<Vec<Option<String>>>>) -> PageLayout {
        PageLayout {
            page_number: number,
            text: text.to_string(),
            tables: tables.into_iter().map(|rows| TableRegion::new(rows, None)).collect(),
        }
    }

    fn run(engine: &ExtractionEngine, pages: &[PageLayout]) -> DocumentIr {
        let mut ctx = engine.new_context();
        let mut builder = IrBuilder::new();
        for p in pages {
            engine.process_page(p, &mut ctx, &mut builder).unwrap();
        }
        builder.build(IrMetadata::default())
    }

    fn engine() -> ExtractionEngine {
        ExtractionEngine::new(ExtractionConfig::default()).unwrap()
    }

    #[test]
    fn blocks_land_in_section_of_their_page() {
        let engine = engine();
        let ir = run(
            &engine,
            &[
                page(1, "Note: answer all questions", vec![]),
                page(2, "SECTION [2] HOUSEHOLD\nIf yes, go to Q2.3", vec![]),
                page(3, "Q2.4 Household size", vec![]),
            ],
        );

        let ids: Vec<&str> = ir.sections.keys().map(|k| k.as_str()).collect();
        assert_eq!(ids, vec!["0", "2"]);
        assert_eq!(ir.sections["2"].first_page, 2);
        assert_eq!(ir.sections["2"].blocks.len(), 2);
        assert_eq!(ir.diagnostics.pages_with_no_tables, vec![1, 2, 3]);
    }

    #[test]
    fn data_table_with_spanning_header() {
        let engine = engine();
        let ir = run(
            &engine,
            &[page(
                1,
                "SECTION [5] CONSUMPTION",
                vec![grid(&[
                    &[Some("Food"), Some("Food")],
                    &[Some("Item"), Some("Qty (kg)")],
                    &[Some("Q1.1"), Some("12")],
                    &[Some("Q1.2"), None, Some("extra")],
                ])],
            )],
        );

        let Block::DataTable(table) = &ir.sections["5"].blocks[0] else {
            panic!("expected a data table");
        };
        assert_eq!(table.table_id, "5_P1_T1");
        assert!(!table.is_continuation);
        assert_eq!(table.columns[1].hierarchy, vec!["Food", "Qty (kg)"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].cells.len(), 2);

        assert_eq!(ir.diagnostics.merged_cells_detected, 1);
        assert_eq!(
            ir.diagnostics.tables_with_header_mismatch,
            vec![HeaderMismatch { page: 1, table: 1, row: 1, expected_cols: 2, actual_cols: 3 }]
        );
    }

    #[test]
    fn checkbox_section_emits_only_checkbox_group() {
        let engine = engine();
        let ir = run(
            &engine,
            &[page(
                7,
                "SECTION 4.1.2 Items purchased",
                vec![grid(&[
                    &[Some("Sl."), Some("Item"), Some("Tick")],
                    &[Some("1"), Some("Rice"), Some("X")],
                    &[Some("2"), Some("Wheat"), Some("")],
                ])],
            )],
        );

        // The marker line itself reads as question "4.1"
        let blocks: Vec<&Block> = ir.sections["4.1.2"]
            .blocks
            .iter()
            .filter(|b| !matches!(b, Block::Instruction(_)))
            .collect();
        assert_eq!(blocks.len(), 1);
        let Block::CheckboxGroup(group) = blocks[0] else {
            panic!("expected a checkbox group");
        };
        assert_eq!(
            group.items,
            vec![
                CheckboxItem { item: "Rice".to_string(), selected: true },
                CheckboxItem { item: "Wheat".to_string(), selected: false },
            ]
        );
        let value = serde_json::to_value(blocks[0]).unwrap();
        assert!(value.get("columns").is_none());
    }

    #[test]
    fn checkbox_section_still_records_row_diagnostics() {
        let engine = engine();
        let ir = run(
            &engine,
            &[page(
                3,
                "SECTION 4.1.2 Items purchased",
                vec![grid(&[
                    &[Some("Sl."), Some("Item"), Some("Tick")],
                    &[Some("1"), Some("Rice"), None],
                    &[Some("2"), Some("Wheat"), Some("X"), Some("extra")],
                ])],
            )],
        );

        assert_eq!(ir.diagnostics.merged_cells_detected, 1);
        assert_eq!(
            ir.diagnostics.tables_with_header_mismatch,
            vec![HeaderMismatch { page: 3, table: 1, row: 1, expected_cols: 3, actual_cols: 4 }]
        );

        let groups: Vec<&CheckboxGroupBlock> = ir.sections["4.1.2"]
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::CheckboxGroup(group) => Some(group),
                _ => None,
            })
            .collect();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            groups[0].items,
            vec![
                CheckboxItem { item: "Rice".to_string(), selected: false },
                CheckboxItem { item: "Wheat".to_string(), selected: true },
            ]
        );
        assert_eq!(ir.data_tables().count(), 0);
    }

    #[test]
    fn repeated_header_across_pages_is_continuation() {
        let header: &[&[Option<&str>]] = &[
            &[Some("Name"), Some("Age")],
            &[Some("1"), Some("34")],
        ];
        let engine = engine();
        let ir = run(
            &engine,
            &[
                page(1, "SECTION [3] MEMBERS", vec![grid(header)]),
                page(2, "", vec![grid(header), grid(&[&[Some("Code")], &[Some("2")]])]),
            ],
        );

        let flags: Vec<bool> = ir
            .data_tables()
            .map(|(_, t)| t.is_continuation)
            .collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn header_only_and_empty_tables() {
        let engine = engine();
        let ir = run(
            &engine,
            &[page(
                1,
                "",
                vec![
                    grid(&[&[Some("Name"), Some("Name")]]),
                    Vec::new(),
                    grid(&[&[]]),
                    grid(&[&[Some("Code")], &[Some("7")]]),
                ],
            )],
        );
        assert_eq!(ir.diagnostics.tables_without_data_rows, vec![TableRef { page: 1, table: 1 }]);
        assert_eq!(
            ir.diagnostics.duplicate_semantic_keys,
            vec![DuplicateSemanticKey { page: 1, table: 1, semantic_key: "name".to_string() }]
        );
        assert_eq!(ir.block_count(), 2);

        // Skipped grids still take their position in the numbering
        let ids: Vec<&str> = ir.data_tables().map(|(_, t)| t.table_id.as_str()).collect();
        assert_eq!(ids, vec!["0_P1_T1", "0_P1_T4"]);
        assert!(ir.diagnostics.pages_with_no_tables.is_empty());
    }

    struct FailingPage;

    impl LayoutPage for FailingPage {
        fn page_number(&self) -> u32 {
            4
        }

        fn text(&self) -> &str {
            "SECTION [9] Note: broken"
        }

        fn tables(&self) -> ExtractResult<Vec<TableRegion>> {
            Err(ExtractError::TableExtraction {
                page: 4,
                message: "grid detection failed".to_string(),
            })
        }
    }

    #[test]
    fn table_failure_appends_nothing() {
        let engine = engine();
        let mut ctx = engine.new_context();
        let mut builder = IrBuilder::new();
        let err = engine.process_page(&FailingPage, &mut ctx, &mut builder).unwrap_err();
        assert!(matches!(err, ExtractError::TableExtraction { page: 4, .. }));
        assert_eq!(builder.block_count(), 0);
        assert!(builder.sections().is_empty());
    }

    #[test]
    fn post_passes_follow_config() {
        let ir = run(
            &engine(),
            &[page(1, "SECTION [2] Note: a", vec![]), page(2, "SECTION [3] Note: b", vec![])],
        );

        let outcome = engine().run_post_passes(ir.clone()).unwrap();
        assert_eq!(outcome.ir.relationships.len(), 1);
        assert!(outcome.validation.is_some());

        let config = ExtractionConfig {
            post_passes: vec![
                PassConfig { name: "CrossTableRelationships".to_string(), enabled: false },
                PassConfig { name: "Bogus".to_string(), enabled: true },
            ],
            ..ExtractionConfig::default()
        };
        let engine = ExtractionEngine::new(config).unwrap();
        let outcome = engine.run_post_passes(ir).unwrap();
        assert!(outcome.ir.relationships.is_empty());
        assert!(outcome.validation.is_none());
        assert_eq!(engine.pass_timings.borrow().len(), 1);
    }

    #[test]
    fn debug_filters_compile_once_with_text_fallback() {
        let config = DebugConfig::new(true, vec![r"Q\d+\.1".to_string(), "(Rice".to_string()]);
        assert!(config.is_active());
        assert!(config.matches("Q2.1 Household size"));
        assert!(config.matches("items: (Rice, Wheat)"));
        assert!(!config.matches("Q2.3 Religion"));

        assert!(!DebugConfig::disabled().is_active());
        assert!(!DebugConfig::new(false, vec!["Q".to_string()]).is_active());
        assert!(!DebugConfig::new(true, Vec::new()).is_active());
    }

    #[test]
    fn invalid_patterns_fail_construction() {
        let mut config = ExtractionConfig::default();
        config.tables.data_row_pattern = "(unclosed".to_string();
        assert!(matches!(
            ExtractionEngine::new(config),
            Err(ExtractError::Config(_))
        ));
    }
}
