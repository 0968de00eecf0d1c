use crate::types::*;
use indexmap::IndexMap;

/// Accumulates sections and diagnostics while pages are processed.
///
/// Sections are created on first use and only ever grow by appending.
#[derive(Debug, Clone, Default)]
pub struct IrBuilder {
    sections: IndexMap<String, Section>,
    diagnostics: Diagnostics,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a section, creating it with `page` as its first page if unseen
    pub fn ensure_section(&mut self, section_id: &str, page: u32) -> &mut Section {
        self.sections
            .entry(section_id.to_string())
            .or_insert_with(|| {
                log::debug!("📁 New section {} (page {})", section_id, page);
                Section::new(section_id, page)
            })
    }

    pub fn append_block(&mut self, section_id: &str, page: u32, block: Block) {
        self.ensure_section(section_id, page).blocks.push(block);
    }

    pub fn record_merged_cells(&mut self, count: u64) {
        self.diagnostics.merged_cells_detected += count;
    }

    pub fn record_page_without_tables(&mut self, page: u32) {
        self.diagnostics.pages_with_no_tables.push(page);
    }

    pub fn record_header_mismatch(&mut self, mismatch: HeaderMismatch) {
        log::warn!(
            "Page {} table {} row {}: {} cell(s), header has {}",
            mismatch.page,
            mismatch.table,
            mismatch.row,
            mismatch.actual_cols,
            mismatch.expected_cols
        );
        self.diagnostics.tables_with_header_mismatch.push(mismatch);
    }

    pub fn record_duplicate_key(&mut self, page: u32, table: u32, semantic_key: &str) {
        log::warn!(
            "Page {} table {}: duplicate column key '{}'",
            page,
            table,
            semantic_key
        );
        self.diagnostics
            .duplicate_semantic_keys
            .push(DuplicateSemanticKey {
                page,
                table,
                semantic_key: semantic_key.to_string(),
            });
    }

    pub fn record_table_without_data_rows(&mut self, page: u32, table: u32) {
        self.diagnostics
            .tables_without_data_rows
            .push(TableRef { page, table });
    }

    pub fn sections(&self) -> &IndexMap<String, Section> {
        &self.sections
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn block_count(&self) -> usize {
        self.sections.values().map(|s| s.blocks.len()).sum()
    }

    /// Freeze into a document; relationships are filled by post-passes
    pub fn build(self, metadata: IrMetadata) -> DocumentIr {
        log::info!(
            "🏗️  Built IR: {} section(s), {} block(s)",
            self.sections.len(),
            self.block_count()
        );
        DocumentIr {
            schema_version: SCHEMA_VERSION.to_string(),
            metadata,
            sections: self.sections,
            relationships: Vec::new(),
            diagnostics: self.diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instruction(text: &str, page: u32) -> Block {
        Block::Instruction(InstructionBlock {
            text: text.to_string(),
            semantics: InstructionSemantics::default(),
            provenance: Provenance::page_text(page),
        })
    }

    #[test]
    fn sections_keep_first_seen_order_and_first_page() {
        let mut builder = IrBuilder::new();
        builder.append_block("0", 1, instruction("Note: use block letters", 1));
        builder.ensure_section("2", 2);
        builder.append_block("3", 4, instruction("Q3.1", 4));
        builder.append_block("2", 5, instruction("Q2.1", 5));

        let ir = builder.build(IrMetadata::default());
        let ids: Vec<&str> = ir.sections.keys().map(|k| k.as_str()).collect();
        assert_eq!(ids, vec!["0", "2", "3"]);
        assert_eq!(ir.sections["2"].first_page, 2);
        assert_eq!(ir.sections["2"].blocks.len(), 1);
        assert_eq!(ir.schema_version, SCHEMA_VERSION);
        assert!(ir.relationships.is_empty());
    }

    #[test]
    fn appends_never_reorder_existing_blocks() {
        let mut builder = IrBuilder::new();
        builder.append_block("1", 1, instruction("first", 1));
        builder.append_block("1", 1, instruction("second", 1));
        let before = builder.sections()["1"].blocks.clone();

        builder.append_block("1", 2, instruction("third", 2));
        let after = &builder.sections()["1"].blocks;
        assert_eq!(&after[..2], before.as_slice());
        assert_eq!(builder.block_count(), 3);
    }

    #[test]
    fn diagnostics_accumulate() {
        let mut builder = IrBuilder::new();
        builder.record_merged_cells(2);
        builder.record_merged_cells(3);
        builder.record_page_without_tables(7);
        builder.record_table_without_data_rows(1, 2);
        builder.record_duplicate_key(1, 1, "code");

        let diagnostics = builder.diagnostics();
        assert_eq!(diagnostics.merged_cells_detected, 5);
        assert_eq!(diagnostics.pages_with_no_tables, vec![7]);
        assert_eq!(diagnostics.tables_without_data_rows, vec![TableRef { page: 1, table: 2 }]);
        assert_eq!(diagnostics.duplicate_semantic_keys[0].semantic_key, "code");
    }
}
