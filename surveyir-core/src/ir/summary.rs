use crate::types::*;
use serde::Serialize;

/// Document-level counts for reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IrSummary {
    pub sections: usize,
    pub instruction_blocks: usize,
    pub data_tables: usize,
    pub checkbox_groups: usize,
    pub continuation_tables: usize,
    pub data_rows: usize,
    pub checkbox_items: usize,
    pub selected_items: usize,
    pub rows_with_warnings: usize,
    pub relationships: usize,
}

impl IrSummary {
    pub fn compute(ir: &DocumentIr) -> Self {
        let mut summary = IrSummary {
            sections: ir.sections.len(),
            relationships: ir.relationships.len(),
            ..IrSummary::default()
        };

        for (_, block) in ir.blocks() {
            match block {
                Block::Instruction(_) => summary.instruction_blocks += 1,
                Block::DataTable(table) => {
                    summary.data_tables += 1;
                    summary.data_rows += table.rows.len();
                    summary.rows_with_warnings +=
                        table.rows.iter().filter(|r| !r.warnings.is_empty()).count();
                    if table.is_continuation {
                        summary.continuation_tables += 1;
                    }
                }
                Block::CheckboxGroup(group) => {
                    summary.checkbox_groups += 1;
                    summary.checkbox_items += group.items.len();
                    summary.selected_items += group.items.iter().filter(|i| i.selected).count();
                    if group.is_continuation {
                        summary.continuation_tables += 1;
                    }
                }
            }
        }

        summary
    }

    pub fn total_blocks(&self) -> usize {
        self.instruction_blocks + self.data_tables + self.checkbox_groups
    }
}
