use crate::config::{CheckboxGroupConfig, TableConfig};
use crate::types::*;

/// A data row whose width differs from the resolved column count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMismatch {
    pub row: usize,
    pub actual_cols: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterpretedRows {
    pub rows: Vec<Row>,
    pub mismatches: Vec<RowMismatch>,
    pub merged_cells: u64,
}

/// Turns raw data rows into typed, column-aligned rows, or compacts them
/// into checkbox items for selection-list sections.
pub struct RowInterpreter<'a> {
    tables: &'a TableConfig,
    checkbox_groups: &'a CheckboxGroupConfig,
}

impl<'a> RowInterpreter<'a> {
    pub fn new(tables: &'a TableConfig, checkbox_groups: &'a CheckboxGroupConfig) -> Self {
        Self {
            tables,
            checkbox_groups,
        }
    }

    pub fn is_checkbox_section(&self, section_id: &str) -> bool {
        self.checkbox_groups.sections.iter().any(|s| s == section_id)
    }

    /// None stays None (merged/missing); checkbox marks become `{raw, checkbox}`
    pub fn interpret_cell(&self, raw: Option<&str>) -> Option<Cell> {
        let trimmed = raw?.trim();
        let lowered = trimmed.to_lowercase();

        if self.tables.checkbox_true_values.iter().any(|v| *v == lowered) {
            Some(Cell::Checkbox {
                raw: trimmed.to_string(),
                checkbox: true,
            })
        } else if self.tables.checkbox_false_values.iter().any(|v| *v == lowered) {
            Some(Cell::Checkbox {
                raw: trimmed.to_string(),
                checkbox: false,
            })
        } else {
            Some(Cell::Text(trimmed.to_string()))
        }
    }

    pub fn interpret_rows(
        &self,
        data_rows: &[Vec<Option<String>>],
        column_count: usize,
    ) -> InterpretedRows {
        let mut result = InterpretedRows::default();

        for (index, source) in data_rows.iter().enumerate() {
            let mut row = Row::default();

            if source.len() != column_count {
                result.mismatches.push(RowMismatch {
                    row: index,
                    actual_cols: source.len(),
                });
            }

            for cell in source.iter().take(column_count) {
                let interpreted = self.interpret_cell(cell.as_deref());
                if interpreted.is_none() {
                    row.warn(WARN_MERGED_OR_MISSING);
                    result.merged_cells += 1;
                }
                row.cells.push(interpreted);
            }

            if source.len() > column_count {
                row.warn(WARN_TRUNCATED_EXTRA);
            } else if source.len() < column_count {
                row.cells.resize(column_count, None);
                row.warn(WARN_PADDED_MISSING);
            }

            result.rows.push(row);
        }

        result
    }

    /// Item/selection rows: second cell names the item, third carries the mark
    pub fn compact_checkbox_group(&self, data_rows: &[Vec<Option<String>>]) -> Vec<CheckboxItem> {
        data_rows
            .iter()
            .filter(|row| row.len() >= self.checkbox_groups.min_cells.max(2))
            .filter_map(|row| {
                let item = row[1].as_deref().map(str::trim).filter(|s| !s.is_empty())?;
                let mark = row.get(2).and_then(|c| c.as_deref()).unwrap_or("");
                let selected = self
                    .checkbox_groups
                    .selected_marks
                    .iter()
                    .any(|m| mark.contains(m.as_str()));
                Some(CheckboxItem {
                    item: item.to_string(),
                    selected,
                })
            })
            .collect()
    }
}
