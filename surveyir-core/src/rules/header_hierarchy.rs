use crate::rules::text_scanner::{detect_units, normalize_whitespace};
use crate::types::Column;
use std::collections::HashSet;

/// All column hierarchies of one table, in column order
pub type HeaderSignature = Vec<Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedHeader {
    pub columns: Vec<Column>,
    /// Semantic keys shared by more than one column, each reported once
    pub duplicate_keys: Vec<String>,
}

impl ResolvedHeader {
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn signature(&self) -> HeaderSignature {
        self.columns.iter().map(|c| c.hierarchy.clone()).collect()
    }
}

/// Collapses stacked header rows (with spanning/merged cells) into one
/// path of labels per column.
pub struct HeaderHierarchyResolver<'a> {
    unit_vocabulary: &'a [String],
    fill_spanning_right: bool,
}

impl<'a> HeaderHierarchyResolver<'a> {
    pub fn new(unit_vocabulary: &'a [String], fill_spanning_right: bool) -> Self {
        Self {
            unit_vocabulary,
            fill_spanning_right,
        }
    }

    pub fn resolve(
        &self,
        header_rows: &[Vec<Option<String>>],
        data_rows: &[Vec<Option<String>>],
    ) -> ResolvedHeader {
        let column_count = if header_rows.is_empty() {
            data_rows.iter().map(|r| r.len()).max().unwrap_or(0)
        } else {
            header_rows.iter().map(|r| r.len()).max().unwrap_or(0)
        };

        let rows: Vec<Vec<Option<String>>> = header_rows
            .iter()
            .map(|row| {
                let normalized: Vec<Option<String>> = row
                    .iter()
                    .map(|cell| cell.as_deref().map(normalize_whitespace))
                    .collect();
                if self.fill_spanning_right {
                    fill_right(normalized)
                } else {
                    normalized
                }
            })
            .collect();

        let mut columns = Vec::with_capacity(column_count);
        let mut seen_keys = HashSet::new();
        let mut duplicate_keys: Vec<String> = Vec::new();

        for col in 0..column_count {
            let hierarchy = column_path(&rows, col);
            let semantic_key = if hierarchy.is_empty() {
                format!("column_{}", col + 1)
            } else {
                semantic_key(&hierarchy)
            };

            if !seen_keys.insert(semantic_key.clone()) && !duplicate_keys.contains(&semantic_key) {
                duplicate_keys.push(semantic_key.clone());
            }

            let units = detect_units(&hierarchy.join(" "), self.unit_vocabulary);
            columns.push(Column {
                hierarchy,
                semantic_key,
                units,
            });
        }

        ResolvedHeader {
            columns,
            duplicate_keys,
        }
    }
}

/// Walk one column top-down; empty cells repeat the last label seen above
fn column_path(rows: &[Vec<Option<String>>], col: usize) -> Vec<String> {
    let mut path = Vec::new();
    let mut last_value: Option<&str> = None;

    for row in rows {
        match row.get(col).and_then(|c| c.as_deref()) {
            Some(value) if !value.is_empty() => {
                last_value = Some(value);
                path.push(value.to_string());
            }
            _ => {
                if let Some(last) = last_value {
                    path.push(last.to_string());
                }
            }
        }
    }

    collapse_adjacent_duplicates(path)
}

/// Null cells take the nearest non-null value to their left
fn fill_right(row: Vec<Option<String>>) -> Vec<Option<String>> {
    let mut carried: Option<String> = None;
    row.into_iter()
        .map(|cell| match cell {
            Some(value) => {
                carried = Some(value.clone());
                Some(value)
            }
            None => carried.clone(),
        })
        .collect()
}

pub fn collapse_adjacent_duplicates(mut path: Vec<String>) -> Vec<String> {
    path.dedup();
    path
}

/// "Food" / "Qty (kg)" -> "food.qty_(kg)"
pub fn semantic_key(hierarchy: &[String]) -> String {
    hierarchy.join(".").to_lowercase().replace(' ', "_")
}
