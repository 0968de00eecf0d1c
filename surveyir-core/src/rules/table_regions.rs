use crate::config::TableConfig;
use crate::error::{ExtractError, ExtractResult};
use regex::Regex;

/// A cell grid split at the first data row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifiedRegion<'a> {
    pub header_rows: &'a [Vec<Option<String>>],
    pub data_rows: &'a [Vec<Option<String>>],
}

impl ClassifiedRegion<'_> {
    pub fn has_data_rows(&self) -> bool {
        !self.data_rows.is_empty()
    }
}

/// Splits raw table grids into header rows and data rows.
///
/// The first row with a cell that is entirely a question/item number
/// ("1", "1.", "Q1.2", "4.1.2", "Item No.") opens the data rows; everything above is header.
pub struct TableRegionClassifier {
    data_row_pattern: Regex,
}

impl TableRegionClassifier {
    pub fn new(config: &TableConfig) -> ExtractResult<Self> {
        let data_row_pattern = Regex::new(&config.data_row_pattern).map_err(|e| {
            ExtractError::Config(format!(
                "data row pattern '{}': {}",
                config.data_row_pattern, e
            ))
        })?;
        Ok(Self { data_row_pattern })
    }

    pub fn is_data_row(&self, row: &[Option<String>]) -> bool {
        row.iter()
            .flatten()
            .any(|cell| self.data_row_pattern.is_match(cell.trim()))
    }

    pub fn classify<'a>(&self, grid: &'a [Vec<Option<String>>]) -> ClassifiedRegion<'a> {
        let split = grid
            .iter()
            .position(|row| self.is_data_row(row))
            .unwrap_or(grid.len());
        let (header_rows, data_rows) = grid.split_at(split);
        ClassifiedRegion {
            header_rows,
            data_rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[Option<&str>]) -> Vec<Option<String>> {
        cells.iter().map(|c| c.map(|s| s.to_string())).collect()
    }

    fn classifier() -> TableRegionClassifier {
        TableRegionClassifier::new(&TableConfig::default()).unwrap()
    }

    #[test]
    fn splits_at_first_numbered_row() {
        let grid = vec![
            row(&[Some("Food"), Some("Food")]),
            row(&[Some("Item"), Some("Qty (kg)")]),
            row(&[Some(" Q1.1 "), Some("12")]),
            row(&[Some("Total"), Some("30")]),
        ];
        let region = classifier().classify(&grid);
        assert_eq!(region.header_rows.len(), 2);
        assert_eq!(region.data_rows.len(), 2);
        assert_eq!(region.data_rows[1][0].as_deref(), Some("Total"));
    }

    #[test]
    fn item_no_label_opens_data_rows() {
        let grid = vec![
            row(&[Some("Description"), Some("Code")]),
            row(&[Some("Item No."), None]),
            row(&[Some("1"), Some("Rice")]),
        ];
        let region = classifier().classify(&grid);
        assert_eq!(region.header_rows.len(), 1);
        assert_eq!(region.data_rows.len(), 2);
    }

    #[test]
    fn numbers_inside_text_do_not_match() {
        let grid = vec![
            row(&[Some("Land (in 2 acres)"), Some("Q1.1 value")]),
            row(&[Some("1a"), None]),
        ];
        let region = classifier().classify(&grid);
        assert_eq!(region.header_rows.len(), 2);
        assert!(!region.has_data_rows());
    }

    #[test]
    fn header_only_and_empty_grids() {
        let grid = vec![row(&[Some("Name"), Some("Age")])];
        assert!(!classifier().classify(&grid).has_data_rows());

        let empty: Vec<Vec<Option<String>>> = Vec::new();
        let region = classifier().classify(&empty);
        assert!(region.header_rows.is_empty() && region.data_rows.is_empty());
    }

    #[test]
    fn dotted_serials_open_data_rows() {
        for serial in ["1.", "1.1.1", "Q4.1.2", "12.3."] {
            let grid = vec![row(&[Some("Sl. No."), Some("Item")]), row(&[Some(serial), Some("Rice")])];
            let region = classifier().classify(&grid);
            assert_eq!(region.header_rows.len(), 1, "serial {serial}");
            assert_eq!(region.data_rows.len(), 1, "serial {serial}");
        }
        assert!(!classifier().is_data_row(&row(&[Some("1..2"), Some("1.a")])));
    }

    #[test]
    fn first_row_can_be_data() {
        let grid = vec![row(&[Some("2.1"), Some("5")]), row(&[Some("x"), None])];
        let region = classifier().classify(&grid);
        assert!(region.header_rows.is_empty());
        assert_eq!(region.data_rows.len(), 2);
    }
}
