use crate::error::{ExtractError, ExtractResult};
use crate::sources::source::LayoutPage;
use crate::types::BoundingBox;
use serde::{Deserialize, Serialize};

/// Raw cell grid: rows of nullable cell strings (None = merged/missing)
pub type CellGrid = Vec<Vec<Option<String>>>;

/// A decoded layout dump: the whole document as pages of text and grids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutDocument {
    pub pages: Vec<PageLayout>,
}

impl LayoutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn table_count(&self) -> usize {
        self.pages.iter().map(|p| p.tables.len()).sum()
    }

    /// Reject dumps the pipeline cannot attribute provenance for
    pub fn validate(&self) -> ExtractResult<()> {
        if let Some(page) = self.pages.iter().find(|p| p.page_number == 0) {
            return Err(ExtractError::LayoutFormat(format!(
                "page numbers are 1-based, found page 0 with {} table(s)",
                page.tables.len()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    pub page_number: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tables: Vec<TableRegion>,
}

impl LayoutPage for PageLayout {
    fn page_number(&self) -> u32 {
        self.page_number
    }

    fn text(&self) -> &str {
        &self.text
    }

    fn tables(&self) -> ExtractResult<Vec<TableRegion>> {
        Ok(self.tables.clone())
    }
}

/// One rectangular table detected on a page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub rows: CellGrid,
}

impl TableRegion {
    pub fn new(rows: CellGrid, bbox: Option<BoundingBox>) -> Self {
        Self { bbox, rows }
    }

    /// Row-major grid of nullable cell strings
    pub fn extract(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }
}
