use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The schema version stamped on every IR output.
/// Bump this when the output shape changes.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Section id used before any section marker has been seen.
pub const SENTINEL_SECTION_ID: &str = "0";

// ===== DOCUMENT IR =====

/// Root of the extracted document.
///
/// `sections` keeps first-seen order; every block lives in exactly one section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentIr {
    pub schema_version: String,
    pub metadata: IrMetadata,
    pub sections: IndexMap<String, Section>,
    pub relationships: Vec<CrossTableLink>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrMetadata {
    pub document_type: String,
    /// Survey round or year (e.g. "2023-24")
    pub version: Option<String>,
    pub known_limitations: Vec<String>,
    pub page_count: u32,
    /// SHA-256 of the decoded layout input; None for in-memory page streams
    pub source_digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub first_page: u32,
    pub blocks: Vec<Block>,
}

impl Section {
    pub fn new(id: &str, first_page: u32) -> Self {
        Self {
            id: id.to_string(),
            first_page,
            blocks: Vec::new(),
        }
    }
}

// ===== BLOCKS =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Instruction(InstructionBlock),
    DataTable(DataTableBlock),
    CheckboxGroup(CheckboxGroupBlock),
}

impl Block {
    pub fn provenance(&self) -> &Provenance {
        match self {
            Block::Instruction(b) => &b.provenance,
            Block::DataTable(b) => &b.provenance,
            Block::CheckboxGroup(b) => &b.provenance,
        }
    }

    /// Wire tag of the variant, as written in the `type` field
    pub fn type_name(&self) -> &'static str {
        match self {
            Block::Instruction(_) => "instruction",
            Block::DataTable(_) => "data_table",
            Block::CheckboxGroup(_) => "checkbox_group",
        }
    }

    /// Short human-readable text used by debug tracing
    pub fn preview_text(&self) -> String {
        match self {
            Block::Instruction(b) => b.text.clone(),
            Block::DataTable(b) => b
                .columns
                .iter()
                .map(|c| c.semantic_key.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
            Block::CheckboxGroup(b) => b
                .items
                .iter()
                .map(|i| i.item.as_str())
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionBlock {
    pub text: String,
    pub semantics: InstructionSemantics,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionSemantics {
    pub question_no: Option<String>,
    pub reference_period: Option<ReferencePeriod>,
    pub units: Vec<String>,
    pub cross_references: Option<Vec<String>>,
    pub logic_indicators: Vec<String>,
    pub applicability: Option<Vec<Applicability>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencePeriod {
    pub value: u32,
    pub unit: PeriodUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Day,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Applicability {
    Rural,
    Urban,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTableBlock {
    pub table_id: String,
    pub is_continuation: bool,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckboxGroupBlock {
    pub table_id: String,
    pub is_continuation: bool,
    pub items: Vec<CheckboxItem>,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxItem {
    pub item: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Outermost to innermost header label, adjacent duplicates collapsed
    pub hierarchy: Vec<String>,
    pub semantic_key: String,
    pub units: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    /// None marks a merged or missing cell
    pub cells: Vec<Option<Cell>>,
    pub warnings: Vec<String>,
}

impl Row {
    pub fn warn(&mut self, tag: &str) {
        self.warnings.push(tag.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Checkbox { raw: String, checkbox: bool },
    Text(String),
}

impl Cell {
    /// The cell's source text (checkbox cells report their raw mark)
    pub fn text(&self) -> &str {
        match self {
            Cell::Checkbox { raw, .. } => raw,
            Cell::Text(text) => text,
        }
    }
}

// Row warning tags
pub const WARN_MERGED_OR_MISSING: &str = "merged_or_missing_cell";
pub const WARN_PADDED_MISSING: &str = "padded_missing_cell";
pub const WARN_TRUNCATED_EXTRA: &str = "truncated_extra_cells";

// ===== PROVENANCE =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub page: u32,
    pub method: ExtractionMethod,
    pub bbox: Option<BoundingBox>,
    /// Unset until a scoring step exists
    pub confidence: Option<f32>,
}

impl Provenance {
    pub fn page_text(page: u32) -> Self {
        Self {
            page,
            method: ExtractionMethod::PageText,
            bbox: None,
            confidence: None,
        }
    }

    pub fn table_grid(page: u32, bbox: Option<BoundingBox>) -> Self {
        Self {
            page,
            method: ExtractionMethod::TableGrid,
            bbox,
            confidence: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    PageText,
    TableGrid,
}

/// Table geometry as reported by the layout engine (PDF points, top-left origin)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

// ===== RELATIONSHIPS & DIAGNOSTICS =====

/// Declarative consistency expectation between two sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossTableLink {
    pub source_section: String,
    pub target_section: String,
    pub rule: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub merged_cells_detected: u64,
    pub pages_with_no_tables: Vec<u32>,
    pub tables_with_header_mismatch: Vec<HeaderMismatch>,
    pub duplicate_semantic_keys: Vec<DuplicateSemanticKey>,
    pub tables_without_data_rows: Vec<TableRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderMismatch {
    pub page: u32,
    pub table: u32,
    /// 0-based index among the table's data rows
    pub row: usize,
    pub expected_cols: usize,
    pub actual_cols: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateSemanticKey {
    pub page: u32,
    pub table: u32,
    pub semantic_key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    pub page: u32,
    pub table: u32,
}
