// Extraction rules, one module per pipeline stage:
// - engine.rs: ExtractionEngine, post-pass dispatch and debug tracing
// - text_scanner.rs: instruction lines and their semantic tags
// - section_tracker.rs: section markers across pages
// - table_regions.rs: header/data split of cell grids
// - header_hierarchy.rs: column paths from stacked header rows
// - row_interpreter.rs: cell typing, alignment, checkbox groups
// - relationships.rs: cross-section consistency links (post-pass)
// - validation.rs: structural checks over the finished IR (post-pass)

pub mod engine;
pub mod header_hierarchy;
pub mod relationships;
pub mod row_interpreter;
pub mod section_tracker;
pub mod table_regions;
pub mod text_scanner;
pub mod validation;

pub use engine::*;
pub use validation::{ValidationIssue, ValidationReport};
