use super::engine::IrPass;
use crate::types::*;
use anyhow::Result;
use serde::Serialize;
use std::cell::RefCell;

// ValidationRule - structural consistency checks over the finished IR
pub struct ValidationRule {
    last_report: RefCell<Option<ValidationReport>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    pub quality_score: f32,
    pub total_blocks: usize,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    EmptySection {
        section: String,
    },
    HeaderOnlyTable {
        table_id: String,
    },
    DuplicateSemanticKey {
        table_id: String,
        semantic_key: String,
    },
    RowWidthMismatch {
        table_id: String,
        row: usize,
        warning: String,
    },
    ContinuationAtSectionStart {
        section: String,
        table_id: String,
    },
    InvalidBoundingBox {
        page: u32,
        coordinates: String,
    },
}

impl ValidationRule {
    pub fn new() -> Self {
        Self {
            last_report: RefCell::new(None),
        }
    }

    /// Report produced by the most recent `apply`
    pub fn take_report(&self) -> Option<ValidationReport> {
        self.last_report.borrow_mut().take()
    }

    /// Run every check and score the result (1.0 = clean)
    pub fn validate_structure(&self, ir: &DocumentIr) -> ValidationReport {
        let mut issues = Vec::new();
        let total_blocks: usize = ir.sections.values().map(|s| s.blocks.len()).sum();

        for section in ir.sections.values() {
            // 1. Sections that never received content
            if section.blocks.is_empty() {
                issues.push(ValidationIssue::EmptySection {
                    section: section.id.clone(),
                });
            }

            // 2. Table-level checks
            self.validate_tables(section, &mut issues);

            // 3. Geometry
            for block in &section.blocks {
                self.validate_bbox(block.provenance(), &mut issues);
            }
        }

        let quality_score = if total_blocks == 0 {
            1.0
        } else {
            (1.0 - (issues.len() as f32 / total_blocks as f32)).max(0.0)
        };

        ValidationReport {
            issues,
            quality_score,
            total_blocks,
        }
    }

    fn validate_tables(&self, section: &Section, issues: &mut Vec<ValidationIssue>) {
        let mut first_table = true;

        for block in &section.blocks {
            let (table_id, is_continuation) = match block {
                Block::DataTable(t) => (&t.table_id, t.is_continuation),
                Block::CheckboxGroup(g) => (&g.table_id, g.is_continuation),
                Block::Instruction(_) => continue,
            };

            if first_table && is_continuation {
                issues.push(ValidationIssue::ContinuationAtSectionStart {
                    section: section.id.clone(),
                    table_id: table_id.clone(),
                });
            }
            first_table = false;

            match block {
                Block::DataTable(table) => {
                    if table.rows.is_empty() {
                        issues.push(ValidationIssue::HeaderOnlyTable {
                            table_id: table.table_id.clone(),
                        });
                    }

                    let mut seen: Vec<&str> = Vec::new();
                    for column in &table.columns {
                        let key = column.semantic_key.as_str();
                        if seen.contains(&key) {
                            issues.push(ValidationIssue::DuplicateSemanticKey {
                                table_id: table.table_id.clone(),
                                semantic_key: key.to_string(),
                            });
                        } else {
                            seen.push(key);
                        }
                    }

                    for (index, row) in table.rows.iter().enumerate() {
                        if let Some(warning) = row
                            .warnings
                            .iter()
                            .find(|w| *w == WARN_PADDED_MISSING || *w == WARN_TRUNCATED_EXTRA)
                        {
                            issues.push(ValidationIssue::RowWidthMismatch {
                                table_id: table.table_id.clone(),
                                row: index,
                                warning: warning.clone(),
                            });
                        }
                    }
                }
                Block::CheckboxGroup(group) => {
                    if group.items.is_empty() {
                        issues.push(ValidationIssue::HeaderOnlyTable {
                            table_id: group.table_id.clone(),
                        });
                    }
                }
                Block::Instruction(_) => {}
            }
        }
    }

    fn validate_bbox(&self, provenance: &Provenance, issues: &mut Vec<ValidationIssue>) {
        if let Some(bbox) = &provenance.bbox {
            if bbox.x1 < bbox.x0 || bbox.bottom < bbox.top || bbox.x0 < 0.0 || bbox.top < 0.0 {
                issues.push(ValidationIssue::InvalidBoundingBox {
                    page: provenance.page,
                    coordinates: format!(
                        "x0:{:.1}, top:{:.1}, x1:{:.1}, bottom:{:.1}",
                        bbox.x0, bbox.top, bbox.x1, bbox.bottom
                    ),
                });
            }
        }
    }

    /// Log the validation report
    pub fn log_validation_report(&self, report: &ValidationReport) {
        log::info!("📊 Validation Report:");
        log::info!("   📈 Quality Score: {:.2}/1.00", report.quality_score);
        log::info!("   🔍 Issues Found: {}", report.issues.len());

        if report.issues.is_empty() {
            log::info!("   ✅ No structural issues detected!");
            return;
        }

        for issue in &report.issues {
            match issue {
                ValidationIssue::EmptySection { section } => {
                    log::warn!("   📭 Section {} has no blocks", section);
                }
                ValidationIssue::HeaderOnlyTable { table_id } => {
                    log::warn!("   🏷️  Table {} has no data rows", table_id);
                }
                ValidationIssue::DuplicateSemanticKey {
                    table_id,
                    semantic_key,
                } => {
                    log::warn!(
                        "   🔁 Table {} repeats column key \"{}\"",
                        table_id,
                        semantic_key
                    );
                }
                ValidationIssue::RowWidthMismatch {
                    table_id,
                    row,
                    warning,
                } => {
                    log::warn!("   📏 Table {} row {}: {}", table_id, row, warning);
                }
                ValidationIssue::ContinuationAtSectionStart { section, table_id } => {
                    log::warn!(
                        "   🧵 Table {} opens section {} but continues an earlier header",
                        table_id,
                        section
                    );
                }
                ValidationIssue::InvalidBoundingBox { page, coordinates } => {
                    log::warn!("   📍 Invalid table bbox on page {}: {}", page, coordinates);
                }
            }
        }
    }
}

impl Default for ValidationRule {
    fn default() -> Self {
        Self::new()
    }
}

impl IrPass for ValidationRule {
    fn apply(&self, ir: DocumentIr) -> Result<DocumentIr> {
        let report = self.validate_structure(&ir);
        self.log_validation_report(&report);
        *self.last_report.borrow_mut() = Some(report);
        Ok(ir)
    }

    fn name(&self) -> &str {
        "StructuralValidation"
    }
}
