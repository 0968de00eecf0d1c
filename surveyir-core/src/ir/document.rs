use super::serialization::write_atomically;
use crate::types::*;
use anyhow::Result;
use std::path::Path;

impl DocumentIr {
    /// Every block in document order, with the section holding it
    pub fn blocks(&self) -> impl Iterator<Item = (&Section, &Block)> {
        self.sections
            .values()
            .flat_map(|section| section.blocks.iter().map(move |block| (section, block)))
    }

    pub fn block_count(&self) -> usize {
        self.sections.values().map(|s| s.blocks.len()).sum()
    }

    pub fn data_tables(&self) -> impl Iterator<Item = (&Section, &DataTableBlock)> {
        self.blocks().filter_map(|(section, block)| match block {
            Block::DataTable(table) => Some((section, table)),
            _ => None,
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the IR as pretty JSON; the target is replaced only once fully written
    pub fn save_to_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json_pretty()?;
        write_atomically(path.as_ref(), json.as_bytes())?;
        Ok(())
    }

    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn sample_ir() -> DocumentIr {
        let mut section = Section::new("2", 1);
        section.blocks.push(Block::Instruction(InstructionBlock {
            text: "If yes, go to Q2.3".to_string(),
            semantics: InstructionSemantics {
                question_no: Some("Q2.3".to_string()),
                logic_indicators: vec!["go to".to_string(), "if yes".to_string()],
                ..InstructionSemantics::default()
            },
            provenance: Provenance::page_text(1),
        }));
        section.blocks.push(Block::DataTable(DataTableBlock {
            table_id: "2_P1_T1".to_string(),
            is_continuation: false,
            columns: vec![Column {
                hierarchy: vec!["Food".to_string(), "Qty (kg)".to_string()],
                semantic_key: "food.qty_(kg)".to_string(),
                units: vec!["kg".to_string()],
            }],
            rows: vec![Row {
                cells: vec![None, Some(Cell::Checkbox { raw: "X".to_string(), checkbox: true })],
                warnings: vec![WARN_MERGED_OR_MISSING.to_string()],
            }],
            provenance: Provenance::table_grid(
                1,
                Some(BoundingBox { x0: 1.0, top: 2.0, x1: 3.0, bottom: 4.0 }),
            ),
        }));

        let mut sections = IndexMap::new();
        sections.insert("2".to_string(), section);
        DocumentIr {
            schema_version: SCHEMA_VERSION.to_string(),
            metadata: IrMetadata {
                document_type: "LCES Questionnaire".to_string(),
                page_count: 1,
                ..IrMetadata::default()
            },
            sections,
            relationships: Vec::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    #[test]
    fn wire_format_field_names() {
        let value = serde_json::to_value(sample_ir()).unwrap();
        let blocks = &value["sections"]["2"]["blocks"];

        assert_eq!(blocks[0]["type"], "instruction");
        assert_eq!(blocks[0]["provenance"]["method"], "page_text");
        assert_eq!(blocks[0]["provenance"]["bbox"], serde_json::Value::Null);
        assert_eq!(blocks[0]["provenance"]["confidence"], serde_json::Value::Null);
        assert_eq!(blocks[0]["semantics"]["cross_references"], serde_json::Value::Null);
        assert_eq!(blocks[0]["semantics"]["logic_indicators"], json!(["go to", "if yes"]));

        assert_eq!(blocks[1]["type"], "data_table");
        assert_eq!(blocks[1]["provenance"]["method"], "table_grid");
        assert_eq!(
            blocks[1]["provenance"]["bbox"],
            json!({"x0": 1.0, "top": 2.0, "x1": 3.0, "bottom": 4.0})
        );
        assert_eq!(blocks[1]["rows"][0]["cells"], json!([null, {"raw": "X", "checkbox": true}]));
        assert_eq!(value["diagnostics"]["merged_cells_detected"], 0);
        assert_eq!(value["metadata"]["version"], serde_json::Value::Null);
    }

    #[test]
    fn json_reads_back_identically() {
        let ir = sample_ir();
        let parsed: DocumentIr = serde_json::from_str(&ir.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, ir);
    }

    #[test]
    fn block_iteration_follows_sections() {
        let ir = sample_ir();
        assert_eq!(ir.block_count(), 2);
        let types: Vec<&str> = ir.blocks().map(|(_, b)| b.type_name()).collect();
        assert_eq!(types, vec!["instruction", "data_table"]);
        assert_eq!(ir.data_tables().count(), 1);
    }

    #[test]
    fn save_replaces_target_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ir.json");
        std::fs::write(&path, "stale").unwrap();

        sample_ir().save_to_json(&path).unwrap();
        let loaded = DocumentIr::load_from_json(&path).unwrap();
        assert_eq!(loaded, sample_ir());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
