use crate::rules::text_scanner::normalize_whitespace;
use crate::types::*;
use anyhow::{anyhow, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// The full sectioned document
    #[default]
    Ir,
    /// One flat record per data-table row
    Records,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ir" | "document" => Ok(OutputFormat::Ir),
            "records" | "flat" => Ok(OutputFormat::Records),
            other => Err(anyhow!("unknown output format '{}' (expected ir or records)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordsDocument {
    pub format: String,
    pub schema_version: String,
    pub document_type: String,
    pub records: Vec<FlatRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatRecord {
    pub section: String,
    pub page: u32,
    pub table: String,
    /// Semantic key -> cell text; empty cells are left out
    pub values: IndexMap<String, String>,
}

impl DocumentIr {
    pub fn to_records(&self) -> RecordsDocument {
        let records = self
            .data_tables()
            .flat_map(|(section, table)| {
                table.rows.iter().filter_map(move |row| {
                    let mut values = IndexMap::new();
                    for (column, cell) in table.columns.iter().zip(&row.cells) {
                        let text = match cell {
                            Some(cell) => normalize_whitespace(cell.text()),
                            None => continue,
                        };
                        if !text.is_empty() {
                            values.entry(column.semantic_key.clone()).or_insert(text);
                        }
                    }
                    (!values.is_empty()).then(|| FlatRecord {
                        section: section.id.clone(),
                        page: table.provenance.page,
                        table: table.table_id.clone(),
                        values,
                    })
                })
            })
            .collect();

        RecordsDocument {
            format: "records".to_string(),
            schema_version: self.schema_version.clone(),
            document_type: self.metadata.document_type.clone(),
            records,
        }
    }

    pub fn to_format_string(&self, format: OutputFormat) -> Result<String> {
        Ok(match format {
            OutputFormat::Ir => serde_json::to_string_pretty(self)?,
            OutputFormat::Records => serde_json::to_string_pretty(&self.to_records())?,
        })
    }

    pub fn save_with_format<P: AsRef<Path>>(&self, path: P, format: OutputFormat) -> Result<()> {
        let json = self.to_format_string(format)?;
        write_atomically(path.as_ref(), json.as_bytes())?;
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    path.with_file_name(format!(".{}.tmp", file_name))
}

/// Write to a sibling temp file, then rename over `path`
pub fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temp_path = temp_path_for(path);
    if let Err(e) = fs::write(&temp_path, contents).and_then(|_| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    Ok(())
}
