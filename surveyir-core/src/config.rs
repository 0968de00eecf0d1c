use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_document_type() -> String {
    "LCES Questionnaire".to_string()
}

fn default_known_limitations() -> Vec<String> {
    vec![
        "Section attribution follows the last section marker seen; instructions referring to other sections can switch it".to_string(),
        "Column attribution assumes header rows precede the first numbered data row".to_string(),
        "Checkbox interpretation relies on literal marks in the cell text".to_string(),
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub text_scanner: TextScannerConfig,
    #[serde(default)]
    pub sections: SectionTrackingConfig,
    #[serde(default)]
    pub tables: TableConfig,
    #[serde(default)]
    pub checkbox_groups: CheckboxGroupConfig,
    #[serde(default)]
    pub relationships: RelationshipConfig,
    /// Passes run once over the finished IR, in order
    #[serde(default = "default_post_passes")]
    pub post_passes: Vec<PassConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "default_document_type")]
    pub document_type: String,
    /// Fixed survey round; detected from the first pages when unset
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default = "default_known_limitations")]
    pub known_limitations: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            document_type: default_document_type(),
            version: None,
            known_limitations: default_known_limitations(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextScannerConfig {
    /// Substrings marking a line as an instruction (matched case-insensitively)
    #[serde(default = "default_instruction_keywords")]
    pub instruction_keywords: Vec<String>,
    /// Unit tokens detected in instructions and column headers
    #[serde(default = "default_unit_vocabulary")]
    pub unit_vocabulary: Vec<String>,
}

fn default_instruction_keywords() -> Vec<String> {
    [
        "go to",
        "skip",
        "if yes",
        "if no",
        "only for",
        "applicable",
        "note",
        "to be filled",
        "otherwise",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_unit_vocabulary() -> Vec<String> {
    ["kg", "gm", "litre", "rupees", "₹", "days", "months", "number"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for TextScannerConfig {
    fn default() -> Self {
        Self {
            instruction_keywords: default_instruction_keywords(),
            unit_vocabulary: default_unit_vocabulary(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionTrackingConfig {
    /// Regexes whose first capture group is the section id
    #[serde(default = "default_section_patterns")]
    pub patterns: Vec<String>,
    /// Section that receives blocks before the first marker
    #[serde(default = "default_initial_section_id")]
    pub initial_section_id: String,
}

fn default_section_patterns() -> Vec<String> {
    vec![r"(?i)SECTION\s*\[?(\d+(?:\.\d+)*)\]?".to_string()]
}

fn default_initial_section_id() -> String {
    crate::types::SENTINEL_SECTION_ID.to_string()
}

impl Default for SectionTrackingConfig {
    fn default() -> Self {
        Self {
            patterns: default_section_patterns(),
            initial_section_id: default_initial_section_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Full-match pattern for the trimmed cell that opens the data rows
    #[serde(default = "default_data_row_pattern")]
    pub data_row_pattern: String,
    /// Copy a null header cell from its left neighbour before resolving columns
    #[serde(default)]
    pub fill_spanning_right: bool,
    /// Lower-cased cell values read as a ticked box
    #[serde(default = "default_checkbox_true_values")]
    pub checkbox_true_values: Vec<String>,
    /// Lower-cased cell values read as an empty box
    #[serde(default = "default_checkbox_false_values")]
    pub checkbox_false_values: Vec<String>,
}

fn default_data_row_pattern() -> String {
    r"(?i)^(?:Q?\d+(?:\.\d+)*\.?|item\s*no\.?)$".to_string()
}

fn default_checkbox_true_values() -> Vec<String> {
    ["x", "✓", "✔", "yes"].iter().map(|s| s.to_string()).collect()
}

fn default_checkbox_false_values() -> Vec<String> {
    ["", "no"].iter().map(|s| s.to_string()).collect()
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            data_row_pattern: default_data_row_pattern(),
            fill_spanning_right: false,
            checkbox_true_values: default_checkbox_true_values(),
            checkbox_false_values: default_checkbox_false_values(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckboxGroupConfig {
    /// Section ids whose tables are item/selection lists
    #[serde(default = "default_checkbox_sections")]
    pub sections: Vec<String>,
    /// Substrings of the third cell that mean the item is selected
    #[serde(default = "default_selected_marks")]
    pub selected_marks: Vec<String>,
    #[serde(default = "default_min_cells")]
    pub min_cells: usize,
}

fn default_checkbox_sections() -> Vec<String> {
    vec!["4.1.2".to_string(), "4.1.3".to_string()]
}

fn default_selected_marks() -> Vec<String> {
    ["X", "1", "✔"].iter().map(|s| s.to_string()).collect()
}

fn default_min_cells() -> usize {
    3
}

impl Default for CheckboxGroupConfig {
    fn default() -> Self {
        Self {
            sections: default_checkbox_sections(),
            selected_marks: default_selected_marks(),
            min_cells: default_min_cells(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipConfig {
    #[serde(default = "default_relationship_rules")]
    pub rules: Vec<RelationshipRuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipRuleConfig {
    pub source_section: String,
    pub target_section: String,
    pub rule: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_relationship_rules() -> Vec<RelationshipRuleConfig> {
    vec![RelationshipRuleConfig {
        source_section: "3".to_string(),
        target_section: "2".to_string(),
        rule: "row count of section 3 member table should match household-size value in section 2"
            .to_string(),
        enabled: true,
    }]
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            rules: default_relationship_rules(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassConfig {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_post_passes() -> Vec<PassConfig> {
    vec![
        PassConfig {
            name: "CrossTableRelationships".to_string(),
            enabled: true,
        },
        PassConfig {
            name: "StructuralValidation".to_string(),
            enabled: true,
        },
    ]
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            document: DocumentConfig::default(),
            text_scanner: TextScannerConfig::default(),
            sections: SectionTrackingConfig::default(),
            tables: TableConfig::default(),
            checkbox_groups: CheckboxGroupConfig::default(),
            relationships: RelationshipConfig::default(),
            post_passes: default_post_passes(),
        }
    }
}

impl ExtractionConfig {
    /// Load config from a YAML file; omitted fields take their defaults
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: ExtractionConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }
}

/// Named built-in presets plus any configs loaded at runtime.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    configs: BTreeMap<String, ExtractionConfig>,
    default_config: ExtractionConfig,
}

pub const DEFAULT_PRESET: &str = "lces";

impl ConfigManager {
    pub fn new() -> Self {
        let mut manager = Self {
            configs: BTreeMap::new(),
            default_config: ExtractionConfig::default(),
        };
        manager.load_builtin_configs();
        manager
    }

    /// Look up a preset, falling back to the LCES defaults for unknown names
    pub fn get_config(&self, name: &str) -> &ExtractionConfig {
        self.configs.get(name).unwrap_or_else(|| {
            log::warn!("Unknown preset '{}', using '{}'", name, DEFAULT_PRESET);
            &self.default_config
        })
    }

    pub fn has_preset(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    pub fn preset_names(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(|k| k.as_str())
    }

    pub fn load_config_from_file<P: AsRef<Path>>(&mut self, name: &str, path: P) -> Result<()> {
        let config = ExtractionConfig::load_from_file(path)?;
        self.configs.insert(name.to_string(), config);
        Ok(())
    }

    /// Config for a run: an explicit file wins over the named preset.
    ///
    /// A file that cannot be read or parsed is an error, as is an unknown
    /// preset name.
    pub fn resolve(&mut self, config_path: Option<&Path>, preset: &str) -> Result<ExtractionConfig> {
        if let Some(path) = config_path {
            let name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("custom")
                .to_string();
            self.load_config_from_file(&name, path)?;
            log::info!("📋 Loaded config '{}' from {}", name, path.display());
            return Ok(self.get_config(&name).clone());
        }

        if !self.has_preset(preset) {
            let known: Vec<&str> = self.preset_names().collect();
            bail!("unknown preset '{}' (available: {})", preset, known.join(", "));
        }
        Ok(self.get_config(preset).clone())
    }

    fn load_builtin_configs(&mut self) {
        self.configs
            .insert(DEFAULT_PRESET.to_string(), ExtractionConfig::default());

        // Generic questionnaires: same scanning, no survey-specific tables or rules
        let generic_config = ExtractionConfig {
            document: DocumentConfig {
                document_type: "Questionnaire".to_string(),
                ..DocumentConfig::default()
            },
            checkbox_groups: CheckboxGroupConfig {
                sections: Vec::new(),
                ..CheckboxGroupConfig::default()
            },
            relationships: RelationshipConfig { rules: Vec::new() },
            ..ExtractionConfig::default()
        };
        self.configs.insert("generic".to_string(), generic_config);
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
