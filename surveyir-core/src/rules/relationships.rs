use super::engine::IrPass;
use crate::config::{RelationshipConfig, RelationshipRuleConfig};
use crate::types::*;
use anyhow::Result;
use indexmap::IndexMap;

/// Emit one link per enabled rule whose two sections both exist
pub fn build_relationships(
    sections: &IndexMap<String, Section>,
    rules: &[RelationshipRuleConfig],
) -> Vec<CrossTableLink> {
    rules
        .iter()
        .filter(|rule| rule.enabled)
        .filter(|rule| {
            sections.contains_key(&rule.source_section) && sections.contains_key(&rule.target_section)
        })
        .map(|rule| CrossTableLink {
            source_section: rule.source_section.clone(),
            target_section: rule.target_section.clone(),
            rule: rule.rule.clone(),
        })
        .collect()
}

// CrossTableRelationshipRule - declarative consistency links between sections
pub struct CrossTableRelationshipRule<'a> {
    config: &'a RelationshipConfig,
}

impl<'a> CrossTableRelationshipRule<'a> {
    pub fn new(config: &'a RelationshipConfig) -> Self {
        Self { config }
    }
}

impl IrPass for CrossTableRelationshipRule<'_> {
    fn apply(&self, mut ir: DocumentIr) -> Result<DocumentIr> {
        ir.relationships = build_relationships(&ir.sections, &self.config.rules);
        log::info!("🔗 {} cross-table relationship(s)", ir.relationships.len());
        Ok(ir)
    }

    fn name(&self) -> &str {
        "CrossTableRelationships"
    }
}
