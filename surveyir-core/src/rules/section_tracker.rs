use crate::config::SectionTrackingConfig;
use crate::context::ExtractionContext;
use crate::error::{ExtractError, ExtractResult};
use regex::Regex;

/// Recognizes section markers in page text and keeps the current section id.
pub struct SectionTracker {
    patterns: Vec<Regex>,
}

impl SectionTracker {
    pub fn new(config: &SectionTrackingConfig) -> ExtractResult<Self> {
        let mut patterns = Vec::new();
        for pattern_str in &config.patterns {
            let regex = Regex::new(pattern_str).map_err(|e| {
                ExtractError::Config(format!("section pattern '{}': {}", pattern_str, e))
            })?;
            if regex.captures_len() < 2 {
                return Err(ExtractError::Config(format!(
                    "section pattern '{}' needs a capture group for the section id",
                    pattern_str
                )));
            }
            patterns.push(regex);
        }
        Ok(Self { patterns })
    }

    /// The earliest section marker on the page, if any
    pub fn detect_section(&self, page_text: &str) -> Option<String> {
        self.patterns
            .iter()
            .filter_map(|pattern| pattern.captures(page_text))
            .filter_map(|cap| cap.get(1).map(|id| (cap.get(0).map_or(0, |m| m.start()), id)))
            .min_by_key(|(start, _)| *start)
            .map(|(_, id)| id.as_str().to_string())
    }

    /// Update the context from a page's text before its blocks are extracted.
    ///
    /// Returns the new section id when the page switched sections.
    pub fn observe_page(&self, ctx: &mut ExtractionContext, page_text: &str) -> Option<String> {
        let section_id = self.detect_section(page_text)?;
        if ctx.enter_section(&section_id) {
            log::debug!("Section marker found: entering section {}", section_id);
            Some(section_id)
        } else {
            None
        }
    }
}
