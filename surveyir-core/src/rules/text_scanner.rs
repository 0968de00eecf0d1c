use crate::config::TextScannerConfig;
use crate::types::*;
use regex::Regex;
use std::sync::LazyLock;

// Pre-compiled regexes for line classification
static CROSS_REFERENCE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(section|item)\s+(\d+(?:\.\d+)?)").unwrap());

static QUESTION_NO_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Q?\d+\.\d+").unwrap());

static REFERENCE_PERIOD_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*(days?|months?)").unwrap());

const APPLICABILITY_PHRASES: [(&str, Applicability); 2] = [
    ("rural only", Applicability::Rural),
    ("urban only", Applicability::Urban),
];

/// Trim and collapse internal whitespace (newlines included) to single spaces
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Vocabulary entries found in `text` (case-insensitive substring test), in vocabulary order
pub fn detect_units(text: &str, vocabulary: &[String]) -> Vec<String> {
    let lowered = text.to_lowercase();
    vocabulary
        .iter()
        .filter(|unit| lowered.contains(&unit.to_lowercase()))
        .cloned()
        .collect()
}

/// Classifies page-text lines and tags instruction lines with their semantics.
///
/// Lines that carry neither an instruction keyword nor a question number
/// are prose and are dropped.
pub struct TextScanner {
    keywords: Vec<String>,
    unit_vocabulary: Vec<String>,
}

impl TextScanner {
    pub fn new(config: &TextScannerConfig) -> Self {
        Self {
            keywords: config
                .instruction_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            unit_vocabulary: config.unit_vocabulary.clone(),
        }
    }

    /// Scan every line of a page; returns instruction blocks in line order
    pub fn scan_page(&self, page_text: &str, page: u32) -> Vec<InstructionBlock> {
        page_text
            .lines()
            .filter_map(|line| self.scan_line(line, page))
            .collect()
    }

    pub fn scan_line(&self, line: &str, page: u32) -> Option<InstructionBlock> {
        let text = normalize_whitespace(line);
        if text.is_empty() {
            return None;
        }

        let semantics = self.analyze(&text);
        if semantics.logic_indicators.is_empty() && semantics.question_no.is_none() {
            return None;
        }

        Some(InstructionBlock {
            text,
            semantics,
            provenance: Provenance::page_text(page),
        })
    }

    /// Extract semantic tags from one normalized line
    pub fn analyze(&self, text: &str) -> InstructionSemantics {
        let lowered = text.to_lowercase();

        let logic_indicators: Vec<String> = self
            .keywords
            .iter()
            .filter(|k| lowered.contains(k.as_str()))
            .cloned()
            .collect();

        let cross_references: Vec<String> = CROSS_REFERENCE_REGEX
            .captures_iter(text)
            .map(|cap| format!("{} {}", cap[1].to_lowercase(), &cap[2]))
            .collect();

        let applicability: Vec<Applicability> = APPLICABILITY_PHRASES
            .iter()
            .filter(|(phrase, _)| lowered.contains(phrase))
            .map(|(_, flag)| *flag)
            .collect();

        InstructionSemantics {
            question_no: QUESTION_NO_REGEX.find(text).map(|m| m.as_str().to_string()),
            reference_period: reference_period(text),
            units: detect_units(text, &self.unit_vocabulary),
            cross_references: (!cross_references.is_empty()).then_some(cross_references),
            logic_indicators,
            applicability: (!applicability.is_empty()).then_some(applicability),
        }
    }
}

fn reference_period(text: &str) -> Option<ReferencePeriod> {
    let cap = REFERENCE_PERIOD_REGEX.captures(text)?;
    let value = cap[1].parse::<u32>().ok()?;
    let unit = if cap[2].to_lowercase().starts_with("day") {
        PeriodUnit::Day
    } else {
        PeriodUnit::Month
    };
    Some(ReferencePeriod { value, unit })
}
