use crate::config::DocumentConfig;
use crate::types::IrMetadata;
use regex::Regex;
use std::sync::LazyLock;

/// Survey round tokens such as "2022" or "2022-23"
static SURVEY_ROUND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:19|20)\d{2}(?:-\d{2,4})?\b").unwrap());

/// Only the opening pages carry the cover and round information
pub const PAGES_SCANNED: usize = 2;

pub struct DocumentClassifier {
    document: DocumentConfig,
}

impl DocumentClassifier {
    pub fn new(document: DocumentConfig) -> Self {
        Self { document }
    }

    /// First survey-round token across the opening pages, in page order.
    pub fn detect_version<S: AsRef<str>>(texts: &[S]) -> Option<String> {
        texts
            .iter()
            .take(PAGES_SCANNED)
            .find_map(|text| SURVEY_ROUND.find(text.as_ref()))
            .map(|m| m.as_str().to_string())
    }

    pub fn classify<S: AsRef<str>>(
        &self,
        opening_texts: &[S],
        page_count: u32,
        source_digest: Option<String>,
    ) -> IrMetadata {
        let version = match &self.document.version {
            Some(configured) => Some(configured.clone()),
            None => Self::detect_version(opening_texts),
        };

        match &version {
            Some(v) => log::info!("📋 Classified as: {} (round {})", self.document.document_type, v),
            None => log::info!("📋 Classified as: {} (round not found)", self.document.document_type),
        }

        IrMetadata {
            document_type: self.document.document_type.clone(),
            version,
            known_limitations: self.document.known_limitations.clone(),
            page_count,
            source_digest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_round_from_first_pages_only() {
        let texts = [
            "Ministry of Statistics",
            "Living Conditions and Expenditure Survey 2022-23",
            "Schedule 2030",
        ];
        assert_eq!(DocumentClassifier::detect_version(&texts).as_deref(), Some("2022-23"));

        let late = ["cover", "contents", "round 2019"];
        assert_eq!(DocumentClassifier::detect_version(&late), None);
    }

    #[test]
    fn ignores_longer_numbers() {
        let texts = ["Code 120234 only"];
        assert_eq!(DocumentClassifier::detect_version(&texts), None);
    }

    #[test]
    fn configured_version_wins() {
        let classifier = DocumentClassifier::new(DocumentConfig {
            version: Some("Round 79".to_string()),
            ..DocumentConfig::default()
        });
        let metadata = classifier.classify(&["Survey 2022"], 5, Some("abc".to_string()));
        assert_eq!(metadata.version.as_deref(), Some("Round 79"));
        assert_eq!(metadata.page_count, 5);
        assert_eq!(metadata.source_digest.as_deref(), Some("abc"));
        assert_eq!(metadata.document_type, "LCES Questionnaire");
    }

    #[test]
    fn detected_version_fills_metadata() {
        let classifier = DocumentClassifier::new(DocumentConfig::default());
        let metadata = classifier.classify(&["LCES 2022"], 1, None);
        assert_eq!(metadata.version.as_deref(), Some("2022"));
        assert!(metadata.source_digest.is_none());
    }
}
