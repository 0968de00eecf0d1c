use crate::rules::header_hierarchy::HeaderSignature;

/// Mutable state threaded through sequential page processing.
///
/// Holds the section every new block is attributed to and the header
/// signature of the last table seen, for continuation detection across
/// page breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionContext {
    current_section_id: String,
    prev_header_signature: Option<HeaderSignature>,
    pages_seen: u32,
}

impl ExtractionContext {
    pub fn new(initial_section_id: &str) -> Self {
        Self {
            current_section_id: initial_section_id.to_string(),
            prev_header_signature: None,
            pages_seen: 0,
        }
    }

    pub fn current_section_id(&self) -> &str {
        &self.current_section_id
    }

    /// Switch sections; returns true if the id changed
    pub fn enter_section(&mut self, section_id: &str) -> bool {
        if self.current_section_id == section_id {
            return false;
        }
        self.current_section_id = section_id.to_string();
        true
    }

    /// Record a table's header signature; true if it repeats the previous one.
    ///
    /// Signatures without any header text never count as a continuation.
    pub fn observe_header_signature(&mut self, signature: HeaderSignature) -> bool {
        let has_header_text = signature.iter().any(|column| !column.is_empty());
        let is_continuation =
            has_header_text && self.prev_header_signature.as_ref() == Some(&signature);
        self.prev_header_signature = Some(signature);
        is_continuation
    }

    pub fn page_done(&mut self) {
        self.pages_seen += 1;
    }

    pub fn pages_seen(&self) -> u32 {
        self.pages_seen
    }
}

impl Default for ExtractionContext {
    fn default() -> Self {
        Self::new(crate::types::SENTINEL_SECTION_ID)
    }
}
