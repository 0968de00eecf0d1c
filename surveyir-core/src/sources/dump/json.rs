use crate::error::ExtractResult;
use crate::sources::dump::LayoutBackend;
use crate::sources::layout::LayoutDocument;

/// Reads `{"pages": [{"page_number", "text", "tables": [{"bbox", "rows"}]}]}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonLayoutBackend;

impl LayoutBackend for JsonLayoutBackend {
    fn decode_layout(&self, bytes: &[u8]) -> ExtractResult<LayoutDocument> {
        Ok(serde_json::from_slice(bytes)?)
    }

    fn name(&self) -> &str {
        "JsonLayoutBackend"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }
}
