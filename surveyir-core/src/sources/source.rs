// Layout source abstraction
//
// This module defines the boundary between page-layout decoding (PDF engine
// output -> pages of text and cell grids) and semantic extraction
// (pages -> DocumentIr). Everything after this point is format-agnostic.

use crate::error::ExtractResult;
use crate::sources::layout::{LayoutDocument, TableRegion};
use std::path::Path;

/// One decoded page as seen by the extraction engine.
///
/// Implemented by the bundled dump decoders and by any in-process layout
/// engine binding. `tables()` may fail; a failing page aborts the run.
pub trait LayoutPage {
    /// 1-based page number
    fn page_number(&self) -> u32;

    /// Raw page text, lines separated by '\n' (may be empty)
    fn text(&self) -> &str;

    /// Table regions in reading order
    fn tables(&self) -> ExtractResult<Vec<TableRegion>>;
}

impl<T: LayoutPage + ?Sized> LayoutPage for &T {
    fn page_number(&self) -> u32 {
        (**self).page_number()
    }

    fn text(&self) -> &str {
        (**self).text()
    }

    fn tables(&self) -> ExtractResult<Vec<TableRegion>> {
        (**self).tables()
    }
}

/// Converts a layout dump into a `LayoutDocument`.
pub trait LayoutSource {
    /// Decode raw dump bytes
    fn decode(&self, bytes: &[u8]) -> ExtractResult<LayoutDocument>;

    /// Reads the file and decodes the bytes
    fn load_file(&self, input: &Path) -> ExtractResult<LayoutDocument> {
        let bytes = std::fs::read(input)?;
        self.decode(&bytes)
    }

    /// Source name for logging
    fn name(&self) -> &str;

    fn supports_file_type(&self, path: &Path) -> bool;
}
