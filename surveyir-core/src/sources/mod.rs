//! Layout Sources
//!
//! This module provides the upstream glue between a page-layout engine and
//! the extraction engine.
//!
//! ## Architecture
//!
//! ```text
//! Layout dump (JSON, XHTML)
//!     ↓
//! [LayoutPreprocessor + backend]
//!     ↓
//! LayoutDocument (pages of text + cell grids)
//!     ↓
//! [ExtractionEngine]
//!     ↓
//! DocumentIr
//! ```
//!
//! In-process layout engines skip the dump step and implement `LayoutPage`
//! directly.

pub mod dump;
pub mod layout;
pub mod source;

pub use dump::{JsonLayoutBackend, LayoutBackend, LayoutBackendImpl, LayoutPreprocessor, XhtmlLayoutBackend};
pub use layout::{CellGrid, LayoutDocument, PageLayout, TableRegion};
pub use source::{LayoutPage, LayoutSource};

use sha2::{Digest, Sha256};

/// Hex SHA-256 of the raw layout input, recorded as `metadata.source_digest`
pub fn layout_digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
