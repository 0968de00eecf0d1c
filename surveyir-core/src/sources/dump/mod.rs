//! Layout dump decoders
//!
//! A layout engine run out of process writes its pages as a dump file; the
//! backends here turn those dumps back into a `LayoutDocument`.

pub mod json;
pub mod xhtml;

use crate::error::{ExtractError, ExtractResult};
use crate::sources::layout::LayoutDocument;
use crate::sources::source::LayoutSource;
use std::path::Path;
use std::str::FromStr;

pub use json::JsonLayoutBackend;
pub use xhtml::XhtmlLayoutBackend;

/// Backend trait for layout dump decoding
pub trait LayoutBackend {
    fn decode_layout(&self, bytes: &[u8]) -> ExtractResult<LayoutDocument>;

    /// Backend identifier for logging/debugging
    fn name(&self) -> &str;

    /// Lower-case file extensions this backend reads
    fn extensions(&self) -> &[&str];
}

/// Backend enum for runtime backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutBackendImpl {
    Json(JsonLayoutBackend),
    Xhtml(XhtmlLayoutBackend),
}

impl LayoutBackendImpl {
    pub fn for_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        [Self::Json(JsonLayoutBackend), Self::Xhtml(XhtmlLayoutBackend)]
            .into_iter()
            .find(|b| b.extensions().contains(&ext.as_str()))
    }

    /// Pick a backend from the first non-whitespace byte
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        let first = bytes.iter().find(|b| !b.is_ascii_whitespace())?;
        match first {
            b'{' => Some(Self::Json(JsonLayoutBackend)),
            b'<' => Some(Self::Xhtml(XhtmlLayoutBackend)),
            _ => None,
        }
    }
}

impl FromStr for LayoutBackendImpl {
    type Err = ExtractError;

    /// Backend by format name or file extension
    fn from_str(s: &str) -> ExtractResult<Self> {
        let name = s.trim().trim_start_matches('.').to_lowercase();
        [Self::Json(JsonLayoutBackend), Self::Xhtml(XhtmlLayoutBackend)]
            .into_iter()
            .find(|b| b.extensions().contains(&name.as_str()))
            .ok_or_else(|| {
                ExtractError::UnsupportedInput(format!("unknown layout format '{}' (expected json or xhtml)", s))
            })
    }
}

impl LayoutBackend for LayoutBackendImpl {
    fn decode_layout(&self, bytes: &[u8]) -> ExtractResult<LayoutDocument> {
        match self {
            LayoutBackendImpl::Json(backend) => backend.decode_layout(bytes),
            LayoutBackendImpl::Xhtml(backend) => backend.decode_layout(bytes),
        }
    }

    fn name(&self) -> &str {
        match self {
            LayoutBackendImpl::Json(backend) => backend.name(),
            LayoutBackendImpl::Xhtml(backend) => backend.name(),
        }
    }

    fn extensions(&self) -> &[&str] {
        match self {
            LayoutBackendImpl::Json(backend) => backend.extensions(),
            LayoutBackendImpl::Xhtml(backend) => backend.extensions(),
        }
    }
}

/// Layout preprocessor with pluggable backend
///
/// Without a fixed backend the format is chosen from the file extension,
/// then from the content itself.
#[derive(Debug, Clone, Default)]
pub struct LayoutPreprocessor {
    backend: Option<LayoutBackendImpl>,
}

impl LayoutPreprocessor {
    pub fn new() -> Self {
        Self { backend: None }
    }

    pub fn with_backend(backend: LayoutBackendImpl) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    fn resolve_backend(&self, path: Option<&Path>, bytes: &[u8]) -> ExtractResult<LayoutBackendImpl> {
        self.backend
            .or_else(|| path.and_then(LayoutBackendImpl::for_path))
            .or_else(|| LayoutBackendImpl::sniff(bytes))
            .ok_or_else(|| {
                ExtractError::UnsupportedInput(match path {
                    Some(p) => format!("cannot determine layout format of {}", p.display()),
                    None => "cannot determine layout format".to_string(),
                })
            })
    }

    /// Decode bytes already read from `path`, choosing the backend from both
    pub fn decode_for_path(&self, path: &Path, bytes: &[u8]) -> ExtractResult<LayoutDocument> {
        let backend = self.resolve_backend(Some(path), bytes)?;
        self.decode_with(backend, bytes)
    }

    fn decode_with(&self, backend: LayoutBackendImpl, bytes: &[u8]) -> ExtractResult<LayoutDocument> {
        log::debug!("Decoding layout dump with {}", backend.name());
        let layout = backend.decode_layout(bytes)?;
        layout.validate()?;
        log::info!(
            "Decoded layout: {} page(s), {} table region(s)",
            layout.page_count(),
            layout.table_count()
        );
        Ok(layout)
    }
}

impl LayoutSource for LayoutPreprocessor {
    fn decode(&self, bytes: &[u8]) -> ExtractResult<LayoutDocument> {
        let backend = self.resolve_backend(None, bytes)?;
        self.decode_with(backend, bytes)
    }

    fn load_file(&self, input: &Path) -> ExtractResult<LayoutDocument> {
        let bytes = std::fs::read(input)?;
        self.decode_for_path(input, &bytes)
    }

    fn name(&self) -> &str {
        match &self.backend {
            Some(backend) => backend.name(),
            None => "LayoutPreprocessor",
        }
    }

    fn supports_file_type(&self, path: &Path) -> bool {
        match &self.backend {
            Some(backend) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| backend.extensions().contains(&e.to_lowercase().as_str()))
                .unwrap_or(false),
            None => LayoutBackendImpl::for_path(path).is_some(),
        }
    }
}
