// All extraction functionality is in surveyir-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod stages;

// Re-export core types for convenience
pub use surveyir_core::*;

// Re-export CLI utilities
pub use stages::save_stages;
