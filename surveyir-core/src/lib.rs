// Surveyir Core Library
//
// Turns page layouts of a printed household-survey questionnaire into a
// sectioned document IR: instructions, data tables, checkbox groups.
// Main interface is DocumentProcessor.

pub mod types;
pub mod error;
pub mod config;
pub mod context;
pub mod sources;
pub mod rules;
pub mod ir;
pub mod classifier;
pub mod processor;

// Re-export main types and functions for easy use
pub use types::*;
pub use error::{ExtractError, ExtractResult};
pub use config::{ConfigManager, ExtractionConfig};
pub use context::ExtractionContext;
pub use sources::{LayoutDocument, LayoutPage, LayoutPreprocessor, LayoutSource, PageLayout, TableRegion};
pub use rules::{DebugConfig, ExtractionEngine, ValidationReport};
pub use ir::{IrBuilder, IrSummary, OutputFormat};
pub use classifier::DocumentClassifier;
pub use processor::{DocumentProcessor, PipelineStages, StepProfiler};
