pub mod builder;
pub mod document;
pub mod serialization;
pub mod summary;

pub use builder::IrBuilder;
pub use serialization::{write_atomically, FlatRecord, OutputFormat, RecordsDocument};
pub use summary::IrSummary;
