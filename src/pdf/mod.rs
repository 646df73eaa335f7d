//! PDF document module

pub mod assemble;
pub mod metadata;

// Re-export commonly used items
pub use assemble::{assemble, assemble_with_progress, AssembleOptions};
pub use metadata::{count_pages, inspect_bytes, inspect_document, DocumentInfo};
