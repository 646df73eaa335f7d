//! SVG Grid PDF Library
//!
//! A cross-platform library for batching vector images into one paginated PDF.
//! This library provides functionality to:
//! - Compute grid layouts and page counts for any images-per-page value
//! - Render SVG (and PNG/JPEG/WebP) inputs to fit a grid cell
//! - Assemble rendered images into a multi-page PDF
//! - Pick a non-colliding output name and write the result atomically
//! - Run the whole pipeline on a worker thread with progress events
//!
//! # Example
//!
//! ```no_run
//! use svg_grid_pdf::convert::{convert, ConversionRequest};
//! use svg_grid_pdf::output::OutputTarget;
//! use svg_grid_pdf::settings::GridConfig;
//! use std::path::PathBuf;
//!
//! let request = ConversionRequest {
//!     inputs: vec![PathBuf::from("logo.svg"), PathBuf::from("icon.svg")],
//!     config: GridConfig::default(),
//!     output: OutputTarget::new(".", "converted_svgs"),
//! };
//!
//! let summary = convert(&request).expect("Failed to convert");
//! println!("{}", summary);
//! ```

pub mod constants;
pub mod convert;
pub mod error;
pub mod inputs;
pub mod layout;
pub mod output;
pub mod pdf;
pub mod render;
pub mod settings;

// Re-export commonly used items
pub use convert::{
    convert, run_conversion, spawn_conversion, ConversionEvent, ConversionHandle,
    ConversionPhase, ConversionRequest, ConversionSummary,
};
pub use error::{Error, Result};
pub use layout::{compute_layout, PageSize};
pub use output::{resolve_output_path, OutputTarget};
pub use settings::{ConversionSettings, GridConfig};
