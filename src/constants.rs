//! Shared constants for grid conversion
//!
//! This module centralizes the fixed numbers used by layout, rendering and
//! the conversion defaults.

use crate::layout::PageSize;

// =============================================================================
// Grid Bounds and Defaults
// =============================================================================

/// Smallest allowed images-per-page value
pub const MIN_IMAGES_PER_PAGE: usize = 1;

/// Largest allowed images-per-page value
pub const MAX_IMAGES_PER_PAGE: usize = 12;

/// Default images per page (3×3 grid)
pub const DEFAULT_IMAGES_PER_PAGE: usize = 9;

/// Default output page size
pub const DEFAULT_PAGE_SIZE: PageSize = PageSize::A4;

/// High-quality rendering is on unless switched off
pub const DEFAULT_HIGH_QUALITY: bool = true;

/// Default output file name (without extension)
pub const DEFAULT_OUTPUT_BASE_NAME: &str = "converted_svgs";

/// Output file extension
pub const OUTPUT_EXTENSION: &str = "pdf";

// =============================================================================
// Page Geometry
// =============================================================================

/// Page margin as a fraction of the shorter page side (20pt on A4)
pub const MARGIN_RATIO: f64 = 20.0 / 595.276;

/// Gap between neighbouring cells as a fraction of the shorter page side (10pt on A4)
pub const SPACING_RATIO: f64 = 10.0 / 595.276;

/// Points per inch
pub const POINTS_PER_INCH: f64 = 72.0;

/// Millimeters per inch
pub const MM_PER_INCH: f64 = 25.4;

// =============================================================================
// Quality Profiles
// =============================================================================

/// Nominal rasterization resolution in high-quality mode
pub const HIGH_QUALITY_DPI: f64 = 300.0;

/// Nominal rasterization resolution in standard mode
pub const STANDARD_DPI: f64 = 150.0;

/// Largest scale factor applied in high-quality mode
pub const HIGH_QUALITY_MAX_UPSCALE: f64 = 2.0;

/// Largest scale factor applied in standard mode (scale down only)
pub const STANDARD_MAX_UPSCALE: f64 = 1.0;

/// Longest edge, in pixels, of any rasterized unit
pub const MAX_RASTER_EDGE_PX: u32 = 8000;

// =============================================================================
// Inputs
// =============================================================================

/// Extensions parsed as vector images
pub const VECTOR_EXTENSIONS: &[&str] = &["svg", "svgz"];

/// Extensions decoded as raster images
pub const RASTER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];
