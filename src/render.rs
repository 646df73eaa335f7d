//! Image rendering into cell-sized drawable units
//!
//! Vector inputs are parsed with `usvg` and rasterized with `resvg`; raster
//! inputs are decoded with `image`. Either way the result is an RGB buffer
//! plus an optional alpha channel, scaled to fit one grid cell.

use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use resvg::{tiny_skia, usvg};

use crate::constants::{
    HIGH_QUALITY_DPI, HIGH_QUALITY_MAX_UPSCALE, MAX_RASTER_EDGE_PX, POINTS_PER_INCH,
    RASTER_EXTENSIONS, STANDARD_DPI, STANDARD_MAX_UPSCALE, VECTOR_EXTENSIONS,
};
use crate::error::{Error, Result};
use crate::layout::Rect;

/// How an input file is decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// SVG / SVGZ, parsed and rasterized at the profile's DPI
    Vector,
    /// PNG / JPEG / WebP, resampled down to the profile's DPI
    Raster,
}

impl SourceKind {
    /// Classify a path by its extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        if VECTOR_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceKind::Vector)
        } else if RASTER_EXTENSIONS.contains(&ext.as_str()) {
            Some(SourceKind::Raster)
        } else {
            None
        }
    }
}

/// One input image, referenced by path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
}

impl SourceImage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn kind(&self) -> Result<SourceKind> {
        SourceKind::from_path(&self.path).ok_or_else(|| Error::UnsupportedFormat(self.path.clone()))
    }

    /// File name for log lines, falling back to the full path
    pub fn display_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Resolution and scaling policy for one run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityProfile {
    /// Nominal rasterization resolution
    pub dpi: f64,
    /// Upper bound on the scale factor applied to the intrinsic size
    pub max_upscale: f64,
    /// Flate-compress page content streams as well as images
    pub compress_all: bool,
}

impl QualityProfile {
    /// 300 DPI, up to 2× enlargement, full compression
    pub fn high() -> Self {
        Self {
            dpi: HIGH_QUALITY_DPI,
            max_upscale: HIGH_QUALITY_MAX_UPSCALE,
            compress_all: true,
        }
    }

    /// 150 DPI, scale down only
    pub fn standard() -> Self {
        Self {
            dpi: STANDARD_DPI,
            max_upscale: STANDARD_MAX_UPSCALE,
            compress_all: false,
        }
    }

    pub fn for_mode(high_quality: bool) -> Self {
        if high_quality {
            Self::high()
        } else {
            Self::standard()
        }
    }
}

/// A rendered image ready to be placed into a cell
#[derive(Debug, Clone)]
pub struct RenderedImage {
    pub source: PathBuf,
    /// Placed width in points
    pub width_pt: f64,
    /// Placed height in points
    pub height_pt: f64,
    /// Factor applied to the intrinsic size
    pub scale: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
    /// Packed 8-bit RGB samples, row-major from the top
    pub rgb: Vec<u8>,
    /// 8-bit alpha samples, `None` when every pixel is opaque
    pub alpha: Option<Vec<u8>>,
}

impl RenderedImage {
    /// Where this unit lands inside `cell`, centered on both axes
    pub fn placement_in(&self, cell: &Rect) -> Rect {
        center_in(cell, self.width_pt, self.height_pt)
    }
}

/// Uniform scale that fits `intrinsic` into `cell`, capped at `max_upscale`
pub fn fit_scale(intrinsic: (f64, f64), cell: (f64, f64), max_upscale: f64) -> f64 {
    let fit = (cell.0 / intrinsic.0).min(cell.1 / intrinsic.1);
    fit.min(max_upscale)
}

/// Rectangle of the given size centered within `cell`
pub fn center_in(cell: &Rect, width: f64, height: f64) -> Rect {
    Rect::new(
        cell.x + (cell.width - width) / 2.0,
        cell.y + (cell.height - height) / 2.0,
        width,
        height,
    )
}

/// Pixel size for a unit of the given point size, clamped to `MAX_RASTER_EDGE_PX`
fn raster_size(width_pt: f64, height_pt: f64, dpi: f64) -> (u32, u32) {
    let px_per_pt = dpi / POINTS_PER_INCH;
    let mut width = width_pt * px_per_pt;
    let mut height = height_pt * px_per_pt;

    let longest = width.max(height);
    let limit = MAX_RASTER_EDGE_PX as f64;
    if longest > limit {
        let shrink = limit / longest;
        width *= shrink;
        height *= shrink;
    }

    ((width.round() as u32).max(1), (height.round() as u32).max(1))
}

/// Intrinsic size, or the cell size when the input declares none
fn usable_size(intrinsic: (f64, f64), cell: (f64, f64)) -> (f64, f64) {
    let valid = |v: f64| v.is_finite() && v > 0.0;
    if valid(intrinsic.0) && valid(intrinsic.1) {
        intrinsic
    } else {
        cell
    }
}

/// Split RGBA pixels into RGB and alpha planes, dropping alpha if fully opaque
fn split_channels(pixels: impl Iterator<Item = [u8; 4]>, count: usize) -> (Vec<u8>, Option<Vec<u8>>) {
    let mut rgb = Vec::with_capacity(count * 3);
    let mut alpha = Vec::with_capacity(count);
    let mut opaque = true;

    for [r, g, b, a] in pixels {
        rgb.extend_from_slice(&[r, g, b]);
        alpha.push(a);
        opaque &= a == u8::MAX;
    }

    (rgb, (!opaque).then_some(alpha))
}

/// Renders source images at a fixed quality profile.
///
/// Holds the `usvg` options so the system font database is loaded once per
/// run rather than once per image.
pub struct ImageRenderer {
    options: usvg::Options<'static>,
    profile: QualityProfile,
}

impl ImageRenderer {
    pub fn new(high_quality: bool) -> Self {
        Self::with_profile(QualityProfile::for_mode(high_quality))
    }

    pub fn with_profile(profile: QualityProfile) -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        Self { options, profile }
    }

    pub fn profile(&self) -> QualityProfile {
        self.profile
    }

    /// Render `source` to fit a cell of `cell_size` (width, height) points.
    ///
    /// Fails with `InputNotFound` if the file cannot be read, `UnsupportedFormat`
    /// for unknown extensions and `Render` if decoding fails. Writes nothing.
    pub fn render(&mut self, source: &SourceImage, cell_size: (f64, f64)) -> Result<RenderedImage> {
        let kind = source.kind()?;
        let data = std::fs::read(&source.path).map_err(|e| {
            log::debug!("Cannot read {}: {}", source.path.display(), e);
            Error::InputNotFound(source.path.clone())
        })?;

        match kind {
            SourceKind::Vector => self.render_vector(source, &data, cell_size),
            SourceKind::Raster => self.render_raster(source, &data, cell_size),
        }
    }

    fn render_vector(
        &mut self,
        source: &SourceImage,
        data: &[u8],
        cell_size: (f64, f64),
    ) -> Result<RenderedImage> {
        // Relative hrefs inside the SVG resolve against its own directory
        self.options.resources_dir = source.path.parent().map(Path::to_path_buf);

        let tree = usvg::Tree::from_data(data, &self.options).map_err(|e| Error::Render {
            path: source.path.clone(),
            message: e.to_string(),
        })?;

        let tree_size = tree.size();
        let intrinsic = usable_size(
            (tree_size.width() as f64, tree_size.height() as f64),
            cell_size,
        );
        let scale = fit_scale(intrinsic, cell_size, self.profile.max_upscale);
        let width_pt = intrinsic.0 * scale;
        let height_pt = intrinsic.1 * scale;

        let (pixel_width, pixel_height) = raster_size(width_pt, height_pt, self.profile.dpi);
        let mut pixmap = tiny_skia::Pixmap::new(pixel_width, pixel_height).ok_or_else(|| {
            Error::Render {
                path: source.path.clone(),
                message: format!("cannot allocate {}x{} pixmap", pixel_width, pixel_height),
            }
        })?;

        let transform = tiny_skia::Transform::from_scale(
            pixel_width as f32 / tree_size.width(),
            pixel_height as f32 / tree_size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let count = (pixel_width * pixel_height) as usize;
        let (rgb, alpha) = split_channels(
            pixmap.pixels().iter().map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            }),
            count,
        );

        Ok(RenderedImage {
            source: source.path.clone(),
            width_pt,
            height_pt,
            scale,
            pixel_width,
            pixel_height,
            rgb,
            alpha,
        })
    }

    fn render_raster(
        &self,
        source: &SourceImage,
        data: &[u8],
        cell_size: (f64, f64),
    ) -> Result<RenderedImage> {
        let decoded = image::load_from_memory(data).map_err(|e| Error::Render {
            path: source.path.clone(),
            message: e.to_string(),
        })?;

        let native = (decoded.width(), decoded.height());
        let intrinsic = usable_size((native.0 as f64, native.1 as f64), cell_size);
        let scale = fit_scale(intrinsic, cell_size, self.profile.max_upscale);
        let width_pt = intrinsic.0 * scale;
        let height_pt = intrinsic.1 * scale;

        // Never resample above the native pixel count
        let (mut pixel_width, mut pixel_height) = raster_size(width_pt, height_pt, self.profile.dpi);
        if pixel_width >= native.0 || pixel_height >= native.1 {
            (pixel_width, pixel_height) = native;
        }

        let rgba = if (pixel_width, pixel_height) == native {
            decoded.to_rgba8()
        } else {
            decoded
                .resize_exact(pixel_width, pixel_height, FilterType::Lanczos3)
                .to_rgba8()
        };

        let count = (pixel_width * pixel_height) as usize;
        let (rgb, alpha) = split_channels(rgba.pixels().map(|p| p.0), count);

        Ok(RenderedImage {
            source: source.path.clone(),
            width_pt,
            height_pt,
            scale,
            pixel_width,
            pixel_height,
            rgb,
            alpha,
        })
    }
}
