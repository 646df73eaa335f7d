//! Page layout calculations
//!
//! Splits each page into a grid of equally sized cells and assigns images to
//! cells in row-major order across as many pages as needed. All coordinates
//! are PDF points with the origin at the bottom-left of the page.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{MARGIN_RATIO, MM_PER_INCH, POINTS_PER_INCH, SPACING_RATIO};

/// Simple length type in millimeters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Length(pub f64);

impl Length {
    /// Create a length from millimeters
    pub fn from_mm(mm: f64) -> Self {
        Length(mm)
    }

    /// Create a length from inches
    pub fn from_inches(inches: f64) -> Self {
        Length(inches * MM_PER_INCH)
    }

    /// Create a length from points (1/72 inch)
    pub fn from_pt(pt: f64) -> Self {
        Length(pt * MM_PER_INCH / POINTS_PER_INCH)
    }

    /// Get the value in millimeters
    pub fn mm(&self) -> f64 {
        self.0
    }

    /// Get the value in points (1/72 inch)
    pub fn pt(&self) -> f64 {
        self.0 * POINTS_PER_INCH / MM_PER_INCH
    }
}

/// Page dimensions
#[derive(Debug, Clone, Copy)]
pub struct PageDimensions {
    pub width: Length,
    pub height: Length,
}

/// Named output page sizes (always portrait)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageSize {
    A4,
    A3,
    A2,
    A1,
    A0,
    Letter,
    Legal,
}

impl PageSize {
    /// Every supported page size, in menu order
    pub const ALL: [PageSize; 7] = [
        PageSize::A4,
        PageSize::A3,
        PageSize::A2,
        PageSize::A1,
        PageSize::A0,
        PageSize::Letter,
        PageSize::Legal,
    ];

    /// Display name, also accepted by `FromStr`
    pub fn name(self) -> &'static str {
        match self {
            PageSize::A4 => "A4",
            PageSize::A3 => "A3",
            PageSize::A2 => "A2",
            PageSize::A1 => "A1",
            PageSize::A0 => "A0",
            PageSize::Letter => "Letter",
            PageSize::Legal => "Legal",
        }
    }

    /// Physical dimensions of the page
    pub fn dimensions(self) -> PageDimensions {
        let (width, height) = match self {
            PageSize::A4 => (Length::from_mm(210.0), Length::from_mm(297.0)),
            PageSize::A3 => (Length::from_mm(297.0), Length::from_mm(420.0)),
            PageSize::A2 => (Length::from_mm(420.0), Length::from_mm(594.0)),
            PageSize::A1 => (Length::from_mm(594.0), Length::from_mm(841.0)),
            PageSize::A0 => (Length::from_mm(841.0), Length::from_mm(1189.0)),
            PageSize::Letter => (Length::from_inches(8.5), Length::from_inches(11.0)),
            PageSize::Legal => (Length::from_inches(8.5), Length::from_inches(14.0)),
        };
        PageDimensions { width, height }
    }

    /// (width, height) in points
    pub fn size_pt(self) -> (f64, f64) {
        let dims = self.dimensions();
        (dims.width.pt(), dims.height.pt())
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim();
        PageSize::ALL
            .into_iter()
            .find(|size| size.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = PageSize::ALL.iter().map(|s| s.name()).collect();
                format!("unknown page size '{}' (expected one of {})", s, names.join(", "))
            })
    }
}

/// Rows × columns split of a page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions {
    pub rows: usize,
    pub cols: usize,
}

impl GridDimensions {
    /// Smallest near-square grid holding `images_per_page` cells.
    ///
    /// columns = ceil(sqrt(n)), rows = ceil(n / columns), so 9 gives 3×3
    /// and 5 gives 2 rows of 3.
    pub fn for_images_per_page(images_per_page: usize) -> Self {
        let n = images_per_page.max(1);
        let mut cols = (n as f64).sqrt().ceil() as usize;
        // Guard against sqrt rounding just above an exact square
        if (cols - 1) * (cols - 1) >= n {
            cols -= 1;
        }
        let rows = n.div_ceil(cols);
        Self { rows, cols }
    }

    /// Number of cells in the grid
    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }
}

/// Axis-aligned rectangle in points, origin at bottom-left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y + self.height
    }

    /// Whether `other` lies entirely inside this rectangle (with a small tolerance)
    pub fn contains(&self, other: &Rect) -> bool {
        const EPS: f64 = 1e-6;
        other.x >= self.x - EPS
            && other.y >= self.y - EPS
            && other.right() <= self.right() + EPS
            && other.top() <= self.top() + EPS
    }
}

/// One grid slot on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub rect: Rect,
    /// Index into the ordered image list, `None` for a blank cell
    pub image: Option<usize>,
}

/// Cells of one output page, row-major from the top-left
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    pub index: usize,
    pub cells: Vec<Cell>,
}

impl PageLayout {
    /// Cells that carry an image
    pub fn filled_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| cell.image.is_some())
    }
}

/// Geometry shared by every page of a run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub page_size: PageSize,
    pub images_per_page: usize,
    pub dimensions: GridDimensions,
    pub page_width: f64,
    pub page_height: f64,
    pub margin: f64,
    pub spacing: f64,
    pub cell_width: f64,
    pub cell_height: f64,
}

impl GridLayout {
    pub fn new(page_size: PageSize, images_per_page: usize) -> Self {
        let images_per_page = images_per_page.max(1);
        let dimensions = GridDimensions::for_images_per_page(images_per_page);
        let (page_width, page_height) = page_size.size_pt();

        let short_side = page_width.min(page_height);
        let margin = short_side * MARGIN_RATIO;
        let spacing = short_side * SPACING_RATIO;

        let cols = dimensions.cols as f64;
        let rows = dimensions.rows as f64;
        let cell_width = (page_width - 2.0 * margin - (cols - 1.0) * spacing) / cols;
        let cell_height = (page_height - 2.0 * margin - (rows - 1.0) * spacing) / rows;

        Self {
            page_size,
            images_per_page,
            dimensions,
            page_width,
            page_height,
            margin,
            spacing,
            cell_width,
            cell_height,
        }
    }

    /// (width, height) of every cell in points
    pub fn cell_size(&self) -> (f64, f64) {
        (self.cell_width, self.cell_height)
    }

    /// Bounds of the cell at `row`, `col`; row 0 is the top row
    pub fn cell_rect(&self, row: usize, col: usize) -> Rect {
        let x = self.margin + col as f64 * (self.cell_width + self.spacing);
        let top = self.page_height - self.margin - row as f64 * (self.cell_height + self.spacing);
        Rect::new(x, top - self.cell_height, self.cell_width, self.cell_height)
    }

    /// Number of pages needed for `image_count` images
    pub fn page_count(&self, image_count: usize) -> usize {
        page_count(image_count, self.images_per_page)
    }

    /// Lay out `image_count` images over successive pages.
    ///
    /// Each page carries the full grid; the first `images_per_page` slots in
    /// row-major order take images, trailing slots stay blank.
    pub fn pages(&self, image_count: usize) -> Vec<PageLayout> {
        let page_count = self.page_count(image_count);
        let mut pages = Vec::with_capacity(page_count);

        for index in 0..page_count {
            let first = index * self.images_per_page;
            let on_page = (image_count - first).min(self.images_per_page);

            let mut cells = Vec::with_capacity(self.dimensions.capacity());
            for row in 0..self.dimensions.rows {
                for col in 0..self.dimensions.cols {
                    let slot = row * self.dimensions.cols + col;
                    cells.push(Cell {
                        row,
                        col,
                        rect: self.cell_rect(row, col),
                        image: (slot < on_page).then_some(first + slot),
                    });
                }
            }
            pages.push(PageLayout { index, cells });
        }

        pages
    }
}

/// ceil(image_count / images_per_page); zero images means zero pages
pub fn page_count(image_count: usize, images_per_page: usize) -> usize {
    image_count.div_ceil(images_per_page.max(1))
}

/// Compute every page of a run.
///
/// Zero images yields zero pages; the caller treats that as a no-op.
pub fn compute_layout(
    image_count: usize,
    images_per_page: usize,
    page_size: PageSize,
) -> Vec<PageLayout> {
    GridLayout::new(page_size, images_per_page).pages(image_count)
}
