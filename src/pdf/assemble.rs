//! Multi-page document assembly using lopdf
//!
//! Each page of the layout becomes one PDF page. Every filled cell gets an
//! image XObject (with a soft mask when the unit has transparency) drawn at
//! the unit's centered placement; blank cells produce no content at all.
//!
//! Units are consumed: their pixel buffers move into the document streams.

use chrono::Local;
use lopdf::{text_string, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::{Error, Result};
use crate::layout::{PageLayout, PageSize};
use crate::render::RenderedImage;

/// Options for assembling the output document
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Size of every output page
    pub page_size: PageSize,
    /// Flate-compress content streams too, not just image data
    pub compress_all: bool,
    /// Document title written to the Info dictionary
    pub title: Option<String>,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            page_size: crate::constants::DEFAULT_PAGE_SIZE,
            compress_all: true,
            title: None,
        }
    }
}

/// Assemble `pages` into PDF bytes.
///
/// `units[i]` is drawn in the cell that references image `i`; each image may
/// be referenced once.
///
/// # Example
///
/// ```no_run
/// use svg_grid_pdf::layout::{compute_layout, PageSize};
/// use svg_grid_pdf::pdf::{assemble, AssembleOptions};
///
/// let units: Vec<svg_grid_pdf::render::RenderedImage> = Vec::new(); // from ImageRenderer
/// let pages = compute_layout(units.len(), 9, PageSize::A4);
/// let bytes = assemble(&pages, units, &AssembleOptions::default())
///     .expect("Failed to assemble");
/// ```
pub fn assemble(
    pages: &[PageLayout],
    units: Vec<RenderedImage>,
    options: &AssembleOptions,
) -> Result<Vec<u8>> {
    assemble_with_progress(pages, units, options, |_, _| {})
}

/// Same as [`assemble`], calling `on_page(page_number, page_count)` before
/// each page is drawn (1-based).
pub fn assemble_with_progress(
    pages: &[PageLayout],
    units: Vec<RenderedImage>,
    options: &AssembleOptions,
    mut on_page: impl FnMut(usize, usize),
) -> Result<Vec<u8>> {
    let mut units: Vec<Option<RenderedImage>> = units.into_iter().map(Some).collect();
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let (page_width, page_height) = options.page_size.size_pt();

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for (i, page) in pages.iter().enumerate() {
        on_page(i + 1, pages.len());
        let page_id = add_page(&mut doc, page, &mut units, options, pages_id)?;
        kids.push(Object::Reference(page_id));
    }

    let mut pages_object = Dictionary::new();
    pages_object.set("Type", Object::Name(b"Pages".to_vec()));
    pages_object.set("Count", Object::Integer(kids.len() as i64));
    pages_object.set("Kids", Object::Array(kids));
    pages_object.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page_width as f32),
            Object::Real(page_height as f32),
        ]),
    );
    doc.objects.insert(pages_id, Object::Dictionary(pages_object));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = doc.add_object(Object::Dictionary(catalog));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let info_id = doc.add_object(Object::Dictionary(info_dictionary(options)));
    doc.trailer.set("Info", Object::Reference(info_id));

    // Streams created with compression disabled are left as-is
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// Add one page with its image XObjects and content stream
fn add_page(
    doc: &mut Document,
    page: &PageLayout,
    units: &mut [Option<RenderedImage>],
    options: &AssembleOptions,
    parent_pages_id: ObjectId,
) -> Result<ObjectId> {
    let mut content = String::new();
    let mut xobjects = Dictionary::new();

    for (slot, cell) in page.cells.iter().enumerate() {
        let Some(image_index) = cell.image else {
            continue;
        };
        let unit = units
            .get_mut(image_index)
            .and_then(Option::take)
            .ok_or(Error::MissingImage {
                page: page.index + 1,
                image: image_index,
            })?;

        let placed = unit.placement_in(&cell.rect);
        let name = format!("Im{}", slot);
        let image_id = add_image_xobject(doc, unit);
        xobjects.set(name.clone(), Object::Reference(image_id));

        content.push_str(&format!(
            "q\n{:.4} 0 0 {:.4} {:.4} {:.4} cm\n/{} Do\nQ\n",
            placed.width, placed.height, placed.x, placed.y, name
        ));
    }

    let content_id = doc.add_object(
        Stream::new(Dictionary::new(), content.into_bytes()).with_compression(options.compress_all),
    );

    let mut resources = Dictionary::new();
    resources.set("XObject", Object::Dictionary(xobjects));

    let (page_width, page_height) = options.page_size.size_pt();
    let mut page_dict = Dictionary::new();
    page_dict.set("Type", Object::Name(b"Page".to_vec()));
    page_dict.set("Parent", Object::Reference(parent_pages_id));
    page_dict.set(
        "MediaBox",
        Object::Array(vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(page_width as f32),
            Object::Real(page_height as f32),
        ]),
    );
    page_dict.set("Resources", Object::Dictionary(resources));
    page_dict.set("Contents", Object::Reference(content_id));

    Ok(doc.add_object(Object::Dictionary(page_dict)))
}

/// Add an 8-bit DeviceRGB image, plus a DeviceGray soft mask if it has alpha
fn add_image_xobject(doc: &mut Document, unit: RenderedImage) -> ObjectId {
    let mut dict = image_dictionary(&unit, b"DeviceRGB");
    let mask_dict = image_dictionary(&unit, b"DeviceGray");

    if let Some(alpha) = unit.alpha {
        let mask_id = doc.add_object(Stream::new(mask_dict, alpha));
        dict.set("SMask", Object::Reference(mask_id));
    }

    doc.add_object(Stream::new(dict, unit.rgb))
}

fn image_dictionary(unit: &RenderedImage, color_space: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(unit.pixel_width as i64));
    dict.set("Height", Object::Integer(unit.pixel_height as i64));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict
}

fn info_dictionary(options: &AssembleOptions) -> Dictionary {
    let mut info = Dictionary::new();
    if let Some(title) = &options.title {
        // UTF-16BE with BOM for non-ASCII, readers assume PDFDocEncoding otherwise
        info.set("Title", text_string(title));
    }
    info.set(
        "Producer",
        text_string(&format!("svg-grid-pdf {}", env!("CARGO_PKG_VERSION"))),
    );
    info.set(
        "CreationDate",
        Object::string_literal(Local::now().format("D:%Y%m%d%H%M%S").to_string()),
    );
    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{compute_layout, GridLayout};
    use crate::pdf::metadata::inspect_bytes;
    use std::path::PathBuf;

    fn solid_unit(name: &str, width_pt: f64, height_pt: f64, with_alpha: bool) -> RenderedImage {
        let (pw, ph) = (4u32, 2u32);
        let count = (pw * ph) as usize;
        RenderedImage {
            source: PathBuf::from(name),
            width_pt,
            height_pt,
            scale: 1.0,
            pixel_width: pw,
            pixel_height: ph,
            rgb: vec![128; count * 3],
            alpha: with_alpha.then(|| vec![64; count]),
        }
    }

    #[test]
    fn test_assemble_ten_images_on_two_pages() {
        let units: Vec<RenderedImage> = (0..10)
            .map(|i| solid_unit(&format!("{}.svg", i), 40.0, 20.0, false))
            .collect();
        let pages = compute_layout(units.len(), 9, PageSize::A4);

        let bytes = assemble(&pages, units, &AssembleOptions::default()).unwrap();
        let info = inspect_bytes(&bytes).unwrap();

        assert_eq!(info.page_count, 2);
        assert_eq!(info.images_per_page, vec![9, 1]);
    }

    #[test]
    fn test_soft_mask_is_not_counted_as_placed_image() {
        let units = vec![
            solid_unit("a.svg", 40.0, 20.0, true),
            solid_unit("b.svg", 40.0, 20.0, false),
        ];
        let pages = compute_layout(units.len(), 4, PageSize::Letter);

        let bytes = assemble(&pages, units, &AssembleOptions::default()).unwrap();
        let info = inspect_bytes(&bytes).unwrap();
        assert_eq!(info.images_per_page, vec![2]);
    }

    #[test]
    fn test_uncompressed_content_places_images_in_cells() {
        let units = vec![solid_unit("a.svg", 40.0, 20.0, false)];
        let grid = GridLayout::new(PageSize::A4, 9);
        let pages = grid.pages(1);
        let options = AssembleOptions {
            compress_all: false,
            ..Default::default()
        };

        let placed = units[0].placement_in(&grid.cell_rect(0, 0));

        let bytes = assemble(&pages, units, &options).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();

        let expected = format!(
            "{:.4} 0 0 {:.4} {:.4} {:.4} cm",
            placed.width, placed.height, placed.x, placed.y
        );
        assert!(content.contains(&expected), "content was: {}", content);
        assert_eq!(content.matches(" Do").count(), 1);
    }

    #[test]
    fn test_title_in_info_dictionary() {
        let units = vec![solid_unit("a.svg", 10.0, 10.0, false)];
        let pages = compute_layout(1, 1, PageSize::A3);
        let options = AssembleOptions {
            page_size: PageSize::A3,
            title: Some("converted_svgs".to_string()),
            ..Default::default()
        };

        let bytes = assemble(&pages, units, &options).unwrap();
        let info = inspect_bytes(&bytes).unwrap();
        assert_eq!(info.title.as_deref(), Some("converted_svgs"));
        assert!(info.producer.unwrap().starts_with("svg-grid-pdf"));
    }

    #[test]
    fn test_missing_unit_is_an_error() {
        let pages = compute_layout(2, 9, PageSize::A4);
        let units = vec![solid_unit("a.svg", 10.0, 10.0, false)];
        let result = assemble(&pages, units, &AssembleOptions::default());
        assert!(matches!(result, Err(Error::MissingImage { page: 1, image: 1 })));
    }

    #[test]
    fn test_progress_reports_each_page() {
        let units: Vec<RenderedImage> = (0..5)
            .map(|i| solid_unit(&format!("{}.svg", i), 10.0, 10.0, false))
            .collect();
        let pages = compute_layout(units.len(), 2, PageSize::A4);

        let mut seen = Vec::new();
        assemble_with_progress(&pages, units, &AssembleOptions::default(), |n, total| {
            seen.push((n, total))
        })
        .unwrap();
        assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
    }

    #[test]
    fn test_non_ascii_title_is_utf16_text_string() {
        let units = vec![solid_unit("a.svg", 10.0, 10.0, false)];
        let pages = compute_layout(1, 1, PageSize::A4);
        let options = AssembleOptions {
            title: Some("Übersicht".to_string()),
            ..Default::default()
        };

        let bytes = assemble(&pages, units, &options).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let raw = doc
            .get_dictionary(info_id)
            .unwrap()
            .get(b"Title")
            .unwrap()
            .as_str()
            .unwrap()
            .to_vec();
        assert!(raw.starts_with(b"\xFE\xFF"), "title bytes were: {:?}", raw);

        let info = inspect_bytes(&bytes).unwrap();
        assert_eq!(info.title.as_deref(), Some("Übersicht"));
    }

    fn content_is_filtered(compress_all: bool) -> bool {
        let units: Vec<RenderedImage> = (0..9)
            .map(|i| solid_unit(&format!("{}.svg", i), 40.0, 20.0, false))
            .collect();
        let pages = compute_layout(units.len(), 9, PageSize::A4);
        let options = AssembleOptions {
            compress_all,
            ..Default::default()
        };

        let bytes = assemble(&pages, units, &options).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let content_id = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Contents")
            .unwrap()
            .as_reference()
            .unwrap();
        let stream = doc.get_object(content_id).unwrap().as_stream().unwrap();
        stream.dict.get(b"Filter").is_ok()
    }

    #[test]
    fn test_high_quality_compresses_content_streams() {
        assert!(content_is_filtered(true));
    }

    #[test]
    fn test_standard_leaves_content_streams_uncompressed() {
        assert!(!content_is_filtered(false));
    }
}
