//! PDF metadata extraction
//!
//! Reads back the page count and the number of placed images per page, used
//! by the `info` command and to verify assembled documents.

use std::path::Path;

use lopdf::{decode_text_string, Dictionary, Document, Object};

use crate::error::{Error, Result};

/// Summary of a PDF document
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    /// Number of pages from the Pages dictionary Count
    pub page_count: usize,
    /// Placed image XObjects on each page, in page order
    pub images_per_page: Vec<usize>,
    /// Document title (if present)
    pub title: Option<String>,
    /// Producer string (if present)
    pub producer: Option<String>,
}

impl DocumentInfo {
    /// Total placed images over all pages
    pub fn image_count(&self) -> usize {
        self.images_per_page.iter().sum()
    }
}

/// Inspect a PDF file on disk
pub fn inspect_document(path: &Path) -> Result<DocumentInfo> {
    if !path.exists() {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }
    inspect(&Document::load(path)?)
}

/// Inspect PDF bytes held in memory
pub fn inspect_bytes(bytes: &[u8]) -> Result<DocumentInfo> {
    inspect(&Document::load_mem(bytes)?)
}

/// Count pages by reading the Count field from the Pages dictionary
pub fn count_pages(path: &Path) -> Result<usize> {
    Ok(inspect_document(path)?.page_count)
}

fn inspect(doc: &Document) -> Result<DocumentInfo> {
    let page_count = count_pages_from_catalog(doc)?;

    let images_per_page = doc
        .get_pages()
        .values()
        .map(|&page_id| {
            doc.get_dictionary(page_id)
                .map(|page| count_page_images(doc, page))
                .unwrap_or(0)
        })
        .collect();

    let info = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj));

    Ok(DocumentInfo {
        page_count,
        images_per_page,
        title: info.and_then(|d| text_entry(d, b"Title")),
        producer: info.and_then(|d| text_entry(d, b"Producer")),
    })
}

fn count_pages_from_catalog(doc: &Document) -> Result<usize> {
    let pages_id = doc.catalog()?.get(b"Pages")?.as_reference()?;
    let count = doc.get_dictionary(pages_id)?.get(b"Count")?.as_i64()?;
    Ok(count.max(0) as usize)
}

/// Image XObjects referenced from the page's own Resources (soft masks excluded)
fn count_page_images(doc: &Document, page: &Dictionary) -> usize {
    let Some(resources) = page.get(b"Resources").ok().and_then(|obj| resolve_dict(doc, obj)) else {
        return 0;
    };
    let Some(xobjects) = resources.get(b"XObject").ok().and_then(|obj| resolve_dict(doc, obj)) else {
        return 0;
    };

    xobjects
        .iter()
        .filter(|(_, value)| {
            let stream = match value {
                Object::Reference(id) => doc.get_object(*id).ok().and_then(|o| o.as_stream().ok()),
                Object::Stream(stream) => Some(stream),
                _ => None,
            };
            matches!(
                stream.and_then(|s| s.dict.get(b"Subtype").ok()),
                Some(Object::Name(name)) if name.as_slice() == b"Image"
            )
        })
        .count()
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match obj {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Text string entry, decoded by its BOM (PDFDocEncoding, UTF-16BE or UTF-8)
fn text_entry(dict: &Dictionary, key: &[u8]) -> Option<String> {
    decode_text_string(dict.get(key).ok()?).ok()
}
