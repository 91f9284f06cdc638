//! Stamps a captured signature and its caption onto the last page of a PDF.

use crate::documents::pdf;
use crate::error::AppResult;
use image::RgbImage;
use log::{debug, warn};

/// Widest a stamp is drawn, in points.
pub const MAX_STAMP_WIDTH: f32 = 120.0;
/// Tallest a stamp is drawn, in points.
pub const MAX_STAMP_HEIGHT: f32 = 60.0;
/// Distance of a stamp from the page's right and bottom edges.
pub const EDGE_OFFSET: f32 = 40.0;
/// Caption baseline, below the stamp's bottom edge.
pub const CAPTION_DROP: f32 = 14.0;
const CAPTION_SIZE: f32 = 9.0;
const CAPTION_GREY: f32 = 0.4;
const SLOT_GAP: f32 = 20.0;
/// Narrowest page that fits both slots side by side with edge margins.
const SIDE_BY_SIDE_WIDTH: f32 = 2.0 * EDGE_OFFSET + 2.0 * MAX_STAMP_WIDTH + SLOT_GAP;

/// Who a stamp belongs to. The client takes the bottom-right slot. The vendor
/// takes the slot to its left, or the one above it on pages too narrow for
/// two slots in a row, so the second stamp never covers the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signer {
    Client,
    Vendor,
}

impl Signer {
    /// Right inset and bottom of the signer's slot on a page of `page_width`.
    fn slot(self, page_width: f32) -> (f32, f32) {
        match self {
            Signer::Client => (EDGE_OFFSET, EDGE_OFFSET),
            Signer::Vendor if page_width >= SIDE_BY_SIDE_WIDTH => {
                (EDGE_OFFSET + MAX_STAMP_WIDTH + SLOT_GAP, EDGE_OFFSET)
            }
            Signer::Vendor => (EDGE_OFFSET, EDGE_OFFSET + MAX_STAMP_HEIGHT + SLOT_GAP),
        }
    }

    pub fn caption(self, name: &str) -> String {
        match self {
            Signer::Client => format!("{} (Client)", name),
            Signer::Vendor => format!("{} (Vendor)", name),
        }
    }
}

/// Where a stamp lands on a page of the given width, in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Scales the image into the stamp box, never up, and clamps it to the page.
pub fn placement(page_width: f32, image_width: u32, image_height: u32, signer: Signer) -> Placement {
    let mut width = image_width.max(1) as f32;
    let mut height = image_height.max(1) as f32;
    for limit in [MAX_STAMP_WIDTH, page_width.max(1.0)] {
        if width > limit {
            height = height * limit / width;
            width = limit;
        }
    }
    if height > MAX_STAMP_HEIGHT {
        width = width * MAX_STAMP_HEIGHT / height;
        height = MAX_STAMP_HEIGHT;
    }
    let (right_inset, y) = signer.slot(page_width);
    Placement {
        x: (page_width - width - right_inset).max(0.0),
        y,
        width,
        height,
    }
}

/// Returns `bytes` with `signature` drawn on the last page. A document without
/// pages is returned unchanged.
pub fn stamp(bytes: &[u8], signature: &RgbImage, signer: Signer, caption: &str) -> AppResult<Vec<u8>> {
    let mut doc = pdf::load(bytes)?;
    let Some(page_id) = doc.get_pages().values().last().copied() else {
        warn!("Document has no pages; signature not stamped");
        return Ok(bytes.to_vec());
    };
    let (page_width, _) = pdf::page_size(&doc, page_id);
    let at = placement(page_width, signature.width(), signature.height(), signer);

    let image_id = pdf::embed_rgb_image(&mut doc, signature)?;
    let image_name = pdf::register_xobject(&mut doc, page_id, image_id)?;
    let font_name = pdf::register_standard_font(&mut doc, page_id, "Helvetica")?;

    let mut operations = pdf::draw_image_ops(&image_name, at.x, at.y, at.width, at.height);
    operations.extend(pdf::draw_text_ops(
        &font_name,
        CAPTION_SIZE,
        at.x,
        at.y - CAPTION_DROP,
        CAPTION_GREY,
        caption,
    ));
    pdf::append_content(&mut doc, page_id, operations)?;
    debug!("Stamped {:?} signature at ({}, {})", signer, at.x, at.y);
    pdf::save(&mut doc)
}

#[cfg(test)]
pub(crate) mod inspect {
    use crate::documents::pdf;
    use lopdf::Object;

    /// Number of image XObjects registered on page `number` (1-based).
    pub fn images_on_page(bytes: &[u8], number: u32) -> usize {
        let doc = pdf::load(bytes).unwrap();
        let page_id = *doc.get_pages().get(&number).unwrap();
        let Some(Object::Dictionary(resources)) = pdf::inherited(&doc, page_id, b"Resources") else {
            return 0;
        };
        match resources.get(b"XObject") {
            Ok(Object::Dictionary(xobjects)) => xobjects.len(),
            Ok(Object::Reference(id)) => doc
                .get_dictionary(*id)
                .map(|d| d.len())
                .unwrap_or(0),
            _ => 0,
        }
    }
}
