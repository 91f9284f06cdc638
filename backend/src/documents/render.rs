//! Markup to PDF: lay the markup out on a canvas, cut the canvas into
//! page-high bands and rasterize each band onto its own A4 page. Only one
//! band's bitmap is alive at a time.
//!
//! Bands are scaled to the page's content width, so the number of pages is
//! the canvas height divided by one page's content height, rounded up.

use crate::documents::fonts::FontBook;
use crate::documents::layout::{layout, DrawItem, Layout, Metrics};
use crate::documents::pdf::{self, PAGE_HEIGHT, PAGE_WIDTH};
use crate::error::{AppError, AppResult};
use common::model::markup::StructuredDocument;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use log::debug;

pub const MARGIN: f32 = 40.0;
/// Canvas upscaling applied before rasterizing.
pub const RENDER_SCALE: f32 = 2.0;
/// Longest document a render may produce.
pub const MAX_PAGES: usize = 200;

const INK: Rgb<u8> = Rgb([0, 0, 0]);
const RULE: Rgb<u8> = Rgb([153, 153, 153]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Rows `[top, top + height)` of the source bitmap shown on one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    pub top: u32,
    pub height: u32,
}

/// Splits a bitmap of `image_height` rows into bands of `page_rows` rows.
/// Boundaries are rounded once, so consecutive bands share an edge and every
/// row lands in exactly one band. An overflow of less than half a row is a
/// rounding artifact and does not open another page.
pub fn plan_bands(image_height: u32, page_rows: f64) -> Vec<Band> {
    if image_height == 0 || page_rows <= 0.0 {
        return vec![Band { top: 0, height: image_height }];
    }
    let pages = (((image_height as f64 - 0.5) / page_rows).ceil() as u32).max(1);
    (0..pages)
        .map(|index| {
            let top = ((index as f64 * page_rows).round() as u32).min(image_height);
            let bottom = if index + 1 == pages {
                image_height
            } else {
                (((index + 1) as f64 * page_rows).round() as u32).min(image_height)
            };
            Band {
                top,
                height: bottom - top,
            }
        })
        .collect()
}

/// Rasterizes rows `[top, top + height)` of a laid-out canvas onto a white
/// bitmap. Items straddling a band edge are drawn into both neighbours and
/// clipped, so consecutive bands tile the full canvas exactly.
pub fn rasterize_band(layout: &Layout, fonts: &FontBook, band: Band) -> RgbImage {
    let mut img = RgbImage::from_pixel(layout.width.max(1), band.height.max(1), WHITE);
    let top = band.top as f32;
    let bottom = (band.top + band.height) as f32;
    let offset = band.top as i32;
    for item in &layout.items {
        match item {
            DrawItem::Text {
                x,
                y,
                px,
                style,
                underline,
                text,
            } => {
                if y + px * 2.0 < top || y - px > bottom {
                    continue;
                }
                let row = y.round() as i32 - offset;
                fonts.draw(&mut img, *style, *px, x.round() as i32, row, INK, text);
                if *underline {
                    let width = fonts.measure(*style, *px, text).round().max(1.0) as u32;
                    let thickness = (px / 12.0).round().max(1.0) as u32;
                    let rule_row = (y + px * 1.05).round() as i32 - offset;
                    let rect = Rect::at(x.round() as i32, rule_row).of_size(width, thickness);
                    draw_filled_rect_mut(&mut img, rect, INK);
                }
            }
            DrawItem::Rule { x0, x1, y } => {
                if y + RENDER_SCALE < top || *y > bottom {
                    continue;
                }
                let width = (x1 - x0).round().max(1.0) as u32;
                let rect = Rect::at(x0.round() as i32, y.round() as i32 - offset)
                    .of_size(width, RENDER_SCALE as u32);
                draw_filled_rect_mut(&mut img, rect, RULE);
            }
        }
    }
    img
}

/// Rasterizes the whole canvas as one bitmap.
pub fn rasterize(layout: &Layout, fonts: &FontBook) -> RgbImage {
    let band = Band {
        top: 0,
        height: layout.height,
    };
    rasterize_band(layout, fonts, band)
}

/// Places the laid-out canvas on A4 pages, one rasterized band per page.
pub fn paginate(layout: &Layout, fonts: &FontBook) -> AppResult<Vec<u8>> {
    let width = layout.width.max(1);
    let content_width = PAGE_WIDTH - 2.0 * MARGIN;
    let content_height = PAGE_HEIGHT - 2.0 * MARGIN;
    let points_per_pixel = content_width as f64 / width as f64;
    let page_rows = content_height as f64 / points_per_pixel;

    let bands = plan_bands(layout.height, page_rows);
    if bands.len() > MAX_PAGES {
        return Err(AppError::unprocessable(format!(
            "Document would render to {} pages, more than the limit of {}",
            bands.len(),
            MAX_PAGES
        )));
    }

    let (mut doc, pages_id) = pdf::new_document();
    for band in bands {
        let page_id = pdf::add_page(&mut doc, pages_id, PAGE_WIDTH, PAGE_HEIGHT)?;
        if band.height == 0 {
            continue;
        }
        let slice = rasterize_band(layout, fonts, band);
        let image_id = pdf::embed_rgb_image(&mut doc, &slice)?;
        let name = pdf::register_xobject(&mut doc, page_id, image_id)?;
        let drawn_height = (band.height as f64 * points_per_pixel) as f32;
        let y = PAGE_HEIGHT - MARGIN - drawn_height;
        pdf::append_content(
            &mut doc,
            page_id,
            pdf::draw_image_ops(&name, MARGIN, y, content_width, drawn_height),
        )?;
    }
    doc.compress();
    pdf::save(&mut doc)
}

/// Renders stored markup to a PDF. Markup without visible content yields a
/// single blank page.
pub fn render(markup: &str, fonts: &FontBook) -> AppResult<Vec<u8>> {
    let document = StructuredDocument::parse(markup);
    let laid_out = layout(&document, fonts, Metrics::scaled(RENDER_SCALE));
    if laid_out.is_empty() {
        let (mut doc, pages_id) = pdf::new_document();
        pdf::add_page(&mut doc, pages_id, PAGE_WIDTH, PAGE_HEIGHT)?;
        return pdf::save(&mut doc);
    }
    debug!(
        "Laid out markup on a {}x{} canvas",
        laid_out.width, laid_out.height
    );
    paginate(&laid_out, fonts)
}
