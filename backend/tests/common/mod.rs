#![allow(dead_code)]

use backend::config::AppConfig;
use backend::documents::fonts::FontBook;
use backend::documents::ocr::OcrEngine;
use backend::documents::pdf;
use backend::error::AppResult;
use backend::state::AppState;
use backend::storage::ledger::SqliteLedger;
use backend::storage::Database;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::{Rgb, RgbImage};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// Returns the same text for every page.
pub struct FixedOcr(pub String);

impl OcrEngine for FixedOcr {
    fn recognize_page(&self, _pdf: &Path, _page_number: u32) -> AppResult<String> {
        Ok(self.0.clone())
    }
}

pub fn test_state(ocr_text: &str) -> (TempDir, AppState) {
    let dir = TempDir::new().expect("temp dir");
    let config = AppConfig {
        data_dir: dir.path().to_path_buf(),
        fonts_dir: dir.path().join("fonts"),
        vendor_label: "Aurora Strings".to_string(),
        ..AppConfig::default()
    };
    let ledger = Arc::new(SqliteLedger::new(Database::new(config.db_path())));
    let state = AppState::with_engines(
        config,
        FontBook::bundled(),
        Arc::new(FixedOcr(ocr_text.to_string())),
        ledger,
    );
    state.init().expect("init");
    (dir, state)
}

/// A one-page PDF with a line of text per entry.
pub fn text_pdf(lines: &[&str]) -> Vec<u8> {
    let (mut doc, pages_id) = pdf::new_document();
    let page_id = pdf::add_page(&mut doc, pages_id, pdf::PAGE_WIDTH, pdf::PAGE_HEIGHT).unwrap();
    let font = pdf::register_standard_font(&mut doc, page_id, "Helvetica").unwrap();
    for (index, line) in lines.iter().enumerate() {
        let y = 780.0 - index as f32 * 20.0;
        pdf::append_content(&mut doc, page_id, pdf::draw_text_ops(&font, 12.0, 50.0, y, 0.0, line))
            .unwrap();
    }
    pdf::save(&mut doc).unwrap()
}

/// A PDF whose pages only hold an image, like a scan.
pub fn image_only_pdf(pages: usize) -> Vec<u8> {
    let (mut doc, pages_id) = pdf::new_document();
    for _ in 0..pages {
        let page_id = pdf::add_page(&mut doc, pages_id, pdf::PAGE_WIDTH, pdf::PAGE_HEIGHT).unwrap();
        let scan = RgbImage::from_pixel(20, 30, Rgb([240, 240, 240]));
        let image_id = pdf::embed_rgb_image(&mut doc, &scan).unwrap();
        let name = pdf::register_xobject(&mut doc, page_id, image_id).unwrap();
        pdf::append_content(
            &mut doc,
            page_id,
            pdf::draw_image_ops(&name, 40.0, 40.0, 515.0, 762.0),
        )
        .unwrap();
    }
    pdf::save(&mut doc).unwrap()
}

pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Image XObjects on the last page of `bytes`.
pub fn images_on_last_page(bytes: &[u8]) -> usize {
    let doc = pdf::load(bytes).unwrap();
    let page_id = *doc.get_pages().values().last().unwrap();
    match pdf::inherited(&doc, page_id, b"Resources") {
        Some(lopdf::Object::Dictionary(resources)) => match resources.get(b"XObject") {
            Ok(lopdf::Object::Dictionary(xobjects)) => xobjects.len(),
            _ => 0,
        },
        _ => 0,
    }
}
