//! TrueType faces used to rasterize markup and typed signatures.
//!
//! Faces are looked up in the fonts directory as `<Family>-Regular.ttf`,
//! `<Family>-Bold.ttf`, `<Family>-Italic.ttf` and `<Family>-BoldItalic.ttf`.
//! Arial is preferred, then LiberationSans, then whichever family provides a
//! regular face. An empty directory selects DejaVu Sans, which is compiled
//! into the binary. Tests use a block-glyph book with fixed advances so their
//! measurements do not depend on any font file.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use log::{error, info, warn};
use std::fs;
use std::path::Path;

const PREFERRED_FAMILIES: [&str; 2] = ["Arial", "LiberationSans"];

const BUNDLED_REGULAR: &[u8] = include_bytes!("../../fonts/DejaVuSans.ttf");
const BUNDLED_BOLD: &[u8] = include_bytes!("../../fonts/DejaVuSans-Bold.ttf");
const BUNDLED_ITALIC: &[u8] = include_bytes!("../../fonts/DejaVuSans-Oblique.ttf");
const BUNDLED_BOLD_ITALIC: &[u8] = include_bytes!("../../fonts/DejaVuSans-BoldOblique.ttf");

/// Advance of a fallback glyph as a fraction of the pixel size.
const FALLBACK_ADVANCE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontStyle {
    pub fn new(bold: bool, italic: bool) -> Self {
        match (bold, italic) {
            (true, true) => FontStyle::BoldItalic,
            (true, false) => FontStyle::Bold,
            (false, true) => FontStyle::Italic,
            (false, false) => FontStyle::Regular,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            FontStyle::Regular => "Regular",
            FontStyle::Bold => "Bold",
            FontStyle::Italic => "Italic",
            FontStyle::BoldItalic => "BoldItalic",
        }
    }
}

#[derive(Default)]
pub struct FontBook {
    regular: Option<FontVec>,
    bold: Option<FontVec>,
    italic: Option<FontVec>,
    bold_italic: Option<FontVec>,
}

fn load_face(dir: &Path, family: &str, style: FontStyle) -> Option<FontVec> {
    let path = dir.join(format!("{}-{}.ttf", family, style.suffix()));
    let bytes = fs::read(&path).ok()?;
    match FontVec::try_from_vec(bytes) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("Skipping unreadable font {}: {}", path.display(), e);
            None
        }
    }
}

fn bundled_face(bytes: &'static [u8], style: FontStyle) -> Option<FontVec> {
    match FontVec::try_from_vec(bytes.to_vec()) {
        Ok(font) => Some(font),
        Err(e) => {
            error!("Bundled {} face is unreadable: {}", style.suffix(), e);
            None
        }
    }
}

/// Families with a regular face in `dir`, preferred ones first.
fn candidate_families(dir: &Path) -> Vec<String> {
    let mut families: Vec<String> = PREFERRED_FAMILIES.iter().map(|f| f.to_string()).collect();
    if let Ok(entries) = fs::read_dir(dir) {
        let mut others: Vec<String> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                name.strip_suffix("-Regular.ttf").map(str::to_string)
            })
            .filter(|family| !families.contains(family))
            .collect();
        others.sort();
        families.extend(others);
    }
    families
}

impl FontBook {
    /// A book without faces; everything is drawn with block glyphs.
    #[cfg(test)]
    pub(crate) fn fallback() -> Self {
        FontBook::default()
    }

    /// DejaVu Sans as compiled into the binary.
    pub fn bundled() -> Self {
        FontBook {
            regular: bundled_face(BUNDLED_REGULAR, FontStyle::Regular),
            bold: bundled_face(BUNDLED_BOLD, FontStyle::Bold),
            italic: bundled_face(BUNDLED_ITALIC, FontStyle::Italic),
            bold_italic: bundled_face(BUNDLED_BOLD_ITALIC, FontStyle::BoldItalic),
        }
    }

    pub fn load(dir: &Path) -> Self {
        for family in candidate_families(dir) {
            if let Some(regular) = load_face(dir, &family, FontStyle::Regular) {
                info!("Using font family {} from {}", family, dir.display());
                return FontBook {
                    regular: Some(regular),
                    bold: load_face(dir, &family, FontStyle::Bold),
                    italic: load_face(dir, &family, FontStyle::Italic),
                    bold_italic: load_face(dir, &family, FontStyle::BoldItalic),
                };
            }
        }
        warn!(
            "No usable fonts in {}, using the bundled DejaVu Sans",
            dir.display()
        );
        FontBook::bundled()
    }

    pub fn has_faces(&self) -> bool {
        self.regular.is_some()
    }

    fn face(&self, style: FontStyle) -> Option<&FontVec> {
        let preferred = match style {
            FontStyle::Regular => None,
            FontStyle::Bold => self.bold.as_ref(),
            FontStyle::Italic => self.italic.as_ref(),
            FontStyle::BoldItalic => self
                .bold_italic
                .as_ref()
                .or(self.bold.as_ref())
                .or(self.italic.as_ref()),
        };
        preferred.or(self.regular.as_ref())
    }

    /// Advance width of `text` in pixels.
    pub fn measure(&self, style: FontStyle, px: f32, text: &str) -> f32 {
        match self.face(style) {
            Some(font) => text_size(PxScale::from(px), font, text).0 as f32,
            None => text.chars().count() as f32 * px * FALLBACK_ADVANCE,
        }
    }

    /// Draws `text` with its top-left corner at `(x, y)`.
    pub fn draw(&self, img: &mut RgbImage, style: FontStyle, px: f32, x: i32, y: i32, color: Rgb<u8>, text: &str) {
        match self.face(style) {
            Some(font) => draw_text_mut(img, color, x, y, PxScale::from(px), font, text),
            None => draw_fallback(img, style, px, x, y, color, text),
        }
    }
}

/// Each visible character becomes a filled box on the x-height band.
fn draw_fallback(img: &mut RgbImage, style: FontStyle, px: f32, x: i32, y: i32, color: Rgb<u8>, text: &str) {
    let advance = px * FALLBACK_ADVANCE;
    let heavy = matches!(style, FontStyle::Bold | FontStyle::BoldItalic);
    let width = ((advance * if heavy { 0.8 } else { 0.6 }).round() as u32).max(1);
    let height = ((px * 0.55).round() as u32).max(1);
    let top = y + (px * 0.3).round() as i32;
    for (index, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            continue;
        }
        let left = x + (index as f32 * advance).round() as i32;
        draw_filled_rect_mut(img, Rect::at(left, top).of_size(width, height), color);
    }
}
