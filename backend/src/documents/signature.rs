//! Signature capture: turns a signing request's signature into an opaque
//! raster ready to be stamped.

use crate::documents::fonts::{FontBook, FontStyle};
use crate::error::{AppError, AppResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common::requests::{SignatureInput, StrokePoint};
use image::{imageops, load_from_memory, DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

/// Signature pad canvas.
pub const PAD_WIDTH: u32 = 400;
pub const PAD_HEIGHT: u32 = 150;
/// Typed-name canvas.
pub const TYPED_WIDTH: u32 = 300;
pub const TYPED_HEIGHT: u32 = 80;
const TYPED_FONT_PX: f32 = 24.0;

const INK: Rgb<u8> = Rgb([0x1a, 0x1a, 0x1a]);
const PAPER: Rgb<u8> = Rgb([255, 255, 255]);
/// Half the 2 px pen width.
const PEN_RADIUS: i32 = 1;

pub fn capture(input: &SignatureInput, fonts: &FontBook) -> AppResult<RgbImage> {
    match input {
        SignatureInput::Image { png_base64 } => from_png_base64(png_base64),
        SignatureInput::Strokes { strokes } => from_strokes(strokes),
        SignatureInput::Typed { name } => from_typed_name(name, fonts),
    }
}

/// Draws pen strokes on the signature pad canvas with round caps.
pub fn from_strokes(strokes: &[Vec<StrokePoint>]) -> AppResult<RgbImage> {
    if strokes.iter().all(|stroke| stroke.is_empty()) {
        return Err(AppError::unprocessable("Signature has no strokes"));
    }
    let mut img = RgbImage::from_pixel(PAD_WIDTH, PAD_HEIGHT, PAPER);
    for stroke in strokes {
        let mut points = stroke.iter();
        let Some(first) = points.next() else {
            continue;
        };
        dab(&mut img, first.x, first.y);
        let mut previous = *first;
        for point in points {
            let (dx, dy) = (point.x - previous.x, point.y - previous.y);
            let steps = (dx.abs().max(dy.abs()) * 2.0).ceil().max(1.0) as u32;
            for step in 1..=steps {
                let t = step as f32 / steps as f32;
                dab(&mut img, previous.x + dx * t, previous.y + dy * t);
            }
            previous = *point;
        }
    }
    Ok(img)
}

fn dab(img: &mut RgbImage, x: f32, y: f32) {
    draw_filled_circle_mut(img, (x.round() as i32, y.round() as i32), PEN_RADIUS, INK);
}

/// Renders a typed name in italics, centered in a thin frame.
pub fn from_typed_name(name: &str, fonts: &FontBook) -> AppResult<RgbImage> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::unprocessable("Typed signature is blank"));
    }
    let mut img = RgbImage::from_pixel(TYPED_WIDTH, TYPED_HEIGHT, PAPER);
    draw_hollow_rect_mut(&mut img, Rect::at(0, 0).of_size(TYPED_WIDTH, TYPED_HEIGHT), INK);

    let width = fonts.measure(FontStyle::Italic, TYPED_FONT_PX, name);
    let x = ((TYPED_WIDTH as f32 - width) / 2.0).round() as i32;
    let y = ((TYPED_HEIGHT as f32 - TYPED_FONT_PX) / 2.0).round() as i32;
    fonts.draw(&mut img, FontStyle::Italic, TYPED_FONT_PX, x, y, INK, name);
    Ok(img)
}

/// Decodes a base64 PNG (a `data:` URL prefix is accepted) and flattens any
/// transparency onto white.
pub fn from_png_base64(data: &str) -> AppResult<RgbImage> {
    let payload = match data.split_once("base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => data,
    };
    let bytes = BASE64.decode(payload.trim())?;
    if bytes.is_empty() {
        return Err(AppError::unprocessable("Signature image is empty"));
    }
    let decoded = load_from_memory(&bytes)
        .map_err(|e| AppError::unprocessable(format!("Unreadable signature image: {}", e)))?;
    Ok(flatten(&decoded))
}

fn flatten(img: &DynamicImage) -> RgbImage {
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let mut background = RgbaImage::from_pixel(w, h, Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut background, &rgba, 0, 0);
    DynamicImage::ImageRgba8(background).to_rgb8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn ink_pixels(img: &RgbImage) -> usize {
        img.pixels().filter(|p| p.0 == INK.0).count()
    }

    #[test]
    fn strokes_draw_on_the_pad_canvas() {
        let strokes = vec![vec![
            StrokePoint { x: 10.0, y: 10.0 },
            StrokePoint { x: 110.0, y: 60.0 },
        ]];
        let img = from_strokes(&strokes).unwrap();
        assert_eq!(img.dimensions(), (PAD_WIDTH, PAD_HEIGHT));
        assert_eq!(img.get_pixel(60, 35).0, INK.0);
        assert_eq!(img.get_pixel(300, 140).0, PAPER.0);
        assert!(ink_pixels(&img) > 100);
    }

    #[test]
    fn empty_strokes_are_rejected() {
        assert!(matches!(from_strokes(&[]), Err(AppError::Unprocessable(_))));
        assert!(matches!(
            from_strokes(&[vec![], vec![]]),
            Err(AppError::Unprocessable(_))
        ));
    }

    #[test]
    fn typed_names_are_framed_and_inked() {
        let img = from_typed_name("  Ada Lovelace ", &FontBook::fallback()).unwrap();
        assert_eq!(img.dimensions(), (TYPED_WIDTH, TYPED_HEIGHT));
        assert_eq!(img.get_pixel(0, 0).0, INK.0);
        assert_eq!(img.get_pixel(TYPED_WIDTH - 1, TYPED_HEIGHT - 1).0, INK.0);
        assert!(ink_pixels(&img) > 2 * (TYPED_WIDTH + TYPED_HEIGHT) as usize);
        assert!(matches!(
            from_typed_name("   ", &FontBook::fallback()),
            Err(AppError::Unprocessable(_))
        ));
    }

    #[test]
    fn transparent_png_is_flattened_onto_white() {
        let mut png = Vec::new();
        RgbaImage::from_pixel(4, 2, Rgba([0, 0, 0, 0]))
            .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        let url = format!("data:image/png;base64,{}", BASE64.encode(&png));
        let img = from_png_base64(&url).unwrap();
        assert_eq!(img.dimensions(), (4, 2));
        assert!(img.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn bad_images_are_unprocessable() {
        assert!(matches!(from_png_base64("!!!"), Err(AppError::Unprocessable(_))));
        assert!(matches!(
            from_png_base64(&BASE64.encode(b"not an image")),
            Err(AppError::Unprocessable(_))
        ));
        assert!(matches!(from_png_base64(""), Err(AppError::Unprocessable(_))));
    }
}
