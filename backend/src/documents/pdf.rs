//! Low-level helpers over `lopdf` shared by the renderer, the form editor and
//! the stamping code: loading, page geometry, image embedding and appending
//! drawing operations to an existing page.

use crate::error::{AppError, AppResult};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;

/// A4 in points.
pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

/// Parent chains deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 32;

/// Parses a document, reporting unreadable input as a client error.
pub fn load(bytes: &[u8]) -> AppResult<Document> {
    Document::load_mem(bytes)
        .map_err(|e| AppError::unprocessable(format!("Unsupported or corrupted PDF: {}", e)))
}

pub fn save(doc: &mut Document) -> AppResult<Vec<u8>> {
    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

/// Follows a reference to the object it points at.
pub fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> AppResult<&'a Object> {
    match obj {
        Object::Reference(id) => Ok(doc.get_object(*id)?),
        other => Ok(other),
    }
}

pub fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Looks up a page attribute, walking up the page tree for inheritable keys.
pub fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value).ok().cloned();
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

/// Width and height of a page in points, A4 when no usable MediaBox exists.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = match inherited(doc, page_id, b"MediaBox") {
        Some(Object::Array(values)) if values.len() == 4 => values,
        _ => return (PAGE_WIDTH, PAGE_HEIGHT),
    };
    let coords: Vec<f32> = media_box
        .iter()
        .filter_map(|v| resolve(doc, v).ok().and_then(number))
        .collect();
    if coords.len() != 4 {
        return (PAGE_WIDTH, PAGE_HEIGHT);
    }
    let width = (coords[2] - coords[0]).abs();
    let height = (coords[3] - coords[1]).abs();
    if width > 0.0 && height > 0.0 {
        (width, height)
    } else {
        (PAGE_WIDTH, PAGE_HEIGHT)
    }
}

/// Adds an opaque RGB image XObject, zlib-compressed.
pub fn embed_rgb_image(doc: &mut Document, img: &RgbImage) -> AppResult<ObjectId> {
    let (width, height) = img.dimensions();
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(img.as_raw())?;
    let compressed = encoder.finish()?;

    Ok(doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        compressed,
    )))
}

/// Gives the page its own resource dictionary so edits never leak into pages
/// that share an inherited or referenced one.
fn own_resources(doc: &mut Document, page_id: ObjectId) -> AppResult<()> {
    let mut resources = match inherited(doc, page_id, b"Resources") {
        Some(Object::Dictionary(dict)) => dict,
        _ => Dictionary::new(),
    };
    for key in [&b"XObject"[..], &b"Font"[..]] {
        if let Ok(Object::Reference(id)) = resources.get(key) {
            let owned = doc.get_object(*id)?.as_dict()?.clone();
            resources.set(key.to_vec(), Object::Dictionary(owned));
        }
    }
    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Registers `target` under a fresh name in the page's `category` resources
/// (`XObject` or `Font`) and returns that name.
fn register_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &str,
    prefix: &str,
    target: Object,
) -> AppResult<String> {
    own_resources(doc, page_id)?;
    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    let resources = page.get_mut(b"Resources")?.as_dict_mut()?;
    if !resources.has(category.as_bytes()) {
        resources.set(category, Object::Dictionary(Dictionary::new()));
    }
    let entries = resources.get_mut(category.as_bytes())?.as_dict_mut()?;

    let mut index = entries.len();
    let name = loop {
        let candidate = format!("{}{}", prefix, index);
        if !entries.has(candidate.as_bytes()) {
            break candidate;
        }
        index += 1;
    };
    entries.set(name.as_bytes().to_vec(), target);
    Ok(name)
}

pub fn register_xobject(doc: &mut Document, page_id: ObjectId, xobject: ObjectId) -> AppResult<String> {
    register_resource(doc, page_id, "XObject", "SdIm", Object::Reference(xobject))
}

/// Registers one of the standard 14 fonts (e.g. `Helvetica`) on the page.
pub fn register_standard_font(doc: &mut Document, page_id: ObjectId, base_font: &str) -> AppResult<String> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
        "Encoding" => "WinAnsiEncoding",
    });
    register_resource(doc, page_id, "Font", "SdF", Object::Reference(font_id))
}

fn content_stream(doc: &mut Document, operations: Vec<Operation>) -> AppResult<ObjectId> {
    let bytes = Content { operations }.encode()?;
    Ok(doc.add_object(Stream::new(Dictionary::new(), bytes)))
}

/// Draws `operations` over the existing page content. The existing content is
/// wrapped in `q`/`Q` so its graphics state cannot leak into the new operations.
pub fn append_content(doc: &mut Document, page_id: ObjectId, operations: Vec<Operation>) -> AppResult<()> {
    let open = content_stream(doc, vec![Operation::new("q", vec![])])?;
    let mut tail = vec![Operation::new("Q", vec![])];
    tail.extend(operations);
    let close = content_stream(doc, tail)?;

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    let mut contents = vec![Object::Reference(open)];
    match page.remove(b"Contents") {
        Some(Object::Array(existing)) => contents.extend(existing),
        Some(existing @ Object::Reference(_)) => contents.push(existing),
        _ => {}
    }
    contents.push(Object::Reference(close));
    page.set("Contents", Object::Array(contents));
    Ok(())
}

/// Operations drawing an image XObject into the box `(x, y, width, height)`.
pub fn draw_image_ops(name: &str, x: f32, y: f32, width: f32, height: f32) -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new(
            "cm",
            vec![width.into(), 0.into(), 0.into(), height.into(), x.into(), y.into()],
        ),
        Operation::new("Do", vec![Object::Name(name.as_bytes().to_vec())]),
        Operation::new("Q", vec![]),
    ]
}

/// Operations writing one line of text with a registered font.
pub fn draw_text_ops(font: &str, size: f32, x: f32, y: f32, grey: f32, text: &str) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), size.into()]),
        Operation::new("g", vec![grey.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::String(win_ansi(text), StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

/// Encodes text for a `WinAnsiEncoding` font; characters outside Latin-1 become `?`.
pub fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20AC}' => 0x80,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            c if (c as u32) < 0x100 => c as u32 as u8,
            _ => b'?',
        })
        .collect()
}

/// Builds an empty document with a page tree; returns it with the `Pages` id.
pub fn new_document() -> (Document, ObjectId) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Vec::<Object>::new(),
            "Count" => 0,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    (doc, pages_id)
}

/// Appends an empty page of the given size to the tree rooted at `pages_id`.
pub fn add_page(doc: &mut Document, pages_id: ObjectId, width: f32, height: f32) -> AppResult<ObjectId> {
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
        "Resources" => Dictionary::new(),
    });
    let pages = doc.get_object_mut(pages_id)?.as_dict_mut()?;
    let count = pages.get(b"Count").and_then(Object::as_i64).unwrap_or(0);
    if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
        kids.push(Object::Reference(page_id));
    }
    pages.set("Count", count + 1);
    Ok(page_id)
}


#[cfg(test)]
mod tests {
    use super::fixtures::pdf_with_pages;
    use super::*;
    use image::Rgb;

    #[test]
    fn built_documents_reload_with_their_pages() {
        let bytes = pdf_with_pages(3, None);
        let doc = load(&bytes).unwrap();
        let pages = doc.get_pages();
        assert_eq!(pages.len(), 3);
        let first = *pages.get(&1).unwrap();
        assert_eq!(page_size(&doc, first), (PAGE_WIDTH, PAGE_HEIGHT));
    }

    #[test]
    fn garbage_is_unprocessable() {
        assert!(matches!(load(b"not a pdf"), Err(AppError::Unprocessable(_))));
    }

    #[test]
    fn media_box_is_inherited_from_the_page_tree() {
        let (mut doc, pages_id) = new_document();
        let page_id = add_page(&mut doc, pages_id, 100.0, 100.0).unwrap();
        doc.get_object_mut(page_id).unwrap().as_dict_mut().unwrap().remove(b"MediaBox");
        doc.get_object_mut(pages_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("MediaBox", vec![0.into(), 0.into(), 612.into(), 792.into()]);
        assert_eq!(page_size(&doc, page_id), (612.0, 792.0));
    }

    #[test]
    fn resource_names_do_not_collide() {
        let (mut doc, pages_id) = new_document();
        let page_id = add_page(&mut doc, pages_id, PAGE_WIDTH, PAGE_HEIGHT).unwrap();
        let img = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        let a = embed_rgb_image(&mut doc, &img).unwrap();
        let b = embed_rgb_image(&mut doc, &img).unwrap();
        let first = register_xobject(&mut doc, page_id, a).unwrap();
        let second = register_xobject(&mut doc, page_id, b).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn appended_content_keeps_existing_streams() {
        let bytes = pdf_with_pages(1, Some("Hello"));
        let mut doc = load(&bytes).unwrap();
        let page_id = *doc.get_pages().get(&1).unwrap();
        append_content(&mut doc, page_id, vec![Operation::new("n", vec![])]).unwrap();
        let out = save(&mut doc).unwrap();
        let doc = load(&out).unwrap();
        let text = doc.extract_text(&[1]).unwrap();
        assert!(text.contains("Hello 1"));
    }

    #[test]
    fn win_ansi_maps_typographic_dashes() {
        assert_eq!(win_ansi("A — B"), vec![b'A', b' ', 0x97, b' ', b'B']);
        assert_eq!(win_ansi("é"), vec![0xE9]);
        assert_eq!(win_ansi("漢"), vec![b'?']);
    }
}
