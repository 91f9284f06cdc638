//! Native fillable fields (AcroForm) of uploaded PDFs.
//!
//! Only text fields and checkboxes are exposed. Field names are fully
//! qualified (`parent.child`), and a name is reported once even when several
//! terminal fields share it. Writing tolerates fields that disappeared or are
//! read-only, and asks viewers to regenerate appearances afterwards.

use crate::documents::pdf;
use crate::error::{AppError, AppResult};
use common::model::form_field::{FormField, FormFieldKind, FormFieldValue};
use log::{debug, warn};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use std::collections::HashSet;

const FLAG_READ_ONLY: i64 = 1;
const FLAG_RADIO: i64 = 1 << 15;
const FLAG_PUSHBUTTON: i64 = 1 << 16;
const MAX_FIELD_DEPTH: usize = 32;

/// Free-text lines start 50 pt below the top of page 1, 20 pt apart.
const FREE_TEXT_X: f32 = 50.0;
const FREE_TEXT_TOP: f32 = 50.0;
const FREE_TEXT_STEP: f32 = 20.0;
const FREE_TEXT_SIZE: f32 = 12.0;

#[derive(Debug, Clone)]
struct TerminalField {
    id: ObjectId,
    name: String,
    kind: Option<FormFieldKind>,
    flags: i64,
}

/// Decodes a PDF text string: UTF-16BE with BOM, otherwise single-byte.
fn decode_text(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| b as char).collect()
    }
}

fn encode_text(text: &str) -> Object {
    if text.chars().all(|c| (c as u32) < 0x80) {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

fn acroform(doc: &Document) -> Option<&Dictionary> {
    let root = doc.trailer.get(b"Root").ok()?;
    let catalog = pdf::resolve(doc, root).ok()?.as_dict().ok()?;
    let form = catalog.get(b"AcroForm").ok()?;
    pdf::resolve(doc, form).ok()?.as_dict().ok()
}

fn field_kind(field_type: Option<&[u8]>, flags: i64) -> Option<FormFieldKind> {
    match field_type? {
        b"Tx" => Some(FormFieldKind::Text),
        b"Btn" if flags & (FLAG_RADIO | FLAG_PUSHBUTTON) == 0 => Some(FormFieldKind::Checkbox),
        _ => None,
    }
}

fn kid_ids(dict: &Dictionary) -> Vec<ObjectId> {
    match dict.get(b"Kids") {
        Ok(Object::Array(kids)) => kids.iter().filter_map(|k| k.as_reference().ok()).collect(),
        _ => Vec::new(),
    }
}

fn collect_terminals(doc: &Document) -> Vec<TerminalField> {
    let mut out = Vec::new();
    let Some(form) = acroform(doc) else {
        return out;
    };
    let roots: Vec<ObjectId> = match form.get(b"Fields").ok().and_then(|f| pdf::resolve(doc, f).ok()) {
        Some(Object::Array(fields)) => fields.iter().filter_map(|f| f.as_reference().ok()).collect(),
        _ => Vec::new(),
    };
    let mut seen = HashSet::new();
    for id in roots {
        walk_field(doc, id, "", None, 0, 0, &mut seen, &mut out);
    }
    out
}

#[allow(clippy::too_many_arguments)]
fn walk_field(
    doc: &Document,
    id: ObjectId,
    parent_name: &str,
    inherited_type: Option<Vec<u8>>,
    inherited_flags: i64,
    depth: usize,
    seen: &mut HashSet<ObjectId>,
    out: &mut Vec<TerminalField>,
) {
    if depth > MAX_FIELD_DEPTH || !seen.insert(id) {
        return;
    }
    let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) else {
        return;
    };
    let partial = match dict.get(b"T") {
        Ok(Object::String(bytes, _)) => Some(decode_text(bytes)),
        _ => None,
    };
    let name = match (&partial, parent_name.is_empty()) {
        (Some(p), true) => p.clone(),
        (Some(p), false) => format!("{}.{}", parent_name, p),
        (None, _) => parent_name.to_string(),
    };
    let field_type = match dict.get(b"FT") {
        Ok(Object::Name(ft)) => Some(ft.clone()),
        _ => inherited_type,
    };
    let flags = dict
        .get(b"Ff")
        .ok()
        .and_then(|f| pdf::resolve(doc, f).ok())
        .and_then(|f| f.as_i64().ok())
        .unwrap_or(inherited_flags);

    let kids = kid_ids(dict);
    let field_kids: Vec<ObjectId> = kids
        .iter()
        .copied()
        .filter(|kid| {
            doc.get_object(*kid)
                .and_then(Object::as_dict)
                .map(|d| d.has(b"T"))
                .unwrap_or(false)
        })
        .collect();

    if field_kids.is_empty() {
        if !name.is_empty() {
            out.push(TerminalField {
                id,
                name,
                kind: field_kind(field_type.as_deref(), flags),
                flags,
            });
        }
        return;
    }
    for kid in field_kids {
        walk_field(doc, kid, &name, field_type.clone(), flags, depth + 1, seen, out);
    }
}

fn current_value(doc: &Document, field: &TerminalField, kind: FormFieldKind) -> FormFieldValue {
    let dict = doc.get_object(field.id).and_then(Object::as_dict).ok();
    let value = dict
        .and_then(|d| d.get(b"V").ok())
        .and_then(|v| pdf::resolve(doc, v).ok());
    match kind {
        FormFieldKind::Text => FormFieldValue::Text(match value {
            Some(Object::String(bytes, _)) => decode_text(bytes),
            _ => String::new(),
        }),
        FormFieldKind::Checkbox => FormFieldValue::Checked(match value {
            Some(Object::Name(name)) => name.as_slice() != b"Off",
            _ => false,
        }),
    }
}

/// Text and checkbox fields with their current values, first occurrence of
/// each name only.
pub fn read_fields(bytes: &[u8]) -> AppResult<Vec<FormField>> {
    let doc = pdf::load(bytes)?;
    let mut names = HashSet::new();
    let mut fields = Vec::new();
    for terminal in collect_terminals(&doc) {
        let Some(kind) = terminal.kind else {
            debug!("Skipping unsupported field {}", terminal.name);
            continue;
        };
        if !names.insert(terminal.name.clone()) {
            continue;
        }
        fields.push(FormField {
            value: current_value(&doc, &terminal, kind),
            name: terminal.name,
            kind,
        });
    }
    Ok(fields)
}

/// The widgets drawing a terminal field: its kids, or the field itself.
fn widgets(doc: &Document, field: ObjectId) -> Vec<ObjectId> {
    let kids = doc
        .get_object(field)
        .and_then(Object::as_dict)
        .map(kid_ids)
        .unwrap_or_default();
    if kids.is_empty() {
        vec![field]
    } else {
        kids
    }
}

/// Name of a checkbox's "on" appearance state, `Yes` when none is declared.
fn on_state(doc: &Document, widgets: &[ObjectId]) -> Vec<u8> {
    for widget in widgets {
        let normal = doc
            .get_object(*widget)
            .and_then(Object::as_dict)
            .and_then(|d| d.get(b"AP"))
            .ok()
            .and_then(|ap| pdf::resolve(doc, ap).ok())
            .and_then(|ap| ap.as_dict().ok())
            .and_then(|ap| ap.get(b"N").ok())
            .and_then(|n| pdf::resolve(doc, n).ok())
            .and_then(|n| n.as_dict().ok());
        if let Some(normal) = normal {
            if let Some((name, _)) = normal.iter().find(|(name, _)| name.as_slice() != b"Off") {
                return name.clone();
            }
        }
    }
    b"Yes".to_vec()
}

fn set_entries(doc: &mut Document, id: ObjectId, entries: Vec<(&'static str, Object)>) -> AppResult<()> {
    let dict = doc.get_object_mut(id)?.as_dict_mut()?;
    for (key, value) in entries {
        dict.set(key, value);
    }
    Ok(())
}

fn apply_value(doc: &mut Document, field: &TerminalField, kind: FormFieldKind, value: &FormFieldValue) -> AppResult<()> {
    let widget_ids = widgets(doc, field.id);
    match (kind, value) {
        (FormFieldKind::Text, FormFieldValue::Text(text)) => {
            set_entries(doc, field.id, vec![("V", encode_text(text))])?;
            // Stale appearances would keep showing the old value.
            for widget in widget_ids {
                doc.get_object_mut(widget)?.as_dict_mut()?.remove(b"AP");
            }
        }
        (FormFieldKind::Checkbox, FormFieldValue::Checked(checked)) => {
            let state = if *checked {
                on_state(doc, &widget_ids)
            } else {
                b"Off".to_vec()
            };
            set_entries(doc, field.id, vec![("V", Object::Name(state.clone()))])?;
            for widget in widget_ids {
                set_entries(doc, widget, vec![("AS", Object::Name(state.clone()))])?;
            }
        }
        _ => {
            warn!("Value of field {} does not match its type, skipping", field.name);
        }
    }
    Ok(())
}

fn request_appearance_refresh(doc: &mut Document) -> AppResult<()> {
    let root = doc.trailer.get(b"Root")?.as_reference()?;
    let form_ref = doc.get_object(root)?.as_dict()?.get(b"AcroForm").ok().cloned();
    match form_ref {
        Some(Object::Reference(id)) => {
            doc.get_object_mut(id)?.as_dict_mut()?.set("NeedAppearances", true);
        }
        Some(Object::Dictionary(_)) => {
            if let Ok(Object::Dictionary(form)) = doc.get_object_mut(root)?.as_dict_mut()?.get_mut(b"AcroForm") {
                form.set("NeedAppearances", true);
            }
        }
        _ => {}
    }
    Ok(())
}

fn stamp_free_text(doc: &mut Document, lines: &[String]) -> AppResult<()> {
    let Some(&page_id) = doc.get_pages().get(&1) else {
        return Err(AppError::unprocessable("Document has no pages for free text"));
    };
    let (_, height) = pdf::page_size(doc, page_id);
    let font = pdf::register_standard_font(doc, page_id, "Helvetica")?;
    let mut operations = Vec::new();
    for (index, line) in lines.iter().enumerate() {
        let y = height - FREE_TEXT_TOP - index as f32 * FREE_TEXT_STEP;
        operations.extend(pdf::draw_text_ops(&font, FREE_TEXT_SIZE, FREE_TEXT_X, y, 0.0, line));
    }
    pdf::append_content(doc, page_id, operations)
}

/// Applies `fields` by name, then stamps `free_text` on the first page.
/// Unknown and read-only fields are skipped.
pub fn write_fields(bytes: &[u8], fields: &[FormField], free_text: &[String]) -> AppResult<Vec<u8>> {
    let mut doc = pdf::load(bytes)?;
    let terminals = collect_terminals(&doc);

    for field in fields {
        let targets: Vec<&TerminalField> = terminals.iter().filter(|t| t.name == field.name).collect();
        if targets.is_empty() {
            debug!("Field {} no longer exists, skipping", field.name);
            continue;
        }
        for target in targets {
            if target.flags & FLAG_READ_ONLY != 0 {
                debug!("Field {} is read-only, skipping", field.name);
                continue;
            }
            match target.kind {
                Some(kind) => apply_value(&mut doc, target, kind, &field.value)?,
                None => debug!("Field {} has an unsupported type, skipping", field.name),
            }
        }
    }
    if !terminals.is_empty() {
        request_appearance_refresh(&mut doc)?;
    }

    let lines: Vec<String> = free_text.iter().filter(|l| !l.trim().is_empty()).cloned().collect();
    if !lines.is_empty() {
        stamp_free_text(&mut doc, &lines)?;
    }
    pdf::save(&mut doc)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::documents::pdf::{add_page, new_document, save, PAGE_HEIGHT, PAGE_WIDTH};
    use lopdf::dictionary;

    /// A one-page form with `client.name` (text), `agree` (checkbox),
    /// `locked` (read-only text), `choice` (radio) and a duplicate `agree`.
    pub fn form_pdf() -> Vec<u8> {
        let (mut doc, pages_id) = new_document();
        let page_id = add_page(&mut doc, pages_id, PAGE_WIDTH, PAGE_HEIGHT).unwrap();

        let on_appearance = doc.add_object(lopdf::Stream::new(dictionary! {}, Vec::new()));
        let name_id = doc.add_object(dictionary! {
            "T" => Object::string_literal("name"),
            "FT" => "Tx",
            "V" => Object::string_literal("Emma"),
            "Subtype" => "Widget",
            "P" => page_id,
        });
        let client_id = doc.add_object(dictionary! {
            "T" => Object::string_literal("client"),
            "Kids" => vec![Object::Reference(name_id)],
        });
        set_entries(&mut doc, name_id, vec![("Parent", Object::Reference(client_id))]).unwrap();

        let agree_id = doc.add_object(dictionary! {
            "T" => Object::string_literal("agree"),
            "FT" => "Btn",
            "V" => "Off",
            "AS" => "Off",
            "Subtype" => "Widget",
            "AP" => dictionary! { "N" => dictionary! { "On" => on_appearance, "Off" => on_appearance } },
        });
        let agree_again = doc.add_object(dictionary! {
            "T" => Object::string_literal("agree"),
            "FT" => "Btn",
            "V" => "Yes",
        });
        let locked_id = doc.add_object(dictionary! {
            "T" => Object::string_literal("locked"),
            "FT" => "Tx",
            "Ff" => FLAG_READ_ONLY,
            "V" => Object::string_literal("fixed"),
        });
        let radio_id = doc.add_object(dictionary! {
            "T" => Object::string_literal("choice"),
            "FT" => "Btn",
            "Ff" => FLAG_RADIO,
        });

        let form_id = doc.add_object(dictionary! {
            "Fields" => vec![
                Object::Reference(client_id),
                Object::Reference(agree_id),
                Object::Reference(agree_again),
                Object::Reference(locked_id),
                Object::Reference(radio_id),
            ],
        });
        let root = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        set_entries(&mut doc, root, vec![("AcroForm", Object::Reference(form_id))]).unwrap();
        save(&mut doc).unwrap()
    }
}
