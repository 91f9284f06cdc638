use crate::error::{AppError, AppResult};
use common::model::template::{DocumentRef, Template, TemplateKind};
use rusqlite::{params, Connection, OptionalExtension, Row};

const KIND_MARKUP: &str = "editableMarkup";
const KIND_FILE: &str = "uploadedFile";

const COLUMNS: &str = "id, name, kind, markup, file_name, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Template> {
    let kind: String = row.get(2)?;
    let markup: Option<String> = row.get(3)?;
    let file_name: Option<String> = row.get(4)?;
    let kind = match (kind.as_str(), file_name) {
        (KIND_FILE, Some(file_name)) => TemplateKind::UploadedFile {
            file: DocumentRef { file_name },
        },
        _ => TemplateKind::EditableMarkup {
            markup: markup.unwrap_or_default(),
        },
    };
    Ok(Template {
        id: row.get(0)?,
        name: row.get(1)?,
        kind,
        created_at: row.get(5)?,
    })
}

/// Inserts or replaces the whole record.
pub fn save(conn: &Connection, template: &Template) -> AppResult<()> {
    let (kind, markup, file_name) = match &template.kind {
        TemplateKind::EditableMarkup { markup } => (KIND_MARKUP, Some(markup.as_str()), None),
        TemplateKind::UploadedFile { file } => (KIND_FILE, None, Some(file.file_name.as_str())),
    };
    conn.execute(
        "INSERT OR REPLACE INTO templates (id, name, kind, markup, file_name, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            &template.id,
            &template.name,
            kind,
            markup,
            file_name,
            &template.created_at
        ],
    )?;
    Ok(())
}

pub fn find(conn: &Connection, id: &str) -> AppResult<Option<Template>> {
    let template = conn
        .query_row(
            &format!("SELECT {} FROM templates WHERE id = ?1", COLUMNS),
            params![id],
            from_row,
        )
        .optional()?;
    Ok(template)
}

pub fn get(conn: &Connection, id: &str) -> AppResult<Template> {
    find(conn, id)?.ok_or_else(|| AppError::not_found(format!("Template {} not found", id)))
}

pub fn list(conn: &Connection) -> AppResult<Vec<Template>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM templates ORDER BY created_at DESC, id",
        COLUMNS
    ))?;
    let templates = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(templates)
}

/// Removes the record. Returns whether a row existed.
pub fn delete(conn: &Connection, id: &str) -> AppResult<bool> {
    let removed = conn.execute("DELETE FROM templates WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::test_support::temp_database;
    use chrono::Utc;

    fn editable(id: &str) -> Template {
        Template {
            id: id.to_string(),
            name: "Standard agreement".to_string(),
            kind: TemplateKind::EditableMarkup {
                markup: "<p>{{client_name}}</p>".to_string(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn both_kinds_survive_a_round_trip() {
        let (_dir, db) = temp_database();
        let conn = db.connect().unwrap();

        save(&conn, &editable("t1")).unwrap();
        let uploaded = Template {
            id: "t2".to_string(),
            name: "Scanned".to_string(),
            kind: TemplateKind::UploadedFile {
                file: DocumentRef {
                    file_name: "t2.pdf".to_string(),
                },
            },
            created_at: Utc::now(),
        };
        save(&conn, &uploaded).unwrap();

        assert_eq!(get(&conn, "t1").unwrap().markup(), Some("<p>{{client_name}}</p>"));
        assert_eq!(get(&conn, "t2").unwrap().kind, uploaded.kind);
        assert_eq!(list(&conn).unwrap().len(), 2);
    }

    #[test]
    fn save_replaces_in_place() {
        let (_dir, db) = temp_database();
        let conn = db.connect().unwrap();
        let mut template = editable("t1");
        save(&conn, &template).unwrap();
        template.name = "Renamed".to_string();
        save(&conn, &template).unwrap();
        assert_eq!(list(&conn).unwrap().len(), 1);
        assert_eq!(get(&conn, "t1").unwrap().name, "Renamed");
    }

    #[test]
    fn missing_templates_are_not_found() {
        let (_dir, db) = temp_database();
        let conn = db.connect().unwrap();
        assert!(matches!(get(&conn, "nope"), Err(AppError::NotFound(_))));
        assert!(!delete(&conn, "nope").unwrap());
    }
}
