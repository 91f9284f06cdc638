use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Handle to bytes held by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRef {
    pub file_name: String,
}

/// The two kinds of template. Exactly one carries content: editable markup or
/// an uploaded binary document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TemplateKind {
    #[serde(rename_all = "camelCase")]
    EditableMarkup { markup: String },
    #[serde(rename_all = "camelCase")]
    UploadedFile { file: DocumentRef },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: TemplateKind,
    pub created_at: DateTime<Utc>,
}

impl Template {
    pub fn markup(&self) -> Option<&str> {
        match &self.kind {
            TemplateKind::EditableMarkup { markup } => Some(markup),
            TemplateKind::UploadedFile { .. } => None,
        }
    }

    pub fn file(&self) -> Option<&DocumentRef> {
        match &self.kind {
            TemplateKind::EditableMarkup { .. } => None,
            TemplateKind::UploadedFile { file } => Some(file),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_flattened_into_the_record() {
        let template = Template {
            id: "t1".to_string(),
            name: "Standard".to_string(),
            kind: TemplateKind::UploadedFile {
                file: DocumentRef {
                    file_name: "t1.pdf".to_string(),
                },
            },
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&template).unwrap();
        assert_eq!(json["kind"], "uploadedFile");
        assert_eq!(json["file"]["fileName"], "t1.pdf");
        let back: Template = serde_json::from_value(json).unwrap();
        assert_eq!(back.file().map(|f| f.file_name.as_str()), Some("t1.pdf"));
        assert_eq!(back.markup(), None);
    }
}
