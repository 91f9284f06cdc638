use crate::model::markup::{escape_text, to_editable};
use crate::model::place_holder::FieldKey;
use serde::{Deserialize, Serialize};

/// What a signature slot merges to. The signature image itself is stamped onto
/// the rendered document by the signing flow.
pub const SIGNATURE_LINE: &str = "Signature: _________________________";

/// Booking and client values available to a merge.
///
/// `client_name` and `title` are always present; every other field is optional
/// and merges to an empty string when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeData {
    pub client_name: String,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client_phone: Option<String>,
    pub wedding_date: String,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub package_type: Option<String>,
    pub value: i64,
    pub title: String,
}

impl MergeData {
    /// The unescaped text a field merges to.
    pub fn value_for(&self, key: FieldKey) -> String {
        match key {
            FieldKey::ClientName => self.client_name.clone(),
            FieldKey::ClientEmail => self.client_email.clone().unwrap_or_default(),
            FieldKey::ClientPhone => self.client_phone.clone().unwrap_or_default(),
            FieldKey::WeddingDate => self.wedding_date.clone(),
            FieldKey::Venue => self.venue.clone().unwrap_or_default(),
            FieldKey::PackageType => self.package_type.clone().unwrap_or_default(),
            FieldKey::PerformanceFee => format_fee(self.value),
            FieldKey::ProjectTitle => self.title.clone(),
            FieldKey::SignatureClient | FieldKey::SignatureVendor => SIGNATURE_LINE.to_string(),
        }
    }
}

/// Substitutes every known `{{key}}` placeholder in `markup` with its value.
///
/// Values are escaped before insertion, so the merged markup reads back as the
/// literal value. Unknown placeholders are left untouched. Never fails.
pub fn merge(markup: &str, data: &MergeData) -> String {
    to_editable(markup)
        .map_fields(|marker| escape_text(&data.value_for(marker.key)))
        .to_markup()
}

/// Formats a whole-dollar fee with thousands separators, e.g. `$2,750`.
pub fn format_fee(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if value < 0 {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::markup::{DEFAULT_CONTENT, StructuredDocument};

    fn minimal() -> MergeData {
        MergeData {
            client_name: "A & B".to_string(),
            wedding_date: "2025-06-14".to_string(),
            value: 2750,
            title: "Smith Wedding".to_string(),
            ..MergeData::default()
        }
    }

    #[test]
    fn merges_names_and_dates_as_literal_text() {
        let merged = merge("{{client_name}} — {{wedding_date}}", &minimal());
        assert_eq!(merged, "A &amp; B — 2025-06-14");
        assert_eq!(
            StructuredDocument::parse(&merged).plain_text(),
            "A & B — 2025-06-14"
        );
    }

    #[test]
    fn missing_optional_fields_merge_to_empty_strings() {
        let merged = merge(
            "<p>[{{venue}}][{{client_email}}][{{client_phone}}][{{package_type}}]</p>",
            &minimal(),
        );
        assert_eq!(merged, "<p>[][][][]</p>");
    }

    #[test]
    fn default_content_merges_completely() {
        let mut data = minimal();
        data.venue = Some("Old Mill".to_string());
        let merged = merge(DEFAULT_CONTENT, &data);
        assert!(!merged.contains("{{"));
        let text = StructuredDocument::parse(&merged).plain_text();
        assert!(text.contains("Full Legal Name: A & B"));
        assert!(text.contains("Venue: Old Mill"));
        assert!(text.contains("Performance Fee: $2,750"));
        assert!(text.contains("Smith Wedding"));
        assert_eq!(text.matches(SIGNATURE_LINE).count(), 2);
    }

    #[test]
    fn unknown_placeholders_are_not_substituted() {
        assert_eq!(merge("{{shoe_size}}", &minimal()), "{{shoe_size}}");
    }

    #[test]
    fn values_cannot_inject_markup() {
        let mut data = minimal();
        data.venue = Some("<b>Hall</b>".to_string());
        assert_eq!(merge("{{venue}}", &data), "&lt;b&gt;Hall&lt;/b&gt;");
    }

    #[test]
    fn fees_are_grouped_by_thousands() {
        assert_eq!(format_fee(0), "$0");
        assert_eq!(format_fee(950), "$950");
        assert_eq!(format_fee(2750), "$2,750");
        assert_eq!(format_fee(1234567), "$1,234,567");
        assert_eq!(format_fee(-4950), "-$4,950");
    }
}
