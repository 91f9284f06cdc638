use serde::{Deserialize, Serialize};

/// Opening delimiter of a placeholder in stored markup.
pub const PLACEHOLDER_PREFIX: &str = "{{";
/// Closing delimiter of a placeholder in stored markup.
pub const PLACEHOLDER_SUFFIX: &str = "}}";

/// The closed vocabulary of keys a `{{key}}` placeholder may carry.
///
/// Eight keys are merge fields, substituted with booking/client values when a
/// contract document is generated. The remaining two are signature slots: they
/// merge to a plain signature line, the real signature image is stamped onto
/// the rendered document later by the signing flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKey {
    ClientName,
    ClientEmail,
    ClientPhone,
    WeddingDate,
    Venue,
    PackageType,
    PerformanceFee,
    ProjectTitle,
    SignatureClient,
    SignatureVendor,
}

impl FieldKey {
    pub const MERGE_FIELDS: [FieldKey; 8] = [
        FieldKey::ClientName,
        FieldKey::ClientEmail,
        FieldKey::ClientPhone,
        FieldKey::WeddingDate,
        FieldKey::Venue,
        FieldKey::PackageType,
        FieldKey::PerformanceFee,
        FieldKey::ProjectTitle,
    ];

    pub const SIGNATURE_BLOCKS: [FieldKey; 2] =
        [FieldKey::SignatureClient, FieldKey::SignatureVendor];

    /// The key as written between the placeholder delimiters.
    pub fn key(self) -> &'static str {
        match self {
            FieldKey::ClientName => "client_name",
            FieldKey::ClientEmail => "client_email",
            FieldKey::ClientPhone => "client_phone",
            FieldKey::WeddingDate => "wedding_date",
            FieldKey::Venue => "venue",
            FieldKey::PackageType => "package_type",
            FieldKey::PerformanceFee => "performance_fee",
            FieldKey::ProjectTitle => "project_title",
            FieldKey::SignatureClient => "signature_client",
            FieldKey::SignatureVendor => "signature_vendor",
        }
    }

    /// Human-readable label shown on the field marker in the editor.
    pub fn label(self) -> &'static str {
        match self {
            FieldKey::ClientName => "Client name",
            FieldKey::ClientEmail => "Client email",
            FieldKey::ClientPhone => "Client phone",
            FieldKey::WeddingDate => "Wedding date",
            FieldKey::Venue => "Venue",
            FieldKey::PackageType => "Package type",
            FieldKey::PerformanceFee => "Performance fee",
            FieldKey::ProjectTitle => "Project title",
            FieldKey::SignatureClient => "Client's signature",
            FieldKey::SignatureVendor => "Vendor / Agency signature",
        }
    }

    pub fn is_signature(self) -> bool {
        matches!(self, FieldKey::SignatureClient | FieldKey::SignatureVendor)
    }

    pub fn all() -> impl Iterator<Item = FieldKey> {
        Self::MERGE_FIELDS
            .into_iter()
            .chain(Self::SIGNATURE_BLOCKS)
    }

    /// Looks up a key by its placeholder spelling. Unknown keys yield `None`.
    pub fn from_key(key: &str) -> Option<FieldKey> {
        Self::all().find(|field| field.key() == key)
    }

    /// The `{{key}}` placeholder text for this field.
    pub fn placeholder(self) -> String {
        format!("{}{}{}", PLACEHOLDER_PREFIX, self.key(), PLACEHOLDER_SUFFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_resolves_back_to_itself() {
        for field in FieldKey::all() {
            assert_eq!(FieldKey::from_key(field.key()), Some(field));
        }
        assert_eq!(FieldKey::all().count(), 10);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert_eq!(FieldKey::from_key("client"), None);
        assert_eq!(FieldKey::from_key("CLIENT_NAME"), None);
        assert_eq!(FieldKey::from_key(""), None);
    }

    #[test]
    fn only_signature_slots_are_signatures() {
        let signatures: Vec<_> = FieldKey::all().filter(|f| f.is_signature()).collect();
        assert_eq!(signatures, FieldKey::SIGNATURE_BLOCKS.to_vec());
        assert_eq!(FieldKey::Venue.placeholder(), "{{venue}}");
    }
}
