use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Draft,
    Sent,
    Signed,
}

impl ContractStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::Sent => "sent",
            ContractStatus::Signed => "signed",
        }
    }

    pub fn parse(value: &str) -> Option<ContractStatus> {
        match value {
            "draft" => Some(ContractStatus::Draft),
            "sent" => Some(ContractStatus::Sent),
            "signed" => Some(ContractStatus::Signed),
            _ => None,
        }
    }
}

/// A contract and its position in the signing protocol.
///
/// `sign_token` is only present while the contract is `sent`; `client_signed_at`
/// is set while `sent` and is always set once the contract is `signed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub project_id: String,
    pub client_name: String,
    pub title: String,
    pub value: i64,
    pub wedding_date: String,
    pub venue: Option<String>,
    pub package_type: Option<String>,
    pub template_id: Option<String>,
    pub status: ContractStatus,
    pub sign_token: Option<String>,
    pub client_signed_at: Option<DateTime<Utc>>,
    pub signed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Whose signature the contract is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Awaiting {
    Client,
    Vendor,
    /// Both parties have signed.
    Complete,
}

/// Response of the public signing-link lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInfo {
    #[serde(flatten)]
    pub contract: Contract,
    pub awaiting: Awaiting,
    pub message: String,
}
