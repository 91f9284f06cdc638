//! The contract signing protocol: `draft → sent → (client signed) → signed`.
//!
//! A signing transition claims its precondition with a guarded update inside
//! an immediate transaction, stamps the current document, writes it and only
//! then commits. A rejected or losing request leaves both the record and the
//! stored document as they were.

use crate::documents::signature;
use crate::documents::stamp::{self, Signer};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::contracts;
use crate::storage::documents::DocumentKind;
use crate::storage::templates;
use chrono::{DateTime, Utc};
use common::model::contract::{Awaiting, Contract, ContractStatus, SignInfo};
use common::requests::SignatureInput;
use image::RgbImage;
use log::{debug, error, info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use rusqlite::{Connection, Transaction, TransactionBehavior};

const TOKEN_LENGTH: usize = 32;

pub const PROMPT_CLIENT: &str = "Please sign below.";
pub const PROMPT_VENDOR: &str = "Client has signed. Awaiting vendor signature.";
pub const COMPLETED: &str = "This contract has been signed by both parties.";

/// A fresh opaque signing-link token.
pub fn new_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// The backing file of the contract's template, when it is an uploaded one.
fn template_document(state: &AppState, conn: &Connection, contract: &Contract) -> AppResult<Option<Vec<u8>>> {
    let Some(template_id) = contract.template_id.as_deref() else {
        return Ok(None);
    };
    match templates::find(conn, template_id)? {
        Some(template) if template.file().is_some() => {
            state.store.read(DocumentKind::Template, &template.id)
        }
        _ => Ok(None),
    }
}

/// The document the next signature is stamped onto: the contract's own file,
/// else its uploaded template's file.
pub fn current_document(state: &AppState, conn: &Connection, contract: &Contract) -> AppResult<Vec<u8>> {
    if let Some(bytes) = state.store.read(DocumentKind::Contract, &contract.id)? {
        return Ok(bytes);
    }
    template_document(state, conn, contract)?
        .ok_or_else(|| AppError::not_found(format!("Contract {} has no document", contract.id)))
}

/// Stores `bytes` as the contract's document while no signature is recorded.
/// Runs under the same immediate transaction as the signing transitions, so a
/// signature either lands on the new document or makes this call a Conflict.
pub fn replace_unsigned_document(state: &AppState, id: &str, bytes: &[u8]) -> AppResult<()> {
    let mut conn = state.db.connect()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let contract = contracts::get(&tx, id)?;
    if contract.client_signed_at.is_some() {
        warn!("Refused to replace the signed document of contract {}", id);
        return Err(AppError::Conflict(format!(
            "Contract {} has been signed; its document can no longer be replaced",
            id
        )));
    }
    state.store.write(DocumentKind::Contract, id, bytes)?;
    tx.commit()?;
    Ok(())
}

/// Moves the contract to `sent` under a new token and returns the token.
/// Re-sending before the client signs replaces the previous token.
pub fn send(state: &AppState, id: &str) -> AppResult<String> {
    let conn = state.db.connect()?;
    let contract = contracts::get(&conn, id)?;
    let token = new_token();
    if !contracts::issue_token(&conn, id, &token)? {
        warn!(
            "Refused to send contract {} in status {}",
            id,
            contract.status.as_str()
        );
        return Err(match contract.status {
            ContractStatus::Signed => {
                AppError::AlreadySigned(format!("Contract {} is already signed", id))
            }
            _ => AppError::Conflict(format!("The client has already signed contract {}", id)),
        });
    }
    info!("Contract {} sent for signing", id);
    Ok(token)
}

/// What the holder of a signing link sees.
pub fn sign_info(state: &AppState, id: &str, token: Option<&str>) -> AppResult<SignInfo> {
    let conn = state.db.connect()?;
    let contract = contracts::get(&conn, id)?;
    let token = token.filter(|t| !t.is_empty());

    let matches_live = token.is_some() && contract.sign_token.as_deref() == token;
    if contract.status == ContractStatus::Sent && matches_live {
        let (awaiting, message) = if contract.client_signed_at.is_some() {
            (Awaiting::Vendor, PROMPT_VENDOR)
        } else {
            (Awaiting::Client, PROMPT_CLIENT)
        };
        return Ok(SignInfo {
            contract,
            awaiting,
            message: message.to_string(),
        });
    }
    if contract.status == ContractStatus::Signed
        && token.is_some()
        && contracts::issued_token(&conn, id)?.as_deref() == token
    {
        return Ok(SignInfo {
            contract,
            awaiting: Awaiting::Complete,
            message: COMPLETED.to_string(),
        });
    }
    warn!("Rejected signing link for contract {}", id);
    Err(AppError::invalid_link())
}

/// Why a client signature claim did not apply.
fn reject_client(conn: &Connection, contract: &Contract, token: &str) -> AppResult<AppError> {
    let repeated = match contract.status {
        ContractStatus::Sent => {
            contract.client_signed_at.is_some() && contract.sign_token.as_deref() == Some(token)
        }
        ContractStatus::Signed => {
            contracts::issued_token(conn, &contract.id)?.as_deref() == Some(token)
        }
        ContractStatus::Draft => false,
    };
    if repeated {
        warn!("Rejected repeated client signature on contract {}", contract.id);
        Ok(AppError::AlreadySigned(
            "This contract has already been signed".to_string(),
        ))
    } else {
        warn!(
            "Rejected client signature on contract {}: invalid or expired link",
            contract.id
        );
        Ok(AppError::invalid_link())
    }
}

/// Stamps the current document, writes it and commits `tx`. The stored
/// document is put back if the commit fails.
fn commit_stamped(
    state: &AppState,
    tx: Transaction<'_>,
    contract: &Contract,
    image: &RgbImage,
    signer: Signer,
    caption: &str,
) -> AppResult<()> {
    let own = state.store.read(DocumentKind::Contract, &contract.id)?;
    let source = match &own {
        Some(bytes) => bytes.clone(),
        None => template_document(state, &tx, contract)?.ok_or_else(|| {
            AppError::not_found(format!("Contract {} has no document", contract.id))
        })?,
    };
    let stamped = stamp::stamp(&source, image, signer, caption)?;
    state.store.write(DocumentKind::Contract, &contract.id, &stamped)?;

    if let Err(e) = tx.commit() {
        let restored = match own {
            Some(bytes) => state.store.write(DocumentKind::Contract, &contract.id, &bytes),
            None => state.store.delete(DocumentKind::Contract, &contract.id).map(|_| ()),
        };
        if let Err(restore_err) = restored {
            error!(
                "Could not restore the document of contract {}: {}",
                contract.id, restore_err
            );
        }
        return Err(e.into());
    }
    Ok(())
}

/// Applies the client's signature, authorized by the link token.
pub fn sign_client(
    state: &AppState,
    id: &str,
    token: &str,
    input: &SignatureInput,
) -> AppResult<DateTime<Utc>> {
    let image = signature::capture(input, &state.fonts)?;
    let mut conn = state.db.connect()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let contract = contracts::get(&tx, id)?;

    let at = Utc::now();
    if token.is_empty() || !contracts::claim_client_signature(&tx, id, token, at)? {
        return Err(reject_client(&tx, &contract, token)?);
    }
    let caption = Signer::Client.caption(&contract.client_name);
    commit_stamped(state, tx, &contract, &image, Signer::Client, &caption)?;
    info!("Client signed contract {}", id);
    Ok(at)
}

/// Applies the vendor's countersignature and completes the contract.
pub fn sign_vendor(state: &AppState, id: &str, input: &SignatureInput) -> AppResult<DateTime<Utc>> {
    let image = signature::capture(input, &state.fonts)?;
    let mut conn = state.db.connect()?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let contract = contracts::get(&tx, id)?;

    let at = Utc::now();
    if !contracts::claim_vendor_signature(&tx, id, at)? {
        warn!(
            "Rejected vendor signature on contract {} in status {}",
            id,
            contract.status.as_str()
        );
        return Err(match contract.status {
            ContractStatus::Signed => {
                AppError::AlreadySigned("This contract has already been signed".to_string())
            }
            ContractStatus::Draft => {
                AppError::Unauthorized("Contract has not been sent for signing".to_string())
            }
            ContractStatus::Sent => AppError::Unauthorized("Client must sign first".to_string()),
        });
    }
    let caption = Signer::Vendor.caption(&state.config.vendor_label);
    commit_stamped(state, tx, &contract, &image, Signer::Vendor, &caption)?;
    info!("Vendor countersigned contract {}", id);

    match state.ledger.ensure_deposit_invoice(&contract) {
        Ok(Some(invoice)) => debug!("Deposit invoice {} raised for contract {}", invoice, id),
        Ok(None) => debug!("Project {} already has a deposit invoice", contract.project_id),
        Err(e) => error!("Deposit invoice for contract {} failed: {}", id, e),
    }
    Ok(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::pdf::fixtures::pdf_with_pages;
    use crate::documents::stamp::inspect::images_on_page;
    use crate::state::test_support::temp_state;
    use crate::storage::contracts::fixtures::draft;
    use common::model::template::{DocumentRef, Template, TemplateKind};
    use std::sync::Arc;
    use std::thread;

    fn typed(name: &str) -> SignatureInput {
        SignatureInput::Typed {
            name: name.to_string(),
        }
    }

    fn contract_with_document(state: &AppState, id: &str, pages: usize) {
        let conn = state.db.connect().unwrap();
        contracts::insert(&conn, &draft(id)).unwrap();
        state
            .store
            .write(DocumentKind::Contract, id, &pdf_with_pages(pages, Some("clause")))
            .unwrap();
    }

    fn stored(state: &AppState, id: &str) -> Vec<u8> {
        state.store.read(DocumentKind::Contract, id).unwrap().unwrap()
    }

    fn record(state: &AppState, id: &str) -> Contract {
        contracts::get(&state.db.connect().unwrap(), id).unwrap()
    }

    #[test]
    fn tokens_are_opaque_and_distinct() {
        let a = new_token();
        assert_eq!(a.len(), TOKEN_LENGTH);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, new_token());
    }

    #[test]
    fn client_then_vendor_completes_the_contract() {
        let (_dir, state) = temp_state();
        contract_with_document(&state, "c1", 2);
        let token = send(&state, "c1").unwrap();

        let info = sign_info(&state, "c1", Some(&token)).unwrap();
        assert_eq!(info.awaiting, Awaiting::Client);
        assert_eq!(info.message, PROMPT_CLIENT);

        let client_at = sign_client(&state, "c1", &token, &typed("Emma")).unwrap();
        let info = sign_info(&state, "c1", Some(&token)).unwrap();
        assert_eq!(info.awaiting, Awaiting::Vendor);
        assert_eq!(info.message, PROMPT_VENDOR);
        assert_eq!(images_on_page(&stored(&state, "c1"), 2), 1);

        let vendor_at = sign_vendor(&state, "c1", &typed("Aurora")).unwrap();
        let contract = record(&state, "c1");
        assert_eq!(contract.status, ContractStatus::Signed);
        assert_eq!(contract.client_signed_at, Some(client_at));
        assert_eq!(contract.signed_at, Some(vendor_at));
        assert!(client_at <= vendor_at);
        assert_eq!(contract.sign_token, None);

        let bytes = stored(&state, "c1");
        assert_eq!(images_on_page(&bytes, 1), 0);
        assert_eq!(images_on_page(&bytes, 2), 2);
        let text = crate::documents::pdf::load(&bytes).unwrap().extract_text(&[2]).unwrap();
        assert!(text.contains("Emma & James (Client)"));
        assert!(text.contains("Aurora Strings (Vendor)"));
    }

    #[test]
    fn vendor_signing_raises_one_deposit_invoice() {
        let (_dir, state) = temp_state();
        contract_with_document(&state, "c1", 1);
        let token = send(&state, "c1").unwrap();
        sign_client(&state, "c1", &token, &typed("Emma")).unwrap();
        sign_vendor(&state, "c1", &typed("Aurora")).unwrap();

        let conn = state.db.connect().unwrap();
        let (count, amount): (i64, i64) = conn
            .query_row(
                "SELECT COUNT(*), MAX(amount) FROM invoices WHERE project_id = 'p1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!((count, amount), (1, 1375));
    }

    #[test]
    fn resending_invalidates_the_previous_token() {
        let (_dir, state) = temp_state();
        contract_with_document(&state, "c1", 1);
        let first = send(&state, "c1").unwrap();
        let second = send(&state, "c1").unwrap();
        assert_ne!(first, second);

        assert!(matches!(
            sign_info(&state, "c1", Some(&first)),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            sign_client(&state, "c1", &first, &typed("Emma")),
            Err(AppError::Unauthorized(_))
        ));
        sign_client(&state, "c1", &second, &typed("Emma")).unwrap();
    }

    #[test]
    fn the_client_signs_only_once() {
        let (_dir, state) = temp_state();
        contract_with_document(&state, "c1", 1);
        let token = send(&state, "c1").unwrap();
        sign_client(&state, "c1", &token, &typed("Emma")).unwrap();

        assert!(matches!(
            sign_client(&state, "c1", &token, &typed("Emma")),
            Err(AppError::AlreadySigned(_))
        ));
        assert_eq!(images_on_page(&stored(&state, "c1"), 1), 1);
        assert!(matches!(send(&state, "c1"), Err(AppError::Conflict(_))));
    }

    #[test]
    fn racing_client_signatures_stamp_once() {
        let (_dir, state) = temp_state();
        contract_with_document(&state, "c1", 1);
        let token = Arc::new(send(&state, "c1").unwrap());
        let state = Arc::new(state);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let state = Arc::clone(&state);
                let token = Arc::clone(&token);
                thread::spawn(move || sign_client(&state, "c1", &token, &typed("Emma")))
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, AppError::AlreadySigned(_))));
        assert_eq!(images_on_page(&stored(&state, "c1"), 1), 1);
    }

    #[test]
    fn a_stale_link_reports_completion() {
        let (_dir, state) = temp_state();
        contract_with_document(&state, "c1", 1);
        let token = send(&state, "c1").unwrap();
        sign_client(&state, "c1", &token, &typed("Emma")).unwrap();
        sign_vendor(&state, "c1", &typed("Aurora")).unwrap();

        let info = sign_info(&state, "c1", Some(&token)).unwrap();
        assert_eq!(info.awaiting, Awaiting::Complete);
        assert_eq!(info.message, COMPLETED);
        assert!(matches!(
            sign_client(&state, "c1", &token, &typed("Emma")),
            Err(AppError::AlreadySigned(_))
        ));
        assert!(matches!(
            sign_info(&state, "c1", Some("someone-else")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            sign_vendor(&state, "c1", &typed("Aurora")),
            Err(AppError::AlreadySigned(_))
        ));
        assert!(matches!(send(&state, "c1"), Err(AppError::AlreadySigned(_))));
    }

    #[test]
    fn the_vendor_waits_for_the_client() {
        let (_dir, state) = temp_state();
        contract_with_document(&state, "c1", 1);
        let before = stored(&state, "c1");

        assert!(matches!(
            sign_vendor(&state, "c1", &typed("Aurora")),
            Err(AppError::Unauthorized(_))
        ));
        send(&state, "c1").unwrap();
        assert!(matches!(
            sign_vendor(&state, "c1", &typed("Aurora")),
            Err(AppError::Unauthorized(_))
        ));
        assert_eq!(stored(&state, "c1"), before);
        assert_eq!(record(&state, "c1").signed_at, None);
    }

    #[test]
    fn drafts_and_missing_tokens_are_unauthorized() {
        let (_dir, state) = temp_state();
        contract_with_document(&state, "c1", 1);
        assert!(matches!(
            sign_info(&state, "c1", None),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            sign_client(&state, "c1", "", &typed("Emma")),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            sign_info(&state, "missing", Some("x")),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn empty_signatures_change_nothing() {
        let (_dir, state) = temp_state();
        contract_with_document(&state, "c1", 1);
        let token = send(&state, "c1").unwrap();
        let before = stored(&state, "c1");

        let blank = SignatureInput::Strokes { strokes: vec![] };
        assert!(matches!(
            sign_client(&state, "c1", &token, &blank),
            Err(AppError::Unprocessable(_))
        ));
        assert_eq!(stored(&state, "c1"), before);
        assert_eq!(record(&state, "c1").client_signed_at, None);
        sign_client(&state, "c1", &token, &typed("Emma")).unwrap();
    }

    #[test]
    fn a_missing_document_rolls_the_claim_back() {
        let (_dir, state) = temp_state();
        let conn = state.db.connect().unwrap();
        contracts::insert(&conn, &draft("c1")).unwrap();
        let token = send(&state, "c1").unwrap();

        assert!(matches!(
            sign_client(&state, "c1", &token, &typed("Emma")),
            Err(AppError::NotFound(_))
        ));
        assert_eq!(record(&state, "c1").client_signed_at, None);
    }

    #[test]
    fn uploaded_templates_back_unsigned_contracts() {
        let (_dir, state) = temp_state();
        let conn = state.db.connect().unwrap();
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
        templates::save(&conn, &template).unwrap();
        let original = pdf_with_pages(1, Some("template"));
        state.store.write(DocumentKind::Template, "t1", &original).unwrap();
        let mut contract = draft("c1");
        contract.template_id = Some("t1".to_string());
        contracts::insert(&conn, &contract).unwrap();

        assert_eq!(current_document(&state, &conn, &contract).unwrap(), original);
        let token = send(&state, "c1").unwrap();
        sign_client(&state, "c1", &token, &typed("Emma")).unwrap();

        assert_eq!(images_on_page(&stored(&state, "c1"), 1), 1);
        assert_eq!(
            state.store.read(DocumentKind::Template, "t1").unwrap().unwrap(),
            original
        );
    }
}
