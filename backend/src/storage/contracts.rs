//! Contract records.
//!
//! The signing transitions are written as guarded single-statement updates:
//! the precondition lives in the `WHERE` clause, so of two racing requests
//! only one can change the row. Callers learn from the returned flag whether
//! their update won.

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use common::model::contract::{Contract, ContractStatus};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

const COLUMNS: &str = "id, project_id, client_name, title, value, wedding_date, venue, \
    package_type, template_id, status, sign_token, client_signed_at, signed_at, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<Contract> {
    let status: String = row.get(9)?;
    let status = ContractStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            Type::Text,
            format!("unknown contract status {:?}", status).into(),
        )
    })?;
    Ok(Contract {
        id: row.get(0)?,
        project_id: row.get(1)?,
        client_name: row.get(2)?,
        title: row.get(3)?,
        value: row.get(4)?,
        wedding_date: row.get(5)?,
        venue: row.get(6)?,
        package_type: row.get(7)?,
        template_id: row.get(8)?,
        status,
        sign_token: row.get(10)?,
        client_signed_at: row.get(11)?,
        signed_at: row.get(12)?,
        created_at: row.get(13)?,
    })
}

pub fn insert(conn: &Connection, contract: &Contract) -> AppResult<()> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO contracts (id, project_id, client_name, title, value, wedding_date,
            venue, package_type, template_id, status, sign_token, issued_token,
            client_signed_at, signed_at, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11, ?12, ?13, ?14)",
        params![
            &contract.id,
            &contract.project_id,
            &contract.client_name,
            &contract.title,
            contract.value,
            &contract.wedding_date,
            &contract.venue,
            &contract.package_type,
            &contract.template_id,
            contract.status.as_str(),
            &contract.sign_token,
            &contract.client_signed_at,
            &contract.signed_at,
            &contract.created_at,
        ],
    )?;
    if inserted == 0 {
        return Err(AppError::Conflict(format!(
            "Contract {} already exists",
            contract.id
        )));
    }
    Ok(())
}

pub fn find(conn: &Connection, id: &str) -> AppResult<Option<Contract>> {
    let contract = conn
        .query_row(
            &format!("SELECT {} FROM contracts WHERE id = ?1", COLUMNS),
            params![id],
            from_row,
        )
        .optional()?;
    Ok(contract)
}

pub fn get(conn: &Connection, id: &str) -> AppResult<Contract> {
    find(conn, id)?.ok_or_else(|| AppError::not_found(format!("Contract {} not found", id)))
}

pub fn list(conn: &Connection) -> AppResult<Vec<Contract>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM contracts ORDER BY created_at DESC, id",
        COLUMNS
    ))?;
    let contracts = stmt
        .query_map([], from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(contracts)
}

pub fn delete(conn: &Connection, id: &str) -> AppResult<bool> {
    let removed = conn.execute("DELETE FROM contracts WHERE id = ?1", params![id])?;
    Ok(removed > 0)
}

/// The most recent token ever issued for the contract. Unlike `sign_token`
/// it survives completion, so a stale link can be recognised as finished.
pub fn issued_token(conn: &Connection, id: &str) -> AppResult<Option<String>> {
    let token = conn
        .query_row(
            "SELECT issued_token FROM contracts WHERE id = ?1",
            params![id],
            |row| row.get::<_, Option<String>>(0),
        )
        .optional()?;
    Ok(token.flatten())
}

/// Moves a draft, or a sent contract the client has not signed yet, to `sent`
/// under a new token. Any earlier token stops matching.
pub fn issue_token(conn: &Connection, id: &str, token: &str) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE contracts SET status = 'sent', sign_token = ?2, issued_token = ?2
         WHERE id = ?1
           AND (status = 'draft' OR (status = 'sent' AND client_signed_at IS NULL))",
        params![id, token],
    )?;
    Ok(changed == 1)
}

/// Records the client's signature if the token matches and nobody signed yet.
pub fn claim_client_signature(
    conn: &Connection,
    id: &str,
    token: &str,
    at: DateTime<Utc>,
) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE contracts SET client_signed_at = ?3
         WHERE id = ?1 AND status = 'sent' AND sign_token = ?2 AND client_signed_at IS NULL",
        params![id, token, at],
    )?;
    Ok(changed == 1)
}

/// Completes the contract if the client has signed and the vendor has not.
pub fn claim_vendor_signature(conn: &Connection, id: &str, at: DateTime<Utc>) -> AppResult<bool> {
    let changed = conn.execute(
        "UPDATE contracts SET status = 'signed', signed_at = ?2, sign_token = NULL
         WHERE id = ?1 AND status = 'sent' AND client_signed_at IS NOT NULL",
        params![id, at],
    )?;
    Ok(changed == 1)
}


#[cfg(test)]
mod tests {
    use super::fixtures::draft;
    use super::*;
    use crate::storage::test_support::temp_database;

    #[test]
    fn duplicate_ids_conflict() {
        let (_dir, db) = temp_database();
        let conn = db.connect().unwrap();
        insert(&conn, &draft("c1")).unwrap();
        assert!(matches!(insert(&conn, &draft("c1")), Err(AppError::Conflict(_))));
    }

    #[test]
    fn client_claim_wins_only_once() {
        let (_dir, db) = temp_database();
        let conn = db.connect().unwrap();
        insert(&conn, &draft("c1")).unwrap();
        assert!(!claim_client_signature(&conn, "c1", "tok", Utc::now()).unwrap());

        assert!(issue_token(&conn, "c1", "tok").unwrap());
        assert!(!claim_client_signature(&conn, "c1", "other", Utc::now()).unwrap());
        assert!(claim_client_signature(&conn, "c1", "tok", Utc::now()).unwrap());
        assert!(!claim_client_signature(&conn, "c1", "tok", Utc::now()).unwrap());
        assert!(!issue_token(&conn, "c1", "fresh").unwrap());
    }

    #[test]
    fn reissue_replaces_the_token() {
        let (_dir, db) = temp_database();
        let conn = db.connect().unwrap();
        insert(&conn, &draft("c1")).unwrap();
        assert!(issue_token(&conn, "c1", "first").unwrap());
        assert!(issue_token(&conn, "c1", "second").unwrap());
        assert!(!claim_client_signature(&conn, "c1", "first", Utc::now()).unwrap());
        assert_eq!(issued_token(&conn, "c1").unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn vendor_claim_requires_client_and_clears_token() {
        let (_dir, db) = temp_database();
        let conn = db.connect().unwrap();
        insert(&conn, &draft("c1")).unwrap();
        issue_token(&conn, "c1", "tok").unwrap();
        assert!(!claim_vendor_signature(&conn, "c1", Utc::now()).unwrap());

        claim_client_signature(&conn, "c1", "tok", Utc::now()).unwrap();
        assert!(claim_vendor_signature(&conn, "c1", Utc::now()).unwrap());
        assert!(!claim_vendor_signature(&conn, "c1", Utc::now()).unwrap());

        let signed = get(&conn, "c1").unwrap();
        assert_eq!(signed.status, ContractStatus::Signed);
        assert_eq!(signed.sign_token, None);
        assert!(signed.client_signed_at.unwrap() <= signed.signed_at.unwrap());
        assert_eq!(issued_token(&conn, "c1").unwrap().as_deref(), Some("tok"));
    }
}
