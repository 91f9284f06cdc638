//! The booking and invoicing side of the application, reduced to the two
//! questions the signing subsystem asks of it.

use crate::error::AppResult;
use crate::storage::Database;
use chrono::{Duration, Utc};
use common::model::contract::Contract;
use log::info;
use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

const DEPOSIT: &str = "deposit";
const DEPOSIT_DUE_DAYS: i64 = 14;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContact {
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub trait BookingLedger: Send + Sync {
    /// Contact details of the client booked on a project, empty when unknown.
    fn client_contact(&self, project_id: &str) -> AppResult<ClientContact>;

    /// Creates the project's deposit invoice unless one exists. Returns the id
    /// of the invoice created, if any.
    fn ensure_deposit_invoice(&self, contract: &Contract) -> AppResult<Option<String>>;
}

/// Half the contract value, rounding halves up.
pub fn deposit_amount(value: i64) -> i64 {
    (value as f64 * 0.5 + 0.5).floor() as i64
}

pub struct SqliteLedger {
    db: Database,
}

impl SqliteLedger {
    pub fn new(db: Database) -> Self {
        SqliteLedger { db }
    }
}

impl BookingLedger for SqliteLedger {
    fn client_contact(&self, project_id: &str) -> AppResult<ClientContact> {
        let conn = self.db.connect()?;
        let contact = conn
            .query_row(
                "SELECT c.email, c.phone FROM projects p JOIN clients c ON c.id = p.client_id
                 WHERE p.id = ?1",
                params![project_id],
                |row| {
                    Ok(ClientContact {
                        email: row.get(0)?,
                        phone: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(contact.unwrap_or_default())
    }

    fn ensure_deposit_invoice(&self, contract: &Contract) -> AppResult<Option<String>> {
        let mut conn = self.db.connect()?;
        let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;

        let existing: i64 = tx.query_row(
            "SELECT COUNT(*) FROM invoices WHERE project_id = ?1 AND invoice_type = ?2",
            params![&contract.project_id, DEPOSIT],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(None);
        }

        let email: Option<String> = tx
            .query_row(
                "SELECT c.email FROM projects p JOIN clients c ON c.id = p.client_id
                 WHERE p.id = ?1",
                params![&contract.project_id],
                |row| row.get(0),
            )
            .optional()?
            .flatten();
        let id = Uuid::new_v4().to_string();
        let amount = deposit_amount(contract.value);
        let due_date = (Utc::now() + Duration::days(DEPOSIT_DUE_DAYS))
            .format("%Y-%m-%d")
            .to_string();

        tx.execute(
            "INSERT INTO invoices (id, project_id, client_name, client_email, project_title,
                amount, status, due_date, invoice_type)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'draft', ?7, ?8)",
            params![
                &id,
                &contract.project_id,
                &contract.client_name,
                email,
                format!("{} — Deposit", contract.title),
                amount,
                due_date,
                DEPOSIT
            ],
        )?;
        tx.commit()?;

        info!(
            "Created deposit invoice {} of {} for project {}",
            id, amount, contract.project_id
        );
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::contracts::fixtures::draft;
    use crate::storage::test_support::temp_database;

    #[test]
    fn deposit_is_half_rounded_up() {
        assert_eq!(deposit_amount(2750), 1375);
        assert_eq!(deposit_amount(951), 476);
        assert_eq!(deposit_amount(0), 0);
    }

    #[test]
    fn deposit_invoice_is_created_once_per_project() {
        let (_dir, db) = temp_database();
        let ledger = SqliteLedger::new(db.clone());
        let contract = draft("c1");

        assert!(ledger.ensure_deposit_invoice(&contract).unwrap().is_some());
        assert!(ledger.ensure_deposit_invoice(&contract).unwrap().is_none());

        let conn = db.connect().unwrap();
        let (amount, title): (i64, String) = conn
            .query_row(
                "SELECT amount, project_title FROM invoices WHERE project_id = 'p1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(amount, 1375);
        assert_eq!(title, "Smith Wedding — Deposit");
    }

    #[test]
    fn contact_comes_from_the_projects_client() {
        let (_dir, db) = temp_database();
        let conn = db.connect().unwrap();
        conn.execute_batch(
            "INSERT INTO clients (id, name, email, phone) VALUES ('cl1', 'Emma', 'emma@example.com', '555-0100');
             INSERT INTO projects (id, client_id) VALUES ('p1', 'cl1');",
        )
        .unwrap();
        let ledger = SqliteLedger::new(db);
        let contact = ledger.client_contact("p1").unwrap();
        assert_eq!(contact.email.as_deref(), Some("emma@example.com"));
        assert_eq!(contact.phone.as_deref(), Some("555-0100"));
        assert_eq!(ledger.client_contact("p9").unwrap(), ClientContact::default());
    }
}
