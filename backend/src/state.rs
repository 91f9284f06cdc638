//! Shared application state handed to every handler as `web::Data<AppState>`.

use crate::config::AppConfig;
use crate::documents::fonts::FontBook;
use crate::documents::ocr::{CommandOcr, OcrEngine};
use crate::error::AppResult;
use crate::storage::documents::DocumentStore;
use crate::storage::ledger::{BookingLedger, SqliteLedger};
use crate::storage::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
    pub store: DocumentStore,
    pub fonts: Arc<FontBook>,
    pub ocr: Arc<dyn OcrEngine>,
    pub ledger: Arc<dyn BookingLedger>,
}

impl AppState {
    /// State with the shipped engines: fonts from the configured directory,
    /// command-line OCR and the SQLite booking ledger.
    pub fn new(config: AppConfig) -> Self {
        let fonts = FontBook::load(&config.fonts_dir);
        let ocr = Arc::new(CommandOcr::new(&config));
        let ledger = Arc::new(SqliteLedger::new(Database::new(config.db_path())));
        Self::with_engines(config, fonts, ocr, ledger)
    }

    pub fn with_engines(
        config: AppConfig,
        fonts: FontBook,
        ocr: Arc<dyn OcrEngine>,
        ledger: Arc<dyn BookingLedger>,
    ) -> Self {
        AppState {
            db: Database::new(config.db_path()),
            store: DocumentStore::new(config.templates_dir(), config.contracts_dir()),
            config: Arc::new(config),
            fonts: Arc::new(fonts),
            ocr,
            ledger,
        }
    }

    /// Creates the storage directories and the schema. Idempotent.
    pub fn init(&self) -> AppResult<()> {
        self.store.ensure_dirs()?;
        self.db.init_schema()
    }
}
