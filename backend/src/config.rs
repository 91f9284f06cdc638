//! Runtime configuration, read once from the environment at startup.
//!
//! Every key is optional. A `.env` file next to the binary is loaded first when
//! present, so local setups can keep their overrides out of the shell profile.

use log::warn;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

const ENV_PREFIX: &str = "SIGNDESK_";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Root directory of the document store and the metadata database.
    pub data_dir: PathBuf,
    /// File name of the SQLite database inside `data_dir`.
    pub db_file: String,
    /// Directory holding the TTF families used for rendering and typed signatures.
    pub fonts_dir: PathBuf,
    /// Upper bound for JSON bodies; uploads arrive base64-encoded.
    pub json_limit: usize,
    pub pdftoppm_bin: String,
    pub tesseract_bin: String,
    pub ocr_lang: String,
    /// Upscaling factor applied to a page before OCR (72 dpi × scale).
    pub ocr_scale: u32,
    /// Caption printed under the vendor's stamp, as `"<label> (Vendor)"`.
    pub vendor_label: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            db_file: "signdesk.sqlite".to_string(),
            fonts_dir: PathBuf::from("./fonts"),
            json_limit: 25 * 1024 * 1024,
            pdftoppm_bin: "pdftoppm".to_string(),
            tesseract_bin: "tesseract".to_string(),
            ocr_lang: "eng".to_string(),
            ocr_scale: 2,
            vendor_label: "Vendor".to_string(),
        }
    }
}

impl AppConfig {
    /// Builds the configuration from `SIGNDESK_*` variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AppConfig::default();
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        AppConfig {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", get("PORT"), defaults.port),
            data_dir: get("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            db_file: get("DB_FILE").unwrap_or(defaults.db_file),
            fonts_dir: get("FONTS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.fonts_dir),
            json_limit: parse_or("JSON_LIMIT", get("JSON_LIMIT"), defaults.json_limit),
            pdftoppm_bin: get("PDFTOPPM").unwrap_or(defaults.pdftoppm_bin),
            tesseract_bin: get("TESSERACT").unwrap_or(defaults.tesseract_bin),
            ocr_lang: get("OCR_LANG").unwrap_or(defaults.ocr_lang),
            ocr_scale: parse_or("OCR_SCALE", get("OCR_SCALE"), defaults.ocr_scale).max(1),
            vendor_label: get("VENDOR_LABEL").unwrap_or(defaults.vendor_label),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    pub fn templates_dir(&self) -> PathBuf {
        self.data_dir.join("templates")
    }

    pub fn contracts_dir(&self) -> PathBuf {
        self.data_dir.join("contracts")
    }

    pub fn bind_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

fn parse_or<T: FromStr + Copy>(name: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(value) => value.trim().parse().unwrap_or_else(|_| {
            warn!(
                "Ignoring invalid {}{}={:?}, using the default",
                ENV_PREFIX, name, value
            );
            default
        }),
        None => default,
    }
}
