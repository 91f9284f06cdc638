//! Optical character recognition of single PDF pages.
//!
//! The shipped engine drives the poppler `pdftoppm` rasterizer and the
//! `tesseract` CLI. Missing binaries are not an error: the engine then
//! recognizes nothing, and extraction degrades to its placeholder result.

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use log::{debug, warn};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use tempfile::TempDir;

pub trait OcrEngine: Send + Sync {
    /// Recognized text of page `page_number` (1-based) of the PDF at `pdf`.
    fn recognize_page(&self, pdf: &Path, page_number: u32) -> AppResult<String>;
}

pub struct CommandOcr {
    pdftoppm: String,
    tesseract: String,
    lang: String,
    scale: u32,
    available: OnceLock<bool>,
}

impl CommandOcr {
    pub fn new(config: &AppConfig) -> Self {
        CommandOcr {
            pdftoppm: config.pdftoppm_bin.clone(),
            tesseract: config.tesseract_bin.clone(),
            lang: config.ocr_lang.clone(),
            scale: config.ocr_scale.max(1),
            available: OnceLock::new(),
        }
    }

    /// Page raster resolution: PDF user space is 72 units per inch.
    pub fn dpi(&self) -> u32 {
        72 * self.scale
    }

    fn available(&self) -> bool {
        *self.available.get_or_init(|| {
            let ok = command_available(&self.pdftoppm, "-v")
                && command_available(&self.tesseract, "--version");
            if !ok {
                warn!(
                    "OCR unavailable: {} and {} must both be installed",
                    self.pdftoppm, self.tesseract
                );
            }
            ok
        })
    }

    fn rasterize(&self, pdf: &Path, page_number: u32, workdir: &Path) -> AppResult<std::path::PathBuf> {
        let prefix = workdir.join(format!("page-{}", page_number));
        let page = page_number.to_string();
        let output = Command::new(&self.pdftoppm)
            .args(["-f", &page, "-l", &page, "-r", &self.dpi().to_string(), "-png", "-singlefile"])
            .arg(pdf)
            .arg(&prefix)
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(AppError::Internal(format!(
                "pdftoppm failed on page {}: {}",
                page_number,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(prefix.with_extension("png"))
    }
}

impl OcrEngine for CommandOcr {
    fn recognize_page(&self, pdf: &Path, page_number: u32) -> AppResult<String> {
        if !self.available() {
            return Ok(String::new());
        }
        let workdir = TempDir::new()?;
        let image = self.rasterize(pdf, page_number, workdir.path())?;

        let output = Command::new(&self.tesseract)
            .arg(&image)
            .arg("stdout")
            .args(["-l", &self.lang])
            .stdin(Stdio::null())
            .output()?;
        if !output.status.success() {
            return Err(AppError::Internal(format!(
                "tesseract failed on page {}: {}",
                page_number,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        let text = String::from_utf8_lossy(&output.stdout).into_owned();
        debug!("OCR page {}: {} chars", page_number, text.len());
        Ok(text)
    }
}

fn command_available(bin: &str, probe: &str) -> bool {
    Command::new(bin)
        .arg(probe)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_follows_the_scale() {
        let mut config = AppConfig::default();
        config.ocr_scale = 3;
        assert_eq!(CommandOcr::new(&config).dpi(), 216);
    }

    #[test]
    fn missing_binaries_recognize_nothing() {
        let mut config = AppConfig::default();
        config.pdftoppm_bin = "signdesk-no-such-rasterizer".to_string();
        config.tesseract_bin = "signdesk-no-such-ocr".to_string();
        let engine = CommandOcr::new(&config);
        let text = engine.recognize_page(Path::new("missing.pdf"), 1).unwrap();
        assert!(text.is_empty());
    }
}
