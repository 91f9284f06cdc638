//! Document processing: markup rendering, text extraction, form fields and
//! signature stamping. Everything here works on in-memory bytes; persistence
//! lives in `storage`.

pub mod extract;
pub mod fonts;
pub mod forms;
pub mod layout;
pub mod ocr;
pub mod pdf;
pub mod render;
pub mod signature;
pub mod stamp;
