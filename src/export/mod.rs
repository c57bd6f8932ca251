//! Export of translated text
//!
//! ```rust,ignore
//! use lexis_server::export::render_text_pdf;
//!
//! let bytes = render_text_pdf("Xin chào\nthế giới")?;
//! ```

mod pdf;

pub use pdf::{render_text_pdf, ExportError, LINES_PER_PAGE};
