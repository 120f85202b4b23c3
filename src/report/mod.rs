//! Report assembly: markdown cleanup and PDF layout

mod pdf;
mod sanitize;

pub use pdf::{ReportError, ReportRenderer};
pub use sanitize::{clean_markdown, encode_latin1, sanitize_report_text, FALLBACK_BYTE};
