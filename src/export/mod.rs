//! Printable exports of a form: a document model built from form data, and
//! PDF / HTML renderers over it.

pub mod document;
pub mod html;
pub mod pdf;

use std::fmt;

pub use self::document::{PrintDocument, build_document, export_filename};
pub use self::pdf::{PdfSettings, render_pdf};

#[derive(Debug)]
pub enum ExportError {
    Render(String),
    Template(askama::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Render(e) => write!(f, "Export render error: {e}"),
            ExportError::Template(e) => write!(f, "Export template error: {e}"),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<askama::Error> for ExportError {
    fn from(e: askama::Error) -> Self {
        ExportError::Template(e)
    }
}
