//! PDF generation - stamping inspection records onto the report template.
//!
//! - `font` - Times-Roman metrics and text encoding
//! - `filler` - [`PdfFormFiller`], the lopdf-based template filler

pub mod filler;
pub mod font;

pub use filler::{output_file_stem, sanitize_file_stem, PdfFormFiller};
pub use font::TimesRoman;

use std::path::PathBuf;

use thiserror::Error;

use crate::record::InspectionRecord;

/// Errors that can occur while producing a single report.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("failed to read PDF template: {0}")]
    TemplateIo(#[source] std::io::Error),
    #[error("failed to process PDF: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("template has {found} page(s), expected at least {expected}")]
    MissingPage { expected: usize, found: usize },
    #[error("failed to serialize PDF: {0}")]
    Serialize(String),
    #[error("failed to create output directory: {0}")]
    OutputDir(#[source] std::io::Error),
    #[error("failed to write generated PDF: {0}")]
    WritePdf(#[source] std::io::Error),
}

/// A filled report that has been written to disk.
#[derive(Debug, Clone)]
pub struct GeneratedDocument {
    /// Position of the source record in the CSV.
    pub index: usize,
    pub filename: String,
    pub path: PathBuf,
    pub pdf: Vec<u8>,
}

/// Produces one document per inspection record.
pub trait Generator {
    fn generate(
        &self,
        record: &InspectionRecord,
        index: usize,
    ) -> Result<GeneratedDocument, GeneratorError>;
}
