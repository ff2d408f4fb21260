use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::assembler::Document;

pub mod csv;
pub mod json;
pub mod text;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Text,
    Json,
    Csv,
    /// Flat heart rate / steps / sleep / blood pressure object
    Simple,
}

impl ExportFormat {
    /// Conventional file extension
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Json | ExportFormat::Simple => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "simple" => Ok(ExportFormat::Simple),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Export errors
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] ::csv::Error),
}

/// Write a document in the given format
///
/// The simple format is built from a snapshot, not a document; see
/// [`json::SimpleHealthReport`].
pub fn export_document<W: Write>(
    document: &Document,
    format: ExportFormat,
    writer: W,
) -> Result<(), ExportError> {
    match format {
        ExportFormat::Text => text::write_document(document, writer),
        ExportFormat::Json => json::write_json(document, writer),
        ExportFormat::Csv => csv::write_entries(document, writer),
        ExportFormat::Simple => Err(ExportError::UnsupportedFormat(
            "simple export is built from a snapshot".to_string(),
        )),
    }
}

/// Write a document to a file, creating parent directories
pub fn export_to_file<P: AsRef<Path>>(
    document: &Document,
    format: ExportFormat,
    output_path: P,
) -> Result<(), ExportError> {
    if let Some(parent) = output_path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(output_path)?;
    let mut writer = BufWriter::new(file);
    export_document(document, format, &mut writer)?;
    writer.flush()?;
    Ok(())
}
