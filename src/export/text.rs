use std::io::Write;

use super::ExportError;
use crate::assembler::{Document, ReportHeader};
use crate::layout::{Page, PageItem};
use crate::models::MetricEntry;

/// Write a document as plain text, page by page
pub fn write_document<W: Write>(document: &Document, mut writer: W) -> Result<(), ExportError> {
    write_header(&document.header, &mut writer)?;

    for page in document.all_pages() {
        write_page(page, &mut writer)?;
    }

    writer.flush()?;
    Ok(())
}

/// Render a document into a string
pub fn render(document: &Document) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_document(document, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| ExportError::SerializationError(e.to_string()))
}

fn write_header<W: Write>(header: &ReportHeader, writer: &mut W) -> Result<(), ExportError> {
    writeln!(writer, "{}", "=".repeat(60))?;
    writeln!(writer, "{}", header.title)?;
    writeln!(writer, "{}", "=".repeat(60))?;

    if let Some(date) = header.generated_on {
        writeln!(writer, "Date: {}", date.format("%d/%m/%Y"))?;
    }
    match header.age {
        Some(age) => writeln!(writer, "Âge: {} ans", age)?,
        None => writeln!(writer, "Âge: Non spécifié")?,
    }
    writeln!(writer, "Sexe: {}", header.sex.label())?;
    if let Some(height) = header.height_m {
        writeln!(writer, "Taille: {} m", height.round_dp(2))?;
    }
    if let Some(mass) = header.body_mass_kg {
        writeln!(writer, "Poids: {} kg", mass.round_dp(1))?;
    }
    writeln!(writer)?;
    Ok(())
}

fn write_page<W: Write>(page: &Page, writer: &mut W) -> Result<(), ExportError> {
    writeln!(writer, "=== Page {} ===", page.index + 1)?;
    writeln!(writer)?;

    for item in &page.items {
        match item {
            PageItem::Heading { title, .. } => {
                writeln!(writer, "{}", title)?;
                writeln!(writer, "{}", "-".repeat(40))?;
            }
            PageItem::Entry { entry, .. } => write_entry(entry, writer)?,
            PageItem::Narrative { title, body, .. } => {
                writeln!(writer, "{}", title)?;
                writeln!(writer, "{}", "-".repeat(40))?;
                writeln!(writer, "{}", body)?;
                writeln!(writer)?;
            }
        }
    }
    Ok(())
}

fn write_entry<W: Write>(entry: &MetricEntry, writer: &mut W) -> Result<(), ExportError> {
    let definition = &entry.definition;
    let value = definition.format.render(entry.value);

    if definition.unit.is_empty() {
        writeln!(writer, "{}: {}", definition.title, value)?;
    } else {
        writeln!(writer, "{}: {} {}", definition.title, value, definition.unit)?;
    }
    writeln!(writer, "  {}", definition.definition)?;
    writeln!(writer, "  Référence: {}", definition.reference)?;
    writeln!(
        writer,
        "  {} {}",
        entry.evaluation.band.symbol(),
        entry.evaluation.message
    )?;
    writeln!(writer)?;
    Ok(())
}
