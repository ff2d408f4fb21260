use serde::Serialize;
use std::io::Write;

use super::ExportError;
use crate::assembler::Document;
use crate::layout::PageItem;

/// One CSV row per placed entry
#[derive(Debug, Serialize)]
struct EntryRow<'a> {
    page: usize,
    section: &'a str,
    metric_id: &'a str,
    title: &'a str,
    value: String,
    unit: &'a str,
    band: String,
    message: &'a str,
}

/// Export every entry with its page and section
pub fn write_entries<W: Write>(document: &Document, writer: W) -> Result<(), ExportError> {
    let mut csv_writer = ::csv::Writer::from_writer(writer);

    // Sections may continue on the next page without repeating the heading
    let mut section = "";
    for page in &document.pages {
        for item in &page.items {
            match item {
                PageItem::Heading { title, .. } => section = title,
                PageItem::Entry { entry, .. } => {
                    csv_writer.serialize(EntryRow {
                        page: page.index + 1,
                        section,
                        metric_id: entry.definition.id,
                        title: entry.definition.title,
                        value: entry.definition.format.render(entry.value),
                        unit: entry.definition.unit,
                        band: entry.evaluation.band.to_string(),
                        message: &entry.evaluation.message,
                    })?;
                }
                PageItem::Narrative { .. } => {}
            }
        }
    }

    csv_writer.flush()?;
    Ok(())
}
