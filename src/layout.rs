//! Pagination of report sections onto fixed-size pages
//!
//! Every entry occupies the same `entry_height` (a title line plus up to three
//! detail lines). Text wrapping is not measured, so a long message may spill
//! visually; the page count stays deterministic.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LayoutError;
use crate::models::{MetricEntry, Section};

/// Page geometry contract supplied by the renderer, in points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageGeometry {
    pub page_width: f64,
    pub page_height: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,

    /// Fixed height of one entry block
    pub entry_height: f64,

    pub section_title_height: f64,

    /// Gap inserted before a section that does not start a page
    pub section_spacing: f64,

    /// Space reserved on the first page for the report header
    pub header_height: f64,
}

impl PageGeometry {
    /// A4 portrait with the report's default spacing
    pub fn a4() -> Self {
        PageGeometry {
            page_width: 595.2,
            page_height: 841.8,
            top_margin: 50.0,
            bottom_margin: 60.0,
            entry_height: 84.0,
            section_title_height: 30.0,
            section_spacing: 20.0,
            header_height: 130.0,
        }
    }

    /// Lowest y coordinate content may reach
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.bottom_margin
    }

    /// Vertical space on a page without header
    pub fn usable_height(&self) -> f64 {
        self.content_bottom() - self.top_margin
    }

    /// Whether a geometry setting may be zero (margins, spacing, header)
    pub fn allows_zero(parameter: &str) -> bool {
        matches!(
            parameter,
            "top_margin" | "bottom_margin" | "section_spacing" | "header_height"
        )
    }

    /// Reject geometry that cannot hold a single entry
    pub fn validate(&self) -> Result<(), LayoutError> {
        let parameters = [
            ("page_width", self.page_width),
            ("page_height", self.page_height),
            ("entry_height", self.entry_height),
            ("section_title_height", self.section_title_height),
            ("top_margin", self.top_margin),
            ("bottom_margin", self.bottom_margin),
            ("section_spacing", self.section_spacing),
            ("header_height", self.header_height),
        ];
        for (parameter, value) in parameters {
            let in_range = if Self::allows_zero(parameter) {
                value >= 0.0
            } else {
                value > 0.0
            };
            if !value.is_finite() || !in_range {
                return Err(LayoutError::InvalidGeometry { parameter, value });
            }
        }

        let available = self.usable_height();
        let tallest = self.entry_height.max(self.section_title_height);
        if tallest > available {
            return Err(LayoutError::EntryTooTall {
                entry_height: tallest,
                available,
            });
        }

        Ok(())
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Something placed on a page at vertical offset `y`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageItem {
    Heading { title: String, y: f64 },
    Entry { entry: MetricEntry, y: f64 },
    Narrative { title: String, body: String, y: f64 },
}

/// One laid-out page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub index: usize,
    pub items: Vec<PageItem>,

    /// Vertical cursor after the last item
    pub cursor: f64,
}

impl Page {
    fn new(index: usize, cursor: f64) -> Self {
        Page {
            index,
            items: Vec::new(),
            cursor,
        }
    }

    /// Metric entries on this page, in placement order
    pub fn entries(&self) -> impl Iterator<Item = &MetricEntry> {
        self.items.iter().filter_map(|item| match item {
            PageItem::Entry { entry, .. } => Some(entry),
            _ => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

struct LayoutState<'g> {
    geometry: &'g PageGeometry,
    page: Page,
    emitted: Vec<Page>,
}

impl<'g> LayoutState<'g> {
    fn new(geometry: &'g PageGeometry) -> Self {
        LayoutState {
            geometry,
            page: Page::new(0, geometry.top_margin + geometry.header_height),
            emitted: Vec::new(),
        }
    }

    fn fits(&self, height: f64) -> bool {
        self.page.cursor + height <= self.geometry.content_bottom()
    }

    fn start_next_page(&mut self) {
        self.flush_page_if_non_empty();
        self.page = Page::new(self.emitted.len(), self.geometry.top_margin);
    }

    fn flush_page_if_non_empty(&mut self) {
        if self.page.is_empty() {
            return;
        }
        let next = Page::new(self.emitted.len() + 1, self.geometry.top_margin);
        let page = std::mem::replace(&mut self.page, next);
        debug!(page = page.index, items = page.items.len(), "Page closed");
        self.emitted.push(page);
    }

    /// Append an item at the cursor, breaking the page first if it would overflow
    fn place(&mut self, height: f64, item: impl FnOnce(f64) -> PageItem) {
        if !self.fits(height) {
            self.start_next_page();
        }
        self.page.items.push(item(self.page.cursor));
        self.page.cursor += height;
    }

    fn push_section(&mut self, section: &Section) {
        if !self.page.is_empty() {
            self.page.cursor += self.geometry.section_spacing;
        }

        self.place(self.geometry.section_title_height, |y| PageItem::Heading {
            title: section.title.clone(),
            y,
        });

        for entry in &section.entries {
            self.place(self.geometry.entry_height, |y| PageItem::Entry {
                entry: entry.clone(),
                y,
            });
        }
    }

    fn into_pages(mut self) -> Vec<Page> {
        self.flush_page_if_non_empty();
        self.emitted
    }
}

/// Pack sections onto pages without reordering or splitting entries
///
/// A section heading starts a new page when it would cross the bottom margin.
/// Sections may continue across a page break. No empty page is ever emitted,
/// so an empty section list yields no pages.
pub fn layout(sections: &[Section], geometry: &PageGeometry) -> Result<Vec<Page>, LayoutError> {
    geometry.validate()?;

    let mut state = LayoutState::new(geometry);
    for section in sections {
        state.push_section(section);
    }
    Ok(state.into_pages())
}

/// A page holding only the narrative, always starting at the top margin
pub fn narrative_page(index: usize, geometry: &PageGeometry, title: &str, body: &str) -> Page {
    let mut page = Page::new(index, geometry.top_margin);
    page.items.push(PageItem::Narrative {
        title: title.to_string(),
        body: body.to_string(),
        y: geometry.top_margin,
    });
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MetricDefinition;
    use crate::models::{Evaluation, SectionKind};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn entry(id: &'static str) -> MetricEntry {
        MetricEntry {
            definition: MetricDefinition::reading(id, id, "", "", ""),
            value: Decimal::ZERO,
            evaluation: Evaluation::unmeasured("Non mesuré"),
        }
    }

    fn section(kind: SectionKind, count: usize) -> Section {
        const IDS: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];
        Section {
            kind,
            title: kind.title().to_string(),
            entries: (0..count).map(|i| entry(IDS[i % IDS.len()])).collect(),
        }
    }

    fn small_page() -> PageGeometry {
        PageGeometry {
            page_height: 300.0,
            top_margin: 20.0,
            bottom_margin: 20.0,
            entry_height: 50.0,
            section_title_height: 20.0,
            section_spacing: 10.0,
            header_height: 0.0,
            ..PageGeometry::a4()
        }
    }

    #[test]
    fn test_default_geometry_is_valid() {
        assert!(PageGeometry::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_geometry_rejected() {
        let geometry = PageGeometry {
            entry_height: 0.0,
            ..PageGeometry::a4()
        };
        assert_eq!(
            layout(&[], &geometry).unwrap_err(),
            LayoutError::InvalidGeometry {
                parameter: "entry_height",
                value: 0.0
            }
        );

        let geometry = PageGeometry {
            page_height: -1.0,
            ..PageGeometry::a4()
        };
        assert!(matches!(
            geometry.validate(),
            Err(LayoutError::InvalidGeometry { parameter: "page_height", .. })
        ));

        let flush = PageGeometry {
            top_margin: 0.0,
            bottom_margin: 0.0,
            section_spacing: 0.0,
            header_height: 0.0,
            ..PageGeometry::a4()
        };
        assert!(flush.validate().is_ok());

        let geometry = PageGeometry {
            section_spacing: -5.0,
            ..PageGeometry::a4()
        };
        assert!(matches!(
            geometry.validate(),
            Err(LayoutError::InvalidGeometry { parameter: "section_spacing", .. })
        ));
    }

    #[test]
    fn test_entry_taller_than_page_rejected() {
        let geometry = PageGeometry {
            entry_height: 800.0,
            ..PageGeometry::a4()
        };
        assert!(matches!(geometry.validate(), Err(LayoutError::EntryTooTall { .. })));
    }

    #[test]
    fn test_no_sections_no_pages() {
        assert!(layout(&[], &PageGeometry::a4()).unwrap().is_empty());
    }

    #[test]
    fn test_section_continues_on_next_page() {
        // Usable 260pt: heading (20) + 4 entries (200) on page 0, rest on page 1
        let pages = layout(&[section(SectionKind::Cardio, 6)], &small_page()).unwrap();

        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].entries().count(), 4);
        assert_eq!(pages[1].entries().count(), 2);
        assert_eq!(pages[1].index, 1);
        assert!(matches!(pages[1].items[0], PageItem::Entry { y, .. } if y == 20.0));
    }

    #[test]
    fn test_heading_breaks_when_it_does_not_fit() {
        let geometry = small_page();
        // Page 0 ends at 20 + 20 + 4*50 = 240; spacing 10 -> 250; title fits to 270
        // but the first entry (50) does not, so it moves alone to page 1
        let pages = layout(
            &[section(SectionKind::Cardio, 4), section(SectionKind::Activity, 1)],
            &geometry,
        )
        .unwrap();

        assert_eq!(pages.len(), 2);
        assert!(matches!(pages[0].items.last(), Some(PageItem::Heading { .. })));
        assert_eq!(pages[1].entries().count(), 1);
    }

    #[test]
    fn test_first_page_reserves_header() {
        let geometry = PageGeometry::a4();
        let pages = layout(&[section(SectionKind::Cardio, 1)], &geometry).unwrap();
        assert!(matches!(
            pages[0].items[0],
            PageItem::Heading { y, .. } if y == geometry.top_margin + geometry.header_height
        ));
    }

    #[test]
    fn test_narrative_page_starts_at_top() {
        let geometry = PageGeometry::a4();
        let page = narrative_page(3, &geometry, "Évaluation", "Texte");
        assert_eq!(page.index, 3);
        assert_eq!(page.entries().count(), 0);
        assert!(matches!(page.items[0], PageItem::Narrative { y, .. } if y == geometry.top_margin));
    }

    proptest! {
        #[test]
        fn prop_layout_conserves_entries_and_order(
            counts in proptest::collection::vec(0usize..12, 0..8),
            entry_height in 20.0f64..200.0,
        ) {
            let geometry = PageGeometry { entry_height, ..small_page() };
            let kinds = SectionKind::EXTENDED_ORDER;
            let sections: Vec<Section> = counts
                .iter()
                .enumerate()
                .map(|(i, &count)| section(kinds[i % kinds.len()], count))
                .collect();

            let pages = layout(&sections, &geometry).unwrap();

            let expected: Vec<&str> = sections
                .iter()
                .flat_map(|s| s.entries.iter().map(|e| e.definition.id))
                .collect();
            let placed: Vec<&str> = pages
                .iter()
                .flat_map(|p| p.entries().map(|e| e.definition.id))
                .collect();
            prop_assert_eq!(placed, expected);

            for (position, page) in pages.iter().enumerate() {
                prop_assert_eq!(page.index, position);
                prop_assert!(!page.is_empty());
                prop_assert!(page.cursor <= geometry.content_bottom() + 1e-9);
                for item in &page.items {
                    if let PageItem::Entry { y, .. } = item {
                        prop_assert!(*y + geometry.entry_height <= geometry.content_bottom() + 1e-9);
                    }
                }
            }
        }
    }
}
