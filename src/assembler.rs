//! Top-level orchestration: snapshot in, paginated document out

use chrono::{NaiveDate, Utc};
use rayon::prelude::*;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::{ids, MetricCatalog};
use crate::config::AppConfig;
use crate::derived::{DerivedMetrics, LookbackConfig};
use crate::error::{CatalogError, Result};
use crate::evaluation::EvaluationEngine;
use crate::layout::{layout, narrative_page, Page, PageGeometry};
use crate::models::{Section, SectionKind, Sex};
use crate::narrative::{compose, NarrativeSummary, NARRATIVE_TITLE};
use crate::report::{build_sections, ReportInputs};
use crate::snapshot::HealthSnapshot;

pub const REPORT_TITLE: &str = "Rapport de Santé Complet";

/// Per-call assembly switches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembleOptions {
    /// Append the locally composed narrative when no external text is given
    pub include_narrative: bool,

    /// Narrative from the language-model collaborator, used verbatim
    pub external_narrative_text: Option<String>,

    /// Add gait and respiratory sections after the default six
    pub extended_sections: bool,
}

/// Identity block printed at the top of the first page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportHeader {
    pub title: String,
    pub generated_on: Option<NaiveDate>,
    pub age: Option<u32>,
    pub sex: Sex,
    pub height_m: Option<Decimal>,
    pub body_mass_kg: Option<Decimal>,
}

impl ReportHeader {
    fn from_snapshot(snapshot: &HealthSnapshot) -> Self {
        ReportHeader {
            title: REPORT_TITLE.to_string(),
            generated_on: snapshot.captured_at.map(|at| at.date_naive()),
            age: snapshot.subject.age,
            sex: snapshot.subject.sex,
            height_m: snapshot.height_m(),
            body_mass_kg: snapshot.subject_context().body_mass_kg,
        }
    }
}

/// Finished report, ready for a renderer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub header: ReportHeader,
    pub pages: Vec<Page>,
    pub narrative_page: Option<Page>,
}

impl Document {
    /// Content pages plus the narrative page, if any
    pub fn page_count(&self) -> usize {
        self.pages.len() + usize::from(self.narrative_page.is_some())
    }

    pub fn entry_count(&self) -> usize {
        self.pages.iter().map(|page| page.entries().count()).sum()
    }

    /// Every page in print order
    pub fn all_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().chain(self.narrative_page.iter())
    }
}

/// Builds documents from snapshots
///
/// Holds only read-only state, so one assembler serves any number of
/// concurrent calls.
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    catalog: MetricCatalog,
    engine: EvaluationEngine,
    geometry: PageGeometry,
    lookback: LookbackConfig,
}

impl ReportAssembler {
    /// Fails when a catalog metric has no evaluation rule
    pub fn new(
        catalog: MetricCatalog,
        engine: EvaluationEngine,
        geometry: PageGeometry,
        lookback: LookbackConfig,
    ) -> Result<Self> {
        if let Some(definition) = catalog.definitions().iter().find(|d| !engine.has_rule(d.id)) {
            return Err(CatalogError::MissingRule {
                id: definition.id.to_string(),
            }
            .into());
        }

        Ok(ReportAssembler {
            catalog,
            engine,
            geometry,
            lookback,
        })
    }

    /// Standard catalog with default policies and A4 geometry
    pub fn standard() -> Result<Self> {
        Self::new(
            MetricCatalog::standard()?,
            EvaluationEngine::default(),
            PageGeometry::default(),
            LookbackConfig::default(),
        )
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            MetricCatalog::standard()?,
            EvaluationEngine::new(config.evaluation.unknown_sex_policy, config.derived.protein_factor),
            config.layout,
            config.derived.clone(),
        )
    }

    pub fn catalog(&self) -> &MetricCatalog {
        &self.catalog
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Reduce the snapshot's samples
    pub fn derive(&self, snapshot: &HealthSnapshot) -> DerivedMetrics {
        let as_of = snapshot.captured_at.map(|at| at.with_timezone(&Utc));
        DerivedMetrics::compute(
            &snapshot.samples(),
            &snapshot.daily_steps,
            &snapshot.subject_context(),
            as_of,
            &self.lookback,
        )
    }

    /// Evaluated sections, before pagination
    pub fn sections(&self, snapshot: &HealthSnapshot, extended: bool) -> Vec<Section> {
        self.sections_with(snapshot, &self.derive(snapshot), extended)
    }

    fn sections_with(
        &self,
        snapshot: &HealthSnapshot,
        derived: &DerivedMetrics,
        extended: bool,
    ) -> Vec<Section> {
        let context = snapshot.subject_context();
        let inputs = ReportInputs {
            readings: &snapshot.readings,
            derived,
            context: &context,
        };
        let kinds: &[SectionKind] = if extended {
            &SectionKind::EXTENDED_ORDER
        } else {
            &SectionKind::DEFAULT_ORDER
        };
        build_sections(&self.catalog, &self.engine, inputs, kinds)
    }

    /// Key metrics for the narrative, `0` where nothing was measured
    pub fn narrative_summary(&self, snapshot: &HealthSnapshot) -> NarrativeSummary {
        summarize(snapshot, &self.derive(snapshot))
    }

    /// Build the complete document
    ///
    /// Missing data never fails assembly; only unusable page geometry does.
    pub fn assemble(&self, snapshot: &HealthSnapshot, options: &AssembleOptions) -> Result<Document> {
        let derived = self.derive(snapshot);
        let sections = self.sections_with(snapshot, &derived, options.extended_sections);
        let pages = layout(&sections, &self.geometry)?;

        let narrative = match &options.external_narrative_text {
            Some(text) => Some(text.clone()),
            None if options.include_narrative => Some(compose(&summarize(snapshot, &derived))),
            None => None,
        };
        let narrative =
            narrative.map(|body| narrative_page(pages.len(), &self.geometry, NARRATIVE_TITLE, &body));

        let document = Document {
            header: ReportHeader::from_snapshot(snapshot),
            pages,
            narrative_page: narrative,
        };

        info!(
            pages = document.page_count(),
            entries = document.entry_count(),
            narrative = document.narrative_page.is_some(),
            "Report assembled"
        );

        Ok(document)
    }

    /// Assemble independent snapshots in parallel, results in input order
    pub fn assemble_batch(
        &self,
        snapshots: &[HealthSnapshot],
        options: &AssembleOptions,
    ) -> Vec<Result<Document>> {
        debug!(count = snapshots.len(), "Assembling batch");
        snapshots
            .par_iter()
            .map(|snapshot| self.assemble(snapshot, options))
            .collect()
    }
}

fn summarize(snapshot: &HealthSnapshot, derived: &DerivedMetrics) -> NarrativeSummary {
    NarrativeSummary {
        bmi: snapshot.reading(ids::BMI).unwrap_or_default(),
        heart_rate: snapshot.reading(ids::HEART_RATE).unwrap_or_default(),
        sleep_hours: derived.sleep_duration_hours,
        steps: derived
            .latest_steps
            .or_else(|| snapshot.reading(ids::STEPS))
            .unwrap_or_default(),
    }
}
