//! Pipeline events and observers
//!
//! Stages never log directly for the numbers a caller might want to inspect
//! (match counts, rejected sources, skipped bands). They emit a
//! [`PipelineEvent`] to the injected [`PipelineObserver`]; the default
//! observer forwards everything to `tracing`.

use crate::catalog::CatalogKind;
use crate::crossmatch::JoinPolicy;
use crate::photometry::Morphology;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    CatalogLoaded { catalog: CatalogKind, files: usize, rows: usize },
    CatalogNormalized { catalog: CatalogKind, rows: usize, columns: usize },
    Matched { catalog: CatalogKind, join: JoinPolicy, primary_rows: usize, matched: usize, output_rows: usize },
    OutliersRejected { catalog: CatalogKind, matched: usize, rejected: usize, median_ra: f64, median_dec: f64, stdev: f64 },
    /// Too few matches to estimate the offset distribution
    RejectionSkipped { catalog: CatalogKind, matched: usize },
    MorphologySplit { pointlike: usize, extended: usize },
    BandCorrected { band: String, morphology: Morphology, valid: usize, rows: usize },
    BandSkipped { band: String, morphology: Morphology, reason: String },
    QualityFilter { morphology: Morphology, before: usize, after: usize },
    OutputWritten { path: PathBuf, rows: usize },
}

/// Receiver for pipeline events
pub trait PipelineObserver {
    fn on_event(&self, event: &PipelineEvent);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::CatalogLoaded { catalog, files, rows } => {
                tracing::info!("Loaded {} rows of {} from {} file(s)", rows, catalog, files);
            }
            PipelineEvent::CatalogNormalized { catalog, rows, columns } => {
                tracing::debug!("Normalized {}: {} rows, {} columns", catalog, rows, columns);
            }
            PipelineEvent::Matched { catalog, join, primary_rows, matched, output_rows } => {
                tracing::info!(
                    "Matched {}: {} of {} rows have a counterpart ({:?}, {} rows out)",
                    catalog, matched, primary_rows, join, output_rows
                );
                if *matched == 0 {
                    tracing::warn!("No counterparts found in {}", catalog);
                }
            }
            PipelineEvent::OutliersRejected { catalog, matched, rejected, median_ra, median_dec, stdev } => {
                tracing::info!(
                    "Rejected {} of {} {} matches (median offset {:.3e}, {:.3e} deg, stdev {:.3e} deg)",
                    rejected, matched, catalog, median_ra, median_dec, stdev
                );
            }
            PipelineEvent::RejectionSkipped { catalog, matched } => {
                tracing::warn!("Only {} {} matches, skipping outlier rejection", matched, catalog);
            }
            PipelineEvent::MorphologySplit { pointlike, extended } => {
                tracing::info!("{} point-like and {} extended sources", pointlike, extended);
            }
            PipelineEvent::BandCorrected { band, morphology, valid, rows } => {
                tracing::debug!("{} ({}): {} of {} fluxes valid", band, morphology, valid, rows);
            }
            PipelineEvent::BandSkipped { band, morphology, reason } => {
                tracing::warn!("Skipping band {} for {} sources: {}", band, morphology, reason);
            }
            PipelineEvent::QualityFilter { morphology, before, after } => {
                tracing::info!("Spec-z filter kept {} of {} {} sources", after, before, morphology);
            }
            PipelineEvent::OutputWritten { path, rows } => {
                tracing::info!("Wrote {} rows to {:?}", rows, path);
            }
        }
    }
}

/// Keeps every event in memory, for tests and reports
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn on_event(&self, event: &PipelineEvent) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).push(event.clone());
    }
}
