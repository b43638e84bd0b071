//! Multi-catalog cross-matching and photometric harmonization
//!
//! Catalogs are read from CSV partitions, normalized into one column schema,
//! matched onto an AGN anchor catalog, cleaned of astrometric outliers and
//! converted to cgs flux densities before being laid out for template fitting.

pub mod error;
pub mod table;
pub mod io;
pub mod bands;
pub mod catalog;
pub mod events;
pub mod reader;
pub mod crossmatch;
pub mod outliers;
pub mod photometry;
pub mod assembly;
pub mod availability;
pub mod config;
pub mod pipeline;

pub use error::{PipelineError, Result};
pub use table::{Column, Table};
pub use bands::{Band, BandDef, BandRegistry, PhotometricSystem};
pub use catalog::{CatalogKind, NormalizeOptions};
pub use events::{PipelineEvent, PipelineObserver, RecordingObserver, TracingObserver};
pub use reader::CatalogReader;
pub use crossmatch::{CrossMatcher, JoinPolicy, MatchRule, MatchSummary, PositionSource};
pub use outliers::{OffsetStatistics, OutlierRejector, Rejection};
pub use photometry::{split_by_morphology, Morphology, PhotometricCorrector};
pub use assembly::{Assembler, ContextMode};
pub use availability::AvailabilityReport;
pub use config::{LephareConfig, MatchPlan, MatchRadius, PipelineConfig};
pub use pipeline::{CatalogPipeline, PipelineOutput};
