//! Catalog assembly pipeline: anchor match, secondary matches, outlier
//! rejection, photometric correction and the final row layout

use crate::assembly::Assembler;
use crate::availability::AvailabilityReport;
use crate::bands::BandRegistry;
use crate::catalog::CatalogKind;
use crate::config::{MatchPlan, PipelineConfig};
use crate::crossmatch::{CrossMatcher, MatchRule};
use crate::error::{PipelineError, Result};
use crate::events::{PipelineEvent, PipelineObserver};
use crate::io::write_csv;
use crate::outliers::{OutlierRejector, Rejection};
use crate::photometry::{split_by_morphology, Morphology, PhotometricCorrector};
use crate::reader::CatalogReader;
use crate::table::Table;
use std::collections::HashMap;
use std::path::PathBuf;

/// Tables produced by one run
#[derive(Clone, Debug)]
pub struct PipelineOutput {
    pub pointlike: Table,
    pub extended: Table,
    pub availability: AvailabilityReport,
}

impl PipelineOutput {
    pub fn table(&self, morphology: Morphology) -> &Table {
        match morphology {
            Morphology::Pointlike => &self.pointlike,
            Morphology::Extended => &self.extended,
        }
    }
}

/// Main catalog pipeline
pub struct CatalogPipeline<'a> {
    config: PipelineConfig,
    bands: BandRegistry,
    plan: MatchPlan,
    matcher: CrossMatcher,
    observer: &'a dyn PipelineObserver,
}

impl<'a> CatalogPipeline<'a> {
    /// Validates the configuration; no table is read here
    pub fn new(config: PipelineConfig, observer: &'a dyn PipelineObserver) -> Result<Self> {
        config.validate()?;
        let bands = config.band_registry()?;
        let plan = config.match_plan()?;
        let matcher = CrossMatcher::new().with_progress(config.show_progress);
        Ok(Self { config, bands, plan, matcher, observer })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bands(&self) -> &BandRegistry {
        &self.bands
    }

    pub fn plan(&self) -> &MatchPlan {
        &self.plan
    }

    /// Read every catalog from `catalog_root` and run all stages
    pub fn run(&self) -> Result<PipelineOutput> {
        let reader = CatalogReader::new(&self.config.catalog_root);
        let options = self.config.normalize_options(&self.bands);

        let mut tables = HashMap::new();
        for kind in self.plan.catalogs() {
            tables.insert(kind, reader.load(kind, &options, self.observer)?);
        }
        self.run_on_tables(tables)
    }

    /// Run all stages on already normalized tables
    pub fn run_on_tables(&self, mut tables: HashMap<CatalogKind, Table>) -> Result<PipelineOutput> {
        let mut take = |kind: CatalogKind| {
            tables
                .remove(&kind)
                .ok_or_else(|| PipelineError::Configuration(format!("no table supplied for {}", kind)))
        };

        let anchor = take(self.plan.anchor_primary)?;
        let sweep = take(self.plan.anchor.catalog)?;
        let mut merged = self.match_step(&anchor, &sweep, &self.plan.anchor)?;
        tracing::info!("Anchor catalogue holds {} sources", merged.n_rows());

        let rejector = OutlierRejector::new(self.config.outlier_sigma);
        for rule in &self.plan.steps {
            let secondary = take(rule.catalog)?;
            merged = self.match_step(&merged, &secondary, rule)?;

            if self.plan.reject_outliers.contains(&rule.catalog) {
                let (table, rejection) = rejector.reject(merged, rule.catalog, &self.bands)?;
                merged = table;
                self.observer.on_event(&match rejection {
                    Rejection::Applied { stats, rejected } => PipelineEvent::OutliersRejected {
                        catalog: rule.catalog,
                        matched: stats.matched,
                        rejected,
                        median_ra: stats.median_ra,
                        median_dec: stats.median_dec,
                        stdev: stats.stdev,
                    },
                    Rejection::Skipped { matched } => PipelineEvent::RejectionSkipped { catalog: rule.catalog, matched },
                });
            }
        }

        let (pointlike, extended) = split_by_morphology(merged, &self.bands)?;
        self.observer.on_event(&PipelineEvent::MorphologySplit {
            pointlike: pointlike.n_rows(),
            extended: extended.n_rows(),
        });

        let corrector = PhotometricCorrector::new(&self.bands, self.observer);
        let pointlike = corrector.correct(pointlike, Morphology::Pointlike)?;
        let extended = corrector.correct(extended, Morphology::Extended)?;

        let assembler = Assembler::new(&self.bands, &self.config.requested_bands, self.observer)?
            .with_context_mode(self.config.context_mode)
            .with_specz_filter(self.config.reduce_to_specz);
        let (pointlike, extended) = assembler.assemble(&pointlike, &extended)?;

        let availability = AvailabilityReport::from_tables(
            &[(Morphology::Pointlike, &pointlike), (Morphology::Extended, &extended)],
            &self.config.requested_bands,
        )?;

        Ok(PipelineOutput { pointlike, extended, availability })
    }

    fn match_step(&self, primary: &Table, secondary: &Table, rule: &MatchRule) -> Result<Table> {
        let (joined, summary) = self.matcher.match_tables(primary, secondary, rule)?;
        self.observer.on_event(&PipelineEvent::Matched {
            catalog: rule.catalog,
            join: rule.join,
            primary_rows: summary.primary_rows,
            matched: summary.matched,
            output_rows: summary.output_rows,
        });
        Ok(joined)
    }

    /// Write both tables and the availability report; returns the written paths
    pub fn write(&self, output: &PipelineOutput) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(3);
        for morphology in Morphology::ALL {
            let path = self.config.output_path(&format!("{}.csv", morphology));
            let table = output.table(morphology);
            write_csv(table, &path)?;
            self.observer.on_event(&PipelineEvent::OutputWritten { path: path.clone(), rows: table.n_rows() });
            written.push(path);
        }

        let path = self.config.output_path("availability.json");
        output.availability.save(&path)?;
        written.push(path);
        Ok(written)
    }
}
