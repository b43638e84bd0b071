//! Final row layout for the template-fitting input
//!
//! One table per morphological class with the columns
//! `IDENT, <band>, <band>_err ..., CONTEXT, ZSPEC, String`.

use crate::bands::{Band, BandRegistry};
use crate::error::Result;
use crate::events::{PipelineEvent, PipelineObserver};
use crate::photometry::Morphology;
use crate::table::{Column, Table};
use serde::{Deserialize, Serialize};
use skyfuse_core::constants::{SENTINEL, ZSPEC_BEST_QUALITY, ZSPEC_MIN};
use skyfuse_core::photometry::{is_present, present};

/// How the `CONTEXT` column is filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    /// `-1` for every source
    #[default]
    Fixed,
    /// Bands whose flux is the sentinel are excluded per source
    PerSource,
}

/// Accepted spectroscopic redshift, or the sentinel
pub fn accepted_zspec(zspec: Option<f64>, quality: Option<f64>) -> f64 {
    match (present(zspec), quality) {
        (Some(z), Some(q)) if q == ZSPEC_BEST_QUALITY as f64 && z > ZSPEC_MIN => z,
        _ => SENTINEL,
    }
}

fn optional_numbers(table: &Table, name: &str) -> Result<Vec<Option<f64>>> {
    match table.resolve(name) {
        Some(actual) => table.numbers(actual),
        None => Ok(vec![None; table.n_rows()]),
    }
}

pub struct Assembler<'a> {
    registry: &'a BandRegistry,
    bands: Vec<&'a Band>,
    context_mode: ContextMode,
    reduce_to_specz: bool,
    observer: &'a dyn PipelineObserver,
}

impl<'a> Assembler<'a> {
    /// Fails with `MissingBand` when a requested band is not registered
    pub fn new<S: AsRef<str>>(
        registry: &'a BandRegistry,
        requested: &[S],
        observer: &'a dyn PipelineObserver,
    ) -> Result<Self> {
        let bands = requested
            .iter()
            .map(|name| registry.require(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { registry, bands, context_mode: ContextMode::Fixed, reduce_to_specz: false, observer })
    }

    pub fn with_context_mode(mut self, mode: ContextMode) -> Self {
        self.context_mode = mode;
        self
    }

    /// Keep only sources with a secure spectroscopic redshift
    pub fn with_specz_filter(mut self, enabled: bool) -> Self {
        self.reduce_to_specz = enabled;
        self
    }

    pub fn assemble(&self, pointlike: &Table, extended: &Table) -> Result<(Table, Table)> {
        Ok((self.assemble_one(pointlike, Morphology::Pointlike)?, self.assemble_one(extended, Morphology::Extended)?))
    }

    pub fn assemble_one(&self, table: &Table, morphology: Morphology) -> Result<Table> {
        let table = if self.reduce_to_specz { self.specz_only(table, morphology)? } else { table.clone() };
        let n = table.n_rows();

        let mut out = Table::empty(format!("{}_out", morphology), n)
            .with_column("IDENT", Column::Int((0..n as i64).map(Some).collect()))?;

        let mut fluxes = Vec::with_capacity(self.bands.len());
        for band in &self.bands {
            let flux = optional_numbers(&table, &band.flux_column())?;
            let err = optional_numbers(&table, &band.flux_err_column())?;
            let to_column = |v: &[Option<f64>]| Column::Float(v.iter().map(|x| Some(x.unwrap_or(SENTINEL))).collect());
            out = out
                .with_column(band.name.clone(), to_column(flux.as_slice()))?
                .with_column(format!("{}_err", band.name), to_column(err.as_slice()))?;
            fluxes.push(flux);
        }

        let context: Vec<Option<i64>> = match self.context_mode {
            ContextMode::Fixed => vec![Some(-1); n],
            ContextMode::PerSource => (0..n)
                .map(|row| {
                    let excluded: Vec<&str> = self
                        .bands
                        .iter()
                        .zip(&fluxes)
                        .filter(|(_, flux)| !is_present(flux[row]))
                        .map(|(band, _)| band.name.as_str())
                        .collect();
                    self.registry.context(&excluded).map(Some)
                })
                .collect::<Result<_>>()?,
        };
        out = out.with_column("CONTEXT", Column::Int(context))?;

        let zspec = optional_numbers(&table, "ZSPEC")?;
        let quality = optional_numbers(&table, "ZSPEC_QUAL")?;
        out = out.with_float_column("ZSPEC", |row| accepted_zspec(zspec[row], quality[row]))?;

        let parts = ["ra", "dec", "ctp_redshift_grade", "ZSPEC_QUAL"]
            .iter()
            .map(|name| table.resolve(name).map(|actual| table.column(actual)).transpose())
            .collect::<Result<Vec<_>>>()?;
        let strings = (0..n)
            .map(|row| {
                let words: Vec<String> = parts
                    .iter()
                    .map(|c| c.and_then(|c| c.render(row)).unwrap_or_else(|| "-99".to_string()))
                    .collect();
                Some(words.join(" "))
            })
            .collect();
        out.with_column("String", Column::Text(strings))
    }

    fn specz_only(&self, table: &Table, morphology: Morphology) -> Result<Table> {
        let zspec = optional_numbers(table, "ZSPEC")?;
        let quality = optional_numbers(table, "ZSPEC_QUAL")?;
        let before = table.n_rows();
        let kept = table.clone().filter_by(|row| {
            matches!((present(zspec[row]), quality[row]), (Some(z), Some(q)) if z > 0.0 && q == ZSPEC_BEST_QUALITY as f64)
        });
        self.observer.on_event(&PipelineEvent::QualityFilter { morphology, before, after: kept.n_rows() });
        Ok(kept)
    }
}
