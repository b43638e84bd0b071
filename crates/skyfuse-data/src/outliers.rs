//! Astrometric outlier rejection
//!
//! Offsets to a secondary catalog are recentred on their median, and every
//! match whose recentred separation reaches `sigma` sample standard
//! deviations loses that catalog's photometry. Rows are never dropped.

use crate::bands::BandRegistry;
use crate::catalog::CatalogKind;
use crate::crossmatch::{delta_dec_column, delta_ra_column};
use crate::error::Result;
use crate::table::{Column, Table};
use skyfuse_core::constants::{OUTLIER_SIGMA, SENTINEL};
use skyfuse_core::photometry::present;
use skyfuse_core::stats::{median, std_dev};

/// Offset distribution of one catalog's matches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OffsetStatistics {
    pub matched: usize,
    pub median_ra: f64,
    pub median_dec: f64,
    /// Sample standard deviation of the recentred separation
    pub stdev: f64,
    pub threshold: f64,
}

/// Result of one rejection pass
#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    Applied { stats: OffsetStatistics, rejected: usize },
    /// Fewer than two matches; the table is unchanged
    Skipped { matched: usize },
}

pub fn true_separation_column(catalog: CatalogKind) -> String {
    format!("true_sep_{}", catalog)
}

#[derive(Debug, Clone, Copy)]
pub struct OutlierRejector {
    sigma: f64,
}

impl Default for OutlierRejector {
    fn default() -> Self {
        Self { sigma: OUTLIER_SIGMA }
    }
}

impl OutlierRejector {
    pub fn new(sigma: f64) -> Self {
        Self { sigma }
    }

    pub fn reject(&self, table: Table, catalog: CatalogKind, bands: &BandRegistry) -> Result<(Table, Rejection)> {
        let dra = table.numbers(&delta_ra_column(catalog))?;
        let ddec = table.numbers(&delta_dec_column(catalog))?;

        let offsets: Vec<Option<(f64, f64)>> = dra
            .iter()
            .zip(&ddec)
            .map(|(a, d)| present(*a).zip(present(*d)))
            .collect();
        let matched: Vec<(f64, f64)> = offsets.iter().flatten().copied().collect();

        if matched.len() < 2 {
            return Ok((table, Rejection::Skipped { matched: matched.len() }));
        }

        let ra: Vec<f64> = matched.iter().map(|(a, _)| *a).collect();
        let dec: Vec<f64> = matched.iter().map(|(_, d)| *d).collect();
        let (median_ra, median_dec) = match (median(&ra), median(&dec)) {
            (Some(r), Some(d)) => (r, d),
            _ => return Ok((table, Rejection::Skipped { matched: matched.len() })),
        };

        let true_sep: Vec<Option<f64>> = offsets
            .iter()
            .map(|o| o.map(|(a, d)| (a - median_ra).hypot(d - median_dec)))
            .collect();
        let separations: Vec<f64> = true_sep.iter().flatten().copied().collect();
        let stdev = std_dev(&separations).unwrap_or(0.0);
        let threshold = self.sigma * stdev;

        // identical offsets give a zero spread and nothing to reject
        let outlier: Vec<bool> = true_sep
            .iter()
            .map(|s| stdev > 0.0 && s.map_or(false, |s| s >= threshold))
            .collect();
        let rejected = outlier.iter().filter(|o| **o).count();

        let mut table = table.with_column(
            true_separation_column(catalog),
            Column::Float(true_sep.iter().map(|s| Some(s.unwrap_or(SENTINEL))).collect()),
        )?;

        if rejected > 0 {
            for name in catalog.photometry_columns(bands) {
                let Some(actual) = table.resolve(&name).map(str::to_string) else { continue };
                let values = table.numbers(&actual)?;
                let nulled = values
                    .iter()
                    .zip(&outlier)
                    .map(|(v, out)| if *out { Some(SENTINEL) } else { *v })
                    .collect();
                table = table.with_column(actual, Column::Float(nulled))?;
            }
        }

        let stats = OffsetStatistics { matched: matched.len(), median_ra, median_dec, stdev, threshold };
        Ok((table, Rejection::Applied { stats, rejected }))
    }
}
