//! Positional cross-match of two catalogs
//!
//! Every primary row is paired with the nearest secondary row inside the
//! match radius (great-circle distance). Candidates come from a
//! declination-sorted index, so each lookup only scans the rows whose
//! declination lies within one radius of the primary position.

use crate::catalog::CatalogKind;
use crate::error::{PipelineError, Result};
use crate::table::{Column, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use skyfuse_core::constants::SENTINEL;
use skyfuse_core::coordinates::{arcsec_to_deg, SkyPosition};
use skyfuse_core::photometry::present;

/// What happens to primary rows without a counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinPolicy {
    /// Keep every primary row; unmatched secondary cells are filled
    #[serde(rename = "all1")]
    All1,
    /// Keep only rows with a counterpart
    #[serde(rename = "exclusive")]
    Exclusive,
}

/// Which input provides the merged `ra`/`dec`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionSource {
    Primary,
    Secondary,
}

/// One match step, with the catalog already resolved
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRule {
    pub catalog: CatalogKind,
    pub radius_arcsec: f64,
    pub join: JoinPolicy,
    pub position: PositionSource,
}

impl MatchRule {
    pub fn new(catalog: CatalogKind, radius_arcsec: f64, join: JoinPolicy) -> Self {
        Self { catalog, radius_arcsec, join, position: PositionSource::Primary }
    }

    pub fn with_position(mut self, position: PositionSource) -> Self {
        self.position = position;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSummary {
    pub primary_rows: usize,
    pub matched: usize,
    pub output_rows: usize,
}

pub fn delta_ra_column(catalog: CatalogKind) -> String {
    format!("delta_ra_{}", catalog)
}

pub fn delta_dec_column(catalog: CatalogKind) -> String {
    format!("delta_dec_{}", catalog)
}

pub fn separation_column(catalog: CatalogKind) -> String {
    format!("sep_to_{}", catalog)
}

/// Secondary rows sorted by declination
pub struct DecIndex {
    order: Vec<usize>,
    decs: Vec<f64>,
    positions: Vec<Option<SkyPosition>>,
}

impl DecIndex {
    pub fn new(positions: Vec<Option<SkyPosition>>) -> Self {
        let mut order: Vec<usize> = (0..positions.len()).filter(|i| positions[*i].is_some()).collect();
        order.sort_by(|a, b| {
            let da = positions[*a].map_or(0.0, |p| p.dec);
            let db = positions[*b].map_or(0.0, |p| p.dec);
            da.total_cmp(&db)
        });
        let decs = order.iter().filter_map(|i| positions[*i].map(|p| p.dec)).collect();
        Self { order, decs, positions }
    }

    /// Nearest row within `radius_deg` (inclusive); ties go to the lower row index
    pub fn nearest(&self, target: &SkyPosition, radius_deg: f64) -> Option<(usize, f64)> {
        let start = self.decs.partition_point(|d| *d < target.dec - radius_deg);
        let mut best: Option<(usize, f64)> = None;

        for k in start..self.decs.len() {
            if self.decs[k] > target.dec + radius_deg {
                break;
            }
            let row = self.order[k];
            let Some(candidate) = self.positions[row] else { continue };
            let sep = target.separation(&candidate);
            if sep > radius_deg {
                continue;
            }
            best = match best {
                Some((b, bsep)) if bsep < sep || (bsep == sep && b < row) => Some((b, bsep)),
                _ => Some((row, sep)),
            };
        }
        best
    }
}

/// Positions of a table, `None` where either coordinate is missing
pub fn positions(table: &Table, ra: &str, dec: &str) -> Result<Vec<Option<SkyPosition>>> {
    let ra = table.numbers(ra)?;
    let dec = table.numbers(dec)?;
    Ok(ra
        .iter()
        .zip(&dec)
        .map(|(r, d)| match (present(*r), present(*d)) {
            (Some(r), Some(d)) => Some(SkyPosition::new(r, d)),
            _ => None,
        })
        .collect())
}

#[derive(Debug, Clone, Default)]
pub struct CrossMatcher {
    show_progress: bool,
}

impl CrossMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({per_sec})")
        {
            pb.set_style(style);
        }
        pb
    }

    /// Join `secondary` onto `primary` following `rule`
    pub fn match_tables(&self, primary: &Table, secondary: &Table, rule: &MatchRule) -> Result<(Table, MatchSummary)> {
        if rule.radius_arcsec.is_nan() || rule.radius_arcsec <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "match radius for {} must be positive, got {}",
                rule.catalog, rule.radius_arcsec
            )));
        }
        let cat = rule.catalog;
        let radius = arcsec_to_deg(rule.radius_arcsec);
        let (sra, sdec) = cat.position_columns();

        let primary_pos = positions(primary, "ra", "dec")?;
        let secondary_pos = positions(secondary, sra, sdec)?;
        let index = DecIndex::new(secondary_pos.clone());

        let pb = self.progress_bar(primary_pos.len());
        let mut pairs: Vec<(usize, Option<usize>)> = Vec::with_capacity(primary_pos.len());
        for (row, pos) in primary_pos.iter().enumerate() {
            let found = pos.as_ref().and_then(|p| index.nearest(p, radius)).map(|(i, _)| i);
            if found.is_some() || rule.join == JoinPolicy::All1 {
                pairs.push((row, found));
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        let matched = pairs.iter().filter(|(_, s)| s.is_some()).count();
        let primary_rows: Vec<Option<usize>> = pairs.iter().map(|(p, _)| Some(*p)).collect();
        let secondary_rows: Vec<Option<usize>> = pairs.iter().map(|(_, s)| *s).collect();

        let left = primary.gather(&primary_rows);
        let right = secondary.gather(&secondary_rows);

        let ra_cat = format!("ra_{}", cat);
        let dec_cat = format!("dec_{}", cat);
        let mut joined = Table::empty(primary.name(), pairs.len());

        match rule.position {
            PositionSource::Primary => {
                for (name, column) in left.columns() {
                    joined = joined.with_column(name, column.clone())?;
                }
                for (name, column) in right.columns() {
                    let target = if name == sra {
                        ra_cat.clone()
                    } else if name == sdec {
                        dec_cat.clone()
                    } else if left.has_column(name) {
                        format!("{}_{}", name, cat)
                    } else {
                        name.to_string()
                    };
                    joined = joined.with_column(target, column.clone())?;
                }
            }
            PositionSource::Secondary => {
                let ra_primary = format!("ra_{}", primary.name());
                let dec_primary = format!("dec_{}", primary.name());
                for (name, column) in left.columns() {
                    let target = match name {
                        "ra" => ra_primary.clone(),
                        "dec" => dec_primary.clone(),
                        _ => name.to_string(),
                    };
                    joined = joined.with_column(target, column.clone())?;
                }
                for (name, column) in right.columns() {
                    let target = if name == sra {
                        "ra".to_string()
                    } else if name == sdec {
                        "dec".to_string()
                    } else if left.has_column(name) {
                        format!("{}_{}", name, cat)
                    } else {
                        name.to_string()
                    };
                    joined = joined.with_column(target, column.clone())?;
                }
            }
        }

        // Offsets are always secondary minus primary
        let mut delta_ra = Vec::with_capacity(pairs.len());
        let mut delta_dec = Vec::with_capacity(pairs.len());
        let mut sep = Vec::with_capacity(pairs.len());
        for (p, s) in &pairs {
            let offset = match (primary_pos[*p], s.and_then(|s| secondary_pos[s])) {
                (Some(a), Some(b)) => Some(a.offset_to(&b)),
                _ => None,
            };
            delta_ra.push(Some(offset.map_or(SENTINEL, |o| o.delta_ra)));
            delta_dec.push(Some(offset.map_or(SENTINEL, |o| o.delta_dec)));
            sep.push(Some(offset.map_or(SENTINEL, |o| o.length())));
        }

        let joined = joined
            .with_column(delta_ra_column(cat), Column::Float(delta_ra))?
            .with_column(delta_dec_column(cat), Column::Float(delta_dec))?
            .with_column(separation_column(cat), Column::Float(sep))?;

        let summary = MatchSummary { primary_rows: primary.n_rows(), matched, output_rows: joined.n_rows() };
        Ok((joined, summary))
    }
}
