//! Catalog kinds and their column normalization
//!
//! Each survey ships its own column names. Normalization selects the columns
//! the later stages need, renames them into one schema and applies the few
//! row selections that belong to the catalog itself (reliability and
//! footprint cuts). No photometry is converted here.

use crate::bands::BandRegistry;
use crate::error::{PipelineError, Result};
use crate::table::{Column, Table};
use serde::{Deserialize, Serialize};
use skyfuse_core::coordinates::{SkyPosition, SkyRegion};
use skyfuse_core::constants::SENTINEL;
use std::fmt;
use std::str::FromStr;

/// Closed set of catalogs the pipeline knows how to merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    /// Optical AGN candidates (random-forest selected)
    OptAgn,
    /// X-ray selected AGN with Legacy Survey counterparts
    XrayAgn,
    /// Legacy Survey DR9 sweep photometry
    Sweep,
    /// Legacy Survey DR10 i-band forced photometry
    Ls10,
    Galex,
    Kids,
    Hsc,
    Vhs,
    /// Spectroscopic redshift compilation
    Eros,
}

impl CatalogKind {
    pub const ALL: [CatalogKind; 9] = [
        CatalogKind::OptAgn,
        CatalogKind::XrayAgn,
        CatalogKind::Sweep,
        CatalogKind::Ls10,
        CatalogKind::Galex,
        CatalogKind::Kids,
        CatalogKind::Hsc,
        CatalogKind::Vhs,
        CatalogKind::Eros,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CatalogKind::OptAgn => "opt_agn",
            CatalogKind::XrayAgn => "xray_agn",
            CatalogKind::Sweep => "sweep",
            CatalogKind::Ls10 => "ls10",
            CatalogKind::Galex => "galex",
            CatalogKind::Kids => "kids",
            CatalogKind::Hsc => "hsc",
            CatalogKind::Vhs => "vhs",
            CatalogKind::Eros => "eros",
        }
    }

    /// Columns holding this catalog's own position after normalization
    pub fn position_columns(&self) -> (&'static str, &'static str) {
        match self {
            CatalogKind::Eros => ("ra_eros", "dec_eros"),
            _ => ("ra", "dec"),
        }
    }

    /// Raw photometric columns, i.e. what outlier rejection blanks out
    pub fn photometry_columns(&self, bands: &BandRegistry) -> Vec<String> {
        let mut columns = Vec::new();
        for band in bands.for_catalog(*self) {
            let b = band.name.to_lowercase();
            match self {
                CatalogKind::Sweep => {
                    columns.push(format!("flux_{}", b));
                    columns.push(format!("flux_ivar_{}", b));
                }
                CatalogKind::Galex => {
                    columns.push(format!("{}_flux", b));
                    columns.push(format!("{}_flux_err", b));
                }
                CatalogKind::Vhs => {
                    for aperture in ["apermag4", "apermag6", "petromag"] {
                        columns.push(format!("{}{}", b, aperture));
                        columns.push(format!("{}{}err", b, aperture));
                    }
                }
                CatalogKind::Kids => {
                    columns.push("mag_i_kids".to_string());
                    columns.push("mag_err_i_kids".to_string());
                }
                CatalogKind::Ls10 => {
                    columns.push(band.flux_column());
                    columns.push(band.flux_err_column());
                }
                CatalogKind::Hsc => {
                    for col in ["i_psfflux_flux", "i_psfflux_fluxerr", "i_cmodel_flux", "i_cmodel_fluxerr"] {
                        columns.push(col.to_string());
                    }
                }
                CatalogKind::OptAgn | CatalogKind::XrayAgn | CatalogKind::Eros => {}
            }
        }
        let mut seen = std::collections::HashSet::new();
        columns.retain(|c| seen.insert(c.clone()));
        columns
    }

    /// Select and rename this catalog's columns into the shared schema
    pub fn normalize(&self, raw: Table, options: &NormalizeOptions) -> Result<Table> {
        let table = raw.renamed(self.name());
        let table = match self {
            CatalogKind::OptAgn => normalize_opt_agn(table, options)?,
            CatalogKind::XrayAgn => {
                let table = ColumnMap::new(&[("ctp_ls8_ra", "ra"), ("ctp_ls8_dec", "dec")], &["ra", "dec"]).apply(table)?;
                let table = within_region(table, options.region)?;
                let n = table.n_rows();
                table.with_column("agn_sel", Column::Int(vec![Some(2); n]))?
            }
            CatalogKind::Sweep => normalize_sweep(table, options.bands)?,
            CatalogKind::Ls10 => ColumnMap::new(
                &[
                    ("ctp_ls8_ra", "ra"),
                    ("ctp_ls8_dec", "dec"),
                    ("lu_flux_i", "c_flux_i_ls10"),
                    ("lu_flux_i_err", "c_flux_err_i_ls10"),
                ],
                &["ra", "dec", "c_flux_i_ls10", "c_flux_err_i_ls10"],
            )
            .apply(table)?,
            CatalogKind::Galex => ColumnMap::new(
                &[
                    ("raj2000", "ra"),
                    ("dej2000", "dec"),
                    ("fflux", "fuv_flux"),
                    ("e_fflux", "fuv_flux_err"),
                    ("nflux", "nuv_flux"),
                    ("e_nflux", "nuv_flux_err"),
                    ("e(b-v)", "ebv_galex"),
                    ("prob", "galex_matchprob"),
                ],
                &["ra", "dec", "fuv_flux", "fuv_flux_err", "nuv_flux", "nuv_flux_err", "ebv_galex", "galex_matchprob"],
            )
            .apply(table)?,
            CatalogKind::Kids => ColumnMap::new(
                &[
                    ("raj2000", "ra"),
                    ("decj2000", "dec"),
                    ("class_star", "kids_class"),
                    ("z_b", "z_best_kids"),
                    ("odds", "z_qual_kids"),
                    ("mag_gaap_i", "mag_i_kids"),
                    ("magerr_gaap_i", "mag_err_i_kids"),
                    ("extinction_i", "ext_i"),
                ],
                &["ra", "dec", "kids_class", "z_best_kids", "z_qual_kids", "mag_i_kids", "mag_err_i_kids", "ext_i"],
            )
            .apply(table)?,
            CatalogKind::Hsc => normalize_hsc(table)?,
            CatalogKind::Vhs => normalize_vhs(table, options.bands)?,
            CatalogKind::Eros => normalize_eros(table)?,
        };
        Ok(table)
    }
}

impl fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CatalogKind {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        CatalogKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PipelineError::UnknownCatalog(s.to_string()))
    }
}

/// Settings the normalizers need besides the raw table
#[derive(Debug, Clone)]
pub struct NormalizeOptions<'a> {
    pub bands: &'a BandRegistry,
    pub region: SkyRegion,
    /// Minimum random-forest probability for optical AGN candidates
    pub min_agn_probability: f64,
}

/// Renames followed by a column selection
///
/// `keep` lists names after renaming; the output has exactly these columns.
#[derive(Debug, Clone, Default)]
pub struct ColumnMap {
    pub renames: Vec<(String, String)>,
    pub keep: Vec<String>,
}

impl ColumnMap {
    pub fn new(renames: &[(&str, &str)], keep: &[&str]) -> Self {
        Self {
            renames: renames.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect(),
            keep: keep.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn apply(&self, table: Table) -> Result<Table> {
        let pairs: Vec<(&str, &str)> = self.renames.iter().map(|(a, b)| (a.as_str(), b.as_str())).collect();
        table.rename_columns(&pairs)?.keep_columns(&self.keep)
    }
}

fn within_region(table: Table, region: SkyRegion) -> Result<Table> {
    let ra = table.numbers("ra")?;
    let dec = table.numbers("dec")?;
    let before = table.n_rows();
    let table = table.filter_by(|i| match (ra[i], dec[i]) {
        (Some(r), Some(d)) => SkyPosition::new(r, d).within(&region),
        _ => false,
    });
    tracing::debug!("{}: {} of {} rows inside the survey footprint", table.name(), table.n_rows(), before);
    Ok(table)
}

fn normalize_opt_agn(table: Table, options: &NormalizeOptions) -> Result<Table> {
    let prob = table
        .resolve("prob_rf")
        .map(str::to_string)
        .ok_or_else(|| PipelineError::missing_column(table.name(), "prob_rf"))?;
    let prob = table.numbers(&prob)?;

    let before = table.n_rows();
    let table = table.filter_by(|i| prob[i].map_or(false, |p| p >= options.min_agn_probability));
    tracing::info!(
        "Discarding {} unreliable sources from the optical agn catalogue.",
        before - table.n_rows()
    );

    let table = table.keep_columns(&["ra", "dec", "phot_z", "prob_rf"])?;
    let table = within_region(table, options.region)?;
    let table = table.rename_columns(&[("phot_z", "opt_agn_phot_z"), ("prob_rf", "opt_agn_prob_rf")])?;
    let n = table.n_rows();
    table.with_column("agn_sel", Column::Int(vec![Some(1); n]))
}

fn normalize_sweep(table: Table, bands: &BandRegistry) -> Result<Table> {
    let mut parts = Vec::new();
    for name in ["release", "brickid", "objid"] {
        let actual = table
            .resolve(name)
            .ok_or_else(|| PipelineError::missing_column(table.name(), name))?;
        parts.push(table.column(actual)?);
    }
    let ident: Vec<Option<String>> = (0..table.n_rows())
        .map(|row| Some(parts.iter().map(|c| c.render(row).unwrap_or_default()).collect::<String>()))
        .collect();
    let table = table.with_column("sweep_ident", Column::Text(ident))?;

    let mut keep: Vec<String> = [
        "ra", "dec", "ra_ivar", "dec_ivar", "type", "ebv", "ref_cat", "ref_id", "sweep_ident", "maskbits", "fitbits",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for band in bands.for_catalog(CatalogKind::Sweep) {
        let b = band.name.to_lowercase();
        keep.push(format!("flux_{}", b));
        keep.push(format!("flux_ivar_{}", b));
        keep.push(format!("mw_transmission_{}", b));
    }
    table.keep_columns(&keep)
}

fn normalize_hsc(table: Table) -> Result<Table> {
    let table = table.keep_columns(&[
        "ra",
        "dec",
        "i_psfflux_flux",
        "i_psfflux_fluxerr",
        "i_cmodel_flux",
        "i_cmodel_fluxerr",
        "i_filterfraction_weighted",
        "a_i",
    ])?;
    let cmodel = table.numbers("i_cmodel_flux")?;
    let psf = table.numbers("i_psfflux_flux")?;
    Ok(table.filter_by(|i| cmodel[i].is_some() && psf[i].is_some()))
}

fn normalize_vhs(table: Table, bands: &BandRegistry) -> Result<Table> {
    let mut keep: Vec<String> = ["ra", "dec", "pstar", "pgalaxy", "ebv"].iter().map(|s| s.to_string()).collect();
    for band in bands.for_catalog(CatalogKind::Vhs) {
        let b = band.name.to_lowercase();
        for aperture in ["petromag", "apermag4", "apermag6"] {
            keep.push(format!("{}{}", b, aperture));
            keep.push(format!("{}{}err", b, aperture));
        }
        keep.push(format!("a{}", b));
    }
    table.keep_columns(&keep)
}

fn normalize_eros(table: Table) -> Result<Table> {
    let table = ColumnMap::new(
        &[
            ("ctp_ls8_ra", "ra_eros"),
            ("ctp_ls8_dec", "dec_eros"),
            ("specz_redshift", "ZSPEC"),
            ("specz_normq", "ZSPEC_QUAL"),
        ],
        &["ctp_quality", "ra_eros", "dec_eros", "ctp_redshift", "ctp_redshift_grade", "ZSPEC", "ZSPEC_QUAL"],
    )
    .apply(table)?;

    // Some redshift cells are blank or non-numeric strings
    let zspec: Vec<Option<f64>> = match table.column("ZSPEC")? {
        Column::Text(v) => v
            .iter()
            .map(|c| Some(c.as_deref().and_then(|s| s.trim().parse().ok()).unwrap_or(SENTINEL)))
            .collect(),
        other => (0..table.n_rows()).map(|i| Some(other.number(i).unwrap_or(SENTINEL))).collect(),
    };
    table.with_column("ZSPEC", Column::Float(zspec))
}
