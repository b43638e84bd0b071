//! Conversion of native survey photometry to cgs flux densities
//!
//! Every band ends up as a pair of columns `c_flux_<band>` and
//! `c_flux_err_<band>` in erg s^-1 cm^-2 Hz^-1. A cell that cannot be
//! converted (absent input, non-physical value) becomes the sentinel in both
//! columns; nothing at cell level is an error.

use crate::bands::{Band, BandRegistry};
use crate::catalog::CatalogKind;
use crate::error::{PipelineError, Result};
use crate::events::{PipelineEvent, PipelineObserver};
use crate::table::{Column, Table};
use serde::{Deserialize, Serialize};
use skyfuse_core::constants::{
    HSC_I2_MIN_FRACTION, HSC_I_MAX_FRACTION, MICROJANSKY_EXPONENT, NANOJANSKY_CGS, NANOMAGGY_CGS, SENTINEL,
};
use skyfuse_core::photometry::{ab_mag_measurement, power_law_extinction_factor, present, vega_to_ab};
use skyfuse_core::FluxMeasurement;
use std::fmt;

/// Morphological class of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Morphology {
    Pointlike,
    Extended,
}

impl Morphology {
    pub const ALL: [Morphology; 2] = [Morphology::Pointlike, Morphology::Extended];

    pub fn name(&self) -> &'static str {
        match self {
            Morphology::Pointlike => "pointlike",
            Morphology::Extended => "extended",
        }
    }

    /// Sweep model type: only `PSF` is point-like
    pub fn from_sweep_type(kind: Option<&str>) -> Self {
        match kind.map(str::trim) {
            Some("PSF") => Morphology::Pointlike,
            _ => Morphology::Extended,
        }
    }

    /// VHS aperture used for this class
    fn vhs_aperture(&self) -> &'static str {
        match self {
            Morphology::Pointlike => "apermag4",
            Morphology::Extended => "apermag6",
        }
    }

    fn hsc_flux_prefix(&self) -> &'static str {
        match self {
            Morphology::Pointlike => "i_psfflux",
            Morphology::Extended => "i_cmodel",
        }
    }

    fn other(&self) -> Morphology {
        match self {
            Morphology::Pointlike => Morphology::Extended,
            Morphology::Extended => Morphology::Pointlike,
        }
    }
}

impl fmt::Display for Morphology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn mag_column(band: &str) -> String {
    format!("c_mag_{}", band)
}

pub fn mag_err_column(band: &str) -> String {
    format!("c_mag_err_{}", band)
}

/// Partition a merged table by the sweep `type` column
///
/// Adds a `Type` column and drops the aperture columns only the other class uses.
pub fn split_by_morphology(table: Table, bands: &BandRegistry) -> Result<(Table, Table)> {
    let kinds: Vec<Morphology> = match table.resolve("type") {
        Some(name) => {
            let name = name.to_string();
            table.text(&name)?.iter().map(|t| Morphology::from_sweep_type(t.as_deref())).collect()
        }
        None => return Err(PipelineError::missing_column(table.name(), "type")),
    };

    let part = |morphology: Morphology| -> Result<Table> {
        let mask: Vec<bool> = kinds.iter().map(|k| *k == morphology).collect();
        let n = mask.iter().filter(|m| **m).count();
        let unused = aperture_columns(morphology.other(), bands);
        let unused: Vec<&str> = unused.iter().map(String::as_str).collect();
        table
            .clone()
            .filter_rows(&mask)
            .without_columns(&unused)
            .with_column("Type", Column::Text(vec![Some(morphology.name().to_string()); n]))
            .map(|t| t.renamed(format!("{}_{}", table.name(), morphology)))
    };

    Ok((part(Morphology::Pointlike)?, part(Morphology::Extended)?))
}

fn aperture_columns(morphology: Morphology, bands: &BandRegistry) -> Vec<String> {
    let mut columns = Vec::new();
    for band in bands.for_catalog(CatalogKind::Vhs) {
        let b = band.name.to_lowercase();
        columns.push(format!("{}{}", b, morphology.vhs_aperture()));
        columns.push(format!("{}{}err", b, morphology.vhs_aperture()));
    }
    let prefix = morphology.hsc_flux_prefix();
    columns.push(format!("{}_flux", prefix));
    columns.push(format!("{}_fluxerr", prefix));
    columns
}

/// Per-band conversion output
#[derive(Debug, Clone, PartialEq)]
pub struct BandPhotometry {
    pub fluxes: Vec<FluxMeasurement>,
    /// Corrected AB magnitudes, for magnitude-native bands
    pub magnitudes: Option<Vec<FluxMeasurement>>,
}

impl BandPhotometry {
    fn fluxes(fluxes: Vec<FluxMeasurement>) -> Self {
        Self { fluxes, magnitudes: None }
    }

    pub fn valid(&self) -> usize {
        self.fluxes.iter().filter(|m| m.is_valid()).count()
    }
}

fn lower(band: &Band) -> String {
    band.name.to_lowercase()
}

impl CatalogKind {
    /// Whether bands can be attached to this catalog
    pub fn provides_photometry(&self) -> bool {
        !matches!(self, CatalogKind::OptAgn | CatalogKind::XrayAgn | CatalogKind::Eros)
    }

    /// Convert one band of this catalog for one morphological class
    pub fn correct(&self, table: &Table, band: &Band, morphology: Morphology) -> Result<BandPhotometry> {
        let n = table.n_rows();
        match self {
            CatalogKind::Sweep => {
                let b = lower(band);
                let flux = table.numbers(&format!("flux_{}", b))?;
                let ivar = table.numbers(&format!("flux_ivar_{}", b))?;
                let trans = table.numbers(&format!("mw_transmission_{}", b))?;
                Ok(BandPhotometry::fluxes(
                    (0..n).map(|i| nanomaggy_flux(flux[i], ivar[i], trans[i])).collect(),
                ))
            }
            CatalogKind::Galex => {
                let b = lower(band);
                let flux = table.numbers(&format!("{}_flux", b))?;
                let err = table.numbers(&format!("{}_flux_err", b))?;
                let ebv = table.numbers("ebv_galex")?;
                let k = band.extinction_coeff.unwrap_or(0.0);
                Ok(BandPhotometry::fluxes(
                    (0..n)
                        .map(|i| match (present(flux[i]), present(err[i]), present(ebv[i])) {
                            (Some(f), Some(e), Some(ebv)) => {
                                let factor = power_law_extinction_factor(k, ebv, MICROJANSKY_EXPONENT);
                                FluxMeasurement::new(f * factor, e * factor)
                            }
                            _ => FluxMeasurement::ABSENT,
                        })
                        .collect(),
                ))
            }
            CatalogKind::Kids => {
                let mag = table.numbers(&format!("mag_{}", band.name))?;
                let err = table.numbers(&format!("mag_err_{}", band.name))?;
                Ok(BandPhotometry::fluxes((0..n).map(|i| ab_mag_measurement(mag[i], err[i])).collect()))
            }
            CatalogKind::Hsc => {
                let prefix = morphology.hsc_flux_prefix();
                let flux = table.numbers(&format!("{}_flux", prefix))?;
                let err = table.numbers(&format!("{}_fluxerr", prefix))?;
                let fraction = table.numbers("i_filterfraction_weighted")?;
                let second_filter = band.name.starts_with("i2");
                Ok(BandPhotometry::fluxes(
                    (0..n)
                        .map(|i| {
                            let selected = match present(fraction[i]) {
                                Some(w) if second_filter => w >= HSC_I2_MIN_FRACTION,
                                Some(w) => w <= HSC_I_MAX_FRACTION,
                                None => false,
                            };
                            match (selected, present(flux[i]), present(err[i])) {
                                (true, Some(f), Some(e)) => FluxMeasurement::new(f, e).scaled(NANOJANSKY_CGS),
                                _ => FluxMeasurement::ABSENT,
                            }
                        })
                        .collect(),
                ))
            }
            CatalogKind::Vhs => {
                let b = lower(band);
                let aperture = morphology.vhs_aperture();
                let mag = table.numbers(&format!("{}{}", b, aperture))?;
                let err = table.numbers(&format!("{}{}err", b, aperture))?;
                let ext = table.numbers(&format!("a{}", b))?;
                let offset = band.ab_offset.ok_or_else(|| {
                    PipelineError::Configuration(format!("Vega band '{}' needs an ab_offset", band.name))
                })?;

                let mut fluxes = Vec::with_capacity(n);
                let mut mags = Vec::with_capacity(n);
                for i in 0..n {
                    match (present(mag[i]), present(err[i]), present(ext[i])) {
                        (Some(m), Some(e), Some(a)) if m > 0.0 && e >= 0.0 && a >= 0.0 => {
                            let ab = vega_to_ab(m, offset, a);
                            fluxes.push(ab_mag_measurement(Some(ab), Some(e)));
                            mags.push(FluxMeasurement::new(ab, e));
                        }
                        _ => {
                            fluxes.push(FluxMeasurement::ABSENT);
                            mags.push(FluxMeasurement::ABSENT);
                        }
                    }
                }
                Ok(BandPhotometry { fluxes, magnitudes: Some(mags) })
            }
            CatalogKind::Ls10 => {
                let flux = table.numbers(&band.flux_column())?;
                let err = table.numbers(&band.flux_err_column())?;
                Ok(BandPhotometry::fluxes(
                    (0..n)
                        .map(|i| match (present(flux[i]), present(err[i])) {
                            (Some(f), Some(e)) => FluxMeasurement::new(f, e),
                            _ => FluxMeasurement::ABSENT,
                        })
                        .collect(),
                ))
            }
            CatalogKind::OptAgn | CatalogKind::XrayAgn | CatalogKind::Eros => Err(PipelineError::Configuration(
                format!("catalog {} has no photometry for band '{}'", self, band.name),
            )),
        }
    }
}

/// Nanomaggy flux with inverse-variance error, de-reddened by the transmission
fn nanomaggy_flux(flux: Option<f64>, ivar: Option<f64>, transmission: Option<f64>) -> FluxMeasurement {
    match (present(flux), present(ivar), present(transmission)) {
        (Some(f), Some(iv), Some(t)) if iv > 0.0 && t > 0.0 => {
            FluxMeasurement::new(f / t * NANOMAGGY_CGS, 1.0 / iv.sqrt() / t * NANOMAGGY_CGS)
        }
        _ => FluxMeasurement::ABSENT,
    }
}

fn pair_columns(values: &[FluxMeasurement]) -> (Column, Column) {
    (
        Column::Float(values.iter().map(|m| Some(m.flux)).collect()),
        Column::Float(values.iter().map(|m| Some(m.error)).collect()),
    )
}

/// Applies the per-catalog conversion to every registered band
pub struct PhotometricCorrector<'a> {
    bands: &'a BandRegistry,
    observer: &'a dyn PipelineObserver,
}

impl<'a> PhotometricCorrector<'a> {
    pub fn new(bands: &'a BandRegistry, observer: &'a dyn PipelineObserver) -> Self {
        Self { bands, observer }
    }

    /// Add `c_flux_<band>`/`c_flux_err_<band>` for every band
    ///
    /// A band whose input columns are missing gets sentinel columns and a
    /// `BandSkipped` event; the other bands are unaffected.
    pub fn correct(&self, table: Table, morphology: Morphology) -> Result<Table> {
        let n = table.n_rows();
        let mut table = table;

        for band in self.bands.iter() {
            let photometry = match band.catalog.correct(&table, band, morphology) {
                Ok(p) => p,
                Err(PipelineError::MissingColumn { column, .. }) => {
                    self.observer.on_event(&PipelineEvent::BandSkipped {
                        band: band.name.clone(),
                        morphology,
                        reason: format!("column '{}' is missing", column),
                    });
                    BandPhotometry::fluxes(vec![FluxMeasurement::ABSENT; n])
                }
                Err(e) => return Err(e),
            };

            self.observer.on_event(&PipelineEvent::BandCorrected {
                band: band.name.clone(),
                morphology,
                valid: photometry.valid(),
                rows: n,
            });

            let (flux, err) = pair_columns(&photometry.fluxes);
            table = table.with_column(band.flux_column(), flux)?.with_column(band.flux_err_column(), err)?;

            if let Some(mags) = &photometry.magnitudes {
                let (mag, mag_err) = pair_columns(mags);
                table = table.with_column(mag_column(&band.name), mag)?.with_column(mag_err_column(&band.name), mag_err)?;
            }
        }
        Ok(table)
    }
}

/// True when both entries of every corrected pair agree on validity
pub fn sentinel_pairs_consistent(table: &Table, bands: &BandRegistry) -> Result<bool> {
    for band in bands.iter() {
        let flux = table.float(&band.flux_column())?;
        let err = table.float(&band.flux_err_column())?;
        let consistent = flux
            .iter()
            .zip(err)
            .all(|(f, e)| (*f == Some(SENTINEL)) == (*e == Some(SENTINEL)));
        if !consistent {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingObserver;
    use approx::assert_relative_eq;
    use skyfuse_core::photometry::ab_mag_to_flux;

    fn floats(values: &[Option<f64>]) -> Column {
        Column::Float(values.to_vec())
    }

    fn band(registry: &BandRegistry, name: &str) -> Band {
        registry.get(name).cloned().unwrap()
    }

    #[test]
    fn test_sweep_conversion() {
        let bands = BandRegistry::default();
        let table = Table::from_columns(
            "t",
            vec![
                ("flux_g".to_string(), floats(&[Some(10.0), Some(10.0), Some(10.0), None])),
                ("flux_ivar_g".to_string(), floats(&[Some(4.0), Some(0.0), Some(4.0), Some(4.0)])),
                ("mw_transmission_g".to_string(), floats(&[Some(0.5), Some(0.5), Some(0.0), Some(0.5)])),
            ],
        )
        .unwrap();

        let out = CatalogKind::Sweep.correct(&table, &band(&bands, "g"), Morphology::Pointlike).unwrap();
        assert_relative_eq!(out.fluxes[0].flux, 20.0 * 3.631e-29, max_relative = 1e-12);
        assert_relative_eq!(out.fluxes[0].error, 1.0 * 3.631e-29, max_relative = 1e-12);
        assert_eq!(out.fluxes[1], FluxMeasurement::ABSENT);
        assert_eq!(out.fluxes[2], FluxMeasurement::ABSENT);
        assert_eq!(out.fluxes[3], FluxMeasurement::ABSENT);
    }

    #[test]
    fn test_galex_extinction() {
        let bands = BandRegistry::default();
        let table = Table::from_columns(
            "t",
            vec![
                ("fuv_flux".to_string(), floats(&[Some(2.0), Some(SENTINEL)])),
                ("fuv_flux_err".to_string(), floats(&[Some(0.5), Some(0.5)])),
                ("ebv_galex".to_string(), floats(&[Some(0.1), Some(0.1)])),
            ],
        )
        .unwrap();

        let out = CatalogKind::Galex.correct(&table, &band(&bands, "FUV"), Morphology::Extended).unwrap();
        let factor = 10f64.powf(8.06 * 0.1 / 2.5 - 29.0);
        assert_relative_eq!(out.fluxes[0].flux, 2.0 * factor, max_relative = 1e-12);
        assert_relative_eq!(out.fluxes[0].error, 0.5 * factor, max_relative = 1e-12);
        assert_eq!(out.fluxes[1], FluxMeasurement::ABSENT);
    }

    #[test]
    fn test_kids_rejects_non_positive_magnitudes() {
        let bands = BandRegistry::default();
        let table = Table::from_columns(
            "t",
            vec![
                ("mag_i_kids".to_string(), floats(&[Some(21.0), Some(0.0), Some(21.0)])),
                ("mag_err_i_kids".to_string(), floats(&[Some(0.1), Some(0.1), Some(-0.1)])),
            ],
        )
        .unwrap();

        let out = CatalogKind::Kids.correct(&table, &band(&bands, "i_kids"), Morphology::Pointlike).unwrap();
        let flux = ab_mag_to_flux(21.0);
        assert_relative_eq!(out.fluxes[0].flux, flux, max_relative = 1e-12);
        assert_relative_eq!(out.fluxes[0].error, flux * std::f64::consts::LN_10 * 0.4 * 0.1, max_relative = 1e-12);
        assert!(!out.fluxes[1].is_valid());
        assert!(!out.fluxes[2].is_valid());
    }

    #[test]
    fn test_hsc_filter_fraction_split() {
        let bands = BandRegistry::default();
        let table = Table::from_columns(
            "t",
            vec![
                ("i_psfflux_flux".to_string(), floats(&[Some(100.0), Some(100.0), Some(100.0)])),
                ("i_psfflux_fluxerr".to_string(), floats(&[Some(5.0), Some(5.0), Some(5.0)])),
                ("i_filterfraction_weighted".to_string(), floats(&[Some(0.9), Some(0.1), Some(0.5)])),
            ],
        )
        .unwrap();

        let i = CatalogKind::Hsc.correct(&table, &band(&bands, "i_hsc"), Morphology::Pointlike).unwrap();
        let i2 = CatalogKind::Hsc.correct(&table, &band(&bands, "i2_hsc"), Morphology::Pointlike).unwrap();
        assert!(!i.fluxes[0].is_valid());
        assert_relative_eq!(i2.fluxes[0].flux, 100.0e-32, max_relative = 1e-12);
        assert_relative_eq!(i.fluxes[1].flux, 100.0e-32, max_relative = 1e-12);
        assert!(!i2.fluxes[1].is_valid());
        assert!(!i.fluxes[2].is_valid() && !i2.fluxes[2].is_valid());

        // extended sources read the cmodel columns, which this table lacks
        let err = CatalogKind::Hsc.correct(&table, &band(&bands, "i_hsc"), Morphology::Extended).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_vhs_vega_to_ab() {
        let bands = BandRegistry::default();
        let table = Table::from_columns(
            "t",
            vec![
                ("japermag4".to_string(), floats(&[Some(15.0), Some(15.0), Some(-1.0)])),
                ("japermag4err".to_string(), floats(&[Some(0.02), Some(0.02), Some(0.02)])),
                ("aj".to_string(), floats(&[Some(0.05), Some(-0.01), Some(0.05)])),
            ],
        )
        .unwrap();

        let out = CatalogKind::Vhs.correct(&table, &band(&bands, "J"), Morphology::Pointlike).unwrap();
        let mags = out.magnitudes.clone().unwrap();
        assert_relative_eq!(mags[0].flux, 15.966, epsilon = 1e-12);
        assert_relative_eq!(mags[0].error, 0.02, epsilon = 1e-12);
        assert_relative_eq!(out.fluxes[0].flux, 10f64.powf(-(15.966 + 48.6) / 2.5), max_relative = 1e-9);
        assert!(!out.fluxes[1].is_valid());
        assert!(!out.fluxes[2].is_valid());
        assert!(!mags[2].is_valid());
    }

    #[test]
    fn test_vhs_extended_uses_wide_aperture() {
        let bands = BandRegistry::default();
        let table = Table::from_columns(
            "t",
            vec![
                ("japermag6".to_string(), floats(&[Some(14.5), Some(14.5)])),
                ("japermag6err".to_string(), floats(&[Some(0.03), Some(-0.5)])),
                ("aj".to_string(), floats(&[Some(0.05), Some(0.05)])),
            ],
        )
        .unwrap();

        let out = CatalogKind::Vhs.correct(&table, &band(&bands, "J"), Morphology::Extended).unwrap();
        let mags = out.magnitudes.clone().unwrap();
        assert_relative_eq!(mags[0].flux, 14.5 + 0.916 + 0.05, epsilon = 1e-12);
        assert_relative_eq!(mags[0].error, 0.03, epsilon = 1e-12);

        let flux = 10f64.powf(-(15.466 + 48.6) / 2.5);
        assert_relative_eq!(out.fluxes[0].flux, flux, max_relative = 1e-9);
        assert_relative_eq!(out.fluxes[0].error, flux * std::f64::consts::LN_10 * 0.4 * 0.03, max_relative = 1e-9);
        assert_eq!(out.fluxes[1], FluxMeasurement::ABSENT);
        assert_eq!(mags[1], FluxMeasurement::ABSENT);

        // the point-like aperture is not present in this table
        let err = CatalogKind::Vhs.correct(&table, &band(&bands, "J"), Morphology::Pointlike).unwrap_err();
        assert!(matches!(err, PipelineError::MissingColumn { .. }));
    }

    #[test]
    fn test_hsc_extended_uses_cmodel() {
        let bands = BandRegistry::default();
        let table = Table::from_columns(
            "t",
            vec![
                ("i_cmodel_flux".to_string(), floats(&[Some(250.0), Some(400.0), Some(SENTINEL)])),
                ("i_cmodel_fluxerr".to_string(), floats(&[Some(12.0), Some(20.0), Some(20.0)])),
                ("i_filterfraction_weighted".to_string(), floats(&[Some(0.9), Some(0.1), Some(0.9)])),
            ],
        )
        .unwrap();

        let i = CatalogKind::Hsc.correct(&table, &band(&bands, "i_hsc"), Morphology::Extended).unwrap();
        let i2 = CatalogKind::Hsc.correct(&table, &band(&bands, "i2_hsc"), Morphology::Extended).unwrap();
        assert!(i2.magnitudes.is_none());

        assert_relative_eq!(i2.fluxes[0].flux, 250.0e-32, max_relative = 1e-12);
        assert_relative_eq!(i2.fluxes[0].error, 12.0e-32, max_relative = 1e-12);
        assert!(!i.fluxes[0].is_valid());

        assert_relative_eq!(i.fluxes[1].flux, 400.0e-32, max_relative = 1e-12);
        assert_relative_eq!(i.fluxes[1].error, 20.0e-32, max_relative = 1e-12);
        assert!(!i2.fluxes[1].is_valid());

        assert_eq!(i2.fluxes[2], FluxMeasurement::ABSENT);
    }

    #[test]
    fn test_missing_band_columns_are_skipped() {
        let bands = BandRegistry::default();
        let observer = RecordingObserver::new();
        let table = Table::from_columns(
            "t",
            vec![
                ("mag_i_kids".to_string(), floats(&[Some(21.0)])),
                ("mag_err_i_kids".to_string(), floats(&[Some(0.1)])),
            ],
        )
        .unwrap();

        let corrected = PhotometricCorrector::new(&bands, &observer).correct(table, Morphology::Extended).unwrap();
        assert!(corrected.float("c_flux_i_kids").unwrap()[0].unwrap() > 0.0);
        assert_eq!(corrected.float("c_flux_g").unwrap(), &[Some(SENTINEL)]);
        assert_eq!(corrected.float("c_flux_err_J").unwrap(), &[Some(SENTINEL)]);
        assert!(sentinel_pairs_consistent(&corrected, &bands).unwrap());

        let skipped = observer
            .events()
            .iter()
            .filter(|e| matches!(e, PipelineEvent::BandSkipped { .. }))
            .count();
        assert_eq!(skipped, bands.len() - 1);
    }

    #[test]
    fn test_correction_is_idempotent() {
        let bands = BandRegistry::default();
        let observer = RecordingObserver::new();
        let table = Table::from_columns(
            "t",
            vec![
                ("mag_i_kids".to_string(), floats(&[Some(21.0), None])),
                ("mag_err_i_kids".to_string(), floats(&[Some(0.1), Some(0.1)])),
            ],
        )
        .unwrap();

        let corrector = PhotometricCorrector::new(&bands, &observer);
        let once = corrector.correct(table.clone(), Morphology::Pointlike).unwrap();
        let twice = corrector.correct(once.clone(), Morphology::Pointlike).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_split_by_morphology() {
        let bands = BandRegistry::default();
        let table = Table::from_columns(
            "merged",
            vec![
                ("type".to_string(), Column::Text(vec![Some("PSF".into()), Some("REX".into()), None])),
                ("japermag4".to_string(), floats(&[Some(15.0), Some(16.0), Some(17.0)])),
                ("japermag6".to_string(), floats(&[Some(14.9), Some(15.9), Some(16.9)])),
                ("i_cmodel_flux".to_string(), floats(&[Some(1.0), Some(2.0), Some(3.0)])),
            ],
        )
        .unwrap();

        let (pointlike, extended) = split_by_morphology(table, &bands).unwrap();
        assert_eq!(pointlike.n_rows(), 1);
        assert_eq!(extended.n_rows(), 2);
        assert!(pointlike.has_column("japermag4"));
        assert!(!pointlike.has_column("japermag6"));
        assert!(!pointlike.has_column("i_cmodel_flux"));
        assert!(extended.has_column("japermag6"));
        assert!(!extended.has_column("japermag4"));
        assert_eq!(extended.text("Type").unwrap()[1], Some("extended".to_string()));
    }
}
