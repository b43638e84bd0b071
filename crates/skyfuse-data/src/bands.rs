//! Photometric band registry
//!
//! The registry order is the canonical band ordering: bit `i` of a context
//! mask always refers to the `i`-th registered band, so the order is part of
//! the configuration and never derived from data.

use crate::catalog::CatalogKind;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use skyfuse_core::constants::{K_FUV, K_NUV, VEGA_AB_H, VEGA_AB_J, VEGA_AB_KS};

/// Native representation of a band's photometry in its source catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhotometricSystem {
    /// Linear flux in nanomaggies with inverse-variance errors
    Nanomaggy,
    MicroJansky,
    Nanojansky,
    AbMagnitude,
    VegaMagnitude,
    /// Already erg s^-1 cm^-2 Hz^-1
    Cgs,
}

/// Band definition as written in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandDef {
    pub name: String,
    pub catalog: String,
    pub system: PhotometricSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ab_offset: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extinction_coeff: Option<f64>,
    pub color: String,
    pub label: String,
}

/// Band with its catalog resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub catalog: CatalogKind,
    pub system: PhotometricSystem,
    pub ab_offset: Option<f64>,
    pub extinction_coeff: Option<f64>,
    pub color: String,
    pub label: String,
}

impl Band {
    pub fn flux_column(&self) -> String {
        flux_column(&self.name)
    }

    pub fn flux_err_column(&self) -> String {
        flux_err_column(&self.name)
    }
}

/// Corrected flux column for a band, e.g. `c_flux_J`
pub fn flux_column(band: &str) -> String {
    format!("c_flux_{}", band)
}

pub fn flux_err_column(band: &str) -> String {
    format!("c_flux_err_{}", band)
}

/// Largest number of bands a context mask can address
pub const MAX_BANDS: usize = 62;

/// Ordered, closed set of bands
#[derive(Debug, Clone, PartialEq)]
pub struct BandRegistry {
    bands: Vec<Band>,
}

impl BandRegistry {
    pub fn from_defs(defs: &[BandDef]) -> Result<Self> {
        if defs.len() > MAX_BANDS {
            return Err(PipelineError::Configuration(format!(
                "{} bands configured, a context mask holds at most {}",
                defs.len(),
                MAX_BANDS
            )));
        }

        let mut bands: Vec<Band> = Vec::with_capacity(defs.len());
        for def in defs {
            if bands.iter().any(|b| b.name == def.name) {
                return Err(PipelineError::Configuration(format!("band '{}' defined twice", def.name)));
            }
            if def.system == PhotometricSystem::VegaMagnitude && def.ab_offset.is_none() {
                return Err(PipelineError::Configuration(format!(
                    "Vega band '{}' needs an ab_offset",
                    def.name
                )));
            }
            bands.push(Band {
                name: def.name.clone(),
                catalog: def.catalog.parse()?,
                system: def.system,
                ab_offset: def.ab_offset,
                extinction_coeff: def.extinction_coeff,
                color: def.color.clone(),
                label: def.label.clone(),
            });
        }
        Ok(Self { bands })
    }

    pub fn len(&self) -> usize { self.bands.len() }
    pub fn is_empty(&self) -> bool { self.bands.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = &Band> { self.bands.iter() }

    pub fn get(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|b| b.name == name)
    }

    /// Look up a band, failing with a configuration error when it is not registered
    pub fn require(&self, name: &str) -> Result<&Band> {
        self.get(name).ok_or_else(|| PipelineError::MissingBand(name.to_string()))
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.bands.iter().position(|b| b.name == name)
    }

    /// Bands supplied by one catalog, in canonical order
    pub fn for_catalog(&self, kind: CatalogKind) -> impl Iterator<Item = &Band> {
        self.bands.iter().filter(move |b| b.catalog == kind)
    }

    /// Context mask for a set of excluded bands: -1 when nothing is excluded,
    /// otherwise the sum of 2^i over the excluded bands' canonical indices
    pub fn context<S: AsRef<str>>(&self, excluded: &[S]) -> Result<i64> {
        if excluded.is_empty() {
            return Ok(-1);
        }
        let mut mask = 0i64;
        for name in excluded {
            let i = self
                .index_of(name.as_ref())
                .ok_or_else(|| PipelineError::MissingBand(name.as_ref().to_string()))?;
            mask |= 1i64 << i;
        }
        Ok(mask)
    }

    /// Default registry for the eFEDS photometry
    pub fn default_defs() -> Vec<BandDef> {
        fn def(name: &str, catalog: &str, system: PhotometricSystem, color: &str, label: &str) -> BandDef {
            BandDef {
                name: name.to_string(),
                catalog: catalog.to_string(),
                system,
                ab_offset: None,
                extinction_coeff: None,
                color: color.to_string(),
                label: label.to_string(),
            }
        }
        use PhotometricSystem::*;

        vec![
            BandDef { extinction_coeff: Some(K_FUV), ..def("FUV", "galex", MicroJansky, "violet", "FUV") },
            BandDef { extinction_coeff: Some(K_NUV), ..def("NUV", "galex", MicroJansky, "violet", "NUV") },
            def("g", "sweep", Nanomaggy, "green", "g"),
            def("r", "sweep", Nanomaggy, "green", "r"),
            def("i_hsc", "hsc", Nanojansky, "red", "i (HSC)"),
            def("i2_hsc", "hsc", Nanojansky, "red", "i2 (HSC)"),
            def("i_kids", "kids", AbMagnitude, "orange", "i (KiDS)"),
            def("i_ls10", "ls10", Cgs, "olive", "i (LS10)"),
            def("z", "sweep", Nanomaggy, "green", "z"),
            BandDef { ab_offset: Some(VEGA_AB_J), ..def("J", "vhs", VegaMagnitude, "brown", "J") },
            BandDef { ab_offset: Some(VEGA_AB_H), ..def("H", "vhs", VegaMagnitude, "brown", "H") },
            BandDef { ab_offset: Some(VEGA_AB_KS), ..def("Ks", "vhs", VegaMagnitude, "brown", "Ks") },
            def("W1", "sweep", Nanomaggy, "blue", "W1"),
            def("W2", "sweep", Nanomaggy, "blue", "W2"),
            def("W3", "sweep", Nanomaggy, "blue", "W3"),
            def("W4", "sweep", Nanomaggy, "blue", "W4"),
        ]
    }
}

impl Default for BandRegistry {
    fn default() -> Self {
        Self::from_defs(&Self::default_defs()).expect("default band table is valid")
    }
}
