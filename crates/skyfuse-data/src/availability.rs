//! Photometric availability of the assembled tables

use crate::error::Result;
use crate::photometry::Morphology;
use crate::table::Table;
use serde::{Deserialize, Serialize};
use skyfuse_core::photometry::is_present;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandAvailability {
    pub band: String,
    pub count: usize,
    pub fraction: f64,
}

/// Number of sources with exactly `bands` valid bands
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BandCountBin {
    pub bands: usize,
    pub with_specz: usize,
    pub without_specz: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MorphologyAvailability {
    pub morphology: Morphology,
    pub sources: usize,
    pub bands: Vec<BandAvailability>,
    pub specz: BandAvailability,
    pub band_counts: Vec<BandCountBin>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityReport {
    pub total_sources: usize,
    pub classes: Vec<MorphologyAvailability>,
}

impl AvailabilityReport {
    /// Build the report from assembled tables (band columns named after the band)
    pub fn from_tables<S: AsRef<str>>(tables: &[(Morphology, &Table)], bands: &[S]) -> Result<Self> {
        let mut classes = Vec::with_capacity(tables.len());
        for (morphology, table) in tables {
            classes.push(Self::describe(*morphology, table, bands)?);
        }
        let total_sources = classes.iter().map(|c| c.sources).sum();
        Ok(Self { total_sources, classes })
    }

    fn describe<S: AsRef<str>>(morphology: Morphology, table: &Table, bands: &[S]) -> Result<MorphologyAvailability> {
        let n = table.n_rows();
        let fraction = |count: usize| if n == 0 { 0.0 } else { count as f64 / n as f64 };

        let mut valid_per_row = vec![0usize; n];
        let mut availability = Vec::with_capacity(bands.len());
        for band in bands {
            let values = table.float(band.as_ref())?;
            let mut count = 0;
            for (row, v) in values.iter().enumerate() {
                if is_present(*v) && v.map_or(false, |x| x > 0.0) {
                    count += 1;
                    valid_per_row[row] += 1;
                }
            }
            availability.push(BandAvailability { band: band.as_ref().to_string(), count, fraction: fraction(count) });
        }

        let zspec = table.float("ZSPEC")?;
        let has_specz: Vec<bool> = zspec.iter().map(|z| z.map_or(false, |z| z > 0.0)).collect();
        let specz_count = has_specz.iter().filter(|h| **h).count();

        let mut band_counts: Vec<BandCountBin> = (0..=bands.len())
            .map(|k| BandCountBin { bands: k, with_specz: 0, without_specz: 0 })
            .collect();
        for (valid, specz) in valid_per_row.iter().zip(&has_specz) {
            let bin = &mut band_counts[*valid];
            if *specz {
                bin.with_specz += 1;
            } else {
                bin.without_specz += 1;
            }
        }

        Ok(MorphologyAvailability {
            morphology,
            sources: n,
            bands: availability,
            specz: BandAvailability { band: "ZSPEC".to_string(), count: specz_count, fraction: fraction(specz_count) },
            band_counts,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
