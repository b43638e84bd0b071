//! Pipeline configuration
//!
//! Everything a run needs is in one serde document. Catalog and band names
//! stay strings here so that a typo surfaces from [`PipelineConfig::validate`]
//! as a configuration error instead of a deserialization failure.

use crate::assembly::ContextMode;
use crate::bands::{BandDef, BandRegistry};
use crate::catalog::{CatalogKind, NormalizeOptions};
use crate::crossmatch::{JoinPolicy, MatchRule, PositionSource};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use skyfuse_core::constants::OUTLIER_SIGMA;
use skyfuse_core::coordinates::SkyRegion;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Tolerance and join policy for one secondary catalog
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRadius {
    pub radius_arcsec: f64,
    #[serde(default = "default_join")]
    pub join: JoinPolicy,
}

fn default_join() -> JoinPolicy {
    JoinPolicy::All1
}

impl MatchRadius {
    pub fn new(radius_arcsec: f64, join: JoinPolicy) -> Self {
        Self { radius_arcsec, join }
    }
}

/// The exclusive match that defines the set of output sources
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// AGN candidate catalog (`opt_agn` or `xray_agn`)
    pub primary: String,
    /// Photometric catalog providing positions and morphology
    pub secondary: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self { primary: "opt_agn".to_string(), secondary: "sweep".to_string() }
    }
}

/// Settings for the LePhare template-fitting runs
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LephareConfig {
    /// Directory holding the LePhare executables
    pub bin_dir: PathBuf,
    /// LePhare work directory (`LEPHAREWORK`), where libraries are written
    pub work_dir: PathBuf,
    pub param_file: PathBuf,
    pub filter_dir: PathBuf,
    pub filter_stem: String,
    /// Directory with `<type>.list` template lists
    pub template_dir: PathBuf,
    pub run_filters: bool,
    pub run_templates: bool,
    pub run_zphota: bool,
    pub overwrite: bool,
}

impl Default for LephareConfig {
    fn default() -> Self {
        Self {
            bin_dir: PathBuf::from("lephare/source"),
            work_dir: PathBuf::from("lephare/work"),
            param_file: PathBuf::from("params/skyfuse.para"),
            filter_dir: PathBuf::from("params/filters"),
            filter_stem: "skyfuse_filters".to_string(),
            template_dir: PathBuf::from("params/templates"),
            run_filters: true,
            run_templates: true,
            run_zphota: true,
            overwrite: false,
        }
    }
}

/// Match steps and rejection targets with catalogs resolved
#[derive(Clone, Debug, PartialEq)]
pub struct MatchPlan {
    pub anchor_primary: CatalogKind,
    pub anchor: MatchRule,
    pub steps: Vec<MatchRule>,
    pub reject_outliers: Vec<CatalogKind>,
}

impl MatchPlan {
    /// Every catalog the run reads, anchor first
    pub fn catalogs(&self) -> Vec<CatalogKind> {
        let mut catalogs = vec![self.anchor_primary, self.anchor.catalog];
        catalogs.extend(self.steps.iter().map(|s| s.catalog));
        catalogs
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// One sub-directory of CSV files per catalog
    pub catalog_root: PathBuf,
    pub output_dir: PathBuf,
    pub output_stem: String,
    pub region: SkyRegion,
    pub min_agn_probability: f64,
    pub anchor: AnchorConfig,
    /// Secondary catalogs in match order
    pub match_sequence: Vec<String>,
    pub match_radii: BTreeMap<String, MatchRadius>,
    pub reject_outliers: Vec<String>,
    pub outlier_sigma: f64,
    pub bands: Vec<BandDef>,
    pub requested_bands: Vec<String>,
    pub context_mode: ContextMode,
    pub reduce_to_specz: bool,
    pub show_progress: bool,
    pub lephare: LephareConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let bands = BandRegistry::default_defs();
        let requested_bands = bands.iter().map(|b| b.name.clone()).collect();

        let mut match_radii = BTreeMap::new();
        match_radii.insert("sweep".to_string(), MatchRadius::new(0.1, JoinPolicy::Exclusive));
        for (catalog, radius) in [("vhs", 0.5), ("eros", 0.1), ("hsc", 0.25), ("galex", 3.5), ("kids", 1.5), ("ls10", 0.1)] {
            match_radii.insert(catalog.to_string(), MatchRadius::new(radius, JoinPolicy::All1));
        }

        Self {
            catalog_root: PathBuf::from("data/catalogs"),
            output_dir: PathBuf::from("data/matches"),
            output_stem: "skyfuse".to_string(),
            region: SkyRegion::efeds(),
            min_agn_probability: 0.94,
            anchor: AnchorConfig::default(),
            match_sequence: ["vhs", "eros", "hsc", "galex", "kids", "ls10"].iter().map(|s| s.to_string()).collect(),
            match_radii,
            reject_outliers: vec!["vhs".to_string(), "galex".to_string()],
            outlier_sigma: OUTLIER_SIGMA,
            bands,
            requested_bands,
            context_mode: ContextMode::Fixed,
            reduce_to_specz: false,
            show_progress: false,
            lephare: LephareConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn band_registry(&self) -> Result<BandRegistry> {
        BandRegistry::from_defs(&self.bands)
    }

    fn rule(&self, catalog: CatalogKind) -> Result<MatchRule> {
        let radius = self
            .match_radii
            .get(catalog.name())
            .ok_or_else(|| PipelineError::MissingRadius(catalog.name().to_string()))?;
        Ok(MatchRule::new(catalog, radius.radius_arcsec, radius.join))
    }

    /// Resolve catalog names into the ordered match steps
    pub fn match_plan(&self) -> Result<MatchPlan> {
        let anchor_primary: CatalogKind = self.anchor.primary.parse()?;
        if !matches!(anchor_primary, CatalogKind::OptAgn | CatalogKind::XrayAgn) {
            return Err(PipelineError::Configuration(format!(
                "anchor primary must be an AGN catalog, got {}",
                anchor_primary
            )));
        }
        let anchor_secondary: CatalogKind = self.anchor.secondary.parse()?;
        let anchor = self.rule(anchor_secondary)?.with_position(PositionSource::Secondary);

        let mut seen: HashSet<CatalogKind> = [anchor_primary, anchor_secondary].into_iter().collect();
        let mut steps = Vec::with_capacity(self.match_sequence.len());
        for name in &self.match_sequence {
            let catalog: CatalogKind = name.parse()?;
            if !seen.insert(catalog) {
                return Err(PipelineError::Configuration(format!("catalog {} is matched twice", catalog)));
            }
            steps.push(self.rule(catalog)?);
        }

        let mut reject_outliers = Vec::with_capacity(self.reject_outliers.len());
        for name in &self.reject_outliers {
            let catalog: CatalogKind = name.parse()?;
            if !steps.iter().any(|s| s.catalog == catalog) {
                return Err(PipelineError::Configuration(format!(
                    "outlier rejection requested for {}, which is not in the match sequence",
                    catalog
                )));
            }
            reject_outliers.push(catalog);
        }

        Ok(MatchPlan { anchor_primary, anchor, steps, reject_outliers })
    }

    pub fn normalize_options<'a>(&self, bands: &'a BandRegistry) -> NormalizeOptions<'a> {
        NormalizeOptions { bands, region: self.region, min_agn_probability: self.min_agn_probability }
    }

    /// Check everything that can be checked before reading a table
    pub fn validate(&self) -> Result<()> {
        let registry = self.band_registry()?;
        let plan = self.match_plan()?;

        for band in registry.iter() {
            if !band.catalog.provides_photometry() {
                return Err(PipelineError::Configuration(format!(
                    "band '{}' is attached to {}, which has no photometry",
                    band.name, band.catalog
                )));
            }
        }
        for name in &self.requested_bands {
            registry.require(name)?;
        }
        if self.requested_bands.is_empty() {
            return Err(PipelineError::Configuration("no output bands requested".to_string()));
        }
        if self.outlier_sigma.is_nan() || self.outlier_sigma <= 0.0 {
            return Err(PipelineError::Configuration(format!(
                "outlier_sigma must be positive, got {}",
                self.outlier_sigma
            )));
        }
        for rule in plan.steps.iter().chain(std::iter::once(&plan.anchor)) {
            if rule.radius_arcsec.is_nan() || rule.radius_arcsec <= 0.0 {
                return Err(PipelineError::Configuration(format!(
                    "match radius for {} must be positive, got {}",
                    rule.catalog, rule.radius_arcsec
                )));
            }
        }

        let matched = plan.catalogs();
        for band in registry.iter() {
            if !matched.contains(&band.catalog) {
                tracing::warn!("Band {} comes from {}, which is not matched; it will be empty", band.name, band.catalog);
            }
        }
        Ok(())
    }

    pub fn output_path(&self, suffix: &str) -> PathBuf {
        self.output_dir.join(format!("{}_{}", self.output_stem, suffix))
    }
}
