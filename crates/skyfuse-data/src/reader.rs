//! Loading catalog partitions from disk

use crate::catalog::{CatalogKind, NormalizeOptions};
use crate::error::{PipelineError, Result};
use crate::events::{PipelineEvent, PipelineObserver};
use crate::io::read_csv;
use crate::table::Table;
use std::path::{Path, PathBuf};

/// Reads `<root>/<catalog>/*.csv`
#[derive(Clone, Debug)]
pub struct CatalogReader {
    root: PathBuf,
}

impl CatalogReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn catalog_dir(&self, kind: CatalogKind) -> PathBuf {
        self.root.join(kind.name())
    }

    /// Data files of one catalog in lexicographic order
    pub fn partitions(&self, kind: CatalogKind) -> Result<Vec<PathBuf>> {
        let dir = self.catalog_dir(kind);
        if !dir.is_dir() {
            return Err(PipelineError::NoInputFiles(dir));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("csv")))
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(PipelineError::NoInputFiles(dir));
        }
        Ok(files)
    }

    /// Concatenate the raw partitions without touching their columns
    pub fn read_raw(&self, kind: CatalogKind) -> Result<(Table, usize)> {
        let files = self.partitions(kind)?;
        let mut table = Table::empty(kind.name(), 0);
        for path in &files {
            tracing::debug!("Reading {} partition {:?}", kind, path);
            table = table.concat(read_csv(path, kind.name())?)?;
        }
        Ok((table, files.len()))
    }

    /// Read and normalize one catalog
    pub fn load(&self, kind: CatalogKind, options: &NormalizeOptions, observer: &dyn PipelineObserver) -> Result<Table> {
        let (raw, files) = self.read_raw(kind)?;
        observer.on_event(&PipelineEvent::CatalogLoaded { catalog: kind, files, rows: raw.n_rows() });

        let table = kind.normalize(raw, options)?;
        observer.on_event(&PipelineEvent::CatalogNormalized {
            catalog: kind,
            rows: table.n_rows(),
            columns: table.n_columns(),
        });
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::BandRegistry;
    use crate::events::RecordingObserver;
    use crate::table::Column;
    use skyfuse_core::coordinates::SkyRegion;

    #[test]
    fn test_partitions_are_concatenated_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let kids = dir.path().join("kids");
        std::fs::create_dir_all(&kids).unwrap();
        let header = "RAJ2000,DECJ2000,CLASS_STAR,Z_B,ODDS,MAG_GAAP_i,MAGERR_GAAP_i,EXTINCTION_i,THELI_NAME\n";
        std::fs::write(kids.join("b.csv"), format!("{}131.0,1.0,0.9,0.3,0.8,20.5,0.05,0.02,KIDS_2\n", header)).unwrap();
        std::fs::write(kids.join("a.csv"), format!("{}130.0,0.5,0.1,0.7,0.9,21.5,0.08,0.02,KIDS_1\n", header)).unwrap();
        std::fs::write(kids.join("notes.txt"), "not a table").unwrap();

        let reader = CatalogReader::new(dir.path());
        let bands = BandRegistry::default();
        let options = NormalizeOptions { bands: &bands, region: SkyRegion::efeds(), min_agn_probability: 0.94 };
        let observer = RecordingObserver::new();

        let table = reader.load(CatalogKind::Kids, &options, &observer).unwrap();
        assert_eq!(table.float("ra").unwrap(), &[Some(130.0), Some(131.0)]);
        assert_eq!(table.float("mag_i_kids").unwrap(), &[Some(21.5), Some(20.5)]);
        assert!(!table.has_column("THELI_NAME"));
        assert_eq!(
            observer.events()[0],
            PipelineEvent::CatalogLoaded { catalog: CatalogKind::Kids, files: 2, rows: 2 }
        );
    }

    #[test]
    fn test_blank_column_in_one_partition() {
        let dir = tempfile::tempdir().unwrap();
        let sweep = dir.path().join("sweep");
        std::fs::create_dir_all(&sweep).unwrap();
        std::fs::write(sweep.join("a.csv"), "ra,dec,ref_cat,ref_id\n130.0,1.0,,\n130.5,1.5,,\n").unwrap();
        std::fs::write(sweep.join("b.csv"), "ra,dec,ref_cat,ref_id\n131.0,2.0,G2,4411\n131.5,2.5,,\n").unwrap();

        let reader = CatalogReader::new(dir.path());
        let (table, files) = reader.read_raw(CatalogKind::Sweep).unwrap();
        assert_eq!(files, 2);
        assert_eq!(table.n_rows(), 4);
        assert_eq!(table.text("ref_cat").unwrap(), &[None, None, Some("G2".to_string()), None]);
        assert_eq!(table.column("ref_id").unwrap(), &Column::Int(vec![None, None, Some(4411), None]));
    }

    #[test]
    fn test_missing_catalog_directory() {
        let dir = tempfile::tempdir().unwrap();
        let reader = CatalogReader::new(dir.path());
        assert!(matches!(reader.partitions(CatalogKind::Hsc), Err(PipelineError::NoInputFiles(_))));

        std::fs::create_dir_all(dir.path().join("hsc")).unwrap();
        assert!(matches!(reader.partitions(CatalogKind::Hsc), Err(PipelineError::NoInputFiles(_))));
    }
}
