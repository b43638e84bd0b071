//! End-to-end run on small synthetic catalogs

use approx::assert_relative_eq;
use skyfuse_core::constants::SENTINEL;
use skyfuse_data::io::read_csv;
use skyfuse_data::{
    CatalogKind, CatalogPipeline, ContextMode, PipelineConfig, PipelineEvent, PipelineError, RecordingObserver,
};
use std::path::Path;

fn write_catalog(root: &Path, name: &str, header: &[&str], rows: &[Vec<String>]) {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    let mut text = header.join(",");
    text.push('\n');
    for row in rows {
        text.push_str(&row.join(","));
        text.push('\n');
    }
    std::fs::write(dir.join(format!("{}_part0.csv", name)), text).unwrap();
}

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// Two AGN survive the anchor match: a PSF source at 130 deg and a REX source at 131 deg
fn synthetic_catalogs(root: &Path) {
    write_catalog(
        root,
        "opt_agn",
        &["RA", "DEC", "phot_z", "prob_rf"],
        &[
            row(&["130.0", "1.0", "1.1", "0.99"]),
            row(&["131.0", "2.0", "0.7", "0.97"]),
            row(&["132.0", "0.0", "0.4", "0.5"]),
            row(&["133.0", "0.0", "2.2", "0.99"]),
        ],
    );

    let sweep_bands = ["G", "R", "Z", "W1", "W2", "W3", "W4"];
    let mut header: Vec<String> = [
        "RELEASE", "BRICKID", "OBJID", "TYPE", "RA", "DEC", "RA_IVAR", "DEC_IVAR", "EBV", "REF_CAT", "REF_ID",
        "MASKBITS", "FITBITS",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    for b in sweep_bands {
        header.push(format!("FLUX_{}", b));
        header.push(format!("FLUX_IVAR_{}", b));
        header.push(format!("MW_TRANSMISSION_{}", b));
    }
    let mut psf = row(&["9010", "331", "17", "PSF", "130.00001", "1.0", "1e10", "1e10", "0.03", "G2", "4411", "0", "0"]);
    let mut rex = row(&["9010", "331", "18", "REX", "131.0", "2.00001", "1e10", "1e10", "0.02", "", "", "0", "0"]);
    for _ in sweep_bands {
        psf.extend(row(&["10.0", "4.0", "0.8"]));
        rex.extend(row(&["20.0", "0.0", "0.9"]));
    }
    let header: Vec<&str> = header.iter().map(String::as_str).collect();
    write_catalog(root, "sweep", &header, &[psf, rex]);

    let mut vhs_header = vec!["ra", "dec", "pstar", "pgalaxy", "ebv"];
    let mut vhs_row = row(&["130.00001", "1.00002", "0.9", "0.1", "0.03"]);
    let vhs_columns: Vec<String> = ["j", "h", "ks"]
        .iter()
        .flat_map(|b| {
            ["petromag", "petromagerr", "apermag4", "apermag4err", "apermag6", "apermag6err"]
                .iter()
                .map(move |c| format!("{}{}", b, c))
                .chain(std::iter::once(format!("a{}", b)))
        })
        .collect();
    vhs_header.extend(vhs_columns.iter().map(String::as_str));
    for _ in ["j", "h", "ks"] {
        vhs_row.extend(row(&["15.1", "0.03", "15.0", "0.02", "14.9", "0.02", "0.05"]));
    }
    write_catalog(root, "vhs", &vhs_header, &[vhs_row]);

    write_catalog(
        root,
        "eros",
        &["ctp_ls8_ra", "ctp_ls8_dec", "ctp_quality", "ctp_redshift", "ctp_redshift_grade", "specz_redshift", "specz_normq"],
        &[row(&["131.0", "2.00001", "4", "0.8", "5", "0.8", "3"])],
    );

    write_catalog(
        root,
        "hsc",
        &[
            "ra",
            "dec",
            "i_psfflux_flux",
            "i_psfflux_fluxerr",
            "i_cmodel_flux",
            "i_cmodel_fluxerr",
            "i_filterfraction_weighted",
            "a_i",
        ],
        &[
            row(&["130.00001", "1.00001", "1000.0", "10.0", "1100.0", "12.0", "0.9", "0.02"]),
            row(&["135.0", "1.0", "", "10.0", "1100.0", "12.0", "0.9", "0.02"]),
        ],
    );

    write_catalog(
        root,
        "galex",
        &["RAJ2000", "DEJ2000", "Fflux", "e_Fflux", "Nflux", "e_Nflux", "E(B-V)", "Prob"],
        &[
            row(&["130.0002", "1.0", "5.0", "0.5", "8.0", "0.6", "0.03", "0.95"]),
            row(&["131.0", "2.00021", "3.0", "0.4", "", "", "0.02", "0.9"]),
        ],
    );

    write_catalog(
        root,
        "kids",
        &["RAJ2000", "DECJ2000", "CLASS_STAR", "Z_B", "ODDS", "MAG_GAAP_i", "MAGERR_GAAP_i", "EXTINCTION_i"],
        &[row(&["140.0", "5.0", "0.5", "0.3", "0.9", "21.0", "0.05", "0.02"])],
    );

    write_catalog(
        root,
        "ls10",
        &["ctp_ls8_ra", "ctp_ls8_dec", "lu_flux_i", "lu_flux_i_err"],
        &[row(&["131.0", "2.00001", "2e-29", "1e-30"])],
    );
}

fn config_for(root: &Path) -> PipelineConfig {
    PipelineConfig {
        catalog_root: root.join("catalogs"),
        output_dir: root.join("out"),
        output_stem: "test".to_string(),
        ..PipelineConfig::default()
    }
}

#[test]
fn test_end_to_end_outputs() {
    let dir = tempfile::tempdir().unwrap();
    synthetic_catalogs(&dir.path().join("catalogs"));
    let config = config_for(dir.path());
    let observer = RecordingObserver::new();

    let pipeline = CatalogPipeline::new(config, &observer).unwrap();
    let output = pipeline.run().unwrap();
    let written = pipeline.write(&output).unwrap();
    assert_eq!(written.len(), 3);
    assert!(written.iter().all(|p| p.exists()));

    let pointlike = read_csv(&dir.path().join("out/test_pointlike.csv"), "pointlike").unwrap();
    let extended = read_csv(&dir.path().join("out/test_extended.csv"), "extended").unwrap();
    assert_eq!(pointlike.n_rows(), 1);
    assert_eq!(extended.n_rows(), 1);

    let names: Vec<&str> = pointlike.column_names().collect();
    assert_eq!(names.first(), Some(&"IDENT"));
    assert_eq!(&names[1..3], &["FUV", "FUV_err"]);
    assert_eq!(&names[names.len() - 3..], &["CONTEXT", "ZSPEC", "String"]);
    assert_eq!(names.len(), 1 + 2 * 16 + 3);

    // sweep g: 10 nanomaggy through a transmission of 0.8
    assert_relative_eq!(pointlike.float("g").unwrap()[0].unwrap(), 12.5 * 3.631e-29, max_relative = 1e-9);
    assert_relative_eq!(pointlike.float("g_err").unwrap()[0].unwrap(), 0.5 / 0.8 * 3.631e-29, max_relative = 1e-9);
    // VHS J, 4 arcsec aperture for point-like sources
    assert_relative_eq!(
        pointlike.float("J").unwrap()[0].unwrap(),
        10f64.powf(-(15.0 + 0.916 + 0.05 + 48.6) / 2.5),
        max_relative = 1e-9
    );
    // HSC filter fraction above 0.75 lands in the second i filter
    assert_relative_eq!(pointlike.float("i2_hsc").unwrap()[0].unwrap(), 1000.0e-32, max_relative = 1e-9);
    assert_eq!(pointlike.float("i_hsc").unwrap()[0], Some(SENTINEL));
    assert_eq!(pointlike.float("i_kids").unwrap()[0], Some(SENTINEL));
    assert_eq!(pointlike.float("ZSPEC").unwrap()[0], Some(SENTINEL));
    assert_eq!(pointlike.column("CONTEXT").unwrap().number(0), Some(-1.0));

    // the extended source has zero inverse variance in the sweep and a spec-z
    assert_eq!(extended.float("g").unwrap()[0], Some(SENTINEL));
    assert_eq!(extended.float("g_err").unwrap()[0], Some(SENTINEL));
    assert_eq!(extended.float("ZSPEC").unwrap()[0], Some(0.8));
    assert_relative_eq!(extended.float("i_ls10").unwrap()[0].unwrap(), 2e-29, max_relative = 1e-12);
    assert_eq!(extended.float("NUV").unwrap()[0], Some(SENTINEL));
    assert_eq!(extended.text("String").unwrap()[0], Some("131.0 2.00001 5 3".to_string()));

    for table in [&pointlike, &extended] {
        for band in pipeline.bands().iter() {
            let flux = table.float(&band.name).unwrap();
            let err = table.float(&format!("{}_err", band.name)).unwrap();
            for (f, e) in flux.iter().zip(err) {
                assert_eq!(*f == Some(SENTINEL), *e == Some(SENTINEL), "band {}", band.name);
            }
        }
    }

    let events = observer.events();
    assert!(events.contains(&PipelineEvent::Matched {
        catalog: CatalogKind::Sweep,
        join: skyfuse_data::JoinPolicy::Exclusive,
        primary_rows: 3,
        matched: 2,
        output_rows: 2,
    }));
    assert!(events.contains(&PipelineEvent::RejectionSkipped { catalog: CatalogKind::Vhs, matched: 1 }));
    assert!(events
        .iter()
        .any(|e| matches!(e, PipelineEvent::Matched { catalog: CatalogKind::Kids, matched: 0, output_rows: 2, .. })));

    assert_eq!(output.availability.total_sources, 2);
    assert!(dir.path().join("out/test_availability.json").exists());
}

#[test]
fn test_rerun_is_identical() {
    let dir = tempfile::tempdir().unwrap();
    synthetic_catalogs(&dir.path().join("catalogs"));
    let observer = RecordingObserver::new();
    let pipeline = CatalogPipeline::new(config_for(dir.path()), &observer).unwrap();

    let first = pipeline.run().unwrap();
    let second = pipeline.run().unwrap();
    assert_eq!(first.pointlike, second.pointlike);
    assert_eq!(first.extended, second.extended);
}

#[test]
fn test_per_source_context_and_specz_filter() {
    let dir = tempfile::tempdir().unwrap();
    synthetic_catalogs(&dir.path().join("catalogs"));
    let config = PipelineConfig {
        context_mode: ContextMode::PerSource,
        reduce_to_specz: true,
        requested_bands: vec!["g".to_string(), "i_ls10".to_string()],
        ..config_for(dir.path())
    };
    let observer = RecordingObserver::new();
    let pipeline = CatalogPipeline::new(config, &observer).unwrap();
    let output = pipeline.run().unwrap();

    assert_eq!(output.pointlike.n_rows(), 0);
    assert_eq!(output.extended.n_rows(), 1);
    let g_bit = 1i64 << pipeline.bands().index_of("g").unwrap();
    assert_eq!(output.extended.column("CONTEXT").unwrap().number(0), Some(g_bit as f64));
}

#[test]
fn test_configuration_errors_come_before_io() {
    let dir = tempfile::tempdir().unwrap();
    let observer = RecordingObserver::new();
    let mut config = config_for(dir.path());
    config.match_sequence.insert(0, "2mass".to_string());

    let err = CatalogPipeline::new(config, &observer).err().unwrap();
    assert!(matches!(err, PipelineError::UnknownCatalog(_)));
    assert!(observer.events().is_empty());
}

#[test]
fn test_missing_catalog_directory_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    synthetic_catalogs(&dir.path().join("catalogs"));
    std::fs::remove_dir_all(dir.path().join("catalogs/kids")).unwrap();
    let observer = RecordingObserver::new();

    let pipeline = CatalogPipeline::new(config_for(dir.path()), &observer).unwrap();
    assert!(matches!(pipeline.run(), Err(PipelineError::NoInputFiles(_))));
}
