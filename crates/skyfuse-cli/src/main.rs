mod lephare;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lephare::LephareRunner;
use skyfuse_data::io::read_csv;
use skyfuse_data::{CatalogPipeline, Morphology, PipelineConfig, TracingObserver};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "skyfuse")]
#[command(about = "Multi-catalog cross-matching and photometric harmonization")]
struct Cli {
    /// Pipeline configuration (JSON); built-in defaults when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match all catalogs and write the per-morphology tables
    Assemble {
        /// Override the catalog root directory
        #[arg(long)]
        catalog_root: Option<PathBuf>,
        /// Override the output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Show a progress bar while matching
        #[arg(long)]
        progress: bool,
    },

    /// Validate the configuration and print the match plan
    Check,

    /// List the registered bands with their context bits
    Bands,

    /// Write the default configuration
    DefaultConfig {
        #[arg(short, long, default_value = "skyfuse.json")]
        output: PathBuf,
    },

    /// Write LePhare inputs from assembled tables and run the template fitting
    Lephare {
        /// Only write the ASCII input catalogs
        #[arg(long)]
        inputs_only: bool,
    },
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path).with_context(|| format!("Failed to load configuration {:?}", path)),
        None => Ok(PipelineConfig::default()),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Assemble { catalog_root, output_dir, progress } => {
            if let Some(root) = catalog_root {
                config.catalog_root = root;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            config.show_progress |= progress;

            let observer = TracingObserver;
            let pipeline = CatalogPipeline::new(config, &observer).context("Invalid configuration")?;
            let output = pipeline.run().context("Catalog assembly failed")?;
            let written = pipeline.write(&output).context("Failed to write the assembled tables")?;

            println!("Assembled {} sources", output.availability.total_sources);
            for class in &output.availability.classes {
                let specz = class.specz.count;
                println!("  {:<10} {:>8} sources, {:>6} with spec-z", class.morphology.name(), class.sources, specz);
            }
            for path in written {
                println!("  -> {}", path.display());
            }
        }

        Commands::Check => {
            config.validate().context("Invalid configuration")?;
            let plan = config.match_plan()?;

            println!("Configuration OK");
            println!("  Catalog root: {}", config.catalog_root.display());
            println!("  Output:       {}", config.output_path("<morphology>.csv").display());
            println!(
                "\n  Anchor: {} x {} ({:.2}\" {:?})",
                plan.anchor_primary, plan.anchor.catalog, plan.anchor.radius_arcsec, plan.anchor.join
            );
            for (i, step) in plan.steps.iter().enumerate() {
                let reject = if plan.reject_outliers.contains(&step.catalog) { ", outlier rejection" } else { "" };
                println!("  {:>2}. {:<6} {:>5.2}\" {:?}{}", i + 1, step.catalog, step.radius_arcsec, step.join, reject);
            }
            println!("\n  Requested bands: {}", config.requested_bands.join(", "));
        }

        Commands::Bands => {
            let bands = config.band_registry()?;
            println!("{:<4} {:<8} {:<8} {:<16} {:>10}", "Bit", "Band", "Catalog", "System", "Requested");
            for (i, band) in bands.iter().enumerate() {
                let requested = config.requested_bands.iter().any(|b| *b == band.name);
                println!(
                    "{:<4} {:<8} {:<8} {:<16} {:>10}",
                    i,
                    band.name,
                    band.catalog.name(),
                    format!("{:?}", band.system),
                    if requested { "yes" } else { "no" }
                );
            }
        }

        Commands::DefaultConfig { output } => {
            config.save(&output).with_context(|| format!("Failed to write {:?}", output))?;
            println!("Wrote configuration to {}", output.display());
        }

        Commands::Lephare { inputs_only } => {
            config.validate().context("Invalid configuration")?;
            let bands = config.band_registry()?;
            let runner = LephareRunner::new(&config, &bands)?;

            for morphology in Morphology::ALL {
                let assembled = config.output_path(&format!("{}.csv", morphology));
                let table = read_csv(&assembled, morphology.name())
                    .with_context(|| format!("Run `skyfuse assemble` first, cannot read {:?}", assembled))?;
                lephare::write_input(&table, &runner.input_file(morphology))?;
                println!("{:<10} {:>8} sources -> {}", morphology.name(), table.n_rows(), runner.input_file(morphology).display());
            }

            if !inputs_only {
                println!("GLB_CONTEXT = {}", runner.global_context());
                runner.run_all().context("LePhare run failed")?;
            }
        }
    }

    Ok(())
}
