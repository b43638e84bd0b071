//! LePhare template-fitting runs
//!
//! The LePhare executables are called as `<bin_dir>/<command> -c <param> -KEY value ...`.
//! Commands are built first and executed second so the argument lists can be
//! inspected without the executables installed.

use skyfuse_data::config::{LephareConfig, PipelineConfig};
use skyfuse_data::photometry::Morphology;
use skyfuse_data::{BandRegistry, PipelineError, Result, Table};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Template library type; stars only get templates, never a zphota run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateType {
    Pointlike,
    Extended,
    Star,
}

impl TemplateType {
    pub fn name(&self) -> &'static str {
        match self {
            TemplateType::Pointlike => "pointlike",
            TemplateType::Extended => "extended",
            TemplateType::Star => "star",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            TemplateType::Star => "STAR",
            _ => "GAL",
        }
    }

    fn type_flag(&self) -> &'static str {
        match self {
            TemplateType::Star => "S",
            _ => "G",
        }
    }
}

impl From<Morphology> for TemplateType {
    fn from(morphology: Morphology) -> Self {
        match morphology {
            Morphology::Pointlike => TemplateType::Pointlike,
            Morphology::Extended => TemplateType::Extended,
        }
    }
}

/// One executable call
#[derive(Debug, Clone, PartialEq)]
pub struct LephareCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Redirect stdout into this file
    pub stdout: Option<PathBuf>,
}

impl LephareCommand {
    fn new(bin_dir: &Path, command: &str, param_file: &Path) -> Self {
        Self {
            program: bin_dir.join(command),
            args: vec!["-c".to_string(), param_file.display().to_string()],
            stdout: None,
        }
    }

    fn arg(mut self, key: &str, value: impl Into<String>) -> Self {
        self.args.push(format!("-{}", key));
        self.args.push(value.into());
        self
    }

    /// Value following `-<key>`, if present
    pub fn value(&self, key: &str) -> Option<&str> {
        let flag = format!("-{}", key);
        self.args
            .iter()
            .position(|a| *a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    pub fn run(&self) -> Result<()> {
        let program = self.program.display().to_string();
        tracing::info!("Running {} {}", program, self.args.join(" "));

        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(path) = &self.stdout {
            command.stdout(Stdio::from(File::create(path)?));
        }

        let status = command.status()?;
        if !status.success() {
            return Err(PipelineError::Subprocess { program, status: status.to_string() });
        }
        Ok(())
    }
}

/// Paths and commands of one LePhare session
pub struct LephareRunner<'a> {
    config: &'a PipelineConfig,
    lephare: &'a LephareConfig,
    global_context: i64,
}

impl<'a> LephareRunner<'a> {
    /// The global context excludes every registered band that was not requested
    pub fn new(config: &'a PipelineConfig, bands: &BandRegistry) -> Result<Self> {
        let excluded: Vec<&str> = bands
            .iter()
            .map(|b| b.name.as_str())
            .filter(|name| !config.requested_bands.iter().any(|r| r == name))
            .collect();
        let global_context = bands.context(&excluded)?;
        Ok(Self { config, lephare: &config.lephare, global_context })
    }

    pub fn global_context(&self) -> i64 {
        self.global_context
    }

    pub fn filter_file(&self) -> PathBuf {
        self.config.output_dir.join(format!("{}.filt", self.lephare.filter_stem))
    }

    pub fn template_list(&self, ttype: TemplateType) -> PathBuf {
        self.lephare.template_dir.join(format!("{}.list", ttype.name()))
    }

    fn library_name(ttype: TemplateType, kind: &str) -> String {
        format!("{}_{}_lib", ttype.name(), kind)
    }

    /// Where the ASCII magnitude library ends up after `mag_gal`
    pub fn magnitude_library(&self, ttype: TemplateType) -> PathBuf {
        self.config.output_dir.join(format!("{}.dat", Self::library_name(ttype, "mag")))
    }

    /// LePhare writes the ASCII library into its work directory
    fn work_magnitude_library(&self, ttype: TemplateType) -> PathBuf {
        self.lephare.work_dir.join("lib_mag").join(format!("{}.dat", Self::library_name(ttype, "mag")))
    }

    pub fn input_file(&self, morphology: Morphology) -> PathBuf {
        self.config.output_path(&format!("{}.in", morphology))
    }

    pub fn output_file(&self, morphology: Morphology) -> PathBuf {
        self.config.output_path(&format!("{}.out", morphology))
    }

    fn command(&self, name: &str) -> LephareCommand {
        LephareCommand::new(&self.lephare.bin_dir, name, &self.lephare.param_file)
    }

    pub fn filter_command(&self) -> LephareCommand {
        let mut command = self
            .command("filter")
            .arg("FILTER_REP", self.lephare.filter_dir.display().to_string())
            .arg("FILTER_FILE", self.lephare.filter_stem.clone());
        command.stdout = Some(self.filter_file());
        command
    }

    pub fn sedtolib_command(&self, ttype: TemplateType) -> LephareCommand {
        let prefix = ttype.prefix();
        self.command("sedtolib")
            .arg(&format!("{}_SED", prefix), self.template_list(ttype).display().to_string())
            .arg(&format!("{}_LIB", prefix), Self::library_name(ttype, "sed"))
            .arg("t", ttype.type_flag())
    }

    pub fn mag_gal_command(&self, ttype: TemplateType) -> LephareCommand {
        let prefix = ttype.prefix();
        let command = self
            .command("mag_gal")
            .arg(&format!("{}_LIB_IN", prefix), Self::library_name(ttype, "sed"))
            .arg(&format!("{}_LIB_OUT", prefix), Self::library_name(ttype, "mag"))
            .arg("EM_LINES", "NO")
            .arg("LIB_ASCII", "YES")
            .arg("FILTER_FILE", self.lephare.filter_stem.clone())
            .arg("t", ttype.type_flag());

        match ttype {
            TemplateType::Pointlike => command
                .arg("EXTINC_LAW", "SMC_prevot.dat")
                .arg("MOD_EXTINC", "11,23")
                .arg("EB_V", "0.,0.05,0.1,0.15,0.2,0.25,0.3,0.35,0.4"),
            _ => command,
        }
    }

    pub fn zphota_command(&self, morphology: Morphology) -> LephareCommand {
        let ttype = TemplateType::from(morphology);
        let star_lib = if self.magnitude_library(TemplateType::Star).is_file() {
            Self::library_name(TemplateType::Star, "mag")
        } else {
            "baseline_star_mag_lib".to_string()
        };
        let mag_abs = match morphology {
            Morphology::Pointlike => "-30,-20",
            Morphology::Extended => "-24,-8",
        };

        self.command("zphota")
            .arg("ZPHOTLIB", format!("{},{}", Self::library_name(ttype, "mag"), star_lib))
            .arg("CAT_IN", self.input_file(morphology).display().to_string())
            .arg("CAT_OUT", self.output_file(morphology).display().to_string())
            .arg("PARA_OUT", self.config.output_path("output.para").display().to_string())
            .arg("GLB_CONTEXT", self.global_context.to_string())
            .arg("PDZ_OUT", self.config.output_path(morphology.name()).display().to_string())
            .arg("MAG_REF", "7")
            .arg("MAG_ABS", mag_abs)
    }

    fn should_run(&self, output: &Path, what: &str) -> bool {
        if output.exists() && !self.lephare.overwrite {
            tracing::info!("Skipping the {} run, {:?} exists.", what, output);
            return false;
        }
        true
    }

    pub fn run_filters(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        self.filter_command().run()
    }

    pub fn run_templates(&self, ttype: TemplateType) -> Result<()> {
        let library = self.magnitude_library(ttype);
        if !self.should_run(&library, &format!("{} template", ttype.name())) {
            return Ok(());
        }

        self.sedtolib_command(ttype).run()?;
        self.mag_gal_command(ttype).run()?;

        if let Err(e) = std::fs::rename(self.work_magnitude_library(ttype), &library) {
            tracing::error!("Could not move the ASCII magnitude library for {}: {}", ttype.name(), e);
        }
        Ok(())
    }

    pub fn run_zphota(&self, morphology: Morphology) -> Result<()> {
        if !self.should_run(&self.output_file(morphology), &format!("{} zphota", morphology)) {
            return Ok(());
        }
        self.zphota_command(morphology).run()?;

        let output = std::fs::read_to_string(self.output_file(morphology))?;
        let rows = output.lines().filter(|l| !l.starts_with('#') && !l.trim().is_empty()).count();
        tracing::info!("zphota fitted {} {} sources", rows, morphology);
        Ok(())
    }

    /// Every run switched on in the configuration
    pub fn run_all(&self) -> Result<()> {
        if self.lephare.run_filters {
            self.run_filters()?;
        }

        if self.lephare.run_templates {
            for morphology in Morphology::ALL {
                self.run_templates(morphology.into())?;
            }
            if self.template_list(TemplateType::Star).is_file() {
                self.run_templates(TemplateType::Star)?;
            }
        }

        if self.lephare.run_zphota {
            for morphology in Morphology::ALL {
                self.run_zphota(morphology)?;
            }
        }
        tracing::debug!("Finished the LePhare commands");
        Ok(())
    }
}

/// Write an assembled table as a LePhare ASCII catalog
///
/// Columns are space separated behind one `#` header line; the trailing
/// `String` column may itself hold spaces.
pub fn write_input(table: &Table, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut w = BufWriter::new(File::create(path)?);
    let names: Vec<&str> = table.column_names().collect();
    writeln!(w, "# {}", names.join(" "))?;

    let columns: Vec<_> = table.columns().map(|(_, c)| c).collect();
    for row in 0..table.n_rows() {
        let cells: Vec<String> = columns.iter().map(|c| c.render(row).unwrap_or_else(|| "-99".to_string())).collect();
        writeln!(w, "{}", cells.join(" "))?;
    }
    w.flush()?;

    tracing::debug!("Wrote LePhare input with {} rows to {:?}", table.n_rows(), path);
    Ok(())
}
