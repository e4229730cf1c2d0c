use std::fs::File;
use std::io::{self as stdio, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;

use pdb_forge::Structure;
use pdb_forge::io::{DiagnosticLog, IoContext, ParseConfig, read_pdb_structure, write_pdb_structure};

pub mod convert;
pub mod info;

/// Aggregated IO parameters shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct IoParameters {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub log: Option<PathBuf>,
}

/// Command-line overrides applied on top of the default or file-based parser options.
#[derive(Debug, Clone, Default, Args)]
pub struct ParseOverrides {
    /// Minimum number of amino acids a chain needs to be kept.
    #[arg(long, value_name = "N", global = true)]
    pub min_chain_size: Option<usize>,
    /// Mismatches tolerated between SEQRES and ATOM sequences.
    #[arg(long, value_name = "N", global = true)]
    pub max_mismatches: Option<usize>,
    /// Largest terminal segment the aligner may graft onto SEQRES.
    #[arg(long, value_name = "N", global = true)]
    pub max_trim: Option<usize>,
    /// Mask standard amino acids that have no CA atom.
    #[arg(long, global = true)]
    pub mask_standard_without_ca: bool,
    /// Keep non-standard residues that have no CA atom.
    #[arg(long, global = true)]
    pub keep_nonstandard_without_ca: bool,
    /// Keep residues represented by a single atom.
    #[arg(long, global = true)]
    pub keep_single_atom_residues: bool,
    /// Keep ACE, FOR, and NH2 tokens in SEQRES sequences.
    #[arg(long, global = true)]
    pub keep_capping_groups: bool,
}

impl ParseOverrides {
    /// Applies every override that was given; flags only ever flip a default.
    pub fn apply(&self, config: &mut ParseConfig) {
        if let Some(n) = self.min_chain_size {
            config.min_chain_size = n;
        }
        if let Some(n) = self.max_mismatches {
            config.max_mismatches = n;
        }
        if let Some(n) = self.max_trim {
            config.max_trim = n;
        }
        if self.mask_standard_without_ca {
            config.mask_standard_without_ca = true;
        }
        if self.keep_nonstandard_without_ca {
            config.mask_nonstandard_without_ca = false;
        }
        if self.keep_single_atom_residues {
            config.mask_single_atom_residues = false;
        }
        if self.keep_capping_groups {
            config.strip_capping_groups = false;
        }
    }
}

/// Builds the parser options from `--config` and the command-line overrides.
pub fn load_config(params: &IoParameters, overrides: &ParseOverrides) -> Result<ParseConfig> {
    let mut config = match &params.config {
        Some(path) => ParseConfig::from_file(path)
            .with_context(|| format!("Failed to load parser options from {}", path.display()))?,
        None => ParseConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate().context("Invalid parser options")?;
    Ok(config)
}

/// Loads a structure from the configured input source.
///
/// Diagnostics are written to `--log` before a parse failure is reported.
pub fn load_input(params: &IoParameters, config: &ParseConfig) -> Result<(Structure, DiagnosticLog)> {
    let io_context = IoContext::new_default();
    let mut diagnostics = DiagnosticLog::new();

    let result = if let Some(path) = &params.input {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        let reader = BufReader::new(file);
        read_structure(reader, config, &io_context, &mut diagnostics)
            .with_context(|| format!("Failed to parse PDB input from {}", path.display()))
    } else {
        let stdin = stdio::stdin();
        if stdin.is_terminal() {
            bail!(
                "No --input provided and stdin is a TTY. Provide -i/--input or pipe a PDB file into pdbforge."
            );
        }
        let reader = BufReader::new(stdin.lock());
        read_structure(reader, config, &io_context, &mut diagnostics)
            .context("Failed to parse PDB input from stdin")
    };

    if let Some(path) = &params.log {
        write_diagnostics(&diagnostics, path)?;
    }

    Ok((result?, diagnostics))
}

fn read_structure<R: BufRead>(
    reader: R,
    config: &ParseConfig,
    ctx: &IoContext,
    diagnostics: &mut DiagnosticLog,
) -> Result<Structure> {
    run_with_spinner("Reconciling structure", || {
        read_pdb_structure(reader, config, ctx, diagnostics).map_err(anyhow::Error::new)
    })
}

fn write_diagnostics(diagnostics: &DiagnosticLog, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    diagnostics
        .write_to(&mut writer)
        .with_context(|| format!("Failed to write diagnostics to {}", path.display()))?;
    writer.flush().context("Failed to flush log writer")?;
    Ok(())
}

/// Saves a structure to the configured output destination.
pub fn save_output(structure: &Structure, params: &IoParameters) -> Result<()> {
    match params.output.as_deref() {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_pdb_structure(&mut writer, structure)
                .with_context(|| format!("Failed to write PDB output to {}", path.display()))?;
            writer.flush().context("Failed to flush output writer")?
        }
        None => {
            let stdout = stdio::stdout();
            let handle = stdout.lock();
            let mut writer = BufWriter::new(handle);
            write_pdb_structure(&mut writer, structure)
                .context("Failed to write PDB output to stdout")?;
            writer.flush().context("Failed to flush stdout")?;
        }
    }
    Ok(())
}

/// Wraps long-running operations with a spinner rendered to stderr.
pub fn run_with_spinner<T, F>(message: &str, work: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());

    let result = work();

    match &result {
        Ok(_) => spinner.finish_with_message(format!("{} ✓", message)),
        Err(_) => spinner.abandon_with_message(format!("{} ✗", message)),
    }

    result
}

/// Returns true when stdout is a TTY and no explicit output file was supplied.
pub fn interactive_stdout_requested(params: &IoParameters) -> bool {
    params.output.is_none() && stdio::stdout().is_terminal()
}

/// Ensures commands do not dump structured output directly into an interactive terminal.
pub fn ensure_noninteractive_stdout(command: &str, params: &IoParameters) -> Result<()> {
    if interactive_stdout_requested(params) {
        bail!(
            "Refusing to stream {command} results to an interactive terminal. Use -o/--output or pipe the command into a file."
        );
    }
    Ok(())
}
