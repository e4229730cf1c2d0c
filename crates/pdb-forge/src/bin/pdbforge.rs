use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};

mod commands;

use commands::{IoParameters, ParseOverrides};
use commands::{convert, info};

#[derive(Parser, Debug)]
#[command(
    name = "pdbforge",
    about = "A command-line tool that reconciles SEQRES and ATOM residue numbering in legacy PDB files.",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Input file path. When omitted, stdin is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    input: Option<PathBuf>,
    /// Output file path. When omitted, stdout is used.
    #[arg(short, long, value_name = "FILE", global = true)]
    output: Option<PathBuf>,
    /// TOML file with parser options.
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Write parse diagnostics to this file.
    #[arg(long = "log", value_name = "FILE", global = true)]
    log: Option<PathBuf>,
    #[command(flatten)]
    overrides: ParseOverrides,
    /// Increase logging verbosity (-v warnings, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse the structure and print chain and summary tables.
    Info(info::InfoArgs),
    /// Parse the structure and write the reconciled result as PDB.
    Convert(convert::ConvertArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "error",
        1 => "warn",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let io_params = IoParameters {
        input: cli.input.clone(),
        output: cli.output.clone(),
        config: cli.config.clone(),
        log: cli.log.clone(),
    };

    match cli.command {
        Command::Info(args) => {
            let config = commands::load_config(&io_params, &cli.overrides)?;
            let (structure, diagnostics) = commands::load_input(&io_params, &config)?;
            info::run(&structure, &diagnostics, &args)?;
        }
        Command::Convert(args) => {
            commands::ensure_noninteractive_stdout("convert", &io_params)?;
            let config = commands::load_config(&io_params, &cli.overrides)?;
            let (structure, _) = commands::load_input(&io_params, &config)?;
            let structure = convert::run(structure, &args)?;
            commands::save_output(&structure, &io_params)?;
        }
    }

    Ok(())
}
