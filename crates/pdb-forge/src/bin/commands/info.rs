use std::collections::BTreeMap;
use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Args;
use prettytable::{Table, format, row};

use pdb_forge::io::DiagnosticLog;
use pdb_forge::{Chain, ExperimentalMethod, Structure};

/// Report-only command that summarizes a reconciled structure.
#[derive(Debug, Default, Args)]
pub struct InfoArgs {
    /// Also print a per-code breakdown of parse diagnostics.
    #[arg(long)]
    pub diagnostics: bool,
}

/// Prints chain and structure statistics to stderr.
pub fn run(structure: &Structure, diagnostics: &DiagnosticLog, args: &InfoArgs) -> Result<()> {
    let reports: Vec<ChainReport> = structure.iter_chains().map(ChainReport::from_chain).collect();
    let mut stderr = io::stderr().lock();

    print_boxed_label(&mut stderr, "PDB Forge Structure Report")?;
    writeln!(&mut stderr)?;

    let mut chain_table = Table::new();
    print_boxed_label(&mut stderr, "Chain Breakdown")?;
    chain_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    chain_table.set_titles(row![
        "Chain", "Length", "Residues", "Atoms", "Ligands", "Helices", "Strands", "Sheets",
        "Turns", "Numbering"
    ]);
    for report in &reports {
        chain_table.add_row(row![
            report.id,
            report.length,
            report.residues,
            report.atoms,
            report.ligands,
            report.helices,
            report.strands,
            report.sheets,
            report.turns,
            report.numbering
        ]);
    }
    chain_table
        .print(&mut stderr)
        .context("Failed to render chain summary")?;
    writeln!(&mut stderr)?;

    let mut summary_table = Table::new();
    print_boxed_label(&mut stderr, "Structure Summary")?;
    summary_table.set_format(*format::consts::FORMAT_BOX_CHARS);
    summary_table.set_titles(row!["Metric", "Value"]);
    summary_table.add_row(row![
        "PDB ID",
        structure.pdb_id().unwrap_or("Not specified")
    ]);
    summary_table.add_row(row!["Method", structure.method()]);
    summary_table.add_row(row!["Resolution (Å)", resolution_label(structure)]);
    summary_table.add_row(row!["Models", structure.model_count()]);
    summary_table.add_row(row!["Chains", structure.chain_count()]);
    summary_table.add_row(row!["Residues", structure.residue_count()]);
    summary_table.add_row(row!["Atoms", structure.atom_count()]);
    summary_table.add_row(row!["Free Groups", structure.group_count()]);
    summary_table.add_row(row!["Water Atoms", structure.waters().len()]);
    summary_table.add_row(row!["Diagnostics", diagnostics.len()]);
    summary_table
        .print(&mut stderr)
        .context("Failed to render structure summary")?;

    if args.diagnostics && !diagnostics.is_empty() {
        writeln!(&mut stderr)?;
        let mut code_table = Table::new();
        print_boxed_label(&mut stderr, "Diagnostics")?;
        code_table.set_format(*format::consts::FORMAT_BOX_CHARS);
        code_table.set_titles(row!["Code", "Count"]);
        for (code, count) in count_codes(diagnostics) {
            code_table.add_row(row![code, count]);
        }
        code_table
            .print(&mut stderr)
            .context("Failed to render diagnostic summary")?;
    }

    Ok(())
}

fn resolution_label(structure: &Structure) -> String {
    match (structure.method(), structure.resolution()) {
        (ExperimentalMethod::Nmr, _) => "Not applicable".to_string(),
        (_, Some(value)) => format!("{value:.2}"),
        (_, None) => "Not specified".to_string(),
    }
}

fn count_codes(diagnostics: &DiagnosticLog) -> BTreeMap<&'static str, usize> {
    let mut counts = BTreeMap::new();
    for diagnostic in diagnostics.entries() {
        *counts.entry(diagnostic.code.tag()).or_insert(0) += 1;
    }
    counts
}

fn print_boxed_label<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    let inner = format!(" {title} ");
    let width = inner.chars().count();
    writeln!(writer, "╭{}╮", "─".repeat(width))?;
    writeln!(writer, "│{}│", inner)?;
    writeln!(writer, "╰{}╯", "─".repeat(width))?;
    Ok(())
}

#[derive(Debug)]
struct ChainReport {
    id: char,
    length: usize,
    residues: usize,
    atoms: usize,
    ligands: usize,
    helices: usize,
    strands: usize,
    sheets: usize,
    turns: usize,
    numbering: &'static str,
}

impl ChainReport {
    fn from_chain(chain: &Chain) -> Self {
        Self {
            id: chain.id,
            length: chain.len(),
            residues: chain.residue_count(),
            atoms: chain.atoms().len(),
            ligands: chain.ligand_count,
            helices: chain.elements.helices,
            strands: chain.elements.strands,
            sheets: chain.elements.sheets,
            turns: chain.elements.turns,
            numbering: if chain.uses_alt_numbering {
                "Alternate"
            } else {
                "Heterogeneity"
            },
        }
    }
}
