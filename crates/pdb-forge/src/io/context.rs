//! Residue-name lookup tables shared by every stage of the PDB reader.
//!
//! `IoContext` answers the handful of naming questions the reconciliation pipeline asks:
//! which one-letter code a three-letter residue name maps to (including modified residues
//! that alias a standard parent), whether a name is one of the twenty standard amino acids,
//! whether it denotes water, and whether it is an N-/C-terminal capping group.

use crate::model::types::StandardResidue;
use std::collections::{HashMap, HashSet};

/// Residue naming tables used while classifying and aligning PDB records.
///
/// Modified residues resolve to their standard parent for sequence comparison (for example
/// `MSE` reads as `M`) but are never reported as standard amino acids, so Cα masking rules
/// still treat them as non-standard.
#[derive(Debug, Clone)]
pub struct IoContext {
    alias_map: HashMap<String, String>,
    standard_map: HashMap<String, StandardResidue>,
    ambiguous_map: HashMap<String, char>,
    water_names: HashSet<String>,
    capping_groups: HashSet<String>,
}

impl IoContext {
    /// Builds the default tables: standard amino acids, common modified residues, ambiguous
    /// codes (`ASX`, `GLX`), water names, and the `ACE`/`FOR`/`NH2` capping groups.
    pub fn new_default() -> Self {
        let mut alias_map = HashMap::new();
        let mut standard_map = HashMap::new();

        for residue in StandardResidue::ALL {
            standard_map.insert(residue.three_letter().to_string(), residue);
        }

        macro_rules! register_alias {
            ($alias:expr, $canonical:expr) => {
                alias_map.insert($alias.to_string(), $canonical.to_string());
            };
        }

        register_alias!("AIB", "ALA");
        register_alias!("ALM", "ALA");
        register_alias!("AYA", "ALA");
        register_alias!("BNN", "ALA");
        register_alias!("CHG", "ALA");
        register_alias!("CSD", "ALA");
        register_alias!("DAL", "ALA");
        register_alias!("DHA", "ALA");
        register_alias!("DNP", "ALA");
        register_alias!("FLA", "ALA");
        register_alias!("HAC", "ALA");
        register_alias!("MAA", "ALA");
        register_alias!("PRR", "ALA");
        register_alias!("TIH", "ALA");
        register_alias!("TPQ", "ALA");

        register_alias!("ACL", "ARG");
        register_alias!("AGM", "ARG");
        register_alias!("ARM", "ARG");
        register_alias!("DAR", "ARG");
        register_alias!("HAR", "ARG");
        register_alias!("HMR", "ARG");

        register_alias!("MEN", "ASN");

        register_alias!("2AS", "ASP");
        register_alias!("ASA", "ASP");
        register_alias!("ASB", "ASP");
        register_alias!("ASK", "ASP");
        register_alias!("ASL", "ASP");
        register_alias!("ASQ", "ASP");
        register_alias!("BHD", "ASP");
        register_alias!("DAS", "ASP");
        register_alias!("DSP", "ASP");
        register_alias!("IAS", "ASP");

        register_alias!("BCS", "CYS");
        register_alias!("BUC", "CYS");
        register_alias!("C5C", "CYS");
        register_alias!("C6C", "CYS");
        register_alias!("CAS", "CYS");
        register_alias!("CCS", "CYS");
        register_alias!("CEA", "CYS");
        register_alias!("CME", "CYS");
        register_alias!("CSO", "CYS");
        register_alias!("CSP", "CYS");
        register_alias!("CSS", "CYS");
        register_alias!("CSW", "CYS");
        register_alias!("CSX", "CYS");
        register_alias!("CY1", "CYS");
        register_alias!("CY3", "CYS");
        register_alias!("CYG", "CYS");
        register_alias!("CYQ", "CYS");
        register_alias!("DCY", "CYS");
        register_alias!("EFC", "CYS");
        register_alias!("OCS", "CYS");
        register_alias!("PEC", "CYS");
        register_alias!("PR3", "CYS");
        register_alias!("PYX", "CYS");
        register_alias!("SCH", "CYS");
        register_alias!("SCS", "CYS");
        register_alias!("SCY", "CYS");
        register_alias!("SHC", "CYS");
        register_alias!("SMC", "CYS");
        register_alias!("SOC", "CYS");

        register_alias!("5HP", "GLU");
        register_alias!("CGU", "GLU");
        register_alias!("DGL", "GLU");
        register_alias!("GGL", "GLU");
        register_alias!("GMA", "GLU");
        register_alias!("PCA", "GLU");

        register_alias!("DGN", "GLN");

        register_alias!("GL3", "GLY");
        register_alias!("GLZ", "GLY");
        register_alias!("GSC", "GLY");
        register_alias!("MPQ", "GLY");
        register_alias!("MSA", "GLY");
        register_alias!("NMC", "GLY");
        register_alias!("SAR", "GLY");

        register_alias!("3AH", "HIS");
        register_alias!("DHI", "HIS");
        register_alias!("HIC", "HIS");
        register_alias!("MHS", "HIS");
        register_alias!("NEM", "HIS");
        register_alias!("NEP", "HIS");

        register_alias!("DIL", "ILE");
        register_alias!("IIL", "ILE");

        register_alias!("BUG", "LEU");
        register_alias!("CLE", "LEU");
        register_alias!("DLE", "LEU");
        register_alias!("MK8", "LEU");
        register_alias!("MLE", "LEU");
        register_alias!("NLE", "LEU");
        register_alias!("NLN", "LEU");
        register_alias!("NLP", "LEU");

        register_alias!("5OW", "LYS");
        register_alias!("ALY", "LYS");
        register_alias!("DLY", "LYS");
        register_alias!("KCX", "LYS");
        register_alias!("LLP", "LYS");
        register_alias!("LLY", "LYS");
        register_alias!("LYM", "LYS");
        register_alias!("LYZ", "LYS");
        register_alias!("SHR", "LYS");
        register_alias!("TRG", "LYS");

        register_alias!("CXM", "MET");
        register_alias!("FME", "MET");
        register_alias!("MSE", "MET");
        register_alias!("OMT", "MET");

        register_alias!("DAH", "PHE");
        register_alias!("DPN", "PHE");
        register_alias!("HPQ", "PHE");
        register_alias!("PHI", "PHE");
        register_alias!("PHL", "PHE");

        register_alias!("DPR", "PRO");
        register_alias!("HYP", "PRO");

        register_alias!("DSN", "SER");
        register_alias!("MIS", "SER");
        register_alias!("OAS", "SER");
        register_alias!("SAC", "SER");
        register_alias!("SEL", "SER");
        register_alias!("SEP", "SER");
        register_alias!("SET", "SER");
        register_alias!("SVA", "SER");

        register_alias!("ALO", "THR");
        register_alias!("BMT", "THR");
        register_alias!("DTH", "THR");
        register_alias!("TPO", "THR");

        register_alias!("DTR", "TRP");
        register_alias!("HTR", "TRP");
        register_alias!("LTR", "TRP");
        register_alias!("TPL", "TRP");
        register_alias!("TRO", "TRP");

        register_alias!("DTY", "TYR");
        register_alias!("IYR", "TYR");
        register_alias!("PAQ", "TYR");
        register_alias!("PTR", "TYR");
        register_alias!("STY", "TYR");
        register_alias!("TYB", "TYR");
        register_alias!("TYI", "TYR");
        register_alias!("TYQ", "TYR");
        register_alias!("TYS", "TYR");
        register_alias!("TYY", "TYR");

        register_alias!("DIV", "VAL");
        register_alias!("DVA", "VAL");
        register_alias!("MVA", "VAL");

        let ambiguous_map = HashMap::from([("ASX".to_string(), 'B'), ("GLX".to_string(), 'Z')]);

        let water_names = ["HOH", "WAT", "DOD", "H2O", "D2O"]
            .into_iter()
            .map(String::from)
            .collect();

        let capping_groups = ["ACE", "FOR", "NH2"].into_iter().map(String::from).collect();

        Self {
            alias_map,
            standard_map,
            ambiguous_map,
            water_names,
            capping_groups,
        }
    }

    /// Resolves modified-residue aliases to their standard parent name.
    pub fn resolve_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.alias_map.get(name).map(|s| s.as_str()).unwrap_or(name)
    }

    /// Maps a name to its standard residue, following aliases.
    pub fn map_to_standard(&self, name: &str) -> Option<StandardResidue> {
        self.standard_map.get(self.resolve_name(name)).copied()
    }

    /// Registers an additional alias, overwriting any previous mapping.
    pub fn add_alias(&mut self, alias: impl Into<String>, canonical: impl Into<String>) {
        self.alias_map.insert(alias.into(), canonical.into());
    }

    /// One-letter code for a three-letter residue name; `X` when nothing matches.
    pub fn one_letter(&self, name: &str) -> char {
        if let Some(standard) = self.map_to_standard(name) {
            return standard.one_letter();
        }
        self.ambiguous_map.get(name).copied().unwrap_or('X')
    }

    /// True only for the twenty standard amino acid names, not their aliases.
    pub fn is_standard_amino_acid(&self, name: &str) -> bool {
        self.standard_map.contains_key(name)
    }

    pub fn is_water(&self, name: &str) -> bool {
        self.water_names.contains(name)
    }

    pub fn is_capping_group(&self, name: &str) -> bool {
        self.capping_groups.contains(name)
    }

    /// Converts SEQRES tokens into a one-letter sequence.
    ///
    /// # Arguments
    ///
    /// * `tokens` - Three-letter residue names in chain order.
    /// * `strip_capping` - Drops `ACE`, `FOR`, and `NH2` tokens when `true`.
    ///
    /// # Returns
    ///
    /// The one-letter sequence; unknown names become `X`.
    pub fn sequence_from_tokens<S: AsRef<str>>(&self, tokens: &[S], strip_capping: bool) -> String {
        tokens
            .iter()
            .map(|t| t.as_ref())
            .filter(|t| !(strip_capping && self.is_capping_group(t)))
            .map(|t| self.one_letter(t))
            .collect()
    }
}

impl Default for IoContext {
    fn default() -> Self {
        Self::new_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_context_new_default_creates_context_with_mappings() {
        let context = IoContext::new_default();

        assert_eq!(context.standard_map.len(), 20);
        assert!(context.alias_map.contains_key("MSE"));
        assert!(context.water_names.contains("HOH"));
        assert!(context.capping_groups.contains("ACE"));
    }

    #[test]
    fn resolve_name_returns_canonical_for_alias() {
        let context = IoContext::new_default();

        assert_eq!(context.resolve_name("MSE"), "MET");
        assert_eq!(context.resolve_name("DAL"), "ALA");
        assert_eq!(context.resolve_name("ALA"), "ALA");
        assert_eq!(context.resolve_name("XYZ123"), "XYZ123");
    }

    #[test]
    fn one_letter_follows_aliases_and_ambiguous_codes() {
        let context = IoContext::new_default();

        assert_eq!(context.one_letter("GLY"), 'G');
        assert_eq!(context.one_letter("MSE"), 'M');
        assert_eq!(context.one_letter("ASX"), 'B');
        assert_eq!(context.one_letter("GLX"), 'Z');
        assert_eq!(context.one_letter("UNK"), 'X');
        assert_eq!(context.one_letter("HEM"), 'X');
        assert_eq!(context.one_letter("ala"), 'X');
    }

    #[test]
    fn standard_amino_acid_check_excludes_aliases() {
        let context = IoContext::new_default();

        assert!(context.is_standard_amino_acid("TRP"));
        assert!(!context.is_standard_amino_acid("MSE"));
        assert!(!context.is_standard_amino_acid("HOH"));
        assert_eq!(context.map_to_standard("MSE"), Some(StandardResidue::MET));
    }

    #[test]
    fn water_and_capping_names_are_recognized() {
        let context = IoContext::new_default();

        assert!(context.is_water("HOH"));
        assert!(context.is_water("WAT"));
        assert!(!context.is_water("HEM"));
        assert!(context.is_capping_group("NH2"));
        assert!(!context.is_capping_group("ALA"));
    }

    #[test]
    fn sequence_from_tokens_optionally_strips_capping_groups() {
        let context = IoContext::new_default();
        let tokens = ["ACE", "ALA", "MSE", "HEM", "NH2"];

        assert_eq!(context.sequence_from_tokens(&tokens, true), "AMX");
        assert_eq!(context.sequence_from_tokens(&tokens, false), "XAMXX");
    }

    #[test]
    fn add_alias_overwrites_existing_alias() {
        let mut context = IoContext::new_default();

        context.add_alias("MSE", "CYS");
        assert_eq!(context.one_letter("MSE"), 'C');

        context.add_alias(String::from("XLY"), String::from("LYS"));
        assert_eq!(context.one_letter("XLY"), 'K');
    }
}
