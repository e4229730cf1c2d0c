use super::types::{SecondaryAssignment, SecondaryKind};
use smol_str::SmolStr;
use std::fmt;

/// One reconciled residue of a chain, taken from the first model.
#[derive(Debug, Clone, PartialEq)]
pub struct Residue {
    pub model: usize,
    /// Final 1-based chain number.
    pub chain: usize,
    /// 1-based position in the chain sequence.
    pub index: usize,
    /// Residue number text as written in the file.
    pub number: SmolStr,
    /// One-letter code (`X` for anything non-standard without an alias).
    pub code: char,
    /// Three-letter residue name.
    pub name: SmolStr,
    pub secondary: Option<SecondaryAssignment>,
}

impl Residue {
    pub fn new(chain: usize, index: usize, number: &str, code: char, name: &str) -> Self {
        Self {
            model: 1,
            chain,
            index,
            number: SmolStr::new(number),
            code,
            name: SmolStr::new(name),
            secondary: None,
        }
    }

    pub fn secondary_kind(&self) -> Option<SecondaryKind> {
        self.secondary.as_ref().map(|s| s.kind)
    }

    pub fn is_helix(&self) -> bool {
        self.secondary_kind() == Some(SecondaryKind::Helix)
    }

    pub fn is_strand(&self) -> bool {
        self.secondary_kind() == Some(SecondaryKind::Strand)
    }
}

impl fmt::Display for Residue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.secondary {
            Some(sec) => write!(
                f,
                "Residue {{ index: {}, number: \"{}\", name: \"{}\" ({}), element: {} {} }}",
                self.index, self.number, self.name, self.code, sec.kind, sec.id
            ),
            None => write!(
                f,
                "Residue {{ index: {}, number: \"{}\", name: \"{}\" ({}) }}",
                self.index, self.number, self.name, self.code
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residue_new_creates_unassigned_residue() {
        let residue = Residue::new(1, 4, "4", 'G', "GLY");

        assert_eq!(residue.model, 1);
        assert_eq!(residue.index, 4);
        assert_eq!(residue.code, 'G');
        assert!(residue.secondary.is_none());
        assert!(!residue.is_helix());
    }

    #[test]
    fn residue_reports_secondary_kind() {
        let mut residue = Residue::new(1, 1, "1", 'A', "ALA");
        residue.secondary = Some(SecondaryAssignment {
            serial: 1,
            id: SmolStr::new("A"),
            kind: SecondaryKind::Strand,
            helix_class: None,
        });

        assert!(residue.is_strand());
        assert_eq!(residue.secondary_kind(), Some(SecondaryKind::Strand));
        assert_eq!(
            residue.to_string(),
            "Residue { index: 1, number: \"1\", name: \"ALA\" (A), element: E A }"
        );
    }
}
