//! Structured anomaly log produced while reconciling a PDB file.
//!
//! Every recoverable oddity (a masked residue, a patched mismatch, a spurious TER) is reported
//! as one [`Diagnostic`] with a stable tag. Diagnostics are buffered during a parse and handed
//! to a caller-owned [`DiagnosticSink`] once the parse finishes, whether it succeeded or not.

use std::fmt;
use std::io::Write;

/// Stable tags identifying each kind of anomaly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    DupAtomRes,
    NoAtomResId,
    SeqresLen,
    SeqresLenDif,
    NoSeqres,
    NoAtom,
    ChainIds,
    ChainIdSpc,
    SeqresNoAa,
    SeqresFewAa,
    NoProteins,
    TerNone,
    TerTooMany,
    TerTooFew,
    TerMiss,
    ModelDup,
    BadCoord,
    AtomNoCa,
    AtomOneOnly,
    AtomFewAa,
    BadIndex,
    NegNum,
    ZerNum,
    OddNum,
    NonSqntl,
    Mismatch,
    MissCTerm,
    MissNTerm,
    Gapped,
    GappedOk,
    NoMatch,
    SecMiss,
    SecTwoChn,
    SecBarrel,
    SecChain,
    SecBoth,
    SecStart,
    SecEnd,
}

impl DiagnosticCode {
    /// Upper-case tag written at the start of every log line.
    pub fn tag(&self) -> &'static str {
        match self {
            DiagnosticCode::DupAtomRes => "DUPATOMRES",
            DiagnosticCode::NoAtomResId => "NOATOMRESID",
            DiagnosticCode::SeqresLen => "SEQRESLEN",
            DiagnosticCode::SeqresLenDif => "SEQRESLENDIF",
            DiagnosticCode::NoSeqres => "NOSEQRES",
            DiagnosticCode::NoAtom => "NOATOM",
            DiagnosticCode::ChainIds => "CHAINIDS",
            DiagnosticCode::ChainIdSpc => "CHAINIDSPC",
            DiagnosticCode::SeqresNoAa => "SEQRESNOAA",
            DiagnosticCode::SeqresFewAa => "SEQRESFEWAA",
            DiagnosticCode::NoProteins => "NOPROTEINS",
            DiagnosticCode::TerNone => "TERNONE",
            DiagnosticCode::TerTooMany => "TERTOOMANY",
            DiagnosticCode::TerTooFew => "TERTOOFEW",
            DiagnosticCode::TerMiss => "TERMISS",
            DiagnosticCode::ModelDup => "MODELDUP",
            DiagnosticCode::BadCoord => "BADCOORD",
            DiagnosticCode::AtomNoCa => "ATOMNOCA",
            DiagnosticCode::AtomOneOnly => "ATOMONEONLY",
            DiagnosticCode::AtomFewAa => "ATOMFEWAA",
            DiagnosticCode::BadIndex => "BADINDEX",
            DiagnosticCode::NegNum => "NEGNUM",
            DiagnosticCode::ZerNum => "ZERNUM",
            DiagnosticCode::OddNum => "ODDNUM",
            DiagnosticCode::NonSqntl => "NONSQNTL",
            DiagnosticCode::Mismatch => "MISMATCH",
            DiagnosticCode::MissCTerm => "MISSCTERM",
            DiagnosticCode::MissNTerm => "MISSNTERM",
            DiagnosticCode::Gapped => "GAPPED",
            DiagnosticCode::GappedOk => "GAPPEDOK",
            DiagnosticCode::NoMatch => "NOMATCH",
            DiagnosticCode::SecMiss => "SECMISS",
            DiagnosticCode::SecTwoChn => "SECTWOCHN",
            DiagnosticCode::SecBarrel => "SECBARREL",
            DiagnosticCode::SecChain => "SECCHAIN",
            DiagnosticCode::SecBoth => "SECBOTH",
            DiagnosticCode::SecStart => "SECSTART",
            DiagnosticCode::SecEnd => "SECEND",
        }
    }

    /// Whether the code accompanies a failed parse.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DiagnosticCode::NoSeqres | DiagnosticCode::NoAtom | DiagnosticCode::NoProteins
        )
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// One logged anomaly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    /// One-based input line the anomaly was found on.
    pub line: Option<usize>,
    /// Chain identifier as written in the file.
    pub chain: Option<char>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        line: Option<usize>,
        chain: Option<char>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            line,
            chain,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(line) = self.line {
            write!(f, " [line {}]", line)?;
        }
        if let Some(chain) = self.chain {
            write!(f, " [chain {}]", chain)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Receiver for diagnostics emitted by a parse.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Sink that discards everything.
impl DiagnosticSink for () {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

/// In-memory diagnostic collection with lookup helpers.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticLog {
    entries: Vec<Diagnostic>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries carrying `code`.
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }

    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    /// Writes one line per entry.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for entry in &self.entries {
            writeln!(writer, "{}", entry)?;
        }
        Ok(())
    }
}

impl DiagnosticSink for DiagnosticLog {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }
}
