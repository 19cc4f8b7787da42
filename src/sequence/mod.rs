//! Residue alphabets, encoded sequences and the subject source interface.
//!
//! Residues are stored as small integer codes so the scoring matrix can be
//! indexed directly:
//! - nucleotide: `ACGT` occupy codes 0-3, IUPAC ambiguity codes follow
//! - protein: NCBI matrix order `ARNDCQEGHILKMFPSTWYVBJZX*`

pub mod translation;

use std::borrow::Cow;

use crate::error::{BlastError, BlastResult};

/// Nucleotide symbols in code order. Only the first four are real bases.
pub const NUCLEOTIDE_SYMBOLS: &[u8] = b"ACGTBDHKMNRSVWY";

/// Protein symbols in NCBI matrix order.
pub const PROTEIN_SYMBOLS: &[u8] = b"ARNDCQEGHILKMFPSTWYVBJZX*";

/// Number of unambiguous bases (A, C, G, T).
pub const NUM_BASES: u8 = 4;

/// Code of `N` in the nucleotide alphabet.
pub const NT_N: u8 = 9;

/// Code of `X` in the protein alphabet.
pub const AA_X: u8 = 23;

/// Code of `*` in the protein alphabet.
pub const AA_STOP: u8 = 24;

const INVALID: u8 = 0xFF;

const fn build_encoding(symbols: &[u8]) -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < symbols.len() {
        let c = symbols[i];
        table[c as usize] = i as u8;
        if c.is_ascii_uppercase() {
            table[c.to_ascii_lowercase() as usize] = i as u8;
        }
        i += 1;
    }
    table
}

static NUCLEOTIDE_ENCODING: [u8; 256] = {
    let mut table = build_encoding(NUCLEOTIDE_SYMBOLS);
    // RNA input
    table[b'U' as usize] = 3;
    table[b'u' as usize] = 3;
    table
};

static PROTEIN_ENCODING: [u8; 256] = build_encoding(PROTEIN_SYMBOLS);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alphabet {
    Nucleotide,
    Protein,
}

impl Alphabet {
    pub fn symbols(self) -> &'static [u8] {
        match self {
            Alphabet::Nucleotide => NUCLEOTIDE_SYMBOLS,
            Alphabet::Protein => PROTEIN_SYMBOLS,
        }
    }

    pub fn size(self) -> usize {
        self.symbols().len()
    }

    #[inline]
    pub fn encode(self, symbol: u8) -> Option<u8> {
        let code = match self {
            Alphabet::Nucleotide => NUCLEOTIDE_ENCODING[symbol as usize],
            Alphabet::Protein => PROTEIN_ENCODING[symbol as usize],
        };
        (code != INVALID).then_some(code)
    }

    /// Decode a residue code; codes outside the alphabet render as the
    /// wildcard (`N` or `X`).
    #[inline]
    pub fn decode(self, code: u8) -> u8 {
        match self.symbols().get(code as usize) {
            Some(&c) => c,
            None => self.wildcard_symbol(),
        }
    }

    pub fn wildcard(self) -> u8 {
        match self {
            Alphabet::Nucleotide => NT_N,
            Alphabet::Protein => AA_X,
        }
    }

    fn wildcard_symbol(self) -> u8 {
        match self {
            Alphabet::Nucleotide => b'N',
            Alphabet::Protein => b'X',
        }
    }
}

/// Encode raw text residues, reporting the first symbol outside the
/// alphabet together with its position.
pub fn encode_residues(raw: &[u8], alphabet: Alphabet, name: &str) -> BlastResult<Vec<u8>> {
    raw.iter()
        .enumerate()
        .map(|(position, &c)| {
            alphabet
                .encode(c)
                .ok_or_else(|| BlastError::InvalidCharacter {
                    sequence: name.to_string(),
                    symbol: c as char,
                    position,
                })
        })
        .collect()
}

/// An immutable encoded sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    id: String,
    residues: Vec<u8>,
    alphabet: Alphabet,
}

impl Sequence {
    /// Build a sequence from text. Whitespace is not accepted.
    pub fn new(id: impl Into<String>, raw: &[u8], alphabet: Alphabet) -> BlastResult<Self> {
        let id = id.into();
        let residues = encode_residues(raw, alphabet, &id)?;
        Ok(Self {
            id,
            residues,
            alphabet,
        })
    }

    /// Wrap residues that are already encoded for `alphabet`.
    pub fn from_encoded(id: impl Into<String>, residues: Vec<u8>, alphabet: Alphabet) -> Self {
        debug_assert!(residues.iter().all(|&c| (c as usize) < alphabet.size()));
        Self {
            id: id.into(),
            residues,
            alphabet,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn residues(&self) -> &[u8] {
        &self.residues
    }

    pub fn len(&self) -> usize {
        self.residues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.residues.is_empty()
    }

    pub fn alphabet(&self) -> Alphabet {
        self.alphabet
    }

    pub fn to_text(&self) -> String {
        self.residues
            .iter()
            .map(|&c| self.alphabet.decode(c) as char)
            .collect()
    }
}

/// Provider of subject sequences by ordinal id.
///
/// The search core calls only these three operations and does no I/O of
/// its own. A source may return `None` for an ordinal it cannot serve;
/// that subject is skipped.
pub trait SequenceSource: Sync {
    fn get_sequence(&self, oid: usize) -> Option<Cow<'_, Sequence>>;

    fn sequence_count(&self) -> usize;

    fn max_sequence_length(&self) -> usize;
}

/// Total residue count and number of sequences served by `source`.
pub fn database_totals<S: SequenceSource + ?Sized>(source: &S) -> (u64, usize) {
    let mut total = 0u64;
    let mut count = 0usize;
    for oid in 0..source.sequence_count() {
        if let Some(seq) = source.get_sequence(oid) {
            total += seq.len() as u64;
            count += 1;
        }
    }
    (total, count)
}

/// Subject source backed by a vector of sequences.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    sequences: Vec<Sequence>,
    max_length: usize,
}

impl InMemorySource {
    pub fn new(sequences: Vec<Sequence>) -> Self {
        let max_length = sequences.iter().map(Sequence::len).max().unwrap_or(0);
        Self {
            sequences,
            max_length,
        }
    }

    pub fn push(&mut self, sequence: Sequence) {
        self.max_length = self.max_length.max(sequence.len());
        self.sequences.push(sequence);
    }

    pub fn sequences(&self) -> &[Sequence] {
        &self.sequences
    }
}

impl SequenceSource for InMemorySource {
    fn get_sequence(&self, oid: usize) -> Option<Cow<'_, Sequence>> {
        self.sequences.get(oid).map(Cow::Borrowed)
    }

    fn sequence_count(&self) -> usize {
        self.sequences.len()
    }

    fn max_sequence_length(&self) -> usize {
        self.max_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nucleotide_encoding() {
        assert_eq!(Alphabet::Nucleotide.encode(b'A'), Some(0));
        assert_eq!(Alphabet::Nucleotide.encode(b't'), Some(3));
        assert_eq!(Alphabet::Nucleotide.encode(b'U'), Some(3));
        assert_eq!(Alphabet::Nucleotide.encode(b'N'), Some(NT_N));
        assert_eq!(Alphabet::Nucleotide.encode(b'Z'), None);
    }

    #[test]
    fn test_protein_encoding() {
        assert_eq!(Alphabet::Protein.encode(b'A'), Some(0));
        assert_eq!(Alphabet::Protein.encode(b'X'), Some(AA_X));
        assert_eq!(Alphabet::Protein.encode(b'*'), Some(AA_STOP));
        assert_eq!(Alphabet::Protein.decode(AA_STOP), b'*');
        assert_eq!(Alphabet::Protein.encode(b'1'), None);
    }

    #[test]
    fn test_invalid_character_position() {
        let err = Sequence::new("q", b"ACGZT", Alphabet::Nucleotide).unwrap_err();
        match err {
            BlastError::InvalidCharacter {
                symbol, position, ..
            } => {
                assert_eq!(symbol, 'Z');
                assert_eq!(position, 3);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_in_memory_source() {
        let mut source = InMemorySource::default();
        source.push(Sequence::new("a", b"ACGT", Alphabet::Nucleotide).unwrap());
        source.push(Sequence::new("b", b"ACGTACGT", Alphabet::Nucleotide).unwrap());
        assert_eq!(source.sequence_count(), 2);
        assert_eq!(source.max_sequence_length(), 8);
        assert!(source.get_sequence(2).is_none());
        assert_eq!(database_totals(&source), (12, 2));
    }
}
