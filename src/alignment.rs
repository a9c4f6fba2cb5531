//!
//! Multiple sequence alignment
//!
//! * `Symbol`: one aligned character, a base or a gap
//! * `Alignment`: `N` sequences of equal length `M`
//!
//! A column (one position across all sequences) is the unit of
//! likelihood computation.
//!
use crate::error::{PhyloHmmError, Result};
use log::warn;

/// Type of raw DNA sequence
pub type Sequence = Vec<u8>;

///
/// Array of valid DNA bases, in the order used by the substitution matrices
///
pub const VALID_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

///
/// Number of bases (rows/cols of a substitution matrix)
///
pub const N_BASES: usize = 4;

///
/// Aligned symbol
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    A,
    C,
    G,
    T,
    /// gap or ambiguous base; any base is equally possible
    Gap,
}

impl Symbol {
    ///
    /// Convert a raw character into `Symbol`.
    ///
    /// `N` is accepted as an ambiguous base and treated as a gap.
    /// Returns `None` for characters outside the alphabet.
    ///
    pub fn from_byte(byte: u8) -> Option<Symbol> {
        match byte {
            b'A' | b'a' => Some(Symbol::A),
            b'C' | b'c' => Some(Symbol::C),
            b'G' | b'g' => Some(Symbol::G),
            b'T' | b't' => Some(Symbol::T),
            b'-' | b'.' | b'N' | b'n' => Some(Symbol::Gap),
            _ => None,
        }
    }
    ///
    /// index of the base in `VALID_BASES`, or `None` for gap
    ///
    pub fn index(self) -> Option<usize> {
        match self {
            Symbol::A => Some(0),
            Symbol::C => Some(1),
            Symbol::G => Some(2),
            Symbol::T => Some(3),
            Symbol::Gap => None,
        }
    }
    ///
    /// inverse of `index`
    ///
    pub fn from_index(index: usize) -> Symbol {
        match index {
            0 => Symbol::A,
            1 => Symbol::C,
            2 => Symbol::G,
            3 => Symbol::T,
            _ => Symbol::Gap,
        }
    }
    pub fn is_gap(self) -> bool {
        self == Symbol::Gap
    }
    pub fn to_byte(self) -> u8 {
        match self.index() {
            Some(i) => VALID_BASES[i],
            None => b'-',
        }
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.to_byte() as char)
    }
}

///
/// Validated alignment. Immutable once created.
///
/// `rows[j][i]` is the symbol of sequence `j` at column `i`; the
/// transposed `columns[i][j]` is kept as well since the likelihood
/// is computed column by column.
///
#[derive(Clone, Debug, PartialEq)]
pub struct Alignment {
    rows: Vec<Vec<Symbol>>,
    columns: Vec<Vec<Symbol>>,
}

impl Alignment {
    ///
    /// Construct from raw byte sequences.
    ///
    /// All sequences must have the same length, and there must be at
    /// least one sequence.
    ///
    pub fn from_seqs<T: AsRef<[u8]>>(seqs: &[T]) -> Result<Alignment> {
        if seqs.is_empty() {
            return Err(PhyloHmmError::DimensionMismatch(
                "alignment has no sequences".to_string(),
            ));
        }
        let m = seqs[0].as_ref().len();
        let mut rows = Vec::with_capacity(seqs.len());
        let mut n_ambiguous = 0;
        for (j, seq) in seqs.iter().enumerate() {
            let seq = seq.as_ref();
            if seq.len() != m {
                return Err(PhyloHmmError::DimensionMismatch(format!(
                    "sequence {} has length {} but sequence 0 has length {}",
                    j,
                    seq.len(),
                    m
                )));
            }
            let row = seq
                .iter()
                .enumerate()
                .map(|(i, &c)| {
                    if c == b'N' || c == b'n' {
                        n_ambiguous += 1;
                    }
                    Symbol::from_byte(c).ok_or(PhyloHmmError::InvalidSymbol {
                        symbol: c as char,
                        sequence: j,
                        position: i,
                    })
                })
                .collect::<Result<Vec<Symbol>>>()?;
            rows.push(row);
        }
        if n_ambiguous > 0 {
            warn!("{} ambiguous `N` bases were treated as gaps", n_ambiguous);
        }
        Ok(Alignment::from_rows(rows))
    }
    fn from_rows(rows: Vec<Vec<Symbol>>) -> Alignment {
        let m = rows.first().map_or(0, |row| row.len());
        let columns = (0..m)
            .map(|i| rows.iter().map(|row| row[i]).collect())
            .collect();
        Alignment { rows, columns }
    }
    ///
    /// Construct from already-validated symbols.
    ///
    pub fn from_symbols(rows: Vec<Vec<Symbol>>) -> Result<Alignment> {
        if rows.is_empty() {
            return Err(PhyloHmmError::DimensionMismatch(
                "alignment has no sequences".to_string(),
            ));
        }
        let m = rows[0].len();
        if let Some(j) = rows.iter().position(|row| row.len() != m) {
            return Err(PhyloHmmError::DimensionMismatch(format!(
                "sequence {} has length {} but sequence 0 has length {}",
                j,
                rows[j].len(),
                m
            )));
        }
        Ok(Alignment::from_rows(rows))
    }
    /// the number of sequences `N`
    pub fn n_seqs(&self) -> usize {
        self.rows.len()
    }
    /// the number of columns `M`
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }
    pub fn column(&self, i: usize) -> &[Symbol] {
        &self.columns[i]
    }
    pub fn columns(&self) -> &[Vec<Symbol>] {
        &self.columns
    }
    pub fn sequence(&self, j: usize) -> &[Symbol] {
        &self.rows[j]
    }
    ///
    /// Sub-alignment made of the given columns, in the given order
    ///
    pub fn select_columns(&self, columns: &[usize]) -> Alignment {
        let rows = self
            .rows
            .iter()
            .map(|row| columns.iter().map(|&i| row[i]).collect())
            .collect();
        Alignment::from_rows(rows)
    }
    ///
    /// Render back to raw bytes (gaps as `-`)
    ///
    pub fn to_seqs(&self) -> Vec<Sequence> {
        self.rows
            .iter()
            .map(|row| row.iter().map(|s| s.to_byte()).collect())
            .collect()
    }
}
