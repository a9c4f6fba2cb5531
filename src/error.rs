//!
//! Error type shared by the tree model, the decoders and the trainer.
//!
//! Structural errors (topology, dimensions, symbols) abort the computation.
//! Numerical edge cases are absorbed in log space and only surface as
//! `DegenerateColumn`, `ImpossiblePath` or `UnvisitedState` when they
//! cannot be resolved.
//!
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhyloHmmError {
    /// Unparsable tree string, out-of-range or duplicate leaf name
    #[error("malformed topology: {0}")]
    MalformedTopology(String),

    /// Unequal sequence lengths, non-square transition matrix, etc.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Column whose likelihood is zero under every hidden state
    #[error("column {0} has zero likelihood under every hidden state")]
    DegenerateColumn(usize),

    /// Every state path has zero probability from this column on
    /// (zero transitions meeting impossible emissions)
    #[error("no state path with non-zero probability reaches column {0}")]
    ImpossiblePath(usize),

    /// Hidden state with no outgoing transition in a decoded path
    #[error("state {0} has no outgoing transition in the decoded path")]
    UnvisitedState(usize),

    /// Character outside of the alignment alphabet
    #[error("invalid symbol {symbol:?} in sequence {sequence} at position {position}")]
    InvalidSymbol {
        symbol: char,
        sequence: usize,
        position: usize,
    },

    /// Out-of-range numerical parameter (probabilities, weights, ...)
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed auxiliary input file (matrix, weights, json config)
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, PhyloHmmError>;

impl From<serde_json::Error> for PhyloHmmError {
    fn from(err: serde_json::Error) -> Self {
        PhyloHmmError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = PhyloHmmError::DegenerateColumn(3);
        assert_eq!(
            e.to_string(),
            "column 3 has zero likelihood under every hidden state"
        );
        let e = PhyloHmmError::InvalidSymbol {
            symbol: 'X',
            sequence: 1,
            position: 7,
        };
        assert_eq!(
            e.to_string(),
            "invalid symbol 'X' in sequence 1 at position 7"
        );
        let e = PhyloHmmError::ImpossiblePath(1);
        assert_eq!(
            e.to_string(),
            "no state path with non-zero probability reaches column 1"
        );
        let e = PhyloHmmError::MalformedTopology("unmatched '('".to_string());
        assert_eq!(e.to_string(), "malformed topology: unmatched '('");
    }

    #[test]
    fn io_error_converts() {
        fn open() -> Result<std::fs::File> {
            Ok(std::fs::File::open("/nonexistent/alignment.fa")?)
        }
        assert!(matches!(open(), Err(PhyloHmmError::Io(_))));
    }
}
