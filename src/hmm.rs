//!
//! Hidden Markov model over the alignment columns
//!
//! Hidden states are the tree models (one per state); a column is emitted
//! with the likelihood of the state's tree (`crate::emission`).
//!
//! * `params`: transition matrix and initial distribution
//! * `viterbi`: MAP state path
//! * `posterior`: Forward-Backward and per-column posterior decoding
//! * `decoder`: the `Decoder` trait selecting one of them at run time
//!
pub mod decoder;
pub mod mocks;
pub mod params;
pub mod posterior;
pub mod viterbi;

pub use decoder::{Decoder, DecoderKind, Decoding, StatePath};
pub use params::HmmParams;
pub use posterior::{Posterior, PosteriorTable};
pub use viterbi::Viterbi;

use crate::emission::EmissionMatrix;
use crate::error::{PhyloHmmError, Result};
use crate::prob::Prob;

///
/// Common preconditions of the decoders: the emission matrix has one row
/// per hidden state and no column is impossible under every state.
///
pub fn check_inputs(params: &HmmParams, emissions: &EmissionMatrix) -> Result<()> {
    if params.n_states() != emissions.n_states() {
        return Err(PhyloHmmError::DimensionMismatch(format!(
            "{} hidden states in the transition matrix but {} in the emission matrix",
            params.n_states(),
            emissions.n_states()
        )));
    }
    emissions.check()
}

///
/// Fails with `ImpossiblePath` on the first column whose forward (or
/// Viterbi) row is zero for every state. Every later row is zero too.
///
pub fn check_reachable(tables: &[Vec<Prob>]) -> Result<()> {
    match tables.iter().position(|row| row.iter().all(|x| x.is_zero())) {
        Some(i) => Err(PhyloHmmError::ImpossiblePath(i)),
        None => Ok(()),
    }
}

///
/// Index and value of the maximum; the lowest index wins ties.
///
/// Returns `(0, Prob::zero())` for an all-zero (or empty) input.
///
pub fn argmax<I: IntoIterator<Item = Prob>>(xs: I) -> (usize, Prob) {
    let mut best = (0, Prob::zero());
    for (k, x) in xs.into_iter().enumerate() {
        if k == 0 || x > best.1 {
            best = (k, x);
        }
    }
    best
}
