//!
//! Interchangeable decoding strategies
//!
use super::params::HmmParams;
use super::posterior::Posterior;
use super::viterbi::Viterbi;
use crate::emission::EmissionMatrix;
use crate::error::Result;
use crate::prob::Prob;
use serde::{Deserialize, Serialize};

///
/// Hidden state of each column
///
pub type StatePath = Vec<usize>;

///
/// Output of a decoder
///
#[derive(Clone, Debug, PartialEq)]
pub struct Decoding {
    pub path: StatePath,
    ///
    /// Joint probability `P(path, x)` of the decoded path.
    /// Only available for Viterbi decoding.
    pub log_prob: Option<Prob>,
}

///
/// Maps an emission matrix to a state path
///
pub trait Decoder: Send + Sync {
    fn name(&self) -> &'static str;
    fn decode(&self, params: &HmmParams, emissions: &EmissionMatrix) -> Result<Decoding>;
}

///
/// Decoder selectable from the command line and the config file
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DecoderKind {
    Viterbi,
    Posterior,
}

impl Default for DecoderKind {
    fn default() -> Self {
        DecoderKind::Viterbi
    }
}

impl DecoderKind {
    pub fn decoder(&self) -> Box<dyn Decoder> {
        match self {
            DecoderKind::Viterbi => Box::new(Viterbi),
            DecoderKind::Posterior => Box::new(Posterior),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hmm::mocks::*;

    #[test]
    fn decoders_agree_on_clear_signal() {
        let params = mock_two_state_params();
        let e = mock_two_state_emissions();
        for kind in [DecoderKind::Viterbi, DecoderKind::Posterior] {
            let decoder = kind.decoder();
            let d = decoder.decode(&params, &e).unwrap();
            assert_eq!(d.path, vec![0, 0, 0, 1, 1, 1], "{}", decoder.name());
            assert_eq!(d.log_prob.is_some(), kind == DecoderKind::Viterbi);
        }
    }

    #[test]
    fn decoder_kind_serde() {
        assert_eq!(DecoderKind::default(), DecoderKind::Viterbi);
        let s = serde_json::to_string(&DecoderKind::Posterior).unwrap();
        assert_eq!(s, "\"posterior\"");
        let k: DecoderKind = serde_json::from_str("\"viterbi\"").unwrap();
        assert_eq!(k, DecoderKind::Viterbi);
    }
}
