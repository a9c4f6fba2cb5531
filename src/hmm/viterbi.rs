//!
//! Viterbi algorithm (MAP state path)
//!
//! ```text
//! v_0[a] = init[a] e[a][0]
//! v_i[a] = max_k v_{i-1}[k] trans[k][a] e[a][i]
//! ```
//!
//! The maximizing predecessor is the first one found scanning `k` in
//! ascending order (strict `>`), and so is the terminal state.
//!
use super::decoder::{Decoder, Decoding, StatePath};
use super::params::HmmParams;
use super::{argmax, check_inputs, check_reachable};
use crate::emission::EmissionMatrix;
use crate::error::Result;
use crate::prob::Prob;

///
/// Viterbi decoder
///
#[derive(Clone, Copy, Debug, Default)]
pub struct Viterbi;

impl Decoder for Viterbi {
    fn name(&self) -> &'static str {
        "viterbi"
    }
    fn decode(&self, params: &HmmParams, emissions: &EmissionMatrix) -> Result<Decoding> {
        let (path, log_prob) = params.viterbi(emissions)?;
        Ok(Decoding {
            path,
            log_prob: Some(log_prob),
        })
    }
}

impl HmmParams {
    ///
    /// Most probable state path and its joint probability `P(path, x)`.
    ///
    /// An empty emission table gives an empty path with probability 1.
    /// Fails with `ImpossiblePath` if every path has zero probability.
    ///
    pub fn viterbi(&self, emissions: &EmissionMatrix) -> Result<(StatePath, Prob)> {
        check_inputs(self, emissions)?;
        let m = emissions.n_columns();
        if m == 0 {
            return Ok((Vec::new(), Prob::one()));
        }

        // tables[i][a] = v_i[a], backtracks[i][a] = argmax predecessor of a at i
        let mut tables = Vec::with_capacity(m);
        let mut backtracks = Vec::with_capacity(m);
        tables.push(self.v_init(emissions));
        backtracks.push(Vec::new());
        for i in 1..m {
            let (table, backtrack) = self.v_step(i, emissions, &tables[i - 1]);
            tables.push(table);
            backtracks.push(backtrack);
        }

        check_reachable(&tables)?;
        let (last, prob) = argmax(tables[m - 1].iter().copied());
        let mut path = vec![last; m];
        for i in (1..m).rev() {
            path[i - 1] = backtracks[i][path[i]];
        }
        Ok((path, prob))
    }
    fn v_init(&self, emissions: &EmissionMatrix) -> Vec<Prob> {
        (0..self.n_states())
            .map(|a| self.init(a) * emissions.get(a, 0))
            .collect()
    }
    fn v_step(
        &self,
        i: usize,
        emissions: &EmissionMatrix,
        prev: &[Prob],
    ) -> (Vec<Prob>, Vec<usize>) {
        (0..self.n_states())
            .map(|a| {
                let (k, best) =
                    argmax((0..self.n_states()).map(|k| prev[k] * self.trans(k, a)));
                (best * emissions.get(a, i), k)
            })
            .unzip()
    }
}
