//!
//! Forward-Backward algorithm and posterior decoding
//!
//! ```text
//! f_i[a] = P(x[..=i], s_i = a)
//! b_i[a] = P(x[i+1..] | s_i = a)
//! P(s_i = a | x) = f_i[a] b_i[a] / sum_k f_i[k] b_i[k]
//! ```
//!
//! The decoded path is the per-column argmax of the posterior. It maximizes
//! the expected number of correctly labelled columns, not the joint
//! probability of the path, so it can contain a transition whose probability
//! is zero. No joint probability is reported for it.
//!
use super::decoder::{Decoder, Decoding, StatePath};
use super::params::HmmParams;
use super::{argmax, check_inputs, check_reachable};
use crate::emission::EmissionMatrix;
use crate::error::Result;
use crate::prob::Prob;

///
/// Posterior decoder
///
#[derive(Clone, Copy, Debug, Default)]
pub struct Posterior;

impl Decoder for Posterior {
    fn name(&self) -> &'static str {
        "posterior"
    }
    fn decode(&self, params: &HmmParams, emissions: &EmissionMatrix) -> Result<Decoding> {
        let (table, _) = Posterior::posteriors(params, emissions)?;
        Ok(Decoding {
            path: table.argmax_path(),
            log_prob: None,
        })
    }
}

impl Posterior {
    ///
    /// Per-column posterior distribution of the hidden states, and the full
    /// probability `P(x)` from the forward pass.
    ///
    /// Fails with `ImpossiblePath` if `P(x)` is zero, since the posterior
    /// is undefined then.
    ///
    pub fn posteriors(
        params: &HmmParams,
        emissions: &EmissionMatrix,
    ) -> Result<(PosteriorTable, Prob)> {
        check_inputs(params, emissions)?;
        let forward = params.forward(emissions);
        check_reachable(&forward)?;
        let backward = params.backward(emissions);
        let full_prob = match forward.last() {
            Some(table) => table.iter().sum(),
            None => Prob::one(),
        };
        let table = forward
            .iter()
            .zip(backward.iter())
            .map(|(f, b)| {
                let joint: Vec<Prob> = f.iter().zip(b.iter()).map(|(&f, &b)| f * b).collect();
                let total: Prob = joint.iter().sum();
                joint.into_iter().map(|x| x / total).collect()
            })
            .collect();
        Ok((PosteriorTable { table }, full_prob))
    }
}

///
/// `table[i][a]` = P(state `a` at column `i` | all columns)
///
#[derive(Clone, Debug, PartialEq)]
pub struct PosteriorTable {
    table: Vec<Vec<Prob>>,
}

impl PosteriorTable {
    pub fn n_columns(&self) -> usize {
        self.table.len()
    }
    pub fn get(&self, column: usize, state: usize) -> Prob {
        self.table[column][state]
    }
    pub fn column(&self, column: usize) -> &[Prob] {
        &self.table[column]
    }
    ///
    /// Most probable state of each column (lowest state on ties)
    ///
    pub fn argmax_path(&self) -> StatePath {
        self.table
            .iter()
            .map(|column| argmax(column.iter().copied()).0)
            .collect()
    }
}

impl HmmParams {
    ///
    /// Forward tables, `tables[i][a] = f_i[a]`
    ///
    /// ```text
    /// f_0[a] = init[a] e[a][0]
    /// f_i[a] = sum_k f_{i-1}[k] trans[k][a] e[a][i]
    /// ```
    ///
    pub fn forward(&self, emissions: &EmissionMatrix) -> Vec<Vec<Prob>> {
        let m = emissions.n_columns();
        let mut tables: Vec<Vec<Prob>> = Vec::with_capacity(m);
        for i in 0..m {
            let table = if i == 0 {
                self.f_init(emissions)
            } else {
                self.f_step(i, emissions, &tables[i - 1])
            };
            tables.push(table);
        }
        tables
    }
    fn f_init(&self, emissions: &EmissionMatrix) -> Vec<Prob> {
        (0..self.n_states())
            .map(|a| self.init(a) * emissions.get(a, 0))
            .collect()
    }
    fn f_step(&self, i: usize, emissions: &EmissionMatrix, prev: &[Prob]) -> Vec<Prob> {
        (0..self.n_states())
            .map(|a| {
                let p: Prob = (0..self.n_states())
                    .map(|k| prev[k] * self.trans(k, a))
                    .sum();
                p * emissions.get(a, i)
            })
            .collect()
    }
    ///
    /// Backward tables, `tables[i][a] = b_i[a]`
    ///
    /// ```text
    /// b_{M-1}[a] = 1
    /// b_i[a] = sum_k trans[a][k] e[k][i+1] b_{i+1}[k]
    /// ```
    ///
    pub fn backward(&self, emissions: &EmissionMatrix) -> Vec<Vec<Prob>> {
        let m = emissions.n_columns();
        let mut tables: Vec<Vec<Prob>> = Vec::with_capacity(m);
        for i in (0..m).rev() {
            let table = match tables.last() {
                None => vec![Prob::one(); self.n_states()],
                Some(next) => self.b_step(i, emissions, next),
            };
            tables.push(table);
        }
        // order the tables along with the columns
        tables.reverse();
        tables
    }
    fn b_step(&self, i: usize, emissions: &EmissionMatrix, next: &[Prob]) -> Vec<Prob> {
        (0..self.n_states())
            .map(|a| {
                (0..self.n_states())
                    .map(|k| self.trans(a, k) * emissions.get(k, i + 1) * next[k])
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhyloHmmError;
    use crate::hmm::mocks::*;

    #[test]
    fn two_state_switch() {
        let params = mock_two_state_params();
        let e = mock_two_state_emissions();
        let d = Posterior.decode(&params, &e).unwrap();
        assert_eq!(d.path, vec![0, 0, 0, 1, 1, 1]);
        assert_eq!(d.log_prob, None);
    }

    #[test]
    fn full_prob_is_sum_over_all_paths() {
        for seed in 0..3 {
            let params = mock_random_params(3, seed);
            let e = mock_random_emissions(3, 5, seed + 10);
            let total: Prob = all_paths(3, 5)
                .iter()
                .map(|path| params.path_prob(&e, path))
                .sum();
            let (_, full_prob) = Posterior::posteriors(&params, &e).unwrap();
            assert_abs_diff_eq!(full_prob, total, epsilon = 1e-9);

            // backward pass gives the same full probability
            let backward = params.backward(&e);
            let from_backward: Prob = (0..3)
                .map(|a| params.init(a) * e.get(a, 0) * backward[0][a])
                .sum();
            assert_abs_diff_eq!(from_backward, total, epsilon = 1e-9);
        }
    }

    #[test]
    fn posteriors_are_marginals() {
        let params = mock_random_params(2, 7);
        let e = mock_random_emissions(2, 4, 8);
        let (table, full_prob) = Posterior::posteriors(&params, &e).unwrap();
        for i in 0..4 {
            for a in 0..2 {
                let marginal: Prob = all_paths(2, 4)
                    .iter()
                    .filter(|path| path[i] == a)
                    .map(|path| params.path_prob(&e, path))
                    .sum();
                assert_abs_diff_eq!(table.get(i, a), marginal / full_prob, epsilon = 1e-9);
            }
        }
    }

    #[test]
    fn posteriors_sum_to_one() {
        let ninf = f64::NEG_INFINITY;
        let params = HmmParams::switching(3, 0.2).unwrap();
        let e = EmissionMatrix::from_log_values(vec![
            vec![-1.0, ninf, -3.0, -700.0, -2.0],
            vec![-2.0, -1.0, ninf, -800.0, -2.0],
            vec![ninf, -4.0, -1.0, -750.0, -2.0],
        ])
        .unwrap();
        let (table, full_prob) = Posterior::posteriors(&params, &e).unwrap();
        assert!(full_prob.is_valid());
        assert_eq!(table.n_columns(), 5);
        for i in 0..table.n_columns() {
            let sum: Prob = table.column(i).iter().sum();
            assert_abs_diff_eq!(sum.to_value(), 1.0, epsilon = 1e-9);
            assert!(table.column(i).iter().all(|x| x.is_valid()));
        }
        // impossible states have zero posterior
        assert!(table.get(1, 0).is_zero());
        assert!(table.get(0, 2).is_zero());
    }

    #[test]
    fn degenerate_column_is_reported() {
        let ninf = f64::NEG_INFINITY;
        let params = HmmParams::uniform(2).unwrap();
        let e = EmissionMatrix::from_log_values(vec![vec![ninf, -1.0], vec![ninf, -1.0]])
            .unwrap();
        assert!(matches!(
            Posterior.decode(&params, &e),
            Err(PhyloHmmError::DegenerateColumn(0))
        ));
    }

    #[test]
    fn zero_probability_path_is_reported() {
        let ninf = f64::NEG_INFINITY;
        let params =
            HmmParams::from_probs(&[vec![1.0, 0.0], vec![0.0, 1.0]], &[0.5, 0.5]).unwrap();
        let e = EmissionMatrix::from_log_values(vec![
            vec![-1.0, ninf, -1.0],
            vec![ninf, -1.0, -1.0],
        ])
        .unwrap();
        assert!(matches!(
            Posterior.decode(&params, &e),
            Err(PhyloHmmError::ImpossiblePath(1))
        ));
    }

    #[test]
    fn empty_alignment() {
        let params = HmmParams::uniform(2).unwrap();
        let e = EmissionMatrix::from_log_values(vec![vec![], vec![]]).unwrap();
        let (table, full_prob) = Posterior::posteriors(&params, &e).unwrap();
        assert_eq!(table.n_columns(), 0);
        assert!(full_prob.is_one());
        assert!(Posterior.decode(&params, &e).unwrap().path.is_empty());
    }
}
