//!
//! Felsenstein's pruning algorithm under the Jukes-Cantor model
//!
//! For each column `i` and each node `v` in post-order:
//!
//! ```text
//! L_v[x] = 1[x = observed base]                       (leaf, base)
//!        = 1                                          (leaf, gap)
//!        = (sum_y P_l[x][y] L_l[y]) (sum_y P_r[x][y] L_r[y])  (internal)
//!
//! P(column i) = (1/4) sum_x L_root[x]
//! ```
//!
//! Each internal vector is divided by its maximum and the log of that
//! factor is accumulated, so that deep trees do not underflow `f64`.
//!
//! Columns are independent of each other, so the per-column loop is run
//! in parallel with rayon when requested. Conditional vectors live in a
//! scratch buffer owned by the caller (one vector per node), never in the
//! tree itself.
//!
use crate::alignment::{Alignment, Symbol, N_BASES};
use crate::error::Result;
use crate::prob::Prob;
use crate::tree::{NodeKind, SubstMatrix, TreeModel};
use rayon::prelude::*;

///
/// Conditional likelihood of the subtree below a node, for each base
/// hypothesis of the node.
///
pub type CondVec = [f64; N_BASES];

///
/// `sum_y P[x][y] v[y]` for each `x`
///
fn pull_up(matrix: &SubstMatrix, v: &CondVec) -> CondVec {
    let mut ret = [0.0; N_BASES];
    for x in 0..N_BASES {
        ret[x] = (0..N_BASES).map(|y| matrix[x][y] * v[y]).sum();
    }
    ret
}

fn leaf_vector(symbol: Symbol) -> CondVec {
    match symbol.index() {
        Some(base) => {
            let mut v = [0.0; N_BASES];
            v[base] = 1.0;
            v
        }
        None => [1.0; N_BASES],
    }
}

impl TreeModel {
    ///
    /// Allocate a scratch buffer for `fill_conditional_vectors`.
    ///
    pub fn new_buffer(&self) -> Vec<CondVec> {
        vec![[0.0; N_BASES]; self.n_nodes()]
    }
    ///
    /// Fill `buf[v]` with the (rescaled) conditional vector of every node `v`
    /// for the given column (`column[j]` is the symbol of sequence `j`).
    ///
    /// Returns the log of the product of the scaling factors; the true
    /// conditional vector of the root is `exp(log_scale) * buf[root]`.
    ///
    pub fn fill_conditional_vectors(&self, column: &[Symbol], buf: &mut [CondVec]) -> f64 {
        let mut log_scale = 0.0;
        for &v in self.post_order() {
            let node = self.node(v);
            buf[v.index()] = match node.kind() {
                NodeKind::Leaf { seq_index } => leaf_vector(column[seq_index]),
                NodeKind::Internal { left, right } => {
                    let l = pull_up(self.node(left).matrix(), &buf[left.index()]);
                    let r = pull_up(self.node(right).matrix(), &buf[right.index()]);
                    let mut v = [0.0; N_BASES];
                    for x in 0..N_BASES {
                        v[x] = l[x] * r[x];
                    }
                    let max = v.iter().copied().fold(0.0, f64::max);
                    // an all-zero vector stays zero and makes the column impossible
                    if max > 0.0 {
                        for x in v.iter_mut() {
                            *x /= max;
                        }
                        log_scale += max.ln();
                    }
                    v
                }
            };
        }
        log_scale
    }
    ///
    /// Likelihood `P(column)` with the uniform prior on the root base, using
    /// a caller-provided scratch buffer.
    ///
    /// Returns `Prob::zero()` (log = -inf) for a column that is impossible
    /// under this tree.
    ///
    pub fn column_likelihood_with(&self, column: &[Symbol], buf: &mut [CondVec]) -> Prob {
        let log_scale = self.fill_conditional_vectors(column, buf);
        let root: f64 = buf[self.root().index()].iter().sum();
        Prob::from_prob(root / N_BASES as f64) * Prob::from_log_prob(log_scale)
    }
    ///
    /// Likelihood of a single column
    ///
    pub fn column_likelihood(&self, column: &[Symbol]) -> Prob {
        let mut buf = self.new_buffer();
        self.column_likelihood_with(column, &mut buf)
    }
    ///
    /// Likelihoods of all columns of the alignment (length `M`).
    ///
    pub fn log_likelihoods(&self, alignment: &Alignment, parallel: bool) -> Result<Vec<Prob>> {
        self.check_n_seqs(alignment.n_seqs())?;
        let columns = alignment.columns();
        let ret = if parallel {
            columns
                .par_iter()
                .map_init(
                    || self.new_buffer(),
                    |buf, column| self.column_likelihood_with(column, buf),
                )
                .collect()
        } else {
            let mut buf = self.new_buffer();
            columns
                .iter()
                .map(|column| self.column_likelihood_with(column, &mut buf))
                .collect()
        };
        Ok(ret)
    }
}
