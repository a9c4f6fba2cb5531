//!
//! Emission model of the phylo-HMM
//!
//! `E[a][i]` = P(column i | hidden state a) computed by the tree model of
//! state `a`. Stored as `Prob` (log space), so impossible columns are
//! `Prob::zero()` and never NaN.
//!
use crate::alignment::Alignment;
use crate::error::{PhyloHmmError, Result};
use crate::prob::Prob;
use crate::tree::TreeModel;
use log::{debug, warn};

///
/// `A x M` table of per-column likelihoods
///
#[derive(Clone, Debug, PartialEq)]
pub struct EmissionMatrix {
    table: Vec<Vec<Prob>>,
}

impl EmissionMatrix {
    ///
    /// Run the likelihood computation once per hidden state.
    ///
    pub fn build(
        models: &[TreeModel],
        alignment: &Alignment,
        parallel: bool,
    ) -> Result<EmissionMatrix> {
        if models.is_empty() {
            return Err(PhyloHmmError::DimensionMismatch(
                "at least one hidden state (tree model) is required".to_string(),
            ));
        }
        let table = models
            .iter()
            .enumerate()
            .map(|(a, model)| {
                let row = model.log_likelihoods(alignment, parallel)?;
                let total: Prob = row.iter().product();
                debug!("state {} log P(alignment) = {}", a, total.to_log_value());
                Ok(row)
            })
            .collect::<Result<Vec<Vec<Prob>>>>()?;
        let e = EmissionMatrix { table };
        e.warn_partially_degenerate();
        Ok(e)
    }
    ///
    /// Construct from a precomputed table `table[state][column]`.
    ///
    pub fn from_table(table: Vec<Vec<Prob>>) -> Result<EmissionMatrix> {
        if table.is_empty() {
            return Err(PhyloHmmError::DimensionMismatch(
                "emission table has no states".to_string(),
            ));
        }
        let m = table[0].len();
        if table.iter().any(|row| row.len() != m) {
            return Err(PhyloHmmError::DimensionMismatch(
                "emission rows have different numbers of columns".to_string(),
            ));
        }
        if table.iter().flatten().any(|x| !x.is_valid()) {
            return Err(PhyloHmmError::InvalidParameter(
                "emission table contains NaN".to_string(),
            ));
        }
        Ok(EmissionMatrix { table })
    }
    ///
    /// Construct from natural-log likelihoods `table[state][column]`.
    ///
    pub fn from_log_values(table: Vec<Vec<f64>>) -> Result<EmissionMatrix> {
        EmissionMatrix::from_table(
            table
                .into_iter()
                .map(|row| row.into_iter().map(Prob::from_log_prob).collect())
                .collect(),
        )
    }
    /// the number of hidden states `A`
    pub fn n_states(&self) -> usize {
        self.table.len()
    }
    /// the number of columns `M`
    pub fn n_columns(&self) -> usize {
        self.table[0].len()
    }
    pub fn get(&self, state: usize, column: usize) -> Prob {
        self.table[state][column]
    }
    ///
    /// Columns that are impossible under every state
    ///
    pub fn degenerate_columns(&self) -> Vec<usize> {
        (0..self.n_columns())
            .filter(|&i| self.table.iter().all(|row| row[i].is_zero()))
            .collect()
    }
    ///
    /// Fails with `DegenerateColumn` on the first column that is impossible
    /// under every state.
    ///
    pub fn check(&self) -> Result<()> {
        match self.degenerate_columns().first() {
            Some(&i) => Err(PhyloHmmError::DegenerateColumn(i)),
            None => Ok(()),
        }
    }
    fn warn_partially_degenerate(&self) {
        let n = (0..self.n_columns())
            .filter(|&i| {
                let n_zero = self.table.iter().filter(|row| row[i].is_zero()).count();
                n_zero > 0 && n_zero < self.n_states()
            })
            .count();
        if n > 0 {
            warn!("{} columns are impossible under some of the states", n);
        }
    }
}

impl std::ops::Index<usize> for EmissionMatrix {
    type Output = [Prob];
    fn index(&self, state: usize) -> &[Prob] {
        &self.table[state]
    }
}

impl std::fmt::Display for EmissionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (a, row) in self.table.iter().enumerate() {
            write!(f, "{}", a)?;
            for x in row {
                write!(f, "\t{:.4}", x.to_log_value())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
