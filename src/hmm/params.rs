//!
//! Transition matrix and initial distribution of the phylo-HMM
//!
use super::decoder::StatePath;
use crate::emission::EmissionMatrix;
use crate::error::{PhyloHmmError, Result};
use crate::prob::Prob;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::path::Path;

///
/// Tolerance of the row sums of probability matrices
///
pub const ROW_SUM_TOLERANCE: f64 = 1e-6;

///
/// HMM parameters
///
/// * `trans[k][a]` = P(state `a` at column `i+1` | state `k` at column `i`)
/// * `init[a]` = P(state `a` at column 0)
///
/// A row of `trans` may be all zero (a state with no outgoing transition),
/// otherwise every row sums to 1. Deserialized params are checked the same
/// way as `from_probs`.
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedParams")]
pub struct HmmParams {
    trans: Vec<Vec<Prob>>,
    init: Vec<Prob>,
}

#[derive(Deserialize)]
struct UncheckedParams {
    trans: Vec<Vec<Prob>>,
    init: Vec<Prob>,
}

impl TryFrom<UncheckedParams> for HmmParams {
    type Error = PhyloHmmError;
    fn try_from(params: UncheckedParams) -> Result<HmmParams> {
        let trans: Vec<Vec<f64>> = params
            .trans
            .iter()
            .map(|row| row.iter().map(|x| x.to_value()).collect())
            .collect();
        let init: Vec<f64> = params.init.iter().map(|x| x.to_value()).collect();
        validate(&trans, &init)?;
        Ok(HmmParams {
            trans: params.trans,
            init: params.init,
        })
    }
}

///
/// `trans` is a non-empty square matrix of rows summing to 1 (or all zero)
/// and `init` a distribution over the same states.
///
fn validate(trans: &[Vec<f64>], init: &[f64]) -> Result<()> {
    let n = trans.len();
    if n == 0 {
        return Err(PhyloHmmError::DimensionMismatch(
            "transition matrix is empty".to_string(),
        ));
    }
    if let Some(k) = trans.iter().position(|row| row.len() != n) {
        return Err(PhyloHmmError::DimensionMismatch(format!(
            "transition matrix is not square: row {} has {} entries but there are {} rows",
            k,
            trans[k].len(),
            n
        )));
    }
    if init.len() != n {
        return Err(PhyloHmmError::DimensionMismatch(format!(
            "initial distribution has {} entries but there are {} states",
            init.len(),
            n
        )));
    }
    for (k, row) in trans.iter().enumerate() {
        check_distribution(&format!("transition row {}", k), row, true)?;
    }
    check_distribution("initial distribution", init, false)
}

fn check_distribution(name: &str, row: &[f64], allow_zero: bool) -> Result<()> {
    if let Some(x) = row.iter().find(|x| !x.is_finite() || **x < 0.0) {
        return Err(PhyloHmmError::InvalidParameter(format!(
            "{} contains {} which is not a probability",
            name, x
        )));
    }
    let sum: f64 = row.iter().sum();
    let is_normalized = (sum - 1.0).abs() <= ROW_SUM_TOLERANCE;
    if is_normalized || (allow_zero && sum == 0.0) {
        Ok(())
    } else {
        Err(PhyloHmmError::InvalidParameter(format!(
            "{} sums to {} (not 1)",
            name, sum
        )))
    }
}

///
/// Convert a label sequence to state indices (`alphabet[a]` is the label of
/// state `a`).
///
pub fn labels_to_path(labels: &[u8], alphabet: &[u8]) -> Result<StatePath> {
    labels
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            alphabet
                .iter()
                .position(|&x| x == c)
                .ok_or_else(|| {
                    PhyloHmmError::Parse(format!(
                        "label {:?} at position {} is not one of {:?}",
                        c as char,
                        i,
                        String::from_utf8_lossy(alphabet)
                    ))
                })
        })
        .collect()
}

///
/// Inverse of `labels_to_path`. States out of the alphabet are written as `?`.
///
pub fn path_to_labels(path: &[usize], alphabet: &[u8]) -> Vec<u8> {
    path.iter()
        .map(|&a| alphabet.get(a).copied().unwrap_or(b'?'))
        .collect()
}

impl HmmParams {
    ///
    /// Construct from linear probabilities.
    ///
    /// `trans` must be a non-empty square matrix whose rows sum to 1 (or
    /// are all zero), and `init` a distribution over the same states.
    ///
    pub fn from_probs(trans: &[Vec<f64>], init: &[f64]) -> Result<HmmParams> {
        validate(trans, init)?;
        Ok(HmmParams {
            trans: trans
                .iter()
                .map(|row| row.iter().map(|&x| Prob::from_prob(x)).collect())
                .collect(),
            init: init.iter().map(|&x| Prob::from_prob(x)).collect(),
        })
    }
    ///
    /// Construct from already-normalized `Prob`s. Used by the trainer.
    ///
    pub(crate) fn from_parts(trans: Vec<Vec<Prob>>, init: Vec<Prob>) -> HmmParams {
        HmmParams { trans, init }
    }
    ///
    /// Every transition and the initial state are uniform.
    ///
    pub fn uniform(n_states: usize) -> Result<HmmParams> {
        if n_states == 0 {
            return Err(PhyloHmmError::DimensionMismatch(
                "at least one hidden state is required".to_string(),
            ));
        }
        let x = Prob::from_prob(1.0 / n_states as f64);
        Ok(HmmParams {
            trans: vec![vec![x; n_states]; n_states],
            init: vec![x; n_states],
        })
    }
    ///
    /// Stay in the current state with probability `1 - mu` and switch to
    /// each of the other states with `mu / (n_states - 1)`.
    /// The initial distribution is uniform.
    ///
    /// `switching(2, mu)` is the usual two-state (e.g. GC-rich/GC-poor) setup.
    ///
    pub fn switching(n_states: usize, mu: f64) -> Result<HmmParams> {
        if n_states == 0 {
            return Err(PhyloHmmError::DimensionMismatch(
                "at least one hidden state is required".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&mu) {
            return Err(PhyloHmmError::InvalidParameter(format!(
                "switching probability {} is not in [0, 1]",
                mu
            )));
        }
        let trans: Vec<Vec<f64>> = (0..n_states)
            .map(|k| {
                (0..n_states)
                    .map(|a| {
                        if n_states == 1 {
                            1.0
                        } else if a == k {
                            1.0 - mu
                        } else {
                            mu / (n_states - 1) as f64
                        }
                    })
                    .collect()
            })
            .collect();
        let init = vec![1.0 / n_states as f64; n_states];
        HmmParams::from_probs(&trans, &init)
    }
    ///
    /// Frequency-count a reference labelling over `alphabet`
    /// (`alphabet[a]` is the label of state `a`).
    ///
    /// * transition `k -> a` is counted `1` if `k == a` and `switch_weight`
    ///   otherwise, then each row is normalized.
    /// * initial distribution is the label frequency.
    ///
    /// A state with no outgoing transition in the labels cannot be
    /// normalized and is an error.
    ///
    pub fn from_reference_labels(
        labels: &[u8],
        alphabet: &[u8],
        switch_weight: f64,
    ) -> Result<HmmParams> {
        if alphabet.is_empty() || labels.is_empty() {
            return Err(PhyloHmmError::InvalidParameter(
                "reference labels and their alphabet must not be empty".to_string(),
            ));
        }
        if !switch_weight.is_finite() || switch_weight <= 0.0 {
            return Err(PhyloHmmError::InvalidParameter(format!(
                "switch weight {} must be positive",
                switch_weight
            )));
        }
        let n = alphabet.len();
        let states = labels_to_path(labels, alphabet)?;

        let mut counts = vec![vec![0.0; n]; n];
        for w in states.windows(2) {
            let (k, a) = (w[0], w[1]);
            counts[k][a] += if k == a { 1.0 } else { switch_weight };
        }
        let mut occurrences = vec![0.0; n];
        for &a in states.iter() {
            occurrences[a] += 1.0;
        }

        let trans = counts
            .iter()
            .enumerate()
            .map(|(k, row)| {
                let total: f64 = row.iter().sum();
                if total == 0.0 {
                    Err(PhyloHmmError::InvalidParameter(format!(
                        "label {:?} has no outgoing transition in the reference labels",
                        alphabet[k] as char
                    )))
                } else {
                    Ok(row.iter().map(|&x| x / total).collect())
                }
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;
        let init: Vec<f64> = occurrences
            .iter()
            .map(|&x| x / states.len() as f64)
            .collect();
        HmmParams::from_probs(&trans, &init)
    }
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        Ok(())
    }
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<HmmParams> {
        let file = std::fs::File::open(path)?;
        let params = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(params)
    }
    /// the number of hidden states `A`
    pub fn n_states(&self) -> usize {
        self.init.len()
    }
    /// P(`k` -> `a`)
    pub fn trans(&self, k: usize, a: usize) -> Prob {
        self.trans[k][a]
    }
    pub fn trans_row(&self, k: usize) -> &[Prob] {
        &self.trans[k]
    }
    /// P(starts in `a`)
    pub fn init(&self, a: usize) -> Prob {
        self.init[a]
    }
    ///
    /// Transition matrix as linear probabilities
    ///
    pub fn to_prob_matrix(&self) -> Vec<Vec<f64>> {
        self.trans
            .iter()
            .map(|row| row.iter().map(|x| x.to_value()).collect())
            .collect()
    }
    ///
    /// Initial distribution as linear probabilities
    ///
    pub fn to_init_probs(&self) -> Vec<f64> {
        self.init.iter().map(|x| x.to_value()).collect()
    }
    ///
    /// Joint probability of a state path and the columns
    ///
    /// ```text
    /// P(path, x) = init[s_0] e[s_0][0] prod_{i>0} trans[s_{i-1}][s_i] e[s_i][i]
    /// ```
    ///
    pub fn path_prob(&self, emissions: &EmissionMatrix, path: &[usize]) -> Prob {
        path.iter()
            .enumerate()
            .map(|(i, &a)| {
                let prior = if i == 0 {
                    self.init(a)
                } else {
                    self.trans(path[i - 1], a)
                };
                prior * emissions.get(a, i)
            })
            .product()
    }
}

impl std::fmt::Display for HmmParams {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let init = self
            .to_init_probs()
            .iter()
            .map(|x| format!("{:.6}", x))
            .join("\t");
        writeln!(f, "# init\t{}", init)?;
        for row in self.to_prob_matrix() {
            writeln!(f, "{}", row.iter().map(|x| format!("{:.6}", x)).join("\t"))?;
        }
        Ok(())
    }
}
