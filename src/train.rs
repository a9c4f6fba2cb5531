//!
//! Decode / re-estimate loop (hard-EM on the state path)
//!
//! 1. build the emission matrix from the tree models
//! 2. decode the state path with the current parameters
//! 3. re-estimate the transition matrix and the initial distribution from
//!    the transition counts of the path
//! 4. (optional) refine each state's branch lengths on its own columns
//!
//! and repeat until the path stops changing or the iteration limit.
//!
use crate::alignment::Alignment;
use crate::config::{TrainConfig, UnvisitedPolicy};
use crate::emission::EmissionMatrix;
use crate::error::{PhyloHmmError, Result};
use crate::hmm::{HmmParams, StatePath};
use crate::prob::Prob;
use crate::tree::TreeModel;
use log::{info, warn};

///
/// Re-estimate the parameters from a decoded path.
///
/// ```text
/// trans[k][a] = #(k -> a) / #(k -> *)
/// init[a]     = #(a) / len(path)
/// ```
///
/// The initial distribution is the empirical state frequency, not the
/// stationary distribution of the new matrix. A state with no outgoing
/// transition is resolved with `policy`.
///
pub fn reestimate(
    path: &[usize],
    n_states: usize,
    prev: &HmmParams,
    policy: UnvisitedPolicy,
) -> Result<HmmParams> {
    if path.is_empty() {
        return Err(PhyloHmmError::InvalidParameter(
            "cannot re-estimate parameters from an empty path".to_string(),
        ));
    }
    if prev.n_states() != n_states {
        return Err(PhyloHmmError::DimensionMismatch(format!(
            "previous parameters have {} states but {} were expected",
            prev.n_states(),
            n_states
        )));
    }
    if let Some(&a) = path.iter().find(|&&a| a >= n_states) {
        return Err(PhyloHmmError::DimensionMismatch(format!(
            "state {} in the path is out of range (n_states={})",
            a, n_states
        )));
    }

    let mut counts = vec![vec![0usize; n_states]; n_states];
    for w in path.windows(2) {
        counts[w[0]][w[1]] += 1;
    }
    let mut occurrences = vec![0usize; n_states];
    for &a in path {
        occurrences[a] += 1;
    }

    let mut trans = Vec::with_capacity(n_states);
    for (k, row) in counts.iter().enumerate() {
        let total: usize = row.iter().sum();
        let row = if total > 0 {
            row.iter()
                .map(|&c| Prob::from_prob(c as f64 / total as f64))
                .collect()
        } else {
            match policy {
                UnvisitedPolicy::Error => return Err(PhyloHmmError::UnvisitedState(k)),
                UnvisitedPolicy::RetainPrevious => {
                    warn!("state {} has no outgoing transition; keeping the previous row", k);
                    prev.trans_row(k).to_vec()
                }
                UnvisitedPolicy::Uniform => {
                    warn!("state {} has no outgoing transition; using a uniform row", k);
                    vec![Prob::from_prob(1.0 / n_states as f64); n_states]
                }
            }
        };
        trans.push(row);
    }
    let init = occurrences
        .iter()
        .map(|&c| Prob::from_prob(c as f64 / path.len() as f64))
        .collect();
    Ok(HmmParams::from_parts(trans, init))
}

///
/// Output of `train`
///
#[derive(Clone, Debug)]
pub struct TrainResult {
    /// path decoded in the last iteration
    pub path: StatePath,
    /// parameters re-estimated from `path`
    pub params: HmmParams,
    /// tree models (changed only when branch lengths are refined)
    pub models: Vec<TreeModel>,
    /// joint probability of the decoded path in each iteration (Viterbi only)
    pub log_probs: Vec<Prob>,
    pub n_iterations: usize,
    /// true if the loop stopped because the path did not change
    pub converged: bool,
}

impl TrainResult {
    ///
    /// Viterbi probability of the final path, if available
    ///
    pub fn final_log_prob(&self) -> Option<Prob> {
        self.log_probs.last().copied()
    }
}

///
/// Run the decode/re-estimate loop.
///
/// `models[a]` is the tree of hidden state `a`.
///
pub fn train(
    models: &[TreeModel],
    alignment: &Alignment,
    seed_params: &HmmParams,
    config: &TrainConfig,
) -> Result<TrainResult> {
    if config.n_iterations == 0 {
        return Err(PhyloHmmError::InvalidParameter(
            "n_iterations must be at least 1".to_string(),
        ));
    }
    let n_states = seed_params.n_states();
    if models.len() != n_states {
        return Err(PhyloHmmError::DimensionMismatch(format!(
            "{} tree models but {} hidden states",
            models.len(),
            n_states
        )));
    }
    let mut models = models.to_vec();
    let decoder = config.decoder.decoder();
    let mut emissions = EmissionMatrix::build(&models, alignment, config.parallel)?;
    let mut params = seed_params.clone();
    let mut path: StatePath = Vec::new();
    let mut log_probs = Vec::new();
    let mut n_iterations = 0;
    let mut converged = false;

    if alignment.n_columns() == 0 {
        warn!("alignment has no columns; nothing to train");
        return Ok(TrainResult {
            path,
            params,
            models,
            log_probs,
            n_iterations,
            converged: true,
        });
    }

    for iteration in 0..config.n_iterations {
        let decoding = decoder.decode(&params, &emissions)?;
        let n_changed = if iteration == 0 {
            decoding.path.len()
        } else {
            count_changes(&path, &decoding.path)
        };
        match decoding.log_prob {
            Some(log_prob) => {
                info!(
                    "iteration={} decoder={} log_prob={} n_changed={}",
                    iteration,
                    decoder.name(),
                    log_prob.to_log_value(),
                    n_changed
                );
                log_probs.push(log_prob);
            }
            None => {
                info!(
                    "iteration={} decoder={} n_changed={}",
                    iteration,
                    decoder.name(),
                    n_changed
                );
            }
        }
        n_iterations += 1;
        let is_same_path = iteration > 0 && n_changed == 0;
        path = decoding.path;
        params = reestimate(&path, n_states, &params, config.unvisited_policy)?;

        if is_same_path && config.stop_when_converged {
            converged = true;
            break;
        }
        if config.refine_branch_lengths && iteration + 1 < config.n_iterations {
            refine_models(&mut models, alignment, &path)?;
            emissions = EmissionMatrix::build(&models, alignment, config.parallel)?;
        }
    }

    Ok(TrainResult {
        path,
        params,
        models,
        log_probs,
        n_iterations,
        converged,
    })
}

///
/// Refine the branch lengths of each state's tree on the columns assigned to
/// the state. States without columns are left as they are.
///
fn refine_models(models: &mut [TreeModel], alignment: &Alignment, path: &[usize]) -> Result<()> {
    for (a, model) in models.iter_mut().enumerate() {
        let columns: Vec<usize> = (0..path.len()).filter(|&i| path[i] == a).collect();
        if columns.is_empty() {
            continue;
        }
        model.refine_branch_lengths(&alignment.select_columns(&columns))?;
        info!(
            "state={} n_columns={} total_branch_length={}",
            a,
            columns.len(),
            model.total_branch_length()
        );
    }
    Ok(())
}

fn count_changes(a: &[usize], b: &[usize]) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}

///
/// Fraction of positions where `path` agrees with a reference labelling
///
pub fn path_accuracy(path: &[usize], reference: &[usize]) -> Result<f64> {
    if path.len() != reference.len() {
        return Err(PhyloHmmError::DimensionMismatch(format!(
            "path has length {} but the reference has length {}",
            path.len(),
            reference.len()
        )));
    }
    if path.is_empty() {
        return Ok(1.0);
    }
    let n_match = path.len() - count_changes(path, reference);
    Ok(n_match as f64 / path.len() as f64)
}
