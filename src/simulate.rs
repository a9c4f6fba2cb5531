//!
//! Synthetic data from a phylo-HMM
//!
//! * `sample_path`: state path from the Markov chain of `HmmParams`
//! * `sample_alignment`: columns evolved along the tree of each column's state
//!
//! Both are deterministic for a given seed.
//!
use crate::alignment::{Alignment, Symbol, N_BASES};
use crate::error::{PhyloHmmError, Result};
use crate::hmm::{HmmParams, StatePath};
use crate::prob::Prob;
use crate::tree::TreeModel;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

fn weighted_index(probs: &[Prob]) -> Option<WeightedIndex<f64>> {
    WeightedIndex::new(probs.iter().map(|p| p.to_value())).ok()
}

///
/// Sample a state path of the given length.
///
/// Fails if the chain reaches a state with no outgoing transition.
///
pub fn sample_path(params: &HmmParams, length: usize, seed: u64) -> Result<StatePath> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let n = params.n_states();
    let init = (0..n).map(|a| params.init(a)).collect::<Vec<Prob>>();
    let init = weighted_index(&init).ok_or_else(|| {
        PhyloHmmError::InvalidParameter("initial distribution is all zero".to_string())
    })?;
    let rows: Vec<Option<WeightedIndex<f64>>> =
        (0..n).map(|k| weighted_index(params.trans_row(k))).collect();

    let mut path: StatePath = Vec::with_capacity(length);
    for i in 0..length {
        let state = if i == 0 {
            init.sample(&mut rng)
        } else {
            let k = path[i - 1];
            match &rows[k] {
                Some(row) => row.sample(&mut rng),
                None => return Err(PhyloHmmError::UnvisitedState(k)),
            }
        };
        path.push(state);
    }
    Ok(path)
}

///
/// Sample an alignment whose column `i` is evolved along `models[path[i]]`:
/// a uniform random base at the root, then each child mutated from its
/// parent with the Jukes-Cantor matrix of its branch.
///
/// Every model must have the same number of leaves, which is the number of
/// sequences of the alignment.
///
pub fn sample_alignment(models: &[TreeModel], path: &[usize], seed: u64) -> Result<Alignment> {
    let n_seqs = match models.first() {
        Some(model) => model.n_leaves(),
        None => {
            return Err(PhyloHmmError::DimensionMismatch(
                "at least one tree model is required".to_string(),
            ))
        }
    };
    for model in models {
        if model.n_leaves() != n_seqs {
            return Err(PhyloHmmError::DimensionMismatch(format!(
                "tree models have different numbers of leaves ({} and {})",
                n_seqs,
                model.n_leaves()
            )));
        }
        model.check_n_seqs(n_seqs)?;
    }
    if let Some(&a) = path.iter().find(|&&a| a >= models.len()) {
        return Err(PhyloHmmError::DimensionMismatch(format!(
            "state {} in the path has no tree model",
            a
        )));
    }

    let samplers: Vec<TreeSampler> = models.iter().map(TreeSampler::new).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut rows = vec![Vec::with_capacity(path.len()); n_seqs];
    let mut bases = Vec::new();
    for &a in path {
        samplers[a].sample_column(&mut rng, &mut bases);
        for (v, seq_index) in models[a].leaves() {
            rows[seq_index].push(Symbol::from_index(bases[v.index()]));
        }
    }
    Alignment::from_symbols(rows)
}

///
/// Per-tree cache of the parent of each node and the mutation distributions
///
struct TreeSampler<'a> {
    model: &'a TreeModel,
    parents: Vec<Option<usize>>,
    /// `mutations[v][x]`: distribution of the base of `v` given its parent's base `x`
    mutations: Vec<Vec<WeightedIndex<f64>>>,
}

impl<'a> TreeSampler<'a> {
    fn new(model: &'a TreeModel) -> Self {
        let parents = model
            .parents()
            .into_iter()
            .map(|parent| parent.map(|v| v.index()))
            .collect();
        let mutations = model
            .nodes()
            .iter()
            .map(|node| {
                node.matrix()
                    .iter()
                    .filter_map(|row| WeightedIndex::new(row.iter().copied()).ok())
                    .collect()
            })
            .collect();
        TreeSampler {
            model,
            parents,
            mutations,
        }
    }
    ///
    /// Fill `bases[v]` with the sampled base index of every node `v`.
    ///
    fn sample_column<R: Rng>(&self, rng: &mut R, bases: &mut Vec<usize>) {
        bases.clear();
        bases.resize(self.model.n_nodes(), 0);
        // parents precede their children in the reversed post-order
        for &v in self.model.post_order().iter().rev() {
            let v = v.index();
            bases[v] = match self.parents[v] {
                None => rng.gen_range(0..N_BASES),
                Some(parent) => self.mutations[v][bases[parent]].sample(rng),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_path_is_deterministic() {
        let params = HmmParams::switching(3, 0.2).unwrap();
        let a = sample_path(&params, 100, 0).unwrap();
        let b = sample_path(&params, 100, 0).unwrap();
        let c = sample_path(&params, 100, 1).unwrap();
        assert_eq!(a.len(), 100);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.iter().all(|&s| s < 3));
    }

    #[test]
    fn sample_path_follows_transitions() {
        // 0 -> 1 -> 0 -> 1 ...
        let params =
            HmmParams::from_probs(&[vec![0.0, 1.0], vec![1.0, 0.0]], &[1.0, 0.0]).unwrap();
        let path = sample_path(&params, 6, 3).unwrap();
        assert_eq!(path, vec![0, 1, 0, 1, 0, 1]);
        assert!(sample_path(&params, 0, 3).unwrap().is_empty());
    }

    #[test]
    fn sample_path_dead_end() {
        let params =
            HmmParams::from_probs(&[vec![0.0, 1.0], vec![0.0, 0.0]], &[1.0, 0.0]).unwrap();
        assert!(matches!(
            sample_path(&params, 3, 0),
            Err(PhyloHmmError::UnvisitedState(1))
        ));
    }

    #[test]
    fn sample_alignment_zero_length_is_conserved() {
        let models = vec![
            TreeModel::parse("((0:0,1:0)0,2:0)", 3).unwrap(),
            TreeModel::parse("((0:1,1:1)1,2:1)", 3).unwrap(),
        ];
        let path = vec![0; 50];
        let a = sample_alignment(&models, &path, 0).unwrap();
        assert_eq!(a.n_seqs(), 3);
        assert_eq!(a.n_columns(), 50);
        assert_eq!(a.sequence(0), a.sequence(1));
        assert_eq!(a.sequence(0), a.sequence(2));
        assert!(a.sequence(0).iter().all(|s| !s.is_gap()));

        let path = vec![1; 200];
        let a = sample_alignment(&models, &path, 0).unwrap();
        assert_ne!(a.sequence(0), a.sequence(1));
    }

    #[test]
    fn sample_alignment_invalid_inputs() {
        let models = vec![
            TreeModel::parse("(0:0.1,1:0.1)", 2).unwrap(),
            TreeModel::parse("((0:0.1,1:0.1)0.1,2:0.1)", 3).unwrap(),
        ];
        assert!(sample_alignment(&models, &[0], 0).is_err());
        assert!(sample_alignment(&models[..1], &[0, 1], 0).is_err());
        assert!(sample_alignment(&[], &[0], 0).is_err());
    }
}
