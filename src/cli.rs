//!
//! Subcommands of the `phylohmm` binary
//!
//! * `segment`: train on an alignment and write the intervals of a state
//! * `simulate`: write a synthetic alignment and its true labels
//!
use crate::alignment::Alignment;
use crate::config::{IntervalConfig, TrainConfig, UnvisitedPolicy};
use crate::error::{PhyloHmmError, Result};
use crate::hmm::params::{labels_to_path, path_to_labels};
use crate::hmm::{DecoderKind, HmmParams};
use crate::interval::{extract_intervals_with, Interval};
use crate::io::{fasta, text};
use crate::simulate::{sample_alignment, sample_path};
use crate::train::{path_accuracy, train, TrainResult};
use crate::tree::TreeModel;
use clap::Args;
use log::info;
use std::path::PathBuf;

///
/// Tree model of each hidden state
///
#[derive(Args, Debug, Clone)]
pub struct ModelOpts {
    /// Tree topologies, one per line (one per hidden state)
    #[clap(short = 't', long)]
    pub topologies: PathBuf,
    /// Branch-length scaling weights, one per line (one per hidden state)
    #[clap(short = 'w', long)]
    pub weights: Option<PathBuf>,
}

impl ModelOpts {
    pub fn load(&self, n_seqs: usize) -> Result<Vec<TreeModel>> {
        let topologies = text::read_topologies(&self.topologies)?;
        let weights = match &self.weights {
            Some(path) => Some(text::read_weights(path)?),
            None => None,
        };
        load_models(&topologies, n_seqs, weights.as_deref())
    }
}

///
/// Parse the topologies and scale each tree by its weight.
///
pub fn load_models(
    topologies: &[String],
    n_seqs: usize,
    weights: Option<&[f64]>,
) -> Result<Vec<TreeModel>> {
    if topologies.is_empty() {
        return Err(PhyloHmmError::DimensionMismatch(
            "no tree topology is given".to_string(),
        ));
    }
    if let Some(weights) = weights {
        if weights.len() != topologies.len() {
            return Err(PhyloHmmError::DimensionMismatch(format!(
                "{} weights for {} tree topologies",
                weights.len(),
                topologies.len()
            )));
        }
    }
    topologies
        .iter()
        .enumerate()
        .map(|(a, topology)| {
            let mut model = TreeModel::parse(topology, n_seqs)?;
            if let Some(weights) = weights {
                model.scale_branch_lengths(weights[a])?;
            }
            info!("state={} tree={}", a, model);
            Ok(model)
        })
        .collect()
}

///
/// Initial transition matrix and initial distribution
///
/// Chosen from (in this order) a parameter JSON written by
/// `segment --params-output`, a transition matrix file, reference labels, or
/// the switching probability `mu`.
///
#[derive(Args, Debug, Clone)]
pub struct ParamsOpts {
    /// Parameter JSON written by `segment --params-output`
    #[clap(long)]
    pub params_json: Option<PathBuf>,
    /// Transition matrix file, one whitespace-separated row per line
    #[clap(long)]
    pub transitions: Option<PathBuf>,
    /// Initial distribution (comma-separated) for `--transitions`. Uniform if not specified
    #[clap(long, value_delimiter = ',', requires = "transitions")]
    pub init: Option<Vec<f64>>,
    /// Reference labels to count the transitions from
    #[clap(long)]
    pub reference_labels: Option<PathBuf>,
    /// Label of each hidden state in the reference labels, in state order
    #[clap(long, default_value = "01")]
    pub label_alphabet: String,
    /// Count of a state switch in the reference labels
    #[clap(long, default_value_t = 1.0)]
    pub switch_weight: f64,
    /// Switching probability used when neither transitions nor reference labels are given
    #[clap(long, default_value_t = 0.01)]
    pub mu: f64,
}

impl ParamsOpts {
    pub fn load(&self, n_states: usize) -> Result<HmmParams> {
        if self.init.is_some() && self.transitions.is_none() {
            return Err(PhyloHmmError::InvalidParameter(
                "--init is only used together with --transitions".to_string(),
            ));
        }
        let params = if let Some(path) = &self.params_json {
            HmmParams::from_json_file(path)?
        } else if let Some(path) = &self.transitions {
            let trans = text::read_transitions(path)?;
            let init = match &self.init {
                Some(init) => init.clone(),
                None => vec![1.0 / n_states as f64; n_states],
            };
            HmmParams::from_probs(&trans, &init)?
        } else if let Some(path) = &self.reference_labels {
            let labels = text::read_labels(path)?;
            HmmParams::from_reference_labels(
                &labels,
                self.label_alphabet.as_bytes(),
                self.switch_weight,
            )?
        } else {
            HmmParams::switching(n_states, self.mu)?
        };
        if params.n_states() != n_states {
            return Err(PhyloHmmError::DimensionMismatch(format!(
                "{} hidden states in the parameters but {} tree topologies",
                params.n_states(),
                n_states
            )));
        }
        Ok(params)
    }
}

#[derive(Args, Debug, Clone)]
pub struct SegmentOpts {
    /// Alignment FASTA (.gz allowed)
    pub alignment: PathBuf,
    #[clap(flatten)]
    pub model: ModelOpts,
    #[clap(flatten)]
    pub params: ParamsOpts,
    /// Training configuration JSON. Options below override its values
    #[clap(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Maximum number of decode/re-estimate iterations
    #[clap(short = 'n', long)]
    pub n_iterations: Option<usize>,
    #[clap(long, value_enum)]
    pub decoder: Option<DecoderKind>,
    #[clap(long, value_enum)]
    pub unvisited_policy: Option<UnvisitedPolicy>,
    /// Re-estimate branch lengths in every iteration
    #[clap(long)]
    pub refine_branch_lengths: bool,
    /// Compute column likelihoods on a single thread
    #[clap(long)]
    pub serial: bool,
    /// Run all the iterations even if the path converges
    #[clap(long)]
    pub no_early_stop: bool,
    /// Hidden state whose runs are reported
    #[clap(long, default_value_t = 0)]
    pub target_state: usize,
    /// Runs shorter than this are not reported
    #[clap(long, default_value_t = 1)]
    pub minimum_run_length: usize,
    /// Output intervals (`start,end` per line)
    #[clap(short = 'o', long)]
    pub output: PathBuf,
    /// Output the decoded path as labels
    #[clap(long)]
    pub path_output: Option<PathBuf>,
    /// Output the trained parameters as JSON (loadable with `--params-json`)
    #[clap(long)]
    pub params_output: Option<PathBuf>,
}

impl SegmentOpts {
    pub fn train_config(&self) -> Result<TrainConfig> {
        let mut config = match &self.config {
            Some(path) => TrainConfig::from_json_file(path)?,
            None => TrainConfig::default(),
        };
        if let Some(n_iterations) = self.n_iterations {
            config.n_iterations = n_iterations;
        }
        if let Some(decoder) = self.decoder {
            config.decoder = decoder;
        }
        if let Some(policy) = self.unvisited_policy {
            config.unvisited_policy = policy;
        }
        if self.refine_branch_lengths {
            config.refine_branch_lengths = true;
        }
        if self.serial {
            config.parallel = false;
        }
        if self.no_early_stop {
            config.stop_when_converged = false;
        }
        Ok(config)
    }
    pub fn interval_config(&self) -> IntervalConfig {
        IntervalConfig {
            target_state: self.target_state,
            minimum_run_length: self.minimum_run_length,
        }
    }
}

///
/// Output of `segment`
///
#[derive(Debug, Clone)]
pub struct Segmentation {
    pub result: TrainResult,
    pub intervals: Vec<Interval>,
    /// agreement with the reference labels, if given
    pub accuracy: Option<f64>,
}

pub fn segment(opts: &SegmentOpts) -> Result<Segmentation> {
    let alignment = fasta::read_alignment(&opts.alignment)?;
    let models = opts.model.load(alignment.n_seqs())?;
    let seed_params = opts.params.load(models.len())?;
    let config = opts.train_config()?;
    info!("config={:?}", config);

    let result = train(&models, &alignment, &seed_params, &config)?;
    let intervals = extract_intervals_with(&result.path, &opts.interval_config());
    text::write_intervals(&opts.output, &intervals)?;

    if let Some(path) = &opts.params_output {
        result.params.to_json_file(path)?;
    }
    let alphabet = opts.params.label_alphabet.as_bytes();
    if let Some(path) = &opts.path_output {
        text::write_labels(path, "decoded", &path_to_labels(&result.path, alphabet))?;
    }
    let accuracy = match &opts.params.reference_labels {
        Some(path) => {
            let reference = labels_to_path(&text::read_labels(path)?, alphabet)?;
            Some(path_accuracy(&result.path, &reference)?)
        }
        None => None,
    };
    Ok(Segmentation {
        result,
        intervals,
        accuracy,
    })
}

#[derive(Args, Debug, Clone)]
pub struct SimulateOpts {
    #[clap(flatten)]
    pub model: ModelOpts,
    #[clap(flatten)]
    pub params: ParamsOpts,
    /// Number of sequences (leaves of every tree)
    #[clap(short = 'N', long)]
    pub n_seqs: usize,
    /// Number of columns
    #[clap(short = 'm', long, default_value_t = 1000)]
    pub length: usize,
    #[clap(short = 's', long, default_value_t = 0)]
    pub seed: u64,
    /// Output alignment FASTA
    #[clap(short = 'o', long)]
    pub output: PathBuf,
    /// Output true labels of the columns
    #[clap(short = 'l', long)]
    pub labels_output: PathBuf,
}

pub fn simulate(opts: &SimulateOpts) -> Result<Alignment> {
    let models = opts.model.load(opts.n_seqs)?;
    let params = opts.params.load(models.len())?;
    let path = sample_path(&params, opts.length, opts.seed)?;
    let alignment = sample_alignment(&models, &path, opts.seed.wrapping_add(1))?;
    fasta::write_alignment(&opts.output, &alignment)?;
    let labels = path_to_labels(&path, opts.params.label_alphabet.as_bytes());
    text::write_labels(&opts.labels_output, "truth", &labels)?;
    info!(
        "simulated {} sequences x {} columns",
        alignment.n_seqs(),
        alignment.n_columns()
    );
    Ok(alignment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::write_string;

    #[test]
    fn load_models_with_weights() {
        let topologies = vec!["(0:0.1,1:0.2)".to_string(), "(0:1,1:1)".to_string()];
        let models = load_models(&topologies, 2, Some(&[2.0, 0.5][..])).unwrap();
        assert_eq!(models.len(), 2);
        assert_abs_diff_eq!(models[0].total_branch_length(), 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(models[1].total_branch_length(), 1.0, epsilon = 1e-12);
        assert!(load_models(&topologies, 2, Some(&[1.0][..])).is_err());
        assert!(load_models(&[], 2, None).is_err());
    }

    fn params_opts() -> ParamsOpts {
        ParamsOpts {
            params_json: None,
            transitions: None,
            init: None,
            reference_labels: None,
            label_alphabet: "01".to_string(),
            switch_weight: 1.0,
            mu: 0.05,
        }
    }

    #[test]
    fn params_from_each_source() {
        let dir = tempfile::tempdir().unwrap();
        let opts = params_opts();
        let params = opts.load(2).unwrap();
        assert_abs_diff_eq!(params.to_prob_matrix()[0][1], 0.05, epsilon = 1e-12);

        let trans = dir.path().join("trans.txt");
        write_string(&trans, "0.7 0.3\n0.4 0.6\n").unwrap();
        let opts = ParamsOpts {
            transitions: Some(trans),
            init: Some(vec![0.9, 0.1]),
            ..params_opts()
        };
        let params = opts.load(2).unwrap();
        assert_abs_diff_eq!(params.to_prob_matrix()[1][0], 0.4, epsilon = 1e-12);
        assert_abs_diff_eq!(params.init(0).to_value(), 0.9, epsilon = 1e-12);
        assert!(opts.load(3).is_err());

        let labels = dir.path().join("labels.txt");
        write_string(&labels, ">ref\n0011\n0\n").unwrap();
        let opts = ParamsOpts {
            reference_labels: Some(labels),
            ..params_opts()
        };
        let params = opts.load(2).unwrap();
        assert_abs_diff_eq!(params.to_prob_matrix()[1][0], 0.5, epsilon = 1e-12);

        let json = dir.path().join("params.json");
        params.to_json_file(&json).unwrap();
        let opts = ParamsOpts {
            params_json: Some(json),
            ..params_opts()
        };
        assert_eq!(opts.load(2).unwrap(), params);
        assert!(matches!(
            opts.load(3),
            Err(PhyloHmmError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn init_requires_transitions() {
        let opts = ParamsOpts {
            init: Some(vec![0.9, 0.1]),
            ..params_opts()
        };
        assert!(matches!(
            opts.load(2),
            Err(PhyloHmmError::InvalidParameter(_))
        ));
    }

    #[test]
    fn simulate_then_segment() {
        let dir = tempfile::tempdir().unwrap();
        let topologies = dir.path().join("trees.txt");
        write_string(
            &topologies,
            "((0:0.02,1:0.02)0.01,(2:0.02,3:0.02)0.01)\n((0:0.8,1:0.8)0.4,(2:0.8,3:0.8)0.4)\n",
        )
        .unwrap();
        let model = ModelOpts {
            topologies,
            weights: None,
        };
        let simulate_opts = SimulateOpts {
            model: model.clone(),
            params: ParamsOpts {
                mu: 0.01,
                ..params_opts()
            },
            n_seqs: 4,
            length: 1500,
            seed: 2,
            output: dir.path().join("aln.fa"),
            labels_output: dir.path().join("truth.txt"),
        };
        let alignment = simulate(&simulate_opts).unwrap();
        assert_eq!(alignment.n_columns(), 1500);

        let segment_opts = SegmentOpts {
            alignment: dir.path().join("aln.fa"),
            model,
            params: ParamsOpts {
                reference_labels: Some(dir.path().join("truth.txt")),
                switch_weight: 5.0,
                ..params_opts()
            },
            config: None,
            n_iterations: Some(5),
            decoder: None,
            unvisited_policy: Some(UnvisitedPolicy::Uniform),
            refine_branch_lengths: false,
            serial: true,
            no_early_stop: false,
            target_state: 0,
            minimum_run_length: 1,
            output: dir.path().join("intervals.txt"),
            path_output: Some(dir.path().join("decoded.txt")),
            params_output: Some(dir.path().join("params.json")),
        };
        let config = segment_opts.train_config().unwrap();
        assert_eq!(config.n_iterations, 5);
        assert!(!config.parallel);

        let s = segment(&segment_opts).unwrap();
        assert!(s.accuracy.unwrap() > 0.9);
        assert!(!s.intervals.is_empty());
        let written = std::fs::read_to_string(dir.path().join("intervals.txt")).unwrap();
        assert_eq!(written.lines().count(), s.intervals.len());
        let decoded = text::read_labels(dir.path().join("decoded.txt")).unwrap();
        assert_eq!(decoded.len(), 1500);
        let trained = HmmParams::from_json_file(dir.path().join("params.json")).unwrap();
        assert_eq!(trained, s.result.params);
    }
}
