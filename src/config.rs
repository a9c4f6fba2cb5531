//!
//! Run configuration of the trainer and the interval extraction
//!
//! Stored as JSON. Missing fields take their default values, so a config
//! file only needs the fields it changes:
//!
//! ```text
//! {"n_iterations": 20, "decoder": "posterior"}
//! ```
//!
use crate::error::Result;
use crate::hmm::DecoderKind;
use serde::{Deserialize, Serialize};

///
/// What to do with a state that has no outgoing transition in the decoded
/// path when re-estimating the transition matrix
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnvisitedPolicy {
    /// fail with `UnvisitedState`
    Error,
    /// keep the row of the previous transition matrix
    RetainPrevious,
    /// replace the row with the uniform distribution
    Uniform,
}

impl Default for UnvisitedPolicy {
    fn default() -> Self {
        UnvisitedPolicy::Error
    }
}

///
/// Parameters of the decode/re-estimate loop
///
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// maximum number of decode/re-estimate cycles
    pub n_iterations: usize,
    pub decoder: DecoderKind,
    pub unvisited_policy: UnvisitedPolicy,
    /// re-estimate branch lengths of each state's tree from the columns
    /// assigned to it in every iteration
    pub refine_branch_lengths: bool,
    /// compute column likelihoods in parallel
    pub parallel: bool,
    /// stop as soon as the decoded path does not change
    pub stop_when_converged: bool,
}

impl Default for TrainConfig {
    fn default() -> Self {
        TrainConfig {
            n_iterations: 10,
            decoder: DecoderKind::Viterbi,
            unvisited_policy: UnvisitedPolicy::Error,
            refine_branch_lengths: false,
            parallel: true,
            stop_when_converged: true,
        }
    }
}

impl TrainConfig {
    pub fn to_json_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let mut file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        Ok(())
    }
    pub fn from_json_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let config = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(config)
    }
}

///
/// Which runs of the state path are reported
///
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntervalConfig {
    pub target_state: usize,
    /// runs shorter than this are dropped
    pub minimum_run_length: usize,
}

impl Default for IntervalConfig {
    fn default() -> Self {
        IntervalConfig {
            target_state: 0,
            minimum_run_length: 1,
        }
    }
}
