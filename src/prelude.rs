//!
//! globally-available parts
//!
pub use crate::alignment::{Alignment, Symbol};
pub use crate::config::{IntervalConfig, TrainConfig, UnvisitedPolicy};
pub use crate::emission::EmissionMatrix;
pub use crate::error::{PhyloHmmError, Result};
pub use crate::hmm::{Decoder, DecoderKind, Decoding, HmmParams, StatePath};
pub use crate::interval::{extract_intervals, Interval};
pub use crate::prob::{lp, p, Prob};
pub use crate::train::{train, TrainResult};
pub use crate::tree::TreeModel;
