//!
//! Phylogenetic hidden Markov model for segmenting a multiple alignment
//!
//! Each hidden state owns a binary tree with Jukes-Cantor branches; a column
//! is emitted with the Felsenstein likelihood of the state's tree. The state
//! path is decoded with Viterbi or posterior decoding, the transition matrix
//! is re-estimated from the path, and the runs of a target state are
//! reported as intervals.
//!
pub mod alignment;
pub mod cli;
pub mod config;
pub mod emission;
pub mod error;
pub mod hmm;
pub mod interval;
pub mod io;
pub mod likelihood;
pub mod prelude;
pub mod prob;
pub mod simulate;
pub mod train;
pub mod tree;

#[macro_use]
extern crate approx;
