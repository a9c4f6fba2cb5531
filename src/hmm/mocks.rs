//!
//! Small HMMs and emission tables for testing and benchmarks
//!
use super::params::HmmParams;
use crate::emission::EmissionMatrix;
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;

///
/// Sticky two-state HMM
///
/// ```text
/// trans = [[0.99, 0.01], [0.01, 0.99]]
/// init  = [0.5, 0.5]
/// ```
///
pub fn mock_two_state_params() -> HmmParams {
    HmmParams::switching(2, 0.01).expect("valid two-state params")
}

///
/// 6 columns; the first three strongly favor state 0, the rest state 1.
///
pub fn mock_two_state_emissions() -> EmissionMatrix {
    EmissionMatrix::from_log_values(vec![
        vec![-1.0, -1.0, -1.0, -10.0, -10.0, -10.0],
        vec![-10.0, -10.0, -10.0, -1.0, -1.0, -1.0],
    ])
    .expect("rectangular emission table")
}

///
/// Random emission table with log-likelihoods in `[-5, 0)`
///
pub fn mock_random_emissions(n_states: usize, n_columns: usize, seed: u64) -> EmissionMatrix {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let table = (0..n_states)
        .map(|_| (0..n_columns).map(|_| -5.0 * rng.gen::<f64>()).collect())
        .collect();
    EmissionMatrix::from_log_values(table).expect("rectangular emission table")
}

///
/// Random transition matrix and initial distribution
///
pub fn mock_random_params(n_states: usize, seed: u64) -> HmmParams {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut distribution = |n: usize| -> Vec<f64> {
        let xs: Vec<f64> = (0..n).map(|_| rng.gen::<f64>() + 0.01).collect();
        let total: f64 = xs.iter().sum();
        xs.into_iter().map(|x| x / total).collect()
    };
    let trans: Vec<Vec<f64>> = (0..n_states).map(|_| distribution(n_states)).collect();
    let init = distribution(n_states);
    HmmParams::from_probs(&trans, &init).expect("normalized random params")
}

///
/// Every state path of length `n_columns` over `n_states` states
///
pub fn all_paths(n_states: usize, n_columns: usize) -> Vec<Vec<usize>> {
    (0..n_columns).fold(vec![vec![]], |paths, _| {
        paths
            .into_iter()
            .flat_map(|path| {
                (0..n_states).map(move |a| {
                    let mut path = path.clone();
                    path.push(a);
                    path
                })
            })
            .collect()
    })
}
