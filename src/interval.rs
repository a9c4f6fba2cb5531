//!
//! Runs of a target state in a decoded path
//!
use crate::config::IntervalConfig;
use crate::error::{PhyloHmmError, Result};

///
/// Closed, 1-indexed interval `[start, end]` of path positions
///
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Interval {
    pub start: usize,
    pub end: usize,
}

impl Interval {
    ///
    /// `1 <= start <= end` is required.
    ///
    pub fn new(start: usize, end: usize) -> Result<Interval> {
        if start == 0 || start > end {
            return Err(PhyloHmmError::InvalidParameter(format!(
                "({}, {}) is not a 1-indexed closed interval",
                start, end
            )));
        }
        Ok(Interval { start, end })
    }
    /// the number of positions in the interval
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
    /// contains the 1-indexed position
    pub fn contains(&self, position: usize) -> bool {
        self.start <= position && position <= self.end
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{},{}", self.start, self.end)
    }
}

///
/// Maximal runs of `target` in `path` of length `>= minimum_run_length`,
/// sorted by start. Consecutive intervals are separated by at least one
/// position of another state.
///
/// A `minimum_run_length` of 0 is treated as 1.
///
pub fn extract_intervals(path: &[usize], target: usize, minimum_run_length: usize) -> Vec<Interval> {
    let mut intervals = Vec::new();
    let mut run_start: Option<usize> = None;
    // scan one past the end to close the last run
    for i in 0..=path.len() {
        let in_target = path.get(i) == Some(&target);
        match (run_start, in_target) {
            (None, true) => run_start = Some(i),
            (Some(start), false) => {
                if i - start >= minimum_run_length {
                    intervals.push(Interval {
                        start: start + 1,
                        end: i,
                    });
                }
                run_start = None;
            }
            _ => {}
        }
    }
    intervals
}

///
/// `extract_intervals` with the parameters in `config`
///
pub fn extract_intervals_with(path: &[usize], config: &IntervalConfig) -> Vec<Interval> {
    extract_intervals(path, config.target_state, config.minimum_run_length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use test_case::test_case;

    #[test]
    fn two_state_scenario() {
        let path = vec![0, 0, 0, 1, 1, 1];
        assert_eq!(extract_intervals(&path, 0, 1), vec![Interval::new(1, 3).unwrap()]);
        assert_eq!(extract_intervals(&path, 1, 1), vec![Interval::new(4, 6).unwrap()]);
        assert_eq!(Interval::new(1, 3).unwrap().to_string(), "1,3");
        assert_eq!(Interval::new(4, 6).unwrap().len(), 3);
        assert!(Interval::new(0, 3).is_err());
        assert!(Interval::new(5, 4).is_err());
        assert!(Interval::new(4, 4).is_ok());
    }

    #[test_case(&[], 0, 1, &[] ; "empty path")]
    #[test_case(&[1, 1, 1], 0, 1, &[] ; "target absent")]
    #[test_case(&[0, 0, 0], 0, 1, &[(1, 3)] ; "whole path")]
    #[test_case(&[0, 1, 0, 0, 1, 0], 0, 1, &[(1, 1), (3, 4), (6, 6)] ; "singletons kept")]
    #[test_case(&[0, 1, 0, 0, 1, 0], 0, 2, &[(3, 4)] ; "singletons dropped")]
    #[test_case(&[0, 1, 0, 0, 1, 0], 0, 0, &[(1, 1), (3, 4), (6, 6)] ; "zero minimum")]
    #[test_case(&[2, 1, 1, 2, 1], 1, 1, &[(2, 3), (5, 5)] ; "three states")]
    fn extract(path: &[usize], target: usize, minimum: usize, expected: &[(usize, usize)]) {
        let expected: Vec<Interval> = expected
            .iter()
            .map(|&(start, end)| Interval::new(start, end).unwrap())
            .collect();
        assert_eq!(extract_intervals(path, target, minimum), expected);
    }

    #[test]
    fn intervals_cover_exactly_the_target_positions() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        for _ in 0..50 {
            let path: Vec<usize> = (0..rng.gen_range(0..60))
                .map(|_| rng.gen_range(0..3))
                .collect();
            let intervals = extract_intervals(&path, 1, 1);
            // sorted, not overlapping nor touching
            for w in intervals.windows(2) {
                assert!(w[0].end + 1 < w[1].start);
            }
            // union is the set of target positions
            for (i, &s) in path.iter().enumerate() {
                let covered = intervals.iter().any(|x| x.contains(i + 1));
                assert_eq!(covered, s == 1);
            }
            // runs are maximal
            for x in intervals.iter() {
                assert!(x.start == 1 || path[x.start - 2] != 1);
                assert!(x.end == path.len() || path[x.end] != 1);
            }
        }
    }

    #[test]
    fn with_config() {
        let config = IntervalConfig {
            target_state: 1,
            minimum_run_length: 2,
        };
        let path = vec![1, 0, 1, 1, 0];
        assert_eq!(extract_intervals_with(&path, &config), vec![Interval::new(3, 4).unwrap()]);
    }
}
