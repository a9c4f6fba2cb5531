//!
//! Probabilities stored as natural logs
//!
//! Column likelihoods of deep trees, DP cells over thousands of columns and
//! their sums all stay representable because nothing is exponentiated until
//! output. `p = 0` is `-inf` and is absorbing for `*` and neutral for `+`.
//!
use approx::AbsDiffEq;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::str::FromStr;

///
/// Probability `0 <= p <= 1` represented by `log p`
///
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, SerializeDisplay, DeserializeFromStr)]
pub struct Prob(f64);

/// `Prob` from a linear probability
pub fn p(value: f64) -> Prob {
    Prob::from_prob(value)
}

/// `Prob` from a log probability
pub fn lp(log_value: f64) -> Prob {
    Prob::from_log_prob(log_value)
}

impl Prob {
    pub fn from_prob(value: f64) -> Prob {
        Prob(value.ln())
    }
    pub fn from_log_prob(log_value: f64) -> Prob {
        Prob(log_value)
    }
    /// linear probability
    pub fn to_value(self) -> f64 {
        self.0.exp()
    }
    /// natural log of the probability
    pub fn to_log_value(self) -> f64 {
        self.0
    }
    pub fn zero() -> Prob {
        Prob(f64::NEG_INFINITY)
    }
    pub fn one() -> Prob {
        Prob(0.0)
    }
    pub fn is_zero(self) -> bool {
        self.0 == f64::NEG_INFINITY
    }
    pub fn is_one(self) -> bool {
        self.0 == 0.0
    }
    ///
    /// false only if a NaN was produced somewhere
    ///
    pub fn is_valid(self) -> bool {
        !self.0.is_nan()
    }
}

/// `log p (p)`, e.g. `-0.6931471805599453(0.5000)`
impl std::fmt::Display for Prob {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}({:.4})", self.0, self.to_value())
    }
}

/// Accepts both `Display` output and a bare log value.
impl FromStr for Prob {
    type Err = std::num::ParseFloatError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let log_value = s.split('(').next().unwrap_or(s);
        log_value.trim().parse::<f64>().map(Prob)
    }
}

///
/// `p_x + p_y` as log-sum-exp
///
/// ```text
/// log(e^x + e^y) = max + log1p(e^(min - max))
/// ```
///
impl std::ops::Add for Prob {
    type Output = Prob;
    fn add(self, other: Prob) -> Prob {
        let (hi, lo) = if self.0 >= other.0 {
            (self.0, other.0)
        } else {
            (other.0, self.0)
        };
        if lo == f64::NEG_INFINITY {
            // also covers 0 + 0, where `lo - hi` would be NaN
            Prob(hi)
        } else {
            Prob(hi + (lo - hi).exp().ln_1p())
        }
    }
}

impl std::ops::Mul for Prob {
    type Output = Prob;
    fn mul(self, other: Prob) -> Prob {
        Prob(self.0 + other.0)
    }
}

///
/// `p_x / p_y`, with `0 / p = 0` for any `p` (including `0 / 0`) so that
/// normalizing an impossible column gives zeros instead of NaN.
///
impl std::ops::Div for Prob {
    type Output = Prob;
    fn div(self, other: Prob) -> Prob {
        if self.is_zero() {
            Prob::zero()
        } else {
            Prob(self.0 - other.0)
        }
    }
}

impl std::iter::Sum for Prob {
    fn sum<I: Iterator<Item = Prob>>(iter: I) -> Prob {
        iter.fold(Prob::zero(), |acc, x| acc + x)
    }
}
impl<'a> std::iter::Sum<&'a Prob> for Prob {
    fn sum<I: Iterator<Item = &'a Prob>>(iter: I) -> Prob {
        iter.copied().sum()
    }
}
impl std::iter::Product for Prob {
    fn product<I: Iterator<Item = Prob>>(iter: I) -> Prob {
        iter.fold(Prob::one(), |acc, x| acc * x)
    }
}
impl<'a> std::iter::Product<&'a Prob> for Prob {
    fn product<I: Iterator<Item = &'a Prob>>(iter: I) -> Prob {
        iter.copied().product()
    }
}

/// compares the log values
impl AbsDiffEq for Prob {
    type Epsilon = f64;
    fn default_epsilon() -> f64 {
        f64::default_epsilon()
    }
    fn abs_diff_eq(&self, other: &Prob, epsilon: f64) -> bool {
        f64::abs_diff_eq(&self.0, &other.0, epsilon)
    }
}

impl Eq for Prob {}
impl Ord for Prob {
    fn cmp(&self, other: &Prob) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}
