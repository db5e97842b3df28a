//! Special functions used by variational inference
//!
//! Digamma and log-gamma come from `statrs`; trigamma is evaluated with
//! the recurrence `psi1(x) = psi1(x + 1) + 1/x^2` followed by the asymptotic
//! series, which is accurate to ~1e-12 once `x >= 10`.

use ndarray::{Array1, Array2, ArrayView1, Axis};
use statrs::function::gamma::{digamma, ln_gamma};

/// Below this the trigamma recurrence is applied before the series
const TRIGAMMA_SERIES_MIN: f64 = 10.0;

/// Trigamma function (derivative of digamma) for positive arguments
pub fn trigamma(x: f64) -> f64 {
    let mut x = x;
    let mut acc = 0.0;
    while x < TRIGAMMA_SERIES_MIN {
        acc += 1.0 / (x * x);
        x += 1.0;
    }

    let inv = 1.0 / x;
    let inv2 = inv * inv;
    acc + inv
        + inv2 / 2.0
        + inv * inv2 * (1.0 / 6.0 - inv2 * (1.0 / 30.0 - inv2 * (1.0 / 42.0 - inv2 / 30.0)))
}

/// Expected value of `log(theta)` for `theta ~ Dirichlet(alpha)`
pub fn dirichlet_expectation(alpha: ArrayView1<f64>) -> Array1<f64> {
    let psi_sum = digamma(alpha.sum());
    alpha.mapv(|a| digamma(a) - psi_sum)
}

/// Row-wise [`dirichlet_expectation`] for a matrix of Dirichlet parameters
pub fn dirichlet_expectation_rows(alpha: &Array2<f64>) -> Array2<f64> {
    let mut result = alpha.mapv(digamma);
    for (mut row, params) in result
        .axis_iter_mut(Axis(0))
        .zip(alpha.axis_iter(Axis(0)))
    {
        let psi_sum = digamma(params.sum());
        row.mapv_inplace(|v| v - psi_sum);
    }
    result
}

/// Numerically stable `log(sum(exp(values)))`
pub fn logsumexp<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
    I::IntoIter: Clone,
{
    let iter = values.into_iter();
    let max = iter.clone().fold(f64::NEG_INFINITY, f64::max);
    if !max.is_finite() {
        return max;
    }
    max + iter.map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Sum of `ln_gamma` over every element
pub fn sum_ln_gamma<'a, I>(values: I) -> f64
where
    I: IntoIterator<Item = &'a f64>,
{
    values.into_iter().map(|&v| ln_gamma(v)).sum()
}
