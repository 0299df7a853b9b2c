//! Statistics kernels applied per group or per lane.
//!
//! Conventions are pinned to the usual ones for climate rankings: ranks
//! average over ties, percentiles interpolate linearly between order
//! statistics, and NaN means missing. Missing values are skipped by the
//! reductions and keep a NaN rank.

use num_traits::Float;

/// Rank each value within the slice, ties receiving the average of the
/// ranks they span. Ranks are 1-based. NaN values are left out of the
/// ranking and stay NaN.
///
pub fn rankdata<F>(values: &[F]) -> Vec<F>
where
    F: Float,
{
    let mut order: Vec<usize> = (0..values.len())
        .filter(|&i| !values[i].is_nan())
        .collect();
    order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap());

    let mut ranks = vec![F::nan(); values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut stop = start;
        while stop < order.len() - 1 && values[order[stop]] == values[order[stop + 1]] {
            stop += 1;
        }

        // Average of ranks start+1..=stop+1
        let rank = F::from(start + stop + 2).unwrap() / F::from(2).unwrap();
        for i in start..=stop {
            ranks[order[i]] = rank;
        }
        start = stop + 1;
    }

    ranks
}

/// The `q`-th percentile (`q` in 0..=100) of the non-NaN values, with
/// linear interpolation between order statistics. NaN when no values
/// remain.
///
pub fn percentile<F>(values: impl IntoIterator<Item = F>, q: F) -> F
where
    F: Float,
{
    let mut sorted: Vec<F> = values.into_iter().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() {
        return F::nan();
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let h = F::from(sorted.len() - 1).unwrap() * q / F::from(100).unwrap();
    let lo = h.floor().to_usize().unwrap();
    let hi = (lo + 1).min(sorted.len() - 1);

    sorted[lo] + (h - h.floor()) * (sorted[hi] - sorted[lo])
}

pub fn nanmin<F>(values: impl IntoIterator<Item = F>) -> F
where
    F: Float,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(F::nan(), |acc, v| if v < acc || acc.is_nan() { v } else { acc })
}

pub fn nanmax<F>(values: impl IntoIterator<Item = F>) -> F
where
    F: Float,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(F::nan(), |acc, v| if v > acc || acc.is_nan() { v } else { acc })
}

/// Sum of the non-NaN values. An all-NaN lane sums to zero, not NaN.
///
pub fn nansum<F>(values: impl IntoIterator<Item = F>) -> F
where
    F: Float,
{
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(F::zero(), |acc, v| acc + v)
}

pub fn nanmean<F>(values: impl IntoIterator<Item = F>) -> F
where
    F: Float,
{
    let mut sum = F::zero();
    let mut count = 0;
    for v in values {
        if !v.is_nan() {
            sum = sum + v;
            count += 1;
        }
    }
    if count == 0 {
        return F::nan();
    }

    sum / F::from(count).unwrap()
}

/// A reduction applied to the values sharing a group key.
///
#[derive(Clone, Copy, Debug)]
pub(crate) enum Reduction {
    Min,
    Max,
    Mean,
    Sum,
    Percentile(f64),
}

impl Reduction {
    pub(crate) fn reduce(&self, values: impl IntoIterator<Item = f64>) -> f64 {
        match self {
            Self::Min => nanmin(values),
            Self::Max => nanmax(values),
            Self::Mean => nanmean(values),
            Self::Sum => nansum(values),
            Self::Percentile(q) => percentile(values, *q),
        }
    }
}
