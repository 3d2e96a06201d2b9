//! Order statistics and moments over small samples.
//!
//! All functions take values already sorted ascending. Sorting first makes
//! every result independent of the original row order, including the
//! floating-point rounding of the sums.

/// Arithmetic mean. NaN for an empty slice.
pub fn mean(sorted: &[f64]) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.iter().sum::<f64>() / sorted.len() as f64
}

/// Median (average of the two middle values for even lengths). NaN if empty.
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Sample standard deviation with the n-1 denominator.
///
/// NaN when fewer than two values are present.
pub fn sample_std(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(sorted);
    let ss: f64 = sorted.iter().map(|&x| (x - m) * (x - m)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Quantile by linear interpolation between closest ranks (R-7).
///
/// `q` is clamped to `[0, 1]`. NaN for an empty slice.
pub fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let h = (n - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}

/// Copy and sort values ascending.
pub(crate) fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}
