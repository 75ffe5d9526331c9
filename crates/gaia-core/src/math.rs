//! Shared numeric helpers: rounding, moments, percentiles and OLS.
//!
//! All math runs in f64. Callers are responsible for filtering NaN before
//! passing slices in; none of these helpers skip non-finite values.

/// Round `x` to `decimals` decimal places (half away from zero).
pub fn round_to(x: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (x * scale).round() / scale
}

/// Arithmetic mean. 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divisor n). 0.0 for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values
        .iter()
        .map(|&v| {
            let d = v - mu;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Percentile `p` (0–100) of an ascending-sorted slice, linear interpolation
/// between closest ranks:
///   rank = p/100 · (n − 1),  value = v[⌊rank⌋] + frac · (v[⌈rank⌉] − v[⌊rank⌋])
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + frac * (sorted[hi] - sorted[lo])
        }
    }
}

/// Ordinary least-squares fit of `ys` against `xs`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson correlation coefficient. 0.0 when either series is constant.
    pub r: f64,
}

/// Fit y = slope·x + intercept. Returns `None` for fewer than two points or
/// mismatched lengths.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let n = xs.len() as f64;
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = ys.iter().sum::<f64>() / n;

    let mut sxx = 0f64;
    let mut syy = 0f64;
    let mut sxy = 0f64;
    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    let slope = if sxx < 1e-12 { 0.0 } else { sxy / sxx };
    let intercept = y_mean - slope * x_mean;
    let r = if sxx < 1e-12 || syy < 1e-12 {
        0.0
    } else {
        (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
    };

    Some(LinearFit { slope, intercept, r })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(percentile_sorted(&v, 25.0), 1.75, epsilon = 1e-12);
        assert_abs_diff_eq!(percentile_sorted(&v, 50.0), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(percentile_sorted(&v, 75.0), 3.25, epsilon = 1e-12);
        assert_eq!(percentile_sorted(&v, 100.0), 4.0);
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let fit = linear_fit(&xs, &ys).unwrap();
        assert_abs_diff_eq!(fit.slope, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.intercept, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(fit.r, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_fit_constant_series_has_zero_correlation() {
        let fit = linear_fit(&[0.0, 1.0, 2.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.r, 0.0);
    }

    #[test]
    fn population_std_uses_n_divisor() {
        assert_abs_diff_eq!(population_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]), 2.0, epsilon = 1e-12);
        assert_eq!(round_to(2.345_6, 2), 2.35);
    }
}
