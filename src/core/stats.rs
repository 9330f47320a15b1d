//! Descriptive statistics over plain slices

/// Arithmetic mean; `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator); `None` below two observations
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Coefficient of variation; `None` when the deviation is undefined or the mean is zero
pub fn coefficient_of_variation(std_dev: Option<f64>, mean: f64) -> Option<f64> {
    let sd = std_dev?;
    if mean == 0.0 {
        return None;
    }
    let cv = sd / mean;
    cv.is_finite().then_some(cv)
}
