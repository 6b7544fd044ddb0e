//! Daily and cumulative percentage returns.

/// Percentage change from the previous value. Index 0 is undefined.
pub fn daily_returns(prices: &[f64]) -> Vec<f64> {
    let mut result = vec![f64::NAN; prices.len()];
    for i in 1..prices.len() {
        let prev = prices[i - 1];
        if prev != 0.0 {
            result[i] = (prices[i] / prev - 1.0) * 100.0;
        }
    }
    result
}

/// Percentage change since the first value of the series.
pub fn cumulative_returns(prices: &[f64]) -> Vec<f64> {
    match prices.first() {
        Some(&base) if base != 0.0 && !base.is_nan() => {
            prices.iter().map(|p| (p / base - 1.0) * 100.0).collect()
        }
        _ => vec![f64::NAN; prices.len()],
    }
}
