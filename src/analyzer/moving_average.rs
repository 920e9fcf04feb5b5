/// Trailing mean over `window` points, aligned with `data`.
///
/// Entry `i` averages `data[i + 1 - window..=i]`; the first `window - 1`
/// entries have no average and are `None`.
pub fn rolling_mean(data: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; data.len()];
    if window == 0 || data.len() < window {
        return out;
    }
    for (i, w) in data.windows(window).enumerate() {
        out[i + window - 1] = Some(w.iter().sum::<f64>() / window as f64);
    }
    out
}

/// Smoothing factor for a window: `2 / (window + 1)`.
pub fn smoothing_factor(window: usize) -> f64 {
    2.0 / (window as f64 + 1.0)
}

/// Exponential series seeded with `seed` at index 0.
///
/// Each later value is `(price[i] - prev) * sf + price[i]`. This is not the
/// textbook EMA (`price * sf + prev * (1 - sf)`); charts built on it depend on
/// this exact recurrence.
pub fn exponential_series(prices: &[f64], seed: f64, window: usize) -> Vec<f64> {
    if prices.is_empty() {
        return Vec::new();
    }
    let sf = smoothing_factor(window);
    let mut out = Vec::with_capacity(prices.len());
    out.push(seed);
    for &price in &prices[1..] {
        let prev = out[out.len() - 1];
        out.push((price - prev) * sf + price);
    }
    out
}
