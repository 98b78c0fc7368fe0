/// Short moving-average window for the technical indicators chart.
pub const SMA_SHORT: usize = 50;
/// Long moving-average window for the technical indicators chart.
pub const SMA_LONG: usize = 200;

/// Rolling mean aligned with `data`: index `i` is `None` until a full window ends there.
pub fn simple_moving_average(data: &[f64], window_size: usize) -> Vec<Option<f64>> {
    if window_size == 0 {
        return vec![None; data.len()];
    }
    let mut out = vec![None; window_size.saturating_sub(1).min(data.len())];
    out.extend(
        data.windows(window_size)
            .map(|window| Some(window.iter().sum::<f64>() / window_size as f64)),
    );
    out
}
