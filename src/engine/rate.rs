//! Throughput derivation from cumulative counters.

/// Estimate a per-second rate from two samples of a cumulative counter.
///
/// Returns `0.0` when `elapsed_secs` is non-positive. A negative delta
/// (counter reset after a server restart, or wrap) clamps to zero rather
/// than producing a negative rate.
pub fn estimate(prev: u64, curr: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    let delta = curr as f64 - prev as f64;
    (delta / elapsed_secs).max(0.0)
}
