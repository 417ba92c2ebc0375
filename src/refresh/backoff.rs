use rand::Rng;
use std::time::Duration;

/// Exponential backoff delay with jitter for a source that keeps failing.
/// `failures` counts consecutive failures so far, so the first retry waits
/// roughly the base delay.
pub fn calculate_backoff_delay(failures: u32, base_delay_secs: u32) -> Duration {
    // Cap the exponent to prevent overflow (max ~8.5 hours with 30s base)
    let capped = failures.min(10);

    let base_delay = base_delay_secs.saturating_mul(2_u32.saturating_pow(capped));

    // Add jitter: ±30% randomness
    let jitter_factor = rand::thread_rng().gen_range(0.7..1.3);
    let delay_with_jitter = (f64::from(base_delay) * jitter_factor).round() as u64;

    Duration::from_secs(delay_with_jitter)
}
