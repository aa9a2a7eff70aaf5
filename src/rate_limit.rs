use crate::models::{ProjectKey, RateLimitConfig};

const SECONDS_PER_HOUR: f64 = 3600.0;

// Events per hour allowed by a key's rate limit, 0 when none is configured
pub fn hourly_limit(config: Option<&RateLimitConfig>) -> i64 {
    match config {
        Some(cfg) if cfg.window > 0 => {
            (cfg.count as f64 / cfg.window as f64 * SECONDS_PER_HOUR).round() as i64
        }
        _ => 0,
    }
}

// Only the first key of a project is considered
pub fn hourly_limit_for_keys(keys: &[ProjectKey]) -> i64 {
    hourly_limit(keys.first().and_then(|k| k.rate_limit.as_ref()))
}
