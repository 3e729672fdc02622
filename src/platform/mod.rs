//! Platform abstraction layer
//!
//! Handles browser/native differences for wall-clock time, which seeds new
//! sessions. Frame deltas come from `requestAnimationFrame` timestamps in
//! the browser and are not read from here.

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Milliseconds since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

/// Seed for a new session
pub fn session_seed() -> u64 {
    now_ms() as u64
}
