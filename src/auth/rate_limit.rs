use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MAX_ATTEMPTS: usize = 5;
const WINDOW_SECS: u64 = 900; // 15 minutes

/// Per-IP failed-login counter shared across workers.
#[derive(Clone)]
pub struct RateLimiter {
    attempts: Arc<Mutex<HashMap<IpAddr, Vec<Instant>>>>,
    max_attempts: usize,
    window: Duration,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(MAX_ATTEMPTS, Duration::from_secs(WINDOW_SECS))
    }

    pub fn with_limits(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// True when `ip` has used up its attempts in the current window.
    /// Stale timestamps for that IP are dropped on the way.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let Some(cutoff) = Instant::now().checked_sub(self.window) else {
            return map.get(&ip).is_some_and(|t| t.len() >= self.max_attempts);
        };

        if let Some(timestamps) = map.get_mut(&ip) {
            timestamps.retain(|t| *t > cutoff);
            timestamps.len() >= self.max_attempts
        } else {
            false
        }
    }

    pub fn record_failure(&self, ip: IpAddr) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(ip).or_default().push(Instant::now());
    }

    /// Forget the IP's failures (successful login).
    pub fn clear(&self, ip: IpAddr) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&ip);
    }
}
