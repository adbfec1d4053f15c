use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const MAX_ATTEMPTS: usize = 5;
const WINDOW: Duration = Duration::from_secs(15 * 60);

/// Per-IP failed sign-in counter over a sliding window.
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
        Self::with_limits(MAX_ATTEMPTS, WINDOW)
    }

    pub fn with_limits(max_attempts: usize, window: Duration) -> Self {
        Self {
            attempts: Arc::new(Mutex::new(HashMap::new())),
            max_attempts,
            window,
        }
    }

    /// True once `ip` has used up its attempts in the current window.
    /// Stale entries for `ip` are dropped on the way.
    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        match map.get_mut(&ip) {
            Some(timestamps) => {
                timestamps.retain(|t| now.duration_since(*t) < self.window);
                if timestamps.is_empty() {
                    map.remove(&ip);
                    false
                } else {
                    timestamps.len() >= self.max_attempts
                }
            }
            None => false,
        }
    }

    pub fn record_failure(&self, ip: IpAddr) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.entry(ip).or_default().push(Instant::now());
    }

    /// Forget `ip` after a successful sign-in.
    pub fn clear(&self, ip: IpAddr) {
        let mut map = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
        map.remove(&ip);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const IP: IpAddr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 7));

    #[test]
    fn blocks_after_max_failures_and_clears() {
        let limiter = RateLimiter::with_limits(3, Duration::from_secs(60));
        for _ in 0..2 {
            limiter.record_failure(IP);
        }
        assert!(!limiter.is_blocked(IP));
        limiter.record_failure(IP);
        assert!(limiter.is_blocked(IP));

        limiter.clear(IP);
        assert!(!limiter.is_blocked(IP));
    }

    #[test]
    fn failures_expire_with_the_window() {
        let limiter = RateLimiter::with_limits(1, Duration::from_millis(10));
        limiter.record_failure(IP);
        assert!(limiter.is_blocked(IP));
        std::thread::sleep(Duration::from_millis(30));
        assert!(!limiter.is_blocked(IP));
    }
}
