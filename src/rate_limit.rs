//! Fixed-window request limiter.
//!
//! Each client identifier owns at most one record `{count, reset_at}`. A record
//! whose window has passed is replaced on the next request, never merged. The
//! table lives for the lifetime of the process and is not shared between
//! processes, so limits are per instance.

use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Contact form: 5 submissions per minute per client.
pub const CONTACT_WINDOW_MS: i64 = 60_000;
pub const CONTACT_CAPACITY: u32 = 5;

/// Login and sign-up: 10 attempts per five minutes per client.
pub const AUTH_WINDOW_MS: i64 = 5 * 60_000;
pub const AUTH_CAPACITY: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct WindowRecord {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Outcome of a single `check` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitDecision {
    /// Seconds until the window resets, rounded up and never below one.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> i64 {
        let millis = (self.reset_at - now).num_milliseconds();
        ((millis + 999).div_euclid(1000)).max(1)
    }
}

#[derive(Debug)]
pub struct FixedWindowLimiter {
    capacity: u32,
    window: Duration,
    records: DashMap<String, WindowRecord>,
}

impl FixedWindowLimiter {
    pub fn new(capacity: u32, window_ms: i64) -> Self {
        Self {
            capacity,
            window: Duration::milliseconds(window_ms),
            records: DashMap::new(),
        }
    }

    pub fn contact() -> Self {
        Self::new(CONTACT_CAPACITY, CONTACT_WINDOW_MS)
    }

    pub fn auth() -> Self {
        Self::new(AUTH_CAPACITY, AUTH_WINDOW_MS)
    }

    /// Count one request for `client_id` at `now`.
    ///
    /// The map entry guard holds the shard lock for the whole
    /// read-modify-write, so concurrent handlers cannot lose increments.
    pub fn check(&self, client_id: &str, now: DateTime<Utc>) -> RateLimitDecision {
        let fresh = WindowRecord {
            count: 1,
            reset_at: now + self.window,
        };

        let mut entry = self.records.entry(client_id.to_string()).or_insert(WindowRecord {
            count: 0,
            reset_at: fresh.reset_at,
        });

        if entry.count == 0 || now > entry.reset_at {
            *entry = fresh;
            return RateLimitDecision {
                allowed: true,
                remaining: self.capacity.saturating_sub(1),
                reset_at: fresh.reset_at,
            };
        }

        entry.count = entry.count.saturating_add(1);
        RateLimitDecision {
            allowed: entry.count <= self.capacity,
            remaining: self.capacity.saturating_sub(entry.count),
            reset_at: entry.reset_at,
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.records.len()
    }
}

/// Client identifier for rate limiting.
///
/// First `x-forwarded-for` hop, else `x-real-ip`, else `"unknown"`. Clients
/// behind no proxy header therefore share one bucket.
pub fn client_id(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        return forwarded
            .split(',')
            .next()
            .map(str::trim)
            .unwrap_or("unknown")
            .to_string();
    }

    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_first_request_opens_window() {
        let limiter = FixedWindowLimiter::contact();
        let decision = limiter.check("1.2.3.4", t0());
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_at, t0() + Duration::milliseconds(60_000));
    }

    #[test]
    fn test_sixth_request_in_window_is_rejected() {
        let limiter = FixedWindowLimiter::contact();
        for i in 0..5 {
            let d = limiter.check("1.2.3.4", t0() + Duration::seconds(i));
            assert!(d.allowed, "request {} should pass", i + 1);
            assert_eq!(d.remaining, 4 - i as u32);
        }
        let sixth = limiter.check("1.2.3.4", t0() + Duration::seconds(10));
        assert!(!sixth.allowed);
        assert_eq!(sixth.remaining, 0);
        assert_eq!(sixth.reset_at, t0() + Duration::seconds(60));
    }

    #[test]
    fn test_window_expiry_resets_counter() {
        let limiter = FixedWindowLimiter::contact();
        for _ in 0..9 {
            limiter.check("client", t0());
        }
        let at_boundary = limiter.check("client", t0() + Duration::seconds(60));
        assert!(!at_boundary.allowed, "reset_at itself is still inside the window");

        let later = t0() + Duration::milliseconds(60_001);
        let decision = limiter.check("client", later);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 4);
        assert_eq!(decision.reset_at, later + Duration::seconds(60));
    }

    #[test]
    fn test_concurrent_checks_never_exceed_capacity() {
        let limiter = FixedWindowLimiter::contact();
        let now = t0();

        let allowed: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..20)
                .map(|_| scope.spawn(|| limiter.check("same", now).allowed))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|allowed| *allowed)
                .count()
        });

        assert_eq!(allowed, 5);
        let last = limiter.check("same", now);
        assert!(!last.allowed);
        assert_eq!(last.remaining, 0);
        assert_eq!(limiter.tracked_clients(), 1);
    }

    #[test]
    fn test_clients_are_independent() {
        let limiter = FixedWindowLimiter::contact();
        for _ in 0..6 {
            limiter.check("a", t0());
        }
        assert!(limiter.check("b", t0()).allowed);
        assert_eq!(limiter.tracked_clients(), 2);
    }

    #[test]
    fn test_retry_after_rounds_up() {
        let decision = RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_at: t0() + Duration::milliseconds(1_500),
        };
        assert_eq!(decision.retry_after_secs(t0()), 2);
        assert_eq!(decision.retry_after_secs(t0() + Duration::milliseconds(1_500)), 1);
    }

    #[test]
    fn test_client_id_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", " 10.0.0.1 , 10.0.0.2".parse().unwrap());
        headers.insert("x-real-ip", "192.168.1.1".parse().unwrap());
        assert_eq!(client_id(&headers), "10.0.0.1");
    }

    #[test]
    fn test_client_id_falls_back_to_real_ip_then_unknown() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_id(&headers), "unknown");
        headers.insert("x-real-ip", "192.168.1.1".parse().unwrap());
        assert_eq!(client_id(&headers), "192.168.1.1");
    }
}
