use crate::config::PolitenessConfig;
use std::time::{Duration, Instant};

/// Tracks the politeness state of a host during crawling
///
/// This structure maintains the per-host information needed to enforce the
/// per-host concurrency limit and the (possibly adaptive) delay between
/// consecutive requests.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Number of requests started against this host
    pub request_count: u64,

    /// Requests currently in flight against this host
    pub active_requests: u32,

    /// Start time of the most recent request to this host
    pub last_request_time: Option<Instant>,

    /// Current delay between requests; adapted by autothrottle
    pub current_delay: Duration,

    /// Crawl-delay advertised by robots.txt, raising the delay floor
    pub robots_delay: Option<Duration>,
}

impl DomainState {
    /// Creates a new DomainState starting at the configured initial delay
    pub fn new(politeness: &PolitenessConfig) -> Self {
        Self {
            request_count: 0,
            active_requests: 0,
            last_request_time: None,
            current_delay: politeness.initial_delay(),
            robots_delay: None,
        }
    }

    /// The delay floor: the configured minimum, raised by any robots.txt Crawl-delay
    pub fn min_delay(&self, politeness: &PolitenessConfig) -> Duration {
        let configured = politeness.min_delay();
        self.robots_delay
            .map(|robots| robots.max(configured))
            .unwrap_or(configured)
    }

    /// The delay ceiling; never below the floor
    pub fn max_delay(&self, politeness: &PolitenessConfig) -> Duration {
        politeness.max_delay().max(self.min_delay(politeness))
    }

    /// The delay applied before the next request to this host
    pub fn effective_delay(&self, politeness: &PolitenessConfig) -> Duration {
        self.current_delay
            .clamp(self.min_delay(politeness), self.max_delay(politeness))
    }

    /// Checks if a request can be started against this host now
    ///
    /// This method enforces:
    /// - The per-host concurrency limit
    /// - The delay between consecutive requests to the same host
    pub fn can_request(
        &self,
        politeness: &PolitenessConfig,
        per_host_limit: u32,
        now: Instant,
    ) -> bool {
        if self.active_requests >= per_host_limit {
            return false;
        }

        self.time_until_next_request(politeness, now).is_none()
    }

    /// Calculates the time until the delay since the last request has elapsed
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(
        &self,
        politeness: &PolitenessConfig,
        now: Instant,
    ) -> Option<Duration> {
        let last = self.last_request_time?;
        let delay = self.effective_delay(politeness);
        let elapsed = now.saturating_duration_since(last);
        if elapsed < delay {
            Some(delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a request to this host was started
    pub fn record_request(&mut self, now: Instant) {
        self.request_count += 1;
        self.active_requests += 1;
        self.last_request_time = Some(now);
    }

    /// Records that a request to this host finished
    pub fn finish_request(&mut self) {
        self.active_requests = self.active_requests.saturating_sub(1);
    }

    /// Applies a robots.txt Crawl-delay (in seconds)
    ///
    /// The delay is capped at `PolitenessConfig::robots_delay_cap`. Values
    /// too large to represent take the cap; zero, negative and NaN are ignored.
    pub fn set_robots_delay(&mut self, politeness: &PolitenessConfig, seconds: f64) {
        if seconds.is_nan() || seconds <= 0.0 {
            return;
        }
        let cap = politeness.robots_delay_cap();
        let delay = Duration::try_from_secs_f64(seconds)
            .map(|delay| delay.min(cap))
            .unwrap_or(cap);
        self.robots_delay = Some(delay);
    }

    /// Adapts the delay to an observed response latency
    ///
    /// The target delay is `latency / target_concurrency`. The new delay is the
    /// larger of the target and the average of the current delay and the
    /// target, clamped between floor and ceiling. Slow responses therefore raise
    /// the delay quickly while fast ones lower it gradually. A failed response
    /// is never allowed to lower the delay.
    pub fn record_latency(
        &mut self,
        politeness: &PolitenessConfig,
        latency: Duration,
        success: bool,
    ) {
        if !politeness.autothrottle {
            return;
        }

        let floor = self.min_delay(politeness).as_secs_f64();
        let ceiling = self.max_delay(politeness).as_secs_f64();
        let current = self.current_delay.as_secs_f64();

        let target = latency.as_secs_f64() / politeness.autothrottle_target_concurrency;
        let proposed = target.max((current + target) / 2.0).clamp(floor, ceiling);

        if !success && proposed <= current {
            return;
        }

        tracing::trace!(
            previous_ms = (current * 1000.0) as u64,
            next_ms = (proposed * 1000.0) as u64,
            latency_ms = latency.as_millis() as u64,
            "Autothrottle adjusted delay"
        );
        self.current_delay = Duration::from_secs_f64(proposed);
    }
}
