//! Scheduler for politeness and rate limiting
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Per-host concurrency limits
//! - Respecting the (adaptive) delay between requests to one host
//! - Integrating robots.txt crawl delays
//!
//! Both the crawl and the extraction phase acquire a slot here before every
//! request.

use crate::config::PolitenessConfig;
use crate::state::DomainState;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Poll interval while a host is saturated by its concurrency limit
const SATURATED_POLL: Duration = Duration::from_millis(10);

/// Permission to issue one request to a host
///
/// Hand it back with [`Scheduler::release`] once the response is in.
#[derive(Debug)]
pub struct HostSlot {
    /// The host the slot was granted for
    pub host: String,

    /// When the slot was granted
    pub granted_at: Instant,

    _permit: OwnedSemaphorePermit,
}

/// Scheduler managing global and per-host request limits
///
/// The scheduler coordinates:
/// - Global concurrency limits (max concurrent requests)
/// - Per-host concurrency limits
/// - Per-host politeness delays, adapted by autothrottle
pub struct Scheduler {
    /// Global semaphore for limiting concurrent fetches
    global_semaphore: Arc<Semaphore>,

    /// Per-host state tracking
    hosts: Mutex<HashMap<String, DomainState>>,

    /// Maximum concurrent requests per host
    per_host_limit: u32,

    /// Politeness configuration
    politeness: PolitenessConfig,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `politeness` - Delay configuration
    /// * `concurrency` - Global request limit
    /// * `per_host_limit` - Request limit per host
    pub fn new(politeness: PolitenessConfig, concurrency: u32, per_host_limit: u32) -> Self {
        Self {
            global_semaphore: Arc::new(Semaphore::new(concurrency.max(1) as usize)),
            hosts: Mutex::new(HashMap::new()),
            per_host_limit: per_host_limit.max(1),
            politeness,
        }
    }

    fn lock_hosts(&self) -> MutexGuard<'_, HashMap<String, DomainState>> {
        self.hosts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Waits until a request to `host` is permitted
    ///
    /// This method:
    /// 1. Acquires a global semaphore permit
    /// 2. Waits until the host is below its concurrency limit
    /// 3. Waits until the politeness delay since the host's last request elapsed
    /// 4. Records the request start
    ///
    /// # Returns
    ///
    /// * `Some(HostSlot)` - The request may be issued now
    /// * `None` - The scheduler was shut down
    pub async fn acquire(&self, host: &str) -> Option<HostSlot> {
        let permit = self.global_semaphore.clone().acquire_owned().await.ok()?;

        loop {
            let now = Instant::now();
            let wait = {
                let mut hosts = self.lock_hosts();
                let state = hosts
                    .entry(host.to_string())
                    .or_insert_with(|| DomainState::new(&self.politeness));

                if state.can_request(&self.politeness, self.per_host_limit, now) {
                    state.record_request(now);
                    tracing::trace!(
                        host = host,
                        active = state.active_requests,
                        "Granted host slot"
                    );
                    return Some(HostSlot {
                        host: host.to_string(),
                        granted_at: now,
                        _permit: permit,
                    });
                }

                state
                    .time_until_next_request(&self.politeness, now)
                    .unwrap_or(SATURATED_POLL)
            };

            tracing::trace!(host = host, wait_ms = wait.as_millis() as u64, "Waiting for host");
            tokio::time::sleep(wait).await;
        }
    }

    /// Returns a slot and feeds the observed latency to autothrottle
    ///
    /// # Arguments
    ///
    /// * `slot` - The slot obtained from `acquire`
    /// * `latency` - Time the request took
    /// * `success` - Whether the response was a 2xx; failures never lower the delay
    pub fn release(&self, slot: HostSlot, latency: Duration, success: bool) {
        let mut hosts = self.lock_hosts();
        if let Some(state) = hosts.get_mut(&slot.host) {
            state.finish_request();
            state.record_latency(&self.politeness, latency, success);
        }
    }

    /// Raises a host's delay floor to a robots.txt Crawl-delay
    pub fn apply_crawl_delay(&self, host: &str, seconds: f64) {
        let mut hosts = self.lock_hosts();
        let state = hosts
            .entry(host.to_string())
            .or_insert_with(|| DomainState::new(&self.politeness));

        if state.robots_delay.is_none() {
            tracing::debug!(host = host, seconds, "Applying robots.txt crawl delay");
        }
        state.set_robots_delay(&self.politeness, seconds);
    }

    /// The delay currently applied between requests to `host`
    pub fn current_delay(&self, host: &str) -> Option<Duration> {
        self.lock_hosts()
            .get(host)
            .map(|state| state.effective_delay(&self.politeness))
    }

    /// Number of requests started against `host`
    pub fn request_count(&self, host: &str) -> u64 {
        self.lock_hosts()
            .get(host)
            .map(|state| state.request_count)
            .unwrap_or(0)
    }

    /// Number of hosts the scheduler has seen
    pub fn host_count(&self) -> usize {
        self.lock_hosts().len()
    }
}
