//! Crawl frontier: the work queue plus the visited set
//!
//! The frontier is an explicit object shared by every worker. All of its
//! bookkeeping (visited check, enqueue, dequeue, completion) happens inside a
//! single critical section, so two workers discovering the same link at the
//! same time can never both enqueue it.
//!
//! Termination: `take` returns `None` exactly when the queue is empty and no
//! URL is in flight, or after `close` has been called.

use crate::state::{PageOutcome, PageState};
use crate::url::CanonicalUrl;
use crate::ScribeError;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokio::sync::Notify;

/// A URL waiting in the frontier
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    /// The canonical URL to fetch
    pub url: CanonicalUrl,

    /// Link distance from the seed (the seed has depth 0)
    pub depth: u32,

    /// When the URL was accepted into the queue
    pub enqueued_at: Instant,

    /// Monotonic sequence number; ties on depth are served FIFO
    sequence: u64,
}

// Shallower entries are popped first from the max-heap, then older ones
impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .depth
            .cmp(&self.depth)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for FrontierEntry {
    fn eq(&self, other: &Self) -> bool {
        self.sequence == other.sequence
    }
}

impl Eq for FrontierEntry {}

/// Result of offering a URL to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// The URL was new and is now queued
    Enqueued,
    /// The URL was already queued, in flight, or done
    AlreadySeen,
    /// The URL's host is outside the allowed domain
    OutOfScope,
    /// The URL is deeper than the configured maximum depth
    DepthExceeded,
    /// The configured page budget has been used up
    PageLimitReached,
    /// The frontier was closed by an interrupt
    Closed,
}

impl OfferOutcome {
    /// Returns true if the URL was accepted
    pub fn is_enqueued(&self) -> bool {
        matches!(self, Self::Enqueued)
    }
}

/// Snapshot of frontier counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierStats {
    /// Distinct canonical URLs ever offered successfully or claimed
    pub visited: usize,
    /// URLs waiting in the queue
    pub queued: usize,
    /// URLs currently being processed
    pub in_flight: usize,
    /// URLs that reached `Done`
    pub done: usize,
}

#[derive(Debug)]
struct Inner {
    states: HashMap<CanonicalUrl, PageState>,
    queue: BinaryHeap<FrontierEntry>,
    in_flight: usize,
    done: usize,
    accepted: u64,
    next_sequence: u64,
    closed: bool,
}

impl Inner {
    fn state_of(&self, url: &CanonicalUrl) -> PageState {
        self.states.get(url).copied().unwrap_or(PageState::Unseen)
    }

    /// Moves `url` from `from` to `to` if the page state machine allows it
    fn advance(
        &mut self,
        url: &CanonicalUrl,
        from: PageState,
        to: PageState,
    ) -> Result<(), ScribeError> {
        let current = self.state_of(url);
        if current != from || !current.can_transition_to(to) {
            return Err(ScribeError::InvalidTransition {
                url: url.to_string(),
                from: current,
                to,
            });
        }
        self.states.insert(url.clone(), to);
        Ok(())
    }
}

/// The shared crawl frontier
#[derive(Debug)]
pub struct Frontier {
    domain: String,
    max_depth: Option<u32>,
    max_pages: Option<u64>,
    inner: Mutex<Inner>,
    changed: Notify,
}

impl Frontier {
    /// Creates an empty frontier restricted to `domain`
    ///
    /// # Arguments
    ///
    /// * `domain` - The allowed domain; subdomains are in scope too
    /// * `max_depth` - Links deeper than this are not enqueued
    /// * `max_pages` - At most this many URLs are ever enqueued
    pub fn new(domain: impl Into<String>, max_depth: Option<u32>, max_pages: Option<u64>) -> Self {
        Self {
            domain: domain.into(),
            max_depth,
            max_pages,
            inner: Mutex::new(Inner {
                states: HashMap::new(),
                queue: BinaryHeap::new(),
                in_flight: 0,
                done: 0,
                accepted: 0,
                next_sequence: 0,
                closed: false,
            }),
            changed: Notify::new(),
        }
    }

    /// The allowed domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Offers a discovered URL at the given depth
    ///
    /// The URL is marked visited at offer time, so a second offer of the same
    /// canonical URL is always a no-op.
    pub fn offer(&self, url: CanonicalUrl, depth: u32) -> OfferOutcome {
        if !url.is_in_scope(&self.domain) {
            return OfferOutcome::OutOfScope;
        }

        if self.max_depth.is_some_and(|max| depth > max) {
            return OfferOutcome::DepthExceeded;
        }

        let outcome = {
            let mut inner = self.lock();

            if inner.closed {
                OfferOutcome::Closed
            } else if inner.states.contains_key(&url) {
                OfferOutcome::AlreadySeen
            } else if self.max_pages.is_some_and(|max| inner.accepted >= max) {
                OfferOutcome::PageLimitReached
            } else {
                let sequence = inner.next_sequence;
                inner.next_sequence += 1;
                inner.accepted += 1;
                inner.states.insert(url.clone(), PageState::Queued);
                inner.queue.push(FrontierEntry {
                    url,
                    depth,
                    enqueued_at: Instant::now(),
                    sequence,
                });
                OfferOutcome::Enqueued
            }
        };

        if outcome.is_enqueued() {
            self.changed.notify_waiters();
        }
        outcome
    }

    /// Takes the next URL to process, waiting while other workers are busy
    ///
    /// # Returns
    ///
    /// * `Some(FrontierEntry)` - A URL now in flight; pass it to `complete`
    /// * `None` - The crawl is finished (queue empty, nothing in flight) or closed
    pub async fn take(&self) -> Option<FrontierEntry> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            // Register before checking so a wakeup between check and await is kept
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if inner.closed {
                    return None;
                }

                if let Some(entry) = inner.queue.pop() {
                    inner.states.insert(entry.url.clone(), PageState::InFlight);
                    inner.in_flight += 1;
                    return Some(entry);
                }

                if inner.in_flight == 0 {
                    drop(inner);
                    // Wake the other idle workers so they see the exhaustion too
                    self.changed.notify_waiters();
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Marks an in-flight URL as done
    ///
    /// # Errors
    ///
    /// Returns `ScribeError::InvalidTransition` if the URL is not in flight.
    pub fn complete(&self, url: &CanonicalUrl, outcome: PageOutcome) -> Result<(), ScribeError> {
        {
            let mut inner = self.lock();
            inner.advance(url, PageState::InFlight, PageState::Done)?;
            inner.in_flight = inner.in_flight.saturating_sub(1);
            inner.done += 1;
        }

        tracing::trace!(url = %url, outcome = %outcome, "Completed URL");
        self.changed.notify_waiters();
        Ok(())
    }

    /// Claims the landing URL of a redirect
    ///
    /// # Returns
    ///
    /// * `true` - The target was unseen and is now recorded as done
    /// * `false` - The target was already known; the page is a duplicate
    pub fn claim_redirect_target(&self, url: &CanonicalUrl) -> bool {
        let mut inner = self.lock();
        if inner
            .advance(url, PageState::Unseen, PageState::Done)
            .is_err()
        {
            return false;
        }
        inner.done += 1;
        true
    }

    /// Returns the current state of a URL
    pub fn state_of(&self, url: &CanonicalUrl) -> PageState {
        self.lock().state_of(url)
    }

    /// Stops handing out work; pending and future `take` calls return None
    ///
    /// In-flight URLs may still be completed.
    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_waiters();
    }

    /// Returns true once `close` has been called
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Returns a snapshot of the counters
    pub fn stats(&self) -> FrontierStats {
        let inner = self.lock();
        FrontierStats {
            visited: inner.states.len(),
            queued: inner.queue.len(),
            in_flight: inner.in_flight,
            done: inner.done,
        }
    }
}
