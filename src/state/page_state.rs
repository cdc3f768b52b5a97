/// Page state definitions for tracking crawl progress
///
/// Each canonical URL moves one way through `Unseen → Queued → InFlight → Done`.
/// `Done` is terminal for the whole session.
use std::fmt;

/// Represents the current state of a page in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// Never offered to the frontier
    Unseen,

    /// Accepted by the frontier and waiting for a worker
    Queued,

    /// Taken by a worker and being fetched
    InFlight,

    /// Finished; never revisited during this session
    Done,
}

impl PageState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if the URL counts as visited (already offered)
    pub fn is_visited(&self) -> bool {
        !matches!(self, Self::Unseen)
    }

    /// Checks whether moving from this state to `next` is allowed
    ///
    /// `Unseen → Done` covers redirect targets that are claimed without ever
    /// being queued.
    pub fn can_transition_to(&self, next: PageState) -> bool {
        matches!(
            (self, next),
            (Self::Unseen, Self::Queued)
                | (Self::Unseen, Self::Done)
                | (Self::Queued, Self::InFlight)
                | (Self::InFlight, Self::Done)
        )
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unseen => "unseen",
            Self::Queued => "queued",
            Self::InFlight => "in_flight",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a page reached the `Done` state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageOutcome {
    /// Fetched, in scope, and written to the discovery sink
    Discovered,

    /// Redirected to a URL that was already known to the frontier
    DuplicateRedirect,

    /// Redirected outside the allowed domain
    OutOfScope,

    /// Disallowed by robots.txt; never fetched
    RobotsDenied,

    /// Network error, timeout, or non-2xx status
    FetchFailed,

    /// The response was not an HTML document
    NotHtml,

    /// The discovery sink rejected the record
    SinkFailed,
}

impl PageOutcome {
    /// Returns true if the page ended up in the discovery sink
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Discovered)
    }

    /// Returns true if this outcome counts as a skip rather than a failure
    pub fn is_skipped(&self) -> bool {
        matches!(
            self,
            Self::DuplicateRedirect | Self::OutOfScope | Self::RobotsDenied | Self::NotHtml
        )
    }

    /// Returns true if this outcome is an error
    pub fn is_error(&self) -> bool {
        matches!(self, Self::FetchFailed | Self::SinkFailed)
    }

    /// Short lowercase name used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::DuplicateRedirect => "duplicate_redirect",
            Self::OutOfScope => "out_of_scope",
            Self::RobotsDenied => "robots_denied",
            Self::FetchFailed => "fetch_failed",
            Self::NotHtml => "not_html",
            Self::SinkFailed => "sink_failed",
        }
    }
}

impl fmt::Display for PageOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(PageState::Unseen.can_transition_to(PageState::Queued));
        assert!(PageState::Queued.can_transition_to(PageState::InFlight));
        assert!(PageState::InFlight.can_transition_to(PageState::Done));
    }

    #[test]
    fn test_no_backward_transitions() {
        assert!(!PageState::Done.can_transition_to(PageState::Queued));
        assert!(!PageState::Done.can_transition_to(PageState::InFlight));
        assert!(!PageState::InFlight.can_transition_to(PageState::Queued));
        assert!(!PageState::Queued.can_transition_to(PageState::Unseen));
    }

    #[test]
    fn test_done_is_terminal() {
        assert!(PageState::Done.is_terminal());
        assert!(!PageState::InFlight.is_terminal());
        for next in [
            PageState::Unseen,
            PageState::Queued,
            PageState::InFlight,
            PageState::Done,
        ] {
            assert!(!PageState::Done.can_transition_to(next));
        }
    }

    #[test]
    fn test_visited() {
        assert!(!PageState::Unseen.is_visited());
        assert!(PageState::Queued.is_visited());
        assert!(PageState::Done.is_visited());
    }

    #[test]
    fn test_outcome_classification() {
        assert!(PageOutcome::Discovered.is_success());
        assert!(PageOutcome::RobotsDenied.is_skipped());
        assert!(PageOutcome::OutOfScope.is_skipped());
        assert!(PageOutcome::FetchFailed.is_error());
        assert!(!PageOutcome::FetchFailed.is_skipped());
    }

    #[test]
    fn test_display() {
        assert_eq!(PageState::InFlight.to_string(), "in_flight");
        assert_eq!(PageOutcome::NotHtml.to_string(), "not_html");
    }
}
