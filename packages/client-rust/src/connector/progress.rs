//! Per-invocation milestone channel.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

use datasource_core::Progress;
use tokio::sync::mpsc;
use tracing::{debug, warn};

const NOTHING_REPORTED: i32 = i32::MIN;

/// Sending half of an invocation's milestone stream.
///
/// Clones share one ordering cursor, so the connector, the middleware and the
/// operation can all report into the same invocation without ever emitting a
/// milestone twice or out of order. A dropped receiver is not an error.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: Option<mpsc::UnboundedSender<Progress>>,
    last: Arc<AtomicI32>,
}

impl ProgressReporter {
    /// Reporter plus the receiving end handed to the caller.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Progress>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(tx),
                last: Arc::new(AtomicI32::new(NOTHING_REPORTED)),
            },
            rx,
        )
    }

    /// Reporter that keeps the ordering cursor but delivers nowhere.
    #[must_use]
    pub fn detached() -> Self {
        Self {
            tx: None,
            last: Arc::new(AtomicI32::new(NOTHING_REPORTED)),
        }
    }

    /// Report a milestone. Returns `false` when it was dropped as a duplicate
    /// or regression.
    pub fn report(&self, milestone: Progress) -> bool {
        let accepted = self
            .last
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |code| {
                let allowed = code == NOTHING_REPORTED
                    || Progress::from_code(code).is_some_and(|last| last.may_precede(milestone));
                allowed.then_some(milestone.code())
            })
            .is_ok();

        if !accepted {
            warn!(milestone = %milestone, "dropping out-of-order milestone");
            return false;
        }
        debug!(milestone = %milestone, code = milestone.code(), "progress");
        if let Some(tx) = &self.tx {
            // Receiver gone means the caller stopped listening; keep going.
            let _ = tx.send(milestone);
        }
        true
    }

    /// Report `milestone` unless it or a later one was already reached.
    /// Lets two observers of the same event report it without a warning.
    pub fn reach(&self, milestone: Progress) -> bool {
        if self
            .last()
            .is_some_and(|last| last.is_terminal() || last >= milestone)
        {
            return false;
        }
        self.report(milestone)
    }

    /// Most recent accepted milestone.
    #[must_use]
    pub fn last(&self) -> Option<Progress> {
        Progress::from_code(self.last.load(Ordering::Acquire))
    }

    /// True once `Complete` or `Error` has been reported.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.last().is_some_and(Progress::is_terminal)
    }
}

#[cfg(test)]
mod tests {
    use datasource_core::ProgressLog;

    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<Progress>) -> ProgressLog {
        let mut log = ProgressLog::new();
        while let Ok(p) = rx.try_recv() {
            log.push(p);
        }
        log
    }

    #[test]
    fn full_sequence_passes_through() {
        let (reporter, mut rx) = ProgressReporter::channel();
        for p in Progress::SUCCESS_SEQUENCE {
            assert!(reporter.report(p));
        }
        assert!(drain(&mut rx).is_complete_success());
        assert!(reporter.is_finished());
    }

    #[test]
    fn duplicates_and_regressions_are_dropped() {
        let (reporter, mut rx) = ProgressReporter::channel();
        assert!(reporter.report(Progress::Connected));
        assert!(reporter.report(Progress::RequestSent));
        assert!(!reporter.report(Progress::RequestSent));
        assert!(!reporter.report(Progress::Connected));
        assert!(reporter.report(Progress::ResponseReceived));
        let log = drain(&mut rx);
        assert_eq!(
            log.milestones(),
            &[Progress::Connected, Progress::RequestSent, Progress::ResponseReceived]
        );
        assert!(log.follows_contract());
    }

    #[test]
    fn nothing_after_terminal() {
        let (reporter, mut rx) = ProgressReporter::channel();
        assert!(reporter.report(Progress::Error));
        assert!(!reporter.report(Progress::Connected));
        assert!(!reporter.report(Progress::Error));
        assert_eq!(drain(&mut rx).milestones(), &[Progress::Error]);
    }

    #[test]
    fn clones_share_the_cursor() {
        let (reporter, mut rx) = ProgressReporter::channel();
        let other = reporter.clone();
        assert!(reporter.report(Progress::Connected));
        assert!(!other.report(Progress::Connected));
        assert!(other.report(Progress::RequestSent));
        assert_eq!(reporter.last(), Some(Progress::RequestSent));
        assert_eq!(drain(&mut rx).milestones().len(), 2);
    }

    #[test]
    fn reach_skips_milestones_already_passed() {
        let (reporter, mut rx) = ProgressReporter::channel();
        assert!(reporter.reach(Progress::Connected));
        assert!(!reporter.reach(Progress::Connected));
        assert!(reporter.report(Progress::RequestSent));
        assert!(!reporter.reach(Progress::Connected));
        assert!(reporter.reach(Progress::ResponseReceived));
        assert!(reporter.report(Progress::Error));
        assert!(!reporter.reach(Progress::Processing));
        assert_eq!(
            drain(&mut rx).milestones(),
            &[Progress::Connected, Progress::RequestSent, Progress::ResponseReceived, Progress::Error]
        );
    }

    #[test]
    fn dropped_receiver_is_harmless() {
        let (reporter, rx) = ProgressReporter::channel();
        drop(rx);
        assert!(reporter.report(Progress::Connected));
        assert!(ProgressReporter::detached().report(Progress::Error));
    }
}
