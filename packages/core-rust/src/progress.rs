//! Lifecycle milestones reported while an invocation is in flight.

use std::fmt;

/// Coarse-grained progress milestone of one network exchange.
///
/// Within one invocation milestones only move forward; `Error` is terminal
/// and may replace any milestone that was not reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Progress {
    Error = -1,
    Connected = 0,
    RequestSent = 1,
    ResponseReceived = 2,
    Processing = 3,
    Complete = 4,
}

impl Progress {
    /// The full sequence of a successful exchange, in order.
    pub const SUCCESS_SEQUENCE: [Progress; 5] = [
        Progress::Connected,
        Progress::RequestSent,
        Progress::ResponseReceived,
        Progress::Processing,
        Progress::Complete,
    ];

    /// Numeric code as exposed by the legacy callback interface.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Error),
            0 => Some(Self::Connected),
            1 => Some(Self::RequestSent),
            2 => Some(Self::ResponseReceived),
            3 => Some(Self::Processing),
            4 => Some(Self::Complete),
            _ => None,
        }
    }

    /// No further milestone may follow this one.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Error | Self::Complete)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Connected => "connected",
            Self::RequestSent => "request_sent",
            Self::ResponseReceived => "response_received",
            Self::Processing => "processing",
            Self::Complete => "complete",
        }
    }

    /// Whether `next` may be reported after `self` within one invocation.
    #[must_use]
    pub fn may_precede(self, next: Progress) -> bool {
        if self.is_terminal() {
            return false;
        }
        next == Self::Error || next > self
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered record of the milestones one invocation reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressLog {
    milestones: Vec<Progress>,
}

impl ProgressLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, milestone: Progress) {
        self.milestones.push(milestone);
    }

    #[must_use]
    pub fn milestones(&self) -> &[Progress] {
        &self.milestones
    }

    #[must_use]
    pub fn last(&self) -> Option<Progress> {
        self.milestones.last().copied()
    }

    /// Strictly forward, no duplicates, nothing after a terminal milestone.
    #[must_use]
    pub fn follows_contract(&self) -> bool {
        self.milestones
            .windows(2)
            .all(|pair| pair[0].may_precede(pair[1]))
    }

    /// Exactly the five success milestones, each once, in order.
    #[must_use]
    pub fn is_complete_success(&self) -> bool {
        self.milestones == Progress::SUCCESS_SEQUENCE
    }
}

impl FromIterator<Progress> for ProgressLog {
    fn from_iter<I: IntoIterator<Item = Progress>>(iter: I) -> Self {
        Self {
            milestones: iter.into_iter().collect(),
        }
    }
}
