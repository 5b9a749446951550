/// Run phase definitions for the crawl coordinator
///
/// A run moves `Idle → Running → (Draining | Interrupted) → Stopped`. `Stopped` is terminal.
use std::fmt;

/// Represents where a crawl run is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunPhase {
    /// Coordinator created, nothing dispatched yet
    Idle,

    /// Dispatching URLs from the frontier
    Running,

    /// Frontier exhausted or page budget reached; finishing up
    Draining,

    /// Interrupt received; no new dispatches, in-flight fetches are finishing
    Interrupted,

    /// Final checkpoint written (or a fatal error ended the run)
    Stopped,
}

impl RunPhase {
    /// Returns true if a run in this phase may move to `next`
    pub fn can_transition_to(&self, next: RunPhase) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Draining)
                | (Self::Running, Self::Interrupted)
                | (Self::Draining, Self::Stopped)
                | (Self::Interrupted, Self::Stopped)
                // A fatal persistence error stops a run that has started
                | (Self::Running, Self::Stopped)
        )
    }

    /// Returns true while new URLs may be dispatched
    pub fn is_dispatching(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Draining => "draining",
            Self::Interrupted => "interrupted",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
