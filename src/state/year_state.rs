/// Year state definitions for tracking scrape progress
///
/// Every year link walks `Pending → Attempting → {Succeeded, Retrying →
/// Attempting, Abandoned}`. `YearProgress` enforces the walk and the attempt
/// budget.
use crate::ScrapeError;
use std::fmt;

/// Represents the current state of a year in the scrape loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YearState {
    // ===== Active States =====
    /// Year link is known but not yet attempted
    Pending,

    /// An attempt is in flight
    Attempting,

    /// The last attempt timed out and another one is allowed
    Retrying,

    // ===== Terminal States =====
    /// Tables for the year were processed
    Succeeded,

    /// The year was given up on
    Abandoned,
}

impl YearState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Abandoned)
    }

    /// Returns true if moving from `self` to `next` is a legal step
    pub fn can_transition_to(&self, next: YearState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Attempting)
                | (Self::Attempting, Self::Succeeded)
                | (Self::Attempting, Self::Retrying)
                | (Self::Attempting, Self::Abandoned)
                | (Self::Retrying, Self::Attempting)
        )
    }

    /// Converts the state to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Attempting => "attempting",
            Self::Retrying => "retrying",
            Self::Succeeded => "succeeded",
            Self::Abandoned => "abandoned",
        }
    }

    /// Parses a state from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "attempting" => Some(Self::Attempting),
            "retrying" => Some(Self::Retrying),
            "succeeded" => Some(Self::Succeeded),
            "abandoned" => Some(Self::Abandoned),
            _ => None,
        }
    }

    /// Returns all possible year states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Pending,
            Self::Attempting,
            Self::Retrying,
            Self::Succeeded,
            Self::Abandoned,
        ]
    }
}

impl fmt::Display for YearState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Tracks one year's walk through the state machine
#[derive(Debug, Clone)]
pub struct YearProgress {
    year: u16,
    state: YearState,
    attempts: u32,
    max_attempts: u32,
}

impl YearProgress {
    pub fn new(year: u16, max_attempts: u32) -> Self {
        Self {
            year,
            state: YearState::Pending,
            attempts: 0,
            max_attempts,
        }
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn state(&self) -> YearState {
        self.state
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Starts the next attempt and returns its 1-based number
    pub fn begin_attempt(&mut self) -> Result<u32, ScrapeError> {
        if self.attempts >= self.max_attempts {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to: YearState::Attempting,
            });
        }
        self.transition(YearState::Attempting)?;
        self.attempts += 1;
        Ok(self.attempts)
    }

    pub fn succeed(&mut self) -> Result<(), ScrapeError> {
        self.transition(YearState::Succeeded)
    }

    /// Records a retryable failure
    ///
    /// Moves to `Retrying` while attempts remain, otherwise to `Abandoned`.
    /// Returns the new state.
    pub fn retryable_failure(&mut self) -> Result<YearState, ScrapeError> {
        let next = if self.attempts < self.max_attempts {
            YearState::Retrying
        } else {
            YearState::Abandoned
        };
        self.transition(next)?;
        Ok(next)
    }

    pub fn abandon(&mut self) -> Result<(), ScrapeError> {
        self.transition(YearState::Abandoned)
    }

    fn transition(&mut self, next: YearState) -> Result<(), ScrapeError> {
        if !self.state.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_terminal() {
        assert!(!YearState::Pending.is_terminal());
        assert!(!YearState::Attempting.is_terminal());
        assert!(!YearState::Retrying.is_terminal());

        assert!(YearState::Succeeded.is_terminal());
        assert!(YearState::Abandoned.is_terminal());
    }

    #[test]
    fn test_transitions() {
        assert!(YearState::Pending.can_transition_to(YearState::Attempting));
        assert!(YearState::Retrying.can_transition_to(YearState::Attempting));
        assert!(YearState::Attempting.can_transition_to(YearState::Retrying));

        assert!(!YearState::Pending.can_transition_to(YearState::Succeeded));
        assert!(!YearState::Succeeded.can_transition_to(YearState::Attempting));
        assert!(!YearState::Abandoned.can_transition_to(YearState::Attempting));
        assert!(!YearState::Retrying.can_transition_to(YearState::Succeeded));
    }

    #[test]
    fn test_roundtrip_db_string() {
        for state in YearState::all_states() {
            let parsed = YearState::from_db_string(state.to_db_string());
            assert_eq!(Some(state), parsed, "Failed roundtrip for {:?}", state);
        }
        assert_eq!(YearState::from_db_string("invalid"), None);
    }

    #[test]
    fn test_success_on_first_attempt() {
        let mut progress = YearProgress::new(1901, 2);
        assert_eq!(progress.begin_attempt().unwrap(), 1);
        progress.succeed().unwrap();
        assert_eq!(progress.state(), YearState::Succeeded);
        assert_eq!(progress.attempts(), 1);
    }

    #[test]
    fn test_retry_budget_exhausts_to_abandoned() {
        let mut progress = YearProgress::new(1930, 2);

        progress.begin_attempt().unwrap();
        assert_eq!(progress.retryable_failure().unwrap(), YearState::Retrying);

        assert_eq!(progress.begin_attempt().unwrap(), 2);
        assert_eq!(progress.retryable_failure().unwrap(), YearState::Abandoned);

        assert!(progress.begin_attempt().is_err());
        assert_eq!(progress.attempts(), 2);
    }

    #[test]
    fn test_abandon_from_attempting_only() {
        let mut progress = YearProgress::new(1945, 2);
        assert!(progress.abandon().is_err());

        progress.begin_attempt().unwrap();
        progress.abandon().unwrap();
        assert!(progress.state().is_terminal());
        assert!(progress.succeed().is_err());
    }
}
