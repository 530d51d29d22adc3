//! Retry state machine for per-chunk generation
//!
//! An attempt either succeeds with a value or fails in one of two ways:
//! softly (the backend answered but produced nothing usable) or hard (the
//! backend or parser errored). Both are retried after a fixed delay. When the
//! attempts run out the last failure decides the outcome.

use std::time::Duration;

/// Why an attempt failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// The call succeeded but produced no usable cards
    Empty,

    /// Backend or parse error
    Error(String),
}

/// State of a retried operation
#[derive(Debug, Clone, PartialEq)]
pub enum RetryState<T> {
    /// Attempt number `attempt` (1-based) is about to run
    Pending {
        /// Attempt about to run
        attempt: u32,
    },

    /// An attempt produced a value
    Succeeded(T),

    /// Attempt `attempt` failed and another is allowed
    RetryableFailure {
        /// Attempt that failed
        attempt: u32,
        /// Why it failed
        reason: FailureKind,
    },

    /// Every attempt failed; carries the reason of the last
    Exhausted(FailureKind),
}

impl<T> RetryState<T> {
    /// Initial state
    pub fn start() -> Self {
        RetryState::Pending { attempt: 1 }
    }

    /// Whether no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryState::Succeeded(_) | RetryState::Exhausted(_))
    }
}

/// How many attempts to make and how long to wait between them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; zero attempts is treated as one
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Total attempts allowed
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause between a failed attempt and the next
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// State after attempt `attempt` produced `outcome`
    pub fn advance<T>(&self, attempt: u32, outcome: Result<T, FailureKind>) -> RetryState<T> {
        match outcome {
            Ok(value) => RetryState::Succeeded(value),
            Err(reason) if attempt >= self.max_attempts => RetryState::Exhausted(reason),
            Err(reason) => RetryState::RetryableFailure { attempt, reason },
        }
    }
}
