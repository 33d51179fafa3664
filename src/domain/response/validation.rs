//! Validation outcomes and the empty-timeout retry budget.

use std::sync::Arc;

/// Result of validating one user reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// Accept the raw reply.
    Valid,
    /// Reprompt.
    Invalid,
    /// Accept, but return this value instead of the raw reply.
    Normalized(String),
}

impl Validation {
    /// Value handed to the caller for an accepted reply.
    pub fn accepted_value(self, raw: &str) -> Option<String> {
        match self {
            Validation::Valid => Some(raw.to_string()),
            Validation::Normalized(value) => Some(value),
            Validation::Invalid => None,
        }
    }
}

impl From<bool> for Validation {
    fn from(valid: bool) -> Self {
        if valid {
            Validation::Valid
        } else {
            Validation::Invalid
        }
    }
}

impl From<Option<String>> for Validation {
    fn from(value: Option<String>) -> Self {
        value.map_or(Validation::Invalid, Validation::Normalized)
    }
}

/// Checks a reply.
pub type Validator = Arc<dyn Fn(&str) -> Validation + Send + Sync>;

/// Builds the reprompt for a rejected reply; empty means "just listen again".
pub type RepromptFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Empty-timeout cycles tolerated when retries are unlimited.
pub const UNLIMITED_EMPTY_TIMEOUTS: u32 = 2;

/// Counts empty timeouts against `num_retries` (`-1` = unlimited).
///
/// Only a reprompt after a failed validation resets the count; waits
/// extended by the recorder do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryBudget {
    num_retries: i32,
    num_fails: u32,
}

impl RetryBudget {
    pub fn new(num_retries: i32) -> Self {
        Self {
            num_retries,
            num_fails: 0,
        }
    }

    pub fn num_fails(&self) -> u32 {
        self.num_fails
    }

    /// Records an empty timeout; true when the budget is exhausted.
    pub fn record_empty_timeout(&mut self) -> bool {
        self.num_fails += 1;
        let limit = u32::try_from(self.num_retries).unwrap_or(UNLIMITED_EMPTY_TIMEOUTS);
        self.num_fails >= limit
    }

    /// The user said something and was asked again.
    pub fn reset(&mut self) {
        self.num_fails = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_value_prefers_normalized() {
        assert_eq!(
            Validation::Normalized("yes".into()).accepted_value("yeah sure"),
            Some("yes".to_string())
        );
        assert_eq!(
            Validation::Valid.accepted_value("yeah sure"),
            Some("yeah sure".to_string())
        );
        assert_eq!(Validation::Invalid.accepted_value("nope"), None);
    }

    #[test]
    fn conversions() {
        assert_eq!(Validation::from(true), Validation::Valid);
        assert_eq!(Validation::from(false), Validation::Invalid);
        assert_eq!(
            Validation::from(Some("x".to_string())),
            Validation::Normalized("x".into())
        );
        assert_eq!(Validation::from(None), Validation::Invalid);
    }

    #[test]
    fn budget_exhausts_after_num_retries_empty_timeouts() {
        let mut budget = RetryBudget::new(2);
        assert!(!budget.record_empty_timeout());
        assert!(budget.record_empty_timeout());
    }

    #[test]
    fn unlimited_budget_allows_one_reprompt() {
        let mut budget = RetryBudget::new(-1);
        assert!(!budget.record_empty_timeout());
        assert!(budget.record_empty_timeout());
    }

    #[test]
    fn zero_retries_gives_up_on_first_timeout() {
        let mut budget = RetryBudget::new(0);
        assert!(budget.record_empty_timeout());
    }

    #[test]
    fn reset_restarts_the_count() {
        let mut budget = RetryBudget::new(2);
        budget.record_empty_timeout();
        budget.reset();
        assert_eq!(budget.num_fails(), 0);
        assert!(!budget.record_empty_timeout());
    }
}
