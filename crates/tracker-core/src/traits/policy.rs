//! Fake-account classification hook invoked when a join is recorded

use chrono::Duration;

/// Decides whether a joining account counts as fake
pub trait FakeAccountPolicy: Send + Sync {
    fn is_fake(&self, account_age: Duration) -> bool;
}

/// Default policy: nothing is fake
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverFake;

impl FakeAccountPolicy for NeverFake {
    fn is_fake(&self, _account_age: Duration) -> bool {
        false
    }
}

/// Accounts younger than `min_days` are fake
#[derive(Debug, Clone, Copy)]
pub struct MinAccountAge {
    pub min_days: i64,
}

impl MinAccountAge {
    pub fn new(min_days: i64) -> Self {
        Self { min_days }
    }
}

impl FakeAccountPolicy for MinAccountAge {
    fn is_fake(&self, account_age: Duration) -> bool {
        account_age < Duration::days(self.min_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never_fake() {
        assert!(!NeverFake.is_fake(Duration::zero()));
    }

    #[test]
    fn test_min_account_age() {
        let policy = MinAccountAge::new(7);
        assert!(policy.is_fake(Duration::days(6)));
        assert!(policy.is_fake(Duration::hours(1)));
        assert!(!policy.is_fake(Duration::days(7)));
        assert!(!policy.is_fake(Duration::days(400)));
    }
}
