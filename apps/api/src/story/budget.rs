//! Token ceiling shared by story requests.
//!
//! The provider reports how many tokens the account can still afford when a
//! request asks for too many. `TokenBudget` decides whether that discovery
//! outlives the request that made it.

use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use anyhow::anyhow;

/// Whether a lowered ceiling is remembered across requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetPolicy {
    /// A ceiling learned by any request is used by every later request.
    Persist,
    /// Each request starts from the configured default.
    PerRequest,
}

impl FromStr for BudgetPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "persist" => Ok(BudgetPolicy::Persist),
            "per-request" => Ok(BudgetPolicy::PerRequest),
            other => Err(anyhow!(
                "TOKEN_BUDGET_POLICY must be 'persist' or 'per-request', got '{other}'"
            )),
        }
    }
}

#[derive(Debug)]
pub struct TokenBudget {
    default: u32,
    current: AtomicU32,
    policy: BudgetPolicy,
}

impl TokenBudget {
    pub fn new(default: u32, policy: BudgetPolicy) -> Self {
        Self {
            default,
            current: AtomicU32::new(default),
            policy,
        }
    }

    /// Ceiling a new request's first attempt is sent with.
    pub fn starting_ceiling(&self) -> u32 {
        match self.policy {
            BudgetPolicy::Persist => self.current.load(Ordering::SeqCst),
            BudgetPolicy::PerRequest => self.default,
        }
    }

    /// Records an allowance reported by the provider. Returns the previous shared value.
    pub fn record_allowance(&self, allowance: u32) -> u32 {
        match self.policy {
            BudgetPolicy::Persist => self.current.swap(allowance, Ordering::SeqCst),
            BudgetPolicy::PerRequest => self.current.load(Ordering::SeqCst),
        }
    }

    /// Shared ceiling as of now. Never changes under `PerRequest`.
    pub fn current(&self) -> u32 {
        self.current.load(Ordering::SeqCst)
    }

    pub fn default_ceiling(&self) -> u32 {
        self.default
    }

    pub fn policy(&self) -> BudgetPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_carries_lowered_ceiling_forward() {
        let budget = TokenBudget::new(650, BudgetPolicy::Persist);
        assert_eq!(budget.starting_ceiling(), 650);

        assert_eq!(budget.record_allowance(320), 650);

        assert_eq!(budget.starting_ceiling(), 320);
        assert_eq!(budget.current(), 320);
        assert_eq!(budget.default_ceiling(), 650);
    }

    #[test]
    fn test_per_request_always_starts_from_default() {
        let budget = TokenBudget::new(650, BudgetPolicy::PerRequest);

        budget.record_allowance(320);

        assert_eq!(budget.starting_ceiling(), 650);
        assert_eq!(budget.current(), 650);
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("persist".parse::<BudgetPolicy>().unwrap(), BudgetPolicy::Persist);
        assert_eq!(" PER-REQUEST ".parse::<BudgetPolicy>().unwrap(), BudgetPolicy::PerRequest);
        assert!("reset".parse::<BudgetPolicy>().is_err());
        assert!("per_request".parse::<BudgetPolicy>().is_err());
        assert!("sometimes".parse::<BudgetPolicy>().is_err());
    }
}
