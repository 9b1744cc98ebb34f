//! Runtime configuration, following a `Default` + named-preset
//! convention.

use crate::query::ast::PlannerMode;

const TX_TIMEOUT_ENV_VAR: &str = "TRIPLEDB_TX_TIMEOUT_MSEC";
const DEFAULT_TX_TIMEOUT_MSEC: u64 = 100_000;
const DEFAULT_DURABLE_REGION_SIZE: u64 = 1 << 30; // 1 GiB

/// Process-wide runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// How long a `transact` call may block retrying its compare-and-set
    /// before failing with [`crate::error::GraphError::TransactionTimeout`].
    /// Defaults to 100,000 ms; overridable via `TRIPLEDB_TX_TIMEOUT_MSEC`.
    pub tx_timeout_msec: u64,
    /// Whether the query planner reorders `where` clauses for selectivity.
    pub planner: PlannerMode,
    /// The memory-mapped paged reader's region size for the (unimplemented)
    /// durable collaborator. Defaults to 1 GiB.
    pub durable_region_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tx_timeout_msec: tx_timeout_from_env().unwrap_or(DEFAULT_TX_TIMEOUT_MSEC),
            planner: PlannerMode::Auto,
            durable_region_size: DEFAULT_DURABLE_REGION_SIZE,
        }
    }
}

fn tx_timeout_from_env() -> Option<u64> {
    std::env::var(TX_TIMEOUT_ENV_VAR).ok()?.parse().ok()
}

impl Config {
    /// The planner always reorders clauses, transactions never time out.
    /// Useful for tests and one-shot scripts.
    pub fn unbounded() -> Self {
        Self {
            tx_timeout_msec: u64::MAX,
            planner: PlannerMode::Auto,
            durable_region_size: DEFAULT_DURABLE_REGION_SIZE,
        }
    }

    /// The caller supplies its own clause order (`planner: User`) and wants
    /// a tight retry budget.
    pub fn user_planned(tx_timeout_msec: u64) -> Self {
        Self {
            tx_timeout_msec,
            planner: PlannerMode::User,
            durable_region_size: DEFAULT_DURABLE_REGION_SIZE,
        }
    }
}
