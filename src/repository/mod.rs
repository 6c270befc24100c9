//! Storage seam for the leave module. The lifecycle only talks to
//! [`LeaveRepository`], so it runs the same against MySQL and memory.

use async_trait::async_trait;

use crate::model::{LeaveBalance, LeaveFilter, LeavePolicy, LeaveRequest, NewLeaveRequest};

pub mod memory;
pub mod mysql;

pub use memory::MemoryLeaveRepository;
pub use mysql::MySqlLeaveRepository;

pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found: {0}")]
    NotFound(String),
    /// A guarded write found the row in a different state than expected.
    #[error("conflicting update: {0}")]
    Conflict(String),
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("stored data is invalid: {0}")]
    Corrupt(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait LeaveRepository: Send + Sync {
    async fn load_policy(&self) -> RepositoryResult<LeavePolicy>;

    async fn save_policy(&self, policy: &LeavePolicy) -> RepositoryResult<()>;

    /// Stored balance rows for one employee. Types without a row are absent.
    async fn load_balances(&self, employee_id: u64) -> RepositoryResult<Vec<LeaveBalance>>;

    async fn save_balance(&self, employee_id: u64, balance: &LeaveBalance) -> RepositoryResult<()>;

    async fn load_request(&self, id: u64) -> RepositoryResult<Option<LeaveRequest>>;

    /// One page of matching requests, newest first, plus the total match count.
    async fn load_requests(&self, filter: &LeaveFilter) -> RepositoryResult<(Vec<LeaveRequest>, u64)>;

    async fn insert_request(&self, request: NewLeaveRequest) -> RepositoryResult<LeaveRequest>;

    /// Persists a status change of a pending request.
    async fn save_request(&self, request: &LeaveRequest) -> RepositoryResult<()>;

    /// Writes the approved request and the debited balance together, or
    /// neither of them. Fails with `Conflict` if the request is no longer
    /// pending or the stored balance no longer equals `previous_balance`.
    async fn commit_approval(
        &self,
        request: &LeaveRequest,
        previous_balance: f64,
        balance: &LeaveBalance,
    ) -> RepositoryResult<()>;
}
