use crate::repository::RepositoryError;

/// Errors raised by leave operations. Nothing here is applied partially:
/// every variant means the operation left the stored state untouched.
#[derive(Debug, thiserror::Error)]
pub enum LeaveError {
    #[error("{0}")]
    Validation(String),
    #[error("leave type '{0}' is not covered by the leave policy")]
    PolicyNotFound(String),
    #[error("unknown leave type '{0}'")]
    UnknownLeaveType(String),
    #[error(
        "insufficient {leave_type} balance: requested {requested} day(s), available {available}, short by {shortfall}"
    )]
    InsufficientBalance {
        leave_type: String,
        requested: f64,
        available: f64,
        shortfall: f64,
    },
    #[error("{leave_type} balance cannot go below zero (current {current}, change {delta})")]
    NegativeBalance {
        leave_type: String,
        current: f64,
        delta: f64,
    },
    #[error("leave request {0} not found")]
    RequestNotFound(u64),
    #[error("leave request {id} is already {status}")]
    InvalidTransition { id: u64, status: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A notification that could not be delivered. Reported alongside a committed
/// transition rather than in place of it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("notification to {to} failed after {attempts} attempt(s): {reason}")]
pub struct NotifierError {
    pub to: String,
    pub attempts: u32,
    pub reason: String,
}

impl NotifierError {
    pub fn new(to: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            attempts: 1,
            reason: reason.into(),
        }
    }
}
