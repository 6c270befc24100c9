pub mod leave_balance;
pub mod leave_policy;
pub mod leave_request;
pub mod role;

pub use leave_balance::{LeaveBalance, leave_type_key};
pub use leave_policy::{Holiday, LeavePolicy, LeaveTypePolicy};
pub use leave_request::{LeaveFilter, LeaveRequest, LeaveStatus, NewLeaveRequest};
pub use role::Role;
