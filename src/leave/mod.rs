//! Leave accounting: chargeable duration, advance-notice scoring, the
//! balance ledger and the request lifecycle that ties them together.

pub mod duration;
pub mod error;
pub mod incentive;
pub mod ledger;
pub mod locks;
pub mod notifier;
pub mod policy_cache;
pub mod service;

pub use duration::calculate_leave_duration;
pub use error::{LeaveError, NotifierError};
pub use incentive::score_advance_notice;
pub use notifier::{LogNotifier, Notifier};
pub use service::{LeaveService, Submission, Transition};
