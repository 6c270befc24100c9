use async_trait::async_trait;
use tracing::{info, warn};

use crate::leave::NotifierError;
use crate::model::LeaveRequest;

/// Outbound message channel (e-mail, chat, ...). Delivery is best effort from
/// the lifecycle's point of view: a failed send never undoes a transition.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifierError>;
}

/// Writes notifications to the application log instead of delivering them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), NotifierError> {
        info!(to, subject, body, "Notification sent");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Submitted,
    Approved,
    Rejected,
}

impl Notice {
    fn verb(self) -> &'static str {
        match self {
            Notice::Submitted => "submitted",
            Notice::Approved => "approved",
            Notice::Rejected => "rejected",
        }
    }

    pub fn subject(self) -> String {
        match self {
            Notice::Submitted => "Leave Request Submitted",
            Notice::Approved => "Leave Request Approved",
            Notice::Rejected => "Leave Request Rejected",
        }
        .to_string()
    }

    pub fn body(self, request: &LeaveRequest) -> String {
        format!(
            "Your {} request from {} to {} has been {}.",
            request.leave_type,
            request.start_date,
            request.end_date,
            self.verb()
        )
    }
}

/// Sends `notice` for `request`, retrying up to `attempts` times. Returns the
/// last failure so the caller can surface it as a warning.
pub async fn dispatch(
    notifier: &dyn Notifier,
    notice: Notice,
    request: &LeaveRequest,
    attempts: u32,
) -> Option<NotifierError> {
    let attempts = attempts.max(1);
    let to = request.employee_email.as_str();
    let subject = notice.subject();
    let body = notice.body(request);

    let mut last_error = None;
    for attempt in 1..=attempts {
        match notifier.send(to, &subject, &body).await {
            Ok(()) => return None,
            Err(e) => {
                warn!(
                    error = %e,
                    leave_id = request.id,
                    attempt,
                    "Leave notification failed"
                );
                last_error = Some(e);
            }
        }
    }

    last_error.map(|e| NotifierError {
        attempts,
        ..e
    })
}
