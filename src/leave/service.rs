use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info};

use super::duration::calculate_leave_duration;
use super::incentive::score_advance_notice;
use super::ledger;
use super::locks::LedgerLocks;
use super::notifier::{Notice, Notifier, dispatch};
use super::policy_cache::PolicyCache;
use super::{LeaveError, NotifierError};
use crate::model::{LeaveBalance, LeaveFilter, LeavePolicy, LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::repository::LeaveRepository;

const REASON_MIN_CHARS: usize = 10;
const REASON_MAX_CHARS: usize = 500;
const DEFAULT_POLICY_TTL: Duration = Duration::from_secs(300);
const DEFAULT_NOTIFY_ATTEMPTS: u32 = 3;

/// Result of a submission.
#[derive(Debug)]
pub struct Submission {
    pub request: LeaveRequest,
    /// Advance-notice points, informational only
    pub points: u32,
    pub warning: Option<NotifierError>,
}

/// Result of an approval or rejection.
#[derive(Debug)]
pub struct Transition {
    pub request: LeaveRequest,
    /// Days charged; `None` for rejections
    pub duration: Option<u32>,
    /// Balance after the debit; `None` for rejections
    pub balance: Option<LeaveBalance>,
    pub warning: Option<NotifierError>,
}

/// Caller-facing leave operations: request lifecycle, balance ledger and
/// policy access over an injected repository and notifier.
pub struct LeaveService {
    repository: Arc<dyn LeaveRepository>,
    notifier: Arc<dyn Notifier>,
    policy: PolicyCache,
    locks: LedgerLocks,
    notify_attempts: u32,
}

fn validate_submission(request: &NewLeaveRequest) -> Result<(), LeaveError> {
    if request.leave_type.trim().is_empty() {
        return Err(LeaveError::Validation("leave_type is required".to_string()));
    }

    if request.end_date < request.start_date {
        return Err(LeaveError::Validation(
            "end_date cannot be before start_date".to_string(),
        ));
    }

    let reason_len = request.reason.trim().chars().count();
    if !(REASON_MIN_CHARS..=REASON_MAX_CHARS).contains(&reason_len) {
        return Err(LeaveError::Validation(format!(
            "reason must be between {REASON_MIN_CHARS} and {REASON_MAX_CHARS} characters"
        )));
    }

    Ok(())
}

impl LeaveService {
    pub fn new(repository: Arc<dyn LeaveRepository>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            repository,
            notifier,
            policy: PolicyCache::new(DEFAULT_POLICY_TTL),
            locks: LedgerLocks::new(),
            notify_attempts: DEFAULT_NOTIFY_ATTEMPTS,
        }
    }

    pub fn with_policy_ttl(mut self, ttl: Duration) -> Self {
        self.policy = PolicyCache::new(ttl);
        self
    }

    pub fn with_notify_attempts(mut self, attempts: u32) -> Self {
        self.notify_attempts = attempts.max(1);
        self
    }

    /* =========================
    Policy
    ========================= */

    pub async fn policy(&self) -> Result<Arc<LeavePolicy>, LeaveError> {
        Ok(self.policy.get(self.repository.as_ref()).await?)
    }

    pub async fn update_policy(&self, mut policy: LeavePolicy) -> Result<Arc<LeavePolicy>, LeaveError> {
        for entry in &mut policy.leave_types {
            entry.leave_type = entry.leave_type.trim().to_string();
        }
        for holiday in &mut policy.holidays {
            holiday.name = holiday.name.trim().to_string();
        }
        policy.validate()?;
        self.repository.save_policy(&policy).await?;
        self.policy.replace(policy).await;
        info!("Leave policy updated");
        self.policy().await
    }

    /// Chargeable days for a prospective request.
    pub async fn calculate_duration(&self, start: NaiveDate, end: NaiveDate) -> Result<u32, LeaveError> {
        if end < start {
            return Err(LeaveError::Validation(
                "end_date cannot be before start_date".to_string(),
            ));
        }
        let policy = self.policy().await?;
        Ok(calculate_leave_duration(&policy, start, end))
    }

    /* =========================
    Request lifecycle
    ========================= */

    pub async fn submit_request(
        &self,
        mut request: NewLeaveRequest,
        today: NaiveDate,
    ) -> Result<Submission, LeaveError> {
        validate_submission(&request)?;
        request.leave_type = request.leave_type.trim().to_string();
        request.reason = request.reason.trim().to_string();

        let points = score_advance_notice(today, request.start_date);
        let stored = self.repository.insert_request(request).await?;

        info!(
            leave_id = stored.id,
            employee_id = stored.employee_id,
            leave_type = %stored.leave_type,
            points,
            "Leave request submitted"
        );

        let warning = dispatch(
            self.notifier.as_ref(),
            Notice::Submitted,
            &stored,
            self.notify_attempts,
        )
        .await;

        Ok(Submission {
            request: stored,
            points,
            warning,
        })
    }

    pub async fn get_request(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        self.repository
            .load_request(id)
            .await?
            .ok_or(LeaveError::RequestNotFound(id))
    }

    pub async fn list_requests(
        &self,
        filter: &LeaveFilter,
    ) -> Result<(Vec<LeaveRequest>, u64), LeaveError> {
        Ok(self.repository.load_requests(filter).await?)
    }

    async fn pending_request(&self, id: u64) -> Result<LeaveRequest, LeaveError> {
        let request = self.get_request(id).await?;
        if request.status.is_terminal() {
            return Err(LeaveError::InvalidTransition {
                id,
                status: request.status.to_string(),
            });
        }
        Ok(request)
    }

    pub async fn approve_request(&self, id: u64) -> Result<Transition, LeaveError> {
        let located = self.pending_request(id).await?;
        let _guard = self
            .locks
            .acquire(located.employee_id, &located.leave_type)
            .await;

        // re-read under the lock; another approver may have got here first
        let mut request = self.pending_request(id).await?;
        let policy = self.policy().await?;
        let entry = policy
            .leave_type(&request.leave_type)
            .ok_or_else(|| LeaveError::PolicyNotFound(request.leave_type.clone()))?;

        let duration = calculate_leave_duration(&policy, request.start_date, request.end_date);
        let stored = self.repository.load_balances(request.employee_id).await?;
        let previous = ledger::balance_of(&policy, &stored, &entry.leave_type)?;
        let balance = ledger::debit(&policy, &stored, &entry.leave_type, duration)?;

        request.status = LeaveStatus::Approved;
        self.repository
            .commit_approval(&request, previous, &balance)
            .await?;

        info!(
            leave_id = id,
            employee_id = request.employee_id,
            duration,
            balance = balance.balance,
            "Leave request approved"
        );

        let warning = dispatch(
            self.notifier.as_ref(),
            Notice::Approved,
            &request,
            self.notify_attempts,
        )
        .await;

        Ok(Transition {
            request,
            duration: Some(duration),
            balance: Some(balance),
            warning,
        })
    }

    pub async fn reject_request(&self, id: u64) -> Result<Transition, LeaveError> {
        let located = self.pending_request(id).await?;
        let _guard = self
            .locks
            .acquire(located.employee_id, &located.leave_type)
            .await;

        let mut request = self.pending_request(id).await?;
        request.status = LeaveStatus::Rejected;
        self.repository.save_request(&request).await?;

        info!(
            leave_id = id,
            employee_id = request.employee_id,
            "Leave request rejected"
        );

        let warning = dispatch(
            self.notifier.as_ref(),
            Notice::Rejected,
            &request,
            self.notify_attempts,
        )
        .await;

        Ok(Transition {
            request,
            duration: None,
            balance: None,
            warning,
        })
    }

    /* =========================
    Balance ledger
    ========================= */

    pub async fn get_balances(&self, employee_id: u64) -> Result<Vec<LeaveBalance>, LeaveError> {
        let policy = self.policy().await?;
        let stored = self.repository.load_balances(employee_id).await?;
        Ok(ledger::balances_for(&policy, &stored))
    }

    pub async fn get_balance(&self, employee_id: u64, leave_type: &str) -> Result<f64, LeaveError> {
        let policy = self.policy().await?;
        let stored = self.repository.load_balances(employee_id).await?;
        ledger::balance_of(&policy, &stored, leave_type)
    }

    pub async fn adjust_balance(
        &self,
        employee_id: u64,
        leave_type: &str,
        delta: f64,
    ) -> Result<f64, LeaveError> {
        let policy = self.policy().await?;
        if policy.leave_type(leave_type).is_none() {
            return Err(LeaveError::UnknownLeaveType(leave_type.trim().to_string()));
        }

        let _guard = self.locks.acquire(employee_id, leave_type).await;
        let stored = self.repository.load_balances(employee_id).await?;
        let updated = ledger::apply_delta(&policy, &stored, leave_type, delta)?;
        self.repository.save_balance(employee_id, &updated).await?;

        info!(
            employee_id,
            leave_type = %updated.leave_type,
            delta,
            balance = updated.balance,
            "Leave balance adjusted"
        );
        Ok(updated.balance)
    }

    /// Credits one month of accrual to every leave type.
    pub async fn accrue_month(&self, employee_id: u64) -> Result<Vec<LeaveBalance>, LeaveError> {
        self.rewrite_balances(employee_id, ledger::accrue_month).await
    }

    /// Applies the fiscal year carry-over limits.
    pub async fn close_fiscal_year(&self, employee_id: u64) -> Result<Vec<LeaveBalance>, LeaveError> {
        self.rewrite_balances(employee_id, ledger::close_fiscal_year).await
    }

    async fn rewrite_balances(
        &self,
        employee_id: u64,
        rewrite: fn(&LeavePolicy, &[LeaveBalance]) -> Vec<LeaveBalance>,
    ) -> Result<Vec<LeaveBalance>, LeaveError> {
        let policy = self.policy().await?;
        let _guards = self
            .locks
            .acquire_all(
                employee_id,
                policy.leave_types.iter().map(|entry| entry.leave_type.as_str()),
            )
            .await;

        let stored = self.repository.load_balances(employee_id).await?;
        let updated = rewrite(&policy, &stored);
        for balance in &updated {
            self.repository.save_balance(employee_id, balance).await?;
        }

        debug!(employee_id, count = updated.len(), "Leave balances rewritten");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_request(reason: &str, start: (u32, u32), end: (u32, u32)) -> NewLeaveRequest {
        NewLeaveRequest {
            employee_id: 1,
            employee_name: "Bob Brown".to_string(),
            employee_email: "bob@company.com".to_string(),
            leave_type: "annual".to_string(),
            start_date: NaiveDate::from_ymd_opt(2023, start.0, start.1).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2023, end.0, end.1).expect("valid date"),
            reason: reason.to_string(),
        }
    }

    #[test]
    fn submission_rules() {
        assert!(validate_submission(&new_request("Family vacation", (9, 20), (9, 25))).is_ok());
        assert!(validate_submission(&new_request("Family vacation", (9, 20), (9, 20))).is_ok());
        assert!(matches!(
            validate_submission(&new_request("Family vacation", (9, 25), (9, 20))),
            Err(LeaveError::Validation(msg)) if msg.contains("end_date")
        ));
        assert!(matches!(
            validate_submission(&new_request("  too short   ", (9, 20), (9, 25))),
            Err(LeaveError::Validation(msg)) if msg.contains("reason")
        ));
        assert!(validate_submission(&new_request(&"x".repeat(500), (9, 20), (9, 25))).is_ok());
        assert!(validate_submission(&new_request(&"x".repeat(501), (9, 20), (9, 25))).is_err());

        let mut blank_type = new_request("Family vacation", (9, 20), (9, 25));
        blank_type.leave_type = " ".to_string();
        assert!(validate_submission(&blank_type).is_err());
    }
}
