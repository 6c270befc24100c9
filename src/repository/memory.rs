use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{LeaveRepository, RepositoryError, RepositoryResult};
use crate::model::{
    LeaveBalance, LeaveFilter, LeavePolicy, LeaveRequest, LeaveStatus, NewLeaveRequest,
};

struct MemoryData {
    policy: LeavePolicy,
    balances: HashMap<u64, Vec<LeaveBalance>>,
    requests: BTreeMap<u64, LeaveRequest>,
    next_request_id: u64,
}

/// Process-local store used for development (`LEAVE_STORE=memory`) and tests.
pub struct MemoryLeaveRepository {
    data: RwLock<MemoryData>,
}

impl Default for MemoryLeaveRepository {
    fn default() -> Self {
        Self::with_policy(LeavePolicy::default())
    }
}

fn upsert(rows: &mut Vec<LeaveBalance>, balance: &LeaveBalance) {
    match rows.iter_mut().find(|row| row.is_type(&balance.leave_type)) {
        Some(row) => *row = balance.clone(),
        None => rows.push(balance.clone()),
    }
}

fn ensure_pending(
    requests: &BTreeMap<u64, LeaveRequest>,
    id: u64,
) -> RepositoryResult<()> {
    match requests.get(&id) {
        None => Err(RepositoryError::NotFound(format!("leave request {id}"))),
        Some(stored) if stored.status != LeaveStatus::Pending => Err(RepositoryError::Conflict(
            format!("leave request {id} is already {}", stored.status),
        )),
        Some(_) => Ok(()),
    }
}

impl MemoryLeaveRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: LeavePolicy) -> Self {
        Self {
            data: RwLock::new(MemoryData {
                policy,
                balances: HashMap::new(),
                requests: BTreeMap::new(),
                next_request_id: 1,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set a starting balance without going through the ledger.
    pub fn seed_balance(&self, employee_id: u64, leave_type: &str, balance: f64) {
        let mut data = self.write();
        let rows = data.balances.entry(employee_id).or_default();
        upsert(rows, &LeaveBalance::new(leave_type, balance));
    }
}

#[async_trait]
impl LeaveRepository for MemoryLeaveRepository {
    async fn load_policy(&self) -> RepositoryResult<LeavePolicy> {
        Ok(self.read().policy.clone())
    }

    async fn save_policy(&self, policy: &LeavePolicy) -> RepositoryResult<()> {
        self.write().policy = policy.clone();
        Ok(())
    }

    async fn load_balances(&self, employee_id: u64) -> RepositoryResult<Vec<LeaveBalance>> {
        Ok(self
            .read()
            .balances
            .get(&employee_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_balance(&self, employee_id: u64, balance: &LeaveBalance) -> RepositoryResult<()> {
        let mut data = self.write();
        upsert(data.balances.entry(employee_id).or_default(), balance);
        Ok(())
    }

    async fn load_request(&self, id: u64) -> RepositoryResult<Option<LeaveRequest>> {
        Ok(self.read().requests.get(&id).cloned())
    }

    async fn load_requests(
        &self,
        filter: &LeaveFilter,
    ) -> RepositoryResult<(Vec<LeaveRequest>, u64)> {
        let data = self.read();
        let mut matching: Vec<&LeaveRequest> = data
            .requests
            .values()
            .filter(|request| filter.matches(request))
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap_or(usize::MAX))
            .take(filter.per_page() as usize)
            .cloned()
            .collect();

        Ok((page, total))
    }

    async fn insert_request(&self, request: NewLeaveRequest) -> RepositoryResult<LeaveRequest> {
        let mut data = self.write();
        let id = data.next_request_id;
        data.next_request_id += 1;

        let stored = LeaveRequest {
            id,
            employee_id: request.employee_id,
            employee_name: request.employee_name,
            employee_email: request.employee_email,
            leave_type: request.leave_type,
            start_date: request.start_date,
            end_date: request.end_date,
            status: LeaveStatus::Pending,
            reason: Some(request.reason),
            created_at: Utc::now(),
        };
        data.requests.insert(id, stored.clone());
        Ok(stored)
    }

    async fn save_request(&self, request: &LeaveRequest) -> RepositoryResult<()> {
        let mut data = self.write();
        ensure_pending(&data.requests, request.id)?;
        data.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn commit_approval(
        &self,
        request: &LeaveRequest,
        previous_balance: f64,
        balance: &LeaveBalance,
    ) -> RepositoryResult<()> {
        // single write guard: both updates land or neither does
        let mut data = self.write();
        ensure_pending(&data.requests, request.id)?;

        let current = data
            .balances
            .get(&request.employee_id)
            .and_then(|rows| rows.iter().find(|row| row.is_type(&balance.leave_type)))
            .map(|row| row.balance)
            .unwrap_or(0.0);
        if current != previous_balance {
            return Err(RepositoryError::Conflict(format!(
                "{} balance of employee {} changed during approval",
                balance.leave_type, request.employee_id
            )));
        }

        data.requests.insert(request.id, request.clone());
        upsert(data.balances.entry(request.employee_id).or_default(), balance);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn new_request(employee_id: u64, name: &str, day: u32) -> NewLeaveRequest {
        NewLeaveRequest {
            employee_id,
            employee_name: name.to_string(),
            employee_email: format!("{}@company.com", name.to_lowercase().replace(' ', ".")),
            leave_type: "annual".to_string(),
            start_date: NaiveDate::from_ymd_opt(2023, 9, day).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2023, 9, day + 1).expect("valid date"),
            reason: "Family vacation".to_string(),
        }
    }

    #[actix_web::test]
    async fn insert_assigns_sequential_ids_and_pending_status() {
        let repo = MemoryLeaveRepository::new();
        let first = repo.insert_request(new_request(1, "Bob Brown", 1)).await.expect("insert");
        let second = repo.insert_request(new_request(2, "Jane Smith", 3)).await.expect("insert");

        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(first.status, LeaveStatus::Pending);
        assert_eq!(
            repo.load_request(2).await.expect("load").map(|r| r.employee_name),
            Some("Jane Smith".to_string())
        );
        assert!(repo.load_request(3).await.expect("load").is_none());
    }

    #[actix_web::test]
    async fn requests_page_newest_first() {
        let repo = MemoryLeaveRepository::new();
        for day in 1..=5 {
            repo.insert_request(new_request(1, "Bob Brown", day)).await.expect("insert");
        }

        let filter = LeaveFilter {
            page: Some(2),
            per_page: Some(2),
            ..LeaveFilter::default()
        };
        let (page, total) = repo.load_requests(&filter).await.expect("list");
        assert_eq!(total, 5);
        assert_eq!(page.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2]);
    }

    #[actix_web::test]
    async fn terminal_requests_cannot_be_saved_again() {
        let repo = MemoryLeaveRepository::new();
        let mut request = repo.insert_request(new_request(1, "Bob Brown", 1)).await.expect("insert");
        request.status = LeaveStatus::Rejected;
        repo.save_request(&request).await.expect("first transition");

        request.status = LeaveStatus::Approved;
        assert!(matches!(
            repo.commit_approval(&request, 0.0, &LeaveBalance::new("annual", 0.0)).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(repo.load_balances(1).await.expect("load").is_empty());
    }

    #[actix_web::test]
    async fn approval_refuses_stale_balance() {
        let repo = MemoryLeaveRepository::new();
        repo.seed_balance(1, "annual", 5.0);
        let mut request = repo.insert_request(new_request(1, "Bob Brown", 1)).await.expect("insert");
        request.status = LeaveStatus::Approved;

        assert!(matches!(
            repo.commit_approval(&request, 4.0, &LeaveBalance::new("annual", 2.0)).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert_eq!(
            repo.load_request(request.id).await.expect("load").map(|r| r.status),
            Some(LeaveStatus::Pending)
        );

        repo.commit_approval(&request, 5.0, &LeaveBalance::new("annual", 3.0))
            .await
            .expect("fresh balance commits");
        assert_eq!(
            repo.load_balances(1).await.expect("load"),
            vec![LeaveBalance::new("annual", 3.0)]
        );
    }

    #[actix_web::test]
    async fn balances_upsert_by_type_ignoring_case() {
        let repo = MemoryLeaveRepository::new();
        repo.seed_balance(9, "Annual", 4.0);
        repo.save_balance(9, &LeaveBalance::new("annual", 2.0)).await.expect("save");

        let rows = repo.load_balances(9).await.expect("load");
        assert_eq!(rows, vec![LeaveBalance::new("annual", 2.0)]);
    }
}
