use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{LeaveRepository, RepositoryError, RepositoryResult};
use crate::model::{
    Holiday, LeaveBalance, LeaveFilter, LeavePolicy, LeaveRequest, LeaveStatus, LeaveTypePolicy,
    NewLeaveRequest,
};

/// MySQL-backed store; tables are described in `sql/schema.sql`.
#[derive(Clone)]
pub struct MySqlLeaveRepository {
    pool: MySqlPool,
}

#[derive(FromRow)]
struct LeaveRequestRow {
    id: u64,
    employee_id: u64,
    employee_name: String,
    employee_email: String,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRequestRow> for LeaveRequest {
    type Error = RepositoryError;

    fn try_from(row: LeaveRequestRow) -> Result<Self, Self::Error> {
        let status = LeaveStatus::from_str(&row.status).map_err(|_| {
            RepositoryError::Corrupt(format!(
                "leave request {} has unknown status '{}'",
                row.id, row.status
            ))
        })?;

        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            employee_name: row.employee_name,
            employee_email: row.employee_email,
            leave_type: row.leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            status,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct LeaveTypeRow {
    leave_type: String,
    accrual_rate: f64,
    max_accrual: f64,
    carry_over: f64,
}

#[derive(FromRow)]
struct HolidayRow {
    holiday_date: NaiveDate,
    name: String,
}

#[derive(FromRow)]
struct SettingsRow {
    work_week: String,
    fiscal_year_start: NaiveDate,
}

/// Work week is stored as seven '0'/'1' characters, Sunday first.
fn encode_work_week(work_week: &[bool; 7]) -> String {
    work_week
        .iter()
        .map(|day| if *day { '1' } else { '0' })
        .collect()
}

fn decode_work_week(raw: &str) -> RepositoryResult<[bool; 7]> {
    let flags: Vec<char> = raw.chars().collect();
    if flags.len() != 7 {
        return Err(RepositoryError::Corrupt(format!(
            "work week '{raw}' must have exactly 7 flags"
        )));
    }

    let mut days = [false; 7];
    for (day, flag) in days.iter_mut().zip(flags) {
        *day = match flag {
            '1' => true,
            '0' => false,
            other => {
                return Err(RepositoryError::Corrupt(format!(
                    "work week flag '{other}' is not 0 or 1"
                )));
            }
        };
    }
    Ok(days)
}

/// Escapes LIKE wildcards so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(String),
    Date(NaiveDate),
}

const REQUEST_COLUMNS: &str = "id, employee_id, employee_name, employee_email, leave_type, \
     start_date, end_date, status, reason, created_at";

impl MySqlLeaveRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn where_clause(filter: &LeaveFilter) -> (String, Vec<FilterValue>) {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args = Vec::new();

        if let Some(employee_id) = filter.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(employee_id));
        }

        if let Some(status) = filter.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.to_string()));
        }

        if let Some(from) = filter.from {
            where_sql.push_str(" AND end_date >= ?");
            args.push(FilterValue::Date(from));
        }

        if let Some(to) = filter.to {
            where_sql.push_str(" AND start_date <= ?");
            args.push(FilterValue::Date(to));
        }

        if let Some(term) = filter.search_term() {
            where_sql.push_str(" AND (LOWER(employee_name) LIKE ? OR LOWER(leave_type) LIKE ?)");
            let pattern = like_pattern(&term);
            args.push(FilterValue::Str(pattern.clone()));
            args.push(FilterValue::Str(pattern));
        }

        (where_sql, args)
    }
}

#[async_trait]
impl LeaveRepository for MySqlLeaveRepository {
    async fn load_policy(&self) -> RepositoryResult<LeavePolicy> {
        let settings = sqlx::query_as::<_, SettingsRow>(
            "SELECT work_week, fiscal_year_start FROM leave_settings WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RepositoryError::NotFound("leave policy settings".to_string()))?;

        let leave_types = sqlx::query_as::<_, LeaveTypeRow>(
            r#"
            SELECT leave_type, accrual_rate, max_accrual, carry_over
            FROM leave_types
            ORDER BY position, leave_type
            "#,
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| LeaveTypePolicy {
            leave_type: row.leave_type,
            accrual_rate: row.accrual_rate,
            max_accrual: row.max_accrual,
            carry_over: row.carry_over,
        })
        .collect();

        let holidays = sqlx::query_as::<_, HolidayRow>(
            "SELECT holiday_date, name FROM holidays ORDER BY holiday_date",
        )
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| Holiday {
            date: row.holiday_date,
            name: row.name,
        })
        .collect();

        Ok(LeavePolicy {
            leave_types,
            holidays,
            work_week: decode_work_week(&settings.work_week)?,
            fiscal_year_start: settings.fiscal_year_start,
        })
    }

    async fn save_policy(&self, policy: &LeavePolicy) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM leave_types").execute(&mut *tx).await?;
        for (position, entry) in policy.leave_types.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO leave_types
                    (leave_type, accrual_rate, max_accrual, carry_over, position)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(entry.leave_type.trim())
            .bind(entry.accrual_rate)
            .bind(entry.max_accrual)
            .bind(entry.carry_over)
            .bind(position as u32)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM holidays").execute(&mut *tx).await?;
        for holiday in &policy.holidays {
            sqlx::query("INSERT INTO holidays (holiday_date, name) VALUES (?, ?)")
                .bind(holiday.date)
                .bind(holiday.name.trim())
                .execute(&mut *tx)
                .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO leave_settings (id, work_week, fiscal_year_start)
            VALUES (1, ?, ?)
            ON DUPLICATE KEY UPDATE
                work_week = VALUES(work_week),
                fiscal_year_start = VALUES(fiscal_year_start)
            "#,
        )
        .bind(encode_work_week(&policy.work_week))
        .bind(policy.fiscal_year_start)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn load_balances(&self, employee_id: u64) -> RepositoryResult<Vec<LeaveBalance>> {
        let rows = sqlx::query_as::<_, LeaveBalance>(
            r#"
            SELECT leave_type, balance, unit
            FROM leave_balances
            WHERE employee_id = ?
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn save_balance(&self, employee_id: u64, balance: &LeaveBalance) -> RepositoryResult<()> {
        sqlx::query(
            r#"
            INSERT INTO leave_balances (employee_id, leave_type, balance, unit)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE balance = VALUES(balance), unit = VALUES(unit)
            "#,
        )
        .bind(employee_id)
        .bind(&balance.leave_type)
        .bind(balance.balance)
        .bind(&balance.unit)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn load_request(&self, id: u64) -> RepositoryResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {REQUEST_COLUMNS} FROM leave_requests WHERE id = ?");
        let row = sqlx::query_as::<_, LeaveRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(LeaveRequest::try_from).transpose()
    }

    async fn load_requests(
        &self,
        filter: &LeaveFilter,
    ) -> RepositoryResult<(Vec<LeaveRequest>, u64)> {
        let (where_sql, args) = Self::where_clause(filter);

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(s.as_str()),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM leave_requests
            {}
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
            where_sql
        );
        let mut data_q = sqlx::query_as::<_, LeaveRequestRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }

        let rows = data_q
            .bind(filter.per_page())
            .bind(filter.offset())
            .fetch_all(&self.pool)
            .await?;

        let requests = rows
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((requests, total.max(0) as u64))
    }

    async fn insert_request(&self, request: NewLeaveRequest) -> RepositoryResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, employee_name, employee_email, leave_type, start_date, end_date, status, reason)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.employee_id)
        .bind(&request.employee_name)
        .bind(&request.employee_email)
        .bind(&request.leave_type)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(LeaveStatus::Pending.as_ref())
        .bind(&request.reason)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        self.load_request(id)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(format!("leave request {id}")))
    }

    async fn save_request(&self, request: &LeaveRequest) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(request.status.as_ref())
        .bind(request.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "leave request {} not found or already processed",
                request.id
            )));
        }
        Ok(())
    }

    async fn commit_approval(
        &self,
        request: &LeaveRequest,
        previous_balance: f64,
        balance: &LeaveBalance,
    ) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT balance
            FROM leave_balances
            WHERE employee_id = ?
            AND leave_type = ?
            FOR UPDATE
            "#,
        )
        .bind(request.employee_id)
        .bind(&balance.leave_type)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(0.0);

        if current != previous_balance {
            return Err(RepositoryError::Conflict(format!(
                "{} balance of employee {} changed during approval",
                balance.leave_type, request.employee_id
            )));
        }

        let updated = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?
            WHERE id = ?
            AND status = 'pending'
            "#,
        )
        .bind(request.status.as_ref())
        .bind(request.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(RepositoryError::Conflict(format!(
                "leave request {} not found or already processed",
                request.id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO leave_balances (employee_id, leave_type, balance, unit)
            VALUES (?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE balance = VALUES(balance)
            "#,
        )
        .bind(request.employee_id)
        .bind(&balance.leave_type)
        .bind(balance.balance)
        .bind(&balance.unit)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_week_round_trips_through_flags() {
        let week = [false, true, true, true, true, true, false];
        assert_eq!(encode_work_week(&week), "0111110");
        assert_eq!(decode_work_week("0111110").expect("valid flags"), week);
    }

    #[test]
    fn malformed_work_week_is_corrupt() {
        assert!(matches!(decode_work_week("011111"), Err(RepositoryError::Corrupt(_))));
        assert!(matches!(decode_work_week("01111100"), Err(RepositoryError::Corrupt(_))));
        assert!(matches!(decode_work_week("01x1110"), Err(RepositoryError::Corrupt(_))));
    }

    #[test]
    fn search_term_escapes_wildcards() {
        assert_eq!(like_pattern("bob"), "%bob%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn where_clause_binds_filters_in_order() {
        let filter = LeaveFilter {
            employee_id: Some(12),
            status: Some(LeaveStatus::Pending),
            from: NaiveDate::from_ymd_opt(2023, 6, 1),
            search: Some(" Annual ".to_string()),
            ..LeaveFilter::default()
        };
        let (sql, args) = MySqlLeaveRepository::where_clause(&filter);

        assert_eq!(
            sql,
            " WHERE 1=1 AND employee_id = ? AND status = ? AND end_date >= ? \
             AND (LOWER(employee_name) LIKE ? OR LOWER(leave_type) LIKE ?)"
        );
        assert_eq!(args.len(), 5);
        assert!(matches!(&args[1], FilterValue::Str(s) if s == "pending"));
        assert!(matches!(&args[4], FilterValue::Str(s) if s == "%annual%"));
    }
}
