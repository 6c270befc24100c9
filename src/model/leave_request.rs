use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    /// Approved and rejected requests never change again.
    pub fn is_terminal(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Bob Brown")]
    pub employee_name: String,
    #[schema(example = "bob.brown@company.com")]
    pub employee_email: String,
    #[serde(rename = "type")]
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = "2023-09-20", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2023-09-25", format = "date", value_type = String)]
    pub end_date: NaiveDate,
    pub status: LeaveStatus,
    #[schema(example = "Family vacation abroad")]
    pub reason: Option<String>,
    #[schema(example = "2023-09-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// True when the request period shares at least one day with `[from, to]`.
    /// Open bounds match everything on that side.
    pub fn overlaps(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> bool {
        from.is_none_or(|from| self.end_date >= from) && to.is_none_or(|to| self.start_date <= to)
    }
}

/// A request as submitted, before the store assigns it an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: u64,
    pub employee_name: String,
    pub employee_email: String,
    pub leave_type: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
}

const DEFAULT_PER_PAGE: u64 = 10;
const MAX_PER_PAGE: u64 = 100;
/// Highest page whose offset still fits in a `u64` at any page size.
const MAX_PAGE: u64 = u64::MAX / MAX_PER_PAGE;

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    /// Filter by employee ID
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    /// Filter by leave status
    #[param(value_type = Option<String>, example = "pending")]
    pub status: Option<LeaveStatus>,
    /// Only requests ending on or after this date
    #[param(value_type = Option<String>, format = "date")]
    #[schema(example = "2023-06-01", format = "date", value_type = Option<String>)]
    pub from: Option<NaiveDate>,
    /// Only requests starting on or before this date
    #[param(value_type = Option<String>, format = "date")]
    #[schema(example = "2023-06-30", format = "date", value_type = Option<String>)]
    pub to: Option<NaiveDate>,
    /// Case-insensitive match on employee name or leave type
    #[schema(example = "brown")]
    pub search: Option<String>,
    /// Pagination page number (start with 1)
    #[schema(example = 1)]
    pub page: Option<u64>,
    /// Pagination per page number
    #[schema(example = 10)]
    pub per_page: Option<u64>,
}

impl LeaveFilter {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn per_page(&self) -> u64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> u64 {
        (self.page() - 1) * self.per_page()
    }

    /// Trimmed, lowercased search term; blank terms are ignored.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, request: &LeaveRequest) -> bool {
        if self.employee_id.is_some_and(|id| id != request.employee_id) {
            return false;
        }
        if self.status.is_some_and(|status| status != request.status) {
            return false;
        }
        if !request.overlaps(self.from, self.to) {
            return false;
        }
        match self.search_term() {
            Some(term) => {
                request.employee_name.to_lowercase().contains(&term)
                    || request.leave_type.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_uses_lowercase_labels() {
        assert_eq!(LeaveStatus::Approved.to_string(), "approved");
        assert_eq!(LeaveStatus::Pending.as_ref(), "pending");
        assert_eq!(
            LeaveStatus::from_str("rejected").expect("known status"),
            LeaveStatus::Rejected
        );
        assert!(LeaveStatus::from_str("cancelled").is_err());
        assert_eq!(
            serde_json::to_value(LeaveStatus::Pending).expect("serializes"),
            serde_json::json!("pending")
        );
    }

    #[test]
    fn only_pending_is_open() {
        assert!(!LeaveStatus::Pending.is_terminal());
        assert!(LeaveStatus::Approved.is_terminal());
        assert!(LeaveStatus::Rejected.is_terminal());
    }

    #[test]
    fn overlap_filter_matches_history_view() {
        let date = |d| NaiveDate::from_ymd_opt(2023, 6, d).expect("valid date");
        let request = LeaveRequest {
            id: 1,
            employee_id: 7,
            employee_name: "John Doe".to_string(),
            employee_email: "john.doe@company.com".to_string(),
            leave_type: "annual".to_string(),
            start_date: date(1),
            end_date: date(5),
            status: LeaveStatus::Approved,
            reason: None,
            created_at: Utc::now(),
        };

        assert!(request.overlaps(None, None));
        assert!(request.overlaps(Some(date(5)), None));
        assert!(request.overlaps(None, Some(date(1))));
        assert!(!request.overlaps(Some(date(6)), None));
        assert!(!request.overlaps(Some(date(10)), Some(date(20))));
    }

    #[test]
    fn pagination_defaults_and_bounds() {
        let filter = LeaveFilter::default();
        assert_eq!((filter.page(), filter.per_page(), filter.offset()), (1, 10, 0));

        let filter = LeaveFilter {
            page: Some(3),
            per_page: Some(500),
            ..LeaveFilter::default()
        };
        assert_eq!((filter.page(), filter.per_page(), filter.offset()), (3, 100, 200));

        let filter = LeaveFilter {
            page: Some(0),
            per_page: Some(0),
            ..LeaveFilter::default()
        };
        assert_eq!((filter.page(), filter.per_page()), (1, 1));

        let filter = LeaveFilter {
            page: Some(u64::MAX),
            per_page: Some(MAX_PER_PAGE),
            ..LeaveFilter::default()
        };
        assert_eq!(filter.page(), MAX_PAGE);
        assert_eq!(filter.offset(), (MAX_PAGE - 1) * MAX_PER_PAGE);
    }

    #[test]
    fn filter_searches_name_and_type() {
        let request = LeaveRequest {
            id: 5,
            employee_id: 3,
            employee_name: "Charlie Davis".to_string(),
            employee_email: "charlie@company.com".to_string(),
            leave_type: "Sick".to_string(),
            start_date: NaiveDate::from_ymd_opt(2023, 10, 15).expect("valid date"),
            end_date: NaiveDate::from_ymd_opt(2023, 10, 16).expect("valid date"),
            status: LeaveStatus::Pending,
            reason: Some("Doctor's appointment".to_string()),
            created_at: Utc::now(),
        };

        let by = |search: &str| LeaveFilter {
            search: Some(search.to_string()),
            ..LeaveFilter::default()
        };
        assert!(by("davis").matches(&request));
        assert!(by("SICK").matches(&request));
        assert!(by("   ").matches(&request));
        assert!(!by("annual").matches(&request));

        let wrong_status = LeaveFilter {
            status: Some(LeaveStatus::Approved),
            ..LeaveFilter::default()
        };
        assert!(!wrong_status.matches(&request));

        let other_employee = LeaveFilter {
            employee_id: Some(4),
            ..LeaveFilter::default()
        };
        assert!(!other_employee.matches(&request));
    }
}
