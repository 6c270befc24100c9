use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::leave_type_key;
use crate::leave::LeaveError;

/// Accrual settings for one leave type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LeaveTypePolicy {
    #[serde(rename = "type")]
    #[schema(example = "annual")]
    pub leave_type: String,
    /// Days granted per month
    #[schema(example = 1.67)]
    pub accrual_rate: f64,
    #[schema(example = 20.0)]
    pub max_accrual: f64,
    /// Unused days allowed to roll into the next fiscal year
    #[schema(example = 5.0)]
    pub carry_over: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Holiday {
    #[schema(example = "2023-12-25", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Christmas Day")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "leave_types": [
        { "type": "annual", "accrual_rate": 1.67, "max_accrual": 20.0, "carry_over": 5.0 },
        { "type": "sick", "accrual_rate": 0.83, "max_accrual": 10.0, "carry_over": 0.0 }
    ],
    "holidays": [
        { "date": "2023-01-01", "name": "New Year's Day" },
        { "date": "2023-12-25", "name": "Christmas Day" }
    ],
    "work_week": [false, true, true, true, true, true, false],
    "fiscal_year_start": "2023-01-01"
}))]
pub struct LeavePolicy {
    pub leave_types: Vec<LeaveTypePolicy>,
    pub holidays: Vec<Holiday>,
    /// Sunday first
    #[schema(value_type = Vec<bool>)]
    pub work_week: [bool; 7],
    #[schema(format = "date", value_type = String)]
    pub fiscal_year_start: NaiveDate,
}

impl Default for LeavePolicy {
    fn default() -> Self {
        Self {
            leave_types: vec![
                LeaveTypePolicy {
                    leave_type: "annual".to_string(),
                    accrual_rate: 1.67,
                    max_accrual: 20.0,
                    carry_over: 5.0,
                },
                LeaveTypePolicy {
                    leave_type: "sick".to_string(),
                    accrual_rate: 0.83,
                    max_accrual: 10.0,
                    carry_over: 0.0,
                },
            ],
            holidays: vec![
                Holiday {
                    date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
                    name: "New Year's Day".to_string(),
                },
                Holiday {
                    date: NaiveDate::from_ymd_opt(2023, 12, 25).unwrap_or_default(),
                    name: "Christmas Day".to_string(),
                },
            ],
            work_week: [false, true, true, true, true, true, false],
            fiscal_year_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
        }
    }
}

impl LeavePolicy {
    /// Case-insensitive lookup of a leave type entry.
    pub fn leave_type(&self, name: &str) -> Option<&LeaveTypePolicy> {
        let key = leave_type_key(name);
        self.leave_types
            .iter()
            .find(|entry| leave_type_key(&entry.leave_type) == key)
    }

    pub fn is_work_day(&self, date: NaiveDate) -> bool {
        self.work_week[date.weekday().num_days_from_sunday() as usize]
    }

    pub fn validate(&self) -> Result<(), LeaveError> {
        if self.leave_types.is_empty() {
            return Err(LeaveError::Validation(
                "policy must define at least one leave type".to_string(),
            ));
        }

        for (index, entry) in self.leave_types.iter().enumerate() {
            let name = entry.leave_type.trim();
            if name.is_empty() {
                return Err(LeaveError::Validation(format!(
                    "leave type #{} has no name",
                    index + 1
                )));
            }

            for (field, value) in [
                ("accrual_rate", entry.accrual_rate),
                ("max_accrual", entry.max_accrual),
                ("carry_over", entry.carry_over),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(LeaveError::Validation(format!(
                        "{field} for leave type '{name}' must be a non-negative number"
                    )));
                }
            }

            let duplicate = self.leave_types[..index]
                .iter()
                .any(|other| leave_type_key(&other.leave_type) == leave_type_key(name));
            if duplicate {
                return Err(LeaveError::Validation(format!(
                    "leave type '{name}' is defined more than once"
                )));
            }
        }

        if let Some(holiday) = self.holidays.iter().find(|h| h.name.trim().is_empty()) {
            return Err(LeaveError::Validation(format!(
                "holiday on {} requires a name",
                holiday.date
            )));
        }

        Ok(())
    }
}
