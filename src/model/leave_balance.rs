use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const BALANCE_UNIT: &str = "days";

/// Leave type names compare trimmed and case-folded, e.g. "Annual " == "annual".
pub fn leave_type_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveBalance {
    #[serde(rename = "type")]
    #[schema(example = "annual")]
    pub leave_type: String,
    #[schema(example = 12.5)]
    pub balance: f64,
    #[schema(example = "days")]
    pub unit: String,
}

impl LeaveBalance {
    pub fn new(leave_type: impl Into<String>, balance: f64) -> Self {
        Self {
            leave_type: leave_type.into(),
            balance,
            unit: BALANCE_UNIT.to_string(),
        }
    }

    pub fn is_type(&self, name: &str) -> bool {
        leave_type_key(&self.leave_type) == leave_type_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_match_folds_unicode_case() {
        let balance = LeaveBalance::new("Überstunden", 4.0);
        assert!(balance.is_type("überstunden"));
        assert!(balance.is_type(" ÜBERSTUNDEN "));
        assert!(!balance.is_type("annual"));
        assert_eq!(leave_type_key(" Élève "), "élève");
    }
}
