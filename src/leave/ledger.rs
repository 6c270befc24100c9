//! Balance arithmetic over one employee's stored balances.
//!
//! Every function here is pure: it reads the policy and the balances loaded
//! from the store and returns the rows to write back. Locking and persistence
//! live in [`super::service`].

use crate::leave::LeaveError;
use crate::model::{LeaveBalance, LeavePolicy, LeaveTypePolicy};

/// Balances are kept to hundredths of a day so repeated fractional accruals
/// don't drift.
fn round_days(days: f64) -> f64 {
    (days * 100.0).round() / 100.0
}

fn policy_entry<'a>(
    policy: &'a LeavePolicy,
    leave_type: &str,
) -> Result<&'a LeaveTypePolicy, LeaveError> {
    policy
        .leave_type(leave_type)
        .ok_or_else(|| LeaveError::UnknownLeaveType(leave_type.trim().to_string()))
}

fn stored_amount(stored: &[LeaveBalance], leave_type: &str) -> f64 {
    stored
        .iter()
        .find(|row| row.is_type(leave_type))
        .map(|row| row.balance)
        .unwrap_or(0.0)
}

/// Current balance for one leave type. A type the policy knows but the
/// employee has no row for reads as zero.
pub fn balance_of(
    policy: &LeavePolicy,
    stored: &[LeaveBalance],
    leave_type: &str,
) -> Result<f64, LeaveError> {
    let entry = policy_entry(policy, leave_type)?;
    Ok(stored_amount(stored, &entry.leave_type))
}

/// One balance per policy leave type, in policy order.
pub fn balances_for(policy: &LeavePolicy, stored: &[LeaveBalance]) -> Vec<LeaveBalance> {
    policy
        .leave_types
        .iter()
        .map(|entry| {
            LeaveBalance::new(
                entry.leave_type.clone(),
                stored_amount(stored, &entry.leave_type),
            )
        })
        .collect()
}

/// Apply `delta` days to a balance, refusing to go below zero.
pub fn apply_delta(
    policy: &LeavePolicy,
    stored: &[LeaveBalance],
    leave_type: &str,
    delta: f64,
) -> Result<LeaveBalance, LeaveError> {
    if !delta.is_finite() {
        return Err(LeaveError::Validation(
            "balance adjustment must be a finite number".to_string(),
        ));
    }

    let entry = policy_entry(policy, leave_type)?;
    let current = stored_amount(stored, &entry.leave_type);
    let updated = round_days(current + delta);

    if !updated.is_finite() {
        return Err(LeaveError::Validation(format!(
            "balance adjustment of {delta} is out of range"
        )));
    }
    if updated < 0.0 {
        return Err(LeaveError::NegativeBalance {
            leave_type: entry.leave_type.clone(),
            current,
            delta,
        });
    }

    Ok(LeaveBalance::new(entry.leave_type.clone(), updated))
}

/// Charge `days` against a balance for an approval.
pub fn debit(
    policy: &LeavePolicy,
    stored: &[LeaveBalance],
    leave_type: &str,
    days: u32,
) -> Result<LeaveBalance, LeaveError> {
    let entry = policy_entry(policy, leave_type)?;
    let available = stored_amount(stored, &entry.leave_type);
    let requested = f64::from(days);

    if available < requested {
        return Err(LeaveError::InsufficientBalance {
            leave_type: entry.leave_type.clone(),
            requested,
            available,
            shortfall: round_days(requested - available),
        });
    }

    apply_delta(policy, stored, &entry.leave_type, -requested)
}

/// One month of accrual for every leave type, capped at `max_accrual`.
/// Balances already above the cap (e.g. after a manual grant) stay as they are.
pub fn accrue_month(policy: &LeavePolicy, stored: &[LeaveBalance]) -> Vec<LeaveBalance> {
    policy
        .leave_types
        .iter()
        .map(|entry| {
            let current = stored_amount(stored, &entry.leave_type);
            let next = if current >= entry.max_accrual {
                current
            } else {
                round_days((current + entry.accrual_rate).min(entry.max_accrual))
            };
            LeaveBalance::new(entry.leave_type.clone(), next)
        })
        .collect()
}

/// Fiscal year roll-over: unused days beyond `carry_over` are forfeited.
pub fn close_fiscal_year(policy: &LeavePolicy, stored: &[LeaveBalance]) -> Vec<LeaveBalance> {
    policy
        .leave_types
        .iter()
        .map(|entry| {
            let current = stored_amount(stored, &entry.leave_type);
            LeaveBalance::new(entry.leave_type.clone(), current.min(entry.carry_over))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored() -> Vec<LeaveBalance> {
        vec![LeaveBalance::new("Annual", 3.0), LeaveBalance::new("sick", 9.5)]
    }

    #[test]
    fn reads_balance_case_insensitively() {
        let policy = LeavePolicy::default();
        assert_eq!(balance_of(&policy, &stored(), "annual").expect("known"), 3.0);
        assert_eq!(balance_of(&policy, &stored(), "SICK").expect("known"), 9.5);
    }

    #[test]
    fn missing_row_reads_as_zero_but_unknown_type_fails() {
        let policy = LeavePolicy::default();
        assert_eq!(balance_of(&policy, &[], "annual").expect("known"), 0.0);
        assert!(matches!(
            balance_of(&policy, &stored(), "sabbatical"),
            Err(LeaveError::UnknownLeaveType(t)) if t == "sabbatical"
        ));
    }

    #[test]
    fn balances_follow_policy_order() {
        let policy = LeavePolicy::default();
        let all = balances_for(&policy, &[LeaveBalance::new("sick", 2.0)]);
        assert_eq!(
            all,
            vec![LeaveBalance::new("annual", 0.0), LeaveBalance::new("sick", 2.0)]
        );
        assert!(all.iter().all(|b| b.unit == "days"));
    }

    #[test]
    fn adjustment_cannot_go_negative() {
        let policy = LeavePolicy::default();
        let updated = apply_delta(&policy, &stored(), "annual", -2.5).expect("within balance");
        assert_eq!(updated.balance, 0.5);
        assert_eq!(updated.leave_type, "annual");

        assert!(matches!(
            apply_delta(&policy, &stored(), "annual", -3.5),
            Err(LeaveError::NegativeBalance { current, .. }) if current == 3.0
        ));
        assert!(matches!(
            apply_delta(&policy, &stored(), "annual", f64::NAN),
            Err(LeaveError::Validation(_))
        ));
    }

    #[test]
    fn oversized_adjustment_is_rejected() {
        let policy = LeavePolicy::default();
        assert!(matches!(
            apply_delta(&policy, &stored(), "annual", 1e307),
            Err(LeaveError::Validation(msg)) if msg.contains("out of range")
        ));
        assert!(matches!(
            apply_delta(&policy, &stored(), "annual", f64::MAX),
            Err(LeaveError::Validation(_))
        ));
    }

    #[test]
    fn debit_reports_shortfall() {
        let policy = LeavePolicy::default();
        match debit(&policy, &stored(), "annual", 4) {
            Err(LeaveError::InsufficientBalance {
                requested,
                available,
                shortfall,
                ..
            }) => {
                assert_eq!(requested, 4.0);
                assert_eq!(available, 3.0);
                assert_eq!(shortfall, 1.0);
            }
            other => panic!("expected insufficient balance, got {other:?}"),
        }

        let exact = debit(&policy, &stored(), "annual", 3).expect("exact balance is enough");
        assert_eq!(exact.balance, 0.0);
    }

    #[test]
    fn accrual_is_capped() {
        let policy = LeavePolicy::default();
        let accrued = accrue_month(&policy, &stored());
        assert_eq!(accrued[0].balance, 4.67);
        // sick caps at 10
        assert_eq!(accrued[1].balance, 10.0);

        let above_cap = accrue_month(&policy, &[LeaveBalance::new("annual", 25.0)]);
        assert_eq!(above_cap[0].balance, 25.0);
    }

    #[test]
    fn twelve_accruals_stay_on_hundredths() {
        let policy = LeavePolicy::default();
        let mut balances = Vec::new();
        for _ in 0..12 {
            balances = accrue_month(&policy, &balances);
        }
        assert_eq!(balances[0].balance, 20.0);
        assert_eq!(balances[1].balance, 9.96);
    }

    #[test]
    fn year_end_keeps_only_carry_over() {
        let policy = LeavePolicy::default();
        let closed = close_fiscal_year(&policy, &[LeaveBalance::new("annual", 12.0)]);
        assert_eq!(
            closed,
            vec![LeaveBalance::new("annual", 5.0), LeaveBalance::new("sick", 0.0)]
        );
    }
}
