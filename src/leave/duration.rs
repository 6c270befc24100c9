use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::model::LeavePolicy;

/// Chargeable leave days in `[start, end]`: work days per the policy's work
/// week, minus the distinct holidays that land on one of those work days.
///
/// A reversed range yields 0; callers reject it before getting here.
pub fn calculate_leave_duration(policy: &LeavePolicy, start: NaiveDate, end: NaiveDate) -> u32 {
    if end < start {
        return 0;
    }

    let business_days = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| policy.is_work_day(*day))
        .count();

    let holidays: BTreeSet<NaiveDate> = policy
        .holidays
        .iter()
        .map(|holiday| holiday.date)
        .filter(|date| (start..=end).contains(date) && policy.is_work_day(*date))
        .collect();

    business_days.saturating_sub(holidays.len()) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Holiday;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn policy_with_holiday(holiday: NaiveDate, work_week: [bool; 7]) -> LeavePolicy {
        LeavePolicy {
            holidays: vec![Holiday {
                date: holiday,
                name: "holiday".to_string(),
            }],
            work_week,
            ..LeavePolicy::default()
        }
    }

    const MON_FRI: [bool; 7] = [false, true, true, true, true, true, false];
    const EVERY_DAY: [bool; 7] = [true; 7];

    #[test]
    fn thursday_to_monday_skips_weekend_and_holiday() {
        // Thu 1st, Fri 2nd (holiday), Sat, Sun, Mon 5th
        let policy = policy_with_holiday(date(2023, 6, 2), MON_FRI);
        assert_eq!(
            calculate_leave_duration(&policy, date(2023, 6, 1), date(2023, 6, 5)),
            2
        );
    }

    #[test]
    fn seven_day_work_week_counts_every_calendar_day() {
        let policy = policy_with_holiday(date(2023, 6, 2), EVERY_DAY);
        assert_eq!(
            calculate_leave_duration(&policy, date(2023, 6, 1), date(2023, 6, 5)),
            4
        );
    }

    #[test]
    fn single_day_is_one_only_on_an_ordinary_work_day() {
        let policy = policy_with_holiday(date(2023, 6, 2), MON_FRI);
        assert_eq!(calculate_leave_duration(&policy, date(2023, 6, 1), date(2023, 6, 1)), 1);
        assert_eq!(calculate_leave_duration(&policy, date(2023, 6, 2), date(2023, 6, 2)), 0);
        assert_eq!(calculate_leave_duration(&policy, date(2023, 6, 3), date(2023, 6, 3)), 0);
    }

    #[test]
    fn weekend_holiday_is_not_charged_twice() {
        // Saturday holiday inside a Mon..Mon range
        let policy = policy_with_holiday(date(2023, 6, 10), MON_FRI);
        assert_eq!(
            calculate_leave_duration(&policy, date(2023, 6, 5), date(2023, 6, 12)),
            6
        );
    }

    #[test]
    fn duplicate_holiday_entries_count_once() {
        let mut policy = policy_with_holiday(date(2023, 6, 2), MON_FRI);
        policy.holidays.push(Holiday {
            date: date(2023, 6, 2),
            name: "duplicate".to_string(),
        });
        assert_eq!(
            calculate_leave_duration(&policy, date(2023, 6, 1), date(2023, 6, 2)),
            1
        );
    }

    #[test]
    fn reversed_range_is_zero() {
        let policy = LeavePolicy::default();
        assert_eq!(calculate_leave_duration(&policy, date(2023, 6, 5), date(2023, 6, 1)), 0);
    }

    #[test]
    fn empty_work_week_charges_nothing() {
        let policy = policy_with_holiday(date(2023, 6, 2), [false; 7]);
        assert_eq!(
            calculate_leave_duration(&policy, date(2023, 6, 1), date(2023, 6, 30)),
            0
        );
    }

    #[test]
    fn duration_never_decreases_as_the_end_moves_out() {
        let mut policy = policy_with_holiday(date(2023, 12, 25), MON_FRI);
        policy.holidays.push(Holiday {
            date: date(2023, 12, 30),
            name: "weekend holiday".to_string(),
        });
        policy.holidays.push(Holiday {
            date: date(2024, 1, 1),
            name: "New Year's Day".to_string(),
        });

        let start = date(2023, 12, 18);
        let mut previous = 0;
        for end in start.iter_days().take(40) {
            let current = calculate_leave_duration(&policy, start, end);
            assert!(
                current >= previous,
                "duration dropped from {previous} to {current} at {end}"
            );
            previous = current;
        }
    }
}
