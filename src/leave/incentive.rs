use chrono::NaiveDate;

/// Points for booking leave early. Purely informational.
pub fn score_advance_notice(today: NaiveDate, start: NaiveDate) -> u32 {
    match (start - today).num_days() {
        days if days >= 30 => 100,
        days if days >= 14 => 50,
        days if days >= 7 => 25,
        _ => 10,
    }
}
