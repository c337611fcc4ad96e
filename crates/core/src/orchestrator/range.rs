//! Default sync date range (§4.8 step 3): generous enough to absorb
//! semester-end events.

use chrono::{Datelike, NaiveDate};

/// `(first of current month, first of next-next month + 31 days)`, i.e.
/// "the rest of this month plus roughly two more".
pub fn default_range(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    // day=1 on the caller's own year/month is always a valid date.
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);

    let (next_year, next_month) = if today.month() == 12 { (today.year() + 1, 1) } else { (today.year(), today.month() + 1) };
    let first_of_next_month = NaiveDate::from_ymd_opt(next_year, next_month, 1).unwrap_or(start);

    let end = first_of_next_month + chrono::Duration::days(31);
    (start, end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_roughly_two_months_past_month_start() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();
        let (start, end) = default_range(today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2026, 5, 2).unwrap());
    }

    #[test]
    fn handles_december_year_rollover() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 10).unwrap();
        let (start, _end) = default_range(today);
        assert_eq!(start, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
    }
}
