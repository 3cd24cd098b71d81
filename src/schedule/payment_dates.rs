use chrono::{Datelike, Months, NaiveDate};

/// Every date in `[start_date, start_date + duration_years)` whose day-of-month
/// is one of `payment_days`, ascending.
///
/// Days that do not exist in a month (31 in April, 30 in February) are skipped
/// for that month; they are never moved to a neighbouring day.
pub fn enumerate_payment_dates(
    start_date: NaiveDate,
    duration_years: u32,
    payment_days: &[u32],
) -> Vec<NaiveDate> {
    let mut days: Vec<u32> = payment_days.to_vec();
    days.sort_unstable();
    days.dedup();

    let Some(end_date) = plan_end_date(start_date, duration_years) else {
        return Vec::new();
    };

    let mut dates = Vec::new();
    let mut month = month_start(start_date);

    while month < end_date {
        for &day in &days {
            let Some(date) = NaiveDate::from_ymd_opt(month.year(), month.month(), day) else {
                continue;
            };
            if date >= start_date && date < end_date {
                dates.push(date);
            }
        }

        month = match month.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    dates
}

/// First date after the plan, exclusive.
pub fn plan_end_date(start_date: NaiveDate, duration_years: u32) -> Option<NaiveDate> {
    let months = duration_years.checked_mul(12)?;
    start_date.checked_add_months(Months::new(months))
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_skips_days_missing_from_short_months() {
        let dates = enumerate_payment_dates(d(2024, 1, 15), 1, &[1, 31]);

        assert!(dates.contains(&d(2024, 2, 1)));
        assert!(!dates.contains(&d(2024, 2, 29)));
        assert!(!dates.contains(&d(2024, 3, 2)));
        assert!(dates.iter().all(|date| date.day() == 1 || date.day() == 31));
    }

    #[test]
    fn test_full_year_of_first_and_last() {
        let dates = enumerate_payment_dates(d(2024, 1, 15), 1, &[1, 31]);

        // 31st exists in Jan, Mar, May, Jul, Aug, Oct, Dec of 2024.
        let expected = vec![
            d(2024, 1, 31),
            d(2024, 2, 1),
            d(2024, 3, 1),
            d(2024, 3, 31),
            d(2024, 4, 1),
            d(2024, 5, 1),
            d(2024, 5, 31),
            d(2024, 6, 1),
            d(2024, 7, 1),
            d(2024, 7, 31),
            d(2024, 8, 1),
            d(2024, 8, 31),
            d(2024, 9, 1),
            d(2024, 10, 1),
            d(2024, 10, 31),
            d(2024, 11, 1),
            d(2024, 12, 1),
            d(2024, 12, 31),
            d(2025, 1, 1),
        ];
        assert_eq!(dates, expected);
    }

    #[test]
    fn test_range_is_start_inclusive_end_exclusive() {
        let start = d(2023, 6, 10);
        let dates = enumerate_payment_dates(start, 2, &[10, 20]);

        assert_eq!(dates.first(), Some(&d(2023, 6, 10)));
        assert_eq!(dates.last(), Some(&d(2025, 5, 20)));
        assert!(!dates.contains(&d(2025, 6, 10)));
        assert_eq!(dates.len(), 48);
        assert!(dates.iter().all(|date| *date >= start && *date < d(2025, 6, 10)));
    }

    #[test]
    fn test_output_is_ascending_and_unique_for_unsorted_input() {
        let dates = enumerate_payment_dates(d(2024, 1, 1), 1, &[25, 5, 15, 5]);

        assert_eq!(dates.len(), 36);
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_leap_day_only_in_leap_years() {
        let dates = enumerate_payment_dates(d(2023, 1, 1), 2, &[29]);

        assert!(!dates.contains(&d(2023, 3, 1)));
        assert!(dates.contains(&d(2024, 2, 29)));
        assert_eq!(dates.len(), 23);
    }

    #[test]
    fn test_out_of_range_days_never_emit() {
        let dates = enumerate_payment_dates(d(2024, 1, 1), 1, &[0, 32]);
        assert!(dates.is_empty());
    }

    #[test]
    fn test_empty_days_yield_nothing() {
        assert!(enumerate_payment_dates(d(2024, 1, 1), 5, &[]).is_empty());
    }

    #[test]
    fn test_plan_end_date_from_leap_day() {
        assert_eq!(plan_end_date(d(2024, 2, 29), 1), Some(d(2025, 2, 28)));
        assert_eq!(plan_end_date(d(2024, 1, 15), 3), Some(d(2027, 1, 15)));
    }
}
