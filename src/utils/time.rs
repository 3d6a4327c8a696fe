use crate::error::{parse_error, ReportResult};
use chrono::{DateTime, Days, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

/// Date format accepted on the command line and in prompts
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date as seen in the given timezone
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}

/// Parse date string in YYYY-MM-DD format
pub fn parse_date(date_str: &str) -> ReportResult<NaiveDate> {
    NaiveDate::parse_from_str(date_str.trim(), DATE_FORMAT).map_err(|_| {
        parse_error(&format!(
            "Invalid date '{}'. Expected YYYY-MM-DD",
            date_str.trim()
        ))
    })
}

/// Parse prompt input, where blank means `today`
pub fn parse_date_input(input: &str, today: NaiveDate) -> ReportResult<NaiveDate> {
    if input.trim().is_empty() {
        Ok(today)
    } else {
        parse_date(input)
    }
}

/// First instant of `date` in `tz`.
///
/// Usually midnight. When a DST change skips midnight (America/Santiago,
/// Asia/Beirut) the day starts at the first local time after the gap.
pub fn local_midnight(date: NaiveDate, tz: Tz) -> ReportResult<DateTime<Tz>> {
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| parse_error("Failed to create datetime"))?;
    match tz.from_local_datetime(&midnight) {
        chrono::LocalResult::Single(dt) => Ok(dt),
        // Midnight repeated by a DST change: the day starts at the first one
        chrono::LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        chrono::LocalResult::None => (1..=24 * 60)
            .map(|minutes| midnight + Duration::minutes(minutes))
            .take_while(|local| local.date() == date)
            .find_map(|local| tz.from_local_datetime(&local).earliest())
            .ok_or_else(|| parse_error(&format!("No local time exists on {} in {}", date, tz))),
    }
}

/// An inclusive range of calendar days in a fixed timezone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    /// Last day included in the report
    pub end: NaiveDate,
    pub timezone: Tz,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate, timezone: Tz) -> ReportResult<Self> {
        if end < start {
            return Err(parse_error(&format!(
                "End date {} is before start date {}",
                end, start
            )));
        }
        Ok(Self {
            start,
            end,
            timezone,
        })
    }

    /// Inclusive lower bound for the event query
    pub fn time_min(&self) -> ReportResult<DateTime<Tz>> {
        local_midnight(self.start, self.timezone)
    }

    /// Exclusive upper bound for the event query.
    ///
    /// The events API treats `timeMax` as exclusive, so this is midnight of
    /// the day after `end`.
    pub fn time_max(&self) -> ReportResult<DateTime<Tz>> {
        let day_after = self
            .end
            .checked_add_days(Days::new(1))
            .ok_or_else(|| parse_error(&format!("Date out of range: {}", self.end)))?;
        local_midnight(day_after, self.timezone)
    }

    /// Report title, e.g. `2024-01-01 to 2024-01-07`
    pub fn title(&self) -> String {
        format!(
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Shanghai;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-01-01").unwrap(), date(2024, 1, 1));
        assert_eq!(parse_date(" 2024-02-29 ").unwrap(), date(2024, 2, 29));

        assert!(parse_date("2023-02-29").is_err()); // Not a leap year
        assert!(parse_date("2024/01/01").is_err());
        assert!(parse_date("tomorrow").is_err());
        assert!(matches!(
            parse_date("01-01-2024"),
            Err(crate::error::Error::Parse(_))
        ));
    }

    #[test]
    fn test_blank_input_means_today() {
        let today = date(2024, 5, 17);
        assert_eq!(parse_date_input("", today).unwrap(), today);
        assert_eq!(parse_date_input("   ", today).unwrap(), today);
        assert_eq!(
            parse_date_input("2024-05-01", today).unwrap(),
            date(2024, 5, 1)
        );
        assert!(parse_date_input("garbage", today).is_err());
    }

    #[test]
    fn test_single_day_range_is_inclusive() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 1), Shanghai).unwrap();

        assert_eq!(
            range.time_min().unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+08:00"
        );
        assert_eq!(
            range.time_max().unwrap().to_rfc3339(),
            "2024-01-02T00:00:00+08:00"
        );
    }

    #[test]
    fn test_range_crosses_month_end() {
        let range = DateRange::new(date(2024, 1, 25), date(2024, 1, 31), Shanghai).unwrap();
        assert_eq!(
            range.time_max().unwrap().to_rfc3339(),
            "2024-02-01T00:00:00+08:00"
        );
        assert_eq!(range.title(), "2024-01-25 to 2024-01-31");
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        assert!(DateRange::new(date(2024, 1, 2), date(2024, 1, 1), Shanghai).is_err());
    }

    #[test]
    fn test_midnight_in_dst_timezone() {
        // New York switches to EDT on 2024-03-10 at 02:00, midnight still exists
        let dt = local_midnight(date(2024, 3, 10), chrono_tz::America::New_York).unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-10T00:00:00-05:00");
    }

    #[test]
    fn test_day_starts_after_dst_gap_at_midnight() {
        // Santiago jumps from 00:00 to 01:00 on 2024-09-08
        let tz = chrono_tz::America::Santiago;

        let range = DateRange::new(date(2024, 9, 8), date(2024, 9, 8), tz).unwrap();
        assert_eq!(
            range.time_min().unwrap().to_rfc3339(),
            "2024-09-08T01:00:00-03:00"
        );

        let day_before = DateRange::new(date(2024, 9, 7), date(2024, 9, 7), tz).unwrap();
        let time_max = day_before.time_max().unwrap();
        assert_eq!(time_max.to_rfc3339(), "2024-09-08T01:00:00-03:00");
        assert_eq!(
            time_max - day_before.time_min().unwrap(),
            Duration::hours(24)
        );
    }
}
