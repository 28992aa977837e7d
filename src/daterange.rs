//! Named relative date ranges for the DATE_IN operator.
//!
//! A keyword such as `"last quarter"` or `"last 8-14 days"` is parsed once
//! into a [`DateRange`] and then tested against a date and a reference
//! instant. Keywords are case-insensitive and whitespace-insensitive.
//!
//! Families:
//!
//! - **Calendar units** (year, half year, quarter, month, week, day): both
//!   instants are turned into a unit count since the epoch and the
//!   difference `count(now) - count(date)` must equal a fixed offset.
//! - **Ordinals** (`"2nd quarter last year"`, `"march this year"`,
//!   `"1st month this quarter"`): position inside the enclosing period.
//! - **Rolling windows** (`"last 7 days"`, `"last 6 months"`): inclusive
//!   bounds counted back from `now`.
//! - **To date** (`"quarter to date last year"`): half-open range from the
//!   start of the period up to midnight of `now` shifted back by whole months.

use crate::value::{parse_temporal, LogicalType, Value};
use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime};
use log::debug;

/// Window lengths accepted by `"last N months"`
pub const ROLLING_MONTHS: &[u32] = &[1, 3, 6, 9, 12, 18, 24, 36, 48, 60, 72, 84, 96, 108, 120];

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

const ORDINALS: [(&str, &str); 4] = [
    ("1st", "first"),
    ("2nd", "second"),
    ("3rd", "third"),
    ("4th", "fourth"),
];

/// Calendar granularity used for unit counting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarUnit {
    Year,
    HalfYear,
    Quarter,
    Month,
    /// Weeks start on Sunday
    Week,
    Day,
}

impl CalendarUnit {
    /// Number of whole units between the epoch and `date`
    fn count(&self, date: NaiveDate) -> i64 {
        let year = date.year() as i64;
        let month0 = date.month0() as i64;
        match self {
            CalendarUnit::Year => year,
            CalendarUnit::HalfYear => year * 2 + month0 / 6,
            CalendarUnit::Quarter => year * 4 + month0 / 3,
            CalendarUnit::Month => year * 12 + month0,
            CalendarUnit::Week => {
                let back = date.weekday().num_days_from_sunday() as i64;
                (date.num_days_from_ce() as i64 - back).div_euclid(7)
            }
            CalendarUnit::Day => date.num_days_from_ce() as i64,
        }
    }

    /// Zero-based position of `date` inside its year
    fn index_in_year(&self, date: NaiveDate) -> u32 {
        match self {
            CalendarUnit::HalfYear => date.month0() / 6,
            CalendarUnit::Quarter => date.month0() / 3,
            CalendarUnit::Month => date.month0(),
            _ => 0,
        }
    }
}

/// Period whose start anchors a to-date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodTag {
    Year,
    Quarter,
    Month,
}

impl PeriodTag {
    fn start_of(&self, date: NaiveDate) -> Option<NaiveDate> {
        let month = match self {
            PeriodTag::Year => 1,
            PeriodTag::Quarter => date.month0() / 3 * 3 + 1,
            PeriodTag::Month => date.month(),
        };
        NaiveDate::from_ymd_opt(date.year(), month, 1)
    }
}

/// A parsed relative date-range keyword
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRange {
    /// `count(now) - count(date) == offset`
    Calendar { unit: CalendarUnit, offset: i64 },
    /// Kept apart from `Calendar` so the keyword identity survives; see
    /// DESIGN.md for why it evaluates like "tomorrow".
    Yesterday,
    /// The `index`-th (zero-based) unit of the year `years_back` before now
    OrdinalOfYear {
        unit: CalendarUnit,
        index: u32,
        years_back: i32,
    },
    /// The `index`-th (zero-based) month of the current quarter
    MonthOfQuarter { index: u32 },
    /// Whole days back from today, inclusive on both ends (`from >= to`)
    RollingDays { from: i64, to: i64 },
    /// From `months` months before now up to now, inclusive
    RollingMonths { months: u32 },
    /// `[start of period, midnight of now - months_back)`
    ToDate { period: PeriodTag, months_back: u32 },
}

impl DateRange {
    /// Parse a keyword, `None` if it is not part of the vocabulary
    pub fn parse(keyword: &str) -> Option<Self> {
        let key = keyword
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let calendar = |unit, offset| DateRange::Calendar { unit, offset };
        let range = match key.as_str() {
            "today" => calendar(CalendarUnit::Day, 0),
            "tomorrow" => calendar(CalendarUnit::Day, -1),
            "yesterday" => DateRange::Yesterday,
            "this week" => calendar(CalendarUnit::Week, 0),
            "last week" => calendar(CalendarUnit::Week, 1),
            "this month" => calendar(CalendarUnit::Month, 0),
            "last month" => calendar(CalendarUnit::Month, 1),
            "this quarter" => calendar(CalendarUnit::Quarter, 0),
            "last quarter" => calendar(CalendarUnit::Quarter, 1),
            "this half of year" => calendar(CalendarUnit::HalfYear, 0),
            "last half of year" => calendar(CalendarUnit::HalfYear, 1),
            "this year" => calendar(CalendarUnit::Year, 0),
            "last year" => calendar(CalendarUnit::Year, 1),
            "last 7 days" => DateRange::RollingDays { from: 6, to: 0 },
            "last 8-14 days" => DateRange::RollingDays { from: 13, to: 7 },
            "last 30 days" => DateRange::RollingDays { from: 29, to: 0 },
            "last 31-60 days" => DateRange::RollingDays { from: 59, to: 30 },
            "last 4 weeks" => DateRange::RollingDays { from: 27, to: 0 },
            "last 5-8 weeks" => DateRange::RollingDays { from: 55, to: 28 },
            "year to date" => to_date(PeriodTag::Year, 0),
            "year to date last year" => to_date(PeriodTag::Year, 12),
            "quarter to date" => to_date(PeriodTag::Quarter, 0),
            "quarter to date last year" => to_date(PeriodTag::Quarter, 12),
            "quarter to date last quarter" => to_date(PeriodTag::Quarter, 3),
            "month to date" => to_date(PeriodTag::Month, 0),
            "month to date last year" => to_date(PeriodTag::Month, 12),
            "month to date last month" => to_date(PeriodTag::Month, 1),
            _ => return parse_ordinal(&key).or_else(|| parse_rolling_months(&key)),
        };
        Some(range)
    }

    /// Test whether `date` falls in this range relative to `now`.
    ///
    /// Strings are parsed with the temporal fallback chain; values that are
    /// not dates never match.
    pub fn contains(&self, date: &Value, now: NaiveDateTime) -> bool {
        let parsed;
        let date = match date {
            Value::String(s) => match parse_temporal(s, LogicalType::TimeInstant) {
                Some(v) => {
                    parsed = v;
                    &parsed
                }
                None => return false,
            },
            other => other,
        };

        match date.as_datetime() {
            Some((instant, has_time)) => self.contains_instant(instant, has_time, now),
            None => false,
        }
    }

    /// Test an instant; `has_time` is false for date-only inputs at midnight
    pub fn contains_instant(&self, date: NaiveDateTime, has_time: bool, now: NaiveDateTime) -> bool {
        let day = date.date();
        let today = now.date();

        match *self {
            DateRange::Calendar { unit, offset } => unit.count(today) - unit.count(day) == offset,
            // NOTE: same arithmetic as "tomorrow" (day + 1)
            DateRange::Yesterday => {
                CalendarUnit::Day.count(today) + 1 == CalendarUnit::Day.count(day)
            }
            DateRange::OrdinalOfYear {
                unit,
                index,
                years_back,
            } => day.year() == today.year() - years_back && unit.index_in_year(day) == index,
            DateRange::MonthOfQuarter { index } => {
                CalendarUnit::Quarter.count(today) == CalendarUnit::Quarter.count(day)
                    && day.month0() % 3 == index
            }
            DateRange::RollingDays { from, to } => {
                let (Some(start), Some(end)) = (days_back(today, from), days_back(today, to - 1))
                else {
                    return false;
                };
                if has_time && to == 0 {
                    date >= start && date <= now
                } else {
                    date >= start && date < end
                }
            }
            DateRange::RollingMonths { months } => {
                if has_time {
                    match now.checked_sub_months(Months::new(months)) {
                        Some(start) => date >= start && date <= now,
                        None => false,
                    }
                } else {
                    match today.checked_sub_months(Months::new(months)) {
                        Some(start) => day >= start && day <= today,
                        None => false,
                    }
                }
            }
            DateRange::ToDate {
                period,
                months_back,
            } => {
                let Some(shifted) = today.checked_sub_months(Months::new(months_back)) else {
                    return false;
                };
                let Some(start) = period.start_of(shifted) else {
                    return false;
                };
                date >= start.and_time(NaiveTime::MIN) && date < shifted.and_time(NaiveTime::MIN)
            }
        }
    }

    /// Every keyword this parser accepts, in canonical spelling
    pub fn vocabulary() -> Vec<String> {
        let mut words: Vec<String> = [
            "today",
            "tomorrow",
            "yesterday",
            "this week",
            "last week",
            "this month",
            "last month",
            "this quarter",
            "last quarter",
            "this half of year",
            "last half of year",
            "this year",
            "last year",
            "last 7 days",
            "last 8-14 days",
            "last 30 days",
            "last 31-60 days",
            "last 4 weeks",
            "last 5-8 weeks",
            "year to date",
            "year to date last year",
            "quarter to date",
            "quarter to date last year",
            "quarter to date last quarter",
            "month to date",
            "month to date last year",
            "month to date last month",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        for year in ["this year", "last year"] {
            for (ordinal, _) in ORDINALS {
                words.push(format!("{} quarter {}", ordinal, year));
            }
            for (ordinal, _) in &ORDINALS[..2] {
                words.push(format!("{} half of {}", ordinal, year));
            }
            for month in MONTH_NAMES {
                words.push(format!("{} {}", month, year));
            }
        }
        for (ordinal, _) in &ORDINALS[..3] {
            words.push(format!("{} month this quarter", ordinal));
        }
        for n in ROLLING_MONTHS {
            words.push(format!("last {} months", n));
        }
        words
    }
}

fn to_date(period: PeriodTag, months_back: u32) -> DateRange {
    DateRange::ToDate {
        period,
        months_back,
    }
}

fn days_back(today: NaiveDate, days: i64) -> Option<NaiveDateTime> {
    today
        .checked_sub_signed(Duration::days(days))
        .map(|d| d.and_time(NaiveTime::MIN))
}

fn ordinal_index(word: &str) -> Option<u32> {
    ORDINALS
        .iter()
        .position(|(short, long)| word == *short || word == *long)
        .map(|i| i as u32)
}

fn parse_ordinal(key: &str) -> Option<DateRange> {
    if let Some(head) = key.strip_suffix(" this quarter") {
        let index = ordinal_index(head.strip_suffix(" month")?)?;
        return (index < 3).then_some(DateRange::MonthOfQuarter { index });
    }

    let (head, years_back) = if let Some(head) = key.strip_suffix(" this year") {
        (head, 0)
    } else if let Some(head) = key.strip_suffix(" last year") {
        (head, 1)
    } else {
        return None;
    };

    let (unit, index) = if let Some(word) = head.strip_suffix(" quarter") {
        (CalendarUnit::Quarter, ordinal_index(word)?)
    } else if let Some(word) = head.strip_suffix(" half of") {
        let index = ordinal_index(word)?;
        if index > 1 {
            return None;
        }
        (CalendarUnit::HalfYear, index)
    } else {
        let index = MONTH_NAMES.iter().position(|m| *m == head)?;
        (CalendarUnit::Month, index as u32)
    };

    Some(DateRange::OrdinalOfYear {
        unit,
        index,
        years_back,
    })
}

fn parse_rolling_months(key: &str) -> Option<DateRange> {
    let rest = key.strip_prefix("last ")?;
    let count = rest
        .strip_suffix(" months")
        .or_else(|| rest.strip_suffix(" month"))?;
    let months: u32 = count.parse().ok()?;
    ROLLING_MONTHS
        .contains(&months)
        .then_some(DateRange::RollingMonths { months })
}

/// Test `date` against the named range `keyword` relative to `now`.
///
/// Unknown keywords never match.
pub fn in_range(keyword: &str, date: &Value, now: NaiveDateTime) -> bool {
    match DateRange::parse(keyword) {
        Some(range) => range.contains(date, now),
        None => {
            debug!("Unknown date range '{}'", keyword);
            false
        }
    }
}
