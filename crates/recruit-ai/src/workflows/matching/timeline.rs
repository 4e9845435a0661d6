use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::InputDataError;

const DAYS_PER_YEAR: f64 = 365.25;
const ONGOING_MARKERS: [&str; 4] = ["present", "current", "now", "ongoing"];

/// Resolved date range of a single role; `end == None` marks the ongoing role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceSpan {
    pub start: NaiveDate,
    pub end: Option<NaiveDate>,
}

impl ExperienceSpan {
    pub fn parse(start: &str, end: Option<&str>) -> Result<Self, InputDataError> {
        let start = parse_experience_date(start).ok_or_else(|| InputDataError::UnparseableDate {
            field: "start",
            value: start.to_string(),
        })?;

        let end = match end.map(str::trim) {
            None => None,
            Some(raw) if raw.is_empty() || is_ongoing_marker(raw) => None,
            Some(raw) => Some(parse_experience_date(raw).ok_or_else(|| {
                InputDataError::UnparseableDate {
                    field: "end",
                    value: raw.to_string(),
                }
            })?),
        };

        if let Some(end) = end {
            if end < start {
                return Err(InputDataError::EndBeforeStart { start, end });
            }
        }

        Ok(Self { start, end })
    }

    pub fn is_ongoing(&self) -> bool {
        self.end.is_none()
    }

    pub fn end_or(&self, as_of: NaiveDate) -> NaiveDate {
        self.end.unwrap_or(as_of).max(self.start)
    }

    pub fn months(&self, as_of: NaiveDate) -> i64 {
        months_between(self.start, self.end_or(as_of))
    }
}

fn is_ongoing_marker(raw: &str) -> bool {
    ONGOING_MARKERS
        .iter()
        .any(|marker| raw.eq_ignore_ascii_case(marker))
}

/// Accepts `YYYY-MM-DD`, `YYYY-MM`, `MM/YYYY`, `Mon YYYY`, and bare `YYYY`.
pub fn parse_experience_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(&format!("{trimmed}-01"), "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(&format!("01/{trimmed}"), "%d/%m/%Y") {
        return Some(date);
    }

    if let Ok(date) = NaiveDate::parse_from_str(&format!("1 {trimmed}"), "%d %b %Y") {
        return Some(date);
    }

    if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
        let year = trimmed.parse::<i32>().ok()?;
        return NaiveDate::from_ymd_opt(year, 1, 1);
    }

    None
}

/// Whole calendar months from `start` to `end`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    let mut months = i64::from(end.year() - start.year()) * 12 + i64::from(end.month())
        - i64::from(start.month());
    if end.day() < start.day() {
        months -= 1;
    }
    months
}

/// Total years covered by `spans` once overlapping ranges are merged.
pub fn merged_years(spans: &[ExperienceSpan], as_of: NaiveDate) -> f64 {
    let mut ranges: Vec<(NaiveDate, NaiveDate)> = spans
        .iter()
        .map(|span| (span.start, span.end_or(as_of)))
        .collect();
    ranges.sort();

    let mut total_days: i64 = 0;
    let mut current: Option<(NaiveDate, NaiveDate)> = None;

    for (start, end) in ranges {
        current = match current {
            Some((open_start, open_end)) if start <= open_end => {
                Some((open_start, open_end.max(end)))
            }
            Some((open_start, open_end)) => {
                total_days += (open_end - open_start).num_days();
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }

    if let Some((open_start, open_end)) = current {
        total_days += (open_end - open_start).num_days();
    }

    total_days as f64 / DAYS_PER_YEAR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn parses_supported_formats() {
        assert_eq!(parse_experience_date("2021-03-15"), Some(date(2021, 3, 15)));
        assert_eq!(parse_experience_date("2021-03"), Some(date(2021, 3, 1)));
        assert_eq!(parse_experience_date("03/2021"), Some(date(2021, 3, 1)));
        assert_eq!(parse_experience_date("Mar 2021"), Some(date(2021, 3, 1)));
        assert_eq!(parse_experience_date("2021"), Some(date(2021, 1, 1)));
        assert_eq!(parse_experience_date("sometime in 2021"), None);
    }

    #[test]
    fn ongoing_markers_leave_end_open() {
        let span = ExperienceSpan::parse("2020-01", Some("Present")).expect("parses");
        assert!(span.is_ongoing());
        let span = ExperienceSpan::parse("2020-01", None).expect("parses");
        assert!(span.is_ongoing());
    }

    #[test]
    fn rejects_end_before_start() {
        let err = ExperienceSpan::parse("2022-01", Some("2021-01")).expect_err("inverted");
        assert!(matches!(err, InputDataError::EndBeforeStart { .. }));
    }

    #[test]
    fn months_between_counts_whole_months() {
        assert_eq!(months_between(date(2020, 1, 1), date(2020, 5, 1)), 4);
        assert_eq!(months_between(date(2020, 1, 15), date(2020, 5, 14)), 3);
        assert_eq!(months_between(date(2019, 11, 1), date(2021, 2, 1)), 15);
    }

    #[test]
    fn merged_years_does_not_double_count_overlap() {
        let spans = [
            ExperienceSpan {
                start: date(2018, 1, 1),
                end: Some(date(2020, 1, 1)),
            },
            ExperienceSpan {
                start: date(2019, 1, 1),
                end: Some(date(2021, 1, 1)),
            },
        ];
        let years = merged_years(&spans, date(2024, 1, 1));
        assert!((years - 3.0).abs() < 0.01, "expected ~3 years, got {years}");
    }

    #[test]
    fn merged_years_runs_ongoing_roles_to_as_of() {
        let spans = [ExperienceSpan {
            start: date(2020, 1, 1),
            end: None,
        }];
        let years = merged_years(&spans, date(2022, 1, 1));
        assert!((years - 2.0).abs() < 0.01);
    }
}
