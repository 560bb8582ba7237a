//! Natural-language date resolution.
//!
//! Every "today" in the engine comes from one [`DateResolver`] bound to the
//! configured timezone. The classifier, the ingestion loop and summary
//! rendering share it so that date bucketing agrees across components.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use std::sync::LazyLock;

use crate::domain::errors::{DomainError, DomainResult};

static DAYS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+days?\s+ago").expect("static regex"));
static WEEKS_AGO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s+weeks?\s+ago").expect("static regex"));
static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("static regex"));
static US_SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2})/(\d{1,2})/(\d{4})").expect("static regex"));
static YMD_SLASH_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})/(\d{1,2})/(\d{1,2})").expect("static regex"));
static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec)\s+(\d{1,2})\b",
    )
    .expect("static regex")
});

/// Resolves natural-language dates against a single configured timezone.
#[derive(Debug, Clone)]
pub struct DateResolver {
    tz: Tz,
    fixed_today: Option<NaiveDate>,
}

impl DateResolver {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            fixed_today: None,
        }
    }

    /// Build from an IANA timezone name such as `America/Los_Angeles`.
    pub fn from_name(name: &str) -> DomainResult<Self> {
        let tz: Tz = name
            .parse()
            .map_err(|_| DomainError::ValidationFailed(format!("Unknown timezone: {name}")))?;
        Ok(Self::new(tz))
    }

    /// Pin "today" to a fixed date.
    pub fn with_fixed_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Utc::now().with_timezone(&self.tz).date_naive())
    }

    /// Local calendar date of an instant in the configured timezone.
    pub fn local_date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    pub fn resolve(&self, text: &str) -> Option<NaiveDate> {
        resolve_relative_to(text, self.today())
    }

    pub fn resolve_or_today(&self, text: &str) -> NaiveDate {
        self.resolve(text).unwrap_or_else(|| self.today())
    }
}

/// Resolve a date mentioned in `text`, relative to `today`.
///
/// Recognized forms, first match wins: `yesterday`/`today`/`tomorrow`,
/// `N days ago`/`N weeks ago`, `last week` (7 days back) / `last month`
/// (30 days back), `YYYY-MM-DD`, `MM/DD/YYYY`, `YYYY/MM/DD`, and
/// `<Month> <Day>` (previous year when the date is still ahead).
/// A syntactically matching but impossible date is skipped.
pub fn resolve_relative_to(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    if lower.contains("yesterday") {
        return today.checked_sub_days(Days::new(1));
    }
    if lower.contains("today") {
        return Some(today);
    }
    if lower.contains("tomorrow") {
        return today.checked_add_days(Days::new(1));
    }

    if let Some(n) = capture_number(&DAYS_AGO, &lower) {
        return today.checked_sub_days(Days::new(n));
    }
    if let Some(n) = capture_number(&WEEKS_AGO, &lower) {
        return n
            .checked_mul(7)
            .and_then(|days| today.checked_sub_days(Days::new(days)));
    }

    if lower.contains("last week") {
        return today.checked_sub_days(Days::new(7));
    }
    if lower.contains("last month") {
        return today.checked_sub_days(Days::new(30));
    }

    if let Some(date) = ISO_DATE
        .captures(&lower)
        .and_then(|c| ymd(&c[1], &c[2], &c[3]))
    {
        return Some(date);
    }

    if let Some(date) = US_SLASH_DATE
        .captures(&lower)
        .and_then(|c| ymd(&c[3], &c[1], &c[2]))
    {
        return Some(date);
    }
    if let Some(date) = YMD_SLASH_DATE
        .captures(&lower)
        .and_then(|c| ymd(&c[1], &c[2], &c[3]))
    {
        return Some(date);
    }

    MONTH_DAY.captures(&lower).and_then(|c| {
        let month = month_number(&c[1])?;
        let day: u32 = c[2].parse().ok()?;
        let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
        match this_year {
            Some(date) if date <= today => Some(date),
            _ => NaiveDate::from_ymd_opt(today.year() - 1, month, day),
        }
    })
}

fn capture_number(pattern: &Regex, text: &str) -> Option<u64> {
    pattern.captures(text).and_then(|c| c[1].parse().ok())
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "january" | "jan" => 1,
        "february" | "feb" => 2,
        "march" | "mar" => 3,
        "april" | "apr" => 4,
        "may" => 5,
        "june" | "jun" => 6,
        "july" | "jul" => 7,
        "august" | "aug" => 8,
        "september" | "sept" | "sep" => 9,
        "october" | "oct" => 10,
        "november" | "nov" => 11,
        "december" | "dec" => 12,
        _ => return None,
    };
    Some(month)
}
