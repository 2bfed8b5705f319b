//! Free-text dates from occupants.csv.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static MONTH_DAY_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap());
static MONTH_DAY_SHORT_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{2})$").unwrap());
static YEAR_ONLY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").unwrap());
static MONTH_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{4})$").unwrap());

const DAYS_PER_YEAR: f64 = 365.25;

/// Parse `M/D/YYYY`, `M/D/YY`, `YYYY` or `M/YYYY`. Partial dates fall on the first
/// day of the month or year. Returns `None` for anything else, including impossible dates.
pub fn parse_loose_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let num = |s: &str| s.parse::<u32>().ok();

    if let Some(c) = MONTH_DAY_YEAR.captures(value) {
        return NaiveDate::from_ymd_opt(c[3].parse().ok()?, num(&c[1])?, num(&c[2])?);
    }
    if let Some(c) = MONTH_DAY_SHORT_YEAR.captures(value) {
        return NaiveDate::from_ymd_opt(expand_short_year(num(&c[3])?), num(&c[1])?, num(&c[2])?);
    }
    if let Some(c) = YEAR_ONLY.captures(value) {
        return NaiveDate::from_ymd_opt(c[1].parse().ok()?, 1, 1);
    }
    if let Some(c) = MONTH_YEAR.captures(value) {
        return NaiveDate::from_ymd_opt(c[2].parse().ok()?, num(&c[1])?, 1);
    }

    None
}

/// Two-digit years: 69-99 are 1900s, 00-68 are 2000s.
fn expand_short_year(yy: u32) -> i32 {
    let yy = yy as i32;
    if yy >= 69 {
        1900 + yy
    } else {
        2000 + yy
    }
}

/// Age in fractional years between two dates.
pub fn age_in_years(birth: NaiveDate, death: NaiveDate) -> f64 {
    (death - birth).num_days() as f64 / DAYS_PER_YEAR
}
