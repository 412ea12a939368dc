//! Date-based eligibility for reminders.
//!
//! Target dates are free text in `DD MMM YYYY` form. Anything that does not
//! parse is kept aside so the caller can warn about it; it is never counted
//! as eligible or ineligible.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::record::CapaRecord;

/// Which target dates a broadcast covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// No date filtering; unparseable dates are not reported either.
    #[default]
    All,
    CurrentMonth,
    Overdue,
    DueThisMonthOrOverdue,
}

/// Result of [`partition`].
#[derive(Debug, Clone, Default)]
pub struct Eligible {
    pub records: Vec<CapaRecord>,
    /// Records whose target date is missing or could not be parsed.
    pub unparseable: Vec<CapaRecord>,
}

// Local month spellings seen in the ledger, mapped to what chrono's `%B` accepts.
const MONTH_ALIASES: &[(&str, &str)] = &[
    ("januari", "jan"),
    ("februari", "feb"),
    ("maret", "mar"),
    ("mei", "may"),
    ("juni", "jun"),
    ("juli", "jul"),
    ("agu", "aug"),
    ("agt", "aug"),
    ("agustus", "aug"),
    ("okt", "oct"),
    ("oktober", "oct"),
    ("des", "dec"),
    ("desember", "dec"),
];

/// Parse `DD MMM YYYY`. Month names are case-insensitive and may be full
/// English names or common Indonesian spellings.
pub fn parse_target_date(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split_whitespace();
    let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let lower = month.to_lowercase();
    let month = MONTH_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, en)| *en)
        .unwrap_or(month);

    NaiveDate::parse_from_str(&format!("{day} {month} {year}"), "%d %B %Y").ok()
}

pub fn is_current_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}

/// Strictly before `today`; a CAPA due today is not overdue yet.
pub fn is_overdue(date: NaiveDate, today: NaiveDate) -> bool {
    date < today
}

impl Scope {
    fn admits(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            Scope::All => true,
            Scope::CurrentMonth => is_current_month(date, today),
            Scope::Overdue => is_overdue(date, today),
            Scope::DueThisMonthOrOverdue => {
                is_current_month(date, today) || is_overdue(date, today)
            }
        }
    }
}

/// Split `records` into those eligible under `scope` and those whose date
/// could not be read. `Scope::All` admits everything without parsing.
pub fn partition(records: &[CapaRecord], scope: Scope, today: NaiveDate) -> Eligible {
    let mut out = Eligible::default();
    if scope == Scope::All {
        out.records = records.to_vec();
        return out;
    }

    for record in records {
        match record.target_date.as_deref().and_then(parse_target_date) {
            Some(date) if scope.admits(date, today) => out.records.push(record.clone()),
            Some(_) => {}
            None => out.unparseable.push(record.clone()),
        }
    }
    out
}
