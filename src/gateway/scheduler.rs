//! Scheduled broadcasts: the daily reminder and the Friday slot reminders.

use super::{Gateway, ReminderTarget};
use crate::logging::local_now;
use capa_core::message::Severity;
use capa_report::{render::escape_html, Scope};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use tracing::{info, warn};

/// A recurring broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Job {
    pub time: NaiveTime,
    /// `None` = every day (subject to the weekday rule).
    pub weekday: Option<Weekday>,
    pub scope: Scope,
    pub target: ReminderTarget,
}

/// Parse `"HH:MM"`.
pub(crate) fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").ok()
}

/// First time strictly after `now` at `time`, optionally on `weekday`.
pub(crate) fn next_fire(
    now: NaiveDateTime,
    time: NaiveTime,
    weekday: Option<Weekday>,
) -> NaiveDateTime {
    let mut candidate = now.date().and_time(time);
    if candidate <= now {
        candidate += Duration::days(1);
    }
    if let Some(day) = weekday {
        while candidate.weekday() != day {
            candidate += Duration::days(1);
        }
    }
    candidate
}

pub(crate) fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

impl Gateway {
    /// Jobs from `[scheduler]`. Unparseable times are logged and skipped.
    pub(crate) fn scheduled_jobs(&self) -> Vec<Job> {
        let cfg = &self.config.scheduler;
        let mut jobs = Vec::new();

        if !cfg.daily_time.trim().is_empty() {
            match parse_hhmm(&cfg.daily_time) {
                Some(time) => jobs.push(Job {
                    time,
                    weekday: None,
                    scope: Scope::DueThisMonthOrOverdue,
                    target: ReminderTarget::All,
                }),
                None => warn!("scheduler: invalid daily_time '{}'", cfg.daily_time),
            }
        }

        for slot in &cfg.friday_slots {
            match parse_hhmm(&slot.time) {
                Some(time) => jobs.push(Job {
                    time,
                    weekday: Some(Weekday::Fri),
                    scope: Scope::All,
                    target: ReminderTarget::Slot(slot.slot.clone()),
                }),
                None => warn!(
                    "scheduler: invalid time '{}' for slot {}",
                    slot.time, slot.slot
                ),
            }
        }

        jobs
    }

    /// Why `date` is not a reminder day, if it isn't one.
    ///
    /// A failed holiday lookup is reported and the day counts as a workday.
    pub(crate) async fn skip_reason(&self, date: NaiveDate) -> Option<String> {
        let cfg = &self.config.scheduler;
        if cfg.weekdays_only && is_weekend(date) {
            return Some(format!("{date} is a weekend"));
        }
        if !cfg.skip_holidays {
            return None;
        }
        let calendar = self.holidays.as_ref()?;
        match calendar.holidays(date.year()).await {
            Ok(days) if days.contains(&date) => Some(format!("{date} is a national holiday")),
            Ok(_) => None,
            Err(e) => {
                self.report(
                    Severity::Warning,
                    &format!(
                        "holiday lookup failed, sending anyway\n{}",
                        escape_html(&e.to_string())
                    ),
                )
                .await;
                None
            }
        }
    }

    /// Run one job now unless today is skipped.
    pub(crate) async fn run_job(&self, job: &Job) {
        let today = self.today();
        if let Some(reason) = self.skip_reason(today).await {
            info!("scheduler: skipping {:?} ({reason})", job.target);
            return;
        }
        if let Err(e) = self.broadcast(job.scope, &job.target).await {
            self.report(
                Severity::Error,
                &format!("get CAPA reminder\n{}", escape_html(&e.to_string())),
            )
            .await;
        }
    }

    /// Sleep until the next job is due, run it, repeat.
    pub(crate) async fn scheduler_loop(&self) {
        let jobs = self.scheduled_jobs();
        if jobs.is_empty() {
            info!("scheduler: no jobs configured");
            return;
        }
        let offset = self.config.bot.utc_offset_hours;

        let now = local_now(offset);
        let mut due: Vec<NaiveDateTime> = jobs
            .iter()
            .map(|j| next_fire(now, j.time, j.weekday))
            .collect();
        info!("scheduler: {} job(s) scheduled", jobs.len());

        loop {
            let Some((idx, &fire_at)) = due.iter().enumerate().min_by_key(|(_, t)| **t) else {
                return;
            };
            let wait = (fire_at - local_now(offset))
                .to_std()
                .unwrap_or(std::time::Duration::ZERO);
            tokio::time::sleep(wait).await;

            self.run_job(&jobs[idx]).await;
            due[idx] = next_fire(fire_at, jobs[idx].time, jobs[idx].weekday);
        }
    }
}
