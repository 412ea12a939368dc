//! National holiday lookup (`GET {url}?year=YYYY`).

use async_trait::async_trait;
use capa_core::{config::HolidayConfig, error::CapaError, traits::HolidayCalendar};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Deserialize)]
struct HolidayEntry {
    holiday_date: String,
    #[serde(default)]
    holiday_name: String,
    #[serde(default)]
    is_national_holiday: bool,
}

/// Client for the public holiday API.
pub struct HolidayApiClient {
    client: reqwest::Client,
    url: String,
}

impl HolidayApiClient {
    pub fn from_config(config: &HolidayConfig) -> Self {
        Self::new(config.url.clone())
    }

    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl HolidayCalendar for HolidayApiClient {
    async fn holidays(&self, year: i32) -> Result<Vec<NaiveDate>, CapaError> {
        debug!("holidays: GET {} year={year}", self.url);

        let resp = self
            .client
            .get(&self.url)
            .query(&[("year", year.to_string())])
            .send()
            .await
            .map_err(|e| CapaError::Holiday(format!("holiday request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(CapaError::Holiday(format!("holiday api returned {status}")));
        }

        let entries: Vec<HolidayEntry> = resp
            .json()
            .await
            .map_err(|e| CapaError::Holiday(format!("holidays: failed to parse response: {e}")))?;

        let mut dates = Vec::new();
        for entry in entries.into_iter().filter(|e| e.is_national_holiday) {
            // Dates may come unpadded ("2024-1-1").
            match NaiveDate::parse_from_str(entry.holiday_date.trim(), "%Y-%m-%d") {
                Ok(date) => dates.push(date),
                Err(e) => warn!(
                    "holidays: skipping {} ({}): {e}",
                    entry.holiday_date, entry.holiday_name
                ),
            }
        }
        Ok(dates)
    }
}
