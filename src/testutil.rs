//! Test doubles shared by the gateway, command and API tests.

use async_trait::async_trait;
use capa_core::{
    error::CapaError,
    message::{ConnectionState, IncomingMessage, OutgoingMessage, Severity},
    traits::{Channel, HolidayCalendar, Notifier, SheetSource},
};
use chrono::NaiveDate;
use std::any::Any;
use std::sync::{Arc, Mutex};

/// CAPA row with the columns the bot reads filled in.
pub fn capa_row(
    number: &str,
    source: &str,
    desc: &str,
    pic: &str,
    dept: &str,
    date: &str,
    status: &str,
) -> Vec<String> {
    let mut row = vec![String::new(); 24];
    row[0] = number.into();
    row[3] = source.into();
    row[15] = desc.into();
    row[16] = pic.into();
    row[17] = dept.into();
    row[18] = date.into();
    row[23] = status.into();
    row
}

/// Directory row: name, phone, superior, slot.
pub fn directory_row(name: &str, phone: &str, superior: &str, slot: &str) -> Vec<String> {
    vec![
        "1".into(),
        "PROD".into(),
        "L1".into(),
        name.into(),
        phone.into(),
        superior.into(),
        slot.into(),
    ]
}

pub fn directory_header() -> Vec<String> {
    ["No", "Dept", "Level", "Name", "Phone", "Atasan", "Slot"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Failure text of [`MockSheets`], shaped like a Sheets error with an HTML body.
pub const QUOTA_ERROR: &str = "sheets returned 429: <html>Too Many Requests & quota</html>";

/// In-memory spreadsheet. `fail` makes every read return an error.
#[derive(Default)]
pub struct MockSheets {
    pub capa: Vec<Vec<String>>,
    pub directory: Vec<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl SheetSource for MockSheets {
    async fn capa_rows(&self) -> Result<Vec<Vec<String>>, CapaError> {
        if self.fail {
            return Err(CapaError::Sheet(QUOTA_ERROR.into()));
        }
        Ok(self.capa.clone())
    }

    async fn directory_rows(&self) -> Result<Vec<Vec<String>>, CapaError> {
        if self.fail {
            return Err(CapaError::Sheet(QUOTA_ERROR.into()));
        }
        Ok(self.directory.clone())
    }
}

/// Records every notification.
#[derive(Default)]
pub struct RecordingNotifier {
    pub events: Mutex<Vec<(Severity, String)>>,
}

impl RecordingNotifier {
    pub fn texts(&self, severity: Severity) -> Vec<String> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == severity)
            .map(|(_, t)| t.clone())
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, severity: Severity, text: &str) {
        self.events.lock().unwrap().push((severity, text.to_string()));
    }

    async fn notify_photo(&self, _image: &[u8], caption: &str) {
        self.events
            .lock()
            .unwrap()
            .push((Severity::Info, format!("[photo] {caption}")));
    }
}

/// Channel that records sent messages. Starts `Disconnected`; `start()`
/// moves it to `Ready` and hands back `inbox` as the message stream.
pub struct MockChannel {
    pub name: String,
    pub sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    pub state: Mutex<ConnectionState>,
    pub starts: Mutex<u32>,
    /// Phone numbers whose mention messages fail to send.
    pub fail_for: Vec<String>,
}

impl MockChannel {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sent: Arc::new(Mutex::new(Vec::new())),
            state: Mutex::new(ConnectionState::Disconnected),
            starts: Mutex::new(0),
            fail_for: Vec::new(),
        }
    }

    pub fn ready(name: &str) -> Self {
        let channel = Self::new(name);
        *channel.state.lock().unwrap() = ConnectionState::Ready;
        channel
    }

    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, CapaError> {
        *self.starts.lock().unwrap() += 1;
        *self.state.lock().unwrap() = ConnectionState::Ready;
        let (_tx, rx) = tokio::sync::mpsc::channel(1);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), CapaError> {
        if message.mentions.iter().any(|m| self.fail_for.contains(m)) {
            return Err(CapaError::Channel("connection reset".into()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap()
    }

    async fn stop(&self) -> Result<(), CapaError> {
        *self.state.lock().unwrap() = ConnectionState::Disconnected;
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Fixed holiday list; `fail` simulates an unreachable API.
pub struct MockHolidays {
    pub dates: Vec<NaiveDate>,
    pub fail: bool,
}

#[async_trait]
impl HolidayCalendar for MockHolidays {
    async fn holidays(&self, _year: i32) -> Result<Vec<NaiveDate>, CapaError> {
        if self.fail {
            return Err(CapaError::Holiday("timeout".into()));
        }
        Ok(self.dates.clone())
    }
}
