use crate::{
    error::CapaError,
    message::{ConnectionState, IncomingMessage, OutgoingMessage, Severity},
};
use async_trait::async_trait;
use chrono::NaiveDate;

/// Messaging Channel trait.
///
/// Every messaging account (one per WhatsApp login) implements this trait
/// to receive chat commands and deliver reminders.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g. "whatsapp-1").
    fn name(&self) -> &str;

    /// Start listening for incoming messages.
    /// Returns a receiver that yields incoming messages.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<IncomingMessage>, CapaError>;

    /// Send a message through this channel.
    async fn send(&self, message: OutgoingMessage) -> Result<(), CapaError>;

    /// Current connection state. Channels without a handshake are always ready.
    async fn state(&self) -> ConnectionState {
        ConnectionState::Ready
    }

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), CapaError>;

    /// Downcast support for channel-specific operations.
    fn as_any(&self) -> &dyn std::any::Any;
}

/// Read-only access to the two spreadsheet tabs.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Raw rows of the CAPA ledger tab.
    async fn capa_rows(&self) -> Result<Vec<Vec<String>>, CapaError>;

    /// Raw rows of the phone directory tab (row 0 is the header).
    async fn directory_rows(&self) -> Result<Vec<Vec<String>>, CapaError>;
}

/// Operational log sink (Telegram in production).
///
/// Delivery is best-effort: implementations log failures locally and never
/// return an error to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a text notification at the given severity.
    async fn notify(&self, severity: Severity, text: &str);

    /// Send an image (PNG bytes) with a caption.
    async fn notify_photo(&self, image: &[u8], caption: &str);
}

/// Public holiday lookup used to skip scheduled reminders.
#[async_trait]
pub trait HolidayCalendar: Send + Sync {
    /// National holidays in the given year.
    async fn holidays(&self, year: i32) -> Result<Vec<NaiveDate>, CapaError>;
}

/// Notifier that drops everything. Used when Telegram is disabled.
pub struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    async fn notify(&self, severity: Severity, text: &str) {
        tracing::debug!("notification dropped ({}): {text}", severity.label());
    }

    async fn notify_photo(&self, _image: &[u8], caption: &str) {
        tracing::debug!("photo notification dropped: {caption}");
    }
}
