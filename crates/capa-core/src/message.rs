use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An incoming chat message from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: Uuid,
    /// Channel name (e.g. "whatsapp-1").
    pub channel: String,
    /// Platform-specific user ID (phone number for WhatsApp).
    pub sender_id: String,
    /// Human-readable sender name.
    pub sender_name: Option<String>,
    /// Message text content.
    pub text: String,
    pub timestamp: DateTime<Utc>,
    /// Platform-specific target for routing the reply (e.g. a chat JID).
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Whether this message comes from a group chat.
    #[serde(default)]
    pub is_group: bool,
}

/// An outgoing message to send through a channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub text: String,
    /// Platform-specific target for routing (e.g. a group JID).
    #[serde(default)]
    pub reply_target: Option<String>,
    /// Phone numbers to @-mention. Empty = plain message.
    #[serde(default)]
    pub mentions: Vec<String>,
}

impl OutgoingMessage {
    /// Plain text message to a target.
    pub fn text(target: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_target: Some(target.into()),
            mentions: Vec::new(),
        }
    }
}

/// Lifecycle of a messaging client connection.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    /// Started, waiting for pairing or the connection handshake.
    Connecting,
    Ready,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Ready => "ready",
        }
    }
}

/// Severity of an operational log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Label used in log lines and Telegram notifications.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
        }
    }
}
