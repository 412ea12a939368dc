//! WhatsApp accounts via `whatsapp-rust` (WhatsApp Web protocol).
//!
//! Each configured account is its own [`WhatsAppChannel`] with its own
//! session at `{data_dir}/whatsapp_session_{id}/whatsapp.db`. Pairing is done
//! by scanning a QR code, which is mirrored to the operations chat as a PNG.

mod bot;
mod channel;
mod events;
mod qr;
mod send;


pub use qr::{generate_qr_image, generate_qr_terminal, start_pairing};

use capa_core::{message::ConnectionState, traits::Notifier};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// One WhatsApp login: connection lifecycle, command intake and delivery.
pub struct WhatsAppChannel {
    pub(super) account_id: u32,
    pub(super) name: String,
    pub(super) data_dir: String,
    pub(super) notifier: Arc<dyn Notifier>,
    /// Client handle for sending messages, set once the bot is built.
    pub(super) client: Arc<Mutex<Option<Arc<whatsapp_rust::client::Client>>>>,
    /// Message IDs we sent, so our own echoes are not read back as commands.
    pub(super) sent_ids: Arc<Mutex<events::SentIds>>,
    pub(super) state: Arc<Mutex<ConnectionState>>,
    /// Background task of the running bot. At most one per session database.
    pub(super) run_handle: Mutex<Option<JoinHandle<()>>>,
}

impl WhatsAppChannel {
    pub fn new(account_id: u32, data_dir: &str, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            account_id,
            name: format!("whatsapp-{account_id}"),
            data_dir: data_dir.to_string(),
            notifier,
            client: Arc::new(Mutex::new(None)),
            sent_ids: Arc::new(Mutex::new(events::SentIds::default())),
            state: Arc::new(Mutex::new(ConnectionState::Disconnected)),
            run_handle: Mutex::new(None),
        }
    }

    pub fn account_id(&self) -> u32 {
        self.account_id
    }

    /// Check if the WhatsApp client is currently connected.
    pub async fn is_connected(&self) -> bool {
        *self.state.lock().await == ConnectionState::Ready
    }

    /// Whether a bot task is still running for this account.
    pub async fn is_running(&self) -> bool {
        self.run_handle
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Keep `handle` as the account's bot task, aborting any previous one.
    pub(super) async fn set_run_handle(&self, handle: JoinHandle<()>) {
        if let Some(old) = self.run_handle.lock().await.replace(handle) {
            old.abort();
        }
    }

    /// Abort the bot task, if any.
    pub(super) async fn abort_bot(&self) {
        if let Some(handle) = self.run_handle.lock().await.take() {
            handle.abort();
        }
    }
}

/// Session database path for an account, creating its directory.
pub(super) fn session_db_path(data_dir: &str, account_id: u32) -> String {
    let dir = capa_core::config::shellexpand(data_dir);
    let session_dir = format!("{dir}/whatsapp_session_{account_id}");
    if let Err(e) = std::fs::create_dir_all(&session_dir) {
        tracing::warn!("failed to create {session_dir}: {e}");
    }
    format!("{session_dir}/whatsapp.db")
}
