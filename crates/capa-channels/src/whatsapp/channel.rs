//! Channel trait implementation for WhatsApp.

use super::send::{build_message, retry_send};
use super::WhatsAppChannel;
use crate::utils::split_message;
use async_trait::async_trait;
use capa_core::{
    error::CapaError,
    message::{ConnectionState, IncomingMessage, OutgoingMessage, Severity},
    traits::Channel,
};
use tokio::sync::mpsc;
use tracing::info;
use wacore_binary::jid::Jid;

const MAX_MESSAGE_LEN: usize = 4096;

impl WhatsAppChannel {
    /// Send text to a JID, tagging `mentions` on every chunk.
    async fn send_text(
        &self,
        jid_str: &str,
        text: &str,
        mentions: &[String],
    ) -> Result<(), CapaError> {
        let client_guard = self.client.lock().await;
        let client = client_guard
            .as_ref()
            .ok_or_else(|| CapaError::Channel(format!("{} not connected", self.name)))?;

        let jid: Jid = jid_str
            .parse()
            .map_err(|e| CapaError::Channel(format!("invalid whatsapp JID '{jid_str}': {e}")))?;

        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let msg = build_message(chunk, mentions);
            let msg_id = retry_send(client, &jid, msg).await?;
            self.sent_ids.lock().await.insert(msg_id);
        }

        Ok(())
    }
}

#[async_trait]
impl Channel for WhatsAppChannel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<mpsc::Receiver<IncomingMessage>, CapaError> {
        let (tx, rx) = mpsc::channel(64);
        // A leftover bot (e.g. after a logout) must not share the session database.
        self.abort_bot().await;
        *self.state.lock().await = ConnectionState::Connecting;
        self.notifier
            .notify(
                Severity::Info,
                &format!("<b> initialize client {} </b>", self.name),
            )
            .await;

        if let Err(e) = self.build_and_run_bot(tx).await {
            *self.state.lock().await = ConnectionState::Disconnected;
            return Err(e);
        }
        info!("{} channel started", self.name);
        Ok(rx)
    }

    async fn send(&self, message: OutgoingMessage) -> Result<(), CapaError> {
        let target = message
            .reply_target
            .as_deref()
            .ok_or_else(|| CapaError::Channel("no reply_target on outgoing message".into()))?;

        self.send_text(target, &message.text, &message.mentions).await
    }

    async fn state(&self) -> ConnectionState {
        *self.state.lock().await
    }

    async fn stop(&self) -> Result<(), CapaError> {
        info!("{} channel stopped", self.name);
        if let Some(client) = self.client.lock().await.take() {
            client.disconnect().await;
        }
        self.abort_bot().await;
        *self.state.lock().await = ConnectionState::Disconnected;
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
