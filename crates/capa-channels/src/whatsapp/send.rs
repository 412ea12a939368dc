//! Outgoing message construction and retry.

use capa_core::error::CapaError;
use tracing::{error, warn};
use wacore_binary::jid::Jid;
use whatsapp_rust::client::Client;

/// Retry delays for exponential backoff: 500ms, 1s, 2s.
pub(super) const RETRY_DELAYS_MS: [u64; 3] = [500, 1000, 2000];

/// User JID for a phone number in international form.
pub(super) fn mention_jid(phone: &str) -> String {
    format!("{}@s.whatsapp.net", phone.trim())
}

/// Plain text, or an extended text message carrying the mentioned JIDs.
pub(super) fn build_message(text: &str, mentions: &[String]) -> waproto::whatsapp::Message {
    if mentions.is_empty() {
        return waproto::whatsapp::Message {
            conversation: Some(text.to_string()),
            ..Default::default()
        };
    }

    let context = waproto::whatsapp::ContextInfo {
        mentioned_jid: mentions.iter().map(|p| mention_jid(p)).collect(),
        ..Default::default()
    };
    let extended = waproto::whatsapp::message::ExtendedTextMessage {
        text: Some(text.to_string()),
        context_info: Some(context.into()),
        ..Default::default()
    };
    waproto::whatsapp::Message {
        extended_text_message: Some(extended.into()),
        ..Default::default()
    }
}

/// Send with retry; returns the message ID.
pub(super) async fn retry_send(
    client: &Client,
    jid: &Jid,
    msg: waproto::whatsapp::Message,
) -> Result<String, CapaError> {
    let mut last_err = None;

    for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
        match client.send_message(jid.clone(), msg.clone()).await {
            Ok(msg_id) => return Ok(msg_id),
            Err(e) => {
                let attempt_num = attempt + 1;
                if attempt_num < RETRY_DELAYS_MS.len() {
                    warn!(
                        "whatsapp send attempt {attempt_num}/{} failed: {e}, retrying in {delay_ms}ms",
                        RETRY_DELAYS_MS.len()
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(*delay_ms)).await;
                } else {
                    error!(
                        "whatsapp send attempt {attempt_num}/{} failed: {e}, giving up",
                        RETRY_DELAYS_MS.len()
                    );
                }
                last_err = Some(e);
            }
        }
    }

    Err(CapaError::Channel(format!(
        "whatsapp send failed after {} attempts: {}",
        RETRY_DELAYS_MS.len(),
        last_err.map(|e| e.to_string()).unwrap_or_default()
    )))
}
