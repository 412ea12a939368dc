//! Incoming message handling: unwrap, keep `!` commands, forward.

use capa_core::message::IncomingMessage;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

/// Chat commands start with this prefix; everything else is ignored.
pub(super) const COMMAND_PREFIX: char = '!';

/// How many of our own message IDs are remembered for echo suppression.
pub(super) const SENT_IDS_CAPACITY: usize = 1024;

/// IDs of messages we sent, oldest evicted first once full.
#[derive(Debug)]
pub(crate) struct SentIds {
    ids: HashSet<String>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Default for SentIds {
    fn default() -> Self {
        Self::with_capacity(SENT_IDS_CAPACITY)
    }
}

impl SentIds {
    pub(super) fn with_capacity(capacity: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub(super) fn insert(&mut self, id: String) {
        if !self.ids.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > self.capacity {
            if let Some(old) = self.order.pop_front() {
                self.ids.remove(&old);
            }
        }
    }

    /// True if `id` was ours. Each ID matches once.
    pub(super) fn remove(&mut self, id: &str) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.order.retain(|o| o != id);
        true
    }

    #[cfg(test)]
    pub(super) fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Text body of a message, looking through device-sent, ephemeral and
/// view-once wrappers.
pub(super) fn extract_text(msg: &waproto::whatsapp::Message) -> Option<&str> {
    let inner = msg
        .device_sent_message
        .as_ref()
        .and_then(|d| d.message.as_deref())
        .or_else(|| {
            msg.ephemeral_message
                .as_ref()
                .and_then(|e| e.message.as_deref())
        })
        .or_else(|| {
            msg.view_once_message
                .as_ref()
                .and_then(|v| v.message.as_deref())
        })
        .unwrap_or(msg);

    inner.conversation.as_deref().or_else(|| {
        inner
            .extended_text_message
            .as_ref()
            .and_then(|e| e.text.as_deref())
    })
}

pub(super) fn is_command(text: &str) -> bool {
    text.trim_start().starts_with(COMMAND_PREFIX)
}

/// Forward a command message (group or direct) to the gateway.
pub(super) async fn handle_whatsapp_message(
    msg: waproto::whatsapp::Message,
    info: wacore::types::message::MessageInfo,
    tx: &mpsc::Sender<IncomingMessage>,
    channel_name: &str,
    sent_ids: &Arc<Mutex<SentIds>>,
) {
    debug!(
        "WA msg: is_group={}, is_from_me={}, sender={}, chat={}",
        info.source.is_group, info.source.is_from_me, info.source.sender.user, info.source.chat.user,
    );

    if sent_ids.lock().await.remove(&info.id) {
        debug!("skipping own echo: {}", info.id);
        return;
    }

    let Some(text) = extract_text(&msg).filter(|t| is_command(t)) else {
        return;
    };

    let phone = info.source.sender.user.clone();
    let sender_name = if info.push_name.is_empty() {
        phone.clone()
    } else {
        info.push_name.clone()
    };

    let incoming = IncomingMessage {
        id: Uuid::new_v4(),
        channel: channel_name.to_string(),
        sender_id: phone,
        sender_name: Some(sender_name),
        text: text.trim().to_string(),
        timestamp: chrono::Utc::now(),
        reply_target: Some(info.source.chat.to_string()),
        is_group: info.source.is_group,
    };

    if tx.send(incoming).await.is_err() {
        info!("{channel_name} receiver dropped");
    }
}
