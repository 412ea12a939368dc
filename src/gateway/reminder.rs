//! Reminder broadcast to the WhatsApp reminder group.

use super::Gateway;
use crate::ledger::Ledger;
use capa_core::{
    error::CapaError,
    message::{ConnectionState, OutgoingMessage, Severity},
    traits::Channel,
};
use capa_report::{
    eligibility::partition,
    group_by_pic,
    render::{escape_html, render_reminder, render_unassigned, render_unparseable_dates},
    CapaRecord, Contact, KeyFilter, Reminder, Scope, NO_PIC,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Which PICs a broadcast addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderTarget {
    All,
    Pic(String),
    /// PICs whose directory slot matches.
    Slot(String),
}

impl ReminderTarget {
    /// `"ALL"` (any case) or an empty value means everyone; anything else is a PIC.
    pub fn from_request(to: &str) -> Self {
        let to = to.trim();
        if to.is_empty() || to.eq_ignore_ascii_case("ALL") {
            Self::All
        } else {
            Self::Pic(to.to_uppercase())
        }
    }
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BroadcastSummary {
    /// PICs reminded in the group.
    pub sent: Vec<String>,
    /// PICs without a usable phone, reported for manual follow-up.
    pub manual: Vec<String>,
    /// Open CAPAs with no PIC at all.
    pub unassigned: usize,
    /// PICs whose reminder could not be delivered.
    pub failed: Vec<String>,
    /// CAPAs skipped because their target date could not be read.
    pub unparseable: usize,
}

/// Whether `record` belongs to the PICs `target` addresses.
fn targets(
    target: &ReminderTarget,
    slot_members: Option<&[String]>,
    record: &CapaRecord,
) -> bool {
    match target {
        ReminderTarget::All => true,
        ReminderTarget::Pic(pic) => record.pics().contains(pic),
        ReminderTarget::Slot(_) => {
            let members = slot_members.unwrap_or_default();
            record.pics().iter().any(|p| members.contains(p))
        }
    }
}

impl Gateway {
    /// The account and group reminders go to. Fails fast if either is unusable.
    async fn reminder_channel(&self) -> Result<(Arc<dyn Channel>, String), CapaError> {
        let group = self.config.whatsapp.reminder_group.trim();
        if group.is_empty() {
            return Err(CapaError::Config(
                "whatsapp.reminder_group is not set".to_string(),
            ));
        }
        let id = self.config.whatsapp.reminder_account;
        let channel = self
            .accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| CapaError::Config(format!("unknown reminder account {id}")))?;
        if channel.state().await != ConnectionState::Ready {
            return Err(CapaError::Channel(format!(
                "{} is not ready, initialize it first",
                channel.name()
            )));
        }
        Ok((channel, group.to_string()))
    }

    /// Send reminders for open CAPAs in `scope`, restricted to `target`.
    ///
    /// Per-PIC delivery failures are reported and counted; they do not stop
    /// the broadcast.
    pub async fn broadcast(
        &self,
        scope: Scope,
        target: &ReminderTarget,
    ) -> Result<BroadcastSummary, CapaError> {
        let (channel, group) = self.reminder_channel().await?;
        let ledger = Ledger::fetch(self.sheets.as_ref()).await?;
        let mut summary = BroadcastSummary::default();

        let filter = match target {
            ReminderTarget::Pic(pic) => KeyFilter::only(pic),
            ReminderTarget::All | ReminderTarget::Slot(_) => KeyFilter::Any,
        };
        let slot_members = match target {
            ReminderTarget::Slot(slot) => Some(ledger.directory.in_slot(slot)),
            _ => None,
        };

        let eligible = partition(&ledger.open(), scope, self.today());
        let unparseable: Vec<CapaRecord> = eligible
            .unparseable
            .into_iter()
            .filter(|r| targets(target, slot_members.as_deref(), r))
            .collect();
        if !unparseable.is_empty() {
            summary.unparseable = unparseable.len();
            self.report(Severity::Warning, &render_unparseable_dates(&unparseable))
                .await;
        }

        let report = group_by_pic(&eligible.records, &filter);
        for (pic, sources) in report.entries() {
            if pic == NO_PIC {
                if *target == ReminderTarget::All {
                    summary.unassigned = sources.leaf_count();
                    self.report(Severity::Warning, &render_unassigned(sources))
                        .await;
                }
                continue;
            }
            if let Some(members) = &slot_members {
                if !members.contains(pic) {
                    continue;
                }
            }

            let contact = Contact::resolve(&ledger.directory, pic);
            match render_reminder(pic, sources, &contact) {
                Reminder::Mention { text, mentions } => {
                    let msg = OutgoingMessage {
                        text,
                        reply_target: Some(group.clone()),
                        mentions,
                    };
                    match channel.send(msg).await {
                        Ok(()) => summary.sent.push(pic.clone()),
                        Err(e) => {
                            self.report(
                                Severity::Error,
                                &format!(
                                    "get CAPA reminder: sending to {} failed\n{}",
                                    escape_html(pic),
                                    escape_html(&e.to_string())
                                ),
                            )
                            .await;
                            summary.failed.push(pic.clone());
                        }
                    }
                }
                Reminder::Manual { text } => {
                    self.report(Severity::Warning, &text).await;
                    summary.manual.push(pic.clone());
                }
            }
        }

        info!(
            "broadcast {scope:?} {target:?}: {} sent, {} manual, {} unassigned, {} failed",
            summary.sent.len(),
            summary.manual.len(),
            summary.unassigned,
            summary.failed.len()
        );
        Ok(summary)
    }
}
