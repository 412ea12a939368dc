//! Gateway: owns the WhatsApp accounts and routes commands, broadcasts and
//! API calls to them.

mod reminder;
mod scheduler;


pub use reminder::{BroadcastSummary, ReminderTarget};

use crate::commands::{self, Command};
use crate::logging::local_today;
use capa_report::render::{escape_html, render_unparseable_dates};
use capa_core::{
    config::Config,
    error::CapaError,
    message::{ConnectionState, IncomingMessage, OutgoingMessage, Severity},
    traits::{Channel, HolidayCalendar, Notifier, SheetSource},
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, info, warn};

/// Result of bringing up an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    AlreadyInitialized,
}

/// The central gateway shared by the command loop, API and scheduler.
pub struct Gateway {
    pub(crate) config: Config,
    pub(crate) sheets: Arc<dyn SheetSource>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) holidays: Option<Arc<dyn HolidayCalendar>>,
    /// WhatsApp accounts by configured id.
    pub(crate) accounts: BTreeMap<u32, Arc<dyn Channel>>,
    /// Serializes account bring-up so two requests cannot start one client twice.
    init_lock: Mutex<()>,
    tx: mpsc::Sender<IncomingMessage>,
    rx: Mutex<Option<mpsc::Receiver<IncomingMessage>>>,
}

impl Gateway {
    pub fn new(
        config: Config,
        sheets: Arc<dyn SheetSource>,
        notifier: Arc<dyn Notifier>,
        holidays: Option<Arc<dyn HolidayCalendar>>,
        accounts: BTreeMap<u32, Arc<dyn Channel>>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(256);
        Self {
            config,
            sheets,
            notifier,
            holidays,
            accounts,
            init_lock: Mutex::new(()),
            tx,
            rx: Mutex::new(Some(rx)),
        }
    }

    /// Today in the bot's configured timezone.
    pub fn today(&self) -> NaiveDate {
        local_today(self.config.bot.utc_offset_hours)
    }

    /// Log locally and mirror to the operations chat.
    pub(crate) async fn report(&self, severity: Severity, text: &str) {
        match severity {
            Severity::Info => info!("{text}"),
            Severity::Warning => warn!("{text}"),
            Severity::Error => error!("{text}"),
        }
        self.notifier.notify(severity, text).await;
    }

    pub async fn account_state(&self, id: u32) -> Option<ConnectionState> {
        match self.accounts.get(&id) {
            Some(channel) => Some(channel.state().await),
            None => None,
        }
    }

    /// Start account `id` unless it is already connecting or ready.
    ///
    /// Incoming commands from the account are forwarded into the gateway loop.
    pub async fn initialize_account(&self, id: u32) -> Result<InitOutcome, CapaError> {
        let channel = self
            .accounts
            .get(&id)
            .ok_or_else(|| CapaError::Config(format!("unknown whatsapp account {id}")))?;

        let _guard = self.init_lock.lock().await;
        if channel.state().await != ConnectionState::Disconnected {
            return Ok(InitOutcome::AlreadyInitialized);
        }

        let mut channel_rx = match channel.start().await {
            Ok(rx) => rx,
            Err(e) => {
                self.report(
                    Severity::Error,
                    &format!(
                        "initialize client {}\n{}",
                        channel.name(),
                        escape_html(&e.to_string())
                    ),
                )
                .await;
                return Err(e);
            }
        };

        let tx = self.tx.clone();
        let name = channel.name().to_string();
        tokio::spawn(async move {
            while let Some(msg) = channel_rx.recv().await {
                if tx.send(msg).await.is_err() {
                    info!("gateway receiver dropped, stopping {name} forwarder");
                    break;
                }
            }
        });

        info!("Channel started: {}", channel.name());
        Ok(InitOutcome::Initialized)
    }

    /// Answer one chat command on the account it came from.
    pub(crate) async fn handle_message(&self, msg: IncomingMessage) {
        let Some(cmd) = Command::parse(&msg.text) else {
            return;
        };
        let Some(target) = msg.reply_target.clone() else {
            warn!("{}: command without reply target", msg.channel);
            return;
        };
        info!(
            "command from {} on {}: {}",
            msg.sender_name.as_deref().unwrap_or(&msg.sender_id),
            msg.channel,
            msg.text
        );

        let reply = commands::handle(cmd, self.sheets.as_ref(), self.today()).await;
        if !reply.unparseable.is_empty() {
            self.report(
                Severity::Warning,
                &render_unparseable_dates(&reply.unparseable),
            )
            .await;
        }

        let Some(channel) = self.accounts.values().find(|c| c.name() == msg.channel) else {
            warn!("reply dropped: no channel named {}", msg.channel);
            return;
        };
        if let Err(e) = channel.send(OutgoingMessage::text(target, reply.text)).await {
            self.report(
                Severity::Error,
                &format!(
                    "reply on {} failed\n{}",
                    escape_html(&msg.channel),
                    escape_html(&e.to_string())
                ),
            )
            .await;
        }
    }

    /// Run until Ctrl-C: auto-start accounts, spawn the API server and the
    /// scheduler, and dispatch incoming commands.
    pub async fn run(self: Arc<Self>) -> anyhow::Result<()> {
        let mut rx = self
            .rx
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow::anyhow!("gateway is already running"))?;

        info!(
            "CAPA gateway running | accounts: {} | reminder group: {}",
            self.accounts
                .values()
                .map(|c| c.name().to_string())
                .collect::<Vec<_>>()
                .join(", "),
            if self.config.whatsapp.reminder_group.is_empty() {
                "(not set)"
            } else {
                self.config.whatsapp.reminder_group.as_str()
            }
        );

        for account in &self.config.whatsapp.accounts {
            if account.auto_start {
                if let Err(e) = self.initialize_account(account.id).await {
                    error!("auto-start of account {} failed: {e}", account.id);
                }
            }
        }

        let api_handle = if self.config.api.enabled {
            let gw = self.clone();
            Some(tokio::spawn(async move { crate::api::serve(gw).await }))
        } else {
            None
        };

        let sched_handle = if self.config.scheduler.enabled {
            let gw = self.clone();
            Some(tokio::spawn(async move { gw.scheduler_loop().await }))
        } else {
            None
        };

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else { break };
                    let gw = self.clone();
                    tokio::spawn(async move { gw.handle_message(msg).await });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutdown requested");
                    break;
                }
            }
        }

        if let Some(h) = api_handle {
            h.abort();
        }
        if let Some(h) = sched_handle {
            h.abort();
        }
        for channel in self.accounts.values() {
            if let Err(e) = channel.stop().await {
                warn!("failed to stop {}: {e}", channel.name());
            }
        }
        info!("CAPA gateway stopped");
        Ok(())
    }
}
