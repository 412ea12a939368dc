mod api;
mod commands;
mod gateway;
mod ledger;
mod logging;
#[cfg(test)]
mod testutil;

use capa_channels::{
    telegram::TelegramNotifier,
    whatsapp::{generate_qr_terminal, start_pairing, WhatsAppChannel},
};
use capa_core::{
    config::{self, shellexpand, Config},
    traits::{Channel, HolidayCalendar, Notifier, SheetSource, SilentNotifier},
};
use capa_sources::{GoogleSheetsClient, HolidayApiClient};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "capa-bot",
    version,
    about = "CAPA reminder bot for WhatsApp groups"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot: WhatsApp accounts, HTTP API and scheduler.
    Start,
    /// Show configuration and session status.
    Status,
    /// Run the `!checkcapa` validation once and print the result.
    Check,
    /// Pair a WhatsApp account by scanning a QR code in the terminal.
    Pair {
        /// Account id from `[[whatsapp.accounts]]`.
        #[arg(long, default_value_t = 1)]
        account: u32,
    },
}

const PAIRING_TIMEOUT: Duration = Duration::from_secs(180);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    match cli.command {
        Commands::Start => {
            let _guard = logging::init(&cfg.bot)?;
            info!("{} starting", cfg.bot.name);

            let sheets: Arc<dyn SheetSource> =
                Arc::new(GoogleSheetsClient::from_config(&cfg.sheets).await?);
            let notifier = build_notifier(&cfg)?;
            let holidays: Option<Arc<dyn HolidayCalendar>> = if cfg.holidays.enabled {
                Some(Arc::new(HolidayApiClient::from_config(&cfg.holidays)))
            } else {
                None
            };

            let mut accounts: BTreeMap<u32, Arc<dyn Channel>> = BTreeMap::new();
            if cfg.whatsapp.enabled {
                for account in &cfg.whatsapp.accounts {
                    let channel =
                        WhatsAppChannel::new(account.id, &cfg.bot.data_dir, notifier.clone());
                    accounts.insert(account.id, Arc::new(channel));
                }
            }
            if accounts.is_empty() {
                anyhow::bail!("No WhatsApp accounts enabled. Add [[whatsapp.accounts]] to config.toml.");
            }

            let gw = gateway::Gateway::new(cfg, sheets, notifier, holidays, accounts);
            Arc::new(gw).run().await?;
        }
        Commands::Status => print_status(&cli.config, &cfg),
        Commands::Check => {
            init_console_logging();
            let sheets = GoogleSheetsClient::from_config(&cfg.sheets).await?;
            let today = logging::local_today(cfg.bot.utc_offset_hours);
            println!(
                "{}",
                commands::handle(commands::Command::CheckCapa, &sheets, today)
                    .await
                    .text
            );
        }
        Commands::Pair { account } => {
            init_console_logging();
            if !cfg.whatsapp.accounts.iter().any(|a| a.id == account) {
                anyhow::bail!("account {account} is not configured in [[whatsapp.accounts]]");
            }
            pair(&cfg.bot.data_dir, account).await?;
        }
    }

    Ok(())
}

fn init_console_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();
}

/// Telegram when configured, otherwise notifications only reach the log.
fn build_notifier(cfg: &Config) -> anyhow::Result<Arc<dyn Notifier>> {
    let tg = &cfg.telegram;
    if !tg.enabled {
        return Ok(Arc::new(SilentNotifier));
    }
    if tg.bot_token.is_empty() || tg.chat_id.is_empty() {
        anyhow::bail!(
            "Telegram is enabled but bot_token or chat_id is empty. \
             Set them in config.toml or CAPA_TELEGRAM_BOT_TOKEN / CAPA_TELEGRAM_CHAT_ID."
        );
    }
    Ok(Arc::new(TelegramNotifier::new(tg.clone(), &cfg.bot.name)))
}

fn print_status(path: &str, cfg: &Config) {
    println!("{} - Status Check\n", cfg.bot.name);
    println!("Config: {path}");
    println!("Log file: {}", shellexpand(&cfg.bot.log_file));
    println!();

    println!(
        "  sheets: {}",
        if cfg.sheets.spreadsheet_id.is_empty() {
            "missing spreadsheet_id".to_string()
        } else {
            format!(
                "{} (key: {})",
                cfg.sheets.spreadsheet_id,
                if Path::new(&shellexpand(&cfg.sheets.credentials_path)).exists() {
                    "found"
                } else {
                    "not found"
                }
            )
        }
    );
    println!(
        "  telegram: {}",
        match (cfg.telegram.enabled, cfg.telegram.bot_token.is_empty()) {
            (false, _) => "disabled",
            (true, true) => "enabled but missing bot_token",
            (true, false) => "configured",
        }
    );
    println!(
        "  api: {}",
        if cfg.api.enabled {
            format!("{}:{}", cfg.api.host, cfg.api.port)
        } else {
            "disabled".to_string()
        }
    );
    println!(
        "  scheduler: {}",
        if cfg.scheduler.enabled {
            format!(
                "daily {} + {} friday slot(s)",
                if cfg.scheduler.daily_time.is_empty() {
                    "off"
                } else {
                    cfg.scheduler.daily_time.as_str()
                },
                cfg.scheduler.friday_slots.len()
            )
        } else {
            "disabled".to_string()
        }
    );
    println!();

    if !cfg.whatsapp.enabled {
        println!("  whatsapp: disabled");
        return;
    }
    println!(
        "  reminder group: {}",
        if cfg.whatsapp.reminder_group.is_empty() {
            "(not set)"
        } else {
            cfg.whatsapp.reminder_group.as_str()
        }
    );
    let data_dir = shellexpand(&cfg.bot.data_dir);
    for account in &cfg.whatsapp.accounts {
        let session = Path::new(&data_dir)
            .join(format!("whatsapp_session_{}", account.id))
            .join("whatsapp.db");
        println!(
            "  whatsapp-{}: {}{}",
            account.id,
            if session.exists() { "paired" } else { "not paired" },
            if account.auto_start { " (auto start)" } else { "" }
        );
    }
}

async fn pair(data_dir: &str, account: u32) -> anyhow::Result<()> {
    println!("Pairing whatsapp-{account}. Open WhatsApp > Linked devices and scan:\n");
    let (mut qr_rx, mut done_rx) = start_pairing(data_dir, account).await?;

    let deadline = tokio::time::sleep(PAIRING_TIMEOUT);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            Some(code) = qr_rx.recv() => {
                println!("{}", generate_qr_terminal(&code)?);
                println!("Waiting for scan (the code rotates automatically)...\n");
            }
            Some(true) = done_rx.recv() => {
                println!("whatsapp-{account} paired.");
                return Ok(());
            }
            _ = &mut deadline => {
                anyhow::bail!("pairing timed out after {}s", PAIRING_TIMEOUT.as_secs());
            }
        }
    }
}
