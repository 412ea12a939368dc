//! Bot lifecycle: build the client, relay connection events, run it.

use super::events::handle_whatsapp_message;
use super::qr::generate_qr_image;
use super::{session_db_path, WhatsAppChannel};
use capa_core::{
    error::CapaError,
    message::{ConnectionState, IncomingMessage, Severity},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use wacore::types::events::Event;
use whatsapp_rust::bot::Bot;
use whatsapp_rust_sqlite_storage::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

impl WhatsAppChannel {
    /// Build a bot for this account and run it in the background.
    pub(super) async fn build_and_run_bot(
        &self,
        tx: mpsc::Sender<IncomingMessage>,
    ) -> Result<(), CapaError> {
        let db_path = session_db_path(&self.data_dir, self.account_id);
        let client_handle = self.client.clone();

        info!("{} building (session: {db_path})...", self.name);

        let backend = Arc::new(
            SqliteStore::new(&db_path)
                .await
                .map_err(|e| CapaError::Channel(format!("whatsapp store init failed: {e}")))?,
        );

        let name = self.name.clone();
        let client_for_event = client_handle.clone();
        let sent_ids_for_event = self.sent_ids.clone();
        let state_for_event = self.state.clone();
        let notifier_for_event = self.notifier.clone();

        let mut bot = Bot::builder()
            .with_backend(backend)
            .with_transport_factory(TokioWebSocketTransportFactory::new())
            .with_http_client(UreqHttpClient::new())
            .with_device_props(
                Some("CAPA Bot".to_string()),
                None,
                Some(waproto::whatsapp::device_props::PlatformType::Desktop),
            )
            .on_event(move |event, client| {
                let tx = tx.clone();
                let name = name.clone();
                let client_store = client_for_event.clone();
                let sent_ids = sent_ids_for_event.clone();
                let state = state_for_event.clone();
                let notifier = notifier_for_event.clone();
                async move {
                    match event {
                        Event::PairingQrCode { code, .. } => {
                            info!("{name}: QR code generated (scan to pair)");
                            match generate_qr_image(&code) {
                                Ok(png) => {
                                    let caption = format!("Scan to pair {name}");
                                    notifier.notify_photo(&png, &caption).await;
                                }
                                Err(e) => {
                                    error!("{name}: generate QRCode: {e}");
                                    notifier
                                        .notify(Severity::Error, &format!("Generate QRCode\n{e}"))
                                        .await;
                                }
                            }
                        }
                        Event::PairSuccess(_) => {
                            info!("{name}: authenticated");
                            notifier
                                .notify(Severity::Info, &format!("<b> {name} authenticated </b>"))
                                .await;
                        }
                        Event::Connected(_) => {
                            info!("{name}: ready");
                            *client_store.lock().await = Some(client);
                            *state.lock().await = ConnectionState::Ready;
                            notifier
                                .notify(Severity::Info, &format!("<b> {name} ready </b>"))
                                .await;
                        }
                        Event::Disconnected(_) => {
                            // The client reconnects on its own; the bot task stays up.
                            warn!("{name}: disconnected, reconnecting");
                            *client_store.lock().await = None;
                            *state.lock().await = ConnectionState::Connecting;
                            notifier
                                .notify(Severity::Warning, &format!("<b> {name} disconnected </b>"))
                                .await;
                        }
                        Event::LoggedOut(_) => {
                            warn!("{name}: logged out, session invalidated");
                            *client_store.lock().await = None;
                            *state.lock().await = ConnectionState::Disconnected;
                            notifier
                                .notify(Severity::Warning, &format!("<b> {name} logged out </b>"))
                                .await;
                        }
                        Event::Message(msg, info) => {
                            handle_whatsapp_message(*msg, info, &tx, &name, &sent_ids).await;
                        }
                        _ => {}
                    }
                }
            })
            .build()
            .await
            .map_err(|e| CapaError::Channel(format!("whatsapp bot build failed: {e}")))?;

        *client_handle.lock().await = Some(bot.client());

        let handle = bot
            .run()
            .await
            .map_err(|e| CapaError::Channel(format!("whatsapp bot run failed: {e}")))?;
        self.set_run_handle(handle).await;

        info!("{} bot started", self.name);
        Ok(())
    }
}
