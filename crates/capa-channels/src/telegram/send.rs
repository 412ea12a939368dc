//! Bot API calls: one attempt each, retries live in the caller.

use super::TelegramNotifier;
use capa_core::error::CapaError;
use tracing::debug;

impl TelegramNotifier {
    /// Send one HTML message chunk to the configured chat.
    pub(super) async fn send_text(&self, text: &str) -> Result<(), CapaError> {
        let url = format!("{}/sendMessage", self.base_url);
        let body = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        debug!("telegram: sendMessage ({} bytes)", text.len());

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CapaError::Notify(format!("telegram send failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let error_text = resp.text().await.unwrap_or_default();
            return Err(CapaError::Notify(format!(
                "telegram send failed ({status}): {error_text}"
            )));
        }
        Ok(())
    }

    /// Send a PNG with a caption to the configured chat.
    pub(super) async fn send_photo_bytes(
        &self,
        image: &[u8],
        caption: &str,
    ) -> Result<(), CapaError> {
        let url = format!("{}/sendPhoto", self.base_url);

        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("qr.png")
            .mime_str("image/png")
            .map_err(|e| CapaError::Notify(format!("mime error: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", caption.to_string())
            .part("photo", part);

        let resp = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| CapaError::Notify(format!("telegram sendPhoto failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(CapaError::Notify(format!(
                "telegram sendPhoto failed ({status}): {error_text}"
            )));
        }
        Ok(())
    }
}
