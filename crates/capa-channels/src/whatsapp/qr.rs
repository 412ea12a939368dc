//! QR code rendering and the standalone terminal pairing flow.

use super::session_db_path;
use capa_core::error::CapaError;
use std::sync::Arc;
use tokio::sync::mpsc;
use wacore::types::events::Event;
use whatsapp_rust::bot::Bot;
use whatsapp_rust_sqlite_storage::SqliteStore;
use whatsapp_rust_tokio_transport::TokioWebSocketTransportFactory;
use whatsapp_rust_ureq_http_client::UreqHttpClient;

/// Compact terminal QR code: two module rows per line using half blocks.
pub fn generate_qr_terminal(qr_data: &str) -> Result<String, CapaError> {
    use qrcode::{Color, EcLevel, QrCode};

    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| CapaError::Channel(format!("QR generation failed: {e}")))?;

    let width = code.width();
    let colors: Vec<Color> = code.into_colors();
    let is_dark = |row: usize, col: usize| row < width && colors[row * width + col] == Color::Dark;

    let mut out = String::new();
    for row in (0..width).step_by(2) {
        for col in 0..width {
            out.push(match (is_dark(row, col), is_dark(row + 1, col)) {
                (true, true) => '█',
                (true, false) => '▀',
                (false, true) => '▄',
                (false, false) => ' ',
            });
        }
        out.push('\n');
    }

    Ok(out)
}

/// QR code as PNG bytes, 10px modules with a 2-module quiet zone.
pub fn generate_qr_image(qr_data: &str) -> Result<Vec<u8>, CapaError> {
    use image::{ImageBuffer, Luma};
    use qrcode::{Color, EcLevel, QrCode};

    let code = QrCode::with_error_correction_level(qr_data.as_bytes(), EcLevel::L)
        .map_err(|e| CapaError::Channel(format!("QR generation failed: {e}")))?;

    let module_size: u32 = 10;
    let quiet_zone: u32 = 2;
    let modules = code.width() as u32;
    let img_size = (modules + quiet_zone * 2) * module_size;

    let img = ImageBuffer::from_fn(img_size, img_size, |x, y| {
        let (cx, cy) = (x / module_size, y / module_size);
        if cx < quiet_zone || cy < quiet_zone {
            return Luma([255u8]);
        }
        let (mx, my) = (cx - quiet_zone, cy - quiet_zone);
        if mx >= modules || my >= modules {
            return Luma([255u8]);
        }
        match code[(mx as usize, my as usize)] {
            Color::Dark => Luma([0u8]),
            Color::Light => Luma([255u8]),
        }
    });

    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| CapaError::Channel(format!("PNG encoding failed: {e}")))?;

    Ok(buf.into_inner())
}

/// Pair an account from the terminal. Yields QR payloads as WhatsApp rotates
/// them, and `true` once the session is linked.
pub async fn start_pairing(
    data_dir: &str,
    account_id: u32,
) -> Result<(mpsc::Receiver<String>, mpsc::Receiver<bool>), CapaError> {
    let (qr_tx, qr_rx) = mpsc::channel::<String>(4);
    let (done_tx, done_rx) = mpsc::channel::<bool>(1);

    let db_path = session_db_path(data_dir, account_id);
    let backend = Arc::new(
        SqliteStore::new(&db_path)
            .await
            .map_err(|e| CapaError::Channel(format!("whatsapp store init failed: {e}")))?,
    );

    let mut bot = Bot::builder()
        .with_backend(backend)
        .with_transport_factory(TokioWebSocketTransportFactory::new())
        .with_http_client(UreqHttpClient::new())
        .with_device_props(
            Some("CAPA Bot".to_string()),
            None,
            Some(waproto::whatsapp::device_props::PlatformType::Desktop),
        )
        .on_event(move |event, _client| {
            let qr_tx = qr_tx.clone();
            let done_tx = done_tx.clone();
            async move {
                match event {
                    Event::PairingQrCode { code, .. } => {
                        let _ = qr_tx.send(code).await;
                    }
                    Event::PairSuccess(_) | Event::Connected(_) => {
                        let _ = done_tx.send(true).await;
                    }
                    _ => {}
                }
            }
        })
        .build()
        .await
        .map_err(|e| CapaError::Channel(format!("whatsapp pairing build failed: {e}")))?;

    let _handle = bot
        .run()
        .await
        .map_err(|e| CapaError::Channel(format!("whatsapp pairing run failed: {e}")))?;

    Ok((qr_rx, done_rx))
}
