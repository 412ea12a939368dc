//! # capa-channels
//!
//! WhatsApp accounts that deliver reminders and answer chat commands, and the
//! Telegram chat that receives operational logs and pairing QR codes.

pub mod telegram;
pub mod utils;
pub mod whatsapp;
