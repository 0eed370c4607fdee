//! Notification transports

pub mod telegram;

pub use telegram::{TelegramChannel, TelegramClient, TelegramPoller};
