//! Telegram Bot API transport

mod api;
mod channel;
mod poller;

pub use api::{TelegramClient, TelegramError, TelegramResult};
pub use channel::TelegramChannel;
pub use poller::TelegramPoller;
