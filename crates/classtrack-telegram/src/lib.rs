//! # ClassTrack Telegram
//! Thin Telegram Bot API layer: long polling turned into a stream of
//! [`BotEvent`]s, and engine [`Render`](classtrack_core::Render)s put
//! back on the wire as edited-in-place messages with inline keyboards.

pub mod api;
pub mod channel;

pub use api::{markup_json, BotEvent, TelegramUpdate, TelegramUser};
pub use channel::{BotEventStream, TelegramChannel};
