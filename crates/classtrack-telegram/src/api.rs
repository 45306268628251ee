//! Telegram Bot API wire types, limited to the fields this bot reads.

use classtrack_core::Keyboard;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TelegramApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    pub message: Option<TelegramMessage>,
    pub callback_query: Option<TelegramCallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramMessage {
    pub message_id: i64,
    pub from: Option<TelegramUser>,
    pub chat: TelegramChat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramCallbackQuery {
    pub id: String,
    pub from: TelegramUser,
    pub message: Option<TelegramMessage>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

/// An input event the dispatcher understands: a button press or a
/// plain-text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotEvent {
    Callback {
        operator: i64,
        chat_id: i64,
        /// The message carrying the pressed keyboard, edited in place
        /// for the response.
        message_id: i64,
        callback_id: String,
        data: String,
    },
    Text {
        operator: i64,
        chat_id: i64,
        text: String,
    },
}

impl TelegramUpdate {
    /// Convert to a [`BotEvent`]. `None` for updates this bot ignores
    /// (bot messages, media, empty callbacks).
    pub fn to_event(&self) -> Option<BotEvent> {
        if let Some(query) = &self.callback_query {
            let message = query.message.as_ref()?;
            return Some(BotEvent::Callback {
                operator: query.from.id,
                chat_id: message.chat.id,
                message_id: message.message_id,
                callback_id: query.id.clone(),
                data: query.data.clone()?,
            });
        }
        let msg = self.message.as_ref()?;
        let from = msg.from.as_ref()?;
        if from.is_bot {
            return None;
        }
        Some(BotEvent::Text {
            operator: from.id,
            chat_id: msg.chat.id,
            text: msg.text.clone()?,
        })
    }
}

/// Inline keyboard markup in the shape the Bot API expects.
pub fn markup_json(keyboard: &Keyboard) -> serde_json::Value {
    serde_json::json!({
        "inline_keyboard": keyboard
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| serde_json::json!({"text": b.text, "callback_data": b.callback}))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
    })
}
