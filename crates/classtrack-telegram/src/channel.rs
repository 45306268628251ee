//! Telegram Bot channel — long polling + rendering via Bot API.

use std::pin::Pin;
use std::task::{Context, Poll};

use classtrack_core::{ClassTrackError, Render, Result};
use futures::stream::Stream;

use crate::api::{
    markup_json, BotEvent, TelegramApiResponse, TelegramUpdate, TelegramUser,
};

/// Telegram Bot channel with polling loop.
pub struct TelegramChannel {
    bot_token: String,
    poll_interval: u64,
    client: reqwest::Client,
    last_update_id: i64,
}

impl TelegramChannel {
    pub fn new(bot_token: impl Into<String>, poll_interval: u64) -> Self {
        Self {
            bot_token: bot_token.into(),
            poll_interval,
            client: reqwest::Client::new(),
            last_update_id: 0,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{}", self.bot_token, method)
    }

    async fn post(&self, method: &str, body: serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassTrackError::Channel(format!("{method} failed: {e}")))?;

        let result: TelegramApiResponse<serde_json::Value> = response
            .json()
            .await
            .map_err(|e| ClassTrackError::Channel(format!("Invalid {method} response: {e}")))?;

        if !result.ok {
            return Err(ClassTrackError::Channel(format!(
                "{method} rejected: {}",
                result.description.unwrap_or_default()
            )));
        }
        Ok(())
    }

    /// Get updates using long polling.
    pub async fn get_updates(&mut self) -> Result<Vec<TelegramUpdate>> {
        let response = self
            .client
            .get(self.api_url("getUpdates"))
            .query(&[
                ("offset", (self.last_update_id + 1).to_string()),
                ("timeout", "30".into()),
                (
                    "allowed_updates",
                    "[\"message\",\"callback_query\"]".into(),
                ),
            ])
            .send()
            .await
            .map_err(|e| ClassTrackError::Channel(format!("getUpdates failed: {e}")))?;

        let body: TelegramApiResponse<Vec<TelegramUpdate>> = response
            .json()
            .await
            .map_err(|e| ClassTrackError::Channel(format!("Invalid Telegram response: {e}")))?;

        if !body.ok {
            return Err(ClassTrackError::Channel(format!(
                "Telegram API error: {}",
                body.description.unwrap_or_default()
            )));
        }

        let updates = body.result.unwrap_or_default();
        if let Some(last) = updates.last() {
            self.last_update_id = last.update_id;
        }
        Ok(updates)
    }

    /// Send a fresh message with an optional inline keyboard.
    pub async fn send_render(&self, chat_id: i64, render: &Render) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "text": render.text,
        });
        if let Some(keyboard) = &render.keyboard {
            body["reply_markup"] = markup_json(keyboard);
        }
        self.post("sendMessage", body).await
    }

    /// Edit an existing message in place.
    pub async fn edit_render(&self, chat_id: i64, message_id: i64, render: &Render) -> Result<()> {
        let mut body = serde_json::json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": render.text,
        });
        if let Some(keyboard) = &render.keyboard {
            body["reply_markup"] = markup_json(keyboard);
        }
        self.post("editMessageText", body).await
    }

    /// Edit the originating message when there is one, otherwise send a
    /// new message. Edit failures (deleted message, unchanged content)
    /// fall back to sending.
    pub async fn respond(
        &self,
        chat_id: i64,
        message_id: Option<i64>,
        render: &Render,
    ) -> Result<()> {
        if let Some(message_id) = message_id {
            match self.edit_render(chat_id, message_id, render).await {
                Ok(()) => return Ok(()),
                Err(e) => tracing::debug!("Edit fell back to send: {e}"),
            }
        }
        self.send_render(chat_id, render).await
    }

    /// Acknowledge a callback so the client stops its spinner. Failures
    /// are cosmetic and ignored.
    pub async fn answer_callback(&self, callback_id: &str) {
        let body = serde_json::json!({ "callback_query_id": callback_id });
        let _ = self
            .client
            .post(self.api_url("answerCallbackQuery"))
            .json(&body)
            .send()
            .await;
    }

    /// Get bot info.
    pub async fn get_me(&self) -> Result<TelegramUser> {
        let response = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ClassTrackError::Channel(format!("getMe failed: {e}")))?;
        let body: TelegramApiResponse<TelegramUser> = response
            .json()
            .await
            .map_err(|e| ClassTrackError::Channel(format!("Invalid getMe response: {e}")))?;
        body.result
            .ok_or_else(|| ClassTrackError::Channel("No bot info".into()))
    }

    /// Start polling loop — returns a stream of [`BotEvent`]s.
    pub fn start_polling(self) -> BotEventStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut channel = self;
            tracing::info!("Telegram polling loop started");

            loop {
                match channel.get_updates().await {
                    Ok(updates) => {
                        for update in updates {
                            let Some(event) = update.to_event() else {
                                continue;
                            };
                            if tx.send(event).is_err() {
                                tracing::info!("Telegram polling stopped (receiver dropped)");
                                return;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Telegram polling error: {e}");
                        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
                    }
                }

                tokio::time::sleep(tokio::time::Duration::from_secs(channel.poll_interval)).await;
            }
        });

        BotEventStream { rx }
    }
}

/// Stream of incoming bot events from polling.
pub struct BotEventStream {
    rx: tokio::sync::mpsc::UnboundedReceiver<BotEvent>,
}

impl Stream for BotEventStream {
    type Item = BotEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Unpin for BotEventStream {}
