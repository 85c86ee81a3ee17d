//! Telegram Bot API adapter (reqwest).
//!
//! This crate implements the `telepoll-core` ports over plain HTTPS:
//! [`UpdateSource`] via `getUpdates` and [`BotApi`] via the message mutation methods.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

use telepoll_core::{
    config::TelegramConfig,
    domain::{ChatId, MessageId},
    errors::Error,
    messaging::{
        port::{BotApi, UpdateSource},
        types::{InlineKeyboardMarkup, Update},
    },
    Result,
};

/// Envelope every Bot API reply is wrapped in.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<u16>,
}

#[derive(Clone, Debug)]
pub struct TelegramClient {
    http: reqwest::Client,
    bot_url: String,
    long_poll_secs: u64,
}

impl TelegramClient {
    pub fn new(cfg: &TelegramConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .build()
            .map_err(|e| Error::Config(format!("http client build failed: {e}")))?;
        Ok(Self {
            http,
            bot_url: cfg.bot_url(),
            long_poll_secs: cfg.long_poll.as_secs(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{method}", self.bot_url)
    }

    fn map_err(method: &str, e: reqwest::Error) -> Error {
        // Strip the URL: it contains the bot token.
        let e = e.without_url();
        if e.is_decode() {
            Error::Decode(format!("{method}: {e}"))
        } else {
            Error::Transport(format!("{method}: {e}"))
        }
    }

    /// Send a prepared request and unwrap the API envelope.
    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<T> {
        let resp = req.send().await.map_err(|e| Self::map_err(method, e))?;
        let status = resp.status();
        let body = resp.text().await.map_err(|e| Self::map_err(method, e))?;

        let parsed: ApiResponse<T> = match serde_json::from_str(&body) {
            Ok(v) => v,
            Err(e) if status.is_success() => {
                return Err(Error::Decode(format!("{method}: {e}")));
            }
            Err(_) => {
                return Err(Error::Api {
                    method: method.to_string(),
                    status: status.as_u16(),
                    description: body.chars().take(200).collect(),
                });
            }
        };

        if !status.is_success() || !parsed.ok {
            tracing::debug!(
                method,
                status = status.as_u16(),
                description = parsed.description.as_deref().unwrap_or(""),
                "bot api call rejected"
            );
            return Err(Error::Api {
                method: method.to_string(),
                status: parsed.error_code.unwrap_or(status.as_u16()),
                description: parsed.description.unwrap_or_default(),
            });
        }

        parsed
            .result
            .ok_or_else(|| Error::Decode(format!("{method}: reply has no result")))
    }

    async fn post(&self, method: &str, body: serde_json::Value) -> Result<()> {
        let req = self.http.post(self.endpoint(method)).json(&body);
        self.call::<serde::de::IgnoredAny>(method, req).await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn fetch(&self, offset: i64) -> Result<Vec<Update>> {
        let mut query = vec![("offset", offset.to_string())];
        if self.long_poll_secs > 0 {
            query.push(("timeout", self.long_poll_secs.to_string()));
        }
        tracing::trace!(offset, long_poll_secs = self.long_poll_secs, "getUpdates");
        let req = self.http.get(self.endpoint("getUpdates")).query(&query);
        // Decoded per element so one odd update cannot wedge the whole batch.
        let raw: Vec<serde_json::Value> = self.call("getUpdates", req).await?;
        let total = raw.len();
        let updates: Vec<Update> = raw.into_iter().filter_map(Update::from_value).collect();
        if updates.len() < total {
            tracing::warn!(
                dropped = total - updates.len(),
                "getUpdates returned elements without an update_id"
            );
        }
        Ok(updates)
    }
}

#[async_trait]
impl BotApi for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.post("sendMessage", json!({ "chat_id": chat_id, "text": text }))
            .await
    }

    async fn send_text_with_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<()> {
        self.post(
            "sendMessage",
            json!({ "chat_id": chat_id, "text": text, "reply_markup": keyboard }),
        )
        .await
    }

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
        self.post(
            "editMessageText",
            json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
        )
        .await
    }

    async fn edit_text_with_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<()> {
        self.post(
            "editMessageText",
            json!({
                "chat_id": chat_id,
                "message_id": message_id,
                "text": text,
                "reply_markup": keyboard,
            }),
        )
        .await
    }

    async fn answer_callback(&self, callback_id: &str, text: &str, show_alert: bool) -> Result<()> {
        let mut body = json!({ "callback_query_id": callback_id });
        if !text.is_empty() {
            body["text"] = json!(text);
        }
        if show_alert {
            body["show_alert"] = json!(true);
        }
        self.post("answerCallbackQuery", body).await
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.post(
            "deleteMessage",
            json!({ "chat_id": chat_id, "message_id": message_id }),
        )
        .await
    }
}
