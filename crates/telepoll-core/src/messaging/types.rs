use serde::{Deserialize, Serialize};

use crate::domain::{ChatId, MessageId, UpdateId, UserId};

/// One inbound event from the remote service.
///
/// The wire format carries optional `message` / `callback_query` fields; we collapse them
/// into exactly one [`UpdateKind`]. If a payload ever carries both, the message wins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawUpdate", into = "RawUpdate")]
pub struct Update {
    pub update_id: UpdateId,
    pub kind: UpdateKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum UpdateKind {
    Message(Message),
    CallbackQuery(CallbackQuery),
    /// Any update type we do not route (edited messages, polls, ...).
    Other,
}

impl Update {
    pub fn message(update_id: i64, message: Message) -> Self {
        Self {
            update_id: UpdateId(update_id),
            kind: UpdateKind::Message(message),
        }
    }

    pub fn callback_query(update_id: i64, query: CallbackQuery) -> Self {
        Self {
            update_id: UpdateId(update_id),
            kind: UpdateKind::CallbackQuery(query),
        }
    }

    pub fn other(update_id: i64) -> Self {
        Self {
            update_id: UpdateId(update_id),
            kind: UpdateKind::Other,
        }
    }

    /// Decode one element of a `getUpdates` result.
    ///
    /// Absent fields decode as zero values. An element that still does not fit the model
    /// (a field of the wrong type, say) becomes [`UpdateKind::Other`] so its id can be
    /// acknowledged; only an element without a usable `update_id` yields `None`.
    pub fn from_value(value: serde_json::Value) -> Option<Self> {
        let update_id = value.get("update_id").and_then(serde_json::Value::as_i64);
        match serde_json::from_value::<Update>(value) {
            Ok(update) => Some(update),
            Err(e) => {
                let id = update_id?;
                tracing::warn!(update_id = id, error = %e, "undecodable update, acknowledging as other");
                Some(Self::other(id))
            }
        }
    }

    /// Short label for logs.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            UpdateKind::Message(_) => "message",
            UpdateKind::CallbackQuery(_) => "callback_query",
            UpdateKind::Other => "other",
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct RawUpdate {
    update_id: UpdateId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    callback_query: Option<CallbackQuery>,
}

impl From<RawUpdate> for Update {
    fn from(raw: RawUpdate) -> Self {
        let kind = match (raw.message, raw.callback_query) {
            (Some(m), _) => UpdateKind::Message(m),
            (None, Some(q)) => UpdateKind::CallbackQuery(q),
            (None, None) => UpdateKind::Other,
        };
        Self {
            update_id: raw.update_id,
            kind,
        }
    }
}

impl From<Update> for RawUpdate {
    fn from(u: Update) -> Self {
        let mut raw = RawUpdate {
            update_id: u.update_id,
            ..RawUpdate::default()
        };
        match u.kind {
            UpdateKind::Message(m) => raw.message = Some(m),
            UpdateKind::CallbackQuery(q) => raw.callback_query = Some(q),
            UpdateKind::Other => {}
        }
        raw
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: MessageId,
    #[serde(default)]
    pub chat: Chat,
    #[serde(default)]
    pub from: User,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: ChatId,
    #[serde(default, rename = "type", skip_serializing_if = "String::is_empty")]
    pub kind: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: UserId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub from: User,
    #[serde(default)]
    pub data: String,
    /// Message carrying the inline keyboard. Absent for inline-mode keyboards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

/// Inline keyboard attached to an outgoing message.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: Some(data.into()),
            url: None,
        }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: None,
            url: Some(url.into()),
        }
    }
}

impl InlineKeyboardMarkup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row of buttons.
    pub fn row(mut self, buttons: impl IntoIterator<Item = InlineKeyboardButton>) -> Self {
        self.inline_keyboard.push(buttons.into_iter().collect());
        self
    }
}
