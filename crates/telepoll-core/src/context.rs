use std::{fmt, sync::Arc};

use crate::{
    domain::{ChatId, MessageId, UserId},
    errors::Error,
    messaging::{
        port::BotApi,
        types::{CallbackQuery, InlineKeyboardMarkup, Message, User},
    },
    Result,
};

/// Everything a handler gets for one invocation.
///
/// Built fresh by the dispatcher for every handler call and dropped when the handler
/// returns. The chat id is `None` only for callback queries that do not reference a message
/// (inline-mode keyboards); chat-bound shortcuts then fail with [`Error::NoChat`].
#[derive(Clone)]
pub struct Context {
    api: Arc<dyn BotApi>,
    chat_id: Option<ChatId>,
    message: Option<Message>,
    callback_query: Option<CallbackQuery>,
    args: Vec<String>,
}

impl Context {
    pub(crate) fn for_message(api: Arc<dyn BotApi>, message: Message, args: Vec<String>) -> Self {
        Self {
            api,
            chat_id: Some(message.chat.id),
            message: Some(message),
            callback_query: None,
            args,
        }
    }

    pub(crate) fn for_callback(api: Arc<dyn BotApi>, query: CallbackQuery) -> Self {
        let message = query.message.clone();
        Self {
            api,
            chat_id: message.as_ref().map(|m| m.chat.id),
            message,
            callback_query: Some(query),
            args: Vec::new(),
        }
    }

    /// Back-reference to the bot's outbound API.
    pub fn api(&self) -> &Arc<dyn BotApi> {
        &self.api
    }

    pub fn chat_id(&self) -> Option<ChatId> {
        self.chat_id
    }

    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    pub fn callback_query(&self) -> Option<&CallbackQuery> {
        self.callback_query.as_ref()
    }

    /// Whitespace-separated tokens after the command (empty for non-commands).
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Message text, or `""` when there is no message.
    pub fn text(&self) -> &str {
        self.message.as_ref().map(|m| m.text.as_str()).unwrap_or("")
    }

    pub fn user_name(&self) -> &str {
        self.sender().map(|u| u.username.as_str()).unwrap_or("")
    }

    pub fn first_name(&self) -> &str {
        self.sender().map(|u| u.first_name.as_str()).unwrap_or("")
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.sender().map(|u| u.id)
    }

    /// Id of the triggering message, or of the message carrying the pressed keyboard.
    pub fn message_id(&self) -> Option<MessageId> {
        self.message.as_ref().map(|m| m.message_id)
    }

    // For callbacks the message is the bot's own keyboard message, so the
    // sender is taken from the query rather than from the message.
    fn sender(&self) -> Option<&User> {
        match (&self.callback_query, &self.message) {
            (Some(q), _) => Some(&q.from),
            (None, Some(m)) => Some(&m.from),
            (None, None) => None,
        }
    }

    fn require_chat(&self) -> Result<ChatId> {
        self.chat_id.ok_or(Error::NoChat)
    }

    pub async fn send_text(&self, text: &str) -> Result<()> {
        self.api.send_text(self.require_chat()?, text).await
    }

    pub async fn send_text_with_keyboard(
        &self,
        text: &str,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<()> {
        self.api
            .send_text_with_keyboard(self.require_chat()?, text, keyboard)
            .await
    }

    pub async fn edit_text(&self, message_id: MessageId, text: &str) -> Result<()> {
        self.api
            .edit_text(self.require_chat()?, message_id, text)
            .await
    }

    pub async fn edit_text_with_keyboard(
        &self,
        message_id: MessageId,
        text: &str,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<()> {
        self.api
            .edit_text_with_keyboard(self.require_chat()?, message_id, text, keyboard)
            .await
    }

    pub async fn delete_message(&self, message_id: MessageId) -> Result<()> {
        self.api
            .delete_message(self.require_chat()?, message_id)
            .await
    }

    pub async fn answer_callback(&self, text: &str, show_alert: bool) -> Result<()> {
        let query = self.callback_query.as_ref().ok_or(Error::NoCallback)?;
        self.api.answer_callback(&query.id, text, show_alert).await
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("chat_id", &self.chat_id)
            .field("message", &self.message)
            .field("callback_query", &self.callback_query)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}
