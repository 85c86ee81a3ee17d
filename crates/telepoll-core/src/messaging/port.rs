use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId},
    messaging::types::{InlineKeyboardMarkup, Update},
    Result,
};

/// Pull-side port: where the event loop gets its updates from.
///
/// Implementations must return updates with `update_id >= offset` in ascending order.
/// A transport or decode failure must surface as `Err`, never as an empty batch.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn fetch(&self, offset: i64) -> Result<Vec<Update>>;
}

/// Outbound port used by handlers through the dispatch context.
///
/// Every call is a single request; a non-success reply surfaces as `Error::Api` and is
/// never retried here.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    async fn send_text_with_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<()>;

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()>;

    async fn edit_text_with_keyboard(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: &InlineKeyboardMarkup,
    ) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str, text: &str, show_alert: bool)
        -> Result<()>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()>;
}
