//! Demo handlers wired up by the binary.

use telepoll_core::{
    messaging::types::{InlineKeyboardButton, InlineKeyboardMarkup},
    Context, Flow, HandlerRegistry, Result,
};

pub const PING: &str = "menu:ping";
pub const ABOUT: &str = "menu:about";

pub fn register(registry: &mut HandlerRegistry) {
    registry
        .on_command("/start", start)
        .on_command("/help", help)
        .on_command("/echo", echo)
        .on_callback(PING, ping)
        .on_callback(ABOUT, about)
        .on_message(ignore_blank)
        .on_message(echo_text);
}

fn menu() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new().row([
        InlineKeyboardButton::callback("Ping", PING),
        InlineKeyboardButton::callback("About", ABOUT),
    ])
}

async fn start(ctx: Context) -> Result<()> {
    let name = match ctx.first_name() {
        "" => "there",
        n => n,
    };
    ctx.send_text_with_keyboard(&format!("Hi {name}! Pick one:"), &menu())
        .await
}

async fn help(ctx: Context) -> Result<()> {
    ctx.send_text("/start - menu\n/echo <text> - repeat text\n/help - this message")
        .await
}

async fn echo(ctx: Context) -> Result<()> {
    if ctx.args().is_empty() {
        return ctx.send_text("Usage: /echo <text>").await;
    }
    ctx.send_text(&ctx.args().join(" ")).await
}

async fn ping(ctx: Context) -> Result<()> {
    ctx.answer_callback("pong", false).await?;
    if let Some(message_id) = ctx.message_id() {
        ctx.edit_text_with_keyboard(message_id, "pong", &menu())
            .await?;
    }
    Ok(())
}

async fn about(ctx: Context) -> Result<()> {
    ctx.answer_callback("telepoll: a long-polling bot runtime", true)
        .await
}

/// Swallow messages without text (stickers, photos) so the echo below never sends "".
async fn ignore_blank(ctx: Context) -> Result<Flow> {
    Ok(Flow::from(ctx.text().trim().is_empty()))
}

async fn echo_text(ctx: Context) -> Result<Flow> {
    ctx.send_text(ctx.text()).await?;
    Ok(Flow::Consumed)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use telepoll_core::{
        config::DispatchConfig,
        dispatcher::Outcome,
        domain::{ChatId, MessageId, UserId},
        messaging::{
            port::BotApi,
            types::{CallbackQuery, Chat, Message, Update, User},
        },
        Dispatcher,
    };

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<String>>);

    impl Recorder {
        fn log(&self, s: String) -> Result<()> {
            self.0.lock().unwrap().push(s);
            Ok(())
        }

        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.0.lock().unwrap())
        }
    }

    #[async_trait]
    impl BotApi for Recorder {
        async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
            self.log(format!("send {} {text}", chat_id.0))
        }

        async fn send_text_with_keyboard(
            &self,
            chat_id: ChatId,
            text: &str,
            keyboard: &InlineKeyboardMarkup,
        ) -> Result<()> {
            let rows = keyboard.inline_keyboard.len();
            self.log(format!("send_kb {} {text} rows={rows}", chat_id.0))
        }

        async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
            self.log(format!("edit {} {} {text}", chat_id.0, message_id.0))
        }

        async fn edit_text_with_keyboard(
            &self,
            chat_id: ChatId,
            message_id: MessageId,
            text: &str,
            _keyboard: &InlineKeyboardMarkup,
        ) -> Result<()> {
            self.log(format!("edit_kb {} {} {text}", chat_id.0, message_id.0))
        }

        async fn answer_callback(
            &self,
            callback_id: &str,
            text: &str,
            show_alert: bool,
        ) -> Result<()> {
            self.log(format!("answer {callback_id} {text} alert={show_alert}"))
        }

        async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
            self.log(format!("delete {} {}", chat_id.0, message_id.0))
        }
    }

    fn setup() -> (Dispatcher, Arc<Recorder>) {
        let api = Arc::new(Recorder::default());
        let mut registry = HandlerRegistry::new();
        register(&mut registry);
        (
            Dispatcher::new(registry, api.clone(), DispatchConfig::default()),
            api,
        )
    }

    fn message(text: &str) -> Message {
        Message {
            message_id: MessageId(3),
            chat: Chat {
                id: ChatId(8),
                kind: "private".to_string(),
            },
            from: User {
                id: UserId(8),
                first_name: "Grace".to_string(),
                username: "grace".to_string(),
            },
            date: 0,
            text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn start_sends_menu() {
        let (d, api) = setup();
        d.dispatch(&Update::message(1, message("/start"))).await;
        assert_eq!(api.take(), vec!["send_kb 8 Hi Grace! Pick one: rows=1"]);
    }

    #[tokio::test]
    async fn echo_command_and_plain_text() {
        let (d, api) = setup();
        d.dispatch(&Update::message(1, message("/echo a  b"))).await;
        d.dispatch(&Update::message(2, message("/echo"))).await;
        d.dispatch(&Update::message(3, message("just text"))).await;
        assert_eq!(
            api.take(),
            vec![
                "send 8 a b",
                "send 8 Usage: /echo <text>",
                "send 8 just text",
            ]
        );
    }

    #[tokio::test]
    async fn blank_messages_are_swallowed() {
        let (d, api) = setup();
        let out = d.dispatch(&Update::message(1, message("   "))).await;
        assert_eq!(out, Outcome::Message(0));
        assert!(api.take().is_empty());
    }

    #[tokio::test]
    async fn unknown_command_gets_no_reply() {
        let (d, api) = setup();
        assert_eq!(
            d.dispatch(&Update::message(1, message("/nope"))).await,
            Outcome::Unrouted
        );
        assert!(api.take().is_empty());
    }

    #[tokio::test]
    async fn ping_button_answers_and_edits_menu() {
        let (d, api) = setup();
        let query = CallbackQuery {
            id: "q1".to_string(),
            from: message("").from,
            data: PING.to_string(),
            message: Some(message("Hi Grace! Pick one:")),
        };
        d.dispatch(&Update::callback_query(4, query)).await;
        assert_eq!(api.take(), vec!["answer q1 pong alert=false", "edit_kb 8 3 pong"]);
    }
}
