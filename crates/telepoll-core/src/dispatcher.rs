//! Routes one update to at most one handler.
//!
//! Priority, first match wins:
//! 1. a message starting with the command marker goes to the handler registered for its
//!    first whitespace token (unknown commands are dropped unless configured to fall through);
//! 2. any other message walks the generic handlers in order until one consumes it;
//! 3. a callback query goes to the handler registered for its exact data string.

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::{
    config::{DispatchConfig, UnknownCommands},
    messaging::{
        port::BotApi,
        types::{CallbackQuery, Message, Update, UpdateKind},
    },
    registry::{Flow, HandlerRegistry},
    Context,
};

/// How an update was classified, before any handler lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum Route<'a> {
    Command {
        message: &'a Message,
        command: &'a str,
        args: Vec<String>,
    },
    Message(&'a Message),
    Callback(&'a CallbackQuery),
    Ignore,
}

/// What happened to an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Command(String),
    Callback(String),
    /// Consumed by the generic handler at this registration index.
    Message(usize),
    /// No handler took it. Not an error.
    Unrouted,
}

pub struct Dispatcher {
    registry: HandlerRegistry,
    api: Arc<dyn BotApi>,
    cfg: DispatchConfig,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, api: Arc<dyn BotApi>, cfg: DispatchConfig) -> Self {
        Self { registry, api, cfg }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Classify an update. Empty text never counts as a command.
    pub fn classify<'a>(&self, update: &'a Update) -> Route<'a> {
        match &update.kind {
            UpdateKind::Message(message) => {
                if !message.text.starts_with(self.cfg.command_prefix) {
                    return Route::Message(message);
                }
                let mut tokens = message.text.split_whitespace();
                let command = tokens.next().unwrap_or_default();
                Route::Command {
                    message,
                    command,
                    args: tokens.map(str::to_string).collect(),
                }
            }
            UpdateKind::CallbackQuery(query) => Route::Callback(query),
            UpdateKind::Other => Route::Ignore,
        }
    }

    /// Run the matching handler to completion.
    ///
    /// Handler errors are logged and swallowed: the update still counts as acknowledged.
    pub async fn dispatch(&self, update: &Update) -> Outcome {
        let outcome = match self.classify(update) {
            Route::Command {
                message,
                command,
                args,
            } => self.dispatch_command(message, command, args).await,
            Route::Message(message) => self.dispatch_message(message, Vec::new()).await,
            Route::Callback(query) => self.dispatch_callback(query).await,
            Route::Ignore => Outcome::Unrouted,
        };

        if outcome == Outcome::Unrouted {
            trace!(update_id = update.update_id.0, kind = update.kind_name(), "unrouted update");
        }
        outcome
    }

    async fn dispatch_command(
        &self,
        message: &Message,
        command: &str,
        args: Vec<String>,
    ) -> Outcome {
        if self.cfg.debug {
            debug!(chat_id = message.chat.id.0, text = %message.text, "command received");
        }

        let Some(handler) = self.registry.command(command) else {
            return match self.cfg.unknown_commands {
                UnknownCommands::Drop => Outcome::Unrouted,
                UnknownCommands::FallThrough => self.dispatch_message(message, args).await,
            };
        };

        let ctx = Context::for_message(self.api.clone(), message.clone(), args);
        if let Err(e) = handler.handle(ctx).await {
            warn!(%command, chat_id = message.chat.id.0, error = %e, "command handler failed");
        }
        Outcome::Command(command.to_string())
    }

    /// `args` is only non-empty when an unknown command falls through.
    async fn dispatch_message(&self, message: &Message, args: Vec<String>) -> Outcome {
        if self.cfg.debug {
            debug!(chat_id = message.chat.id.0, text = %message.text, "message received");
        }

        for (index, handler) in self.registry.message_handlers().iter().enumerate() {
            let ctx = Context::for_message(self.api.clone(), message.clone(), args.clone());
            match handler.handle(ctx).await {
                Ok(Flow::Consumed) => return Outcome::Message(index),
                Ok(Flow::NotConsumed) => continue,
                Err(e) => {
                    // A failing handler already acted on the message; do not offer it again.
                    warn!(index, chat_id = message.chat.id.0, error = %e, "message handler failed");
                    return Outcome::Message(index);
                }
            }
        }
        Outcome::Unrouted
    }

    async fn dispatch_callback(&self, query: &CallbackQuery) -> Outcome {
        let chat_id = query.message.as_ref().map(|m| m.chat.id.0);
        if self.cfg.debug {
            debug!(?chat_id, data = %query.data, "callback received");
        }

        let Some(handler) = self.registry.callback(&query.data) else {
            return Outcome::Unrouted;
        };

        let ctx = Context::for_callback(self.api.clone(), query.clone());
        if let Err(e) = handler.handle(ctx).await {
            warn!(data = %query.data, ?chat_id, error = %e, "callback handler failed");
        }
        Outcome::Callback(query.data.clone())
    }
}
