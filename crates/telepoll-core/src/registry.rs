use std::{collections::HashMap, fmt, future::Future, sync::Arc};

use async_trait::async_trait;

use crate::{Context, Result};

/// Result of offering a message to a generic handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// The handler took the message; no later handler sees it.
    Consumed,
    /// Offer the message to the next handler.
    NotConsumed,
}

impl From<bool> for Flow {
    fn from(consumed: bool) -> Self {
        if consumed {
            Flow::Consumed
        } else {
            Flow::NotConsumed
        }
    }
}

/// Handler for an exact command or callback-data key.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: Context) -> Result<()>;
}

/// Link in the generic message chain.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, ctx: Context) -> Result<Flow>;
}

#[async_trait]
impl<F, Fut> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    async fn handle(&self, ctx: Context) -> Result<()> {
        (self)(ctx).await
    }
}

#[async_trait]
impl<F, Fut> MessageHandler for F
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Flow>> + Send + 'static,
{
    async fn handle(&self, ctx: Context) -> Result<Flow> {
        (self)(ctx).await
    }
}

/// Lookup tables the dispatcher routes through.
///
/// Registration takes `&mut self` and dispatch only needs `&self`, so the borrow checker
/// keeps registration from racing with dispatch. Once the registry is moved into a
/// [`Poller`](crate::Poller) it is frozen.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    commands: HashMap<String, Arc<dyn Handler>>,
    callbacks: HashMap<String, Arc<dyn Handler>>,
    messages: Vec<Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command handler under its full token, marker included (`"/start"`).
    /// Replaces any handler previously registered under the same key.
    pub fn on_command(
        &mut self,
        command: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> &mut Self {
        let command = command.into();
        if self
            .commands
            .insert(command.clone(), Arc::new(handler))
            .is_some()
        {
            tracing::debug!(%command, "replaced command handler");
        }
        self
    }

    /// Register a handler for an exact callback-data string. Replaces on duplicate key.
    pub fn on_callback(
        &mut self,
        data: impl Into<String>,
        handler: impl Handler + 'static,
    ) -> &mut Self {
        let data = data.into();
        if self
            .callbacks
            .insert(data.clone(), Arc::new(handler))
            .is_some()
        {
            tracing::debug!(%data, "replaced callback handler");
        }
        self
    }

    /// Append a generic message handler. Handlers are tried in registration order.
    pub fn on_message(&mut self, handler: impl MessageHandler + 'static) -> &mut Self {
        self.messages.push(Arc::new(handler));
        self
    }

    pub fn command(&self, command: &str) -> Option<&Arc<dyn Handler>> {
        self.commands.get(command)
    }

    pub fn callback(&self, data: &str) -> Option<&Arc<dyn Handler>> {
        self.callbacks.get(data)
    }

    pub fn message_handlers(&self) -> &[Arc<dyn MessageHandler>] {
        &self.messages
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut commands: Vec<&String> = self.commands.keys().collect();
        commands.sort();
        let mut callbacks: Vec<&String> = self.callbacks.keys().collect();
        callbacks.sort();
        f.debug_struct("HandlerRegistry")
            .field("commands", &commands)
            .field("callbacks", &callbacks)
            .field("message_handlers", &self.messages.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::context::testing::{text_message, RecordingApi};

    fn ctx() -> Context {
        Context::for_message(
            Arc::new(RecordingApi::default()),
            text_message(1, 1, "x"),
            vec![],
        )
    }

    #[tokio::test]
    async fn duplicate_command_replaces_previous_handler() {
        let hits = Arc::new(AtomicUsize::new(0));
        let mut reg = HandlerRegistry::new();
        reg.on_command("/start", |_ctx: Context| async { Ok(()) });
        let h = hits.clone();
        reg.on_command("/start", move |_ctx: Context| {
            let h = h.clone();
            async move {
                h.fetch_add(10, Ordering::SeqCst);
                Ok(())
            }
        });

        reg.command("/start").unwrap().handle(ctx()).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert!(reg.command("start").is_none());
    }

    #[tokio::test]
    async fn message_handlers_keep_registration_order() {
        let mut reg = HandlerRegistry::new();
        reg.on_message(|_ctx: Context| async { Ok(Flow::NotConsumed) })
            .on_message(|_ctx: Context| async { Ok(Flow::Consumed) });

        let flows = {
            let mut out = Vec::new();
            for h in reg.message_handlers() {
                out.push(h.handle(ctx()).await.unwrap());
            }
            out
        };
        assert_eq!(flows, vec![Flow::NotConsumed, Flow::Consumed]);
    }

    #[test]
    fn callbacks_and_commands_are_separate_namespaces() {
        let mut reg = HandlerRegistry::new();
        reg.on_callback("/start", |_ctx: Context| async { Ok(()) });
        assert!(reg.command("/start").is_none());
        assert!(reg.callback("/start").is_some());
        assert_eq!(
            format!("{reg:?}"),
            r#"HandlerRegistry { commands: [], callbacks: ["/start"], message_handlers: 0 }"#
        );
    }

    #[test]
    fn flow_from_bool() {
        assert_eq!(Flow::from(true), Flow::Consumed);
        assert_eq!(Flow::from(false), Flow::NotConsumed);
    }
}
