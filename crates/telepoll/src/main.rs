use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use telepoll_core::{config::Config, Dispatcher, HandlerRegistry, Poller};
use telepoll_telegram::TelegramClient;

mod handlers;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telepoll_core::logging::init("telepoll")?;

    let cfg = Config::load()?;
    let client = Arc::new(TelegramClient::new(&cfg.telegram)?);

    let mut registry = HandlerRegistry::new();
    handlers::register(&mut registry);
    info!(?registry, "handlers registered");

    let dispatcher = Dispatcher::new(registry, client.clone(), cfg.dispatch);
    let poller = Poller::new(client, dispatcher, cfg.poller);

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown requested");
                cancel.cancel();
            }
        });
    }

    poller.run_until(cancel).await;
    Ok(())
}
