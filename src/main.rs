use dotenvy::dotenv;
use log::{error, info};
use serenity::prelude::*;

use ticketwarden::config::Config;
use ticketwarden::counter::{JsonFileStorage, TicketCounter};
use ticketwarden::error::BotError;
use ticketwarden::handler::Handler;
use ticketwarden::keepalive;

#[tokio::main]
async fn main() {
    dotenv().ok();
    ticketwarden::init_logging();

    if let Err(e) = run().await {
        error!("🛑 {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), BotError> {
    let config = Config::from_env()?;

    let storage = JsonFileStorage::open(&config.data_dir)?;
    info!("📁 Ticket counter stored at {}", storage.path().display());
    let counter = TicketCounter::new(storage);

    let keepalive = keepalive::start_keepalive_server(config.keepalive_port)?;

    let token = config.token.clone();
    let application_id = config.application_id;
    let mut client = Client::builder(&token, GatewayIntents::GUILDS)
        .application_id(application_id)
        .event_handler(Handler::new(config, counter))
        .await?;
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => result?,
        result = keepalive => {
            result?;
            info!("Keep-alive server stopped, shutting down");
            shard_manager.shutdown_all().await;
        }
    }
    Ok(())
}
