use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dotenvy::dotenv;
use log::{error, info};
use serenity::async_trait;
use serenity::model::prelude::*;
use serenity::prelude::*;
use tokio::sync::Notify;

use ticketwarden::config::RulesConfig;
use ticketwarden::error::BotError;
use ticketwarden::rules;

struct RulesPoster {
    channel_id: ChannelId,
    posted: AtomicBool,
    done: Arc<Notify>,
}

#[async_trait]
impl EventHandler for RulesPoster {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 Logged in as {}", ready.user.tag());
        // a gateway reconnect fires ready again
        if self.posted.swap(true, Ordering::SeqCst) {
            return;
        }
        match rules::post_rules(&ctx, self.channel_id, ready.user.id).await {
            Ok(()) => info!("✅ Messages sent. Exiting."),
            Err(e) => error!("🛑 Failed to send: {}", e),
        }
        self.done.notify_one();
    }
}

/// Posts the rules once and exits.
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
    let config = RulesConfig::from_env()?;
    let done = Arc::new(Notify::new());

    let mut client = Client::builder(&config.token, GatewayIntents::GUILDS)
        .event_handler(RulesPoster {
            channel_id: config.channel_id,
            posted: AtomicBool::new(false),
            done: done.clone(),
        })
        .await?;
    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => result?,
        _ = done.notified() => shard_manager.shutdown_all().await,
    }
    Ok(())
}
