use dotenvy::dotenv;
use log::error;
use serenity::http::Http;

use ticketwarden::commands;
use ticketwarden::config::Config;

/// Publishes the guild slash commands without starting the bot.
#[tokio::main]
async fn main() {
    dotenv().ok();
    ticketwarden::init_logging();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("🛑 {}", e);
            std::process::exit(1);
        }
    };

    let http = Http::new(&config.token);
    http.set_application_id(config.application_id);

    if let Err(e) = commands::register_commands(&http, config.guild_id).await {
        error!("🛑 Failed to register commands: {}", e);
        std::process::exit(1);
    }
}
