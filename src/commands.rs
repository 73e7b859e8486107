use log::{error, info};
use serenity::all::{ChannelType, CommandOptionType, Permissions};
use serenity::builder::{CreateCommand, CreateCommandOption};
use serenity::http::Http;
use serenity::model::prelude::*;

pub const TICKET_PANEL_COMMAND: &str = "ticket-panel";
pub const PANEL_CHANNEL_OPTION: &str = "channel";
pub const PANEL_PARENT_OPTION: &str = "tickets_parent";

pub fn ticket_panel_command() -> CreateCommand {
    CreateCommand::new(TICKET_PANEL_COMMAND)
        .description("Post a Ticket Tool–style panel to create tickets")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Channel,
                PANEL_CHANNEL_OPTION,
                "Channel to post the panel",
            )
            .channel_types(vec![ChannelType::Text, ChannelType::News])
            .required(true),
        )
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::Channel,
                PANEL_PARENT_OPTION,
                "Category where ticket channels will be created",
            )
            .channel_types(vec![ChannelType::Category]),
        )
        .default_member_permissions(Permissions::ADMINISTRATOR)
}

pub fn commands() -> Vec<CreateCommand> {
    vec![ticket_panel_command()]
}

/// Overwrites the guild's command set. Re-running replaces the previous definitions.
pub async fn register_commands(http: &Http, guild_id: GuildId) -> Result<(), serenity::Error> {
    let registered = guild_id.set_commands(http, commands()).await?;
    info!(
        "✅ Slash commands registered for guild {}: {}",
        guild_id,
        registered
            .iter()
            .map(|c| c.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

/// Startup registration: a failure is logged and the bot keeps serving what is already registered.
pub async fn register_or_log(http: &Http, guild_id: GuildId) {
    if let Err(e) = register_commands(http, guild_id).await {
        error!("🛑 Failed to register commands: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticket_panel_definition() {
        let json = serde_json::to_value(ticket_panel_command()).unwrap();
        assert_eq!(json["name"], "ticket-panel");

        let options = json["options"].as_array().unwrap();
        assert_eq!(options.len(), 2);
        assert_eq!(options[0]["name"], PANEL_CHANNEL_OPTION);
        assert_eq!(options[0]["required"], true);
        assert_eq!(options[0]["channel_types"], serde_json::json!([0, 5]));
        assert_eq!(options[1]["name"], PANEL_PARENT_OPTION);
        assert_eq!(options[1]["channel_types"], serde_json::json!([4]));
        assert_ne!(options[1]["required"], true);
    }

    #[test]
    fn test_only_the_panel_command_is_registered() {
        assert_eq!(commands().len(), 1);
    }
}
