use log::info;
use serenity::all::{ButtonStyle, CommandDataOption, CommandDataOptionValue, CommandInteraction};
use serenity::builder::{
    CreateActionRow, CreateButton, CreateEmbed, CreateInteractionResponse,
    CreateInteractionResponseMessage, CreateMessage,
};
use serenity::model::prelude::*;
use serenity::prelude::*;

use crate::error::BotError;
use crate::payload::ButtonPayload;

pub const PANEL_COLOR: u32 = 0xfefa1c;
pub const PANEL_TITLE: &str = "Support Tickets";
pub const PANEL_DESCRIPTION: &str = "To create a Report click the button 📩";

/// Options of one `/ticket-panel` invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelRequest {
    pub channel: ChannelId,
    pub tickets_parent: Option<ChannelId>,
}

impl PanelRequest {
    pub fn from_options(options: &[CommandDataOption]) -> Option<Self> {
        let channel_option = |name: &str| {
            options
                .iter()
                .find(|opt| opt.name == name)
                .and_then(|opt| match &opt.value {
                    CommandDataOptionValue::Channel(id) => Some(*id),
                    _ => None,
                })
        };
        Some(Self {
            channel: channel_option(crate::commands::PANEL_CHANNEL_OPTION)?,
            tickets_parent: channel_option(crate::commands::PANEL_PARENT_OPTION),
        })
    }
}

pub fn create_button(parent_id: Option<ChannelId>) -> CreateButton {
    CreateButton::new(ButtonPayload::Create { parent_id }.encode())
        .label("Create Report")
        .emoji('📩')
        .style(ButtonStyle::Primary)
}

pub fn close_button(channel_id: ChannelId, opener_id: UserId) -> CreateButton {
    CreateButton::new(
        ButtonPayload::Close {
            channel_id,
            opener_id,
        }
        .encode(),
    )
    .label("Close")
    .emoji('🔒')
    .style(ButtonStyle::Secondary)
}

pub fn panel_message(parent_id: Option<ChannelId>) -> CreateMessage {
    let embed = CreateEmbed::new()
        .title(PANEL_TITLE)
        .description(PANEL_DESCRIPTION)
        .color(PANEL_COLOR);
    CreateMessage::new()
        .embed(embed)
        .components(vec![CreateActionRow::Buttons(vec![create_button(parent_id)])])
}

pub fn welcome_text(opener: UserId) -> String {
    format!(
        "**Welcome <@{}>**\nSupport will be with you shortly.\nTo close this ticket click **🔒 Close**.",
        opener
    )
}

pub fn welcome_message(channel_id: ChannelId, opener: UserId) -> CreateMessage {
    let embed = CreateEmbed::new()
        .description(welcome_text(opener))
        .color(PANEL_COLOR);
    CreateMessage::new()
        .content(format!("<@{}>", opener))
        .embed(embed)
        .components(vec![CreateActionRow::Buttons(vec![close_button(channel_id, opener)])])
}

/// Posts the panel where the admin asked and confirms privately.
pub async fn post_panel(ctx: &Context, command: &CommandInteraction) -> Result<(), BotError> {
    let Some(request) = PanelRequest::from_options(&command.data.options) else {
        command
            .create_response(
                &ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .content("🛑 Please pick a channel for the panel.")
                        .ephemeral(true),
                ),
            )
            .await?;
        return Ok(());
    };

    request
        .channel
        .send_message(&ctx.http, panel_message(request.tickets_parent))
        .await?;
    info!(
        "📌 Ticket panel posted in {} (parent: {:?}) by {}",
        request.channel, request.tickets_parent, command.user.id
    );

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(format!("Panel posted in <#{}>", request.channel))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_option(name: &str, id: u64) -> CommandDataOption {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "type": 7,
            "value": id.to_string(),
        }))
        .unwrap()
    }

    #[test]
    fn test_panel_request_reads_both_channels() {
        let options = vec![
            channel_option("channel", 1),
            channel_option("tickets_parent", 2),
        ];
        assert_eq!(
            PanelRequest::from_options(&options),
            Some(PanelRequest {
                channel: ChannelId::new(1),
                tickets_parent: Some(ChannelId::new(2)),
            })
        );
    }

    #[test]
    fn test_panel_request_parent_is_optional() {
        let options = vec![channel_option("channel", 1)];
        assert_eq!(
            PanelRequest::from_options(&options),
            Some(PanelRequest {
                channel: ChannelId::new(1),
                tickets_parent: None,
            })
        );
    }

    #[test]
    fn test_panel_request_needs_channel() {
        let options = vec![channel_option("tickets_parent", 2)];
        assert_eq!(PanelRequest::from_options(&options), None);
    }

    #[test]
    fn test_welcome_mentions_opener() {
        let text = welcome_text(UserId::new(42));
        assert!(text.starts_with("**Welcome <@42>**"));
        assert!(text.contains("🔒 Close"));
    }
}
