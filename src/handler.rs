use log::{debug, error, info};
use serenity::all::{CommandInteraction, ComponentInteraction};
use serenity::builder::{
    CreateInteractionResponse, CreateInteractionResponseMessage, EditInteractionResponse,
};
use serenity::model::prelude::*;
use serenity::prelude::*;

use crate::commands;
use crate::config::Config;
use crate::counter::TicketCounter;
use crate::error::BotError;
use crate::guild::DiscordGuild;
use crate::panel;
use crate::payload::ButtonPayload;
use crate::ticket::{self, CloseOutcome, TicketGuild, TicketRequest};

pub const GUILD_ONLY_REPLY: &str = "🛑 This can only be used in a server!";
pub const FALLBACK_REPLY: &str = "Something went wrong handling that interaction.";
pub const CLOSING_REPLY: &str = "Closing ticket…";

pub struct Handler {
    pub config: Config,
    pub counter: TicketCounter,
}

/// The ephemeral reply owed to whoever triggered an interaction.
#[serenity::async_trait]
pub trait InteractionReply: Send + Sync {
    async fn reply_ephemeral(&self, content: &str) -> Result<(), serenity::Error>;

    async fn edit(&self, content: &str) -> Result<(), serenity::Error>;
}

/// Last resort after a handler failed. The interaction may or may not have been
/// acknowledged already, so try a fresh reply first and an edit second.
pub async fn apologize<R: InteractionReply + ?Sized>(reply: &R) {
    if reply.reply_ephemeral(FALLBACK_REPLY).await.is_err() {
        if let Err(e) = reply.edit(FALLBACK_REPLY).await {
            debug!("Could not apologize either: {}", e);
        }
    }
}

/// Tells the closer the ticket is being closed, closes it, then edits in the result when
/// the channel did not go away.
pub async fn close_and_report<R, G>(
    reply: &R,
    guild: &G,
    channel_id: ChannelId,
    everyone: RoleId,
) -> Result<CloseOutcome, serenity::Error>
where
    R: InteractionReply + ?Sized,
    G: TicketGuild + ?Sized,
{
    reply.edit(CLOSING_REPLY).await?;
    let outcome = ticket::close_ticket(guild, channel_id, everyone).await;
    if let Some(message) = outcome.reply() {
        reply.edit(message).await?;
    }
    Ok(outcome)
}

#[derive(Clone, Copy)]
enum Interacted<'a> {
    Command(&'a CommandInteraction),
    Component(&'a ComponentInteraction),
}

/// An interaction that still owes the user a response.
#[derive(Clone, Copy)]
struct Pending<'a> {
    ctx: &'a Context,
    interaction: Interacted<'a>,
}

impl<'a> Pending<'a> {
    fn command(ctx: &'a Context, command: &'a CommandInteraction) -> Self {
        Self {
            ctx,
            interaction: Interacted::Command(command),
        }
    }

    fn component(ctx: &'a Context, component: &'a ComponentInteraction) -> Self {
        Self {
            ctx,
            interaction: Interacted::Component(component),
        }
    }

    async fn respond(&self, response: CreateInteractionResponse) -> Result<(), serenity::Error> {
        let http = &self.ctx.http;
        match self.interaction {
            Interacted::Command(command) => command.create_response(http, response).await,
            Interacted::Component(component) => component.create_response(http, response).await,
        }
    }
}

#[serenity::async_trait]
impl InteractionReply for Pending<'_> {
    async fn reply_ephemeral(&self, content: &str) -> Result<(), serenity::Error> {
        self.respond(CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(content)
                .ephemeral(true),
        ))
        .await
    }

    async fn edit(&self, content: &str) -> Result<(), serenity::Error> {
        let http = &self.ctx.http;
        let builder = EditInteractionResponse::new().content(content);
        match self.interaction {
            Interacted::Command(command) => command.edit_response(http, builder).await?,
            Interacted::Component(component) => component.edit_response(http, builder).await?,
        };
        Ok(())
    }
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🤖 Logged in as {}", ready.user.tag());
        commands::register_or_log(&ctx.http, self.config.guild_id).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                if command.data.name != commands::TICKET_PANEL_COMMAND {
                    return;
                }
                if let Err(e) = self.on_ticket_panel(&ctx, &command).await {
                    error!("🛑 /{} failed: {}", command.data.name, e);
                    apologize(&Pending::command(&ctx, &command)).await;
                }
            }
            Interaction::Component(component) => {
                let Some(payload) = ButtonPayload::decode(&component.data.custom_id) else {
                    debug!("Ignoring component {:?}", component.data.custom_id);
                    return;
                };
                if let Err(e) = self.on_button(&ctx, &component, payload).await {
                    error!("🛑 Button {:?} failed: {}", payload, e);
                    apologize(&Pending::component(&ctx, &component)).await;
                }
            }
            _ => {}
        }
    }
}

impl Handler {
    pub fn new(config: Config, counter: TicketCounter) -> Self {
        Self { config, counter }
    }

    async fn on_ticket_panel(&self, ctx: &Context, command: &CommandInteraction) -> Result<(), BotError> {
        if command.guild_id.is_none() {
            Pending::command(ctx, command).reply_ephemeral(GUILD_ONLY_REPLY).await?;
            return Ok(());
        }
        panel::post_panel(ctx, command).await
    }

    async fn on_button(
        &self,
        ctx: &Context,
        component: &ComponentInteraction,
        payload: ButtonPayload,
    ) -> Result<(), BotError> {
        let pending = Pending::component(ctx, component);
        let Some(guild_id) = component.guild_id else {
            pending.reply_ephemeral(GUILD_ONLY_REPLY).await?;
            return Ok(());
        };

        // acknowledge within Discord's deadline, the real answer comes as an edit
        pending
            .respond(CreateInteractionResponse::Defer(
                CreateInteractionResponseMessage::new().ephemeral(true),
            ))
            .await?;

        let guild = DiscordGuild::new(ctx, guild_id);
        let everyone = ticket::everyone_role(guild_id);

        match payload {
            ButtonPayload::Create { parent_id } => {
                let request = TicketRequest {
                    opener: component.user.id,
                    opener_tag: component.user.tag(),
                    parent: parent_id,
                    everyone,
                    support_role: self.config.support_role,
                };
                let report = ticket::open_ticket(&guild, &self.counter, &request).await?;
                pending.edit(&report.reply()).await?;
            }
            ButtonPayload::Close {
                channel_id,
                opener_id,
            } => {
                info!(
                    "📁 {} is closing ticket channel {} opened by {}",
                    component.user.id, channel_id, opener_id
                );
                close_and_report(&pending, &guild, channel_id, everyone).await?;
            }
        }
        Ok(())
    }
}
