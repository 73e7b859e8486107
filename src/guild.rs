use serenity::async_trait;
use serenity::builder::{CreateChannel, EditChannel};
use serenity::model::Permissions;
use serenity::model::prelude::*;
use serenity::prelude::*;

use crate::error::PlatformError;
use crate::panel;
use crate::ticket::{TicketChannel, TicketGuild};

/// [`TicketGuild`] backed by the live gateway context.
pub struct DiscordGuild<'a> {
    ctx: &'a Context,
    guild_id: GuildId,
}

impl<'a> DiscordGuild<'a> {
    pub fn new(ctx: &'a Context, guild_id: GuildId) -> Self {
        Self { ctx, guild_id }
    }

    async fn guild_channel(&self, channel_id: ChannelId) -> Result<GuildChannel, PlatformError> {
        match channel_id.to_channel(self.ctx).await?.guild() {
            Some(channel) if channel.guild_id == self.guild_id => Ok(channel),
            _ => Err(PlatformError::NotFound),
        }
    }
}

#[async_trait]
impl TicketGuild for DiscordGuild<'_> {
    async fn channel_kind(&self, channel_id: ChannelId) -> Result<ChannelType, PlatformError> {
        Ok(self.guild_channel(channel_id).await?.kind)
    }

    async fn bot_permissions(&self, parent: Option<ChannelId>) -> Result<Permissions, PlatformError> {
        let bot_id = self.ctx.cache.current_user().id;
        let member = self.guild_id.member(self.ctx, bot_id).await?;
        let parent = match parent {
            Some(parent_id) => Some(self.guild_channel(parent_id).await?),
            None => None,
        };

        let guild = self
            .ctx
            .cache
            .guild(self.guild_id)
            .ok_or(PlatformError::NotFound)?;
        let permissions = match &parent {
            Some(channel) => guild.user_permissions_in(channel, &member),
            None => guild.member_permissions(&member),
        };
        Ok(permissions)
    }

    async fn create_ticket_channel(&self, channel: &TicketChannel) -> Result<ChannelId, PlatformError> {
        let mut create_channel = CreateChannel::new(channel.name.clone())
            .kind(ChannelType::Text)
            .topic(channel.topic.clone())
            .permissions(channel.overwrites.clone());
        if let Some(parent) = channel.parent {
            create_channel = create_channel.category(parent);
        }
        let new_channel = self.guild_id.create_channel(&self.ctx.http, create_channel).await?;
        Ok(new_channel.id)
    }

    async fn post_welcome(&self, channel_id: ChannelId, opener: UserId) -> Result<(), PlatformError> {
        channel_id
            .send_message(&self.ctx.http, panel::welcome_message(channel_id, opener))
            .await?;
        Ok(())
    }

    async fn channel_name(&self, channel_id: ChannelId) -> Result<String, PlatformError> {
        Ok(self.guild_channel(channel_id).await?.name)
    }

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), PlatformError> {
        channel_id.delete(&self.ctx.http).await?;
        Ok(())
    }

    async fn hide_from_role(&self, channel_id: ChannelId, role: RoleId) -> Result<(), PlatformError> {
        let overwrite = PermissionOverwrite {
            kind: PermissionOverwriteType::Role(role),
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
        };
        channel_id.create_permission(&self.ctx.http, overwrite).await?;
        Ok(())
    }

    async fn rename_channel(&self, channel_id: ChannelId, name: &str) -> Result<(), PlatformError> {
        channel_id
            .edit(&self.ctx.http, EditChannel::new().name(name))
            .await?;
        Ok(())
    }

    async fn say(&self, channel_id: ChannelId, content: &str) -> Result<(), PlatformError> {
        channel_id.say(&self.ctx.http, content).await?;
        Ok(())
    }
}
