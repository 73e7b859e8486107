use log::{error, info, warn};
use serenity::async_trait;
use serenity::model::Permissions;
use serenity::model::prelude::*;

use crate::counter::TicketCounter;
use crate::error::{CounterError, PlatformError};

/// What the bot needs where the ticket channel is created.
pub const REQUIRED_PERMISSIONS: Permissions = Permissions::MANAGE_CHANNELS
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::VIEW_CHANNEL)
    .union(Permissions::READ_MESSAGE_HISTORY);

/// Granted to the opener and the support role on the ticket channel.
pub const PARTICIPANT_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL
    .union(Permissions::SEND_MESSAGES)
    .union(Permissions::READ_MESSAGE_HISTORY);

pub const CATEGORY_FALLBACK_WARNING: &str = "The configured ticket category is missing or not a category. I will create the ticket at the top level.";
pub const PERMISSION_DENIED_REPLY: &str = "I do not have enough permissions to create a ticket channel here. Ensure I have **Administrator** or **Manage Channels** on the target category/server.";
pub const TWO_FACTOR_REPLY: &str = "Discord blocked channel creation with **“Two factor is required for this operation”**.\nAsk the **server owner** to either enable 2FA on their account **or** toggle off **“Require 2FA for moderation actions”** (Server Settings → Moderation). Then try again.";
pub const MISSING_PERMISSIONS_REPLY: &str = "I’m missing permissions to create a channel here. Give the bot **Administrator** (or at least **Manage Channels**) and make sure category overrides don’t block me.";
pub const GENERIC_CREATE_REPLY: &str = "Something went wrong creating the ticket. Check my role position and category permissions, then try again.";
pub const CHANNEL_NOT_FOUND_REPLY: &str = "Channel not found.";
pub const CLOSE_FAILED_REPLY: &str = "Couldn’t close this ticket. Make sure I have **Manage Channels**.";
pub const LOCK_NOTICE: &str = "Ticket locked (delete failed due to perms).";
pub const WELCOME_FAILED_NOTICE: &str = "I couldn’t post the welcome message with the **Close** button in it. Check that I can send messages there, or ask staff to close the ticket.";

/// The Discord operations the ticket lifecycle needs from one guild.
#[async_trait]
pub trait TicketGuild: Send + Sync {
    async fn channel_kind(&self, channel_id: ChannelId) -> Result<ChannelType, PlatformError>;

    /// The bot's effective permissions inside `parent`, or at guild level when `None`.
    async fn bot_permissions(&self, parent: Option<ChannelId>) -> Result<Permissions, PlatformError>;

    async fn create_ticket_channel(&self, channel: &TicketChannel) -> Result<ChannelId, PlatformError>;

    async fn post_welcome(&self, channel_id: ChannelId, opener: UserId) -> Result<(), PlatformError>;

    async fn channel_name(&self, channel_id: ChannelId) -> Result<String, PlatformError>;

    async fn delete_channel(&self, channel_id: ChannelId) -> Result<(), PlatformError>;

    async fn hide_from_role(&self, channel_id: ChannelId, role: RoleId) -> Result<(), PlatformError>;

    async fn rename_channel(&self, channel_id: ChannelId, name: &str) -> Result<(), PlatformError>;

    async fn say(&self, channel_id: ChannelId, content: &str) -> Result<(), PlatformError>;
}

/// A click on a panel's create button.
#[derive(Debug, Clone)]
pub struct TicketRequest {
    pub opener: UserId,
    pub opener_tag: String,
    pub parent: Option<ChannelId>,
    pub everyone: RoleId,
    pub support_role: Option<RoleId>,
}

/// Everything needed to create the channel for one ticket.
#[derive(Debug, Clone)]
pub struct TicketChannel {
    pub name: String,
    pub topic: String,
    pub parent: Option<ChannelId>,
    pub overwrites: Vec<PermissionOverwrite>,
}

impl TicketChannel {
    pub fn new(request: &TicketRequest, parent: Option<ChannelId>, number: u64) -> Self {
        Self {
            name: slug(number),
            topic: topic(&request.opener_tag, number),
            parent,
            overwrites: ticket_overwrites(request.everyone, request.opener, request.support_role),
        }
    }
}

#[derive(Debug)]
pub enum OpenOutcome {
    Created {
        channel_id: ChannelId,
        number: u64,
        /// Whether the welcome message carrying the close button was posted.
        welcomed: bool,
    },
    PermissionDenied {
        missing: Permissions,
    },
    Failed(PlatformError),
}

#[derive(Debug)]
pub struct OpenReport {
    pub warning: Option<&'static str>,
    pub outcome: OpenOutcome,
}

impl OpenReport {
    pub fn reply(&self) -> String {
        let message = match &self.outcome {
            OpenOutcome::Created {
                channel_id,
                number,
                welcomed,
            } => {
                let created = format!("✓ Ticket Created  <#{}> ({})", channel_id, slug(*number));
                if *welcomed {
                    created
                } else {
                    format!("{}\n{}", created, WELCOME_FAILED_NOTICE)
                }
            }
            OpenOutcome::PermissionDenied { .. } => PERMISSION_DENIED_REPLY.to_string(),
            OpenOutcome::Failed(PlatformError::TwoFactorRequired) => TWO_FACTOR_REPLY.to_string(),
            OpenOutcome::Failed(PlatformError::MissingPermissions) => {
                MISSING_PERMISSIONS_REPLY.to_string()
            }
            OpenOutcome::Failed(_) => GENERIC_CREATE_REPLY.to_string(),
        };
        match self.warning {
            Some(warning) => format!("{}\n{}", warning, message),
            None => message,
        }
    }
}

#[derive(Debug)]
pub enum CloseOutcome {
    /// The channel was deleted.
    Closed,
    /// Deleting was refused; the channel is hidden and renamed instead.
    Locked,
    NotFound,
    Failed(PlatformError),
}

impl CloseOutcome {
    /// The final edit of the closer's reply, if any. A closed or locked ticket speaks for itself.
    pub fn reply(&self) -> Option<&'static str> {
        match self {
            CloseOutcome::Closed | CloseOutcome::Locked => None,
            CloseOutcome::NotFound => Some(CHANNEL_NOT_FOUND_REPLY),
            CloseOutcome::Failed(_) => Some(CLOSE_FAILED_REPLY),
        }
    }
}

/// The @everyone role shares its id with the guild.
pub fn everyone_role(guild_id: GuildId) -> RoleId {
    RoleId::new(u64::from(guild_id))
}

pub fn pad(number: u64) -> String {
    format!("{:04}", number)
}

pub fn slug(number: u64) -> String {
    format!("ticket-{}", pad(number))
}

pub fn topic(opener_tag: &str, number: u64) -> String {
    format!("Ticket for {} • #{}", opener_tag, pad(number))
}

pub fn closed_name(name: &str) -> String {
    format!("closed-{}", name.strip_prefix("ticket-").unwrap_or(name))
}

pub fn missing_permissions(present: Permissions) -> Permissions {
    if present.administrator() {
        return Permissions::empty();
    }
    REQUIRED_PERMISSIONS.difference(present)
}

pub fn ticket_overwrites(
    everyone: RoleId,
    opener: UserId,
    support_role: Option<RoleId>,
) -> Vec<PermissionOverwrite> {
    let mut overwrites = vec![
        PermissionOverwrite {
            kind: PermissionOverwriteType::Role(everyone),
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
        },
        PermissionOverwrite {
            kind: PermissionOverwriteType::Member(opener),
            allow: PARTICIPANT_PERMISSIONS,
            deny: Permissions::empty(),
        },
    ];
    if let Some(role) = support_role {
        overwrites.push(PermissionOverwrite {
            kind: PermissionOverwriteType::Role(role),
            allow: PARTICIPANT_PERMISSIONS,
            deny: Permissions::empty(),
        });
    }
    overwrites
}

/// Validates the request, reserves the next number and creates the channel. The number is
/// written before the channel is created and written back if creation fails, so numbers are
/// neither skipped nor reused.
pub async fn open_ticket<G>(
    guild: &G,
    counter: &TicketCounter,
    request: &TicketRequest,
) -> Result<OpenReport, CounterError>
where
    G: TicketGuild + ?Sized,
{
    let mut warning = None;
    let parent = match request.parent {
        Some(parent_id) => match guild.channel_kind(parent_id).await {
            Ok(ChannelType::Category) => Some(parent_id),
            Ok(kind) => {
                warn!("🛑 Ticket parent {} is a {:?}, not a category", parent_id, kind);
                warning = Some(CATEGORY_FALLBACK_WARNING);
                None
            }
            Err(e) => {
                warn!("🛑 Ticket parent {} could not be resolved: {}", parent_id, e);
                warning = Some(CATEGORY_FALLBACK_WARNING);
                None
            }
        },
        None => None,
    };

    let present = match guild.bot_permissions(parent).await {
        Ok(present) => present,
        Err(e) => {
            error!("🛑 Could not compute bot permissions: {}", e);
            return Ok(OpenReport {
                warning,
                outcome: OpenOutcome::Failed(e),
            });
        }
    };
    let missing = missing_permissions(present);
    if !missing.is_empty() {
        warn!("🛑 Missing permissions for ticket creation: {:?}", missing);
        return Ok(OpenReport {
            warning,
            outcome: OpenOutcome::PermissionDenied { missing },
        });
    }

    let reservation = counter.reserve().await?;
    let number = reservation.number();
    let channel = TicketChannel::new(request, parent, number);

    let channel_id = match guild.create_ticket_channel(&channel).await {
        Ok(channel_id) => channel_id,
        Err(e) => {
            error!("🛑 Create channel failed: {}", e);
            return Ok(OpenReport {
                warning,
                outcome: OpenOutcome::Failed(e),
            });
        }
    };
    reservation.commit();
    info!("✅ Ticket created: {} (channel ID: {}) for user: {}", channel.name, channel_id, request.opener);

    let welcomed = match guild.post_welcome(channel_id, request.opener).await {
        Ok(()) => true,
        Err(e) => {
            error!("🛑 Could not post welcome message in {}: {}", channel_id, e);
            false
        }
    };

    Ok(OpenReport {
        warning,
        outcome: OpenOutcome::Created {
            channel_id,
            number,
            welcomed,
        },
    })
}

/// Deletes the ticket channel, or locks it when deletion is refused.
pub async fn close_ticket<G>(guild: &G, channel_id: ChannelId, everyone: RoleId) -> CloseOutcome
where
    G: TicketGuild + ?Sized,
{
    let name = match guild.channel_name(channel_id).await {
        Ok(name) => name,
        Err(PlatformError::NotFound) => return CloseOutcome::NotFound,
        Err(e) => {
            error!("🛑 Close failed: {}", e);
            return CloseOutcome::Failed(e);
        }
    };

    match guild.delete_channel(channel_id).await {
        Ok(()) => {
            info!("📁 Ticket closed: {} (channel ID: {})", name, channel_id);
            CloseOutcome::Closed
        }
        Err(e) => {
            warn!("🛑 Could not delete {} ({}), locking instead", name, e);
            match lock_ticket(guild, channel_id, everyone, &name).await {
                Ok(()) => CloseOutcome::Locked,
                Err(e) => {
                    error!("🛑 Close failed: {}", e);
                    CloseOutcome::Failed(e)
                }
            }
        }
    }
}

async fn lock_ticket<G>(
    guild: &G,
    channel_id: ChannelId,
    everyone: RoleId,
    name: &str,
) -> Result<(), PlatformError>
where
    G: TicketGuild + ?Sized,
{
    guild.hide_from_role(channel_id, everyone).await?;
    guild.rename_channel(channel_id, &closed_name(name)).await?;
    guild.say(channel_id, LOCK_NOTICE).await?;
    Ok(())
}
