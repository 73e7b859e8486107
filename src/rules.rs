use log::info;
use serenity::all::AutoArchiveDuration;
use serenity::builder::{CreateEmbed, CreateEmbedAuthor, CreateForumPost, CreateMessage};
use serenity::model::Permissions;
use serenity::model::prelude::*;
use serenity::prelude::*;

use crate::error::BotError;

pub const RULES_COLOR: u32 = 0xffd54f;
pub const RULES_AUTHOR: &str = "Tricky's Servant";
pub const RULES_TITLE: &str = "OG Scrims";
pub const RULES_HEADING: &str = "**OG Scrims Rules**";
pub const FORUM_POST_NAME: &str = "OG Scrims Rules";

/// Posting needs at least these in the destination.
pub const POSTING_PERMISSIONS: Permissions = Permissions::VIEW_CHANNEL.union(Permissions::SEND_MESSAGES);

const GENERAL_AND_QUEUE: &[&str] = &[
    "_Read carefully. Rules can update anytime — check announcements before playing._",
    "",
    "**1) General Rules**",
    "• **No Cheating / Exploits** → Any hacks, macros, glitches = **instant ban**.",
    "• **No Toxic Behavior** → Harassment, racism, or excessive trash talk not tolerated.",
    "• **Respect Staff** → Listen to admins, mods, and hosts at all times.",
    "• **Custom Codes** → Never share codes outside verified members.",
    "",
    "**2) Queueing & Matches**",
    "• **Queue Up Correctly** → Be verified & ready before queue start.",
    "• **No Code Leaking** → Sharing the custom code with non-members = **ban**.",
    "• **No Double-Queueing** → Only **one account** per player.",
    "• **Start Signal** → Don’t ready up until staff announce it.",
];

const IN_GAME_AND_ENDGAME: &[&str] = &[
    "**3) In-Game Rules**",
    "• **Storm Surge Scrims (if active)** → Follow surge rules (fight when announced).",
    "• **No Griefing** → Don’t ruin games by early W-keying unless it’s surge.",
    "• **Rotation Rules** → Play serious. No skybases, trolling, or wasting lobbies.",
    "• **No Teaming** → Don’t work with others outside your team.",
    "",
    "**4) Endgame Expectations**",
    "• Play seriously (no messing around).",
    "• Follow zone rules if set for the lobby.",
    "• Intentional griefing or rule-breaking = removal.",
];

const PUNISHMENTS_AND_NOTES: &[&str] = &[
    "**5) Punishments**",
    "• **Warnings** → Minor issues.",
    "• **Temporary Ban** → Breaking scrim flow or minor griefing.",
    "• **Permanent Ban** → Cheating, teaming, or repeated offenses.",
    "",
    "**6) Extra Notes**",
    "• Host decisions are final.",
    "• Rules may update anytime — check announcements before playing.",
    "• Always use the correct Discord/Server tags if verification is required.",
];

/// One message of the rules post.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleMessage {
    pub content: Option<&'static str>,
    pub author: Option<&'static str>,
    pub title: Option<&'static str>,
    pub description: String,
    pub timestamp: bool,
}

impl RuleMessage {
    pub fn to_message(&self) -> CreateMessage {
        let mut embed = CreateEmbed::new()
            .description(self.description.clone())
            .color(RULES_COLOR);
        if let Some(author) = self.author {
            embed = embed.author(CreateEmbedAuthor::new(author));
        }
        if let Some(title) = self.title {
            embed = embed.title(title);
        }
        if self.timestamp {
            embed = embed.timestamp(Timestamp::now());
        }

        let mut message = CreateMessage::new().embed(embed);
        if let Some(content) = self.content {
            message = message.content(content);
        }
        message
    }
}

pub fn rule_messages() -> Vec<RuleMessage> {
    vec![
        RuleMessage {
            content: Some(RULES_HEADING),
            author: Some(RULES_AUTHOR),
            title: Some(RULES_TITLE),
            description: GENERAL_AND_QUEUE.join("\n"),
            timestamp: true,
        },
        RuleMessage {
            content: None,
            author: None,
            title: None,
            description: IN_GAME_AND_ENDGAME.join("\n"),
            timestamp: false,
        },
        RuleMessage {
            content: None,
            author: None,
            title: None,
            description: PUNISHMENTS_AND_NOTES.join("\n"),
            timestamp: false,
        },
    ]
}

/// Logs what the bot may do in `channel` and refuses to continue without view and send.
async fn check_posting_permissions(
    ctx: &Context,
    channel: &GuildChannel,
    bot_id: UserId,
) -> Result<(), BotError> {
    let member = channel.guild_id.member(&ctx.http, bot_id).await?;
    let guild = channel.guild_id.to_partial_guild(&ctx.http).await?;
    let permissions = guild.user_permissions_in(channel, &member);

    info!(
        "Channel type: {:?} Perms: view={} send={} embed={} attach={} history={}",
        channel.kind,
        permissions.view_channel(),
        permissions.send_messages(),
        permissions.embed_links(),
        permissions.attach_files(),
        permissions.read_message_history()
    );
    if !permissions.contains(POSTING_PERMISSIONS) && !permissions.administrator() {
        return Err(BotError::Other(
            "Missing ViewChannel or SendMessages in this channel. Fix perms and retry.".to_string(),
        ));
    }
    Ok(())
}

/// Sends the rules to `channel_id`. A forum gets a new post holding the first message, with
/// the rest as replies in that thread.
pub async fn post_rules(ctx: &Context, channel_id: ChannelId, bot_id: UserId) -> Result<(), BotError> {
    let channel = channel_id.to_channel(&ctx.http).await?;
    let messages = rule_messages();

    let Some(channel) = channel.guild() else {
        // DMs and the like: nothing to diagnose, just send
        for message in &messages {
            channel_id.send_message(&ctx.http, message.to_message()).await?;
        }
        return Ok(());
    };

    check_posting_permissions(ctx, &channel, bot_id).await?;

    if channel.kind == ChannelType::Forum {
        let Some((first, rest)) = messages.split_first() else {
            return Ok(());
        };
        let post = CreateForumPost::new(FORUM_POST_NAME, first.to_message())
            .auto_archive_duration(AutoArchiveDuration::OneWeek);
        let thread = channel.id.create_forum_post(&ctx.http, post).await?;
        info!("📌 Forum post {} created in {}", thread.id, channel.name);
        for message in rest {
            thread.id.send_message(&ctx.http, message.to_message()).await?;
        }
    } else {
        for message in &messages {
            channel.id.send_message(&ctx.http, message.to_message()).await?;
        }
    }
    Ok(())
}
