use serde::{Deserialize, Serialize};
use serenity::model::prelude::*;

/// Discord rejects custom ids longer than this.
pub const MAX_CUSTOM_ID_LEN: usize = 100;

/// Routing data carried in a button's custom id, as compact JSON tagged by `t`.
///
/// `{"t":"create","parentId":"…"}` opens a ticket (optionally inside a category),
/// `{"t":"close","ch":"…","opener":"…"}` closes one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "t", rename_all = "lowercase")]
pub enum ButtonPayload {
    Create {
        #[serde(rename = "parentId", default)]
        parent_id: Option<ChannelId>,
    },
    Close {
        #[serde(rename = "ch")]
        channel_id: ChannelId,
        #[serde(rename = "opener")]
        opener_id: UserId,
    },
}

impl ButtonPayload {
    /// Anything that is not one of our payloads belongs to someone else: `None`, not an error.
    pub fn decode(custom_id: &str) -> Option<Self> {
        serde_json::from_str(custom_id).ok()
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_create_without_parent() {
        assert_eq!(
            ButtonPayload::decode(r#"{"t":"create","parentId":null}"#),
            Some(ButtonPayload::Create { parent_id: None })
        );
        assert_eq!(
            ButtonPayload::decode(r#"{"t":"create"}"#),
            Some(ButtonPayload::Create { parent_id: None })
        );
    }

    #[test]
    fn test_decodes_close() {
        let payload =
            ButtonPayload::decode(r#"{"t":"close","ch":"1234567890","opener":"987654321"}"#);
        assert_eq!(
            payload,
            Some(ButtonPayload::Close {
                channel_id: ChannelId::new(1234567890),
                opener_id: UserId::new(987654321),
            })
        );
    }

    #[test]
    fn test_foreign_ids_are_ignored() {
        assert_eq!(ButtonPayload::decode("cancel"), None);
        assert_eq!(ButtonPayload::decode(""), None);
        assert_eq!(ButtonPayload::decode(r#"{"t":"archive"}"#), None);
        assert_eq!(ButtonPayload::decode(r#"{"kind":"create"}"#), None);
        assert_eq!(ButtonPayload::decode(r#"{"t":"close","ch":"1"}"#), None);
        assert_eq!(ButtonPayload::decode("[1,2,3]"), None);
    }

    #[test]
    fn test_encoded_ids_fit_discord_limit() {
        let widest = ButtonPayload::Close {
            channel_id: ChannelId::new(u64::MAX),
            opener_id: UserId::new(u64::MAX),
        };
        let encoded = widest.encode();
        assert!(encoded.len() <= MAX_CUSTOM_ID_LEN, "{encoded} is too long");
        assert_eq!(ButtonPayload::decode(&encoded), Some(widest));

        let create = ButtonPayload::Create {
            parent_id: Some(ChannelId::new(u64::MAX)),
        };
        assert!(create.encode().starts_with(r#"{"t":"create""#));
    }
}
