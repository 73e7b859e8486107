use serenity::http::HttpError;
use serenity::model::ModelError;
use thiserror::Error;

/// Discord JSON error code for "Two factor is required for this operation".
pub const TWO_FACTOR_REQUIRED: isize = 60003;
/// Discord JSON error code for "Missing Permissions".
pub const MISSING_PERMISSIONS: isize = 50013;
/// Discord JSON error code for "Unknown Channel".
pub const UNKNOWN_CHANNEL: isize = 10003;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnvVar { name: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum CounterError {
    #[error("ticket counter storage failed: {0}")]
    Io(#[from] std::io::Error),

    /// The store holds something that is not a counter document. Never reset automatically.
    #[error("ticket counter at {path} is corrupt: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("ticket counter overflowed")]
    Overflow,
}

/// A failed call against Discord, sorted into the cases the bot reacts to differently.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("two factor authentication is required for this operation")]
    TwoFactorRequired,

    #[error("missing permissions")]
    MissingPermissions,

    #[error("not found")]
    NotFound,

    #[error(transparent)]
    Discord(Box<serenity::Error>),
}

impl From<serenity::Error> for PlatformError {
    fn from(err: serenity::Error) -> Self {
        match &err {
            serenity::Error::Http(HttpError::UnsuccessfulRequest(response)) => {
                match response.error.code {
                    TWO_FACTOR_REQUIRED => return PlatformError::TwoFactorRequired,
                    MISSING_PERMISSIONS => return PlatformError::MissingPermissions,
                    UNKNOWN_CHANNEL => return PlatformError::NotFound,
                    _ => {}
                }
            }
            // the cache-aware builders refuse locally before hitting the API
            serenity::Error::Model(ModelError::InvalidPermissions { .. }) => {
                return PlatformError::MissingPermissions;
            }
            _ => {}
        }
        PlatformError::Discord(Box::new(err))
    }
}

#[derive(Error, Debug)]
pub enum BotError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Counter(#[from] CounterError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<serenity::Error> for BotError {
    fn from(err: serenity::Error) -> Self {
        BotError::Platform(PlatformError::from(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_permission_error_is_missing_permissions() {
        let err = serenity::Error::Model(ModelError::InvalidPermissions {
            required: serenity::model::Permissions::MANAGE_CHANNELS,
            present: serenity::model::Permissions::empty(),
        });
        assert!(matches!(PlatformError::from(err), PlatformError::MissingPermissions));
    }

    #[test]
    fn test_other_errors_are_kept() {
        let err = PlatformError::from(serenity::Error::Other("boom"));
        assert!(matches!(err, PlatformError::Discord(_)));
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_config_error_names_variable() {
        let err = ConfigError::MissingEnvVar("DISCORD_TOKEN");
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: DISCORD_TOKEN"
        );
    }
}
