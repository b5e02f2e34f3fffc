use thiserror::Error;

use crate::{driver::Driver, event::Webhook};

/// Error returned by a [`SecretResolver`](crate::SecretResolver) when the signing key can't be
/// looked up.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// The event-kind header, or a sub-kind inside the payload, isn't one we know how to handle.
    #[error("unknown webhook event `{event}`")]
    UnknownWebhook { event: String },

    #[error("malformed webhook payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("webhook payload is larger than {limit} bytes")]
    PayloadTooLarge { limit: usize },

    /// The delivery couldn't be authenticated. The parsed event is kept for diagnostics only and
    /// must not be trusted.
    #[error("invalid webhook signature")]
    SignatureInvalid { webhook: Box<Webhook> },

    /// The secret resolver failed. As with [`Error::SignatureInvalid`], the attached event is
    /// unauthenticated.
    #[error("couldn't resolve webhook secret")]
    SecretResolution {
        webhook: Box<Webhook>,
        #[source]
        source: BoxError,
    },

    #[error("operation not supported by the {driver} driver")]
    Unsupported { driver: Driver },

    #[error("unsupported driver `{name}`")]
    UnknownDriver { name: String },

    #[error("invalid repository url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("couldn't read webhook body: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn unknown_webhook(event: impl Into<String>) -> Self {
        Self::UnknownWebhook {
            event: event.into(),
        }
    }

    /// Builds a [`Error::MalformedPayload`] for payloads that deserialized fine but are missing
    /// something the conversion needs.
    pub(crate) fn malformed(msg: &str) -> Self {
        Self::MalformedPayload(serde::de::Error::custom(msg))
    }

    /// The parsed but unauthenticated event attached to this error, if any.
    pub fn webhook(&self) -> Option<&Webhook> {
        match self {
            Self::SignatureInvalid { webhook } | Self::SecretResolution { webhook, .. } => {
                Some(webhook)
            }
            _ => None,
        }
    }
}
