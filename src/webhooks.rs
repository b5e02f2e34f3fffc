//! Parsing and authentication of inbound webhook deliveries.
//!
//! Every provider dialect is a [`WebhookService`]: a read-only table telling which header names
//! the event kind and the signature, plus the decoder for the payloads. [`WebhookService::parse`]
//! turns a [`Request`] into a canonical [`Webhook`], asking a [`SecretResolver`] for the key the
//! delivery should be signed with.

use std::io::Read;

use tracing::{debug, trace, warn};

use crate::{driver::Driver, event::Webhook, Error};

pub mod bitbucket;
pub mod gitea;
pub mod github;
pub mod gitlab;
pub mod gogs;
pub mod signing;
pub mod stash;

use signing::SignatureHeader;

/// Bodies larger than this are refused without being read any further.
pub const MAX_PAYLOAD_SIZE: usize = 10_000_000;

/// Query parameter some providers use to carry the shared secret in the hook URL.
const SECRET_PARAM: &str = "secret";

/// A delivery as received by the HTTP server.
#[derive(Debug, Clone, Default)]
pub struct Request {
    headers: Vec<(String, String)>,
    query: Option<String>,
    body: Vec<u8>,
}

impl Request {
    pub fn new(body: Vec<u8>) -> Result<Self, Error> {
        if body.len() > MAX_PAYLOAD_SIZE {
            trace!("payload was too big");
            return Err(Error::PayloadTooLarge {
                limit: MAX_PAYLOAD_SIZE,
            });
        }
        Ok(Self {
            body,
            ..Default::default()
        })
    }

    /// Reads the body from `reader`, stopping as soon as it goes over [`MAX_PAYLOAD_SIZE`].
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        let mut body = Vec::new();
        reader
            .take(MAX_PAYLOAD_SIZE as u64 + 1)
            .read_to_end(&mut body)?;
        Self::new(body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the raw query string, without the leading `?`.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// First non-empty value of the header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .find(|v| !v.is_empty())
    }

    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.into_owned())
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Looks up the key a delivery is expected to be signed with.
///
/// The resolver sees the parsed but not yet authenticated event, so it can pick the key per
/// repository. Returning an empty key disables verification for that delivery.
pub trait SecretResolver {
    fn resolve(&self, webhook: &Webhook) -> Result<String, crate::BoxError>;
}

impl<F> SecretResolver for F
where
    F: Fn(&Webhook) -> Result<String, crate::BoxError>,
{
    fn resolve(&self, webhook: &Webhook) -> Result<String, crate::BoxError> {
        self(webhook)
    }
}

/// Output of a dialect decoder.
#[derive(Debug)]
pub(crate) struct Decoded {
    pub webhook: Webhook,
    /// Secret embedded in the payload itself, if the dialect has one.
    pub secret: Option<String>,
}

impl From<Webhook> for Decoded {
    fn from(webhook: Webhook) -> Self {
        Self {
            webhook,
            secret: None,
        }
    }
}

type Decoder = fn(&str, &[u8]) -> Result<Decoded, Error>;

/// Webhook parser for one provider dialect.
pub struct WebhookService {
    driver: Driver,
    event_header: &'static str,
    /// Checked in order, the first one present in the request is used.
    signatures: &'static [SignatureHeader],
    decode: Decoder,
}

impl WebhookService {
    pub fn driver(&self) -> Driver {
        self.driver
    }

    pub fn event_header(&self) -> &'static str {
        self.event_header
    }

    /// Decodes the delivery and checks its authenticity.
    ///
    /// On [`Error::SignatureInvalid`] and [`Error::SecretResolution`] the parsed event is attached
    /// to the error, see [`Error::webhook`].
    pub fn parse(
        &self,
        request: &Request,
        resolver: &dyn SecretResolver,
    ) -> Result<Webhook, Error> {
        let event = request.header(self.event_header).unwrap_or_default();
        debug!("parsing {} event `{}`", self.driver, event);

        let Decoded { webhook, secret } = (self.decode)(event, request.body())?;
        let secret = secret
            .filter(|s| !s.is_empty())
            .or_else(|| request.query_param(SECRET_PARAM));

        let key = match resolver.resolve(&webhook) {
            Ok(key) => key,
            Err(source) => {
                return Err(Error::SecretResolution {
                    webhook: Box::new(webhook),
                    source,
                })
            }
        };
        if key.is_empty() {
            debug!(
                "no secret configured for {}, accepting unauthenticated {} event",
                webhook.repository().full_name(),
                webhook.kind()
            );
            return Ok(webhook);
        }

        let signature = self
            .signatures
            .iter()
            .find_map(|header| request.header(header.name).map(|value| (header, value)));

        let authentic = match (signature, secret) {
            (Some((header, value)), _) => {
                trace!("validating {} header...", header.name);
                header.verify(request.body(), &key, value)
            }
            (None, Some(secret)) => {
                trace!("validating embedded secret...");
                signing::token_matches(&secret, &key)
            }
            (None, None) => {
                trace!("delivery carries neither signature nor secret");
                false
            }
        };

        if !authentic {
            warn!(
                "signature validation failed for {} event on {}",
                webhook.kind(),
                webhook.repository().full_name()
            );
            return Err(Error::SignatureInvalid {
                webhook: Box::new(webhook),
            });
        }

        trace!("validated {} payload", self.driver);
        Ok(webhook)
    }
}

/// Parses a delivery with the service registered for `driver`.
pub fn parse(
    driver: Driver,
    request: &Request,
    resolver: &dyn SecretResolver,
) -> Result<Webhook, Error> {
    driver.webhook_service()?.parse(request, resolver)
}

/// Strips the `refs/heads/` or `refs/tags/` prefix from a git reference.
pub(crate) fn short_ref(r#ref: &str) -> &str {
    r#ref
        .strip_prefix("refs/heads/")
        .or_else(|| r#ref.strip_prefix("refs/tags/"))
        .unwrap_or(r#ref)
}

pub(crate) fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive_and_skip_empty_values() {
        let request = Request::new(Vec::new())
            .unwrap()
            .with_header("x-gitea-event", "")
            .with_header("X-GITEA-EVENT", "push");
        assert_eq!(request.header("X-Gitea-Event"), Some("push"));
        assert_eq!(request.header("X-Gitea-Signature"), None);
    }

    #[test]
    fn query_secret_is_decoded() {
        let request = Request::new(Vec::new())
            .unwrap()
            .with_query("foo=bar&secret=a%20b&secret=ignored");
        assert_eq!(request.query_param("secret").as_deref(), Some("a b"));
        assert_eq!(request.query_param("missing"), None);
    }

    #[test]
    fn oversized_bodies_are_refused() {
        let body = vec![b' '; MAX_PAYLOAD_SIZE + 1];
        assert!(matches!(
            Request::new(body),
            Err(Error::PayloadTooLarge {
                limit: MAX_PAYLOAD_SIZE
            })
        ));

        let reader = std::io::repeat(b' ');
        assert!(matches!(
            Request::from_reader(reader),
            Err(Error::PayloadTooLarge { .. })
        ));
    }

    #[test]
    fn body_at_limit_is_accepted() {
        let body = vec![b' '; MAX_PAYLOAD_SIZE];
        let request = Request::from_reader(body.as_slice()).unwrap();
        assert_eq!(request.body().len(), MAX_PAYLOAD_SIZE);
    }

    #[test]
    fn short_refs() {
        assert_eq!(short_ref("refs/heads/main"), "main");
        assert_eq!(short_ref("refs/tags/v1.0"), "v1.0");
        assert_eq!(short_ref("feature"), "feature");
    }
}
