use forgehook::{Driver, Webhook};
use regex::Regex;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ForgehookConfig {
    /// Signing keys, checked in order. Repositories without a matching rule are accepted
    /// unauthenticated.
    #[serde(default)]
    pub secrets: Vec<SecretRule>,
}

#[derive(Debug, Deserialize)]
pub struct SecretRule {
    pub driver: Driver,
    /// Matched against the repository's `namespace/name`
    #[serde(with = "serde_regex")]
    pub repository: Regex,
    pub secret: String,
}

impl ForgehookConfig {
    /// Key the delivery must be signed with, empty when none is configured.
    pub fn secret_for(&self, driver: Driver, webhook: &Webhook) -> String {
        let full_name = webhook.repository().full_name();

        self.secrets
            .iter()
            .find(|rule| rule.driver == driver && rule.repository.is_match(&full_name))
            .map(|rule| rule.secret.clone())
            .unwrap_or_default()
    }
}
