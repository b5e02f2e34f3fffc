use std::{
    fmt::{self, Display},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    webhooks::{bitbucket, gitea, github, gitlab, gogs, stash, WebhookService},
    Error,
};

/// Source-control hosting provider a delivery comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    #[default]
    Github,
    Gitlab,
    Gitea,
    Gogs,
    #[serde(alias = "bitbucketcloud")]
    Bitbucket,
    /// Bitbucket Server.
    #[serde(alias = "bitbucketserver")]
    Stash,
    #[serde(alias = "fakegit")]
    Fake,
}

impl Driver {
    /// Guesses the driver from a host name, e.g. `gitlab.example.com`.
    pub fn identify(host: &str) -> Result<Self, Error> {
        let host = host.to_ascii_lowercase();
        let driver = match host.as_str() {
            "github.com" | "api.github.com" => Self::Github,
            "gitlab.com" => Self::Gitlab,
            "bitbucket.org" | "api.bitbucket.org" => Self::Bitbucket,
            h if h.contains("github") => Self::Github,
            h if h.contains("gitlab") => Self::Gitlab,
            h if h.contains("gitea") => Self::Gitea,
            h if h.contains("gogs") => Self::Gogs,
            h if h.contains("stash") => Self::Stash,
            h if h.contains("bitbucket") => Self::Bitbucket,
            _ => return Err(Error::UnknownDriver { name: host }),
        };
        Ok(driver)
    }

    pub fn from_repo_url(repo_url: &str) -> Result<Self, Error> {
        let url = Url::parse(repo_url)?;
        Self::identify(url.host_str().unwrap_or_default())
    }

    /// The webhook parser for this driver.
    pub fn webhook_service(self) -> Result<&'static WebhookService, Error> {
        match self {
            Self::Github => Ok(&github::SERVICE),
            Self::Gitlab => Ok(&gitlab::SERVICE),
            Self::Gitea => Ok(&gitea::SERVICE),
            Self::Gogs => Ok(&gogs::SERVICE),
            Self::Bitbucket => Ok(&bitbucket::SERVICE),
            Self::Stash => Ok(&stash::SERVICE),
            Self::Fake => Err(Error::Unsupported { driver: self }),
        }
    }
}

impl FromStr for Driver {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "" | "github" => Ok(Self::Github),
            "gitlab" => Ok(Self::Gitlab),
            "gitea" => Ok(Self::Gitea),
            "gogs" => Ok(Self::Gogs),
            "bitbucket" | "bitbucketcloud" => Ok(Self::Bitbucket),
            "stash" | "bitbucketserver" => Ok(Self::Stash),
            "fake" | "fakegit" => Ok(Self::Fake),
            _ => Err(Error::UnknownDriver {
                name: name.to_owned(),
            }),
        }
    }
}

impl Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Gitea => "gitea",
            Self::Gogs => "gogs",
            Self::Bitbucket => "bitbucket",
            Self::Stash => "stash",
            Self::Fake => "fake",
        };
        f.write_str(name)
    }
}
