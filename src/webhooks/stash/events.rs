use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: String,
    /// `http` or `ssh` for clone links.
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub clone: Vec<Link>,
    #[serde(default, rename = "self")]
    pub self_: Vec<Link>,
}

impl Links {
    pub fn self_href(&self) -> &str {
        self.self_.first().map(|link| link.href.as_str()).unwrap_or_default()
    }

    pub fn clone_href(&self, name: &str) -> &str {
        self.clone
            .iter()
            .find(|link| link.name == name)
            .map(|link| link.href.as_str())
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StashUser {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub display_name: String,
    pub email_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Project {
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub slug: String,
    pub project: Project,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Deserialize)]
pub struct RefsChangedEvent {
    pub actor: StashUser,
    pub repository: Repository,
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub r#ref: Ref,
    pub from_hash: String,
    pub to_hash: String,
    /// `ADD`, `UPDATE` or `DELETE`.
    pub r#type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ref {
    /// Full name, e.g. `refs/heads/master`.
    pub id: String,
    pub display_id: String,
    /// `BRANCH` or `TAG`.
    pub r#type: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestEvent {
    pub actor: StashUser,
    pub pull_request: PullRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestCommentEvent {
    pub actor: StashUser,
    pub pull_request: PullRequest,
    pub comment: Comment,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `OPEN`, `MERGED` or `DECLINED`.
    pub state: String,
    pub from_ref: PrRef,
    pub to_ref: PrRef,
    pub author: Participant,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrRef {
    pub display_id: String,
    #[serde(default)]
    pub latest_commit: String,
    pub repository: Repository,
}

#[derive(Debug, Deserialize)]
pub struct Participant {
    pub user: StashUser,
}

#[derive(Debug, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub text: String,
    pub author: StashUser,
}
