use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Links {
    #[serde(default)]
    pub html: Link,
    #[serde(default)]
    pub avatar: Link,
}

#[derive(Debug, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub display_name: String,
    pub nickname: Option<String>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub uuid: String,
    pub full_name: String,
    #[serde(default)]
    pub is_private: bool,
    pub mainbranch: Option<MainBranch>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Deserialize)]
pub struct MainBranch {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PushEvent {
    pub actor: Account,
    pub repository: Repository,
    pub push: Push,
}

#[derive(Debug, Deserialize)]
pub struct Push {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    pub new: Option<RefState>,
    pub old: Option<RefState>,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub closed: bool,
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub links: Links,
}

/// A branch or tag as it was before or after the push.
#[derive(Debug, Deserialize)]
pub struct RefState {
    pub r#type: String,
    pub name: String,
    pub target: Commit,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    pub hash: String,
    #[serde(default)]
    pub message: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub author: Option<Author>,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Deserialize)]
pub struct Author {
    /// `Name <email>` as recorded in the commit.
    #[serde(default)]
    pub raw: String,
    /// Set when the commit email is linked to an account.
    pub user: Option<Account>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestEvent {
    pub actor: Account,
    pub repository: Repository,
    pub pullrequest: PullRequest,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestCommentEvent {
    pub actor: Account,
    pub repository: Repository,
    pub pullrequest: PullRequest,
    pub comment: Comment,
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// `OPEN`, `MERGED`, `DECLINED` or `SUPERSEDED`.
    pub state: String,
    pub author: Account,
    pub source: Endpoint,
    pub destination: Endpoint,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Deserialize)]
pub struct Endpoint {
    pub branch: MainBranch,
    pub commit: Option<CommitHash>,
    pub repository: Option<EndpointRepository>,
}

#[derive(Debug, Deserialize)]
pub struct CommitHash {
    pub hash: String,
}

#[derive(Debug, Deserialize)]
pub struct EndpointRepository {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub content: Content,
    pub user: Account,
    #[serde(default)]
    pub links: Links,
}

#[derive(Debug, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub raw: String,
}
