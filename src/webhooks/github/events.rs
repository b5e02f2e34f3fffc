//! Payloads as GitHub sends them, reduced to the fields we convert.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub id: u64,
    pub name: String,
    pub owner: GitHubUser,
    #[serde(default)]
    pub private: bool,
    pub html_url: Url,
    #[serde(default)]
    pub clone_url: String,
    #[serde(default)]
    pub ssh_url: String,
    #[serde(default)]
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PushEvent {
    pub r#ref: String,
    pub before: String,
    pub after: String,
    pub compare: String,
    pub commits: Vec<Commit>,
    pub head_commit: Option<Commit>,
    pub repository: Repository,
    pub pusher: Pusher,
    pub sender: GitHubUser,
}

/// Pushers only come with a name (which is the login) and an email.
#[derive(Debug, Deserialize)]
pub struct Pusher {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub timestamp: DateTime<FixedOffset>,
    pub url: Url,
    pub author: CommitUser,
    pub committer: CommitUser,
}

#[derive(Debug, Deserialize)]
pub struct CommitUser {
    pub name: String,
    pub email: Option<String>,
    pub username: Option<String>,
}

/// Payload shared by `create` and `delete`.
#[derive(Debug, Deserialize)]
pub struct RefEvent {
    pub r#ref: String,
    pub ref_type: String,
    pub repository: Repository,
    pub sender: GitHubUser,
}

#[derive(Debug, Deserialize)]
pub struct IssuesEvent {
    pub action: String,
    pub issue: Issue,
    pub repository: Repository,
    pub sender: GitHubUser,
}

#[derive(Debug, Deserialize)]
pub struct IssueCommentEvent {
    pub action: String,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
    pub sender: GitHubUser,
}

#[derive(Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub html_url: Url,
    pub state: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub user: GitHubUser,
    // an issue can be a PR, in this case the object contains a `pull_request` key with urls to the
    // PR
    pub pull_request: Option<PullRequestLinks>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestLinks {
    pub html_url: Url,
}

#[derive(Debug, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub html_url: Url,
    pub user: GitHubUser,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: GitHubUser,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestReviewCommentEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub comment: Comment,
    pub repository: Repository,
    pub sender: GitHubUser,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestReviewEvent {
    pub action: String,
    pub pull_request: PullRequest,
    pub review: Review,
    pub repository: Repository,
    pub sender: GitHubUser,
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    pub merged: Option<bool>,
    pub html_url: Url,
    pub user: GitHubUser,
    #[serde(default)]
    pub labels: Vec<Label>,
    pub head: PrRef,
    pub base: PrRef,
}

#[derive(Debug, Deserialize)]
pub struct PrRef {
    pub r#ref: String,
    pub sha: String,
    // null when the fork was deleted
    pub repo: Option<PrRepo>,
}

#[derive(Debug, Deserialize)]
pub struct PrRepo {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct Review {
    pub id: u64,
    pub body: Option<String>,
    pub state: String,
    pub html_url: Url,
    pub user: GitHubUser,
}
