use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// Gitea serializes users with `login`, `username`, or both depending on the version.
#[derive(Debug, Default, Deserialize)]
pub struct GiteaUser {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub full_name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
}

impl GiteaUser {
    pub fn login(&self) -> &str {
        if self.login.is_empty() {
            &self.username
        } else {
            &self.login
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Repository {
    pub id: i64,
    pub owner: GiteaUser,
    pub name: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub clone_url: String,
    #[serde(default)]
    pub ssh_url: String,
    #[serde(default)]
    pub default_branch: String,
}

#[derive(Debug, Deserialize)]
pub struct PushHook {
    pub secret: Option<String>,
    pub r#ref: String,
    pub before: String,
    pub after: String,
    #[serde(default)]
    pub compare_url: String,
    // `null` when nothing was pushed
    pub commits: Option<Vec<Commit>>,
    pub repository: Repository,
    pub pusher: GiteaUser,
    pub sender: GiteaUser,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub url: String,
    pub author: CommitUser,
    pub committer: CommitUser,
    pub timestamp: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize)]
pub struct CommitUser {
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
    #[serde(default)]
    pub username: String,
}

/// Payload shared by `create` and `delete`.
#[derive(Debug, Deserialize)]
pub struct CreateHook {
    pub r#ref: String,
    pub ref_type: String,
    pub sha: Option<String>,
    pub repository: Repository,
    pub sender: GiteaUser,
}

#[derive(Debug, Deserialize)]
pub struct IssueHook {
    pub action: String,
    pub issue: Issue,
    pub repository: Repository,
    pub sender: GiteaUser,
}

#[derive(Debug, Deserialize)]
pub struct IssueCommentHook {
    pub action: String,
    pub issue: Issue,
    pub comment: Comment,
    pub repository: Repository,
    pub sender: GiteaUser,
}

#[derive(Debug, Deserialize)]
pub struct Issue {
    pub number: u64,
    pub user: GiteaUser,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub labels: Option<Vec<Label>>,
    pub state: String,
    #[serde(default)]
    pub html_url: String,
    /// Only set when the issue is a pull request.
    pub pull_request: Option<PullRequestMeta>,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestMeta {
    #[serde(default)]
    pub merged: bool,
}

#[derive(Debug, Deserialize)]
pub struct Label {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Comment {
    pub id: u64,
    #[serde(default)]
    pub html_url: String,
    pub user: GiteaUser,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct PullRequestHook {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: GiteaUser,
}

#[derive(Debug, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub user: GiteaUser,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub labels: Option<Vec<Label>>,
    pub state: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub merged: bool,
    pub head: PrBranch,
    pub base: PrBranch,
}

#[derive(Debug, Deserialize)]
pub struct PrBranch {
    pub r#ref: String,
    pub sha: String,
    pub repo: Option<PrRepo>,
}

#[derive(Debug, Deserialize)]
pub struct PrRepo {
    pub full_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewHook {
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: GiteaUser,
    pub review: ReviewPayload,
}

#[derive(Debug, Deserialize)]
pub struct ReviewPayload {
    pub r#type: String,
    #[serde(default)]
    pub content: String,
}
