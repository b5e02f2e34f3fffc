use serde::Deserialize;

use crate::webhooks::gitea::events::{GiteaUser, Label, Repository};

#[derive(Debug, Deserialize)]
pub struct PullRequestHook {
    pub action: String,
    pub pull_request: PullRequest,
    pub repository: Repository,
    pub sender: GiteaUser,
}

/// Gogs names the branches directly instead of nesting `head` and `base` objects.
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
    pub merged_commit_id: Option<String>,
    pub head_branch: String,
    pub head_repo: Option<HeadRepo>,
    pub base_branch: String,
}

#[derive(Debug, Deserialize)]
pub struct HeadRepo {
    pub full_name: String,
}
