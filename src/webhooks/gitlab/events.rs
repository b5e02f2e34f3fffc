use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Project {
    pub id: u64,
    pub path_with_namespace: String,
    pub default_branch: Option<String>,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub git_http_url: String,
    #[serde(default)]
    pub git_ssh_url: String,
    /// 0 is private, 10 internal, 20 public.
    #[serde(default)]
    pub visibility_level: u8,
}

#[derive(Debug, Deserialize)]
pub struct GitLabUser {
    pub username: String,
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Payload of both `Push Hook` and `Tag Push Hook`.
#[derive(Debug, Deserialize)]
pub struct PushHook {
    pub object_kind: String,
    pub before: String,
    pub after: String,
    pub r#ref: String,
    pub checkout_sha: Option<String>,
    #[serde(default)]
    pub user_name: String,
    pub user_username: String,
    pub user_email: Option<String>,
    pub user_avatar: Option<String>,
    pub project: Project,
    #[serde(default)]
    pub commits: Vec<Commit>,
}

#[derive(Debug, Deserialize)]
pub struct Commit {
    pub id: String,
    pub message: String,
    pub timestamp: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub url: String,
    pub author: CommitAuthor,
}

#[derive(Debug, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Label {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueHook {
    pub user: GitLabUser,
    pub project: Project,
    pub object_attributes: IssueAttributes,
    pub labels: Option<Vec<Label>>,
}

#[derive(Debug, Deserialize)]
pub struct IssueAttributes {
    pub iid: u64,
    pub title: String,
    pub description: Option<String>,
    pub state: String,
    pub action: Option<String>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequestHook {
    pub user: GitLabUser,
    pub project: Project,
    pub object_attributes: MergeRequestAttributes,
    pub labels: Option<Vec<Label>>,
}

#[derive(Debug, Deserialize)]
pub struct MergeRequestAttributes {
    pub iid: u64,
    pub title: String,
    pub description: Option<String>,
    pub state: String,
    pub action: Option<String>,
    #[serde(default)]
    pub url: String,
    pub source_branch: String,
    pub target_branch: String,
    pub last_commit: Option<LastCommit>,
    pub source: Option<SourceProject>,
    /// Only present on `update` when new commits were pushed.
    pub oldrev: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LastCommit {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct SourceProject {
    pub path_with_namespace: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteHook {
    pub user: GitLabUser,
    pub project: Project,
    pub object_attributes: NoteAttributes,
    pub issue: Option<IssueAttributes>,
    pub merge_request: Option<MergeRequestAttributes>,
}

#[derive(Debug, Deserialize)]
pub struct NoteAttributes {
    pub id: u64,
    pub note: String,
    pub noteable_type: String,
    pub action: Option<String>,
    #[serde(default)]
    pub url: String,
}
