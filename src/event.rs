//! The canonical webhook model every provider dialect converts into.
//!
//! All values are snapshots taken at delivery time: a [`Repository`] or [`User`] here is a copy
//! of what the provider sent, not a handle into anything live.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::action::Action;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub id: String,
    pub namespace: String,
    pub name: String,
    /// Default branch, when the provider tells us.
    pub branch: String,
    pub private: bool,
    pub clone: String,
    pub clone_ssh: String,
    pub link: String,
}

impl Repository {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    pub login: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar: String,
}

/// Identity attached to a commit, as author or committer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub login: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar: String,
    pub date: Option<DateTime<FixedOffset>>,
}

impl From<&User> for Signature {
    fn from(user: &User) -> Self {
        Self {
            login: user.login.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            date: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub name: String,
    /// Only set when the payload points at a commit.
    pub sha: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Commit {
    pub sha: String,
    pub message: String,
    pub author: Signature,
    pub committer: Signature,
    pub link: String,
}

impl Commit {
    /// Commit standing in for a push that listed no commits: both identities are the pusher's
    /// and there is no message.
    pub(crate) fn pushed_by(pusher: &User, sha: &str, link: &str) -> Self {
        Self {
            sha: sha.to_owned(),
            message: String::new(),
            author: pusher.into(),
            committer: pusher.into(),
            link: link.to_owned(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub number: u64,
    pub title: String,
    pub body: String,
    pub link: String,
    pub labels: Vec<String>,
    pub closed: bool,
    pub author: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: String,
    /// Head commit, when the payload carries it.
    pub sha: String,
    pub r#ref: String,
    pub source: String,
    pub target: String,
    /// Full name of the repository the changes come from.
    pub fork: String,
    pub link: String,
    pub labels: Vec<String>,
    pub closed: bool,
    pub merged: bool,
    pub author: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Comment {
    pub id: u64,
    pub body: String,
    pub author: User,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Review {
    pub id: u64,
    pub body: String,
    pub state: String,
    pub author: User,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushHook {
    pub r#ref: String,
    pub before: String,
    pub after: String,
    pub compare: String,
    pub commit: Commit,
    pub commits: Vec<Commit>,
    pub repo: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchHook {
    pub r#ref: Reference,
    pub action: Action,
    pub repo: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagHook {
    pub r#ref: Reference,
    pub action: Action,
    pub repo: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueHook {
    pub action: Action,
    pub issue: Issue,
    pub repo: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueCommentHook {
    pub action: Action,
    pub issue: Issue,
    pub comment: Comment,
    pub repo: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestHook {
    pub action: Action,
    pub pull_request: PullRequest,
    pub repo: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestCommentHook {
    pub action: Action,
    pub pull_request: PullRequest,
    pub comment: Comment,
    pub repo: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReviewHook {
    pub action: Action,
    pub pull_request: PullRequest,
    pub review: Review,
    pub repo: Repository,
    pub sender: User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Webhook {
    Push(PushHook),
    Branch(BranchHook),
    Tag(TagHook),
    Issue(IssueHook),
    IssueComment(IssueCommentHook),
    PullRequest(PullRequestHook),
    PullRequestComment(PullRequestCommentHook),
    Review(ReviewHook),
}

impl Webhook {
    pub fn repository(&self) -> &Repository {
        match self {
            Self::Push(hook) => &hook.repo,
            Self::Branch(hook) => &hook.repo,
            Self::Tag(hook) => &hook.repo,
            Self::Issue(hook) => &hook.repo,
            Self::IssueComment(hook) => &hook.repo,
            Self::PullRequest(hook) => &hook.repo,
            Self::PullRequestComment(hook) => &hook.repo,
            Self::Review(hook) => &hook.repo,
        }
    }

    pub fn sender(&self) -> &User {
        match self {
            Self::Push(hook) => &hook.sender,
            Self::Branch(hook) => &hook.sender,
            Self::Tag(hook) => &hook.sender,
            Self::Issue(hook) => &hook.sender,
            Self::IssueComment(hook) => &hook.sender,
            Self::PullRequest(hook) => &hook.sender,
            Self::PullRequestComment(hook) => &hook.sender,
            Self::Review(hook) => &hook.sender,
        }
    }

    /// Pushes have no action; every other kind does.
    pub fn action(&self) -> Option<Action> {
        match self {
            Self::Push(_) => None,
            Self::Branch(hook) => Some(hook.action),
            Self::Tag(hook) => Some(hook.action),
            Self::Issue(hook) => Some(hook.action),
            Self::IssueComment(hook) => Some(hook.action),
            Self::PullRequest(hook) => Some(hook.action),
            Self::PullRequestComment(hook) => Some(hook.action),
            Self::Review(hook) => Some(hook.action),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Push(_) => "push",
            Self::Branch(_) => "branch",
            Self::Tag(_) => "tag",
            Self::Issue(_) => "issue",
            Self::IssueComment(_) => "issue_comment",
            Self::PullRequest(_) => "pull_request",
            Self::PullRequestComment(_) => "pull_request_comment",
            Self::Review(_) => "review",
        }
    }
}
