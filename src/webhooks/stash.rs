//! Bitbucket Server, formerly Stash.

use crate::{
    action::Action,
    driver::Driver,
    event::{
        BranchHook, Comment, Commit, PullRequest, PullRequestCommentHook, PullRequestHook,
        PushHook, Reference, Repository, TagHook, User, Webhook,
    },
    webhooks::{
        non_empty,
        signing::{Algorithm, Scheme, SignatureHeader},
        Decoded, WebhookService,
    },
    Error,
};

mod events;
use events as native;

pub static SERVICE: WebhookService = WebhookService {
    driver: Driver::Stash,
    event_header: "X-Event-Key",
    signatures: &[SignatureHeader {
        name: "X-Hub-Signature",
        scheme: Scheme::Hmac {
            algorithm: Algorithm::Sha256,
            prefix: Some("sha256="),
        },
    }],
    decode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StashEventType {
    RefsChanged,
    PullRequest(Action),
    PullRequestComment(Action),
}

impl StashEventType {
    fn from_header(event: &str) -> Option<Self> {
        let event_type = match event {
            "repo:refs_changed" => Self::RefsChanged,
            "pr:opened" => Self::PullRequest(Action::Open),
            "pr:from_ref_updated" => Self::PullRequest(Action::Sync),
            "pr:modified" => Self::PullRequest(Action::Update),
            "pr:merged" => Self::PullRequest(Action::Merge),
            "pr:declined" => Self::PullRequest(Action::Close),
            "pr:deleted" => Self::PullRequest(Action::Delete),
            "pr:comment:added" => Self::PullRequestComment(Action::Create),
            "pr:comment:edited" => Self::PullRequestComment(Action::Update),
            "pr:comment:deleted" => Self::PullRequestComment(Action::Delete),
            _ => return None,
        };
        Some(event_type)
    }
}

fn decode(event: &str, data: &[u8]) -> Result<Decoded, Error> {
    let event_type =
        StashEventType::from_header(event).ok_or_else(|| Error::unknown_webhook(event))?;

    let webhook = match event_type {
        StashEventType::RefsChanged => convert_refs_changed(serde_json::from_slice(data)?)?,
        StashEventType::PullRequest(action) => {
            convert_pull_request(serde_json::from_slice(data)?, action)
        }
        StashEventType::PullRequestComment(action) => {
            convert_pull_request_comment(serde_json::from_slice(data)?, action)
        }
    };

    Ok(webhook.into())
}

fn convert_refs_changed(event: native::RefsChangedEvent) -> Result<Webhook, Error> {
    let repo = convert_repository(&event.repository);
    let sender = convert_user(&event.actor);

    // same as Bitbucket Cloud, only the first ref update is reported
    let change = event
        .changes
        .into_iter()
        .next()
        .ok_or_else(|| Error::malformed("refs_changed without changes"))?;

    let action = match change.r#type.as_str() {
        "ADD" => Action::Create,
        "UPDATE" => Action::Update,
        "DELETE" => Action::Delete,
        other => return Err(Error::unknown_webhook(other)),
    };

    match change.r#ref.r#type.as_str() {
        "TAG" => Ok(Webhook::Tag(TagHook {
            r#ref: Reference {
                name: change.r#ref.display_id,
                sha: Some(if action == Action::Delete {
                    change.from_hash
                } else {
                    change.to_hash
                }),
            },
            action,
            repo,
            sender,
        })),
        "BRANCH" if action == Action::Delete => Ok(Webhook::Branch(BranchHook {
            r#ref: Reference {
                name: change.r#ref.display_id,
                sha: Some(change.from_hash),
            },
            action,
            repo,
            sender,
        })),
        "BRANCH" => {
            let compare = format!("{}?until={}", commits_link(&repo), change.to_hash);
            Ok(Webhook::Push(PushHook {
                r#ref: change.r#ref.id,
                before: change.from_hash,
                commit: Commit::pushed_by(&sender, &change.to_hash, &compare),
                after: change.to_hash,
                compare,
                // the payload lists no commits
                commits: Vec::new(),
                repo,
                sender,
            }))
        }
        other => Err(Error::unknown_webhook(other)),
    }
}

/// `.../browse` link of the repository turned into its commit list.
fn commits_link(repo: &Repository) -> String {
    let base = repo.link.strip_suffix("/browse").unwrap_or(&repo.link);
    format!("{}/commits", base)
}

fn convert_pull_request(event: native::PullRequestEvent, action: Action) -> Webhook {
    Webhook::PullRequest(PullRequestHook {
        action,
        repo: convert_repository(&event.pull_request.to_ref.repository),
        pull_request: convert_pr(&event.pull_request),
        sender: convert_user(&event.actor),
    })
}

fn convert_pull_request_comment(event: native::PullRequestCommentEvent, action: Action) -> Webhook {
    let pull_request = convert_pr(&event.pull_request);
    let comment = Comment {
        id: event.comment.id,
        body: event.comment.text.clone(),
        author: convert_user(&event.comment.author),
        link: format!("{}?commentId={}", pull_request.link, event.comment.id),
    };

    Webhook::PullRequestComment(PullRequestCommentHook {
        action,
        repo: convert_repository(&event.pull_request.to_ref.repository),
        pull_request,
        comment,
        sender: convert_user(&event.actor),
    })
}

fn convert_repository(repo: &native::Repository) -> Repository {
    Repository {
        id: repo.id.to_string(),
        namespace: repo.project.key.clone(),
        name: repo.slug.clone(),
        // not part of the payloads
        branch: String::new(),
        private: !repo.public,
        clone: repo.links.clone_href("http").to_owned(),
        clone_ssh: repo.links.clone_href("ssh").to_owned(),
        link: repo.links.self_href().to_owned(),
    }
}

fn convert_user(user: &native::StashUser) -> User {
    let login = if user.slug.is_empty() {
        user.name.clone()
    } else {
        user.slug.clone()
    };

    User {
        login,
        name: user.display_name.clone(),
        email: non_empty(user.email_address.clone()),
        avatar: String::new(),
    }
}

fn convert_pr(pr: &native::PullRequest) -> PullRequest {
    let fork = &pr.from_ref.repository;

    PullRequest {
        number: pr.id,
        title: pr.title.clone(),
        body: pr.description.clone(),
        sha: pr.from_ref.latest_commit.clone(),
        r#ref: format!("refs/pull-requests/{}/from", pr.id),
        source: pr.from_ref.display_id.clone(),
        target: pr.to_ref.display_id.clone(),
        fork: format!("{}/{}", fork.project.key, fork.slug),
        link: pr.links.self_href().to_owned(),
        labels: Vec::new(),
        closed: pr.state != "OPEN",
        merged: pr.state == "MERGED",
        author: convert_user(&pr.author.user),
    }
}
