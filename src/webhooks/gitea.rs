use crate::{
    action::Action,
    driver::Driver,
    event::{
        BranchHook, Comment, Commit, Issue, IssueCommentHook, IssueHook, PullRequest,
        PullRequestCommentHook, PullRequestHook, PushHook, Reference, Repository, Review,
        ReviewHook, Signature, TagHook, User, Webhook,
    },
    webhooks::{
        non_empty,
        signing::{Algorithm, Scheme, SignatureHeader},
        Decoded, WebhookService,
    },
    Error,
};

pub(super) mod events;
use events as native;

pub static SERVICE: WebhookService = WebhookService {
    driver: Driver::Gitea,
    event_header: "X-Gitea-Event",
    signatures: &[SignatureHeader {
        name: "X-Gitea-Signature",
        scheme: Scheme::Hmac {
            algorithm: Algorithm::Sha256,
            prefix: None,
        },
    }],
    decode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum GiteaEventType {
    Push,
    Create,
    Delete,
    Issues,
    IssueComment,
    PullRequest,
    Review,
}

impl GiteaEventType {
    fn from_header(event: &str) -> Option<Self> {
        let event_type = match event {
            "push" => Self::Push,
            "create" => Self::Create,
            "delete" => Self::Delete,
            "issues" => Self::Issues,
            "issue_comment" => Self::IssueComment,
            "pull_request" => Self::PullRequest,
            "reviewed" | "pull_request_approved" | "pull_request_rejected"
            | "pull_request_comment" => Self::Review,
            _ => return None,
        };
        Some(event_type)
    }
}

fn decode(event: &str, data: &[u8]) -> Result<Decoded, Error> {
    let event_type =
        GiteaEventType::from_header(event).ok_or_else(|| Error::unknown_webhook(event))?;
    decode_event(event_type, data)
}

/// Decodes a payload whose event kind is already known. Gogs deliveries share these payloads.
pub(super) fn decode_event(event_type: GiteaEventType, data: &[u8]) -> Result<Decoded, Error> {
    let webhook = match event_type {
        GiteaEventType::Push => {
            let push: native::PushHook = serde_json::from_slice(data)?;
            let secret = non_empty(push.secret.clone());
            return Ok(Decoded {
                webhook: convert_push(push),
                secret,
            });
        }
        GiteaEventType::Create => convert_ref(serde_json::from_slice(data)?, Action::Create)?,
        GiteaEventType::Delete => convert_ref(serde_json::from_slice(data)?, Action::Delete)?,
        GiteaEventType::Issues => convert_issue_hook(serde_json::from_slice(data)?),
        GiteaEventType::IssueComment => convert_issue_comment(serde_json::from_slice(data)?),
        GiteaEventType::PullRequest => convert_pull_request(serde_json::from_slice(data)?),
        GiteaEventType::Review => convert_review(serde_json::from_slice(data)?),
    };

    Ok(webhook.into())
}

fn convert_push(push: native::PushHook) -> Webhook {
    let commits: Vec<Commit> = push
        .commits
        .as_deref()
        .unwrap_or_default()
        .iter()
        .map(convert_commit)
        .collect();

    // Gitea lists the newest commit first
    let commit = match commits.first() {
        Some(first) => commits
            .iter()
            .find(|c| c.sha == push.after)
            .unwrap_or(first)
            .clone(),
        None => Commit::pushed_by(&convert_user(&push.pusher), &push.after, &push.compare_url),
    };

    Webhook::Push(PushHook {
        r#ref: push.r#ref,
        before: push.before,
        after: push.after,
        compare: push.compare_url,
        commit,
        commits,
        repo: convert_repository(&push.repository),
        sender: convert_user(&push.sender),
    })
}

fn convert_ref(hook: native::CreateHook, action: Action) -> Result<Webhook, Error> {
    let repo = convert_repository(&hook.repository);
    let sender = convert_user(&hook.sender);

    match hook.ref_type.as_str() {
        "tag" => Ok(Webhook::Tag(TagHook {
            r#ref: Reference {
                name: hook.r#ref,
                sha: non_empty(hook.sha),
            },
            action,
            repo,
            sender,
        })),
        "branch" => Ok(Webhook::Branch(BranchHook {
            r#ref: Reference {
                name: hook.r#ref,
                sha: None,
            },
            action,
            repo,
            sender,
        })),
        _ => Err(Error::unknown_webhook(hook.ref_type)),
    }
}

fn convert_issue_hook(hook: native::IssueHook) -> Webhook {
    Webhook::Issue(IssueHook {
        action: Action::from_verb(&hook.action),
        issue: convert_issue(&hook.issue),
        repo: convert_repository(&hook.repository),
        sender: convert_user(&hook.sender),
    })
}

fn convert_issue_comment(hook: native::IssueCommentHook) -> Webhook {
    let action = Action::from_verb(&hook.action);
    let comment = convert_comment(&hook.comment);
    let repo = convert_repository(&hook.repository);
    let sender = convert_user(&hook.sender);

    match &hook.issue.pull_request {
        Some(meta) => Webhook::PullRequestComment(PullRequestCommentHook {
            action,
            pull_request: pull_request_from_issue(&hook.issue, meta),
            comment,
            repo,
            sender,
        }),
        None => Webhook::IssueComment(IssueCommentHook {
            action,
            issue: convert_issue(&hook.issue),
            comment,
            repo,
            sender,
        }),
    }
}

fn convert_pull_request(hook: native::PullRequestHook) -> Webhook {
    Webhook::PullRequest(PullRequestHook {
        action: Action::from_verb(&hook.action),
        pull_request: convert_pull(&hook.pull_request),
        repo: convert_repository(&hook.repository),
        sender: convert_user(&hook.sender),
    })
}

fn convert_review(hook: native::ReviewHook) -> Webhook {
    let sender = convert_user(&hook.sender);
    Webhook::Review(ReviewHook {
        action: Action::from_review_verb(&hook.review.r#type),
        pull_request: convert_pull(&hook.pull_request),
        review: Review {
            body: hook.review.content.clone(),
            state: hook.review.r#type.clone(),
            author: sender.clone(),
            ..Default::default()
        },
        repo: convert_repository(&hook.repository),
        sender,
    })
}

pub(super) fn convert_repository(repo: &native::Repository) -> Repository {
    Repository {
        id: repo.id.to_string(),
        namespace: repo.owner.login().to_owned(),
        name: repo.name.clone(),
        branch: repo.default_branch.clone(),
        private: repo.private,
        clone: repo.clone_url.clone(),
        clone_ssh: repo.ssh_url.clone(),
        link: repo.html_url.clone(),
    }
}

pub(super) fn convert_user(user: &native::GiteaUser) -> User {
    User {
        login: user.login().to_owned(),
        name: user.full_name.clone(),
        email: non_empty(user.email.clone()),
        avatar: user.avatar_url.clone(),
    }
}

fn convert_commit(commit: &native::Commit) -> Commit {
    let signature = |user: &native::CommitUser| Signature {
        login: user.username.clone(),
        name: user.name.clone(),
        email: non_empty(user.email.clone()),
        avatar: String::new(),
        date: commit.timestamp,
    };

    Commit {
        sha: commit.id.clone(),
        message: commit.message.clone(),
        author: signature(&commit.author),
        committer: signature(&commit.committer),
        link: commit.url.clone(),
    }
}

pub(super) fn labels(labels: &Option<Vec<native::Label>>) -> Vec<String> {
    labels
        .iter()
        .flatten()
        .map(|label| label.name.clone())
        .collect()
}

fn convert_issue(issue: &native::Issue) -> Issue {
    Issue {
        number: issue.number,
        title: issue.title.clone(),
        body: issue.body.clone(),
        link: issue.html_url.clone(),
        labels: labels(&issue.labels),
        closed: issue.state == "closed",
        author: convert_user(&issue.user),
    }
}

fn pull_request_from_issue(issue: &native::Issue, meta: &native::PullRequestMeta) -> PullRequest {
    PullRequest {
        number: issue.number,
        title: issue.title.clone(),
        body: issue.body.clone(),
        r#ref: format!("refs/pull/{}/head", issue.number),
        link: issue.html_url.clone(),
        labels: labels(&issue.labels),
        closed: issue.state == "closed",
        merged: meta.merged,
        author: convert_user(&issue.user),
        ..Default::default()
    }
}

fn convert_pull(pr: &native::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        title: pr.title.clone(),
        body: pr.body.clone(),
        sha: pr.head.sha.clone(),
        r#ref: format!("refs/pull/{}/head", pr.number),
        source: pr.head.r#ref.clone(),
        target: pr.base.r#ref.clone(),
        fork: pr
            .head
            .repo
            .as_ref()
            .map(|r| r.full_name.clone())
            .unwrap_or_default(),
        link: pr.html_url.clone(),
        labels: labels(&pr.labels),
        closed: pr.state == "closed",
        merged: pr.merged,
        author: convert_user(&pr.user),
    }
}

fn convert_comment(comment: &native::Comment) -> Comment {
    Comment {
        id: comment.id,
        body: comment.body.clone(),
        author: convert_user(&comment.user),
        link: comment.html_url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(event: &str, data: &[u8]) -> Result<Decoded, Error> {
        decode(event, data)
    }

    #[test]
    fn push_keeps_embedded_secret() {
        let decoded = parse("push", include_bytes!("../../testdata/gitea/push.json")).unwrap();
        assert_eq!(decoded.secret.as_deref(), Some("topsecret"));

        let hook = match decoded.webhook {
            Webhook::Push(hook) => hook,
            other => panic!("unexpected webhook {:?}", other),
        };
        assert_eq!(hook.commit.sha, "ef98532add3b2feb7a137426bba1248724367df5");
        assert_eq!(hook.commit.message, "bump\n");
        assert_eq!(hook.commit.author.login, "gordon");
        assert_eq!(hook.commit.author.email.as_deref(), Some("gordon@golang.org"));
        assert_eq!(hook.repo.namespace, "gogits");
        assert_eq!(hook.repo.full_name(), "gogits/hello-world");
        assert_eq!(hook.sender.login, "gogits");
    }

    #[test]
    fn push_with_null_commits_uses_pusher() {
        let data = include_bytes!("../../testdata/gitea/push.json");
        let mut json: serde_json::Value = serde_json::from_slice(data).unwrap();
        json["commits"] = serde_json::Value::Null;
        let data = serde_json::to_vec(&json).unwrap();

        let hook = match parse("push", &data).unwrap().webhook {
            Webhook::Push(hook) => hook,
            other => panic!("unexpected webhook {:?}", other),
        };
        assert!(hook.commits.is_empty());
        assert_eq!(hook.commit.message, "");
        assert_eq!(hook.commit.author.login, "pusher");
        assert_eq!(hook.commit.committer.login, "pusher");
        // gitea sends an empty string rather than null
        assert_eq!(hook.commit.author.email, None);
    }

    #[test]
    fn create_tag_with_sha() {
        let data = include_bytes!("../../testdata/gitea/create.json");
        match parse("create", data).unwrap().webhook {
            Webhook::Tag(hook) => {
                assert_eq!(hook.action, Action::Create);
                assert_eq!(hook.r#ref.name, "v1.0.0");
                assert_eq!(
                    hook.r#ref.sha.as_deref(),
                    Some("ef98532add3b2feb7a137426bba1248724367df5")
                );
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn delete_branch_has_no_sha() {
        let data = include_bytes!("../../testdata/gitea/create.json");
        let data = String::from_utf8_lossy(data).replace(r#""tag""#, r#""branch""#);
        match parse("delete", data.as_bytes()).unwrap().webhook {
            Webhook::Branch(hook) => {
                assert_eq!(hook.action, Action::Delete);
                assert_eq!(hook.r#ref.sha, None);
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn unknown_ref_type_is_not_guessed() {
        let data = include_bytes!("../../testdata/gitea/create.json");
        let data = String::from_utf8_lossy(data).replace(r#""tag""#, r#""note""#);
        assert!(matches!(
            parse("create", data.as_bytes()),
            Err(Error::UnknownWebhook { event }) if event == "note"
        ));
    }

    #[test]
    fn issue_comment_routing() {
        let data = include_bytes!("../../testdata/gitea/issue_comment.json");
        match parse("issue_comment", data).unwrap().webhook {
            Webhook::IssueComment(hook) => {
                assert_eq!(hook.action, Action::Create);
                assert_eq!(hook.issue.number, 1);
                assert!(hook.issue.labels.is_empty());
                assert_eq!(hook.comment.author.login, "gogits");
            }
            other => panic!("unexpected webhook {:?}", other),
        }

        let mut json: serde_json::Value = serde_json::from_slice(data).unwrap();
        json["issue"]["pull_request"] = serde_json::json!({ "merged": false, "merged_at": null });
        let data = serde_json::to_vec(&json).unwrap();
        match parse("issue_comment", &data).unwrap().webhook {
            Webhook::PullRequestComment(hook) => {
                assert_eq!(hook.pull_request.number, 1);
                assert_eq!(hook.pull_request.r#ref, "refs/pull/1/head");
                assert!(!hook.pull_request.merged);
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn pull_request() {
        let data = include_bytes!("../../testdata/gitea/pull_request.json");
        match parse("pull_request", data).unwrap().webhook {
            Webhook::PullRequest(hook) => {
                assert_eq!(hook.action, Action::Open);
                assert_eq!(hook.pull_request.number, 2);
                assert_eq!(hook.pull_request.source, "feature");
                assert_eq!(hook.pull_request.target, "master");
                assert_eq!(hook.pull_request.labels, vec!["enhancement".to_owned()]);
                assert!(!hook.pull_request.closed);
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn review_action_from_review_type() {
        let data = include_bytes!("../../testdata/gitea/pull_request.json");
        let mut json: serde_json::Value = serde_json::from_slice(data).unwrap();
        json["action"] = "reviewed".into();
        json["review"] = serde_json::json!({
            "type": "pull_request_review_rejected",
            "content": "needs tests"
        });
        let data = serde_json::to_vec(&json).unwrap();

        match parse("pull_request_rejected", &data).unwrap().webhook {
            Webhook::Review(hook) => {
                assert_eq!(hook.action, Action::Dismissed);
                assert_eq!(hook.review.body, "needs tests");
                assert_eq!(hook.review.author.login, "gogits");
                assert_eq!(hook.sender.login, "gogits");
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn issues() {
        let data = include_bytes!("../../testdata/gitea/issues.json");
        match parse("issues", data).unwrap().webhook {
            Webhook::Issue(hook) => {
                assert_eq!(hook.action, Action::Open);
                assert_eq!(hook.issue.number, 1);
                assert!(hook.issue.labels.is_empty());
                assert_eq!(hook.repo.full_name(), "gogits/hello-world");
                assert_eq!(hook.sender.login, "gogits");
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn review_without_action() {
        let data = include_bytes!("../../testdata/gitea/pull_request.json");
        let mut json: serde_json::Value = serde_json::from_slice(data).unwrap();
        json.as_object_mut().unwrap().remove("action");
        json["review"] = serde_json::json!({ "type": "pull_request_review_approved" });
        let data = serde_json::to_vec(&json).unwrap();

        match parse("pull_request_approved", &data).unwrap().webhook {
            Webhook::Review(hook) => assert_eq!(hook.action, Action::Submitted),
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn unknown_event() {
        assert!(matches!(
            parse("repository", b"{}"),
            Err(Error::UnknownWebhook { event }) if event == "repository"
        ));
    }
}
