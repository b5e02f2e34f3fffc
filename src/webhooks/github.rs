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

mod events;
use events as native;

const X_GITHUB_EVENT: &str = "X-GitHub-Event";

pub static SERVICE: WebhookService = WebhookService {
    driver: Driver::Github,
    event_header: X_GITHUB_EVENT,
    signatures: &[
        SignatureHeader {
            name: "X-Hub-Signature-256",
            scheme: Scheme::Hmac {
                algorithm: Algorithm::Sha256,
                prefix: Some("sha256="),
            },
        },
        SignatureHeader {
            name: "X-Hub-Signature",
            scheme: Scheme::Hmac {
                algorithm: Algorithm::Sha1,
                prefix: Some("sha1="),
            },
        },
    ],
    decode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GitHubEventType {
    Push,
    Create,
    Delete,
    Issues,
    IssueComment,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
}

impl GitHubEventType {
    fn from_header(event: &str) -> Option<Self> {
        let event_type = match event {
            "push" => Self::Push,
            "create" => Self::Create,
            "delete" => Self::Delete,
            "issues" => Self::Issues,
            "issue_comment" => Self::IssueComment,
            "pull_request" => Self::PullRequest,
            "pull_request_review" => Self::PullRequestReview,
            "pull_request_review_comment" => Self::PullRequestReviewComment,
            _ => return None,
        };
        Some(event_type)
    }
}

fn decode(event: &str, data: &[u8]) -> Result<Decoded, Error> {
    let event_type =
        GitHubEventType::from_header(event).ok_or_else(|| Error::unknown_webhook(event))?;

    let webhook = match event_type {
        GitHubEventType::Push => convert_push(serde_json::from_slice(data)?),
        GitHubEventType::Create => convert_ref(serde_json::from_slice(data)?, Action::Create)?,
        GitHubEventType::Delete => convert_ref(serde_json::from_slice(data)?, Action::Delete)?,
        GitHubEventType::Issues => convert_issues(serde_json::from_slice(data)?),
        GitHubEventType::IssueComment => convert_issue_comment(serde_json::from_slice(data)?),
        GitHubEventType::PullRequest => convert_pull_request(serde_json::from_slice(data)?),
        GitHubEventType::PullRequestReview => convert_review(serde_json::from_slice(data)?),
        GitHubEventType::PullRequestReviewComment => {
            convert_review_comment(serde_json::from_slice(data)?)
        }
    };

    Ok(webhook.into())
}

fn convert_push(event: native::PushEvent) -> Webhook {
    let commits: Vec<Commit> = event.commits.iter().map(convert_commit).collect();

    let commit = if commits.is_empty() {
        let pusher = User {
            login: event.pusher.name.clone(),
            name: event.pusher.name.clone(),
            email: non_empty(event.pusher.email.clone()),
            avatar: String::new(),
        };
        Commit::pushed_by(&pusher, &event.after, &event.compare)
    } else {
        match &event.head_commit {
            Some(head) => convert_commit(head),
            None => commits
                .iter()
                .find(|c| c.sha == event.after)
                .or_else(|| commits.last())
                .cloned()
                .unwrap_or_default(),
        }
    };

    Webhook::Push(PushHook {
        r#ref: event.r#ref,
        before: event.before,
        after: event.after,
        compare: event.compare,
        commit,
        commits,
        repo: convert_repository(&event.repository),
        sender: convert_user(&event.sender),
    })
}

fn convert_ref(event: native::RefEvent, action: Action) -> Result<Webhook, Error> {
    let r#ref = Reference {
        name: event.r#ref,
        sha: None,
    };
    let repo = convert_repository(&event.repository);
    let sender = convert_user(&event.sender);

    match event.ref_type.as_str() {
        "branch" => Ok(Webhook::Branch(BranchHook {
            r#ref,
            action,
            repo,
            sender,
        })),
        "tag" => Ok(Webhook::Tag(TagHook {
            r#ref,
            action,
            repo,
            sender,
        })),
        _ => Err(Error::unknown_webhook(event.ref_type)),
    }
}

fn convert_issues(event: native::IssuesEvent) -> Webhook {
    Webhook::Issue(IssueHook {
        action: Action::from_verb(&event.action),
        issue: convert_issue(&event.issue),
        repo: convert_repository(&event.repository),
        sender: convert_user(&event.sender),
    })
}

fn convert_issue_comment(event: native::IssueCommentEvent) -> Webhook {
    let action = Action::from_verb(&event.action);
    let comment = convert_comment(&event.comment);
    let repo = convert_repository(&event.repository);
    let sender = convert_user(&event.sender);

    match &event.issue.pull_request {
        Some(links) => Webhook::PullRequestComment(PullRequestCommentHook {
            action,
            pull_request: pull_request_from_issue(&event.issue, links),
            comment,
            repo,
            sender,
        }),
        None => Webhook::IssueComment(IssueCommentHook {
            action,
            issue: convert_issue(&event.issue),
            comment,
            repo,
            sender,
        }),
    }
}

fn convert_pull_request(event: native::PullRequestEvent) -> Webhook {
    let pull_request = convert_pull(&event.pull_request);
    let action = match Action::from_verb(&event.action) {
        // GitHub reports merges as a close of a merged PR
        Action::Close if pull_request.merged => Action::Merge,
        action => action,
    };

    Webhook::PullRequest(PullRequestHook {
        action,
        pull_request,
        repo: convert_repository(&event.repository),
        sender: convert_user(&event.sender),
    })
}

fn convert_review_comment(event: native::PullRequestReviewCommentEvent) -> Webhook {
    Webhook::PullRequestComment(PullRequestCommentHook {
        action: Action::from_verb(&event.action),
        pull_request: convert_pull(&event.pull_request),
        comment: convert_comment(&event.comment),
        repo: convert_repository(&event.repository),
        sender: convert_user(&event.sender),
    })
}

fn convert_review(event: native::PullRequestReviewEvent) -> Webhook {
    Webhook::Review(ReviewHook {
        action: Action::from_review_verb(&event.action),
        pull_request: convert_pull(&event.pull_request),
        review: Review {
            id: event.review.id,
            body: event.review.body.clone().unwrap_or_default(),
            state: event.review.state.clone(),
            author: convert_user(&event.review.user),
            link: event.review.html_url.to_string(),
        },
        repo: convert_repository(&event.repository),
        sender: convert_user(&event.sender),
    })
}

fn convert_repository(repo: &native::Repository) -> Repository {
    Repository {
        id: repo.id.to_string(),
        namespace: repo.owner.login.clone(),
        name: repo.name.clone(),
        branch: repo.default_branch.clone(),
        private: repo.private,
        clone: repo.clone_url.clone(),
        clone_ssh: repo.ssh_url.clone(),
        link: repo.html_url.to_string(),
    }
}

fn convert_user(user: &native::GitHubUser) -> User {
    User {
        login: user.login.clone(),
        name: user.name.clone().unwrap_or_default(),
        email: non_empty(user.email.clone()),
        avatar: user.avatar_url.clone(),
    }
}

fn convert_commit(commit: &native::Commit) -> Commit {
    let signature = |user: &native::CommitUser| Signature {
        login: user.username.clone().unwrap_or_default(),
        name: user.name.clone(),
        email: non_empty(user.email.clone()),
        avatar: String::new(),
        date: Some(commit.timestamp),
    };

    Commit {
        sha: commit.id.clone(),
        message: commit.message.clone(),
        author: signature(&commit.author),
        committer: signature(&commit.committer),
        link: commit.url.to_string(),
    }
}

fn convert_issue(issue: &native::Issue) -> Issue {
    Issue {
        number: issue.number,
        title: issue.title.clone(),
        body: issue.body.clone().unwrap_or_default(),
        link: issue.html_url.to_string(),
        labels: issue.labels.iter().map(|l| l.name.clone()).collect(),
        closed: issue.state == "closed",
        author: convert_user(&issue.user),
    }
}

fn pull_request_from_issue(issue: &native::Issue, links: &native::PullRequestLinks) -> PullRequest {
    PullRequest {
        number: issue.number,
        title: issue.title.clone(),
        body: issue.body.clone().unwrap_or_default(),
        r#ref: format!("refs/pull/{}/head", issue.number),
        link: links.html_url.to_string(),
        labels: issue.labels.iter().map(|l| l.name.clone()).collect(),
        closed: issue.state == "closed",
        author: convert_user(&issue.user),
        ..Default::default()
    }
}

fn convert_pull(pr: &native::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        title: pr.title.clone(),
        body: pr.body.clone().unwrap_or_default(),
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
        link: pr.html_url.to_string(),
        labels: pr.labels.iter().map(|l| l.name.clone()).collect(),
        closed: pr.state == "closed",
        merged: pr.merged.unwrap_or(false),
        author: convert_user(&pr.user),
    }
}

fn convert_comment(comment: &native::Comment) -> Comment {
    Comment {
        id: comment.id,
        body: comment.body.clone(),
        author: convert_user(&comment.user),
        link: comment.html_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(event: &str, data: &[u8]) -> Result<Webhook, Error> {
        decode(event, data).map(|decoded| decoded.webhook)
    }

    #[test]
    fn push() {
        let hook = match parse("push", include_bytes!("../../testdata/github/push.json")).unwrap() {
            Webhook::Push(hook) => hook,
            other => panic!("unexpected webhook {:?}", other),
        };

        assert_eq!(hook.r#ref, "refs/heads/main");
        assert_eq!(hook.commits.len(), 2);
        assert_eq!(hook.commit.sha, hook.after);
        assert_eq!(hook.commit.message, "Fix the frobnicator");
        assert_eq!(hook.commit.author.login, "octocat");
        assert_eq!(hook.commit.committer.login, "web-flow");
        assert_eq!(hook.repo.full_name(), "octocat/hello-world");
        assert_eq!(hook.repo.branch, "main");
        assert_eq!(hook.sender.login, "octocat");
    }

    #[test]
    fn push_without_commits_uses_pusher() {
        let data = include_bytes!("../../testdata/github/push_no_commits.json");
        let hook = match parse("push", data).unwrap() {
            Webhook::Push(hook) => hook,
            other => panic!("unexpected webhook {:?}", other),
        };

        assert!(hook.commits.is_empty());
        assert_eq!(hook.commit.message, "");
        assert_eq!(hook.commit.author.login, "octocat");
        assert_eq!(hook.commit.committer.login, "octocat");
        assert_eq!(
            hook.commit.author.email.as_deref(),
            Some("octocat@github.com")
        );
    }

    #[test]
    fn create_branch_and_tag() {
        let data = include_bytes!("../../testdata/github/create_tag.json");
        match parse("create", data).unwrap() {
            Webhook::Tag(hook) => {
                assert_eq!(hook.action, Action::Create);
                assert_eq!(hook.r#ref.name, "v1.0.0");
                assert_eq!(hook.r#ref.sha, None);
            }
            other => panic!("unexpected webhook {:?}", other),
        }

        let data = String::from_utf8_lossy(data).replace(r#""tag""#, r#""branch""#);
        match parse("delete", data.as_bytes()).unwrap() {
            Webhook::Branch(hook) => assert_eq!(hook.action, Action::Delete),
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn unknown_ref_type() {
        let data = include_bytes!("../../testdata/github/create_tag.json");
        let data = String::from_utf8_lossy(data).replace(r#""tag""#, r#""repository""#);
        assert!(matches!(
            parse("create", data.as_bytes()),
            Err(Error::UnknownWebhook { event }) if event == "repository"
        ));
    }

    #[test]
    fn issue_comment_on_issue() {
        let data = include_bytes!("../../testdata/github/issue_comment.json");
        match parse("issue_comment", data).unwrap() {
            Webhook::IssueComment(hook) => {
                assert_eq!(hook.action, Action::Create);
                assert_eq!(hook.issue.number, 2);
                assert_eq!(hook.issue.labels, vec!["bug".to_owned()]);
                assert_eq!(hook.comment.body, "Same here.");
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn issue_comment_on_pull_request_is_rerouted() {
        let data = include_bytes!("../../testdata/github/issue_comment_pr.json");
        match parse("issue_comment", data).unwrap() {
            Webhook::PullRequestComment(hook) => {
                assert_eq!(hook.pull_request.number, 7);
                assert_eq!(
                    hook.pull_request.link,
                    "https://github.com/octocat/hello-world/pull/7"
                );
                assert_eq!(hook.comment.id, 99);
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn closed_and_merged_pull_request() {
        let data = include_bytes!("../../testdata/github/pull_request.json");
        let hook = match parse("pull_request", data).unwrap() {
            Webhook::PullRequest(hook) => hook,
            other => panic!("unexpected webhook {:?}", other),
        };
        assert_eq!(hook.action, Action::Merge);
        assert!(hook.pull_request.merged);
        assert_eq!(hook.pull_request.source, "feature");
        assert_eq!(hook.pull_request.target, "main");
        assert_eq!(hook.pull_request.fork, "contributor/hello-world");

        let data = String::from_utf8_lossy(data).replace(r#""merged": true"#, r#""merged": false"#);
        match parse("pull_request", data.as_bytes()).unwrap() {
            Webhook::PullRequest(hook) => assert_eq!(hook.action, Action::Close),
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn review() {
        let data = include_bytes!("../../testdata/github/pull_request_review.json");
        match parse("pull_request_review", data).unwrap() {
            Webhook::Review(hook) => {
                assert_eq!(hook.action, Action::Submitted);
                assert_eq!(hook.review.state, "approved");
                assert_eq!(hook.review.author.login, "reviewer");
                assert_eq!(hook.sender.login, "reviewer");
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn issues() {
        let data = include_bytes!("../../testdata/github/issues.json");
        match parse("issues", data).unwrap() {
            Webhook::Issue(hook) => {
                assert_eq!(hook.action, Action::Open);
                assert_eq!(hook.issue.number, 2);
                assert!(!hook.issue.closed);
                assert_eq!(hook.issue.author.login, "contributor");
                assert_eq!(hook.repo.full_name(), "octocat/hello-world");
                assert_eq!(hook.sender.login, "contributor");
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn review_comment_is_a_pull_request_comment() {
        let data = include_bytes!("../../testdata/github/pull_request_review_comment.json");
        match parse("pull_request_review_comment", data).unwrap() {
            Webhook::PullRequestComment(hook) => {
                assert_eq!(hook.action, Action::Create);
                assert_eq!(hook.comment.id, 2001);
                assert_eq!(hook.comment.author.login, "reviewer");
                assert_eq!(hook.pull_request.source, "feature");
                assert!(!hook.pull_request.merged);
                assert_eq!(hook.sender.login, "reviewer");
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn ids_and_full_names_are_not_required() {
        fn strip(value: &mut serde_json::Value) {
            match value {
                serde_json::Value::Object(map) => {
                    map.remove("id");
                    map.remove("full_name");
                    map.values_mut().for_each(strip);
                }
                serde_json::Value::Array(items) => items.iter_mut().for_each(strip),
                _ => {}
            }
        }

        let data = include_bytes!("../../testdata/github/issues.json");
        let mut json: serde_json::Value = serde_json::from_slice(data).unwrap();
        strip(&mut json);
        // only the repository id is converted
        json["repository"]["id"] = 1296269.into();
        let data = serde_json::to_vec(&json).unwrap();

        match parse("issues", &data).unwrap() {
            Webhook::Issue(hook) => {
                assert_eq!(hook.repo.id, "1296269");
                assert_eq!(hook.repo.full_name(), "octocat/hello-world");
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn unknown_event() {
        assert!(matches!(
            parse("unsupported_event", b"{}"),
            Err(Error::UnknownWebhook { event }) if event == "unsupported_event"
        ));
    }

    #[test]
    fn malformed_payload() {
        assert!(matches!(
            parse("push", br#"{"ref": 42}"#),
            Err(Error::MalformedPayload(_))
        ));
        assert!(matches!(
            parse("issues", b"not json"),
            Err(Error::MalformedPayload(_))
        ));
    }
}
