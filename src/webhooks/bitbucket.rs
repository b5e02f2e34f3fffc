use crate::{
    action::Action,
    driver::Driver,
    event::{
        BranchHook, Comment, Commit, PullRequest, PullRequestCommentHook, PullRequestHook,
        PushHook, Reference, Repository, Signature, TagHook, User, Webhook,
    },
    webhooks::{
        signing::{Algorithm, Scheme, SignatureHeader},
        Decoded, WebhookService,
    },
    Error,
};

mod events;
use events as native;

pub static SERVICE: WebhookService = WebhookService {
    driver: Driver::Bitbucket,
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
enum BitbucketEventType {
    Push,
    PullRequest(Action),
    PullRequestComment(Action),
}

impl BitbucketEventType {
    fn from_header(event: &str) -> Option<Self> {
        let event_type = match event {
            "repo:push" => Self::Push,
            "pullrequest:created" => Self::PullRequest(Action::Open),
            "pullrequest:updated" => Self::PullRequest(Action::Sync),
            "pullrequest:fulfilled" => Self::PullRequest(Action::Merge),
            "pullrequest:rejected" => Self::PullRequest(Action::Close),
            "pullrequest:comment_created" => Self::PullRequestComment(Action::Create),
            "pullrequest:comment_updated" => Self::PullRequestComment(Action::Update),
            "pullrequest:comment_deleted" => Self::PullRequestComment(Action::Delete),
            _ => return None,
        };
        Some(event_type)
    }
}

fn decode(event: &str, data: &[u8]) -> Result<Decoded, Error> {
    let event_type =
        BitbucketEventType::from_header(event).ok_or_else(|| Error::unknown_webhook(event))?;

    let webhook = match event_type {
        BitbucketEventType::Push => convert_push(serde_json::from_slice(data)?)?,
        BitbucketEventType::PullRequest(action) => {
            convert_pull_request(serde_json::from_slice(data)?, action)
        }
        BitbucketEventType::PullRequestComment(action) => {
            convert_pull_request_comment(serde_json::from_slice(data)?, action)
        }
    };

    Ok(webhook.into())
}

fn convert_push(event: native::PushEvent) -> Result<Webhook, Error> {
    let repo = convert_repository(&event.repository);
    let sender = convert_user(&event.actor);

    // a delivery may batch several ref updates, only the first one is reported
    let change = event
        .push
        .changes
        .into_iter()
        .next()
        .ok_or_else(|| Error::malformed("push without changes"))?;

    if change.closed {
        let old = change
            .old
            .ok_or_else(|| Error::malformed("closed change without old ref"))?;
        let r#ref = Reference {
            name: old.name,
            sha: Some(old.target.hash),
        };
        return match old.r#type.as_str() {
            "branch" => Ok(Webhook::Branch(BranchHook {
                r#ref,
                action: Action::Delete,
                repo,
                sender,
            })),
            "tag" => Ok(Webhook::Tag(TagHook {
                r#ref,
                action: Action::Delete,
                repo,
                sender,
            })),
            _ => Err(Error::unknown_webhook(old.r#type)),
        };
    }

    let new = change
        .new
        .as_ref()
        .ok_or_else(|| Error::malformed("change without new ref"))?;

    match new.r#type.as_str() {
        // a tag change that isn't a creation is a force-moved tag
        "tag" => Ok(Webhook::Tag(TagHook {
            r#ref: Reference {
                name: new.name.clone(),
                sha: Some(new.target.hash.clone()),
            },
            action: if change.created {
                Action::Create
            } else {
                Action::Update
            },
            repo,
            sender,
        })),
        "branch" => Ok(convert_push_hook(&change, new, repo, sender)),
        other => Err(Error::unknown_webhook(other)),
    }
}

fn convert_push_hook(
    change: &native::Change,
    new: &native::RefState,
    repo: Repository,
    sender: User,
) -> Webhook {
    let after = new.target.hash.clone();
    let before = change
        .old
        .as_ref()
        .map(|old| old.target.hash.clone())
        .unwrap_or_default();
    let compare = change.links.html.href.clone();
    let commits: Vec<Commit> = change.commits.iter().map(convert_commit).collect();

    // newest first
    let commit = match commits.first() {
        Some(first) => commits
            .iter()
            .find(|c| c.sha == after)
            .unwrap_or(first)
            .clone(),
        None => Commit::pushed_by(&sender, &after, &compare),
    };

    Webhook::Push(PushHook {
        r#ref: format!("refs/heads/{}", new.name),
        before,
        after,
        compare,
        commit,
        commits,
        repo,
        sender,
    })
}

fn convert_pull_request(event: native::PullRequestEvent, action: Action) -> Webhook {
    Webhook::PullRequest(PullRequestHook {
        action,
        pull_request: convert_pr(&event.pullrequest),
        repo: convert_repository(&event.repository),
        sender: convert_user(&event.actor),
    })
}

fn convert_pull_request_comment(event: native::PullRequestCommentEvent, action: Action) -> Webhook {
    let comment = &event.comment;

    Webhook::PullRequestComment(PullRequestCommentHook {
        action,
        pull_request: convert_pr(&event.pullrequest),
        comment: Comment {
            id: comment.id,
            body: comment.content.raw.clone(),
            author: convert_user(&comment.user),
            link: comment.links.html.href.clone(),
        },
        repo: convert_repository(&event.repository),
        sender: convert_user(&event.actor),
    })
}

fn convert_repository(repo: &native::Repository) -> Repository {
    let (namespace, name) = repo.full_name.split_once('/').unwrap_or(("", &repo.full_name));

    Repository {
        id: repo.uuid.clone(),
        namespace: namespace.to_owned(),
        name: name.to_owned(),
        branch: repo
            .mainbranch
            .as_ref()
            .map(|branch| branch.name.clone())
            .unwrap_or_default(),
        private: repo.is_private,
        clone: format!("https://bitbucket.org/{}.git", repo.full_name),
        clone_ssh: format!("git@bitbucket.org:{}.git", repo.full_name),
        link: repo.links.html.href.clone(),
    }
}

fn convert_user(account: &native::Account) -> User {
    let login = account
        .nickname
        .clone()
        .filter(|nickname| !nickname.is_empty())
        .unwrap_or_else(|| account.display_name.clone());

    User {
        login,
        name: account.display_name.clone(),
        email: None,
        avatar: account.links.avatar.href.clone(),
    }
}

/// Splits a raw `Name <email>` commit identity.
fn parse_raw_author(raw: &str) -> (String, Option<String>) {
    match raw.split_once('<') {
        Some((name, rest)) => {
            let email = rest.trim_end().trim_end_matches('>').trim();
            let email = (!email.is_empty()).then(|| email.to_owned());
            (name.trim().to_owned(), email)
        }
        None => (raw.trim().to_owned(), None),
    }
}

fn convert_commit(commit: &native::Commit) -> Commit {
    let (name, email, account) = match &commit.author {
        Some(author) => {
            let (name, email) = parse_raw_author(&author.raw);
            (name, email, author.user.as_ref().map(convert_user))
        }
        None => (String::new(), None, None),
    };
    let account = account.unwrap_or_default();

    // Bitbucket doesn't distinguish the committer
    let author = Signature {
        login: account.login,
        name,
        email,
        avatar: account.avatar,
        date: commit.date,
    };

    Commit {
        sha: commit.hash.clone(),
        message: commit.message.clone(),
        committer: author.clone(),
        author,
        link: commit.links.html.href.clone(),
    }
}

fn convert_pr(pr: &native::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.id,
        title: pr.title.clone(),
        body: pr.description.clone(),
        sha: pr
            .source
            .commit
            .as_ref()
            .map(|commit| commit.hash.clone())
            .unwrap_or_default(),
        r#ref: format!("refs/pull-requests/{}/from", pr.id),
        source: pr.source.branch.name.clone(),
        target: pr.destination.branch.name.clone(),
        fork: pr
            .source
            .repository
            .as_ref()
            .map(|repo| repo.full_name.clone())
            .unwrap_or_default(),
        link: pr.links.html.href.clone(),
        labels: Vec::new(),
        closed: pr.state != "OPEN",
        merged: pr.state == "MERGED",
        author: convert_user(&pr.author),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(event: &str, data: &[u8]) -> Result<Webhook, Error> {
        decode(event, data).map(|decoded| decoded.webhook)
    }

    fn push_json() -> serde_json::Value {
        serde_json::from_slice(include_bytes!("../../testdata/bitbucket/push.json")).unwrap()
    }

    #[test]
    fn push() {
        let hook = match parse("repo:push", include_bytes!("../../testdata/bitbucket/push.json"))
            .unwrap()
        {
            Webhook::Push(hook) => hook,
            other => panic!("unexpected webhook {:?}", other),
        };

        assert_eq!(hook.r#ref, "refs/heads/master");
        assert_eq!(hook.before, "1a2b3c4d5e6f7a8b9c0d1e2f3a4b5c6d7e8f9a0b");
        assert_eq!(hook.after, "a3b6c9d2e5f8a1b4c7d0e3f6a9b2c5d8e1f4a7b0");
        assert_eq!(hook.commits.len(), 2);
        assert_eq!(hook.commit.sha, hook.after);
        assert_eq!(hook.commit.message, "Add webhook docs\n");
        assert_eq!(hook.commit.author.name, "Jane Doe");
        assert_eq!(hook.commit.author.email.as_deref(), Some("jane@example.com"));
        assert_eq!(hook.commit.author.login, "janedoe");
        assert_eq!(hook.repo.namespace, "atlassian");
        assert_eq!(hook.repo.name, "webhook-demo");
        assert_eq!(hook.repo.clone, "https://bitbucket.org/atlassian/webhook-demo.git");
        assert_eq!(hook.repo.clone_ssh, "git@bitbucket.org:atlassian/webhook-demo.git");
        assert_eq!(hook.sender.login, "janedoe");
    }

    #[test]
    fn push_without_commits_uses_actor() {
        let mut json = push_json();
        json["push"]["changes"][0]["commits"] = serde_json::json!([]);
        let data = serde_json::to_vec(&json).unwrap();

        match parse("repo:push", &data).unwrap() {
            Webhook::Push(hook) => {
                assert_eq!(hook.commit.author.login, "janedoe");
                assert_eq!(hook.commit.sha, hook.after);
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn closed_change_is_a_deletion() {
        let mut json = push_json();
        let change = &mut json["push"]["changes"][0];
        change["closed"] = true.into();
        change["new"] = serde_json::Value::Null;
        let data = serde_json::to_vec(&json).unwrap();
        match parse("repo:push", &data).unwrap() {
            Webhook::Branch(hook) => {
                assert_eq!(hook.action, Action::Delete);
                assert_eq!(hook.r#ref.name, "master");
            }
            other => panic!("unexpected webhook {:?}", other),
        }

        json["push"]["changes"][0]["old"]["type"] = "tag".into();
        let data = serde_json::to_vec(&json).unwrap();
        assert!(matches!(parse("repo:push", &data).unwrap(), Webhook::Tag(_)));
    }

    #[test]
    fn created_tag() {
        let mut json = push_json();
        let change = &mut json["push"]["changes"][0];
        change["created"] = true.into();
        change["old"] = serde_json::Value::Null;
        change["new"]["type"] = "tag".into();
        change["new"]["name"] = "v2.0".into();
        let data = serde_json::to_vec(&json).unwrap();

        match parse("repo:push", &data).unwrap() {
            Webhook::Tag(hook) => {
                assert_eq!(hook.action, Action::Create);
                assert_eq!(hook.r#ref.name, "v2.0");
                assert_eq!(
                    hook.r#ref.sha.as_deref(),
                    Some("a3b6c9d2e5f8a1b4c7d0e3f6a9b2c5d8e1f4a7b0")
                );
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn moved_tag_is_a_tag_update() {
        let mut json = push_json();
        let change = &mut json["push"]["changes"][0];
        change["old"]["type"] = "tag".into();
        change["old"]["name"] = "v2.0".into();
        change["new"]["type"] = "tag".into();
        change["new"]["name"] = "v2.0".into();
        let data = serde_json::to_vec(&json).unwrap();

        match parse("repo:push", &data).unwrap() {
            Webhook::Tag(hook) => {
                assert_eq!(hook.action, Action::Update);
                assert_eq!(hook.r#ref.name, "v2.0");
                assert_eq!(
                    hook.r#ref.sha.as_deref(),
                    Some("a3b6c9d2e5f8a1b4c7d0e3f6a9b2c5d8e1f4a7b0")
                );
                assert_eq!(hook.sender.login, "janedoe");
            }
            other => panic!("unexpected webhook {:?}", other),
        }
    }

    #[test]
    fn unknown_ref_type() {
        let mut json = push_json();
        json["push"]["changes"][0]["new"]["type"] = "named_branch".into();
        let data = serde_json::to_vec(&json).unwrap();
        assert!(matches!(
            parse("repo:push", &data),
            Err(Error::UnknownWebhook { event }) if event == "named_branch"
        ));
    }

    #[test]
    fn push_without_changes_is_malformed() {
        let mut json = push_json();
        json["push"]["changes"] = serde_json::json!([]);
        let data = serde_json::to_vec(&json).unwrap();
        assert!(matches!(
            parse("repo:push", &data),
            Err(Error::MalformedPayload(_))
        ));
    }

    #[test]
    fn pull_request_actions_follow_the_event_key() {
        let data = include_bytes!("../../testdata/bitbucket/pull_request.json");
        for (event, action) in [
            ("pullrequest:created", Action::Open),
            ("pullrequest:updated", Action::Sync),
            ("pullrequest:fulfilled", Action::Merge),
            ("pullrequest:rejected", Action::Close),
        ] {
            match parse(event, data).unwrap() {
                Webhook::PullRequest(hook) => {
                    assert_eq!(hook.action, action, "{}", event);
                    assert_eq!(hook.pull_request.number, 3);
                    assert_eq!(hook.pull_request.source, "feature/docs");
                    assert_eq!(hook.pull_request.target, "master");
                    assert_eq!(hook.pull_request.fork, "janedoe/webhook-demo");
                    assert_eq!(hook.pull_request.author.login, "janedoe");
                    assert!(!hook.pull_request.closed);
                }
                other => panic!("unexpected webhook {:?}", other),
            }
        }
    }

    #[test]
    fn pull_request_comments() {
        let data = include_bytes!("../../testdata/bitbucket/pull_request_comment.json");
        for (event, action) in [
            ("pullrequest:comment_created", Action::Create),
            ("pullrequest:comment_updated", Action::Update),
            ("pullrequest:comment_deleted", Action::Delete),
        ] {
            match parse(event, data).unwrap() {
                Webhook::PullRequestComment(hook) => {
                    assert_eq!(hook.action, action, "{}", event);
                    assert_eq!(hook.pull_request.number, 3);
                    assert_eq!(hook.comment.id, 42);
                    assert_eq!(hook.comment.body, "Looks good");
                    assert_eq!(hook.comment.author.login, "reviewer");
                    assert_eq!(hook.repo.full_name(), "atlassian/webhook-demo");
                    assert_eq!(hook.sender.login, "reviewer");
                }
                other => panic!("unexpected webhook {:?}", other),
            }
        }
    }

    #[test]
    fn raw_authors() {
        assert_eq!(
            parse_raw_author("Jane Doe <jane@example.com>"),
            ("Jane Doe".to_owned(), Some("jane@example.com".to_owned()))
        );
        assert_eq!(parse_raw_author("jane"), ("jane".to_owned(), None));
        assert_eq!(parse_raw_author("Jane <>"), ("Jane".to_owned(), None));
    }

    #[test]
    fn unknown_event_key() {
        assert!(matches!(
            parse("issue:created", b"{}"),
            Err(Error::UnknownWebhook { event }) if event == "issue:created"
        ));
    }
}
