use crate::{
    action::Action,
    driver::Driver,
    event::{
        BranchHook, Comment, Commit, Issue, IssueCommentHook, IssueHook, PullRequest,
        PullRequestCommentHook, PullRequestHook, PushHook, Reference, Repository, Signature,
        TagHook, User, Webhook,
    },
    webhooks::{
        non_empty, short_ref,
        signing::{Scheme, SignatureHeader},
        Decoded, WebhookService,
    },
    Error,
};

mod events;
use events as native;

/// `after` of a push deleting a ref.
const ZERO_SHA: &str = "0000000000000000000000000000000000000000";

pub static SERVICE: WebhookService = WebhookService {
    driver: Driver::Gitlab,
    event_header: "X-Gitlab-Event",
    signatures: &[SignatureHeader {
        name: "X-Gitlab-Token",
        scheme: Scheme::Token,
    }],
    decode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GitLabEventType {
    Push,
    Issue,
    MergeRequest,
    Note,
}

impl GitLabEventType {
    fn from_header(event: &str) -> Option<Self> {
        let event_type = match event {
            "Push Hook" | "Tag Push Hook" => Self::Push,
            "Issue Hook" => Self::Issue,
            "Merge Request Hook" => Self::MergeRequest,
            "Note Hook" => Self::Note,
            _ => return None,
        };
        Some(event_type)
    }
}

fn decode(event: &str, data: &[u8]) -> Result<Decoded, Error> {
    let event_type =
        GitLabEventType::from_header(event).ok_or_else(|| Error::unknown_webhook(event))?;

    let webhook = match event_type {
        GitLabEventType::Push => convert_push(serde_json::from_slice(data)?)?,
        GitLabEventType::Issue => convert_issue_hook(serde_json::from_slice(data)?),
        GitLabEventType::MergeRequest => convert_merge_request(serde_json::from_slice(data)?),
        GitLabEventType::Note => convert_note(serde_json::from_slice(data)?)?,
    };

    Ok(webhook.into())
}

fn convert_push(push: native::PushHook) -> Result<Webhook, Error> {
    let deleted = push.after == ZERO_SHA;
    let sender = User {
        login: push.user_username.clone(),
        name: push.user_name.clone(),
        email: non_empty(push.user_email.clone()),
        avatar: push.user_avatar.clone().unwrap_or_default(),
    };

    match push.object_kind.as_str() {
        "push" if deleted => Ok(Webhook::Branch(BranchHook {
            r#ref: deleted_ref(&push),
            action: Action::Delete,
            repo: convert_repository(&push.project),
            sender,
        })),
        "tag_push" if deleted => Ok(Webhook::Tag(TagHook {
            r#ref: deleted_ref(&push),
            action: Action::Delete,
            repo: convert_repository(&push.project),
            sender,
        })),
        // creations are reported as pushes, they carry the commit details
        "push" | "tag_push" => Ok(convert_push_hook(push, sender)),
        _ => Err(Error::unknown_webhook(push.object_kind)),
    }
}

fn deleted_ref(push: &native::PushHook) -> Reference {
    Reference {
        name: short_ref(&push.r#ref).to_owned(),
        sha: Some(push.before.clone()),
    }
}

fn convert_push_hook(push: native::PushHook, sender: User) -> Webhook {
    let commits: Vec<Commit> = push.commits.iter().map(convert_commit).collect();
    let head = push.checkout_sha.as_deref().unwrap_or(&push.after);
    let compare = format!(
        "{}/-/compare/{}...{}",
        push.project.web_url, push.before, push.after
    );

    // GitLab lists the oldest commit first
    let commit = match commits.last() {
        Some(last) => commits
            .iter()
            .find(|c| c.sha == head)
            .unwrap_or(last)
            .clone(),
        None => Commit::pushed_by(&sender, &push.after, &compare),
    };

    Webhook::Push(PushHook {
        r#ref: push.r#ref,
        before: push.before,
        after: push.after,
        compare,
        commit,
        commits,
        repo: convert_repository(&push.project),
        sender,
    })
}

fn convert_issue_hook(hook: native::IssueHook) -> Webhook {
    let sender = convert_user(&hook.user);
    let action = hook
        .object_attributes
        .action
        .as_deref()
        .map(Action::from_verb)
        .unwrap_or_default();

    Webhook::Issue(IssueHook {
        action,
        issue: convert_issue(&hook.object_attributes, &hook.labels, &sender),
        repo: convert_repository(&hook.project),
        sender,
    })
}

fn convert_merge_request(hook: native::MergeRequestHook) -> Webhook {
    let sender = convert_user(&hook.user);
    let attributes = &hook.object_attributes;
    let action = match attributes.action.as_deref() {
        // an update carrying `oldrev` means new commits were pushed to the source branch
        Some("update") if attributes.oldrev.is_some() => Action::Sync,
        Some(verb) => Action::from_verb(verb),
        None => Action::Unknown,
    };

    Webhook::PullRequest(PullRequestHook {
        action,
        pull_request: convert_merge_request_attributes(attributes, &hook.labels, &sender),
        repo: convert_repository(&hook.project),
        sender,
    })
}

fn convert_note(hook: native::NoteHook) -> Result<Webhook, Error> {
    let sender = convert_user(&hook.user);
    let note = &hook.object_attributes;
    let action = note
        .action
        .as_deref()
        .map(Action::from_verb)
        // older GitLab versions only send notes on creation
        .unwrap_or(Action::Create);
    let comment = Comment {
        id: note.id,
        body: note.note.clone(),
        author: sender.clone(),
        link: note.url.clone(),
    };
    let repo = convert_repository(&hook.project);

    match note.noteable_type.as_str() {
        "Issue" => {
            let issue = hook
                .issue
                .as_ref()
                .ok_or_else(|| Error::malformed("issue note without issue"))?;
            Ok(Webhook::IssueComment(IssueCommentHook {
                action,
                issue: convert_issue(issue, &None, &sender),
                comment,
                repo,
                sender,
            }))
        }
        "MergeRequest" => {
            let mr = hook
                .merge_request
                .as_ref()
                .ok_or_else(|| Error::malformed("merge request note without merge request"))?;
            Ok(Webhook::PullRequestComment(PullRequestCommentHook {
                action,
                pull_request: convert_merge_request_attributes(mr, &None, &sender),
                comment,
                repo,
                sender,
            }))
        }
        other => Err(Error::unknown_webhook(other)),
    }
}

fn convert_repository(project: &native::Project) -> Repository {
    // `name` is the display name, the path is what identifies the project
    let (namespace, name) = project
        .path_with_namespace
        .rsplit_once('/')
        .unwrap_or(("", &project.path_with_namespace));

    Repository {
        id: project.id.to_string(),
        namespace: namespace.to_owned(),
        name: name.to_owned(),
        branch: project.default_branch.clone().unwrap_or_default(),
        private: project.visibility_level == 0,
        clone: project.git_http_url.clone(),
        clone_ssh: project.git_ssh_url.clone(),
        link: project.web_url.clone(),
    }
}

fn convert_user(user: &native::GitLabUser) -> User {
    User {
        login: user.username.clone(),
        name: user.name.clone(),
        email: non_empty(user.email.clone()),
        avatar: user.avatar_url.clone().unwrap_or_default(),
    }
}

fn convert_commit(commit: &native::Commit) -> Commit {
    // GitLab only gives a name and email for commit authors
    let author = Signature {
        login: String::new(),
        name: commit.author.name.clone(),
        email: non_empty(commit.author.email.clone()),
        avatar: String::new(),
        date: commit.timestamp,
    };

    Commit {
        sha: commit.id.clone(),
        message: commit.message.clone(),
        committer: author.clone(),
        author,
        link: commit.url.clone(),
    }
}

fn labels(labels: &Option<Vec<native::Label>>) -> Vec<String> {
    labels
        .iter()
        .flatten()
        .map(|label| label.title.clone())
        .collect()
}

// issue and merge request hooks only carry the author's id, so the acting user stands in
fn convert_issue(
    issue: &native::IssueAttributes,
    issue_labels: &Option<Vec<native::Label>>,
    author: &User,
) -> Issue {
    Issue {
        number: issue.iid,
        title: issue.title.clone(),
        body: issue.description.clone().unwrap_or_default(),
        link: issue.url.clone(),
        labels: labels(issue_labels),
        closed: issue.state == "closed",
        author: author.clone(),
    }
}

fn convert_merge_request_attributes(
    mr: &native::MergeRequestAttributes,
    mr_labels: &Option<Vec<native::Label>>,
    author: &User,
) -> PullRequest {
    PullRequest {
        number: mr.iid,
        title: mr.title.clone(),
        body: mr.description.clone().unwrap_or_default(),
        sha: mr
            .last_commit
            .as_ref()
            .map(|c| c.id.clone())
            .unwrap_or_default(),
        r#ref: format!("refs/merge-requests/{}/head", mr.iid),
        source: mr.source_branch.clone(),
        target: mr.target_branch.clone(),
        fork: mr
            .source
            .as_ref()
            .map(|s| s.path_with_namespace.clone())
            .unwrap_or_default(),
        link: mr.url.clone(),
        labels: labels(mr_labels),
        closed: mr.state == "closed" || mr.state == "merged",
        merged: mr.state == "merged",
        author: author.clone(),
    }
}
