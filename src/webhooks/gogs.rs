use crate::{
    action::Action,
    driver::Driver,
    event::{PullRequest, PullRequestHook, Webhook},
    webhooks::{
        gitea::{self, GiteaEventType},
        signing::{Algorithm, Scheme, SignatureHeader},
        Decoded, WebhookService,
    },
    Error,
};

mod events;
use events as native;

pub static SERVICE: WebhookService = WebhookService {
    driver: Driver::Gogs,
    event_header: "X-Gogs-Event",
    signatures: &[SignatureHeader {
        name: "X-Gogs-Signature",
        scheme: Scheme::Hmac {
            algorithm: Algorithm::Sha256,
            prefix: None,
        },
    }],
    decode,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GogsEventType {
    Push,
    Create,
    Delete,
    Issues,
    IssueComment,
    PullRequest,
}

impl GogsEventType {
    fn from_header(event: &str) -> Option<Self> {
        let event_type = match event {
            "push" => Self::Push,
            "create" => Self::Create,
            "delete" => Self::Delete,
            "issues" => Self::Issues,
            "issue_comment" => Self::IssueComment,
            "pull_request" => Self::PullRequest,
            _ => return None,
        };
        Some(event_type)
    }
}

fn decode(event: &str, data: &[u8]) -> Result<Decoded, Error> {
    let event_type =
        GogsEventType::from_header(event).ok_or_else(|| Error::unknown_webhook(event))?;

    let shared = match event_type {
        GogsEventType::Push => GiteaEventType::Push,
        GogsEventType::Create => GiteaEventType::Create,
        GogsEventType::Delete => GiteaEventType::Delete,
        GogsEventType::Issues => GiteaEventType::Issues,
        GogsEventType::IssueComment => GiteaEventType::IssueComment,
        GogsEventType::PullRequest => {
            return Ok(convert_pull_request(serde_json::from_slice(data)?).into())
        }
    };

    gitea::decode_event(shared, data)
}

fn convert_pull_request(hook: native::PullRequestHook) -> Webhook {
    Webhook::PullRequest(PullRequestHook {
        action: Action::from_verb(&hook.action),
        pull_request: convert_pull(&hook.pull_request),
        repo: gitea::convert_repository(&hook.repository),
        sender: gitea::convert_user(&hook.sender),
    })
}

fn convert_pull(pr: &native::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        title: pr.title.clone(),
        body: pr.body.clone(),
        // the head sha is only known once merged
        sha: pr.merged_commit_id.clone().unwrap_or_default(),
        r#ref: format!("refs/pull/{}/head", pr.number),
        source: pr.head_branch.clone(),
        target: pr.base_branch.clone(),
        fork: pr
            .head_repo
            .as_ref()
            .map(|r| r.full_name.clone())
            .unwrap_or_default(),
        link: pr.html_url.clone(),
        labels: gitea::labels(&pr.labels),
        closed: pr.state == "closed",
        merged: pr.merged,
        author: gitea::convert_user(&pr.user),
    }
}
