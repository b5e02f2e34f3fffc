use std::fmt::{self, Display};

use serde::Serialize;

/// Provider-independent action carried by a webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Delete,
    Update,
    Open,
    Reopen,
    Close,
    Label,
    Unlabel,
    Merge,
    Sync,
    Assigned,
    Unassigned,
    Submitted,
    Dismissed,
    Edited,
    #[default]
    Unknown,
}

const VERBS: &[(&str, Action)] = &[
    ("create", Action::Create),
    ("created", Action::Create),
    ("delete", Action::Delete),
    ("deleted", Action::Delete),
    ("update", Action::Update),
    ("updated", Action::Update),
    ("edit", Action::Update),
    ("edited", Action::Update),
    ("open", Action::Open),
    ("opened", Action::Open),
    ("reopen", Action::Reopen),
    ("reopened", Action::Reopen),
    ("close", Action::Close),
    ("closed", Action::Close),
    ("label", Action::Label),
    ("labeled", Action::Label),
    ("label_updated", Action::Label),
    ("unlabel", Action::Unlabel),
    ("unlabeled", Action::Unlabel),
    ("label_cleared", Action::Unlabel),
    ("merge", Action::Merge),
    ("merged", Action::Merge),
    ("synchronize", Action::Sync),
    ("synchronized", Action::Sync),
    ("assigned", Action::Assigned),
    ("unassigned", Action::Unassigned),
    ("reviewed", Action::Submitted),
    ("submitted", Action::Submitted),
    ("dismissed", Action::Dismissed),
];

// review deliveries describe what happened to the review itself, so "edited" doesn't collapse
// into Update here
const REVIEW_VERBS: &[(&str, Action)] = &[
    ("submitted", Action::Submitted),
    ("edited", Action::Edited),
    ("dismissed", Action::Dismissed),
    ("pull_request_review_approved", Action::Submitted),
    ("pull_request_review_comment", Action::Edited),
    ("pull_request_review_rejected", Action::Dismissed),
];

fn lookup(table: &[(&str, Action)], verb: &str) -> Action {
    table
        .iter()
        .find(|(known, _)| *known == verb)
        .map(|(_, action)| *action)
        .unwrap_or_default()
}

impl Action {
    /// Maps a provider verb such as `"closed"` onto the canonical taxonomy.
    ///
    /// Matching is case-sensitive. Verbs we don't know about become [`Action::Unknown`].
    pub fn from_verb(verb: &str) -> Self {
        lookup(VERBS, verb)
    }

    /// Same as [`Action::from_verb`], for verbs describing a pull request review.
    pub fn from_review_verb(verb: &str) -> Self {
        lookup(REVIEW_VERBS, verb)
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Create => "create",
            Self::Delete => "delete",
            Self::Update => "update",
            Self::Open => "open",
            Self::Reopen => "reopen",
            Self::Close => "close",
            Self::Label => "label",
            Self::Unlabel => "unlabel",
            Self::Merge => "merge",
            Self::Sync => "sync",
            Self::Assigned => "assigned",
            Self::Unassigned => "unassigned",
            Self::Submitted => "submitted",
            Self::Dismissed => "dismissed",
            Self::Edited => "edited",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}
