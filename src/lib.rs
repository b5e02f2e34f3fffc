//! Normalizes webhook deliveries from source-control hosts into one event model.
//!
//! A delivery is wrapped in a [`Request`] and handed to [`parse`] along with the [`Driver`] it
//! came from and a [`SecretResolver`] looking up the signing key for the decoded repository:
//!
//! ```
//! use forgehook::{BoxError, Driver, Request, Webhook};
//!
//! let body = br#"{"ref": "refs/heads/main", "ref_type": "branch",
//!     "repository": {"id": 1, "name": "hello", "full_name": "octocat/hello", "private": false,
//!         "html_url": "https://github.com/octocat/hello",
//!         "clone_url": "https://github.com/octocat/hello.git",
//!         "ssh_url": "git@github.com:octocat/hello.git", "default_branch": "main",
//!         "owner": {"login": "octocat", "id": 1}},
//!     "sender": {"login": "octocat", "id": 1}}"#;
//! let request = Request::new(body.to_vec())?.with_header("X-GitHub-Event", "create");
//!
//! // an empty key accepts the delivery without checking its signature
//! let unauthenticated = |_: &Webhook| Ok::<_, BoxError>(String::new());
//! let webhook = forgehook::parse(Driver::Github, &request, &unauthenticated)?;
//! assert_eq!(webhook.repository().full_name(), "octocat/hello");
//! # Ok::<(), forgehook::Error>(())
//! ```

pub mod action;
pub mod driver;
pub mod error;
pub mod event;
pub mod webhooks;

pub use action::Action;
pub use driver::Driver;
pub use error::{BoxError, Error};
pub use event::Webhook;
pub use webhooks::{parse, Request, SecretResolver, WebhookService, MAX_PAYLOAD_SIZE};
