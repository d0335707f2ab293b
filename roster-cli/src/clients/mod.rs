//! Service adapters: thin REST implementations of the capability ports,
//! constructed once at startup and moved into the synchronizers.
//!
//! Every external call goes through a shared [`ureq::Agent`] with a fixed
//! 10-second timeout; failures are translated into
//! [`roster_engine::PortError`] at the call site and classified by the
//! engine, never bubbled up as transport errors.

pub mod github;
pub mod keycloak;
pub mod minio;
pub mod slack;
pub mod vault;

use std::time::Duration;

use roster_engine::PortError;

pub use github::GithubClient;
pub use keycloak::KeycloakClient;
pub use minio::MinioClient;
pub use slack::SlackClient;
pub use vault::VaultClient;

/// Fixed per-call timeout for every external request.
const CALL_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new().timeout(CALL_TIMEOUT).build()
}

/// Translate a transport-level failure into a port error.
pub(crate) fn http_err(what: &str, err: ureq::Error) -> PortError {
    match err {
        ureq::Error::Status(401 | 403, _) => PortError::Denied(format!("{what}: HTTP authorization failed")),
        ureq::Error::Status(code, _) => PortError::Protocol(format!("{what}: HTTP {code}")),
        ureq::Error::Transport(transport) => PortError::Unavailable(format!("{what}: {transport}")),
    }
}

/// Translate a body-parse failure into a port error.
pub(crate) fn body_err(what: &str, err: std::io::Error) -> PortError {
    PortError::Protocol(format!("{what}: invalid response body: {err}"))
}
