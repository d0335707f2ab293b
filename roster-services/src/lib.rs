//! # roster-services
//!
//! One synchronizer per external system, each mapping the desired-state
//! model onto reconciliation passes over a capability port, plus the run
//! coordinator that sequences them.
//!
//! Synchronizers hold injected port handles and a shared reference to the
//! read-only [`roster_core::DesiredState`]; the only state that crosses
//! synchronizer boundaries is the explicit
//! [`synchronizer::RunState`] credential hand-off.

pub mod github;
pub mod keycloak;
pub mod minio;
pub mod runner;
pub mod secrets;
pub mod slack;
pub mod synchronizer;

pub use github::GithubSynchronizer;
pub use keycloak::{KeycloakSynchronizer, OidcClientPort, OidcClientSpec};
pub use minio::{MinioSynchronizer, StoragePort};
pub use runner::{Runner, ServiceName};
pub use secrets::{AuthEndpoints, SecretsSynchronizer};
pub use slack::SlackSynchronizer;
pub use synchronizer::{RunState, StorageCredentials, Synchronizer, TeamStorageCredentials};
