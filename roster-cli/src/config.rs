//! Environment-derived configuration.
//!
//! Every credential a selected service needs is validated here, before any
//! reconciliation starts: a missing variable aborts the whole run with no
//! partial state mutation attempted.

use anyhow::{Context, Result};
use roster_services::ServiceName;

/// Default organization name on the source-control host.
pub const DEFAULT_ORG: &str = "RidgelineLabs";

/// Default secret-store KV mount.
pub const DEFAULT_VAULT_MOUNT: &str = "ridgeline";

/// Default object-store console endpoint.
pub const DEFAULT_MINIO_ENDPOINT: &str = "https://minio.ridgelinelabs.org";

#[derive(Debug, Clone)]
pub struct GithubSettings {
    pub token: String,
    pub org: String,
}

#[derive(Debug, Clone)]
pub struct KeycloakSettings {
    pub server_url: String,
    pub realm: String,
    pub user_realm: String,
    pub client_id: String,
    pub password: String,
}

impl KeycloakSettings {
    /// Issuer URL of the realm the clients live in.
    pub fn issuer(&self) -> String {
        format!("{}/realms/{}", self.server_url.trim_end_matches('/'), self.realm)
    }
}

#[derive(Debug, Clone)]
pub struct VaultSettings {
    pub addr: String,
    pub token: String,
    pub mount: String,
}

#[derive(Debug, Clone)]
pub struct SlackSettings {
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct MinioSettings {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
}

/// Settings for every selected service; unselected services stay `None`
/// and their variables are never read.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub github: Option<GithubSettings>,
    pub keycloak: Option<KeycloakSettings>,
    pub vault: Option<VaultSettings>,
    pub slack: Option<SlackSettings>,
    pub minio: Option<MinioSettings>,
}

impl Settings {
    pub fn from_env(selected: &[ServiceName]) -> Result<Self> {
        let mut settings = Settings::default();

        if selected.contains(&ServiceName::Github) {
            settings.github = Some(GithubSettings {
                token: required("GITHUB_TOKEN")?,
                org: optional("GITHUB_ORG").unwrap_or_else(|| DEFAULT_ORG.to_owned()),
            });
        }

        // The secrets pass reads broker client secrets, so it needs the
        // broker credentials too.
        if selected.contains(&ServiceName::Keycloak) || selected.contains(&ServiceName::Secrets) {
            let realm = required("KEYCLOAK_REALM")?;
            settings.keycloak = Some(KeycloakSettings {
                server_url: required("KEYCLOAK_SERVER_URL")?,
                user_realm: optional("KEYCLOAK_USER_REALM").unwrap_or_else(|| realm.clone()),
                realm,
                client_id: required("KEYCLOAK_CLIENT_ID")?,
                password: required("KEYCLOAK_PASSWORD")?,
            });
        }

        if selected.contains(&ServiceName::Secrets) {
            settings.vault = Some(VaultSettings {
                addr: required("VAULT_ADDR")?,
                token: required("VAULT_TOKEN")?,
                mount: optional("VAULT_MOUNT").unwrap_or_else(|| DEFAULT_VAULT_MOUNT.to_owned()),
            });
        }

        if selected.contains(&ServiceName::Slack) {
            settings.slack = Some(SlackSettings {
                token: required("SLACK_TOKEN")?,
            });
        }

        if selected.contains(&ServiceName::Minio) {
            settings.minio = Some(MinioSettings {
                endpoint: optional("MINIO_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_MINIO_ENDPOINT.to_owned()),
                access_key: required("MINIO_ACCESS_KEY")?,
                secret_key: required("MINIO_SECRET_KEY")?,
            });
        }

        Ok(settings)
    }
}

fn required(name: &str) -> Result<String> {
    optional(name).with_context(|| format!("{name} is not set"))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
