//! Vault KV-v2 REST adapter for the secret-store port.

use serde_json::json;

use roster_engine::{PortError, SecretBundle, SecretStorePort};

use crate::config::VaultSettings;

use super::{agent, http_err};

pub struct VaultClient {
    agent: ureq::Agent,
    settings: VaultSettings,
}

impl VaultClient {
    pub fn new(settings: VaultSettings) -> Self {
        Self {
            agent: agent(),
            settings,
        }
    }

    fn metadata_url(&self, path: &str) -> String {
        format!(
            "{}/v1/{}/metadata/{path}",
            self.settings.addr.trim_end_matches('/'),
            self.settings.mount
        )
    }

    /// 200 → true, 404 → false, anything else is a real failure.
    fn probe(&self, method: &str, url: &str) -> Result<bool, PortError> {
        match self
            .agent
            .request(method, url)
            .set("X-Vault-Token", &self.settings.token)
            .call()
        {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(err) => Err(http_err(url, err)),
        }
    }
}

impl SecretStorePort for VaultClient {
    fn any_secrets_under(&mut self, prefix: &str) -> Result<bool, PortError> {
        // A team may have either a folder or a flat secret at its slug.
        if self.probe("LIST", &self.metadata_url(prefix))? {
            return Ok(true);
        }
        self.probe("GET", &self.metadata_url(prefix))
    }

    fn write_bundle(&mut self, path: &str, bundle: &SecretBundle) -> Result<(), PortError> {
        let url = format!(
            "{}/v1/{}/data/{path}",
            self.settings.addr.trim_end_matches('/'),
            self.settings.mount
        );
        self.agent
            .post(&url)
            .set("X-Vault-Token", &self.settings.token)
            .send_json(json!({ "data": bundle }))
            .map_err(|e| http_err(path, e))?;
        Ok(())
    }
}
