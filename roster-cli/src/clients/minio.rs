//! MinIO console REST adapter for the storage port.
//!
//! Service-account credentials are generated client-side and handed to the
//! console API, so the caller holds them without a read-back.

use std::collections::BTreeSet;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde_json::{json, Value};

use roster_engine::PortError;
use roster_services::minio::StoragePort;
use roster_services::synchronizer::StorageCredentials;

use crate::config::MinioSettings;

use super::{agent, body_err, http_err};

const ACCESS_KEY_LEN: usize = 20;
const SECRET_KEY_LEN: usize = 40;
const BUCKET_QUOTA_BYTES: u64 = 1024 * 1024 * 1024;

pub struct MinioClient {
    agent: ureq::Agent,
    endpoint: String,
    cookie: String,
}

impl MinioClient {
    /// Log in to the console API and keep the session cookie.
    pub fn connect(settings: MinioSettings) -> Result<Self, PortError> {
        let agent = agent();
        let endpoint = settings.endpoint.trim_end_matches('/').to_owned();
        let response = agent
            .post(&format!("{endpoint}/api/v1/login"))
            .send_json(json!({
                "accessKey": settings.access_key,
                "secretKey": settings.secret_key,
            }))
            .map_err(|e| http_err("minio login", e))?;
        let cookie = response
            .header("set-cookie")
            .and_then(|cookie| cookie.split(';').next())
            .ok_or_else(|| PortError::Protocol("minio login returned no session cookie".into()))?
            .to_owned();
        Ok(Self {
            agent,
            endpoint,
            cookie,
        })
    }

    fn get(&self, path: &str) -> Result<Value, PortError> {
        self.agent
            .get(&format!("{}{path}", self.endpoint))
            .set("Cookie", &self.cookie)
            .call()
            .map_err(|e| http_err(path, e))?
            .into_json()
            .map_err(|e| body_err(path, e))
    }

    fn post(&self, path: &str, body: Value) -> Result<(), PortError> {
        self.agent
            .post(&format!("{}{path}", self.endpoint))
            .set("Cookie", &self.cookie)
            .send_json(body)
            .map_err(|e| http_err(path, e))?;
        Ok(())
    }
}

fn random_key(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

impl StoragePort for MinioClient {
    fn list_buckets(&mut self) -> Result<BTreeSet<String>, PortError> {
        let body = self.get("/api/v1/buckets")?;
        Ok(body["buckets"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|bucket| bucket["name"].as_str())
            .map(str::to_owned)
            .collect())
    }

    fn create_bucket(&mut self, name: &str) -> Result<(), PortError> {
        self.post(
            "/api/v1/buckets",
            json!({
                "name": name,
                "versioning": { "enabled": false },
                "quota": {
                    "enabled": true,
                    "quota_type": "hard",
                    "amount": BUCKET_QUOTA_BYTES,
                },
            }),
        )
    }

    fn list_service_accounts(&mut self) -> Result<BTreeSet<String>, PortError> {
        let body = self.get("/api/v1/service-accounts")?;
        // Some service accounts have no name; those are not ours.
        Ok(body
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|account| account["name"].as_str())
            .map(str::to_owned)
            .collect())
    }

    fn create_service_account(
        &mut self,
        name: &str,
        description: &str,
        policy: &Value,
    ) -> Result<StorageCredentials, PortError> {
        let credentials = StorageCredentials {
            access_key: random_key(ACCESS_KEY_LEN),
            secret_key: random_key(SECRET_KEY_LEN),
        };
        self.post(
            "/api/v1/service-account-credentials",
            json!({
                "name": name,
                "access_key": credentials.access_key,
                "secret_key": credentials.secret_key,
                "description": description,
                "policy": policy.to_string(),
            }),
        )?;
        Ok(credentials)
    }
}
