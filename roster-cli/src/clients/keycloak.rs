//! Keycloak admin REST adapter for the broker membership and OIDC client
//! ports.
//!
//! Group keys are flat broker group names (`<slug>-admins`, …); identities
//! are broker usernames, matched case-insensitively the way the admin API
//! reports them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::{json, Value};

use roster_engine::{GroupRef, GroupSpec, Identity, MembershipPort, PortError, Role};
use roster_services::keycloak::{OidcClientPort, OidcClientSpec};

use crate::config::KeycloakSettings;

use super::{agent, body_err, http_err};

const ADMIN_USERNAME: &str = "admin";
const LIST_MAX: usize = 2000;

pub struct KeycloakClient {
    agent: ureq::Agent,
    settings: KeycloakSettings,
    token: Option<String>,
    group_ids: HashMap<String, String>,
}

impl KeycloakClient {
    pub fn new(settings: KeycloakSettings) -> Self {
        Self {
            agent: agent(),
            settings,
            token: None,
            group_ids: HashMap::new(),
        }
    }

    /// Password-grant admin token, fetched once per run.
    fn token(&mut self) -> Result<String, PortError> {
        if let Some(token) = &self.token {
            return Ok(token.clone());
        }
        let url = format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.settings.server_url.trim_end_matches('/'),
            self.settings.user_realm
        );
        let body: Value = self
            .agent
            .post(&url)
            .send_form(&[
                ("grant_type", "password"),
                ("client_id", &self.settings.client_id),
                ("username", ADMIN_USERNAME),
                ("password", &self.settings.password),
            ])
            .map_err(|e| http_err("broker token", e))?
            .into_json()
            .map_err(|e| body_err("broker token", e))?;
        let token = body["access_token"]
            .as_str()
            .ok_or_else(|| PortError::Protocol("broker token response has no access_token".into()))?
            .to_owned();
        self.token = Some(token.clone());
        Ok(token)
    }

    fn admin_url(&self, path: &str) -> String {
        format!(
            "{}/admin/realms/{}{path}",
            self.settings.server_url.trim_end_matches('/'),
            self.settings.realm
        )
    }

    fn get(&mut self, path: &str) -> Result<Value, PortError> {
        let token = self.token()?;
        self.agent
            .get(&self.admin_url(path))
            .set("Authorization", &format!("Bearer {token}"))
            .call()
            .map_err(|e| http_err(path, e))?
            .into_json()
            .map_err(|e| body_err(path, e))
    }

    fn send(&mut self, method: &str, path: &str, body: Option<Value>) -> Result<(), PortError> {
        let token = self.token()?;
        let request = self
            .agent
            .request(method, &self.admin_url(path))
            .set("Authorization", &format!("Bearer {token}"));
        match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        }
        .map_err(|e| http_err(path, e))?;
        Ok(())
    }

    fn is_missing(err: &PortError) -> bool {
        matches!(err, PortError::Protocol(msg) if msg.contains("HTTP 404"))
    }

    /// Resolve a username to the broker's internal user ID.
    fn user_id(&mut self, username: &Identity) -> Result<String, PortError> {
        let users = self.get(&format!("/users?username={username}&exact=true"))?;
        let users = users.as_array().cloned().unwrap_or_default();
        match users.len() {
            0 => Err(PortError::UnknownIdentity(username.0.clone())),
            1 => users[0]["id"]
                .as_str()
                .map(str::to_owned)
                .ok_or_else(|| PortError::Protocol("user record has no id".into())),
            _ => Err(PortError::AmbiguousIdentity(username.0.clone())),
        }
    }

    fn group_id(&mut self, group: &GroupRef) -> Result<String, PortError> {
        if let Some(id) = self.group_ids.get(&group.key) {
            return Ok(id.clone());
        }
        let found = self.get(&format!("/group-by-path/{}", group.key))?;
        let id = found["id"]
            .as_str()
            .ok_or_else(|| PortError::UnknownGroup(group.key.clone()))?
            .to_owned();
        self.group_ids.insert(group.key.clone(), id.clone());
        Ok(id)
    }
}

impl MembershipPort for KeycloakClient {
    fn ensure_group(&mut self, spec: &GroupSpec) -> Result<GroupRef, PortError> {
        let group = GroupRef {
            key: spec.key.clone(),
            name: spec.name.clone(),
        };
        match self.group_id(&group) {
            Ok(_) => Ok(group),
            Err(err) if Self::is_missing(&err) => {
                self.send("POST", "/groups", Some(json!({ "name": spec.key })))?;
                self.group_id(&group)?;
                Ok(group)
            }
            Err(err) => Err(err),
        }
    }

    fn list_members(&mut self, group: &GroupRef) -> Result<BTreeMap<Identity, Role>, PortError> {
        let id = self.group_id(group)?;
        let members = self.get(&format!(
            "/groups/{id}/members?max={LIST_MAX}&briefRepresentation=true"
        ))?;
        Ok(members
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .filter_map(|member| member["username"].as_str())
            .map(|username| (Identity::from(username.to_lowercase()), Role::Member))
            .collect())
    }

    fn add_member(
        &mut self,
        group: &GroupRef,
        identity: &Identity,
        _role: Role,
    ) -> Result<(), PortError> {
        let group_id = self.group_id(group)?;
        let user_id = self.user_id(identity)?;
        self.send("PUT", &format!("/users/{user_id}/groups/{group_id}"), None)
    }

    fn remove_member(&mut self, group: &GroupRef, identity: &Identity) -> Result<(), PortError> {
        let group_id = self.group_id(group)?;
        let user_id = self.user_id(identity)?;
        self.send("DELETE", &format!("/users/{user_id}/groups/{group_id}"), None)
    }
}

impl OidcClientPort for KeycloakClient {
    fn list_client_ids(&mut self) -> Result<BTreeSet<String>, PortError> {
        let clients = self.get(&format!("/clients?max={LIST_MAX}"))?;
        Ok(clients
            .as_array()
            .cloned()
            .unwrap_or_default()
            .iter()
            .filter_map(|client| client["clientId"].as_str())
            .map(str::to_owned)
            .collect())
    }

    fn create_client(&mut self, spec: &OidcClientSpec) -> Result<(), PortError> {
        self.send(
            "POST",
            "/clients",
            Some(json!({
                "clientId": spec.client_id,
                "rootUrl": spec.root_url,
                "redirectUris": spec.redirect_uris,
                "attributes": {
                    "post.logout.redirect.uris": spec.post_logout_redirect_uris,
                },
                "serviceAccountsEnabled": true,
                "frontchannelLogout": true,
                "protocolMappers": [
                    {
                        "name": "groups",
                        "protocol": "openid-connect",
                        "protocolMapper": "oidc-group-membership-mapper",
                        "config": {
                            "claim.name": "groups",
                            "userinfo.token.claim": "true",
                            "id.token.claim": "true",
                            "access.token.claim": "true",
                        },
                    },
                    {
                        "name": "audience",
                        "protocol": "openid-connect",
                        "protocolMapper": "oidc-audience-mapper",
                        "config": {
                            "included.client.audience": spec.client_id,
                            "access.token.claim": "true",
                            "token.introspection.claim": "true",
                        },
                    },
                ],
            })),
        )
    }

    fn client_secret(&mut self, client_id: &str) -> Result<Option<String>, PortError> {
        let clients = self.get(&format!("/clients?clientId={client_id}"))?;
        let Some(internal_id) = clients
            .as_array()
            .and_then(|clients| clients.first())
            .and_then(|client| client["id"].as_str())
            .map(str::to_owned)
        else {
            return Ok(None);
        };
        let secret = self.get(&format!("/clients/{internal_id}/client-secret"))?;
        Ok(secret["value"].as_str().map(str::to_owned))
    }
}
