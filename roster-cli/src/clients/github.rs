//! GitHub REST adapter for the membership and grant ports.
//!
//! Group keys are GitHub team slugs; the well-known
//! [`roster_services::github::ORG_GROUP_KEY`] resolves to the organization
//! itself, whose membership pass runs invite-only.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde_json::{json, Value};

use roster_engine::{
    GrantPort, GroupRef, GroupSpec, Identity, MembershipPort, Permission, PortError, Resource,
    Role,
};
use roster_services::github::ORG_GROUP_KEY;

use crate::config::GithubSettings;

use super::{agent, body_err, http_err};

const API: &str = "https://api.github.com";
const PAGE_SIZE: usize = 100;

pub struct GithubClient {
    agent: ureq::Agent,
    token: String,
    org: String,
    /// Numeric team IDs, needed only when creating a child team.
    team_ids: HashMap<String, u64>,
    owners: Option<BTreeSet<Identity>>,
}

impl GithubClient {
    pub fn new(settings: GithubSettings) -> Self {
        Self {
            agent: agent(),
            token: settings.token,
            org: settings.org,
            team_ids: HashMap::new(),
            owners: None,
        }
    }

    fn get(&self, path: &str) -> Result<Value, PortError> {
        let url = format!("{API}{path}");
        self.agent
            .get(&url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .call()
            .map_err(|e| http_err(path, e))?
            .into_json()
            .map_err(|e| body_err(path, e))
    }

    /// GET a paginated collection, following `page=` until a short page.
    fn get_all(&self, path: &str) -> Result<Vec<Value>, PortError> {
        let sep = if path.contains('?') { '&' } else { '?' };
        let mut items = Vec::new();
        for page in 1.. {
            let url = format!("{API}{path}{sep}per_page={PAGE_SIZE}&page={page}");
            let batch: Vec<Value> = self
                .agent
                .get(&url)
                .set("Authorization", &format!("Bearer {}", self.token))
                .set("Accept", "application/vnd.github+json")
                .call()
                .map_err(|e| http_err(path, e))?
                .into_json()
                .map_err(|e| body_err(path, e))?;
            let short = batch.len() < PAGE_SIZE;
            items.extend(batch);
            if short {
                break;
            }
        }
        Ok(items)
    }

    fn send(&self, method: &str, path: &str, body: Option<Value>) -> Result<Value, PortError> {
        let url = format!("{API}{path}");
        let request = self
            .agent
            .request(method, &url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json");
        let response = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        }
        .map_err(|e| http_err(path, e))?;
        // 204s have no body.
        Ok(response.into_json::<Value>().unwrap_or(Value::Null))
    }

    fn is_org(group: &GroupRef) -> bool {
        group.key == ORG_GROUP_KEY
    }

    fn logins(items: &[Value]) -> BTreeSet<Identity> {
        items
            .iter()
            .filter_map(|item| item["login"].as_str())
            .map(Identity::from)
            .collect()
    }

    fn role_str(role: Role) -> &'static str {
        match role {
            Role::Member => "member",
            Role::Maintainer => "maintainer",
        }
    }
}

impl MembershipPort for GithubClient {
    fn ensure_group(&mut self, spec: &GroupSpec) -> Result<GroupRef, PortError> {
        if spec.key == ORG_GROUP_KEY {
            return Ok(GroupRef {
                key: spec.key.clone(),
                name: self.org.clone(),
            });
        }

        let path = format!("/orgs/{}/teams/{}", self.org, spec.key);
        match self.get(&path) {
            Ok(team) => {
                if let Some(id) = team["id"].as_u64() {
                    self.team_ids.insert(spec.key.clone(), id);
                }
            }
            Err(PortError::Protocol(msg)) if msg.contains("HTTP 404") => {
                let mut payload = json!({
                    "name": spec.name,
                    // Visible to every organization member.
                    "privacy": "closed",
                });
                if let Some(parent) = &spec.parent {
                    let parent_id = self.team_ids.get(&parent.key).copied().ok_or_else(|| {
                        PortError::UnknownGroup(parent.key.clone())
                    })?;
                    payload["parent_team_id"] = json!(parent_id);
                }
                let created = self.send("POST", &format!("/orgs/{}/teams", self.org), Some(payload))?;
                if let Some(id) = created["id"].as_u64() {
                    self.team_ids.insert(spec.key.clone(), id);
                }
            }
            Err(err) => return Err(err),
        }

        Ok(GroupRef {
            key: spec.key.clone(),
            name: spec.name.clone(),
        })
    }

    fn list_members(&mut self, group: &GroupRef) -> Result<BTreeMap<Identity, Role>, PortError> {
        if Self::is_org(group) {
            let members = self.get_all(&format!("/orgs/{}/members", self.org))?;
            return Ok(Self::logins(&members)
                .into_iter()
                .map(|login| (login, Role::Member))
                .collect());
        }

        let members = self.get_all(&format!("/orgs/{}/teams/{}/members", self.org, group.key))?;
        let mut with_roles = BTreeMap::new();
        for login in Self::logins(&members) {
            let membership = self.get(&format!(
                "/orgs/{}/teams/{}/memberships/{login}",
                self.org, group.key
            ))?;
            let role = match membership["role"].as_str() {
                Some("maintainer") => Role::Maintainer,
                _ => Role::Member,
            };
            with_roles.insert(login, role);
        }
        Ok(with_roles)
    }

    fn list_pending_invitations(&mut self, group: &GroupRef) -> Result<BTreeSet<Identity>, PortError> {
        let path = if Self::is_org(group) {
            format!("/orgs/{}/invitations", self.org)
        } else {
            format!("/orgs/{}/teams/{}/invitations", self.org, group.key)
        };
        // Email-only invitations have no login yet and cannot collide with
        // a handle.
        Ok(Self::logins(&self.get_all(&path)?))
    }

    fn add_member(
        &mut self,
        group: &GroupRef,
        identity: &Identity,
        role: Role,
    ) -> Result<(), PortError> {
        let path = if Self::is_org(group) {
            format!("/orgs/{}/memberships/{identity}", self.org)
        } else {
            format!("/orgs/{}/teams/{}/memberships/{identity}", self.org, group.key)
        };
        let role = if Self::is_org(group) {
            "member"
        } else {
            Self::role_str(role)
        };
        match self.send("PUT", &path, Some(json!({ "role": role }))) {
            Ok(_) => Ok(()),
            Err(PortError::Protocol(msg)) if msg.contains("HTTP 404") => {
                Err(PortError::UnknownIdentity(identity.0.clone()))
            }
            Err(err) => Err(err),
        }
    }

    fn remove_member(&mut self, group: &GroupRef, identity: &Identity) -> Result<(), PortError> {
        let path = if Self::is_org(group) {
            format!("/orgs/{}/members/{identity}", self.org)
        } else {
            format!("/orgs/{}/teams/{}/memberships/{identity}", self.org, group.key)
        };
        self.send("DELETE", &path, None).map(|_| ())
    }

    fn protected_identities(&mut self) -> Result<BTreeSet<Identity>, PortError> {
        if let Some(owners) = &self.owners {
            return Ok(owners.clone());
        }
        let owners = Self::logins(&self.get_all(&format!("/orgs/{}/members?role=admin", self.org))?);
        self.owners = Some(owners.clone());
        Ok(owners)
    }
}

impl GrantPort for GithubClient {
    fn list_grants(&mut self, group: &GroupRef) -> Result<BTreeSet<Resource>, PortError> {
        let repos = self.get_all(&format!("/orgs/{}/teams/{}/repos", self.org, group.key))?;
        Ok(repos
            .iter()
            .filter_map(|repo| repo["full_name"].as_str())
            .map(Resource::from)
            .collect())
    }

    fn grant(&mut self, group: &GroupRef, resource: &Resource) -> Result<(), PortError> {
        self.set_permission(group, resource, Permission::Write)
    }

    fn set_permission(
        &mut self,
        group: &GroupRef,
        resource: &Resource,
        permission: Permission,
    ) -> Result<(), PortError> {
        let permission = match permission {
            Permission::Read => "pull",
            Permission::Write => "push",
            Permission::Admin => "admin",
        };
        self.send(
            "PUT",
            &format!("/orgs/{}/teams/{}/repos/{resource}", self.org, group.key),
            Some(json!({ "permission": permission })),
        )
        .map(|_| ())
    }

    fn revoke(&mut self, group: &GroupRef, resource: &Resource) -> Result<(), PortError> {
        self.send(
            "DELETE",
            &format!("/orgs/{}/teams/{}/repos/{resource}", self.org, group.key),
            None,
        )
        .map(|_| ())
    }
}
