//! Slack Web API adapter for the channel port.

use std::collections::BTreeSet;

use serde_json::Value;

use roster_engine::{ChannelPort, Identity, PortError};

use crate::config::SlackSettings;

use super::{agent, body_err, http_err};

const API: &str = "https://slack.com/api";

pub struct SlackClient {
    agent: ureq::Agent,
    token: String,
}

impl SlackClient {
    pub fn new(settings: SlackSettings) -> Self {
        Self {
            agent: agent(),
            token: settings.token,
        }
    }

    /// Call one Web API method. Slack reports failures in-band via
    /// `{"ok": false, "error": "..."}` with HTTP 200.
    fn call(&self, method: &str, params: &[(&str, &str)]) -> Result<Value, PortError> {
        let body: Value = self
            .agent
            .post(&format!("{API}/{method}"))
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_form(params)
            .map_err(|e| http_err(method, e))?
            .into_json()
            .map_err(|e| body_err(method, e))?;

        if body["ok"].as_bool() != Some(true) {
            let error = body["error"].as_str().unwrap_or("unknown_error");
            // Uninvited private channels report channel_not_found; the
            // automation account must be added to them by hand first.
            return match error {
                "channel_not_found" => Err(PortError::UnknownGroup(
                    params
                        .iter()
                        .find(|(k, _)| *k == "channel")
                        .map(|(_, v)| (*v).to_owned())
                        .unwrap_or_default(),
                )),
                other => Err(PortError::Protocol(format!("{method}: {other}"))),
            };
        }
        Ok(body)
    }
}

impl ChannelPort for SlackClient {
    fn channel_is_joined(&mut self, channel: &str) -> Result<bool, PortError> {
        let info = self.call("conversations.info", &[("channel", channel)])?;
        Ok(info["channel"]["is_member"].as_bool().unwrap_or(false))
    }

    fn join_channel(&mut self, channel: &str) -> Result<(), PortError> {
        self.call("conversations.join", &[("channel", channel)])?;
        Ok(())
    }

    fn list_channel_members(&mut self, channel: &str) -> Result<BTreeSet<Identity>, PortError> {
        let mut members = BTreeSet::new();
        let mut cursor = String::new();
        loop {
            let body = self.call(
                "conversations.members",
                &[
                    ("channel", channel),
                    ("limit", "1000"),
                    ("cursor", cursor.as_str()),
                ],
            )?;
            members.extend(
                body["members"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(|member| member.as_str())
                    .map(Identity::from),
            );
            match body["response_metadata"]["next_cursor"].as_str() {
                Some(next) if !next.is_empty() => cursor = next.to_owned(),
                _ => break,
            }
        }
        Ok(members)
    }

    fn invite_to_channel(
        &mut self,
        channel: &str,
        identities: &[Identity],
    ) -> Result<(), PortError> {
        let users = identities
            .iter()
            .map(|identity| identity.0.as_str())
            .collect::<Vec<_>>()
            .join(",");
        self.call(
            "conversations.invite",
            &[("channel", channel), ("users", &users)],
        )?;
        Ok(())
    }
}
