//! Chat synchronizer: invite each team's contributors into the team's
//! channels. Membership here is add-only — people leave channels on their
//! own terms and are never removed by a run.

use std::collections::BTreeSet;

use roster_core::types::{DesiredState, Team};
use roster_engine::{attempt, ChannelPort, Identity, RunReport};

use crate::synchronizer::{team_banner, RunState, Synchronizer};

/// Reconciles chat channel membership for every team.
pub struct SlackSynchronizer<'a, P> {
    port: P,
    desired: &'a DesiredState,
}

impl<'a, P: ChannelPort> SlackSynchronizer<'a, P> {
    pub fn new(port: P, desired: &'a DesiredState) -> Self {
        Self { port, desired }
    }

    fn sync_team(&mut self, team: &Team, report: &mut RunReport) {
        if team.slack_channel_ids.is_empty() {
            tracing::debug!("no Slack channels to sync for {}, skipping", team.name);
            return;
        }

        let desired_members = self.desired_members(team, report);
        for channel in &team.slack_channel_ids {
            tracing::info!("syncing {} Slack channel {channel}...", team.name);
            self.sync_channel(channel, &desired_members, report);
        }
    }

    fn desired_members(&self, team: &Team, report: &mut RunReport) -> BTreeSet<Identity> {
        let mut members = BTreeSet::new();
        for handle in team.contributors() {
            let Some(contributor) = self.desired.contributor(&handle) else {
                continue;
            };
            if contributor.slack_member_id.is_empty() {
                report.warn(format!(
                    "contributor {} has no Slack member ID",
                    contributor.full_name
                ));
                continue;
            }
            members.insert(Identity::from(contributor.slack_member_id.as_str()));
        }
        members
    }

    fn sync_channel(
        &mut self,
        channel: &str,
        desired_members: &BTreeSet<Identity>,
        report: &mut RunReport,
    ) {
        let Some(joined) = attempt(report, &format!("inspect Slack channel {channel}"), || {
            self.port.channel_is_joined(channel)
        }) else {
            return;
        };

        // The automation account must be in the channel before it can
        // invite anyone.
        if !joined
            && attempt(report, &format!("join Slack channel {channel}"), || {
                self.port.join_channel(channel)
            })
            .is_none()
        {
            return;
        }

        let Some(current) = attempt(
            report,
            &format!("list members of Slack channel {channel}"),
            || self.port.list_channel_members(channel),
        ) else {
            return;
        };

        let to_invite: Vec<Identity> = desired_members.difference(&current).cloned().collect();
        if to_invite.is_empty() {
            tracing::debug!("no users to invite to Slack channel {channel}");
            return;
        }

        let what = format!("invite {} member(s) to Slack channel {channel}", to_invite.len());
        attempt(report, &what, || {
            self.port.invite_to_channel(channel, &to_invite)
        });
    }
}

impl<P: ChannelPort> Synchronizer for SlackSynchronizer<'_, P> {
    fn name(&self) -> &'static str {
        "slack"
    }

    fn sync(&mut self, _state: &mut RunState, report: &mut RunReport) {
        let desired = self.desired;
        for team in desired.teams.values() {
            team_banner(team);
            self.sync_team(team, report);
        }
    }
}
