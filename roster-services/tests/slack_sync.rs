mod common;

use common::{contributor, desired_state, team, FakeChat};
use roster_core::TeamSlug;
use roster_engine::{Identity, RunReport};
use roster_services::slack::SlackSynchronizer;
use roster_services::synchronizer::{RunState, Synchronizer};

fn fixture(channels: &[&str]) -> roster_core::DesiredState {
    let mut rockets = team("rockets", &["alice"], &["bob"]);
    rockets.slack_channel_ids = channels.iter().map(|c| (*c).to_owned()).collect();
    desired_state(
        vec![
            contributor("alice", "UALICE", None),
            contributor("bob", "UBOB", None),
        ],
        vec![rockets],
    )
}

fn run(chat: &mut FakeChat, desired: &roster_core::DesiredState) -> RunReport {
    let mut report = RunReport::new();
    let mut state = RunState::default();
    let mut synchronizer = SlackSynchronizer::new(&mut *chat, desired);
    synchronizer.sync(&mut state, &mut report);
    report
}

#[test]
fn joins_then_invites_missing_members() {
    let mut chat = FakeChat::default().with_channel("C0ROCKETS");
    chat.members
        .entry("C0ROCKETS".to_owned())
        .or_default()
        .insert(Identity::from("UBOB"));
    let desired = fixture(&["C0ROCKETS"]);

    let report = run(&mut chat, &desired);

    assert!(!report.has_errors());
    assert!(chat.joined.contains("C0ROCKETS"));
    assert_eq!(chat.invites.len(), 1);
    let (channel, invited) = &chat.invites[0];
    assert_eq!(channel, "C0ROCKETS");
    assert_eq!(invited, &vec![Identity::from("UALICE")]);
}

#[test]
fn membership_is_add_only() {
    let mut chat = FakeChat::default().with_channel("C0ROCKETS");
    chat.joined.insert("C0ROCKETS".to_owned());
    chat.members.entry("C0ROCKETS".to_owned()).or_default().extend([
        Identity::from("UALICE"),
        Identity::from("UBOB"),
        Identity::from("UDEPARTED"),
    ]);
    let desired = fixture(&["C0ROCKETS"]);

    run(&mut chat, &desired);

    assert!(chat.invites.is_empty());
    assert!(chat.members["C0ROCKETS"].contains(&Identity::from("UDEPARTED")));
}

#[test]
fn team_without_channels_is_skipped() {
    let mut chat = FakeChat::default();
    let desired = fixture(&[]);

    let report = run(&mut chat, &desired);

    assert!(!report.has_errors());
    assert!(chat.invites.is_empty());
}

#[test]
fn unknown_channel_is_an_isolated_error() {
    let mut chat = FakeChat::default().with_channel("C0KNOWN");
    let desired = fixture(&["C0MISSING", "C0KNOWN"]);

    let report = run(&mut chat, &desired);

    assert!(report.has_errors());
    // The second channel still got its invites.
    assert_eq!(chat.invites.len(), 1);
    assert_eq!(chat.invites[0].0, "C0KNOWN");
}

#[test]
fn contributor_without_chat_id_is_a_warning() {
    let mut chat = FakeChat::default().with_channel("C0ROCKETS");
    let mut desired = fixture(&["C0ROCKETS"]);
    desired
        .contributors
        .get_mut(&roster_core::Handle::from("bob"))
        .expect("bob")
        .slack_member_id = String::new();

    let report = run(&mut chat, &desired);

    assert!(report.has_warnings());
    assert!(!report.has_errors());
    // alice is still invited.
    assert_eq!(chat.invites[0].1, vec![Identity::from("UALICE")]);
}

#[test]
fn channels_are_scoped_per_team() {
    let mut chat = FakeChat::default().with_channel("C0ROCKETS").with_channel("C0OTHER");
    let mut desired = fixture(&["C0ROCKETS"]);
    let mut other = team("probes", &["bob"], &[]);
    other.slack_channel_ids = vec!["C0OTHER".to_owned()];
    desired.teams.insert(TeamSlug::from("probes"), other);

    run(&mut chat, &desired);

    let rockets_invites: Vec<&Identity> = chat
        .invites
        .iter()
        .filter(|(c, _)| c == "C0ROCKETS")
        .flat_map(|(_, ids)| ids)
        .collect();
    assert!(rockets_invites.contains(&&Identity::from("UALICE")));

    let other_invites: Vec<&Identity> = chat
        .invites
        .iter()
        .filter(|(c, _)| c == "C0OTHER")
        .flat_map(|(_, ids)| ids)
        .collect();
    assert_eq!(other_invites, vec![&Identity::from("UBOB")]);
}
