mod common;

use common::{contributor, desired_state, team, FakeBroker};
use roster_engine::{Identity, RunReport};
use roster_services::keycloak::KeycloakSynchronizer;
use roster_services::synchronizer::{RunState, Synchronizer};

fn run(broker: &mut FakeBroker, desired: &roster_core::DesiredState) -> RunReport {
    let mut report = RunReport::new();
    let mut state = RunState::default();
    let mut synchronizer = KeycloakSynchronizer::new(&mut *broker, desired);
    synchronizer.sync(&mut state, &mut report);
    report
}

fn fixture() -> roster_core::DesiredState {
    desired_state(
        vec![
            contributor("alice", "UALICE", Some("alice1")),
            contributor("bob", "UBOB", Some("bob1")),
            contributor("dana", "UDANA", None),
        ],
        vec![team("rockets", &["alice"], &["bob", "dana"])],
    )
}

#[test]
fn creates_one_client_per_environment() {
    let mut broker = FakeBroker::default();
    let desired = fixture();

    let report = run(&mut broker, &desired);

    assert!(!report.has_errors());
    let ids: Vec<&str> = broker
        .created_clients
        .iter()
        .map(|c| c.client_id.as_str())
        .collect();
    assert_eq!(ids, vec!["rockets-local", "rockets-dev", "rockets-staging", "rockets-prod"]);

    let dev = &broker.created_clients[1];
    assert_eq!(dev.root_url.as_deref(), Some("https://rockets.rdgl-dev.org"));
    assert_eq!(
        dev.redirect_uris,
        vec!["https://api.rockets.rdgl-dev.org/auth/callback".to_owned()]
    );
    assert_eq!(dev.post_logout_redirect_uris, "/*");
}

#[test]
fn existing_clients_are_skipped() {
    let mut broker = FakeBroker::default().with_client("rockets-dev", "kept");
    let desired = fixture();

    run(&mut broker, &desired);

    assert!(broker.created_clients.iter().all(|c| c.client_id != "rockets-dev"));
    assert_eq!(broker.clients["rockets-dev"], "kept");
}

#[test]
fn groups_follow_the_suffix_conventions() {
    let mut broker = FakeBroker::default();
    let desired = fixture();

    run(&mut broker, &desired);

    // Maintainer goes into -admins by SSO username; plain devs into -devs;
    // dana has no SSO username and is skipped.
    assert!(broker
        .live_members("rockets-admins")
        .contains(&Identity::from("alice1")));
    assert_eq!(
        broker.live_members("rockets-devs"),
        [Identity::from("bob1")].into()
    );
}

#[test]
fn service_accounts_join_the_admin_group_only_with_clients() {
    let mut broker = FakeBroker::default();
    let desired = fixture();

    run(&mut broker, &desired);
    for env in ["local", "dev", "staging", "prod"] {
        assert!(broker
            .live_members("rockets-admins")
            .contains(&Identity::from(format!("service-account-rockets-{env}"))));
    }

    // Opting out of clients keeps the service accounts out too.
    let mut broker = FakeBroker::default();
    let mut desired = fixture();
    desired
        .teams
        .get_mut(&roster_core::TeamSlug::from("rockets"))
        .expect("team")
        .create_oidc_clients = false;

    run(&mut broker, &desired);
    assert!(broker.created_clients.is_empty());
    assert!(!broker
        .live_members("rockets-admins")
        .iter()
        .any(|id| id.0.starts_with("service-account-")));
}

#[test]
fn ext_admins_pass_through_verbatim() {
    let mut broker = FakeBroker::default();
    let mut desired = fixture();
    desired
        .teams
        .get_mut(&roster_core::TeamSlug::from("rockets"))
        .expect("team")
        .ext_admins = Some(vec!["outside-consultant".to_owned()]);

    run(&mut broker, &desired);

    assert_eq!(
        broker.live_members("rockets-ext-admins"),
        [Identity::from("outside-consultant")].into()
    );
}

#[test]
fn applicants_group_is_only_created_when_declared() {
    let mut broker = FakeBroker::default();
    let desired = fixture();
    run(&mut broker, &desired);
    assert!(!broker.created_groups.contains(&"rockets-applicants".to_owned()));

    let mut broker = FakeBroker::default();
    let mut desired = fixture();
    desired
        .teams
        .get_mut(&roster_core::TeamSlug::from("rockets"))
        .expect("team")
        .applicants = Some(vec![roster_core::Handle::from("bob")]);

    run(&mut broker, &desired);
    assert_eq!(
        broker.live_members("rockets-applicants"),
        [Identity::from("bob1")].into()
    );
}

#[test]
fn unlisted_group_members_are_removed_by_default() {
    let mut broker = FakeBroker::default();
    broker.members.insert(
        "rockets-devs".to_owned(),
        [(Identity::from("departed"), roster_engine::Role::Member)].into(),
    );
    let desired = fixture();

    run(&mut broker, &desired);

    assert!(!broker
        .live_members("rockets-devs")
        .contains(&Identity::from("departed")));
}
