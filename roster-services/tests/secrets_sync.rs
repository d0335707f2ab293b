mod common;

use common::{contributor, desired_state, team, FakeBroker, FakeStorage, FakeVault};
use roster_core::types::SecretsLayout;
use roster_core::TeamSlug;
use roster_engine::RunReport;
use roster_services::minio::MinioSynchronizer;
use roster_services::runner::{Runner, ServiceName};
use roster_services::secrets::{AuthEndpoints, SecretsSynchronizer};
use roster_services::synchronizer::{RunState, Synchronizer};

fn endpoints() -> AuthEndpoints {
    AuthEndpoints {
        issuer: "https://sso.ridgelinelabs.org/realms/ridgeline".to_owned(),
    }
}

fn seeded_broker() -> FakeBroker {
    FakeBroker::default()
        .with_client("rockets-local", "s-local")
        .with_client("rockets-dev", "s-dev")
        .with_client("rockets-staging", "s-staging")
        .with_client("rockets-prod", "s-prod")
}

fn fixture(layout: SecretsLayout) -> roster_core::DesiredState {
    let mut rockets = team("rockets", &["alice"], &[]);
    rockets.secrets_layout = layout;
    desired_state(vec![contributor("alice", "UALICE", None)], vec![rockets])
}

fn run(
    vault: &mut FakeVault,
    broker: &mut FakeBroker,
    desired: &roster_core::DesiredState,
    state: &mut RunState,
) -> RunReport {
    let mut report = RunReport::new();
    let mut synchronizer =
        SecretsSynchronizer::new(&mut *vault, &mut *broker, endpoints(), desired);
    synchronizer.sync(state, &mut report);
    report
}

#[test]
fn multi_layout_writes_web_and_server_bundles_per_environment() {
    let mut vault = FakeVault::default();
    let mut broker = seeded_broker();
    let desired = fixture(SecretsLayout::Multi);
    let mut state = RunState::default();

    let report = run(&mut vault, &mut broker, &desired, &mut state);

    assert!(!report.has_errors());
    assert_eq!(vault.writes, 8, "4 environments × (web + server)");

    let web = &vault.bundles["rockets/dev/web"];
    assert_eq!(web["VITE_SERVER_URL"], "https://api.rockets.rdgl-dev.org");

    let server = &vault.bundles["rockets/dev/server"];
    assert_eq!(server["SERVER_URL"], "https://api.rockets.rdgl-dev.org");
    assert_eq!(server["AUTH_CLIENT_ID"], "rockets-dev");
    assert_eq!(server["AUTH_CLIENT_SECRET"], "s-dev");
    assert_eq!(
        server["AUTH_ISSUER"],
        "https://sso.ridgelinelabs.org/realms/ridgeline"
    );
    assert_eq!(server["AUTH_SESSION_SECRET"].len(), 64);
    assert!(server["ALLOWED_ORIGINS_REGEX"].contains("rdgl-dev"));
    assert_eq!(server["REDIS_URL"], "${{REDIS.REDIS_URL}}");

    let local = &vault.bundles["rockets/local/server"];
    assert_eq!(local["REDIS_URL"], "redis://redis:6379");
    assert!(local["DATABASE_URL"].ends_with("/rockets"));
}

#[test]
fn first_write_wins_second_run_writes_nothing() {
    let mut vault = FakeVault::default();
    let mut broker = seeded_broker();
    let desired = fixture(SecretsLayout::Multi);
    let mut state = RunState::default();

    run(&mut vault, &mut broker, &desired, &mut state);
    let writes_after_first = vault.writes;
    assert!(writes_after_first > 0);

    let report = run(&mut vault, &mut broker, &desired, &mut state);
    assert!(!report.has_errors());
    assert_eq!(vault.writes, writes_after_first, "existing secrets are never overwritten");
}

#[test]
fn manually_seeded_secrets_are_never_clobbered() {
    let mut vault = FakeVault::default();
    vault.bundles.insert(
        "rockets/prod/server".to_owned(),
        [("ROTATED".to_owned(), "by-hand".to_owned())].into(),
    );
    let mut broker = seeded_broker();
    let desired = fixture(SecretsLayout::Multi);
    let mut state = RunState::default();

    run(&mut vault, &mut broker, &desired, &mut state);

    assert_eq!(vault.writes, 0);
    assert_eq!(vault.bundles["rockets/prod/server"]["ROTATED"], "by-hand");
}

#[test]
fn single_layout_writes_one_auth_bundle_per_environment() {
    let mut vault = FakeVault::default();
    let mut broker = seeded_broker();
    let desired = fixture(SecretsLayout::Single);
    let mut state = RunState::default();

    let report = run(&mut vault, &mut broker, &desired, &mut state);

    assert!(!report.has_errors());
    assert_eq!(vault.writes, 4);
    let bundle = &vault.bundles["rockets/prod"];
    assert_eq!(bundle["AUTH_CLIENT_ID"], "rockets-prod");
    assert!(!bundle.contains_key("SERVER_URL"));
}

#[test]
fn single_layout_without_clients_has_nothing_to_populate() {
    let mut vault = FakeVault::default();
    let mut broker = FakeBroker::default();
    let mut desired = fixture(SecretsLayout::Single);
    desired
        .teams
        .get_mut(&TeamSlug::from("rockets"))
        .expect("team")
        .create_oidc_clients = false;
    let mut state = RunState::default();

    let report = run(&mut vault, &mut broker, &desired, &mut state);

    assert!(!report.has_errors());
    assert_eq!(vault.writes, 0);
}

#[test]
fn none_layout_is_a_policy_skip() {
    let mut vault = FakeVault::default();
    let mut broker = FakeBroker::default();
    let desired = fixture(SecretsLayout::None);
    let mut state = RunState::default();

    let report = run(&mut vault, &mut broker, &desired, &mut state);

    assert!(!report.has_errors());
    assert_eq!(vault.writes, 0);
}

#[test]
fn missing_broker_client_is_an_isolated_error() {
    let mut vault = FakeVault::default();
    // Only dev exists; the other three environments fail their bundle.
    let mut broker = FakeBroker::default().with_client("rockets-dev", "s-dev");
    let desired = fixture(SecretsLayout::Multi);
    let mut state = RunState::default();

    let report = run(&mut vault, &mut broker, &desired, &mut state);

    assert!(report.has_errors());
    assert!(vault.bundles.contains_key("rockets/dev/server"), "dev still written");
    assert!(!vault.bundles.contains_key("rockets/prod/server"));
}

#[test]
fn storage_credentials_flow_from_minio_to_secrets_within_one_run() {
    let mut storage = FakeStorage::default();
    let mut vault = FakeVault::default();
    let mut broker = seeded_broker();
    let desired = fixture(SecretsLayout::Multi);

    let report = {
        let mut runner = Runner::new();
        runner.register(
            ServiceName::Minio,
            Box::new(MinioSynchronizer::new(&mut storage, &desired)),
        );
        runner.register(
            ServiceName::Secrets,
            Box::new(SecretsSynchronizer::new(
                &mut vault,
                &mut broker,
                endpoints(),
                &desired,
            )),
        );
        // Selection order reversed on purpose; registration order rules.
        runner.run(&[ServiceName::Secrets, ServiceName::Minio])
    };

    assert!(!report.has_errors());
    let server = &vault.bundles["rockets/dev/server"];
    assert!(server.contains_key("S3_ACCESS_KEY"), "admin credentials handed off");
    assert!(server.contains_key("S3_READONLY_ACCESS_KEY"));
    assert_ne!(server["S3_ACCESS_KEY"], server["S3_READONLY_ACCESS_KEY"]);
}
