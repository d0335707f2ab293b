//! Deployment environments and URL naming conventions.
//!
//! Every URL here is a pure function of `(slug, environment)` — no network,
//! no lookups. Synchronizers treat this module as a deterministic table.

use std::fmt;
use std::str::FromStr;

/// A deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Environment {
    Local,
    Dev,
    Staging,
    Prod,
}

impl Environment {
    /// All environments, in promotion order.
    pub const ALL: [Environment; 4] = [
        Environment::Local,
        Environment::Dev,
        Environment::Staging,
        Environment::Prod,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Dev => "dev",
            Environment::Staging => "staging",
            Environment::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Environment::Local),
            "dev" => Ok(Environment::Dev),
            "staging" => Ok(Environment::Staging),
            "prod" => Ok(Environment::Prod),
            other => Err(format!(
                "unknown environment '{other}'; expected: local, dev, staging, prod"
            )),
        }
    }
}

/// Apex domain per environment; local has none.
fn domain(env: Environment) -> Option<&'static str> {
    match env {
        Environment::Local => None,
        Environment::Dev => Some("rdgl-dev.org"),
        Environment::Staging => Some("rdgl-staging.org"),
        Environment::Prod => Some("ridgelinelabs.org"),
    }
}

/// Backend API base URL for a site.
pub fn server_url(slug: &str, env: Environment) -> String {
    match domain(env) {
        None => "http://localhost".to_owned(),
        Some(domain) => format!("https://api.{slug}.{domain}"),
    }
}

/// Frontend base URL for a site.
pub fn frontend_url(slug: &str, env: Environment) -> String {
    match domain(env) {
        None => "http://localhost:3000".to_owned(),
        Some(domain) => format!("https://{slug}.{domain}"),
    }
}

/// Comma-separated allowed-origin regexes handed to server apps.
pub fn allowed_origins_regex(team_slug: &str, env: Environment) -> String {
    // Any subdomain of the environment's apex, over https.
    let https_origin_prefix = r"^https://([a-z0-9-]+\.)*";
    match env {
        Environment::Local => r"^https?://localhost:\d{4}$".to_owned(),
        // Dev also admits hosted preview deployments
        // (https://<team-slug>-<random 9 characters>-ridgelinelabs.vercel.app).
        Environment::Dev => format!(
            "{https_origin_prefix}rdgl-dev\\.org$,^https://{team_slug}-[0-9a-z]{{9}}-ridgelinelabs\\.vercel\\.app$"
        ),
        Environment::Staging => format!("{https_origin_prefix}rdgl-staging\\.org$"),
        Environment::Prod => format!("{https_origin_prefix}ridgelinelabs\\.org$"),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Environment::Local, "http://localhost", "http://localhost:3000")]
    #[case(
        Environment::Dev,
        "https://api.rockets.rdgl-dev.org",
        "https://rockets.rdgl-dev.org"
    )]
    #[case(
        Environment::Staging,
        "https://api.rockets.rdgl-staging.org",
        "https://rockets.rdgl-staging.org"
    )]
    #[case(
        Environment::Prod,
        "https://api.rockets.ridgelinelabs.org",
        "https://rockets.ridgelinelabs.org"
    )]
    fn url_conventions(#[case] env: Environment, #[case] server: &str, #[case] frontend: &str) {
        assert_eq!(server_url("rockets", env), server);
        assert_eq!(frontend_url("rockets", env), frontend);
    }

    #[test]
    fn origins_regex_is_environment_scoped() {
        assert!(allowed_origins_regex("rockets", Environment::Local).contains("localhost"));
        let dev = allowed_origins_regex("rockets", Environment::Dev);
        assert!(dev.contains("rdgl-dev"));
        assert!(dev.contains("rockets-[0-9a-z]{9}"));
        assert!(allowed_origins_regex("rockets", Environment::Prod).contains("ridgelinelabs"));
    }

    #[test]
    fn environment_round_trips() {
        for env in Environment::ALL {
            assert_eq!(env.as_str().parse::<Environment>(), Ok(env));
        }
        assert!("qa".parse::<Environment>().is_err());
    }
}
