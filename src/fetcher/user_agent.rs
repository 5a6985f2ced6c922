//! The default `User-Agent` string sent by [`super::ureq_fetcher::UreqFetcher`].
//! Grounded on the teacher's `package_db/http/user_agent.rs`, trimmed to a
//! plain string (no `serde_json` payload — see `DESIGN.md` "Dropped
//! dependencies").

const CI_ENVIRONMENT_VARIABLES: &[&str] = &["BUILD_BUILDID", "BUILD_ID", "CI"];

fn looks_like_ci() -> bool {
    CI_ENVIRONMENT_VARIABLES
        .iter()
        .any(|name| std::env::var_os(name).is_some())
}

pub fn user_agent() -> String {
    let name = env!("CARGO_PKG_NAME");
    let version = env!("CARGO_PKG_VERSION");
    if looks_like_ci() {
        format!("{}/{} (+ci; {})", name, version, std::env::consts::ARCH)
    } else {
        format!("{}/{} (+{})", name, version, std::env::consts::ARCH)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_user_agent_contains_crate_name() {
        assert!(user_agent().starts_with(env!("CARGO_PKG_NAME")));
    }
}
