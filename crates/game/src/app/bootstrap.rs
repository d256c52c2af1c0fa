use std::env;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::orders::ConfirmPolicy;

pub(crate) const PLAYER_ENV_VAR: &str = "VALHALLA_PLAYER";
pub(crate) const CONFIRM_POLICY_ENV_VAR: &str = "VALHALLA_CONFIRM_POLICY";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ClientConfig {
    pub(crate) local_player: String,
    pub(crate) confirm_policy: ConfirmPolicy,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("no local player configured; set {var} or pass --player")]
    MissingPlayer { var: &'static str },
    #[error("invalid {var} value '{value}' (expected 'reset' or 'keep')")]
    InvalidConfirmPolicy { var: &'static str, value: String },
}

impl ClientConfig {
    pub(crate) fn from_env(player_override: Option<String>) -> Result<Self, ConfigError> {
        Self::from_lookup(player_override, |var| env::var(var))
    }

    /// `lookup` stands in for `std::env::var` so tests can feed values.
    pub(crate) fn from_lookup<F>(
        player_override: Option<String>,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Result<String, env::VarError>,
    {
        let from_env = read_optional(&lookup, PLAYER_ENV_VAR)?;
        let local_player = player_override
            .or(from_env)
            .map(|raw| raw.trim().to_string())
            .filter(|name| !name.is_empty())
            .ok_or(ConfigError::MissingPlayer {
                var: PLAYER_ENV_VAR,
            })?;

        let confirm_policy = match read_optional(&lookup, CONFIRM_POLICY_ENV_VAR)? {
            Some(raw) => parse_confirm_policy(&raw)?,
            None => ConfirmPolicy::default(),
        };

        Ok(Self {
            local_player,
            confirm_policy,
        })
    }
}

fn read_optional<F>(lookup: &F, var: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&'static str) -> Result<String, env::VarError>,
{
    match lookup(var) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::EnvVar { var, source }),
    }
}

fn parse_confirm_policy(raw: &str) -> Result<ConfirmPolicy, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "reset" => Ok(ConfirmPolicy::ResetToIdle),
        "keep" => Ok(ConfirmPolicy::KeepTarget),
        _ => Err(ConfigError::InvalidConfirmPolicy {
            var: CONFIRM_POLICY_ENV_VAR,
            value: raw.to_string(),
        }),
    }
}

pub(crate) fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
    info!("=== Valhalla order client ===");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(
        pairs: &[(&'static str, &str)],
    ) -> impl Fn(&'static str) -> Result<String, env::VarError> {
        let values = pairs
            .iter()
            .map(|(key, value)| (*key, value.to_string()))
            .collect::<HashMap<_, _>>();
        move |var| values.get(var).cloned().ok_or(env::VarError::NotPresent)
    }

    #[test]
    fn reads_player_and_policy_from_env() {
        let config = ClientConfig::from_lookup(
            None,
            lookup_from(&[(PLAYER_ENV_VAR, " Alice "), (CONFIRM_POLICY_ENV_VAR, "KEEP")]),
        )
        .expect("config");
        assert_eq!(config.local_player, "Alice");
        assert_eq!(config.confirm_policy, ConfirmPolicy::KeepTarget);
    }

    #[test]
    fn player_override_wins_and_policy_defaults_to_reset() {
        let config = ClientConfig::from_lookup(
            Some("Bob".to_string()),
            lookup_from(&[(PLAYER_ENV_VAR, "Alice")]),
        )
        .expect("config");
        assert_eq!(config.local_player, "Bob");
        assert_eq!(config.confirm_policy, ConfirmPolicy::ResetToIdle);
    }

    #[test]
    fn missing_or_blank_player_is_an_error() {
        let error = ClientConfig::from_lookup(None, lookup_from(&[])).expect_err("missing");
        assert!(matches!(error, ConfigError::MissingPlayer { .. }));

        let error = ClientConfig::from_lookup(None, lookup_from(&[(PLAYER_ENV_VAR, "   ")]))
            .expect_err("blank");
        assert!(matches!(error, ConfigError::MissingPlayer { .. }));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let error = ClientConfig::from_lookup(
            None,
            lookup_from(&[(PLAYER_ENV_VAR, "Alice"), (CONFIRM_POLICY_ENV_VAR, "sometimes")]),
        )
        .expect_err("bad policy");
        assert_eq!(
            error.to_string(),
            "invalid VALHALLA_CONFIRM_POLICY value 'sometimes' (expected 'reset' or 'keep')"
        );
    }

    #[test]
    fn non_unicode_env_is_reported() {
        let lookup = |_var: &'static str| -> Result<String, env::VarError> {
            Err(env::VarError::NotUnicode(std::ffi::OsString::from("x")))
        };
        let error = ClientConfig::from_lookup(None, lookup).expect_err("not unicode");
        assert!(matches!(error, ConfigError::EnvVar { .. }));
    }
}
