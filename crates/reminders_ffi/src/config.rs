//! Bridge configuration resolved at `init_bridge` time.
//!
//! Precedence per field: explicit argument, then environment, then default.

use log::warn;
use reminders_core::{CapabilityModel, PromptPolicy};
use std::path::PathBuf;

pub const ENV_DB_PATH: &str = "REMINDERS_DB_PATH";
pub const ENV_CAPABILITY_MODEL: &str = "REMINDERS_CAPABILITY_MODEL";
pub const ENV_PROMPT_POLICY: &str = "REMINDERS_PROMPT_POLICY";

const DEFAULT_DB_FILE_NAME: &str = "reminders_bridge.sqlite3";
const DEFAULT_SOURCE_TITLE: &str = "Local";
const DEFAULT_LIST_TITLE: &str = "Reminders";

/// Settings for the bridge-owned portable store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    pub db_path: PathBuf,
    /// Title of the source created when the store has no default list.
    pub source_title: String,
    pub default_list_title: String,
    pub capability_model: CapabilityModel,
    pub prompt_policy: PromptPolicy,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            db_path: std::env::temp_dir().join(DEFAULT_DB_FILE_NAME),
            source_title: DEFAULT_SOURCE_TITLE.to_string(),
            default_list_title: DEFAULT_LIST_TITLE.to_string(),
            capability_model: CapabilityModel::Tiered,
            prompt_policy: PromptPolicy::Grant,
        }
    }
}

impl BridgeConfig {
    /// Resolves configuration from an optional explicit path and the process
    /// environment.
    pub fn resolve(db_path: Option<&str>) -> Self {
        Self::resolve_with(db_path, |key| std::env::var(key).ok())
    }

    /// Resolves configuration with an injectable environment lookup.
    ///
    /// Blank values are ignored. Unparseable model/policy values fall back to
    /// the default and are logged.
    pub fn resolve_with(db_path: Option<&str>, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let explicit = non_blank(db_path.map(str::to_string));
        if let Some(path) = explicit.or_else(|| non_blank(env(ENV_DB_PATH))) {
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = non_blank(env(ENV_CAPABILITY_MODEL)) {
            match CapabilityModel::parse(&raw) {
                Some(model) => config.capability_model = model,
                None => warn!(
                    "event=bridge_config module=ffi status=error error_code=invalid_capability_model key={ENV_CAPABILITY_MODEL}"
                ),
            }
        }

        if let Some(raw) = non_blank(env(ENV_PROMPT_POLICY)) {
            match PromptPolicy::parse(&raw) {
                Some(policy) => config.prompt_policy = policy,
                None => warn!(
                    "event=bridge_config module=ffi status=error error_code=invalid_prompt_policy key={ENV_PROMPT_POLICY}"
                ),
            }
        }

        config
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_string())
        .filter(|trimmed| !trimmed.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{BridgeConfig, ENV_CAPABILITY_MODEL, ENV_DB_PATH, ENV_PROMPT_POLICY};
    use reminders_core::{CapabilityModel, PromptPolicy};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_input() {
        let config = BridgeConfig::resolve_with(None, env(&[]));
        assert_eq!(config, BridgeConfig::default());
        assert!(config.db_path.ends_with("reminders_bridge.sqlite3"));
        assert_eq!(config.default_list_title, "Reminders");
    }

    #[test]
    fn explicit_path_wins_over_environment() {
        let config = BridgeConfig::resolve_with(
            Some(" /data/explicit.sqlite3 "),
            env(&[(ENV_DB_PATH, "/data/env.sqlite3")]),
        );
        assert_eq!(config.db_path, PathBuf::from("/data/explicit.sqlite3"));
    }

    #[test]
    fn blank_explicit_path_falls_back_to_environment() {
        let config =
            BridgeConfig::resolve_with(Some("  "), env(&[(ENV_DB_PATH, "/data/env.sqlite3")]));
        assert_eq!(config.db_path, PathBuf::from("/data/env.sqlite3"));
    }

    #[test]
    fn environment_selects_model_and_policy() {
        let config = BridgeConfig::resolve_with(
            None,
            env(&[(ENV_CAPABILITY_MODEL, "Binary"), (ENV_PROMPT_POLICY, "deny")]),
        );
        assert_eq!(config.capability_model, CapabilityModel::Binary);
        assert_eq!(config.prompt_policy, PromptPolicy::Deny);
    }

    #[test]
    fn invalid_environment_values_keep_defaults() {
        let config = BridgeConfig::resolve_with(
            None,
            env(&[(ENV_CAPABILITY_MODEL, "quantum"), (ENV_PROMPT_POLICY, "maybe")]),
        );
        assert_eq!(config.capability_model, CapabilityModel::Tiered);
        assert_eq!(config.prompt_policy, PromptPolicy::Grant);
    }
}
