use std::env;

use tracing::info;

pub const DEFAULT_TASKS_TABLE: &str = "tasks";
pub const DEFAULT_BIDS_TABLE: &str = "bids";
pub const DEFAULT_ALLOW_ORIGIN: &str = "*";

/// Settings read from the Lambda environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub tasks_table: String,
    pub bids_table: String,
    pub allow_origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_table: DEFAULT_TASKS_TABLE.to_string(),
            bids_table: DEFAULT_BIDS_TABLE.to_string(),
            allow_origin: DEFAULT_ALLOW_ORIGIN.to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values fall back to the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let load = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| {
                    info!("{key} not set, using default: {default}");
                    default.to_string()
                })
        };

        Self {
            tasks_table: load("TASKS_TABLE", DEFAULT_TASKS_TABLE),
            bids_table: load("BIDS_TABLE", DEFAULT_BIDS_TABLE),
            allow_origin: load("CORS_ALLOW_ORIGIN", DEFAULT_ALLOW_ORIGIN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn falls_back_to_defaults() {
        assert_eq!(Config::from_lookup(|_| None), Config::default());
    }

    #[test]
    fn reads_overrides_and_ignores_blank() {
        let vars = HashMap::from([
            ("TASKS_TABLE", "gig-tasks"),
            ("BIDS_TABLE", "  "),
            ("CORS_ALLOW_ORIGIN", "https://gigboard.app"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(
            config,
            Config {
                tasks_table: "gig-tasks".into(),
                bids_table: "bids".into(),
                allow_origin: "https://gigboard.app".into(),
            }
        );
    }
}
