//! Settings read from the environment (after `.env` has been loaded).
//!
//! | Variable       | Meaning                                             | Default              |
//! |----------------|-----------------------------------------------------|----------------------|
//! | `COURSE_ID`    | Course to open without prompting                    | prompt               |
//! | `RATER_POLICY` | `per-rater`, `instructor` or `latest`               | `instructor`         |
//! | `EXPORT_DIR`   | Directory receiving CSV exports                     | downloads directory  |
//!
//! Credentials are handled separately by `CanvasCredentials`, and `LOG_LEVEL` by the
//! binary before anything else is read.

use crate::flatten::RaterPolicy;
use log::warn;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub course_id: Option<u64>,
    pub rater_policy: RaterPolicy,
    pub export_dir: PathBuf,
}

/// Where exports land when `EXPORT_DIR` is not set.
pub fn default_export_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

impl ReportConfig {
    /// Builds the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// Invalid values are logged and replaced by their default.
    pub fn from_lookup<F>(lookup: F) -> ReportConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let course_id = value("COURSE_ID").and_then(|raw| match raw.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!("Ignoring COURSE_ID '{}': not a course id", raw);
                None
            }
        });

        let rater_policy = value("RATER_POLICY").map_or(RaterPolicy::default(), |raw| {
            raw.parse().unwrap_or_else(|e: String| {
                warn!("{}; using {}", e, RaterPolicy::default());
                RaterPolicy::default()
            })
        });

        ReportConfig {
            course_id,
            rater_policy,
            export_dir: value("EXPORT_DIR").map_or_else(default_export_dir, PathBuf::from),
        }
    }

    pub fn from_env() -> ReportConfig {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(vars: &[(&str, &str)]) -> ReportConfig {
        let vars: Vec<(String, String)> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ReportConfig::from_lookup(|key| {
            vars.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        })
    }

    #[test]
    fn test_config_defaults() {
        let config = config(&[]);
        assert_eq!(config.course_id, None);
        assert_eq!(config.rater_policy, RaterPolicy::PreferInstructor);
        assert_eq!(config.export_dir, default_export_dir());
    }

    #[test]
    fn test_config_values() {
        let config = config(&[
            ("COURSE_ID", " 4321 "),
            ("RATER_POLICY", "per-rater"),
            ("EXPORT_DIR", "/tmp/exports"),
        ]);
        assert_eq!(config.course_id, Some(4321));
        assert_eq!(config.rater_policy, RaterPolicy::PerRater);
        assert_eq!(config.export_dir, PathBuf::from("/tmp/exports"));
    }

    #[test]
    fn test_config_invalid_values_fall_back() {
        let config = config(&[("COURSE_ID", "abc"), ("RATER_POLICY", "loudest")]);
        assert_eq!(config.course_id, None);
        assert_eq!(config.rater_policy, RaterPolicy::default());
    }
}
