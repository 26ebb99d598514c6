//! EOS client configuration from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `EOS_BASE_URL` | `http://127.0.0.1:8090` |
//! | `EOS_SERVICE_ACCOUNT` | unset (default credentials) |
//! | `EOS_PRIVATE_KEY_FILE` | `./eos-key.json` |
//! | `EOS_REQUEST_TIMEOUT_SECS` | `120` |

use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8090";
const DEFAULT_PRIVATE_KEY_FILE: &str = "./eos-key.json";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Connection settings for [`crate::HttpEos`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EosConfig {
    /// Gateway base URL, without a trailing slash.
    pub base_url: String,
    /// Service account identity sent when opening a session. `None`
    /// falls back to the gateway's default credentials.
    pub service_account: Option<String>,
    /// Private key presented with the service account, read at session
    /// time if the file exists.
    pub private_key_file: PathBuf,
    /// Timeout applied to every HTTP call.
    pub request_timeout: Duration,
}

impl Default for EosConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            service_account: None,
            private_key_file: PathBuf::from(DEFAULT_PRIVATE_KEY_FILE),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl EosConfig {
    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Unset, empty or
    /// unparseable values fall back to the defaults.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get("EOS_BASE_URL").map_or_else(
            || DEFAULT_BASE_URL.to_string(),
            |url| url.trim().trim_end_matches('/').to_string(),
        );

        let request_timeout = get("EOS_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(
                Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
                Duration::from_secs,
            );

        Self {
            base_url,
            service_account: get("EOS_SERVICE_ACCOUNT"),
            private_key_file: get("EOS_PRIVATE_KEY_FILE")
                .map_or_else(|| PathBuf::from(DEFAULT_PRIVATE_KEY_FILE), PathBuf::from),
            request_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        assert_eq!(EosConfig::from_lookup(lookup(&[])), EosConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = EosConfig::from_lookup(lookup(&[
            ("EOS_BASE_URL", "https://eos.example.org/"),
            ("EOS_SERVICE_ACCOUNT", "svc@example.iam"),
            ("EOS_PRIVATE_KEY_FILE", "/etc/eos/key.json"),
            ("EOS_REQUEST_TIMEOUT_SECS", "30"),
        ]));
        assert_eq!(config.base_url, "https://eos.example.org");
        assert_eq!(config.service_account.as_deref(), Some("svc@example.iam"));
        assert_eq!(config.private_key_file, PathBuf::from("/etc/eos/key.json"));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn bad_timeout_falls_back() {
        let config = EosConfig::from_lookup(lookup(&[("EOS_REQUEST_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        let config = EosConfig::from_lookup(lookup(&[("EOS_REQUEST_TIMEOUT_SECS", "0")]));
        assert_eq!(config.request_timeout, Duration::from_secs(120));
    }

    #[test]
    fn empty_service_account_is_none() {
        let config = EosConfig::from_lookup(lookup(&[("EOS_SERVICE_ACCOUNT", "")]));
        assert!(config.service_account.is_none());
    }
}
