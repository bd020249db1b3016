// Client configuration.
//
// The API key is resolved from an explicit value, then the `API_KEY`
// environment variable, then the key file in the user's home directory.
// A missing key is not fatal here: the client is still built and every
// operation fails with `ClientError::Config` before anything is sent.

use crate::error::{ClientError, ClientResult};
use std::path::{Path, PathBuf};
use tracing::warn;

pub const DEFAULT_HOST: &str = "api.mockaroo.com";
pub const API_KEY_ENV: &str = "API_KEY";
pub const HOST_ENV: &str = "MOCKAROO_HOST";
pub const KEY_FILE_NAME: &str = ".mockaroo_key";

/// How `delete` treats a dataset the service says does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeletePolicy {
    /// Surface the service's not-found answer as an error.
    #[default]
    Strict,
    /// Report `DeleteOutcome::Missing` instead of failing.
    Idempotent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_key: Option<String>,
    pub host: String,
    pub secure: bool,
    pub port: Option<u16>,
    pub delete_policy: DeletePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            api_key: None,
            host: DEFAULT_HOST.to_string(),
            secure: true,
            port: None,
            delete_policy: DeletePolicy::Strict,
        }
    }
}

impl ClientConfig {
    /// Config with an explicit key and default host. An empty key counts
    /// as absent.
    pub fn new(api_key: impl Into<String>) -> Self {
        ClientConfig::default().with_api_key(Some(api_key.into()))
    }

    /// Resolve the key from `explicit`, then `API_KEY`, then the key file.
    /// The host comes from `MOCKAROO_HOST` when set.
    pub fn from_env(explicit: Option<String>) -> Self {
        Self::from_sources(explicit, |name| std::env::var(name).ok(), key_file_path())
    }

    /// Same lookup as `from_env` with the environment and key file passed
    /// in.
    pub fn from_sources(
        explicit: Option<String>,
        env: impl Fn(&str) -> Option<String>,
        key_file: Option<PathBuf>,
    ) -> Self {
        let api_key = non_empty(explicit)
            .or_else(|| non_empty(env(API_KEY_ENV)))
            .or_else(|| key_file.as_deref().and_then(key_from_file));

        let mut config = ClientConfig::default().with_api_key(api_key);
        if let Some(host) = non_empty(env(HOST_ENV)) {
            config.host = host;
        }
        config
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = non_empty(api_key);
        if self.api_key.is_none() {
            warn!(
                "API key is not provided. Set {} (`export {}=your_api_key`) or run `mockaroo set-key`.",
                API_KEY_ENV, API_KEY_ENV
            );
        }
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_port(mut self, port: Option<u16>) -> Self {
        self.port = port;
        self
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// The key, or a `Config` error when none was resolved.
    pub fn require_api_key(&self) -> ClientResult<&str> {
        self.api_key().ok_or_else(|| {
            ClientError::config(format!(
                "API key is required. Set {} or pass --api-key",
                API_KEY_ENV
            ))
        })
    }

    /// `scheme://host[:port]` without a trailing slash.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        let host = self.host.trim_end_matches('/');
        match self.port {
            Some(port) => format!("{}://{}:{}", scheme, host, port),
            None => format!("{}://{}", scheme, host),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Location of the persisted key file in the user's home directory.
pub fn key_file_path() -> Option<PathBuf> {
    dirs::home_dir().map(|dir| dir.join(KEY_FILE_NAME))
}

/// Key from the key file. A missing file is expected; anything else that
/// stops it being read is logged.
fn key_from_file(path: &Path) -> Option<String> {
    match load_key(path) {
        Ok(key) => Some(key),
        Err(ClientError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => None,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable key file");
            None
        }
    }
}

/// Persist an API key so later runs pick it up without `API_KEY`.
pub fn persist_key(path: &Path, key: &str) -> ClientResult<()> {
    std::fs::write(path, format!("{}\n", key.trim())).map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a previously persisted key.
pub fn load_key(path: &Path) -> ClientResult<String> {
    let data = std::fs::read_to_string(path).map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    non_empty(Some(data)).ok_or_else(|| {
        ClientError::config(format!("key file {} is empty", path.display()))
    })
}
