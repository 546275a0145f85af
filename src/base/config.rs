//! Load configuration via `config` crate with env-override support.

use std::{collections::HashMap, ops::Deref, path::Path, sync::Arc};

use serde::Deserialize;

use crate::base::keywords;

use super::types::{FallbackMode, KeywordDefinition, Res, Void};

/// Default port to listen on.
fn default_port() -> u16 {
    3000
}

/// Default directory served under `/images`.
fn default_images_dir() -> String {
    "public".to_string()
}

/// Default LINE Messaging API host.
fn default_line_api_base() -> String {
    "https://api.line.me".to_string()
}

/// Default leading text of the "unrecognized keyword" reply.
fn default_fallback_text() -> String {
    keywords::DEFAULT_FALLBACK_TEXT.to_string()
}

/// Default webhook accounts: two channels at `/webhook/a` and `/webhook/b`.
fn default_accounts() -> Vec<AccountConfig> {
    vec![AccountConfig::new("a", "/webhook/a", "A", FallbackMode::Silent), AccountConfig::new("b", "/webhook/b", "B", FallbackMode::Silent)]
}

/// Configuration for the keyword bot.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared configuration values.
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<ConfigInner> for Config {
    fn from(inner: ConfigInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}

/// Configuration values, shared behind [`Config`].
#[derive(Debug, Deserialize, Clone)]
pub struct ConfigInner {
    /// Public base URL used to build image links (`PUBLIC_BASE_URL`).
    /// One trailing slash is stripped on load.
    #[serde(default)]
    pub public_base_url: String,
    /// Port to listen on (`PORT`).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Local directory served under `/images` (`IMAGES_DIR`).
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    /// LINE Messaging API host (`LINE_API_BASE`).
    #[serde(default = "default_line_api_base")]
    pub line_api_base: String,
    /// Leading text of the "unrecognized keyword" reply (`FALLBACK_TEXT`).
    #[serde(default = "default_fallback_text")]
    pub fallback_text: String,
    /// Webhook accounts, one per LINE channel.
    #[serde(default = "default_accounts")]
    pub accounts: Vec<AccountConfig>,
    /// Canonical keywords and their replies, in listing order.
    #[serde(default = "keywords::default_keywords")]
    pub keywords: Vec<KeywordDefinition>,
    /// Synonym to canonical keyword.
    #[serde(default = "keywords::default_aliases")]
    pub aliases: HashMap<String, String>,
    /// Channel credentials found for each account, keyed by credential prefix.
    ///
    /// Resolved from `<PREFIX>_CHANNEL_SECRET` / `<PREFIX>_CHANNEL_ACCESS_TOKEN` on load.
    #[serde(skip)]
    pub credentials: HashMap<String, ChannelCredentials>,
}

impl Default for ConfigInner {
    fn default() -> Self {
        Self {
            public_base_url: String::new(),
            port: default_port(),
            images_dir: default_images_dir(),
            line_api_base: default_line_api_base(),
            fallback_text: default_fallback_text(),
            accounts: default_accounts(),
            keywords: keywords::default_keywords(),
            aliases: keywords::default_aliases(),
            credentials: HashMap::new(),
        }
    }
}

/// One webhook account.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AccountConfig {
    /// Short name used in logs.
    pub name: String,
    /// Webhook path, e.g. `/webhook/a`.
    pub path: String,
    /// Prefix of the credential variables, e.g. `A` for `A_CHANNEL_SECRET`.
    pub credential_prefix: String,
    /// Behavior when a text message matches no keyword.
    #[serde(default)]
    pub fallback_mode: FallbackMode,
}

impl AccountConfig {
    /// Creates an account.
    pub fn new(name: impl Into<String>, path: impl Into<String>, credential_prefix: impl Into<String>, fallback_mode: FallbackMode) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            credential_prefix: credential_prefix.into(),
            fallback_mode,
        }
    }
}

/// Secret and access token of one LINE channel.
#[derive(Clone, PartialEq, Eq)]
pub struct ChannelCredentials {
    /// Secret used to verify request signatures.
    pub channel_secret: String,
    /// Token used to call the Messaging API.
    pub channel_access_token: String,
}

impl std::fmt::Debug for ChannelCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelCredentials").field("channel_secret", &"<redacted>").field("channel_access_token", &"<redacted>").finish()
    }
}

impl Config {
    /// Loads the configuration from the optional file and the environment.
    pub fn load(explicit_path: Option<&Path>) -> Res<Self> {
        Self::load_with(explicit_path, config::Environment::default())
    }

    /// Loads the configuration from the optional file and the given environment source.
    pub fn load_with(explicit_path: Option<&Path>, env: config::Environment) -> Res<Self> {
        let mut cfg = config::Config::builder();

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        // The environment wins over the file.
        let built = cfg.add_source(env).build()?;

        let mut inner: ConfigInner = built.clone().try_deserialize()?;
        inner.public_base_url = strip_trailing_slash(&inner.public_base_url).to_string();

        for account in &inner.accounts {
            if let Some(credentials) = lookup_credentials(&built, &account.credential_prefix) {
                inner.credentials.insert(account.credential_prefix.clone(), credentials);
            }
        }

        let result = Config::from(inner);
        result.validate()?;

        Ok(result)
    }

    /// Checks the account layout.
    ///
    /// The keyword tables are validated when the keyword book is built.
    pub fn validate(&self) -> Void {
        if self.accounts.is_empty() {
            return Err(anyhow::anyhow!("At least one webhook account must be configured."));
        }

        let mut seen = Vec::with_capacity(self.accounts.len());

        for account in &self.accounts {
            if account.credential_prefix.trim().is_empty() {
                return Err(anyhow::anyhow!("Account `{}` has an empty credential prefix.", account.name));
            }

            if !account.path.starts_with('/') || account.path == "/" {
                return Err(anyhow::anyhow!("Account `{}` path `{}` must start with `/` and not be the root.", account.name, account.path));
            }

            // Webhook paths are literal; axum would read these as captures or wildcards.
            if account.path.contains(['{', '}', '*']) {
                return Err(anyhow::anyhow!("Account `{}` path `{}` must not contain `{{`, `}}` or `*`.", account.name, account.path));
            }

            if account.path == "/images" || account.path.starts_with("/images/") {
                return Err(anyhow::anyhow!("Account `{}` path `{}` collides with the image directory.", account.name, account.path));
            }

            if seen.contains(&account.path.as_str()) {
                return Err(anyhow::anyhow!("Webhook path `{}` is used by more than one account.", account.path));
            }

            seen.push(account.path.as_str());
        }

        Ok(())
    }

    /// Credentials for an account, when both the secret and the token are set.
    pub fn credentials_for(&self, account: &AccountConfig) -> Option<&ChannelCredentials> {
        self.credentials.get(&account.credential_prefix)
    }
}

/// Strips exactly one trailing `/`.
fn strip_trailing_slash(url: &str) -> &str {
    url.strip_suffix('/').unwrap_or(url)
}

/// Reads `<prefix>_channel_secret` and `<prefix>_channel_access_token`; empty values count as missing.
fn lookup_credentials(built: &config::Config, prefix: &str) -> Option<ChannelCredentials> {
    let read = |suffix: &str| {
        built
            .get_string(&format!("{}_{}", prefix.to_lowercase(), suffix))
            .ok()
            .filter(|value| !value.trim().is_empty())
    };

    Some(ChannelCredentials {
        channel_secret: read("channel_secret")?,
        channel_access_token: read("channel_access_token")?,
    })
}

// Tests.
