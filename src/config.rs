use crate::{auth::AuthConfig, cli::Cli};
use anyhow::{Context, Result, anyhow, bail};
use regex::RegexSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::{DurationSeconds, serde_as};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use url::Url;

pub const DEFAULT_API_URL: &str = "https://gitlab.com/api/v4";
pub const MISSING_TOKEN_MESSAGE: &str =
    "GITLAB_PERSONAL_ACCESS_TOKEN environment variable is not set";

const CONFIG_DIR_NAME: &str = "gitlab-mcp";
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

#[serde_as]
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub api_url: String,

    pub auth: Option<AuthConfig>,

    #[serde_as(as = "Option<DurationSeconds<u64>>")]
    pub timeout: Option<Duration>,

    pub user_agent: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_tools: Option<SkipTools>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            auth: None,
            timeout: None,
            user_agent: None,
            skip_tools: None,
        }
    }
}

/// Tool names hidden from clients. Each pattern must match the whole name.
#[derive(Clone, Debug)]
pub struct SkipTools {
    patterns: Vec<String>,
    set: RegexSet,
}

impl SkipTools {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let set = RegexSet::new(patterns.iter().map(|p| format!("^(?:{p})$")))?;
        Ok(Self { patterns, set })
    }

    pub fn is_match(&self, tool_name: &str) -> bool {
        self.set.is_match(tool_name)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl<'de> Deserialize<'de> for SkipTools {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let patterns = Vec::<String>::deserialize(deserializer)?;
        SkipTools::new(patterns).map_err(serde::de::Error::custom)
    }
}

impl Serialize for SkipTools {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.patterns.serialize(serializer)
    }
}

/// Check if a value contains an environment variable reference in the format ${ENVVARKEY}
/// and replace it with the actual environment variable value if it exists.
/// If the environment variable doesn't exist, returns the original value.
fn check_env_reference(value: &str) -> String {
    if let Some(stripped) = value.strip_prefix("${").and_then(|s| s.strip_suffix("}")) {
        match std::env::var(stripped) {
            Ok(env_value) => {
                tracing::debug!(
                    "Resolved environment variable reference ${{{stripped}}} to actual value"
                );
                env_value
            }
            Err(_) => {
                tracing::warn!("Environment variable {stripped} not found, keeping original value");
                value.to_string()
            }
        }
    } else {
        value.to_string()
    }
}

pub(crate) fn parse_config<T: serde::de::DeserializeOwned>(
    content: &str,
    file_path: &Path,
) -> Result<T> {
    let extension = file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("json");

    match extension.to_lowercase().as_str() {
        "json" => serde_json::from_str(content).context("Failed to parse JSON config"),
        "yaml" | "yml" => serde_yaml::from_str(content).context("Failed to parse YAML config"),
        "toml" => toml::from_str(content).context("Failed to parse TOML config"),
        _ => Err(anyhow!("Unsupported config file format: {extension}")),
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(DEFAULT_CONFIG_FILE))
        .filter(|path| path.is_file())
}

/// Loads the config file (if any) and applies CLI and environment overrides.
/// Fails when no token is available after merging.
pub async fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match cli.config_file.clone().or_else(default_config_path) {
        Some(path) => {
            tracing::info!("Loading config from {}", path.display());
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            parse_config::<Config>(&content, &path)?
        }
        None => Config::default(),
    };

    if let Some(api_url) = cli.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
        config.api_url = api_url.trim().to_string();
    }

    if let Some(token) = cli.token.as_deref().filter(|t| !t.trim().is_empty()) {
        let token = token.trim().to_string();
        config.auth = Some(match config.auth.take() {
            Some(AuthConfig::PrivateToken { .. }) => AuthConfig::PrivateToken { token },
            _ => AuthConfig::Bearer { token },
        });
    }

    config.auth = config.auth.map(|auth| match auth {
        AuthConfig::Bearer { token } => AuthConfig::Bearer {
            token: check_env_reference(&token),
        },
        AuthConfig::PrivateToken { token } => AuthConfig::PrivateToken {
            token: check_env_reference(&token),
        },
    });

    match &config.auth {
        Some(auth) if !auth.token().trim().is_empty() => {}
        _ => bail!(MISSING_TOKEN_MESSAGE),
    }

    let url = Url::parse(&config.api_url)
        .with_context(|| format!("Invalid GitLab API URL {}", config.api_url))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("GitLab API URL must use http or https: {}", config.api_url);
    }

    Ok(config)
}
