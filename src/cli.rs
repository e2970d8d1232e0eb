use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3001";

#[derive(Parser, Clone)]
#[command(version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
pub struct Cli {
    #[arg(short, long, value_name = "FILE", env = "GITLAB_MCP_CONFIG_FILE")]
    pub config_file: Option<PathBuf>,

    #[arg(
        long = "transport",
        value_name = "TRANSPORT",
        env = "GITLAB_MCP_TRANSPORT",
        default_value = "stdio",
        value_parser = ["stdio", "sse", "streamable-http"]
    )]
    pub transport: String,

    #[arg(
        long = "bind-address",
        value_name = "ADDRESS",
        env = "GITLAB_MCP_BIND_ADDRESS",
        default_value = DEFAULT_BIND_ADDRESS
    )]
    pub bind_address: String,

    #[arg(
        long = "api-url",
        value_name = "URL",
        help = "GitLab REST API base URL. Will override the value in your config file if set.",
        env = "GITLAB_API_URL"
    )]
    pub api_url: Option<String>,

    #[arg(
        long = "token",
        value_name = "TOKEN",
        help = "GitLab personal access token. Will override the value in your config file if set.",
        env = "GITLAB_PERSONAL_ACCESS_TOKEN",
        hide_env_values = true
    )]
    pub token: Option<String>,

    #[arg(
        long = "log-level",
        value_name = "FILTER",
        help = "Log filter, e.g. `info` or `gitlab_mcp=debug`. Falls back to RUST_LOG.",
        env = "GITLAB_MCP_LOG_LEVEL"
    )]
    pub log_level: Option<String>,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config_file: None,
            transport: "stdio".to_string(),
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            api_url: None,
            token: None,
            log_level: None,
        }
    }
}
