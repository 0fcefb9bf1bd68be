//! Configuration parsing and validation for the roastbot binary
//!
//! This module handles command-line argument parsing and validation using clap. Every option
//! can also be supplied through the environment.
use anyhow::{anyhow, bail};
use clap::{Args, Parser, Subcommand};
use roastbot::adapter::{DEFAULT_ADAPTER_TIMEOUT, DEFAULT_RELAY_URL};
use roastbot::client::PoolConfig;
use roastbot::credential::ApiKey;
use roastbot::relay::{DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_UPSTREAM_URL, RelaySettings};
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log at debug level regardless of RUST_LOG.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the relay server.
    Serve(ServeConfig),
    /// Chat with a running relay from the terminal.
    Chat(ChatConfig),
}

#[derive(Debug, Clone, Args)]
pub struct ServeConfig {
    /// The port on which the relay will listen.
    #[arg(short = 'p', long, env = "PORT", default_value_t = 5001)]
    pub port: u16,

    /// Credential for the upstream completions API.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: ApiKey,

    /// Base URL of the OpenAI-compatible API.
    #[arg(long, env = "ROASTBOT_UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: Url,

    /// The model requested for every completion.
    #[arg(long, env = "ROASTBOT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Upper bound on generated tokens per completion.
    #[arg(long, env = "ROASTBOT_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Seconds to wait for the upstream before giving up.
    #[arg(long, env = "ROASTBOT_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Origins allowed by CORS. May be repeated; when absent, any origin is allowed.
    #[arg(long = "allowed-origin", env = "ROASTBOT_ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Whether to enable the metrics endpoint.
    #[arg(short = 'm', long, default_value_t = false)]
    pub metrics: bool,

    /// The port on which the metrics server will listen.
    #[arg(long, default_value_t = 9090)]
    pub metrics_port: u16,

    /// The prefix to use for metrics.
    #[arg(long, default_value = "roastbot")]
    pub metrics_prefix: String,

    /// Maximum number of idle HTTP connections to keep alive per upstream host.
    #[arg(long, default_value_t = 100)]
    pub pool_max_idle_per_host: usize,

    /// How long (in seconds) to keep idle HTTP connections alive.
    #[arg(long, default_value_t = 90)]
    pub pool_idle_timeout_secs: u64,
}

impl ServeConfig {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if self.api_key.is_empty() {
            bail!("OPENAI_API_KEY is set but empty; refusing to send unauthenticated requests");
        }
        if self.model.trim().is_empty() {
            bail!("Model name must not be empty");
        }
        if self.max_tokens == 0 {
            bail!("--max-tokens must be greater than zero");
        }
        if self.timeout_secs == 0 {
            bail!("--timeout-secs must be greater than zero");
        }
        if self.metrics && self.metrics_port == self.port {
            return Err(anyhow!(
                "Metrics port {} clashes with the relay port",
                self.metrics_port
            ));
        }
        Ok(self)
    }

    pub fn relay_settings(&self) -> RelaySettings {
        RelaySettings::builder()
            .api_key(self.api_key.clone())
            .upstream_url(self.upstream_url.clone())
            .model(self.model.clone())
            .max_tokens(self.max_tokens)
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()
    }

    pub fn pool(&self) -> PoolConfig {
        PoolConfig {
            max_idle_per_host: self.pool_max_idle_per_host,
            idle_timeout: Duration::from_secs(self.pool_idle_timeout_secs),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ChatConfig {
    /// Full URL of the relay endpoint.
    #[arg(long, env = "ROASTBOT_RELAY_URL", default_value = DEFAULT_RELAY_URL)]
    pub relay_url: Url,

    /// Start in roast mode instead of normal mode.
    #[arg(long, default_value_t = false)]
    pub roast: bool,

    /// Seconds to wait for the relay before showing the fallback reply.
    #[arg(long, default_value_t = DEFAULT_ADAPTER_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

impl ChatConfig {
    pub fn validate(self) -> Result<Self, anyhow::Error> {
        if !matches!(self.relay_url.scheme(), "http" | "https") {
            bail!("Relay URL '{}' must be http or https", self.relay_url);
        }
        if self.timeout_secs == 0 {
            bail!("--timeout-secs must be greater than zero");
        }
        Ok(self)
    }
}
