use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Top-level application configuration, loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub provider: ProviderConfig,
    pub agent: AgentConfig,
    pub mcp: McpConfig,
    pub command_provider: CommandProviderConfig,
    pub system_prompt: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderConfig::default(),
            agent: AgentConfig::default(),
            mcp: McpConfig::default(),
            command_provider: CommandProviderConfig::default(),
            system_prompt: Some(
                "You are a helpful AI assistant with access to tools. \
                 Use tools when appropriate to help the user."
                    .into(),
            ),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.config/mcp-agent/config.toml),
    /// falling back to defaults if the file doesn't exist.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mcp-agent")
            .join("config.toml")
    }
}

/// Generative-model provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL for the OpenAI-compatible API.
    pub api_base: String,
    /// Model name.
    pub model: String,
    /// Optional API key.
    pub api_key: Option<String>,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:11434/v1".into(),
            model: "gpt-4o-mini".into(),
            api_key: None,
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// Agent loop behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum generate/execute rounds before the loop gives up.
    pub max_turns: u32,
    /// Per-call timeout for provider transports, in seconds.
    pub call_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_turns: 16,
            call_timeout_secs: 60,
        }
    }
}

/// Configured external tool providers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    pub servers: Vec<ServerEntry>,
}

/// One configured provider: an `http(s)://` URL (network transport) or a
/// space-separated command line (process transport).
///
/// Command lines are split on whitespace with no quoting or escaping, so
/// arguments containing spaces cannot be expressed. Environment variables
/// can be attached through the long form's `env` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServerEntry {
    Connection(String),
    Detailed {
        connection: String,
        #[serde(default)]
        env: HashMap<String, String>,
    },
}

impl ServerEntry {
    pub fn connection(&self) -> &str {
        match self {
            ServerEntry::Connection(connection) => connection,
            ServerEntry::Detailed { connection, .. } => connection,
        }
    }

    pub fn env(&self) -> HashMap<String, String> {
        match self {
            ServerEntry::Connection(_) => HashMap::new(),
            ServerEntry::Detailed { env, .. } => env.clone(),
        }
    }
}

/// Built-in command-execution provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandProviderConfig {
    /// Confine file tools to this directory. None = no restriction.
    pub workspace_root: Option<PathBuf>,
    /// Timeout for executed commands, in seconds.
    pub exec_timeout_secs: u64,
}

impl Default for CommandProviderConfig {
    fn default() -> Self {
        Self {
            workspace_root: None,
            exec_timeout_secs: 30,
        }
    }
}
