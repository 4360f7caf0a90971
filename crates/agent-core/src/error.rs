use agent_mcp::McpError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Mcp(#[from] McpError),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Model service error: {0}")]
    ModelService(String),

    #[error("Agent loop exceeded {0} turns without a final answer")]
    LoopLimit(u32),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, AgentError>;
