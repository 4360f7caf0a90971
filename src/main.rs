use agent_core::{build_sessions, AgentLoop, AppConfig, ImageClient, OpenAiModelClient, ToolIndex};
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "mcp-agent",
    about = "Run a prompt through an AI agent with access to MCP tool providers",
    version,
    author
)]
struct Cli {
    /// The prompt to run.
    prompt: String,

    /// Skip the built-in content provider.
    #[arg(long)]
    skip_content: bool,

    /// Path to config file (default: ~/.config/mcp-agent/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the model name
    #[arg(short, long)]
    model: Option<String>,

    /// Override the API base URL
    #[arg(long)]
    api_base: Option<String>,

    /// Override the maximum generate/execute rounds
    #[arg(long)]
    max_turns: Option<u32>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mcp_agent=info,agent_core=info,warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    if let Some(model) = cli.model {
        config.provider.model = model;
    }
    if let Some(api_base) = cli.api_base {
        config.provider.api_base = api_base;
    }
    if let Some(max_turns) = cli.max_turns {
        config.agent.max_turns = max_turns;
    }

    let model = Arc::new(OpenAiModelClient::new(&config));
    let sessions = build_sessions(
        &config,
        !cli.skip_content,
        Some(model.clone() as Arc<dyn ImageClient>),
    )?;
    let index = ToolIndex::build(&sessions).await?;
    info!(
        providers = sessions.len(),
        tools = index.len(),
        "Tool catalog ready"
    );

    let agent = AgentLoop::new(model, config.agent.max_turns);

    let answer = agent.run(&cli.prompt, &index).await?;
    println!("{answer}");

    Ok(())
}
