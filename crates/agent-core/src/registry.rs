use crate::config::AppConfig;
use crate::error::AgentError;
use crate::image::ImageProvider;
use crate::model::ImageClient;
use agent_mcp::session::Session;
use agent_mcp::transport::{HttpTransport, InProcessTransport, ProcessTransport};
use agent_providers::{CommandProvider, ContentProvider, ProviderServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Build one session per provider for a single run: built-ins first, then
/// the configured entries in configuration order. The order matters only
/// for the catalog shadowing rule.
///
/// The returned sessions are owned by this invocation alone; concurrent
/// runs must each build their own.
pub fn build_sessions(
    config: &AppConfig,
    include_content_provider: bool,
    image_client: Option<Arc<dyn ImageClient>>,
) -> Result<Vec<Session>, AgentError> {
    let call_timeout = Duration::from_secs(config.agent.call_timeout_secs);
    let mut sessions = Vec::new();

    // The command-execution provider is always available.
    let command = CommandProvider::new(
        config.command_provider.workspace_root.clone(),
        Duration::from_secs(config.command_provider.exec_timeout_secs),
    );
    sessions.push(Session::new(
        "command",
        Box::new(InProcessTransport::new(Arc::new(ProviderServer::new(
            command,
        )))),
    ));

    if include_content_provider {
        sessions.push(Session::new(
            "content",
            Box::new(InProcessTransport::new(Arc::new(ProviderServer::new(
                ContentProvider::new(),
            )))),
        ));
    }

    if let Some(client) = image_client {
        sessions.push(Session::new(
            "image",
            Box::new(InProcessTransport::new(Arc::new(ProviderServer::new(
                ImageProvider::new(client),
            )))),
        ));
    }

    for entry in &config.mcp.servers {
        let connection = entry.connection().trim();
        if connection.is_empty() {
            return Err(AgentError::Config("empty provider entry".into()));
        }

        if connection.starts_with("http://") || connection.starts_with("https://") {
            debug!(url = connection, "Registering network provider");
            sessions.push(Session::new(
                connection,
                Box::new(HttpTransport::new(connection, call_timeout)),
            ));
        } else {
            // Split on whitespace; no quoting or escaping support.
            let mut parts = connection.split_whitespace();
            let command = parts
                .next()
                .ok_or_else(|| AgentError::Config("empty provider command line".into()))?;
            let args: Vec<String> = parts.map(str::to_string).collect();

            debug!(command, "Registering process provider");
            sessions.push(Session::new(
                connection,
                Box::new(ProcessTransport::new(
                    command,
                    args,
                    entry.env(),
                    call_timeout,
                )),
            ));
        }
    }

    Ok(sessions)
}
