pub mod agent_loop;
pub mod catalog;
pub mod config;
pub mod error;
pub mod image;
pub mod model;
pub mod registry;
pub mod types;

pub use agent_loop::AgentLoop;
pub use catalog::ToolIndex;
pub use config::AppConfig;
pub use error::AgentError;
pub use image::ImageProvider;
pub use model::{ImageClient, ModelClient, OpenAiModelClient};
pub use registry::build_sessions;
