pub mod command;
pub mod content;
pub mod server;

pub use command::CommandProvider;
pub use content::ContentProvider;
pub use server::{ProviderHandler, ProviderServer};
