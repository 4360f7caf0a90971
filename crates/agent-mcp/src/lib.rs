pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

pub use error::McpError;
pub use protocol::{Request, Response, RpcErrorBody, ToolDescriptor};
pub use session::Session;
pub use transport::{HttpTransport, InProcessTransport, ProcessTransport, ToolServer, Transport};
