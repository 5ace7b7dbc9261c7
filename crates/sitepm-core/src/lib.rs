pub mod ai;
pub mod config;
pub mod error;
pub mod format;
pub mod intent;
pub mod render;
pub mod session;
pub mod state;
pub mod store;
pub mod transport;
pub mod view;

// Re-export main types for convenience
pub use ai::OpenRouterClient;
pub use config::Config;
pub use error::{ChatError, StoreError, TransportError};
pub use format::{format_reply, Pipeline};
pub use intent::{classify, Intent};
pub use render::RenderableMessage;
pub use session::Session;
pub use state::{ChatMessage, ChatRole, Sender, TranscriptEntry};
pub use store::{FileStore, MemoryStore, Store};
pub use transport::{ChatRequest, ScriptedTransport, Transport};
pub use view::{Reaction, View, ViewEvent};
