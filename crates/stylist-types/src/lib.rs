pub mod message;
pub mod pagination;
pub mod refresher;

pub use message::{MessageEntry, MessageRole, RemoteImage};
pub use pagination::{Page, Pagination};
pub use refresher::{PassthroughRefresher, UrlRefresher};

/// Title given to a session when the caller does not supply one.
pub const DEFAULT_SESSION_TITLE: &str = "New Style Analysis";
