pub mod message;
pub mod session;

pub use message::{NewMessage, StoredMessage};
pub use session::{CreatedSession, NewSession, Session};
