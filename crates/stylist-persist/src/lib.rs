pub mod builder;
pub mod clock;
pub mod dbs;
pub mod error;
pub mod models;
pub mod trait_client;
mod validation;

pub use builder::SessionStoreBuilder;
pub use dbs::sqlite::SqliteSessionStore;
pub use error::{Result, StoreError};
pub use models::{CreatedSession, NewMessage, NewSession, Session, StoredMessage};
pub use trait_client::SessionStore;
