//! Embedded SQLite cache for chat-message history.
//!
//! A bounded, disposable local mirror of a remote message backend: the host
//! application writes messages here as they are sent/received so chat history
//! stays readable offline and screen loads avoid a network round trip. The
//! remote backend stays authoritative; this cache can be dropped and rebuilt
//! at any time (see [`MessageStore::reset`]).

mod config;
mod error;
mod retention;
mod store;

pub use config::{CacheConfig, DatabaseConfig};
pub use error::CacheError;
pub use retention::{RetentionPolicy, DEFAULT_RETENTION_DAYS};
pub use store::{Message, MessageStore};
