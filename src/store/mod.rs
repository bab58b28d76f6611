//! Persistence layer: libSQL-backed storage for profiles, health records, goals, and conversations.

pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{ConversationMessage, Database};
