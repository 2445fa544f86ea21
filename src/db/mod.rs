// SQLite persistence: conversation and turn records with a unique
// fingerprint index for deduplication.

pub mod conversations;
pub mod manager;
pub mod migrations;
pub mod models;
pub mod turns;

pub use manager::Database;
pub use models::{Conversation, Turn};
