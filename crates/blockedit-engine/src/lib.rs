pub mod editing;
pub mod error;

// Re-export key types for easier usage
pub use blockedit_config::{BlockIdStrategy, Config, HistoryConfig};
pub use editing::*;
pub use error::EditorError;
