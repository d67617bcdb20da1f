pub mod config;
pub mod error;
pub mod models;
pub mod llm;
pub mod generate;
pub mod storage;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
pub use generate::{Orchestrator, TimeoutPolicy};
pub use llm::{GeminiProvider, GroqProvider, OpenRouterProvider, ReviewProvider};
pub use server::AppState;
pub use storage::ProfileStore;
