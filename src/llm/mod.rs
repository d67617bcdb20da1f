pub mod gemini;
pub mod groq;
pub mod openrouter;
pub mod parser;
pub mod plan;
pub mod prompts;
pub mod provider;
pub mod sse;

pub use gemini::GeminiProvider;
pub use groq::GroqProvider;
pub use openrouter::OpenRouterProvider;
pub use provider::ReviewProvider;
