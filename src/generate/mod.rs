pub mod orchestrator;
pub mod stream;

pub use orchestrator::{Orchestrator, TimeoutPolicy};
pub use stream::{run_session, StreamEvent};
