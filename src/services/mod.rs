pub mod lookup;
pub mod mapping;
pub mod orchestrator;

pub use lookup::LookupNames;
pub use orchestrator::{Orchestrator, OrchestratorError};
