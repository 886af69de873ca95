pub mod confidence;
pub mod orchestrator;
pub mod prompts;

pub use orchestrator::Classifier;
